//! Canonical form for accepted URLs, used as the storage/deduplication key.

use std::collections::HashSet;
use std::sync::LazyLock;

use tracing::debug;
use url::Url;

use crate::errors::ValidationError;

/// Domains known to serve HTTPS. `http` URLs pointing at them are upgraded.
///
/// This is a static table on purpose: the normalizer never touches the
/// network, so it cannot discover HTTPS support for hosts not listed here.
pub const DEFAULT_HTTPS_HOSTS: &[&str] = &[
    "google.com",
    "www.google.com",
    "github.com",
    "www.github.com",
    "youtube.com",
    "www.youtube.com",
    "twitter.com",
    "x.com",
    "facebook.com",
    "www.facebook.com",
    "linkedin.com",
    "www.linkedin.com",
    "wikipedia.org",
    "en.wikipedia.org",
    "stackoverflow.com",
    "reddit.com",
    "www.reddit.com",
];

/// Query parameters that only carry campaign/click tracking.
pub const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
];

static DEFAULT_NORMALIZER: LazyLock<Normalizer> = LazyLock::new(Normalizer::new);

/// Normalize with the built-in HTTPS upgrade table.
pub fn normalize_url(raw: &str) -> Result<String, ValidationError> {
    DEFAULT_NORMALIZER.normalize(raw)
}

/// Rewrites URLs into a canonical form.
///
/// Holds only the immutable HTTPS upgrade table, so the output is a pure
/// function of the input. `normalize(normalize(u)) == normalize(u)`.
#[derive(Debug, Clone)]
pub struct Normalizer {
    https_hosts: HashSet<String>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self::with_https_hosts(DEFAULT_HTTPS_HOSTS)
    }

    pub fn with_https_hosts<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            https_hosts: hosts
                .into_iter()
                .map(|h| h.as_ref().trim().to_ascii_lowercase())
                .filter(|h| !h.is_empty())
                .collect(),
        }
    }

    /// Parse `raw` and return its canonical serialization.
    ///
    /// Lowercases the host, upgrades `http` to `https` for hosts in the
    /// upgrade table, drops tracking parameters, trims trailing slashes from
    /// the path (a bare `/` is kept) and removes the scheme's default port.
    pub fn normalize(&self, raw: &str) -> Result<String, ValidationError> {
        let mut url = Url::parse(raw)?;

        if let Some(host) = url.host_str() {
            let lower = host.to_ascii_lowercase();
            if lower != host {
                url.set_host(Some(lower.as_str()))?;
            }
        }

        if url.scheme() == "http"
            && url
                .host_str()
                .is_some_and(|host| self.https_hosts.contains(host))
        {
            if url.set_scheme("https").is_err() {
                debug!("could not upgrade {} to https", raw);
            }
        }

        if let Some(query) = url.query() {
            let kept = strip_tracking_params(query);
            url.set_query(if kept.is_empty() { None } else { Some(kept.as_str()) });
        }

        let path = url.path();
        if path.len() > 1 && path.ends_with('/') {
            let trimmed = match path.trim_end_matches('/') {
                "" => "/".to_string(),
                rest => rest.to_string(),
            };
            url.set_path(&trimmed);
        }

        if let Some(port) = url.port()
            && Some(port) == default_port(url.scheme())
        {
            if url.set_port(None).is_err() {
                debug!("could not drop default port from {}", raw);
            }
        }

        Ok(url.into())
    }

    pub fn upgrades_to_https(&self, host: &str) -> bool {
        self.https_hosts.contains(&host.to_ascii_lowercase())
    }
}

fn default_port(scheme: &str) -> Option<u16> {
    match scheme {
        "http" => Some(80),
        "https" => Some(443),
        _ => None,
    }
}

/// Drop tracking parameters from a raw query string.
///
/// Works on the raw `&`-separated pieces so surviving parameters keep their
/// original encoding and order. Empty pieces are dropped.
fn strip_tracking_params(query: &str) -> String {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter(|pair| {
            let key = pair.split('=').next().unwrap_or(pair);
            !TRACKING_PARAMS
                .iter()
                .any(|param| param.eq_ignore_ascii_case(key))
        })
        .collect::<Vec<_>>()
        .join("&")
}
