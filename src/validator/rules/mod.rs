//! Ordered, short-circuiting URL policy checks.

use std::net::IpAddr;
use std::sync::{LazyLock, RwLock};

use regex::Regex;
use url::Host;

use crate::errors::ValidationError;
use crate::validator::candidate::UrlCandidate;

/// Longest raw query string accepted by [`QueryParamRule`].
pub const MAX_QUERY_LENGTH: usize = 1000;
/// Most `&`-separated parameters accepted by [`QueryParamRule`].
pub const MAX_QUERY_PARAMS: usize = 50;
pub const DEFAULT_MAX_URL_LENGTH: usize = 2048;

const MAX_HOST_LENGTH: usize = 253;
const MAX_LABEL_LENGTH: usize = 63;

/// A single policy check over a parsed URL.
///
/// Rules must be pure: the same candidate always yields the same verdict.
pub trait ValidationRule: Send + Sync {
    /// Short identifier used in diagnostics.
    fn name(&self) -> &str;

    fn apply(&self, candidate: &UrlCandidate<'_>) -> Result<(), ValidationError>;
}

/// Only `http` and `https` are accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemeRule;

impl ValidationRule for SchemeRule {
    fn name(&self) -> &str {
        "scheme"
    }

    fn apply(&self, candidate: &UrlCandidate<'_>) -> Result<(), ValidationError> {
        match candidate.scheme() {
            "http" | "https" => Ok(()),
            other => Err(ValidationError::Scheme(other.to_string())),
        }
    }
}

/// Host must be a well-formed public domain or a public literal IP.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostRule;

impl ValidationRule for HostRule {
    fn name(&self) -> &str {
        "host"
    }

    fn apply(&self, candidate: &UrlCandidate<'_>) -> Result<(), ValidationError> {
        match candidate.host() {
            None => Err(ValidationError::HostFormat("URL has no host".into())),
            Some(Host::Ipv4(v4)) => check_ip_public(IpAddr::V4(v4)),
            Some(Host::Ipv6(v6)) => check_ip_public(IpAddr::V6(v6)),
            Some(Host::Domain(domain)) => check_domain(domain),
        }
    }
}

fn check_ip_public(ip: IpAddr) -> Result<(), ValidationError> {
    if is_non_public_ip(ip) {
        return Err(ValidationError::PrivateOrLoopbackIp(ip.to_string()));
    }
    Ok(())
}

fn is_non_public_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_unspecified()
                // 0.0.0.0/8
                || v4.octets()[0] == 0
        }
        IpAddr::V6(v6) => {
            // ::ffff:127.0.0.1 and friends
            if let Some(v4) = v6.to_ipv4_mapped() {
                return is_non_public_ip(IpAddr::V4(v4));
            }
            let first = v6.segments()[0];
            v6.is_loopback()
                || v6.is_unspecified()
                // fe80::/10 link-local
                || first & 0xffc0 == 0xfe80
                // fc00::/7 unique local
                || first & 0xfe00 == 0xfc00
        }
    }
}

fn dns_label() -> &'static Regex {
    static RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?$")
            .expect("Failed to compile DNS label regex")
    });
    &RE
}

fn check_domain(domain: &str) -> Result<(), ValidationError> {
    // A single trailing dot is the DNS root, not an empty label
    let domain = domain.strip_suffix('.').unwrap_or(domain);
    if domain.is_empty() {
        return Err(ValidationError::HostFormat("host is empty".into()));
    }
    if domain.len() > MAX_HOST_LENGTH {
        return Err(ValidationError::HostFormat(format!(
            "host is {} chars, limit is {}",
            domain.len(),
            MAX_HOST_LENGTH
        )));
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return Err(ValidationError::HostFormat(format!(
            "'{}' is not a fully qualified domain",
            domain
        )));
    }
    for label in labels {
        if label.is_empty() || label.len() > MAX_LABEL_LENGTH || !dns_label().is_match(label) {
            return Err(ValidationError::HostFormat(format!(
                "invalid label '{}' in '{}'",
                label, domain
            )));
        }
    }
    Ok(())
}

/// Path may only use unreserved, sub-delim and a few gen-delim characters.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathRule;

fn is_allowed_path_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "-_.~!$&'()*+,;=:@/%".contains(c)
}

impl ValidationRule for PathRule {
    fn name(&self) -> &str {
        "path"
    }

    fn apply(&self, candidate: &UrlCandidate<'_>) -> Result<(), ValidationError> {
        match candidate.path().chars().find(|c| !is_allowed_path_char(*c)) {
            Some(c) => Err(ValidationError::PathFormat(format!(
                "character {:?} is not allowed",
                c
            ))),
            None => Ok(()),
        }
    }
}

/// Bounds the size and parameter count of the query string.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryParamRule;

impl ValidationRule for QueryParamRule {
    fn name(&self) -> &str {
        "query"
    }

    fn apply(&self, candidate: &UrlCandidate<'_>) -> Result<(), ValidationError> {
        let Some(query) = candidate.query().filter(|q| !q.is_empty()) else {
            return Ok(());
        };
        if query.len() > MAX_QUERY_LENGTH {
            return Err(ValidationError::QueryTooComplex(format!(
                "query is {} chars, limit is {}",
                query.len(),
                MAX_QUERY_LENGTH
            )));
        }
        let params = query.split('&').filter(|p| !p.is_empty()).count();
        if params > MAX_QUERY_PARAMS {
            return Err(ValidationError::QueryTooComplex(format!(
                "{} parameters, limit is {}",
                params, MAX_QUERY_PARAMS
            )));
        }
        Ok(())
    }
}

/// Caps the length of the raw URL string.
#[derive(Debug, Clone, Copy)]
pub struct LengthRule {
    pub max_length: usize,
}

impl LengthRule {
    pub fn new(max_length: usize) -> Self {
        Self { max_length }
    }
}

impl Default for LengthRule {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_URL_LENGTH)
    }
}

impl ValidationRule for LengthRule {
    fn name(&self) -> &str {
        "length"
    }

    fn apply(&self, candidate: &UrlCandidate<'_>) -> Result<(), ValidationError> {
        let length = candidate.raw().len();
        if length > self.max_length {
            return Err(ValidationError::LengthExceeded {
                length,
                max: self.max_length,
            });
        }
        Ok(())
    }
}

/// The built-in rules in evaluation order.
pub fn default_rules(max_length: usize) -> Vec<Box<dyn ValidationRule>> {
    vec![
        Box::new(SchemeRule),
        Box::new(HostRule),
        Box::new(PathRule),
        Box::new(QueryParamRule),
        Box::new(LengthRule::new(max_length)),
    ]
}

/// Rules evaluated in a fixed order, stopping at the first failure.
pub struct RuleChain {
    rules: RwLock<Vec<Box<dyn ValidationRule>>>,
}

impl RuleChain {
    pub fn new(rules: Vec<Box<dyn ValidationRule>>) -> Self {
        Self {
            rules: RwLock::new(rules),
        }
    }

    pub fn with_defaults(max_length: usize) -> Self {
        Self::new(default_rules(max_length))
    }

    /// Append a rule after all existing ones.
    pub fn push(&self, rule: Box<dyn ValidationRule>) {
        self.rules
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(rule);
    }

    /// Run every rule from the first; the first failing rule's reason wins.
    pub fn evaluate(&self, candidate: &UrlCandidate<'_>) -> Result<(), ValidationError> {
        let rules = self
            .rules
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        for rule in rules.iter() {
            rule.apply(candidate)?;
        }
        Ok(())
    }

    pub fn names(&self) -> Vec<String> {
        self.rules
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .iter()
            .map(|r| r.name().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rules
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RuleChain {
    fn default() -> Self {
        Self::with_defaults(DEFAULT_MAX_URL_LENGTH)
    }
}
