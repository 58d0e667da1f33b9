use std::collections::HashSet;
use std::sync::RwLock;

use regex::{Regex, RegexBuilder};
use tracing::{info, warn};

use crate::errors::ValidationError;

/// Example hosts blocked on every fresh validator.
pub const DEFAULT_BLOCKED_HOSTS: &[&str] = &[
    "malware-example.com",
    "phishing-example.com",
    "spam-example.net",
    "evil.example",
];

/// Patterns matched against the raw URL string, in this order.
pub const DEFAULT_BLOCKED_PATTERNS: &[&str] = &[
    // Executables and scripts
    r"(?i)\.(?:exe|scr|bat|cmd|msi|vbs|ps1|jar|apk)(?:[?#]|$)",
    // Archives
    r"(?i)\.(?:zip|rar|7z|tgz|tar\.gz)(?:[?#]|$)",
    // A bare hex hash (md5 through sha256) as the entire path, optionally
    // with an extension. Hashes deeper in the path (commit ids, asset ids)
    // are left alone.
    r"(?i)^[a-z][a-z0-9+.-]*://[^/?#]+/[0-9a-f]{32,64}(?:\.[a-z0-9]{1,5})?(?:[?#]|$)",
];

/// Upper bound on the source length of a registered pattern.
const MAX_PATTERN_LEN: usize = 512;
/// Upper bound on the compiled program size of a registered pattern.
const PATTERN_SIZE_LIMIT: usize = 1 << 20;

struct BlockedPattern {
    source: String,
    regex: Regex,
}

#[derive(Default)]
struct BlocklistSet {
    /// Lowercased, without trailing dot.
    hosts: HashSet<String>,
    patterns: Vec<BlockedPattern>,
}

/// Exact-host and regex denylist consulted before the rule chain.
///
/// Matching uses the `regex` crate, whose engine runs in time linear in the
/// input, and registration additionally caps pattern size.
pub struct BlocklistMatcher {
    inner: RwLock<BlocklistSet>,
}

impl Default for BlocklistMatcher {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl BlocklistMatcher {
    /// An empty blocklist.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(BlocklistSet::default()),
        }
    }

    /// Seeded with [`DEFAULT_BLOCKED_HOSTS`] and [`DEFAULT_BLOCKED_PATTERNS`].
    pub fn with_defaults() -> Self {
        let patterns = DEFAULT_BLOCKED_PATTERNS
            .iter()
            .filter_map(|pattern| match compile_pattern(pattern) {
                Ok(regex) => Some(BlockedPattern {
                    source: (*pattern).to_string(),
                    regex,
                }),
                Err(e) => {
                    warn!("failed to compile default blocklist pattern: {}", e);
                    None
                }
            })
            .collect();
        let hosts = DEFAULT_BLOCKED_HOSTS
            .iter()
            .filter_map(|h| canonical_host(h))
            .collect();
        Self {
            inner: RwLock::new(BlocklistSet { hosts, patterns }),
        }
    }

    /// Build from explicit lists. Fails on the first pattern that does not
    /// compile; nothing is partially registered.
    pub fn from_lists<H, P>(hosts: H, patterns: P) -> Result<Self, ValidationError>
    where
        H: IntoIterator,
        H::Item: AsRef<str>,
        P: IntoIterator,
        P::Item: AsRef<str>,
    {
        let mut set = BlocklistSet::default();
        for host in hosts {
            if let Some(host) = canonical_host(host.as_ref()) {
                set.hosts.insert(host);
            }
        }
        for pattern in patterns {
            let source = pattern.as_ref();
            set.patterns.push(BlockedPattern {
                source: source.to_string(),
                regex: compile_pattern(source)?,
            });
        }
        info!(
            "blocklist seeded with {} hosts and {} patterns",
            set.hosts.len(),
            set.patterns.len()
        );
        Ok(Self {
            inner: RwLock::new(set),
        })
    }

    /// Block an exact host, case-insensitively.
    pub fn block_host(&self, host: &str) {
        let Some(host) = canonical_host(host) else {
            warn!("ignoring empty blocked host");
            return;
        };
        info!("blocking host '{}'", host);
        self.inner
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .hosts
            .insert(host);
    }

    /// Compile and append a pattern. A pattern that fails to compile is
    /// rejected with [`ValidationError::Configuration`] and not added.
    pub fn block_pattern(&self, pattern: &str) -> Result<(), ValidationError> {
        let regex = match compile_pattern(pattern) {
            Ok(regex) => regex,
            Err(e) => {
                warn!("rejected blocklist pattern: {}", e);
                return Err(e);
            }
        };
        info!("blocking pattern '{}'", pattern);
        self.inner
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .patterns
            .push(BlockedPattern {
                source: pattern.to_string(),
                regex,
            });
        Ok(())
    }

    /// Exact membership check on the host.
    pub fn check_host(&self, host: &str) -> Result<(), ValidationError> {
        let Some(host) = canonical_host(host) else {
            return Ok(());
        };
        let set = self
            .inner
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if set.hosts.contains(&host) {
            return Err(ValidationError::BlockedHost(host));
        }
        Ok(())
    }

    /// Test the raw URL against each pattern in registration order; the
    /// first match is reported.
    pub fn check_pattern(&self, raw: &str) -> Result<(), ValidationError> {
        let set = self
            .inner
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        match set.patterns.iter().find(|p| p.regex.is_match(raw)) {
            Some(pattern) => Err(ValidationError::BlockedPattern(pattern.source.clone())),
            None => Ok(()),
        }
    }

    pub fn host_count(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .hosts
            .len()
    }

    pub fn pattern_count(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .patterns
            .len()
    }

    /// Registered pattern sources in match order.
    pub fn patterns(&self) -> Vec<String> {
        self.inner
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .patterns
            .iter()
            .map(|p| p.source.clone())
            .collect()
    }
}

fn canonical_host(host: &str) -> Option<String> {
    let host = host.trim();
    let host = host.strip_suffix('.').unwrap_or(host);
    if host.is_empty() {
        return None;
    }
    Some(host.to_lowercase())
}

fn compile_pattern(pattern: &str) -> Result<Regex, ValidationError> {
    if pattern.len() > MAX_PATTERN_LEN {
        return Err(ValidationError::Configuration(format!(
            "blocklist pattern is {} bytes, limit is {}",
            pattern.len(),
            MAX_PATTERN_LEN
        )));
    }
    RegexBuilder::new(pattern)
        .size_limit(PATTERN_SIZE_LIMIT)
        .build()
        .map_err(|e| {
            ValidationError::Configuration(format!("invalid blocklist pattern '{}': {}", pattern, e))
        })
}
