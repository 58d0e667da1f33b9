use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::ValidationError;
use crate::normalize::DEFAULT_HTTPS_HOSTS;
use crate::validator::blocklist::{DEFAULT_BLOCKED_HOSTS, DEFAULT_BLOCKED_PATTERNS};

/// Tunables for a [`crate::Validator`] instance.
///
/// Every field has a default so an empty JSON object is a complete config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// How long a validation verdict stays cached.
    #[serde(default = "default_cache_ttl_secs", rename = "cacheTtlSecs")]
    pub cache_ttl_secs: u64,
    /// Longest raw URL (in bytes) accepted by the length rule.
    #[serde(default = "default_max_url_length", rename = "maxUrlLength")]
    pub max_url_length: usize,
    /// Run an expired-entry sweep after every N cache insertions.
    #[serde(default = "default_sweep_every", rename = "sweepEvery")]
    pub sweep_every: u64,
    #[serde(default = "default_blocked_hosts", rename = "blockedHosts")]
    pub blocked_hosts: Vec<String>,
    /// Regexes tested against the raw URL string, in order.
    #[serde(default = "default_blocked_patterns", rename = "blockedPatterns")]
    pub blocked_patterns: Vec<String>,
    /// Hosts known to serve HTTPS; `http` URLs to them are upgraded by the
    /// normalizer. Static table only, nothing is probed over the network.
    #[serde(default = "default_https_upgrade_hosts", rename = "httpsUpgradeHosts")]
    pub https_upgrade_hosts: Vec<String>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_cache_ttl_secs(),
            max_url_length: default_max_url_length(),
            sweep_every: default_sweep_every(),
            blocked_hosts: default_blocked_hosts(),
            blocked_patterns: default_blocked_patterns(),
            https_upgrade_hosts: default_https_upgrade_hosts(),
        }
    }
}

fn default_cache_ttl_secs() -> u64 {
    600
}

fn default_max_url_length() -> usize {
    2048
}

fn default_sweep_every() -> u64 {
    100
}

fn default_blocked_hosts() -> Vec<String> {
    DEFAULT_BLOCKED_HOSTS.iter().map(|h| (*h).to_string()).collect()
}

fn default_blocked_patterns() -> Vec<String> {
    DEFAULT_BLOCKED_PATTERNS
        .iter()
        .map(|p| (*p).to_string())
        .collect()
}

fn default_https_upgrade_hosts() -> Vec<String> {
    DEFAULT_HTTPS_HOSTS.iter().map(|h| (*h).to_string()).collect()
}

impl ValidatorConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.cache_ttl_secs == 0 {
            return Err(ValidationError::Configuration(
                "cacheTtlSecs must be > 0".into(),
            ));
        }
        if self.max_url_length == 0 {
            return Err(ValidationError::Configuration(
                "maxUrlLength must be > 0".into(),
            ));
        }
        if self.sweep_every == 0 {
            return Err(ValidationError::Configuration(
                "sweepEvery must be > 0".into(),
            ));
        }
        if let Some(host) = self.blocked_hosts.iter().find(|h| h.trim().is_empty()) {
            return Err(ValidationError::Configuration(format!(
                "blockedHosts contains an empty entry: {:?}",
                host
            )));
        }
        Ok(())
    }
}
