pub mod blocklist;
pub mod cache;
pub mod candidate;
pub mod rules;

use std::sync::Arc;

use tracing::debug;

pub use blocklist::BlocklistMatcher;
pub use cache::{Clock, ManualClock, SystemClock, ValidationCache};
pub use candidate::UrlCandidate;
pub use rules::{
    HostRule, LengthRule, PathRule, QueryParamRule, RuleChain, SchemeRule, ValidationRule,
};

use crate::config::ValidatorConfig;
use crate::errors::{ValidationError, ValidationOutcome};
use crate::normalize::Normalizer;

/// Hosts longer than this look suspicious to [`Validator::is_safe`].
const SUSPICIOUS_HOST_LENGTH: usize = 50;
/// More dots than this in a host look suspicious to [`Validator::is_safe`].
const SUSPICIOUS_HOST_DOTS: usize = 4;

/// Validates, blocklists and normalizes user-supplied URLs.
///
/// One instance is meant to be shared (usually behind an `Arc`) by every
/// request handler. The rule chain, blocklist and cache each sit behind
/// their own reader/writer lock, so lookups run concurrently and
/// administrative changes only exclude readers of the structure they touch.
///
/// Verdicts are memoized per raw input string until the cache TTL expires.
pub struct Validator {
    rules: RuleChain,
    blocklist: BlocklistMatcher,
    cache: ValidationCache,
    normalizer: Normalizer,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator {
    /// A validator with default settings and the built-in blocklist seed.
    pub fn new() -> Self {
        let config = ValidatorConfig::default();
        Self::assemble(
            &config,
            BlocklistMatcher::with_defaults(),
            Arc::new(SystemClock),
        )
    }

    /// Build from a config. Fails if the config is invalid or any blocked
    /// pattern does not compile.
    pub fn from_config(config: &ValidatorConfig) -> Result<Self, ValidationError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Like [`Validator::from_config`] with an explicit clock for cache expiry.
    pub fn with_clock(
        config: &ValidatorConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ValidationError> {
        config.validate()?;
        let blocklist =
            BlocklistMatcher::from_lists(&config.blocked_hosts, &config.blocked_patterns)?;
        Ok(Self::assemble(config, blocklist, clock))
    }

    fn assemble(
        config: &ValidatorConfig,
        blocklist: BlocklistMatcher,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            rules: RuleChain::with_defaults(config.max_url_length),
            blocklist,
            cache: ValidationCache::with_clock(config.cache_ttl(), config.sweep_every, clock),
            normalizer: Normalizer::with_https_hosts(&config.https_upgrade_hosts),
        }
    }

    pub fn validate(&self, raw: &str) -> bool {
        self.validate_with_reason(raw).is_ok()
    }

    /// Validate `raw`, returning the reason on rejection.
    ///
    /// A cached verdict is returned as-is. Otherwise the input is parsed,
    /// checked against the blocklisted hosts and patterns, then run through
    /// the rule chain; the verdict is cached either way, unless an
    /// administrative change landed while it was being computed.
    pub fn validate_with_reason(&self, raw: &str) -> ValidationOutcome {
        if let Some(outcome) = self.cache.get(raw) {
            return outcome;
        }

        // Admin changes clear the cache; a verdict that straddles one is
        // returned but not stored.
        let generation = self.cache.generation();
        let outcome = self.evaluate(raw);
        if let Err(reason) = &outcome {
            debug!("URL rejected: {}", reason);
        }
        if !self.cache.set_if_current(raw, outcome.clone(), generation) {
            debug!("policy changed during validation, not caching verdict");
        }
        outcome
    }

    fn evaluate(&self, raw: &str) -> ValidationOutcome {
        let candidate = UrlCandidate::parse(raw)?;
        if let Some(host) = candidate.host_str() {
            self.blocklist.check_host(host)?;
        }
        self.blocklist.check_pattern(raw)?;
        self.rules.evaluate(&candidate)
    }

    /// Best-effort phishing heuristic. Not authoritative and never cached.
    ///
    /// Fails unparsable and blocklisted URLs, URLs containing `http` more
    /// than once, and hosts that are very long or deeply nested.
    pub fn is_safe(&self, raw: &str) -> bool {
        let Ok(candidate) = UrlCandidate::parse(raw) else {
            return false;
        };
        let host = candidate.host_str().unwrap_or_default();
        if self.blocklist.check_host(host).is_err() || self.blocklist.check_pattern(raw).is_err() {
            return false;
        }
        !looks_like_phishing(raw, host)
    }

    /// Canonical form of `raw`. Independent of the cache and blocklist.
    pub fn normalize_url(&self, raw: &str) -> Result<String, ValidationError> {
        self.normalizer.normalize(raw)
    }

    /// Append a rule to the end of the chain and drop cached verdicts.
    pub fn add_rule(&self, rule: Box<dyn ValidationRule>) {
        debug!("adding validation rule '{}'", rule.name());
        self.rules.push(rule);
        self.cache.clear();
    }

    /// Block a host (case-insensitive exact match) and drop cached verdicts.
    pub fn block_host(&self, host: &str) {
        self.blocklist.block_host(host);
        self.cache.clear();
    }

    /// Block URLs matching `pattern`. An invalid pattern is rejected with
    /// [`ValidationError::Configuration`] and leaves the blocklist unchanged.
    pub fn block_pattern(&self, pattern: &str) -> Result<(), ValidationError> {
        self.blocklist.block_pattern(pattern)?;
        self.cache.clear();
        Ok(())
    }

    pub fn rule_names(&self) -> Vec<String> {
        self.rules.names()
    }

    pub fn blocked_host_count(&self) -> usize {
        self.blocklist.host_count()
    }

    pub fn blocked_pattern_count(&self) -> usize {
        self.blocklist.pattern_count()
    }

    pub fn blocked_patterns(&self) -> Vec<String> {
        self.blocklist.patterns()
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

fn looks_like_phishing(raw: &str, host: &str) -> bool {
    raw.to_ascii_lowercase().matches("http").count() > 1
        || host.len() > SUSPICIOUS_HOST_LENGTH
        || host.matches('.').count() > SUSPICIOUS_HOST_DOTS
}
