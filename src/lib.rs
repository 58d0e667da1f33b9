#![warn(clippy::pedantic)]
// Noisy doc/signature lints
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
// Keep format!("{}", x) for complex exprs
#![allow(clippy::uninlined_format_args)]
// validator::ValidatorConfig style names
#![allow(clippy::module_name_repetitions)]

//! URL validation and caching engine for link shorteners.
//!
//! [`Validator`] decides whether a user-supplied URL is well formed, within
//! policy and not blocklisted, memoizing verdicts per raw input for a TTL.
//! [`normalize_url`] produces the canonical form used for deduplication.

pub mod config;
pub mod errors;
pub mod normalize;
pub mod validator;

pub use config::{ValidatorConfig, load_config};
pub use errors::{ValidationError, ValidationOutcome};
pub use normalize::{Normalizer, normalize_url};
pub use validator::{
    BlocklistMatcher, Clock, HostRule, LengthRule, ManualClock, PathRule, QueryParamRule,
    RuleChain, SchemeRule, SystemClock, UrlCandidate, ValidationCache, ValidationRule, Validator,
};

/// Re-exports for fuzz targets. Not part of the public API.
#[doc(hidden)]
pub mod fuzz_api {
    pub use crate::normalize::normalize_url;

    /// Run a raw input through a fresh default validator.
    pub fn validate(raw: &str) -> bool {
        crate::Validator::new().validate(raw)
    }
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
