use thiserror::Error;

/// Verdicts and failures produced by the validation engine.
///
/// Every variant except [`ValidationError::Configuration`] is an ordinary
/// rejection of hostile or malformed input and is returned as a value.
/// `Configuration` signals a deployment mistake (for example a blocklist
/// pattern that does not compile) and should be surfaced to whoever is
/// administering the validator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid URL: {0}")]
    Parse(#[from] url::ParseError),

    #[error("unsupported scheme '{0}': only http and https are allowed")]
    Scheme(String),

    #[error("invalid host: {0}")]
    HostFormat(String),

    #[error("host {0} is a private, loopback or unspecified address")]
    PrivateOrLoopbackIp(String),

    #[error("host '{0}' is blocked")]
    BlockedHost(String),

    #[error("URL matches blocked pattern '{0}'")]
    BlockedPattern(String),

    #[error("path contains disallowed characters: {0}")]
    PathFormat(String),

    #[error("query too complex: {0}")]
    QueryTooComplex(String),

    #[error("URL is {length} bytes, exceeding the {max} byte limit")]
    LengthExceeded { length: usize, max: usize },

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Outcome of validating one raw URL string: `Ok(())` when valid.
pub type ValidationOutcome = Result<(), ValidationError>;

impl ValidationError {
    /// Whether this error is a configuration mistake rather than a rejection.
    pub fn is_configuration(&self) -> bool {
        matches!(self, ValidationError::Configuration(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_error_display() {
        let err = ValidationError::Configuration("bad regex".into());
        assert_eq!(err.to_string(), "Configuration error: bad regex");
        assert!(err.is_configuration());
    }

    #[test]
    fn parse_error_from_url() {
        let err: ValidationError = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, ValidationError::Parse(_)));
        assert!(!err.is_configuration());
    }

    #[test]
    fn length_exceeded_display() {
        let err = ValidationError::LengthExceeded {
            length: 3020,
            max: 2048,
        };
        assert_eq!(
            err.to_string(),
            "URL is 3020 bytes, exceeding the 2048 byte limit"
        );
    }

    #[test]
    fn blocked_pattern_embeds_pattern() {
        let err = ValidationError::BlockedPattern(r"\.exe$".into());
        assert!(err.to_string().contains(r"\.exe$"));
    }

    #[test]
    fn rejections_are_not_configuration() {
        for err in [
            ValidationError::Scheme("ftp".into()),
            ValidationError::HostFormat("empty".into()),
            ValidationError::BlockedHost("evil.com".into()),
        ] {
            assert!(!err.is_configuration());
        }
    }
}
