mod common;

use common::{calls, counting_validator};
use linkguard::{ManualClock, SystemClock, ValidationError, Validator, normalize_url};
use std::sync::Arc;
use std::time::Duration;

#[test]
fn test_not_a_url_is_parse_error() {
    let validator = Validator::new();
    assert!(!validator.validate("not a url"));
    assert!(matches!(
        validator.validate_with_reason("not a url"),
        Err(ValidationError::Parse(_))
    ));
}

#[test]
fn test_ftp_is_scheme_error() {
    let validator = Validator::new();
    assert!(matches!(
        validator.validate_with_reason("ftp://example.com"),
        Err(ValidationError::Scheme(_))
    ));
}

#[test]
fn test_missing_or_unsupported_schemes() {
    let validator = Validator::new();
    for raw in [
        "ftp://example.com",
        "file:///etc/passwd",
        "gopher://example.com/1",
        "data:text/plain,hello",
        "javascript:alert(1)",
    ] {
        assert!(
            matches!(
                validator.validate_with_reason(raw),
                Err(ValidationError::Scheme(_))
            ),
            "expected scheme error for {}",
            raw
        );
    }
}

#[test]
fn test_private_ip_rejected() {
    let validator = Validator::new();
    assert!(matches!(
        validator.validate_with_reason("http://192.168.1.1/admin"),
        Err(ValidationError::PrivateOrLoopbackIp(_))
    ));
    for raw in [
        "http://127.0.0.1/",
        "http://10.1.2.3/",
        "http://0.0.0.0/",
        "http://[::1]/",
        "http://[::]/",
    ] {
        assert!(!validator.validate(raw), "expected rejection for {}", raw);
    }
}

#[test]
fn test_normalize_scenario() {
    assert_eq!(
        normalize_url("http://Example.com:80/path/?utm_source=x").unwrap(),
        "http://example.com/path"
    );
}

#[test]
fn test_overlong_url_rejected() {
    let validator = Validator::new();
    let raw = format!("https://example.com/{}", "a".repeat(3000));
    assert!(matches!(
        validator.validate_with_reason(&raw),
        Err(ValidationError::LengthExceeded { .. })
    ));
}

#[test]
fn test_block_host_case_insensitive() {
    let validator = Validator::new();
    validator.block_host("evil.com");
    for raw in ["http://evil.com/x", "https://EVIL.com/y"] {
        assert!(
            matches!(
                validator.validate_with_reason(raw),
                Err(ValidationError::BlockedHost(_))
            ),
            "expected blocked host for {}",
            raw
        );
    }
}

#[test]
fn test_malformed_pattern_leaves_list_unchanged() {
    let validator = Validator::new();
    let before = validator.blocked_patterns();
    assert!(matches!(
        validator.block_pattern("*invalid("),
        Err(ValidationError::Configuration(_))
    ));
    assert_eq!(validator.blocked_patterns(), before);
}

#[test]
fn test_repeat_validation_hits_cache() {
    let (validator, counter) = counting_validator(Arc::new(SystemClock));
    let first = validator.validate_with_reason("https://example.com/page");
    let second = validator.validate_with_reason("https://example.com/page");
    assert_eq!(first, second);
    assert_eq!(calls(&counter), 1);
}

#[test]
fn test_expiry_reruns_rule_chain() {
    let clock = Arc::new(ManualClock::new());
    let (validator, counter) = counting_validator(clock.clone());
    assert!(validator.validate("https://example.com/page"));
    assert_eq!(calls(&counter), 1);

    clock.advance(Duration::from_secs(600));
    assert!(validator.validate("https://example.com/page"));
    assert_eq!(calls(&counter), 2);
}

#[test]
fn test_normalized_output_validates() {
    let validator = Validator::new();
    let canonical = validator
        .normalize_url("HTTP://WWW.GitHub.com:80/rust-lang/?utm_campaign=x&tab=repos")
        .unwrap();
    assert_eq!(canonical, "https://www.github.com/rust-lang?tab=repos");
    assert!(validator.validate(&canonical));
}
