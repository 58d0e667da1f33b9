mod common;

use common::{calls, counting_validator};
use linkguard::{SystemClock, ValidationError, Validator, ValidatorConfig};
use std::sync::{Arc, Barrier};
use std::thread;

const READERS: usize = 8;
const WRITERS: usize = 4;
const ITERATIONS: usize = 200;

#[test]
fn test_readers_and_admin_writers_do_not_deadlock_or_lose_updates() {
    let validator = Arc::new(Validator::new());
    let base_hosts = validator.blocked_host_count();
    let base_patterns = validator.blocked_pattern_count();
    let barrier = Arc::new(Barrier::new(READERS + WRITERS));

    let mut handles = Vec::new();
    for r in 0..READERS {
        let validator = validator.clone();
        let barrier = barrier.clone();
        handles.push(thread::spawn(move || {
            barrier.wait();
            for i in 0..ITERATIONS {
                let raw = format!("https://site{}.example.com/page/{}", r, i % 20);
                let _ = validator.validate_with_reason(&raw);
                let _ = validator.is_safe(&raw);
                let _ = validator.normalize_url(&raw);
            }
        }));
    }
    for w in 0..WRITERS {
        let validator = validator.clone();
        let barrier = barrier.clone();
        handles.push(thread::spawn(move || {
            barrier.wait();
            for i in 0..ITERATIONS {
                validator.block_host(&format!("blocked-{}-{}.example.net", w, i));
                if i % 10 == 0 {
                    validator
                        .block_pattern(&format!("never-matches-{}-{}", w, i))
                        .unwrap();
                }
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(
        validator.blocked_host_count(),
        base_hosts + WRITERS * ITERATIONS
    );
    assert_eq!(
        validator.blocked_pattern_count(),
        base_patterns + WRITERS * (ITERATIONS / 10)
    );
    assert!(matches!(
        validator.validate_with_reason("https://blocked-3-199.example.net/"),
        Err(ValidationError::BlockedHost(_))
    ));
}

#[test]
fn test_concurrent_validation_agrees_with_serial() {
    let validator = Arc::new(Validator::new());
    let inputs: Arc<Vec<String>> = Arc::new(vec![
        "https://example.com/".into(),
        "ftp://example.com/".into(),
        "http://10.0.0.1/".into(),
        "not a url".into(),
        "https://example.com/tool.exe".into(),
        format!("https://example.com/{}", "x".repeat(3000)),
    ]);
    let expected: Vec<bool> = {
        let fresh = Validator::new();
        inputs.iter().map(|raw| fresh.validate(raw)).collect()
    };

    let handles: Vec<_> = (0..READERS)
        .map(|_| {
            let validator = validator.clone();
            let inputs = inputs.clone();
            thread::spawn(move || {
                (0..ITERATIONS)
                    .map(|i| {
                        let idx = i % inputs.len();
                        (idx, validator.validate(&inputs[idx]))
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    for handle in handles {
        for (idx, verdict) in handle.join().unwrap() {
            assert_eq!(verdict, expected[idx], "mismatch for {}", inputs[idx]);
        }
    }
}

#[test]
fn test_sweeps_under_sustained_inserts() {
    let config = ValidatorConfig {
        sweep_every: 3,
        ..Default::default()
    };
    let validator = Arc::new(Validator::from_config(&config).unwrap());
    let handles: Vec<_> = (0..READERS)
        .map(|r| {
            let validator = validator.clone();
            thread::spawn(move || {
                for i in 0..ITERATIONS {
                    assert!(validator.validate(&format!("https://r{}.example.com/{}", r, i)));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    // Nothing has expired, so sweeps must not have dropped live entries
    assert_eq!(validator.cache_len(), READERS * ITERATIONS);
}

#[test]
fn test_shared_cache_runs_chain_once_per_key() {
    let (validator, counter) = counting_validator(Arc::new(SystemClock));
    let validator = Arc::new(validator);
    // Warm the cache so every thread below is served from it
    assert!(validator.validate("https://example.com/shared"));

    let handles: Vec<_> = (0..READERS)
        .map(|_| {
            let validator = validator.clone();
            thread::spawn(move || {
                for _ in 0..ITERATIONS {
                    assert!(validator.validate("https://example.com/shared"));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(calls(&counter), 1);
}
