#![allow(dead_code)]

use linkguard::{Clock, UrlCandidate, ValidationError, ValidationRule, Validator, ValidatorConfig};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A rule that always passes and counts how often it ran.
pub struct CountingRule {
    pub calls: Arc<AtomicUsize>,
}

impl ValidationRule for CountingRule {
    fn name(&self) -> &str {
        "counting"
    }

    fn apply(&self, _candidate: &UrlCandidate<'_>) -> Result<(), ValidationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A default-config validator with a [`CountingRule`] appended to its chain.
pub fn counting_validator(clock: Arc<dyn Clock>) -> (Validator, Arc<AtomicUsize>) {
    let validator = Validator::with_clock(&ValidatorConfig::default(), clock).unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    validator.add_rule(Box::new(CountingRule {
        calls: calls.clone(),
    }));
    (validator, calls)
}

pub fn calls(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}
