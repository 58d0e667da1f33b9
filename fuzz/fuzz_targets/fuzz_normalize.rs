#![no_main]

use libfuzzer_sys::fuzz_target;
use linkguard::fuzz_api::normalize_url;

fuzz_target!(|data: &str| {
    // Canonical web URLs must be a fixed point
    if let Ok(once) = normalize_url(data) {
        if once.starts_with("http://") || once.starts_with("https://") {
            let twice = normalize_url(&once).expect("canonical URL must re-parse");
            assert_eq!(once, twice);
        }
    }
});
