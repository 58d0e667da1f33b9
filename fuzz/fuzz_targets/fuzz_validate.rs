#![no_main]

use libfuzzer_sys::fuzz_target;
use linkguard::fuzz_api::validate;

fuzz_target!(|data: &str| {
    let _ = validate(data);
});
