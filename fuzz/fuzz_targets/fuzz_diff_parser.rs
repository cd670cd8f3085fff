#![no_main]

use covdiff_adapters_diff::parse_multi_file_diff;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        // Malformed diffs must come back as errors, never panics.
        let _ = parse_multi_file_diff(text);
    }
});
