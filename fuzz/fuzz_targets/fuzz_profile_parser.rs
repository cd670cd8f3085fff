#![no_main]

use covdiff_adapters_coverage::parse_profiles;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(profiles) = parse_profiles(text) {
            // Every accepted block starts before it ends.
            for profile in &profiles {
                for b in &profile.blocks {
                    assert!((b.start_line, b.start_col) <= (b.end_line, b.end_col));
                }
            }
        }
    }
});
