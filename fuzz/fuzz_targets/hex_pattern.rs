//! Fuzz target for hex pattern parsing with arbitrary string input.
//!
//! Parsed patterns must be non-empty and must format back to a string that
//! parses to the same bytes.
//!
//! Run with: cargo +nightly fuzz run hex_pattern

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if let Ok(bytes) = hexlay::search::parse_hex_bytes(input) {
            assert!(!bytes.is_empty(), "Empty pattern accepted: {:?}", input);

            let formatted: Vec<String> = bytes.iter().map(|b| format!("{:02X}", b)).collect();
            let reparsed = hexlay::search::parse_hex_bytes(&formatted.join(" "))
                .expect("Formatted pattern failed to parse");
            assert_eq!(reparsed, bytes);
        }
    }
});
