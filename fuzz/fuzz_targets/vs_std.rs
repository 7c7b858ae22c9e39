#![no_main]
use libfuzzer_sys::fuzz_target;

// Differential target: on inputs the standard library also accepts as a
// whole, the converted value must agree bit for bit.
fuzz_target!(|data: &[u8]| {
    let parsed = dtod::parse(data);
    assert!(parsed.consumed <= data.len());
    if parsed.status != dtod::Status::Ok || parsed.consumed < data.len() {
        return;
    }
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(reference) = s.trim_start().parse::<f64>() {
            assert_eq!(parsed.value.to_bits(), reference.to_bits());
        }
    }
});
