#![no_main]
use libfuzzer_sys::fuzz_target;
use sampler_core::protocol::{decode, decode_transcript, line_text};

fuzz_target!(|data: &[u8]| {
    let text = line_text(data);
    let lines: Vec<&str> = text.split('\n').collect();

    if let Ok(Some(sample)) = decode(&lines) {
        assert!(sample.value.is_finite());
        assert!(sample.value >= 0.0);
    }
    for sample in decode_transcript(lines.iter().copied()).into_iter().flatten() {
        assert!(sample.value.is_finite());
    }
});
