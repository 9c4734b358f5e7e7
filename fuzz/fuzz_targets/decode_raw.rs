#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let decoder = if let Ok(d) = rawmeta::decoder::Decoder::new(std::io::Cursor::new(data)) {
        d
    } else {
        return;
    };

    let mut limits = rawmeta::decoder::Limits::default();
    limits.max_directories = 32;
    limits.max_depth = 8;

    let _ = decoder.with_limits(limits).decode();
});
