#![no_main]
use libfuzzer_sys::fuzz_target;

use rawmeta::jpeg::{JpegInfo, ParseMode};

fuzz_target!(|data: &[u8]| {
    let _ = JpegInfo::parse(&mut &data[..], ParseMode::InfoOnly);
    let _ = JpegInfo::parse(&mut &data[..], ParseMode::Full);
});
