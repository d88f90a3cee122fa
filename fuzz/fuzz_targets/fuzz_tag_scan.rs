#![no_main]

use clipscope::scan_tags;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut container = b"FWS".to_vec();
    container.extend_from_slice(data);
    let histogram = scan_tags(&container);
    assert!(histogram.end_offset <= container.len());
});
