#![no_main]

use clipscope::{decompress_cws, scan_tags};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut container = b"CWS".to_vec();
    container.extend_from_slice(data);
    if let Ok(expanded) = decompress_cws(&container) {
        let _ = scan_tags(&expanded);
    }
});
