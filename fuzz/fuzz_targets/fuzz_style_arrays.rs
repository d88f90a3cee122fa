#![no_main]

use clipscope::styles::{DEFAULT_STYLE_OFFSET, find_style_candidates, parse_style_arrays};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = parse_style_arrays(data, DEFAULT_STYLE_OFFSET);
    if let Some((&first, rest)) = data.split_first() {
        let _ = parse_style_arrays(rest, first as usize);
    }
    let _ = find_style_candidates(data);
});
