#![no_main]

use clipscope::{InspectConfig, inspect};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = inspect(data, &InspectConfig::default());
});
