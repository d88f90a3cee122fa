//! Decoders must stay total on arbitrary and mutated input.

use clipscope::styles::{find_style_candidates, parse_swf_like, parse_v1};
use clipscope::{
    InspectConfig, analyze, decompress_cws, inspect, parse_style_arrays, scan_signatures, scan_tags,
};
use proptest::prelude::*;

fn fws_prefixed(body: Vec<u8>) -> Vec<u8> {
    let mut data = b"FWS".to_vec();
    data.extend(body);
    data
}

proptest! {
    #[test]
    fn prop_signature_scan_sorted_and_capped(data in proptest::collection::vec(any::<u8>(), 0..4096)) {
        let matches = scan_signatures(&data);
        prop_assert!(matches.len() <= 50);
        prop_assert!(matches.windows(2).all(|w| w[0].offset <= w[1].offset));
        for m in &matches {
            prop_assert!(data[m.offset..].starts_with(m.kind.magic()));
        }
    }

    #[test]
    fn prop_tag_scan_never_panics(body in proptest::collection::vec(any::<u8>(), 0..2048)) {
        let data = fws_prefixed(body);
        let h = scan_tags(&data);
        prop_assert!(h.end_offset <= data.len());
        prop_assert_eq!(h.counts.values().map(|&c| c as u64).sum::<u64>(), h.total_tags as u64);
        prop_assert!(h.counts.keys().all(|&code| code <= 1023));
        prop_assert_eq!(scan_tags(&data), h);
    }

    #[test]
    fn prop_decompress_never_panics(body in proptest::collection::vec(any::<u8>(), 0..512)) {
        let mut data = b"CWS\x08".to_vec();
        data.extend(body);
        let _ = decompress_cws(&data);
    }

    #[test]
    fn prop_style_layouts_total(
        data in proptest::collection::vec(any::<u8>(), 0..1024),
        offset in 0usize..1100,
    ) {
        for result in [parse_v1(&data, offset), parse_swf_like(&data, offset)] {
            match result {
                Ok(styles) => {
                    prop_assert!(offset + styles.bytes_consumed <= data.len());
                    prop_assert!(styles.fills.len() <= styles.fill_count);
                    prop_assert!(styles.lines.len() <= styles.line_count);
                    if styles.fills.len() != styles.fill_count {
                        prop_assert!(!styles.warnings.is_empty());
                    }
                }
                Err(failure) => prop_assert_eq!(failure.style_offset, offset),
            }
        }
        let _ = parse_style_arrays(&data, offset);
        let _ = find_style_candidates(&data);
    }

    #[test]
    fn prop_stability_bounds(
        a in proptest::collection::vec(any::<u8>(), 0..256),
        b in proptest::collection::vec(any::<u8>(), 0..256),
        min_run in 0usize..80,
    ) {
        let report = analyze(&[a.clone(), b.clone()], min_run).unwrap();
        prop_assert_eq!(report.length, a.len().min(b.len()));
        prop_assert!(report.stable_byte_count <= report.length);
        prop_assert!(report.runs.len() <= 50);
        prop_assert!(report.runs.windows(2).all(|w| w[0].len >= w[1].len));
        for run in &report.runs {
            prop_assert!((run.start..run.end).all(|i| a[i] == b[i]));
        }
    }

    #[test]
    fn prop_inspect_never_panics(data in proptest::collection::vec(any::<u8>(), 0..2048)) {
        let report = inspect(&data, &InspectConfig::default());
        prop_assert_eq!(report.length, data.len());
    }
}

#[test]
fn test_every_single_byte_mutation_of_a_capture() {
    let mut base = b"CPicShape".to_vec();
    base.resize(0x50, 0);
    base.extend_from_slice(&[0x02, 0x00, 255, 0, 0, 255, 0, 255, 0, 255, 0x01, 0x00]);
    base.extend_from_slice(&[0, 0, 255, 255, 100, 0, 0, 0]);
    base.extend_from_slice(b"FWS\x08\x20\x00\x00\x00\x00\x00\x0c\x01\x00\x40\x00\x00\x00");

    for i in 0..base.len() {
        for flip in [0x01u8, 0x80, 0xFF] {
            let mut mutated = base.clone();
            mutated[i] ^= flip;
            let _ = inspect(&mutated, &InspectConfig::default());
        }
    }
}
