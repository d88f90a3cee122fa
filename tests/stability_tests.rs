use clipscope::stability::{DEFAULT_MIN_RUN_LEN, diff_ranges};
use clipscope::{InspectError, analyze};

fn ten_bytes() -> Vec<u8> {
    (0..10u8).map(|i| i * 3 + 1).collect()
}

#[test]
fn test_single_differing_offset() {
    let a = ten_bytes();
    let b = ten_bytes();
    let mut c = ten_bytes();
    c[5] ^= 0x80;

    let report = analyze(&[a, b, c], 1).unwrap();
    assert_eq!(report.sample_count, 3);
    assert_eq!(report.length, 10);
    assert_eq!(report.stable_byte_count, 9);
    assert!((report.stable_fraction - 0.9).abs() < 1e-12);
    assert!(!report.is_stable(5));
    assert_eq!(report.stable_bytes[5], 0);
    assert_eq!(report.stable_bytes[4], ten_bytes()[4]);
    for run in &report.runs {
        assert!(!(run.start..run.end).contains(&5));
    }
    assert_eq!(report.runs.len(), 2);
    assert_eq!(report.runs[0].start, 0);
    assert_eq!(report.runs[0].len, 5);
    assert_eq!(report.runs[1].start, 6);
    assert_eq!(report.runs[1].len, 4);
}

#[test]
fn test_lengths_are_truncated_to_shortest() {
    let samples = vec![vec![1u8; 10], vec![1u8; 12], vec![1u8; 8]];
    let report = analyze(&samples, DEFAULT_MIN_RUN_LEN).unwrap();
    assert_eq!(report.length, 8);
    assert_eq!(report.stable_byte_count, 8);
    assert_eq!(report.stable_bytes.len(), 8);
    // Below the default minimum run length.
    assert!(report.runs.is_empty());
}

#[test]
fn test_default_min_run_len_filters_short_runs() {
    let mut a = vec![0xAAu8; 300];
    let mut b = a.clone();
    // Variable bytes at 100 and 140 leave a 39-byte run between them.
    a[100] = 1;
    b[100] = 2;
    a[140] = 1;
    b[140] = 2;

    let report = analyze(&[a, b], DEFAULT_MIN_RUN_LEN).unwrap();
    let spans: Vec<(usize, usize)> = report.runs.iter().map(|r| (r.start, r.end)).collect();
    assert_eq!(spans, vec![(141, 300), (0, 100)]);
}

#[test]
fn test_one_sample_is_rejected() {
    let samples = vec![vec![0u8; 4]];
    assert_eq!(analyze(&samples, 1), Err(InspectError::NotEnoughSamples(1)));
}

#[test]
fn test_diff_ranges_across_three_samples() {
    let a = vec![0u8; 16];
    let mut b = a.clone();
    let mut c = a.clone();
    b[3] = 1;
    c[4] = 1;
    c[15] = 9;

    assert_eq!(diff_ranges(&[a, b, c]), vec![3..=4, 15..=15]);
}
