//! Byte-level comparison of repeated captures.
//!
//! Copying the same shape to the clipboard several times yields payloads that
//! differ only in volatile fields (timestamps, handles, padding). Offsets that
//! agree across every capture are the ones worth reverse-engineering.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::ops::{Range, RangeInclusive};

use crate::error::{InspectError, Result};
use crate::styles::DEFAULT_STYLE_OFFSET;

pub const DEFAULT_MIN_RUN_LEN: usize = 64;
pub const MAX_REPORTED_RUNS: usize = 50;

/// Window assumed to hold the style tables; excluded from the geometry hash.
pub const STYLE_WINDOW: Range<usize> = DEFAULT_STYLE_OFFSET..0x80;

/// A maximal range of offsets that agree across all samples. `end` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StableRun {
    pub start: usize,
    pub end: usize,
    pub len: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StabilityReport {
    pub sample_count: usize,
    /// Length of the shortest sample; all samples are compared up to here.
    pub length: usize,
    pub stable_byte_count: usize,
    pub stable_fraction: f64,
    /// Common value at each stable offset, 0 elsewhere.
    #[serde(skip)]
    pub stable_bytes: Vec<u8>,
    #[serde(skip)]
    pub stable_mask: Vec<bool>,
    pub runs: Vec<StableRun>,
}

impl StabilityReport {
    #[inline]
    pub fn is_stable(&self, offset: usize) -> bool {
        self.stable_mask.get(offset).copied().unwrap_or(false)
    }

    /// Mask as bytes, 1 for stable and 0 for variable offsets.
    pub fn mask_bytes(&self) -> Vec<u8> {
        self.stable_mask.iter().map(|&s| s as u8).collect()
    }
}

/// Classifies each offset of the common prefix as stable or variable.
///
/// Samples of different length are not an error: volatile fields change the
/// payload size, so everything is truncated to the shortest sample.
pub fn analyze<S: AsRef<[u8]>>(samples: &[S], min_run_len: usize) -> Result<StabilityReport> {
    if samples.len() < 2 {
        return Err(InspectError::NotEnoughSamples(samples.len()));
    }

    let length = samples.iter().map(|s| s.as_ref().len()).min().unwrap_or(0);
    let first = &samples[0].as_ref()[..length];

    let mut stable_bytes = vec![0u8; length];
    let mut stable_mask = vec![false; length];
    let mut stable_byte_count = 0;

    for (i, &value) in first.iter().enumerate() {
        if samples[1..].iter().all(|s| s.as_ref()[i] == value) {
            stable_bytes[i] = value;
            stable_mask[i] = true;
            stable_byte_count += 1;
        }
    }

    let stable_fraction = if length == 0 {
        0.0
    } else {
        stable_byte_count as f64 / length as f64
    };

    let runs = stable_runs(&stable_mask, min_run_len);

    tracing::debug!(
        samples = samples.len(),
        length,
        stable_byte_count,
        runs = runs.len(),
        "stability analysis finished"
    );

    Ok(StabilityReport {
        sample_count: samples.len(),
        length,
        stable_byte_count,
        stable_fraction,
        stable_bytes,
        stable_mask,
        runs,
    })
}

fn stable_runs(mask: &[bool], min_run_len: usize) -> Vec<StableRun> {
    let min_run_len = min_run_len.max(1);
    let mut runs = Vec::new();
    let mut i = 0;

    while i < mask.len() {
        if !mask[i] {
            i += 1;
            continue;
        }
        let start = i;
        while i < mask.len() && mask[i] {
            i += 1;
        }
        let len = i - start;
        if len >= min_run_len {
            runs.push(StableRun { start, end: i, len });
        }
    }

    runs.sort_by(|a, b| b.len.cmp(&a.len).then(a.start.cmp(&b.start)));
    runs.truncate(MAX_REPORTED_RUNS);
    runs
}

/// Inclusive ranges of consecutive offsets where at least two samples differ.
pub fn diff_ranges<S: AsRef<[u8]>>(samples: &[S]) -> Vec<RangeInclusive<usize>> {
    let Some(length) = samples.iter().map(|s| s.as_ref().len()).min() else {
        return Vec::new();
    };

    let mut ranges: Vec<RangeInclusive<usize>> = Vec::new();
    let mut open: Option<usize> = None;

    for i in 0..length {
        let first = samples[0].as_ref()[i];
        let differs = samples[1..].iter().any(|s| s.as_ref()[i] != first);
        match (differs, open) {
            (true, None) => open = Some(i),
            (false, Some(start)) => {
                ranges.push(start..=i - 1);
                open = None;
            }
            _ => {}
        }
    }
    if let Some(start) = open {
        ranges.push(start..=length - 1);
    }
    ranges
}

/// Offsets shown around a differing range: `context` bytes on each side,
/// clamped to `len`.
pub fn context_window(range: &RangeInclusive<usize>, context: usize, len: usize) -> Range<usize> {
    let end = range.end().saturating_add(1).saturating_add(context).min(len);
    let start = range.start().saturating_sub(context).min(end);
    start..end
}

/// Differing bytes between `a` and `b` inside `window`, clamped to both.
pub fn diff_count(a: &[u8], b: &[u8], window: Range<usize>) -> usize {
    let end = window.end.min(a.len()).min(b.len());
    let start = window.start.min(end);
    a[start..end]
        .iter()
        .zip(&b[start..end])
        .filter(|(x, y)| x != y)
        .count()
}

/// Differing bytes over the common prefix plus the length difference.
pub fn total_diff(a: &[u8], b: &[u8]) -> usize {
    diff_count(a, b, 0..usize::MAX) + a.len().abs_diff(b.len())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptureFingerprint {
    pub len: usize,
    pub sha256: String,
    /// Hash of everything outside [`STYLE_WINDOW`]; equal values suggest the
    /// same geometry with different styles.
    pub sha256_without_styles: String,
}

pub fn fingerprint(capture: &[u8]) -> CaptureFingerprint {
    let full = Sha256::digest(capture);

    let head_end = STYLE_WINDOW.start.min(capture.len());
    let tail_start = STYLE_WINDOW.end.min(capture.len());
    let mut hasher = Sha256::new();
    hasher.update(&capture[..head_end]);
    hasher.update(&capture[tail_start..]);

    CaptureFingerprint {
        len: capture.len(),
        sha256: hex::encode(full),
        sha256_without_styles: hex::encode(hasher.finalize()),
    }
}
