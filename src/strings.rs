//! Printable-text runs inside a capture.
//!
//! Class names, font names and layer labels show up as ASCII or UTF-16LE
//! text inside otherwise binary payloads and are the quickest landmarks when
//! mapping an unknown layout.

use serde::Serialize;

pub const DEFAULT_MIN_STRING_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TextEncoding {
    Ascii,
    Utf16Le,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedString {
    pub offset: usize,
    pub encoding: TextEncoding,
    pub text: String,
}

#[inline]
fn is_printable(b: u8) -> bool {
    (0x20..0x7F).contains(&b)
}

/// ASCII runs of at least `min_len` printable bytes.
///
/// Offsets are relative to `data` plus `base`.
pub fn extract_ascii(data: &[u8], min_len: usize, base: usize) -> Vec<ExtractedString> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < data.len() {
        if !is_printable(data[i]) {
            i += 1;
            continue;
        }
        let start = i;
        while i < data.len() && is_printable(data[i]) {
            i += 1;
        }
        if i - start >= min_len {
            out.push(ExtractedString {
                offset: base + start,
                encoding: TextEncoding::Ascii,
                text: String::from_utf8_lossy(&data[start..i]).into_owned(),
            });
        }
    }
    out
}

/// UTF-16LE runs of at least `min_len` characters in the printable ASCII range.
pub fn extract_utf16le(data: &[u8], min_len: usize, base: usize) -> Vec<ExtractedString> {
    let is_char_at = |i: usize| i + 1 < data.len() && is_printable(data[i]) && data[i + 1] == 0;

    let mut out = Vec::new();
    let mut i = 0;
    while i + 1 < data.len() {
        if !is_char_at(i) {
            i += 1;
            continue;
        }
        let start = i;
        while is_char_at(i) {
            i += 2;
        }
        if (i - start) / 2 >= min_len {
            let text: String = data[start..i].chunks_exact(2).map(|c| c[0] as char).collect();
            out.push(ExtractedString {
                offset: base + start,
                encoding: TextEncoding::Utf16Le,
                text,
            });
        }
    }
    out
}

/// ASCII and UTF-16LE strings from `data[range]`, range clamped to the buffer.
pub fn extract_strings(
    data: &[u8],
    range: std::ops::Range<usize>,
    min_len: usize,
) -> Vec<ExtractedString> {
    let end = range.end.min(data.len());
    let start = range.start.min(end);
    let chunk = &data[start..end];

    let mut strings = extract_ascii(chunk, min_len, start);
    strings.extend(extract_utf16le(chunk, min_len, start));
    strings
}
