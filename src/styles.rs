//! Fill and line style tables of the proprietary picture payload.
//!
//! The payload has no published layout. Two candidate encodings have been
//! reverse-engineered from repeated captures; neither is trusted on its own.
//! [`parse_style_arrays`] runs both in a fixed order and uses small decoded
//! counts as the signal that a layout lined up with real data.
//!
//! Layout `v1` (preferred):
//!
//! ```text
//! u16 fill_count            (≤ 256)
//! fill_count × [r g b a]    solid fills only
//! u16 line_count            (≤ 256)
//! line_count × [r g b a] u32 width_twips
//! ```
//!
//! Layout `swf-like` (legacy):
//!
//! ```text
//! count := u8 | 0xFF u16    (≤ 512)
//! fill_count × [u8 type, r g b a]   type 0x00 only
//! count line_count
//! line_count × [u16 width_twips, r g b a]
//! ```

use serde::Serialize;
use serde::ser::SerializeStruct;
use std::fmt;
use thiserror::Error;

use crate::error::{InspectError, Result};
use crate::reader::ByteReader;

pub const DEFAULT_STYLE_OFFSET: usize = 0x50;
pub const TWIPS_PER_PIXEL: u32 = 20;

/// Count ceiling for the `v1` layout.
pub const V1_MAX_COUNT: usize = 256;
/// Count ceiling for the `swf-like` layout.
pub const LEGACY_MAX_COUNT: usize = 512;
/// `v1` results with both counts at or below this are accepted without
/// trying the legacy layout.
pub const PLAUSIBLE_STYLE_COUNT: usize = 64;
/// 1000 px. Wider strokes are reported, not rejected.
pub const MAX_SANE_LINE_WIDTH_TWIPS: u32 = 20_000;

const SOLID_FILL: u8 = 0x00;
const COUNT_ESCAPE: u8 = 0xFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RgbaColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl RgbaColor {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        Self::new(bytes[0], bytes[1], bytes[2], bytes[3])
    }

    /// `#RRGGBBAA`, uppercase.
    pub fn hex(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RgbaColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
    }
}

impl Serialize for RgbaColor {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("RgbaColor", 5)?;
        s.serialize_field("r", &self.r)?;
        s.serialize_field("g", &self.g)?;
        s.serialize_field("b", &self.b)?;
        s.serialize_field("a", &self.a)?;
        s.serialize_field("hex", &self.hex())?;
        s.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FillKind {
    Solid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FillStyle {
    pub kind: FillKind,
    pub color: RgbaColor,
}

impl FillStyle {
    pub const fn solid(color: RgbaColor) -> Self {
        Self {
            kind: FillKind::Solid,
            color,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineStyle {
    pub width_twips: u32,
    pub color: RgbaColor,
}

impl LineStyle {
    #[inline]
    pub fn width_px(&self) -> f64 {
        self.width_twips as f64 / TWIPS_PER_PIXEL as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StyleLayout {
    #[serde(rename = "v1")]
    V1,
    #[serde(rename = "swf-like")]
    SwfLike,
}

impl fmt::Display for StyleLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::V1 => "v1",
            Self::SwfLike => "swf-like",
        })
    }
}

/// Successfully decoded style tables.
///
/// `fill_count` and `line_count` are the declared counts. They match the
/// vector lengths except when the legacy layout aborts on an unsupported
/// fill type; that case always carries a warning.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyleArrays {
    pub layout: StyleLayout,
    pub style_offset: usize,
    pub fill_count: usize,
    pub fills: Vec<FillStyle>,
    pub line_count: usize,
    pub lines: Vec<LineStyle>,
    pub bytes_consumed: usize,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{layout} style table at {style_offset:#x}: {message}")]
pub struct StyleParseFailure {
    pub layout: StyleLayout,
    pub style_offset: usize,
    pub message: String,
}

pub type StyleArrayResult = std::result::Result<StyleArrays, StyleParseFailure>;

fn into_result(
    layout: StyleLayout,
    style_offset: usize,
    decoded: Result<StyleArrays>,
) -> StyleArrayResult {
    decoded.map_err(|e| StyleParseFailure {
        layout,
        style_offset,
        message: e.to_string(),
    })
}

/// Decodes the `v1` layout at `offset`.
pub fn parse_v1(data: &[u8], offset: usize) -> StyleArrayResult {
    into_result(StyleLayout::V1, offset, decode_v1(data, offset))
}

/// Decodes the legacy `swf-like` layout at `offset`.
pub fn parse_swf_like(data: &[u8], offset: usize) -> StyleArrayResult {
    into_result(StyleLayout::SwfLike, offset, decode_swf_like(data, offset))
}

/// Decodes the style tables at `offset`, choosing between the two layouts.
///
/// 1. `v1` success with both counts ≤ [`PLAUSIBLE_STYLE_COUNT`] wins outright.
/// 2. Otherwise a successful `swf-like` decode wins.
/// 3. Otherwise a successful `v1` decode (large counts) is returned.
/// 4. If both failed, the `v1` failure is returned.
pub fn parse_style_arrays(data: &[u8], offset: usize) -> StyleArrayResult {
    let v1 = parse_v1(data, offset);
    if let Ok(styles) = &v1 {
        if styles.fill_count <= PLAUSIBLE_STYLE_COUNT && styles.line_count <= PLAUSIBLE_STYLE_COUNT {
            tracing::debug!(
                offset,
                fills = styles.fill_count,
                lines = styles.line_count,
                "v1 style layout accepted"
            );
            return v1;
        }
    }

    let legacy = parse_swf_like(data, offset);
    match (v1, legacy) {
        (_, Ok(styles)) => {
            tracing::debug!(offset, fills = styles.fill_count, "falling back to swf-like style layout");
            Ok(styles)
        }
        (Ok(styles), Err(legacy_err)) => {
            tracing::debug!(offset, reason = %legacy_err, "swf-like failed, keeping large v1 result");
            Ok(styles)
        }
        (Err(v1_err), Err(legacy_err)) => {
            tracing::debug!(offset, v1 = %v1_err, legacy = %legacy_err, "no style layout matched");
            Err(v1_err)
        }
    }
}

fn check_count(what: &'static str, count: usize, max: usize) -> Result<usize> {
    if count > max {
        return Err(InspectError::ImplausibleCount { what, count, max });
    }
    Ok(count)
}

fn decode_v1(data: &[u8], offset: usize) -> Result<StyleArrays> {
    let mut r = ByteReader::at(data, offset);
    let mut warnings = Vec::new();

    let fill_count = check_count("fill", r.u16_le()? as usize, V1_MAX_COUNT)?;
    let mut fills = Vec::with_capacity(fill_count);
    for _ in 0..fill_count {
        fills.push(FillStyle::solid(RgbaColor::from_bytes(r.array4()?)));
    }

    let line_count = check_count("line", r.u16_le()? as usize, V1_MAX_COUNT)?;
    let mut lines = Vec::with_capacity(line_count);
    for index in 0..line_count {
        let color = RgbaColor::from_bytes(r.array4()?);
        let width_twips = r.u32_le()?;
        if width_twips > MAX_SANE_LINE_WIDTH_TWIPS {
            warnings.push(format!(
                "line {index}: width {width_twips} twips exceeds {MAX_SANE_LINE_WIDTH_TWIPS}"
            ));
        }
        lines.push(LineStyle { width_twips, color });
    }

    Ok(StyleArrays {
        layout: StyleLayout::V1,
        style_offset: offset,
        fill_count,
        fills,
        line_count,
        lines,
        bytes_consumed: r.position() - offset,
        warnings,
    })
}

fn read_legacy_count(r: &mut ByteReader<'_>, what: &'static str) -> Result<usize> {
    let count = match r.u8()? {
        COUNT_ESCAPE => r.u16_le()? as usize,
        c => c as usize,
    };
    check_count(what, count, LEGACY_MAX_COUNT)
}

fn decode_swf_like(data: &[u8], offset: usize) -> Result<StyleArrays> {
    let mut r = ByteReader::at(data, offset);

    let fill_count = read_legacy_count(&mut r, "fill")?;
    let mut fills = Vec::with_capacity(fill_count);
    for index in 0..fill_count {
        let type_offset = r.position();
        let fill_type = r.u8()?;
        if fill_type != SOLID_FILL {
            tracing::warn!(fill_type, offset = type_offset, "unsupported fill type, stopping");
            return Ok(StyleArrays {
                layout: StyleLayout::SwfLike,
                style_offset: offset,
                fill_count,
                fills,
                line_count: 0,
                lines: Vec::new(),
                bytes_consumed: r.position() - offset,
                warnings: vec![format!(
                    "fill {index}: unsupported fill type {fill_type:#04x} at {type_offset:#x}; \
                     remaining fills and line styles not decoded"
                )],
            });
        }
        fills.push(FillStyle::solid(RgbaColor::from_bytes(r.array4()?)));
    }

    let line_count = read_legacy_count(&mut r, "line")?;
    let mut lines = Vec::with_capacity(line_count);
    for _ in 0..line_count {
        let width_twips = r.u16_le()? as u32;
        let color = RgbaColor::from_bytes(r.array4()?);
        lines.push(LineStyle { width_twips, color });
    }

    Ok(StyleArrays {
        layout: StyleLayout::SwfLike,
        style_offset: offset,
        fill_count,
        fills,
        line_count,
        lines,
        bytes_consumed: r.position() - offset,
        warnings: Vec::new(),
    })
}

/// Offsets that look like the start of a legacy style table.
///
/// A hit has a fill count of 1..=10, a solid first fill whose alpha is fully
/// opaque or fully transparent, and a small byte after that color. Hits within
/// 16 bytes of the previous hit are folded into it.
pub fn find_style_candidates(data: &[u8]) -> Vec<usize> {
    let mut hits = Vec::new();
    let mut last: Option<usize> = None;

    for i in 0..data.len().saturating_sub(8) {
        let count = data[i];
        if count == 0 || count > 10 {
            continue;
        }
        if data[i + 1] != SOLID_FILL {
            continue;
        }
        if !matches!(data[i + 5], 0x00 | 0xFF) {
            continue;
        }
        if data[i + 6] > 10 {
            continue;
        }

        if last.is_none_or(|prev| i - prev > 16) {
            hits.push(i);
        }
        last = Some(i);
    }

    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at_offset(offset: usize, table: &[u8]) -> Vec<u8> {
        let mut data = vec![0xEE; offset];
        data.extend_from_slice(table);
        data
    }

    #[test]
    fn hex_is_uppercase() {
        assert_eq!(RgbaColor::new(0xab, 0x01, 0xff, 0x00).hex(), "#AB01FF00");
    }

    #[test]
    fn v1_basic() {
        let table = [
            0x01, 0x00, 0x10, 0x20, 0x30, 0xFF, // one fill
            0x01, 0x00, 0x00, 0x00, 0x00, 0xFF, 0x14, 0x00, 0x00, 0x00, // one line, 20 twips
        ];
        let styles = parse_v1(&at_offset(4, &table), 4).unwrap();
        assert_eq!(styles.fills[0].color.hex(), "#102030FF");
        assert_eq!(styles.lines[0].width_twips, 20);
        assert_eq!(styles.lines[0].width_px(), 1.0);
        assert_eq!(styles.bytes_consumed, table.len());
    }

    #[test]
    fn v1_wide_line_warns() {
        let mut table = vec![0x00, 0x00, 0x01, 0x00, 1, 2, 3, 4];
        table.extend_from_slice(&20_001u32.to_le_bytes());
        let styles = parse_v1(&table, 0).unwrap();
        assert_eq!(styles.warnings.len(), 1);
        assert_eq!(styles.lines.len(), 1);
    }

    #[test]
    fn v1_rejects_implausible_count() {
        let table = 257u16.to_le_bytes();
        let err = parse_v1(&table, 0).unwrap_err();
        assert_eq!(err.layout, StyleLayout::V1);
        assert!(err.message.contains("implausible fill count 257"));
    }

    #[test]
    fn v1_truncated_is_failure() {
        let table = [0x02, 0x00, 0xFF, 0x00, 0x00, 0xFF, 0x00];
        let err = parse_v1(&table, 0).unwrap_err();
        assert_eq!(err.style_offset, 0);
        assert!(err.message.contains("offset 6"));
    }

    #[test]
    fn legacy_escape_count() {
        let mut table = vec![0xFF, 0x02, 0x00];
        table.extend_from_slice(&[0x00, 1, 2, 3, 255, 0x00, 4, 5, 6, 255]);
        table.extend_from_slice(&[0x01, 0x28, 0x00, 9, 9, 9, 255]);
        let styles = parse_swf_like(&table, 0).unwrap();
        assert_eq!(styles.fill_count, 2);
        assert_eq!(styles.fills[1].color, RgbaColor::new(4, 5, 6, 255));
        assert_eq!(styles.lines[0].width_twips, 40);
        assert_eq!(styles.bytes_consumed, table.len());
    }

    #[test]
    fn legacy_rejects_implausible_count() {
        let table = [0xFF, 0x01, 0x02];
        let err = parse_swf_like(&table, 0).unwrap_err();
        assert!(err.message.contains("implausible fill count 513"));
    }

    #[test]
    fn legacy_unsupported_fill_is_partial_success() {
        let table = [0x03, 0x00, 1, 2, 3, 255, 0x10, 0xAA, 0xBB];
        let styles = parse_swf_like(&table, 0).unwrap();
        assert_eq!(styles.fill_count, 3);
        assert_eq!(styles.fills.len(), 1);
        assert_eq!(styles.line_count, 0);
        assert_eq!(styles.warnings.len(), 1);
        assert!(styles.warnings[0].contains("0x10"));
        assert_eq!(styles.bytes_consumed, 7);
    }

    #[test]
    fn candidates_collapse_nearby_hits() {
        let mut data = vec![0x55u8; 64];
        data[4..11].copy_from_slice(&[0x02, 0x00, 1, 2, 3, 0xFF, 0x01]);
        data[10..17].copy_from_slice(&[0x02, 0x00, 1, 2, 3, 0xFF, 0x01]);
        data[40..47].copy_from_slice(&[0x01, 0x00, 9, 9, 9, 0x00, 0x00]);
        assert_eq!(find_style_candidates(&data), vec![4, 40]);
    }

    #[test]
    fn candidates_on_tiny_input() {
        assert!(find_style_candidates(&[0x01, 0x00, 0, 0]).is_empty());
    }
}
