//! One-shot analysis of a single capture.
//!
//! Orients with the signature scan, walks an embedded container if there is
//! one, and decodes the picture style tables when the payload looks like the
//! proprietary format.

use serde::Serialize;

use crate::compression::{ContainerHeader, decompress_cws};
use crate::config::{InspectConfig, StyleParsing};
use crate::signatures::{SignatureKind, SignatureMatch, SignatureScanner};
use crate::styles::{StyleArrayResult, parse_style_arrays};
use crate::tags::{TagHistogram, scan_tags};

const HEAD_HEX_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContainerReport {
    pub kind: SignatureKind,
    pub offset: usize,
    pub version: Option<u8>,
    pub declared_length: Option<u32>,
    pub histogram: Option<TagHistogram>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptureReport {
    pub length: usize,
    pub head_hex: String,
    pub signatures: Vec<SignatureMatch>,
    pub container: Option<ContainerReport>,
    pub styles: Option<StyleArrayResult>,
}

/// Runs every applicable analysis over `data`.
pub fn inspect(data: &[u8], config: &InspectConfig) -> CaptureReport {
    let scanner = SignatureScanner::new();
    let signatures = scanner.scan(data);

    // Looked up past the report cap so a burst of other signatures cannot
    // hide the container or the marker.
    let container = scanner
        .first_container(data)
        .map(|m| inspect_container(&data[m.offset..], m.kind, m.offset));

    let has_marker = scanner.first(data, SignatureKind::PicShape).is_some();
    let styles = match config.parse_styles {
        StyleParsing::Always => true,
        StyleParsing::Auto => has_marker,
        StyleParsing::Never => false,
    }
    .then(|| parse_style_arrays(data, config.style_offset));

    CaptureReport {
        length: data.len(),
        head_hex: hex::encode(&data[..data.len().min(HEAD_HEX_LEN)]),
        signatures,
        container,
        styles,
    }
}

/// Analyzes a container starting at the beginning of `data`.
pub fn inspect_container(data: &[u8], kind: SignatureKind, offset: usize) -> ContainerReport {
    let header = ContainerHeader::parse(data).ok();
    let mut report = ContainerReport {
        kind,
        offset,
        version: header.map(|h| h.version),
        declared_length: header.map(|h| h.declared_length),
        histogram: None,
        note: None,
    };

    match kind {
        SignatureKind::Fws => report.histogram = Some(scan_tags(data)),
        SignatureKind::Cws => match decompress_cws(data) {
            Ok(expanded) => report.histogram = Some(scan_tags(&expanded)),
            Err(e) => {
                tracing::warn!(offset, error = %e, "embedded CWS did not inflate");
                report.note = Some(e.to_string());
            }
        },
        SignatureKind::Zws => {
            report.note = Some("LZMA-compressed container; tag scan skipped".to_string());
        }
        _ => report.note = Some(format!("{kind} is not a vector container")),
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_blob() {
        let report = inspect(&[0u8; 16], &InspectConfig::default());
        assert_eq!(report.length, 16);
        assert_eq!(report.head_hex, "00".repeat(16));
        assert!(report.container.is_none());
        assert!(report.styles.is_none());
    }

    #[test]
    fn zws_gets_a_note() {
        let mut data = vec![0u8; 4];
        data.extend_from_slice(b"ZWS\x0d\x00\x01\x00\x00");
        let report = inspect(&data, &InspectConfig::default());
        let container = report.container.unwrap();
        assert_eq!(container.kind, SignatureKind::Zws);
        assert_eq!(container.offset, 4);
        assert_eq!(container.version, Some(13));
        assert!(container.histogram.is_none());
        assert!(container.note.is_some());
    }

    #[test]
    fn never_skips_styles_even_with_marker() {
        let mut data = vec![0u8; 0x60];
        data[..9].copy_from_slice(b"CPicShape");
        let config = InspectConfig {
            parse_styles: StyleParsing::Never,
            ..InspectConfig::default()
        };
        assert!(inspect(&data, &config).styles.is_none());
        assert!(inspect(&data, &InspectConfig::default()).styles.is_some());
    }
}
