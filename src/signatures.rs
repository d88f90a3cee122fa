//! Magic-byte detection.
//!
//! Captures coming off the clipboard are opaque blobs that may embed a
//! vector container, an OLE compound file or a ZIP archive anywhere inside
//! them. The scanner reports every known signature at every offset so the
//! caller can decide where to look next.

use aho_corasick::AhoCorasick;
use serde::Serialize;
use std::fmt;

/// Maximum number of matches a single scan reports.
pub const MAX_SIGNATURE_MATCHES: usize = 50;

pub const FWS_MAGIC: [u8; 3] = *b"FWS";
pub const CWS_MAGIC: [u8; 3] = *b"CWS";
pub const ZWS_MAGIC: [u8; 3] = *b"ZWS";
pub const OLE_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
pub const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];
pub const PIC_SHAPE_MARKER: &[u8] = b"CPicShape";

/// Signatures the scanner knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum SignatureKind {
    /// Uncompressed vector container
    Fws,
    /// zlib-compressed vector container
    Cws,
    /// LZMA-compressed vector container
    Zws,
    /// OLE2 compound file
    Ole,
    /// ZIP local file header
    Zip,
    /// ASCII class marker of the proprietary picture payload
    PicShape,
}

impl SignatureKind {
    pub const ALL: [SignatureKind; 6] = [
        Self::Fws,
        Self::Cws,
        Self::Zws,
        Self::Ole,
        Self::Zip,
        Self::PicShape,
    ];

    #[must_use]
    pub const fn magic(&self) -> &'static [u8] {
        match self {
            Self::Fws => &FWS_MAGIC,
            Self::Cws => &CWS_MAGIC,
            Self::Zws => &ZWS_MAGIC,
            Self::Ole => &OLE_MAGIC,
            Self::Zip => &ZIP_MAGIC,
            Self::PicShape => PIC_SHAPE_MARKER,
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Fws => "FWS",
            Self::Cws => "CWS",
            Self::Zws => "ZWS",
            Self::Ole => "OLE",
            Self::Zip => "ZIP",
            Self::PicShape => "CPicShape",
        }
    }

    /// True for the three vector container variants.
    #[inline]
    #[must_use]
    pub const fn is_container(&self) -> bool {
        matches!(self, Self::Fws | Self::Cws | Self::Zws)
    }

    /// Identifies a container variant from the first bytes of `data`.
    #[must_use]
    pub fn container_at_start(data: &[u8]) -> Option<Self> {
        [Self::Fws, Self::Cws, Self::Zws]
            .into_iter()
            .find(|kind| data.starts_with(kind.magic()))
    }
}

impl fmt::Display for SignatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SignatureMatch {
    pub kind: SignatureKind,
    pub offset: usize,
}

/// Multi-pattern scanner over the fixed signature table.
///
/// Uses a single Aho-Corasick automaton with overlapping iteration, so a
/// match of one signature never hides a match of another at the same or a
/// nearby offset.
#[derive(Debug, Clone)]
pub struct SignatureScanner {
    pattern_matcher: Option<AhoCorasick>,
    pattern_map: Vec<SignatureKind>,
    limit: usize,
}

impl SignatureScanner {
    pub fn new() -> Self {
        let pattern_map: Vec<SignatureKind> = SignatureKind::ALL.to_vec();
        let patterns: Vec<&[u8]> = pattern_map.iter().map(|k| k.magic()).collect();
        Self {
            pattern_matcher: AhoCorasick::new(&patterns).ok(),
            pattern_map,
            limit: MAX_SIGNATURE_MATCHES,
        }
    }

    /// Matches in the order the automaton reports them (by end offset).
    fn matches<'a>(&'a self, data: &'a [u8]) -> impl Iterator<Item = SignatureMatch> + 'a {
        self.pattern_matcher
            .iter()
            .flat_map(move |matcher| matcher.find_overlapping_iter(data))
            .map(move |mat| SignatureMatch {
                kind: self.pattern_map[mat.pattern().as_usize()],
                offset: mat.start(),
            })
    }

    /// All matches in ascending offset order, at most [`MAX_SIGNATURE_MATCHES`].
    ///
    /// Scanning stops as soon as the cap is reached; the tail of a
    /// pathological buffer is simply not reported.
    pub fn scan(&self, data: &[u8]) -> Vec<SignatureMatch> {
        let mut matches = Vec::new();
        for m in self.matches(data) {
            if matches.len() >= self.limit {
                tracing::debug!(limit = self.limit, "signature scan truncated");
                break;
            }
            matches.push(m);
        }

        matches.sort_by_key(|m| (m.offset, m.kind));
        matches
    }

    /// Offset of the first occurrence of `kind`, if any. Not subject to the
    /// match cap.
    pub fn first(&self, data: &[u8], kind: SignatureKind) -> Option<usize> {
        self.matches(data).find(|m| m.kind == kind).map(|m| m.offset)
    }

    /// The earliest container signature (FWS, CWS or ZWS), searched past the
    /// match cap.
    ///
    /// All container magics are three bytes, so end order is start order.
    pub fn first_container(&self, data: &[u8]) -> Option<SignatureMatch> {
        self.matches(data).find(|m| m.kind.is_container())
    }
}

impl Default for SignatureScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Scans `data` with the default signature table.
pub fn scan_signatures(data: &[u8]) -> Vec<SignatureMatch> {
    SignatureScanner::new().scan(data)
}
