//! Tag-stream walking for uncompressed (FWS) containers.
//!
//! Only the histogram of tag codes is kept. Captured containers are often cut
//! short, so the walk never fails: it stops at the first thing it cannot read
//! and reports how far it got.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::bits::BitCursor;
use crate::compression::CONTAINER_HEADER_LEN;
use crate::reader::ByteReader;
use crate::signatures::FWS_MAGIC;

/// Short length value announcing a trailing 32-bit length.
pub const LONG_FORM_MARKER: u16 = 0x3F;
pub const END_TAG: u16 = 0;

/// Frame rate (u16) + frame count (u16) after the frame RECT.
const FRAME_FIELDS_LEN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StopReason {
    /// The End tag (code 0) was read.
    EndTag,
    /// Not enough bytes left for the next tag header.
    ShortHeader,
    /// A tag body extends past the end of the buffer.
    BodyOverrun,
    /// The frame header could not be read.
    TruncatedFrameHeader,
    /// The buffer does not start with the FWS signature.
    NotAContainer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagRecord {
    pub code: u16,
    pub body_length: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagHistogram {
    pub total_tags: u32,
    pub counts: BTreeMap<u16, u32>,
    pub stop: StopReason,
    /// Cursor position when the walk stopped.
    pub end_offset: usize,
}

impl TagHistogram {
    fn empty(stop: StopReason, end_offset: usize) -> Self {
        Self {
            total_tags: 0,
            counts: BTreeMap::new(),
            stop,
            end_offset,
        }
    }

    #[inline]
    pub fn count(&self, code: u16) -> u32 {
        self.counts.get(&code).copied().unwrap_or(0)
    }

    /// Whether the walk reached the End tag.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.stop == StopReason::EndTag
    }

    fn record(&mut self, tag: TagRecord) {
        *self.counts.entry(tag.code).or_insert(0) += 1;
        self.total_tags += 1;
    }
}

/// Walks the tag stream of an FWS container.
pub fn scan_tags(data: &[u8]) -> TagHistogram {
    if !data.starts_with(&FWS_MAGIC) {
        return TagHistogram::empty(StopReason::NotAContainer, 0);
    }

    let Some(mut pos) = skip_frame_header(data) else {
        tracing::debug!(len = data.len(), "frame header truncated");
        return TagHistogram::empty(StopReason::TruncatedFrameHeader, data.len().min(CONTAINER_HEADER_LEN));
    };

    let mut histogram = TagHistogram::empty(StopReason::ShortHeader, pos);

    loop {
        let mut reader = ByteReader::at(data, pos);
        let Some(tag) = read_tag_header(&mut reader) else {
            histogram.stop = StopReason::ShortHeader;
            break;
        };
        pos = reader.position();

        tracing::trace!(code = tag.code, len = tag.body_length, offset = pos, "tag");
        histogram.record(tag);

        if tag.code == END_TAG {
            histogram.stop = StopReason::EndTag;
            break;
        }

        match pos.checked_add(tag.body_length as usize) {
            Some(next) if next <= data.len() => pos = next,
            _ => {
                histogram.stop = StopReason::BodyOverrun;
                break;
            }
        }
    }

    histogram.end_offset = pos;
    tracing::debug!(
        total = histogram.total_tags,
        distinct = histogram.counts.len(),
        stop = ?histogram.stop,
        "tag scan finished"
    );
    histogram
}

/// Returns the offset of the first tag header.
fn skip_frame_header(data: &[u8]) -> Option<usize> {
    let mut bits = BitCursor::new(data, CONTAINER_HEADER_LEN);
    let nbits = bits.read_ubits(5).ok()? as u8;
    for _ in 0..4 {
        bits.read_sbits(nbits).ok()?;
    }
    bits.align();

    let mut reader = ByteReader::at(data, bits.byte_position());
    reader.skip(FRAME_FIELDS_LEN).ok()?;
    Some(reader.position())
}

fn read_tag_header(reader: &mut ByteReader<'_>) -> Option<TagRecord> {
    let word = reader.u16_le().ok()?;
    let code = word >> 6;
    let short_len = word & 0x3F;
    let body_length = if short_len == LONG_FORM_MARKER {
        reader.u32_le().ok()?
    } else {
        short_len as u32
    };
    Some(TagRecord { code, body_length })
}

/// Human-readable name for common tag codes.
pub fn tag_name(code: u16) -> Option<&'static str> {
    let name = match code {
        0 => "End",
        1 => "ShowFrame",
        2 => "DefineShape",
        4 => "PlaceObject",
        5 => "RemoveObject",
        6 => "DefineBits",
        8 => "JPEGTables",
        9 => "SetBackgroundColor",
        10 => "DefineFont",
        11 => "DefineText",
        12 => "DoAction",
        20 => "DefineBitsLossless",
        21 => "DefineBitsJPEG2",
        22 => "DefineShape2",
        26 => "PlaceObject2",
        28 => "RemoveObject2",
        32 => "DefineShape3",
        35 => "DefineBitsJPEG3",
        36 => "DefineBitsLossless2",
        39 => "DefineSprite",
        43 => "FrameLabel",
        46 => "DefineMorphShape",
        48 => "DefineFont2",
        56 => "ExportAssets",
        69 => "FileAttributes",
        70 => "PlaceObject3",
        75 => "DefineFont3",
        77 => "Metadata",
        78 => "DefineScalingGrid",
        82 => "DoABC",
        83 => "DefineShape4",
        84 => "DefineMorphShape2",
        86 => "DefineSceneAndFrameLabelData",
        _ => return None,
    };
    Some(name)
}
