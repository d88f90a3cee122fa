//! CWS → FWS conversion.
//!
//! A compressed container keeps its 8-byte header in the clear and deflates
//! everything after it with a zlib wrapper. Expanding it yields the plain
//! container with the same version and declared length.

use flate2::{Decompress, FlushDecompress, Status};

use crate::error::{InspectError, Result};
use crate::signatures::{CWS_MAGIC, FWS_MAGIC, ZWS_MAGIC};

/// Signature + version + declared length.
pub const CONTAINER_HEADER_LEN: usize = 8;

const INFLATE_CHUNK: usize = 64 * 1024;
const MAX_PREALLOC: usize = 16 * 1024 * 1024;
/// Preallocation never exceeds this multiple of the compressed body length.
const PREALLOC_RATIO: usize = 8;

/// The fixed header shared by all container variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerHeader {
    pub signature: [u8; 3],
    pub version: u8,
    /// Total length as written by the producer; never checked against the data.
    pub declared_length: u32,
}

impl ContainerHeader {
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < CONTAINER_HEADER_LEN {
            return Err(InspectError::ShortBuffer {
                offset: 0,
                needed: CONTAINER_HEADER_LEN,
                available: data.len(),
            });
        }
        Ok(Self {
            signature: [data[0], data[1], data[2]],
            version: data[3],
            declared_length: u32::from_le_bytes([data[4], data[5], data[6], data[7]]),
        })
    }
}

/// Inflates a CWS container into an FWS container.
///
/// The output is built only once the zlib stream has reached its end
/// marker; a corrupt or truncated stream produces an error and no data.
pub fn decompress_cws(data: &[u8]) -> Result<Vec<u8>> {
    let header = ContainerHeader::parse(data)?;

    if header.signature == ZWS_MAGIC {
        return Err(InspectError::UnsupportedCompression);
    }
    if header.signature != CWS_MAGIC {
        return Err(InspectError::SignatureMismatch {
            expected: "CWS",
            found: String::from_utf8_lossy(&header.signature).into_owned(),
        });
    }

    let body = inflate_zlib(&data[CONTAINER_HEADER_LEN..], header.declared_length as usize)?;

    let mut out = Vec::with_capacity(CONTAINER_HEADER_LEN + body.len());
    out.extend_from_slice(&FWS_MAGIC);
    out.push(header.version);
    out.extend_from_slice(&header.declared_length.to_le_bytes());
    out.extend_from_slice(&body);

    tracing::debug!(
        version = header.version,
        declared = header.declared_length,
        actual = out.len(),
        "inflated CWS container"
    );

    Ok(out)
}

fn inflate_zlib(input: &[u8], size_hint: usize) -> Result<Vec<u8>> {
    let mut inflater = Decompress::new(true);
    let mut out = Vec::with_capacity(initial_capacity(size_hint, input.len()));

    loop {
        if out.capacity() - out.len() < INFLATE_CHUNK {
            out.reserve(INFLATE_CHUNK);
        }

        let in_before = inflater.total_in();
        let out_before = inflater.total_out();
        let consumed = usize::try_from(in_before).unwrap_or(input.len()).min(input.len());

        let status = inflater
            .decompress_vec(&input[consumed..], &mut out, FlushDecompress::None)
            .map_err(|e| InspectError::MalformedCompressedStream(e.to_string()))?;

        match status {
            Status::StreamEnd => return Ok(out),
            Status::Ok | Status::BufError => {
                if inflater.total_in() == in_before && inflater.total_out() == out_before {
                    return Err(InspectError::MalformedCompressedStream(format!(
                        "stream ended without end marker after {} input bytes",
                        in_before
                    )));
                }
            }
        }
    }
}

/// The declared length is untrusted, so it only shapes the first allocation
/// within bounds set by the actual input.
fn initial_capacity(declared: usize, compressed_len: usize) -> usize {
    declared
        .min(compressed_len.saturating_mul(PREALLOC_RATIO))
        .min(MAX_PREALLOC)
}
