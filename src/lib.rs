pub mod bits;
pub mod compression;
pub mod config;
mod error;
pub mod inspect;
pub mod reader;
pub mod signatures;
pub mod stability;
pub mod strings;
pub mod styles;
pub mod tags;

pub use compression::decompress_cws;
pub use config::{InspectConfig, StyleParsing};
pub use error::{InspectError, Result};
pub use inspect::{CaptureReport, inspect};
pub use signatures::{SignatureKind, SignatureMatch, SignatureScanner, scan_signatures};
pub use stability::{StabilityReport, analyze};
pub use styles::{
    RgbaColor, StyleArrayResult, StyleArrays, StyleLayout, StyleParseFailure, parse_style_arrays,
};
pub use tags::{TagHistogram, scan_tags};
