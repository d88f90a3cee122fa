use serde::{Deserialize, Serialize};

use crate::stability::DEFAULT_MIN_RUN_LEN;
use crate::strings::DEFAULT_MIN_STRING_LEN;
use crate::styles::DEFAULT_STYLE_OFFSET;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleParsing {
    /// Only when the picture marker is present.
    #[default]
    Auto,
    Always,
    Never,
}

/// Knobs for [`crate::inspect::inspect`] and the stability tools.
///
/// Passed explicitly to whatever needs it; there is no global state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectConfig {
    pub style_offset: usize,
    pub parse_styles: StyleParsing,
    pub min_run_len: usize,
    pub string_min_len: usize,
}

impl Default for InspectConfig {
    fn default() -> Self {
        Self {
            style_offset: DEFAULT_STYLE_OFFSET,
            parse_styles: StyleParsing::Auto,
            min_run_len: DEFAULT_MIN_RUN_LEN,
            string_min_len: DEFAULT_MIN_STRING_LEN,
        }
    }
}

impl InspectConfig {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}
