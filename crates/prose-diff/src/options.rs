//! Tunables for the diff and row stages.
//!
//! Both option structs deserialize from partial JSON objects; missing
//! fields take their defaults.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default wall-clock budget of the token diff.
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

/// Left documents with fewer top-level nodes than this are chunked in one go.
pub const DEFAULT_SYNC_THRESHOLD: usize = 250;

/// Left top-level nodes processed per scheduling turn on the batched path.
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Token granularity of the diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CutMode {
    #[default]
    Word,
    Char,
}

/// How the Change Extractor shapes its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractMode {
    /// Adjacent insertion/deletion pairs become one replacement.
    #[default]
    Combined,
    /// Replacements are additionally split at top-level block boundaries
    /// and trimmed of identical head/tail structure and text.
    BlockSplit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffOptions {
    pub cut_mode: CutMode,
    /// Run the semantic cleanup pass over the token diff. Only meaningful
    /// for text rendering; change extraction always turns it off.
    pub cleanup_semantic: bool,
    /// Treat the right-hand document as the original.
    pub is_inverted: bool,
    pub extract_mode: ExtractMode,
    /// Time budget of the token diff in milliseconds; `0` disables it.
    pub timeout_ms: u64,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            cut_mode: CutMode::Word,
            cleanup_semantic: false,
            is_inverted: false,
            extract_mode: ExtractMode::Combined,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl DiffOptions {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn with_cut_mode(mut self, cut_mode: CutMode) -> Self {
        self.cut_mode = cut_mode;
        self
    }

    pub fn with_extract_mode(mut self, extract_mode: ExtractMode) -> Self {
        self.extract_mode = extract_mode;
        self
    }

    pub fn inverted(mut self) -> Self {
        self.is_inverted = !self.is_inverted;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RowOptions {
    pub sync_threshold: usize,
    pub batch_size: usize,
}

impl Default for RowOptions {
    fn default() -> Self {
        Self {
            sync_threshold: DEFAULT_SYNC_THRESHOLD,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}
