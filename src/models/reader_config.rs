use serde::{Deserialize, Serialize};

use crate::core::constants::{DEFAULT_FALLBACK_CHANNELS, DEFAULT_SCAN_CHUNK};
use crate::core::error::{CsdError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Samples per read during a full range scan.
    pub scan_chunk_size: usize,
    /// Point budget used by `sample_for_display`; `None` reads every sample.
    pub max_display_points: Option<u64>,
    /// Channel count assumed when the header field is zero or negative.
    pub fallback_channel_count: u32,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            scan_chunk_size: DEFAULT_SCAN_CHUNK,
            max_display_points: Some(2000),
            fallback_channel_count: DEFAULT_FALLBACK_CHANNELS,
        }
    }
}

impl ReaderConfig {
    pub fn validate(&self) -> Result<()> {
        if self.scan_chunk_size == 0 {
            return Err(CsdError::Config("scan_chunk_size must be positive".to_string()));
        }
        if self.fallback_channel_count == 0 {
            return Err(CsdError::Config(
                "fallback_channel_count must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
