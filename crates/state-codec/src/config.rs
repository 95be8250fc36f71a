//! Codec limits

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Default upper bound for a single binary block (16 MiB)
pub const DEFAULT_MAX_BLOCK_SIZE: u32 = 16 * 1024 * 1024;

/// Default upper bound for the length of a cause chain
pub const DEFAULT_MAX_CAUSE_DEPTH: usize = 64;

/// Limits applied while reading and writing blocks
///
/// Both limits are checked on write and on read, so a cache written with a
/// given configuration can always be read back with the same configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CodecConfig {
    /// Largest payload accepted in one length-prefixed block
    pub max_block_size: u32,
    /// Largest number of failures in one cause chain (including the outermost)
    pub max_cause_depth: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_block_size: DEFAULT_MAX_BLOCK_SIZE,
            max_cause_depth: DEFAULT_MAX_CAUSE_DEPTH,
        }
    }
}

impl CodecConfig {
    /// Parse a configuration from JSON, filling missing fields with defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::configuration(format!("invalid codec config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the limits are usable
    pub fn validate(&self) -> Result<()> {
        if self.max_block_size == 0 {
            return Err(Error::configuration("maxBlockSize must be greater than 0"));
        }
        if self.max_cause_depth == 0 {
            return Err(Error::configuration("maxCauseDepth must be at least 1"));
        }
        Ok(())
    }
}
