//! Buffer configuration
//!
//! Block size, cache budget and codec selection, with the defaults the
//! buffer uses when nothing is specified.

use serde::{Deserialize, Serialize};

use crate::error::{BufferError, Result};

/// Default logical size of one block: 4 KB.
pub const DEFAULT_ALLOC_SIZE: usize = 4 * 1024;

/// Default ceiling on concurrently uncompressed bytes: 64 KB.
pub const DEFAULT_CACHE_BUDGET: usize = 64 * 1024;

/// Default codec name (raw deflate).
pub const DEFAULT_CODEC: &str = "zlib";

/// Configuration for a compressed buffer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Logical bytes per block. Constant for the lifetime of a buffer.
    pub alloc_size: usize,

    /// Maximum total logical size of blocks held uncompressed at once.
    pub cache_budget: usize,

    /// Codec name, resolved by the codec registry. Unknown names fall back
    /// to the default codec.
    pub codec: String,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            alloc_size: DEFAULT_ALLOC_SIZE,
            cache_budget: DEFAULT_CACHE_BUDGET,
            codec: DEFAULT_CODEC.to_string(),
        }
    }
}

impl BufferConfig {
    /// Create a new config builder
    pub fn builder() -> BufferConfigBuilder {
        BufferConfigBuilder::default()
    }

    /// Reject settings the block store cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.alloc_size == 0 {
            return Err(BufferError::InvalidConfig(
                "alloc_size must be at least one byte".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for BufferConfig
#[derive(Default)]
pub struct BufferConfigBuilder {
    config: BufferConfig,
}

impl BufferConfigBuilder {
    /// Set the block size (in bytes)
    pub fn alloc_size(mut self, bytes: usize) -> Self {
        self.config.alloc_size = bytes;
        self
    }

    /// Set the block size (in KB)
    pub fn alloc_size_kb(self, kb: usize) -> Self {
        self.alloc_size(kb * 1024)
    }

    /// Set the cache budget (in bytes)
    pub fn cache_budget(mut self, bytes: usize) -> Self {
        self.config.cache_budget = bytes;
        self
    }

    /// Set the cache budget (in KB)
    pub fn cache_budget_kb(self, kb: usize) -> Self {
        self.cache_budget(kb * 1024)
    }

    /// Set the codec by name
    pub fn codec(mut self, name: impl Into<String>) -> Self {
        self.config.codec = name.into();
        self
    }

    pub fn build(self) -> BufferConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = BufferConfig::default();
        assert_eq!(config.alloc_size, 4096);
        assert_eq!(config.cache_budget, 65536);
        assert_eq!(config.codec, "zlib");
    }

    #[test]
    fn kb_setters_scale_by_1024() {
        let config = BufferConfig::builder()
            .alloc_size_kb(24)
            .cache_budget_kb(2048)
            .build();
        assert_eq!(config.alloc_size, 24 * 1024);
        assert_eq!(config.cache_budget, 2048 * 1024);
    }

    #[test]
    fn zero_alloc_size_is_rejected() {
        let config = BufferConfig::builder().alloc_size(0).build();
        assert!(matches!(config.validate(), Err(BufferError::InvalidConfig(_))));
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: BufferConfig = serde_json::from_str(r#"{"codec":"snappy"}"#).unwrap();
        assert_eq!(config.codec, "snappy");
        assert_eq!(config.alloc_size, DEFAULT_ALLOC_SIZE);
    }
}
