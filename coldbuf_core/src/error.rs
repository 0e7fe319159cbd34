//! Error types for coldbuf
//!
//! Growth never fails short of allocation failure, so the taxonomy is small:
//! configuration, codec, and text conversion errors.

use thiserror::Error;

/// Result type alias using BufferError
pub type Result<T> = std::result::Result<T, BufferError>;

/// Unified error type for buffer operations
#[derive(Debug, Error)]
pub enum BufferError {
    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // -------------------------------------------------------------------------
    // Codec Errors
    // -------------------------------------------------------------------------
    #[error("{codec} codec failed on block {block}: {reason}")]
    Codec {
        codec: &'static str,
        block: usize,
        reason: String,
    },

    #[error("block {block} decompressed to {actual} bytes but its nominal size is {expected}")]
    SizeMismatch {
        block: usize,
        expected: usize,
        actual: usize,
    },

    // -------------------------------------------------------------------------
    // Text Conversion Errors
    // -------------------------------------------------------------------------
    #[error("unknown text encoding '{0}'")]
    UnknownEncoding(String),

    #[error("invalid {encoding} text: {reason}")]
    InvalidText {
        encoding: &'static str,
        reason: String,
    },
}
