mod deflate_codec;
mod lz4_codec;
mod passthrough;
mod snappy_codec;
mod zstd_codec;

pub use deflate_codec::DeflateCodec;
pub use lz4_codec::Lz4Codec;
pub use passthrough::PassThroughCodec;
pub use snappy_codec::SnappyCodec;
pub use zstd_codec::ZstdCodec;

use std::sync::Arc;

use coldbuf_core::{BufferConfig, Codec, CompressedBuffer, Result, TextEncoding};
use tracing::warn;

/// Names accepted by [`codec_by_name`]. The CLI restricts `--codec` to these.
pub const CODEC_NAMES: &[&str] = &["zlib", "deflate", "snappy", "zstd", "lz4", "passthrough", "none"];

/// The codec used when none is configured: raw deflate.
pub fn default_codec() -> Arc<dyn Codec> {
    Arc::new(DeflateCodec::default())
}

/// Resolve a codec from its configured name.
///
/// Unrecognized names do not fail: they fall back to [`default_codec`] and
/// log a warning.
pub fn codec_by_name(name: &str) -> Arc<dyn Codec> {
    match name.to_ascii_lowercase().as_str() {
        "zlib" | "deflate" => Arc::new(DeflateCodec::default()),
        "snappy" => Arc::new(SnappyCodec),
        "zstd" => Arc::new(ZstdCodec::default()),
        "lz4" => Arc::new(Lz4Codec),
        "passthrough" | "none" => Arc::new(PassThroughCodec),
        other => {
            warn!(
                codec = other,
                fallback = "zlib",
                "unknown codec name, using default"
            );
            default_codec()
        }
    }
}

/// Create an empty buffer using the codec named in `config`.
pub fn new_buffer(config: &BufferConfig) -> Result<CompressedBuffer> {
    CompressedBuffer::new(config, codec_by_name(&config.codec))
}

/// Build a default-configured buffer holding `bytes` at offset 0.
pub fn buffer_from_bytes(bytes: &[u8]) -> Result<CompressedBuffer> {
    CompressedBuffer::from_bytes(&BufferConfig::default(), default_codec(), bytes)
}

/// Build a default-configured buffer holding the decoded `text` at offset 0.
pub fn buffer_from_text(text: &str, encoding: TextEncoding) -> Result<CompressedBuffer> {
    CompressedBuffer::from_text(&BufferConfig::default(), default_codec(), text, encoding)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_block() -> Vec<u8> {
        let pattern = b"the cat in the hat ";
        (0..4096).map(|i| pattern[i % pattern.len()]).collect()
    }

    #[test]
    fn every_named_codec_round_trips_a_block() {
        let raw = sample_block();
        for name in CODEC_NAMES {
            let codec = codec_by_name(name);
            let compressed = codec.compress_block(&raw).unwrap();
            let restored = codec.decompress_block(&compressed, raw.len()).unwrap();
            assert_eq!(restored, raw, "codec {name} should be lossless");
        }
    }

    #[test]
    fn real_codecs_shrink_zero_blocks() {
        let zeros = vec![0u8; 4096];
        for name in ["zlib", "snappy", "zstd", "lz4"] {
            let compressed = codec_by_name(name).compress_block(&zeros).unwrap();
            assert!(
                compressed.len() < 512,
                "{name} left a zero block at {} bytes",
                compressed.len()
            );
        }
    }

    #[test]
    fn names_resolve_to_matching_codecs() {
        assert_eq!(codec_by_name("deflate").name(), "zlib");
        assert_eq!(codec_by_name("SNAPPY").name(), "snappy");
        assert_eq!(codec_by_name("none").name(), "passthrough");
    }

    #[test]
    fn unknown_name_falls_back_to_default() {
        assert_eq!(codec_by_name("brotli").name(), default_codec().name());
    }

    #[test]
    fn deflate_rejects_garbage() {
        let codec = DeflateCodec::default();
        assert!(codec.decompress_block(&[0xff, 0xff, 0xff, 0xff], 16).is_err());
    }
}
