use coldbuf_core::Codec;
use snap::raw::{Decoder, Encoder};

/// Snappy codec, raw (unframed) format.
///
/// Lower ratio than deflate but inflates several times faster, so blocks
/// that bounce in and out of the cache cost less CPU.
///
/// Best for: access patterns that touch many blocks in turn.
pub struct SnappyCodec;

impl Codec for SnappyCodec {
    fn name(&self) -> &'static str {
        "snappy"
    }

    fn compress_block(&self, raw: &[u8]) -> anyhow::Result<Vec<u8>> {
        let compressed = Encoder::new()
            .compress_vec(raw)
            .map_err(|e| anyhow::anyhow!("snappy compress error: {}", e))?;
        Ok(compressed)
    }

    fn decompress_block(&self, compressed: &[u8], _raw_len: usize) -> anyhow::Result<Vec<u8>> {
        // The raw format carries its own length header, so no hint is needed.
        let raw = Decoder::new()
            .decompress_vec(compressed)
            .map_err(|e| anyhow::anyhow!("snappy decompress error: {}", e))?;
        Ok(raw)
    }
}
