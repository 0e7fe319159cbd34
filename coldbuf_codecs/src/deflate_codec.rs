use std::io::{Read, Write};

use coldbuf_core::Codec;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;

/// Raw deflate codec (RFC 1951, no zlib header or trailer).
///
/// The default codec. Zero-filled and repetitive blocks shrink to a few
/// dozen bytes, which is what makes keeping cold blocks compressed cheap.
///
/// Best for: general data where memory matters more than inflate latency.
pub struct DeflateCodec {
    /// Compression level (0 = store, 9 = smallest).
    pub level: u32,
}

impl Default for DeflateCodec {
    fn default() -> Self {
        Self { level: 6 }
    }
}

impl DeflateCodec {
    pub fn new(level: u32) -> Self {
        Self { level: level.min(9) }
    }
}

impl Codec for DeflateCodec {
    fn name(&self) -> &'static str {
        "zlib"
    }

    fn compress_block(&self, raw: &[u8]) -> anyhow::Result<Vec<u8>> {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::new(self.level));
        encoder.write_all(raw)?;
        Ok(encoder.finish()?)
    }

    fn decompress_block(&self, compressed: &[u8], raw_len: usize) -> anyhow::Result<Vec<u8>> {
        let mut raw = Vec::with_capacity(raw_len);
        DeflateDecoder::new(compressed)
            .read_to_end(&mut raw)
            .map_err(|e| anyhow::anyhow!("deflate decompress error: {}", e))?;
        Ok(raw)
    }
}
