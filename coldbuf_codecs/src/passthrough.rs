use coldbuf_core::Codec;

/// No-op codec: "compressed" blocks hold a verbatim copy of their bytes.
///
/// Useful for:
/// - Exercising the eviction machinery independently of any real codec.
/// - Data that is already compressed, where another pass only costs CPU.
pub struct PassThroughCodec;

impl Codec for PassThroughCodec {
    fn name(&self) -> &'static str {
        "passthrough"
    }

    fn compress_block(&self, raw: &[u8]) -> anyhow::Result<Vec<u8>> {
        Ok(raw.to_vec())
    }

    fn decompress_block(&self, compressed: &[u8], _raw_len: usize) -> anyhow::Result<Vec<u8>> {
        Ok(compressed.to_vec())
    }
}
