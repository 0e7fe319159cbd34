/// Block compression abstraction.
///
/// Each `Codec` implementation:
/// - Compresses and decompresses one block at a time. No state is carried
///   between calls, so a single codec instance can be shared by any number
///   of buffers.
/// - Must be lossless: `decompress_block(compress_block(raw))` returns `raw`
///   byte for byte.
pub trait Codec: Send + Sync {
    /// Human-readable codec name, as accepted by configuration.
    fn name(&self) -> &'static str;

    /// Compress the raw bytes of a single block.
    fn compress_block(&self, raw: &[u8]) -> anyhow::Result<Vec<u8>>;

    /// Decompress a single block.
    ///
    /// `raw_len` is the block's nominal (uncompressed) size. Codecs may use
    /// it to pre-size the output; the buffer verifies the result length
    /// independently.
    fn decompress_block(&self, compressed: &[u8], raw_len: usize) -> anyhow::Result<Vec<u8>>;
}
