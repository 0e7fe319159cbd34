use std::borrow::Cow;
use std::sync::Arc;

use serde::Serialize;

use crate::codec::Codec;
use crate::config::BufferConfig;
use crate::encoding::TextEncoding;
use crate::error::Result;
use crate::store::BlockStore;

/// Point-in-time accounting snapshot of a buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BufferStats {
    pub codec: &'static str,
    pub length: usize,
    pub capacity: usize,
    pub alloc_size: usize,
    pub cache_budget: usize,
    pub block_count: usize,
    pub compressed_blocks: usize,
    pub uncompressed_total: usize,
    pub compressed_total: usize,
    pub total_physical: usize,
}

/// Growable, randomly addressable byte buffer backed by compressed blocks.
///
/// # Addressing
/// The logical address space is split into `alloc_size` blocks. Reads and
/// writes at any offset are accepted: offsets past `capacity` grow the buffer
/// with zero-filled blocks first, so reading beyond the written data returns
/// zeros rather than failing.
///
/// # Memory
/// At most `cache_budget` bytes of blocks are kept uncompressed. Touching an
/// offset inflates its block and may compress the least-recently-used other
/// block to stay within budget.
///
/// # Threading
/// Every call, reads included, mutates block state and counters. Callers
/// sharing a buffer across threads must serialize access themselves.
pub struct CompressedBuffer {
    store: BlockStore,
    length: usize,
}

/// Typed little-endian read/write pairs, all expressed over `sub_range` and
/// `write_range` so block crossing is handled in one place.
macro_rules! typed_access {
    ($($ty:ty => $read:ident, $write:ident;)*) => {
        $(
            #[doc = concat!("Read a little-endian `", stringify!($ty), "` at `offset`.")]
            pub fn $read(&mut self, offset: usize) -> Result<$ty> {
                const WIDTH: usize = std::mem::size_of::<$ty>();
                let bytes = self.sub_range(offset, Some(offset + WIDTH))?;
                let mut le = [0u8; WIDTH];
                le.copy_from_slice(&bytes);
                Ok(<$ty>::from_le_bytes(le))
            }

            #[doc = concat!("Write `value` as a little-endian `", stringify!($ty), "` at `offset`.")]
            pub fn $write(&mut self, value: $ty, offset: usize) -> Result<usize> {
                self.write_range(&value.to_le_bytes(), offset)
            }
        )*
    };
}

impl CompressedBuffer {
    /// Create an empty buffer with one uncompressed block.
    ///
    /// `config.codec` is informational here; the caller supplies the codec
    /// instance directly. Use `coldbuf_codecs::new_buffer` to resolve it by
    /// name.
    pub fn new(config: &BufferConfig, codec: Arc<dyn Codec>) -> Result<Self> {
        Ok(Self {
            store: BlockStore::new(config, codec)?,
            length: 0,
        })
    }

    /// Build a buffer holding `bytes` at offset 0.
    pub fn from_bytes(config: &BufferConfig, codec: Arc<dyn Codec>, bytes: &[u8]) -> Result<Self> {
        let mut buffer = Self::new(config, codec)?;
        buffer.write_range(bytes, 0)?;
        Ok(buffer)
    }

    /// Build a buffer holding the decoded `text` at offset 0.
    pub fn from_text(
        config: &BufferConfig,
        codec: Arc<dyn Codec>,
        text: &str,
        encoding: TextEncoding,
    ) -> Result<Self> {
        let bytes = encoding.decode(text)?;
        Self::from_bytes(config, codec, &bytes)
    }

    // ── Introspection ──────────────────────────────────────────────────────

    /// Highest offset ever written, plus one.
    #[inline]
    pub fn len(&self) -> usize {
        self.length
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.store.capacity()
    }

    #[inline]
    pub fn alloc_size(&self) -> usize {
        self.store.alloc_size()
    }

    #[inline]
    pub fn cache_budget(&self) -> usize {
        self.store.cache_budget()
    }

    pub fn codec_name(&self) -> &'static str {
        self.store.codec_name()
    }

    pub fn block_count(&self) -> usize {
        self.store.blocks().len()
    }

    /// Raw bytes currently held by uncompressed blocks.
    pub fn uncompressed_total(&self) -> usize {
        self.store.totals().uncompressed
    }

    /// Codec output bytes currently held by compressed blocks.
    pub fn compressed_total(&self) -> usize {
        self.store.totals().compressed
    }

    pub fn total_physical(&self) -> usize {
        self.store.totals().physical
    }

    /// Borrow the underlying block store (read-only).
    pub fn store(&self) -> &BlockStore {
        &self.store
    }

    pub fn stats(&self) -> BufferStats {
        let totals = self.store.totals();
        BufferStats {
            codec: self.store.codec_name(),
            length: self.length,
            capacity: self.store.capacity(),
            alloc_size: self.store.alloc_size(),
            cache_budget: self.store.cache_budget(),
            block_count: self.store.blocks().len(),
            compressed_blocks: self
                .store
                .blocks()
                .iter()
                .filter(|b| b.is_compressed())
                .count(),
            uncompressed_total: totals.uncompressed,
            compressed_total: totals.compressed,
            total_physical: totals.physical,
        }
    }

    /// Force every block into its compressed form.
    pub fn compress_all(&mut self) -> Result<()> {
        self.store.compress_all()
    }

    // ── Raw ranges ─────────────────────────────────────────────────────────

    /// Bytes at logical offsets `[start, end)`; `end` defaults to `len()`.
    ///
    /// A range inside one block is returned as a borrowed view of that block.
    /// A range crossing block boundaries is spliced into a new vector, block
    /// by block. An empty or inverted range yields no bytes and does not grow
    /// the buffer.
    pub fn sub_range(&mut self, start: usize, end: Option<usize>) -> Result<Cow<'_, [u8]>> {
        let end = end.unwrap_or(self.length);
        if end <= start {
            return Ok(Cow::Borrowed(&[]));
        }
        let len = end - start;

        let idx = self.store.resolve(start, true)?;
        let local = start - self.store.block(idx).start_offset();
        if local + len <= self.store.alloc_size() {
            return Ok(Cow::Borrowed(&self.store.raw(idx)[local..local + len]));
        }

        let mut out = vec![0u8; len];
        let mut read = 0;
        while read < len {
            let cursor = start + read;
            let idx = self.store.resolve(cursor, true)?;
            let local = cursor - self.store.block(idx).start_offset();
            let raw = self.store.raw(idx);
            let n = (raw.len() - local).min(len - read);
            out[read..read + n].copy_from_slice(&raw[local..local + n]);
            read += n;
        }
        Ok(Cow::Owned(out))
    }

    /// Write `bytes` starting at logical `offset`, crossing blocks as needed.
    ///
    /// Returns the number of bytes written, which is always `bytes.len()`.
    /// An empty slice is a no-op.
    pub fn write_range(&mut self, bytes: &[u8], offset: usize) -> Result<usize> {
        let mut wrote = 0;
        while wrote < bytes.len() {
            let cursor = offset + wrote;
            let idx = self.store.resolve(cursor, true)?;
            let local = cursor - self.store.block(idx).start_offset();
            let raw = self.store.raw_mut(idx);
            let n = (raw.len() - local).min(bytes.len() - wrote);
            raw[local..local + n].copy_from_slice(&bytes[wrote..wrote + n]);
            wrote += n;
        }
        if wrote > 0 && offset + wrote > self.length {
            self.length = offset + wrote;
        }
        Ok(wrote)
    }

    // ── Typed access ───────────────────────────────────────────────────────

    typed_access! {
        i8 => read_i8, write_i8;
        u8 => read_u8, write_u8;
        i16 => read_i16, write_i16;
        u16 => read_u16, write_u16;
        i32 => read_i32, write_i32;
        u32 => read_u32, write_u32;
        f32 => read_f32, write_f32;
        f64 => read_f64, write_f64;
    }

    // ── Whole buffer ───────────────────────────────────────────────────────

    /// Copy of logical offsets `[0, len())`, inflating blocks as it goes.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        let length = self.length;
        Ok(self.sub_range(0, Some(length))?.into_owned())
    }

    /// Contents of [`to_bytes`](Self::to_bytes) rendered as text.
    pub fn to_text(&mut self, encoding: TextEncoding) -> Result<String> {
        Ok(encoding.encode(&self.to_bytes()?))
    }
}
