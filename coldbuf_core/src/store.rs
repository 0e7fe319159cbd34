use std::sync::Arc;

use tracing::{debug, trace};

use crate::block::{Block, Storage};
use crate::codec::Codec;
use crate::config::BufferConfig;
use crate::error::{BufferError, Result};
use crate::lru::find_lru_block;

/// Byte counters derived from per-block state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    /// Raw bytes held by uncompressed blocks.
    pub uncompressed: usize,
    /// Codec output bytes held by compressed blocks.
    pub compressed: usize,
    /// Sum of the two.
    pub physical: usize,
}

/// Ordered, append-only sequence of blocks covering `[0, capacity)`.
///
/// # Responsibilities
/// - Translate a logical offset to its owning block, growing on demand.
/// - Move blocks between raw and compressed form through the codec:
///   decompress on access, compress under cache pressure.
/// - Keep the running [`Totals`] equal to what a scan of the blocks yields
///   after every public call.
///
/// Every access re-runs the budget check, so touching one offset may
/// compress a different, older block.
pub struct BlockStore {
    blocks: Vec<Block>,
    codec: Arc<dyn Codec>,
    alloc_size: usize,
    cache_budget: usize,
    capacity: usize,
    totals: Totals,
    /// Logical clock stamped into `Block::last_used`.
    clock: u64,
}

impl BlockStore {
    /// Create a store holding a single empty, uncompressed block.
    pub fn new(config: &BufferConfig, codec: Arc<dyn Codec>) -> Result<Self> {
        config.validate()?;
        let mut store = Self {
            blocks: Vec::new(),
            codec,
            alloc_size: config.alloc_size,
            cache_budget: config.cache_budget,
            capacity: 0,
            totals: Totals::default(),
            clock: 0,
        };
        store.push_empty_block()?;
        Ok(store)
    }

    #[inline]
    pub fn alloc_size(&self) -> usize {
        self.alloc_size
    }

    #[inline]
    pub fn cache_budget(&self) -> usize {
        self.cache_budget
    }

    /// Logical bytes backed by blocks: `alloc_size * block_count`.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn totals(&self) -> Totals {
        self.totals
    }

    pub fn codec_name(&self) -> &'static str {
        self.codec.name()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block(&self, idx: usize) -> &Block {
        &self.blocks[idx]
    }

    /// Raw bytes of a block just returned by `resolve(_, true)`.
    ///
    /// A resolved block is exempt from the eviction that follows resolution,
    /// so it is always uncompressed here.
    pub(crate) fn raw(&self, idx: usize) -> &[u8] {
        self.blocks[idx]
            .raw()
            .unwrap_or_else(|| unreachable!("block {idx} compressed after resolve"))
    }

    pub(crate) fn raw_mut(&mut self, idx: usize) -> &mut [u8] {
        match &mut self.blocks[idx].storage {
            Storage::Raw(bytes) => bytes,
            Storage::Compressed(_) => unreachable!("block {idx} compressed after resolve"),
        }
    }

    /// Recompute the counters from scratch by scanning every block.
    pub fn scan_totals(&self) -> Totals {
        self.blocks.iter().fold(Totals::default(), |mut acc, block| {
            let len = block.physical_len();
            if block.is_compressed() {
                acc.compressed += len;
            } else {
                acc.uncompressed += len;
            }
            acc.physical += len;
            acc
        })
    }

    /// Grow until `offset` lies inside the address space.
    pub fn ensure_capacity(&mut self, offset: usize) -> Result<()> {
        while offset >= self.capacity {
            self.push_empty_block()?;
        }
        Ok(())
    }

    /// Find the block owning `offset`, growing first if needed.
    ///
    /// With `force_uncompressed`, a compressed block is inflated in place and
    /// its `last_used` refreshed. The returned block is exempt from the budget
    /// check that follows, so it is uncompressed when the caller receives it.
    pub fn resolve(&mut self, offset: usize, force_uncompressed: bool) -> Result<usize> {
        self.ensure_capacity(offset)?;

        // Blocks are contiguous and equally sized, so the owner is found by
        // division rather than a scan.
        let idx = offset / self.alloc_size;
        debug_assert!(self.blocks[idx].contains(offset));

        if force_uncompressed && self.blocks[idx].is_compressed() {
            self.decompress_block(idx)?;
        }
        if !self.blocks[idx].is_compressed() {
            let tick = self.tick();
            self.blocks[idx].last_used = tick;
        }

        self.check_budget(Some(idx))?;
        self.debug_check_accounting();
        Ok(idx)
    }

    /// Replace block `idx`'s raw bytes with the codec's output.
    ///
    /// Already-compressed blocks are left untouched.
    pub fn compress_block(&mut self, idx: usize) -> Result<()> {
        let raw = match &self.blocks[idx].storage {
            Storage::Raw(bytes) => bytes,
            Storage::Compressed(_) => return Ok(()),
        };
        let raw_len = raw.len();
        let compressed = self
            .codec
            .compress_block(raw)
            .map_err(|e| BufferError::Codec {
                codec: self.codec.name(),
                block: idx,
                reason: format!("{e:#}"),
            })?;

        debug!(
            block = idx,
            raw = raw_len,
            compressed = compressed.len(),
            "evicting block"
        );

        self.totals.uncompressed -= raw_len;
        self.totals.physical -= raw_len;
        self.totals.compressed += compressed.len();
        self.totals.physical += compressed.len();
        self.blocks[idx].storage = Storage::Compressed(compressed);
        Ok(())
    }

    /// Compress every uncompressed block. Afterwards no raw bytes remain.
    pub fn compress_all(&mut self) -> Result<()> {
        for idx in 0..self.blocks.len() {
            self.compress_block(idx)?;
        }
        debug_assert_eq!(self.totals.uncompressed, 0);
        self.debug_check_accounting();
        Ok(())
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Append a zero-filled block at `capacity`.
    ///
    /// New raw bytes count against the budget, so this may evict an older
    /// block; the new one is exempt.
    fn push_empty_block(&mut self) -> Result<usize> {
        let tick = self.tick();
        self.blocks.push(Block::new(self.capacity, self.alloc_size, tick));
        self.capacity += self.alloc_size;
        self.totals.uncompressed += self.alloc_size;
        self.totals.physical += self.alloc_size;

        let idx = self.blocks.len() - 1;
        debug!(block = idx, capacity = self.capacity, "grew buffer");
        self.check_budget(Some(idx))?;
        Ok(idx)
    }

    fn decompress_block(&mut self, idx: usize) -> Result<()> {
        let compressed = match &self.blocks[idx].storage {
            Storage::Compressed(bytes) => bytes,
            Storage::Raw(_) => return Ok(()),
        };
        let compressed_len = compressed.len();
        let raw = self
            .codec
            .decompress_block(compressed, self.alloc_size)
            .map_err(|e| BufferError::Codec {
                codec: self.codec.name(),
                block: idx,
                reason: format!("{e:#}"),
            })?;
        if raw.len() != self.alloc_size {
            return Err(BufferError::SizeMismatch {
                block: idx,
                expected: self.alloc_size,
                actual: raw.len(),
            });
        }

        trace!(block = idx, compressed = compressed_len, "inflating block");

        self.totals.compressed -= compressed_len;
        self.totals.physical -= compressed_len;
        self.totals.uncompressed += raw.len();
        self.totals.physical += raw.len();
        self.blocks[idx].storage = Storage::Raw(raw);
        Ok(())
    }

    /// Compress least-recently-used blocks until raw bytes fit the budget.
    ///
    /// Stops early when only `pinned` (or nothing) is left uncompressed, which
    /// happens when `alloc_size` alone exceeds the budget.
    fn check_budget(&mut self, pinned: Option<usize>) -> Result<()> {
        while self.totals.uncompressed > self.cache_budget {
            match find_lru_block(&self.blocks, pinned) {
                Some(victim) => self.compress_block(victim)?,
                None => break,
            }
        }
        Ok(())
    }

    #[inline]
    fn debug_check_accounting(&self) {
        debug_assert_eq!(
            self.totals,
            self.scan_totals(),
            "running totals drifted from block state"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Collapses all-zero blocks to one byte and tags everything else, so
    /// physical sizes change visibly on every transition.
    struct TaggingCodec;

    impl Codec for TaggingCodec {
        fn name(&self) -> &'static str {
            "tagging"
        }

        fn compress_block(&self, raw: &[u8]) -> anyhow::Result<Vec<u8>> {
            if raw.iter().all(|b| *b == 0) {
                return Ok(vec![0x00]);
            }
            let mut out = vec![0xFF];
            out.extend_from_slice(raw);
            Ok(out)
        }

        fn decompress_block(&self, compressed: &[u8], raw_len: usize) -> anyhow::Result<Vec<u8>> {
            match compressed.first() {
                Some(0xFF) => Ok(compressed[1..].to_vec()),
                _ => Ok(vec![0u8; raw_len]),
            }
        }
    }

    struct BrokenCodec;

    impl Codec for BrokenCodec {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn compress_block(&self, _raw: &[u8]) -> anyhow::Result<Vec<u8>> {
            Ok(vec![1, 2, 3])
        }

        fn decompress_block(&self, _compressed: &[u8], _raw_len: usize) -> anyhow::Result<Vec<u8>> {
            anyhow::bail!("corrupt stream")
        }
    }

    /// Inflates to one byte short of the requested size.
    struct ShortCodec;

    impl Codec for ShortCodec {
        fn name(&self) -> &'static str {
            "short"
        }

        fn compress_block(&self, _raw: &[u8]) -> anyhow::Result<Vec<u8>> {
            Ok(vec![1, 2, 3])
        }

        fn decompress_block(&self, _compressed: &[u8], raw_len: usize) -> anyhow::Result<Vec<u8>> {
            Ok(vec![0u8; raw_len - 1])
        }
    }

    fn store(alloc: usize, budget: usize) -> BlockStore {
        let config = BufferConfig::builder()
            .alloc_size(alloc)
            .cache_budget(budget)
            .build();
        BlockStore::new(&config, Arc::new(TaggingCodec)).unwrap()
    }

    #[test]
    fn starts_with_one_raw_block() {
        let s = store(64, 256);
        assert_eq!(s.blocks().len(), 1);
        assert_eq!(s.capacity(), 64);
        assert_eq!(
            s.totals(),
            Totals {
                uncompressed: 64,
                compressed: 0,
                physical: 64
            }
        );
    }

    #[test]
    fn growth_appends_contiguous_blocks() {
        let mut s = store(64, 1024);
        s.ensure_capacity(200).unwrap();
        assert_eq!(s.capacity(), 256);
        for (i, block) in s.blocks().iter().enumerate() {
            assert_eq!(block.start_offset(), i * 64);
            assert_eq!(block.nominal_size(), 64);
        }
        assert_eq!(s.totals(), s.scan_totals());
    }

    #[test]
    fn growth_evicts_oldest_block_under_budget() {
        let mut s = store(64, 128);
        s.ensure_capacity(64 * 3).unwrap();
        assert_eq!(s.blocks().len(), 4);
        assert!(s.block(0).is_compressed());
        assert!(s.block(1).is_compressed());
        assert!(!s.block(2).is_compressed());
        assert!(!s.block(3).is_compressed());
        assert_eq!(s.totals().uncompressed, 128);
        assert_eq!(s.totals(), s.scan_totals());
    }

    #[test]
    fn resolve_inflates_and_refreshes() {
        let mut s = store(64, 128);
        s.ensure_capacity(64 * 3).unwrap();
        let idx = s.resolve(10, true).unwrap();
        assert_eq!(idx, 0);
        assert!(!s.block(0).is_compressed());
        // block 2 was the oldest raw block left
        assert!(s.block(2).is_compressed());
        assert!(s.totals().uncompressed <= 128);
        assert_eq!(s.totals(), s.scan_totals());
    }

    #[test]
    fn resolve_without_force_leaves_block_compressed() {
        let mut s = store(64, 64);
        s.ensure_capacity(64).unwrap();
        assert!(s.block(0).is_compressed());
        let idx = s.resolve(0, false).unwrap();
        assert_eq!(idx, 0);
        assert!(s.block(0).is_compressed());
    }

    #[test]
    fn oversized_block_stays_resident_when_pinned() {
        let mut s = store(128, 64);
        let idx = s.resolve(300, true).unwrap();
        assert_eq!(idx, 2);
        assert!(!s.block(2).is_compressed());
        assert_eq!(s.totals().uncompressed, 128);
    }

    #[test]
    fn compress_all_is_idempotent() {
        let mut s = store(64, 1024);
        s.ensure_capacity(500).unwrap();
        s.compress_all().unwrap();
        let first = s.totals();
        assert_eq!(first.uncompressed, 0);
        s.compress_all().unwrap();
        assert_eq!(s.totals(), first);
    }

    #[test]
    fn codec_failure_surfaces_as_error() {
        let config = BufferConfig::builder().alloc_size(16).cache_budget(16).build();
        let mut s = BlockStore::new(&config, Arc::new(BrokenCodec)).unwrap();
        s.ensure_capacity(16).unwrap();
        assert!(s.block(0).is_compressed());
        let err = s.resolve(0, true).unwrap_err();
        assert!(matches!(err, BufferError::Codec { block: 0, .. }));
        assert_eq!(s.totals(), s.scan_totals());
    }

    #[test]
    fn short_inflate_is_rejected_without_touching_block() {
        let config = BufferConfig::builder().alloc_size(16).cache_budget(16).build();
        let mut s = BlockStore::new(&config, Arc::new(ShortCodec)).unwrap();
        s.ensure_capacity(16).unwrap();
        assert!(s.block(0).is_compressed());
        let before = s.totals();

        let err = s.resolve(0, true).unwrap_err();
        assert!(matches!(
            err,
            BufferError::SizeMismatch {
                block: 0,
                expected: 16,
                actual: 15
            }
        ));
        assert!(s.block(0).is_compressed());
        assert_eq!(s.totals(), before);
        assert_eq!(s.totals(), s.scan_totals());
    }
}
