use crate::block::Block;

/// Index of the least-recently-used uncompressed block, skipping `pinned`.
///
/// Full scan in storage order; on equal `last_used` the earlier block wins.
/// Returns `None` when every candidate is already compressed.
///
/// The scan is O(blocks). The number of uncompressed blocks is bounded by
/// `cache_budget / alloc_size`, but the total block count is not, so very
/// large buffers would want an index keyed by `last_used` instead.
pub fn find_lru_block(blocks: &[Block], pinned: Option<usize>) -> Option<usize> {
    let mut oldest: Option<(usize, u64)> = None;
    for (idx, block) in blocks.iter().enumerate() {
        if block.is_compressed() || Some(idx) == pinned {
            continue;
        }
        match oldest {
            Some((_, tick)) if block.last_used() >= tick => {}
            _ => oldest = Some((idx, block.last_used())),
        }
    }
    oldest.map(|(idx, _)| idx)
}
