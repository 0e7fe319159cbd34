/// Physical representation of a block's bytes.
///
/// Exactly one representation is live at a time. A `Raw` vector is always
/// `nominal_size` bytes long; a `Compressed` vector holds whatever the codec
/// produced for those bytes.
#[derive(Debug, Clone)]
pub enum Storage {
    Raw(Vec<u8>),
    Compressed(Vec<u8>),
}

/// Fixed logical-size unit of the buffer's address space.
///
/// The logical range `[start_offset, start_offset + nominal_size)` is fixed at
/// creation and never changes, even while `storage` holds fewer compressed
/// bytes.
#[derive(Debug, Clone)]
pub struct Block {
    pub(crate) storage: Storage,
    start_offset: usize,
    nominal_size: usize,
    /// Store tick of the most recent touch.
    pub(crate) last_used: u64,
}

impl Block {
    /// A zero-filled, uncompressed block.
    pub(crate) fn new(start_offset: usize, nominal_size: usize, tick: u64) -> Self {
        Self {
            storage: Storage::Raw(vec![0u8; nominal_size]),
            start_offset,
            nominal_size,
            last_used: tick,
        }
    }

    #[inline]
    pub fn start_offset(&self) -> usize {
        self.start_offset
    }

    /// Logical size; equal to the buffer's `alloc_size`.
    #[inline]
    pub fn nominal_size(&self) -> usize {
        self.nominal_size
    }

    /// One past the last logical offset this block owns.
    #[inline]
    pub fn end_offset(&self) -> usize {
        self.start_offset + self.nominal_size
    }

    #[inline]
    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start_offset && offset < self.end_offset()
    }

    #[inline]
    pub fn is_compressed(&self) -> bool {
        matches!(self.storage, Storage::Compressed(_))
    }

    /// Bytes currently held by this block's live representation.
    pub fn physical_len(&self) -> usize {
        match &self.storage {
            Storage::Raw(bytes) | Storage::Compressed(bytes) => bytes.len(),
        }
    }

    #[inline]
    pub fn last_used(&self) -> u64 {
        self.last_used
    }

    /// Raw bytes, if the block is currently uncompressed.
    pub fn raw(&self) -> Option<&[u8]> {
        match &self.storage {
            Storage::Raw(bytes) => Some(bytes),
            Storage::Compressed(_) => None,
        }
    }
}
