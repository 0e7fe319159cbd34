pub mod block;
pub mod buffer;
pub mod codec;
pub mod config;
pub mod encoding;
pub mod error;
pub mod lru;
pub mod store;

pub use block::Block;
pub use buffer::{BufferStats, CompressedBuffer};
pub use codec::Codec;
pub use config::{BufferConfig, DEFAULT_ALLOC_SIZE, DEFAULT_CACHE_BUDGET, DEFAULT_CODEC};
pub use encoding::TextEncoding;
pub use error::{BufferError, Result};
pub use store::{BlockStore, Totals};
