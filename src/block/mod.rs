//! Block Module
//!
//! Fixed-size on-disk blocks: header codec, record layout and allocation.
//!
//! ## Block Format
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │ Header (7 bytes)                                     │
//! │ ┌───────────┬────────────┬──────────────────────────┐ │
//! │ │ Flags (1) │ Length (2) │ Next (4)                 │ │
//! │ └───────────┴────────────┴──────────────────────────┘ │
//! ├──────────────────────────────────────────────────────┤
//! │ Payload (block_size - 7 bytes)                       │
//! │   only data[0..length] is meaningful                 │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! Block `i` lives at byte offset `i * block_size`. Block 0 is the
//! superblock, so `next == 0` can mean "no continuation".

mod allocator;
mod header;
mod record;

pub use allocator::{BlockAllocator, FileExtent, FreeList};
pub use header::{BlockHeader, ByteOrder, FLAG_USED, HEADER_SIZE};
pub use record::{read_block, write_block};

/// Identifier of a block; the id of a record's first block identifies the record
pub type BlockId = u32;

/// Continuation pointer of the last block in a chain
pub const NO_CONTINUATION: BlockId = 0;

/// Block size and payload capacity, fixed for the lifetime of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLayout {
    pub block_size: usize,
    pub data_size: usize,
}

impl BlockLayout {
    pub fn new(block_size: usize) -> Self {
        Self {
            block_size,
            data_size: block_size.saturating_sub(HEADER_SIZE),
        }
    }

    /// Byte offset of a block in the file
    pub fn offset_of(&self, id: BlockId) -> u64 {
        id as u64 * self.block_size as u64
    }

    /// Number of blocks needed for a payload; an empty payload still takes one
    pub fn blocks_for(&self, len: usize) -> usize {
        len.div_ceil(self.data_size).max(1)
    }
}
