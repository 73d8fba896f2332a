//! Store Module
//!
//! Chained records over fixed-size blocks.
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────┐  offset 0
//! │ Block 0: superblock          │
//! ├──────────────────────────────┤  offset block_size
//! │ Block 1                      │
//! ├──────────────────────────────┤
//! │ ...                          │
//! ├──────────────────────────────┤  offset n * block_size
//! │ Block n                      │
//! └──────────────────────────────┘
//! ```
//!
//! A record is a chain `head → … → tail` linked by each header's `next`;
//! the tail has `next == 0`. The head's id identifies the record.

mod block_store;
mod recovery;
mod superblock;

use bytes::Bytes;

use crate::block::BlockId;
use crate::error::Result;

pub use block_store::BlockStore;
pub use recovery::{rebuild_free_list, RecoveryResult};
pub use superblock::{FileHeader, MAGIC, VERSION};

/// Persist bytes, retrieve bytes
pub trait Store {
    /// Write a payload and return the id to read it back with
    fn persist(&self, data: &[u8]) -> Result<BlockId>;

    /// Read back a payload previously persisted
    fn retrieve(&self, id: BlockId) -> Result<Bytes>;
}
