//! Free-list recovery
//!
//! The free list lives in memory only. On open every block is scanned and
//! each one whose header is unused goes back on the free list: removed
//! records, and blocks the file grew by before a crash interrupted the write.

use tracing::debug;

use crate::block::{BlockAllocator, BlockHeader, BlockId, ByteOrder};
use crate::buffer::MmapBufferManager;
use crate::error::Result;

/// Outcome of a free-list recovery scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Blocks examined (superblock excluded)
    pub blocks_scanned: u64,

    /// Blocks whose header marks them used
    pub blocks_in_use: u64,

    /// Blocks returned to the free list
    pub blocks_reclaimed: u64,
}

/// Scan blocks `1..block_count` and seed the free list with unused ones
pub fn rebuild_free_list(
    buffers: &MmapBufferManager,
    allocator: &BlockAllocator,
    order: ByteOrder,
) -> Result<RecoveryResult> {
    let layout = allocator.layout();
    let block_count = allocator.block_count()?;
    let mut result = RecoveryResult::default();

    for id in 1..block_count {
        let id = id as BlockId;
        let view = buffers.acquire_shared(layout.offset_of(id), layout.block_size)?;
        let header = BlockHeader::decode(&view, order)?;
        view.release();

        result.blocks_scanned += 1;
        if header.used {
            result.blocks_in_use += 1;
        } else {
            allocator.free_block(id)?;
            result.blocks_reclaimed += 1;
        }
    }

    debug!(
        scanned = result.blocks_scanned,
        in_use = result.blocks_in_use,
        reclaimed = result.blocks_reclaimed,
        "free list recovered"
    );

    Ok(result)
}
