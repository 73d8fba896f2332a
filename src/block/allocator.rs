//! Block Allocator
//!
//! Decides where the next block goes: a reclaimed id from the free list,
//! otherwise a fresh block appended to the file.
//!
//! ## Concurrency:
//! - `FreeList`: own Mutex, O(1) push/pop
//! - `FileExtent`: own Mutex held only for stat + extend
//! - The two are independent, so reuse never waits behind file growth

use std::collections::{HashSet, VecDeque};
use std::fs::File;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::error::{Result, StoreError};

use super::{BlockId, BlockLayout};

// =============================================================================
// File Extent
// =============================================================================

/// The backing file's size, grown one block at a time under an exclusive lock
#[derive(Debug)]
pub struct FileExtent {
    file: Arc<File>,
    /// Serializes stat + extend; never held during block writes
    grow_lock: Mutex<()>,
}

impl FileExtent {
    pub fn new(file: Arc<File>) -> Self {
        Self {
            file,
            grow_lock: Mutex::new(()),
        }
    }

    /// Current file length in bytes
    pub fn len(&self) -> Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    /// Append one block and return its id (`size / block_size` before growth)
    pub fn grow(&self, layout: BlockLayout) -> Result<BlockId> {
        let _guard = self.grow_lock.lock();

        let block_size = layout.block_size as u64;
        // Block 0 is reserved, so an empty file grows past it
        let size = self.file.metadata()?.len().max(block_size);
        let id = size / block_size;
        if id > BlockId::MAX as u64 {
            return Err(StoreError::Exhausted);
        }

        self.file.set_len(size + block_size)?;
        trace!(id, new_len = size + block_size, "extended file");

        Ok(id as BlockId)
    }
}

// =============================================================================
// Free List
// =============================================================================

/// Reclaimed block ids, reused before the file grows
#[derive(Debug, Default)]
pub struct FreeList {
    inner: Mutex<FreeListInner>,
}

#[derive(Debug, Default)]
struct FreeListInner {
    queue: VecDeque<BlockId>,
    members: HashSet<BlockId>,
}

impl FreeList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the oldest reclaimed id, if any
    pub fn pop(&self) -> Option<BlockId> {
        let mut inner = self.inner.lock();
        let id = inner.queue.pop_front()?;
        inner.members.remove(&id);
        Some(id)
    }

    /// Return an id for reuse. Fails if it is already free.
    pub fn push(&self, id: BlockId) -> Result<()> {
        let mut inner = self.inner.lock();
        if !inner.members.insert(id) {
            return Err(StoreError::DoubleFree(id));
        }
        inner.queue.push_back(id);
        Ok(())
    }

    pub fn contains(&self, id: BlockId) -> bool {
        self.inner.lock().members.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// Block Allocator
// =============================================================================

/// Hands out ready-to-write blocks
///
/// Cheap to clone; clones share the same extent and free list.
#[derive(Debug, Clone)]
pub struct BlockAllocator {
    extent: Arc<FileExtent>,
    free_list: Arc<FreeList>,
    layout: BlockLayout,
}

impl BlockAllocator {
    pub fn new(extent: Arc<FileExtent>, free_list: Arc<FreeList>, layout: BlockLayout) -> Self {
        Self {
            extent,
            free_list,
            layout,
        }
    }

    /// Allocate a block, returning its id and byte offset
    ///
    /// Steps:
    /// 1. Pop the free list (free-list lock only)
    /// 2. Otherwise extend the file by one block (extent lock only)
    ///
    /// No retry on failure; the caller decides whether to redo the write.
    pub fn allocate_block(&self) -> Result<(BlockId, u64)> {
        if let Some(id) = self.free_list.pop() {
            trace!(id, "reusing free block");
            return Ok((id, self.layout.offset_of(id)));
        }

        let id = self.extent.grow(self.layout)?;
        Ok((id, self.layout.offset_of(id)))
    }

    /// Return a block to the free list
    ///
    /// Block 0 is the superblock and can never be freed.
    pub fn free_block(&self, id: BlockId) -> Result<()> {
        if id == super::NO_CONTINUATION || id as u64 >= self.block_count()? {
            return Err(StoreError::InvalidBlockId(id));
        }

        self.free_list.push(id)?;
        debug!(id, "block returned to free list");
        Ok(())
    }

    /// Number of blocks in the file, superblock included
    pub fn block_count(&self) -> Result<u64> {
        Ok(self.extent.len()? / self.layout.block_size as u64)
    }

    /// Number of reclaimed blocks waiting for reuse
    pub fn free_count(&self) -> usize {
        self.free_list.len()
    }

    pub fn layout(&self) -> BlockLayout {
        self.layout
    }
}
