//! Block Store
//!
//! The facade that coordinates all components.
//!
//! ## Responsibilities
//! - Split payloads into block-sized chunks and chain them
//! - Drive the allocator and the buffer manager per chunk
//! - Walk chains on read, with a bound on their length
//! - Create or validate the superblock and recover the free list on open

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::block::{
    read_block, write_block, BlockAllocator, BlockHeader, BlockId, BlockLayout, FileExtent,
    FreeList, NO_CONTINUATION,
};
use crate::buffer::{system_page_size, MmapBufferManager};
use crate::config::{Config, MIN_BLOCK_SIZE};
use crate::error::{Result, StoreError};

use super::recovery::{rebuild_free_list, RecoveryResult};
use super::superblock::FileHeader;
use super::Store;

/// Fixed-block record store over a single file
///
/// ## Concurrency Model
///
/// No store-wide lock. Every method takes `&self`:
/// - **Allocation**: free-list lock or file-extent lock, never both
/// - **Block writes**: exclusive page lock from acquire to release
/// - **Block reads**: shared page lock, so readers of a page run together
/// - **Removal**: one `remove` at a time, from chain walk to last free
///
/// Concurrent `persist` calls interleave at block granularity. Each block is
/// written once and flushed before the next, so records never tear each other.
#[derive(Debug)]
pub struct BlockStore {
    /// Store configuration
    config: Config,

    /// Block and payload sizes
    layout: BlockLayout,

    /// mmap access to blocks (per-page locks)
    buffers: MmapBufferManager,

    /// Free list + file extent
    allocator: BlockAllocator,

    /// Outcome of the free-list scan performed at open
    recovery: RecoveryResult,

    /// Keeps a walked chain from being freed twice by racing removals
    remove_lock: Mutex<()>,
}

impl BlockStore {
    /// Open or create a store with the given config
    ///
    /// On startup:
    /// 1. Validate block geometry against the page size
    /// 2. Open/create the backing file
    /// 3. Write a new superblock, or validate the existing one
    /// 4. Rebuild the free list from unused blocks
    pub fn open(config: Config) -> Result<Self> {
        // Step 1: Geometry
        config.validate(system_page_size())?;
        let layout = BlockLayout::new(config.block_size);

        // Step 2: Shared file handle for the buffer manager and the extent
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(config.create_if_missing)
            .truncate(false)
            .open(&config.path)?;
        let file = Arc::new(file);

        let buffers = MmapBufferManager::new(Arc::clone(&file));
        let extent = Arc::new(FileExtent::new(Arc::clone(&file)));
        let allocator = BlockAllocator::new(extent, Arc::new(FreeList::new()), layout);

        // Step 3: Superblock
        let file_len = buffers.file_len()?;
        if file_len == 0 {
            Self::write_superblock(&buffers, &config)?;
            debug!(path = %config.path.display(), block_size = config.block_size, "created store");
        } else {
            Self::check_superblock(&buffers, &config, file_len)?;
        }

        // Step 4: Free list
        let recovery = rebuild_free_list(&buffers, &allocator, config.byte_order)?;

        debug!(
            path = %config.path.display(),
            blocks = allocator.block_count()?,
            free = allocator.free_count(),
            "opened store"
        );

        Ok(Self {
            config,
            layout,
            buffers,
            allocator,
            recovery,
            remove_lock: Mutex::new(()),
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified file
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().path(path).build())
    }

    /// Store a payload and return the id of its first block
    ///
    /// Chunks are written tail-to-head: the last chunk first as the chain
    /// terminator, each earlier chunk pointing at the block written just
    /// before it. Every header is complete when its block is written, and
    /// the first chunk's block, written last, is the returned id.
    ///
    /// On failure no id is returned; blocks already written stay orphaned
    /// until they are reclaimed.
    pub fn persist(&self, data: &[u8]) -> Result<BlockId> {
        let blocks = self.layout.blocks_for(data.len());
        if blocks > self.config.max_chain_blocks {
            return Err(StoreError::RecordTooLarge {
                len: data.len(),
                max: self.max_record_len(),
            });
        }

        let data_size = self.layout.data_size;
        let mut next = NO_CONTINUATION;

        for index in (0..blocks).rev() {
            let start = index * data_size;
            let end = (start + data_size).min(data.len());
            let chunk = &data[start..end];

            let (id, offset) = self.allocator.allocate_block()?;

            let mut handle = self.buffers.acquire(offset, self.layout.block_size)?;
            write_block(
                &mut handle,
                BlockHeader::used(0, next),
                chunk,
                self.config.byte_order,
                self.layout,
            )?;
            handle.release()?;

            trace!(id, len = chunk.len(), next, "wrote block");
            next = id;
        }

        debug!(id = next, len = data.len(), blocks, "persisted record");
        Ok(next)
    }

    /// Read back the payload stored under `id`
    ///
    /// Fails with `UnusedSlot` on a block not marked used, and with
    /// `ChainTooLong` once more than `max_chain_blocks` would be visited.
    /// Never returns partial data.
    pub fn retrieve(&self, id: BlockId) -> Result<Bytes> {
        let mut data = BytesMut::new();
        self.walk(id, |_, payload| data.extend_from_slice(payload))?;

        trace!(id, len = data.len(), "retrieved record");
        Ok(data.freeze())
    }

    /// Delete the record stored under `id`, returning its blocks to the free list
    ///
    /// The whole chain is validated before anything is modified. Returns
    /// the number of blocks reclaimed.
    ///
    /// Removals are serialized: a second `remove` of the same id walks
    /// only after the first has freed every block, and fails with
    /// `UnusedSlot`.
    pub fn remove(&self, id: BlockId) -> Result<usize> {
        let _guard = self.remove_lock.lock();

        let mut chain = Vec::new();
        self.walk(id, |block, _| chain.push(block))?;

        for &block in &chain {
            let mut handle = self
                .buffers
                .acquire(self.layout.offset_of(block), self.layout.block_size)?;
            write_block(
                &mut handle,
                BlockHeader::unused(),
                &[],
                self.config.byte_order,
                self.layout,
            )?;
            handle.release()?;

            self.allocator.free_block(block)?;
        }

        debug!(id, blocks = chain.len(), "removed record");
        Ok(chain.len())
    }

    /// Force the file (data and metadata) to stable storage
    pub fn sync(&self) -> Result<()> {
        self.buffers.file().sync_all()?;
        Ok(())
    }

    /// Close the store gracefully
    pub fn close(self) -> Result<()> {
        self.sync()
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Block and payload sizes
    pub fn layout(&self) -> BlockLayout {
        self.layout
    }

    /// Number of blocks in the file, superblock included
    pub fn block_count(&self) -> Result<u64> {
        self.allocator.block_count()
    }

    /// Number of reclaimed blocks waiting for reuse
    pub fn free_count(&self) -> usize {
        self.allocator.free_count()
    }

    /// Current length of the backing file
    pub fn file_len(&self) -> Result<u64> {
        self.buffers.file_len()
    }

    /// Largest payload a single record may hold
    pub fn max_record_len(&self) -> usize {
        self.config.max_chain_blocks.saturating_mul(self.layout.data_size)
    }

    /// What the free-list scan found at open
    pub fn recovery(&self) -> &RecoveryResult {
        &self.recovery
    }

    /// The block allocator (shares the store's free list and extent)
    pub fn allocator(&self) -> &BlockAllocator {
        &self.allocator
    }

    /// The buffer manager over the store's file
    pub fn buffers(&self) -> &MmapBufferManager {
        &self.buffers
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Visit each block of the chain starting at `id`, in chain order
    fn walk<F>(&self, id: BlockId, mut visit: F) -> Result<()>
    where
        F: FnMut(BlockId, &[u8]),
    {
        let block_count = self.allocator.block_count()?;
        let limit = self.config.max_chain_blocks;
        let mut current = id;
        let mut visited = 0usize;

        loop {
            if current == NO_CONTINUATION || current as u64 >= block_count {
                return Err(StoreError::InvalidBlockId(current));
            }

            visited += 1;
            if visited > limit {
                return Err(StoreError::ChainTooLong { id, limit });
            }

            let view = self
                .buffers
                .acquire_shared(self.layout.offset_of(current), self.layout.block_size)?;
            let (header, payload) = read_block(&view, self.config.byte_order, self.layout)?;

            if !header.used {
                return Err(StoreError::UnusedSlot { id: current });
            }

            trace!(id = current, len = header.length, next = header.next, "read block");
            visit(current, payload);

            if header.is_last() {
                return Ok(());
            }
            current = header.next;
        }
    }

    fn write_superblock(buffers: &MmapBufferManager, config: &Config) -> Result<()> {
        let bytes = FileHeader::for_config(config).encode()?;

        buffers.file().set_len(config.block_size as u64)?;
        let mut handle = buffers.acquire(0, config.block_size)?;
        handle[..bytes.len()].copy_from_slice(&bytes);
        handle.release()?;

        buffers.file().sync_all()?;
        Ok(())
    }

    fn check_superblock(buffers: &MmapBufferManager, config: &Config, file_len: u64) -> Result<()> {
        if file_len < MIN_BLOCK_SIZE as u64 {
            return Err(StoreError::Corruption(format!(
                "File of {} bytes is too short for a superblock",
                file_len
            )));
        }

        // The stored block size is unknown yet; every valid size holds the
        // superblock in its first MIN_BLOCK_SIZE bytes
        let view = buffers.acquire_shared(0, MIN_BLOCK_SIZE)?;
        let header = FileHeader::decode(&view)?;
        view.release();

        header.check_matches(config)?;

        if file_len % config.block_size as u64 != 0 {
            return Err(StoreError::Corruption(format!(
                "File length {} is not a multiple of the block size {}",
                file_len, config.block_size
            )));
        }

        Ok(())
    }
}

impl Store for BlockStore {
    fn persist(&self, data: &[u8]) -> Result<BlockId> {
        BlockStore::persist(self, data)
    }

    fn retrieve(&self, id: BlockId) -> Result<Bytes> {
        BlockStore::retrieve(self, id)
    }
}
