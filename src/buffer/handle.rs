//! Scoped views over a mapped block
//!
//! A handle owns its mapping and its page lock. Dropping it always unmaps
//! and unlocks; `release` additionally reports whether the flush succeeded.

use std::fmt;
use std::ops::{Deref, DerefMut};

use memmap2::{Mmap, MmapMut};
use parking_lot::{ArcRwLockReadGuard, ArcRwLockWriteGuard, RawRwLock};
use tracing::warn;

use crate::error::Result;

/// Writable view over `length` bytes of the file, holding its page exclusively
pub struct BufferHandle {
    // Field order matters: the mapping is dropped before the lock
    map: MmapMut,
    start: usize,
    len: usize,
    offset: u64,
    released: bool,
    _guard: ArcRwLockWriteGuard<RawRwLock, ()>,
}

impl BufferHandle {
    pub(crate) fn new(
        map: MmapMut,
        start: usize,
        len: usize,
        offset: u64,
        guard: ArcRwLockWriteGuard<RawRwLock, ()>,
    ) -> Self {
        Self {
            map,
            start,
            len,
            offset,
            released: false,
            _guard: guard,
        }
    }

    /// File offset of the first byte of this view
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Flush the view to stable storage, then unmap and unlock.
    ///
    /// Blocks until the kernel reports the range durable.
    pub fn release(mut self) -> Result<()> {
        let result = self.map.flush_range(self.start, self.len);
        self.released = true;
        result?;
        Ok(())
    }
}

impl Deref for BufferHandle {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.map[self.start..self.start + self.len]
    }
}

impl DerefMut for BufferHandle {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.map[self.start..self.start + self.len]
    }
}

impl Drop for BufferHandle {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = self.map.flush_range(self.start, self.len) {
            warn!(offset = self.offset, error = %e, "flush of dropped buffer failed");
        }
    }
}

impl fmt::Debug for BufferHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferHandle")
            .field("offset", &self.offset)
            .field("len", &self.len)
            .field("released", &self.released)
            .finish()
    }
}

/// Read-only view over `length` bytes of the file, sharing its page with other readers
pub struct BufferView {
    map: Mmap,
    start: usize,
    len: usize,
    offset: u64,
    _guard: ArcRwLockReadGuard<RawRwLock, ()>,
}

impl BufferView {
    pub(crate) fn new(
        map: Mmap,
        start: usize,
        len: usize,
        offset: u64,
        guard: ArcRwLockReadGuard<RawRwLock, ()>,
    ) -> Self {
        Self {
            map,
            start,
            len,
            offset,
            _guard: guard,
        }
    }

    /// File offset of the first byte of this view
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Unmap and unlock. Nothing was written, so nothing is flushed.
    pub fn release(self) {}
}

impl Deref for BufferView {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.map[self.start..self.start + self.len]
    }
}

impl fmt::Debug for BufferView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferView")
            .field("offset", &self.offset)
            .field("len", &self.len)
            .finish()
    }
}
