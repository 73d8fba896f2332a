//! mmap Buffer Manager
//!
//! Maps the page containing a requested section and hands out the section.
//!
//! ## Section rules (checked in order)
//! 1. `length` divides the page size and `offset % length == 0` → else `UnalignedBuffer`
//! 2. `[offset, offset + length)` lies inside one page → else `SectionAcrossPages`
//! 3. The section lies inside the file → else `OutOfBounds`
//!
//! ## Concurrency:
//! Each page has a reader/writer lock held for the lifetime of a handle.
//! `acquire` takes it exclusively, `acquire_shared` shares it, so two
//! writers of blocks on the same page never interleave.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Arc;

use memmap2::MmapOptions;
use tracing::trace;

use crate::error::{Result, StoreError};

use super::page::{system_page_size, PageLocks};
use super::{BufferHandle, BufferManager, BufferView};

/// Page-aligned, memory-mapped access to a shared file
#[derive(Debug)]
pub struct MmapBufferManager {
    file: Arc<File>,
    page_size: usize,
    pages: PageLocks,
}

/// Where a validated section sits inside its page
struct Section {
    page_start: u64,
    map_len: usize,
    start: usize,
}

impl MmapBufferManager {
    /// Manage buffers over an already open read/write file
    pub fn new(file: Arc<File>) -> Self {
        Self {
            file,
            page_size: system_page_size(),
            pages: PageLocks::default(),
        }
    }

    /// Open (or create) a file and manage buffers over it
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        Ok(Self::new(Arc::new(file)))
    }

    /// Acquire a writable view over `length` bytes at `offset`
    ///
    /// Blocks while any other handle holds the same page.
    pub fn acquire(&self, offset: u64, length: usize) -> Result<BufferHandle> {
        let page = self.check_section(offset, length)?;

        let guard = self.pages.exclusive(page);
        let section = self.locate(page, offset, length)?;

        // SAFETY: MmapOptions::map_mut is unsafe because the file may be
        // modified outside this mapping. This is sound because:
        // 1. The mapping never extends past the current end of file (locate)
        // 2. The file only grows, so the mapped range stays backed
        // 3. The exclusive page lock keeps other handles off this page
        let map = unsafe {
            MmapOptions::new()
                .offset(section.page_start)
                .len(section.map_len)
                .map_mut(&*self.file)?
        };

        trace!(offset, length, page, "acquired buffer");
        Ok(BufferHandle::new(map, section.start, length, offset, guard))
    }

    /// Acquire a read-only view over `length` bytes at `offset`
    ///
    /// Shares the page with other readers; waits for writers.
    pub fn acquire_shared(&self, offset: u64, length: usize) -> Result<BufferView> {
        let page = self.check_section(offset, length)?;

        let guard = self.pages.shared(page);
        let section = self.locate(page, offset, length)?;

        // SAFETY: Same argument as `acquire`; writers to this page are
        // excluded by the shared page lock for the lifetime of the view.
        let map = unsafe {
            MmapOptions::new()
                .offset(section.page_start)
                .len(section.map_len)
                .map(&*self.file)?
        };

        trace!(offset, length, page, "acquired shared buffer");
        Ok(BufferView::new(map, section.start, length, offset, guard))
    }

    /// Flush a handle's writes to stable storage and unlock its page
    pub fn release(&self, handle: BufferHandle) -> Result<()> {
        handle.release()
    }

    /// Page size used for alignment checks
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Current length of the backing file
    pub fn file_len(&self) -> Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    /// The shared file handle behind every mapping
    pub fn file(&self) -> &Arc<File> {
        &self.file
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Validate section geometry and return the page index holding it
    fn check_section(&self, offset: u64, length: usize) -> Result<u64> {
        let page_size = self.page_size as u64;

        if length == 0 || self.page_size % length != 0 || offset % length as u64 != 0 {
            return Err(StoreError::UnalignedBuffer { offset, length });
        }

        // An aligned section never crosses a page; checked anyway
        let first_page = offset / page_size;
        let last_page = offset.saturating_add(length as u64 - 1) / page_size;
        if first_page != last_page {
            return Err(StoreError::SectionAcrossPages {
                offset,
                length,
                page_size: self.page_size,
            });
        }

        Ok(first_page)
    }

    /// Bounds-check against the file and compute the mapping window
    fn locate(&self, page: u64, offset: u64, length: usize) -> Result<Section> {
        let file_len = self.file_len()?;
        if offset.saturating_add(length as u64) > file_len {
            return Err(StoreError::OutOfBounds {
                offset,
                length,
                file_len,
            });
        }

        let page_start = page * self.page_size as u64;
        let map_len = (file_len - page_start).min(self.page_size as u64) as usize;

        Ok(Section {
            page_start,
            map_len,
            start: (offset - page_start) as usize,
        })
    }
}

impl BufferManager for MmapBufferManager {
    fn acquire(&self, offset: u64, length: usize) -> Result<BufferHandle> {
        MmapBufferManager::acquire(self, offset, length)
    }

    fn release(&self, handle: BufferHandle) -> Result<()> {
        MmapBufferManager::release(self, handle)
    }
}
