//! Page geometry and per-page locks

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{ArcRwLockReadGuard, ArcRwLockWriteGuard, Mutex, RawRwLock, RwLock};

/// Fallback when the platform does not report a page size
const DEFAULT_PAGE_SIZE: usize = 4096;

/// The operating system's memory page size
pub fn system_page_size() -> usize {
    #[cfg(unix)]
    {
        // SAFETY: sysconf has no preconditions and only reads a system constant.
        let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
        if size > 0 {
            return size as usize;
        }
    }

    DEFAULT_PAGE_SIZE
}

/// One reader/writer lock per mapped page, held from acquire to release.
///
/// Entries are created on first use and kept; there is at most one per
/// page of the file.
#[derive(Debug, Default)]
pub(crate) struct PageLocks {
    locks: Mutex<HashMap<u64, Arc<RwLock<()>>>>,
}

impl PageLocks {
    fn lock_for(&self, page: u64) -> Arc<RwLock<()>> {
        // The map mutex is released before blocking on the page lock
        let mut locks = self.locks.lock();
        Arc::clone(locks.entry(page).or_default())
    }

    /// Block until the page can be written exclusively
    pub(crate) fn exclusive(&self, page: u64) -> ArcRwLockWriteGuard<RawRwLock, ()> {
        self.lock_for(page).write_arc()
    }

    /// Block until the page can be read alongside other readers
    pub(crate) fn shared(&self, page: u64) -> ArcRwLockReadGuard<RawRwLock, ()> {
        self.lock_for(page).read_arc()
    }
}
