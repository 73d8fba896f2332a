//! Buffer Module
//!
//! Zero-copy access to file sections through memory-mapped pages.
//!
//! ## Responsibilities
//! - Enforce page/length alignment of requested sections
//! - Map the containing page read/write and shared
//! - Serialize handles to the same page
//! - Flush (msync) on release

mod handle;
mod manager;
mod page;

use crate::error::Result;

pub use handle::{BufferHandle, BufferView};
pub use manager::MmapBufferManager;
pub use page::system_page_size;

/// Scoped writable access to aligned sections of a file
pub trait BufferManager {
    /// Acquire a writable view over `length` bytes at `offset`
    fn acquire(&self, offset: u64, length: usize) -> Result<BufferHandle>;

    /// Flush the handle's writes to stable storage and give the section back
    fn release(&self, handle: BufferHandle) -> Result<()>;
}
