//! # blockstore
//!
//! A fixed-block persistent storage engine with:
//! - Opaque payloads chained across fixed-size blocks
//! - Free-list reuse before the file grows
//! - Zero-copy block access through memory-mapped pages
//! - Per-page reader/writer locks for concurrent callers
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        BlockStore                            │
//! │              persist(bytes) → id, retrieve(id)               │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┼─────────────────────┐
//!          │            │                     │
//!          ▼            ▼                     ▼
//!   ┌─────────────┐ ┌─────────────┐   ┌───────────────┐
//!   │  Allocator  │ │   Record    │   │    Buffer     │
//!   │ (free list, │ │   codec     │   │   manager     │
//!   │   extent)   │ │ (7B header) │   │ (mmap pages)  │
//!   └──────┬──────┘ └─────────────┘   └───────┬───────┘
//!          │                                  │
//!          └──────────────┬───────────────────┘
//!                         ▼
//!                 ┌───────────────┐
//!                 │ Backing file  │
//!                 └───────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod block;
pub mod buffer;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, StoreError};
pub use config::Config;
pub use block::{BlockId, ByteOrder};
pub use buffer::{BufferManager, MmapBufferManager};
pub use store::{BlockStore, Store};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of blockstore
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
