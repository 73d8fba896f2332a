//! Error types for blockstore
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

use crate::block::BlockId;

/// Result type alias using StoreError
pub type Result<T> = std::result::Result<T, StoreError>;

/// Unified error type for blockstore operations
#[derive(Debug, Error)]
pub enum StoreError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Buffer Errors
    // -------------------------------------------------------------------------
    #[error("Can't acquire buffer for unaligned offset ({offset}) and length ({length})")]
    UnalignedBuffer { offset: u64, length: usize },

    #[error("Section spreads across pages: offset {offset}, length {length}, page size {page_size}")]
    SectionAcrossPages {
        offset: u64,
        length: usize,
        page_size: usize,
    },

    #[error("Section out of bounds: offset {offset}, length {length}, file length {file_len}")]
    OutOfBounds {
        offset: u64,
        length: usize,
        file_len: u64,
    },

    // -------------------------------------------------------------------------
    // Block Errors
    // -------------------------------------------------------------------------
    #[error("Tried to read unused slot #{id}")]
    UnusedSlot { id: BlockId },

    #[error("Invalid block id: {0}")]
    InvalidBlockId(BlockId),

    #[error("Block #{0} is already on the free list")]
    DoubleFree(BlockId),

    #[error("Block id space exhausted")]
    Exhausted,

    // -------------------------------------------------------------------------
    // Record Errors
    // -------------------------------------------------------------------------
    #[error("Record of {len} bytes exceeds the maximum of {max} bytes")]
    RecordTooLarge { len: usize, max: usize },

    #[error("Chain starting at #{id} exceeds {limit} blocks")]
    ChainTooLong { id: BlockId, limit: usize },

    #[error("Corruption detected: {0}")]
    Corruption(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<bincode::Error> for StoreError {
    fn from(err: bincode::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}
