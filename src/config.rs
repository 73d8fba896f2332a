//! Configuration for blockstore
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::block::{ByteOrder, HEADER_SIZE};
use crate::error::{Result, StoreError};

/// Smallest block that still holds the superblock in block 0
pub const MIN_BLOCK_SIZE: usize = 32;

/// Main configuration for a blockstore instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Backing file holding every block.
    /// Internal structure:
    ///   block 0      (superblock)
    ///   block 1..n   (record blocks)
    pub path: PathBuf,

    /// Create the backing file if it does not exist yet
    pub create_if_missing: bool,

    // -------------------------------------------------------------------------
    // Block Configuration
    // -------------------------------------------------------------------------
    /// Size of one on-disk block in bytes. Must divide the system page size.
    pub block_size: usize,

    /// Byte order of every block header, fixed for the lifetime of the file
    pub byte_order: ByteOrder,

    // -------------------------------------------------------------------------
    // Record Configuration
    // -------------------------------------------------------------------------
    /// Upper bound on the number of blocks one record may span.
    /// Bounds traversal so corrupted or cyclic links fail fast.
    pub max_chain_blocks: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./blockstore.dat"),
            create_if_missing: true,
            block_size: 512,
            byte_order: ByteOrder::Big,
            max_chain_blocks: 1 << 20,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Payload bytes available in each block
    pub fn data_size(&self) -> usize {
        self.block_size.saturating_sub(HEADER_SIZE)
    }

    /// Check the block geometry against the header layout and the page size
    pub fn validate(&self, page_size: usize) -> Result<()> {
        if self.block_size < MIN_BLOCK_SIZE {
            return Err(StoreError::Config(format!(
                "block size {} is below the minimum of {}",
                self.block_size, MIN_BLOCK_SIZE
            )));
        }

        if self.data_size() > u16::MAX as usize {
            return Err(StoreError::Config(format!(
                "block size {} leaves {} payload bytes, more than a u16 length can describe",
                self.block_size,
                self.data_size()
            )));
        }

        if page_size % self.block_size != 0 {
            return Err(StoreError::Config(format!(
                "block size {} does not divide the page size {}",
                self.block_size, page_size
            )));
        }

        if self.max_chain_blocks == 0 {
            return Err(StoreError::Config(
                "max_chain_blocks must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the backing file path
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.path = path.into();
        self
    }

    /// Create the file when it is missing (default: true)
    pub fn create_if_missing(mut self, create: bool) -> Self {
        self.config.create_if_missing = create;
        self
    }

    /// Set the block size (in bytes)
    pub fn block_size(mut self, size: usize) -> Self {
        self.config.block_size = size;
        self
    }

    /// Set the header byte order
    pub fn byte_order(mut self, order: ByteOrder) -> Self {
        self.config.byte_order = order;
        self
    }

    /// Set the maximum number of blocks per record
    pub fn max_chain_blocks(mut self, count: usize) -> Self {
        self.config.max_chain_blocks = count;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
