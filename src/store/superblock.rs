//! Superblock
//!
//! Block 0 describes the file: magic, format version, block size and the
//! byte order of every block header. Always bincode's little-endian
//! encoding followed by a CRC32, whatever byte order it records.
//!
//! ```text
//! ┌──────────┬─────────────┬────────────────┬────────────────┬─────────┐
//! │Magic (4) │ Version (2) │ BlockSize (4)  │ ByteOrder (4)  │ CRC (4) │
//! └──────────┴─────────────┴────────────────┴────────────────┴─────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::block::ByteOrder;
use crate::config::Config;
use crate::error::{Result, StoreError};

/// Magic bytes identifying a blockstore file
pub const MAGIC: &[u8; 4] = b"BLKS";

/// Current file format version
pub const VERSION: u16 = 1;

/// File description stored in block 0
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHeader {
    pub magic: [u8; 4],
    pub version: u16,
    pub block_size: u32,
    pub byte_order: ByteOrder,
}

impl FileHeader {
    /// Header for a new file created with `config`
    pub fn for_config(config: &Config) -> Self {
        Self {
            magic: *MAGIC,
            version: VERSION,
            block_size: config.block_size as u32,
            byte_order: config.byte_order,
        }
    }

    /// Serialize with a trailing CRC32
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut bytes = bincode::serialize(self)?;
        let crc = crc32fast::hash(&bytes);
        bytes.extend_from_slice(&crc.to_le_bytes());
        Ok(bytes)
    }

    /// Parse and checksum the start of block 0
    pub fn decode(block: &[u8]) -> Result<Self> {
        if block.len() < MAGIC.len() || &block[..MAGIC.len()] != MAGIC {
            return Err(StoreError::Corruption(format!(
                "Invalid file magic: expected BLKS, got {:?}",
                &block[..MAGIC.len().min(block.len())]
            )));
        }

        let header: FileHeader = bincode::deserialize(block)?;
        let body_len = bincode::serialized_size(&header)? as usize;

        let crc_bytes = block
            .get(body_len..body_len + 4)
            .ok_or_else(|| StoreError::Corruption("Superblock truncated".to_string()))?;
        let stored = u32::from_le_bytes([crc_bytes[0], crc_bytes[1], crc_bytes[2], crc_bytes[3]]);
        let computed = crc32fast::hash(&block[..body_len]);

        if stored != computed {
            return Err(StoreError::Corruption(format!(
                "Superblock checksum mismatch: stored {:#010x}, computed {:#010x}",
                stored, computed
            )));
        }

        if header.version != VERSION {
            return Err(StoreError::Corruption(format!(
                "Unsupported file version: {}",
                header.version
            )));
        }

        Ok(header)
    }

    /// Reject a configuration that disagrees with the file
    pub fn check_matches(&self, config: &Config) -> Result<()> {
        if self.block_size as usize != config.block_size {
            return Err(StoreError::Config(format!(
                "file uses {} byte blocks, configured for {}",
                self.block_size, config.block_size
            )));
        }

        if self.byte_order != config.byte_order {
            return Err(StoreError::Config(format!(
                "file uses {:?} byte order, configured for {:?}",
                self.byte_order, config.byte_order
            )));
        }

        Ok(())
    }
}
