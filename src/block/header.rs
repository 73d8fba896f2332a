//! Block header codec
//!
//! Fixed-width serialization of the 7 byte block header. No semantic
//! validation happens here; callers check `length` against the layout.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

use super::BlockId;

/// Header size: Flags (1) + Length (2) + Next (4) = 7 bytes
pub const HEADER_SIZE: usize = 7;

/// Bit 0 of the flags byte: the block belongs to a live record
pub const FLAG_USED: u8 = 0b0000_0001;

/// Byte order of the multi-byte header fields.
///
/// Chosen once when the file is created and recorded in the superblock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    fn put_u16(self, value: u16) -> [u8; 2] {
        match self {
            ByteOrder::Little => value.to_le_bytes(),
            ByteOrder::Big => value.to_be_bytes(),
        }
    }

    fn put_u32(self, value: u32) -> [u8; 4] {
        match self {
            ByteOrder::Little => value.to_le_bytes(),
            ByteOrder::Big => value.to_be_bytes(),
        }
    }

    fn get_u16(self, bytes: [u8; 2]) -> u16 {
        match self {
            ByteOrder::Little => u16::from_le_bytes(bytes),
            ByteOrder::Big => u16::from_be_bytes(bytes),
        }
    }

    fn get_u32(self, bytes: [u8; 4]) -> u32 {
        match self {
            ByteOrder::Little => u32::from_le_bytes(bytes),
            ByteOrder::Big => u32::from_be_bytes(bytes),
        }
    }
}

/// Decoded block header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockHeader {
    /// Block belongs to a live record
    pub used: bool,
    /// Meaningful payload bytes in this block
    pub length: u16,
    /// Next block of the chain, 0 for the last one
    pub next: BlockId,
}

impl BlockHeader {
    /// Header of a live block
    pub fn used(length: u16, next: BlockId) -> Self {
        Self {
            used: true,
            length,
            next,
        }
    }

    /// Header written over a reclaimed block
    pub fn unused() -> Self {
        Self::default()
    }

    /// True when this is the last block of its chain
    pub fn is_last(&self) -> bool {
        self.next == super::NO_CONTINUATION
    }

    /// Encode to bytes: flags (1) + length (2) + next (4)
    pub fn encode(&self, order: ByteOrder) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0] = if self.used { FLAG_USED } else { 0 };
        bytes[1..3].copy_from_slice(&order.put_u16(self.length));
        bytes[3..7].copy_from_slice(&order.put_u32(self.next));
        bytes
    }

    /// Decode from the first `HEADER_SIZE` bytes of a block
    pub fn decode(bytes: &[u8], order: ByteOrder) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(StoreError::Corruption(format!(
                "Incomplete block header: expected {} bytes, got {}",
                HEADER_SIZE,
                bytes.len()
            )));
        }

        Ok(Self {
            used: bytes[0] & FLAG_USED != 0,
            length: order.get_u16([bytes[1], bytes[2]]),
            next: order.get_u32([bytes[3], bytes[4], bytes[5], bytes[6]]),
        })
    }
}
