//! Record layout inside a single block
//!
//! `[header][payload]` where only `payload[0..length]` is meaningful.

use crate::error::{Result, StoreError};

use super::{BlockHeader, BlockLayout, ByteOrder, HEADER_SIZE};

/// Write a header and its chunk into a block buffer.
///
/// The chunk length becomes the header length; the header passed in
/// supplies the flags and the continuation pointer.
pub fn write_block(
    buf: &mut [u8],
    header: BlockHeader,
    chunk: &[u8],
    order: ByteOrder,
    layout: BlockLayout,
) -> Result<()> {
    if buf.len() != layout.block_size {
        return Err(StoreError::Corruption(format!(
            "Block buffer is {} bytes, expected {}",
            buf.len(),
            layout.block_size
        )));
    }

    if chunk.len() > layout.data_size {
        return Err(StoreError::RecordTooLarge {
            len: chunk.len(),
            max: layout.data_size,
        });
    }

    let header = BlockHeader {
        length: chunk.len() as u16,
        ..header
    };

    buf[..HEADER_SIZE].copy_from_slice(&header.encode(order));
    buf[HEADER_SIZE..HEADER_SIZE + chunk.len()].copy_from_slice(chunk);
    // Reused blocks may still hold a previous record's bytes
    buf[HEADER_SIZE + chunk.len()..].fill(0);

    Ok(())
}

/// Decode a block buffer into its header and the meaningful payload bytes
pub fn read_block(buf: &[u8], order: ByteOrder, layout: BlockLayout) -> Result<(BlockHeader, &[u8])> {
    let header = BlockHeader::decode(buf, order)?;
    let length = header.length as usize;

    if length > layout.data_size || HEADER_SIZE + length > buf.len() {
        return Err(StoreError::Corruption(format!(
            "Block length {} exceeds payload capacity {}",
            length, layout.data_size
        )));
    }

    Ok((header, &buf[HEADER_SIZE..HEADER_SIZE + length]))
}
