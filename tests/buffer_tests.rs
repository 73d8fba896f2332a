//! Tests for MmapBufferManager
//!
//! These tests verify:
//! - Writes through a handle reach the file
//! - Alignment and page-crossing rejection
//! - Bounds checks against the file length
//! - Handle cleanup on release and on drop

use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Arc;

use blockstore::buffer::{system_page_size, BufferManager, MmapBufferManager};
use blockstore::StoreError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

/// Manager over a fresh file of `len` zero bytes
fn setup_manager(len: u64) -> (TempDir, PathBuf, MmapBufferManager) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("buffers.dat");

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(&path)
        .unwrap();
    file.set_len(len).unwrap();

    let manager = MmapBufferManager::new(Arc::new(file));
    (temp_dir, path, manager)
}

// =============================================================================
// Read/Write Tests
// =============================================================================

#[test]
fn test_write_to_buffer() {
    let page = system_page_size() as u64;
    let (_temp, _path, manager) = setup_manager(page);

    let mut buf = manager.acquire(0, 512).unwrap();
    buf[..4].copy_from_slice(b"test");
    manager.release(buf).unwrap();

    let buf = manager.acquire(0, 512).unwrap();
    assert_eq!(&buf[..4], b"test");
    assert_eq!(buf.len(), 512);
}

#[test]
fn test_write_through_trait_object() {
    let page = system_page_size() as u64;
    let (_temp, _path, manager) = setup_manager(page);
    let buffers: &dyn BufferManager = &manager;

    let mut buf = buffers.acquire(512, 512).unwrap();
    buf[..5].copy_from_slice(b"trait");
    buffers.release(buf).unwrap();

    let view = manager.acquire_shared(512, 512).unwrap();
    assert_eq!(&view[..5], b"trait");
}

#[test]
fn test_handle_exposes_requested_section_only() {
    let page = system_page_size() as u64;
    let (_temp, path, manager) = setup_manager(page);

    let mut buf = manager.acquire(1024, 512).unwrap();
    assert_eq!(buf.offset(), 1024);
    buf.fill(0xAB);
    buf.release().unwrap();

    let contents = fs::read(&path).unwrap();
    assert!(contents[..1024].iter().all(|&b| b == 0));
    assert!(contents[1024..1536].iter().all(|&b| b == 0xAB));
    assert!(contents[1536..].iter().all(|&b| b == 0));
}

#[test]
fn test_section_on_second_page() {
    let page = system_page_size() as u64;
    let (_temp, path, manager) = setup_manager(page * 2);

    let mut buf = manager.acquire(page + 512, 512).unwrap();
    buf[..6].copy_from_slice(b"page 1");
    buf.release().unwrap();

    let contents = fs::read(&path).unwrap();
    let start = (page + 512) as usize;
    assert_eq!(&contents[start..start + 6], b"page 1");
}

#[test]
fn test_whole_page_section() {
    let page = system_page_size();
    let (_temp, _path, manager) = setup_manager(page as u64 * 2);

    let mut buf = manager.acquire(page as u64, page).unwrap();
    assert_eq!(buf.len(), page);
    buf[page - 1] = 7;
    buf.release().unwrap();

    let view = manager.acquire_shared(page as u64, page).unwrap();
    assert_eq!(view[page - 1], 7);
}

#[test]
fn test_section_in_partial_last_page() {
    let (_temp, _path, manager) = setup_manager(1024);

    let mut buf = manager.acquire(512, 512).unwrap();
    buf[0] = 1;
    buf.release().unwrap();

    let view = manager.acquire_shared(512, 512).unwrap();
    assert_eq!(view[0], 1);
}

#[test]
fn test_drop_without_release_still_writes() {
    let page = system_page_size() as u64;
    let (_temp, path, manager) = setup_manager(page);

    {
        let mut buf = manager.acquire(0, 512).unwrap();
        buf[..7].copy_from_slice(b"dropped");
    }

    let contents = fs::read(&path).unwrap();
    assert_eq!(&contents[..7], b"dropped");

    // Page lock was released by the drop
    let buf = manager.acquire(0, 512).unwrap();
    assert_eq!(&buf[..7], b"dropped");
}

#[test]
fn test_shared_views_coexist() {
    let page = system_page_size() as u64;
    let (_temp, _path, manager) = setup_manager(page);

    let a = manager.acquire_shared(0, 512).unwrap();
    let b = manager.acquire_shared(512, 512).unwrap();

    assert_eq!(a.len(), 512);
    assert_eq!(b.len(), 512);
    a.release();
    b.release();
}

#[test]
fn test_open_creates_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("new.dat");

    let manager = MmapBufferManager::open(&path).unwrap();

    assert!(path.exists());
    assert_eq!(manager.file_len().unwrap(), 0);
}

// =============================================================================
// Alignment Tests
// =============================================================================

#[test]
fn test_acquire_unaligned_buffer() {
    let page = system_page_size() as u64;
    let (_temp, _path, manager) = setup_manager(page);

    let result = manager.acquire(1, 511);
    assert!(matches!(
        result.unwrap_err(),
        StoreError::UnalignedBuffer { offset: 1, length: 511 }
    ));

    let result = manager.acquire(0, 511);
    assert!(matches!(
        result.unwrap_err(),
        StoreError::UnalignedBuffer { offset: 0, length: 511 }
    ));
}

#[test]
fn test_offset_not_multiple_of_length() {
    let page = system_page_size() as u64;
    let (_temp, _path, manager) = setup_manager(page);

    let result = manager.acquire(256, 512);
    assert!(matches!(
        result.unwrap_err(),
        StoreError::UnalignedBuffer { offset: 256, length: 512 }
    ));
}

#[test]
fn test_zero_length_rejected() {
    let page = system_page_size() as u64;
    let (_temp, _path, manager) = setup_manager(page);

    let result = manager.acquire(0, 0);
    assert!(matches!(result.unwrap_err(), StoreError::UnalignedBuffer { .. }));
}

#[test]
fn test_section_straddling_pages_is_unaligned() {
    let page = system_page_size() as u64;
    let (_temp, _path, manager) = setup_manager(page * 2);

    // Alignment is checked before page geometry
    let result = manager.acquire(page - 256, 512);
    assert!(matches!(
        result.unwrap_err(),
        StoreError::UnalignedBuffer { length: 512, .. }
    ));

    let result = manager.acquire_shared(0, page as usize * 2);
    assert!(matches!(
        result.unwrap_err(),
        StoreError::UnalignedBuffer { offset: 0, .. }
    ));
}

// =============================================================================
// Bounds Tests
// =============================================================================

#[test]
fn test_section_past_end_of_file() {
    let (_temp, _path, manager) = setup_manager(512);

    let result = manager.acquire(512, 512);
    assert!(matches!(
        result.unwrap_err(),
        StoreError::OutOfBounds { offset: 512, length: 512, file_len: 512 }
    ));
}

#[test]
fn test_empty_file_rejects_every_section() {
    let (_temp, _path, manager) = setup_manager(0);

    assert!(matches!(
        manager.acquire(0, 512).unwrap_err(),
        StoreError::OutOfBounds { .. }
    ));
    assert!(matches!(
        manager.acquire_shared(0, 512).unwrap_err(),
        StoreError::OutOfBounds { .. }
    ));
}

#[test]
fn test_section_visible_after_file_grows() {
    let (_temp, _path, manager) = setup_manager(512);

    assert!(manager.acquire(512, 512).is_err());

    manager.file().set_len(1024).unwrap();

    let buf = manager.acquire(512, 512).unwrap();
    assert!(buf.iter().all(|&b| b == 0));
}
