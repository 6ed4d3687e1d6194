//! The session transfer buffer.
//!
//! FAT-family back-ends want bulk writes aligned to whole sectors, and
//! DMA-capable hosts want the buffer itself on a 32-byte boundary, so
//! the buffer is carved out of a manually aligned allocation instead of
//! a plain `Vec`.

use std::alloc::{alloc_zeroed, dealloc, handle_alloc_error, Layout};
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;

/// A fixed-size byte buffer with a caller-chosen alignment.
pub(crate) struct AlignedBuf {
    ptr: NonNull<u8>,
    layout: Layout,
}

impl AlignedBuf {
    /// Allocates `size` zeroed bytes aligned to `align`.
    ///
    /// # Panics
    ///
    /// Panics when `size` is zero or `align` is not a power of two;
    /// both are build-time constants here.
    pub(crate) fn new(size: usize, align: usize) -> AlignedBuf {
        assert!(size > 0, "transfer buffer cannot be empty");
        let layout = Layout::from_size_align(size, align).expect("invalid transfer buffer layout");
        // SAFETY: layout has non-zero size, checked above.
        let raw = unsafe { alloc_zeroed(layout) };
        let ptr = match NonNull::new(raw) {
            Some(ptr) => ptr,
            None => handle_alloc_error(layout),
        };
        AlignedBuf { ptr, layout }
    }
}

impl Deref for AlignedBuf {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        // SAFETY: the allocation is live and layout.size() bytes long.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.layout.size()) }
    }
}

impl DerefMut for AlignedBuf {
    fn deref_mut(&mut self) -> &mut [u8] {
        // SAFETY: exclusive access through &mut self.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.layout.size()) }
    }
}

impl Drop for AlignedBuf {
    fn drop(&mut self) {
        // SAFETY: allocated with this exact layout in new().
        unsafe { dealloc(self.ptr.as_ptr(), self.layout) }
    }
}

impl std::fmt::Debug for AlignedBuf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlignedBuf")
            .field("len", &self.layout.size())
            .field("align", &self.layout.align())
            .finish()
    }
}

// SAFETY: the buffer is a plain owned allocation; no shared interior state.
unsafe impl Send for AlignedBuf {}
unsafe impl Sync for AlignedBuf {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::options::{XFER_BUF_ALIGN, XFER_BUF_UNIT};
    use crate::storage::SECTOR_SIZE;

    #[test]
    fn buffer_is_aligned_and_sector_sized() {
        for mult in [1usize, 2, 32] {
            let buf = AlignedBuf::new(XFER_BUF_UNIT * mult, XFER_BUF_ALIGN);
            assert_eq!(buf.len(), XFER_BUF_UNIT * mult);
            assert_eq!(buf.len() % SECTOR_SIZE, 0);
            assert_eq!(buf.as_ptr() as usize % XFER_BUF_ALIGN, 0);
        }
    }

    #[test]
    fn buffer_is_writable_and_zeroed() {
        let mut buf = AlignedBuf::new(1024, 32);
        assert!(buf.iter().all(|&b| b == 0));
        buf[0] = 0xAA;
        buf[1023] = 0x55;
        assert_eq!((buf[0], buf[1023]), (0xAA, 0x55));
    }
}
