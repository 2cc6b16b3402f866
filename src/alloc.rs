//! Storage capability for [`crate::table::Table`] allocations.
//!
//! A `Table` is one large, fixed-size, contiguous block of memory — the
//! point of the whole design is that a table's bulk key/value storage lives
//! somewhere a tracing collector never has to walk. `RawAlloc` is the seam
//! that lets the default build use the ordinary global allocator while an
//! opt-in backend (`mmap-alloc`) hands out genuinely off-heap, anonymously
//! mapped pages instead.

use std::alloc::Layout;
use std::ptr::NonNull;

use crate::error::{MapError, Result};

/// A capability for allocating and freeing zero-initialized, fixed-size
/// regions of memory.
///
/// # Safety
///
/// Implementors must return memory that is valid for reads and writes for
/// `layout.size()` bytes, aligned to `layout.align()`, and zeroed. The
/// pointer passed to `dealloc` must have come from `alloc_zeroed` on the
/// same `RawAlloc` value with an identical `Layout`.
pub unsafe trait RawAlloc {
    /// Allocate a zeroed region described by `layout`.
    ///
    /// # Safety
    /// `layout` must have nonzero size.
    unsafe fn alloc_zeroed(&self, layout: Layout) -> Result<NonNull<u8>>;

    /// Free a region previously returned by `alloc_zeroed` with the same
    /// `layout`.
    ///
    /// # Safety
    /// `ptr` must have been produced by `alloc_zeroed` on `self` with this
    /// exact `layout`, and must not be used again afterward.
    unsafe fn dealloc(&self, ptr: NonNull<u8>, layout: Layout);
}

/// Default [`RawAlloc`]: ordinary heap storage via the global allocator.
#[derive(Debug, Default, Clone, Copy)]
pub struct BoxAlloc;

unsafe impl RawAlloc for BoxAlloc {
    unsafe fn alloc_zeroed(&self, layout: Layout) -> Result<NonNull<u8>> {
        let ptr = std::alloc::alloc_zeroed(layout);
        NonNull::new(ptr).ok_or(MapError::AllocationFailed)
    }

    unsafe fn dealloc(&self, ptr: NonNull<u8>, layout: Layout) {
        std::alloc::dealloc(ptr.as_ptr(), layout);
    }
}

#[cfg(feature = "mmap-alloc")]
mod mmap_alloc {
    use super::*;

    /// Off-heap [`RawAlloc`] backed by anonymous, zero-initialized pages.
    ///
    /// Each region is private to this process and has no file descriptor
    /// or shared-memory name behind it, so a direct `mmap`/`munmap` pair
    /// over `MAP_ANON` is all that's needed.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct MmapAlloc;

    unsafe impl RawAlloc for MmapAlloc {
        unsafe fn alloc_zeroed(&self, layout: Layout) -> Result<NonNull<u8>> {
            let ptr = libc::mmap(
                std::ptr::null_mut(),
                layout.size(),
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_PRIVATE | libc::MAP_ANON,
                -1,
                0,
            );
            if ptr == libc::MAP_FAILED {
                return Err(MapError::AllocationFailed);
            }
            // The kernel hands back zeroed pages for anonymous mappings;
            // no explicit zeroing pass is needed.
            NonNull::new(ptr as *mut u8).ok_or(MapError::AllocationFailed)
        }

        unsafe fn dealloc(&self, ptr: NonNull<u8>, layout: Layout) {
            libc::munmap(ptr.as_ptr() as *mut libc::c_void, layout.size());
        }
    }
}

#[cfg(feature = "mmap-alloc")]
pub use mmap_alloc::MmapAlloc;
