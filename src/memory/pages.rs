//! Physical page bump allocator.
//!
//! The virtqueue's descriptor/avail/used region must live at a stable,
//! page-aligned physical address for the lifetime of the payload. This
//! allocator hands out pages from a linker-provided free region and,
//! like the heap, never frees.

use spin::Mutex;

use crate::config::PAGE_SIZE;
use crate::error::{PayloadError, Result};
use crate::memory::phys_to_virt;

extern "C" {
    /// First free physical page, provided by the linker script.
    static __free_pages_start: u8;
    /// One past the last free physical page, provided by the linker script.
    static __free_pages_end: u8;
}

struct PageBump {
    next: u64,
    end: u64,
}

static PAGES: Mutex<Option<PageBump>> = Mutex::new(None);

/// Initialize the page allocator from the linker-provided free region.
pub fn init() {
    let start = unsafe { core::ptr::addr_of!(__free_pages_start) as u64 };
    let end = unsafe { core::ptr::addr_of!(__free_pages_end) as u64 };
    let aligned_start = (start + PAGE_SIZE as u64 - 1) & !(PAGE_SIZE as u64 - 1);
    *PAGES.lock() = Some(PageBump { next: aligned_start, end });
}

/// Allocate `count` contiguous, page-aligned, zeroed physical pages.
/// Returns the straight-mapped virtual pointer to the first byte.
pub fn alloc_pages(count: usize) -> Result<*mut u8> {
    let size = count
        .checked_mul(PAGE_SIZE)
        .ok_or(PayloadError::Exhaustion("page-count-overflow"))? as u64;
    let mut guard = PAGES.lock();
    let state = guard.as_mut().ok_or(PayloadError::Exhaustion("pages-uninit"))?;
    if state.next.saturating_add(size) > state.end {
        return Err(PayloadError::Exhaustion("pages"));
    }
    let paddr = state.next;
    state.next += size;
    let vaddr = phys_to_virt(paddr) as *mut u8;
    unsafe {
        core::ptr::write_bytes(vaddr, 0, size as usize);
    }
    Ok(vaddr)
}
