//! The virtio legacy split virtqueue: descriptor table, avail ring, used
//! ring, and the intrusive free list threaded through `desc.next`.
//!
//! The free list is not a side `Vec<u16>` — the same `next` field that
//! chains a descriptor into an in-flight request chain doubles as the
//! free-list link while the descriptor is idle. This is the tagged-union
//! framing: same storage, different meaning depending on whether the
//! descriptor is currently on the free list or live in a chain.

use crate::arch::memory_fence;
use crate::config::PAGE_SIZE;
use crate::error::{PayloadError, Result};
use crate::memory::{pages, virt_to_phys};

pub const VIRTQ_DESC_F_NEXT: u16 = 1;
pub const VIRTQ_DESC_F_WRITE: u16 = 2;

/// Upper bound on queue size this driver is willing to manage. virtio-blk
/// legacy devices commonly report 128 or 256; a device reporting more
/// than this is treated as `Exhaustion` during init rather than handled
/// with a dynamically sized allocation.
pub const MAX_QUEUE_SIZE: u16 = 256;

#[repr(C)]
struct VirtqDescRaw {
    addr: u64,
    len: u32,
    flags: u16,
    next: u16,
}

/// A single buffer to be placed in a descriptor chain.
pub struct ChainEntry {
    pub paddr: u64,
    pub len: u32,
    pub device_writable: bool,
}

/// The legacy split virtqueue for a single queue index.
pub struct VirtQueue {
    size: u16,
    desc_base: *mut u8,
    avail_base: *mut u8,
    used_base: *mut u8,
    free_head: u16,
    num_free: u16,
    last_used_index: u16,
    /// Physical frame number, to be written to the device's queue-PFN register.
    pub pfn: u32,
}

unsafe impl Send for VirtQueue {}

impl VirtQueue {
    fn desc_ptr(&self, i: u16) -> *mut VirtqDescRaw {
        unsafe { (self.desc_base as *mut VirtqDescRaw).add(i as usize) }
    }

    fn avail_idx_ptr(&self) -> *mut u16 {
        unsafe { self.avail_base.add(2) as *mut u16 }
    }

    fn avail_ring_ptr(&self, i: u16) -> *mut u16 {
        unsafe { self.avail_base.add(4 + 2 * i as usize) as *mut u16 }
    }

    fn used_idx_ptr(&self) -> *mut u16 {
        unsafe { self.used_base.add(2) as *mut u16 }
    }

    fn used_ring_id_ptr(&self, i: u16) -> *mut u32 {
        unsafe { self.used_base.add(4 + 8 * i as usize) as *mut u32 }
    }

    fn read_desc_next(&self, i: u16) -> u16 {
        unsafe { core::ptr::read_volatile(core::ptr::addr_of!((*self.desc_ptr(i)).next)) }
    }

    fn read_desc_flags(&self, i: u16) -> u16 {
        unsafe { core::ptr::read_volatile(core::ptr::addr_of!((*self.desc_ptr(i)).flags)) }
    }

    /// Allocate the descriptor table + avail ring + used ring as a single
    /// page-aligned region and thread the initial free list through
    /// `next`, per the legacy layout in virtio 1.0 section 2.4.2.
    pub fn new(index: u16, size: u16) -> Result<Self> {
        if size == 0 || size > MAX_QUEUE_SIZE || !size.is_power_of_two() {
            return Err(PayloadError::Exhaustion("virtqueue-size"));
        }
        let desc_table_size = 16 * size as usize;
        let avail_size = 4 + 2 * size as usize;
        let used_offset = align_up(desc_table_size + avail_size, PAGE_SIZE);
        let used_size = 4 + 8 * size as usize;
        let total_size = used_offset + used_size;
        let num_pages = total_size.div_ceil(PAGE_SIZE);

        let base = pages::alloc_pages(num_pages)?;
        let paddr = virt_to_phys(base as u64);
        let pfn = (paddr / PAGE_SIZE as u64) as u32;

        let desc_base = base;
        let avail_base = unsafe { base.add(desc_table_size) };
        let used_base = unsafe { base.add(used_offset) };

        for i in 0..size {
            let next = if i + 1 == size { 0 } else { i + 1 };
            unsafe {
                let d = (desc_base as *mut VirtqDescRaw).add(i as usize);
                core::ptr::write_volatile(core::ptr::addr_of_mut!((*d).next), next);
            }
        }

        let _ = index;
        Ok(VirtQueue {
            size,
            desc_base,
            avail_base,
            used_base,
            free_head: 0,
            num_free: size,
            last_used_index: 0,
            pfn,
        })
    }

    /// Reclaim descriptor chains the device has finished with, returning
    /// each descriptor in the chain to the free list. Advances
    /// `last_used_index` to the device's current `used.index`.
    fn reclaim_completed(&mut self) {
        let used_index = unsafe { core::ptr::read_volatile(self.used_idx_ptr()) };
        while self.last_used_index != used_index {
            let slot = self.last_used_index % self.size;
            let head = unsafe { core::ptr::read_volatile(self.used_ring_id_ptr(slot)) } as u16;
            self.free_chain(head);
            self.last_used_index = self.last_used_index.wrapping_add(1);
        }
    }

    /// Walk a descriptor chain starting at `head` via `next`/`NEXT`, and
    /// prepend every descriptor in it back onto the free list.
    fn free_chain(&mut self, head: u16) {
        let mut idx = head;
        loop {
            let flags = self.read_desc_flags(idx);
            let next = self.read_desc_next(idx);
            self.num_free += 1;
            let last = flags & VIRTQ_DESC_F_NEXT == 0;
            unsafe {
                let d = self.desc_ptr(idx);
                core::ptr::write_volatile(core::ptr::addr_of_mut!((*d).next), self.free_head);
            }
            self.free_head = idx;
            if last {
                return;
            }
            idx = next;
        }
    }

    /// Submit a chain of 2 or 3 buffers (header/data[/status]) to the
    /// device and notify it. Returns nothing — completion is observed by
    /// polling the caller's own status byte, not by this queue.
    pub fn submit(&mut self, entries: &[ChainEntry]) -> Result<()> {
        let needed = entries.len() as u16;
        if self.num_free < needed {
            self.reclaim_completed();
        }
        if self.num_free < needed {
            return Err(PayloadError::Exhaustion("virtqueue-descriptors"));
        }

        let mut indices = [0u16; 3];
        for slot in indices.iter_mut().take(entries.len()) {
            let i = self.free_head;
            self.free_head = self.read_desc_next(i);
            self.num_free -= 1;
            *slot = i;
        }

        for (pos, entry) in entries.iter().enumerate() {
            let i = indices[pos];
            let mut flags = 0u16;
            if entry.device_writable {
                flags |= VIRTQ_DESC_F_WRITE;
            }
            let next = if pos + 1 < entries.len() {
                flags |= VIRTQ_DESC_F_NEXT;
                indices[pos + 1]
            } else {
                0
            };
            unsafe {
                let d = self.desc_ptr(i);
                core::ptr::write_volatile(core::ptr::addr_of_mut!((*d).addr), entry.paddr);
                core::ptr::write_volatile(core::ptr::addr_of_mut!((*d).len), entry.len);
                core::ptr::write_volatile(core::ptr::addr_of_mut!((*d).flags), flags);
                core::ptr::write_volatile(core::ptr::addr_of_mut!((*d).next), next);
            }
        }

        let head = indices[0];
        let avail_index = unsafe { core::ptr::read_volatile(self.avail_idx_ptr()) };
        let slot = avail_index % self.size;
        unsafe {
            core::ptr::write_volatile(self.avail_ring_ptr(slot), head);
        }
        memory_fence();
        unsafe {
            core::ptr::write_volatile(self.avail_idx_ptr(), avail_index.wrapping_add(1));
        }
        memory_fence();
        Ok(())
    }
}

fn align_up(value: usize, align: usize) -> usize {
    (value + align - 1) & !(align - 1)
}
