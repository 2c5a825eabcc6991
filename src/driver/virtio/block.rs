//! virtio-blk legacy driver: discovery, one-time init, and synchronous
//! single-request `read_sectors`/`write_sectors`.
//!
//! There is no concurrency and no IRQ handling — a request is built on
//! the caller's stack, submitted, and the status byte is spun on until
//! it moves away from its pre-written `0xFF` sentinel. This collapses
//! virtio's general model to the minimum needed at crash time.

use log::debug;

use super::queue::{ChainEntry, VirtQueue};
use super::{device_status, legacy_regs};
use crate::arch::{inb, inl, inw, outb, outl, outw};
use crate::config::{SECTOR_SIZE, VIRTIO_BLK_DEVICE_ID, VIRTIO_VENDOR_ID};
use crate::driver::pci::find_device;
use crate::error::{PayloadError, Result};
use crate::memory::virt_to_phys;

const REQUEST_TYPE_IN: u32 = 0;
const REQUEST_TYPE_OUT: u32 = 1;

const STATUS_OK: u8 = 0;
const STATUS_IOERR: u8 = 1;
const STATUS_UNSUPPORTED: u8 = 2;
const STATUS_PENDING: u8 = 0xFF;

#[repr(C)]
struct BlockRequestHeader {
    request_type: u32,
    reserved: u32,
    sector: u64,
}

pub struct VirtioBlock {
    port_base: u16,
    queue: VirtQueue,
}

impl VirtioBlock {
    /// Discover the legacy virtio-blk device over PCI and bring it up to
    /// `DRIVER_OK` with queue 0 initialized, per virtio 1.0 section 3.1.1.
    pub fn new() -> Result<Self> {
        let pci_addr = find_device(VIRTIO_VENDOR_ID, VIRTIO_BLK_DEVICE_ID)
            .ok_or(PayloadError::NotFound("virtio-blk-pci-device"))?;

        let bar0 = pci_addr.bar0();
        if bar0 & 0b1 == 0 {
            return Err(PayloadError::BadFormat("virtio-blk-bar0-not-io"));
        }
        let port_base = (bar0 & !0b11) as u16;
        pci_addr.enable_bus_master();

        Self::write_status(port_base, device_status::RESET);
        Self::write_status(port_base, device_status::ACKNOWLEDGE);
        Self::write_status(
            port_base,
            device_status::ACKNOWLEDGE | device_status::DRIVER,
        );

        let _device_features = unsafe { inl(port_base + legacy_regs::DEVICE_FEATURES) };
        unsafe { outl(port_base + legacy_regs::DRIVER_FEATURES, 0) };

        Self::write_status(
            port_base,
            device_status::ACKNOWLEDGE | device_status::DRIVER | device_status::FEATURES_OK,
        );
        let status = Self::read_status(port_base);
        if status & device_status::FEATURES_OK == 0 {
            return Err(PayloadError::BadFormat("virtio-blk-features-not-ok"));
        }

        unsafe { outw(port_base + legacy_regs::QUEUE_SELECT, 0) };
        let queue_size = unsafe { inw(port_base + legacy_regs::QUEUE_SIZE) };

        let queue = VirtQueue::new(0, queue_size)?;
        unsafe { outl(port_base + legacy_regs::QUEUE_ADDRESS, queue.pfn) };

        Self::write_status(
            port_base,
            device_status::ACKNOWLEDGE
                | device_status::DRIVER
                | device_status::FEATURES_OK
                | device_status::DRIVER_OK,
        );

        debug!("virtio-blk: online at port base {port_base:#x}, queue size {queue_size}");

        Ok(VirtioBlock { port_base, queue })
    }

    fn write_status(port_base: u16, status: u8) {
        unsafe { outb(port_base + legacy_regs::DEVICE_STATUS, status) };
    }

    fn read_status(port_base: u16) -> u8 {
        unsafe { inb(port_base + legacy_regs::DEVICE_STATUS) }
    }

    fn notify(&self) {
        unsafe { outw(self.port_base + legacy_regs::QUEUE_NOTIFY, 0) };
    }

    /// Submit one request of `request_type` covering `n` sectors starting
    /// at `lba`, using `buf` as the data area, and spin until completion.
    fn do_request(
        &mut self,
        request_type: u32,
        lba: u64,
        buf: &mut [u8],
        n: u64,
        data_device_writable: bool,
    ) -> Result<()> {
        let header = BlockRequestHeader {
            request_type,
            reserved: 0,
            sector: lba,
        };
        let mut status_byte: u8 = STATUS_PENDING;

        let header_paddr = virt_to_phys(&header as *const _ as u64);
        let data_paddr = virt_to_phys(buf.as_mut_ptr() as u64);
        let status_paddr = virt_to_phys(&mut status_byte as *mut u8 as u64);

        let entries = [
            ChainEntry {
                paddr: header_paddr,
                len: core::mem::size_of::<BlockRequestHeader>() as u32,
                device_writable: false,
            },
            ChainEntry {
                paddr: data_paddr,
                len: (n * SECTOR_SIZE) as u32,
                device_writable: data_device_writable,
            },
            ChainEntry {
                paddr: status_paddr,
                len: 1,
                device_writable: true,
            },
        ];

        self.queue.submit(&entries)?;
        self.notify();

        loop {
            let current = unsafe { core::ptr::read_volatile(&status_byte as *const u8) };
            if current != STATUS_PENDING {
                return match current {
                    STATUS_OK => Ok(()),
                    STATUS_IOERR => Err(PayloadError::DeviceError(STATUS_IOERR)),
                    STATUS_UNSUPPORTED => Err(PayloadError::DeviceError(STATUS_UNSUPPORTED)),
                    other => Err(PayloadError::DeviceError(other)),
                };
            }
            core::hint::spin_loop();
        }
    }

    /// Read `n` sectors starting at `lba` into `buf`. `buf` must be at
    /// least `n * 512` bytes.
    pub fn read_sectors(&mut self, lba: u64, buf: &mut [u8], n: u64) -> Result<()> {
        self.do_request(REQUEST_TYPE_IN, lba, buf, n, true)
    }

    /// Write `n` sectors starting at `lba` from `buf`. `buf` must be at
    /// least `n * 512` bytes.
    pub fn write_sectors(&mut self, lba: u64, buf: &[u8], n: u64) -> Result<()> {
        // SAFETY: the data descriptor is marked device-readable for writes,
        // so the device never mutates this buffer despite the raw pointer
        // needing `&mut` to share the ChainEntry plumbing with reads.
        let buf_mut = unsafe {
            core::slice::from_raw_parts_mut(buf.as_ptr() as *mut u8, buf.len())
        };
        self.do_request(REQUEST_TYPE_OUT, lba, buf_mut, n, false)
    }
}

impl crate::driver::BlockDevice for VirtioBlock {
    fn read_sectors(&mut self, lba: u64, buf: &mut [u8], n: u64) -> Result<()> {
        VirtioBlock::read_sectors(self, lba, buf, n)
    }

    fn write_sectors(&mut self, lba: u64, buf: &[u8], n: u64) -> Result<()> {
        VirtioBlock::write_sectors(self, lba, buf, n)
    }
}
