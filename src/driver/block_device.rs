//! The seam between the fs/writer logic and the concrete virtio-blk
//! driver. Mirrors the shape of the teacher's own `Filesystem` trait:
//! the core algorithms are generic over this trait so they can be
//! exercised on the host against an in-memory mock, while the real
//! binary only ever instantiates them with [`VirtioBlock`].

use crate::error::Result;

pub trait BlockDevice {
    /// Read `n` sectors starting at `lba` into `buf` (`buf.len() >= n*512`).
    fn read_sectors(&mut self, lba: u64, buf: &mut [u8], n: u64) -> Result<()>;

    /// Write `n` sectors starting at `lba` from `buf` (`buf.len() >= n*512`).
    fn write_sectors(&mut self, lba: u64, buf: &[u8], n: u64) -> Result<()>;
}
