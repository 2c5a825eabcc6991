//! Read-only filesystem access: GPT partition location plus an
//! extent-only ext4 reader.

pub mod ext4;
pub mod gpt;
pub mod sector;

use crate::driver::BlockDevice;
use crate::error::Result;
use sector::SectorList;

/// A located, superblock-parsed ext4 filesystem, ready for file lookups.
pub struct Fs {
    part_lba: u64,
    superblock: ext4::Superblock,
}

impl Fs {
    /// Locate the Linux partition via GPT and parse its ext4 superblock.
    pub fn open<D: BlockDevice>(disk: &mut D) -> Result<Self> {
        let mut scratch = [0u8; 512];
        let part_lba = gpt::locate_linux_partition(disk, &mut scratch)?;
        let superblock = ext4::read_superblock(disk, part_lba)?;
        Ok(Fs { part_lba, superblock })
    }

    /// Locate `filename` in the root directory and read as much of its
    /// data as fits in `out`, returning the bytes copied and the
    /// [`SectorList`] describing the file's on-disk extents.
    pub fn read_file<D: BlockDevice>(
        &self,
        disk: &mut D,
        filename: &[u8],
        out: &mut [u8],
    ) -> Result<(usize, SectorList)> {
        ext4::read_file(disk, &self.superblock, self.part_lba, filename, out)
    }
}
