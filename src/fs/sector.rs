//! The on-disk location output of the fs reader: an ordered list of
//! contiguous sector runs.

use alloc::vec::Vec;

use crate::config::SECTOR_SIZE;

/// A contiguous run of sectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectorRun {
    pub lba: u64,
    pub count: u64,
}

impl SectorRun {
    pub fn bytes(&self) -> u64 {
        self.count * SECTOR_SIZE
    }
}

/// Ordered sequence of [`SectorRun`]s, in on-disk byte order of the file
/// they describe.
pub type SectorList = Vec<SectorRun>;

/// Total bytes covered by every run in `list`.
pub fn total_bytes(list: &SectorList) -> u64 {
    list.iter().map(SectorRun::bytes).sum()
}
