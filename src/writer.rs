//! Dump writer: streams a buffer into a [`SectorList`] in order, zero
//! padding the final short sector.
//!
//! Purely a bounded loop — no state machine, no retries. The on-disk
//! file may be larger than the dump; trailing blocks are left untouched.

use crate::config::SECTOR_SIZE;
use crate::driver::BlockDevice;
use crate::error::{PayloadError, Result};
use crate::fs::sector::{self, SectorList};

/// Write `dump` into the sectors described by `sector_list`, in order.
///
/// The pre-allocated file backing `sector_list` is expected to already be
/// large enough to hold `dump` in full; if it isn't, that means the
/// target file and the dump buffer disagree about the dump's size, which
/// is a sanity violation rather than something to silently truncate.
pub fn write_to_sector_list<D: BlockDevice>(
    disk: &mut D,
    sector_list: &SectorList,
    dump: &[u8],
) -> Result<()> {
    if sector::total_bytes(sector_list) < dump.len() as u64 {
        return Err(PayloadError::Exhaustion("sector-list-capacity"));
    }

    let mut remaining = dump;

    for run in sector_list {
        if remaining.is_empty() {
            return Ok(());
        }

        let run_bytes = (run.count * SECTOR_SIZE) as usize;

        if remaining.len() >= run_bytes {
            let (chunk, rest) = remaining.split_at(run_bytes);
            disk.write_sectors(run.lba, chunk, run.count)?;
            remaining = rest;
        } else {
            let full_sectors = remaining.len() as u64 / SECTOR_SIZE;
            let full_bytes = (full_sectors * SECTOR_SIZE) as usize;
            if full_sectors > 0 {
                disk.write_sectors(run.lba, &remaining[..full_bytes], full_sectors)?;
            }

            let tail = &remaining[full_bytes..];
            if !tail.is_empty() {
                let mut scratch = [0u8; SECTOR_SIZE as usize];
                scratch[..tail.len()].copy_from_slice(tail);
                disk.write_sectors(run.lba + full_sectors, &scratch, 1)?;
            }
            return Ok(());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::sector::SectorRun;
    use alloc::vec;
    use alloc::vec::Vec;

    /// An in-memory disk: sector `lba` lives at `bytes[lba*512..]`. Large
    /// enough to hold any test scenario's addressable sectors.
    struct MockDisk {
        bytes: Vec<u8>,
    }

    impl MockDisk {
        fn new(sectors: u64) -> Self {
            MockDisk { bytes: vec![0u8; (sectors * SECTOR_SIZE) as usize] }
        }

        fn filled(sectors: u64, byte: u8) -> Self {
            MockDisk { bytes: vec![byte; (sectors * SECTOR_SIZE) as usize] }
        }
    }

    impl BlockDevice for MockDisk {
        fn read_sectors(&mut self, lba: u64, buf: &mut [u8], n: u64) -> Result<()> {
            let start = (lba * SECTOR_SIZE) as usize;
            let len = (n * SECTOR_SIZE) as usize;
            buf[..len].copy_from_slice(&self.bytes[start..start + len]);
            Ok(())
        }

        fn write_sectors(&mut self, lba: u64, buf: &[u8], n: u64) -> Result<()> {
            let start = (lba * SECTOR_SIZE) as usize;
            let len = (n * SECTOR_SIZE) as usize;
            self.bytes[start..start + len].copy_from_slice(&buf[..len]);
            Ok(())
        }
    }

    #[test]
    fn happy_path_single_extent_full_write() {
        let mut disk = MockDisk::new(4096);
        let sector_list: SectorList = vec![SectorRun { lba: 2848, count: 64 }];
        let dump = vec![0xAAu8; 64 * 512];

        write_to_sector_list(&mut disk, &sector_list, &dump).unwrap();

        let start = 2848 * 512;
        assert_eq!(&disk.bytes[start..start + dump.len()], dump.as_slice());
    }

    #[test]
    fn short_write_pads_final_sector_with_zeros() {
        let mut disk = MockDisk::filled(4096, 0x55);
        let sector_list: SectorList = vec![SectorRun { lba: 2848, count: 64 }];
        let dump = vec![0xAAu8; 30_000];

        write_to_sector_list(&mut disk, &sector_list, &dump).unwrap();

        let full_run_bytes = 58 * 512;
        let start = 2848 * 512;
        assert_eq!(&disk.bytes[start..start + full_run_bytes], &dump[..full_run_bytes]);

        let pad_sector_start = (2848 + 58) * 512;
        let remainder = &dump[full_run_bytes..];
        assert_eq!(remainder.len(), 304);
        assert_eq!(&disk.bytes[pad_sector_start..pad_sector_start + 304], remainder);
        assert_eq!(&disk.bytes[pad_sector_start + 304..pad_sector_start + 512], &[0u8; 208]);

        // Nothing past the written sector was touched.
        assert_eq!(disk.bytes[pad_sector_start + 512], 0x55);
    }

    #[test]
    fn multi_extent_writes_each_run_in_order() {
        let mut disk = MockDisk::new(8192);
        let sector_list: SectorList =
            vec![SectorRun { lba: 2848, count: 32 }, SectorRun { lba: 3648, count: 32 }];
        let dump = vec![0xAAu8; 32 * 1024];

        write_to_sector_list(&mut disk, &sector_list, &dump).unwrap();

        let first_start = 2848 * 512;
        let second_start = 3648 * 512;
        assert_eq!(&disk.bytes[first_start..first_start + 16 * 1024], &dump[..16 * 1024]);
        assert_eq!(&disk.bytes[second_start..second_start + 16 * 1024], &dump[16 * 1024..]);
    }

    #[test]
    fn oversize_file_small_dump_writes_once_and_stops() {
        let mut disk = MockDisk::filled(8192, 0x11);
        let sector_list: SectorList = vec![SectorRun { lba: 2848, count: 128 }];
        let dump = vec![0xAAu8; 4 * 1024];

        write_to_sector_list(&mut disk, &sector_list, &dump).unwrap();

        let start = 2848 * 512;
        assert_eq!(&disk.bytes[start..start + dump.len()], dump.as_slice());
        // Untouched trailing blocks of the (larger) pre-allocated file remain.
        assert_eq!(disk.bytes[start + dump.len()], 0x11);
    }

    #[test]
    fn short_write_spanning_several_full_sectors_plus_tail() {
        let mut disk = MockDisk::filled(8192, 0x22);
        let sector_list: SectorList = vec![SectorRun { lba: 2848, count: 128 }];
        let dump = vec![0xAAu8; 8 * 512 + 200];

        write_to_sector_list(&mut disk, &sector_list, &dump).unwrap();

        let start = 2848 * 512;
        assert_eq!(&disk.bytes[start..start + 8 * 512], &dump[..8 * 512]);

        let pad_sector_start = (2848 + 8) * 512;
        let tail = &dump[8 * 512..];
        assert_eq!(&disk.bytes[pad_sector_start..pad_sector_start + 200], tail);
        assert_eq!(&disk.bytes[pad_sector_start + 200..pad_sector_start + 512], &[0u8; 312]);
        assert_eq!(disk.bytes[pad_sector_start + 512], 0x22);
    }

    #[test]
    fn dump_larger_than_sector_list_capacity_is_rejected() {
        let mut disk = MockDisk::new(4096);
        let sector_list: SectorList = vec![SectorRun { lba: 2848, count: 4 }];
        let dump = vec![0xAAu8; 4 * 512 + 1];

        let err = write_to_sector_list(&mut disk, &sector_list, &dump).unwrap_err();
        assert!(matches!(err, PayloadError::Exhaustion(_)));
        // Nothing was written before the capacity check rejected the call.
        assert!(disk.bytes.iter().all(|&b| b == 0));
    }

    #[test]
    fn empty_dump_writes_nothing() {
        let mut disk = MockDisk::filled(4096, 0x77);
        let sector_list: SectorList = vec![SectorRun { lba: 2848, count: 64 }];

        write_to_sector_list(&mut disk, &sector_list, &[]).unwrap();

        assert!(disk.bytes.iter().all(|&b| b == 0x77));
    }
}
