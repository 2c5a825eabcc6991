//! GPT partition table: just enough to find the Linux filesystem
//! partition's starting LBA.
//!
//! Fields are parsed field-by-field from the raw sector bytes rather
//! than cast through a packed struct, so endianness is explicit at every
//! read instead of riding on the host being little-endian by accident.

use crate::config::{GPT_ENTRY_SIZE, GPT_PARTITION_ENTRIES_PER_SECTOR_SCAN, LINUX_FILESYSTEM_GUID};
use crate::driver::BlockDevice;
use crate::error::{PayloadError, Result};

const GPT_SIGNATURE: &[u8; 8] = b"EFI PART";
const GPT_HEADER_LBA: u64 = 1;

struct GptHeader {
    partition_entry_lba: u64,
}

impl GptHeader {
    fn from_bytes(buf: &[u8]) -> Result<Self> {
        if &buf[0..8] != GPT_SIGNATURE {
            return Err(PayloadError::BadFormat("gpt-signature"));
        }
        let partition_entry_lba = u64::from_le_bytes(buf[72..80].try_into().unwrap());
        Ok(GptHeader { partition_entry_lba })
    }
}

fn entry_type_guid_matches(entry: &[u8], guid: &[u8; 16]) -> bool {
    &entry[0..16] == guid
}

fn entry_first_lba(entry: &[u8]) -> u64 {
    u64::from_le_bytes(entry[32..40].try_into().unwrap())
}

/// Locate the Linux filesystem partition and return its starting LBA.
///
/// Reads LBA 1 (the primary GPT header) into `buf`, then reuses the same
/// buffer to read the partition-entry array — only the first sector of
/// it, so only the first four 128-byte entries are examined.
pub fn locate_linux_partition<D: BlockDevice>(disk: &mut D, buf: &mut [u8; 512]) -> Result<u64> {
    disk.read_sectors(GPT_HEADER_LBA, buf, 1)?;
    let header = GptHeader::from_bytes(buf)?;

    disk.read_sectors(header.partition_entry_lba, buf, 1)?;
    for i in 0..GPT_PARTITION_ENTRIES_PER_SECTOR_SCAN {
        let offset = i * GPT_ENTRY_SIZE;
        let entry = &buf[offset..offset + GPT_ENTRY_SIZE];
        if entry_type_guid_matches(entry, &LINUX_FILESYSTEM_GUID) {
            return Ok(entry_first_lba(entry));
        }
    }
    Err(PayloadError::NotFound("gpt-linux-partition"))
}
