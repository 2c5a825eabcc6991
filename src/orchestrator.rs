//! Top-level orchestrator: `(path, dump, dump_len) -> driver -> fs ->
//! writer -> reboot`.
//!
//! This is the only place that sequences the other modules; every
//! individual step already knows how to fail on its own, the
//! orchestrator's job is just to log which stage it's in so a serial
//! observer can tell where a hang happened.

use alloc::vec;
use log::info;

use crate::config::{PATH_BUF_SIZE, STAGING_BUFFER_SIZE};
use crate::driver::virtio::block::VirtioBlock;
use crate::error::{PayloadError, Result};
use crate::fs::Fs;
use crate::memory;
use crate::writer;

/// Run the full crash-dump write pipeline. Returns on success; the
/// caller is expected to trigger the reboot.
pub fn run(path: &[u8], dump: &[u8]) -> Result<()> {
    if path.len() > PATH_BUF_SIZE - 1 {
        return Err(PayloadError::BadFormat("path-too-long"));
    }
    let mut path_buf = [0u8; PATH_BUF_SIZE];
    path_buf[..path.len()].copy_from_slice(path);
    let path_nul = &path_buf[..path.len()];

    info!("orchestrator: init heap");
    memory::init_heap();
    memory::pages::init();

    info!("orchestrator: init disk");
    let mut disk = VirtioBlock::new()?;

    info!("orchestrator: init fs");
    let fs = Fs::open(&mut disk)?;

    info!("orchestrator: locate file");
    let mut staging = vec![0u8; STAGING_BUFFER_SIZE];
    let (_copied, sector_list) = fs.read_file(&mut disk, path_nul, &mut staging)?;

    info!("orchestrator: write dump ({} bytes, {} extents)", dump.len(), sector_list.len());
    writer::write_to_sector_list(&mut disk, &sector_list, dump)?;

    info!("orchestrator: done");
    Ok(())
}
