//! Binary entry point.
//!
//! Everything testable lives in the library crate; this file is only the
//! raw `extern "C"` function a host kernel jumps into mid-crash, plus the
//! boot glue needed to get from "just jumped here" to "call into the
//! orchestrator".

#![no_std]
#![no_main]

use kpio_crashwriter::{arch, console, error::Result, fatal, orchestrator};

/// Entry point. `path` is non-NUL-terminated ASCII of length `path_len`
/// (`<= 255`); `dump` is readable for `dump_len` bytes. Both pointers are
/// kernel-virtual addresses in the straight-mapped region.
#[no_mangle]
pub extern "C" fn payload_entry(
    path_ptr: *const u8,
    path_len: usize,
    dump_ptr: *const u8,
    dump_len: usize,
) -> ! {
    console::init();
    console::init_logging();

    let path = unsafe { core::slice::from_raw_parts(path_ptr, path_len) };
    let dump = unsafe { core::slice::from_raw_parts(dump_ptr, dump_len) };

    match run(path, dump) {
        Ok(()) => arch::triple_fault_reboot(),
        Err(err) => fatal::fatal(err),
    }
}

fn run(path: &[u8], dump: &[u8]) -> Result<()> {
    orchestrator::run(path, dump)
}
