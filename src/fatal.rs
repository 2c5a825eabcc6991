//! The single fatal-error handler every `PayloadError` converges on.
//!
//! Prints a red-tagged one-line diagnostic to both console backends and
//! halts. No unwinding, no recovery, no retries — the machine's state is
//! assumed corrupt by the time we are running at all.

use crate::console;
use crate::error::PayloadError;

/// Report `err` and halt forever. Never returns.
pub fn fatal(err: PayloadError) -> ! {
    console::fatal_line(format_args!("FATAL: {err}"));
    crate::arch::hlt_loop()
}
