//! Panic handler for the freestanding payload.
//!
//! Stands in for the out-of-scope UBSan trap contract: any Rust-level
//! panic (index out of bounds, debug-mode overflow, ...) is treated as
//! the `SanityTrap` branch of the error taxonomy and halts the machine.

use crate::serial_println;
use core::panic::PanicInfo;

#[cfg(not(test))]
#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    serial_println!();
    serial_println!("========================================");
    serial_println!("PAYLOAD PANIC");
    serial_println!("========================================");

    if let Some(location) = info.location() {
        serial_println!("Location: {}:{}:{}", location.file(), location.line(), location.column());
    }

    serial_println!("Message: {}", info.message());
    serial_println!("System halted.");

    crate::arch::hlt_loop()
}

#[cfg(test)]
#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    crate::test::test_panic_handler(info)
}
