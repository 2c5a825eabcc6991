//! 16550 UART console backend.
//!
//! COM1 only — this payload never expects a second serial port to exist,
//! unlike a full kernel console driver.

use core::fmt;
use core::fmt::Write;
use spin::Mutex;
use uart_16550::SerialPort;

use crate::config::COM1_BASE;

static SERIAL1: Mutex<Option<SerialPort>> = Mutex::new(None);

/// Bring up COM1 at 9600-8N1 (the `SerialPort` crate's reset sequence
/// already programs 8N1; we only need to point it at the right port).
pub fn init() {
    let mut port = unsafe { SerialPort::new(COM1_BASE) };
    port.init();
    *SERIAL1.lock() = Some(port);
}

/// Write a string to COM1, inserting a CR before every LF.
pub fn write_str(s: &str) {
    if let Some(ref mut serial) = *SERIAL1.lock() {
        for byte in s.bytes() {
            if byte == b'\n' {
                serial.send(b'\r');
            }
            serial.send(byte);
        }
    }
}

struct SerialWriter;

impl fmt::Write for SerialWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        write_str(s);
        Ok(())
    }
}

#[doc(hidden)]
pub fn _print(args: fmt::Arguments) {
    let _ = SerialWriter.write_fmt(args);
}

/// Print to the serial console, bypassing the `log` facade. Reserved for
/// the panic and fatal-trap handlers, which must work even if the logger
/// has not been initialized yet.
#[macro_export]
macro_rules! serial_print {
    ($($arg:tt)*) => {
        $crate::console::serial::_print(format_args!($($arg)*))
    };
}

/// Like [`serial_print!`] but appends a newline.
#[macro_export]
macro_rules! serial_println {
    () => { $crate::serial_print!("\n") };
    ($fmt:expr) => { $crate::serial_print!(concat!($fmt, "\n")) };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::serial_print!(concat!($fmt, "\n"), $($arg)*)
    };
}
