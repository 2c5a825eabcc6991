//! Console backends (UART + VGA) and the `log` facade wiring on top of them.

pub mod serial;
pub mod vga;

use core::fmt::Write;
use log::{LevelFilter, Log, Metadata, Record};
use spin::Once;

/// Bring up both console backends. Must run before anything logs.
pub fn init() {
    serial::init();
    vga::init();
}

struct DualLogger;

impl Log for DualLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        let mut line: heapless_line::Line = heapless_line::Line::new();
        let _ = write!(line, "[{} {}] {}", record.level(), record.target(), record.args());
        let _ = writeln!(line);
        serial::write_str(line.as_str());
        vga::write_str(line.as_str());
    }

    fn flush(&self) {}
}

static LOGGER: DualLogger = DualLogger;
static LOGGER_INIT: Once = Once::new();

/// Install the `log` facade logger. Idempotent.
pub fn init_logging() {
    LOGGER_INIT.call_once(|| {
        log::set_logger(&LOGGER)
            .map(|()| log::set_max_level(LevelFilter::Trace))
            .ok();
    });
}

/// A fixed-capacity `core::fmt::Write` sink, since this crate has no heap
/// allocation available this early and log lines are always short.
mod heapless_line {
    use core::fmt;

    const CAPACITY: usize = 256;

    pub struct Line {
        buf: [u8; CAPACITY],
        len: usize,
    }

    impl Line {
        pub const fn new() -> Self {
            Line { buf: [0; CAPACITY], len: 0 }
        }

        pub fn as_str(&self) -> &str {
            core::str::from_utf8(&self.buf[..self.len]).unwrap_or("")
        }
    }

    impl fmt::Write for Line {
        fn write_str(&mut self, s: &str) -> fmt::Result {
            let bytes = s.as_bytes();
            let remaining = CAPACITY - self.len;
            let n = bytes.len().min(remaining);
            self.buf[self.len..self.len + n].copy_from_slice(&bytes[..n]);
            self.len += n;
            Ok(())
        }
    }
}

/// Print a red-tagged one-line diagnostic to both backends. Used only by
/// the fatal handler; does not go through the `log` facade so it works
/// even if logging was never initialized.
pub fn fatal_line(args: core::fmt::Arguments) {
    let mut line: heapless_line::Line = heapless_line::Line::new();
    let _ = write!(line, "\x1b[31m{args}\x1b[0m\n");
    serial::write_str(line.as_str());
    vga::write_str_attr(line.as_str(), crate::config::VGA_ATTR_FATAL);
}
