//! 80x25 VGA text-mode console backend.
//!
//! The framebuffer lives at a fixed physical address inside the
//! straight-mapped window, so we never need to map anything: read the
//! pointer straight out of `paddr | STRAIGHT_MAP_BASE`.

use spin::Mutex;

use crate::config::{STRAIGHT_MAP_BASE, VGA_ATTR, VGA_BUFFER, VGA_COLS, VGA_ROWS};

struct VgaState {
    col: usize,
    row: usize,
}

static STATE: Mutex<VgaState> = Mutex::new(VgaState { col: 0, row: 0 });

fn buffer() -> *mut u16 {
    (VGA_BUFFER | STRAIGHT_MAP_BASE) as *mut u16
}

fn cell(row: usize, col: usize, byte: u8, attr: u8) {
    let offset = row * VGA_COLS + col;
    unsafe {
        core::ptr::write_volatile(buffer().add(offset), (attr as u16) << 8 | byte as u16);
    }
}

fn scroll_if_needed(state: &mut VgaState) {
    if state.row < VGA_ROWS {
        return;
    }
    unsafe {
        let buf = buffer();
        for row in 1..VGA_ROWS {
            for col in 0..VGA_COLS {
                let src = core::ptr::read_volatile(buf.add(row * VGA_COLS + col));
                core::ptr::write_volatile(buf.add((row - 1) * VGA_COLS + col), src);
            }
        }
        for col in 0..VGA_COLS {
            core::ptr::write_volatile(
                buf.add((VGA_ROWS - 1) * VGA_COLS + col),
                (VGA_ATTR as u16) << 8,
            );
        }
    }
    state.row = VGA_ROWS - 1;
}

/// Clear the framebuffer and reset the cursor.
pub fn init() {
    let mut state = STATE.lock();
    for row in 0..VGA_ROWS {
        for col in 0..VGA_COLS {
            cell(row, col, b' ', VGA_ATTR);
        }
    }
    state.row = 0;
    state.col = 0;
}

/// Write a string to the VGA grid with a given attribute byte, stripping
/// ANSI SGR escape sequences (`ESC '[' ... 'm'`) first.
pub fn write_str_attr(s: &str, attr: u8) {
    let mut state = STATE.lock();
    let mut chars = s.bytes().peekable();
    while let Some(b) = chars.next() {
        if b == 0x1b {
            if chars.peek() == Some(&b'[') {
                chars.next();
                while let Some(&next) = chars.peek() {
                    chars.next();
                    if next == b'm' {
                        break;
                    }
                }
            }
            continue;
        }
        if b == b'\n' {
            state.row += 1;
            state.col = 0;
            scroll_if_needed(&mut state);
            continue;
        }
        cell(state.row, state.col, b, attr);
        state.col += 1;
        if state.col >= VGA_COLS {
            state.col = 0;
            state.row += 1;
            scroll_if_needed(&mut state);
        }
    }
}

/// Write a string to the VGA grid with the default attribute.
pub fn write_str(s: &str) {
    write_str_attr(s, VGA_ATTR);
}
