// SPDX-License-Identifier: MIT
//
// ANSI escape sequence generation.
//
// Pure formatting, no terminal state. Every parameterized sequence comes
// in three shapes so callers pick their own ownership model:
//
//   write_*       streams into any `impl Write` (a `FrameBuffer`, a Vec,
//                 stdout). No allocation.
//   fg_rgb, ...   returns an owned `String`. The safe default.
//   SequenceBuffer::fg_rgb, ...
//                 formats into a fixed scratch buffer and lends out a
//                 `&str` that lives until the next call.
//
// Callers with literal arguments can skip all three and use the macros
// at the bottom of this file (`fg_rgb!`, `cursor_goto!`, ...), which
// expand to `&'static str` at compile time.
//
// Coordinates here are 1-based and passed through verbatim: the caller
// speaks the terminal's own numbering.

use std::fmt;
use std::io::{self, Write};

// ─── Fixed Sequences ─────────────────────────────────────────────────────────

/// Clear the entire screen (ED 2).
pub const CLEAR_SCREEN: &str = "\x1b[2J";

/// Reset all SGR attributes to terminal defaults (SGR 0).
pub const RESET_FORMATTING: &str = "\x1b[0m";

/// Show the cursor (DECTCEM set).
pub const SHOW_CURSOR: &str = "\x1b[?25h";

/// Hide the cursor (DECTCEM reset).
pub const HIDE_CURSOR: &str = "\x1b[?25l";

/// Move the cursor to the top-left cell. Prefixed to every flushed frame.
pub const CURSOR_HOME: &str = "\x1b[H";

/// SGR selector for a true-color foreground.
const FG_SELECTOR: u8 = 38;

/// SGR selector for a true-color background.
const BG_SELECTOR: u8 = 48;

// ─── Direction ───────────────────────────────────────────────────────────────

/// Direction for a relative cursor movement (CUU / CUD / CUF / CUB).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Right,
    Left,
}

impl Direction {
    /// The CSI final byte that selects this direction.
    #[inline]
    #[must_use]
    pub const fn final_byte(self) -> u8 {
        match self {
            Self::Up => b'A',
            Self::Down => b'B',
            Self::Right => b'C',
            Self::Left => b'D',
        }
    }

    /// Inverse of [`final_byte`](Self::final_byte).
    #[must_use]
    pub const fn from_final_byte(byte: u8) -> Option<Self> {
        match byte {
            b'A' => Some(Self::Up),
            b'B' => Some(Self::Down),
            b'C' => Some(Self::Right),
            b'D' => Some(Self::Left),
            _ => None,
        }
    }
}

// ─── Streaming Writers ───────────────────────────────────────────────────────

/// Write a 24-bit foreground color: `ESC[38;2;r;g;bm`.
#[inline]
pub fn write_fg_rgb(w: &mut impl Write, r: u8, g: u8, b: u8) -> io::Result<()> {
    write_rgb(w, FG_SELECTOR, r, g, b)
}

/// Write a 24-bit background color: `ESC[48;2;r;g;bm`.
#[inline]
pub fn write_bg_rgb(w: &mut impl Write, r: u8, g: u8, b: u8) -> io::Result<()> {
    write_rgb(w, BG_SELECTOR, r, g, b)
}

fn write_rgb(w: &mut impl Write, selector: u8, r: u8, g: u8, b: u8) -> io::Result<()> {
    write!(w, "\x1b[{selector};2;{r};{g};{b}m")
}

/// Move the cursor to column `x`, row `y` (CUP). Both are 1-based.
#[inline]
pub fn write_cursor_goto(w: &mut impl Write, x: usize, y: usize) -> io::Result<()> {
    write!(w, "\x1b[{y};{x}H")
}

/// Move the cursor `amount` cells in `direction`.
#[inline]
pub fn write_cursor_move(w: &mut impl Write, direction: Direction, amount: usize) -> io::Result<()> {
    write!(w, "\x1b[{amount}{}", char::from(direction.final_byte()))
}

// ─── Owned Formatting ────────────────────────────────────────────────────────
//
// `fmt::Write` into a `String` cannot fail, so these return plain values.

#[must_use]
pub fn fg_rgb(r: u8, g: u8, b: u8) -> String {
    format!("\x1b[{FG_SELECTOR};2;{r};{g};{b}m")
}

#[must_use]
pub fn bg_rgb(r: u8, g: u8, b: u8) -> String {
    format!("\x1b[{BG_SELECTOR};2;{r};{g};{b}m")
}

/// Cursor to 1-based column `x`, row `y`.
#[must_use]
pub fn cursor_goto(x: usize, y: usize) -> String {
    format!("\x1b[{y};{x}H")
}

#[must_use]
pub fn cursor_move(direction: Direction, amount: usize) -> String {
    format!("\x1b[{amount}{}", char::from(direction.final_byte()))
}

#[inline]
#[must_use]
pub fn cursor_up(amount: usize) -> String {
    cursor_move(Direction::Up, amount)
}

#[inline]
#[must_use]
pub fn cursor_down(amount: usize) -> String {
    cursor_move(Direction::Down, amount)
}

#[inline]
#[must_use]
pub fn cursor_right(amount: usize) -> String {
    cursor_move(Direction::Right, amount)
}

#[inline]
#[must_use]
pub fn cursor_left(amount: usize) -> String {
    cursor_move(Direction::Left, amount)
}

// ─── SequenceBuffer ──────────────────────────────────────────────────────────

/// Decimal digits in `usize::MAX`.
const USIZE_DIGITS: usize = usize::MAX.ilog10() as usize + 1;

/// Longest sequence we ever format: two `usize` values plus the fixed
/// characters of the longest template and a trailing NUL slot.
pub const SEQUENCE_CAPACITY: usize = 2 * USIZE_DIGITS + 21;

/// Fixed-size scratch buffer for formatting one sequence at a time.
///
/// Each method overwrites the previous contents and lends out a `&str`
/// tied to `&mut self`, so at most one formatted sequence is alive at a
/// time. Holding two results at once is a usage error, and the borrow
/// checker rejects it:
///
/// ```compile_fail
/// use ck_term::ansi::SequenceBuffer;
///
/// let mut seq = SequenceBuffer::new();
/// let red = seq.fg_rgb(255, 0, 0);
/// let blue = seq.bg_rgb(0, 0, 255);
/// println!("{red}{blue}");
/// ```
///
/// Copy the result out (`to_owned()`) or consume it before formatting
/// the next one:
///
/// ```
/// use ck_term::ansi::SequenceBuffer;
///
/// let mut seq = SequenceBuffer::new();
/// let mut out = String::new();
/// out.push_str(seq.fg_rgb(255, 0, 0));
/// out.push_str(seq.cursor_goto(1, 1));
/// assert_eq!(out, "\x1b[38;2;255;0;0m\x1b[1;1H");
/// ```
pub struct SequenceBuffer {
    buf: [u8; SEQUENCE_CAPACITY],
    len: usize,
}

impl SequenceBuffer {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buf: [0; SEQUENCE_CAPACITY],
            len: 0,
        }
    }

    pub fn fg_rgb(&mut self, r: u8, g: u8, b: u8) -> &str {
        self.format(format_args!("\x1b[{FG_SELECTOR};2;{r};{g};{b}m"))
    }

    pub fn bg_rgb(&mut self, r: u8, g: u8, b: u8) -> &str {
        self.format(format_args!("\x1b[{BG_SELECTOR};2;{r};{g};{b}m"))
    }

    pub fn cursor_goto(&mut self, x: usize, y: usize) -> &str {
        self.format(format_args!("\x1b[{y};{x}H"))
    }

    pub fn cursor_move(&mut self, direction: Direction, amount: usize) -> &str {
        let fin = char::from(direction.final_byte());
        self.format(format_args!("\x1b[{amount}{fin}"))
    }

    /// The most recently formatted sequence (empty before the first call).
    #[must_use]
    pub fn as_str(&self) -> &str {
        // Only ASCII is ever written.
        std::str::from_utf8(&self.buf[..self.len]).unwrap_or_default()
    }

    fn format(&mut self, args: fmt::Arguments<'_>) -> &str {
        let mut cursor = io::Cursor::new(&mut self.buf[..]);
        // Every template fits SEQUENCE_CAPACITY by construction; a failed
        // write would leave a truncated prefix, so fall back to empty.
        self.len = match cursor.write_fmt(args) {
            Ok(()) => usize::try_from(cursor.position()).unwrap_or(0),
            Err(_) => 0,
        };
        self.as_str()
    }
}

impl Default for SequenceBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SequenceBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequenceBuffer")
            .field("current", &self.as_str())
            .finish()
    }
}

// ─── Literal Macros ──────────────────────────────────────────────────────────
//
// Literal arguments only: `stringify!` pastes the token as written, so
// `fg_rgb!(255, 0, 128)` expands to the same bytes `fg_rgb(255, 0, 128)`
// produces at run time.

/// Foreground true-color sequence from literal channels.
#[macro_export]
macro_rules! fg_rgb {
    ($r:literal, $g:literal, $b:literal) => {
        concat!("\x1b[38;2;", stringify!($r), ";", stringify!($g), ";", stringify!($b), "m")
    };
}

/// Background true-color sequence from literal channels.
#[macro_export]
macro_rules! bg_rgb {
    ($r:literal, $g:literal, $b:literal) => {
        concat!("\x1b[48;2;", stringify!($r), ";", stringify!($g), ";", stringify!($b), "m")
    };
}

/// Cursor to literal 1-based column `x`, row `y`.
#[macro_export]
macro_rules! cursor_goto {
    ($x:literal, $y:literal) => {
        concat!("\x1b[", stringify!($y), ";", stringify!($x), "H")
    };
}

#[macro_export]
macro_rules! cursor_up {
    ($n:literal) => {
        concat!("\x1b[", stringify!($n), "A")
    };
}

#[macro_export]
macro_rules! cursor_down {
    ($n:literal) => {
        concat!("\x1b[", stringify!($n), "B")
    };
}

#[macro_export]
macro_rules! cursor_right {
    ($n:literal) => {
        concat!("\x1b[", stringify!($n), "C")
    };
}

#[macro_export]
macro_rules! cursor_left {
    ($n:literal) => {
        concat!("\x1b[", stringify!($n), "D")
    };
}

// ─── Tests ───────────────────────────────────────────────────────────────────
