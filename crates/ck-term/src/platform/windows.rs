// SPDX-License-Identifier: MIT
//
// Windows backend — console modes and input records.
//
// Safety: the Win32 console API is exposed as `unsafe` functions by the
// `windows` crate. Every call below passes handles obtained from
// GetStdHandle and buffers owned by the calling frame.
#![allow(unsafe_code)]
//
// Input mode is the console mode of the stdin handle: raw mode clears
// ENABLE_ECHO_INPUT and ENABLE_LINE_INPUT. Output needs an explicit
// opt-in before escape sequences are interpreted instead of printed
// (ENABLE_VIRTUAL_TERMINAL_PROCESSING on the stdout handle), and the
// output code page is switched to UTF-8 so frame bytes mean the same as
// on Unix. Both are put back by `disable_ansi`.
//
// Input is read as console records, not bytes. Only key-down records
// carrying a character count; modifier and arrow presses, focus, mouse
// and resize records are skipped. Characters arrive as UTF-16 units and
// are re-encoded as UTF-8, so the byte stream `read_input` hands out is
// identical to what a Unix terminal delivers for the same keys.

use std::collections::VecDeque;
use std::io;

use tracing::{debug, trace};
use windows::Win32::Foundation::HANDLE;
use windows::Win32::Storage::FileSystem::WriteFile;
use windows::Win32::System::Console::{
    CONSOLE_MODE, CONSOLE_SCREEN_BUFFER_INFO, ENABLE_ECHO_INPUT, ENABLE_LINE_INPUT,
    ENABLE_VIRTUAL_TERMINAL_PROCESSING, GetConsoleMode, GetConsoleOutputCP,
    GetConsoleScreenBufferInfo, GetNumberOfConsoleInputEvents, GetStdHandle, INPUT_RECORD,
    KEY_EVENT, PeekConsoleInputW, ReadConsoleInputW, STD_HANDLE, STD_INPUT_HANDLE,
    STD_OUTPUT_HANDLE, SetConsoleMode, SetConsoleOutputCP,
};

use super::Platform;
use crate::error::{Result, TermError};

/// The UTF-8 code page.
const CP_UTF8: u32 = 65001;

fn win_err(op: &'static str) -> impl FnOnce(windows::core::Error) -> TermError {
    move |e| TermError::platform(op, io::Error::from(e))
}

fn std_handle(which: STD_HANDLE) -> Result<HANDLE> {
    unsafe { GetStdHandle(which) }.map_err(win_err("GetStdHandle"))
}

fn console_mode(handle: HANDLE) -> Result<CONSOLE_MODE> {
    let mut mode = CONSOLE_MODE(0);
    unsafe { GetConsoleMode(handle, &raw mut mode) }.map_err(win_err("GetConsoleMode"))?;
    Ok(mode)
}

/// The UTF-16 unit a record types, or `None` if it types nothing.
fn typed_unit(rec: &INPUT_RECORD) -> Option<u16> {
    if u32::from(rec.EventType) != KEY_EVENT {
        return None;
    }
    let key = unsafe { rec.Event.KeyEvent };
    let unit = unsafe { key.uChar.UnicodeChar };
    (key.bKeyDown.as_bool() && unit != 0).then_some(unit)
}

// ─── Utf16Decoder ────────────────────────────────────────────────────────────

/// Turns a stream of UTF-16 units into UTF-8 bytes, holding a high
/// surrogate until its partner arrives.
#[derive(Debug, Default)]
struct Utf16Decoder {
    high: Option<u16>,
}

impl Utf16Decoder {
    /// Feed one unit; append the UTF-8 of any completed character to `out`.
    fn push(&mut self, unit: u16, out: &mut VecDeque<u8>) {
        let (units, len) = match (self.high.take(), unit) {
            (None, 0xD800..=0xDBFF) => {
                self.high = Some(unit);
                return;
            }
            (Some(high), 0xDC00..=0xDFFF) => ([high, unit], 2),
            // A high surrogate followed by anything else is malformed.
            (Some(_), _) => ([0xFFFD, unit], 2),
            (None, _) => ([unit, 0], 1),
        };
        let mut bytes = [0u8; 4];
        for c in char::decode_utf16(units[..len].iter().copied()) {
            let c = c.unwrap_or(char::REPLACEMENT_CHARACTER);
            out.extend(c.encode_utf8(&mut bytes).as_bytes());
        }
    }
}

// ─── WindowsPlatform ─────────────────────────────────────────────────────────

/// Console-API [`Platform`] for Windows hosts.
#[derive(Debug, Default)]
pub struct WindowsPlatform {
    /// Output mode and code page found before VT processing was switched on.
    output_original: Option<(CONSOLE_MODE, u32)>,
    /// UTF-8 bytes of characters already taken from the console.
    pending: VecDeque<u8>,
    decoder: Utf16Decoder,
}

impl WindowsPlatform {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            output_original: None,
            pending: VecDeque::new(),
            decoder: Utf16Decoder { high: None },
        }
    }
}

impl Platform for WindowsPlatform {
    type Mode = CONSOLE_MODE;

    fn capture_mode(&mut self) -> Result<CONSOLE_MODE> {
        console_mode(std_handle(STD_INPUT_HANDLE)?)
    }

    fn raw_mode(&self, original: &CONSOLE_MODE) -> CONSOLE_MODE {
        CONSOLE_MODE(original.0 & !(ENABLE_ECHO_INPUT.0 | ENABLE_LINE_INPUT.0))
    }

    fn apply_mode(&mut self, mode: &CONSOLE_MODE) -> Result<()> {
        let handle = std_handle(STD_INPUT_HANDLE)?;
        unsafe { SetConsoleMode(handle, *mode) }.map_err(win_err("SetConsoleMode"))
    }

    fn poll_input(&mut self) -> Result<bool> {
        if !self.pending.is_empty() {
            return Ok(true);
        }
        let handle = std_handle(STD_INPUT_HANDLE)?;

        let mut count = 0u32;
        unsafe { GetNumberOfConsoleInputEvents(handle, &raw mut count) }
            .map_err(win_err("GetNumberOfConsoleInputEvents"))?;
        if count == 0 {
            return Ok(false);
        }

        let mut records = vec![INPUT_RECORD::default(); count as usize];
        let mut read = 0u32;
        unsafe { PeekConsoleInputW(handle, &mut records, &raw mut read) }
            .map_err(win_err("PeekConsoleInputW"))?;

        Ok(records
            .iter()
            .take(read as usize)
            .any(|rec| typed_unit(rec).is_some()))
    }

    fn read_input(&mut self) -> Result<Option<u8>> {
        let handle = std_handle(STD_INPUT_HANDLE)?;
        let mut record = [INPUT_RECORD::default()];
        while self.pending.is_empty() {
            let mut read = 0u32;
            unsafe { ReadConsoleInputW(handle, &mut record, &raw mut read) }
                .map_err(win_err("ReadConsoleInputW"))?;
            match typed_unit(&record[0]) {
                Some(unit) if read == 1 => self.decoder.push(unit, &mut self.pending),
                _ => trace!("skipped input record without a character"),
            }
        }
        Ok(self.pending.pop_front())
    }

    fn query_size(&mut self) -> Result<(usize, usize)> {
        let handle = std_handle(STD_OUTPUT_HANDLE)?;
        let mut info = CONSOLE_SCREEN_BUFFER_INFO::default();
        unsafe { GetConsoleScreenBufferInfo(handle, &raw mut info) }
            .map_err(win_err("GetConsoleScreenBufferInfo"))?;

        // The visible window, not the scrollback-sized screen buffer.
        let window = info.srWindow;
        let width = i32::from(window.Right) - i32::from(window.Left) + 1;
        let height = i32::from(window.Bottom) - i32::from(window.Top) + 1;
        Ok((
            usize::try_from(width).unwrap_or(0),
            usize::try_from(height).unwrap_or(0),
        ))
    }

    fn enable_ansi(&mut self) -> Result<()> {
        if self.output_original.is_some() {
            return Ok(());
        }
        let handle = std_handle(STD_OUTPUT_HANDLE)?;
        let original = console_mode(handle)?;
        let code_page = unsafe { GetConsoleOutputCP() };

        let vt = CONSOLE_MODE(original.0 | ENABLE_VIRTUAL_TERMINAL_PROCESSING.0);
        unsafe { SetConsoleMode(handle, vt) }.map_err(win_err("SetConsoleMode"))?;
        if let Err(e) = unsafe { SetConsoleOutputCP(CP_UTF8) } {
            let _ = unsafe { SetConsoleMode(handle, original) };
            return Err(win_err("SetConsoleOutputCP")(e));
        }

        debug!(mode = original.0, code_page, "virtual terminal processing enabled");
        self.output_original = Some((original, code_page));
        Ok(())
    }

    fn disable_ansi(&mut self) -> Result<()> {
        let Some((mode, code_page)) = self.output_original.take() else {
            return Ok(());
        };
        let handle = std_handle(STD_OUTPUT_HANDLE)?;
        let cp = unsafe { SetConsoleOutputCP(code_page) }.map_err(win_err("SetConsoleOutputCP"));
        let vt = unsafe { SetConsoleMode(handle, mode) }.map_err(win_err("SetConsoleMode"));
        cp.and(vt)
    }
}

// ─── ConsoleWriter ───────────────────────────────────────────────────────────

/// Unbuffered writer over the stdout handle.
///
/// Each `write` is one `WriteFile` call, so a frame is not split by the
/// line buffering of `io::stdout()`. Bytes pass through untouched; with
/// the UTF-8 output code page set by `enable_ansi` the console decodes
/// them as UTF-8.
#[derive(Debug, Default)]
pub struct ConsoleWriter {
    _private: (),
}

impl ConsoleWriter {
    #[must_use]
    pub const fn stdout() -> Self {
        Self { _private: () }
    }
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let handle = unsafe { GetStdHandle(STD_OUTPUT_HANDLE) }.map_err(io::Error::from)?;
        let mut written = 0u32;
        unsafe { WriteFile(handle, Some(buf), Some(&raw mut written), None) }
            .map_err(io::Error::from)?;
        Ok(written as usize)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
