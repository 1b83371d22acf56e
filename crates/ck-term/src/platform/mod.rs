// SPDX-License-Identifier: MIT
//
// Platform capability — the only place that talks to the OS.
//
// Raw input and size probing need a handful of primitives whose shape
// differs per OS (termios + poll + ioctl on Unix, console modes and
// input records on Windows). Everything above this module depends on
// the `Platform` trait alone; the concrete backend is picked at build
// time through the `NativePlatform` alias.
//
// Frames leave through `NativeOutput`, an unbuffered writer on the
// stdout descriptor or handle. Rust's `io::stdout()` is line-buffered
// and would hand a frame containing `\n` to the terminal in pieces.
//
// A third backend, `ScriptedPlatform`, replays queued input and sizes
// from memory so sessions can run in tests and headless hosts.

use bitflags::bitflags;

use crate::error::Result;

pub mod scripted;

#[cfg(unix)]
pub mod unix;

#[cfg(windows)]
pub mod windows;

pub use scripted::ScriptedPlatform;

/// The backend for the host OS.
#[cfg(unix)]
pub type NativePlatform = unix::UnixPlatform;

/// The backend for the host OS.
#[cfg(windows)]
pub type NativePlatform = windows::WindowsPlatform;

/// Hosts with neither termios nor a Windows console get the scripted
/// backend, which behaves like a terminal with no input and a fixed size.
#[cfg(not(any(unix, windows)))]
pub type NativePlatform = scripted::ScriptedPlatform;

/// Unbuffered stdout for the host OS.
#[cfg(unix)]
pub type NativeOutput = unix::FdWriter;

/// Unbuffered stdout for the host OS.
#[cfg(windows)]
pub type NativeOutput = windows::ConsoleWriter;

#[cfg(not(any(unix, windows)))]
pub type NativeOutput = std::io::Stdout;

/// The writer sessions flush frames to by default.
#[cfg(unix)]
#[must_use]
pub const fn native_output() -> NativeOutput {
    unix::FdWriter::stdout()
}

/// The writer sessions flush frames to by default.
#[cfg(windows)]
#[must_use]
pub const fn native_output() -> NativeOutput {
    windows::ConsoleWriter::stdout()
}

#[cfg(not(any(unix, windows)))]
#[must_use]
pub fn native_output() -> NativeOutput {
    std::io::stdout()
}

bitflags! {
    /// Platform-neutral view of the input flags raw mode touches.
    ///
    /// Backends translate to and from their own mode type (`ECHO` /
    /// `ICANON` in `c_lflag`, `ENABLE_ECHO_INPUT` / `ENABLE_LINE_INPUT`
    /// in the console mode).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct InputFlags: u8 {
        /// Typed characters are echoed back by the terminal.
        const ECHO = 1 << 0;
        /// Input is delivered a line at a time after Enter.
        const LINE_BUFFERED = 1 << 1;
    }
}

impl InputFlags {
    /// Flags of a freshly opened interactive terminal.
    pub const COOKED: Self = Self::ECHO.union(Self::LINE_BUFFERED);
}

/// OS primitives for terminal mode, input, and size.
///
/// `Mode` is an opaque snapshot of whatever the OS calls terminal
/// attributes. Implementations must make every method report failures
/// instead of returning made-up values.
pub trait Platform {
    /// Snapshot of the terminal's input mode.
    type Mode: Copy;

    /// Read the current input mode.
    ///
    /// # Errors
    ///
    /// Returns [`TermError::Platform`](crate::error::TermError::Platform)
    /// if the OS query fails (e.g. stdin is not a terminal).
    fn capture_mode(&mut self) -> Result<Self::Mode>;

    /// Derive the raw variant of `original`: echo and line buffering off,
    /// everything else as it was.
    fn raw_mode(&self, original: &Self::Mode) -> Self::Mode;

    /// Install `mode` immediately.
    ///
    /// # Errors
    ///
    /// Returns [`TermError::Platform`](crate::error::TermError::Platform)
    /// if the OS rejects the mode.
    fn apply_mode(&mut self, mode: &Self::Mode) -> Result<()>;

    /// Put `original` back. Separate from [`apply_mode`](Self::apply_mode)
    /// so backends can flush or log differently on the way out.
    ///
    /// # Errors
    ///
    /// Same as [`apply_mode`](Self::apply_mode).
    fn restore_mode(&mut self, original: &Self::Mode) -> Result<()> {
        self.apply_mode(original)
    }

    /// Whether at least one input event is pending. Must not block and
    /// must not consume input.
    ///
    /// # Errors
    ///
    /// Returns [`TermError::Platform`](crate::error::TermError::Platform)
    /// if the poll itself fails.
    fn poll_input(&mut self) -> Result<bool>;

    /// Block until one byte of input arrives. `None` means end of input.
    ///
    /// # Errors
    ///
    /// Returns [`TermError::Platform`](crate::error::TermError::Platform)
    /// if the read fails.
    fn read_input(&mut self) -> Result<Option<u8>>;

    /// Current terminal size as `(columns, rows)`.
    ///
    /// # Errors
    ///
    /// Returns [`TermError::Platform`](crate::error::TermError::Platform)
    /// if the size cannot be determined.
    fn query_size(&mut self) -> Result<(usize, usize)>;

    /// Opt in to ANSI/VT processing on output. A no-op where the
    /// terminal always interprets escape sequences.
    ///
    /// # Errors
    ///
    /// Returns [`TermError::Platform`](crate::error::TermError::Platform)
    /// if the console refuses the mode.
    fn enable_ansi(&mut self) -> Result<()> {
        Ok(())
    }

    /// Undo [`enable_ansi`](Self::enable_ansi).
    ///
    /// # Errors
    ///
    /// Same as [`enable_ansi`](Self::enable_ansi).
    fn disable_ansi(&mut self) -> Result<()> {
        Ok(())
    }
}

/// A borrowed backend is a backend, so a session can run over a platform
/// the caller keeps ownership of.
impl<T: Platform + ?Sized> Platform for &mut T {
    type Mode = T::Mode;

    fn capture_mode(&mut self) -> Result<Self::Mode> {
        (**self).capture_mode()
    }

    fn raw_mode(&self, original: &Self::Mode) -> Self::Mode {
        (**self).raw_mode(original)
    }

    fn apply_mode(&mut self, mode: &Self::Mode) -> Result<()> {
        (**self).apply_mode(mode)
    }

    fn restore_mode(&mut self, original: &Self::Mode) -> Result<()> {
        (**self).restore_mode(original)
    }

    fn poll_input(&mut self) -> Result<bool> {
        (**self).poll_input()
    }

    fn read_input(&mut self) -> Result<Option<u8>> {
        (**self).read_input()
    }

    fn query_size(&mut self) -> Result<(usize, usize)> {
        (**self).query_size()
    }

    fn enable_ansi(&mut self) -> Result<()> {
        (**self).enable_ansi()
    }

    fn disable_ansi(&mut self) -> Result<()> {
        (**self).disable_ansi()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cooked_has_both_flags() {
        assert!(InputFlags::COOKED.contains(InputFlags::ECHO));
        assert!(InputFlags::COOKED.contains(InputFlags::LINE_BUFFERED));
    }

    #[test]
    fn native_platform_constructs() {
        let _ = NativePlatform::new();
    }
}
