// SPDX-License-Identifier: MIT
//
// Unix backend — termios, poll, and TIOCGWINSZ on stdin; raw writes to
// stdout.
//
// Safety: This module necessarily uses `unsafe` for termios (tcgetattr,
// tcsetattr), poll, read, write, and ioctl. These are the standard POSIX
// interfaces for terminal control; there is no safe alternative. Each
// unsafe block is minimal and wraps exactly one call.
#![allow(unsafe_code)]
//
// Input calls target file descriptor 0. Frames go out through `FdWriter`
// on fd 1, which bypasses Rust's line-buffered `io::stdout()` so a frame
// containing newlines is not split at its last `\n`.
//
// Raw mode is lighter than cfmakeraw: only ECHO and ICANON are cleared.
// Signals (Ctrl-C) and output post-processing stay as the user's shell
// configured them.

use std::io;

use tracing::trace;

use super::Platform;
use crate::error::{Result, TermError};

const STDIN: libc::c_int = libc::STDIN_FILENO;

/// Termios/poll-based [`Platform`] for Unix-like hosts.
#[derive(Debug, Default)]
pub struct UnixPlatform {
    _private: (),
}

impl UnixPlatform {
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }
}

/// Check whether stdin is connected to a terminal (TTY).
#[must_use]
pub fn is_tty() -> bool {
    unsafe { libc::isatty(STDIN) != 0 }
}

// ─── FdWriter ────────────────────────────────────────────────────────────────

/// Unbuffered writer over a raw file descriptor.
///
/// Every `write` is exactly one `write(2)` call. There is no buffer in
/// between, so `write_all` of a whole frame reaches the terminal as a
/// single syscall unless the kernel accepts it partially.
#[derive(Debug)]
pub struct FdWriter {
    fd: libc::c_int,
}

impl FdWriter {
    /// Writer over fd 1.
    #[must_use]
    pub const fn stdout() -> Self {
        Self {
            fd: libc::STDOUT_FILENO,
        }
    }

    /// Writer over an already-open descriptor. The descriptor is not
    /// closed on drop.
    #[must_use]
    pub const fn from_raw_fd(fd: libc::c_int) -> Self {
        Self { fd }
    }
}

impl io::Write for FdWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        loop {
            let n = unsafe { libc::write(self.fd, buf.as_ptr().cast::<libc::c_void>(), buf.len()) };
            if n >= 0 {
                return Ok(n.unsigned_abs());
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Platform for UnixPlatform {
    type Mode = libc::termios;

    fn capture_mode(&mut self) -> Result<libc::termios> {
        if !is_tty() {
            return Err(TermError::NotATerminal);
        }
        let mut termios: libc::termios = unsafe { std::mem::zeroed() };
        if unsafe { libc::tcgetattr(STDIN, &raw mut termios) } != 0 {
            return Err(TermError::last_os_error("tcgetattr"));
        }
        Ok(termios)
    }

    fn raw_mode(&self, original: &libc::termios) -> libc::termios {
        let mut raw = *original;
        raw.c_lflag &= !(libc::ECHO | libc::ICANON);
        // read() returns as soon as one byte is available.
        raw.c_cc[libc::VMIN] = 1;
        raw.c_cc[libc::VTIME] = 0;
        raw
    }

    fn apply_mode(&mut self, mode: &libc::termios) -> Result<()> {
        // TCSANOW: pending input must survive the switch, or a poll
        // followed by a read would lose the byte it just saw.
        if unsafe { libc::tcsetattr(STDIN, libc::TCSANOW, mode) } != 0 {
            return Err(TermError::last_os_error("tcsetattr"));
        }
        Ok(())
    }

    fn poll_input(&mut self) -> Result<bool> {
        let mut pfd = libc::pollfd {
            fd: STDIN,
            events: libc::POLLIN,
            revents: 0,
        };
        let ready = unsafe { libc::poll(&raw mut pfd, 1, 0) };
        if ready < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(false);
            }
            return Err(TermError::platform("poll", err));
        }
        Ok(ready > 0 && pfd.revents & libc::POLLIN != 0)
    }

    fn read_input(&mut self) -> Result<Option<u8>> {
        let mut byte = 0u8;
        loop {
            let n = unsafe { libc::read(STDIN, (&raw mut byte).cast::<libc::c_void>(), 1) };
            match n {
                1 => return Ok(Some(byte)),
                0 => return Ok(None),
                _ => {
                    let err = io::Error::last_os_error();
                    if err.kind() == io::ErrorKind::Interrupted {
                        trace!("read interrupted, retrying");
                        continue;
                    }
                    return Err(TermError::platform("read", err));
                }
            }
        }
    }

    fn query_size(&mut self) -> Result<(usize, usize)> {
        let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
        if unsafe { libc::ioctl(STDIN, libc::TIOCGWINSZ, &raw mut ws) } != 0 {
            return Err(TermError::last_os_error("ioctl(TIOCGWINSZ)"));
        }
        Ok((usize::from(ws.ws_col), usize::from(ws.ws_row)))
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
