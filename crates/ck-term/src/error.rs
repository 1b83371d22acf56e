// SPDX-License-Identifier: MIT
//
// Error types for terminal operations.
//
// Every platform call (mode get/set, input poll, size query) is checked
// and surfaced as `TermError::Platform` with the name of the primitive
// that failed. Allocation failure during frame growth is recoverable:
// the frame buffer is left untouched and the caller decides whether to
// bail out.

use std::io;

use thiserror::Error;

/// Result alias used throughout `ck-term`.
pub type Result<T> = std::result::Result<T, TermError>;

#[derive(Error, Debug)]
pub enum TermError {
    /// Growing the frame buffer could not obtain memory.
    #[error("failed to grow frame buffer to {requested} bytes")]
    OutOfMemory { requested: usize },

    /// An OS terminal primitive failed.
    #[error("{op} failed: {source}")]
    Platform {
        op: &'static str,
        #[source]
        source: io::Error,
    },

    /// Standard input is not connected to a terminal, so there is no
    /// mode to capture (input redirected from a file or pipe).
    #[error("standard input is not a terminal")]
    NotATerminal,

    /// A raw input operation ran before the channel captured the original mode.
    #[error("raw input channel is not installed")]
    NotInstalled,

    /// Standard input reached end-of-file while waiting for a character.
    #[error("end of input")]
    EndOfInput,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Writing the frame to the output sink failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl TermError {
    /// Wrap an OS error with the name of the primitive that produced it.
    #[must_use]
    pub const fn platform(op: &'static str, source: io::Error) -> Self {
        Self::Platform { op, source }
    }

    /// Capture `errno` / `GetLastError` for the primitive that just failed.
    #[must_use]
    pub fn last_os_error(op: &'static str) -> Self {
        Self::platform(op, io::Error::last_os_error())
    }

    /// Whether this error came from growing the frame buffer.
    #[must_use]
    pub const fn is_out_of_memory(&self) -> bool {
        matches!(self, Self::OutOfMemory { .. })
    }
}

impl From<TermError> for io::Error {
    fn from(err: TermError) -> Self {
        match err {
            TermError::Io(e) | TermError::Platform { source: e, .. } => e,
            TermError::OutOfMemory { .. } => Self::new(io::ErrorKind::OutOfMemory, err),
            TermError::EndOfInput => Self::new(io::ErrorKind::UnexpectedEof, err),
            other => Self::other(other),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_error_names_the_primitive() {
        let err = TermError::platform("tcgetattr", io::Error::from_raw_os_error(25));
        let msg = err.to_string();
        assert!(msg.starts_with("tcgetattr failed: "), "{msg}");
    }

    #[test]
    fn platform_error_keeps_source() {
        use std::error::Error as _;
        let err = TermError::platform("poll", io::Error::other("boom"));
        assert_eq!(err.source().unwrap().to_string(), "boom");
    }

    #[test]
    fn out_of_memory_reports_request() {
        let err = TermError::OutOfMemory { requested: 4096 };
        assert!(err.is_out_of_memory());
        assert_eq!(err.to_string(), "failed to grow frame buffer to 4096 bytes");
    }

    #[test]
    fn out_of_memory_maps_to_io_kind() {
        let io_err: io::Error = TermError::OutOfMemory { requested: 1 }.into();
        assert_eq!(io_err.kind(), io::ErrorKind::OutOfMemory);
    }

    #[test]
    fn end_of_input_maps_to_unexpected_eof() {
        let io_err: io::Error = TermError::EndOfInput.into();
        assert_eq!(io_err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn io_error_round_trips_kind() {
        let err: TermError = io::Error::new(io::ErrorKind::BrokenPipe, "gone").into();
        let back: io::Error = err.into();
        assert_eq!(back.kind(), io::ErrorKind::BrokenPipe);
    }
}
