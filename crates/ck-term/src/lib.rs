// SPDX-License-Identifier: MIT
//
// ck-term — a minimal cross-platform console kit.
//
// Four pieces, one owner:
//
//   frame     append text and escape sequences, flush once per frame
//   input     keystrokes without echo or line buffering
//   size      terminal dimensions with resize detection
//   ansi      truecolor and cursor-movement sequences
//
// `Session` ties them to a platform backend (termios on Unix, console
// modes on Windows, an in-memory script for tests) and an output sink.
// Nothing is global: every piece of state belongs to a session value,
// and ending or dropping the session puts the terminal back.

pub mod ansi;
pub mod config;
pub mod error;
pub mod frame;
pub mod input;
pub mod platform;
pub mod session;
pub mod size;

pub use config::Config;
pub use error::{Result, TermError};
pub use session::Session;
pub use size::ConsoleSize;
