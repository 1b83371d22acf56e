// SPDX-License-Identifier: MIT
//
// Session — one owner for every piece of terminal state.
//
// A session holds the platform backend, the output sink, the frame
// buffer, the scratch sequence buffer, the raw input channel, and the
// size probe. Nothing lives in statics, so independent sessions can
// coexist (each test gets its own over a scripted backend).
//
// Lifecycle:
//
//   start        allocate buffers → ANSI opt-in → capture input mode
//   (frames)     append … flush, poll / read / probe between frames
//   end          restore input mode → undo ANSI opt-in → free buffers
//
// `end` consumes the session, so a double end cannot be written, and a
// failed `start` hands back no session at all. Dropping a session that
// was never ended restores the terminal best-effort, which also covers
// unwinding out of a panic mid-frame.

use std::io::Write;

use tracing::{debug, warn};

use crate::ansi::SequenceBuffer;
use crate::config::Config;
use crate::error::Result;
use crate::frame::FrameBuffer;
use crate::input::RawInput;
use crate::platform::{self, NativeOutput, NativePlatform, Platform};
use crate::size::{ConsoleSize, SizeProbe};

/// A terminal session: frame buffer, raw input, and size probe over one
/// platform backend and one output sink.
///
/// # Example
///
/// ```no_run
/// use ck_term::{ansi, config::Config, session::Session};
///
/// let mut session = Session::start(Config::default())?;
/// session.append(ansi::CLEAR_SCREEN)?;
/// session.append(&ansi::fg_rgb(255, 0, 128))?;
/// session.append("hello")?;
/// session.flush()?;
///
/// if session.poll_has_input()? {
///     let key = session.read_char()?;
///     println!("pressed {key}");
/// }
/// session.end()?;
/// # Ok::<(), ck_term::error::TermError>(())
/// ```
pub struct Session<P: Platform = NativePlatform, W: Write = NativeOutput> {
    platform: P,
    out: W,
    frame: FrameBuffer,
    sequences: SequenceBuffer,
    input: RawInput<P::Mode>,
    probe: SizeProbe,
    ended: bool,
}

impl Session {
    /// Start a session on the host terminal, writing frames straight to
    /// the stdout descriptor (see [`NativeOutput`]).
    ///
    /// # Errors
    ///
    /// [`TermError::InvalidConfig`](crate::error::TermError::InvalidConfig)
    /// for a zero capacity or increment,
    /// [`TermError::OutOfMemory`](crate::error::TermError::OutOfMemory) if
    /// the frame buffer cannot be allocated,
    /// [`TermError::NotATerminal`](crate::error::TermError::NotATerminal)
    /// if stdin is redirected,
    /// [`TermError::Platform`](crate::error::TermError::Platform) if the
    /// terminal mode cannot be read.
    pub fn start(config: Config) -> Result<Self> {
        Self::with_platform(config, NativePlatform::new(), platform::native_output())
    }
}

impl<P: Platform, W: Write> Session<P, W> {
    /// Start a session over an explicit backend and output sink.
    ///
    /// Anything already switched on is switched back off if a later step
    /// fails.
    ///
    /// # Errors
    ///
    /// Same as [`Session::start`].
    pub fn with_platform(config: Config, mut platform: P, out: W) -> Result<Self> {
        let frame = FrameBuffer::new(&config)?;

        platform.enable_ansi()?;

        let mut input = RawInput::new();
        if let Err(e) = input.install(&mut platform) {
            if let Err(undo) = platform.disable_ansi() {
                warn!(error = %undo, "failed to undo ANSI opt-in after failed start");
            }
            return Err(e);
        }

        debug!(
            capacity = config.initial_capacity,
            increment = config.growth_increment,
            "session started"
        );

        Ok(Self {
            platform,
            out,
            frame,
            sequences: SequenceBuffer::new(),
            input,
            probe: SizeProbe::new(),
            ended: false,
        })
    }

    // ── Frame ───────────────────────────────────────────────────────────

    /// Append text or escape sequences to the current frame.
    ///
    /// # Errors
    ///
    /// [`TermError::OutOfMemory`](crate::error::TermError::OutOfMemory) if
    /// the frame buffer cannot grow; the frame is unchanged.
    pub fn append(&mut self, text: &str) -> Result<()> {
        self.frame.append(text)
    }

    /// Write cursor-home plus the frame to the output sink in one write,
    /// then start an empty frame.
    ///
    /// # Errors
    ///
    /// [`TermError::Io`](crate::error::TermError::Io) if the write fails.
    pub fn flush(&mut self) -> Result<()> {
        self.frame.flush_to(&mut self.out)?;
        Ok(())
    }

    #[inline]
    #[must_use]
    pub const fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    /// The frame buffer as an `io::Write`, for the `ansi::write_*` helpers
    /// and `write!`.
    #[inline]
    pub const fn frame_mut(&mut self) -> &mut FrameBuffer {
        &mut self.frame
    }

    /// The session's scratch buffer for one-at-a-time sequence formatting.
    #[inline]
    pub const fn sequences(&mut self) -> &mut SequenceBuffer {
        &mut self.sequences
    }

    // ── Input ───────────────────────────────────────────────────────────

    /// Whether a keystroke is waiting. Never blocks.
    ///
    /// # Errors
    ///
    /// [`TermError::Platform`](crate::error::TermError::Platform) if the
    /// mode switch or the poll fails.
    pub fn poll_has_input(&mut self) -> Result<bool> {
        self.input.poll_has_input(&mut self.platform)
    }

    /// Block until one character is typed. Call
    /// [`poll_has_input`](Self::poll_has_input) first to avoid blocking.
    ///
    /// # Errors
    ///
    /// [`TermError::EndOfInput`](crate::error::TermError::EndOfInput) if
    /// stdin closes, [`TermError::Platform`](crate::error::TermError::Platform)
    /// if the mode switch or the read fails.
    pub fn read_char(&mut self) -> Result<char> {
        self.input.read_char(&mut self.platform)
    }

    // ── Size ────────────────────────────────────────────────────────────

    /// The live terminal size and whether it changed since the last call.
    ///
    /// # Errors
    ///
    /// [`TermError::Platform`](crate::error::TermError::Platform) if the
    /// size query fails.
    pub fn current_size(&mut self) -> Result<ConsoleSize> {
        self.probe.current_size(&mut self.platform)
    }

    // ── Accessors ───────────────────────────────────────────────────────

    #[inline]
    #[must_use]
    pub const fn platform(&self) -> &P {
        &self.platform
    }

    #[inline]
    pub const fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    /// The output sink frames are flushed to.
    #[inline]
    #[must_use]
    pub const fn writer(&self) -> &W {
        &self.out
    }

    // ── Teardown ────────────────────────────────────────────────────────

    /// Restore the terminal and release the buffers.
    ///
    /// # Errors
    ///
    /// [`TermError::Platform`](crate::error::TermError::Platform) if the
    /// original mode cannot be restored. Both restore steps are attempted
    /// regardless; the first failure is returned.
    pub fn end(mut self) -> Result<()> {
        self.ended = true;
        let result = self.teardown();
        debug!(ok = result.is_ok(), "session ended");
        result
    }

    fn teardown(&mut self) -> Result<()> {
        let input = self.input.restore(&mut self.platform);
        let ansi = self.platform.disable_ansi();
        input.and(ansi)
    }
}

impl<P: Platform, W: Write> Drop for Session<P, W> {
    fn drop(&mut self) {
        if self.ended {
            return;
        }
        if let Err(e) = self.teardown() {
            warn!(error = %e, "failed to restore terminal on drop");
        }
    }
}

impl<P: Platform, W: Write> std::fmt::Debug for Session<P, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("frame", &self.frame)
            .field("input", &self.input)
            .field("probe", &self.probe)
            .field("ended", &self.ended)
            .finish_non_exhaustive()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
