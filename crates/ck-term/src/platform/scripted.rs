// SPDX-License-Identifier: MIT
//
// Scripted backend — a terminal made of queues.
//
// Input bytes and terminal sizes are queued up front and handed out in
// order. Every mode change is recorded, so tests can assert exactly what
// the raw input channel did to the "terminal". Individual operations can
// be told to fail, to exercise error paths without a real TTY.

use std::collections::{HashSet, VecDeque};
use std::io;

use super::{InputFlags, Platform};
use crate::error::{Result, TermError};

/// Size reported when the size queue is empty and nothing was queued.
const DEFAULT_SIZE: (usize, usize) = (80, 24);

/// In-memory [`Platform`] with queued input and sizes.
#[derive(Debug, Clone)]
pub struct ScriptedPlatform {
    mode: InputFlags,
    history: Vec<InputFlags>,
    input: VecDeque<u8>,
    sizes: VecDeque<(usize, usize)>,
    last_size: (usize, usize),
    ansi_enabled: bool,
    failing: HashSet<&'static str>,
}

impl ScriptedPlatform {
    /// A cooked-mode terminal with no input and an 80×24 size.
    #[must_use]
    pub fn new() -> Self {
        Self {
            mode: InputFlags::COOKED,
            history: Vec::new(),
            input: VecDeque::new(),
            sizes: VecDeque::new(),
            last_size: DEFAULT_SIZE,
            ansi_enabled: false,
            failing: HashSet::new(),
        }
    }

    /// Queue bytes to be delivered by `read_input`.
    #[must_use]
    pub fn with_input(mut self, bytes: impl AsRef<[u8]>) -> Self {
        self.push_input(bytes);
        self
    }

    /// Queue sizes to be reported by successive `query_size` calls. Once
    /// the queue drains the last size keeps being reported.
    #[must_use]
    pub fn with_sizes(mut self, sizes: impl IntoIterator<Item = (usize, usize)>) -> Self {
        self.sizes.extend(sizes);
        self
    }

    /// Make the named operation fail with an OS-style error. Names match
    /// the trait methods: `"capture_mode"`, `"apply_mode"`, `"poll_input"`,
    /// `"read_input"`, `"query_size"`, `"enable_ansi"`.
    #[must_use]
    pub fn failing(mut self, op: &'static str) -> Self {
        self.failing.insert(op);
        self
    }

    /// Queue more input on a platform already in use, e.g. through
    /// `Session::platform_mut` between frames.
    pub fn push_input(&mut self, bytes: impl AsRef<[u8]>) {
        self.input.extend(bytes.as_ref());
    }

    /// The mode currently installed.
    #[must_use]
    pub const fn mode(&self) -> InputFlags {
        self.mode
    }

    /// Every mode applied so far, oldest first.
    #[must_use]
    pub fn history(&self) -> &[InputFlags] {
        &self.history
    }

    #[must_use]
    pub const fn ansi_enabled(&self) -> bool {
        self.ansi_enabled
    }

    /// Bytes still waiting to be read.
    #[must_use]
    pub fn pending_input(&self) -> usize {
        self.input.len()
    }

    fn check(&self, op: &'static str) -> Result<()> {
        if self.failing.contains(op) {
            return Err(TermError::platform(op, io::Error::other("scripted failure")));
        }
        Ok(())
    }
}

impl Default for ScriptedPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl Platform for ScriptedPlatform {
    type Mode = InputFlags;

    fn capture_mode(&mut self) -> Result<InputFlags> {
        self.check("capture_mode")?;
        Ok(self.mode)
    }

    fn raw_mode(&self, original: &InputFlags) -> InputFlags {
        original.difference(InputFlags::ECHO | InputFlags::LINE_BUFFERED)
    }

    fn apply_mode(&mut self, mode: &InputFlags) -> Result<()> {
        self.check("apply_mode")?;
        self.mode = *mode;
        self.history.push(*mode);
        Ok(())
    }

    fn poll_input(&mut self) -> Result<bool> {
        self.check("poll_input")?;
        Ok(!self.input.is_empty())
    }

    fn read_input(&mut self) -> Result<Option<u8>> {
        self.check("read_input")?;
        Ok(self.input.pop_front())
    }

    fn query_size(&mut self) -> Result<(usize, usize)> {
        self.check("query_size")?;
        if let Some(next) = self.sizes.pop_front() {
            self.last_size = next;
        }
        Ok(self.last_size)
    }

    fn enable_ansi(&mut self) -> Result<()> {
        self.check("enable_ansi")?;
        self.ansi_enabled = true;
        Ok(())
    }

    fn disable_ansi(&mut self) -> Result<()> {
        self.ansi_enabled = false;
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
