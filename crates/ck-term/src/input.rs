// SPDX-License-Identifier: MIT
//
// Raw input channel — keystrokes without echo or line buffering.
//
// The terminal stays in its original (cooked) mode between frames. Raw
// mode is installed only for the duration of a single poll or read and
// removed right after, so anything else that prints or prompts between
// frames sees the terminal exactly as the user left it.
//
//   install()          capture original once, derive raw
//   poll_has_input()   raw → zero-timeout check → original
//   read_char()        raw → blocking read → original
//   restore()          original (no-op if never installed)
//
// The channel holds only the two mode snapshots. The platform is passed
// in on each call so a single backend can be shared with the size probe.

use tracing::{debug, warn};

use crate::error::{Result, TermError};
use crate::platform::Platform;

/// Captured and derived modes.
#[derive(Clone, Copy)]
struct Modes<M> {
    original: M,
    active: M,
}

/// Raw-mode keystroke reader over a [`Platform`].
pub struct RawInput<M> {
    modes: Option<Modes<M>>,
}

impl<M: Copy> RawInput<M> {
    /// A channel that has not captured anything yet.
    #[must_use]
    pub const fn new() -> Self {
        Self { modes: None }
    }

    /// Whether [`install`](Self::install) has captured the original mode.
    #[inline]
    #[must_use]
    pub const fn is_installed(&self) -> bool {
        self.modes.is_some()
    }

    /// The mode captured at install time.
    #[must_use]
    pub fn original(&self) -> Option<M> {
        self.modes.map(|m| m.original)
    }

    /// Capture the original mode and derive the raw one.
    ///
    /// Idempotent: once captured, the original is never re-read, so a
    /// terminal left in raw mode by a failed restore cannot overwrite it.
    ///
    /// # Errors
    ///
    /// Returns [`TermError::Platform`] if the mode cannot be read.
    pub fn install<P>(&mut self, platform: &mut P) -> Result<()>
    where
        P: Platform<Mode = M>,
    {
        if self.modes.is_some() {
            return Ok(());
        }
        let original = platform.capture_mode()?;
        let active = platform.raw_mode(&original);
        self.modes = Some(Modes { original, active });
        debug!("raw input installed");
        Ok(())
    }

    /// Whether a keystroke is waiting. Never blocks, never consumes.
    ///
    /// # Errors
    ///
    /// [`TermError::NotInstalled`] before [`install`](Self::install);
    /// [`TermError::Platform`] if switching modes or polling fails.
    pub fn poll_has_input<P>(&mut self, platform: &mut P) -> Result<bool>
    where
        P: Platform<Mode = M>,
    {
        self.with_raw(platform, P::poll_input)
    }

    /// Block until one character is typed and return it.
    ///
    /// Multi-byte UTF-8 input is assembled into a single `char`; bytes
    /// that do not form valid UTF-8 yield `U+FFFD`.
    ///
    /// # Errors
    ///
    /// [`TermError::NotInstalled`] before [`install`](Self::install);
    /// [`TermError::EndOfInput`] if stdin closes;
    /// [`TermError::Platform`] if switching modes or reading fails.
    pub fn read_char<P>(&mut self, platform: &mut P) -> Result<char>
    where
        P: Platform<Mode = M>,
    {
        self.with_raw(platform, read_utf8_char::<P>)
    }

    /// Put the original mode back. A no-op if nothing was installed.
    ///
    /// # Errors
    ///
    /// Returns [`TermError::Platform`] if the OS rejects the mode.
    pub fn restore<P>(&mut self, platform: &mut P) -> Result<()>
    where
        P: Platform<Mode = M>,
    {
        match self.modes {
            Some(m) => platform.restore_mode(&m.original),
            None => Ok(()),
        }
    }

    /// Run `op` with raw mode installed, then restore the original mode
    /// whether or not `op` succeeded.
    fn with_raw<P, T>(&self, platform: &mut P, op: impl FnOnce(&mut P) -> Result<T>) -> Result<T>
    where
        P: Platform<Mode = M>,
    {
        let modes = self.modes.ok_or(TermError::NotInstalled)?;

        platform.apply_mode(&modes.active)?;
        let result = op(platform);
        let restored = platform.restore_mode(&modes.original);

        match (result, restored) {
            (Ok(value), Ok(())) => Ok(value),
            (Err(e), Ok(())) | (Ok(_), Err(e)) => Err(e),
            (Err(e), Err(restore_err)) => {
                warn!(error = %restore_err, "failed to restore input mode");
                Err(e)
            }
        }
    }
}

impl<M: Copy> Default for RawInput<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> std::fmt::Debug for RawInput<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawInput")
            .field("installed", &self.modes.is_some())
            .finish()
    }
}

// ─── UTF-8 Assembly ──────────────────────────────────────────────────────────

/// Expected sequence length from a UTF-8 lead byte, `None` if `b` cannot
/// start a sequence.
const fn utf8_len(b: u8) -> Option<usize> {
    match b {
        0x00..=0x7F => Some(1),
        0xC2..=0xDF => Some(2),
        0xE0..=0xEF => Some(3),
        0xF0..=0xF4 => Some(4),
        _ => None,
    }
}

/// Read one character's worth of bytes from `platform`.
fn read_utf8_char<P: Platform>(platform: &mut P) -> Result<char> {
    let lead = platform.read_input()?.ok_or(TermError::EndOfInput)?;
    let Some(len) = utf8_len(lead) else {
        return Ok(char::REPLACEMENT_CHARACTER);
    };

    let mut bytes = [lead, 0, 0, 0];
    for slot in bytes.iter_mut().take(len).skip(1) {
        *slot = platform.read_input()?.ok_or(TermError::EndOfInput)?;
    }

    Ok(std::str::from_utf8(&bytes[..len])
        .ok()
        .and_then(|s| s.chars().next())
        .unwrap_or(char::REPLACEMENT_CHARACTER))
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{InputFlags, ScriptedPlatform};

    fn installed(p: &mut ScriptedPlatform) -> RawInput<InputFlags> {
        let mut input = RawInput::new();
        input.install(p).unwrap();
        input
    }

    // ── Install / restore ───────────────────────────────────────────────

    #[test]
    fn new_is_not_installed() {
        let input = RawInput::<InputFlags>::new();
        assert!(!input.is_installed());
        assert_eq!(input.original(), None);
    }

    #[test]
    fn install_captures_without_changing_mode() {
        let mut p = ScriptedPlatform::new();
        let input = installed(&mut p);
        assert!(input.is_installed());
        assert_eq!(input.original(), Some(InputFlags::COOKED));
        assert_eq!(p.mode(), InputFlags::COOKED);
        assert!(p.history().is_empty());
    }

    #[test]
    fn install_is_idempotent() {
        let mut p = ScriptedPlatform::new();
        let mut input = installed(&mut p);
        // Someone else leaves the terminal raw; a second install must not
        // adopt that as the original.
        p.apply_mode(&InputFlags::empty()).unwrap();
        input.install(&mut p).unwrap();
        assert_eq!(input.original(), Some(InputFlags::COOKED));
    }

    #[test]
    fn install_failure_leaves_channel_uninstalled() {
        let mut p = ScriptedPlatform::new().failing("capture_mode");
        let mut input = RawInput::new();
        assert!(input.install(&mut p).is_err());
        assert!(!input.is_installed());
    }

    #[test]
    fn restore_without_install_is_noop() {
        let mut p = ScriptedPlatform::new();
        let mut input = RawInput::new();
        input.restore(&mut p).unwrap();
        assert!(p.history().is_empty());
        assert_eq!(p.mode(), InputFlags::COOKED);
    }

    #[test]
    fn restore_reapplies_original() {
        let mut p = ScriptedPlatform::new();
        let mut input = installed(&mut p);
        p.apply_mode(&InputFlags::empty()).unwrap();
        input.restore(&mut p).unwrap();
        assert_eq!(p.mode(), InputFlags::COOKED);
    }

    // ── Poll ────────────────────────────────────────────────────────────

    #[test]
    fn poll_before_install_errors() {
        let mut p = ScriptedPlatform::new();
        let mut input = RawInput::new();
        assert!(matches!(
            input.poll_has_input(&mut p),
            Err(TermError::NotInstalled)
        ));
    }

    #[test]
    fn poll_wraps_check_in_raw_mode() {
        let mut p = ScriptedPlatform::new().with_input("x");
        let mut input = installed(&mut p);
        assert!(input.poll_has_input(&mut p).unwrap());
        assert_eq!(p.history(), &[InputFlags::empty(), InputFlags::COOKED]);
        assert_eq!(p.mode(), InputFlags::COOKED);
    }

    #[test]
    fn poll_does_not_consume() {
        let mut p = ScriptedPlatform::new().with_input("x");
        let mut input = installed(&mut p);
        assert!(input.poll_has_input(&mut p).unwrap());
        assert!(input.poll_has_input(&mut p).unwrap());
        assert_eq!(p.pending_input(), 1);
    }

    #[test]
    fn poll_without_input_is_false() {
        let mut p = ScriptedPlatform::new();
        let mut input = installed(&mut p);
        assert!(!input.poll_has_input(&mut p).unwrap());
    }

    #[test]
    fn poll_failure_still_restores() {
        let mut p = ScriptedPlatform::new().failing("poll_input");
        let mut input = installed(&mut p);
        assert!(input.poll_has_input(&mut p).is_err());
        assert_eq!(p.mode(), InputFlags::COOKED);
    }

    // ── Read ────────────────────────────────────────────────────────────

    #[test]
    fn read_ascii() {
        let mut p = ScriptedPlatform::new().with_input("qz");
        let mut input = installed(&mut p);
        assert_eq!(input.read_char(&mut p).unwrap(), 'q');
        assert_eq!(input.read_char(&mut p).unwrap(), 'z');
        assert_eq!(p.mode(), InputFlags::COOKED);
    }

    #[test]
    fn read_multibyte_utf8() {
        let mut p = ScriptedPlatform::new().with_input("é中🔥");
        let mut input = installed(&mut p);
        assert_eq!(input.read_char(&mut p).unwrap(), 'é');
        assert_eq!(input.read_char(&mut p).unwrap(), '中');
        assert_eq!(input.read_char(&mut p).unwrap(), '🔥');
    }

    #[test]
    fn read_invalid_lead_byte_is_replacement() {
        let mut p = ScriptedPlatform::new().with_input([0xFFu8, b'a']);
        let mut input = installed(&mut p);
        assert_eq!(input.read_char(&mut p).unwrap(), char::REPLACEMENT_CHARACTER);
        assert_eq!(input.read_char(&mut p).unwrap(), 'a');
    }

    #[test]
    fn read_bad_continuation_is_replacement() {
        let mut p = ScriptedPlatform::new().with_input([0xC3u8, b'(']);
        let mut input = installed(&mut p);
        assert_eq!(input.read_char(&mut p).unwrap(), char::REPLACEMENT_CHARACTER);
    }

    #[test]
    fn read_at_eof_is_end_of_input() {
        let mut p = ScriptedPlatform::new();
        let mut input = installed(&mut p);
        assert!(matches!(input.read_char(&mut p), Err(TermError::EndOfInput)));
        assert_eq!(p.mode(), InputFlags::COOKED);
    }

    #[test]
    fn mode_is_original_after_any_mix_of_operations() {
        let mut p = ScriptedPlatform::new().with_input("abc");
        let mut input = installed(&mut p);
        for _ in 0..3 {
            input.poll_has_input(&mut p).unwrap();
            assert_eq!(p.mode(), InputFlags::COOKED);
            input.read_char(&mut p).unwrap();
            assert_eq!(p.mode(), InputFlags::COOKED);
        }
        // Every raw install was paired with a restore.
        for pair in p.history().chunks(2) {
            assert_eq!(pair, &[InputFlags::empty(), InputFlags::COOKED]);
        }
    }

    #[test]
    fn utf8_len_table() {
        assert_eq!(utf8_len(b'a'), Some(1));
        assert_eq!(utf8_len(0xC3), Some(2));
        assert_eq!(utf8_len(0xE4), Some(3));
        assert_eq!(utf8_len(0xF0), Some(4));
        assert_eq!(utf8_len(0x80), None);
        assert_eq!(utf8_len(0xC0), None);
        assert_eq!(utf8_len(0xF8), None);
    }
}
