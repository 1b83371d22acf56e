// SPDX-License-Identifier: MIT
//
// Terminal size probe with change detection.

use tracing::debug;

use crate::error::Result;
use crate::platform::Platform;

/// Terminal dimensions in character cells, plus whether they differ from
/// the previous probe result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConsoleSize {
    /// Number of columns.
    pub width: usize,
    /// Number of rows.
    pub height: usize,
    /// `true` if `width` or `height` differ from the last reported size.
    pub has_changed: bool,
}

impl ConsoleSize {
    /// Total number of cells (`width × height`).
    #[inline]
    #[must_use]
    pub const fn area(self) -> usize {
        self.width.saturating_mul(self.height)
    }
}

/// Remembers the last size it reported so each query can say whether
/// the terminal was resized.
///
/// A fresh probe remembers `(0, 0)`, so the first query of any real
/// terminal reports `has_changed = true`.
#[derive(Debug, Clone, Default)]
pub struct SizeProbe {
    width: usize,
    height: usize,
}

impl SizeProbe {
    #[must_use]
    pub const fn new() -> Self {
        Self { width: 0, height: 0 }
    }

    /// The remembered `(width, height)`.
    #[inline]
    #[must_use]
    pub const fn last_known(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Query the live size from `platform` and compare it with the last one.
    ///
    /// # Errors
    ///
    /// Returns [`TermError::Platform`](crate::error::TermError::Platform)
    /// if the size query fails. The remembered size is left untouched.
    pub fn current_size<P: Platform>(&mut self, platform: &mut P) -> Result<ConsoleSize> {
        let (width, height) = platform.query_size()?;
        Ok(self.observe(width, height))
    }

    /// Compare `(width, height)` with the remembered size, remembering it
    /// if it differs.
    pub fn observe(&mut self, width: usize, height: usize) -> ConsoleSize {
        let has_changed = width != self.width || height != self.height;
        if has_changed {
            debug!(
                from = ?(self.width, self.height),
                to = ?(width, height),
                "terminal resized"
            );
            self.width = width;
            self.height = height;
        }
        ConsoleSize {
            width,
            height,
            has_changed,
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::ScriptedPlatform;

    #[test]
    fn fresh_probe_remembers_zero() {
        assert_eq!(SizeProbe::new().last_known(), (0, 0));
    }

    #[test]
    fn first_nonzero_size_is_a_change() {
        let mut probe = SizeProbe::new();
        assert!(probe.observe(80, 24).has_changed);
    }

    #[test]
    fn zero_size_on_first_call_is_not_a_change() {
        let mut probe = SizeProbe::new();
        assert!(!probe.observe(0, 0).has_changed);
    }

    #[test]
    fn change_sequence() {
        let mut probe = SizeProbe::new();
        let flags: Vec<bool> = [(80, 24), (80, 24), (100, 30), (100, 30)]
            .into_iter()
            .map(|(w, h)| probe.observe(w, h).has_changed)
            .collect();
        assert_eq!(flags, [true, false, true, false]);
    }

    #[test]
    fn width_or_height_alone_counts() {
        let mut probe = SizeProbe::new();
        probe.observe(80, 24);
        assert!(probe.observe(81, 24).has_changed);
        assert!(probe.observe(81, 25).has_changed);
        assert_eq!(probe.last_known(), (81, 25));
    }

    #[test]
    fn reported_size_is_the_new_one() {
        let mut probe = SizeProbe::new();
        let s = probe.observe(120, 40);
        assert_eq!(
            s,
            ConsoleSize {
                width: 120,
                height: 40,
                has_changed: true
            }
        );
        assert_eq!(s.area(), 4800);
    }

    #[test]
    fn probes_are_independent() {
        let mut a = SizeProbe::new();
        let mut b = SizeProbe::new();
        a.observe(80, 24);
        assert!(b.observe(80, 24).has_changed);
    }

    #[test]
    fn current_size_queries_platform() {
        let mut p = ScriptedPlatform::new().with_sizes([(80, 24), (80, 24), (100, 30), (100, 30)]);
        let mut probe = SizeProbe::new();
        let flags: Vec<bool> = (0..4)
            .map(|_| probe.current_size(&mut p).unwrap().has_changed)
            .collect();
        assert_eq!(flags, [true, false, true, false]);
    }

    #[test]
    fn failed_query_keeps_memory() {
        let mut p = ScriptedPlatform::new().with_sizes([(80, 24)]);
        let mut probe = SizeProbe::new();
        probe.current_size(&mut p).unwrap();

        let mut broken = ScriptedPlatform::new().failing("query_size");
        assert!(probe.current_size(&mut broken).is_err());
        assert_eq!(probe.last_known(), (80, 24));
    }
}
