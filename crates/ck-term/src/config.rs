// SPDX-License-Identifier: MIT
//
// Session configuration — frame buffer sizing.
//
// Two knobs control how the frame buffer grows: the capacity it starts
// with and the fixed step it grows by. Both default to 100 bytes. They
// can be set programmatically or read from the environment:
//
//   CK_ALLOC_SIZE        sets both values at once
//   CK_INITIAL_CAPACITY  overrides the starting capacity
//   CK_GROWTH_INCREMENT  overrides the growth step
//
// Zero is rejected for either value: a zero capacity cannot hold the
// reserved terminator slot, and a zero increment would never grow.

use std::env;

use crate::error::{Result, TermError};

/// Default starting capacity and growth step, in bytes.
pub const DEFAULT_ALLOC_SIZE: usize = 100;

/// Environment variable setting both capacity and increment.
pub const ENV_ALLOC_SIZE: &str = "CK_ALLOC_SIZE";
/// Environment variable overriding the starting capacity.
pub const ENV_INITIAL_CAPACITY: &str = "CK_INITIAL_CAPACITY";
/// Environment variable overriding the growth step.
pub const ENV_GROWTH_INCREMENT: &str = "CK_GROWTH_INCREMENT";

/// Frame buffer sizing for a [`Session`](crate::session::Session).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Capacity allocated when the session starts.
    pub initial_capacity: usize,
    /// Fixed step added to the capacity each time the buffer grows.
    pub growth_increment: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_ALLOC_SIZE,
            growth_increment: DEFAULT_ALLOC_SIZE,
        }
    }
}

impl Config {
    #[must_use]
    pub const fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    #[must_use]
    pub const fn with_growth_increment(mut self, increment: usize) -> Self {
        self.growth_increment = increment;
        self
    }

    /// Check that both values are usable.
    ///
    /// # Errors
    ///
    /// Returns [`TermError::InvalidConfig`] if either value is zero.
    pub fn validate(&self) -> Result<()> {
        if self.initial_capacity == 0 {
            return Err(TermError::InvalidConfig(
                "initial capacity must be greater than zero".into(),
            ));
        }
        if self.growth_increment == 0 {
            return Err(TermError::InvalidConfig(
                "growth increment must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Build a configuration from the process environment.
    ///
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`TermError::InvalidConfig`] if a variable is set but is
    /// not a positive integer.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    ///
    /// [`from_env`](Self::from_env) is this with `std::env::var`; tests
    /// pass a closure over a fixed table instead of mutating the process
    /// environment.
    ///
    /// # Errors
    ///
    /// Same as [`from_env`](Self::from_env).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(size) = parse_var(&lookup, ENV_ALLOC_SIZE)? {
            config.initial_capacity = size;
            config.growth_increment = size;
        }
        if let Some(capacity) = parse_var(&lookup, ENV_INITIAL_CAPACITY)? {
            config.initial_capacity = capacity;
        }
        if let Some(increment) = parse_var(&lookup, ENV_GROWTH_INCREMENT)? {
            config.growth_increment = increment;
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_var(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<usize>> {
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<usize>()
        .map(Some)
        .map_err(|e| TermError::InvalidConfig(format!("{key}={raw:?}: {e}")))
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn table<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v).to_string())
        }
    }

    #[test]
    fn default_matches_alloc_size() {
        let c = Config::default();
        assert_eq!(c.initial_capacity, 100);
        assert_eq!(c.growth_increment, 100);
        c.validate().unwrap();
    }

    #[test]
    fn builders_set_fields() {
        let c = Config::default()
            .with_initial_capacity(8)
            .with_growth_increment(4);
        assert_eq!(c, Config { initial_capacity: 8, growth_increment: 4 });
    }

    #[test]
    fn zero_increment_rejected() {
        let err = Config::default().with_growth_increment(0).validate();
        assert!(matches!(err, Err(TermError::InvalidConfig(_))));
    }

    #[test]
    fn zero_capacity_rejected() {
        let err = Config::default().with_initial_capacity(0).validate();
        assert!(matches!(err, Err(TermError::InvalidConfig(_))));
    }

    // ── Environment ─────────────────────────────────────────────────────

    #[test]
    fn empty_lookup_gives_default() {
        let c = Config::from_lookup(table(&[])).unwrap();
        assert_eq!(c, Config::default());
    }

    #[test]
    fn alloc_size_sets_both() {
        let c = Config::from_lookup(table(&[("CK_ALLOC_SIZE", "256")])).unwrap();
        assert_eq!(c.initial_capacity, 256);
        assert_eq!(c.growth_increment, 256);
    }

    #[test]
    fn specific_vars_override_alloc_size() {
        let c = Config::from_lookup(table(&[
            ("CK_ALLOC_SIZE", "256"),
            ("CK_GROWTH_INCREMENT", "32"),
        ]))
        .unwrap();
        assert_eq!(c.initial_capacity, 256);
        assert_eq!(c.growth_increment, 32);
    }

    #[test]
    fn whitespace_is_trimmed() {
        let c = Config::from_lookup(table(&[("CK_INITIAL_CAPACITY", " 64 ")])).unwrap();
        assert_eq!(c.initial_capacity, 64);
    }

    #[test]
    fn garbage_value_rejected() {
        let err = Config::from_lookup(table(&[("CK_GROWTH_INCREMENT", "lots")])).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("CK_GROWTH_INCREMENT"), "{msg}");
    }

    #[test]
    fn zero_from_env_rejected() {
        assert!(Config::from_lookup(table(&[("CK_ALLOC_SIZE", "0")])).is_err());
    }
}
