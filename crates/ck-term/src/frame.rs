// SPDX-License-Identifier: MIT
//
// FrameBuffer — everything that will be drawn this frame.
//
// Text and escape sequences accumulate in memory so the whole frame can
// reach the terminal in a single write() call. Nothing is written until
// `flush`, which prefixes the cursor-home sequence, writes the lot, and
// resets the content while keeping the allocation for the next frame.
//
// Capacity accounting:
//
//   The buffer tracks a logical `capacity` separate from whatever the
//   allocator hands back. One byte of it is always reserved (the slot a
//   C string would spend on its terminator), so `len() < capacity()`
//   holds after every operation. When an append would not leave that
//   slot free, capacity grows by a fixed increment, repeatedly, until it
//   does. It never shrinks. A buffer created with capacity 1 has no free
//   slot at all, so even an empty append grows it once. After any sequence of appends the capacity is
//   therefore `initial + k * increment` for the smallest `k` that fits.
//
// Storage layout:
//
//   [ ESC [ H | content ... ]
//    ^^^^^^^^^
//    permanent home prefix, not counted in len() or capacity()
//
// Keeping the prefix in the same Vec is what makes flush a single write
// without copying the frame.

use std::io::{self, Write};

use tracing::debug;

use crate::ansi::CURSOR_HOME;
use crate::config::Config;
use crate::error::{Result, TermError};

const HOME: &[u8] = CURSOR_HOME.as_bytes();

/// Append-only frame buffer with amortized fixed-step growth.
pub struct FrameBuffer {
    /// Home prefix followed by the frame content.
    buf: Vec<u8>,
    /// Logical capacity of the content region.
    capacity: usize,
    /// Fixed growth step.
    increment: usize,
}

impl FrameBuffer {
    /// Allocate a buffer sized by `config`.
    ///
    /// # Errors
    ///
    /// [`TermError::InvalidConfig`] if `config` has a zero value,
    /// [`TermError::OutOfMemory`] if the initial allocation fails.
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;

        let mut buf = Vec::new();
        let requested = HOME.len() + config.initial_capacity;
        buf.try_reserve_exact(requested)
            .map_err(|_| TermError::OutOfMemory { requested })?;
        buf.extend_from_slice(HOME);

        Ok(Self {
            buf,
            capacity: config.initial_capacity,
            increment: config.growth_increment,
        })
    }

    /// Content length in bytes (the home prefix is not counted).
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len() - HOME.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Logical capacity of the content region. Only ever grows.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// The fixed step capacity grows by.
    #[inline]
    #[must_use]
    pub const fn increment(&self) -> usize {
        self.increment
    }

    /// The accumulated content, without the home prefix.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[HOME.len()..]
    }

    /// Append text to the frame.
    ///
    /// # Errors
    ///
    /// [`TermError::OutOfMemory`] if growing fails. The buffer is left
    /// exactly as it was before the call.
    pub fn append(&mut self, text: &str) -> Result<()> {
        self.append_bytes(text.as_bytes())
    }

    /// Append raw bytes to the frame. Same contract as [`append`](Self::append).
    ///
    /// # Errors
    ///
    /// [`TermError::OutOfMemory`] if growing fails.
    pub fn append_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.reserve_for(bytes.len())?;
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    /// Make room for `additional` more content bytes plus the reserved slot.
    fn reserve_for(&mut self, additional: usize) -> Result<()> {
        let overflow = || TermError::OutOfMemory { requested: usize::MAX };

        let needed = self
            .len()
            .checked_add(additional)
            .and_then(|n| n.checked_add(1))
            .ok_or_else(overflow)?;
        if needed < self.capacity {
            return Ok(());
        }

        // Smallest k with capacity + k * increment > needed.
        let steps = (needed - self.capacity) / self.increment + 1;
        let new_capacity = steps
            .checked_mul(self.increment)
            .and_then(|grow| self.capacity.checked_add(grow))
            .ok_or_else(overflow)?;

        let requested = HOME.len() + new_capacity;
        self.buf
            .try_reserve_exact(requested - self.buf.len())
            .map_err(|_| TermError::OutOfMemory { requested })?;

        debug!(from = self.capacity, to = new_capacity, "frame buffer grown");
        self.capacity = new_capacity;
        Ok(())
    }

    /// Drop the content without writing it. Capacity is kept.
    #[inline]
    pub fn clear(&mut self) {
        self.buf.truncate(HOME.len());
    }

    /// Write cursor-home plus the content to `w` in one `write_all`, then clear.
    ///
    /// An empty frame still writes the home prefix. `w` should be
    /// unbuffered (see [`NativeOutput`](crate::platform::NativeOutput)): a
    /// line-buffered writer such as `io::Stdout` forwards a frame that
    /// contains `\n` in two pieces.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `w` fails. The content is kept in
    /// that case so the caller can retry.
    pub fn flush_to(&mut self, w: &mut impl Write) -> io::Result<()> {
        w.write_all(&self.buf)?;
        w.flush()?;
        self.clear();
        Ok(())
    }
}

impl Write for FrameBuffer {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.append_bytes(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        // Frames reach the terminal through flush_to() only.
        Ok(())
    }
}

impl std::fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .field("increment", &self.increment)
            .finish_non_exhaustive()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
