//! Running uncompressed-size budget for a single extraction.

use crate::Error;
use crate::Result;

/// Tracks bytes written against a fixed maximum.
///
/// Each file is checked twice: once with the size the archive declares, before
/// anything is written, and once with the number of bytes actually produced
/// by decompression.
#[derive(Debug, Clone, Copy)]
pub struct SizeBudget {
    max: u64,
    used: u64,
}

impl SizeBudget {
    /// Creates an empty budget.
    #[must_use]
    pub const fn new(max: u64) -> Self {
        Self { max, used: 0 }
    }

    /// Fails if adding `declared` bytes would exceed the maximum.
    pub fn check_declared(&self, declared: u64) -> Result<()> {
        let total = self.used.saturating_add(declared);
        if total > self.max {
            return Err(Error::SizeLimitExceeded {
                total,
                max: self.max,
            });
        }
        Ok(())
    }

    /// Bytes that may still be written.
    #[must_use]
    pub const fn remaining(&self) -> u64 {
        self.max.saturating_sub(self.used)
    }

    /// Records `written` bytes, failing if the total now exceeds the maximum.
    pub fn charge(&mut self, written: u64) -> Result<()> {
        self.used = self.used.saturating_add(written);
        if self.used > self.max {
            return Err(Error::SizeLimitExceeded {
                total: self.used,
                max: self.max,
            });
        }
        Ok(())
    }

    /// Bytes recorded so far.
    #[must_use]
    pub const fn used(&self) -> u64 {
        self.used
    }
}
