//! Save bookkeeping.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::{Error, Result};

/// Summary of a completed save.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveResult {
    /// Chunks that held edits and were written back.
    pub chunks_written: usize,
    /// Chunks left untouched because no edit fell inside them.
    pub chunks_skipped: usize,
    /// Bytes written to the file.
    pub bytes_written: u64,
    /// Distinct offsets whose pending value was persisted.
    pub edits_applied: usize,
    /// Overlay entries still pending after the save, for edits that lie past
    /// the current end of the file.
    pub edits_remaining: usize,
    /// Wall-clock duration of the save.
    pub duration: Duration,
}

impl SaveResult {
    /// Returns true if nothing had to be written.
    pub fn is_noop(&self) -> bool {
        self.chunks_written == 0
    }
}

/// Holds a view's saving flag for the lifetime of a save.
///
/// The flag is cleared on drop, so an error return still releases it.
#[derive(Debug)]
pub(crate) struct SaveGuard {
    flag: Arc<AtomicBool>,
}

impl SaveGuard {
    /// Sets the flag, failing if another save already holds it.
    pub(crate) fn acquire(flag: &Arc<AtomicBool>) -> Result<Self> {
        if flag
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Error::AlreadySaving);
        }
        Ok(Self {
            flag: Arc::clone(flag),
        })
    }
}

impl Drop for SaveGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
