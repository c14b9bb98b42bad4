//! Callbacks for UI collaborators.

use super::save::SaveResult;

/// Receives notifications about a [`View`](super::View)'s window and saves.
///
/// All methods have no-op defaults; implement only what you need.
///
/// # Example
///
/// ```rust
/// use hexlay::ViewObserver;
///
/// struct Redraw {
///     dirty: bool,
/// }
///
/// impl ViewObserver for Redraw {
///     fn on_unloaded(&mut self) {
///         self.dirty = true;
///     }
/// }
/// ```
pub trait ViewObserver: Send {
    /// Called after the window was (re)loaded from the file.
    fn on_loaded(&mut self, position: u64, len: usize) {
        let _ = (position, len);
    }

    /// Called when the window no longer reflects the current position,
    /// length or pending edits.
    fn on_unloaded(&mut self) {}

    /// Called after each chunk of a save, whether written or skipped.
    fn on_save_progress(&mut self, bytes_processed: u64, total_bytes: u64) {
        let _ = (bytes_processed, total_bytes);
    }

    /// Called once a save completed successfully.
    fn on_saved(&mut self, result: &SaveResult) {
        let _ = result;
    }
}

/// Observer that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoObserver;

impl ViewObserver for NoObserver {}
