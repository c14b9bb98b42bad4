//! Save progress bar.

use std::time::Duration;

use hexlay::{SaveResult, ViewObserver};
use indicatif::{ProgressBar, ProgressStyle};

/// Drives a byte progress bar from a view's save notifications.
pub struct SaveProgress {
    bar: ProgressBar,
}

impl SaveProgress {
    /// Creates a bar for a file of `total_bytes`, hidden when `quiet`.
    pub fn new(total_bytes: u64, quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            let pb = ProgressBar::new(total_bytes);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        };
        Self { bar }
    }

    /// Returns a handle to the underlying bar.
    pub fn bar(&self) -> ProgressBar {
        self.bar.clone()
    }
}

impl ViewObserver for SaveProgress {
    fn on_save_progress(&mut self, bytes_processed: u64, total_bytes: u64) {
        self.bar.set_length(total_bytes);
        self.bar.set_position(bytes_processed);
    }

    fn on_saved(&mut self, result: &SaveResult) {
        self.bar.finish_with_message(format!(
            "{} edits in {} chunks",
            result.edits_applied, result.chunks_written
        ));
    }
}
