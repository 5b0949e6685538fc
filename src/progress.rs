//! Progress reporting utilities using indicatif.
//!
//! The upload engine reports through the [`ProgressCallback`] trait; the
//! [`Progress`] struct renders a single bar counting finished uploads.

use std::path::Path;
use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressStyle};

use crate::upload::UploadOutcome;

/// Progress callback for upload batches.
///
/// Implement this trait to receive progress updates while a batch of files
/// is being uploaded.
pub trait ProgressCallback: Send + Sync {
    /// Called once all metadata is resolved and uploads are about to start.
    ///
    /// # Arguments
    ///
    /// * `total` - Number of files in the batch
    fn on_batch_start(&self, total: usize);

    /// Called when a file reached a terminal state.
    ///
    /// # Arguments
    ///
    /// * `path` - The file
    /// * `outcome` - How its upload ended
    fn on_file_finished(&self, path: &Path, outcome: &UploadOutcome);

    /// Called when every file reached a terminal state.
    fn on_batch_end(&self) {}
}

/// Progress reporter using indicatif.
pub struct Progress {
    bar: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, no progress bar will be displayed.
    ///
    /// # Examples
    ///
    /// ```
    /// use pngx::progress::Progress;
    ///
    /// let progress = Progress::new(false);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            bar: Mutex::new(None),
            quiet,
        }
    }

    fn style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }

    fn bar(&self) -> std::sync::MutexGuard<'_, Option<ProgressBar>> {
        self.bar
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl ProgressCallback for Progress {
    fn on_batch_start(&self, total: usize) {
        if self.quiet {
            return;
        }

        let pb = ProgressBar::new(total as u64);
        pb.set_style(Self::style());
        pb.set_message("Uploading");
        *self.bar() = Some(pb);
    }

    fn on_file_finished(&self, path: &Path, outcome: &UploadOutcome) {
        if self.quiet {
            return;
        }

        if let Some(ref pb) = *self.bar() {
            pb.inc(1);
            let name = truncate_path(&path.to_string_lossy(), 30);
            match outcome {
                UploadOutcome::Uploaded(_) | UploadOutcome::Planned => pb.set_message(name),
                UploadOutcome::Failed(_) | UploadOutcome::Denied(_) => {
                    pb.set_message(format!("{name} (failed)"));
                }
            }
        }
    }

    fn on_batch_end(&self) {
        if self.quiet {
            return;
        }

        if let Some(pb) = self.bar().take() {
            pb.finish_with_message("Uploads complete");
        }
    }
}

/// Truncate a path for display in the progress bar.
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.len() <= max_len {
        return path.to_string();
    }

    let file_name = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    if file_name.len() >= max_len {
        let tail: String = file_name
            .chars()
            .rev()
            .take(max_len.saturating_sub(3))
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        return format!("...{tail}");
    }

    format!(".../{file_name}")
}
