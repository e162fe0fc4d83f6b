//! Progress tracking for long per-author loops.
//!
//! # Usage
//!
//! ```rust,no_run
//! use agetech_kb::utils::StageProgress;
//!
//! let progress = StageProgress::new("Affiliations", 100, true);
//! for _ in 0..100 {
//!     // Do some work...
//!     progress.inc();
//! }
//! progress.finish();
//! ```

use indicatif::{ProgressBar, ProgressStyle};

const TEMPLATE: &str = "{msg}: {bar:40.cyan/blue} {pos}/{len} ({percent}%) {elapsed_precise}";

/// Progress bar for one pipeline stage; draws nothing when hidden
#[derive(Debug, Clone)]
pub struct StageProgress {
    bar: ProgressBar,
}

impl StageProgress {
    /// Create a bar of `total` units, drawn only if `visible`
    pub fn new(label: &str, total: usize, visible: bool) -> Self {
        let bar = if visible {
            ProgressBar::new(total as u64)
        } else {
            ProgressBar::hidden()
        };
        bar.set_style(
            ProgressStyle::with_template(TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓▒░ "),
        );
        bar.set_message(label.to_string());
        Self { bar }
    }

    /// A bar that never draws
    pub fn hidden() -> Self {
        Self::new("", 0, false)
    }

    pub fn inc(&self) {
        self.bar.inc(1);
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
