//! Progress reporting utilities

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinners for the load, compare and export stages of one command
#[derive(Debug)]
pub struct ProgressReporter {
    pub load_pb: Option<ProgressBar>,
    pub compare_pb: Option<ProgressBar>,
    pub export_pb: Option<ProgressBar>,
    show_progress: bool,
}

impl ProgressReporter {
    /// Create progress reporter for a comparison; loading starts immediately
    pub fn new_for_compare() -> Self {
        Self {
            load_pb: Some(create_spinner("Loading tables...")),
            compare_pb: None,
            export_pb: None,
            show_progress: true,
        }
    }

    /// Create minimal progress reporter (no progress bars), used for JSON output
    pub fn new_minimal() -> Self {
        Self {
            load_pb: None,
            compare_pb: None,
            export_pb: None,
            show_progress: false,
        }
    }

    pub fn new(show_progress: bool) -> Self {
        if show_progress {
            Self::new_for_compare()
        } else {
            Self::new_minimal()
        }
    }

    pub fn update_load(&mut self, message: &str) {
        if let Some(pb) = &self.load_pb {
            pb.set_message(message.to_string());
        }
    }

    /// Finish loading and start the comparison spinner
    pub fn finish_load(&mut self, message: &str) {
        if let Some(pb) = self.load_pb.take() {
            pb.finish_with_message(message.to_string());
        }
        if self.show_progress && self.compare_pb.is_none() {
            self.compare_pb = Some(create_spinner("Comparing rows..."));
        }
    }

    pub fn finish_compare(&mut self, message: &str) {
        if let Some(pb) = self.compare_pb.take() {
            pb.finish_with_message(message.to_string());
        }
    }

    /// Lazily create the export spinner
    pub fn start_export(&mut self, message: &str) {
        if self.show_progress && self.export_pb.is_none() {
            self.export_pb = Some(create_spinner(message));
        }
    }

    pub fn finish_export(&mut self, message: &str) {
        if let Some(pb) = self.export_pb.take() {
            pb.finish_with_message(message.to_string());
        }
    }

    /// Clear every spinner without a message, so rendered output starts on a clean line
    pub fn clear(&mut self) {
        for pb in [
            self.load_pb.take(),
            self.compare_pb.take(),
            self.export_pb.take(),
        ]
        .into_iter()
        .flatten()
        {
            pb.finish_and_clear();
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        self.clear();
    }
}

/// Create a spinner progress bar
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
