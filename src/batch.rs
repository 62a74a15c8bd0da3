
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

use itertools::Itertools;
use log::error;

/// One item of a batch that could not be processed.
#[derive(Debug, Clone, PartialEq)]
pub struct FailedItem {
    pub path: PathBuf,
    pub error: String,
}

/// Result of an operation that keeps going when a single file fails.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchOutcome {
    pub processed: usize,
    pub failed_items: Vec<FailedItem>,
}

impl BatchOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success(&self) -> bool {
        self.failed_items.is_empty()
    }

    pub fn record_success(&mut self) {
        self.processed += 1;
    }

    /// Logs the failure and keeps it for the caller.
    pub fn record_failure(&mut self, path: &Path, error: impl Display) {
        error!("{:?} failed\n -> {}", path, error);
        self.failed_items.push(FailedItem {
            path: path.to_path_buf(),
            error: error.to_string(),
        });
    }

    pub fn merge(&mut self, other: BatchOutcome) {
        self.processed += other.processed;
        self.failed_items.extend(other.failed_items);
    }
}

impl Display for BatchOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.success() {
            write!(f, "{} item(s) processed", self.processed)
        } else {
            write!(f, "{} item(s) processed, {} failed:\n  {}",
                self.processed,
                self.failed_items.len(),
                self.failed_items.iter().map(|item| format!("{:?}: {}", item.path, item.error)).join("\n  "),
            )
        }
    }
}
