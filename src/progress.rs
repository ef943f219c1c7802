use colored::*;
use std::path::Path;
use tracing::{error, info};

use crate::error::Error;

/// Receives run progress from the downloader.
pub trait Progress: Send + Sync {
    fn chapters_found(&self, _total: usize, _selected: usize) {}

    fn chapter_added(&self, title: &str, pages: usize);

    fn chapter_failed(&self, title: &str, error: &Error);

    fn done(&self, output: &Path);
}

/// Writes progress to the tracing subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl Progress for TracingProgress {
    fn chapters_found(&self, total: usize, selected: usize) {
        info!("Found {} chapters, saving {}", total, selected.to_string().green());
    }

    fn chapter_added(&self, title: &str, pages: usize) {
        info!("Chapter '{}' added ({} pages)", title.green(), pages);
    }

    fn chapter_failed(&self, title: &str, error: &Error) {
        error!("Fail to add chapter {}: {}", title.red(), error);
    }

    fn done(&self, output: &Path) {
        info!("Saved {}", output.display().to_string().blue());
        info!("Done");
    }
}
