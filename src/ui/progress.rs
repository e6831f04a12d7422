//! Download progress with CI fallback

use super::context::UiContext;
use indicatif::{ProgressBar, ProgressStyle};
use url::Url;

/// Progress bar over a batch of downloads.
///
/// Shows an indicatif bar in interactive mode and stays silent otherwise;
/// per-URL progress is also logged through tracing.
pub struct DownloadProgress {
    bar: Option<ProgressBar>,
}

impl DownloadProgress {
    /// Create a progress indicator for `total` downloads
    pub fn new(ctx: &UiContext, total: u64) -> Self {
        if !ctx.use_fancy_output() || total == 0 {
            return Self::hidden();
        }

        let bar = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("  {spinner:.cyan} Downloading {bar:20.cyan/dim} {pos}/{len} {msg:.dim}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
            .progress_chars("━╸─");
        bar.set_style(style);
        bar.enable_steady_tick(std::time::Duration::from_millis(120));
        Self { bar: Some(bar) }
    }

    /// A progress indicator that never draws
    pub fn hidden() -> Self {
        Self { bar: None }
    }

    /// Show which URL is being fetched
    pub fn start(&self, url: &Url) {
        if let Some(ref bar) = self.bar {
            bar.set_message(shorten(url.as_str(), 60));
        }
    }

    /// Mark one URL as done
    pub fn advance(&self) {
        if let Some(ref bar) = self.bar {
            bar.inc(1);
        }
    }

    /// Finish and clear the progress bar
    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.disable_steady_tick();
            bar.finish_and_clear();
        }
    }
}

impl Drop for DownloadProgress {
    fn drop(&mut self) {
        self.finish();
    }
}

/// Keep the tail of long URLs, which carries the file name
fn shorten(text: &str, max: usize) -> String {
    let count = text.chars().count();
    if count <= max {
        return text.to_string();
    }
    let tail: String = text.chars().skip(count - (max - 3)).collect();
    format!("...{}", tail)
}
