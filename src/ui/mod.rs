//! Terminal output: progress bars and status lines
//!
//! Fancy output is used only on an interactive terminal; in CI or when
//! stderr is redirected everything degrades to plain lines or silence.

mod context;
mod output;
mod progress;

pub use context::UiContext;
pub use output::{step_info, step_ok, step_ok_detail, step_warn_hint};
pub use progress::DownloadProgress;
