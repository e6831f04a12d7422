//! Output functions for consistent CLI formatting

use console::style;

/// Display a success step
pub fn step_ok(message: &str) {
    eprintln!("{} {}", style("✓").green(), message);
}

/// Display a success step with a detail line
pub fn step_ok_detail(message: &str, detail: &str) {
    eprintln!("{} {}", style("✓").green(), message);
    eprintln!("  {}", style(detail).dim());
}

/// Display a warning step with a hint
pub fn step_warn_hint(message: &str, hint: &str) {
    eprintln!("{} {}", style("!").yellow(), message);
    eprintln!("  {}", style(hint).dim());
}

/// Display an informational step
pub fn step_info(message: &str) {
    eprintln!("{} {}", style("•").cyan(), message);
}
