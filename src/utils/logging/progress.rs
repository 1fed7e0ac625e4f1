//! Progress reporting for the pipeline build
//!
//! Building a session reads the whole source file and fits the encoder, which
//! can take a few seconds on a full application table. The CLI shows a
//! spinner while it runs, using the indicatif crate.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Default style for a stage spinner
pub const DEFAULT_SPINNER_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] {msg}";

/// Create a spinner with a standardized style
///
/// # Arguments
/// * `message` - Initial message displayed next to the spinner
#[must_use]
pub fn create_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template(DEFAULT_SPINNER_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    spinner.set_style(style);
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Finish a spinner, leaving a final message in place
pub fn finish_spinner(spinner: &ProgressBar, message: &str) {
    spinner.finish_with_message(message.to_string());
}

/// Finish a spinner and remove it from the terminal
pub fn finish_and_clear(spinner: &ProgressBar) {
    spinner.finish_and_clear();
}
