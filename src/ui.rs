//! Terminal output helpers
//!
//! Fancy output (spinners, styling) is reserved for interactive terminals;
//! CI and piped output get plain lines.

use console::Term;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Where output is going and how dressed-up it may be.
#[derive(Debug, Clone, Copy)]
pub struct UiContext {
    fancy: bool,
}

impl UiContext {
    /// Detect from the environment: fancy only on a TTY outside CI.
    pub fn detect() -> Self {
        let is_tty = Term::stdout().is_term();
        let ci = std::env::var_os("CI").is_some();
        Self {
            fancy: is_tty && !ci,
        }
    }

    /// Force plain output.
    pub fn plain() -> Self {
        Self { fancy: false }
    }

    /// Whether spinners and styling are appropriate.
    pub fn use_fancy_output(&self) -> bool {
        self.fancy
    }
}

/// Spinner shown while the manifest prefetch runs.
///
/// Interactive terminals get an indicatif spinner; everything else gets a
/// plain line up front.
pub struct PrefetchProgress {
    spinner: Option<ProgressBar>,
}

impl PrefetchProgress {
    /// Start a spinner labelled with the generation being installed.
    pub fn new(ctx: &UiContext, label: &str) -> Self {
        let spinner = if ctx.use_fancy_output() {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::default_spinner()
                    .template("  {spinner:.cyan} Installing {prefix} {msg:.dim}  {elapsed:.dim}")
                    .unwrap()
                    .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "),
            );
            bar.set_prefix(label.to_string());
            bar.enable_steady_tick(Duration::from_millis(120));
            Some(bar)
        } else {
            println!("Installing {}...", label);
            None
        };
        Self { spinner }
    }

    /// Update the detail message next to the spinner.
    pub fn message(&self, message: &str) {
        if let Some(ref spinner) = self.spinner {
            spinner.set_message(message.to_string());
        }
    }

    /// Stop and clear the spinner.
    pub fn finish(&self) {
        if let Some(ref spinner) = self.spinner {
            spinner.disable_steady_tick();
            spinner.finish_and_clear();
        }
    }
}
