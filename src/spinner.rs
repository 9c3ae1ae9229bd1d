//! Progress indicator around blocking calls
//!
//! `Spinner` is a scope guard: the indicator starts when it is created and is
//! cleared when it is dropped, so every exit path of the decorated call
//! (success, error return, unwinding) restores normal output.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

pub struct Spinner {
    bar: ProgressBar,
}

impl Spinner {
    /// Start a spinner on stderr. Hidden when `enabled` is false.
    pub fn start(message: &str, enabled: bool) -> Self {
        let bar = if enabled {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {wide_msg}") {
            bar.set_style(style);
        }
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}

/// Run `f` with a spinner showing `message` for its whole duration.
pub fn with_spinner<T>(message: &str, enabled: bool, f: impl FnOnce() -> T) -> T {
    let _spinner = Spinner::start(message, enabled);
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spinner_returns_closure_value() {
        let value = with_spinner("Searching...", false, || 42);
        assert_eq!(value, 42);
    }

    #[test]
    fn test_spinner_stops_on_error_path() {
        let result: Result<(), &str> = with_spinner("Installing...", false, || Err("denied"));
        assert_eq!(result, Err("denied"));
    }

    #[test]
    fn test_spinner_cleared_on_drop() {
        let spinner = Spinner::start("Working...", false);
        let bar = spinner.bar.clone();
        assert!(!bar.is_finished());
        drop(spinner);
        assert!(bar.is_finished());
    }
}
