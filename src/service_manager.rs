//! Service manager adapter
//!
//! `ServiceManagerClient` is the narrow, typed seam between the reconciler and
//! `systemctl`. Queries are read-only and never elevated; mutations go through
//! `sudo` when not running as root.

use crate::command_executor::{elevated, execute, CommandOutput, CommandRunner, Mode};
use crate::error::{Result, SnapMenuError};
use crate::normalizer::{parse_service_active, parse_service_enabled};
use crate::types::{EnabledState, ServiceState, UnitAction};
use tracing::debug;

/// Typed operations against the system service manager.
pub trait ServiceManagerClient {
    /// Whether the service manager binary itself is installed.
    fn is_available(&self) -> bool;

    /// Whether `unit` is running. Errors when the state cannot be determined.
    fn is_active(&self, unit: &str) -> Result<bool>;

    /// Enablement of `unit`. Query failures yield `EnabledState::Unknown`.
    fn enabled_state(&self, unit: &str) -> EnabledState;

    /// Issue a mutating verb. `unit` is ignored for `DaemonReload`.
    fn apply(&self, action: UnitAction, unit: &str, mode: Mode) -> Result<CommandOutput>;

    /// Fresh snapshot of `unit`. Never mutates and never fails.
    fn state(&self, unit: &str) -> ServiceState {
        let active = match self.is_active(unit) {
            Ok(active) => Some(active),
            Err(e) => {
                debug!("is-active query for {} failed: {}", unit, e);
                None
            }
        };
        ServiceState {
            active,
            enabled: self.enabled_state(unit),
        }
    }
}

/// `systemctl`-backed client.
pub struct SystemctlClient<R: CommandRunner> {
    runner: R,
    program: String,
    elevate: bool,
}

impl<R: CommandRunner> SystemctlClient<R> {
    pub fn new(runner: R, program: impl Into<String>, elevate: bool) -> Self {
        Self {
            runner,
            program: program.into(),
            elevate,
        }
    }
}

impl<R: CommandRunner> ServiceManagerClient for SystemctlClient<R> {
    fn is_available(&self) -> bool {
        self.runner.binary_exists(&self.program)
    }

    fn is_active(&self, unit: &str) -> Result<bool> {
        // Non-zero exit just means "not active"; only missing output is a failure.
        let out = self.runner.run(&self.program, &["is-active", unit]);
        parse_service_active(&out.stdout).ok_or_else(|| {
            SnapMenuError::query(format!(
                "cannot determine whether {} is active: {}",
                unit,
                out.diagnostic()
            ))
        })
    }

    fn enabled_state(&self, unit: &str) -> EnabledState {
        let out = self.runner.run(&self.program, &["is-enabled", unit]);
        parse_service_enabled(&out.stdout)
    }

    fn apply(&self, action: UnitAction, unit: &str, mode: Mode) -> Result<CommandOutput> {
        let mut args = vec![action.as_str()];
        if action.takes_unit() {
            args.push(unit);
        }
        let (program, argv) = elevated(self.elevate, &self.program, &args);
        execute(&self.runner, mode, program, &argv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Scripted {
        calls: RefCell<Vec<String>>,
    }

    impl CommandRunner for Scripted {
        fn run(&self, program: &str, args: &[&str]) -> CommandOutput {
            self.calls
                .borrow_mut()
                .push(format!("{} {}", program, args.join(" ")));
            match args.first().copied() {
                Some("is-active") => exited(3, "inactive\n"),
                Some("is-enabled") => exited(1, "masked\n"),
                _ => CommandOutput::ok(""),
            }
        }
    }

    fn exited(code: i32, stdout: &str) -> CommandOutput {
        CommandOutput {
            stdout: stdout.to_string(),
            stderr: String::new(),
            exit_code: Some(code),
        }
    }

    #[test]
    fn test_non_zero_is_active_is_inactive_not_failure() {
        let client = SystemctlClient::new(Scripted::default(), "systemctl", false);
        assert!(!client.is_active("snapd.socket").unwrap());
        assert_eq!(client.enabled_state("snapd.socket"), EnabledState::Masked);
    }

    #[test]
    fn test_state_query_issues_no_mutations() {
        let client = SystemctlClient::new(Scripted::default(), "systemctl", true);
        let state = client.state("snapd.service");
        assert_eq!(state.active, Some(false));
        let calls = client.runner.calls.borrow();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|c| c.starts_with("systemctl is-")));
    }

    #[test]
    fn test_mutation_is_elevated() {
        let client = SystemctlClient::new(Scripted::default(), "systemctl", true);
        client
            .apply(UnitAction::Enable, "snapd.socket", Mode::Significant)
            .unwrap();
        client
            .apply(UnitAction::DaemonReload, "snapd.socket", Mode::BestEffort)
            .unwrap();
        let calls = client.runner.calls.borrow();
        assert_eq!(calls[0], "sudo systemctl enable snapd.socket");
        assert_eq!(calls[1], "sudo systemctl daemon-reload");
    }
}
