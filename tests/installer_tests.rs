//! Tests for first-run setup
//!
//! These tests verify:
//! - snapd is installed through the detected package manager only when missing
//! - bootstrap turns every configured service ON afterwards
//! - a failed dependency install leaves services untouched
//! - the launcher is overwritten in place with mode 0755

use snapmenu::command_executor::{check, CommandOutput, CommandRunner, Mode};
use snapmenu::installer::{bootstrap, DependencyStatus, Installer, LauncherStatus, OsPackageManager};
use snapmenu::reconciler::ServiceReconciler;
use snapmenu::service_manager::ServiceManagerClient;
use snapmenu::types::{EnabledState, ServiceDescriptor, UnitAction};
use snapmenu::{Result, SnapMenuError};
use std::cell::RefCell;
use std::fs;
use std::os::unix::fs::PermissionsExt;

/// A host with a fixed set of binaries on PATH.
struct FakeHost {
    binaries: RefCell<Vec<String>>,
    calls: RefCell<Vec<String>>,
    install_fails: bool,
}

impl FakeHost {
    fn new(binaries: &[&str]) -> Self {
        Self {
            binaries: RefCell::new(binaries.iter().map(|b| b.to_string()).collect()),
            calls: RefCell::new(Vec::new()),
            install_fails: false,
        }
    }
}

impl CommandRunner for FakeHost {
    fn run(&self, program: &str, args: &[&str]) -> CommandOutput {
        self.calls
            .borrow_mut()
            .push(format!("{} {}", program, args.join(" ")));
        if args.contains(&"snapd") {
            if self.install_fails {
                return CommandOutput::failed(1, "E: Could not get lock /var/lib/dpkg/lock");
            }
            self.binaries.borrow_mut().push("snap".to_string());
        }
        CommandOutput::ok("")
    }

    fn binary_exists(&self, program: &str) -> bool {
        self.binaries.borrow().iter().any(|b| b == program)
    }
}

/// Every unit starts stopped and disabled.
#[derive(Default)]
struct StoppedUnits {
    enabled: RefCell<Vec<String>>,
    started: RefCell<Vec<String>>,
}

impl ServiceManagerClient for StoppedUnits {
    fn is_available(&self) -> bool {
        true
    }

    fn is_active(&self, unit: &str) -> Result<bool> {
        Ok(self.started.borrow().iter().any(|u| u == unit))
    }

    fn enabled_state(&self, unit: &str) -> EnabledState {
        if self.enabled.borrow().iter().any(|u| u == unit) {
            EnabledState::Enabled
        } else {
            EnabledState::Disabled
        }
    }

    fn apply(&self, action: UnitAction, unit: &str, mode: Mode) -> Result<CommandOutput> {
        match action {
            UnitAction::Enable => self.enabled.borrow_mut().push(unit.to_string()),
            UnitAction::Start => self.started.borrow_mut().push(unit.to_string()),
            _ => {}
        }
        check(CommandOutput::ok(""), mode, "systemctl", &[action.as_str(), unit])
    }
}

fn services() -> Vec<ServiceDescriptor> {
    vec![
        ServiceDescriptor::new("snapd.service"),
        ServiceDescriptor::new("snapd.socket"),
    ]
}

// =============================================================================
// Bootstrap
// =============================================================================

#[test]
fn test_bootstrap_installs_snapd_then_turns_services_on() {
    let host = FakeHost::new(&["apt-get", "dnf"]);
    let installer = Installer::new(&host, true, "snap");
    let reconciler = ServiceReconciler::new(StoppedUnits::default(), services());

    let report = bootstrap(&installer, &reconciler).unwrap();

    assert_eq!(report.dependency, DependencyStatus::Installed(OsPackageManager::Apt));
    assert!(report.succeeded());
    assert_eq!(report.services.len(), 2);
    assert_eq!(host.calls.borrow()[0], "sudo apt-get install -y snapd");
    assert!(reconciler.status_all().iter().all(|(_, s)| s.is_active()));
}

#[test]
fn test_bootstrap_with_snap_present_skips_install() {
    let host = FakeHost::new(&["snap", "apt-get"]);
    let installer = Installer::new(&host, false, "snap");
    let reconciler = ServiceReconciler::new(StoppedUnits::default(), services());

    let report = bootstrap(&installer, &reconciler).unwrap();

    assert_eq!(report.dependency, DependencyStatus::AlreadyPresent);
    assert!(host.calls.borrow().is_empty());
}

#[test]
fn test_failed_dependency_install_leaves_services_alone() {
    let mut host = FakeHost::new(&["apt-get"]);
    host.install_fails = true;
    let installer = Installer::new(&host, false, "snap");
    let reconciler = ServiceReconciler::new(StoppedUnits::default(), services());

    let err = bootstrap(&installer, &reconciler).unwrap_err();

    assert!(matches!(err, SnapMenuError::CommandFailed { .. }));
    assert_eq!(err.diagnostic(), "E: Could not get lock /var/lib/dpkg/lock");
    assert!(reconciler.client().enabled.borrow().is_empty());
}

#[test]
fn test_yum_install_links_snap_directory() {
    let host = FakeHost::new(&["yum"]);
    let installer = Installer::new(&host, false, "snap");

    let status = installer.ensure_package_tool().unwrap();

    assert_eq!(status, DependencyStatus::Installed(OsPackageManager::Yum));
    let calls = host.calls.borrow();
    assert_eq!(calls[0], "yum install -y snapd");
    assert_eq!(calls[1], "ln -sfn /var/lib/snapd/snap /snap");
}

#[test]
fn test_zypper_runs_non_interactive() {
    let host = FakeHost::new(&["zypper"]);
    let installer = Installer::new(&host, false, "snap");

    installer.ensure_package_tool().unwrap();

    assert_eq!(host.calls.borrow()[0], "zypper --non-interactive install snapd");
}

#[test]
fn test_no_package_manager_is_unsupported() {
    let host = FakeHost::new(&[]);
    let installer = Installer::new(&host, false, "snap");

    let err = installer.ensure_package_tool().unwrap_err();
    assert!(matches!(err, SnapMenuError::UnsupportedPackageManager(_)));
}

// =============================================================================
// Launcher
// =============================================================================

#[test]
fn test_launcher_install_creates_executable() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("snapmenu-build");
    let target = dir.path().join("snapmenu");
    fs::write(&source, b"#!/bin/sh\necho v2\n").unwrap();

    let host = FakeHost::new(&[]);
    let installer = Installer::new(&host, false, "snap");
    let status = installer.install_launcher(&source, &target).unwrap();

    assert_eq!(status, LauncherStatus::Installed(target.clone()));
    assert_eq!(fs::read(&target).unwrap(), b"#!/bin/sh\necho v2\n");
    assert_eq!(
        fs::metadata(&target).unwrap().permissions().mode() & 0o777,
        0o755
    );
}

#[test]
fn test_launcher_update_overwrites_previous_version() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("snapmenu-build");
    let target = dir.path().join("snapmenu");
    fs::write(&target, b"old version with more bytes than the new one").unwrap();
    fs::set_permissions(&target, fs::Permissions::from_mode(0o600)).unwrap();
    fs::write(&source, b"new").unwrap();

    let host = FakeHost::new(&[]);
    let installer = Installer::new(&host, false, "snap");
    installer.install_launcher(&source, &target).unwrap();

    assert_eq!(fs::read(&target).unwrap(), b"new");
    assert_eq!(
        fs::metadata(&target).unwrap().permissions().mode() & 0o777,
        0o755
    );
    assert!(host.calls.borrow().is_empty(), "no elevated fallback expected");
}
