//! Installer module
//!
//! First-run setup: install snapd through the OS package manager when the
//! `snap` tool is missing, and install/update the launcher at its fixed path.
//!
//! # Package manager detection
//!
//! Binaries are looked up in a fixed preference order; the first hit wins:
//!
//! | Order | Binary    | snapd install |
//! |-------|-----------|---------------|
//! | 1     | `apt-get` | `apt-get install -y snapd` |
//! | 2     | `dnf`     | `dnf install -y snapd` (+ `/snap` symlink) |
//! | 3     | `yum`     | `yum install -y snapd` (+ `/snap` symlink) |
//! | 4     | `zypper`  | `zypper --non-interactive install snapd` |
//! | 5     | `pacman`  | unsupported (snapd lives in the AUR) |

use crate::command_executor::{elevated, execute, refresh_credentials, CommandRunner, Mode};
use crate::error::{Result, SnapMenuError};
use crate::reconciler::{Intent, ReconcileReport, ServiceReconciler};
use crate::service_manager::ServiceManagerClient;
use anyhow::Context;
use std::fs;
use std::io::ErrorKind;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use strum::{Display, EnumIter, IntoEnumIterator};
use tracing::{info, warn};

/// Package that provides the package tool and its daemon.
pub const DAEMON_PACKAGE: &str = "snapd";

/// OS package managers that can provide snapd, in detection order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum OsPackageManager {
    #[strum(serialize = "apt-get")]
    Apt,
    Dnf,
    Yum,
    Zypper,
    Pacman,
}

impl OsPackageManager {
    pub fn binary(&self) -> &'static str {
        match self {
            Self::Apt => "apt-get",
            Self::Dnf => "dnf",
            Self::Yum => "yum",
            Self::Zypper => "zypper",
            Self::Pacman => "pacman",
        }
    }

    /// Arguments that install `package`, or `None` if this manager cannot.
    pub fn install_args<'a>(&self, package: &'a str) -> Option<Vec<&'a str>> {
        match self {
            Self::Apt | Self::Dnf | Self::Yum => Some(vec!["install", "-y", package]),
            Self::Zypper => Some(vec!["--non-interactive", "install", package]),
            Self::Pacman => None,
        }
    }

    /// Fedora-family installs need `/snap` linked for classic snaps.
    fn needs_snap_symlink(&self) -> bool {
        matches!(self, Self::Dnf | Self::Yum)
    }
}

/// First package manager found on `PATH`, in preference order.
pub fn detect_package_manager<R: CommandRunner + ?Sized>(runner: &R) -> Option<OsPackageManager> {
    OsPackageManager::iter().find(|pm| runner.binary_exists(pm.binary()))
}

/// Result of making sure the package tool exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyStatus {
    AlreadyPresent,
    Installed(OsPackageManager),
}

/// Result of installing the launcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LauncherStatus {
    /// The running binary already is the installed launcher.
    AlreadyInstalled,
    /// Copied (or overwritten) at the target path.
    Installed(PathBuf),
}

pub struct Installer<'a, R: CommandRunner> {
    runner: &'a R,
    elevate: bool,
    snap_binary: &'a str,
}

impl<'a, R: CommandRunner> Installer<'a, R> {
    pub fn new(runner: &'a R, elevate: bool, snap_binary: &'a str) -> Self {
        Self {
            runner,
            elevate,
            snap_binary,
        }
    }

    /// Refresh `sudo` credentials on the terminal; no-op when running as root.
    pub fn authorize(&self) -> Result<()> {
        refresh_credentials(self.runner, self.elevate)
    }

    /// Install snapd through the OS package manager if `snap` is missing.
    pub fn ensure_package_tool(&self) -> Result<DependencyStatus> {
        if self.runner.binary_exists(self.snap_binary) {
            return Ok(DependencyStatus::AlreadyPresent);
        }
        let pm = detect_package_manager(self.runner).ok_or_else(|| {
            SnapMenuError::UnsupportedPackageManager("no known package manager found".to_string())
        })?;
        let args = pm.install_args(DAEMON_PACKAGE).ok_or_else(|| {
            SnapMenuError::UnsupportedPackageManager(format!(
                "{} cannot install {} from its official repositories",
                pm, DAEMON_PACKAGE
            ))
        })?;

        info!("Installing {} with {}", DAEMON_PACKAGE, pm);
        let (program, argv) = elevated(self.elevate, pm.binary(), &args);
        execute(self.runner, Mode::Significant, program, &argv)?;

        if pm.needs_snap_symlink() {
            let (program, argv) = elevated(
                self.elevate,
                "ln",
                &["-sfn", "/var/lib/snapd/snap", "/snap"],
            );
            execute(self.runner, Mode::BestEffort, program, &argv)?;
        }

        if !self.runner.binary_exists(self.snap_binary) {
            return Err(SnapMenuError::unavailable(format!(
                "{} installed but `{}` is still not on PATH",
                DAEMON_PACKAGE, self.snap_binary
            )));
        }
        Ok(DependencyStatus::Installed(pm))
    }

    /// Copy `source` to `target` with mode 0755, replacing any existing file.
    ///
    /// The new file is written beside the target and renamed over it so a
    /// running launcher is never truncated in place. When the directory is not
    /// writable, falls back to an elevated `install -m 0755`.
    pub fn install_launcher(&self, source: &Path, target: &Path) -> anyhow::Result<LauncherStatus> {
        if same_file(source, target) {
            return Ok(LauncherStatus::AlreadyInstalled);
        }

        match copy_executable(source, target) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::PermissionDenied && self.elevate => {
                warn!("Direct copy to {} denied, retrying elevated", target.display());
                let src = source.to_str().context("launcher source path is not UTF-8")?;
                let dst = target.to_str().context("launcher target path is not UTF-8")?;
                let (program, argv) = elevated(true, "install", &["-m", "0755", src, dst]);
                execute(self.runner, Mode::Significant, program, &argv)
                    .with_context(|| format!("Failed to install launcher to {}", target.display()))?;
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to install launcher to {}", target.display())
                });
            }
        }

        info!("Launcher installed at {}", target.display());
        Ok(LauncherStatus::Installed(target.to_path_buf()))
    }
}

/// Outcome of a first-run bootstrap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapReport {
    pub dependency: DependencyStatus,
    pub services: Vec<ReconcileReport>,
}

impl BootstrapReport {
    pub fn succeeded(&self) -> bool {
        self.services.iter().all(ReconcileReport::succeeded)
    }
}

/// Make sure the package tool is installed, then turn every configured service ON.
///
/// Services are not touched when the package tool cannot be installed.
pub fn bootstrap<R: CommandRunner, C: ServiceManagerClient>(
    installer: &Installer<'_, R>,
    reconciler: &ServiceReconciler<C>,
) -> Result<BootstrapReport> {
    let dependency = installer.ensure_package_tool()?;
    let services = reconciler.reconcile_all(Intent::TurnOn);
    Ok(BootstrapReport {
        dependency,
        services,
    })
}

fn copy_executable(source: &Path, target: &Path) -> std::io::Result<()> {
    let staging = target.with_file_name(format!(
        ".{}.{}.new",
        target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "launcher".to_string()),
        std::process::id()
    ));
    let result = fs::copy(source, &staging)
        .and_then(|_| fs::set_permissions(&staging, fs::Permissions::from_mode(0o755)))
        .and_then(|_| fs::rename(&staging, target));
    if result.is_err() {
        let _ = fs::remove_file(&staging);
    }
    result
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
