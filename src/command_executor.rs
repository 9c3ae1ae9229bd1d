//! command_executor.rs - Runs external commands and captures their result.
//!
//! Every call into `systemctl`, `snap` or an OS package manager goes through a
//! `CommandRunner`. Runners never fail on a non-zero exit; callers pick a
//! `Mode` to decide whether a failure matters.

use crate::error::{Result, SnapMenuError};
use std::ffi::OsStr;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::{debug, warn};

/// Captured result of one external command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code (None if the process could not be spawned or was killed by a signal).
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    /// Output of a command that exited 0.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: Some(0),
        }
    }

    /// Output of a command that exited with `code`.
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            exit_code: Some(code),
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// The tool's own explanation: stderr if present, stdout otherwise.
    pub fn diagnostic(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim().to_string()
        } else {
            stderr.to_string()
        }
    }
}

/// How a caller treats a failed command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Failure is logged and otherwise ignored (unmask, reload, ...).
    BestEffort,
    /// Failure is surfaced to the caller as `SnapMenuError::CommandFailed`.
    Significant,
}

/// Executes a program with arguments and captures its output.
///
/// # Contract
///
/// - Never returns an error: spawn failures are reported as a `CommandOutput`
///   without an exit code and the OS error in `stderr`.
/// - Blocks until the child exits.
pub trait CommandRunner {
    fn run(&self, program: &str, args: &[&str]) -> CommandOutput;

    /// Run with the terminal attached, for commands that may prompt
    /// (`sudo -v`). Output is not captured.
    fn run_interactive(&self, program: &str, args: &[&str]) -> CommandOutput {
        self.run(program, args)
    }

    /// Whether `program` can be found on `PATH`.
    fn binary_exists(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}

/// Whether `program` is an executable in one of the `paths` directories.
pub fn binary_on_path(program: &str, paths: impl AsRef<OsStr>) -> bool {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
    which::which_in(program, Some(paths), cwd).is_ok()
}

/// Runner backed by `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str]) -> CommandOutput {
        debug!("exec: {} {:?}", program, args);
        match Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
        {
            Ok(output) => CommandOutput {
                stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                exit_code: output.status.code(),
            },
            Err(e) => {
                debug!("spawn failed for {}: {}", program, e);
                CommandOutput {
                    stdout: String::new(),
                    stderr: format!("failed to execute {}: {}", program, e),
                    exit_code: None,
                }
            }
        }
    }

    fn run_interactive(&self, program: &str, args: &[&str]) -> CommandOutput {
        debug!("exec (interactive): {} {:?}", program, args);
        match Command::new(program).args(args).status() {
            Ok(status) => CommandOutput {
                exit_code: status.code(),
                ..CommandOutput::default()
            },
            Err(e) => CommandOutput {
                stdout: String::new(),
                stderr: format!("failed to execute {}: {}", program, e),
                exit_code: None,
            },
        }
    }
}

/// Refresh cached `sudo` credentials while no spinner owns the terminal.
/// No-op when `elevate` is false.
pub fn refresh_credentials<R: CommandRunner + ?Sized>(runner: &R, elevate: bool) -> Result<()> {
    if !elevate {
        return Ok(());
    }
    let output = runner.run_interactive("sudo", &["-v"]);
    check(output, Mode::Significant, "sudo", &["-v"]).map(|_| ())
}

/// Run a command and apply `mode` to its exit status.
pub fn execute<R: CommandRunner + ?Sized>(
    runner: &R,
    mode: Mode,
    program: &str,
    args: &[&str],
) -> Result<CommandOutput> {
    check(runner.run(program, args), mode, program, args)
}

/// Apply `mode` to an output that has already been captured.
pub fn check(output: CommandOutput, mode: Mode, program: &str, args: &[&str]) -> Result<CommandOutput> {
    if output.success() {
        return Ok(output);
    }

    let command = render_command(program, args);
    match mode {
        Mode::BestEffort => {
            warn!(
                "best-effort `{}` failed (exit {:?}): {}",
                command,
                output.exit_code,
                output.diagnostic()
            );
            Ok(output)
        }
        Mode::Significant => Err(SnapMenuError::CommandFailed {
            command,
            code: output.exit_code.unwrap_or(-1),
            diagnostic: output.diagnostic(),
        }),
    }
}

/// Prefix `program args` with `sudo` when `elevate` is set.
///
/// Returns the program to spawn and its full argument list.
pub fn elevated<'a>(elevate: bool, program: &'a str, args: &[&'a str]) -> (&'a str, Vec<&'a str>) {
    if elevate {
        let mut full = Vec::with_capacity(args.len() + 1);
        full.push(program);
        full.extend_from_slice(args);
        ("sudo", full)
    } else {
        (program, args.to_vec())
    }
}

/// Whether mutating calls need `sudo` (not running as root).
pub fn needs_elevation() -> bool {
    !nix::unistd::geteuid().is_root()
}

fn render_command(program: &str, args: &[&str]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{} {}", program, args.join(" "))
    }
}
