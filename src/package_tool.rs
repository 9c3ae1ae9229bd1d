//! Package tool adapter
//!
//! `PackageToolClient` exposes typed search/list/install/remove operations.
//! `SnapClient` implements it over the `snap` CLI and keeps all text parsing
//! behind `crate::normalizer`.

use crate::command_executor::{check, elevated, execute, CommandOutput, CommandRunner, Mode};
use crate::error::Result;
use crate::normalizer::{parse_installed_rows, parse_package_search_rows, SearchFormat};
use crate::types::{InstallRequest, InstalledPackage, PackageSearchResult};
use std::cell::OnceCell;
use tracing::{debug, info};

/// Marker `snap find` prints (with a non-zero exit on some versions) for zero hits.
const NO_MATCHES: &str = "No matching snaps";

/// Typed operations against the package tool.
pub trait PackageToolClient {
    /// Whether the package tool is installed at all.
    fn is_available(&self) -> bool;

    /// Search the catalog. Zero hits is `Ok(vec![])`; a failed call is `Err`.
    fn search(&self, query: &str) -> Result<Vec<PackageSearchResult>>;

    /// Installed packages, queried fresh.
    fn list_installed(&self) -> Result<Vec<InstalledPackage>>;

    /// One mutating install call. Failure carries the tool's diagnostic.
    fn install(&self, request: &InstallRequest) -> Result<CommandOutput>;

    /// One mutating remove call.
    fn remove(&self, package_name: &str) -> Result<CommandOutput>;
}

/// `snap`-backed client.
pub struct SnapClient<R: CommandRunner> {
    runner: R,
    program: String,
    elevate: bool,
    limit: usize,
    format: OnceCell<SearchFormat>,
}

impl<R: CommandRunner> SnapClient<R> {
    pub fn new(runner: R, program: impl Into<String>, elevate: bool, limit: usize) -> Self {
        Self {
            runner,
            program: program.into(),
            elevate,
            limit,
            format: OnceCell::new(),
        }
    }

    /// Check once whether `snap find` advertises machine-friendly output.
    pub fn search_format(&self) -> SearchFormat {
        *self.format.get_or_init(|| {
            let help = self.runner.run(&self.program, &["find", "--help"]);
            let text = format!("{}{}", help.stdout, help.stderr);
            let format = if text.contains("--format") {
                SearchFormat::Machine
            } else {
                SearchFormat::Classic
            };
            debug!("snap search format: {:?}", format);
            format
        })
    }

    fn mutate(&self, args: &[&str]) -> Result<CommandOutput> {
        let (program, argv) = elevated(self.elevate, &self.program, args);
        execute(&self.runner, Mode::Significant, program, &argv)
    }
}

impl<R: CommandRunner> PackageToolClient for SnapClient<R> {
    fn is_available(&self) -> bool {
        self.runner.binary_exists(&self.program)
    }

    fn search(&self, query: &str) -> Result<Vec<PackageSearchResult>> {
        let format = self.search_format();
        let args: Vec<&str> = match format {
            SearchFormat::Machine => vec!["find", "--format=tsv", query],
            SearchFormat::Classic => vec!["find", query],
        };
        let out = self.runner.run(&self.program, &args);
        if out.diagnostic().contains(NO_MATCHES) {
            return Ok(Vec::new());
        }
        let out = check(out, Mode::Significant, &self.program, &args)?;
        let rows = parse_package_search_rows(&out.stdout, format, self.limit);
        info!("search {:?}: {} row(s)", query, rows.len());
        Ok(rows)
    }

    fn list_installed(&self) -> Result<Vec<InstalledPackage>> {
        let out = execute(&self.runner, Mode::Significant, &self.program, &["list"])?;
        Ok(parse_installed_rows(&out.stdout))
    }

    fn install(&self, request: &InstallRequest) -> Result<CommandOutput> {
        info!("install {:?}", request);
        let args = request.to_cli_args();
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.mutate(&args)
    }

    fn remove(&self, package_name: &str) -> Result<CommandOutput> {
        info!("remove {}", package_name);
        self.mutate(&["remove", package_name])
    }
}
