//! snapmenu library
//!
//! Core of the interactive snap/snapd manager: command execution, output
//! normalization, service reconciliation and the package search pipeline.

pub mod app;
pub mod cli;
pub mod command_executor;
pub mod config;
pub mod console;
pub mod error;
pub mod installer;
pub mod normalizer;
pub mod package_tool;
pub mod pipeline;
pub mod reconciler;
pub mod service_manager;
pub mod spinner;
pub mod theme;
pub mod types;

// Re-export main types for convenience
pub use app::App;
pub use command_executor::{CommandOutput, CommandRunner, Mode, SystemRunner};
pub use config::AppConfig;
pub use console::Console;
pub use error::{Result, SnapMenuError};
pub use installer::{bootstrap, DependencyStatus, Installer, LauncherStatus, OsPackageManager};
pub use package_tool::{PackageToolClient, SnapClient};
pub use pipeline::{PackagePipeline, PipelineOutcome, SearchSession, SelectError};
pub use reconciler::{Intent, ReconcileReport, ServiceReconciler, Transition};
pub use service_manager::{ServiceManagerClient, SystemctlClient};
pub use types::{
    Channel, EnabledState, InstallRequest, InstalledPackage, PackageSearchResult,
    ServiceDescriptor, ServiceState, UnitAction,
};
