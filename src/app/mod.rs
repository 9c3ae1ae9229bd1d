//! Application module
//!
//! The blocking menu loop. One user action runs one flow to completion before
//! the next line of input is read.
//!
//! # Module Structure
//! - `menu` - Menu entries, keyword parsing and status badges
//! - Main module - `App` and the menu dispatch

mod menu;

pub use menu::{
    activity_badge, enabled_badge, status_text, MainChoice, MenuEntry, PackageChoice,
    ServiceChoice,
};

use crate::command_executor::CommandRunner;
use crate::console::Console;
use crate::error::Result;
use crate::installer::{bootstrap, DependencyStatus, Installer, LauncherStatus};
use crate::package_tool::PackageToolClient;
use crate::pipeline::{PackagePipeline, PipelineOutcome};
use crate::reconciler::{ReconcileReport, ServiceReconciler, Transition};
use crate::service_manager::ServiceManagerClient;
use crate::spinner::with_spinner;
use crate::theme::Role;
use crate::types::ServiceDescriptor;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing::{debug, info};

/// Main application struct
pub struct App<'a, S, P, R>
where
    S: ServiceManagerClient,
    P: PackageToolClient,
    R: CommandRunner,
{
    reconciler: ServiceReconciler<S>,
    packages: P,
    installer: Installer<'a, R>,
    /// The running executable, copied when installing the launcher.
    launcher_source: Option<PathBuf>,
    launcher_target: PathBuf,
    spinner: bool,
}

impl<'a, S, P, R> App<'a, S, P, R>
where
    S: ServiceManagerClient,
    P: PackageToolClient,
    R: CommandRunner,
{
    pub fn new(
        reconciler: ServiceReconciler<S>,
        packages: P,
        installer: Installer<'a, R>,
        launcher_target: PathBuf,
    ) -> Self {
        Self {
            reconciler,
            packages,
            installer,
            launcher_source: None,
            launcher_target,
            spinner: false,
        }
    }

    pub fn with_launcher_source(mut self, source: Option<PathBuf>) -> Self {
        self.launcher_source = source;
        self
    }

    pub fn with_spinner(mut self, enabled: bool) -> Self {
        self.spinner = enabled;
        self
    }

    pub fn reconciler(&self) -> &ServiceReconciler<S> {
        &self.reconciler
    }

    /// Run the top-level menu until the user exits or input ends.
    pub fn run<I: BufRead, O: Write>(&self, console: &mut Console<I, O>) -> Result<()> {
        info!("snapmenu menu loop started");
        loop {
            console.header("snapmenu")?;
            for (n, entry) in MainChoice::numbered() {
                console.option(&n.to_string(), entry.label())?;
            }
            let Some(answer) = console.prompt("Choose an option:")? else {
                break;
            };
            match MainChoice::parse(&answer) {
                Some(MainChoice::InstallLauncher) => self.install_launcher(console)?,
                Some(MainChoice::Services) => self.service_menu(console)?,
                Some(MainChoice::Packages) => self.package_menu(console)?,
                Some(MainChoice::Exit) => break,
                None => console.warn(&format!("'{}' is not a menu option", answer))?,
            }
        }
        console.line("Bye.")?;
        Ok(())
    }

    /// Install snapd if needed, turn the services ON, then copy the launcher.
    fn install_launcher<I: BufRead, O: Write>(&self, console: &mut Console<I, O>) -> Result<()> {
        console.header("Install / update")?;
        if !self.authorize(console)? {
            return Ok(());
        }

        let result = with_spinner("Preparing snapd...", self.spinner, || {
            bootstrap(&self.installer, &self.reconciler)
        });
        let report = match result {
            Ok(report) => report,
            Err(e) => {
                console.error("Could not install snapd:")?;
                console.diagnostic(&e.diagnostic())?;
                return Ok(());
            }
        };
        if let DependencyStatus::Installed(pm) = report.dependency {
            console.success(&format!("Installed snapd with {}", pm))?;
        }
        for service in &report.services {
            self.render_report(console, service)?;
        }
        if report.succeeded() {
            console.success("snapd is installed and its services are ON")?;
        } else {
            console.error("Some snapd services could not be turned ON")?;
        }

        let Some(source) = self.launcher_source.as_deref() else {
            console.error("Cannot locate the running executable; launcher not installed")?;
            return Ok(());
        };
        match self.installer.install_launcher(source, &self.launcher_target) {
            Ok(LauncherStatus::AlreadyInstalled) => {
                console.success(&format!(
                    "Already running from {}",
                    self.launcher_target.display()
                ))?;
            }
            Ok(LauncherStatus::Installed(path)) => {
                console.success(&format!("Launcher installed at {}", path.display()))?;
            }
            Err(e) => {
                console.error("Could not install the launcher:")?;
                console.diagnostic(&format!("{:#}", e))?;
            }
        }
        Ok(())
    }

    /// Make sure `snap` exists, running the install flow when it does not.
    fn ensure_package_tool<I: BufRead, O: Write>(
        &self,
        console: &mut Console<I, O>,
    ) -> Result<bool> {
        if self.packages.is_available() {
            return Ok(true);
        }
        console.warn("snap is not installed; installing snapd first")?;
        if !self.authorize(console)? {
            return Ok(false);
        }
        let result = with_spinner("Installing snapd...", self.spinner, || {
            self.installer.ensure_package_tool()
        });
        match result {
            Ok(DependencyStatus::AlreadyPresent) => Ok(true),
            Ok(DependencyStatus::Installed(pm)) => {
                console.success(&format!("Installed snapd with {}", pm))?;
                Ok(true)
            }
            Err(e) => {
                console.error("Could not install snapd:")?;
                console.diagnostic(&e.diagnostic())?;
                Ok(false)
            }
        }
    }

    fn service_menu<I: BufRead, O: Write>(&self, console: &mut Console<I, O>) -> Result<()> {
        if !self.reconciler.client().is_available() {
            console.error("systemctl was not found; services cannot be managed on this system")?;
            return Ok(());
        }
        if !self.ensure_package_tool(console)? {
            return Ok(());
        }

        loop {
            console.header("Services")?;
            // Fresh state on every render.
            let statuses = self.reconciler.status_all();
            for (i, (service, state)) in statuses.iter().enumerate() {
                let (active, active_role) = activity_badge(state.active);
                let (enabled, enabled_role) = enabled_badge(&state.enabled);
                let badges = format!(
                    "{} {}",
                    console.paint(active_role, &format!("[{}]", active)),
                    console.paint(enabled_role, &format!("[{}]", enabled))
                );
                console.option(&(i + 1).to_string(), &format!("{:<24} {}", service.name, badges))?;
            }
            console.option("b", "Back")?;

            let Some(answer) = console.prompt("Select a service:")? else {
                return Ok(());
            };
            let answer = answer.to_ascii_lowercase();
            if answer == "b" || answer == "back" {
                return Ok(());
            }
            match answer.parse::<usize>() {
                Ok(n) if (1..=statuses.len()).contains(&n) => {
                    let service = statuses[n - 1].0.clone();
                    if !self.service_actions(console, &service)? {
                        return Ok(());
                    }
                }
                _ => console.warn(&format!("'{}' is not a listed service", answer))?,
            }
        }
    }

    /// Per-service submenu. Returns `false` when input ended.
    fn service_actions<I: BufRead, O: Write>(
        &self,
        console: &mut Console<I, O>,
        service: &ServiceDescriptor,
    ) -> Result<bool> {
        let state = self.reconciler.status(service);
        console.header(&service.name)?;
        console.line(&format!("Current state: {}", status_text(&state)))?;
        for (n, entry) in ServiceChoice::numbered() {
            console.option(&n.to_string(), entry.label())?;
        }

        loop {
            let Some(answer) = console.prompt("Choose an action:")? else {
                return Ok(false);
            };
            let Some(choice) = ServiceChoice::parse(&answer) else {
                console.warn(&format!("'{}' is not an action", answer))?;
                continue;
            };
            let Some(intent) = choice.intent() else {
                return Ok(true);
            };
            if !self.authorize(console)? {
                return Ok(true);
            }
            let report = with_spinner(
                &format!("Turning {} {}...", service, intent),
                self.spinner,
                || self.reconciler.reconcile(service, intent),
            );
            self.render_report(console, &report)?;
            return Ok(true);
        }
    }

    /// Refresh elevation before a spinner hides the terminal. Returns `false`
    /// after reporting the failure.
    fn authorize<I: BufRead, O: Write>(&self, console: &mut Console<I, O>) -> Result<bool> {
        match self.installer.authorize() {
            Ok(()) => Ok(true),
            Err(e) => {
                console.error("Could not obtain administrator rights:")?;
                console.diagnostic(&e.diagnostic())?;
                Ok(false)
            }
        }
    }

    fn render_report<I: BufRead, O: Write>(
        &self,
        console: &mut Console<I, O>,
        report: &ReconcileReport,
    ) -> Result<()> {
        debug!("{:?}", report);
        if !report.succeeded() {
            console.error(&format!("Failed to turn {} {}", report.service, report.intent))?;
        } else if report.was_noop() {
            console.success(&format!("{} is already {}", report.service, report.intent))?;
        } else {
            console.success(&format!("{} turned {}", report.service, report.intent))?;
        }

        for phase in &report.phases {
            let (text, role) = match &phase.transition {
                Transition::Applied => ("done".to_string(), Role::Success),
                Transition::AlreadySatisfied(None) => ("already satisfied".to_string(), Role::Muted),
                Transition::AlreadySatisfied(Some(state)) => {
                    (format!("already satisfied ({})", state), Role::Muted)
                }
                Transition::Failed(_) => ("failed".to_string(), Role::Error),
            };
            let text = console.paint(role, &text);
            console.line(&format!("    {:<14} {}", phase.action.as_str(), text))?;
            if let Transition::Failed(raw) = &phase.transition {
                console.diagnostic(raw)?;
            }
        }
        for warning in &report.warnings {
            console.warn(warning)?;
        }
        Ok(())
    }

    fn package_menu<I: BufRead, O: Write>(&self, console: &mut Console<I, O>) -> Result<()> {
        if !self.ensure_package_tool(console)? {
            return Ok(());
        }
        let authorize = || self.installer.authorize();
        let pipeline =
            PackagePipeline::new(&self.packages, self.spinner).with_authorizer(&authorize);

        loop {
            console.header("Package manager")?;
            for (n, entry) in PackageChoice::numbered() {
                console.option(&n.to_string(), entry.label())?;
            }
            let Some(answer) = console.prompt("Choose an option:")? else {
                return Ok(());
            };
            match PackageChoice::parse(&answer) {
                Some(PackageChoice::ListInstalled) => {
                    pipeline.list_installed(console)?;
                }
                Some(PackageChoice::SearchInstall) => {
                    let outcome = pipeline.search_and_install(console)?;
                    debug!("search/install finished: {:?}", outcome);
                }
                Some(PackageChoice::Remove) => {
                    if let PipelineOutcome::Removed(name) = pipeline.remove(console)? {
                        info!("removed {}", name);
                    }
                }
                Some(PackageChoice::Back) => return Ok(()),
                None => console.warn(&format!("'{}' is not a menu option", answer))?,
            }
        }
    }
}
