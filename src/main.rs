//! snapmenu - Main entry point
//!
//! Interactive installer and manager for snapd, its services and snap packages.

use anyhow::Context;
use crossterm::{cursor, terminal};
use snapmenu::cli::{Cli, ParseOutcome};
use snapmenu::command_executor::{needs_elevation, SystemRunner};
use snapmenu::config::AppConfig;
use snapmenu::console::Console;
use snapmenu::installer::Installer;
use snapmenu::package_tool::SnapClient;
use snapmenu::reconciler::ServiceReconciler;
use snapmenu::service_manager::SystemctlClient;
use snapmenu::theme::{color_supported, Palette};
use snapmenu::App;
use std::io::{self, IsTerminal, Write};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Initialize logging to stderr so it never interleaves with the menu on stdout.
///
/// Defaults to `warn`; `RUST_LOG` overrides.
fn init_logger() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Ctrl-C: put the terminal back the way we found it and exit 130.
fn install_interrupt_handler() {
    let result = ctrlc::set_handler(|| {
        let mut stderr = io::stderr();
        let _ = crossterm::execute!(
            stderr,
            cursor::Show,
            terminal::Clear(terminal::ClearType::CurrentLine),
            cursor::MoveToColumn(0)
        );
        let _ = writeln!(stderr, "Interrupted.");
        std::process::exit(130);
    });
    if let Err(e) = result {
        warn!("Failed to install Ctrl-C handler: {}", e);
    }
}

fn main() {
    init_logger();

    let cli = match Cli::parse_args() {
        ParseOutcome::Run(cli) => cli,
        ParseOutcome::Exit => std::process::exit(0),
        ParseOutcome::Usage => std::process::exit(1),
    };

    install_interrupt_handler();

    if let Err(e) = run(cli) {
        eprintln!("✗ {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    info!("snapmenu {} starting up", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::resolve(cli.config.as_deref()).context("Failed to load configuration")?;
    debug!("Configuration: {:?}", config);

    let palette = Palette::resolve(cli.theme, color_supported());
    let elevate = needs_elevation();
    let spinner = io::stderr().is_terminal();

    let runner = SystemRunner;
    let reconciler = ServiceReconciler::new(
        SystemctlClient::new(SystemRunner, config.systemctl_binary.clone(), elevate),
        config.services.clone(),
    );
    let packages = SnapClient::new(
        SystemRunner,
        config.snap_binary.clone(),
        elevate,
        config.search_limit,
    );
    let installer = Installer::new(&runner, elevate, &config.snap_binary);
    let launcher_source = std::env::current_exe()
        .inspect_err(|e| warn!("Cannot resolve the running executable: {}", e))
        .ok();

    let app = App::new(reconciler, packages, installer, config.launcher_path.clone())
        .with_launcher_source(launcher_source)
        .with_spinner(spinner);

    let stdin = io::stdin();
    let mut console = Console::new(stdin.lock(), io::stdout(), palette);
    app.run(&mut console).context("Menu loop failed")?;
    Ok(())
}
