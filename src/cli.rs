use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// snapmenu - install snapd and manage its services and snaps from a menu
#[derive(Parser, Debug)]
#[command(name = "snapmenu")]
#[command(about = "Interactive installer and manager for snapd services and snap packages")]
#[command(version)]
pub struct Cli {
    /// Colour theme (falls back to mono when the terminal has no colour support)
    #[arg(long, value_enum, default_value_t = ThemeName::Dark)]
    pub theme: ThemeName,

    /// Path to a JSON configuration file (default: $SNAPMENU_CONFIG, then built-in defaults)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Selectable colour themes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ThemeName {
    #[default]
    Dark,
    Light,
    Mono,
    #[value(name = "hi-contrast")]
    HiContrast,
}

/// What `main` should do after argument parsing.
#[derive(Debug)]
pub enum ParseOutcome {
    Run(Cli),
    /// Help or version was requested and printed: exit 0.
    Exit,
    /// Bad arguments; usage was printed: exit 1.
    Usage,
}

impl Cli {
    /// Parse process arguments.
    pub fn parse_args() -> ParseOutcome {
        Self::parse_from_iter(std::env::args_os())
    }

    /// Parse an explicit argument list (first item is the program name).
    ///
    /// Help and version print to stdout; parse errors print the usage to
    /// stderr. Unlike clap's default, errors map to exit code 1.
    pub fn parse_from_iter<I, T>(args: I) -> ParseOutcome
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        match Self::try_parse_from(args) {
            Ok(cli) => ParseOutcome::Run(cli),
            Err(e) => {
                let _ = e.print();
                if e.use_stderr() {
                    ParseOutcome::Usage
                } else {
                    ParseOutcome::Exit
                }
            }
        }
    }
}
