//! Terminal colour themes
//!
//! A `Palette` is built once in `main` from the `--theme` flag and the
//! terminal's colour support, then handed to the `Console`. Nothing reads
//! theme state globally.
//!
//! # Usage
//! ```rust
//! use snapmenu::cli::ThemeName;
//! use snapmenu::theme::{Palette, Role};
//!
//! let palette = Palette::resolve(ThemeName::Dark, false);
//! assert_eq!(palette.paint(Role::Success, "ok"), "ok");
//! ```

use crate::cli::ThemeName;
use crossterm::style::{Color, Stylize};
use std::io::IsTerminal;

/// Semantic roles a piece of output can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Titles and menu headers
    Header,
    /// Menu keys / ordinals
    Accent,
    Success,
    Warning,
    Error,
    /// Secondary text (versions, publishers)
    Muted,
}

/// Resolved colours for every role. `None` means "print plain".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    pub name: ThemeName,
    header: Option<Color>,
    accent: Option<Color>,
    success: Option<Color>,
    warning: Option<Color>,
    error: Option<Color>,
    muted: Option<Color>,
    bold: bool,
}

impl Palette {
    /// Pick the palette for `name`, downgrading to mono without colour support.
    pub fn resolve(name: ThemeName, color_supported: bool) -> Self {
        if !color_supported {
            return Self::mono();
        }
        match name {
            ThemeName::Dark => Self {
                name,
                header: Some(Color::Cyan),
                accent: Some(Color::Yellow),
                success: Some(Color::Green),
                warning: Some(Color::Yellow),
                error: Some(Color::Red),
                muted: Some(Color::DarkGrey),
                bold: false,
            },
            ThemeName::Light => Self {
                name,
                header: Some(Color::DarkBlue),
                accent: Some(Color::DarkMagenta),
                success: Some(Color::DarkGreen),
                warning: Some(Color::DarkYellow),
                error: Some(Color::DarkRed),
                muted: Some(Color::Grey),
                bold: false,
            },
            ThemeName::HiContrast => Self {
                name,
                header: Some(Color::White),
                accent: Some(Color::Yellow),
                success: Some(Color::Green),
                warning: Some(Color::Yellow),
                error: Some(Color::Red),
                muted: Some(Color::White),
                bold: true,
            },
            ThemeName::Mono => Self::mono(),
        }
    }

    /// Plain output with no escape sequences.
    pub fn mono() -> Self {
        Self {
            name: ThemeName::Mono,
            header: None,
            accent: None,
            success: None,
            warning: None,
            error: None,
            muted: None,
            bold: false,
        }
    }

    pub fn is_mono(&self) -> bool {
        self.name == ThemeName::Mono
    }

    fn color(&self, role: Role) -> Option<Color> {
        match role {
            Role::Header => self.header,
            Role::Accent => self.accent,
            Role::Success => self.success,
            Role::Warning => self.warning,
            Role::Error => self.error,
            Role::Muted => self.muted,
        }
    }

    /// Render `text` in the colour for `role`.
    pub fn paint(&self, role: Role, text: &str) -> String {
        match self.color(role) {
            None => text.to_string(),
            Some(color) if self.bold || role == Role::Header => {
                text.with(color).bold().to_string()
            }
            Some(color) => text.with(color).to_string(),
        }
    }
}

/// Whether stdout can take colour escapes.
///
/// False when stdout is not a terminal, `NO_COLOR` is set, or `TERM=dumb`.
pub fn color_supported() -> bool {
    let no_color = std::env::var("NO_COLOR").is_ok_and(|v| !v.is_empty());
    let dumb = std::env::var("TERM").is_ok_and(|t| t == "dumb");
    std::io::stdout().is_terminal() && !no_color && !dumb
}
