//! Menu entries and status badges
//!
//! Each menu is a strum enum whose declaration order is its display order;
//! the user picks an entry by its 1-based number or a short keyword.

use crate::reconciler::Intent;
use crate::theme::Role;
use crate::types::{EnabledState, ServiceState};
use strum::{EnumIter, IntoEnumIterator};

/// Top-level menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum MainChoice {
    InstallLauncher,
    Services,
    Packages,
    Exit,
}

/// Package manager menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum PackageChoice {
    ListInstalled,
    SearchInstall,
    Remove,
    Back,
}

/// Per-service submenu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum ServiceChoice {
    TurnOn,
    TurnOff,
    Back,
}

/// Shared behaviour of the fixed menus.
pub trait MenuEntry: Copy + IntoEnumIterator {
    fn label(&self) -> &'static str;

    /// Extra words accepted besides the entry number.
    fn keywords(&self) -> &'static [&'static str] {
        &[]
    }

    /// `(number, entry)` pairs in display order.
    fn numbered() -> Vec<(usize, Self)> {
        Self::iter().enumerate().map(|(i, e)| (i + 1, e)).collect()
    }

    fn parse(input: &str) -> Option<Self> {
        let input = input.trim().to_ascii_lowercase();
        if let Ok(n) = input.parse::<usize>() {
            return n.checked_sub(1).and_then(|i| Self::iter().nth(i));
        }
        Self::iter().find(|e| e.keywords().contains(&input.as_str()))
    }
}

impl MenuEntry for MainChoice {
    fn label(&self) -> &'static str {
        match self {
            Self::InstallLauncher => "Install / update snapmenu",
            Self::Services => "Service manager",
            Self::Packages => "Package manager",
            Self::Exit => "Exit",
        }
    }

    fn keywords(&self) -> &'static [&'static str] {
        match self {
            Self::Exit => &["q", "quit", "exit"],
            _ => &[],
        }
    }
}

impl MenuEntry for PackageChoice {
    fn label(&self) -> &'static str {
        match self {
            Self::ListInstalled => "List installed snaps",
            Self::SearchInstall => "Search and install",
            Self::Remove => "Remove a snap",
            Self::Back => "Back",
        }
    }

    fn keywords(&self) -> &'static [&'static str] {
        match self {
            Self::Back => &["b", "back"],
            _ => &[],
        }
    }
}

impl MenuEntry for ServiceChoice {
    fn label(&self) -> &'static str {
        match self {
            Self::TurnOn => "Turn ON (enable and start)",
            Self::TurnOff => "Turn OFF (stop and disable)",
            Self::Back => "Back",
        }
    }

    fn keywords(&self) -> &'static [&'static str] {
        match self {
            Self::TurnOn => &["on"],
            Self::TurnOff => &["off"],
            Self::Back => &["b", "back"],
        }
    }
}

impl ServiceChoice {
    pub fn intent(&self) -> Option<Intent> {
        match self {
            Self::TurnOn => Some(Intent::TurnOn),
            Self::TurnOff => Some(Intent::TurnOff),
            Self::Back => None,
        }
    }
}

/// Activity badge. A failed query shows as `UNKNOWN`, never as OFF.
pub fn activity_badge(active: Option<bool>) -> (&'static str, Role) {
    match active {
        Some(true) => ("ON", Role::Success),
        Some(false) => ("OFF", Role::Muted),
        None => ("UNKNOWN", Role::Warning),
    }
}

/// Enablement badge. Unrecognized words pass through verbatim.
pub fn enabled_badge(state: &EnabledState) -> (String, Role) {
    let role = match state {
        EnabledState::Enabled => Role::Success,
        EnabledState::Disabled | EnabledState::Static | EnabledState::Indirect => Role::Muted,
        EnabledState::Masked => Role::Error,
        EnabledState::Unknown | EnabledState::Other(_) => Role::Warning,
    };
    (state.to_string(), role)
}

/// Both badges as plain text, e.g. `[ON] [enabled]`.
pub fn status_text(state: &ServiceState) -> String {
    let (active, _) = activity_badge(state.active);
    let (enabled, _) = enabled_badge(&state.enabled);
    format!("[{}] [{}]", active, enabled)
}
