//! Package search/select pipeline
//!
//! ```text
//! query -> search -> bounded result set -> ordinal -> channel/confinement -> install
//!   ^                       |      ^                                           |
//!   +---- "s" (discard) ----+      +------------- install failed --------------+
//! ```
//!
//! The only handle a user has on a search row is its 1-based ordinal, and an
//! ordinal is only meaningful against the exact result set it was printed
//! from. `SearchSession` tags every result set with a generation so a stale
//! ordinal is rejected instead of silently reused.

use crate::console::Console;
use crate::error::Result;
use crate::package_tool::PackageToolClient;
use crate::spinner::with_spinner;
use crate::theme::Role;
use crate::types::{Channel, InstallRequest, InstalledPackage, PackageSearchResult};
use std::io::{BufRead, Write};
use strum::IntoEnumIterator;
use thiserror::Error;
use tracing::{info, warn};

/// The only token that authorizes a removal.
pub const CONFIRM_TOKEN: &str = "yes";

/// Why an ordinal could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectError {
    #[error("the result list changed; search again and pick from the new list")]
    Stale,
    #[error("{ordinal} is not between 1 and {len}")]
    OutOfRange { ordinal: usize, len: usize },
}

/// A result set displayed to the user, tagged with its generation.
#[derive(Debug, Clone)]
pub struct ResultSet {
    generation: u64,
    rows: Vec<PackageSearchResult>,
}

impl ResultSet {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn rows(&self) -> &[PackageSearchResult] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows paired with their display ordinals, `1..=len`.
    pub fn ordinals(&self) -> impl Iterator<Item = (usize, &PackageSearchResult)> {
        self.rows.iter().enumerate().map(|(i, row)| (i + 1, row))
    }
}

/// Holds at most one live result set.
#[derive(Debug, Default)]
pub struct SearchSession {
    current: Option<ResultSet>,
    next_generation: u64,
}

impl SearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the live set, invalidating every ordinal of the previous one.
    pub fn replace(&mut self, rows: Vec<PackageSearchResult>) -> &ResultSet {
        self.next_generation += 1;
        self.current.insert(ResultSet {
            generation: self.next_generation,
            rows,
        })
    }

    /// Drop the live set (searched again, or consumed by an install).
    pub fn discard(&mut self) {
        self.current = None;
    }

    pub fn current(&self) -> Option<&ResultSet> {
        self.current.as_ref()
    }

    /// Resolve `ordinal` against the set displayed as `generation`.
    pub fn resolve(&self, generation: u64, ordinal: usize) -> std::result::Result<&PackageSearchResult, SelectError> {
        let set = self
            .current
            .as_ref()
            .filter(|set| set.generation == generation)
            .ok_or(SelectError::Stale)?;
        if ordinal == 0 || ordinal > set.len() {
            return Err(SelectError::OutOfRange {
                ordinal,
                len: set.len(),
            });
        }
        Ok(&set.rows[ordinal - 1])
    }
}

/// What the user typed at a result list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Ordinal(usize),
    SearchAgain,
    Back,
    Invalid(String),
}

/// Interpret one line typed at a result list.
pub fn parse_selection(input: &str) -> Selection {
    let input = input.trim();
    match input.to_ascii_lowercase().as_str() {
        "s" | "search" => Selection::SearchAgain,
        "b" | "back" => Selection::Back,
        _ => match input.parse::<usize>() {
            Ok(n) => Selection::Ordinal(n),
            Err(_) => Selection::Invalid(input.to_string()),
        },
    }
}

/// Reject queries the package tool would parse as options or that carry control bytes.
pub fn validate_query(query: &str) -> std::result::Result<(), String> {
    if query.starts_with('-') {
        return Err("search terms cannot start with '-'".to_string());
    }
    if query.chars().any(char::is_control) {
        return Err("search terms cannot contain control characters".to_string());
    }
    Ok(())
}

/// Interpret a channel answer: empty means stable; accepts `1`-`4` or a name.
pub fn parse_channel(input: &str) -> Option<Channel> {
    let input = input.trim();
    if input.is_empty() {
        return Some(Channel::Stable);
    }
    if let Ok(n) = input.parse::<usize>() {
        return n.checked_sub(1).and_then(|i| Channel::iter().nth(i));
    }
    input.to_ascii_lowercase().parse().ok()
}

/// Interpret a yes/no answer; empty takes `default`, anything else is `None`.
pub fn parse_yes_no(input: &str, default: bool) -> Option<bool> {
    match input.trim().to_ascii_lowercase().as_str() {
        "" => Some(default),
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

/// Removal is authorized only by the exact confirmation token.
pub fn is_confirmed(input: &str) -> bool {
    input.trim() == CONFIRM_TOKEN
}

/// Outcome of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    Installed(String),
    Removed(String),
    /// Nothing was changed (back, empty query, cancelled confirmation...).
    NoChange,
}

/// Runs before every mutating call, outside the spinner.
pub type Authorizer<'a> = &'a dyn Fn() -> Result<()>;

/// Interactive search/install and remove flows over a package tool.
pub struct PackagePipeline<'a, P: PackageToolClient> {
    tool: &'a P,
    spinner: bool,
    authorize: Option<Authorizer<'a>>,
}

impl<'a, P: PackageToolClient> PackagePipeline<'a, P> {
    pub fn new(tool: &'a P, spinner: bool) -> Self {
        Self {
            tool,
            spinner,
            authorize: None,
        }
    }

    /// Gate install and remove behind `authorize` (e.g. a `sudo -v` refresh).
    pub fn with_authorizer(mut self, authorize: Authorizer<'a>) -> Self {
        self.authorize = Some(authorize);
        self
    }

    /// Returns `false` (after reporting why) when the authorizer refused.
    fn authorized<R: BufRead, W: Write>(&self, console: &mut Console<R, W>) -> Result<bool> {
        let Some(authorize) = self.authorize else {
            return Ok(true);
        };
        match authorize() {
            Ok(()) => Ok(true),
            Err(e) => {
                warn!("authorization failed: {}", e);
                console.error("Could not obtain administrator rights:")?;
                console.diagnostic(&e.diagnostic())?;
                Ok(false)
            }
        }
    }

    /// Print installed packages with ordinals and return them.
    pub fn list_installed<R: BufRead, W: Write>(
        &self,
        console: &mut Console<R, W>,
    ) -> Result<Option<Vec<InstalledPackage>>> {
        console.header("Installed snaps")?;
        let installed = match with_spinner("Listing installed snaps...", self.spinner, || {
            self.tool.list_installed()
        }) {
            Ok(list) => list,
            Err(e) => {
                console.error("Could not list installed snaps:")?;
                console.diagnostic(&e.diagnostic())?;
                return Ok(None);
            }
        };
        if installed.is_empty() {
            console.line("  (no snaps installed)")?;
        }
        for (i, pkg) in installed.iter().enumerate() {
            let detail = console.paint(
                Role::Muted,
                &format!(
                    "{} rev {} {} {}",
                    pkg.version, pkg.revision, pkg.tracking_channel, pkg.publisher
                ),
            );
            console.line(&format!("  {:>2}) {:<28} {}", i + 1, pkg.name, detail))?;
        }
        Ok(Some(installed))
    }

    /// Query -> results -> select -> install, looping until back or success.
    pub fn search_and_install<R: BufRead, W: Write>(
        &self,
        console: &mut Console<R, W>,
    ) -> Result<PipelineOutcome> {
        let mut session = SearchSession::new();

        'query: loop {
            console.header("Search snaps")?;
            let query = match console.prompt("Search term (empty or 'b' to go back):")? {
                None => return Ok(PipelineOutcome::NoChange),
                Some(q)
                    if q.is_empty()
                        || q.eq_ignore_ascii_case("b")
                        || q.eq_ignore_ascii_case("back") =>
                {
                    return Ok(PipelineOutcome::NoChange);
                }
                Some(q) => q,
            };
            if let Err(reason) = validate_query(&query) {
                console.warn(&reason)?;
                continue 'query;
            }

            let rows = match with_spinner(&format!("Searching for '{}'...", query), self.spinner, || {
                self.tool.search(&query)
            }) {
                Ok(rows) => rows,
                Err(e) => {
                    warn!("search {:?} failed: {}", query, e);
                    console.error("Search failed:")?;
                    console.diagnostic(&e.diagnostic())?;
                    continue 'query;
                }
            };

            let generation = session.replace(rows).generation();

            loop {
                let Some(set) = session.current() else {
                    continue 'query;
                };
                render_results(console, &query, set)?;
                if set.is_empty() {
                    session.discard();
                    continue 'query;
                }

                let answer = console.prompt("Number to install, 's' to search again, 'b' to go back:")?;
                match parse_selection(answer.as_deref().unwrap_or("b")) {
                    Selection::Back => return Ok(PipelineOutcome::NoChange),
                    Selection::SearchAgain => {
                        session.discard();
                        continue 'query;
                    }
                    Selection::Invalid(raw) => {
                        console.warn(&format!("'{}' is not a valid choice", raw))?;
                    }
                    Selection::Ordinal(n) => {
                        let row = match session.resolve(generation, n) {
                            Ok(row) => row.clone(),
                            Err(e) => {
                                console.warn(&e.to_string())?;
                                continue;
                            }
                        };
                        let Some(request) = self.build_request(console, &row)? else {
                            continue;
                        };
                        if self.install(console, &request)? {
                            session.discard();
                            return Ok(PipelineOutcome::Installed(request.package_name));
                        }
                        // Failed: show the same result set again.
                    }
                }
            }
        }
    }

    /// Ask for channel and confinement. `None` means the user backed out.
    fn build_request<R: BufRead, W: Write>(
        &self,
        console: &mut Console<R, W>,
        row: &PackageSearchResult,
    ) -> Result<Option<InstallRequest>> {
        console.line(&format!("Selected: {} {}", row.name, row.version))?;
        for (i, channel) in Channel::iter().enumerate() {
            console.option(&(i + 1).to_string(), channel.as_str())?;
        }
        let channel = loop {
            let Some(answer) = console.prompt("Channel [stable]:")? else {
                return Ok(None);
            };
            match parse_channel(&answer) {
                Some(channel) => break channel,
                None => console.warn(&format!("'{}' is not a channel", answer))?,
            }
        };

        let default_classic = row.wants_classic();
        let hint = if default_classic { "[Y/n]" } else { "[y/N]" };
        let classic = loop {
            let Some(answer) = console.prompt(&format!("Use classic confinement? {}", hint))? else {
                return Ok(None);
            };
            match parse_yes_no(&answer, default_classic) {
                Some(value) => break value,
                None => console.warn("Please answer y or n")?,
            }
        };

        Ok(Some(InstallRequest {
            package_name: row.name.clone(),
            channel,
            classic_confinement: classic,
        }))
    }

    /// Issue the single install call. Returns whether it succeeded.
    fn install<R: BufRead, W: Write>(
        &self,
        console: &mut Console<R, W>,
        request: &InstallRequest,
    ) -> Result<bool> {
        if !self.authorized(console)? {
            return Ok(false);
        }
        let result = with_spinner(
            &format!("Installing {} ({})...", request.package_name, request.channel),
            self.spinner,
            || self.tool.install(request),
        );
        match result {
            Ok(out) => {
                info!("installed {}", request.package_name);
                console.success(&format!("Installed {}", request.package_name))?;
                let text = out.stdout.trim();
                if !text.is_empty() {
                    console.diagnostic(text)?;
                }
                Ok(true)
            }
            Err(e) => {
                console.error(&format!("Failed to install {}:", request.package_name))?;
                console.diagnostic(&e.diagnostic())?;
                Ok(false)
            }
        }
    }

    /// List installed -> choose ordinal -> typed confirmation -> remove.
    pub fn remove<R: BufRead, W: Write>(
        &self,
        console: &mut Console<R, W>,
    ) -> Result<PipelineOutcome> {
        let Some(installed) = self.list_installed(console)? else {
            return Ok(PipelineOutcome::NoChange);
        };
        if installed.is_empty() {
            return Ok(PipelineOutcome::NoChange);
        }

        let target = loop {
            let Some(answer) = console.prompt("Number to remove ('b' to go back):")? else {
                return Ok(PipelineOutcome::NoChange);
            };
            match parse_selection(&answer) {
                Selection::Back => return Ok(PipelineOutcome::NoChange),
                Selection::Ordinal(n) if (1..=installed.len()).contains(&n) => {
                    break installed[n - 1].name.clone();
                }
                Selection::Ordinal(n) => console.warn(
                    &SelectError::OutOfRange {
                        ordinal: n,
                        len: installed.len(),
                    }
                    .to_string(),
                )?,
                Selection::SearchAgain | Selection::Invalid(_) => {
                    console.warn(&format!("'{}' is not a valid choice", answer.trim()))?;
                }
            }
        };

        let answer = console.prompt(&format!(
            "Type '{}' to remove {} (anything else cancels):",
            CONFIRM_TOKEN, target
        ))?;
        if !answer.as_deref().is_some_and(is_confirmed) {
            console.line("Removal cancelled.")?;
            return Ok(PipelineOutcome::NoChange);
        }
        if !self.authorized(console)? {
            return Ok(PipelineOutcome::NoChange);
        }

        let result = with_spinner(&format!("Removing {}...", target), self.spinner, || {
            self.tool.remove(&target)
        });
        match result {
            Ok(_) => {
                console.success(&format!("Removed {}", target))?;
                Ok(PipelineOutcome::Removed(target))
            }
            Err(e) => {
                console.error(&format!("Failed to remove {}:", target))?;
                console.diagnostic(&e.diagnostic())?;
                Ok(PipelineOutcome::NoChange)
            }
        }
    }
}

fn render_results<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    query: &str,
    set: &ResultSet,
) -> Result<()> {
    if set.is_empty() {
        console.line(&format!("No snaps found for '{}'.", query))?;
        return Ok(());
    }
    console.line(&format!("{} result(s) for '{}':", set.len(), query))?;
    for (ordinal, row) in set.ordinals() {
        let detail = console.paint(
            Role::Muted,
            &format!("{} {} [{}]", row.version, row.publisher, row.channel),
        );
        console.line(&format!("  {:>2}) {:<28} {}", ordinal, row.name, detail))?;
        if !row.summary.is_empty() {
            console.line(&format!("      {}", row.summary))?;
        }
    }
    Ok(())
}
