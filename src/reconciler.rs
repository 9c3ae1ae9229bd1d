//! Service reconciler
//!
//! Drives each configured unit toward an operator intent with the fewest
//! mutating calls. Every mutation is preceded by a read so that an
//! already-satisfied state yields a clean no-op instead of relying on the
//! service manager's exit status.
//!
//! # Turn ON
//!
//! 1. `is-active` -> already active: report, no mutations.
//! 2. `unmask` (best effort)
//! 3. `enable` (significant: decides success)
//! 4. `start` (best effort, failure is a warning)
//! 5. `daemon-reload` (best effort)
//!
//! # Turn OFF
//!
//! Stop and disable are independent phases:
//!
//! 1. `is-active` -> `stop` only if running
//! 2. `is-enabled` -> `disable` unless disabled/static/indirect/masked
//! 3. `daemon-reload` (best effort)

use crate::command_executor::Mode;
use crate::service_manager::ServiceManagerClient;
use crate::types::{EnabledState, ServiceDescriptor, ServiceState, UnitAction};
use strum::Display;
use tracing::{info, warn};

/// What the operator asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Intent {
    #[strum(serialize = "ON")]
    TurnOn,
    #[strum(serialize = "OFF")]
    TurnOff,
}

/// Result of one phase of a reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The mutating call was issued and succeeded.
    Applied,
    /// Nothing to do; the observed state is carried when it explains why.
    AlreadySatisfied(Option<EnabledState>),
    /// The mutating call failed; holds the tool's diagnostic text.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phase {
    pub action: UnitAction,
    pub transition: Transition,
}

/// Human-facing outcome of one intent applied to one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    pub service: String,
    pub intent: Intent,
    pub phases: Vec<Phase>,
    /// Non-fatal problems from best-effort steps.
    pub warnings: Vec<String>,
}

impl ReconcileReport {
    fn new(service: &str, intent: Intent) -> Self {
        Self {
            service: service.to_string(),
            intent,
            phases: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn record(&mut self, action: UnitAction, transition: Transition) {
        self.phases.push(Phase { action, transition });
    }

    pub fn succeeded(&self) -> bool {
        !self
            .phases
            .iter()
            .any(|p| matches!(p.transition, Transition::Failed(_)))
    }

    /// True when no phase issued a mutating call.
    pub fn was_noop(&self) -> bool {
        self.phases
            .iter()
            .all(|p| matches!(p.transition, Transition::AlreadySatisfied(_)))
    }
}

/// Reconciles a fixed, immutable list of units through a service manager client.
pub struct ServiceReconciler<C: ServiceManagerClient> {
    client: C,
    services: Vec<ServiceDescriptor>,
}

impl<C: ServiceManagerClient> ServiceReconciler<C> {
    pub fn new(client: C, services: Vec<ServiceDescriptor>) -> Self {
        Self { client, services }
    }

    pub fn services(&self) -> &[ServiceDescriptor] {
        &self.services
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Fresh read-only snapshot of one unit.
    pub fn status(&self, service: &ServiceDescriptor) -> ServiceState {
        self.client.state(&service.name)
    }

    /// Fresh read-only snapshot of every configured unit, in configured order.
    pub fn status_all(&self) -> Vec<(ServiceDescriptor, ServiceState)> {
        self.services
            .iter()
            .map(|s| (s.clone(), self.status(s)))
            .collect()
    }

    pub fn reconcile(&self, service: &ServiceDescriptor, intent: Intent) -> ReconcileReport {
        info!("reconcile {} -> {}", service, intent);
        match intent {
            Intent::TurnOn => self.turn_on(service),
            Intent::TurnOff => self.turn_off(service),
        }
    }

    /// Apply `intent` to every configured unit.
    pub fn reconcile_all(&self, intent: Intent) -> Vec<ReconcileReport> {
        self.services
            .iter()
            .map(|s| self.reconcile(s, intent))
            .collect()
    }

    pub fn turn_on(&self, service: &ServiceDescriptor) -> ReconcileReport {
        let unit = service.name.as_str();
        let mut report = ReconcileReport::new(unit, Intent::TurnOn);

        if self.client.is_active(unit).unwrap_or(false) {
            report.record(UnitAction::Start, Transition::AlreadySatisfied(None));
            return report;
        }

        self.best_effort(&mut report, UnitAction::Unmask, unit);
        match self.client.apply(UnitAction::Enable, unit, Mode::Significant) {
            Ok(_) => report.record(UnitAction::Enable, Transition::Applied),
            Err(e) => {
                warn!("enable {} failed: {}", unit, e);
                report.record(UnitAction::Enable, Transition::Failed(e.diagnostic()));
            }
        }
        self.best_effort(&mut report, UnitAction::Start, unit);
        self.best_effort(&mut report, UnitAction::DaemonReload, unit);
        report
    }

    pub fn turn_off(&self, service: &ServiceDescriptor) -> ReconcileReport {
        let unit = service.name.as_str();
        let mut report = ReconcileReport::new(unit, Intent::TurnOff);

        // An unreadable activity state still gets a stop attempt.
        let active = self.client.is_active(unit).unwrap_or(true);
        if active {
            let transition = self.significant(UnitAction::Stop, unit);
            report.record(UnitAction::Stop, transition);
        } else {
            report.record(UnitAction::Stop, Transition::AlreadySatisfied(None));
        }

        let enabled = self.client.enabled_state(unit);
        if enabled.is_already_disabled() {
            report.record(UnitAction::Disable, Transition::AlreadySatisfied(Some(enabled)));
        } else {
            let transition = self.significant(UnitAction::Disable, unit);
            report.record(UnitAction::Disable, transition);
        }

        if !report.was_noop() {
            self.best_effort(&mut report, UnitAction::DaemonReload, unit);
        }
        report
    }

    fn significant(&self, action: UnitAction, unit: &str) -> Transition {
        match self.client.apply(action, unit, Mode::Significant) {
            Ok(_) => Transition::Applied,
            Err(e) => {
                warn!("{} {} failed: {}", action, unit, e);
                Transition::Failed(e.diagnostic())
            }
        }
    }

    fn best_effort(&self, report: &mut ReconcileReport, action: UnitAction, unit: &str) {
        match self.client.apply(action, unit, Mode::BestEffort) {
            Ok(out) if !out.success() => {
                report
                    .warnings
                    .push(format!("{} {}: {}", action, unit, out.diagnostic()));
            }
            Ok(_) => {}
            Err(e) => report.warnings.push(format!("{} {}: {}", action, unit, e)),
        }
    }
}
