//! Tests for service reconciliation
//!
//! Runs the reconciler against an in-memory service manager that behaves like
//! systemd for the handful of verbs we issue.
//!
//! These tests verify:
//! - Idempotent ON/OFF (no mutating calls when already satisfied)
//! - Stop and disable are independent phases
//! - static/indirect/masked are reported as already disabled
//! - enable decides ON success; start/reload failures are warnings only

use snapmenu::command_executor::{check, CommandOutput, Mode};
use snapmenu::reconciler::{Intent, ServiceReconciler, Transition};
use snapmenu::service_manager::ServiceManagerClient;
use snapmenu::types::{EnabledState, ServiceDescriptor, UnitAction};
use snapmenu::{Result, SnapMenuError};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone)]
struct Unit {
    active: bool,
    enabled: EnabledState,
    query_fails: bool,
}

#[derive(Default)]
struct FakeSystemd {
    units: RefCell<HashMap<String, Unit>>,
    mutations: RefCell<Vec<String>>,
    failing: HashSet<UnitAction>,
}

impl FakeSystemd {
    fn with_unit(name: &str, active: bool, enabled: EnabledState) -> Self {
        let fake = Self::default();
        fake.units.borrow_mut().insert(
            name.to_string(),
            Unit {
                active,
                enabled,
                query_fails: false,
            },
        );
        fake
    }

    fn failing(mut self, action: UnitAction) -> Self {
        self.failing.insert(action);
        self
    }

    fn unit(&self, name: &str) -> Unit {
        self.units.borrow()[name].clone()
    }

    fn mutations(&self) -> Vec<String> {
        self.mutations.borrow().clone()
    }
}

impl ServiceManagerClient for FakeSystemd {
    fn is_available(&self) -> bool {
        true
    }

    fn is_active(&self, unit: &str) -> Result<bool> {
        let u = self.unit(unit);
        if u.query_fails {
            return Err(SnapMenuError::query("no output"));
        }
        Ok(u.active)
    }

    fn enabled_state(&self, unit: &str) -> EnabledState {
        let u = self.unit(unit);
        if u.query_fails {
            return EnabledState::Unknown;
        }
        u.enabled
    }

    fn apply(&self, action: UnitAction, unit: &str, mode: Mode) -> Result<CommandOutput> {
        self.mutations
            .borrow_mut()
            .push(format!("{} {}", action, unit));

        let output = if self.failing.contains(&action) {
            CommandOutput::failed(1, format!("Failed to {} {}: Access denied", action, unit))
        } else {
            let mut units = self.units.borrow_mut();
            match (action, units.get_mut(unit)) {
                (UnitAction::DaemonReload, _) => CommandOutput::ok(""),
                (_, None) => CommandOutput::failed(5, format!("Unit {} not found.", unit)),
                (UnitAction::Unmask, Some(u)) => {
                    if u.enabled == EnabledState::Masked {
                        u.enabled = EnabledState::Disabled;
                    }
                    CommandOutput::ok("")
                }
                (UnitAction::Enable | UnitAction::Start, Some(u))
                    if u.enabled == EnabledState::Masked =>
                {
                    CommandOutput::failed(1, format!("Unit file {} is masked.", unit))
                }
                (UnitAction::Enable, Some(u)) => {
                    u.enabled = EnabledState::Enabled;
                    CommandOutput::ok("")
                }
                (UnitAction::Disable, Some(u)) => {
                    u.enabled = EnabledState::Disabled;
                    CommandOutput::ok("")
                }
                (UnitAction::Start, Some(u)) => {
                    u.active = true;
                    CommandOutput::ok("")
                }
                (UnitAction::Stop, Some(u)) => {
                    u.active = false;
                    CommandOutput::ok("")
                }
            }
        };
        check(output, mode, "systemctl", &[action.as_str(), unit])
    }
}

fn reconciler(fake: FakeSystemd) -> ServiceReconciler<FakeSystemd> {
    ServiceReconciler::new(fake, vec![ServiceDescriptor::new("snapd.service")])
}

fn snapd() -> ServiceDescriptor {
    ServiceDescriptor::new("snapd.service")
}

// =============================================================================
// Turn ON
// =============================================================================

#[test]
fn test_turn_on_already_active_is_noop() {
    let r = reconciler(FakeSystemd::with_unit("snapd.service", true, EnabledState::Enabled));
    let report = r.reconcile(&snapd(), Intent::TurnOn);

    assert!(report.succeeded());
    assert!(report.was_noop());
    assert!(r.client().mutations().is_empty(), "no mutating calls expected");
}

#[test]
fn test_turn_on_inactive_disabled_converges() {
    let r = reconciler(FakeSystemd::with_unit("snapd.service", false, EnabledState::Disabled));
    let report = r.reconcile(&snapd(), Intent::TurnOn);

    assert!(report.succeeded());
    assert!(!report.was_noop());
    assert_eq!(
        r.client().mutations(),
        vec![
            "unmask snapd.service",
            "enable snapd.service",
            "start snapd.service",
            "daemon-reload snapd.service",
        ]
    );
    let state = r.status(&snapd());
    assert_eq!(state.active, Some(true));
    assert_eq!(state.enabled, EnabledState::Enabled);
}

#[test]
fn test_turn_on_masked_unit_is_unmasked_first() {
    let r = reconciler(FakeSystemd::with_unit("snapd.service", false, EnabledState::Masked));
    let report = r.reconcile(&snapd(), Intent::TurnOn);

    assert!(report.succeeded());
    assert_eq!(r.status(&snapd()).enabled, EnabledState::Enabled);
}

#[test]
fn test_turn_on_enable_failure_is_reported_with_diagnostic() {
    let fake = FakeSystemd::with_unit("snapd.service", false, EnabledState::Disabled)
        .failing(UnitAction::Enable);
    let r = reconciler(fake);
    let report = r.reconcile(&snapd(), Intent::TurnOn);

    assert!(!report.succeeded());
    let enable = report
        .phases
        .iter()
        .find(|p| p.action == UnitAction::Enable)
        .unwrap();
    assert_eq!(
        enable.transition,
        Transition::Failed("Failed to enable snapd.service: Access denied".to_string())
    );
}

#[test]
fn test_turn_on_start_failure_is_only_a_warning() {
    let fake = FakeSystemd::with_unit("snapd.service", false, EnabledState::Disabled)
        .failing(UnitAction::Start)
        .failing(UnitAction::DaemonReload);
    let r = reconciler(fake);
    let report = r.reconcile(&snapd(), Intent::TurnOn);

    assert!(report.succeeded());
    assert_eq!(report.warnings.len(), 2);
    assert!(report.warnings[0].contains("start snapd.service"));
}

// =============================================================================
// Turn OFF
// =============================================================================

#[test]
fn test_turn_off_already_off_is_noop() {
    let r = reconciler(FakeSystemd::with_unit("snapd.service", false, EnabledState::Disabled));
    let report = r.reconcile(&snapd(), Intent::TurnOff);

    assert!(report.succeeded());
    assert!(report.was_noop());
    assert!(r.client().mutations().is_empty());
}

#[test]
fn test_turn_off_inactive_but_enabled_still_disables() {
    let r = reconciler(FakeSystemd::with_unit("snapd.service", false, EnabledState::Enabled));
    let report = r.reconcile(&snapd(), Intent::TurnOff);

    assert_eq!(report.phases[0].transition, Transition::AlreadySatisfied(None));
    assert_eq!(report.phases[1].transition, Transition::Applied);
    assert_eq!(
        r.client().mutations(),
        vec!["disable snapd.service", "daemon-reload snapd.service"]
    );
}

#[test]
fn test_turn_off_active_but_disabled_only_stops() {
    let r = reconciler(FakeSystemd::with_unit("snapd.service", true, EnabledState::Disabled));
    let report = r.reconcile(&snapd(), Intent::TurnOff);

    assert!(report.succeeded());
    assert_eq!(
        r.client().mutations(),
        vec!["stop snapd.service", "daemon-reload snapd.service"]
    );
    assert_eq!(r.status(&snapd()).active, Some(false));
}

#[test]
fn test_turn_off_never_disables_static_indirect_or_masked() {
    for state in [EnabledState::Static, EnabledState::Indirect, EnabledState::Masked] {
        let r = reconciler(FakeSystemd::with_unit("snapd.service", false, state.clone()));
        let report = r.reconcile(&snapd(), Intent::TurnOff);

        assert!(report.was_noop(), "{} should be a no-op", state);
        assert_eq!(
            report.phases[1].transition,
            Transition::AlreadySatisfied(Some(state))
        );
        assert!(r.client().mutations().is_empty());
    }
}

#[test]
fn test_turn_off_with_unreadable_state_attempts_both_phases() {
    let fake = FakeSystemd::with_unit("snapd.service", true, EnabledState::Enabled);
    fake.units
        .borrow_mut()
        .get_mut("snapd.service")
        .unwrap()
        .query_fails = true;
    let r = reconciler(fake);
    let report = r.reconcile(&snapd(), Intent::TurnOff);

    assert!(report.succeeded());
    let mutations = r.client().mutations();
    assert_eq!(mutations[0], "stop snapd.service");
    assert_eq!(mutations[1], "disable snapd.service");
}

#[test]
fn test_unknown_query_shows_as_unknown_status() {
    let fake = FakeSystemd::with_unit("snapd.service", true, EnabledState::Enabled);
    fake.units
        .borrow_mut()
        .get_mut("snapd.service")
        .unwrap()
        .query_fails = true;
    let r = reconciler(fake);

    let state = r.status(&snapd());
    assert_eq!(state.active, None);
    assert_eq!(state.enabled, EnabledState::Unknown);
    assert!(r.client().mutations().is_empty());
}

#[test]
fn test_reconcile_all_covers_every_service_in_order() {
    let fake = FakeSystemd::with_unit("snapd.service", false, EnabledState::Disabled);
    fake.units.borrow_mut().insert(
        "snapd.socket".to_string(),
        Unit {
            active: true,
            enabled: EnabledState::Enabled,
            query_fails: false,
        },
    );
    let r = ServiceReconciler::new(
        fake,
        vec![
            ServiceDescriptor::new("snapd.service"),
            ServiceDescriptor::new("snapd.socket"),
        ],
    );

    let reports = r.reconcile_all(Intent::TurnOn);
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].service, "snapd.service");
    assert!(!reports[0].was_noop());
    assert!(reports[1].was_noop());

    let statuses = r.status_all();
    assert!(statuses.iter().all(|(_, s)| s.is_active()));
}
