//! Configuration Decision Engine
//!
//! Pure planning: maps the inputs of one invocation (upgrade availability,
//! relation topology, config snapshot) onto an ordered list of actions.
//! Nothing here touches a collaborator, so every rule is trivially testable.

use crate::config::ConfigSnapshot;
use crate::hardware::DeviceSpec;

// =============================================================================
// Actions
// =============================================================================

/// One unit of work a hook invocation may carry out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Upgrade the storage distribution to the configured origin
    RunUpgrade,
    /// Render and write the full owned config set
    WriteConfig,
    /// Rewrite the rsync endpoint fragment and restart the rsync service
    RestartRsync,
    /// Regenerate monitoring check definitions
    RegenNrpe,
    /// Publish this node's storage offer on the proxy relation
    AdvertiseRelation,
    /// Nothing to do; the invocation still succeeds
    NoOp,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Action::RunUpgrade => "run-upgrade",
            Action::WriteConfig => "write-config",
            Action::RestartRsync => "restart-rsync",
            Action::RegenNrpe => "regen-nrpe",
            Action::AdvertiseRelation => "advertise-relation",
            Action::NoOp => "no-op",
        };
        write!(f, "{}", name)
    }
}

// =============================================================================
// Planning
// =============================================================================

/// Plan the actions for a config-changed invocation
///
/// Rules are independent and re-evaluated on every invocation; the returned
/// plan is in canonical execution order (upgrade first, so new packages are
/// in place before their configs are rendered).
pub fn decide(
    upgrade_available: bool,
    has_monitor_relation: bool,
    config: &ConfigSnapshot,
) -> Vec<Action> {
    let mut plan = Vec::with_capacity(4);

    // An operator running upgrades through explicit actions defers the
    // upgrade even when one is available
    if upgrade_available && !config.action_managed_upgrade {
        plan.push(Action::RunUpgrade);
    }

    // Config is always rewritten; rendering is idempotent
    plan.push(Action::WriteConfig);

    // The rsync endpoint is refreshed on every config change
    plan.push(Action::RestartRsync);

    if has_monitor_relation {
        plan.push(Action::RegenNrpe);
    }

    plan
}

/// Plan the actions for a relation-joined invocation
///
/// An empty device resolution is not-ready, not an error: nothing is
/// advertised and the invocation exits cleanly.
pub fn plan_relation_joined(devices: &DeviceSpec) -> Vec<Action> {
    if devices.is_empty() {
        vec![Action::NoOp]
    } else {
        vec![Action::AdvertiseRelation]
    }
}
