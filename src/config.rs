//! Deployment configuration snapshot
//!
//! One immutable [`ConfigSnapshot`] is taken per hook invocation from the
//! context the hook framework supplies. Settings the agent interprets are
//! typed; everything else is preserved verbatim so the config renderer can
//! still surface it.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// =============================================================================
// Constants
// =============================================================================

/// Fault-isolation zone advertised when the operator has not set one
pub const DEFAULT_ZONE: u32 = 1;

/// Device hint that accepts every device the scanner enumerates
pub const GUESS_DEVICES: &str = "guess";

// =============================================================================
// Config Snapshot
// =============================================================================

/// Typed view of the deployment settings for one hook invocation
///
/// External key names are kebab-case (`openstack-origin`, `prefer-ipv6`, ...)
/// to match the framework's settings store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ConfigSnapshot {
    /// Package installation source for the storage distribution
    pub openstack_origin: Option<String>,

    /// Advertise and bind IPv6 addresses instead of IPv4
    pub prefer_ipv6: bool,

    /// Defer distribution upgrades to an operator-run action even when an
    /// upgrade is available
    pub action_managed_upgrade: bool,

    /// Fault-isolation zone advertised to the coordinating proxy
    pub zone: u32,

    /// Device selection hint: [`GUESS_DEVICES`], `none`, or a
    /// whitespace-separated list of device paths and glob patterns
    pub block_device: String,

    /// Remaining settings, preserved verbatim for the config renderer
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_json::Value>,
}

impl Default for ConfigSnapshot {
    fn default() -> Self {
        Self {
            openstack_origin: None,
            prefer_ipv6: false,
            action_managed_upgrade: false,
            zone: DEFAULT_ZONE,
            block_device: GUESS_DEVICES.to_string(),
            extra: IndexMap::new(),
        }
    }
}

impl ConfigSnapshot {
    /// The device selection hint with surrounding whitespace stripped
    pub fn device_hint(&self) -> &str {
        self.block_device.trim()
    }
}

// =============================================================================
// Agent Paths
// =============================================================================

/// Filesystem roots the agent works against; every one is overridable so
/// tests and staged deployments can point elsewhere
#[derive(Debug, Clone)]
pub struct AgentPaths {
    /// Swift configuration directory (swift.conf, ring files, rsync fragment)
    pub conf_dir: PathBuf,
    /// Storage mount root, one subdirectory per device
    pub node_dir: PathBuf,
    /// Operator pre-install drop-in directory
    pub preinstall_dir: PathBuf,
}

impl Default for AgentPaths {
    fn default() -> Self {
        Self {
            conf_dir: PathBuf::from("/etc/swift"),
            node_dir: PathBuf::from("/srv/node"),
            preinstall_dir: PathBuf::from("/etc/swift-storage/preinstall.d"),
        }
    }
}
