//! Device Allocation
//!
//! Resolves the operator's `block-device` hint (explicit list, glob patterns,
//! or `guess`) into a canonical ordered set of local storage devices.

use crate::config::{ConfigSnapshot, GUESS_DEVICES};
use crate::domain::ports::{BlockDevice, DeviceScannerRef};
use crate::error::{Error, Result};
use glob::Pattern;
use tracing::{debug, warn};

// =============================================================================
// Device Spec
// =============================================================================

/// Ordered set of storage devices assigned to this node
///
/// Order is discovery order and is never re-sorted; duplicate selections
/// collapse to their first occurrence. The colon-joined serialization is the
/// wire form the coordinating proxy splits on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceSpec {
    devices: Vec<BlockDevice>,
}

impl DeviceSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a device unless it is already present; returns whether it was
    /// appended
    pub fn push(&mut self, device: BlockDevice) -> bool {
        if self.devices.iter().any(|d| d.path == device.path) {
            return false;
        }
        self.devices.push(device);
        true
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn devices(&self) -> &[BlockDevice] {
        &self.devices
    }

    pub fn iter(&self) -> impl Iterator<Item = &BlockDevice> {
        self.devices.iter()
    }

    /// Colon-joined short names, preserving discovery order
    pub fn join(&self) -> String {
        self.devices
            .iter()
            .map(|d| d.short_name())
            .collect::<Vec<_>>()
            .join(":")
    }
}

impl std::fmt::Display for DeviceSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.join())
    }
}

impl FromIterator<BlockDevice> for DeviceSpec {
    fn from_iter<I: IntoIterator<Item = BlockDevice>>(iter: I) -> Self {
        let mut spec = DeviceSpec::new();
        for device in iter {
            spec.push(device);
        }
        spec
    }
}

// =============================================================================
// Device Allocator
// =============================================================================

/// Resolves the configured device hint against the host's block devices
pub struct DeviceAllocator {
    scanner: DeviceScannerRef,
}

impl DeviceAllocator {
    pub fn new(scanner: DeviceScannerRef) -> Self {
        Self { scanner }
    }

    /// Determine the ordered device set for this node
    ///
    /// Pure query; an empty result means "not ready", never an error. Hint
    /// tokens resolve left to right: glob tokens select every enumerated
    /// device matching the pattern in enumeration order, plain tokens are
    /// probed directly and skipped with a warning when absent.
    pub async fn determine_block_devices(&self, config: &ConfigSnapshot) -> Result<DeviceSpec> {
        let hint = config.device_hint();

        if hint.is_empty() || hint.eq_ignore_ascii_case("none") {
            warn!("no storage devices configured via block-device");
            return Ok(DeviceSpec::new());
        }

        if hint == GUESS_DEVICES {
            let spec: DeviceSpec = self.scanner.enumerate().await?.into_iter().collect();
            debug!("guessed block devices: {}", spec);
            return Ok(spec);
        }

        let mut spec = DeviceSpec::new();
        let mut enumerated: Option<Vec<BlockDevice>> = None;

        for token in hint.split_whitespace() {
            if is_glob(token) {
                let pattern = Pattern::new(token).map_err(|source| Error::DevicePattern {
                    pattern: token.to_string(),
                    source,
                })?;

                if enumerated.is_none() {
                    enumerated = Some(self.scanner.enumerate().await?);
                }
                let devices = enumerated.as_deref().unwrap_or_default();

                let before = spec.len();
                for device in devices {
                    if pattern.matches(&device.path) {
                        spec.push(device.clone());
                    }
                }
                if spec.len() == before {
                    warn!("device pattern {} matched no devices", token);
                }
            } else if let Some(device) = self.scanner.probe(token).await? {
                spec.push(device);
            } else {
                warn!("configured device {} not present; skipping", token);
            }
        }

        debug!("resolved block devices: {}", spec);
        Ok(spec)
    }
}

/// Whether a hint token is a glob pattern rather than a literal path
fn is_glob(token: &str) -> bool {
    token.contains(['*', '?', '['])
}
