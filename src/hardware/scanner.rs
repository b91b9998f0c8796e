//! Block Device Scanner
//!
//! Enumerates whole block devices from sysfs for the device allocator.
//! Pseudo-devices (loopback, RAM disks, device mapper, md RAID, zram) and
//! partitions are excluded from enumeration; explicitly configured paths are
//! still honoured through [`DeviceScanner::probe`].

use crate::domain::ports::{BlockDevice, DeviceScanner};
use crate::error::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

// =============================================================================
// Constants
// =============================================================================

const SYSFS_BLOCK: &str = "class/block";

/// The `size` sysfs attribute counts 512-byte sectors regardless of the
/// device's logical block size
const SECTOR_SIZE: u64 = 512;

// =============================================================================
// Scanner Configuration
// =============================================================================

/// Configuration for the sysfs block-device scanner
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// Minimum device size to include in enumeration (bytes)
    pub min_size_bytes: u64,
    /// Path to sysfs (for testing)
    pub sysfs_path: PathBuf,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            min_size_bytes: 1_000_000_000, // 1GB minimum
            sysfs_path: PathBuf::from("/sys"),
        }
    }
}

// =============================================================================
// Sysfs Device Scanner
// =============================================================================

/// Scans for whole block devices on Linux systems
pub struct SysfsDeviceScanner {
    config: ScannerConfig,
    // Sysfs is walked once per invocation; hooks resolve the device set
    // several times (payload, storage prep, render context).
    cache: Mutex<Option<Vec<BlockDevice>>>,
}

impl SysfsDeviceScanner {
    /// Create a new scanner
    pub fn new(config: ScannerConfig) -> Self {
        Self {
            config,
            cache: Mutex::new(None),
        }
    }

    /// Create a scanner with default configuration
    pub fn default_scanner() -> Self {
        Self::new(ScannerConfig::default())
    }

    fn scan_block_devices(&self) -> Result<Vec<BlockDevice>> {
        let block_path = self.config.sysfs_path.join(SYSFS_BLOCK);
        if !block_path.exists() {
            warn!("no block device sysfs at {:?}", block_path);
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&block_path)? {
            let entry = entry?;
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        // Directory order is not stable; name order is the enumeration order
        // the rest of the agent depends on
        names.sort();

        let mut devices = Vec::new();
        for name in names {
            if !should_include_device(&name) {
                continue;
            }

            let sysfs_path = block_path.join(&name);
            if is_partition(&sysfs_path) {
                continue;
            }

            if let Some(device) = read_device(&sysfs_path, &format!("/dev/{}", name)) {
                if device.size_bytes >= self.config.min_size_bytes {
                    devices.push(device);
                }
            }
        }

        Ok(devices)
    }
}

#[async_trait]
impl DeviceScanner for SysfsDeviceScanner {
    async fn enumerate(&self) -> Result<Vec<BlockDevice>> {
        if let Some(cached) = self.cache.lock().as_ref() {
            return Ok(cached.clone());
        }

        let devices = self.scan_block_devices()?;
        debug!("enumerated {} block devices", devices.len());
        *self.cache.lock() = Some(devices.clone());
        Ok(devices)
    }

    async fn probe(&self, path: &str) -> Result<Option<BlockDevice>> {
        // Resolve by-id style symlinks where the node exists; fall back to
        // the configured path so fixture-only hosts still resolve
        let resolved = fs::canonicalize(path)
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|_| path.to_string());
        let name = resolved.rsplit('/').next().unwrap_or(&resolved);

        let sysfs_path = self.config.sysfs_path.join(SYSFS_BLOCK).join(name);
        if !sysfs_path.exists() {
            return Ok(None);
        }

        // Partitions are legal here: an operator may assign /dev/vdb1
        // directly even though enumeration only offers whole disks
        Ok(read_device(&sysfs_path, path))
    }
}

// =============================================================================
// Sysfs Helpers
// =============================================================================

/// Read one device entry; unreadable entries are logged and skipped
fn read_device(sysfs_path: &Path, device_path: &str) -> Option<BlockDevice> {
    let size_str = match read_sysfs_attr(sysfs_path, "size") {
        Ok(s) => s,
        Err(e) => {
            warn!("skipping {}: {}", device_path, e);
            return None;
        }
    };

    let sectors: u64 = match size_str.trim().parse() {
        Ok(n) => n,
        Err(_) => {
            warn!("skipping {}: invalid size {:?}", device_path, size_str.trim());
            return None;
        }
    };

    Some(BlockDevice::new(device_path, sectors * SECTOR_SIZE))
}

/// Check if a sysfs entry is a partition rather than a whole device
fn is_partition(sysfs_path: &Path) -> bool {
    sysfs_path.join("partition").exists()
}

/// Check if a device name should be offered by enumeration
fn should_include_device(name: &str) -> bool {
    // Skip loopback devices
    if name.starts_with("loop") {
        return false;
    }

    // Skip RAM disks
    if name.starts_with("ram") {
        return false;
    }

    // Skip device mapper
    if name.starts_with("dm-") {
        return false;
    }

    // Skip md RAID devices
    if name.starts_with("md") {
        return false;
    }

    // Skip zram
    if name.starts_with("zram") {
        return false;
    }

    true
}

/// Read a sysfs attribute
fn read_sysfs_attr(base_path: &Path, attr: &str) -> std::io::Result<String> {
    fs::read_to_string(base_path.join(attr))
}
