//! Storage Preparer Adapter
//!
//! Formats resolved devices with xfs and mounts them under the node
//! directory. Preparation must be idempotent: the framework may redeliver
//! the install event, and a formatted, mounted device is left alone.

use crate::domain::ports::{BlockDevice, StoragePreparer};
use crate::error::{Error, Result};
use crate::system::run_command;
use anyhow::anyhow;
use async_trait::async_trait;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

const COLLABORATOR: &str = "storage-preparer";

pub struct XfsStoragePreparer {
    /// Mount root, one subdirectory per device short name
    node_dir: PathBuf,
}

impl XfsStoragePreparer {
    pub fn new(node_dir: PathBuf) -> Self {
        Self { node_dir }
    }

    fn prepare_one(&self, device: &BlockDevice) -> Result<()> {
        let mounts = fs::read_to_string("/proc/mounts").unwrap_or_default();
        if mounted_in(&mounts, &device.path) {
            debug!(device = %device.path, "already mounted");
            return Ok(());
        }

        if !has_filesystem(&device.path)? {
            info!(device = %device.path, "formatting as xfs");
            run_command(COLLABORATOR, "mkfs.xfs", &["-f", "-i", "size=1024", &device.path])?;
        }

        let mount_point = self.node_dir.join(device.short_name());
        fs::create_dir_all(&mount_point)?;
        let mount_point_str = mount_point.to_string_lossy();

        info!(device = %device.path, mount = %mount_point_str, "mounting");
        run_command(
            COLLABORATOR,
            "mount",
            &["-t", "xfs", &device.path, &mount_point_str],
        )?;
        persist_mount(Path::new("/etc/fstab"), &device.path, &mount_point_str)?;
        Ok(())
    }
}

#[async_trait]
impl StoragePreparer for XfsStoragePreparer {
    async fn prepare(&self, devices: &[BlockDevice]) -> Result<()> {
        if devices.is_empty() {
            debug!("no devices to prepare");
            return Ok(());
        }

        for device in devices {
            self.prepare_one(device)?;
        }

        let node_dir = self.node_dir.to_string_lossy();
        run_command(COLLABORATOR, "chown", &["-R", "swift:swift", &node_dir])?;
        run_command(COLLABORATOR, "chmod", &["-R", "0755", &node_dir])?;
        Ok(())
    }
}

/// Whether `device_path` appears as a source in `/proc/mounts` content
fn mounted_in(mounts: &str, device_path: &str) -> bool {
    mounts
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .any(|source| source == device_path)
}

/// Whether blkid reports an existing filesystem on the device
///
/// blkid exits non-zero for a blank device, so the exit status is the
/// answer here.
fn has_filesystem(device_path: &str) -> Result<bool> {
    let output = Command::new("blkid")
        .args(["-o", "value", "-s", "TYPE", device_path])
        .output()
        .map_err(|e| Error::collaborator(COLLABORATOR, anyhow!("blkid failed to start: {}", e)))?;

    Ok(output.status.success() && !output.stdout.is_empty())
}

/// The fstab line that keeps a mount across reboots
fn fstab_line(device_path: &str, mount_point: &str) -> String {
    format!("{} {} xfs noatime,nodiratime 0 0\n", device_path, mount_point)
}

/// Append an fstab entry unless the device already has one
fn persist_mount(fstab: &Path, device_path: &str, mount_point: &str) -> Result<()> {
    let current = fs::read_to_string(fstab).unwrap_or_default();
    if has_fstab_entry(&current, device_path) {
        return Ok(());
    }

    let mut file = fs::OpenOptions::new().create(true).append(true).open(fstab)?;
    file.write_all(fstab_line(device_path, mount_point).as_bytes())?;
    debug!(device = device_path, "fstab entry added");
    Ok(())
}

fn has_fstab_entry(fstab_content: &str, device_path: &str) -> bool {
    fstab_content
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .filter_map(|line| line.split_whitespace().next())
        .any(|source| source == device_path)
}
