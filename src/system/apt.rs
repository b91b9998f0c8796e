//! Package Installer Adapter
//!
//! Drives apt and dpkg for the fixed storage package set. Install failures
//! are fatal to the invocation; the hook framework owns retry by firing the
//! hook again.

use crate::domain::ports::PackageInstaller;
use crate::error::{Error, Result};
use crate::system::run_command;
use anyhow::anyhow;
use async_trait::async_trait;
use std::process::Command;
use tracing::{debug, info};

const COLLABORATOR: &str = "package-installer";

/// Packages every storage node carries; part of the deployment contract
pub const STORAGE_PACKAGES: [&str; 7] = [
    "swift",
    "swift-account",
    "swift-container",
    "swift-object",
    "xfsprogs",
    "gdisk",
    "lvm2",
];

/// Turn the fixed package set into the owned form the installer port takes
pub fn storage_packages() -> Vec<String> {
    STORAGE_PACKAGES.iter().map(|p| p.to_string()).collect()
}

/// Installs packages through apt-get and queries dpkg state
pub struct AptPackageInstaller;

impl AptPackageInstaller {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AptPackageInstaller {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PackageInstaller for AptPackageInstaller {
    async fn configure_source(&self, origin: &str) -> Result<()> {
        // "distro" means the stock archives; nothing to add
        if origin.is_empty() || origin == "distro" {
            debug!("using distribution archives");
            return Ok(());
        }

        info!(origin, "configuring installation source");
        run_command(COLLABORATOR, "add-apt-repository", &["--yes", origin])?;
        Ok(())
    }

    async fn update_index(&self) -> Result<()> {
        run_command(COLLABORATOR, "apt-get", &["update", "-q"])?;
        Ok(())
    }

    async fn install(&self, packages: &[String]) -> Result<()> {
        if packages.is_empty() {
            debug!("no packages to install");
            return Ok(());
        }

        info!(?packages, "installing packages");
        let mut args = vec!["install", "--yes", "-q"];
        args.extend(packages.iter().map(String::as_str));
        run_command(COLLABORATOR, "apt-get", &args)?;
        Ok(())
    }

    async fn filter_installed(&self, packages: &[String]) -> Result<Vec<String>> {
        let mut missing = Vec::new();
        for package in packages {
            if !dpkg_installed(package)? {
                missing.push(package.clone());
            }
        }
        debug!(?missing, "packages not yet installed");
        Ok(missing)
    }

    async fn upgrade_available(&self, _origin: Option<&str>) -> Result<bool> {
        // The swift package tracks the storage distribution release
        let policy = run_command(COLLABORATOR, "apt-cache", &["policy", "swift"])?;
        Ok(candidate_newer(&policy))
    }

    async fn run_upgrade(&self, origin: Option<&str>) -> Result<()> {
        if let Some(origin) = origin {
            self.configure_source(origin).await?;
        }
        self.update_index().await?;
        run_command(COLLABORATOR, "apt-get", &["dist-upgrade", "--yes", "-q"])?;
        // Pick up anything the new origin split out of existing packages
        self.install(&storage_packages()).await
    }
}

/// Whether dpkg reports `package` as installed
///
/// dpkg-query exits non-zero for unknown packages, so a command failure
/// here is an answer, not an error.
fn dpkg_installed(package: &str) -> Result<bool> {
    let output = Command::new("dpkg-query")
        .args(["-W", "-f=${Status}", package])
        .output()
        .map_err(|e| {
            Error::collaborator(COLLABORATOR, anyhow!("dpkg-query failed to start: {}", e))
        })?;

    if !output.status.success() {
        return Ok(false);
    }
    Ok(String::from_utf8_lossy(&output.stdout).contains("install ok installed"))
}

/// Parse `apt-cache policy` output for a pending candidate version
fn candidate_newer(policy: &str) -> bool {
    let field = |prefix: &str| {
        policy
            .lines()
            .find_map(|line| line.trim().strip_prefix(prefix))
            .map(str::trim)
    };

    match (field("Installed:"), field("Candidate:")) {
        (Some(installed), Some(candidate)) => {
            installed != "(none)" && candidate != "(none)" && installed != candidate
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(installed: &str, candidate: &str) -> String {
        format!(
            "swift:\n  Installed: {}\n  Candidate: {}\n  Version table:\n",
            installed, candidate
        )
    }

    #[test]
    fn test_candidate_newer_when_versions_differ() {
        assert!(candidate_newer(&policy("2.29.1-0ubuntu1", "2.31.0-0ubuntu1")));
    }

    #[test]
    fn test_no_upgrade_when_versions_match() {
        assert!(!candidate_newer(&policy("2.31.0-0ubuntu1", "2.31.0-0ubuntu1")));
    }

    #[test]
    fn test_not_installed_is_not_an_upgrade() {
        assert!(!candidate_newer(&policy("(none)", "2.31.0-0ubuntu1")));
    }

    #[test]
    fn test_no_candidate_is_not_an_upgrade() {
        assert!(!candidate_newer(&policy("2.29.1-0ubuntu1", "(none)")));
        assert!(!candidate_newer("swift:\n  Version table:\n"));
    }

    #[test]
    fn test_storage_package_set() {
        // Deployment contract: the node always carries the full server set
        // plus the device tooling
        assert_eq!(
            STORAGE_PACKAGES,
            [
                "swift",
                "swift-account",
                "swift-container",
                "swift-object",
                "xfsprogs",
                "gdisk",
                "lvm2",
            ]
        );
    }
}
