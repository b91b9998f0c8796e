//! In-Memory Port Fakes
//!
//! Recording implementations of every domain port. Hook handlers, the
//! decision engine and the ring sync are tested entirely against these;
//! no test in the crate touches the host.

use crate::domain::ports::*;
use crate::error::{Error, Result};
use anyhow::anyhow;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use parking_lot::Mutex;
use std::net::Ipv6Addr;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Return the injected failure, if one was configured
fn injected(name: &'static str, fail: &Option<String>) -> Result<()> {
    match fail {
        Some(reason) => Err(Error::collaborator(name, anyhow!(reason.clone()))),
        None => Ok(()),
    }
}

// =============================================================================
// Device Scanner
// =============================================================================

/// Canned device inventory
pub struct FakeDeviceScanner {
    devices: Vec<BlockDevice>,
    probe_only: Vec<BlockDevice>,
    enumerate_calls: AtomicUsize,
}

impl FakeDeviceScanner {
    pub fn new(devices: Vec<BlockDevice>) -> Self {
        Self {
            devices,
            probe_only: Vec::new(),
            enumerate_calls: AtomicUsize::new(0),
        }
    }

    /// Devices probe can find but enumeration never offers, the way a
    /// partition behaves on a real host
    pub fn with_probe_only(mut self, devices: Vec<BlockDevice>) -> Self {
        self.probe_only = devices;
        self
    }

    pub fn enumerate_calls(&self) -> usize {
        self.enumerate_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeviceScanner for FakeDeviceScanner {
    async fn enumerate(&self) -> Result<Vec<BlockDevice>> {
        self.enumerate_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.devices.clone())
    }

    async fn probe(&self, path: &str) -> Result<Option<BlockDevice>> {
        Ok(self
            .devices
            .iter()
            .chain(self.probe_only.iter())
            .find(|d| d.path == path)
            .cloned())
    }
}

// =============================================================================
// Package Installer
// =============================================================================

/// Records package operations in call order
pub struct FakePackageInstaller {
    installed: Vec<String>,
    upgrade_available: bool,
    fail: Option<String>,
    calls: Mutex<Vec<String>>,
}

impl FakePackageInstaller {
    pub fn new() -> Self {
        Self {
            installed: Vec::new(),
            upgrade_available: false,
            fail: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_installed(mut self, packages: &[&str]) -> Self {
        self.installed = packages.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn with_upgrade_available(mut self) -> Self {
        self.upgrade_available = true;
        self
    }

    pub fn with_failure(mut self, reason: &str) -> Self {
        self.fail = Some(reason.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl PackageInstaller for FakePackageInstaller {
    async fn configure_source(&self, origin: &str) -> Result<()> {
        injected("package-installer", &self.fail)?;
        self.record(format!("configure-source {}", origin));
        Ok(())
    }

    async fn update_index(&self) -> Result<()> {
        injected("package-installer", &self.fail)?;
        self.record("update-index".into());
        Ok(())
    }

    async fn install(&self, packages: &[String]) -> Result<()> {
        injected("package-installer", &self.fail)?;
        self.record(format!("install {}", packages.join(" ")));
        Ok(())
    }

    async fn filter_installed(&self, packages: &[String]) -> Result<Vec<String>> {
        injected("package-installer", &self.fail)?;
        self.record("filter-installed".into());
        Ok(packages
            .iter()
            .filter(|p| !self.installed.contains(p))
            .cloned()
            .collect())
    }

    async fn upgrade_available(&self, _origin: Option<&str>) -> Result<bool> {
        injected("package-installer", &self.fail)?;
        self.record("upgrade-check".into());
        Ok(self.upgrade_available)
    }

    async fn run_upgrade(&self, origin: Option<&str>) -> Result<()> {
        injected("package-installer", &self.fail)?;
        self.record(match origin {
            Some(o) => format!("run-upgrade {}", o),
            None => "run-upgrade".into(),
        });
        Ok(())
    }
}

// =============================================================================
// Service Manager
// =============================================================================

pub struct FakeServiceManager {
    restarted: Mutex<Vec<String>>,
    fail: Option<String>,
}

impl FakeServiceManager {
    pub fn new() -> Self {
        Self {
            restarted: Mutex::new(Vec::new()),
            fail: None,
        }
    }

    pub fn with_failure(mut self, reason: &str) -> Self {
        self.fail = Some(reason.to_string());
        self
    }

    pub fn restarted(&self) -> Vec<String> {
        self.restarted.lock().clone()
    }
}

#[async_trait]
impl ServiceManager for FakeServiceManager {
    async fn restart(&self, service: &str) -> Result<()> {
        injected("service-manager", &self.fail)?;
        self.restarted.lock().push(service.to_string());
        Ok(())
    }
}

// =============================================================================
// Config Writer
// =============================================================================

pub struct FakeConfigWriter {
    write_all_calls: AtomicUsize,
    targets: Mutex<Vec<String>>,
    fail: Option<String>,
}

impl FakeConfigWriter {
    pub fn new() -> Self {
        Self {
            write_all_calls: AtomicUsize::new(0),
            targets: Mutex::new(Vec::new()),
            fail: None,
        }
    }

    pub fn with_failure(mut self, reason: &str) -> Self {
        self.fail = Some(reason.to_string());
        self
    }

    pub fn write_all_count(&self) -> usize {
        self.write_all_calls.load(Ordering::SeqCst)
    }

    pub fn written_targets(&self) -> Vec<String> {
        self.targets.lock().clone()
    }
}

#[async_trait]
impl ConfigWriter for FakeConfigWriter {
    async fn write_all(&self) -> Result<()> {
        injected("config-writer", &self.fail)?;
        self.write_all_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn write(&self, target: &str) -> Result<()> {
        injected("config-writer", &self.fail)?;
        self.targets.lock().push(target.to_string());
        Ok(())
    }
}

// =============================================================================
// Ring Fetcher
// =============================================================================

/// Serves a canned ring bundle for any URL and records what was asked for
pub struct FakeRingFetcher {
    fetched: Mutex<Vec<String>>,
    fail: Option<String>,
}

impl FakeRingFetcher {
    pub fn new() -> Self {
        Self {
            fetched: Mutex::new(Vec::new()),
            fail: None,
        }
    }

    pub fn with_failure(mut self, reason: &str) -> Self {
        self.fail = Some(reason.to_string());
        self
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().clone()
    }
}

#[async_trait]
impl RingFetcher for FakeRingFetcher {
    async fn fetch(&self, url: &str) -> Result<RingBundle> {
        injected("ring-fetcher", &self.fail)?;
        self.fetched.lock().push(url.to_string());
        Ok(RingBundle {
            fetched_from: url.to_string(),
            fetched_at: Utc::now(),
            rings: RING_FILES
                .iter()
                .map(|name| RingArtifact {
                    name: name.to_string(),
                    body: Bytes::from(format!("ring:{}", name)),
                })
                .collect(),
        })
    }
}

// =============================================================================
// Relation Store
// =============================================================================

pub struct FakeRelationStore {
    published: Mutex<Vec<RelationSettings>>,
    fail: Option<String>,
}

impl FakeRelationStore {
    pub fn new() -> Self {
        Self {
            published: Mutex::new(Vec::new()),
            fail: None,
        }
    }

    pub fn with_failure(mut self, reason: &str) -> Self {
        self.fail = Some(reason.to_string());
        self
    }

    pub fn published(&self) -> Vec<RelationSettings> {
        self.published.lock().clone()
    }

    pub fn last(&self) -> Option<RelationSettings> {
        self.published.lock().last().cloned()
    }
}

#[async_trait]
impl RelationStore for FakeRelationStore {
    async fn set(&self, settings: &RelationSettings) -> Result<()> {
        injected("relation-store", &self.fail)?;
        self.published.lock().push(settings.clone());
        Ok(())
    }
}

// =============================================================================
// Address Resolver
// =============================================================================

pub struct FakeAddressResolver {
    ipv6: Option<Ipv6Addr>,
}

impl FakeAddressResolver {
    pub fn unsupported() -> Self {
        Self { ipv6: None }
    }

    pub fn supporting(address: Ipv6Addr) -> Self {
        Self {
            ipv6: Some(address),
        }
    }
}

#[async_trait]
impl AddressResolver for FakeAddressResolver {
    async fn supports_ipv6(&self) -> Result<bool> {
        Ok(self.ipv6.is_some())
    }

    async fn ipv6_address(&self) -> Result<Ipv6Addr> {
        self.ipv6.ok_or(Error::Ipv6Unsupported)
    }
}

// =============================================================================
// Monitor Registrar
// =============================================================================

pub struct FakeMonitorRegistrar {
    updates: AtomicUsize,
}

impl FakeMonitorRegistrar {
    pub fn new() -> Self {
        Self {
            updates: AtomicUsize::new(0),
        }
    }

    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MonitorRegistrar for FakeMonitorRegistrar {
    async fn update_checks(&self) -> Result<()> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// =============================================================================
// Storage Preparer
// =============================================================================

pub struct FakeStoragePreparer {
    prepared: Mutex<Vec<Vec<String>>>,
}

impl FakeStoragePreparer {
    pub fn new() -> Self {
        Self {
            prepared: Mutex::new(Vec::new()),
        }
    }

    /// Device paths handed to each `prepare` call
    pub fn prepared(&self) -> Vec<Vec<String>> {
        self.prepared.lock().clone()
    }
}

#[async_trait]
impl StoragePreparer for FakeStoragePreparer {
    async fn prepare(&self, devices: &[BlockDevice]) -> Result<()> {
        self.prepared
            .lock()
            .push(devices.iter().map(|d| d.path.clone()).collect());
        Ok(())
    }
}
