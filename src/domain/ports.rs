//! Domain Ports - Core trait definitions for the storage agent
//!
//! These traits define the boundaries between the coordination core and the
//! host: every side effect (package installation, device enumeration, config
//! rendering, ring downloads, relation publication) goes through a port, so
//! hook handlers can be exercised against in-memory fakes.

use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::net::Ipv6Addr;
use std::sync::Arc;

// =============================================================================
// Host Types
// =============================================================================

/// A block device discovered on the local host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDevice {
    /// Device path (e.g. /dev/vdb)
    pub path: String,
    /// Total capacity in bytes as reported by enumeration
    pub size_bytes: u64,
}

impl BlockDevice {
    pub fn new(path: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            path: path.into(),
            size_bytes,
        }
    }

    /// Device identifier with the path prefix stripped (`/dev/vdb` -> `vdb`)
    pub fn short_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

impl std::fmt::Display for BlockDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path)
    }
}

// =============================================================================
// Ring Types
// =============================================================================

/// Ring files the coordinating proxy serves under its advertised URL
pub const RING_FILES: [&str; 3] = ["account.ring.gz", "container.ring.gz", "object.ring.gz"];

/// One downloaded ring file
#[derive(Debug, Clone)]
pub struct RingArtifact {
    /// File name within the swift configuration directory
    pub name: String,
    /// Raw gzipped ring body
    pub body: Bytes,
}

/// The complete set of ring files fetched from the coordinating proxy
#[derive(Debug, Clone)]
pub struct RingBundle {
    /// Base URL the bundle was fetched from, exactly as advertised
    pub fetched_from: String,
    /// When the fetch completed
    pub fetched_at: DateTime<Utc>,
    /// Ring bodies in [`RING_FILES`] order
    pub rings: Vec<RingArtifact>,
}

impl RingBundle {
    /// Total payload size across all ring files
    pub fn total_bytes(&self) -> usize {
        self.rings.iter().map(|r| r.body.len()).sum()
    }
}

// =============================================================================
// Relation Types
// =============================================================================

/// Key/value settings published on a relation, in insertion order
pub type RelationSettings = IndexMap<String, serde_json::Value>;

// =============================================================================
// Device Scanner Port
// =============================================================================

/// Port for host block-device enumeration
#[async_trait]
pub trait DeviceScanner: Send + Sync {
    /// Enumerate candidate storage devices, in stable name order
    async fn enumerate(&self) -> Result<Vec<BlockDevice>>;

    /// Look up a single device by path, returning it if present on this host
    ///
    /// Explicitly configured devices bypass the enumeration filters, so a
    /// probe may succeed for devices `enumerate` would skip.
    async fn probe(&self, path: &str) -> Result<Option<BlockDevice>>;
}

// =============================================================================
// Package Installer Port
// =============================================================================

/// Port for distribution package management
#[async_trait]
pub trait PackageInstaller: Send + Sync {
    /// Point the package index at the given installation source
    async fn configure_source(&self, origin: &str) -> Result<()>;

    /// Refresh the package index
    async fn update_index(&self) -> Result<()>;

    /// Install `packages`; any failure is fatal to the invocation
    async fn install(&self, packages: &[String]) -> Result<()>;

    /// Subset of `packages` not currently installed
    async fn filter_installed(&self, packages: &[String]) -> Result<Vec<String>>;

    /// Whether the configured origin offers a newer storage distribution
    /// than what is installed
    async fn upgrade_available(&self, origin: Option<&str>) -> Result<bool>;

    /// Upgrade the storage distribution from `origin`; the installer owns
    /// any retry policy for transient package failures
    async fn run_upgrade(&self, origin: Option<&str>) -> Result<()>;
}

// =============================================================================
// Service Manager Port
// =============================================================================

/// Port for init-system service control
#[async_trait]
pub trait ServiceManager: Send + Sync {
    /// Restart a system service
    async fn restart(&self, service: &str) -> Result<()>;
}

// =============================================================================
// Config Writer Port
// =============================================================================

/// Port for the templated-config-writer collaborator
///
/// The writer is constructed once per invocation with the full rendering
/// context (config snapshot plus relation state); there is no process-wide
/// registry of configs.
#[async_trait]
pub trait ConfigWriter: Send + Sync {
    /// Render and write every config file this node owns
    async fn write_all(&self) -> Result<()>;

    /// Render and write exactly one owned config file
    async fn write(&self, target: &str) -> Result<()>;
}

// =============================================================================
// Ring Fetcher Port
// =============================================================================

/// Port for downloading the ring bundle from the coordinating proxy
#[async_trait]
pub trait RingFetcher: Send + Sync {
    /// Download the ring bundle advertised at `url`
    ///
    /// Idempotent and safe to repeat; no retries at this layer. Any failure
    /// must surface rather than leave the caller believing a stale ring is
    /// current.
    async fn fetch(&self, url: &str) -> Result<RingBundle>;
}

// =============================================================================
// Relation Store Port
// =============================================================================

/// Port for publishing this node's settings on the storage relation
#[async_trait]
pub trait RelationStore: Send + Sync {
    /// Publish `settings` for peer roles to consume
    async fn set(&self, settings: &RelationSettings) -> Result<()>;
}

// =============================================================================
// Address Resolver Port
// =============================================================================

/// Port for host address resolution
#[async_trait]
pub trait AddressResolver: Send + Sync {
    /// Whether the host networking stack can satisfy `prefer-ipv6`
    async fn supports_ipv6(&self) -> Result<bool>;

    /// Global unicast IPv6 address of the advertised binding
    async fn ipv6_address(&self) -> Result<Ipv6Addr>;
}

// =============================================================================
// Monitor Registrar Port
// =============================================================================

/// Port for the monitoring-agent registration collaborator
#[async_trait]
pub trait MonitorRegistrar: Send + Sync {
    /// Regenerate monitoring check definitions for this node
    async fn update_checks(&self) -> Result<()>;
}

// =============================================================================
// Storage Preparer Port
// =============================================================================

/// Port for preparing raw devices for object-storage use
#[async_trait]
pub trait StoragePreparer: Send + Sync {
    /// Format and mount `devices`; must be idempotent because the framework
    /// may redeliver the install event
    async fn prepare(&self, devices: &[BlockDevice]) -> Result<()>;
}

// =============================================================================
// Type Aliases for Arc'd Traits
// =============================================================================

pub type DeviceScannerRef = Arc<dyn DeviceScanner>;
pub type PackageInstallerRef = Arc<dyn PackageInstaller>;
pub type ServiceManagerRef = Arc<dyn ServiceManager>;
pub type ConfigWriterRef = Arc<dyn ConfigWriter>;
pub type RingFetcherRef = Arc<dyn RingFetcher>;
pub type RelationStoreRef = Arc<dyn RelationStore>;
pub type AddressResolverRef = Arc<dyn AddressResolver>;
pub type MonitorRegistrarRef = Arc<dyn MonitorRegistrar>;
pub type StoragePreparerRef = Arc<dyn StoragePreparer>;
