//! Swift Storage Agent - Device-to-Ring Coordination Core
//!
//! Node-side configuration agent for a distributed object-storage service.
//! The deployment framework invokes it once per lifecycle hook; the agent
//! turns the node's raw block devices into formatted, mounted, advertised
//! storage and keeps the local swift daemons aligned with the cluster-wide
//! ring state published by the proxy.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Hook Dispatcher                       │
//! │  install · config-changed · upgrade-charm · relation hooks  │
//! ├───────────────┬─────────────────┬───────────────────────────┤
//! │    Device     │    Decision     │   Relation Advertiser     │
//! │   Allocator   │     Engine      │      + Ring Sync          │
//! ├───────────────┴─────────────────┴───────────────────────────┤
//! │                        Domain Ports                         │
//! │  scanner · packages · services · writer · fetcher · store   │
//! ├─────────────────────────────────────────────────────────────┤
//! │                        Host Adapters                        │
//! │  sysfs · apt/dpkg · systemctl · reqwest · /proc · xfs/mount │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`hooks`]: Hook name parsing, invocation context, and the dispatcher
//!   that drives one hook end to end
//! - [`engine`]: Pure planning (which actions a hook implies) and the
//!   executor that carries a plan out through the ports
//! - [`hardware`]: Block device discovery via sysfs and hint-driven
//!   device selection
//! - [`relation`]: Proxy relation state, the advertised payload, and its
//!   sink
//! - [`ring`]: Ring artifact download and atomic persistence
//! - [`render`]: Swift and rsync configuration file rendering
//! - [`system`]: Host adapters (apt, systemd, nrpe, xfs, /proc, execd)
//! - [`domain`]: Core types and the port traits every adapter implements
//! - [`config`]: Deployed configuration snapshot and filesystem roots
//! - [`error`]: Error taxonomy and exit-code dispositions

pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod hardware;
pub mod hooks;
pub mod relation;
pub mod render;
pub mod ring;
pub mod system;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use config::{AgentPaths, ConfigSnapshot, DEFAULT_ZONE, GUESS_DEVICES};
pub use domain::ports::{
    AddressResolver, AddressResolverRef, ConfigWriter, ConfigWriterRef, DeviceScanner,
    DeviceScannerRef, MonitorRegistrar, MonitorRegistrarRef, PackageInstaller,
    PackageInstallerRef, RelationStore, RelationStoreRef, RingFetcher, RingFetcherRef,
    ServiceManager, ServiceManagerRef, StoragePreparer, StoragePreparerRef,
};
pub use domain::{BlockDevice, RelationSettings, RingArtifact, RingBundle, RING_FILES};
pub use engine::{decide, plan_relation_joined, Action, ActionExecutor};
pub use error::{Disposition, Error, Result};
pub use hardware::{DeviceAllocator, DeviceSpec, ScannerConfig, SysfsDeviceScanner};
pub use hooks::{Hook, HookContext, HookDispatcher, MONITOR_RELATION};
pub use relation::{
    FileRelationStore, RelationAdvertiser, RelationPayload, RelationState, ACCOUNT_PORT,
    CONTAINER_PORT, OBJECT_PORT,
};
pub use render::SwiftConfigWriter;
pub use ring::{HttpRingFetcher, RingSync};
pub use system::{
    storage_packages, AptPackageInstaller, NrpeMonitorRegistrar, PreinstallRunner,
    ProcAddressResolver, SystemdServiceManager, XfsStoragePreparer, DEFAULT_NRPE_DIR,
    STORAGE_PACKAGES,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
