//! Hook Dispatcher
//!
//! Maps each lifecycle event onto its handler. Hook names arrive as strings
//! from the framework; anything unmapped is reported as unrecognized and the
//! invocation still exits cleanly, so new framework events never break the
//! node.

use crate::config::AgentPaths;
use crate::domain::ports::{
    AddressResolverRef, ConfigWriterRef, DeviceScannerRef, MonitorRegistrarRef,
    PackageInstallerRef, RelationStoreRef, RingFetcherRef, ServiceManagerRef, StoragePreparerRef,
};
use crate::engine::{decide, plan_relation_joined, ActionExecutor};
use crate::error::{Error, Result};
use crate::hardware::{DeviceAllocator, DeviceSpec};
use crate::hooks::HookContext;
use crate::relation::RelationAdvertiser;
use crate::ring::RingSync;
use crate::system::{storage_packages, PreinstallRunner};
use std::fs;
use tracing::info;

// =============================================================================
// Hook Names
// =============================================================================

/// Lifecycle events this node handles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    Install,
    ConfigChanged,
    UpgradeCharm,
    RelationJoined,
    RelationChanged,
}

impl Hook {
    /// Resolve a framework hook name to a handler
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "install" => Ok(Hook::Install),
            "config-changed" => Ok(Hook::ConfigChanged),
            "upgrade-charm" => Ok(Hook::UpgradeCharm),
            _ if name.ends_with("-relation-joined") => Ok(Hook::RelationJoined),
            _ if name.ends_with("-relation-changed") => Ok(Hook::RelationChanged),
            _ => Err(Error::UnrecognizedHook(name.to_string())),
        }
    }
}

impl std::fmt::Display for Hook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Hook::Install => "install",
            Hook::ConfigChanged => "config-changed",
            Hook::UpgradeCharm => "upgrade-charm",
            Hook::RelationJoined => "relation-joined",
            Hook::RelationChanged => "relation-changed",
        };
        write!(f, "{}", name)
    }
}

// =============================================================================
// Hook Dispatcher
// =============================================================================

/// Runs one hook invocation against the injected collaborators
pub struct HookDispatcher {
    context: HookContext,
    paths: AgentPaths,
    allocator: DeviceAllocator,
    packages: PackageInstallerRef,
    resolver: AddressResolverRef,
    monitors: MonitorRegistrarRef,
    preparer: StoragePreparerRef,
    preinstall: PreinstallRunner,
    ring_sync: RingSync,
    executor: ActionExecutor,
}

impl HookDispatcher {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        context: HookContext,
        paths: AgentPaths,
        scanner: DeviceScannerRef,
        packages: PackageInstallerRef,
        services: ServiceManagerRef,
        writer: ConfigWriterRef,
        fetcher: RingFetcherRef,
        relations: RelationStoreRef,
        resolver: AddressResolverRef,
        monitors: MonitorRegistrarRef,
        preparer: StoragePreparerRef,
    ) -> Self {
        let allocator = DeviceAllocator::new(scanner);
        let advertiser = RelationAdvertiser::new(relations, resolver.clone());
        let executor = ActionExecutor::new(
            packages.clone(),
            writer.clone(),
            services,
            monitors.clone(),
            advertiser,
        );
        let ring_sync = RingSync::new(writer, fetcher, paths.conf_dir.clone());
        let preinstall = PreinstallRunner::new(paths.preinstall_dir.clone());

        Self {
            context,
            paths,
            allocator,
            packages,
            resolver,
            monitors,
            preparer,
            preinstall,
            ring_sync,
            executor,
        }
    }

    /// Run the handler for `hook`
    pub async fn run(&self, hook: Hook) -> Result<()> {
        info!(hook = %hook, "dispatching");
        match hook {
            Hook::Install => self.install().await,
            Hook::ConfigChanged => self.config_changed().await,
            Hook::UpgradeCharm => self.upgrade_charm().await,
            Hook::RelationJoined => self.relation_joined().await,
            Hook::RelationChanged => self.relation_changed().await,
        }
    }

    /// First boot: packages, directories, and raw device preparation
    async fn install(&self) -> Result<()> {
        let origin = self
            .context
            .config
            .openstack_origin
            .as_deref()
            .unwrap_or("distro");
        self.packages.configure_source(origin).await?;

        self.preinstall.run_all().await?;
        self.packages.update_index().await?;
        self.packages.install(&storage_packages()).await?;

        fs::create_dir_all(&self.paths.conf_dir)?;
        fs::create_dir_all(&self.paths.node_dir)?;

        let devices = self
            .allocator
            .determine_block_devices(&self.context.config)
            .await?;
        self.preparer.prepare(devices.devices()).await
    }

    /// Settings changed: plan and execute the convergence actions
    async fn config_changed(&self) -> Result<()> {
        let config = &self.context.config;

        // Fail before any write when the host cannot honour the preference
        if config.prefer_ipv6 && !self.resolver.supports_ipv6().await? {
            return Err(Error::Ipv6Unsupported);
        }

        let upgrade_available = self
            .packages
            .upgrade_available(config.openstack_origin.as_deref())
            .await?;

        let plan = decide(upgrade_available, self.context.has_monitor_relation(), config);
        self.executor
            .execute(&plan, config, &DeviceSpec::new())
            .await
    }

    /// New agent revision: top up packages and refresh monitoring
    async fn upgrade_charm(&self) -> Result<()> {
        let missing = self.packages.filter_installed(&storage_packages()).await?;
        self.packages.install(&missing).await?;
        self.monitors.update_checks().await
    }

    /// Proxy joined: advertise this node's storage offer
    async fn relation_joined(&self) -> Result<()> {
        let devices = self
            .allocator
            .determine_block_devices(&self.context.config)
            .await?;
        let plan = plan_relation_joined(&devices);
        self.executor
            .execute(&plan, &self.context.config, &devices)
            .await
    }

    /// Proxy published new settings: sync the ring bundle
    async fn relation_changed(&self) -> Result<()> {
        self.ring_sync.on_relation_changed(&self.context.relation).await
    }
}
