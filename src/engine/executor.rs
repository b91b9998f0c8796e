//! Action Executor
//!
//! Maps each planned action onto its collaborator call. Execution is
//! fail-fast: the first failing action aborts the rest of the plan and the
//! invocation exits non-zero, leaving retry to the hook framework.

use crate::config::ConfigSnapshot;
use crate::engine::decision::Action;
use crate::domain::ports::{
    ConfigWriterRef, MonitorRegistrarRef, PackageInstallerRef, ServiceManagerRef,
};
use crate::error::Result;
use crate::hardware::DeviceSpec;
use crate::relation::RelationAdvertiser;
use crate::render::RSYNC_CONF;
use tracing::{debug, info};

/// The init service serving rsync replication endpoints
const RSYNC_SERVICE: &str = "rsync";

/// Executes an action plan against the injected collaborators
pub struct ActionExecutor {
    packages: PackageInstallerRef,
    writer: ConfigWriterRef,
    services: ServiceManagerRef,
    monitors: MonitorRegistrarRef,
    advertiser: RelationAdvertiser,
}

impl ActionExecutor {
    pub fn new(
        packages: PackageInstallerRef,
        writer: ConfigWriterRef,
        services: ServiceManagerRef,
        monitors: MonitorRegistrarRef,
        advertiser: RelationAdvertiser,
    ) -> Self {
        Self {
            packages,
            writer,
            services,
            monitors,
            advertiser,
        }
    }

    /// Run `plan` in order, stopping at the first failure
    pub async fn execute(
        &self,
        plan: &[Action],
        config: &ConfigSnapshot,
        devices: &DeviceSpec,
    ) -> Result<()> {
        for action in plan {
            debug!(action = %action, "executing");
            match action {
                Action::RunUpgrade => {
                    info!(
                        origin = config.openstack_origin.as_deref().unwrap_or("distro"),
                        "running storage distribution upgrade"
                    );
                    self.packages
                        .run_upgrade(config.openstack_origin.as_deref())
                        .await?;
                }
                Action::WriteConfig => {
                    self.writer.write_all().await?;
                }
                Action::RestartRsync => {
                    self.writer.write(RSYNC_CONF).await?;
                    self.services.restart(RSYNC_SERVICE).await?;
                }
                Action::RegenNrpe => {
                    self.monitors.update_checks().await?;
                }
                Action::AdvertiseRelation => {
                    self.advertiser.advertise(config, devices).await?;
                }
                Action::NoOp => {
                    debug!("nothing to do");
                }
            }
        }
        Ok(())
    }
}
