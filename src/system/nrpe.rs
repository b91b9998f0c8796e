//! Monitor Registrar Adapter
//!
//! Writes nrpe check definitions for the storage services and reloads the
//! monitoring agent. Regeneration is a full rewrite, so repeated calls
//! converge to the same check set.

use crate::domain::ports::{MonitorRegistrar, ServiceManagerRef};
use crate::error::Result;
use async_trait::async_trait;
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// Storage services the monitoring agent watches
const MONITORED_SERVICES: [&str; 3] = ["swift-account", "swift-container", "swift-object"];

const NRPE_SERVICE: &str = "nagios-nrpe-server";

/// Drop-in directory the nrpe daemon includes on a stock install
pub const DEFAULT_NRPE_DIR: &str = "/etc/nagios/nrpe.d";

pub struct NrpeMonitorRegistrar {
    /// Drop-in directory the nrpe daemon includes (`/etc/nagios/nrpe.d`)
    checks_dir: PathBuf,
    services: ServiceManagerRef,
}

impl NrpeMonitorRegistrar {
    pub fn new(checks_dir: PathBuf, services: ServiceManagerRef) -> Self {
        Self {
            checks_dir,
            services,
        }
    }

    fn check_definition(service: &str) -> String {
        format!(
            "# generated; do not edit\n\
             command[check_{service}]=/usr/lib/nagios/plugins/check_procs -c 1: -C {service}-server\n",
            service = service
        )
    }
}

#[async_trait]
impl MonitorRegistrar for NrpeMonitorRegistrar {
    async fn update_checks(&self) -> Result<()> {
        fs::create_dir_all(&self.checks_dir)?;

        for service in MONITORED_SERVICES {
            let path = self.checks_dir.join(format!("check_{}.cfg", service));
            fs::write(&path, Self::check_definition(service))?;
        }

        info!(
            dir = %self.checks_dir.display(),
            checks = MONITORED_SERVICES.len(),
            "monitoring checks regenerated"
        );
        self.services.restart(NRPE_SERVICE).await
    }
}
