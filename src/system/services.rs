//! Service Manager Adapter

use crate::domain::ports::ServiceManager;
use crate::error::Result;
use crate::system::run_command;
use async_trait::async_trait;
use tracing::info;

/// Restarts services through systemctl
pub struct SystemdServiceManager;

impl SystemdServiceManager {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemdServiceManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ServiceManager for SystemdServiceManager {
    async fn restart(&self, service: &str) -> Result<()> {
        info!(service, "restarting service");
        run_command("service-manager", "systemctl", &["restart", service])?;
        Ok(())
    }
}
