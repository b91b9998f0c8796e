//! Host System Adapters
//!
//! Concrete implementations of the domain ports against a real Ubuntu host:
//! apt/dpkg for packages, systemctl for services, /proc for addressing, xfs
//! tooling for storage preparation, nrpe drop-ins for monitoring, and the
//! operator's pre-install scripts.

pub mod apt;
pub mod execd;
pub mod net;
pub mod nrpe;
pub mod services;
pub mod storage;

pub use apt::*;
pub use execd::*;
pub use net::*;
pub use nrpe::*;
pub use services::*;
pub use storage::*;

use crate::error::{Error, Result};
use anyhow::anyhow;
use std::process::Command;
use tracing::debug;

/// Run a host command, failing the invocation on a non-zero exit
pub(crate) fn run_command(
    collaborator: &'static str,
    program: &str,
    args: &[&str],
) -> Result<String> {
    debug!(program, ?args, "running host command");

    let output = Command::new(program).args(args).output().map_err(|e| {
        Error::collaborator(collaborator, anyhow!("{} failed to start: {}", program, e))
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::collaborator(
            collaborator,
            anyhow!(
                "{} {} exited {}: {}",
                program,
                args.join(" "),
                output.status,
                stderr.trim()
            ),
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
