//! Pre-install Drop-ins
//!
//! Operators can stage executables in a drop-in directory to run before any
//! package lands (proxy setup, custom archive keys). Scripts run in lexical
//! order and any failure aborts the install.

use crate::error::{Error, Result};
use anyhow::anyhow;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, info};

const COLLABORATOR: &str = "preinstall-runner";

pub struct PreinstallRunner {
    dir: PathBuf,
}

impl PreinstallRunner {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Run every executable drop-in, lexical order, fail-fast
    pub async fn run_all(&self) -> Result<()> {
        if !self.dir.exists() {
            debug!(dir = %self.dir.display(), "no preinstall drop-ins");
            return Ok(());
        }

        let mut scripts = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.is_file() && is_executable(&path) {
                scripts.push(path);
            }
        }
        scripts.sort();

        for script in scripts {
            info!(script = %script.display(), "running preinstall drop-in");
            let output = Command::new(&script).output().map_err(|e| {
                Error::collaborator(
                    COLLABORATOR,
                    anyhow!("{} failed to start: {}", script.display(), e),
                )
            })?;

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(Error::collaborator(
                    COLLABORATOR,
                    anyhow!(
                        "{} exited {}: {}",
                        script.display(),
                        output.status,
                        stderr.trim()
                    ),
                ));
            }
        }
        Ok(())
    }
}

fn is_executable(path: &std::path::Path) -> bool {
    fs::metadata(path)
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::TempDir;

    fn write_script(dir: &TempDir, name: &str, body: &str, mode: u32) {
        let path = dir.path().join(name);
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(mode)).unwrap();
    }

    #[tokio::test]
    async fn test_scripts_run_in_lexical_order() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("order.log");
        let log_str = log.to_string_lossy();

        write_script(&dir, "20-second", &format!("echo second >> {}", log_str), 0o755);
        write_script(&dir, "10-first", &format!("echo first >> {}", log_str), 0o755);

        PreinstallRunner::new(dir.path().to_path_buf())
            .run_all()
            .await
            .unwrap();

        assert_eq!(fs::read_to_string(&log).unwrap(), "first\nsecond\n");
    }

    #[tokio::test]
    async fn test_non_executable_files_are_ignored() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("order.log");

        write_script(
            &dir,
            "notes.txt",
            &format!("echo ran >> {}", log.to_string_lossy()),
            0o644,
        );

        PreinstallRunner::new(dir.path().to_path_buf())
            .run_all()
            .await
            .unwrap();

        assert!(!log.exists());
    }

    #[tokio::test]
    async fn test_failing_script_is_fatal() {
        let dir = TempDir::new().unwrap();
        write_script(&dir, "10-broken", "exit 3", 0o755);

        let err = PreinstallRunner::new(dir.path().to_path_buf())
            .run_all()
            .await
            .unwrap_err();

        assert_matches!(err, Error::Collaborator { name: "preinstall-runner", .. });
    }

    #[tokio::test]
    async fn test_missing_directory_is_fine() {
        PreinstallRunner::new(PathBuf::from("/nonexistent/preinstall.d"))
            .run_all()
            .await
            .unwrap();
    }
}
