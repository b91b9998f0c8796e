//! Config Rendering Module
//!
//! Fixed-file renderer for the swift configuration set. One writer is
//! constructed per invocation with the full rendering context (config
//! snapshot plus relation state) and passed to whoever needs it; there is
//! no process-wide registry of configs.

use crate::config::ConfigSnapshot;
use crate::domain::ports::ConfigWriter;
use crate::error::{Error, Result};
use crate::relation::{RelationState, ACCOUNT_PORT, CONTAINER_PORT, OBJECT_PORT};
use async_trait::async_trait;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

// =============================================================================
// Owned Config Files
// =============================================================================

/// Cluster hash config, written once the proxy publishes `swift_hash`
pub const SWIFT_CONF: &str = "swift.conf";

/// Rsync replication endpoint fragment
pub const RSYNC_CONF: &str = "rsyncd.conf";

pub const ACCOUNT_SERVER_CONF: &str = "account-server.conf";
pub const CONTAINER_SERVER_CONF: &str = "container-server.conf";
pub const OBJECT_SERVER_CONF: &str = "object-server.conf";

// =============================================================================
// Swift Config Writer
// =============================================================================

/// Renders and writes the config files this node owns
pub struct SwiftConfigWriter {
    conf_dir: PathBuf,
    node_dir: PathBuf,
    config: ConfigSnapshot,
    relation: RelationState,
}

impl SwiftConfigWriter {
    pub fn new(
        conf_dir: PathBuf,
        node_dir: PathBuf,
        config: ConfigSnapshot,
        relation: RelationState,
    ) -> Self {
        Self {
            conf_dir,
            node_dir,
            config,
            relation,
        }
    }

    fn bind_ip(&self) -> &'static str {
        if self.config.prefer_ipv6 {
            "::"
        } else {
            "0.0.0.0"
        }
    }

    fn render_swift_conf(&self) -> Result<String> {
        let hash = self
            .relation
            .swift_hash
            .as_deref()
            .ok_or_else(|| Error::ConfigWrite {
                target: SWIFT_CONF.into(),
                reason: "swift_hash not yet published by the proxy".into(),
            })?;
        Ok(format!(
            "[swift-hash]\nswift_hash_path_suffix = {}\n",
            hash
        ))
    }

    fn render_server_conf(&self, kind: &str, port: u16) -> String {
        format!(
            "[DEFAULT]\n\
             bind_ip = {bind_ip}\n\
             bind_port = {port}\n\
             workers = 2\n\
             devices = {devices}\n\
             mount_check = true\n\
             \n\
             [pipeline:main]\n\
             pipeline = recon {kind}-server\n\
             \n\
             [app:{kind}-server]\n\
             use = egg:swift#{kind}\n",
            bind_ip = self.bind_ip(),
            port = port,
            devices = self.node_dir.display(),
            kind = kind,
        )
    }

    fn render_rsync_conf(&self) -> String {
        let mut out = format!(
            "uid = swift\n\
             gid = swift\n\
             log file = /var/log/rsyncd.log\n\
             pid file = /var/run/rsyncd.pid\n\
             address = {}\n",
            self.bind_ip()
        );
        for module in ["account", "container", "object"] {
            out.push_str(&format!(
                "\n[{module}]\n\
                 max connections = 2\n\
                 path = {path}/\n\
                 read only = false\n\
                 lock file = /var/lock/{module}.lock\n",
                module = module,
                path = self.node_dir.display(),
            ));
        }
        out
    }

    fn render(&self, target: &str) -> Result<String> {
        match target {
            SWIFT_CONF => self.render_swift_conf(),
            RSYNC_CONF => Ok(self.render_rsync_conf()),
            ACCOUNT_SERVER_CONF => Ok(self.render_server_conf("account", ACCOUNT_PORT)),
            CONTAINER_SERVER_CONF => Ok(self.render_server_conf("container", CONTAINER_PORT)),
            OBJECT_SERVER_CONF => Ok(self.render_server_conf("object", OBJECT_PORT)),
            other => Err(Error::ConfigWrite {
                target: other.into(),
                reason: "not an owned config file".into(),
            }),
        }
    }

    fn persist(&self, target: &str, body: &str) -> Result<()> {
        fs::create_dir_all(&self.conf_dir)?;
        let path = self.conf_dir.join(target);
        fs::write(&path, body).map_err(|e| Error::ConfigWrite {
            target: target.into(),
            reason: e.to_string(),
        })?;
        debug!("wrote {:?}", path);
        Ok(())
    }
}

#[async_trait]
impl ConfigWriter for SwiftConfigWriter {
    async fn write_all(&self) -> Result<()> {
        for target in [
            ACCOUNT_SERVER_CONF,
            CONTAINER_SERVER_CONF,
            OBJECT_SERVER_CONF,
            RSYNC_CONF,
        ] {
            self.persist(target, &self.render(target)?)?;
        }

        // The hash file waits for the proxy; rendering it empty would poison
        // the cluster hash
        if self.relation.swift_hash.is_some() {
            self.persist(SWIFT_CONF, &self.render(SWIFT_CONF)?)?;
        } else {
            debug!("skipping {}: swift_hash not yet published", SWIFT_CONF);
        }

        info!(dir = %self.conf_dir.display(), "config set written");
        Ok(())
    }

    async fn write(&self, target: &str) -> Result<()> {
        self.persist(target, &self.render(target)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::TempDir;

    fn writer_in(dir: &TempDir, config: ConfigSnapshot, relation: RelationState) -> SwiftConfigWriter {
        SwiftConfigWriter::new(
            dir.path().join("swift"),
            PathBuf::from("/srv/node"),
            config,
            relation,
        )
    }

    fn read(dir: &TempDir, target: &str) -> String {
        fs::read_to_string(dir.path().join("swift").join(target)).unwrap()
    }

    #[tokio::test]
    async fn test_write_all_renders_server_set() {
        let dir = TempDir::new().unwrap();
        let writer = writer_in(&dir, ConfigSnapshot::default(), RelationState::default());

        writer.write_all().await.unwrap();

        assert!(read(&dir, ACCOUNT_SERVER_CONF).contains("bind_port = 6002"));
        assert!(read(&dir, CONTAINER_SERVER_CONF).contains("bind_port = 6001"));
        assert!(read(&dir, OBJECT_SERVER_CONF).contains("bind_port = 6000"));
        assert!(read(&dir, RSYNC_CONF).contains("[object]"));
        assert!(read(&dir, RSYNC_CONF).contains("path = /srv/node/"));
    }

    #[tokio::test]
    async fn test_write_all_skips_hash_file_until_published() {
        let dir = TempDir::new().unwrap();
        let writer = writer_in(&dir, ConfigSnapshot::default(), RelationState::default());

        writer.write_all().await.unwrap();
        assert!(!dir.path().join("swift").join(SWIFT_CONF).exists());

        let relation = RelationState {
            swift_hash: Some("foo_hash".into()),
            ..RelationState::default()
        };
        let writer = writer_in(&dir, ConfigSnapshot::default(), relation);
        writer.write_all().await.unwrap();
        assert!(read(&dir, SWIFT_CONF).contains("swift_hash_path_suffix = foo_hash"));
    }

    #[tokio::test]
    async fn test_write_single_target() {
        let dir = TempDir::new().unwrap();
        let relation = RelationState {
            swift_hash: Some("foo_hash".into()),
            ..RelationState::default()
        };
        let writer = writer_in(&dir, ConfigSnapshot::default(), relation);

        writer.write(SWIFT_CONF).await.unwrap();

        assert_eq!(
            read(&dir, SWIFT_CONF),
            "[swift-hash]\nswift_hash_path_suffix = foo_hash\n"
        );
        // Only the requested file was written
        assert!(!dir.path().join("swift").join(RSYNC_CONF).exists());
    }

    #[tokio::test]
    async fn test_write_hash_file_without_hash_fails() {
        let dir = TempDir::new().unwrap();
        let writer = writer_in(&dir, ConfigSnapshot::default(), RelationState::default());

        let err = writer.write(SWIFT_CONF).await.unwrap_err();
        assert_matches!(err, Error::ConfigWrite { .. });
    }

    #[tokio::test]
    async fn test_write_unknown_target_fails() {
        let dir = TempDir::new().unwrap();
        let writer = writer_in(&dir, ConfigSnapshot::default(), RelationState::default());

        let err = writer.write("proxy-server.conf").await.unwrap_err();
        assert_matches!(err, Error::ConfigWrite { .. });
    }

    #[tokio::test]
    async fn test_prefer_ipv6_binds_wildcard_v6() {
        let dir = TempDir::new().unwrap();
        let config = ConfigSnapshot {
            prefer_ipv6: true,
            ..ConfigSnapshot::default()
        };
        let writer = writer_in(&dir, config, RelationState::default());

        writer.write_all().await.unwrap();

        assert!(read(&dir, OBJECT_SERVER_CONF).contains("bind_ip = ::"));
        assert!(read(&dir, RSYNC_CONF).contains("address = ::"));
    }
}
