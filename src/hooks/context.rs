//! Hook Invocation Context
//!
//! Everything the framework knows at the moment it fires a hook: the
//! deployment config, the triggering relation's settings, and which relation
//! types exist. Supplied as one JSON document; a missing document means a
//! fresh deployment with nothing set yet.

use crate::config::ConfigSnapshot;
use crate::error::Result;
use crate::relation::RelationState;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Relation type whose presence enables monitoring-check regeneration
pub const MONITOR_RELATION: &str = "nrpe-external-master";

/// Inputs for one hook invocation
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HookContext {
    /// Deployment settings at the time of the invocation
    pub config: ConfigSnapshot,

    /// Settings of the relation that triggered this invocation
    pub relation: RelationState,

    /// Relation types currently established for this node
    pub relation_types: Vec<String>,
}

impl HookContext {
    /// Load the context document, treating an absent one as empty
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            debug!("no context path; using defaults");
            return Ok(Self::default());
        };
        if !path.exists() {
            debug!("context {:?} not found; using defaults", path);
            return Ok(Self::default());
        }

        let body = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Whether a monitoring relation is established
    pub fn has_monitor_relation(&self) -> bool {
        self.relation_types.iter().any(|t| t == MONITOR_RELATION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_no_path_means_defaults() {
        let context = HookContext::load(None).unwrap();

        assert_eq!(context.config.zone, 1);
        assert!(context.relation.swift_hash.is_none());
        assert!(context.relation_types.is_empty());
    }

    #[test]
    fn test_missing_file_means_defaults() {
        let context = HookContext::load(Some(Path::new("/nonexistent/context.json"))).unwrap();
        assert!(!context.has_monitor_relation());
    }

    #[test]
    fn test_load_full_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("context.json");
        fs::write(
            &path,
            r#"{
                "config": {"prefer-ipv6": true, "zone": 2, "block-device": "/dev/vdb"},
                "relation": {"swift_hash": "foo_hash", "rings_url": "http://proxy/rings/"},
                "relation_types": ["swift-storage", "nrpe-external-master"]
            }"#,
        )
        .unwrap();

        let context = HookContext::load(Some(&path)).unwrap();

        assert!(context.config.prefer_ipv6);
        assert_eq!(context.config.zone, 2);
        assert!(context.relation.is_complete());
        assert!(context.has_monitor_relation());
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("context.json");
        fs::write(&path, r#"{"relation_types": ["swift-storage"]}"#).unwrap();

        let context = HookContext::load(Some(&path)).unwrap();

        assert_eq!(context.config.block_device, "guess");
        assert!(!context.has_monitor_relation());
    }

    #[test]
    fn test_malformed_document_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("context.json");
        fs::write(&path, "not json").unwrap();

        assert!(HookContext::load(Some(&path)).is_err());
    }
}
