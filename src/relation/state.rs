//! Proxy Relation State
//!
//! Settings the coordinating proxy publishes on the storage relation. The
//! proxy fills these in once the cluster hash and ring location are known;
//! until both are present this node treats the relation as not ready.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Inbound settings from the coordinating proxy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationState {
    /// Cluster-wide hash shared by every proxy and storage node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swift_hash: Option<String>,

    /// Base URL the proxy serves ring files under
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rings_url: Option<String>,

    /// Remaining published keys, preserved verbatim for the config renderer
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_json::Value>,
}

impl RelationState {
    /// Whether the proxy has published everything a ring sync needs
    pub fn is_complete(&self) -> bool {
        self.swift_hash.is_some() && self.rings_url.is_some()
    }

    /// Required keys the proxy has not published yet
    pub fn missing_keys(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.swift_hash.is_none() {
            missing.push("swift_hash");
        }
        if self.rings_url.is_none() {
            missing.push("rings_url");
        }
        missing
    }
}
