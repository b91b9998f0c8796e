//! Relation Advertisement
//!
//! Builds and publishes this node's storage offer on the proxy relation:
//! which block devices it contributes, the three fixed server ports, and its
//! ring-builder zone.

use crate::config::ConfigSnapshot;
use crate::domain::ports::{AddressResolverRef, RelationSettings, RelationStoreRef};
use crate::error::{Error, Result};
use crate::hardware::DeviceSpec;
use serde::{Deserialize, Serialize};
use tracing::info;

// =============================================================================
// Wire Contract
// =============================================================================

/// Object server port; fixed protocol contract with the proxy role
pub const OBJECT_PORT: u16 = 6000;

/// Container server port
pub const CONTAINER_PORT: u16 = 6001;

/// Account server port
pub const ACCOUNT_PORT: u16 = 6002;

// =============================================================================
// Relation Payload
// =============================================================================

/// Settings this node publishes for the proxy to consume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationPayload {
    /// Colon-joined short device names, discovery order
    pub device: String,
    pub object_port: u16,
    pub container_port: u16,
    pub account_port: u16,
    /// Ring-builder zone this node belongs to
    pub zone: u32,
    /// Published only when prefer-ipv6 forces an explicit binding; the
    /// relation protocol distinguishes an absent key from an empty value
    #[serde(rename = "private-address", skip_serializing_if = "Option::is_none")]
    pub private_address: Option<String>,
}

impl RelationPayload {
    /// Flatten into relation settings, preserving field order
    pub fn to_settings(&self) -> RelationSettings {
        let mut settings = RelationSettings::new();
        settings.insert("device".into(), self.device.clone().into());
        settings.insert("object_port".into(), self.object_port.into());
        settings.insert("container_port".into(), self.container_port.into());
        settings.insert("account_port".into(), self.account_port.into());
        settings.insert("zone".into(), self.zone.into());
        if let Some(address) = &self.private_address {
            settings.insert("private-address".into(), address.clone().into());
        }
        settings
    }
}

// =============================================================================
// Relation Advertiser
// =============================================================================

/// Publishes the storage offer through the relation-store collaborator
pub struct RelationAdvertiser {
    relations: RelationStoreRef,
    resolver: AddressResolverRef,
}

impl RelationAdvertiser {
    pub fn new(relations: RelationStoreRef, resolver: AddressResolverRef) -> Self {
        Self {
            relations,
            resolver,
        }
    }

    /// Build the advertisement for `devices` under `config`
    ///
    /// An empty device spec means this node has nothing to offer yet; the
    /// caller treats that as not-ready rather than publishing an empty
    /// device list the proxy would add to the ring.
    pub async fn build_payload(
        &self,
        config: &ConfigSnapshot,
        devices: &DeviceSpec,
    ) -> Result<RelationPayload> {
        if devices.is_empty() {
            return Err(Error::NotReady(
                "no block devices resolved to advertise".into(),
            ));
        }

        let private_address = if config.prefer_ipv6 {
            Some(self.resolver.ipv6_address().await?.to_string())
        } else {
            None
        };

        Ok(RelationPayload {
            device: devices.join(),
            object_port: OBJECT_PORT,
            container_port: CONTAINER_PORT,
            account_port: ACCOUNT_PORT,
            zone: config.zone,
            private_address,
        })
    }

    /// Build the payload and publish it on the relation
    pub async fn advertise(&self, config: &ConfigSnapshot, devices: &DeviceSpec) -> Result<()> {
        let payload = self.build_payload(config, devices).await?;
        info!(
            device = %payload.device,
            zone = payload.zone,
            "advertising storage offer"
        );
        self.relations.set(&payload.to_settings()).await?;
        Ok(())
    }
}
