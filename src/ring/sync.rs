//! Ring Synchronisation
//!
//! Handles a relation-changed firing: once the proxy has published both the
//! cluster hash and the ring location, write the hash config and replace the
//! local ring files with a freshly fetched bundle.

use crate::domain::ports::{ConfigWriterRef, RingBundle, RingFetcherRef};
use crate::error::Result;
use crate::relation::RelationState;
use crate::render::SWIFT_CONF;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

pub struct RingSync {
    writer: ConfigWriterRef,
    fetcher: RingFetcherRef,
    conf_dir: PathBuf,
}

impl RingSync {
    pub fn new(writer: ConfigWriterRef, fetcher: RingFetcherRef, conf_dir: PathBuf) -> Self {
        Self {
            writer,
            fetcher,
            conf_dir,
        }
    }

    /// React to the proxy changing its published settings
    ///
    /// An incomplete relation is part of normal convergence: nothing is
    /// written and the invocation still succeeds. Once complete, the hash
    /// config is written and the bundle re-fetched on every firing; the
    /// fetch is idempotent, so repeats are safe.
    pub async fn on_relation_changed(&self, relation: &RelationState) -> Result<()> {
        let (Some(_), Some(rings_url)) = (&relation.swift_hash, &relation.rings_url) else {
            info!(
                missing = ?relation.missing_keys(),
                "proxy not ready; nothing to sync"
            );
            return Ok(());
        };

        self.writer.write(SWIFT_CONF).await?;

        let bundle = self.fetcher.fetch(rings_url).await?;
        self.persist_bundle(&bundle)
    }

    /// Replace the local ring files with the fetched bundle
    ///
    /// Each body lands in a `.tmp` sibling first and is renamed over the
    /// final name, so a crash mid-write never exposes a partial ring.
    fn persist_bundle(&self, bundle: &RingBundle) -> Result<()> {
        fs::create_dir_all(&self.conf_dir)?;

        for ring in &bundle.rings {
            let final_path = self.conf_dir.join(&ring.name);
            let tmp_path = self.conf_dir.join(format!("{}.tmp", ring.name));

            fs::write(&tmp_path, &ring.body)?;
            fs::rename(&tmp_path, &final_path)?;
            debug!("ring file {:?} replaced", final_path);
        }

        info!(
            url = %bundle.fetched_from,
            bytes = bundle.total_bytes(),
            "ring bundle persisted"
        );
        Ok(())
    }
}
