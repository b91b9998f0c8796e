//! Relation Store Adapter
//!
//! File-backed relation store: the hook framework reads the advertised
//! settings back as JSON from a well-known path (or stdout when no path is
//! configured) and applies them with its own relation tooling.

use crate::domain::ports::{RelationSettings, RelationStore};
use crate::error::Result;
use async_trait::async_trait;
use std::io::Write;
use std::path::PathBuf;
use tracing::debug;

/// Writes relation settings as a JSON document
pub struct FileRelationStore {
    /// Destination file; stdout when unset
    out_path: Option<PathBuf>,
}

impl FileRelationStore {
    pub fn new(out_path: Option<PathBuf>) -> Self {
        Self { out_path }
    }
}

#[async_trait]
impl RelationStore for FileRelationStore {
    async fn set(&self, settings: &RelationSettings) -> Result<()> {
        let body = serde_json::to_string_pretty(settings)?;
        match &self.out_path {
            Some(path) => {
                std::fs::write(path, body.as_bytes())?;
                debug!("relation settings written to {:?}", path);
            }
            None => {
                // Logs go to stderr, so stdout stays parseable
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(body.as_bytes())?;
                stdout.write_all(b"\n")?;
            }
        }
        Ok(())
    }
}
