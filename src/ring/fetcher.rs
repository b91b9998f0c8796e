//! Ring Fetcher Adapter
//!
//! Downloads the three ring files from the URL the proxy advertised. The
//! bodies download concurrently; any missing file or non-2xx answer fails
//! the whole bundle so a partial set never reaches the persist step.

use crate::domain::ports::{RingArtifact, RingBundle, RingFetcher, RING_FILES};
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use futures::future::try_join_all;
use std::time::Duration;
use tracing::{debug, info};

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches ring files over HTTP with a pooled client
pub struct HttpRingFetcher {
    client: reqwest::Client,
}

impl HttpRingFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| Error::collaborator("ring-fetcher", e))?;
        Ok(Self { client })
    }

    async fn fetch_one(&self, base_url: &str, name: &str) -> Result<RingArtifact> {
        let url = join_url(base_url, name);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|source| Error::RingFetch {
                url: url.clone(),
                source,
            })?;
        let body = response.bytes().await.map_err(|source| Error::RingFetch {
            url: url.clone(),
            source,
        })?;

        debug!(url = %url, bytes = body.len(), "ring file fetched");
        Ok(RingArtifact {
            name: name.to_string(),
            body,
        })
    }
}

#[async_trait]
impl RingFetcher for HttpRingFetcher {
    async fn fetch(&self, url: &str) -> Result<RingBundle> {
        let rings = try_join_all(RING_FILES.iter().map(|name| self.fetch_one(url, name))).await?;

        let bundle = RingBundle {
            fetched_from: url.to_string(),
            fetched_at: Utc::now(),
            rings,
        };
        info!(
            url = %url,
            bytes = bundle.total_bytes(),
            "ring bundle fetched"
        );
        Ok(bundle)
    }
}

/// Join the advertised base URL with a ring file name
fn join_url(base_url: &str, name: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url_handles_trailing_slash() {
        assert_eq!(
            join_url("http://proxy/rings/", "object.ring.gz"),
            "http://proxy/rings/object.ring.gz"
        );
        assert_eq!(
            join_url("http://proxy/rings", "object.ring.gz"),
            "http://proxy/rings/object.ring.gz"
        );
    }

    #[test]
    fn test_client_builds() {
        assert!(HttpRingFetcher::new().is_ok());
    }
}
