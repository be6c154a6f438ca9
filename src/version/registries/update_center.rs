//! Jenkins update center implementation

use std::io::Write;

use tracing::{debug, warn};

use crate::config::{ARCHIVE_EXTENSION, UpdateCenterConfig};
use crate::version::error::FetchError;
use crate::version::manifest::{Manifest, read_manifest};
use crate::version::registry::PluginSource;

/// Plugin source downloading `.hpi` archives from an update center
#[derive(Clone)]
pub struct UpdateCenter {
    client: reqwest::Client,
    latest_url: String,
    download_url: String,
}

impl UpdateCenter {
    /// Creates a new UpdateCenter with custom base URLs
    pub fn new(latest_url: &str, download_url: &str) -> Result<Self, FetchError> {
        Ok(Self {
            client: reqwest::Client::builder()
                .user_agent(concat!("hpi-update/", env!("CARGO_PKG_VERSION")))
                .build()?,
            latest_url: latest_url.trim_end_matches('/').to_string(),
            download_url: download_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &UpdateCenterConfig) -> Result<Self, FetchError> {
        Self::new(&config.latest_url, &config.download_url)
    }

    /// Address of a plugin archive: pinned when `version` is set, latest otherwise
    pub fn archive_url(&self, name: &str, version: &str) -> String {
        if version.is_empty() {
            format!("{}/{}.{}", self.latest_url, name, ARCHIVE_EXTENSION)
        } else {
            format!(
                "{}/{}/{}/{}.{}",
                self.download_url, name, version, name, ARCHIVE_EXTENSION
            )
        }
    }
}

#[async_trait::async_trait]
impl PluginSource for UpdateCenter {
    async fn fetch_manifest(&self, name: &str, version: &str) -> Result<Manifest, FetchError> {
        let url = self.archive_url(name, version);
        debug!("Downloading {}", url);

        let response = self.client.get(&url).send().await?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(url));
        }

        if !status.is_success() {
            warn!("Update center returned status {}: {}", status, url);
            return Err(FetchError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.bytes().await?;

        // The archive is only needed until its manifest has been read
        let mut archive = tempfile::Builder::new()
            .prefix("hpi-update-")
            .suffix(&format!(".{ARCHIVE_EXTENSION}"))
            .tempfile()?;
        archive.write_all(&body)?;
        archive.flush()?;

        let manifest = tokio::task::spawn_blocking(move || read_manifest(archive.path()))
            .await
            .map_err(std::io::Error::other)??;

        debug!("Read {} manifest attributes from {}", manifest.len(), url);
        Ok(manifest)
    }
}
