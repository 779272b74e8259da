// ─── Version Index ───
// Fetches and scans the remote index of base runtime versions.

use serde::Deserialize;
use tracing::info;

use crate::error::LauncherResult;
use crate::http::fetch_text;

/// Top-level remote version index.
#[derive(Debug, Deserialize)]
pub struct VersionIndex {
    #[serde(default)]
    pub versions: Vec<VersionIndexEntry>,
}

/// A single entry in the index.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionIndexEntry {
    pub id: String,
    #[serde(rename = "type", default)]
    pub version_type: String,
    pub url: String,
}

impl VersionIndex {
    /// Fetch the version index using the shared HTTP client.
    pub async fn fetch(client: &reqwest::Client, url: &str) -> LauncherResult<Self> {
        info!("Fetching version index...");

        let raw = fetch_text(client, url, "version index").await?;
        let index: VersionIndex = serde_json::from_str(&raw)?;

        info!("Loaded {} versions from index", index.versions.len());
        Ok(index)
    }

    /// Find a specific version entry by id, by linear scan.
    pub fn find(&self, id: &str) -> Option<&VersionIndexEntry> {
        self.versions.iter().find(|v| v.id == id)
    }
}
