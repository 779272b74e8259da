use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

use crate::downloader::DownloadTarget;
use crate::error::{LauncherError, LauncherResult};
use crate::http::fetch_text;

/// Top-level asset index document: logical name → content-addressed object.
#[derive(Debug, Deserialize)]
pub struct AssetIndex {
    #[serde(default)]
    pub objects: HashMap<String, AssetObject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetObject {
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub size: u64,
}

/// Object-store path for a content hash:
/// `objects/<first-2-chars>/<full-hash>`. Hashes shorter than two
/// characters are malformed and yield `None` (callers skip them).
pub fn object_relative_path(hash: &str) -> Option<PathBuf> {
    if hash.len() < 2 {
        return None;
    }
    Some(
        PathBuf::from("objects")
            .join(&hash[..2])
            .join(hash),
    )
}

impl AssetIndex {
    /// Fetch the index document, persist it under `indexes/<id>.json`,
    /// and parse it.
    pub async fn fetch_and_store(
        client: &reqwest::Client,
        url: &str,
        id: &str,
        assets_dir: &Path,
    ) -> LauncherResult<Self> {
        let raw = fetch_text(client, url, "asset index").await?;
        let index: AssetIndex = serde_json::from_str(&raw)?;

        let indexes_dir = assets_dir.join("indexes");
        tokio::fs::create_dir_all(&indexes_dir)
            .await
            .map_err(|e| LauncherError::Io {
                path: indexes_dir.clone(),
                source: e,
            })?;
        let index_path = indexes_dir.join(format!("{}.json", id));
        tokio::fs::write(&index_path, &raw)
            .await
            .map_err(|e| LauncherError::Io {
                path: index_path,
                source: e,
            })?;

        info!("Asset index {} lists {} objects", id, index.objects.len());
        Ok(index)
    }

    /// One download target per distinct object. Objects sharing a hash
    /// collapse to a single target; malformed hashes are skipped.
    pub fn plan(&self, assets_dir: &Path, asset_base_url: &str) -> Vec<DownloadTarget> {
        let base = asset_base_url.trim_end_matches('/');
        let mut seen = HashSet::new();
        let mut targets = Vec::new();

        for obj in self.objects.values() {
            let Some(relative) = object_relative_path(&obj.hash) else {
                continue;
            };
            let dest = assets_dir.join(&relative);
            if !seen.insert(dest.clone()) {
                continue;
            }
            targets.push(DownloadTarget {
                url: format!("{}/{}/{}", base, &obj.hash[..2], obj.hash),
                dest,
                size: obj.size,
            });
        }

        targets
    }
}
