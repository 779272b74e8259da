use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{LauncherError, LauncherResult};

/// Local pack manifest: exactly two named components (base runtime and
/// overlay runtime) plus an optional bundle archive with a mirror.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackManifest {
    pub base: PackComponent,
    pub overlay: PackComponent,
    #[serde(default)]
    pub bundle: Option<BundleSource>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackComponent {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleSource {
    pub url: String,
    #[serde(default)]
    pub mirror: Option<String>,
}

impl PackManifest {
    /// Load a manifest document from disk.
    pub async fn load(path: &Path) -> LauncherResult<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| LauncherError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Source URLs for the bundle archive, primary first.
    pub fn bundle_urls(&self) -> Vec<String> {
        match &self.bundle {
            Some(bundle) => std::iter::once(bundle.url.clone())
                .chain(bundle.mirror.clone())
                .collect(),
            None => vec![],
        }
    }
}
