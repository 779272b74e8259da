// ─── Version Resolver ───
// Turns a pack manifest into fully-resolved version descriptors: the base
// runtime via the remote index, the overlay runtime via its installer
// archive. Also performs the no-network installed-id lookup at launch time.

use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::PackConfig;
use crate::downloader::{DownloadTarget, Downloader};
use crate::error::{LauncherError, LauncherResult};
use crate::http::fetch_text;
use crate::maven::MavenArtifact;
use crate::version::{VersionDescriptor, VersionIndex};

/// Metadata file path for a version id inside the store.
pub fn metadata_path(versions_dir: &Path, id: &str) -> PathBuf {
    versions_dir.join(id).join(format!("{}.json", id))
}

/// Jar path for a version id inside the store.
pub fn jar_path(versions_dir: &Path, id: &str) -> PathBuf {
    versions_dir.join(id).join(format!("{}.jar", id))
}

/// Resolve the base runtime descriptor from the remote version index and
/// persist its raw document into the local version store.
pub async fn resolve_base(
    client: &reqwest::Client,
    config: &PackConfig,
    version_id: &str,
) -> LauncherResult<VersionDescriptor> {
    let index = VersionIndex::fetch(client, &config.version_index_url).await?;
    let entry = index.find(version_id).ok_or_else(|| {
        LauncherError::NotFound(format!("version {} not present in remote index", version_id))
    })?;

    let raw = fetch_text(client, &entry.url, "base version metadata").await?;
    let descriptor: VersionDescriptor = serde_json::from_str(&raw)?;

    save_metadata(&config.versions_dir(), version_id, &raw).await?;
    info!("Resolved base runtime {}", version_id);
    Ok(descriptor)
}

/// Download the base runtime's own jar into the version store, when the
/// descriptor declares one.
pub async fn download_client_jar(
    downloader: &Downloader,
    config: &PackConfig,
    descriptor: &VersionDescriptor,
    version_id: &str,
) -> LauncherResult<()> {
    let Some(client_dl) = descriptor
        .downloads
        .as_ref()
        .and_then(|d| d.client.as_ref())
    else {
        debug!("No client jar declared for {}", version_id);
        return Ok(());
    };

    let target = DownloadTarget {
        url: client_dl.url.clone(),
        dest: jar_path(&config.versions_dir(), version_id),
        size: client_dl.size,
    };
    downloader.fetch(&target, "client jar").await?;
    info!("Fetched client jar for {}", version_id);
    Ok(())
}

/// Resolve the overlay runtime descriptor by downloading the installer
/// artifact (`<group>:<artifact>:<base>-<overlay>:installer`) and reading
/// the single embedded metadata entry, without full extraction.
///
/// Each configured installer repository is tried in order.
pub async fn resolve_overlay(
    downloader: &Downloader,
    config: &PackConfig,
    base_version: &str,
    overlay_version: &str,
) -> LauncherResult<VersionDescriptor> {
    let installer = MavenArtifact {
        group_id: config.installer_group.clone(),
        artifact_id: config.installer_artifact.clone(),
        version: format!("{}-{}", base_version, overlay_version),
        classifier: Some("installer".into()),
        packaging: "jar".into(),
    };

    let urls: Vec<String> = config
        .installer_repositories
        .iter()
        .map(|repo| installer.url(repo))
        .collect();
    let scratch = config.cache_dir().join("installers").join(installer.filename());
    downloader
        .fetch_with_fallback(&urls, &scratch, 0, "overlay installer")
        .await?;

    let installer_bytes = tokio::fs::read(&scratch)
        .await
        .map_err(|e| LauncherError::Io {
            path: scratch.clone(),
            source: e,
        })?;

    let raw = tokio::task::spawn_blocking(move || read_embedded_descriptor(&installer_bytes))
        .await
        .map_err(|e| LauncherError::Process(format!("task join error: {}", e)))??;

    let descriptor: VersionDescriptor = serde_json::from_str(&raw)?;
    let id = if descriptor.id.is_empty() {
        format!("{}-{}", base_version, overlay_version)
    } else {
        descriptor.id.clone()
    };
    save_metadata(&config.versions_dir(), &id, &raw).await?;
    info!("Resolved overlay runtime {}", id);
    Ok(descriptor)
}

fn read_embedded_descriptor(installer_bytes: &[u8]) -> LauncherResult<String> {
    let cursor = std::io::Cursor::new(installer_bytes);
    let mut archive = zip::ZipArchive::new(cursor)?;

    let mut file = archive.by_name("version.json").map_err(|e| {
        LauncherError::NotFound(format!("version.json missing from installer archive: {}", e))
    })?;
    let mut raw = String::new();
    file.read_to_string(&mut raw)?;
    Ok(raw)
}

/// Launch-time lookup of the installed overlay version id. No network.
///
/// Tries the conventional `<base>-<overlay-name>-<overlay-version>` id
/// first; otherwise scans the version store for any entry whose name
/// contains both the overlay name and version and has a metadata file.
pub fn installed_overlay_id(
    versions_dir: &Path,
    base_version: &str,
    overlay_name: &str,
    overlay_version: &str,
) -> LauncherResult<String> {
    let conventional = format!("{}-{}-{}", base_version, overlay_name, overlay_version);
    if metadata_path(versions_dir, &conventional).exists() {
        return Ok(conventional);
    }

    let mut candidates: Vec<String> = std::fs::read_dir(versions_dir)
        .map_err(|e| LauncherError::Io {
            path: versions_dir.to_path_buf(),
            source: e,
        })?
        .flatten()
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.contains(overlay_name) && name.contains(overlay_version))
        .filter(|name| metadata_path(versions_dir, name).exists())
        .collect();
    candidates.sort();

    candidates.into_iter().next().ok_or_else(|| {
        LauncherError::NotFound(format!(
            "no installed overlay metadata for {} {} under {:?}",
            overlay_name, overlay_version, versions_dir
        ))
    })
}

/// Load an installed descriptor from the version store.
pub fn load_installed(versions_dir: &Path, id: &str) -> LauncherResult<VersionDescriptor> {
    let path = metadata_path(versions_dir, id);
    if !path.exists() {
        return Err(LauncherError::NotFound(format!(
            "version metadata not installed: {}",
            id
        )));
    }
    let raw = std::fs::read_to_string(&path).map_err(|e| LauncherError::Io {
        path: path.clone(),
        source: e,
    })?;
    Ok(serde_json::from_str(&raw)?)
}

async fn save_metadata(versions_dir: &Path, id: &str, raw: &str) -> LauncherResult<()> {
    let path = metadata_path(versions_dir, id);
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| LauncherError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
    }
    tokio::fs::write(&path, raw)
        .await
        .map_err(|e| LauncherError::Io { path, source: e })
}
