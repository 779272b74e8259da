// ─── Native Extractor ───
// Unpacks native-library jars into a fresh per-launch directory.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, warn};

use crate::error::{LauncherError, LauncherResult};

/// Archive entries under this prefix are signing/manifest data, not
/// usable native binaries.
const RESERVED_PREFIX: &str = "META-INF";

/// Extract every selected native jar into a fresh timestamp-named
/// directory under `natives_root`, returning the directory. A previous
/// directory of the same name is removed first, so concurrent or
/// successive launches never collide.
pub async fn extract_natives(jars: &[PathBuf], natives_root: &Path) -> LauncherResult<PathBuf> {
    let dest_dir = natives_root.join(format!("natives-{}", Utc::now().timestamp_millis()));

    if dest_dir.exists() {
        let _ = tokio::fs::remove_dir_all(&dest_dir).await;
    }
    tokio::fs::create_dir_all(&dest_dir)
        .await
        .map_err(|e| LauncherError::Io {
            path: dest_dir.clone(),
            source: e,
        })?;

    for jar in jars {
        if !jar.exists() {
            warn!("Native jar missing on disk, skipping: {:?}", jar);
            continue;
        }

        let jar_bytes = tokio::fs::read(jar).await.map_err(|e| LauncherError::Io {
            path: jar.clone(),
            source: e,
        })?;

        let dest = dest_dir.clone();
        let jar_debug = jar.clone();
        tokio::task::spawn_blocking(move || extract_archive(&jar_bytes, &dest, &jar_debug))
            .await
            .map_err(|e| LauncherError::Process(format!("task join error: {}", e)))??;
    }

    Ok(dest_dir)
}

fn extract_archive(jar_bytes: &[u8], dest_dir: &Path, jar_debug: &Path) -> LauncherResult<()> {
    let cursor = std::io::Cursor::new(jar_bytes);
    let mut archive = zip::ZipArchive::new(cursor)?;

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let Some(relative) = file.enclosed_name() else {
            continue;
        };
        if relative.starts_with(RESERVED_PREFIX) {
            continue;
        }

        let out_path = dest_dir.join(&relative);
        if file.is_dir() {
            std::fs::create_dir_all(&out_path).map_err(|e| LauncherError::Io {
                path: out_path.clone(),
                source: e,
            })?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| LauncherError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let mut out = std::fs::File::create(&out_path).map_err(|e| LauncherError::Io {
            path: out_path.clone(),
            source: e,
        })?;
        std::io::copy(&mut file, &mut out).map_err(|e| LauncherError::Io {
            path: out_path.clone(),
            source: e,
        })?;
        debug!("Extracted native entry from {:?}: {:?}", jar_debug, relative);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn native_jar(dir: &Path) -> PathBuf {
        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default();
        writer.start_file("liblwjgl.so", options).unwrap();
        writer.write_all(b"native-bits").unwrap();
        writer.start_file("subdir/extra.so", options).unwrap();
        writer.write_all(b"more-bits").unwrap();
        writer.start_file("META-INF/MANIFEST.MF", options).unwrap();
        writer.write_all(b"Manifest-Version: 1.0").unwrap();
        writer.start_file("META-INF/SIGN.SF", options).unwrap();
        writer.write_all(b"signature").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let jar = dir.join("lwjgl-natives.jar");
        std::fs::write(&jar, bytes).unwrap();
        jar
    }

    #[tokio::test]
    async fn extracts_everything_except_reserved_entries() {
        let temp = tempfile::tempdir().unwrap();
        let jar = native_jar(temp.path());
        let natives_root = temp.path().join("natives");

        let dest = extract_natives(&[jar], &natives_root).await.unwrap();

        assert!(dest.join("liblwjgl.so").exists());
        assert!(dest.join("subdir/extra.so").exists());
        assert!(!dest.join("META-INF").exists());
    }

    #[tokio::test]
    async fn missing_jars_are_skipped() {
        let temp = tempfile::tempdir().unwrap();
        let natives_root = temp.path().join("natives");

        let dest = extract_natives(&[temp.path().join("absent.jar")], &natives_root)
            .await
            .unwrap();
        assert!(dest.exists());
    }
}
