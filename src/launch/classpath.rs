// ─── Classpath Builder ───
// Constructs the ordered classpath entry list for a launch.

use std::collections::HashSet;
use std::path::Path;

use tracing::debug;

use crate::error::{LauncherError, LauncherResult};
use crate::plan::DownloadPlan;
use crate::version::resolver::jar_path;
use crate::version::VersionDescriptor;

/// Platform-specific classpath separator.
pub fn classpath_separator() -> &'static str {
    if cfg!(target_os = "windows") {
        ";"
    } else {
        ":"
    }
}

/// Convert a path to a launch-argument string, canonicalizing when
/// possible and stripping the Windows extended-length prefix that breaks
/// JVM classpath handling.
pub fn safe_path_str(path: &Path) -> String {
    let resolved = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let text = resolved.to_string_lossy().to_string();

    #[cfg(target_os = "windows")]
    {
        if let Some(stripped) = text.strip_prefix(r"\\?\") {
            return stripped.to_string();
        }
    }

    text
}

/// Assemble the classpath entry list in order: every planned library and
/// native target that exists on disk (planning order), then the overlay's
/// declared base jar (falling back to the base version id), the base
/// version's own jar, and the overlay version's own jar — each only when
/// present on disk. Entries are deduplicated case-sensitively, first
/// occurrence wins.
pub fn build_classpath(
    plan: &DownloadPlan,
    versions_dir: &Path,
    overlay: &VersionDescriptor,
    base_id: &str,
    overlay_id: &str,
) -> LauncherResult<Vec<String>> {
    let mut entries = Vec::new();

    for path in plan.paths() {
        if path.exists() {
            entries.push(safe_path_str(path));
        } else {
            debug!("Library not found on disk (skipping): {:?}", path);
        }
    }

    let declared_jar = overlay
        .jar
        .as_deref()
        .filter(|id| !id.trim().is_empty())
        .unwrap_or(base_id);
    for id in [declared_jar, base_id, overlay_id] {
        let jar = jar_path(versions_dir, id);
        if jar.exists() {
            entries.push(safe_path_str(&jar));
        }
    }

    let mut seen = HashSet::new();
    entries.retain(|entry| seen.insert(entry.clone()));

    if entries.is_empty() {
        return Err(LauncherError::Config(
            "classpath is empty — nothing to run".into(),
        ));
    }

    Ok(entries)
}
