// ─── Library/Asset Planner ───
// Turns version descriptors into a deduplicated download plan for
// libraries and native classifiers. Planning is single-threaded; the
// concurrent fetch phase only ever reads the finished plan.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::PackConfig;
use crate::downloader::DownloadTarget;
use crate::maven::MavenArtifact;
use crate::rules::RuleContext;
use crate::version::{LibraryDownloads, LibraryEntry, RemoteArtifact, VersionDescriptor};

/// Insertion-ordered download plan keyed by destination path.
///
/// Two logical origins (base vs. overlay descriptor) resolving to the
/// same path collapse to one fetch; the first insertion keeps its slot
/// and its position.
#[derive(Debug, Default)]
pub struct DownloadPlan {
    targets: HashMap<PathBuf, DownloadTarget>,
    order: Vec<PathBuf>,
}

impl DownloadPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, target: DownloadTarget) {
        if self.targets.contains_key(&target.dest) {
            return;
        }
        self.order.push(target.dest.clone());
        self.targets.insert(target.dest.clone(), target);
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Targets in planning order.
    pub fn targets(&self) -> Vec<DownloadTarget> {
        self.order
            .iter()
            .filter_map(|path| self.targets.get(path))
            .cloned()
            .collect()
    }

    /// Destination paths in planning order.
    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.order.iter()
    }
}

/// Plan library and native-classifier downloads for every descriptor, in
/// order, skipping entries the platform rules disallow.
pub fn plan_libraries(
    descriptors: &[&VersionDescriptor],
    libraries_dir: &Path,
    config: &PackConfig,
    ctx: &RuleContext,
) -> DownloadPlan {
    let mut plan = DownloadPlan::new();

    for descriptor in descriptors {
        for entry in &descriptor.libraries {
            if !entry.is_allowed(ctx) {
                debug!("Skipping library (platform rule): {}", entry.name);
                continue;
            }
            plan_entry(&mut plan, entry, libraries_dir, config, ctx);
        }
    }

    plan
}

fn plan_entry(
    plan: &mut DownloadPlan,
    entry: &LibraryEntry,
    libraries_dir: &Path,
    config: &PackConfig,
    ctx: &RuleContext,
) {
    let coordinate = MavenArtifact::parse(&entry.name).ok();

    // Main artifact: direct download data wins; otherwise the coordinate
    // resolves against the entry override or the global repository.
    // Entries carrying only classifier downloads have no main artifact.
    match entry.downloads.as_ref() {
        Some(LibraryDownloads {
            artifact: Some(artifact),
            ..
        }) => {
            if let Some(target) = direct_target(artifact, coordinate.as_ref(), libraries_dir) {
                plan.insert(target);
            }
        }
        Some(downloads) if !downloads.classifiers.is_empty() => {}
        _ => {
            let Some(artifact) = &coordinate else {
                debug!("Skipping malformed library coordinate: {}", entry.name);
                return;
            };
            let repo = entry.url.as_deref().unwrap_or(&config.library_base_url);
            plan.insert(DownloadTarget {
                url: artifact.url(repo),
                dest: libraries_dir.join(artifact.local_path()),
                size: 0,
            });
        }
    }

    // Native classifier for the current OS, when declared.
    let Some(classifier) = entry.native_classifier(ctx) else {
        return;
    };
    if let Some(downloads) = &entry.downloads {
        if let Some(native) = downloads.classifiers.get(&classifier) {
            let native_coordinate =
                coordinate.as_ref().map(|a| a.with_classifier(&classifier));
            if let Some(target) =
                direct_target(native, native_coordinate.as_ref(), libraries_dir)
            {
                plan.insert(target);
            }
        }
    } else if let Some(artifact) = &coordinate {
        let native = artifact.with_classifier(&classifier);
        let repo = entry.url.as_deref().unwrap_or(&config.library_base_url);
        plan.insert(DownloadTarget {
            url: native.url(repo),
            dest: libraries_dir.join(native.local_path()),
            size: 0,
        });
    }
}

fn direct_target(
    artifact: &RemoteArtifact,
    coordinate: Option<&MavenArtifact>,
    libraries_dir: &Path,
) -> Option<DownloadTarget> {
    let relative = match (&artifact.path, coordinate) {
        (Some(path), _) => PathBuf::from(path),
        (None, Some(coord)) => coord.local_path(),
        (None, None) => return None,
    };
    Some(DownloadTarget {
        url: artifact.url.clone(),
        dest: libraries_dir.join(relative),
        size: artifact.size,
    })
}

/// Jar paths of the native-classifier artifacts selected for this
/// platform, in descriptor order. Used by the native extractor.
pub fn native_artifacts(
    descriptors: &[&VersionDescriptor],
    libraries_dir: &Path,
    ctx: &RuleContext,
) -> Vec<PathBuf> {
    let mut jars = Vec::new();

    for descriptor in descriptors {
        for entry in &descriptor.libraries {
            if !entry.is_allowed(ctx) {
                continue;
            }
            let Some(classifier) = entry.native_classifier(ctx) else {
                continue;
            };

            let path = if let Some(native) = entry
                .downloads
                .as_ref()
                .and_then(|d| d.classifiers.get(&classifier))
                .and_then(|a| a.path.as_ref())
            {
                libraries_dir.join(native)
            } else if let Ok(artifact) = MavenArtifact::parse(&entry.name) {
                libraries_dir.join(artifact.with_classifier(&classifier).local_path())
            } else {
                continue;
            };

            if !jars.contains(&path) {
                jars.push(path);
            }
        }
    }

    jars
}
