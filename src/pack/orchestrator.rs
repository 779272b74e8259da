// ─── Pack Orchestrator ───
// Sequences one-time installation and the launch sequence; owns the
// single progress channel and the active launch session.

use std::path::Path;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::info;

use crate::assets::AssetIndex;
use crate::auth::Credential;
use crate::config::PackConfig;
use crate::downloader::Downloader;
use crate::error::{LauncherError, LauncherResult};
use crate::http::build_http_client;
use crate::launch::{
    build_arguments, build_classpath, classpath_separator, extract_natives, ArgumentContext,
    GameProcess, LaunchPlan,
};
use crate::plan::{native_artifacts, plan_libraries};
use crate::progress::{ProgressChannel, ProgressEvent};
use crate::rules::RuleContext;
use crate::version::resolver;

use super::PackManifest;

/// Mutable record of the active launch, owned exclusively by the
/// orchestrator instance.
pub struct LaunchSession {
    pub version_id: String,
    pub started_at: DateTime<Utc>,
    pub process: GameProcess,
}

/// Composes the whole pipeline. Construction takes the immutable
/// configuration; all per-launch state lives in the session record.
pub struct PackOrchestrator {
    config: PackConfig,
    client: reqwest::Client,
    downloader: Downloader,
    progress: ProgressChannel,
    session: Option<LaunchSession>,
}

impl PackOrchestrator {
    pub fn new(config: PackConfig) -> LauncherResult<Self> {
        let progress = ProgressChannel::new();
        let client = build_http_client(&config).map_err(LauncherError::Http)?;
        let downloader = Downloader::new(client.clone(), progress.clone());

        Ok(Self {
            config,
            client,
            downloader,
            progress,
            session: None,
        })
    }

    pub fn config(&self) -> &PackConfig {
        &self.config
    }

    /// Subscribe to the single progress channel. `None` means idle.
    pub fn progress(&self) -> watch::Receiver<Option<ProgressEvent>> {
        self.progress.subscribe()
    }

    /// The active launch session, when a game is running.
    pub fn session(&self) -> Option<&LaunchSession> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut LaunchSession> {
        self.session.as_mut()
    }

    /// One-time installation: base runtime, bundle files, overlay runtime,
    /// libraries, and assets. Idempotent — a finished install short-circuits
    /// on its marker, and every fetch skips up-to-date files anyway.
    pub async fn ensure_install(&self, manifest: &PackManifest) -> LauncherResult<()> {
        let marker = self
            .config
            .install_marker(&manifest.base.version, &manifest.overlay.version);
        if marker.exists() {
            info!(
                "Pack {}-{} already installed",
                manifest.base.version, manifest.overlay.version
            );
            self.progress.idle();
            return Ok(());
        }

        self.progress.indeterminate("Resolving base runtime");
        let base =
            resolver::resolve_base(&self.client, &self.config, &manifest.base.version).await?;
        resolver::download_client_jar(
            &self.downloader,
            &self.config,
            &base,
            &manifest.base.version,
        )
        .await?;

        self.install_bundle(manifest).await?;

        self.progress.indeterminate("Resolving overlay runtime");
        let overlay = resolver::resolve_overlay(
            &self.downloader,
            &self.config,
            &manifest.base.version,
            &manifest.overlay.version,
        )
        .await?;

        let ctx = RuleContext::current();
        let libraries = plan_libraries(
            &[&base, &overlay],
            &self.config.libraries_dir(),
            &self.config,
            &ctx,
        );
        self.downloader
            .fetch_all(&libraries.targets(), "Downloading libraries")
            .await?;

        if let Some(index_ref) = overlay.asset_index.as_ref().or(base.asset_index.as_ref()) {
            let index = AssetIndex::fetch_and_store(
                &self.client,
                &index_ref.url,
                &index_ref.id,
                &self.config.assets_dir(),
            )
            .await?;
            let targets = index.plan(&self.config.assets_dir(), &self.config.asset_base_url);
            self.downloader
                .fetch_throttled(
                    &targets,
                    "Downloading assets",
                    self.config.asset_concurrency,
                )
                .await?;
        }

        if let Some(parent) = marker.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| LauncherError::Io {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        tokio::fs::write(&marker, Utc::now().to_rfc3339())
            .await
            .map_err(|e| LauncherError::Io {
                path: marker.clone(),
                source: e,
            })?;

        info!(
            "Installed pack {}-{}",
            manifest.base.version, manifest.overlay.version
        );
        self.progress.idle();
        Ok(())
    }

    /// Fetch the bundle archive (primary URL, then mirror) and expand it
    /// into the game directory.
    async fn install_bundle(&self, manifest: &PackManifest) -> LauncherResult<()> {
        let urls = manifest.bundle_urls();
        if urls.is_empty() {
            return Ok(());
        }

        self.progress.indeterminate("Fetching bundle");
        let scratch = self.config.cache_dir().join("bundle.zip");
        self.downloader
            .fetch_with_fallback(&urls, &scratch, 0, "bundle archive")
            .await?;

        let game_dir = self.config.game_dir();
        tokio::fs::create_dir_all(&game_dir)
            .await
            .map_err(|e| LauncherError::Io {
                path: game_dir.clone(),
                source: e,
            })?;

        let bytes = tokio::fs::read(&scratch)
            .await
            .map_err(|e| LauncherError::Io {
                path: scratch.clone(),
                source: e,
            })?;
        tokio::task::spawn_blocking(move || expand_archive(&bytes, &game_dir))
            .await
            .map_err(|e| LauncherError::Process(format!("task join error: {}", e)))??;

        info!("Bundle expanded into game directory");
        Ok(())
    }

    /// Assemble a fresh launch plan from locally installed metadata.
    /// No network access.
    pub async fn prepare_launch(
        &self,
        manifest: &PackManifest,
        credential: &Credential,
    ) -> LauncherResult<LaunchPlan> {
        let versions_dir = self.config.versions_dir();
        let base_id = manifest.base.version.as_str();
        let overlay_id = resolver::installed_overlay_id(
            &versions_dir,
            base_id,
            &manifest.overlay.name,
            &manifest.overlay.version,
        )?;
        let base = resolver::load_installed(&versions_dir, base_id)?;
        let overlay = resolver::load_installed(&versions_dir, &overlay_id)?;

        let ctx = RuleContext::current();
        let libraries_dir = self.config.libraries_dir();
        let libraries = plan_libraries(&[&base, &overlay], &libraries_dir, &self.config, &ctx);

        let native_jars = native_artifacts(&[&base, &overlay], &libraries_dir, &ctx);
        let natives_dir = extract_natives(&native_jars, &self.config.natives_dir()).await?;

        let classpath_entries =
            build_classpath(&libraries, &versions_dir, &overlay, base_id, &overlay_id)?;
        let classpath = classpath_entries.join(classpath_separator());

        let asset_index_id = overlay
            .asset_index
            .as_ref()
            .or(base.asset_index.as_ref())
            .map(|index| index.id.clone())
            .unwrap_or_else(|| "legacy".into());

        let game_dir = self.config.game_dir();
        let assets_dir = self.config.assets_dir();
        let arguments = build_arguments(
            &base,
            &overlay,
            &ArgumentContext {
                credential,
                version_id: &overlay_id,
                game_dir: &game_dir,
                assets_dir: &assets_dir,
                asset_index_id: &asset_index_id,
                natives_dir: &natives_dir,
                libraries_dir: &libraries_dir,
                classpath: &classpath,
                jvm_tuning_flags: &self.config.jvm_tuning_flags,
                launcher_name: &self.config.launcher_name,
                launcher_version: &self.config.launcher_version,
                version_type: &self.config.version_type,
            },
            &ctx,
        )?;

        Ok(LaunchPlan {
            version_id: overlay_id,
            executable: self.config.java_executable.clone(),
            jvm_args: arguments.jvm,
            main_class: arguments.main_class,
            game_args: arguments.game,
            classpath: classpath_entries,
            working_dir: game_dir,
        })
    }

    /// Launch the installed pack and start supervising the process.
    /// Returns the child pid when the OS reports one.
    pub async fn launch(
        &mut self,
        manifest: &PackManifest,
        credential: &Credential,
    ) -> LauncherResult<Option<u32>> {
        let game_dir = self.config.game_dir();
        tokio::fs::create_dir_all(&game_dir)
            .await
            .map_err(|e| LauncherError::Io {
                path: game_dir,
                source: e,
            })?;

        let plan = self.prepare_launch(manifest, credential).await?;
        let log_path = self
            .config
            .logs_dir()
            .join(format!("launch-{}.log", Utc::now().format("%Y%m%d-%H%M%S")));

        let argv = plan.argv();
        let process =
            GameProcess::spawn(&plan.executable, &argv, &plan.working_dir, &log_path).await?;
        let pid = process.pid();

        self.session = Some(LaunchSession {
            version_id: plan.version_id.clone(),
            started_at: Utc::now(),
            process,
        });
        self.progress.idle();
        Ok(pid)
    }

    /// Release the active session: stop listening to the running process
    /// and close its log sink. The game itself keeps running. Safe to
    /// call repeatedly or with no active session.
    pub fn dispose(&mut self) {
        if let Some(session) = &mut self.session {
            session.process.dispose();
        }
        self.session = None;
    }
}

impl Drop for PackOrchestrator {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Expand a zip archive into a directory, keeping every entry.
fn expand_archive(bytes: &[u8], dest_dir: &Path) -> LauncherResult<()> {
    let cursor = std::io::Cursor::new(bytes);
    let mut archive = zip::ZipArchive::new(cursor)?;

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let Some(relative) = file.enclosed_name() else {
            continue;
        };
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
    }

    Ok(())
}
