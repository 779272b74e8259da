use std::path::PathBuf;
use std::time::Duration;

/// Immutable launcher configuration, passed once at construction.
///
/// Everything the pipeline needs to know about remote endpoints and the
/// local directory layout lives here; the orchestrator never reads
/// process-wide state.
#[derive(Debug, Clone)]
pub struct PackConfig {
    /// Root of the installed pack on disk. All other directories hang
    /// off this one.
    pub data_dir: PathBuf,

    // ── Remote endpoints ────────────────────────────────
    /// Version-index document listing all known base runtime versions.
    pub version_index_url: String,
    /// CDN serving content-addressed asset objects.
    pub asset_base_url: String,
    /// Default repository for library coordinates without a direct
    /// download descriptor or an entry-specific override.
    pub library_base_url: String,
    /// Repositories tried in order when fetching the overlay installer
    /// artifact. The first successful fetch wins.
    pub installer_repositories: Vec<String>,
    /// Group id of the overlay installer artifact.
    pub installer_group: String,
    /// Artifact id of the overlay installer artifact.
    pub installer_artifact: String,

    // ── Launch ──────────────────────────────────────────
    /// JVM executable used to start the game.
    pub java_executable: PathBuf,
    /// Fixed performance-tuning flags appended after the template-derived
    /// JVM arguments, whitespace-separated.
    pub jvm_tuning_flags: String,
    /// Identity reported through the `${launcher_name}` /
    /// `${launcher_version}` placeholders and the HTTP user agent.
    pub launcher_name: String,
    pub launcher_version: String,
    /// Value substituted for `${version_type}`.
    pub version_type: String,

    // ── Transfer tuning ─────────────────────────────────
    /// Maximum concurrent in-flight asset object transfers.
    pub asset_concurrency: usize,
    /// Connection-establishment timeout for every HTTP request. There is
    /// deliberately no end-to-end transfer timeout.
    pub connect_timeout: Duration,
}

impl Default for PackConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("packcore");

        Self {
            data_dir,
            version_index_url:
                "https://piston-meta.mojang.com/mc/game/version_manifest_v2.json".into(),
            asset_base_url: "https://resources.download.minecraft.net".into(),
            library_base_url: "https://libraries.minecraft.net".into(),
            installer_repositories: vec![
                "https://maven.minecraftforge.net".into(),
                "https://maven.creeperhost.net".into(),
            ],
            installer_group: "net.minecraftforge".into(),
            installer_artifact: "forge".into(),
            java_executable: PathBuf::from(format!("java{}", std::env::consts::EXE_SUFFIX)),
            jvm_tuning_flags: "-XX:+UnlockExperimentalVMOptions -XX:+UseG1GC \
                               -XX:G1NewSizePercent=20 -XX:G1ReservePercent=20 \
                               -XX:MaxGCPauseMillis=50 -XX:G1HeapRegionSize=32M"
                .into(),
            launcher_name: "packcore".into(),
            launcher_version: env!("CARGO_PKG_VERSION").into(),
            version_type: "release".into(),
            asset_concurrency: 64,
            connect_timeout: Duration::from_secs(15),
        }
    }
}

impl PackConfig {
    /// Game working directory; the bundle archive is expanded here.
    pub fn game_dir(&self) -> PathBuf {
        self.data_dir.join("game")
    }

    /// Local version store: `versions/<id>/<id>.json` + `<id>.jar`.
    pub fn versions_dir(&self) -> PathBuf {
        self.data_dir.join("versions")
    }

    /// Library cache keyed by resolved relative paths.
    pub fn libraries_dir(&self) -> PathBuf {
        self.data_dir.join("libraries")
    }

    /// Asset root holding `indexes/` and the `objects/` store.
    pub fn assets_dir(&self) -> PathBuf {
        self.data_dir.join("assets")
    }

    /// Parent of the per-launch natives directories.
    pub fn natives_dir(&self) -> PathBuf {
        self.data_dir.join("natives")
    }

    /// Per-launch log files.
    pub fn logs_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }

    /// Scratch space for installer and bundle archives.
    pub fn cache_dir(&self) -> PathBuf {
        self.data_dir.join("cache")
    }

    /// Marker recording a completed install of one base+overlay pair.
    pub fn install_marker(&self, base_version: &str, overlay_version: &str) -> PathBuf {
        self.data_dir
            .join(format!(".installed-{}-{}", base_version, overlay_version))
    }

    /// User agent string for the shared HTTP client.
    pub fn user_agent(&self) -> String {
        format!("{}/{}", self.launcher_name, self.launcher_version)
    }
}
