// End-to-end launch assembly from locally installed metadata. No network.

use std::path::Path;

use packcore::auth::Credential;
use packcore::config::PackConfig;
use packcore::pack::{PackComponent, PackManifest, PackOrchestrator};

fn install_metadata(versions_dir: &Path, id: &str, document: &serde_json::Value) {
    let dir = versions_dir.join(id);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join(format!("{}.json", id)),
        serde_json::to_string_pretty(document).unwrap(),
    )
    .unwrap();
}

fn install_jar(versions_dir: &Path, id: &str) {
    let dir = versions_dir.join(id);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(format!("{}.jar", id)), b"jar").unwrap();
}

fn install_library(libraries_dir: &Path, relative: &str) {
    let path = libraries_dir.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, b"lib").unwrap();
}

fn manifest() -> PackManifest {
    PackManifest {
        base: PackComponent {
            name: "minecraft".into(),
            version: "1.20.1".into(),
        },
        overlay: PackComponent {
            name: "forge".into(),
            version: "47.2.0".into(),
        },
        bundle: None,
    }
}

fn installed_config(data_dir: &Path) -> PackConfig {
    let config = PackConfig {
        data_dir: data_dir.to_path_buf(),
        ..PackConfig::default()
    };

    let versions_dir = config.versions_dir();
    install_metadata(
        &versions_dir,
        "1.20.1",
        &serde_json::json!({
            "id": "1.20.1",
            "mainClass": "net.minecraft.client.main.Main",
            "assetIndex": {"id": "5", "url": "https://example.com/5.json"},
            "arguments": {
                "jvm": ["-Djava.library.path=${natives_directory}"],
                "game": [
                    "--username", "${auth_player_name}",
                    "--gameDir", "${game_directory}",
                    "--assetIndex", "${assets_index_name}"
                ]
            },
            "libraries": [
                {"name": "com.example:shared:1.0"},
                {"name": "com.example:base-only:1.0"}
            ]
        }),
    );
    install_metadata(
        &versions_dir,
        "1.20.1-forge-47.2.0",
        &serde_json::json!({
            "id": "1.20.1-forge-47.2.0",
            "inheritsFrom": "1.20.1",
            "mainClass": "cpw.mods.bootstraplauncher.BootstrapLauncher",
            "arguments": {
                "game": ["--fml.forgeVersion", "47.2.0"]
            },
            "libraries": [
                {"name": "com.example:shared:1.0"},
                {"name": "net.minecraftforge:fmlloader:1.20.1-47.2.0"}
            ]
        }),
    );
    install_jar(&versions_dir, "1.20.1");
    install_jar(&versions_dir, "1.20.1-forge-47.2.0");

    let libraries_dir = config.libraries_dir();
    install_library(&libraries_dir, "com/example/shared/1.0/shared-1.0.jar");
    install_library(&libraries_dir, "com/example/base-only/1.0/base-only-1.0.jar");
    install_library(
        &libraries_dir,
        "net/minecraftforge/fmlloader/1.20.1-47.2.0/fmlloader-1.20.1-47.2.0.jar",
    );

    config
}

#[tokio::test]
async fn launch_plan_assembles_from_installed_metadata() {
    let temp = tempfile::tempdir().unwrap();
    let config = installed_config(temp.path());
    let orchestrator = PackOrchestrator::new(config).unwrap();

    let credential = Credential::offline("Steve");
    let plan = orchestrator
        .prepare_launch(&manifest(), &credential)
        .await
        .unwrap();

    assert_eq!(plan.version_id, "1.20.1-forge-47.2.0");
    assert_eq!(plan.working_dir, orchestrator.config().game_dir());
    assert_eq!(plan.main_class, "cpw.mods.bootstraplauncher.BootstrapLauncher");

    let argv = plan.argv();
    assert!(!argv.is_empty());

    // Inherited game arguments come first, overlay contributions last.
    assert_eq!(
        &argv[argv.len() - 8..],
        &[
            "--username".to_string(),
            "Steve".to_string(),
            "--gameDir".to_string(),
            orchestrator.config().game_dir().to_string_lossy().to_string(),
            "--assetIndex".to_string(),
            "5".to_string(),
            "--fml.forgeVersion".to_string(),
            "47.2.0".to_string(),
        ]
    );

    // Exactly one classpath flag pair.
    let cp_flags = argv
        .iter()
        .filter(|arg| *arg == "-cp" || *arg == "-classpath")
        .count();
    assert_eq!(cp_flags, 1);

    // The shared coordinate appears once despite both descriptors naming it.
    let shared_occurrences = plan
        .classpath
        .iter()
        .filter(|entry| entry.contains("shared-1.0.jar"))
        .count();
    assert_eq!(shared_occurrences, 1);

    // Library entries precede the version jars.
    assert!(plan.classpath.len() >= 5);
    assert!(plan.classpath.last().unwrap().ends_with("1.20.1-forge-47.2.0.jar"));
}

#[tokio::test]
async fn missing_overlay_metadata_fails_launch_preparation() {
    let temp = tempfile::tempdir().unwrap();
    let config = PackConfig {
        data_dir: temp.path().to_path_buf(),
        ..PackConfig::default()
    };
    std::fs::create_dir_all(config.versions_dir()).unwrap();
    let orchestrator = PackOrchestrator::new(config).unwrap();

    let credential = Credential::offline("Steve");
    let err = orchestrator
        .prepare_launch(&manifest(), &credential)
        .await
        .unwrap_err();
    assert!(matches!(err, packcore::LauncherError::NotFound(_)));
}

#[cfg(unix)]
#[tokio::test]
async fn launch_spawns_a_supervised_process_in_the_game_dir() {
    let temp = tempfile::tempdir().unwrap();
    let mut config = installed_config(temp.path());
    // A stand-in executable that ignores the JVM argument vector.
    config.java_executable = "/bin/true".into();

    let mut orchestrator = PackOrchestrator::new(config).unwrap();
    let credential = Credential::offline("Steve");

    orchestrator.launch(&manifest(), &credential).await.unwrap();

    let session = orchestrator.session_mut().unwrap();
    let code = session.process.wait().await.unwrap();
    assert_eq!(code, 0);

    // Progress channel is idle after a launch.
    assert!(orchestrator.progress().borrow().is_none());

    // One log file was produced for the launch.
    let logs: Vec<_> = std::fs::read_dir(orchestrator.config().logs_dir())
        .unwrap()
        .flatten()
        .collect();
    assert_eq!(logs.len(), 1);

    orchestrator.dispose();
    assert!(orchestrator.session().is_none());
}
