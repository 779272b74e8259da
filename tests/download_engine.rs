// Download engine behavior against a counting fake transport.

use std::path::PathBuf;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use packcore::config::PackConfig;
use packcore::downloader::{DownloadTarget, Downloader};
use packcore::error::LauncherError;
use packcore::progress::ProgressChannel;

fn downloader(config: &PackConfig) -> Downloader {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
    let client = reqwest::Client::builder()
        .user_agent(config.user_agent())
        .connect_timeout(config.connect_timeout)
        .build()
        .unwrap();
    Downloader::new(client, ProgressChannel::new())
}

fn target(server_uri: &str, dest: PathBuf, size: u64) -> DownloadTarget {
    DownloadTarget {
        url: format!("{}/lib.jar", server_uri),
        dest,
        size,
    }
}

#[tokio::test]
async fn matching_length_skips_the_network_entirely() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lib.jar"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"payload".to_vec()))
        .expect(0)
        .mount(&server)
        .await;

    let temp = tempfile::tempdir().unwrap();
    let dest = temp.path().join("lib.jar");
    std::fs::write(&dest, b"payload").unwrap();

    let dl = downloader(&PackConfig::default());
    dl.fetch(&target(&server.uri(), dest.clone(), 7), "library")
        .await
        .unwrap();

    // File contents untouched; the mock's expect(0) verifies no request.
    assert_eq!(std::fs::read(&dest).unwrap(), b"payload");
}

#[tokio::test]
async fn length_mismatch_deletes_and_refetches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lib.jar"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"fresh-content".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let temp = tempfile::tempdir().unwrap();
    let dest = temp.path().join("lib.jar");
    std::fs::write(&dest, b"stale").unwrap();

    let dl = downloader(&PackConfig::default());
    dl.fetch(&target(&server.uri(), dest.clone(), 13), "library")
        .await
        .unwrap();

    assert_eq!(std::fs::read(&dest).unwrap(), b"fresh-content");
}

#[tokio::test]
async fn unknown_expected_size_trusts_existing_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lib.jar"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"anything".to_vec()))
        .expect(0)
        .mount(&server)
        .await;

    let temp = tempfile::tempdir().unwrap();
    let dest = temp.path().join("lib.jar");
    std::fs::write(&dest, b"whatever-was-there").unwrap();

    let dl = downloader(&PackConfig::default());
    dl.fetch(&target(&server.uri(), dest.clone(), 0), "library")
        .await
        .unwrap();

    assert_eq!(std::fs::read(&dest).unwrap(), b"whatever-was-there");
}

#[tokio::test]
async fn non_success_status_is_terminal_and_names_the_item() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lib.jar"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let temp = tempfile::tempdir().unwrap();
    let dest = temp.path().join("lib.jar");

    let dl = downloader(&PackConfig::default());
    let err = dl
        .fetch(&target(&server.uri(), dest.clone(), 9), "overlay installer")
        .await
        .unwrap_err();

    match err {
        LauncherError::DownloadFailed { status, item, .. } => {
            assert_eq!(status, 404);
            assert_eq!(item, "overlay installer");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!dest.exists());
}

#[tokio::test]
async fn fallback_tries_mirrors_in_order() {
    let primary = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lib.jar"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&primary)
        .await;

    let mirror = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lib.jar"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"mirrored".to_vec()))
        .expect(1)
        .mount(&mirror)
        .await;

    let temp = tempfile::tempdir().unwrap();
    let dest = temp.path().join("lib.jar");

    let dl = downloader(&PackConfig::default());
    dl.fetch_with_fallback(
        &[
            format!("{}/lib.jar", primary.uri()),
            format!("{}/lib.jar", mirror.uri()),
        ],
        &dest,
        0,
        "bundle archive",
    )
    .await
    .unwrap();

    assert_eq!(std::fs::read(&dest).unwrap(), b"mirrored");
}

#[tokio::test]
async fn batch_fetch_lands_every_target() {
    let server = MockServer::start().await;
    for i in 0..5 {
        Mock::given(method("GET"))
            .and(path(format!("/file-{i}.bin")))
            .respond_with(
                ResponseTemplate::new(200).set_body_bytes(format!("content-{i}").into_bytes()),
            )
            .mount(&server)
            .await;
    }

    let temp = tempfile::tempdir().unwrap();
    let targets: Vec<DownloadTarget> = (0..5)
        .map(|i| DownloadTarget {
            url: format!("{}/file-{i}.bin", server.uri()),
            dest: temp.path().join(format!("out/file-{i}.bin")),
            size: 0,
        })
        .collect();

    let dl = downloader(&PackConfig::default());
    dl.fetch_throttled(&targets, "assets", 3).await.unwrap();

    for (i, target) in targets.iter().enumerate() {
        assert_eq!(
            std::fs::read(&target.dest).unwrap(),
            format!("content-{i}").into_bytes()
        );
    }
}
