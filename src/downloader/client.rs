use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use futures_util::future;
use futures_util::stream::{self, StreamExt};
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{LauncherError, LauncherResult};
use crate::progress::ProgressChannel;

/// A single file to fetch. Keyed by `dest` during planning so duplicate
/// origins collapse to one transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    pub url: String,
    pub dest: PathBuf,
    /// Expected byte size; 0 when unknown.
    pub size: u64,
}

/// Streaming downloader with idempotent skip logic and progress reporting.
pub struct Downloader {
    client: Client,
    progress: ProgressChannel,
}

impl Downloader {
    pub fn new(client: Client, progress: ProgressChannel) -> Self {
        Self { client, progress }
    }

    // ── Single file download ────────────────────────────

    /// Fetch one target to disk.
    ///
    /// Skip logic: when the destination already exists and the expected
    /// size is known and matches the on-disk length, this is a no-op with
    /// zero network calls; a length mismatch deletes and re-fetches. With
    /// an unknown expected size an existing file is always trusted. This
    /// is a cheap length check, not hash verification.
    pub async fn fetch(&self, target: &DownloadTarget, label: &str) -> LauncherResult<()> {
        if target.dest.exists() {
            if target.size == 0 {
                debug!("Existing file trusted (no expected size): {:?}", target.dest);
                return Ok(());
            }
            let on_disk = tokio::fs::metadata(&target.dest)
                .await
                .map(|m| m.len())
                .map_err(|e| LauncherError::Io {
                    path: target.dest.clone(),
                    source: e,
                })?;
            if on_disk == target.size {
                debug!("Up to date: {:?}", target.dest);
                return Ok(());
            }
            debug!(
                "Length mismatch for {:?} ({} != {}), re-fetching",
                target.dest, on_disk, target.size
            );
            tokio::fs::remove_file(&target.dest)
                .await
                .map_err(|e| LauncherError::Io {
                    path: target.dest.clone(),
                    source: e,
                })?;
        }

        if let Some(parent) = target.dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| LauncherError::Io {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }

        let response = self.client.get(&target.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LauncherError::DownloadFailed {
                url: target.url.clone(),
                status: status.as_u16(),
                item: label.to_string(),
            });
        }

        let total_bytes = response
            .content_length()
            .filter(|n| *n > 0)
            .or_else(|| (target.size > 0).then_some(target.size));

        // Stream to file inside a block so the handle is dropped
        // immediately after flushing — large artifacts are never buffered
        // whole in memory.
        {
            let mut file = tokio::fs::File::create(&target.dest).await.map_err(|e| {
                LauncherError::Io {
                    path: target.dest.clone(),
                    source: e,
                }
            })?;

            let mut downloaded: u64 = 0;
            let mut body = response.bytes_stream();
            while let Some(chunk) = body.next().await {
                let chunk = chunk?;
                file.write_all(&chunk)
                    .await
                    .map_err(|e| LauncherError::Io {
                        path: target.dest.clone(),
                        source: e,
                    })?;
                downloaded += chunk.len() as u64;

                match total_bytes {
                    Some(total) => self
                        .progress
                        .emit(label, downloaded as f64 / total as f64),
                    None => self.progress.indeterminate(label),
                }
            }

            file.flush().await.map_err(|e| LauncherError::Io {
                path: target.dest.clone(),
                source: e,
            })?;
        }

        debug!("Downloaded: {} -> {:?}", target.url, target.dest);
        Ok(())
    }

    /// Try each URL in order until one fetch succeeds. Used for the
    /// installer-metadata path, which has an explicit mirror list.
    pub async fn fetch_with_fallback(
        &self,
        urls: &[String],
        dest: &Path,
        size: u64,
        label: &str,
    ) -> LauncherResult<()> {
        let mut last_err = LauncherError::Config(format!("no source URLs for {}", label));
        for url in urls {
            let target = DownloadTarget {
                url: url.clone(),
                dest: dest.to_path_buf(),
                size,
            };
            match self.fetch(&target, label).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    debug!("Source failed for {} ({}): {}", label, url, e);
                    last_err = e;
                }
            }
        }
        Err(last_err)
    }

    // ── Batch downloads ─────────────────────────────────

    /// Fetch every target concurrently without an explicit bound — one
    /// task per target, awaited together. The first failure aborts the
    /// batch result.
    pub async fn fetch_all(
        &self,
        targets: &[DownloadTarget],
        label: &str,
    ) -> LauncherResult<()> {
        if targets.is_empty() {
            return Ok(());
        }
        info!("Starting batch download: {} files ({})", targets.len(), label);

        let completed = AtomicUsize::new(0);
        let total = targets.len();
        let results = future::join_all(targets.iter().map(|target| {
            let completed = &completed;
            async move {
                let result = self.fetch(target, label).await;
                if result.is_ok() {
                    let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                    self.progress.emit(label, done as f64 / total as f64);
                }
                result
            }
        }))
        .await;

        results.into_iter().collect::<LauncherResult<Vec<_>>>()?;
        Ok(())
    }

    /// Fetch targets with at most `concurrency` transfers in flight,
    /// used for the (much larger) asset object batches.
    pub async fn fetch_throttled(
        &self,
        targets: &[DownloadTarget],
        label: &str,
        concurrency: usize,
    ) -> LauncherResult<()> {
        if targets.is_empty() {
            return Ok(());
        }
        info!(
            "Starting throttled batch download: {} files, concurrency={} ({})",
            targets.len(),
            concurrency,
            label
        );

        let completed = AtomicUsize::new(0);
        let total = targets.len();
        let results: Vec<LauncherResult<()>> = stream::iter(targets.iter())
            .map(|target| {
                let completed = &completed;
                async move {
                    let result = self.fetch(target, label).await;
                    if result.is_ok() {
                        let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                        self.progress.emit(label, done as f64 / total as f64);
                    }
                    result
                }
            })
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await;

        results.into_iter().collect::<LauncherResult<Vec<_>>>()?;
        Ok(())
    }
}
