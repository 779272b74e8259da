// ─── Process Supervisor ───
// Spawns the game as a detached child process and streams its output to
// a per-launch log file.

use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;

use chrono::Utc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::error::{LauncherError, LauncherResult};

type LogSink = Arc<Mutex<tokio::fs::File>>;

/// Handle to a supervised game process.
///
/// The child is detached: dropping or disposing this handle stops the
/// log subscriptions but never kills the game.
pub struct GameProcess {
    pid: Option<u32>,
    tasks: Vec<JoinHandle<()>>,
    exit: Option<oneshot::Receiver<i32>>,
    disposed: bool,
}

impl GameProcess {
    /// Launch the process and start supervision.
    ///
    /// Opens `log_path` in append mode, writes a short preamble, then
    /// spawns two reader tasks draining stdout and stderr into the log
    /// (tagged `[OUT]`/`[ERR]`) and a monitor task that records the exit
    /// code.
    pub async fn spawn(
        executable: &Path,
        argv: &[String],
        working_dir: &Path,
        log_path: &Path,
    ) -> LauncherResult<Self> {
        if let Some(parent) = log_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| LauncherError::Io {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        let mut log_file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)
            .await
            .map_err(|e| LauncherError::Io {
                path: log_path.to_path_buf(),
                source: e,
            })?;

        let preamble = format!(
            "--- launch {} ---\nexecutable: {}\nworking dir: {}\narguments: {}\n",
            Utc::now().to_rfc3339(),
            executable.display(),
            working_dir.display(),
            argv.len()
        );
        log_file
            .write_all(preamble.as_bytes())
            .await
            .map_err(|e| LauncherError::Io {
                path: log_path.to_path_buf(),
                source: e,
            })?;

        let mut child = tokio::process::Command::new(executable)
            .args(argv)
            .current_dir(working_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(false)
            .spawn()
            .map_err(|e| LauncherError::Process(format!("failed to spawn game: {}", e)))?;

        let pid = child.id();
        info!("Spawned game process (pid {:?})", pid);

        let sink: LogSink = Arc::new(Mutex::new(log_file));
        let mut tasks = Vec::new();

        if let Some(stdout) = child.stdout.take() {
            tasks.push(stream_lines(stdout, "OUT", Arc::clone(&sink)));
        }
        if let Some(stderr) = child.stderr.take() {
            tasks.push(stream_lines(stderr, "ERR", Arc::clone(&sink)));
        }

        let (exit_tx, exit_rx) = oneshot::channel();
        let monitor_sink = Arc::clone(&sink);
        tasks.push(tokio::spawn(async move {
            let code = match child.wait().await {
                Ok(status) => status.code().unwrap_or(-1),
                Err(e) => {
                    debug!("Failed to await game process: {}", e);
                    -1
                }
            };
            info!("Game process exited with code {}", code);

            let mut file = monitor_sink.lock().await;
            let _ = file
                .write_all(format!("--- exited with code {} ---\n", code).as_bytes())
                .await;
            let _ = file.flush().await;
            let _ = exit_tx.send(code);
        }));

        Ok(Self {
            pid,
            tasks,
            exit: Some(exit_rx),
            disposed: false,
        })
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Wait for the child to exit and return its exit code.
    pub async fn wait(&mut self) -> LauncherResult<i32> {
        let rx = self.exit.take().ok_or_else(|| {
            LauncherError::Process("game process exit already observed".into())
        })?;
        rx.await
            .map_err(|_| LauncherError::Process("supervision ended before process exit".into()))
    }

    /// Stop supervising: cancel the line subscriptions and release the
    /// log sink. Idempotent, and never kills the child.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        for task in &self.tasks {
            task.abort();
        }
        self.disposed = true;
    }
}

impl Drop for GameProcess {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn stream_lines(
    reader: impl tokio::io::AsyncRead + Unpin + Send + 'static,
    tag: &'static str,
    sink: LogSink,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            debug!("[{}] {}", tag, line);
            let mut file = sink.lock().await;
            let _ = file
                .write_all(format!("[{}] {}\n", tag, line).as_bytes())
                .await;
        }
        let mut file = sink.lock().await;
        let _ = file.flush().await;
    })
}
