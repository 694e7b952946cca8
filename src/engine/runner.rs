use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use tokio::process::Command;

use super::{Engine, EngineError, FfmpegCommand};

/// Number of trailing stderr lines kept in a failure report.
const STDERR_TAIL_LINES: usize = 12;

/// Runs commands against an installed ffmpeg binary.
#[derive(Debug, Clone)]
pub struct FfmpegEngine {
    binary: PathBuf,
    timeout: Option<Duration>,
}

impl FfmpegEngine {
    /// Find `ffmpeg` on `$PATH`.
    pub fn locate() -> Result<Self, EngineError> {
        let binary = which::which("ffmpeg")
            .map_err(|e| EngineError::NotFound(format!("ffmpeg not on PATH ({e})")))?;
        Ok(Self::with_binary(binary))
    }

    pub fn with_binary(binary: impl AsRef<Path>) -> Self {
        Self {
            binary: binary.as_ref().to_path_buf(),
            timeout: None,
        }
    }

    /// Kill any invocation that runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

#[async_trait]
impl Engine for FfmpegEngine {
    async fn run(&self, command: &FfmpegCommand) -> Result<(), EngineError> {
        let args = command.build_args();
        debug!("running: {} {}", self.binary.display(), args.join(" "));

        let mut process = Command::new(&self.binary);
        process
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            // Dropping the wait future on timeout must not leave a transcode behind.
            .kill_on_drop(true);
        if let Some(dir) = command.current_dir() {
            process.current_dir(dir);
        }

        let child = process.spawn().map_err(EngineError::Spawn)?;
        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(result) => result,
                Err(_) => {
                    warn!("ffmpeg exceeded {:?}, killed", limit);
                    return Err(EngineError::TimedOut(limit));
                }
            },
            None => child.wait_with_output().await,
        }
        .map_err(EngineError::Spawn)?;

        if output.status.success() {
            Ok(())
        } else {
            Err(EngineError::Failed {
                code: output.status.code(),
                stderr: stderr_tail(&output.stderr),
            })
        }
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}
