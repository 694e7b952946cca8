use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{Engine, EngineError, FfmpegCommand, Input};

/// Simulates ffmpeg on text files.
///
/// A transcode copies the input's text to the output; a concat resolves the
/// manifest against the working directory and joins the members' text in
/// manifest order. Inputs whose text contains `corrupt` fail to transcode.
#[derive(Default)]
pub(crate) struct FakeEngine {
    fail_outputs: HashSet<String>,
    timeout_outputs: HashSet<String>,
    calls: Mutex<Vec<FfmpegCommand>>,
}

impl FakeEngine {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Fail any invocation whose output file is named `name`.
    pub(crate) fn failing_output(mut self, name: &str) -> Self {
        self.fail_outputs.insert(name.to_string());
        self
    }

    /// Time out any invocation whose output file is named `name`.
    pub(crate) fn timing_out(mut self, name: &str) -> Self {
        self.timeout_outputs.insert(name.to_string());
        self
    }

    pub(crate) fn calls(&self) -> Vec<FfmpegCommand> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn concat_calls(&self) -> Vec<FfmpegCommand> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c.input(), Input::ConcatManifest(_)))
            .collect()
    }
}

fn failed(msg: impl Into<String>) -> EngineError {
    EngineError::Failed {
        code: Some(1),
        stderr: msg.into(),
    }
}

fn resolve(dir: Option<&Path>, path: &Path) -> PathBuf {
    match dir {
        Some(d) if path.is_relative() => d.join(path),
        _ => path.to_path_buf(),
    }
}

fn parse_manifest_line(line: &str) -> Option<&str> {
    line.strip_prefix("file '")?.strip_suffix('\'')
}

#[async_trait]
impl Engine for FakeEngine {
    async fn run(&self, command: &FfmpegCommand) -> Result<(), EngineError> {
        self.calls.lock().unwrap().push(command.clone());

        let dir = command.current_dir();
        let output = resolve(dir, command.output());
        let name = output
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if self.fail_outputs.contains(&name) {
            return Err(failed(format!("simulated failure writing {name}")));
        }
        if self.timeout_outputs.contains(&name) {
            return Err(EngineError::TimedOut(Duration::from_secs(1)));
        }

        let body = match command.input() {
            Input::File(src) => {
                let text = std::fs::read_to_string(resolve(dir, src))
                    .map_err(|e| failed(format!("{}: {e}", src.display())))?;
                if text.contains("corrupt") {
                    return Err(failed("Invalid data found when processing input"));
                }
                text
            }
            Input::ConcatManifest(manifest) => {
                let manifest_path = resolve(dir, Path::new(manifest));
                let listing = std::fs::read_to_string(&manifest_path)
                    .map_err(|e| failed(format!("{manifest}: {e}")))?;
                let mut joined = String::new();
                for line in listing.lines() {
                    let member = parse_manifest_line(line)
                        .ok_or_else(|| failed(format!("bad manifest line {line:?}")))?;
                    let text = std::fs::read_to_string(resolve(dir, Path::new(member)))
                        .map_err(|e| failed(format!("{member}: {e}")))?;
                    joined.push_str(&text);
                }
                joined
            }
        };

        std::fs::write(&output, body).map_err(|e| failed(e.to_string()))
    }
}
