//! The external transcoding engine boundary.
//!
//! Every piece of media work goes through [`Engine::run`] with a typed
//! [`FfmpegCommand`]. [`FfmpegEngine`] runs the real binary; tests swap in a
//! fake that simulates transcode and concat on plain files.

mod command;
mod runner;
#[cfg(test)]
pub(crate) mod testing;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use command::{FfmpegCommand, Input};
pub use runner::FfmpegEngine;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("ffmpeg binary not found: {0}")]
    NotFound(String),
    #[error("failed to spawn ffmpeg: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("ffmpeg exited with status {}: {stderr}", describe_code(.code))]
    Failed { code: Option<i32>, stderr: String },
    #[error("ffmpeg timed out after {0:?}")]
    TimedOut(Duration),
}

fn describe_code(code: &Option<i32>) -> String {
    code.map_or_else(|| "signal".to_string(), |c| c.to_string())
}

/// Runs one ffmpeg invocation to completion.
///
/// Calls are awaited one at a time by the pipeline; implementations never
/// need to handle concurrent invocations against the same workspace.
#[async_trait]
pub trait Engine: Send + Sync {
    async fn run(&self, command: &FfmpegCommand) -> Result<(), EngineError>;
}
