use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::info;

use crate::pipeline::clip::CompilationOutput;

/// Receives the finished compilation before the run cleans up.
///
/// Implement this trait to hand the video to whatever publishes it, for
/// example a YouTube uploader. The file is deleted once `publish` returns, so
/// anything that needs the bytes later must copy or upload them here.
///
/// # Example
///
/// ```rust
/// use anyhow::Result;
/// use async_trait::async_trait;
/// use clipreel::{CompilationOutput, Publisher};
///
/// struct YoutubePublisher;
///
/// #[async_trait]
/// impl Publisher for YoutubePublisher {
///     async fn publish(&self, output: &CompilationOutput) -> Result<()> {
///         // upload output.path with a title mentioning output.clip_count ...
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, output: &CompilationOutput) -> Result<()>;
}

#[async_trait]
impl<P: Publisher + ?Sized> Publisher for Box<P> {
    async fn publish(&self, output: &CompilationOutput) -> Result<()> {
        (**self).publish(output).await
    }
}

/// A publisher that accepts the compilation and does nothing with it.
pub struct NoopPublisher;

#[async_trait]
impl Publisher for NoopPublisher {
    async fn publish(&self, output: &CompilationOutput) -> Result<()> {
        info!(
            "no publisher configured, discarding {} ({} clips)",
            output.path.display(),
            output.clip_count
        );
        Ok(())
    }
}

/// Copies the compilation into a directory that outlives the run.
pub struct CopyPublisher {
    dest_dir: PathBuf,
}

impl CopyPublisher {
    pub fn new(dest_dir: impl Into<PathBuf>) -> Self {
        Self {
            dest_dir: dest_dir.into(),
        }
    }
}

#[async_trait]
impl Publisher for CopyPublisher {
    async fn publish(&self, output: &CompilationOutput) -> Result<()> {
        let name = output
            .path
            .file_name()
            .context("compilation path has no file name")?;
        tokio::fs::create_dir_all(&self.dest_dir)
            .await
            .with_context(|| format!("cannot create {}", self.dest_dir.display()))?;
        let dest = self.dest_dir.join(name);
        tokio::fs::copy(&output.path, &dest)
            .await
            .with_context(|| format!("cannot copy compilation to {}", dest.display()))?;
        info!("published {} clips to {}", output.clip_count, dest.display());
        Ok(())
    }
}
