use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::debug;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("clip {0} not found")]
    NotFound(String),
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("remote error: {0}")]
    Remote(String),
}

/// Materializes a remote clip as a local file.
///
/// Remote drives live outside this crate; they plug in here.
#[async_trait]
pub trait ClipFetcher: Send + Sync {
    /// Write the clip identified by `id` to `dest`.
    async fn fetch(&self, id: &str, dest: &Path) -> Result<(), FetchError>;
}

/// Fetches clips from the local filesystem.
///
/// Ids are paths, resolved against `root` when one is set.
#[derive(Debug, Clone, Default)]
pub struct FsFetcher {
    root: Option<PathBuf>,
}

impl FsFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rooted(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, id: &str) -> PathBuf {
        match &self.root {
            Some(root) => root.join(id),
            None => PathBuf::from(id),
        }
    }
}

#[async_trait]
impl ClipFetcher for FsFetcher {
    async fn fetch(&self, id: &str, dest: &Path) -> Result<(), FetchError> {
        let src = self.resolve(id);
        if !tokio::fs::try_exists(&src).await? {
            return Err(FetchError::NotFound(id.to_string()));
        }
        let bytes = tokio::fs::copy(&src, dest).await?;
        debug!("fetched {} ({} bytes) -> {}", src.display(), bytes, dest.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rooted_fetch_copies_file() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        std::fs::write(src.path().join("abc.mp4"), b"clip").unwrap();

        let dest = dst.path().join("raw_000.mp4");
        FsFetcher::rooted(src.path()).fetch("abc.mp4", &dest).await.unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"clip");
        assert!(src.path().join("abc.mp4").exists());
    }

    #[tokio::test]
    async fn test_missing_clip_is_not_found() {
        let dst = tempfile::tempdir().unwrap();
        let err = FsFetcher::rooted(dst.path())
            .fetch("missing.mp4", &dst.path().join("raw_000.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::NotFound(id) if id == "missing.mp4"));
    }

    #[tokio::test]
    async fn test_unrooted_fetch_uses_path() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("clip.mov");
        std::fs::write(&src, b"mov").unwrap();

        let dest = dir.path().join("raw_001.mp4");
        FsFetcher::new()
            .fetch(&src.to_string_lossy(), &dest)
            .await
            .unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"mov");
    }
}
