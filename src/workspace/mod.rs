use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use tempfile::TempDir;

use crate::config;

/// Scoped directory holding every intermediate artifact of one run.
///
/// The directory is removed by [`RunWorkspace::cleanup`], and on drop if
/// cleanup was never called.
#[derive(Debug)]
pub struct RunWorkspace {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl RunWorkspace {
    /// Create a fresh workspace under `parent`, or the system temp dir.
    pub fn create(parent: Option<&Path>) -> io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(config::WORKSPACE_PREFIX);
        let dir = match parent {
            Some(p) => {
                fs::create_dir_all(p)?;
                builder.tempdir_in(p)?
            }
            None => builder.tempdir()?,
        };
        let path = dir.path().to_path_buf();
        debug!("created workspace {}", path.display());
        Ok(Self {
            dir: Some(dir),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    /// Remove the workspace and everything in it. Safe to call repeatedly.
    pub fn cleanup(&mut self) -> io::Result<()> {
        match self.dir.take() {
            Some(dir) => dir.close(),
            None => remove_dir_if_exists(&self.path),
        }
    }
}

fn remove_dir_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Delete a file, treating an already missing file as success.
pub fn remove_file_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Resolve `path` against the current directory if it is relative.
pub fn absolute(path: &Path) -> io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_cleanup() {
        let parent = tempfile::tempdir().unwrap();
        let mut ws = RunWorkspace::create(Some(parent.path())).unwrap();
        let path = ws.path().to_path_buf();
        assert!(path.is_dir());
        assert!(path.starts_with(parent.path()));

        fs::write(ws.file("clip_000.ts"), b"data").unwrap();
        ws.cleanup().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_cleanup_is_idempotent() {
        let mut ws = RunWorkspace::create(None).unwrap();
        ws.cleanup().unwrap();
        ws.cleanup().unwrap();
        assert!(!ws.path().exists());
    }

    #[test]
    fn test_drop_removes_directory() {
        let path = {
            let ws = RunWorkspace::create(None).unwrap();
            ws.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_create_under_missing_parent() {
        let root = tempfile::tempdir().unwrap();
        let parent = root.path().join("nested").join("runs");
        let ws = RunWorkspace::create(Some(&parent)).unwrap();
        assert!(ws.path().starts_with(&parent));
    }

    #[test]
    fn test_remove_file_if_exists() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("compilation_final.mp4");
        fs::write(&file, b"x").unwrap();
        remove_file_if_exists(&file).unwrap();
        assert!(!file.exists());
        remove_file_if_exists(&file).unwrap();
    }
}
