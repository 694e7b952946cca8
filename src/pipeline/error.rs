use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::engine::EngineError;
use crate::ledger::LedgerError;
use crate::manifest::ManifestError;
use crate::pipeline::fetch::FetchError;

/// Everything that can go wrong during a compilation run.
///
/// Fetch, transcode and merge failures concern a single clip or chunk and are
/// dropped by a best-effort run; the rest end the run. A source found
/// unreadable before ffmpeg is spawned is reported as
/// [`CompileError::SourceUnreadable`] and belongs to the transcode class.
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("failed to fetch clip {id}: {source}")]
    Fetch {
        id: String,
        #[source]
        source: FetchError,
    },
    /// Transcode failure detected before spawning ffmpeg.
    #[error("source clip {} is unreadable: {source}", path.display())]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to normalize {}: {source}", path.display())]
    Transcode {
        path: PathBuf,
        #[source]
        source: EngineError,
    },
    #[error("failed to merge into {}: {source}", output.display())]
    Merge {
        output: PathBuf,
        #[source]
        source: EngineError,
    },
    #[error("cannot write concat manifest: {0}")]
    Manifest(#[from] ManifestError),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("no chunks reached final assembly")]
    NoInput,
    #[error("workspace error: {0}")]
    Workspace(#[source] io::Error),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl CompileError {
    /// Whether this failure concerns a single clip or chunk rather than the run.
    pub fn is_per_item(&self) -> bool {
        self.is_transcode()
            || matches!(self, Self::Fetch { .. } | Self::Merge { .. } | Self::Manifest(_))
    }

    /// Whether a single clip could not be normalized, before or during ffmpeg.
    pub fn is_transcode(&self) -> bool {
        matches!(self, Self::Transcode { .. } | Self::SourceUnreadable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(CompileError::Fetch {
            id: "abc".into(),
            source: FetchError::NotFound("abc".into()),
        }
        .is_per_item());
        assert!(CompileError::Fetch {
            id: "abc".into(),
            source: FetchError::Remote("quota exceeded".into()),
        }
        .is_per_item());
        assert!(CompileError::SourceUnreadable {
            path: PathBuf::from("/ws/raw_000.mp4"),
            source: io::Error::new(io::ErrorKind::InvalidData, "empty"),
        }
        .is_per_item());
        assert!(!CompileError::NoInput.is_per_item());
        assert!(!CompileError::InvalidArgument("x".into()).is_per_item());
        assert!(!CompileError::Workspace(io::Error::other("full")).is_per_item());
    }

    #[test]
    fn test_messages_name_the_item() {
        let err = CompileError::Transcode {
            path: PathBuf::from("/ws/raw_004.mp4"),
            source: EngineError::Failed {
                code: Some(1),
                stderr: "moov atom not found".into(),
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("raw_004.mp4"));
        assert!(msg.contains("moov atom not found"));
    }
}
