use std::path::PathBuf;

/// A remote clip materialized into the workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceClip {
    /// Position in the run's selection; fixes the clip's place in the output.
    pub index: usize,
    pub id: String,
    pub local_path: PathBuf,
}

/// A clip rewritten to the common intermediate encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedClip {
    pub index: usize,
    pub path: PathBuf,
}

/// The finished compilation, alive only until cleanup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationOutput {
    pub path: PathBuf,
    /// Number of source clips that made it into the video.
    pub clip_count: usize,
}
