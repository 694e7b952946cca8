use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::pipeline::CompileError;

// Compilation parameters
pub const DEFAULT_CHUNK_SIZE: usize = 3;
pub const DEFAULT_WIDTH: u32 = 1920;
pub const DEFAULT_HEIGHT: u32 = 1080;

// Encoder profile, biased toward speed
pub const DEFAULT_PRESET: &str = "ultrafast";
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
pub const DEFAULT_AUDIO_CODEC: &str = "aac";
pub const DEFAULT_BITSTREAM_FILTER: &str = "h264_mp4toannexb";

/// Container for normalized clips. MPEG-TS concatenates without re-parsing.
pub const INTERMEDIATE_FORMAT: &str = "mpegts";
pub const INTERMEDIATE_EXT: &str = "ts";
pub const CHUNK_EXT: &str = "mp4";

// Ledger selection
pub const DEFAULT_MAX_CLIPS: usize = 12;
pub const DEFAULT_MIN_CLIPS: usize = 2;
/// Remote ids shorter than this are placeholders, never real drive files.
pub const MIN_REMOTE_ID_LEN: usize = 20;

pub const DEFAULT_OUTPUT_FILE: &str = "compilation_final.mp4";
pub const DEFAULT_LEDGER_FILE: &str = "db.json";

// Workspace file names
pub const WORKSPACE_PREFIX: &str = "clipreel-";
pub const FINAL_MANIFEST: &str = "parts_list.txt";

pub fn raw_clip_name(index: usize) -> String {
    format!("raw_{index:03}.mp4")
}

pub fn normalized_clip_name(index: usize) -> String {
    format!("clip_{index:03}.{INTERMEDIATE_EXT}")
}

pub fn chunk_name(index: usize) -> String {
    format!("part_{index:03}.{CHUNK_EXT}")
}

pub fn chunk_manifest_name(index: usize) -> String {
    format!("part_{index:03}_list.txt")
}

/// Frame size every clip is scaled and letterboxed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Default for Resolution {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
        let width = w
            .trim()
            .parse()
            .map_err(|_| format!("invalid width in {s:?}"))?;
        let height = h
            .trim()
            .parse()
            .map_err(|_| format!("invalid height in {s:?}"))?;
        Ok(Self { width, height })
    }
}

/// What to do when a single clip or chunk fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Drop the failed item and keep going with a shorter compilation.
    #[default]
    BestEffort,
    /// Abort the run on the first failed item.
    FailFast,
}

/// Runtime configuration for a compilation run.
#[derive(Debug, Clone)]
pub struct ClipreelConfig {
    pub chunk_size: usize,
    pub resolution: Resolution,
    pub preset: String,
    pub video_codec: String,
    pub audio_codec: String,
    pub bitstream_filter: String,
    pub max_clips: usize,
    pub min_clips: usize,
    pub failure_policy: FailurePolicy,
    /// Upper bound on a single ffmpeg invocation. `None` waits forever.
    pub subprocess_timeout: Option<Duration>,
    /// Where the run workspace is created. Defaults to the system temp dir.
    pub workspace_parent: Option<PathBuf>,
    pub output_path: PathBuf,
    pub show_progress: bool,
}

impl Default for ClipreelConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            resolution: Resolution::default(),
            preset: DEFAULT_PRESET.to_string(),
            video_codec: DEFAULT_VIDEO_CODEC.to_string(),
            audio_codec: DEFAULT_AUDIO_CODEC.to_string(),
            bitstream_filter: DEFAULT_BITSTREAM_FILTER.to_string(),
            max_clips: DEFAULT_MAX_CLIPS,
            min_clips: DEFAULT_MIN_CLIPS,
            failure_policy: FailurePolicy::default(),
            subprocess_timeout: None,
            workspace_parent: None,
            output_path: PathBuf::from(DEFAULT_OUTPUT_FILE),
            show_progress: false,
        }
    }
}

impl ClipreelConfig {
    pub fn validate(&self) -> Result<(), CompileError> {
        if self.chunk_size == 0 {
            return Err(CompileError::InvalidArgument(
                "chunk size must be at least 1".into(),
            ));
        }
        let Resolution { width, height } = self.resolution;
        // libx264 with yuv420p needs even dimensions
        if width == 0 || height == 0 || width % 2 != 0 || height % 2 != 0 {
            return Err(CompileError::InvalidArgument(format!(
                "resolution {} must have non-zero even dimensions",
                self.resolution
            )));
        }
        if self.preset.trim().is_empty() {
            return Err(CompileError::InvalidArgument("preset must not be empty".into()));
        }
        if self.output_path.as_os_str().is_empty() {
            return Err(CompileError::InvalidArgument("output path must not be empty".into()));
        }
        Ok(())
    }

    pub fn fail_fast(&self) -> bool {
        self.failure_policy == FailurePolicy::FailFast
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_parse() {
        let r: Resolution = "1280x720".parse().unwrap();
        assert_eq!(r, Resolution { width: 1280, height: 720 });
        assert_eq!(r.to_string(), "1280x720");
        assert!("1280".parse::<Resolution>().is_err());
        assert!("axb".parse::<Resolution>().is_err());
    }

    #[test]
    fn test_default_config_is_valid() {
        let cfg = ClipreelConfig::default();
        assert_eq!(cfg.chunk_size, 3);
        assert_eq!(cfg.resolution.to_string(), "1920x1080");
        assert_eq!(cfg.preset, "ultrafast");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let cfg = ClipreelConfig {
            chunk_size: 0,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(CompileError::InvalidArgument(_))));

        let cfg = ClipreelConfig {
            resolution: Resolution { width: 1921, height: 1080 },
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(CompileError::InvalidArgument(_))));
    }

    #[test]
    fn test_workspace_names() {
        assert_eq!(normalized_clip_name(4), "clip_004.ts");
        assert_eq!(chunk_name(0), "part_000.mp4");
        assert_eq!(chunk_manifest_name(2), "part_002_list.txt");
    }
}
