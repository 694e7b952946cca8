use std::path::Path;

use log::debug;

use crate::config::{self, ClipreelConfig};
use crate::engine::{Engine, FfmpegCommand};
use crate::pipeline::clip::{NormalizedClip, SourceClip};
use crate::pipeline::CompileError;

/// Build the ffmpeg invocation that rewrites `source` into `dest`.
///
/// Scale to fit, letterbox to the target size, fast H.264 with an Annex B
/// bitstream in MPEG-TS so the result concatenates cleanly.
pub fn normalize_command(cfg: &ClipreelConfig, source: &Path, dest: &Path) -> FfmpegCommand {
    FfmpegCommand::transcode(source, dest)
        .scale_and_pad(cfg.resolution)
        .video_codec(&cfg.video_codec)
        .preset(&cfg.preset)
        .audio_codec(&cfg.audio_codec)
        .bitstream_filter(&cfg.bitstream_filter)
        .format(config::INTERMEDIATE_FORMAT)
}

/// Rewrite one source clip into the workspace's intermediate encoding.
///
/// The source file is left untouched. A partially written output is removed
/// on failure.
pub async fn normalize<E: Engine>(
    engine: &E,
    cfg: &ClipreelConfig,
    workspace: &Path,
    source: &SourceClip,
) -> Result<NormalizedClip, CompileError> {
    let meta = tokio::fs::metadata(&source.local_path)
        .await
        .map_err(|e| CompileError::SourceUnreadable {
            path: source.local_path.clone(),
            source: e,
        })?;
    if !meta.is_file() || meta.len() == 0 {
        return Err(CompileError::SourceUnreadable {
            path: source.local_path.clone(),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "not a non-empty regular file",
            ),
        });
    }

    let dest = workspace.join(config::normalized_clip_name(source.index));
    let command = normalize_command(cfg, &source.local_path, &dest);

    debug!(
        "normalizing clip {} ({}) -> {}",
        source.index,
        source.local_path.display(),
        dest.display()
    );
    if let Err(e) = engine.run(&command).await {
        let _ = tokio::fs::remove_file(&dest).await;
        return Err(CompileError::Transcode {
            path: source.local_path.clone(),
            source: e,
        });
    }

    Ok(NormalizedClip {
        index: source.index,
        path: dest,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Resolution;
    use crate::engine::testing::FakeEngine;
    use crate::engine::Input;

    fn source(dir: &Path, index: usize, body: &str) -> SourceClip {
        let local_path = dir.join(config::raw_clip_name(index));
        std::fs::write(&local_path, body).unwrap();
        SourceClip {
            index,
            id: format!("id{index}"),
            local_path,
        }
    }

    #[test]
    fn test_command_targets_configured_resolution() {
        let cfg = ClipreelConfig {
            resolution: Resolution { width: 1280, height: 720 },
            preset: "veryfast".into(),
            ..Default::default()
        };
        let args = normalize_command(&cfg, Path::new("in.mp4"), Path::new("out.ts")).build_args();
        let joined = args.join(" ");
        assert!(joined.contains("scale=1280:720:force_original_aspect_ratio=decrease"));
        assert!(joined.contains("pad=1280:720:(ow-iw)/2:(oh-ih)/2,setsar=1"));
        assert!(joined.contains("-preset veryfast"));
        assert!(joined.contains("-bsf:v h264_mp4toannexb"));
        assert!(joined.contains("-f mpegts"));
    }

    #[tokio::test]
    async fn test_normalize_writes_into_workspace() {
        let ws = tempfile::tempdir().unwrap();
        let clip = source(ws.path(), 2, "clip-two\n");
        let engine = FakeEngine::new();

        let out = normalize(&engine, &ClipreelConfig::default(), ws.path(), &clip)
            .await
            .unwrap();
        assert_eq!(out.index, 2);
        assert_eq!(out.path, ws.path().join("clip_002.ts"));
        assert_eq!(std::fs::read_to_string(&out.path).unwrap(), "clip-two\n");
        // source untouched
        assert_eq!(std::fs::read_to_string(&clip.local_path).unwrap(), "clip-two\n");

        let calls = engine.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].input(), &Input::File(clip.local_path.clone()));
    }

    #[tokio::test]
    async fn test_corrupt_source_is_transcode_error() {
        let ws = tempfile::tempdir().unwrap();
        let clip = source(ws.path(), 0, "corrupt");
        let err = normalize(&FakeEngine::new(), &ClipreelConfig::default(), ws.path(), &clip)
            .await
            .unwrap_err();
        assert!(matches!(err, CompileError::Transcode { .. }));
        assert!(err.is_transcode());
        assert!(!ws.path().join("clip_000.ts").exists());
    }

    #[tokio::test]
    async fn test_missing_source_never_spawns() {
        let ws = tempfile::tempdir().unwrap();
        let clip = SourceClip {
            index: 0,
            id: "gone".into(),
            local_path: ws.path().join("raw_000.mp4"),
        };
        let engine = FakeEngine::new();
        let err = normalize(&engine, &ClipreelConfig::default(), ws.path(), &clip)
            .await
            .unwrap_err();
        assert!(matches!(err, CompileError::SourceUnreadable { .. }));
        assert!(err.is_transcode());
        assert!(engine.calls().is_empty());
    }
}
