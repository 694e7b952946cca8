use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::config::{self, ClipreelConfig};
use crate::engine::{Engine, FfmpegCommand};
use crate::manifest;
use crate::pipeline::clip::NormalizedClip;
use crate::pipeline::CompileError;
use crate::workspace::absolute;

/// Merge one ordered group of normalized clips into a chunk file.
///
/// Members may carry slightly different timestamps, so the chunk is
/// re-encoded to one consistent timeline rather than stream-copied.
pub async fn merge_chunk<E: Engine>(
    engine: &E,
    cfg: &ClipreelConfig,
    workspace: &Path,
    chunk_index: usize,
    members: &[NormalizedClip],
) -> Result<PathBuf, CompileError> {
    if members.is_empty() {
        return Err(CompileError::InvalidArgument(format!(
            "chunk {chunk_index} has no members"
        )));
    }

    let paths: Vec<PathBuf> = members.iter().map(|m| m.path.clone()).collect();
    let list = manifest::write(workspace, &config::chunk_manifest_name(chunk_index), &paths)?;
    let output = workspace.join(config::chunk_name(chunk_index));

    let command = FfmpegCommand::concat(list, &output)
        .working_dir(workspace)
        .video_codec(&cfg.video_codec)
        .preset(&cfg.preset)
        .audio_codec(&cfg.audio_codec);

    debug!("merging chunk {} from {} clips", chunk_index, members.len());
    run_concat(engine, &command, &output).await?;
    Ok(output)
}

/// Join the ordered chunk files into the final deliverable at `output`.
///
/// Chunks already share one encoding, so this is a stream copy. With no
/// chunks the run is over: nothing is spawned and [`CompileError::NoInput`]
/// is returned.
pub async fn assemble_final<E: Engine>(
    engine: &E,
    workspace: &Path,
    chunks: &[PathBuf],
    output: &Path,
) -> Result<PathBuf, CompileError> {
    if chunks.is_empty() {
        return Err(CompileError::NoInput);
    }

    let list = manifest::write(workspace, config::FINAL_MANIFEST, chunks)?;
    // ffmpeg runs inside the workspace, so a relative output would land there.
    let output = absolute(output).map_err(CompileError::Workspace)?;

    let command = FfmpegCommand::concat(list, &output)
        .working_dir(workspace)
        .stream_copy();

    info!("merging {} chunks into {}", chunks.len(), output.display());
    run_concat(engine, &command, &output).await?;
    Ok(output)
}

async fn run_concat<E: Engine>(
    engine: &E,
    command: &FfmpegCommand,
    output: &Path,
) -> Result<(), CompileError> {
    if let Err(e) = engine.run(command).await {
        let _ = tokio::fs::remove_file(output).await;
        return Err(CompileError::Merge {
            output: output.to_path_buf(),
            source: e,
        });
    }
    Ok(())
}
