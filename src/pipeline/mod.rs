pub mod clip;
pub mod error;
pub mod fetch;
pub mod hook;
pub mod merge;
pub mod normalize;

use std::fmt;
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};

use crate::chunker;
use crate::config::{self, ClipreelConfig};
use crate::engine::Engine;
use crate::workspace::{self, RunWorkspace};
use clip::{CompilationOutput, NormalizedClip, SourceClip};
use fetch::ClipFetcher;
use hook::Publisher;

pub use error::CompileError;

/// Where a run is in its strictly linear life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Idle,
    Fetching,
    Normalizing,
    ChunkMerging,
    FinalAssembling,
    HandedOff,
    CleanedUp,
    Aborted,
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Fetching => "fetching",
            Self::Normalizing => "normalizing",
            Self::ChunkMerging => "chunk merging",
            Self::FinalAssembling => "final assembling",
            Self::HandedOff => "handed off",
            Self::CleanedUp => "cleaned up",
            Self::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Clips lost to a per-item failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedItem {
    /// Selection indices of the lost clips. One for a clip, all members for a chunk.
    pub indices: Vec<usize>,
    pub stage: RunStage,
    pub reason: String,
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Every stage entered, in order.
    pub stages: Vec<RunStage>,
    pub selected: usize,
    /// Selection indices present in the compilation, in playback order.
    pub included: Vec<usize>,
    pub dropped: Vec<DroppedItem>,
    /// Clip count of each merged chunk, in merge order.
    pub chunk_sizes: Vec<usize>,
    pub published: bool,
    /// Already removed by the time the report is returned.
    pub workspace: PathBuf,
    /// Already removed by the time the report is returned.
    pub output: PathBuf,
}

impl RunReport {
    fn new(selected: usize, output: PathBuf) -> Self {
        Self {
            stages: vec![RunStage::Idle],
            selected,
            included: Vec::new(),
            dropped: Vec::new(),
            chunk_sizes: Vec::new(),
            published: false,
            workspace: PathBuf::new(),
            output,
        }
    }

    pub fn stage(&self) -> RunStage {
        self.stages.last().copied().unwrap_or(RunStage::Idle)
    }

    fn enter(&mut self, stage: RunStage) {
        info!("stage: {}", stage);
        self.stages.push(stage);
    }
}

/// Drives one compilation: fetch, normalize, chunk-merge, assemble, hand off, clean up.
///
/// Items are processed one at a time. Each ffmpeg invocation is awaited before
/// the next is issued, which keeps peak CPU and memory at one transcode.
pub struct Compiler<E, F, P> {
    cfg: ClipreelConfig,
    engine: E,
    fetcher: F,
    publisher: P,
}

impl<E: Engine, F: ClipFetcher, P: Publisher> Compiler<E, F, P> {
    pub fn new(
        cfg: ClipreelConfig,
        engine: E,
        fetcher: F,
        publisher: P,
    ) -> Result<Self, CompileError> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            engine,
            fetcher,
            publisher,
        })
    }

    pub fn config(&self) -> &ClipreelConfig {
        &self.cfg
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Compile the clips identified by `selection`, in that order.
    ///
    /// The workspace and the final file are removed before this returns,
    /// whatever the outcome.
    pub async fn run<S: AsRef<str>>(&self, selection: &[S]) -> Result<RunReport, CompileError> {
        let output = workspace::absolute(&self.cfg.output_path).map_err(CompileError::Workspace)?;
        let mut report = RunReport::new(selection.len(), output);

        let mut ws = RunWorkspace::create(self.cfg.workspace_parent.as_deref()).map_err(|e| {
            error!("cannot create run workspace: {}", e);
            CompileError::Workspace(e)
        })?;
        report.workspace = ws.path().to_path_buf();
        info!(
            "compiling {} clips in {}",
            selection.len(),
            report.workspace.display()
        );

        let result = self.drive(&ws, selection, &mut report).await;
        if let Err(e) = &result {
            error!("run aborted during {}: {}", report.stage(), e);
            report.enter(RunStage::Aborted);
        }

        let cleaned = ws
            .cleanup()
            .and_then(|()| workspace::remove_file_if_exists(&report.output));
        match cleaned {
            Ok(()) => report.enter(RunStage::CleanedUp),
            Err(e) => {
                error!("cleanup of {} failed: {}", report.workspace.display(), e);
                result?;
                return Err(CompileError::Workspace(e));
            }
        }

        result.map(|()| report)
    }

    async fn drive<S: AsRef<str>>(
        &self,
        ws: &RunWorkspace,
        selection: &[S],
        report: &mut RunReport,
    ) -> Result<(), CompileError> {
        report.enter(RunStage::Fetching);
        let sources = self.fetch_all(ws, selection, report).await?;

        report.enter(RunStage::Normalizing);
        let normalized = self.normalize_all(ws.path(), &sources, report).await?;

        report.enter(RunStage::ChunkMerging);
        let chunks = self.merge_all(ws.path(), &normalized, report).await?;

        report.enter(RunStage::FinalAssembling);
        let chunk_paths: Vec<PathBuf> = chunks.iter().map(|(path, _)| path.clone()).collect();
        let final_path =
            merge::assemble_final(&self.engine, ws.path(), &chunk_paths, &report.output).await?;
        report.included = chunks.into_iter().flat_map(|(_, indices)| indices).collect();

        let output = CompilationOutput {
            path: final_path,
            clip_count: report.included.len(),
        };
        info!(
            "compilation ready: {} of {} clips",
            output.clip_count, report.selected
        );
        match self.publisher.publish(&output).await {
            Ok(()) => report.published = true,
            Err(e) => warn!("publishing failed, keeping run result: {:#}", e),
        }
        report.enter(RunStage::HandedOff);
        Ok(())
    }

    async fn fetch_all<S: AsRef<str>>(
        &self,
        ws: &RunWorkspace,
        selection: &[S],
        report: &mut RunReport,
    ) -> Result<Vec<SourceClip>, CompileError> {
        let mut sources = Vec::with_capacity(selection.len());
        for (index, id) in selection.iter().enumerate() {
            let id = id.as_ref();
            let dest = ws.file(&config::raw_clip_name(index));
            info!("fetching clip {} ({})", index, id);
            match self.fetcher.fetch(id, &dest).await {
                Ok(()) => sources.push(SourceClip {
                    index,
                    id: id.to_string(),
                    local_path: dest,
                }),
                Err(source) => {
                    let _ = workspace::remove_file_if_exists(&dest);
                    let err = CompileError::Fetch {
                        id: id.to_string(),
                        source,
                    };
                    self.drop_item(report, vec![index], err)?;
                }
            }
        }
        info!("fetched {} of {} clips", sources.len(), selection.len());
        Ok(sources)
    }

    async fn normalize_all(
        &self,
        ws: &Path,
        sources: &[SourceClip],
        report: &mut RunReport,
    ) -> Result<Vec<NormalizedClip>, CompileError> {
        let progress = self.progress_bar(sources.len() as u64);
        let mut normalized = Vec::with_capacity(sources.len());
        for source in sources {
            match normalize::normalize(&self.engine, &self.cfg, ws, source).await {
                Ok(clip) => normalized.push(clip),
                Err(e) => {
                    progress.suspend(|| self.drop_item(report, vec![source.index], e))?;
                }
            }
            progress.inc(1);
        }
        progress.finish_and_clear();
        info!("normalized {} of {} clips", normalized.len(), sources.len());
        Ok(normalized)
    }

    async fn merge_all(
        &self,
        ws: &Path,
        normalized: &[NormalizedClip],
        report: &mut RunReport,
    ) -> Result<Vec<(PathBuf, Vec<usize>)>, CompileError> {
        let groups = chunker::partition(normalized, self.cfg.chunk_size);
        let mut merged = Vec::with_capacity(groups.len());
        for group in &groups {
            let indices: Vec<usize> = group.members.iter().map(|c| c.index).collect();
            info!(
                "merging chunk {}/{} ({} clips)",
                group.index + 1,
                groups.len(),
                group.len()
            );
            let result =
                merge::merge_chunk(&self.engine, &self.cfg, ws, group.index, &group.members).await;
            match result {
                Ok(path) => {
                    report.chunk_sizes.push(group.len());
                    merged.push((path, indices));
                }
                Err(e) => self.drop_item(report, indices, e)?,
            }
        }
        Ok(merged)
    }

    /// Record a per-item failure, or turn it into a run failure.
    fn drop_item(
        &self,
        report: &mut RunReport,
        indices: Vec<usize>,
        err: CompileError,
    ) -> Result<(), CompileError> {
        if !err.is_per_item() || self.cfg.fail_fast() {
            return Err(err);
        }
        warn!("dropping clip(s) {:?} during {}: {}", indices, report.stage(), err);
        report.dropped.push(DroppedItem {
            indices,
            stage: report.stage(),
            reason: err.to_string(),
        });
        Ok(())
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.cfg.show_progress {
            return ProgressBar::hidden();
        }
        let style = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} clips normalized ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-");
        let bar = ProgressBar::new(len);
        bar.set_style(style);
        bar
    }
}
