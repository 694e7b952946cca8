use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};

use clipreel::config::{
    DEFAULT_CHUNK_SIZE, DEFAULT_LEDGER_FILE, DEFAULT_MAX_CLIPS, DEFAULT_MIN_CLIPS,
    DEFAULT_OUTPUT_FILE, DEFAULT_PRESET,
};
use clipreel::{
    ClipreelConfig, Compiler, CopyPublisher, FailurePolicy, FfmpegEngine, FsFetcher, Ledger,
    NoopPublisher, Publisher, Resolution,
};

/// clipreel: compile recently reposted clips into one letterboxed video.
#[derive(Parser)]
#[command(name = "clipreel", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a compilation and hand it to the publisher
    Compile {
        /// Clips to compile, in order (default: recent ledger history)
        files: Vec<String>,

        /// Ledger file listing published clips
        #[arg(long, default_value = DEFAULT_LEDGER_FILE)]
        ledger: PathBuf,

        /// Directory holding the clips named by ledger ids
        #[arg(long)]
        source_dir: Option<PathBuf>,

        /// Where the final video is written during the run
        #[arg(short, long, default_value = DEFAULT_OUTPUT_FILE)]
        output: PathBuf,

        /// Copy the finished compilation into this directory
        #[arg(long)]
        publish_dir: Option<PathBuf>,

        /// Clips merged per chunk (default: 3)
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,

        /// Output resolution (default: 1920x1080)
        #[arg(long, default_value_t = Resolution::default())]
        resolution: Resolution,

        /// x264 preset (default: ultrafast)
        #[arg(long, default_value = DEFAULT_PRESET)]
        preset: String,

        /// Most recent ledger entries to include (default: 12)
        #[arg(long, default_value_t = DEFAULT_MAX_CLIPS)]
        max_clips: usize,

        /// Skip the run when the ledger holds fewer entries (default: 2)
        #[arg(long, default_value_t = DEFAULT_MIN_CLIPS)]
        min_clips: usize,

        /// Kill any single ffmpeg run after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Abort on the first failed clip instead of dropping it
        #[arg(long)]
        fail_fast: bool,

        /// Parent directory for the temporary run workspace
        #[arg(long)]
        workspace_dir: Option<PathBuf>,

        /// Path to the ffmpeg binary (default: found on PATH)
        #[arg(long)]
        ffmpeg: Option<PathBuf>,

        /// Hide the progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// Print the ledger entries a compilation would use
    Select {
        /// Ledger file listing published clips
        #[arg(long, default_value = DEFAULT_LEDGER_FILE)]
        ledger: PathBuf,

        /// Most recent ledger entries to include (default: 12)
        #[arg(long, default_value_t = DEFAULT_MAX_CLIPS)]
        max_clips: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compile {
            files,
            ledger,
            source_dir,
            output,
            publish_dir,
            chunk_size,
            resolution,
            preset,
            max_clips,
            min_clips,
            timeout_secs,
            fail_fast,
            workspace_dir,
            ffmpeg,
            no_progress,
        } => {
            let cfg = ClipreelConfig {
                chunk_size,
                resolution,
                preset,
                max_clips,
                min_clips,
                failure_policy: if fail_fast {
                    FailurePolicy::FailFast
                } else {
                    FailurePolicy::BestEffort
                },
                subprocess_timeout: timeout_secs.map(Duration::from_secs),
                workspace_parent: workspace_dir,
                output_path: output,
                show_progress: !no_progress,
                ..Default::default()
            };

            let selection: Vec<String> = if files.is_empty() {
                let ledger = Ledger::load(&ledger)
                    .with_context(|| format!("cannot load ledger {}", ledger.display()))?;
                if !ledger.has_enough_history(cfg.min_clips) {
                    info!(
                        "only {} clips in history, need {} for a compilation",
                        ledger.history.len(),
                        cfg.min_clips
                    );
                    return Ok(());
                }
                ledger
                    .select_recent(cfg.max_clips)
                    .into_iter()
                    .map(|s| s.entry.drive_id.clone())
                    .collect()
            } else {
                files
            };

            let engine = match ffmpeg {
                Some(path) => FfmpegEngine::with_binary(path),
                None => FfmpegEngine::locate()?,
            }
            .with_timeout(cfg.subprocess_timeout);
            info!("using ffmpeg at {}", engine.binary().display());

            let fetcher = match source_dir {
                Some(dir) => FsFetcher::rooted(dir),
                None => FsFetcher::new(),
            };

            let publisher: Box<dyn Publisher> = match publish_dir {
                Some(dir) => Box::new(CopyPublisher::new(dir)),
                None => {
                    warn!("no --publish-dir given, the compilation will be discarded");
                    Box::new(NoopPublisher)
                }
            };

            let compiler = Compiler::new(cfg, engine, fetcher, publisher)?;
            let report = compiler.run(&selection).await?;

            info!(
                "done: {} of {} clips in {} chunks, {} dropped, published: {}",
                report.included.len(),
                report.selected,
                report.chunk_sizes.len(),
                report.dropped.iter().map(|d| d.indices.len()).sum::<usize>(),
                report.published
            );
        }

        Commands::Select { ledger, max_clips } => {
            let ledger = Ledger::load(&ledger)
                .with_context(|| format!("cannot load ledger {}", ledger.display()))?;
            for selection in ledger.select_recent(max_clips) {
                let entry = selection.entry;
                match &entry.name {
                    Some(name) => println!("{}\t{}\t{}", selection.position, entry.drive_id, name),
                    None => println!("{}\t{}", selection.position, entry.drive_id),
                }
            }
        }
    }

    Ok(())
}
