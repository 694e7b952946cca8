pub mod chunker;
pub mod config;
pub mod engine;
pub mod ledger;
pub mod manifest;
pub mod pipeline;
mod workspace;

pub use config::{ClipreelConfig, FailurePolicy, Resolution};
pub use engine::{Engine, EngineError, FfmpegCommand, FfmpegEngine};
pub use ledger::{Ledger, LedgerError};
pub use pipeline::clip::CompilationOutput;
pub use pipeline::fetch::{ClipFetcher, FetchError, FsFetcher};
pub use pipeline::hook::{CopyPublisher, NoopPublisher, Publisher};
pub use pipeline::{CompileError, Compiler, RunReport, RunStage};
