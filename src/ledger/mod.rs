//! The repost ledger: a JSON record of every clip already published.
//!
//! Compilations are built from the tail of this history. The file is parsed
//! into typed entries up front and any structural problem is fatal, so a
//! damaged ledger never turns into a silently empty or wrong selection.

use std::fs;
use std::io;
use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("cannot read ledger: {0}")]
    Io(#[from] io::Error),
    #[error("malformed ledger: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("ledger entry {index} is invalid: {reason}")]
    InvalidEntry { index: usize, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishStatus {
    #[default]
    Published,
    Pending,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Opaque id of the clip in the source drive.
    #[serde(rename = "driveId")]
    pub drive_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub status: PublishStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    pub history: Vec<LedgerEntry>,
}

/// A ledger entry chosen for a compilation, with its position in the history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection<'a> {
    pub position: usize,
    pub entry: &'a LedgerEntry,
}

impl Ledger {
    /// Load and validate a ledger. A missing file is an empty ledger.
    pub fn load(path: &Path) -> Result<Self, LedgerError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("no ledger at {}, starting empty", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, LedgerError> {
        let ledger: Ledger = serde_json::from_str(text)?;
        ledger.validate()?;
        Ok(ledger)
    }

    fn validate(&self) -> Result<(), LedgerError> {
        for (index, entry) in self.history.iter().enumerate() {
            if entry.drive_id.trim().is_empty() {
                return Err(LedgerError::InvalidEntry {
                    index,
                    reason: "empty driveId".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Whether there is enough history to be worth compiling.
    pub fn has_enough_history(&self, min_clips: usize) -> bool {
        self.history.len() >= min_clips
    }

    /// Pick the published entries among the last `max_clips`, oldest first.
    ///
    /// Placeholder ids shorter than [`config::MIN_REMOTE_ID_LEN`] are skipped.
    pub fn select_recent(&self, max_clips: usize) -> Vec<Selection<'_>> {
        let start = self.history.len().saturating_sub(max_clips);
        self.history
            .iter()
            .enumerate()
            .skip(start)
            .filter(|(position, entry)| {
                if entry.status != PublishStatus::Published {
                    debug!("skipping entry {position}: status {:?}", entry.status);
                    return false;
                }
                if entry.drive_id.len() < config::MIN_REMOTE_ID_LEN {
                    debug!("skipping entry {position}: placeholder id {:?}", entry.drive_id);
                    return false;
                }
                true
            })
            .map(|(position, entry)| Selection { position, entry })
            .collect()
    }
}
