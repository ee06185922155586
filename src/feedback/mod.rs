// Feedback module
// Append-only CSV log of user ratings for answered queries


use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{RagError, Result};

/// One rating a user gave to the answer for `query`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    #[serde(rename = "Query")]
    pub query: String,
    #[serde(rename = "Rating")]
    pub rating: i64,
}

impl FeedbackRecord {
    #[inline]
    pub fn new(query: impl Into<String>, rating: i64) -> Self {
        Self {
            query: query.into(),
            rating,
        }
    }
}

/// Ratings log with columns `Query,Rating`.
///
/// Records are only ever appended. Ratings are stored as given, with no
/// range check.
#[derive(Debug)]
pub struct FeedbackStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FeedbackStore {
    #[inline]
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record, creating the log (with its header) if needed.
    ///
    /// Returns only after the record has been flushed to the file.
    #[inline]
    pub fn record(&self, query: &str, rating: i64) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|e| anyhow!("Feedback log lock poisoned: {}", e))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.write_error(&e))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.write_error(&e))?;
        let needs_header = file.metadata().map_err(|e| self.write_error(&e))?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer
            .serialize(FeedbackRecord::new(query, rating))
            .map_err(|e| self.write_error(&e))?;
        writer.flush().map_err(|e| self.write_error(&e))?;

        debug!("Recorded rating {} in {}", rating, self.path.display());
        Ok(())
    }

    /// Every record in the order written; empty when the log does not exist
    #[inline]
    pub fn all_records(&self) -> Result<Vec<FeedbackRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(&self.path).map_err(|e| {
            RagError::Feedback(format!("Failed to open {}: {}", self.path.display(), e))
        })?;

        let records = reader
            .deserialize::<FeedbackRecord>()
            .map(|record| {
                record.map_err(|e| {
                    // Quoted queries may span lines, so the reader's own position is used
                    let line = e
                        .position()
                        .map_or_else(|| "?".to_owned(), |position| position.line().to_string());
                    RagError::Feedback(format!(
                        "Invalid record on line {} of {}: {}",
                        line,
                        self.path.display(),
                        e
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        info!("Read {} feedback records", records.len());
        Ok(records)
    }

    fn write_error(&self, error: &dyn std::fmt::Display) -> RagError {
        RagError::Feedback(format!(
            "Failed to write {}: {}",
            self.path.display(),
            error
        ))
    }
}
