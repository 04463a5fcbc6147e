//! Durable best-score store.
//!
//! Progress is a flat JSON object `{"scores": {"<lesson id>": <best>}}`.
//! Loading is best-effort: a missing or corrupt file yields empty progress.
//! Every mutation rewrites the whole file through a temp file and an atomic
//! rename, so readers never observe a partial write.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ProgressError;

/// Minimum best score for a lesson to count as passed.
pub const PASS_THRESHOLD: f64 = 8.0;

/// Default storage identifier for the progress file.
pub const DEFAULT_PROGRESS_FILE: &str = "math6_kntt_progress.json";

/// Persisted shape of the progress blob.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    #[serde(default)]
    pub scores: BTreeMap<String, f64>,
}

/// Owner of the learner's best scores.
#[derive(Debug)]
pub struct ProgressStore {
    record: ProgressRecord,
    path: Option<PathBuf>,
}

impl ProgressStore {
    /// A store that is never written to disk.
    pub fn in_memory() -> Self {
        Self {
            record: ProgressRecord::default(),
            path: None,
        }
    }

    /// Open the store backed by `path`.
    ///
    /// A missing file starts empty. Unreadable or unparsable content is
    /// logged and discarded; it is never an error.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let record = match std::fs::read_to_string(&path) {
            Ok(content) => parse_record(&content, &path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => ProgressRecord::default(),
            Err(e) => {
                tracing::warn!(
                    "could not read progress from {}: {e}; starting empty",
                    path.display()
                );
                ProgressRecord::default()
            }
        };
        tracing::debug!(
            "loaded {} lesson score(s) from {}",
            record.scores.len(),
            path.display()
        );
        Self {
            record,
            path: Some(path),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Best score recorded for `lesson_id`.
    pub fn get(&self, lesson_id: &str) -> Option<f64> {
        self.record.scores.get(lesson_id).copied()
    }

    pub fn record(&self) -> &ProgressRecord {
        &self.record
    }

    /// Store `score` if it beats the current best (0 when absent).
    ///
    /// Returns whether the stored value changed. A change is written through
    /// to disk before returning.
    pub fn record_if_better(&mut self, lesson_id: &str, score: f64) -> Result<bool, ProgressError> {
        if !(0.0..=10.0).contains(&score) {
            return Err(ProgressError::InvalidScore(score));
        }
        let current = self.get(lesson_id).unwrap_or(0.0);
        if score <= current {
            tracing::debug!("keeping best {current} for {lesson_id} (new score {score})");
            return Ok(false);
        }

        self.record.scores.insert(lesson_id.to_string(), score);
        tracing::info!("new best score {score} for {lesson_id} (was {current})");
        self.persist()?;
        Ok(true)
    }

    /// Lessons whose best score is at least [`PASS_THRESHOLD`].
    pub fn all_passed(&self) -> BTreeSet<String> {
        self.record
            .scores
            .iter()
            .filter(|(_, &score)| is_passing(score))
            .map(|(id, _)| id.clone())
            .collect()
    }

    fn persist(&self) -> Result<(), ProgressError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(&self.record)?;
        write_atomically(path, json.as_bytes()).map_err(|source| ProgressError::Write {
            path: path.display().to_string(),
            source,
        })
    }
}

/// Whether `score` clears the pass threshold.
pub fn is_passing(score: f64) -> bool {
    score >= PASS_THRESHOLD
}

fn parse_record(content: &str, path: &Path) -> ProgressRecord {
    match serde_json::from_str::<ProgressRecord>(content) {
        Ok(record) => {
            let mut record = record;
            let before = record.scores.len();
            record
                .scores
                .retain(|_, score| score.is_finite() && (0.0..=10.0).contains(score));
            if record.scores.len() != before {
                tracing::warn!(
                    "dropped {} out-of-range score(s) from {}",
                    before - record.scores.len(),
                    path.display()
                );
            }
            record
        }
        Err(e) => {
            tracing::warn!(
                "progress file {} is corrupt ({e}); starting with empty progress",
                path.display()
            );
            ProgressRecord::default()
        }
    }
}

fn write_atomically(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_best_score() {
        let mut store = ProgressStore::in_memory();
        assert!(store.record_if_better("l1.1", 6.0).unwrap());
        assert!(store.record_if_better("l1.1", 9.0).unwrap());
        assert!(!store.record_if_better("l1.1", 5.0).unwrap());
        assert_eq!(store.get("l1.1"), Some(9.0));
    }

    #[test]
    fn zero_is_not_recorded_over_absent() {
        let mut store = ProgressStore::in_memory();
        assert!(!store.record_if_better("l1.1", 0.0).unwrap());
        assert_eq!(store.get("l1.1"), None);
    }

    #[test]
    fn rejects_out_of_range_scores() {
        let mut store = ProgressStore::in_memory();
        assert!(matches!(
            store.record_if_better("l1.1", 10.5),
            Err(ProgressError::InvalidScore(_))
        ));
        assert!(store.record_if_better("l1.1", f64::NAN).is_err());
    }

    #[test]
    fn all_passed_uses_threshold() {
        let mut store = ProgressStore::in_memory();
        store.record_if_better("a", 7.99).unwrap();
        store.record_if_better("b", 8.0).unwrap();
        store.record_if_better("c", 10.0).unwrap();
        let passed = store.all_passed();
        assert!(!passed.contains("a"));
        assert!(passed.contains("b"));
        assert!(passed.contains("c"));
    }

    #[test]
    fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");

        let mut store = ProgressStore::open(&path);
        store.record_if_better("l1.1", 8.5).unwrap();

        let reopened = ProgressStore::open(&path);
        assert_eq!(reopened.get("l1.1"), Some(8.5));
    }

    #[test]
    fn corrupt_file_is_empty_progress() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");
        std::fs::write(&path, "{not json").unwrap();

        let mut store = ProgressStore::open(&path);
        assert!(store.record().scores.is_empty());

        // The next commit replaces the corrupt blob.
        store.record_if_better("l1.1", 7.0).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let record: ProgressRecord = serde_json::from_str(&content).unwrap();
        assert_eq!(record.scores.get("l1.1"), Some(&7.0));
    }

    #[test]
    fn out_of_range_entries_dropped_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");
        std::fs::write(&path, r#"{"scores": {"l1.1": 9.0, "l1.2": 42.0}}"#).unwrap();

        let store = ProgressStore::open(&path);
        assert_eq!(store.get("l1.1"), Some(9.0));
        assert_eq!(store.get("l1.2"), None);
    }

    #[test]
    fn missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProgressStore::open(dir.path().join("nested/progress.json"));
        assert!(store.all_passed().is_empty());
    }
}
