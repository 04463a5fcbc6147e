pub mod init;
pub mod lessons;
pub mod score;
pub mod take;
pub mod validate;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use mathquiz_core::curriculum::Curriculum;
use mathquiz_core::model::{AnswerSheet, QuestionSet};
use mathquiz_core::progress::ProgressStore;
use mathquiz_providers::MathquizConfig;

/// Curriculum named in the config, or the bundled one.
pub(crate) fn load_curriculum(config: &MathquizConfig) -> Result<Curriculum> {
    match &config.curriculum_path {
        Some(path) => Curriculum::load(path),
        None => Curriculum::bundled(),
    }
}

pub(crate) fn open_progress(config: &MathquizConfig, override_path: Option<PathBuf>) -> ProgressStore {
    ProgressStore::open(override_path.unwrap_or_else(|| config.progress_path.clone()))
}

pub(crate) fn read_question_set(path: &Path) -> Result<QuestionSet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read question set: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse question set: {}", path.display()))
}

pub(crate) fn read_answer_sheet(path: &Path) -> Result<AnswerSheet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read answers: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse answers: {}", path.display()))
}
