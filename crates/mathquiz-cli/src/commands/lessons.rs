//! The `mathquiz lessons` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use mathquiz_core::gate::{LessonStatus, ProgressionGate};
use mathquiz_core::model::QuizMode;
use mathquiz_core::report::format_score;
use mathquiz_providers::load_config_from;

use super::{load_curriculum, open_progress};

pub fn execute(mode: QuizMode, progress: Option<PathBuf>, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let curriculum = load_curriculum(&config)?;
    let progress = open_progress(&config, progress);
    let gate = ProgressionGate::new(&curriculum, &progress);

    let mut table = Table::new();
    table.set_header(vec!["Chapter", "Lesson", "Title", "Status", "Best"]);

    let statuses = gate.statuses(mode);
    let mut previous_chapter: Option<&str> = None;
    for (lesson, status) in &statuses {
        let chapter = if previous_chapter == Some(lesson.chapter_id.as_str()) {
            String::new()
        } else {
            curriculum
                .chapters()
                .iter()
                .find(|c| c.id == lesson.chapter_id)
                .map(|c| c.title.clone())
                .unwrap_or_default()
        };
        previous_chapter = Some(lesson.chapter_id.as_str());

        table.add_row(vec![
            Cell::new(chapter),
            Cell::new(&lesson.id),
            Cell::new(&lesson.title),
            Cell::new(status),
            Cell::new(
                progress
                    .get(&lesson.id)
                    .map(format_score)
                    .unwrap_or_else(|| "-".into()),
            ),
        ]);
    }

    println!("{table}");
    if mode == QuizMode::Assessment {
        println!(
            "Passed {}/{} lessons.",
            statuses
                .iter()
                .filter(|(_, status)| *status == LessonStatus::Passed)
                .count(),
            curriculum.len()
        );
    }

    Ok(())
}
