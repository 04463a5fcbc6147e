//! The `mathquiz score` command.

use std::path::PathBuf;

use anyhow::Result;

use mathquiz_core::scoring::score;

use super::{read_answer_sheet, read_question_set};
use crate::display;

pub fn execute(questions_path: PathBuf, answers_path: PathBuf) -> Result<()> {
    let questions = read_question_set(&questions_path)?;
    let answers = read_answer_sheet(&answers_path)?;

    let unknown: Vec<String> = answers
        .answers()
        .map(|a| a.key())
        .filter(|key| !questions.contains(*key))
        .map(|key| key.to_string())
        .collect();
    if !unknown.is_empty() {
        println!("Ignored answers for unknown items: {}", unknown.join(", "));
    }

    display::print_breakdown(&score(&questions, &answers));
    Ok(())
}
