//! The `mathquiz validate` command.

use std::path::PathBuf;

use anyhow::Result;

use mathquiz_core::validate::{validate_question_set, Severity};

use super::read_question_set;

pub fn execute(questions_path: PathBuf) -> Result<()> {
    let set = read_question_set(&questions_path)?;

    println!(
        "Question set: {} ({} + {} + {} items, {} statements)",
        if set.topic.is_empty() { "(untitled)" } else { &set.topic },
        set.part_a.len(),
        set.part_b.len(),
        set.part_c.len(),
        set.statement_count()
    );

    let issues = validate_question_set(&set);
    for issue in &issues {
        println!("  {issue}");
    }

    let errors = issues
        .iter()
        .filter(|i| i.severity == Severity::Error)
        .count();
    let warnings = issues.len() - errors;

    if errors > 0 {
        anyhow::bail!("question set is not usable: {errors} error(s), {warnings} warning(s)");
    }
    if warnings == 0 {
        println!("Question set valid.");
    } else {
        println!("\n{warnings} warning(s) found.");
    }

    Ok(())
}
