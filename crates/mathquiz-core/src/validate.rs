//! Boundary validation for generated question sets.
//!
//! Generated content has no compile-time guarantee on shape. Structural
//! defects that make a set unusable are errors; deviations from the usual
//! 12 / 4x4 / 6 layout are only warnings since scoring adapts to any size.

use std::collections::HashSet;
use std::fmt;

use crate::model::{Part, QuestionSet};

/// Item counts the generator is asked for.
pub const EXPECTED_PART_A_ITEMS: usize = 12;
pub const EXPECTED_PART_B_ITEMS: usize = 4;
pub const EXPECTED_STATEMENTS_PER_ITEM: usize = 4;
pub const EXPECTED_PART_C_ITEMS: usize = 6;
pub const EXPECTED_OPTIONS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

/// A problem found in a question set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentIssue {
    pub severity: Severity,
    pub part: Option<Part>,
    pub item_id: Option<u32>,
    pub message: String,
}

impl ContentIssue {
    fn error(part: Option<Part>, item_id: Option<u32>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            part,
            item_id,
            message: message.into(),
        }
    }

    fn warning(part: Option<Part>, item_id: Option<u32>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            part,
            item_id,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ContentIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        match (self.part, self.item_id) {
            (Some(part), Some(id)) => write!(f, "{level}: part {part} item {id}: {}", self.message),
            (Some(part), None) => write!(f, "{level}: part {part}: {}", self.message),
            _ => write!(f, "{level}: {}", self.message),
        }
    }
}

/// Validate a question set.
pub fn validate_question_set(set: &QuestionSet) -> Vec<ContentIssue> {
    let mut issues = Vec::new();

    if set.part_a.is_empty() && set.statement_count() == 0 && set.part_c.is_empty() {
        issues.push(ContentIssue::error(None, None, "question set has no items"));
        return issues;
    }

    // Part A
    let mut seen = HashSet::new();
    for q in &set.part_a {
        if !seen.insert(q.id) {
            issues.push(ContentIssue::error(Some(Part::A), Some(q.id), "duplicate item id"));
        }
        if q.correct_option_index >= q.options.len() {
            issues.push(ContentIssue::error(
                Some(Part::A),
                Some(q.id),
                format!(
                    "correct option {} is out of range for {} option(s)",
                    q.correct_option_index,
                    q.options.len()
                ),
            ));
        } else if q.options.len() != EXPECTED_OPTIONS {
            issues.push(ContentIssue::warning(
                Some(Part::A),
                Some(q.id),
                format!("expected {EXPECTED_OPTIONS} options, found {}", q.options.len()),
            ));
        }
    }
    if set.part_a.len() != EXPECTED_PART_A_ITEMS {
        issues.push(ContentIssue::warning(
            Some(Part::A),
            None,
            format!(
                "expected {EXPECTED_PART_A_ITEMS} items, found {}",
                set.part_a.len()
            ),
        ));
    }

    // Part B
    let mut seen = HashSet::new();
    for q in &set.part_b {
        if !seen.insert(q.id) {
            issues.push(ContentIssue::error(Some(Part::B), Some(q.id), "duplicate item id"));
        }
        let mut statement_ids = HashSet::new();
        for s in &q.statements {
            if !statement_ids.insert(s.id) {
                issues.push(ContentIssue::error(
                    Some(Part::B),
                    Some(q.id),
                    format!("duplicate statement id {}", s.id),
                ));
            }
        }
        if q.statements.len() != EXPECTED_STATEMENTS_PER_ITEM {
            issues.push(ContentIssue::warning(
                Some(Part::B),
                Some(q.id),
                format!(
                    "expected {EXPECTED_STATEMENTS_PER_ITEM} statements, found {}",
                    q.statements.len()
                ),
            ));
        }
    }
    if set.part_b.len() != EXPECTED_PART_B_ITEMS {
        issues.push(ContentIssue::warning(
            Some(Part::B),
            None,
            format!(
                "expected {EXPECTED_PART_B_ITEMS} items, found {}",
                set.part_b.len()
            ),
        ));
    }

    // Part C
    let mut seen = HashSet::new();
    for q in &set.part_c {
        if !seen.insert(q.id) {
            issues.push(ContentIssue::error(Some(Part::C), Some(q.id), "duplicate item id"));
        }
        if q.correct_answer.trim().is_empty() {
            issues.push(ContentIssue::warning(
                Some(Part::C),
                Some(q.id),
                "correct answer is empty; no response can match it",
            ));
        }
    }
    if set.part_c.len() != EXPECTED_PART_C_ITEMS {
        issues.push(ContentIssue::warning(
            Some(Part::C),
            None,
            format!(
                "expected {EXPECTED_PART_C_ITEMS} items, found {}",
                set.part_c.len()
            ),
        ));
    }

    issues
}

/// Whether `issues` contains anything that makes the set unusable.
pub fn has_errors(issues: &[ContentIssue]) -> bool {
    issues.iter().any(ContentIssue::is_error)
}
