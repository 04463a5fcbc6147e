//! Scoring engine.
//!
//! A quiz is worth 10 points: 3.0 for Part A, 4.0 for Part B and 3.0 for
//! Part C. Each part's points are split evenly over however many items (or
//! statements, for Part B) the question set supplies, so content of any
//! size keeps the same distribution.

use serde::{Deserialize, Serialize};

use crate::model::{AnswerSheet, QuestionSet};

/// Points available in Part A (single choice).
pub const PART_A_POINTS: f64 = 3.0;
/// Points available in Part B (true/false statements).
pub const PART_B_POINTS: f64 = 4.0;
/// Points available in Part C (short answer).
pub const PART_C_POINTS: f64 = 3.0;
/// Maximum total score.
pub const MAX_SCORE: f64 = PART_A_POINTS + PART_B_POINTS + PART_C_POINTS;

/// Per-part and total score for one answer sheet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub part_a: f64,
    pub part_b: f64,
    pub part_c: f64,
    /// Sum of the parts, clamped to `0..=10`.
    pub total: f64,
    /// Units answered correctly.
    pub correct: usize,
    /// Units in the question set.
    pub possible: usize,
}

impl ScoreBreakdown {
    pub fn passed(&self) -> bool {
        crate::progress::is_passing(self.total)
    }
}

/// Points a single correct unit earns in a part with `count` units.
pub fn unit_weight(part_points: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        part_points / count as f64
    }
}

/// Score `answers` against `questions`.
///
/// Answers that reference items absent from the set are ignored. Unanswered
/// units earn nothing and are never penalised.
pub fn score(questions: &QuestionSet, answers: &AnswerSheet) -> ScoreBreakdown {
    let mut correct = 0usize;

    let weight_a = unit_weight(PART_A_POINTS, questions.part_a.len());
    let hits_a = questions
        .part_a
        .iter()
        .filter(|q| answers.choice(q.id) == Some(q.correct_option_index))
        .count();
    correct += hits_a;

    let weight_b = unit_weight(PART_B_POINTS, questions.statement_count());
    let hits_b = questions
        .part_b
        .iter()
        .flat_map(|q| q.statements.iter().map(move |s| (q.id, s)))
        .filter(|(item, s)| answers.statement(*item, s.id) == Some(s.is_true))
        .count();
    correct += hits_b;

    let weight_c = unit_weight(PART_C_POINTS, questions.part_c.len());
    let hits_c = questions
        .part_c
        .iter()
        .filter(|q| {
            answers
                .short(q.id)
                .is_some_and(|given| short_answer_matches(given, &q.correct_answer))
        })
        .count();
    correct += hits_c;

    let part_a = hits_a as f64 * weight_a;
    let part_b = hits_b as f64 * weight_b;
    let part_c = hits_c as f64 * weight_c;

    ScoreBreakdown {
        part_a,
        part_b,
        part_c,
        total: (part_a + part_b + part_c).clamp(0.0, MAX_SCORE),
        correct,
        possible: questions.part_a.len() + questions.statement_count() + questions.part_c.len(),
    }
}

/// Normalise a short answer for comparison: trim and lower-case.
pub fn normalize_short_answer(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Whether `given` matches `expected` after normalisation. An empty answer
/// never matches.
pub fn short_answer_matches(given: &str, expected: &str) -> bool {
    let given = normalize_short_answer(given);
    !given.is_empty() && given == normalize_short_answer(expected)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::{
        Answer, MultipleChoiceItem, ShortAnswerItem, Statement, TrueFalseItem,
    };

    /// A question set following the 12 / 4x4 / 6 content contract.
    pub(crate) fn contract_set() -> QuestionSet {
        let part_a = (1..=12)
            .map(|id| MultipleChoiceItem {
                id,
                prompt: format!("Câu {id}"),
                options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
                correct_option_index: (id as usize) % 4,
                explanation: None,
            })
            .collect();
        let part_b = (1..=4)
            .map(|id| TrueFalseItem {
                id,
                stem: format!("Đề dẫn {id}"),
                statements: (1..=4)
                    .map(|s| Statement {
                        id: s,
                        text: format!("Ý {s}"),
                        is_true: s % 2 == 0,
                        explanation: Some(format!("Giải thích {id}.{s}")),
                    })
                    .collect(),
            })
            .collect();
        let part_c = (1..=6)
            .map(|id| ShortAnswerItem {
                id,
                prompt: format!("Câu {id}"),
                correct_answer: (id * 10).to_string(),
                explanation: None,
            })
            .collect();
        QuestionSet {
            topic: "Bài 1: Tập hợp".into(),
            part_a,
            part_b,
            part_c,
        }
    }

    pub(crate) fn all_correct(set: &QuestionSet) -> AnswerSheet {
        let mut sheet = AnswerSheet::new();
        for q in &set.part_a {
            sheet.set(Answer::Choice {
                item: q.id,
                option: q.correct_option_index,
            });
        }
        for q in &set.part_b {
            for s in &q.statements {
                sheet.set(Answer::Statement {
                    item: q.id,
                    statement: s.id,
                    value: s.is_true,
                });
            }
        }
        for q in &set.part_c {
            sheet.set(Answer::Short {
                item: q.id,
                text: q.correct_answer.clone(),
            });
        }
        sheet
    }

    #[test]
    fn empty_answers_score_zero() {
        let set = contract_set();
        let result = score(&set, &AnswerSheet::new());
        assert_eq!(result.total, 0.0);
        assert_eq!(result.possible, 34);
    }

    #[test]
    fn perfect_answers_score_ten() {
        let set = contract_set();
        let result = score(&set, &all_correct(&set));
        assert_eq!(result.total, 10.0);
        assert_eq!(result.correct, 34);
        assert!(result.passed());
    }

    #[test]
    fn each_part_carries_its_points() {
        let set = contract_set();
        let full = all_correct(&set);

        let only_a = AnswerSheet {
            choices: full.choices.clone(),
            ..Default::default()
        };
        assert_eq!(score(&set, &only_a).total, 3.0);

        let only_b = AnswerSheet {
            statements: full.statements.clone(),
            ..Default::default()
        };
        assert_eq!(score(&set, &only_b).total, 4.0);

        let only_c = AnswerSheet {
            short: full.short.clone(),
            ..Default::default()
        };
        assert_eq!(score(&set, &only_c).total, 3.0);
    }

    #[test]
    fn short_answers_ignore_case_and_whitespace() {
        assert!(short_answer_matches("  10 ", "10"));
        assert!(short_answer_matches("X = 5", "x = 5"));
        assert!(!short_answer_matches("10kg", "10"));
        assert!(!short_answer_matches("   ", ""));
        assert!(!short_answer_matches("", ""));
    }

    #[test]
    fn wrong_answers_are_not_penalised() {
        let set = contract_set();
        let mut sheet = all_correct(&set);
        // Flip one statement and one choice.
        sheet.set(Answer::Statement {
            item: 1,
            statement: 1,
            value: true,
        });
        sheet.set(Answer::Choice { item: 1, option: 0 });
        assert_eq!(score(&set, &sheet).total, 9.5);
    }

    #[test]
    fn stray_answers_are_ignored() {
        let set = contract_set();
        let mut sheet = AnswerSheet::new();
        sheet.set(Answer::Choice { item: 99, option: 0 });
        sheet.set(Answer::Statement {
            item: 99,
            statement: 1,
            value: true,
        });
        sheet.set(Answer::Short {
            item: 99,
            text: "10".into(),
        });
        assert_eq!(score(&set, &sheet).total, 0.0);
    }

    #[test]
    fn weights_follow_item_counts() {
        let mut set = contract_set();
        set.part_a.truncate(3);
        set.part_c.truncate(2);
        let result = score(&set, &all_correct(&set));
        assert_eq!(result.part_a, 3.0);
        assert_eq!(result.part_c, 3.0);
        assert_eq!(result.total, 10.0);
    }

    #[test]
    fn missing_part_contributes_nothing() {
        let mut set = contract_set();
        set.part_b.clear();
        let result = score(&set, &all_correct(&set));
        assert_eq!(result.part_b, 0.0);
        assert_eq!(result.total, 6.0);
    }

    #[test]
    fn scoring_is_deterministic() {
        let set = contract_set();
        let mut sheet = all_correct(&set);
        sheet.set(Answer::Short {
            item: 3,
            text: "wrong".into(),
        });
        let first = score(&set, &sheet);
        let second = score(&set, &sheet);
        assert_eq!(first.total.to_bits(), second.total.to_bits());
        assert_eq!(first, second);
    }

    #[test]
    fn odd_sized_sets_stay_in_range() {
        let mut set = contract_set();
        set.part_a.truncate(7);
        set.part_b[0].statements.truncate(3);
        let result = score(&set, &all_correct(&set));
        assert!((0.0..=MAX_SCORE).contains(&result.total));
        assert!((result.total - 10.0).abs() < 1e-9);
    }
}
