//! Score report payloads for downstream collaborators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who the report is about. Supplied by configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentInfo {
    #[serde(default)]
    pub student_name: String,
    #[serde(default)]
    pub class_name: String,
    #[serde(default)]
    pub school_name: String,
}

/// Opaque payload handed to a [`crate::traits::ReportSender`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    #[serde(flatten)]
    pub student: StudentInfo,
    pub score: f64,
    pub topic: String,
    pub date: DateTime<Utc>,
}

impl ScoreReport {
    pub fn new(student: StudentInfo, score: f64, topic: impl Into<String>) -> Self {
        Self {
            student,
            score,
            topic: topic.into(),
            date: Utc::now(),
        }
    }
}

/// Format a score for display, dropping trailing zeros ("8.5", "10").
///
/// Truncated to two decimals, so a failing total never prints as a pass.
pub fn format_score(score: f64) -> String {
    let truncated = ((score * 100.0) + 1e-9).floor() / 100.0;
    let text = format!("{truncated:.2}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Text used when the learner shares a result.
pub fn share_message(score: f64, topic: &str) -> String {
    format!(
        "Tôi vừa đạt {}/10 điểm bài \"{topic}\" trên ứng dụng Toán 6 KNTT Master! 🏆",
        format_score(score)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_formatting() {
        assert_eq!(format_score(10.0), "10");
        assert_eq!(format_score(8.5), "8.5");
        assert_eq!(format_score(7.75), "7.75");
        assert_eq!(format_score(0.0), "0");
    }

    #[test]
    fn near_threshold_score_is_not_rounded_up() {
        assert!(!crate::progress::is_passing(7.996));
        assert_eq!(format_score(7.996), "7.99");
        assert_eq!(format_score(0.29), "0.29");
        assert_eq!(format_score(8.0), "8");
    }

    #[test]
    fn share_text_mentions_score_and_topic() {
        let text = share_message(9.25, "Bài 1: Tập hợp");
        assert!(text.contains("9.25/10"));
        assert!(text.contains("\"Bài 1: Tập hợp\""));
    }

    #[test]
    fn report_serializes_flat() {
        let report = ScoreReport::new(
            StudentInfo {
                student_name: "An".into(),
                class_name: "6A".into(),
                school_name: "THCS".into(),
            },
            8.0,
            "Bài 2",
        );
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["student_name"], "An");
        assert_eq!(value["score"], 8.0);
    }
}
