//! Collaborator trait definitions.
//!
//! These async traits are implemented by the `mathquiz-providers` crate.
//! The core only depends on their contracts, never on a transport.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::QuestionSet;
use crate::report::ScoreReport;

/// Default curriculum label sent alongside each lesson title.
pub const DEFAULT_SUBJECT: &str = "Toán Lớp 6 - Kết nối tri thức";

// ---------------------------------------------------------------------------
// Question generation
// ---------------------------------------------------------------------------

/// Backend that produces a three-part question set for a lesson.
///
/// Implementations should return [`crate::error::GenerationError`] inside
/// the `anyhow::Error` so callers can tell retryable failures apart.
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    /// Human-readable backend name (e.g. "gemini").
    fn name(&self) -> &str;

    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<QuestionSet>;
}

/// Request for one question set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Lesson display title.
    pub topic: String,
    /// Fixed subject / curriculum label.
    pub subject: String,
}

impl GenerateRequest {
    pub fn new(topic: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            subject: subject.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Score reporting
// ---------------------------------------------------------------------------

/// Backend that delivers a score report (e.g. by e-mail).
#[async_trait]
pub trait ReportSender: Send + Sync {
    fn name(&self) -> &str;

    async fn send_report(&self, report: &ScoreReport) -> anyhow::Result<ReportAck>;
}

/// Acknowledgement returned by a report backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportAck {
    pub status: u16,
    pub message: String,
}
