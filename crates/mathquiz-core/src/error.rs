//! Error types shared across mathquiz crates.
//!
//! `GenerationError` is defined here rather than in `mathquiz-providers` so
//! the lesson launcher can downcast provider failures and classify them
//! for retry decisions without string matching.

use thiserror::Error;

use crate::model::{ItemKey, QuizMode};
use crate::session::SessionState;

/// Errors that can occur while asking a collaborator for a question set.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The API returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (invalid API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The response arrived but did not contain a usable question set.
    /// Generated content varies between calls, so this is retried.
    #[error("malformed question set: {0}")]
    MalformedContent(String),
}

impl GenerationError {
    /// Returns `true` if this error is permanent and should not be retried.
    pub fn is_permanent(&self) -> bool {
        match self {
            GenerationError::AuthenticationFailed(_) => true,
            GenerationError::ApiError { status, .. } => (400..500).contains(status),
            _ => false,
        }
    }

    /// Returns the retry-after delay in milliseconds, if applicable.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            GenerationError::RateLimited { retry_after_ms } => Some(*retry_after_ms),
            _ => None,
        }
    }
}

/// Curriculum lookup and loading failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CurriculumError {
    #[error("lesson not found: {0}")]
    NotFound(String),

    #[error("duplicate lesson id: {0}")]
    DuplicateLesson(String),

    #[error("lesson {lesson} declares chapter {declared} but is listed under {actual}")]
    ChapterMismatch {
        lesson: String,
        declared: String,
        actual: String,
    },

    #[error("curriculum has no lessons")]
    Empty,
}

/// Progress persistence failures. Only writes can fail; unreadable data
/// on load is recovered as empty progress.
#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("score {0} is outside 0..=10")]
    InvalidScore(f64),

    #[error("failed to serialize progress: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write progress to {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Rejections of quiz session commands. A rejected command never changes
/// the session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("`{command}` is not allowed while the session is {state}")]
    InvalidTransition {
        command: &'static str,
        state: SessionState,
    },

    #[error("item {0} is already revealed and can no longer be changed")]
    AlreadyRevealed(ItemKey),

    #[error("item {0} is not part of this question set")]
    UnknownItem(ItemKey),

    #[error("option {option} is out of range for item {item}")]
    InvalidOption { item: ItemKey, option: usize },

    #[error("`{command}` is not available in {mode} mode")]
    WrongMode {
        command: &'static str,
        mode: QuizMode,
    },

    #[error("progress for this session was already committed")]
    AlreadyCommitted,

    /// The task driving the session has stopped.
    #[error("session has ended")]
    Closed,

    #[error(transparent)]
    Progress(#[from] ProgressError),
}

/// Why a lesson attempt could not be started.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("lesson not found: {0}")]
    UnknownLesson(String),

    #[error("lesson {lesson} is locked until {previous} reaches 8.0")]
    Locked { lesson: String, previous: String },

    /// The question generator failed or returned unusable content. The
    /// caller decides whether to retry or abandon lesson entry.
    #[error("question set unavailable for {lesson} (retryable: {retryable}): {source:#}")]
    ContentUnavailable {
        lesson: String,
        retryable: bool,
        #[source]
        source: anyhow::Error,
    },
}

impl LaunchError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LaunchError::ContentUnavailable {
                retryable: true,
                ..
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permanent_generation_errors() {
        assert!(GenerationError::AuthenticationFailed("bad key".into()).is_permanent());
        assert!(!GenerationError::MalformedContent("eof".into()).is_permanent());
        assert!(GenerationError::ApiError {
            status: 400,
            message: "bad".into()
        }
        .is_permanent());
        assert!(!GenerationError::ApiError {
            status: 503,
            message: "overloaded".into()
        }
        .is_permanent());
        assert!(!GenerationError::Timeout(30).is_permanent());
    }

    #[test]
    fn rate_limit_exposes_delay() {
        let err = GenerationError::RateLimited {
            retry_after_ms: 5000,
        };
        assert_eq!(err.retry_after_ms(), Some(5000));
        assert_eq!(err.to_string(), "rate limited, retry after 5000ms");
        assert_eq!(GenerationError::Timeout(1).retry_after_ms(), None);
    }
}
