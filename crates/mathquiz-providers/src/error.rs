//! Report delivery error types.
//!
//! Question generation failures use [`mathquiz_core::error::GenerationError`]
//! so the lesson launcher can classify them.

use thiserror::Error;

/// Errors that can occur when delivering a score report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// One of the service, template or public key settings is empty.
    #[error("report sender is not configured: missing {0}")]
    NotConfigured(&'static str),

    /// The service answered with an error status.
    #[error("report rejected (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),
}
