//! Lesson launch: gate check, question generation with retries, content
//! validation, session construction.

use std::sync::Arc;
use std::time::Duration;

use crate::curriculum::Curriculum;
use crate::error::{GenerationError, LaunchError};
use crate::gate::ProgressionGate;
use crate::model::{QuestionSet, QuizMode};
use crate::progress::ProgressStore;
use crate::session::{QuizSession, ASSESSMENT_DURATION_SECS};
use crate::traits::{GenerateRequest, QuestionGenerator, DEFAULT_SUBJECT};
use crate::validate::{has_errors, validate_question_set, Severity};

/// Configuration for launching lessons.
#[derive(Debug, Clone)]
pub struct LaunchConfig {
    /// Curriculum label sent with every lesson title.
    pub subject: String,
    /// Retries on transient generator errors.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further retry.
    pub retry_delay: Duration,
    /// Assessment time limit in seconds.
    pub assessment_duration_secs: u32,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            subject: DEFAULT_SUBJECT.to_string(),
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            assessment_duration_secs: ASSESSMENT_DURATION_SECS,
        }
    }
}

/// Starts quiz sessions for lessons.
pub struct LessonLauncher {
    generator: Arc<dyn QuestionGenerator>,
    config: LaunchConfig,
}

impl LessonLauncher {
    pub fn new(generator: Arc<dyn QuestionGenerator>, config: LaunchConfig) -> Self {
        Self { generator, config }
    }

    /// Start an attempt at `lesson_id`.
    ///
    /// Fails with `Locked` if the gate forbids the lesson in `mode`, and with
    /// `ContentUnavailable` if no usable question set could be generated.
    /// Progress is never touched.
    pub async fn start(
        &self,
        curriculum: &Curriculum,
        progress: &ProgressStore,
        lesson_id: &str,
        mode: QuizMode,
    ) -> Result<QuizSession, LaunchError> {
        let lesson = curriculum
            .lesson(lesson_id)
            .ok_or_else(|| LaunchError::UnknownLesson(lesson_id.to_string()))?;

        let gate = ProgressionGate::new(curriculum, progress);
        if mode == QuizMode::Assessment {
            if let Some(previous) = gate.blocking_lesson(lesson_id) {
                return Err(LaunchError::Locked {
                    lesson: lesson_id.to_string(),
                    previous: previous.id.clone(),
                });
            }
        }

        let request = GenerateRequest::new(&lesson.title, &self.config.subject);
        tracing::info!(
            lesson = lesson_id,
            %mode,
            generator = self.generator.name(),
            "generating question set"
        );
        let mut questions = self.generate_with_retries(lesson_id, &request).await?;
        if questions.topic.is_empty() {
            questions.topic = lesson.title.clone();
        }

        let session = QuizSession::new(questions, mode)
            .with_duration(self.config.assessment_duration_secs);
        tracing::info!(lesson = lesson_id, session = %session.id(), "session started");
        Ok(session)
    }

    async fn generate_with_retries(
        &self,
        lesson_id: &str,
        request: &GenerateRequest,
    ) -> Result<QuestionSet, LaunchError> {
        let mut last_error = None;
        let mut retry_delay = self.config.retry_delay;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tokio::time::sleep(retry_delay).await;
                retry_delay = (retry_delay * 2).min(Duration::from_secs(60));
            }

            let error = match self.generator.generate(request).await {
                Ok(set) => match usable(set) {
                    Ok(set) => return Ok(set),
                    Err(e) => e,
                },
                Err(e) => e,
            };

            let classified = error.downcast_ref::<GenerationError>();
            if classified.is_some_and(GenerationError::is_permanent) {
                return Err(LaunchError::ContentUnavailable {
                    lesson: lesson_id.to_string(),
                    retryable: false,
                    source: error,
                });
            }
            if let Some(ms) = classified.and_then(GenerationError::retry_after_ms) {
                retry_delay = Duration::from_millis(ms);
            }
            tracing::warn!(
                lesson = lesson_id,
                attempt = attempt + 1,
                "question generation failed: {error:#}"
            );
            last_error = Some(error);
        }

        Err(LaunchError::ContentUnavailable {
            lesson: lesson_id.to_string(),
            retryable: true,
            source: last_error.unwrap_or_else(|| anyhow::anyhow!("unknown error")),
        })
    }
}

/// Run boundary validation, logging warnings and rejecting defective sets.
fn usable(set: QuestionSet) -> anyhow::Result<QuestionSet> {
    let issues = validate_question_set(&set);
    for issue in issues.iter().filter(|i| i.severity == Severity::Warning) {
        tracing::warn!("{issue}");
    }
    if has_errors(&issues) {
        let summary = issues
            .iter()
            .filter(|i| i.is_error())
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(GenerationError::MalformedContent(summary).into());
    }
    Ok(set)
}
