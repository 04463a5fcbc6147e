//! Quiz session state machine.
//!
//! ```text
//!             request_submit            confirm_submit
//!  Answering ───────────────▶ ConfirmPending ───────────▶ Submitted
//!      ▲  │                        │  ▲                       ▲
//!      │  └──── cancel_submit ◀────┘  │                       │
//!      │                                                      │
//!      └──────────── tick reaches 0 (assessment only) ────────┘
//! ```
//!
//! Both paths into `Submitted` go through [`QuizSession::finalize`], which
//! checks the stored result first. Whichever path arrives first freezes the
//! score; the other becomes a no-op.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SessionError;
use crate::model::{Answer, AnswerSheet, ItemKey, QuestionSet, QuizMode};
use crate::progress::ProgressStore;
use crate::scoring::{self, ScoreBreakdown};

/// Length of an assessment attempt: 60 minutes.
pub const ASSESSMENT_DURATION_SECS: u32 = 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    Answering,
    ConfirmPending,
    Submitted,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Answering => write!(f, "answering"),
            SessionState::ConfirmPending => write!(f, "waiting for confirmation"),
            SessionState::Submitted => write!(f, "submitted"),
        }
    }
}

/// What moved the session into `Submitted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitTrigger {
    Manual,
    TimerExpired,
}

/// The frozen outcome of a submitted session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionResult {
    pub score: ScoreBreakdown,
    pub trigger: SubmitTrigger,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Submitted(SubmissionResult),
    /// The session had already been submitted; nothing changed.
    AlreadySubmitted,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Running { remaining_secs: u32 },
    AutoSubmitted(SubmissionResult),
    /// No timer is running (practice mode, or already submitted).
    Stopped,
}

/// Correctness of a single revealed item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFeedback {
    pub key: ItemKey,
    pub answered: bool,
    pub correct: bool,
    /// The expected answer in display form.
    pub expected: String,
    pub explanation: Option<String>,
}

/// One learner's attempt at one question set.
#[derive(Debug, Clone)]
pub struct QuizSession {
    id: Uuid,
    mode: QuizMode,
    questions: QuestionSet,
    answers: AnswerSheet,
    state: SessionState,
    duration_secs: u32,
    remaining_secs: u32,
    instant_feedback: bool,
    revealed: BTreeSet<ItemKey>,
    result: Option<SubmissionResult>,
    committed: bool,
    started_at: DateTime<Utc>,
}

impl QuizSession {
    /// Start a session. Practice sessions begin with instant feedback on.
    pub fn new(questions: QuestionSet, mode: QuizMode) -> Self {
        Self {
            id: Uuid::new_v4(),
            mode,
            questions,
            answers: AnswerSheet::new(),
            state: SessionState::Answering,
            duration_secs: ASSESSMENT_DURATION_SECS,
            remaining_secs: ASSESSMENT_DURATION_SECS,
            instant_feedback: mode == QuizMode::Practice,
            revealed: BTreeSet::new(),
            result: None,
            committed: false,
            started_at: Utc::now(),
        }
    }

    /// Override the assessment time limit. Ignored in practice mode.
    pub fn with_duration(mut self, secs: u32) -> Self {
        self.duration_secs = secs;
        self.remaining_secs = secs;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn mode(&self) -> QuizMode {
        self.mode
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn questions(&self) -> &QuestionSet {
        &self.questions
    }

    pub fn answers(&self) -> &AnswerSheet {
        &self.answers
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Seconds left on the clock; `None` when no timer applies.
    pub fn remaining_secs(&self) -> Option<u32> {
        (self.mode == QuizMode::Assessment).then_some(self.remaining_secs)
    }

    pub fn duration_secs(&self) -> Option<u32> {
        (self.mode == QuizMode::Assessment).then_some(self.duration_secs)
    }

    pub fn instant_feedback(&self) -> bool {
        self.instant_feedback
    }

    pub fn is_submitted(&self) -> bool {
        self.state == SessionState::Submitted
    }

    pub fn result(&self) -> Option<&SubmissionResult> {
        self.result.as_ref()
    }

    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Score of the answers recorded so far.
    pub fn current_score(&self) -> ScoreBreakdown {
        match &self.result {
            Some(result) => result.score,
            None => scoring::score(&self.questions, &self.answers),
        }
    }

    /// Record or overwrite an answer.
    ///
    /// Rejected outside `Answering`, for items not in the question set, and
    /// for items whose result is already visible.
    pub fn record_answer(&mut self, answer: Answer) -> Result<(), SessionError> {
        let key = answer.key();
        match self.state {
            SessionState::Answering => {}
            SessionState::Submitted => return Err(SessionError::AlreadyRevealed(key)),
            state => {
                return Err(SessionError::InvalidTransition {
                    command: "record_answer",
                    state,
                })
            }
        }
        if !self.questions.contains(key) {
            return Err(SessionError::UnknownItem(key));
        }
        if let Answer::Choice { item, option } = &answer {
            let options = self
                .questions
                .choice_item(*item)
                .map(|q| q.options.len())
                .unwrap_or(0);
            if *option >= options {
                return Err(SessionError::InvalidOption {
                    item: key,
                    option: *option,
                });
            }
        }
        if self.revealed.contains(&key) {
            return Err(SessionError::AlreadyRevealed(key));
        }

        self.answers.set(answer);
        // A blank short answer stays open.
        if self.mode == QuizMode::Practice && self.instant_feedback && self.answers.is_answered(key) {
            self.revealed.insert(key);
        }
        Ok(())
    }

    /// Show one item's correctness before submission (practice only). The
    /// item is locked from then on.
    pub fn reveal(&mut self, key: ItemKey) -> Result<ItemFeedback, SessionError> {
        if self.mode != QuizMode::Practice {
            return Err(SessionError::WrongMode {
                command: "reveal",
                mode: self.mode,
            });
        }
        let feedback = self.evaluate(key).ok_or(SessionError::UnknownItem(key))?;
        self.revealed.insert(key);
        Ok(feedback)
    }

    /// Toggle instant feedback (practice only). Items already revealed stay
    /// revealed.
    pub fn set_instant_feedback(&mut self, enabled: bool) -> Result<(), SessionError> {
        if self.mode != QuizMode::Practice {
            return Err(SessionError::WrongMode {
                command: "set_instant_feedback",
                mode: self.mode,
            });
        }
        self.instant_feedback = enabled;
        Ok(())
    }

    pub fn is_revealed(&self, key: ItemKey) -> bool {
        self.is_submitted() || self.revealed.contains(&key)
    }

    /// Feedback for `key` if its result is visible.
    pub fn feedback(&self, key: ItemKey) -> Option<ItemFeedback> {
        if self.is_revealed(key) {
            self.evaluate(key)
        } else {
            None
        }
    }

    /// Feedback for every item whose result is visible, in question order.
    pub fn all_feedback(&self) -> Vec<ItemFeedback> {
        let q = &self.questions;
        q.part_a
            .iter()
            .map(|i| ItemKey::Choice(i.id))
            .chain(q.part_b.iter().flat_map(|i| {
                i.statements.iter().map(move |s| ItemKey::Statement {
                    item: i.id,
                    statement: s.id,
                })
            }))
            .chain(q.part_c.iter().map(|i| ItemKey::Short(i.id)))
            .filter_map(|key| self.feedback(key))
            .collect()
    }

    pub fn request_submit(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Answering => {
                self.state = SessionState::ConfirmPending;
                Ok(())
            }
            state => Err(SessionError::InvalidTransition {
                command: "request_submit",
                state,
            }),
        }
    }

    pub fn cancel_submit(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::ConfirmPending => {
                self.state = SessionState::Answering;
                Ok(())
            }
            state => Err(SessionError::InvalidTransition {
                command: "cancel_submit",
                state,
            }),
        }
    }

    /// Submit after confirmation. Calling again once submitted is a no-op.
    pub fn confirm_submit(&mut self) -> Result<SubmitOutcome, SessionError> {
        match self.state {
            SessionState::ConfirmPending => Ok(self
                .finalize(SubmitTrigger::Manual)
                .map_or(SubmitOutcome::AlreadySubmitted, SubmitOutcome::Submitted)),
            SessionState::Submitted => Ok(SubmitOutcome::AlreadySubmitted),
            state => Err(SessionError::InvalidTransition {
                command: "confirm_submit",
                state,
            }),
        }
    }

    /// Advance the assessment clock by one second, auto-submitting when it
    /// reaches zero. The clock keeps running while a confirmation is pending.
    pub fn tick(&mut self) -> TickOutcome {
        if self.mode != QuizMode::Assessment || self.is_submitted() {
            return TickOutcome::Stopped;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs > 0 {
            return TickOutcome::Running {
                remaining_secs: self.remaining_secs,
            };
        }
        match self.finalize(SubmitTrigger::TimerExpired) {
            Some(result) => {
                tracing::info!(
                    session = %self.id,
                    "time is up; auto-submitted with score {}",
                    result.score.total
                );
                TickOutcome::AutoSubmitted(result)
            }
            None => TickOutcome::Stopped,
        }
    }

    /// Write the final score to `store`. Assessment mode only, after
    /// submission, at most once per session.
    ///
    /// Returns whether the stored best score changed.
    pub fn commit_progress(
        &mut self,
        store: &mut ProgressStore,
        lesson_id: &str,
    ) -> Result<bool, SessionError> {
        if self.mode != QuizMode::Assessment {
            return Err(SessionError::WrongMode {
                command: "commit_progress",
                mode: self.mode,
            });
        }
        let Some(result) = &self.result else {
            return Err(SessionError::InvalidTransition {
                command: "commit_progress",
                state: self.state,
            });
        };
        if self.committed {
            return Err(SessionError::AlreadyCommitted);
        }
        // Marked before the write: a failed write is reported, never retried.
        self.committed = true;
        let improved = store.record_if_better(lesson_id, result.score.total)?;
        tracing::info!(
            session = %self.id,
            lesson = lesson_id,
            "committed score {} (new best: {improved})",
            result.score.total
        );
        Ok(improved)
    }

    /// The single entry into `Submitted`. Returns `None` if a result already
    /// exists.
    fn finalize(&mut self, trigger: SubmitTrigger) -> Option<SubmissionResult> {
        if self.result.is_some() {
            return None;
        }
        let result = SubmissionResult {
            score: scoring::score(&self.questions, &self.answers),
            trigger,
            submitted_at: Utc::now(),
        };
        self.state = SessionState::Submitted;
        self.result = Some(result.clone());
        Some(result)
    }

    fn evaluate(&self, key: ItemKey) -> Option<ItemFeedback> {
        let answered = self.answers.is_answered(key);
        let feedback = match key {
            ItemKey::Choice(id) => {
                let item = self.questions.choice_item(id)?;
                ItemFeedback {
                    key,
                    answered,
                    correct: self.answers.choice(id) == Some(item.correct_option_index),
                    expected: item
                        .options
                        .get(item.correct_option_index)
                        .map(|opt| format!("{}. {opt}", option_letter(item.correct_option_index)))
                        .unwrap_or_default(),
                    explanation: item.explanation.clone(),
                }
            }
            ItemKey::Statement { item, statement } => {
                let s = self.questions.statement(item, statement)?;
                ItemFeedback {
                    key,
                    answered,
                    correct: self.answers.statement(item, statement) == Some(s.is_true),
                    expected: if s.is_true { "true" } else { "false" }.to_string(),
                    explanation: s.explanation.clone(),
                }
            }
            ItemKey::Short(id) => {
                let item = self.questions.short_item(id)?;
                ItemFeedback {
                    key,
                    answered,
                    correct: self
                        .answers
                        .short(id)
                        .is_some_and(|a| scoring::short_answer_matches(a, &item.correct_answer)),
                    expected: item.correct_answer.clone(),
                    explanation: item.explanation.clone(),
                }
            }
        };
        Some(feedback)
    }
}

/// Display letter for a Part A option index (0 → 'A').
pub fn option_letter(index: usize) -> char {
    u8::try_from(index)
        .ok()
        .and_then(|i| b'A'.checked_add(i))
        .map(char::from)
        .unwrap_or('?')
}

/// Format seconds as `m:ss`.
pub fn format_remaining(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}
