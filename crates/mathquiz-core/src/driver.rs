//! Session driver: one task owns a [`QuizSession`] and serializes learner
//! commands with the assessment clock.
//!
//! Commands arrive over an mpsc channel from any number of
//! [`SessionHandle`]s. The clock is a one-second interval polled in the same
//! `select!`, so a manual confirmation and a timer expiry can never
//! interleave. The driver commits the assessment score to progress exactly
//! once, as soon as the session reaches `Submitted`, then keeps answering
//! read-only queries until every handle is dropped.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::error::SessionError;
use crate::model::{Answer, ItemKey, QuizMode};
use crate::progress::ProgressStore;
use crate::scoring::ScoreBreakdown;
use crate::session::{
    ItemFeedback, QuizSession, SessionState, SubmissionResult, SubmitOutcome, TickOutcome,
};

const COMMAND_BUFFER: usize = 32;

type Reply<T> = oneshot::Sender<Result<T, SessionError>>;

enum Command {
    RecordAnswer(Answer, Reply<()>),
    Reveal(ItemKey, Reply<ItemFeedback>),
    SetInstantFeedback(bool, Reply<()>),
    RequestSubmit(Reply<()>),
    CancelSubmit(Reply<()>),
    ConfirmSubmit(Reply<SubmitOutcome>),
    Snapshot(oneshot::Sender<SessionSnapshot>),
}

/// Point-in-time view of a running session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub mode: QuizMode,
    pub remaining_secs: Option<u32>,
    pub answered: usize,
    pub instant_feedback: bool,
    /// Live score. Hidden in assessment mode until submission.
    pub score: Option<ScoreBreakdown>,
    pub result: Option<SubmissionResult>,
}

impl SessionSnapshot {
    fn of(session: &QuizSession) -> Self {
        let score_visible = session.mode() == QuizMode::Practice || session.is_submitted();
        Self {
            state: session.state(),
            mode: session.mode(),
            remaining_secs: session.remaining_secs(),
            answered: session.answers().answered_count(),
            instant_feedback: session.instant_feedback(),
            score: score_visible.then(|| session.current_score()),
            result: session.result().cloned(),
        }
    }
}

/// Why the driver stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// Handles were dropped after submission.
    Submitted,
    /// Handles were dropped before submission. Nothing was written.
    Abandoned,
}

#[derive(Debug)]
pub struct DriverExit {
    pub session: QuizSession,
    pub reason: ExitReason,
    /// Outcome of the progress write, if one was attempted.
    pub commit: Option<Result<bool, SessionError>>,
}

/// Cloneable client for a driven session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    submitted: watch::Receiver<Option<SubmissionResult>>,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Command::RecordAnswer(..) => "RecordAnswer",
            Command::Reveal(..) => "Reveal",
            Command::SetInstantFeedback(..) => "SetInstantFeedback",
            Command::RequestSubmit(_) => "RequestSubmit",
            Command::CancelSubmit(_) => "CancelSubmit",
            Command::ConfirmSubmit(_) => "ConfirmSubmit",
            Command::Snapshot(_) => "Snapshot",
        };
        f.write_str(name)
    }
}

impl SessionHandle {
    pub async fn record_answer(&self, answer: Answer) -> Result<(), SessionError> {
        self.call(|reply| Command::RecordAnswer(answer, reply)).await
    }

    pub async fn reveal(&self, key: ItemKey) -> Result<ItemFeedback, SessionError> {
        self.call(|reply| Command::Reveal(key, reply)).await
    }

    pub async fn set_instant_feedback(&self, enabled: bool) -> Result<(), SessionError> {
        self.call(|reply| Command::SetInstantFeedback(enabled, reply))
            .await
    }

    pub async fn request_submit(&self) -> Result<(), SessionError> {
        self.call(Command::RequestSubmit).await
    }

    pub async fn cancel_submit(&self) -> Result<(), SessionError> {
        self.call(Command::CancelSubmit).await
    }

    pub async fn confirm_submit(&self) -> Result<SubmitOutcome, SessionError> {
        self.call(Command::ConfirmSubmit).await
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(Command::Snapshot(tx))
            .await
            .map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    /// Wait until the session is submitted by either path.
    pub async fn wait_submitted(&self) -> Result<SubmissionResult, SessionError> {
        let mut rx = self.submitted.clone();
        let result = rx
            .wait_for(Option::is_some)
            .await
            .map_err(|_| SessionError::Closed)?;
        result.clone().ok_or(SessionError::Closed)
    }

    async fn call<T>(&self, command: impl FnOnce(Reply<T>) -> Command) -> Result<T, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(command(tx))
            .await
            .map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)?
    }
}

/// Owns a session for its lifetime.
pub struct SessionDriver {
    session: QuizSession,
    lesson_id: String,
    commands: mpsc::Receiver<Command>,
    submitted: watch::Sender<Option<SubmissionResult>>,
}

impl SessionDriver {
    pub fn new(session: QuizSession, lesson_id: impl Into<String>) -> (Self, SessionHandle) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (submitted_tx, submitted_rx) = watch::channel(session.result().cloned());
        let driver = Self {
            session,
            lesson_id: lesson_id.into(),
            commands: command_rx,
            submitted: submitted_tx,
        };
        let handle = SessionHandle {
            commands: command_tx,
            submitted: submitted_rx,
        };
        (driver, handle)
    }

    /// Drive the session until every handle is dropped.
    #[tracing::instrument(skip_all, fields(session = %self.session.id(), lesson = %self.lesson_id))]
    pub async fn run(mut self, progress: &mut ProgressStore) -> DriverExit {
        let period = Duration::from_secs(1);
        let mut clock = interval_at(Instant::now() + period, period);
        clock.set_missed_tick_behavior(MissedTickBehavior::Burst);
        let timed = self.session.mode() == QuizMode::Assessment;
        let mut commit = None;

        loop {
            let running = timed && !self.session.is_submitted();
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
                _ = clock.tick(), if running => {
                    if let TickOutcome::Running { remaining_secs } = self.session.tick() {
                        if remaining_secs % 60 == 0 {
                            tracing::debug!(remaining_secs, "assessment clock");
                        }
                    }
                }
            }

            if self.session.is_submitted() && self.submitted.borrow().is_none() {
                self.submitted.send_replace(self.session.result().cloned());
                if timed {
                    let outcome = self.session.commit_progress(progress, &self.lesson_id);
                    if let Err(e) = &outcome {
                        tracing::error!("failed to record progress: {e}");
                    }
                    commit = Some(outcome);
                }
            }
        }

        let reason = if self.session.is_submitted() {
            ExitReason::Submitted
        } else {
            tracing::info!("session abandoned before submission");
            ExitReason::Abandoned
        };
        DriverExit {
            session: self.session,
            reason,
            commit,
        }
    }

    fn handle(&mut self, command: Command) {
        tracing::trace!(?command, "session command");
        // A dropped reply receiver only means the caller stopped waiting.
        match command {
            Command::RecordAnswer(answer, reply) => {
                let _ = reply.send(self.session.record_answer(answer));
            }
            Command::Reveal(key, reply) => {
                let _ = reply.send(self.session.reveal(key));
            }
            Command::SetInstantFeedback(enabled, reply) => {
                let _ = reply.send(self.session.set_instant_feedback(enabled));
            }
            Command::RequestSubmit(reply) => {
                let _ = reply.send(self.session.request_submit());
            }
            Command::CancelSubmit(reply) => {
                let _ = reply.send(self.session.cancel_submit());
            }
            Command::ConfirmSubmit(reply) => {
                let _ = reply.send(self.session.confirm_submit());
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(SessionSnapshot::of(&self.session));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::tests::{all_correct, contract_set};
    use crate::session::SubmitTrigger;

    fn assessment(secs: u32) -> QuizSession {
        QuizSession::new(contract_set(), QuizMode::Assessment).with_duration(secs)
    }

    #[tokio::test(start_paused = true)]
    async fn manual_submission_commits_once() {
        let mut progress = ProgressStore::in_memory();
        let (driver, handle) = SessionDriver::new(assessment(3600), "l1.1");

        let client = async move {
            for answer in all_correct(&contract_set()).answers() {
                handle.record_answer(answer).await.unwrap();
            }
            handle.request_submit().await.unwrap();
            let first = handle.confirm_submit().await.unwrap();
            assert!(matches!(first, SubmitOutcome::Submitted(_)));
            let second = handle.confirm_submit().await.unwrap();
            assert_eq!(second, SubmitOutcome::AlreadySubmitted);

            let snapshot = handle.snapshot().await.unwrap();
            assert_eq!(snapshot.state, SessionState::Submitted);
            assert_eq!(snapshot.score.unwrap().total, 10.0);
        };

        let (exit, ()) = tokio::join!(driver.run(&mut progress), client);
        assert_eq!(exit.reason, ExitReason::Submitted);
        assert!(matches!(exit.commit, Some(Ok(true))));
        assert_eq!(progress.get("l1.1"), Some(10.0));
    }

    #[tokio::test(start_paused = true)]
    async fn timer_expiry_auto_submits() {
        let mut progress = ProgressStore::in_memory();
        let (driver, handle) = SessionDriver::new(assessment(5), "l1.1");

        let client = async move {
            handle
                .record_answer(Answer::Choice { item: 1, option: 1 })
                .await
                .unwrap();
            handle.request_submit().await.unwrap();
            // Learner never confirms.
            let result = handle.wait_submitted().await.unwrap();
            assert_eq!(result.trigger, SubmitTrigger::TimerExpired);

            assert_eq!(
                handle.confirm_submit().await.unwrap(),
                SubmitOutcome::AlreadySubmitted
            );
            assert!(matches!(
                handle
                    .record_answer(Answer::Choice { item: 2, option: 2 })
                    .await,
                Err(SessionError::AlreadyRevealed(_))
            ));
        };

        let (exit, ()) = tokio::join!(driver.run(&mut progress), client);
        assert_eq!(exit.session.remaining_secs(), Some(0));
        assert_eq!(progress.get("l1.1"), Some(0.25));
    }

    #[tokio::test(start_paused = true)]
    async fn last_tick_and_confirm_submit_once() {
        let mut progress = ProgressStore::in_memory();
        let (driver, handle) = SessionDriver::new(assessment(1), "l1.1");

        let client = async move {
            handle
                .record_answer(Answer::Choice { item: 1, option: 1 })
                .await
                .unwrap();
            handle.request_submit().await.unwrap();
            // The final tick and the confirm are both ready on the next turn.
            tokio::time::advance(Duration::from_secs(1)).await;
            let outcome = handle.confirm_submit().await.unwrap();
            let published = handle.wait_submitted().await.unwrap();
            match outcome {
                SubmitOutcome::Submitted(result) => {
                    assert_eq!(result.trigger, SubmitTrigger::Manual);
                    assert_eq!(result, published);
                }
                SubmitOutcome::AlreadySubmitted => {
                    assert_eq!(published.trigger, SubmitTrigger::TimerExpired);
                }
            }
            published
        };

        let (exit, published) = tokio::join!(driver.run(&mut progress), client);
        assert_eq!(exit.reason, ExitReason::Submitted);
        assert!(matches!(exit.commit, Some(Ok(true))));
        assert_eq!(exit.session.result(), Some(&published));
        assert_eq!(progress.get("l1.1"), Some(0.25));
    }

    #[tokio::test(start_paused = true)]
    async fn snapshot_tracks_clock() {
        let mut progress = ProgressStore::in_memory();
        let (driver, handle) = SessionDriver::new(assessment(60), "l1.1");

        let client = async move {
            tokio::time::sleep(Duration::from_millis(2500)).await;
            let snapshot = handle.snapshot().await.unwrap();
            assert_eq!(snapshot.remaining_secs, Some(58));
            assert_eq!(snapshot.score, None);
        };

        let (exit, ()) = tokio::join!(driver.run(&mut progress), client);
        assert_eq!(exit.reason, ExitReason::Abandoned);
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_session_writes_nothing() {
        let mut progress = ProgressStore::in_memory();
        let (driver, handle) = SessionDriver::new(assessment(3600), "l1.1");

        let client = async move {
            handle
                .record_answer(Answer::Choice { item: 1, option: 1 })
                .await
                .unwrap();
            drop(handle);
        };

        let (exit, ()) = tokio::join!(driver.run(&mut progress), client);
        assert_eq!(exit.reason, ExitReason::Abandoned);
        assert!(exit.commit.is_none());
        assert!(progress.record().scores.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn practice_submission_is_not_committed() {
        let mut progress = ProgressStore::in_memory();
        let session = QuizSession::new(contract_set(), QuizMode::Practice);
        let (driver, handle) = SessionDriver::new(session, "l1.1");

        let client = async move {
            handle
                .record_answer(Answer::Short {
                    item: 1,
                    text: "10".into(),
                })
                .await
                .unwrap();
            let snapshot = handle.snapshot().await.unwrap();
            assert_eq!(snapshot.remaining_secs, None);
            assert_eq!(snapshot.score.unwrap().part_c, 0.5);

            handle.request_submit().await.unwrap();
            handle.confirm_submit().await.unwrap();
        };

        let (exit, ()) = tokio::join!(driver.run(&mut progress), client);
        assert_eq!(exit.reason, ExitReason::Submitted);
        assert!(exit.commit.is_none());
        assert!(progress.record().scores.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn closed_driver_reports_closed() {
        let (driver, handle) = SessionDriver::new(assessment(10), "l1.1");
        drop(driver);
        assert!(matches!(
            handle.request_submit().await,
            Err(SessionError::Closed)
        ));
    }
}
