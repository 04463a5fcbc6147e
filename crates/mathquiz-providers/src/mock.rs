//! Mock collaborators for testing.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use mathquiz_core::error::GenerationError;
use mathquiz_core::model::QuestionSet;
use mathquiz_core::report::ScoreReport;
use mathquiz_core::traits::{GenerateRequest, QuestionGenerator, ReportAck, ReportSender};

/// A mock question generator for exercising lesson launch without real API
/// calls.
///
/// Always serves the same question set, optionally after failing a fixed
/// number of calls.
pub struct MockGenerator {
    set: QuestionSet,
    /// Calls that fail before the first success.
    failures: u32,
    failure: fn() -> GenerationError,
    call_count: AtomicU32,
    last_request: Mutex<Option<GenerateRequest>>,
}

impl MockGenerator {
    pub fn new(set: QuestionSet) -> Self {
        Self {
            set,
            failures: 0,
            failure: || GenerationError::NetworkError("mock failure".into()),
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Fail the first `failures` calls with the error built by `failure`.
    pub fn failing_first(mut self, failures: u32, failure: fn() -> GenerationError) -> Self {
        self.failures = failures;
        self.failure = failure;
        self
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn last_request(&self) -> Option<GenerateRequest> {
        self.last_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl QuestionGenerator for MockGenerator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<QuestionSet> {
        let call = self.call_count.fetch_add(1, Ordering::Relaxed);
        *self
            .last_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(request.clone());

        if call < self.failures {
            return Err((self.failure)().into());
        }
        Ok(self.set.clone())
    }
}

/// Records reports instead of sending them.
#[derive(Default)]
pub struct MockReporter {
    sent: Mutex<Vec<ScoreReport>>,
}

impl MockReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<ScoreReport> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl ReportSender for MockReporter {
    fn name(&self) -> &str {
        "mock"
    }

    async fn send_report(&self, report: &ScoreReport) -> anyhow::Result<ReportAck> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(report.clone());
        Ok(ReportAck {
            status: 200,
            message: "OK".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mathquiz_core::report::StudentInfo;

    fn empty_set() -> QuestionSet {
        QuestionSet {
            topic: "mock".into(),
            part_a: vec![],
            part_b: vec![],
            part_c: vec![],
        }
    }

    #[tokio::test]
    async fn fixed_set() {
        let generator = MockGenerator::new(empty_set());
        let request = GenerateRequest::new("Bài 1", "Toán");

        let set = generator.generate(&request).await.unwrap();
        assert_eq!(set.topic, "mock");
        assert_eq!(generator.call_count(), 1);
        assert_eq!(generator.last_request(), Some(request));
    }

    #[tokio::test]
    async fn fails_first_calls() {
        let generator = MockGenerator::new(empty_set()).failing_first(2, || GenerationError::Timeout(5));
        let request = GenerateRequest::new("Bài 1", "Toán");

        assert!(generator.generate(&request).await.is_err());
        assert!(generator.generate(&request).await.is_err());
        assert!(generator.generate(&request).await.is_ok());
        assert_eq!(generator.call_count(), 3);
    }

    #[tokio::test]
    async fn reporter_records() {
        let reporter = MockReporter::new();
        let report = ScoreReport::new(StudentInfo::default(), 9.0, "Bài 1");
        let ack = reporter.send_report(&report).await.unwrap();
        assert_eq!(ack.status, 200);
        assert_eq!(reporter.sent(), vec![report]);
    }
}
