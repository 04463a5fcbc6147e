//! EmailJS score report sender.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{FixedOffset, Utc};
use serde::Serialize;
use tracing::instrument;

use mathquiz_core::report::{format_score, ScoreReport};
use mathquiz_core::traits::{ReportAck, ReportSender};

use crate::error::ReportError;

pub const DEFAULT_BASE_URL: &str = "https://api.emailjs.com";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Reports are stamped in Vietnam time (UTC+7).
const REPORT_UTC_OFFSET_SECS: i32 = 7 * 3600;

/// Sends score reports through the EmailJS REST API.
pub struct EmailJsSender {
    service_id: String,
    template_id: String,
    public_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl EmailJsSender {
    pub fn new(
        service_id: &str,
        template_id: &str,
        public_key: &str,
        base_url: Option<String>,
    ) -> anyhow::Result<Self> {
        for (name, value) in [
            ("service_id", service_id),
            ("template_id", template_id),
            ("public_key", public_key),
        ] {
            if value.trim().is_empty() {
                return Err(ReportError::NotConfigured(name).into());
            }
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            service_id: service_id.to_string(),
            template_id: template_id.to_string(),
            public_key: public_key.to_string(),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            client,
        })
    }
}

#[derive(Serialize)]
struct SendRequest<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    template_params: TemplateParams<'a>,
}

#[derive(Serialize)]
struct TemplateParams<'a> {
    student_name: &'a str,
    class_name: &'a str,
    school_name: &'a str,
    score: String,
    topic: &'a str,
    date: String,
}

impl<'a> TemplateParams<'a> {
    fn from_report(report: &'a ScoreReport) -> Self {
        let local = FixedOffset::east_opt(REPORT_UTC_OFFSET_SECS)
            .map(|tz| report.date.with_timezone(&tz).format("%H:%M:%S %d/%m/%Y").to_string())
            .unwrap_or_else(|| report.date.with_timezone(&Utc).to_rfc3339());
        Self {
            student_name: &report.student.student_name,
            class_name: &report.student.class_name,
            school_name: &report.student.school_name,
            score: format_score(report.score),
            topic: &report.topic,
            date: local,
        }
    }
}

#[async_trait]
impl ReportSender for EmailJsSender {
    fn name(&self) -> &str {
        "emailjs"
    }

    #[instrument(skip(self, report), fields(topic = %report.topic))]
    async fn send_report(&self, report: &ScoreReport) -> anyhow::Result<ReportAck> {
        let body = SendRequest {
            service_id: &self.service_id,
            template_id: &self.template_id,
            user_id: &self.public_key,
            template_params: TemplateParams::from_report(report),
        };

        let response = self
            .client
            .post(format!("{}/api/v1.0/email/send", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ReportError::Timeout(DEFAULT_TIMEOUT_SECS)
                } else {
                    ReportError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        if status >= 400 {
            return Err(ReportError::Rejected { status, message }.into());
        }

        tracing::info!(status, "score report sent");
        Ok(ReportAck { status, message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mathquiz_core::report::StudentInfo;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn report() -> ScoreReport {
        ScoreReport::new(
            StudentInfo {
                student_name: "Nguyễn An".into(),
                class_name: "6A1".into(),
                school_name: "THCS Lê Lợi".into(),
            },
            8.5,
            "Bài 1: Tập hợp",
        )
    }

    #[tokio::test]
    async fn sends_template_params() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1.0/email/send"))
            .and(body_partial_json(json!({
                "service_id": "svc",
                "template_id": "tpl",
                "user_id": "pub",
                "template_params": {
                    "student_name": "Nguyễn An",
                    "class_name": "6A1",
                    "score": "8.5",
                    "topic": "Bài 1: Tập hợp"
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
            .expect(1)
            .mount(&server)
            .await;

        let sender = EmailJsSender::new("svc", "tpl", "pub", Some(server.uri())).unwrap();
        let ack = sender.send_report(&report()).await.unwrap();
        assert_eq!(ack.status, 200);
        assert_eq!(ack.message, "OK");
    }

    #[tokio::test]
    async fn rejection_is_reported() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1.0/email/send"))
            .respond_with(ResponseTemplate::new(400).set_body_string("The Public Key is invalid"))
            .mount(&server)
            .await;

        let sender = EmailJsSender::new("svc", "tpl", "bad", Some(server.uri())).unwrap();
        let err = sender.send_report(&report()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ReportError>(),
            Some(ReportError::Rejected { status: 400, .. })
        ));
        assert!(err.to_string().contains("Public Key is invalid"));
    }

    #[test]
    fn missing_credentials_are_rejected() {
        let err = EmailJsSender::new("svc", "", "pub", None).err().unwrap();
        assert!(err.to_string().contains("template_id"));
    }

    #[test]
    fn date_is_local_time() {
        let mut report = report();
        report.date = chrono::DateTime::parse_from_rfc3339("2024-09-05T01:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let params = TemplateParams::from_report(&report);
        assert_eq!(params.date, "08:30:00 05/09/2024");
    }
}
