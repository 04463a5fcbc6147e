//! Google Gemini question generator.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::instrument;

use mathquiz_core::error::GenerationError;
use mathquiz_core::model::QuestionSet;
use mathquiz_core::traits::{GenerateRequest, QuestionGenerator};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const SYSTEM_PROMPT: &str =
    "Bạn là chuyên gia soạn đề Toán 6. Chỉ trả về JSON hợp lệ theo schema.";

/// Gemini `generateContent` client producing three-part question sets.
pub struct GeminiGenerator {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl GeminiGenerator {
    pub fn new(api_key: &str, model: Option<String>, base_url: Option<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            api_key: api_key.to_string(),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

/// The instruction sent for one lesson. Fixes the 3 / 4 / 3 point layout.
pub fn build_prompt(request: &GenerateRequest) -> String {
    format!(
        r#"Tạo đề kiểm tra {subject} cho bài: "{topic}".
Cấu trúc đề BẮT BUỘC như sau (Tổng 10 điểm):

1. Phần 1: Trắc nghiệm (3.0 điểm).
   - 12 câu hỏi. Mỗi câu 0.25đ.
   - Chọn 1 đáp án đúng trong 4 phương án A,B,C,D.
   - Kèm theo giải thích ngắn gọn (explanation).

2. Phần 2: Đúng/Sai (4.0 điểm).
   - 4 câu hỏi lớn. Mỗi câu hỏi lớn gồm 1 đề dẫn và 4 ý con (a,b,c,d).
   - Mỗi ý con đúng được 0.25đ. Tổng 16 ý con.
   - Kèm theo giải thích cho từng ý (explanation).

3. Phần 3: Trả lời ngắn (3.0 điểm).
   - 6 câu hỏi. Mỗi câu 0.5đ.
   - Học sinh tự điền số hoặc kết quả ngắn gọn.
   - Kèm theo giải thích/cách giải (explanation).

Yêu cầu:
- Nội dung bám sát sách giáo khoa.
- Câu hỏi đa dạng: Nhận biết, Thông hiểu, Vận dụng.
- Trả về JSON thuần túy."#,
        subject = request.subject,
        topic = request.topic,
    )
}

/// Structured-output schema matching [`QuestionSet`]'s wire names.
fn response_schema() -> Value {
    let explanation = json!({ "type": "STRING" });
    json!({
        "type": "OBJECT",
        "properties": {
            "topic": { "type": "STRING" },
            "part1": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "id": { "type": "INTEGER" },
                        "question": { "type": "STRING" },
                        "options": { "type": "ARRAY", "items": { "type": "STRING" } },
                        "correctAnswerIndex": { "type": "INTEGER" },
                        "explanation": explanation
                    },
                    "required": ["id", "question", "options", "correctAnswerIndex"]
                }
            },
            "part2": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "id": { "type": "INTEGER" },
                        "stem": { "type": "STRING" },
                        "statements": {
                            "type": "ARRAY",
                            "items": {
                                "type": "OBJECT",
                                "properties": {
                                    "id": { "type": "INTEGER" },
                                    "statement": { "type": "STRING" },
                                    "isTrue": { "type": "BOOLEAN" },
                                    "explanation": explanation
                                },
                                "required": ["id", "statement", "isTrue"]
                            }
                        }
                    },
                    "required": ["id", "stem", "statements"]
                }
            },
            "part3": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "id": { "type": "INTEGER" },
                        "question": { "type": "STRING" },
                        "correctAnswer": { "type": "STRING" },
                        "explanation": explanation
                    },
                    "required": ["id", "question", "correctAnswer"]
                }
            }
        },
        "required": ["topic", "part1", "part2", "part3"]
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    system_instruction: GeminiContent,
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize, Default)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: GeminiContent,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Deserialize)]
struct GeminiErrorBody {
    message: String,
}

fn text_content(text: String, role: Option<&str>) -> GeminiContent {
    GeminiContent {
        role: role.map(str::to_string),
        parts: vec![GeminiPart { text }],
    }
}

#[async_trait]
impl QuestionGenerator for GeminiGenerator {
    fn name(&self) -> &str {
        "gemini"
    }

    #[instrument(skip(self, request), fields(model = %self.model, topic = %request.topic))]
    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<QuestionSet> {
        let body = GeminiRequest {
            system_instruction: text_content(SYSTEM_PROMPT.to_string(), None),
            contents: vec![text_content(build_prompt(request), Some("user"))],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: response_schema(),
            },
        };

        let response = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, self.model
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Timeout(DEFAULT_TIMEOUT_SECS)
                } else {
                    GenerationError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(5)
                * 1000;
            return Err(GenerationError::RateLimited {
                retry_after_ms: retry_after,
            }
            .into());
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GeminiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            // Gemini reports a bad key as 400 INVALID_ARGUMENT.
            if status == 401 || status == 403 || message.contains("API key not valid") {
                return Err(GenerationError::AuthenticationFailed(message).into());
            }
            return Err(GenerationError::ApiError { status, message }.into());
        }

        let api_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::MalformedContent(format!("unreadable response: {e}")))?;

        let candidate = api_response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| GenerationError::MalformedContent("no candidates returned".into()))?;
        let text: String = candidate
            .content
            .parts
            .into_iter()
            .map(|p| p.text)
            .collect();
        if text.trim().is_empty() {
            let reason = candidate.finish_reason.unwrap_or_else(|| "unknown".into());
            return Err(
                GenerationError::MalformedContent(format!("empty response (finish: {reason})"))
                    .into(),
            );
        }

        let mut set: QuestionSet = serde_json::from_str(&text)
            .map_err(|e| GenerationError::MalformedContent(e.to_string()))?;
        if set.topic.trim().is_empty() {
            set.topic = request.topic.clone();
        }
        tracing::debug!(
            part_a = set.part_a.len(),
            part_b = set.part_b.len(),
            part_c = set.part_c.len(),
            "question set received"
        );
        Ok(set)
    }
}
