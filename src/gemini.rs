// Hosted chat model client (Gemini generateContent)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error: {status_code} - {message}")]
    Api { status_code: u16, message: String },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Model returned no text")]
    EmptyReply,
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        ChatError::Network(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            text: text.into(),
        }
    }
}

#[async_trait]
pub trait ChatModel: Send + Sync + 'static {
    /// Sends `prompt` after `history` and returns the model's reply text.
    async fn reply(&self, history: &[ChatTurn], prompt: &str) -> Result<String, ChatError>;
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub system_instruction: Option<String>,
    pub timeout: Option<Duration>,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            system_instruction: None,
            timeout: None,
        }
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }
}

// Wire types
#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
struct Content {
    role: ChatRole,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
    contents: Vec<Content>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GenerateContentResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CandidateContent {
    parts: Vec<Part>,
}

pub struct GeminiClient {
    config: GeminiConfig,
    http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, ChatError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;
        Ok(Self { config, http })
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    fn build_body(&self, history: &[ChatTurn], prompt: &str) -> GenerateContentRequest {
        let contents = history
            .iter()
            .cloned()
            .chain(std::iter::once(ChatTurn::user(prompt)))
            .map(|turn| Content {
                role: turn.role,
                parts: vec![Part { text: turn.text }],
            })
            .collect();

        GenerateContentRequest {
            system_instruction: self.config.system_instruction.as_ref().map(|text| {
                SystemInstruction {
                    parts: vec![Part { text: text.clone() }],
                }
            }),
            contents,
        }
    }
}

#[async_trait]
impl ChatModel for GeminiClient {
    async fn reply(&self, history: &[ChatTurn], prompt: &str) -> Result<String, ChatError> {
        let response = self
            .http
            .post(self.generate_url())
            .query(&[("key", self.config.api_key.as_str())])
            .json(&self.build_body(history, prompt))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ChatError::Api {
                status_code: status.as_u16(),
                message: body,
            });
        }

        let parsed: GenerateContentResponse =
            serde_json::from_str(&body).map_err(|e| ChatError::Decode(e.to_string()))?;
        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .map(|c| c.content.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ChatError::EmptyReply);
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, Query};
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;

    async fn spawn_service(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client_for(base_url: String) -> GeminiClient {
        let mut config = GeminiConfig::new("test_key").with_system_instruction("Be brief.");
        config.base_url = base_url;
        GeminiClient::new(config).unwrap()
    }

    #[test]
    fn test_request_body_shape() {
        let client = client_for("http://localhost".to_string());
        let history = vec![ChatTurn::user("Hi"), ChatTurn::model("Hello!")];

        let body = serde_json::to_value(client.build_body(&history, "Flights to Delhi?")).unwrap();
        assert_eq!(
            body,
            json!({
                "system_instruction": { "parts": [{ "text": "Be brief." }] },
                "contents": [
                    { "role": "user", "parts": [{ "text": "Hi" }] },
                    { "role": "model", "parts": [{ "text": "Hello!" }] },
                    { "role": "user", "parts": [{ "text": "Flights to Delhi?" }] }
                ]
            })
        );
    }

    #[test]
    fn test_generate_url() {
        let client = client_for("http://localhost:9000/v1beta/".to_string());
        assert_eq!(
            client.generate_url(),
            "http://localhost:9000/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[tokio::test]
    async fn test_reply_joins_text_parts() {
        let router = Router::new().route(
            "/models/:action",
            post(
                |Path(action): Path<String>,
                 Query(params): Query<HashMap<String, String>>,
                 Json(body): Json<Value>| async move {
                    assert_eq!(action, "gemini-1.5-flash:generateContent");
                    assert_eq!(params["key"], "test_key");
                    assert_eq!(body["contents"][0]["parts"][0]["text"], "Hello?");
                    Json(json!({
                        "candidates": [
                            { "content": { "role": "model", "parts": [{ "text": "Hi " }, { "text": "there." }] } },
                            { "content": { "role": "model", "parts": [{ "text": "ignored" }] } }
                        ]
                    }))
                },
            ),
        );
        let client = client_for(spawn_service(router).await);

        let reply = client.reply(&[], "Hello?").await.unwrap();
        assert_eq!(reply, "Hi there.");
    }

    #[tokio::test]
    async fn test_reply_without_candidates() {
        let router = Router::new().route(
            "/models/:action",
            post(|| async { Json(json!({ "promptFeedback": { "blockReason": "SAFETY" } })) }),
        );
        let client = client_for(spawn_service(router).await);

        let result = client.reply(&[], "Hello?").await;
        assert!(matches!(result, Err(ChatError::EmptyReply)));
    }

    #[tokio::test]
    async fn test_reply_api_error() {
        let router = Router::new().route(
            "/models/:action",
            post(|| async { (StatusCode::FORBIDDEN, "API key not valid") }),
        );
        let client = client_for(spawn_service(router).await);

        match client.reply(&[], "Hello?").await {
            Err(ChatError::Api {
                status_code,
                message,
            }) => {
                assert_eq!(status_code, 403);
                assert_eq!(message, "API key not valid");
            }
            other => panic!("Expected API error, got {:?}", other),
        }
    }
}
