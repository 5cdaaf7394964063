//! HTTP adapter for the document service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{COOKIE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ChatBackend, GroundedAnswer, StudyBackend};
use crate::chat::model::{ChatId, Message};
use crate::config::ClientConfig;
use crate::error::{BackendError, ConfigError};
use crate::study::model::{ArtifactKind, DocumentId};

#[derive(Debug, Serialize)]
struct AskRequest<'a> {
    message: &'a str,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    no_context: bool,
}

#[derive(Debug, Deserialize)]
struct AskResponse {
    #[serde(default)]
    user_message: Option<Message>,
    ai_message: Message,
}

#[derive(Debug, Serialize)]
struct StudyToolsRequest {
    #[serde(rename = "type")]
    kind: &'static str,
}

/// Error body shapes the service is known to send.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(alias = "detail", alias = "error")]
    message: Option<String>,
}

pub struct HttpBackend {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpBackend {
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = &config.session_cookie {
            let mut value = HeaderValue::from_str(cookie.expose_secret()).map_err(|e| {
                ConfigError::InvalidValue {
                    key: "STUDY_SESSION_COOKIE".into(),
                    message: e.to_string(),
                }
            })?;
            value.set_sensitive(true);
            headers.insert(COOKIE, value);
        }

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self { client, config })
    }

    async fn ask(
        &self,
        chat_id: &ChatId,
        question: &str,
        no_context: bool,
    ) -> Result<AskResponse, BackendError> {
        let url = self.config.endpoint(&format!("api/chats/{chat_id}/messages"));
        debug!(url = %url, no_context, "Asking question");
        let resp = self
            .client
            .post(&url)
            .json(&AskRequest {
                message: question,
                no_context,
            })
            .send()
            .await
            .map_err(|e| transport_error(e, self.config.request_timeout))?;
        decode(resp, self.config.request_timeout).await
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn load_thread(&self, chat_id: &ChatId) -> Result<Vec<Message>, BackendError> {
        let url = self.config.endpoint(&format!("api/chats/{chat_id}"));
        debug!(url = %url, "Fetching chat history");
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| transport_error(e, self.config.request_timeout))?;
        decode(resp, self.config.request_timeout).await
    }

    async fn ask_grounded(
        &self,
        chat_id: &ChatId,
        question: &str,
    ) -> Result<GroundedAnswer, BackendError> {
        let resp = self.ask(chat_id, question, false).await?;
        let user_message = resp.user_message.ok_or_else(|| {
            BackendError::InvalidResponse("grounded answer is missing user_message".into())
        })?;
        Ok(GroundedAnswer {
            user_message,
            ai_message: resp.ai_message,
        })
    }

    async fn ask_ungrounded(
        &self,
        chat_id: &ChatId,
        question: &str,
    ) -> Result<Message, BackendError> {
        Ok(self.ask(chat_id, question, true).await?.ai_message)
    }
}

#[async_trait]
impl StudyBackend for HttpBackend {
    async fn generate(
        &self,
        document_id: &DocumentId,
        kind: ArtifactKind,
    ) -> Result<serde_json::Value, BackendError> {
        let url = self
            .config
            .endpoint(&format!("api/documents/{document_id}/study-tools"));
        debug!(url = %url, kind = %kind, "Generating study material");
        let resp = self
            .client
            .post(&url)
            .json(&StudyToolsRequest {
                kind: kind.as_str(),
            })
            .send()
            .await
            .map_err(|e| transport_error(e, self.config.request_timeout))?;
        decode(resp, self.config.request_timeout).await
    }
}

fn transport_error(e: reqwest::Error, timeout: Duration) -> BackendError {
    if e.is_timeout() {
        BackendError::Timeout(timeout)
    } else {
        BackendError::Transport(e.to_string())
    }
}

/// Turn a response into `T`, or into a `Status` error carrying the body's
/// message when the service sent one.
async fn decode<T: DeserializeOwned>(
    resp: reqwest::Response,
    timeout: Duration,
) -> Result<T, BackendError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string()
            });
        return Err(BackendError::Status {
            status: status.as_u16(),
            message,
        });
    }

    let bytes = resp
        .bytes()
        .await
        .map_err(|e| transport_error(e, timeout))?;
    serde_json::from_slice(&bytes).map_err(|e| BackendError::InvalidResponse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ask_request_omits_false_flag() {
        let grounded = serde_json::to_value(AskRequest {
            message: "hi",
            no_context: false,
        })
        .unwrap();
        assert_eq!(grounded, serde_json::json!({"message": "hi"}));

        let general = serde_json::to_value(AskRequest {
            message: "hi",
            no_context: true,
        })
        .unwrap();
        assert_eq!(general["no_context"], true);
    }

    #[test]
    fn study_request_uses_wire_name() {
        let body = serde_json::to_value(StudyToolsRequest {
            kind: ArtifactKind::Map.as_str(),
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"type": "mindmap"}));
    }

    #[test]
    fn error_body_accepts_detail() {
        let body: ErrorBody = serde_json::from_str(r#"{"detail": "Chat not found"}"#).unwrap();
        assert_eq!(body.message.as_deref(), Some("Chat not found"));
    }

    #[test]
    fn invalid_cookie_is_a_config_error() {
        let config = ClientConfig {
            session_cookie: Some("bad\ncookie".to_string().into()),
            ..Default::default()
        };
        assert!(matches!(
            HttpBackend::new(config),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
