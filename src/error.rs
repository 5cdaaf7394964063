//! Error types for the study companion.

use std::time::Duration;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("Send error: {0}")]
    Send(#[from] SendError),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Failures talking to a backend collaborator, before they are mapped to the
/// caller-facing error of the operation that issued the request.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Backend returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid response body: {0}")]
    InvalidResponse(String),
}

impl BackendError {
    /// Human-readable message suitable for a user-visible notice.
    pub fn user_message(&self) -> String {
        match self {
            Self::Status { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Thread history could not be loaded. The log is left empty.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Failed to load chat {chat_id}: {source}")]
    Backend {
        chat_id: String,
        #[source]
        source: BackendError,
    },
}

/// A message round trip failed or was refused. The log is unchanged.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("Message is empty")]
    EmptyMessage,

    #[error("No active chat")]
    NoActiveChat,

    #[error("Another message is still in flight")]
    Busy,

    #[error("Message {0} not found in the thread")]
    UnknownMessage(String),

    #[error("Message {0} is not an assistant reply")]
    NotAssistantMessage(String),

    #[error("Failed to send message: {0}")]
    Backend(#[from] BackendError),
}

/// A study artifact could not be generated.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("{message}")]
    Backend { message: String },

    #[error("Malformed {kind} payload: {reason}")]
    InvalidPayload { kind: String, reason: String },
}

impl GenerationError {
    pub fn invalid(kind: impl ToString, reason: impl Into<String>) -> Self {
        Self::InvalidPayload {
            kind: kind.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<BackendError> for GenerationError {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::InvalidResponse(reason) => Self::InvalidPayload {
                kind: "study".to_string(),
                reason,
            },
            other => Self::Backend {
                message: other.user_message(),
            },
        }
    }
}

/// The concept map was generated but the diagram could not be rendered.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("Diagram rejected: {message}")]
    Rejected { message: String },
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_surfaces_backend_message() {
        let err: GenerationError = BackendError::Status {
            status: 500,
            message: "Document has no text".into(),
        }
        .into();
        assert_eq!(err.to_string(), "Document has no text");
    }

    #[test]
    fn invalid_body_becomes_invalid_payload() {
        let err: GenerationError = BackendError::InvalidResponse("expected array".into()).into();
        assert!(matches!(err, GenerationError::InvalidPayload { .. }));
    }

    #[test]
    fn question_mark_lifts_domain_errors() {
        fn generate(message: &str) -> std::result::Result<(), GenerationError> {
            Err(GenerationError::Backend {
                message: message.into(),
            })
        }
        fn show(message: &str) -> Result<()> {
            generate(message)?;
            Ok(())
        }
        let err = show("Document has no text").unwrap_err();
        assert!(matches!(err, Error::Generation(_)));
        assert_eq!(err.to_string(), "Generation error: Document has no text");
    }

    #[test]
    fn top_level_wraps_send_error() {
        let err: Error = SendError::Busy.into();
        assert_eq!(err.to_string(), "Send error: Another message is still in flight");
    }
}
