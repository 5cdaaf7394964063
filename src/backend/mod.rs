//! Backend collaborators consumed by the controllers.
//!
//! The controllers only see these traits. `HttpBackend` talks to the real
//! document service; tests plug in stubs.

pub mod http;

pub use http::HttpBackend;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::chat::model::{ChatId, Message};
use crate::error::{BackendError, RenderError};
use crate::study::model::{ArtifactKind, DocumentId};

/// The question/answer pair returned by a grounded ask.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroundedAnswer {
    pub user_message: Message,
    pub ai_message: Message,
}

/// Chat history and answer service.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Full ordered history of a chat.
    async fn load_thread(&self, chat_id: &ChatId) -> Result<Vec<Message>, BackendError>;

    /// Ask a question answered with the chat's document as context.
    async fn ask_grounded(
        &self,
        chat_id: &ChatId,
        question: &str,
    ) -> Result<GroundedAnswer, BackendError>;

    /// Ask a question answered without document context. Only the assistant
    /// reply is returned.
    async fn ask_ungrounded(&self, chat_id: &ChatId, question: &str)
    -> Result<Message, BackendError>;
}

/// Study material generator. Returns the raw payload; shape validation
/// happens in the artifact store.
#[async_trait]
pub trait StudyBackend: Send + Sync {
    async fn generate(
        &self,
        document_id: &DocumentId,
        kind: ArtifactKind,
    ) -> Result<serde_json::Value, BackendError>;
}

/// Opaque handle to a rendered diagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDiagram {
    pub id: Uuid,
    pub body: String,
}

/// Turns synthesized diagram text into something displayable.
#[async_trait]
pub trait DiagramRenderer: Send + Sync {
    async fn render(&self, diagram_text: &str) -> Result<RenderedDiagram, RenderError>;
}
