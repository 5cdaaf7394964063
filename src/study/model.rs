//! Study artifact data model — artifact kinds, typed payloads, and entry status.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::mindmap::ConceptTree;
use crate::error::GenerationError;

/// Identifier of an uploaded document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub String);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Which study artifact a request is for. Doubles as the study view tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Flashcards,
    Quiz,
    #[serde(rename = "mindmap", alias = "map")]
    Map,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 3] = [Self::Flashcards, Self::Quiz, Self::Map];

    /// Name used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flashcards => "flashcards",
            Self::Quiz => "quiz",
            Self::Map => "mindmap",
        }
    }
}

impl Default for ArtifactKind {
    fn default() -> Self {
        Self::Flashcards
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ArtifactKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flashcards" | "cards" => Ok(Self::Flashcards),
            "quiz" => Ok(Self::Quiz),
            "mindmap" | "map" => Ok(Self::Map),
            _ => Err(format!("Unknown artifact type: {}", s)),
        }
    }
}

/// One flashcard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    pub title: String,
    pub description: String,
}

/// One multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_index: usize,
}

impl QuizQuestion {
    fn validate(&self, position: usize) -> Result<(), String> {
        if self.options.len() < 2 {
            return Err(format!(
                "question {} has {} option(s), need at least 2",
                position + 1,
                self.options.len()
            ));
        }
        if self.correct_index >= self.options.len() {
            return Err(format!(
                "question {} has correct_index {} but only {} options",
                position + 1,
                self.correct_index,
                self.options.len()
            ));
        }
        Ok(())
    }
}

/// A validated study payload, tagged by artifact kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ArtifactPayload {
    Flashcards(Vec<Flashcard>),
    Quiz(Vec<QuizQuestion>),
    Map(ConceptTree),
}

impl ArtifactPayload {
    /// Validate a raw backend payload against the shape expected for `kind`.
    pub fn from_json(kind: ArtifactKind, value: serde_json::Value) -> Result<Self, GenerationError> {
        match kind {
            ArtifactKind::Flashcards => serde_json::from_value::<Vec<Flashcard>>(value)
                .map(Self::Flashcards)
                .map_err(|e| GenerationError::invalid(kind, e.to_string())),
            ArtifactKind::Quiz => {
                let questions: Vec<QuizQuestion> = serde_json::from_value(value)
                    .map_err(|e| GenerationError::invalid(kind, e.to_string()))?;
                for (i, q) in questions.iter().enumerate() {
                    q.validate(i).map_err(|reason| GenerationError::invalid(kind, reason))?;
                }
                Ok(Self::Quiz(questions))
            }
            ArtifactKind::Map => {
                if !value.is_object() {
                    return Err(GenerationError::invalid(kind, "expected an object at the root"));
                }
                let tree: ConceptTree = serde_json::from_value(value)
                    .map_err(|e| GenerationError::invalid(kind, e.to_string()))?;
                if tree.name.as_deref().is_none_or(|n| n.trim().is_empty()) {
                    return Err(GenerationError::invalid(kind, "root node has no name"));
                }
                Ok(Self::Map(tree))
            }
        }
    }

    pub fn kind(&self) -> ArtifactKind {
        match self {
            Self::Flashcards(_) => ArtifactKind::Flashcards,
            Self::Quiz(_) => ArtifactKind::Quiz,
            Self::Map(_) => ArtifactKind::Map,
        }
    }
}

/// Fetch state of an artifact. The payload only exists when ready and the
/// message only when failed.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ArtifactStatus {
    #[default]
    Idle,
    Loading,
    Ready(ArtifactPayload),
    Error(String),
}

impl ArtifactStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Ready(_) => "ready",
            Self::Error(_) => "error",
        }
    }
}

/// The cached state for one (document, artifact kind) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactEntry {
    pub document_id: DocumentId,
    pub kind: ArtifactKind,
    pub status: ArtifactStatus,
}

impl ArtifactEntry {
    pub fn idle(document_id: DocumentId, kind: ArtifactKind) -> Self {
        Self {
            document_id,
            kind,
            status: ArtifactStatus::Idle,
        }
    }

    pub fn payload(&self) -> Option<&ArtifactPayload> {
        match &self.status {
            ArtifactStatus::Ready(payload) => Some(payload),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.status {
            ArtifactStatus::Error(message) => Some(message),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == ArtifactStatus::Loading
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn kind_round_trips_through_str() {
        for kind in ArtifactKind::ALL {
            assert_eq!(kind.as_str().parse::<ArtifactKind>().unwrap(), kind);
        }
        assert_eq!("map".parse::<ArtifactKind>().unwrap(), ArtifactKind::Map);
        assert!("essay".parse::<ArtifactKind>().is_err());
    }

    #[test]
    fn kind_serializes_as_wire_name() {
        assert_eq!(serde_json::to_string(&ArtifactKind::Map).unwrap(), "\"mindmap\"");
        assert_eq!(serde_json::to_string(&ArtifactKind::Quiz).unwrap(), "\"quiz\"");
    }

    #[test]
    fn flashcards_accept_empty_deck() {
        let payload = ArtifactPayload::from_json(ArtifactKind::Flashcards, json!([])).unwrap();
        assert_eq!(payload, ArtifactPayload::Flashcards(vec![]));
    }

    #[test]
    fn flashcards_reject_missing_fields() {
        let err = ArtifactPayload::from_json(ArtifactKind::Flashcards, json!([{"title": "Cell"}]))
            .unwrap_err();
        assert!(matches!(err, GenerationError::InvalidPayload { .. }));
    }

    #[test]
    fn quiz_validates_options_and_index() {
        let ok = json!([{"question": "2+2?", "options": ["3", "4"], "correct_index": 1}]);
        assert!(ArtifactPayload::from_json(ArtifactKind::Quiz, ok).is_ok());

        let one_option = json!([{"question": "?", "options": ["only"], "correct_index": 0}]);
        assert!(ArtifactPayload::from_json(ArtifactKind::Quiz, one_option).is_err());

        let out_of_range = json!([{"question": "?", "options": ["a", "b"], "correct_index": 2}]);
        let err = ArtifactPayload::from_json(ArtifactKind::Quiz, out_of_range).unwrap_err();
        assert!(err.to_string().contains("correct_index 2"));

        let negative = json!([{"question": "?", "options": ["a", "b"], "correct_index": -1}]);
        assert!(ArtifactPayload::from_json(ArtifactKind::Quiz, negative).is_err());
    }

    #[test]
    fn map_requires_named_object_root() {
        let ok = json!({"name": "Biology", "children": [{"name": "Cells"}]});
        let payload = ArtifactPayload::from_json(ArtifactKind::Map, ok).unwrap();
        assert_eq!(payload.kind(), ArtifactKind::Map);

        assert!(ArtifactPayload::from_json(ArtifactKind::Map, json!([])).is_err());
        assert!(ArtifactPayload::from_json(ArtifactKind::Map, json!({"children": []})).is_err());
    }

    #[test]
    fn entry_accessors_follow_status() {
        let mut entry = ArtifactEntry::idle("doc".into(), ArtifactKind::Quiz);
        assert!(entry.payload().is_none());
        assert!(entry.error_message().is_none());

        entry.status = ArtifactStatus::Error("quota exceeded".into());
        assert_eq!(entry.error_message(), Some("quota exceeded"));
        assert!(entry.payload().is_none());
    }
}
