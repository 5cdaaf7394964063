//! Study session — the study view for one document. Pulls entries from the
//! artifact store for the active tab and keeps the matching presenter.

use std::sync::Arc;

use tracing::debug;

use super::flashcards::FlashcardCarousel;
use super::mindmap::ConceptMapView;
use super::model::{ArtifactEntry, ArtifactKind, ArtifactPayload, DocumentId};
use super::quiz::QuizRunner;
use super::store::{ArtifactStore, RequestOutcome};
use crate::backend::DiagramRenderer;

/// Interactive state for the payload currently on screen.
pub enum Presenter {
    Flashcards(FlashcardCarousel),
    Quiz(QuizRunner),
    Map(ConceptMapView),
}

impl Presenter {
    pub fn kind(&self) -> ArtifactKind {
        match self {
            Self::Flashcards(_) => ArtifactKind::Flashcards,
            Self::Quiz(_) => ArtifactKind::Quiz,
            Self::Map(_) => ArtifactKind::Map,
        }
    }
}

pub struct StudySession {
    document_id: DocumentId,
    store: Arc<ArtifactStore>,
    renderer: Arc<dyn DiagramRenderer>,
    map_max_depth: usize,
    presenter: Option<Presenter>,
}

impl StudySession {
    pub fn new(
        document_id: DocumentId,
        store: Arc<ArtifactStore>,
        renderer: Arc<dyn DiagramRenderer>,
        map_max_depth: usize,
    ) -> Self {
        Self {
            document_id,
            store,
            renderer,
            map_max_depth,
            presenter: None,
        }
    }

    pub fn document_id(&self) -> &DocumentId {
        &self.document_id
    }

    pub fn presenter(&self) -> Option<&Presenter> {
        self.presenter.as_ref()
    }

    pub fn presenter_mut(&mut self) -> Option<&mut Presenter> {
        self.presenter.as_mut()
    }

    /// Show `kind`: request fresh material and present it once ready.
    /// Used both for tab switches and for manual retries.
    pub async fn open(&mut self, kind: ArtifactKind) -> ArtifactEntry {
        match self.store.request(&self.document_id, kind).await {
            RequestOutcome::Applied(entry) => {
                self.present(&entry).await;
                entry
            }
            RequestOutcome::Superseded { seq } => {
                debug!(kind = %kind, seq, "Request superseded, showing latest entry");
                self.store.entry(&self.document_id, kind).await
            }
        }
    }

    /// Build a fresh presenter for a ready entry. Every generated payload
    /// starts a new run; non-ready entries clear the presenter.
    pub async fn present(&mut self, entry: &ArtifactEntry) {
        let Some(payload) = entry.payload() else {
            self.presenter = None;
            return;
        };

        match payload {
            ArtifactPayload::Flashcards(cards) => {
                self.presenter = Some(Presenter::Flashcards(FlashcardCarousel::new(cards.clone())));
            }
            ArtifactPayload::Quiz(questions) => {
                self.presenter = Some(Presenter::Quiz(QuizRunner::new(questions.clone())));
            }
            ArtifactPayload::Map(tree) => {
                let mut view = ConceptMapView::new(tree, self.renderer.clone(), self.map_max_depth);
                // A render failure is kept in the view state for the host to show.
                let _ = view.render().await;
                self.presenter = Some(Presenter::Map(view));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::backend::StudyBackend;
    use crate::error::BackendError;
    use crate::study::mindmap::{OutlineRenderer, RenderState};
    use crate::study::model::{ArtifactStatus, QuizQuestion};
    use crate::study::quiz::QuizRunState;

    struct FixedStudy;

    #[async_trait]
    impl StudyBackend for FixedStudy {
        async fn generate(
            &self,
            _document_id: &DocumentId,
            kind: ArtifactKind,
        ) -> Result<serde_json::Value, BackendError> {
            Ok(match kind {
                ArtifactKind::Flashcards => json!([{"title": "t", "description": "d"}]),
                ArtifactKind::Quiz => {
                    json!([{"question": "q", "options": ["a", "b"], "correct_index": 1}])
                }
                ArtifactKind::Map => json!({"name": "Root", "children": [{"name": "Leaf"}]}),
            })
        }
    }

    fn session() -> StudySession {
        StudySession::new(
            "doc".into(),
            ArtifactStore::new(std::sync::Arc::new(FixedStudy)),
            std::sync::Arc::new(OutlineRenderer),
            32,
        )
    }

    #[tokio::test]
    async fn open_builds_presenter_per_kind() {
        let mut s = session();
        for kind in ArtifactKind::ALL {
            s.open(kind).await;
            assert_eq!(s.presenter().unwrap().kind(), kind);
        }
    }

    #[tokio::test]
    async fn map_is_rendered_on_present() {
        let mut s = session();
        s.open(ArtifactKind::Map).await;
        let Some(Presenter::Map(view)) = s.presenter() else {
            panic!("Expected map presenter");
        };
        assert!(matches!(view.state(), RenderState::Rendered(_)));
    }

    #[tokio::test]
    async fn regenerated_quiz_starts_over() {
        let mut s = session();
        s.open(ArtifactKind::Quiz).await;
        let Some(Presenter::Quiz(runner)) = s.presenter_mut() else {
            panic!("Expected quiz presenter");
        };
        assert!(runner.select_option(1));
        assert!(runner.advance());
        assert!(runner.state().finished);

        // Same questions come back from the backend.
        s.open(ArtifactKind::Quiz).await;
        let Some(Presenter::Quiz(runner)) = s.presenter() else {
            panic!("Expected quiz presenter");
        };
        assert_eq!(runner.state(), QuizRunState::default());
        assert_eq!(runner.mastery_percent(), None);
    }

    #[tokio::test]
    async fn changed_quiz_payload_resets_run() {
        let mut s = session();
        s.open(ArtifactKind::Quiz).await;
        if let Some(Presenter::Quiz(runner)) = s.presenter_mut() {
            runner.select_option(1);
        }
        let entry = ArtifactEntry {
            document_id: "doc".into(),
            kind: ArtifactKind::Quiz,
            status: ArtifactStatus::Ready(ArtifactPayload::Quiz(vec![
                QuizQuestion {
                    question: "other".into(),
                    options: vec!["x".into(), "y".into()],
                    correct_index: 0,
                },
            ])),
        };
        s.present(&entry).await;
        let Some(Presenter::Quiz(runner)) = s.presenter() else {
            panic!("Expected quiz presenter");
        };
        assert_eq!(runner.state().score, 0);
        assert_eq!(runner.current().unwrap().question, "other");
    }
}
