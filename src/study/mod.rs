//! Study tools — generated flashcards, quizzes and concept maps.

pub mod flashcards;
pub mod mindmap;
pub mod model;
pub mod quiz;
pub mod session;
pub mod store;

pub use flashcards::{FlashcardCarousel, Palette};
pub use mindmap::{ConceptMapView, ConceptTree, OutlineRenderer};
pub use model::{ArtifactEntry, ArtifactKind, ArtifactPayload, ArtifactStatus, DocumentId};
pub use quiz::{QuizRunState, QuizRunner};
pub use session::{Presenter, StudySession};
pub use store::{ArtifactEvent, ArtifactStore, RequestOutcome};
