//! Artifact store — per (document, kind) cache of generated study material
//! and its fetch state.
//!
//! Every `request` goes to the backend; nothing is deduplicated. Each request
//! takes the next sequence number for its (document, kind) slot, and a
//! response is only applied if no newer request for that slot was issued
//! while it was in flight.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, broadcast};
use tracing::{debug, info, warn};

use super::model::{ArtifactEntry, ArtifactKind, ArtifactPayload, ArtifactStatus, DocumentId};
use crate::backend::StudyBackend;
use crate::error::GenerationError;

const DEFAULT_BROADCAST_CAPACITY: usize = 64;

/// Store change notifications.
#[derive(Debug, Clone)]
pub enum ArtifactEvent {
    /// A slot changed status.
    StatusChanged {
        document_id: DocumentId,
        kind: ArtifactKind,
        status: String,
        message: Option<String>,
    },
    /// A response arrived after a newer request and was dropped.
    ResponseDiscarded {
        document_id: DocumentId,
        kind: ArtifactKind,
        seq: u64,
    },
}

/// What happened to the response of a request.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestOutcome {
    /// The response was applied; this is the resulting entry (ready or error).
    Applied(ArtifactEntry),
    /// A newer request for the same slot was issued first; nothing changed.
    Superseded { seq: u64 },
}

struct Slot {
    entry: ArtifactEntry,
    latest_seq: u64,
}

type SlotKey = (DocumentId, ArtifactKind);

pub struct ArtifactStore {
    backend: Arc<dyn StudyBackend>,
    slots: RwLock<HashMap<SlotKey, Slot>>,
    tx: broadcast::Sender<ArtifactEvent>,
}

impl ArtifactStore {
    pub fn new(backend: Arc<dyn StudyBackend>) -> Arc<Self> {
        let (tx, _rx) = broadcast::channel(DEFAULT_BROADCAST_CAPACITY);
        Arc::new(Self {
            backend,
            slots: RwLock::new(HashMap::new()),
            tx,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ArtifactEvent> {
        self.tx.subscribe()
    }

    /// Current entry for a slot; idle if it was never requested.
    pub async fn entry(&self, document_id: &DocumentId, kind: ArtifactKind) -> ArtifactEntry {
        self.slots
            .read()
            .await
            .get(&(document_id.clone(), kind))
            .map(|slot| slot.entry.clone())
            .unwrap_or_else(|| ArtifactEntry::idle(document_id.clone(), kind))
    }

    /// Generate `kind` for `document_id`, moving the slot through
    /// loading → ready | error.
    pub async fn request(&self, document_id: &DocumentId, kind: ArtifactKind) -> RequestOutcome {
        let seq = {
            let mut slots = self.slots.write().await;
            let slot = slots
                .entry((document_id.clone(), kind))
                .or_insert_with(|| Slot {
                    entry: ArtifactEntry::idle(document_id.clone(), kind),
                    latest_seq: 0,
                });
            slot.latest_seq += 1;
            slot.entry.status = ArtifactStatus::Loading;
            slot.latest_seq
        };
        self.notify(document_id, kind, &ArtifactStatus::Loading);

        info!(document_id = %document_id, kind = %kind, seq, "Requesting study material");

        let result = self
            .backend
            .generate(document_id, kind)
            .await
            .map_err(GenerationError::from)
            .and_then(|value| ArtifactPayload::from_json(kind, value));

        let mut slots = self.slots.write().await;
        let Some(slot) = slots.get_mut(&(document_id.clone(), kind)) else {
            debug!(document_id = %document_id, kind = %kind, seq, "Slot forgotten while loading");
            return RequestOutcome::Superseded { seq };
        };

        if slot.latest_seq != seq {
            debug!(
                document_id = %document_id,
                kind = %kind,
                seq,
                latest = slot.latest_seq,
                "Discarding stale study material response"
            );
            let _ = self.tx.send(ArtifactEvent::ResponseDiscarded {
                document_id: document_id.clone(),
                kind,
                seq,
            });
            return RequestOutcome::Superseded { seq };
        }

        slot.entry.status = match result {
            Ok(payload) => {
                info!(document_id = %document_id, kind = %kind, seq, "Study material ready");
                ArtifactStatus::Ready(payload)
            }
            Err(e) => {
                warn!(document_id = %document_id, kind = %kind, seq, error = %e, "Study material generation failed");
                ArtifactStatus::Error(e.to_string())
            }
        };
        let entry = slot.entry.clone();
        drop(slots);

        self.notify(document_id, kind, &entry.status);
        RequestOutcome::Applied(entry)
    }

    /// Drop every slot of a document. Responses still in flight for it are
    /// discarded when they arrive.
    pub async fn forget(&self, document_id: &DocumentId) {
        self.slots
            .write()
            .await
            .retain(|(doc, _), _| doc != document_id);
    }

    fn notify(&self, document_id: &DocumentId, kind: ArtifactKind, status: &ArtifactStatus) {
        let message = match status {
            ArtifactStatus::Error(message) => Some(message.clone()),
            _ => None,
        };
        let _ = self.tx.send(ArtifactEvent::StatusChanged {
            document_id: document_id.clone(),
            kind,
            status: status.label().to_string(),
            message,
        });
    }
}
