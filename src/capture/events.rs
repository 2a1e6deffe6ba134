use serde::Serialize;
use tokio::sync::mpsc;

use crate::library::SaveKind;

use super::state::{CommitTrigger, PendingSnapshot};

/// Everything the prompt needs to know about the capture cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PromptEvent {
    Pending(PendingSnapshot),
    Held {
        cycle_id: String,
    },
    Saved {
        cycle_id: String,
        library: String,
        trigger: CommitTrigger,
        outcome: SaveKind,
        index: usize,
        note: String,
    },
    Discarded {
        cycle_id: String,
    },
    StorageFailed {
        cycle_id: String,
        library: String,
        message: String,
    },
}

impl PromptEvent {
    /// Event name used by the window front end.
    pub fn name(&self) -> &'static str {
        match self {
            PromptEvent::Pending(_) => "citation-pending",
            PromptEvent::Held { .. } => "citation-held",
            PromptEvent::Saved { .. } => "citation-saved",
            PromptEvent::Discarded { .. } => "citation-discarded",
            PromptEvent::StorageFailed { .. } => "citation-storage-failed",
        }
    }
}

/// Receives prompt events from the capture controller. Implementations must
/// not block; they run while the controller holds its state lock.
pub trait PromptSink: Send + Sync {
    fn emit(&self, event: PromptEvent);
}

impl PromptSink for mpsc::UnboundedSender<PromptEvent> {
    fn emit(&self, event: PromptEvent) {
        let _ = self.send(event);
    }
}
