use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use uuid::Uuid;

use crate::utils::preview;

const PREVIEW_CHARS: usize = 90;

/// Which earlier copies of a citation fold into a new capture.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DedupScope {
    /// Re-copying a citation that is already in the library prompts again and
    /// appends the new note to the stored record.
    #[default]
    Library,
    /// Only the citation currently pending dedups; re-copying a saved one is
    /// ignored.
    Pending,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CommitTrigger {
    User,
    Timeout,
    /// A different citation arrived while this one was pending.
    Superseded,
}

#[derive(Debug, Clone)]
pub struct PendingCitation {
    pub cycle_id: String,
    pub text: String,
    pub note: String,
    /// Library chosen when the citation was captured.
    pub library: String,
    pub already_saved: bool,
    pub captured_at: DateTime<Utc>,
    /// Auto-commit time. `None` while held for note editing or after a failed save.
    pub deadline: Option<Instant>,
}

impl PendingCitation {
    pub fn remaining_ms(&self) -> Option<u64> {
        self.deadline.map(|deadline| {
            deadline
                .saturating_duration_since(Instant::now())
                .as_millis() as u64
        })
    }
}

/// What the prompt shows for the pending citation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingSnapshot {
    pub cycle_id: String,
    pub text: String,
    pub preview: String,
    pub note: String,
    pub library: String,
    pub already_saved: bool,
    pub captured_at: DateTime<Utc>,
    pub remaining_ms: Option<u64>,
}

impl From<&PendingCitation> for PendingSnapshot {
    fn from(pending: &PendingCitation) -> Self {
        Self {
            cycle_id: pending.cycle_id.clone(),
            text: pending.text.clone(),
            preview: preview(&pending.text, PREVIEW_CHARS),
            note: pending.note.clone(),
            library: pending.library.clone(),
            already_saved: pending.already_saved,
            captured_at: pending.captured_at,
            remaining_ms: pending.remaining_ms(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum CaptureStatus {
    Idle,
    /// Countdown running.
    Pending,
    /// Pending without a countdown: held for a note or waiting for a retry.
    Held,
}

/// The single pending slot. `None` is the idle state.
#[derive(Debug, Clone, Default)]
pub struct CaptureState {
    pending: Option<PendingCitation>,
}

impl CaptureState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> CaptureStatus {
        match &self.pending {
            None => CaptureStatus::Idle,
            Some(pending) if pending.deadline.is_some() => CaptureStatus::Pending,
            Some(_) => CaptureStatus::Held,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_none()
    }

    pub fn pending(&self) -> Option<&PendingCitation> {
        self.pending.as_ref()
    }

    pub fn is_pending_text(&self, text: &str) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|pending| pending.text == text)
    }

    /// True while `cycle_id` is pending and its countdown is still armed.
    pub fn is_armed(&self, cycle_id: &str) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|pending| pending.cycle_id == cycle_id && pending.deadline.is_some())
    }

    pub fn begin(
        &mut self,
        text: String,
        library: String,
        already_saved: bool,
        deadline: Instant,
    ) -> &PendingCitation {
        self.pending.insert(PendingCitation {
            cycle_id: Uuid::new_v4().to_string(),
            text,
            note: String::new(),
            library,
            already_saved,
            captured_at: Utc::now(),
            deadline: Some(deadline),
        })
    }

    pub fn set_note(&mut self, note: String) -> bool {
        match self.pending.as_mut() {
            Some(pending) => {
                pending.note = note;
                true
            }
            None => false,
        }
    }

    /// Stops the countdown. Returns false if nothing was counting down.
    pub fn disarm(&mut self) -> bool {
        match self.pending.as_mut() {
            Some(pending) if pending.deadline.is_some() => {
                pending.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self) -> Option<PendingCitation> {
        self.pending.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn begin_arms_a_fresh_cycle() {
        let mut state = CaptureState::new();
        assert!(state.is_idle());

        let deadline = Instant::now() + Duration::from_secs(5);
        let cycle_id = state
            .begin("T".into(), "refs".into(), false, deadline)
            .cycle_id
            .clone();

        assert!(state.is_pending_text("T"));
        assert!(state.is_armed(&cycle_id));
        assert!(!state.is_armed("other"));
        assert_eq!(state.pending().unwrap().remaining_ms(), Some(5_000));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(state.pending().unwrap().remaining_ms(), Some(3_000));
    }

    #[tokio::test(start_paused = true)]
    async fn disarm_keeps_citation() {
        let mut state = CaptureState::new();
        let cycle_id = state
            .begin("T".into(), "refs".into(), false, Instant::now())
            .cycle_id
            .clone();

        assert_eq!(state.status(), CaptureStatus::Pending);
        assert!(state.disarm());
        assert!(!state.disarm());
        assert_eq!(state.status(), CaptureStatus::Held);
        assert!(!state.is_armed(&cycle_id));
        assert!(state.is_pending_text("T"));
        assert_eq!(state.pending().unwrap().remaining_ms(), None);
    }

    #[test]
    fn note_needs_a_pending_citation() {
        let mut state = CaptureState::new();
        assert!(!state.set_note("orphan".into()));
        assert!(state.clear().is_none());
    }

    #[tokio::test]
    async fn snapshot_shortens_preview() {
        let mut state = CaptureState::new();
        let long = "x".repeat(200);
        state.begin(long, "refs".into(), true, Instant::now());
        let snapshot = PendingSnapshot::from(state.pending().unwrap());

        assert_eq!(snapshot.preview.chars().count(), PREVIEW_CHARS + 3);
        assert!(snapshot.already_saved);
    }
}
