use std::{collections::BTreeSet, sync::Arc, time::Duration};

use anyhow::Result;
use tokio::{
    sync::Mutex,
    task::JoinHandle,
    time::{self, Instant},
};

use crate::{
    classifier::is_citation,
    library::{
        CitationRecord, ExportOptions, Library, LibraryStore, SaveOutcome, StorageResult,
        DEFAULT_LIBRARY,
    },
    settings::{SettingsStore, UserSettings},
    utils::preview,
};

use super::{
    events::{PromptEvent, PromptSink},
    state::{CaptureState, CaptureStatus, CommitTrigger, DedupScope, PendingSnapshot},
};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureConfig {
    pub timeout: Duration,
    pub dedup_scope: DedupScope,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self::from(&UserSettings::default())
    }
}

impl From<&UserSettings> for CaptureConfig {
    fn from(settings: &UserSettings) -> Self {
        Self {
            timeout: settings.prompt_timeout(),
            dedup_scope: settings.dedup_scope,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateOutcome {
    NotCitation,
    Started { cycle_id: String },
    /// Same text as the citation already pending; countdown untouched.
    SameAsPending,
    /// Already in the library and the dedup scope is `pending`.
    AlreadySaved,
}

/// Owns the pending-citation slot and drives it through its countdown.
///
/// Every transition happens under the state lock, so the countdown and the
/// prompt callbacks can race freely and a cycle is still committed at most
/// once.
#[derive(Clone)]
pub struct CaptureController {
    state: Arc<Mutex<CaptureState>>,
    store: Arc<LibraryStore>,
    settings: Arc<SettingsStore>,
    sink: Arc<dyn PromptSink>,
    countdown: Arc<Mutex<Option<JoinHandle<()>>>>,
    config: CaptureConfig,
}

impl CaptureController {
    pub fn new(
        store: Arc<LibraryStore>,
        settings: Arc<SettingsStore>,
        sink: Arc<dyn PromptSink>,
        config: CaptureConfig,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(CaptureState::new())),
            store,
            settings,
            sink,
            countdown: Arc::new(Mutex::new(None)),
            config,
        }
    }

    pub async fn status(&self) -> CaptureStatus {
        self.state.lock().await.status()
    }

    pub async fn pending(&self) -> Option<PendingSnapshot> {
        self.state.lock().await.pending().map(PendingSnapshot::from)
    }

    /// Feeds one piece of changed clipboard text into the state machine.
    ///
    /// A different citation arriving while another is pending commits the
    /// pending one first, as if its countdown had run out. If that save fails
    /// the pending citation is kept and the new one is dropped. A candidate
    /// ignored by the `pending` dedup scope leaves the pending one untouched.
    pub async fn offer_candidate(&self, text: String) -> StorageResult<CandidateOutcome> {
        if !is_citation(&text) {
            log_debug!("not a citation: {}", preview(&text, 50));
            return Ok(CandidateOutcome::NotCitation);
        }

        let mut state = self.state.lock().await;

        if state.is_pending_text(&text) {
            log_info!("citation already pending, keeping countdown");
            return Ok(CandidateOutcome::SameAsPending);
        }

        let library = self.settings.active_library();
        let already_saved = match self.store.contains(&library, &text) {
            Ok(found) => found,
            Err(err) => {
                log_warn!("could not check library '{}' for duplicates: {err}", library);
                false
            }
        };

        if already_saved && self.config.dedup_scope == DedupScope::Pending {
            log_info!("citation already in '{}', ignoring", library);
            return Ok(CandidateOutcome::AlreadySaved);
        }

        self.resolve(&mut state, CommitTrigger::Superseded).await?;

        let deadline = Instant::now() + self.config.timeout;
        let pending = state.begin(text, library, already_saved, deadline);
        let cycle_id = pending.cycle_id.clone();
        let snapshot = PendingSnapshot::from(pending);

        log_info!(
            "Citation detected for '{}': {}",
            snapshot.library,
            snapshot.preview
        );
        self.arm_countdown(cycle_id.clone()).await;
        self.sink.emit(PromptEvent::Pending(snapshot));

        Ok(CandidateOutcome::Started { cycle_id })
    }

    /// Replaces the note buffer with what the user has typed so far.
    pub async fn update_note(&self, note: String) -> bool {
        self.state.lock().await.set_note(note)
    }

    /// Stops the countdown while the user writes a note.
    pub async fn hold(&self) -> bool {
        let mut state = self.state.lock().await;
        if !state.disarm() {
            return false;
        }
        self.cancel_countdown().await;
        if let Some(pending) = state.pending() {
            self.sink.emit(PromptEvent::Held {
                cycle_id: pending.cycle_id.clone(),
            });
        }
        true
    }

    /// Prompt confirm callback. `note`, when given, replaces the note buffer.
    /// `Ok(None)` means nothing was pending.
    pub async fn on_commit(&self, note: Option<String>) -> StorageResult<Option<SaveOutcome>> {
        let mut state = self.state.lock().await;
        if let Some(note) = note {
            state.set_note(note);
        }
        self.resolve(&mut state, CommitTrigger::User).await
    }

    /// Countdown-expired callback, also used when the prompt is closed
    /// without an explicit choice. Commits with the buffered note.
    pub async fn on_timeout(&self) -> StorageResult<Option<SaveOutcome>> {
        let mut state = self.state.lock().await;
        self.resolve(&mut state, CommitTrigger::Timeout).await
    }

    /// Drops the pending citation without saving it.
    pub async fn discard(&self) -> bool {
        let mut state = self.state.lock().await;
        let Some(pending) = state.clear() else {
            return false;
        };
        self.cancel_countdown().await;
        log_info!("Citation discarded: {}", preview(&pending.text, 50));
        self.sink.emit(PromptEvent::Discarded {
            cycle_id: pending.cycle_id,
        });
        true
    }

    /// Finalizes whatever is pending before the process exits.
    pub async fn shutdown(&self) -> StorageResult<Option<SaveOutcome>> {
        let outcome = self.on_timeout().await;
        self.cancel_countdown().await;
        outcome
    }

    pub fn active_library(&self) -> String {
        self.settings.active_library()
    }

    /// Makes `name` the library new captures go to. Already pending citations
    /// keep the library they were captured for.
    pub fn switch_library(&self, name: &str) -> Result<String> {
        let name = self.settings.set_active_library(name)?;
        log_info!("Switched to library: {}", name);
        Ok(name)
    }

    /// Libraries on disk plus `default` and the active one.
    pub fn libraries(&self) -> StorageResult<BTreeSet<String>> {
        let mut names = self.store.list_libraries()?;
        names.insert(DEFAULT_LIBRARY.to_string());
        names.insert(self.active_library());
        Ok(names)
    }

    pub fn citations(&self) -> StorageResult<Library> {
        self.store.load(&self.active_library())
    }

    pub fn remove_citation(&self, index: usize) -> StorageResult<CitationRecord> {
        self.store.remove(&self.active_library(), index)
    }

    pub fn clear_library(&self) -> StorageResult<usize> {
        self.store.clear(&self.active_library())
    }

    /// Renders the active library; `None` uses the export options from settings.
    pub fn export(&self, options: Option<ExportOptions>) -> StorageResult<String> {
        let options = options.unwrap_or_else(|| self.settings.snapshot().export);
        self.store
            .export_to_text(&self.active_library(), &options)
    }

    /// Saves the pending citation, if any. On success the slot is cleared; on
    /// failure the citation stays pending with its countdown stopped so the
    /// prompt can retry.
    async fn resolve(
        &self,
        state: &mut CaptureState,
        trigger: CommitTrigger,
    ) -> StorageResult<Option<SaveOutcome>> {
        let Some(pending) = state.pending().cloned() else {
            return Ok(None);
        };

        match self
            .store
            .save(&pending.library, &pending.text, &pending.note)
        {
            Ok(outcome) => {
                state.clear();
                self.cancel_countdown().await;
                log_info!(
                    "Citation saved to '{}' ({:?}, {:?})",
                    pending.library,
                    outcome.kind,
                    trigger
                );
                self.sink.emit(PromptEvent::Saved {
                    cycle_id: pending.cycle_id,
                    library: pending.library,
                    trigger,
                    outcome: outcome.kind,
                    index: outcome.index,
                    note: outcome.record.note.clone(),
                });
                Ok(Some(outcome))
            }
            Err(err) => {
                state.disarm();
                self.cancel_countdown().await;
                log_error!("Failed to save citation to '{}': {err}", pending.library);
                self.sink.emit(PromptEvent::StorageFailed {
                    cycle_id: pending.cycle_id,
                    library: pending.library,
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    async fn arm_countdown(&self, cycle_id: String) {
        let mut guard = self.countdown.lock().await;
        if let Some(handle) = guard.take() {
            handle.abort();
        }

        let controller = self.clone();
        let delay = self.config.timeout;
        *guard = Some(tokio::spawn(async move {
            time::sleep(delay).await;
            controller.fire_countdown(&cycle_id).await;
        }));
    }

    async fn fire_countdown(&self, cycle_id: &str) {
        let mut state = self.state.lock().await;
        if !state.is_armed(cycle_id) {
            return;
        }
        // This task's own handle; dropping it detaches instead of aborting.
        drop(self.countdown.lock().await.take());

        if let Err(err) = self.resolve(&mut state, CommitTrigger::Timeout).await {
            log_warn!("auto-save after timeout failed, citation kept pending: {err}");
        }
    }

    async fn cancel_countdown(&self) {
        if let Some(handle) = self.countdown.lock().await.take() {
            handle.abort();
        }
    }
}
