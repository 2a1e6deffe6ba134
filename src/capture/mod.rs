#[cfg(feature = "gui")]
pub mod commands;
pub mod controller;
pub mod events;
pub mod state;

pub use controller::{CandidateOutcome, CaptureConfig, CaptureController};
pub use events::{PromptEvent, PromptSink};
pub use state::{CaptureStatus, CommitTrigger, DedupScope, PendingSnapshot};
