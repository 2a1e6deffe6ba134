pub mod app;
pub mod capture;
pub mod classifier;
pub mod clipboard;
#[cfg(feature = "gui")]
pub mod gui;
pub mod library;
pub mod prompt;
pub mod settings;
pub mod utils;

use std::sync::Arc;

use log::{error, info};

pub use app::{spawn_candidate_pump, AppContext};
pub use capture::{CaptureController, PromptEvent, PromptSink};
pub use classifier::{classify, is_citation};
pub use clipboard::{ClipboardSource, ClipboardWatcher, SystemClipboard};
pub use library::{ExportOptions, LibraryStore, StorageError};
pub use settings::SettingsStore;

use prompt::{run_terminal, TerminalSink};

/// Runs the terminal prompt until stdin closes or Ctrl-C, then commits
/// whatever is still pending.
pub async fn run() -> anyhow::Result<()> {
    app::init_logging();
    info!("citecatch starting up...");

    let ctx = AppContext::bootstrap(Arc::new(TerminalSink))?;
    let mut watcher = ClipboardWatcher::new();
    let pump = ctx.start_clipboard(&mut watcher, Arc::new(SystemClipboard::new()))?;

    let prompt_result = run_terminal(&ctx).await;

    watcher.stop().await?;
    // The pump ends once the watcher drops its sender.
    if let Err(err) = pump.await {
        error!("candidate pump failed: {err}");
    }
    if let Err(err) = ctx.capture.shutdown().await {
        error!("pending citation could not be saved on exit: {err}");
    }

    prompt_result
}
