//! Startup wiring shared by the terminal prompt and the window.

use std::{fs, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use log::{info, warn};
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{
    capture::{CaptureConfig, CaptureController, PromptSink},
    clipboard::{ClipboardSource, ClipboardWatcher},
    library::LibraryStore,
    settings::{resolve_data_dir, SettingsStore, SETTINGS_FILE},
};

pub const DEBUG_ENV: &str = "CITECATCH_DEBUG";

fn debug_enabled() -> bool {
    std::env::var(DEBUG_ENV)
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Initializes `env_logger`; `RUST_LOG` wins over the built-in default.
pub fn init_logging() {
    let default_filter = if debug_enabled() { "debug" } else { "info" };
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_filter),
    )
    .try_init();
}

pub struct AppContext {
    pub data_dir: PathBuf,
    pub settings: Arc<SettingsStore>,
    pub store: Arc<LibraryStore>,
    pub capture: CaptureController,
}

impl AppContext {
    pub fn bootstrap(sink: Arc<dyn PromptSink>) -> Result<Self> {
        Self::open(resolve_data_dir()?, sink)
    }

    pub fn open(data_dir: PathBuf, sink: Arc<dyn PromptSink>) -> Result<Self> {
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let settings = Arc::new(SettingsStore::new(data_dir.join(SETTINGS_FILE))?);
        let store = Arc::new(LibraryStore::new(data_dir.clone()));
        let config = CaptureConfig::from(&settings.snapshot());
        let capture = CaptureController::new(store.clone(), settings.clone(), sink, config);

        info!(
            "Using data directory {} (library '{}')",
            data_dir.display(),
            settings.active_library()
        );

        Ok(Self {
            data_dir,
            settings,
            store,
            capture,
        })
    }

    /// Starts polling `source` and feeding changes into the capture controller.
    pub fn start_clipboard(
        &self,
        watcher: &mut ClipboardWatcher,
        source: Arc<dyn ClipboardSource>,
    ) -> Result<JoinHandle<()>> {
        let candidates = watcher.start(source, self.settings.snapshot().poll_interval())?;
        Ok(spawn_candidate_pump(self.capture.clone(), candidates))
    }
}

/// Forwards clipboard candidates to the controller until the channel closes.
/// Storage errors were already reported to the prompt; they only get logged.
pub fn spawn_candidate_pump(
    controller: CaptureController,
    mut candidates: mpsc::Receiver<String>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(text) = candidates.recv().await {
            if let Err(err) = controller.offer_candidate(text).await {
                warn!("candidate dropped: {err}");
            }
        }
    })
}
