//! Small always-on-top prompt window, built with `--features gui`.

use std::sync::Arc;

use log::{error, info, warn};
use tauri::{AppHandle, Emitter, Manager, RunEvent, WindowEvent};
use tokio::sync::Mutex;

use crate::{
    app::{self, AppContext},
    capture::{
        commands::{
            clear_library, close_prompt, commit_pending, discard_pending, export_library,
            get_pending, hold_pending, list_citations, list_libraries, remove_citation,
            switch_library, update_note,
        },
        CaptureController, PromptEvent, PromptSink,
    },
    clipboard::{ClipboardWatcher, SystemClipboard},
};

const PROMPT_WINDOW: &str = "prompt";

pub(crate) struct AppState {
    pub(crate) capture: CaptureController,
    watcher: Mutex<ClipboardWatcher>,
}

/// Forwards capture events to the webview and shows or hides the prompt.
struct WindowSink {
    app_handle: AppHandle,
}

impl PromptSink for WindowSink {
    fn emit(&self, event: PromptEvent) {
        if let Some(window) = self.app_handle.get_webview_window(PROMPT_WINDOW) {
            let result = match &event {
                PromptEvent::Pending(_) => window.show().and_then(|_| window.set_focus()),
                PromptEvent::Saved { .. } | PromptEvent::Discarded { .. } => window.hide(),
                _ => Ok(()),
            };
            if let Err(err) = result {
                warn!("prompt window update failed: {err}");
            }
        }

        if let Err(err) = self.app_handle.emit(event.name(), &event) {
            warn!("failed to emit {}: {err}", event.name());
        }
    }
}

pub fn run() -> anyhow::Result<()> {
    app::init_logging();
    info!("citecatch window starting up...");

    let app = tauri::Builder::default()
        .setup(|app| {
            let result = (|| -> anyhow::Result<()> {
                let sink = Arc::new(WindowSink {
                    app_handle: app.handle().clone(),
                });
                let ctx = AppContext::bootstrap(sink)?;

                let mut watcher = ClipboardWatcher::new();
                // The watcher spawns onto the runtime, so start it from inside it.
                tauri::async_runtime::block_on(async {
                    ctx.start_clipboard(&mut watcher, Arc::new(SystemClipboard::new()))
                        .map(drop)
                })?;

                app.manage(AppState {
                    capture: ctx.capture.clone(),
                    watcher: Mutex::new(watcher),
                });
                Ok(())
            })();

            result.map_err(|err| err.into())
        })
        .on_window_event(|window, event| {
            // Closing the prompt counts as letting the countdown run out.
            if let WindowEvent::CloseRequested { api, .. } = event {
                api.prevent_close();
                if let Err(err) = window.hide() {
                    warn!("failed to hide prompt window: {err}");
                }
                let capture = window.state::<AppState>().capture.clone();
                tauri::async_runtime::spawn(async move {
                    if let Err(err) = capture.on_timeout().await {
                        error!("save on close failed: {err}");
                    }
                });
            }
        })
        .invoke_handler(tauri::generate_handler![
            get_pending,
            update_note,
            hold_pending,
            commit_pending,
            discard_pending,
            close_prompt,
            list_libraries,
            switch_library,
            list_citations,
            remove_citation,
            clear_library,
            export_library,
        ])
        .build(tauri::generate_context!())?;

    app.run(|app_handle, event| {
        if let RunEvent::Exit = event {
            let state = app_handle.state::<AppState>();
            tauri::async_runtime::block_on(async {
                if let Err(err) = state.watcher.lock().await.stop().await {
                    warn!("clipboard watcher did not stop cleanly: {err:#}");
                }
                if let Err(err) = state.capture.shutdown().await {
                    error!("pending citation could not be saved on exit: {err}");
                }
            });
        }
    });
    Ok(())
}
