use std::sync::Arc;

use anyhow::{bail, Context, Result};
use log::info;
use tokio::{sync::mpsc, task::JoinHandle, time::Duration};
use tokio_util::sync::CancellationToken;

use super::{poller::poll_loop, source::ClipboardSource};

const CANDIDATE_BUFFER: usize = 16;

/// Owns the background clipboard loop.
pub struct ClipboardWatcher {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl Default for ClipboardWatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ClipboardWatcher {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Spawns the poll loop and returns the stream of changed clipboard text.
    pub fn start(
        &mut self,
        source: Arc<dyn ClipboardSource>,
        interval: Duration,
    ) -> Result<mpsc::Receiver<String>> {
        if self.handle.is_some() {
            bail!("clipboard watcher already running");
        }

        let cancel_token = CancellationToken::new();
        let (tx, rx) = mpsc::channel(CANDIDATE_BUFFER);

        info!("Clipboard monitoring started (every {}ms)", interval.as_millis());
        let handle = tokio::spawn(poll_loop(source, interval, tx, cancel_token.clone()));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(rx)
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("clipboard loop task failed to join")?;
            info!("Clipboard monitoring stopped");
        }
        Ok(())
    }
}
