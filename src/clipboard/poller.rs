use std::sync::Arc;

use tokio::{
    sync::mpsc,
    time::{self, Duration, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use super::source::{ClipboardError, ClipboardSource};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

/// Change detection over successive clipboard reads.
#[derive(Debug, Default)]
pub struct ClipboardPoller {
    last_seen: Option<String>,
}

impl ClipboardPoller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_seen(&self) -> Option<&str> {
        self.last_seen.as_deref()
    }

    /// Records the current clipboard without reporting it.
    pub fn prime(&mut self, read: Result<Option<String>, ClipboardError>) {
        if let Ok(Some(text)) = read {
            self.last_seen = Some(text);
        }
    }

    /// Returns the text only if it differs from the last text seen.
    ///
    /// Failed reads, non-text content and blank text count as "no change" and
    /// leave the last-seen value alone.
    pub fn observe(&mut self, read: Result<Option<String>, ClipboardError>) -> Option<String> {
        let text = match read {
            Ok(Some(text)) => text,
            Ok(None) => return None,
            Err(err) => {
                log_debug!("skipping clipboard poll: {err}");
                return None;
            }
        };

        if text.trim().is_empty() || self.last_seen.as_deref() == Some(text.as_str()) {
            return None;
        }

        self.last_seen = Some(text.clone());
        Some(text)
    }
}

/// A read taking longer than this many poll intervals is abandoned.
const READ_TIMEOUT_TICKS: u32 = 4;
const MIN_READ_TIMEOUT: Duration = Duration::from_millis(200);

fn read_timeout(interval: Duration) -> Duration {
    (interval * READ_TIMEOUT_TICKS).max(MIN_READ_TIMEOUT)
}

async fn read_once(
    source: &Arc<dyn ClipboardSource>,
    limit: Duration,
) -> Result<Option<String>, ClipboardError> {
    let source = Arc::clone(source);
    let read = tokio::task::spawn_blocking(move || source.read_text());
    match time::timeout(limit, read).await {
        Ok(Ok(read)) => read,
        Ok(Err(err)) => Err(ClipboardError::Read(format!("clipboard worker join failed: {err}"))),
        Err(_) => {
            log_warn!("clipboard read timed out (> {}ms)", limit.as_millis());
            Err(ClipboardError::Read("timed out".into()))
        }
    }
}

/// Polls `source` every `interval` and forwards changed text to `candidates`
/// until cancelled or the receiver goes away.
pub async fn poll_loop(
    source: Arc<dyn ClipboardSource>,
    interval: Duration,
    candidates: mpsc::Sender<String>,
    cancel_token: CancellationToken,
) {
    let limit = read_timeout(interval);
    let mut poller = ClipboardPoller::new();
    poller.prime(read_once(&source, limit).await);

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; the priming read covered it.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let Some(text) = poller.observe(read_once(&source, limit).await) else {
                    continue;
                };
                log_debug!("clipboard changed: {}", crate::utils::preview(&text, 50));
                if candidates.send(text).await.is_err() {
                    log_warn!("candidate receiver dropped, stopping clipboard loop");
                    break;
                }
            }
            _ = cancel_token.cancelled() => {
                log_info!("clipboard loop shutting down");
                break;
            }
        }
    }
}
