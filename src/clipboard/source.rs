use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),
    #[error("clipboard read failed: {0}")]
    Read(String),
}

/// Read-only access to the system clipboard.
///
/// `Ok(None)` means the clipboard holds no plain text (an image, files, or
/// nothing at all). Implementations are called from the blocking pool.
pub trait ClipboardSource: Send + Sync + 'static {
    fn read_text(&self) -> Result<Option<String>, ClipboardError>;
}

/// System clipboard via `arboard`. A fresh handle is opened per read so the
/// source itself stays `Send + Sync`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl SystemClipboard {
    pub fn new() -> Self {
        Self
    }
}

impl ClipboardSource for SystemClipboard {
    fn read_text(&self) -> Result<Option<String>, ClipboardError> {
        let mut clipboard = arboard::Clipboard::new()
            .map_err(|err| ClipboardError::Unavailable(err.to_string()))?;
        match clipboard.get_text() {
            Ok(text) => Ok(Some(text)),
            Err(arboard::Error::ContentNotAvailable) => Ok(None),
            Err(err) => Err(ClipboardError::Read(err.to_string())),
        }
    }
}
