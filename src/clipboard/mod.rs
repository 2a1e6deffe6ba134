pub mod poller;
pub mod source;
pub mod watcher;

pub use poller::{poll_loop, ClipboardPoller};
pub use source::{ClipboardError, ClipboardSource, SystemClipboard};
pub use watcher::ClipboardWatcher;
