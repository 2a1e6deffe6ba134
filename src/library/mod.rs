pub mod error;
pub mod export;
pub mod models;
pub mod store;

pub use error::{StorageError, StorageResult};
pub use export::{render_export, ExportOptions, ExportOrder};
pub use models::{CitationRecord, Library, SaveKind, SaveOutcome, NOTE_SEPARATOR};
pub use store::{sanitize_library_name, LibraryStore, DEFAULT_LIBRARY};
