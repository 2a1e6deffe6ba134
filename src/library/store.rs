use std::{
    collections::{BTreeSet, HashMap},
    fs,
    io::ErrorKind,
    path::PathBuf,
    sync::Arc,
};

use chrono::Utc;
use parking_lot::Mutex;

use crate::utils::fs::write_atomic;

use super::{
    error::{StorageError, StorageResult},
    export::{render_export, ExportOptions},
    models::{CitationRecord, Library, SaveOutcome},
};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

pub const DEFAULT_LIBRARY: &str = "default";

const FILE_PREFIX: &str = "pubmed_citations_";
const FILE_SUFFIX: &str = ".json";

/// Replaces anything outside `[A-Za-z0-9_-]` with `_`.
pub fn sanitize_library_name(raw: &str) -> StorageResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(StorageError::InvalidLibraryName(raw.to_string()));
    }
    Ok(trimmed
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect())
}

/// One JSON document per library under a single directory.
///
/// Every mutation loads the whole document, changes it and rewrites it
/// atomically. Mutations of the same library are serialized.
pub struct LibraryStore {
    dir: PathBuf,
    write_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl LibraryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn path_for(&self, library: &str) -> StorageResult<PathBuf> {
        let name = sanitize_library_name(library)?;
        Ok(self.dir.join(format!("{FILE_PREFIX}{name}{FILE_SUFFIX}")))
    }

    pub fn load(&self, library: &str) -> StorageResult<Library> {
        let name = sanitize_library_name(library)?;
        let path = self.path_for(&name)?;

        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                log_debug!("no file for library '{}', starting empty", name);
                return Ok(Library::new(name));
            }
            Err(err) => return Err(StorageError::io("read", path, err)),
        };

        let records: Vec<CitationRecord> = serde_json::from_str(&contents)
            .map_err(|source| StorageError::Corrupt { path, source })?;

        Ok(Library { name, records })
    }

    pub fn contains(&self, library: &str, text: &str) -> StorageResult<bool> {
        Ok(self.load(library)?.position(text).is_some())
    }

    /// Adds the citation or merges `note` into the record with the same text.
    pub fn save(&self, library: &str, text: &str, note: &str) -> StorageResult<SaveOutcome> {
        self.mutate(library, |lib| Ok(lib.upsert(text, note, Utc::now())))
    }

    pub fn remove(&self, library: &str, index: usize) -> StorageResult<CitationRecord> {
        self.mutate(library, |lib| {
            lib.remove(index).ok_or_else(|| StorageError::NoSuchRecord {
                library: lib.name.clone(),
                index,
            })
        })
    }

    pub fn clear(&self, library: &str) -> StorageResult<usize> {
        self.mutate(library, |lib| {
            let removed = lib.len();
            lib.records.clear();
            Ok(removed)
        })
    }

    /// Names of the libraries that have a file on disk.
    pub fn list_libraries(&self) -> StorageResult<BTreeSet<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(BTreeSet::new()),
            Err(err) => return Err(StorageError::io("list", &self.dir, err)),
        };

        let mut names = BTreeSet::new();
        for entry in entries {
            let entry = entry.map_err(|err| StorageError::io("list", &self.dir, err))?;
            if !entry.path().is_file() {
                continue;
            }
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            if let Some(name) = file_name
                .strip_prefix(FILE_PREFIX)
                .and_then(|rest| rest.strip_suffix(FILE_SUFFIX))
            {
                if !name.is_empty() {
                    names.insert(name.to_string());
                }
            }
        }
        Ok(names)
    }

    pub fn export_to_text(&self, library: &str, options: &ExportOptions) -> StorageResult<String> {
        Ok(render_export(&self.load(library)?, options))
    }

    fn mutate<T>(
        &self,
        library: &str,
        apply: impl FnOnce(&mut Library) -> StorageResult<T>,
    ) -> StorageResult<T> {
        let name = sanitize_library_name(library)?;
        let lock = self.lock_for(&name);
        let _guard = lock.lock();

        let mut lib = self.load(&name)?;
        let value = apply(&mut lib)?;
        self.write(&lib)?;
        Ok(value)
    }

    fn write(&self, library: &Library) -> StorageResult<()> {
        let path = self.path_for(&library.name)?;
        let serialized =
            serde_json::to_string_pretty(&library.records).map_err(|source| {
                StorageError::Serialize {
                    library: library.name.clone(),
                    source,
                }
            })?;

        write_atomic(&path, serialized.as_bytes())
            .map_err(|err| StorageError::io("write", &path, err))?;

        log_info!(
            "Saved {} citations to {}",
            library.records.len(),
            path.display()
        );
        Ok(())
    }

    fn lock_for(&self, name: &str) -> Arc<Mutex<()>> {
        self.write_locks
            .lock()
            .entry(name.to_string())
            .or_default()
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_names() {
        assert_eq!(sanitize_library_name(" my refs ").unwrap(), "my_refs");
        assert_eq!(sanitize_library_name("../etc").unwrap(), "___etc");
        assert_eq!(sanitize_library_name("lab-2024_a").unwrap(), "lab-2024_a");
        assert!(matches!(
            sanitize_library_name("  "),
            Err(StorageError::InvalidLibraryName(_))
        ));
    }

    #[test]
    fn path_uses_template() {
        let store = LibraryStore::new("/data");
        assert_eq!(
            store.path_for("refs").unwrap(),
            PathBuf::from("/data/pubmed_citations_refs.json")
        );
    }
}
