//! Citation records and the in-memory library they live in.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::classifier::extract_pmid;

/// Separator placed between notes merged into one record.
pub const NOTE_SEPARATOR: &str = "\n---\n";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredRecord")]
pub struct CitationRecord {
    /// Exact clipboard text; the dedup key within a library.
    pub text: String,
    pub note: String,
    pub pmid: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CitationRecord {
    pub fn new(text: impl Into<String>, note: &str, now: DateTime<Utc>) -> Self {
        let text = text.into();
        Self {
            pmid: extract_pmid(&text),
            text,
            note: note.trim().to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Folds `note` into the existing note. Returns whether anything changed.
    pub fn merge_note(&mut self, note: &str) -> bool {
        let note = note.trim();
        if note.is_empty() {
            return false;
        }
        if self.note.is_empty() {
            self.note = note.to_string();
        } else {
            self.note.push_str(NOTE_SEPARATOR);
            self.note.push_str(note);
        }
        true
    }

    /// Individual notes in the order they were added.
    pub fn notes(&self) -> impl Iterator<Item = &str> {
        self.note
            .split(NOTE_SEPARATOR)
            .filter(|note| !note.is_empty())
    }
}

/// On-disk shape. Also accepts the older `notes`/`timestamp` layout.
#[derive(Deserialize)]
struct StoredRecord {
    text: String,
    #[serde(default, alias = "notes")]
    note: String,
    #[serde(default)]
    pmid: Option<String>,
    #[serde(alias = "timestamp", deserialize_with = "lenient_timestamp")]
    created_at: DateTime<Utc>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

/// RFC 3339, or the offset-free ISO form older files used (read as UTC).
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(serde::de::Error::custom)
}

impl From<StoredRecord> for CitationRecord {
    fn from(stored: StoredRecord) -> Self {
        Self {
            pmid: stored.pmid.or_else(|| extract_pmid(&stored.text)),
            updated_at: stored.updated_at.unwrap_or(stored.created_at),
            text: stored.text,
            note: stored.note,
            created_at: stored.created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveKind {
    Added,
    NoteAppended,
    AlreadyPresent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaveOutcome {
    pub kind: SaveKind,
    pub index: usize,
    pub record: CitationRecord,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Library {
    pub name: String,
    pub records: Vec<CitationRecord>,
}

impl Library {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn position(&self, text: &str) -> Option<usize> {
        self.records.iter().position(|record| record.text == text)
    }

    /// Adds `text` or merges `note` into the record that already has it.
    /// A merge keeps the record at its original position.
    pub fn upsert(&mut self, text: &str, note: &str, now: DateTime<Utc>) -> SaveOutcome {
        match self.position(text) {
            Some(index) => {
                let record = &mut self.records[index];
                let kind = if record.merge_note(note) {
                    SaveKind::NoteAppended
                } else {
                    SaveKind::AlreadyPresent
                };
                record.updated_at = now;
                SaveOutcome {
                    kind,
                    index,
                    record: record.clone(),
                }
            }
            None => {
                let record = CitationRecord::new(text, note, now);
                self.records.push(record.clone());
                SaveOutcome {
                    kind: SaveKind::Added,
                    index: self.records.len() - 1,
                    record,
                }
            }
        }
    }

    pub fn remove(&mut self, index: usize) -> Option<CitationRecord> {
        (index < self.records.len()).then(|| self.records.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::seconds(secs)
    }

    #[test]
    fn upsert_appends_new_text() {
        let mut library = Library::new("refs");
        let outcome = library.upsert("Smith J. Title. Journal. 2020.", " first ", at(0));

        assert_eq!(outcome.kind, SaveKind::Added);
        assert_eq!(outcome.index, 0);
        assert_eq!(outcome.record.note, "first");
        assert_eq!(outcome.record.created_at, outcome.record.updated_at);
    }

    #[test]
    fn upsert_merges_notes_in_order() {
        let mut library = Library::new("refs");
        library.upsert("T", "a", at(0));
        let outcome = library.upsert("T", "b", at(5));

        assert_eq!(library.len(), 1);
        assert_eq!(outcome.kind, SaveKind::NoteAppended);
        assert_eq!(outcome.record.note, "a\n---\nb");
        assert_eq!(outcome.record.notes().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(outcome.record.created_at, at(0));
        assert_eq!(outcome.record.updated_at, at(5));
    }

    #[test]
    fn empty_note_never_erases() {
        let mut library = Library::new("refs");
        library.upsert("T", "keep me", at(0));
        let outcome = library.upsert("T", "   ", at(1));

        assert_eq!(outcome.kind, SaveKind::AlreadyPresent);
        assert_eq!(outcome.record.note, "keep me");
        assert_eq!(outcome.record.updated_at, at(1));
    }

    #[test]
    fn first_real_note_replaces_empty() {
        let mut library = Library::new("refs");
        library.upsert("T", "", at(0));
        let outcome = library.upsert("T", "check fig 2", at(1));
        assert_eq!(outcome.record.note, "check fig 2");
    }

    #[test]
    fn merge_keeps_position() {
        let mut library = Library::new("refs");
        library.upsert("A", "", at(0));
        library.upsert("B", "", at(1));
        let outcome = library.upsert("A", "late", at(2));

        assert_eq!(outcome.index, 0);
        assert_eq!(library.records[1].text, "B");
    }

    #[test]
    fn dedup_is_exact_text() {
        let mut library = Library::new("refs");
        library.upsert("T", "", at(0));
        library.upsert("T ", "", at(1));
        assert_eq!(library.len(), 2);
    }

    #[test]
    fn remove_out_of_range() {
        let mut library = Library::new("refs");
        library.upsert("A", "", at(0));
        assert!(library.remove(3).is_none());
        assert_eq!(library.remove(0).map(|r| r.text), Some("A".to_string()));
        assert!(library.is_empty());
    }

    #[test]
    fn legacy_layout_deserializes() {
        let json = r#"[{"text":"Doe J. A B C. 2001. PMID: 77","timestamp":"2024-01-02T03:04:05Z","notes":"old","summary":"Doe: ABC"}]"#;
        let records: Vec<CitationRecord> = serde_json::from_str(json).unwrap();

        assert_eq!(records[0].note, "old");
        assert_eq!(records[0].pmid.as_deref(), Some("77"));
        assert_eq!(records[0].updated_at, records[0].created_at);
    }

    #[test]
    fn offset_free_timestamps_read_as_utc() {
        let json = r#"[{"text":"Doe J. A B C. 2001.","timestamp":"2023-11-05T14:30:00.250000","notes":""}]"#;
        let records: Vec<CitationRecord> = serde_json::from_str(json).unwrap();

        let expected = Utc.with_ymd_and_hms(2023, 11, 5, 14, 30, 0).unwrap()
            + Duration::milliseconds(250);
        assert_eq!(records[0].created_at, expected);
        assert_eq!(records[0].pmid, None);
    }

    #[test]
    fn garbage_timestamp_is_rejected() {
        let json = r#"[{"text":"x","timestamp":"yesterday"}]"#;
        assert!(serde_json::from_str::<Vec<CitationRecord>>(json).is_err());
    }
}
