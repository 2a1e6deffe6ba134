//! Plain-text rendering of a library for batch export.

use serde::{Deserialize, Serialize};

use crate::classifier::first_author_key;

use super::models::{CitationRecord, Library};

const RULE_WIDTH: usize = 50;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportOrder {
    #[default]
    Insertion,
    NewestFirst,
    Author,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    pub order: ExportOrder,
    pub include_index: bool,
    pub include_notes: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            order: ExportOrder::Insertion,
            include_index: true,
            include_notes: true,
        }
    }
}

/// Renders every record as its own block, separated by blank lines.
pub fn render_export(library: &Library, options: &ExportOptions) -> String {
    let mut records: Vec<&CitationRecord> = library.records.iter().collect();
    match options.order {
        ExportOrder::Insertion => {}
        // Stable sorts keep insertion order among ties.
        ExportOrder::NewestFirst => records.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        ExportOrder::Author => records.sort_by_cached_key(|record| first_author_key(&record.text)),
    }

    let mut out = format!(
        "Citations Export ({} total)\n{}\n\n",
        records.len(),
        "=".repeat(RULE_WIDTH)
    );

    for (position, record) in records.iter().enumerate() {
        if options.include_index {
            out.push_str(&format!("{}. ", position + 1));
        }
        out.push_str(&record.text);
        if options.include_notes && !record.note.is_empty() {
            out.push_str(&format!(" [note: {}]", record.note));
        }
        out.push_str("\n\n");
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn library() -> Library {
        let base = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let mut library = Library::new("refs");
        library.upsert("Zuchero JB. Oligodendrocytes. 2013.", "", base);
        library.upsert("Adams K. Astrocytes. 2015.", "fig 3", base + Duration::seconds(10));
        library
    }

    #[test]
    fn default_export_keeps_insertion_order() {
        let text = render_export(&library(), &ExportOptions::default());
        assert_eq!(
            text,
            "Citations Export (2 total)\n\
             ==================================================\n\n\
             1. Zuchero JB. Oligodendrocytes. 2013.\n\n\
             2. Adams K. Astrocytes. 2015. [note: fig 3]\n\n"
        );
    }

    #[test]
    fn author_order_without_index_or_notes() {
        let options = ExportOptions {
            order: ExportOrder::Author,
            include_index: false,
            include_notes: false,
        };
        let text = render_export(&library(), &options);
        let body: Vec<&str> = text.split("\n\n").skip(1).filter(|b| !b.is_empty()).collect();
        assert_eq!(
            body,
            vec!["Adams K. Astrocytes. 2015.", "Zuchero JB. Oligodendrocytes. 2013."]
        );
    }

    #[test]
    fn newest_first() {
        let options = ExportOptions {
            order: ExportOrder::NewestFirst,
            ..ExportOptions::default()
        };
        let text = render_export(&library(), &options);
        assert!(text.find("1. Adams").unwrap() < text.find("2. Zuchero").unwrap());
    }

    #[test]
    fn empty_library_has_header_only() {
        let text = render_export(&Library::new("empty"), &ExportOptions::default());
        assert!(text.starts_with("Citations Export (0 total)\n"));
        assert_eq!(text.lines().count(), 3);
    }
}
