//! Structural checks that make up the citation predicate.
//!
//! Each field of [`CitationSignals`] is one independently testable condition.
//! The decision rule in [`CitationSignals::is_citation`] favours precision:
//! every gate must hold and at least one piece of evidence must be present.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Shorter trimmed text is never treated as a citation.
pub const MIN_CITATION_CHARS: usize = 20;

/// Minimum word count for a `.`-delimited segment to count as a title.
const MIN_TITLE_WORDS: usize = 3;

static YEAR_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:1[5-9]|20)\d{2}\b").unwrap());

static PMID_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bPMID:\s*(\d+)").unwrap());

static DOI_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bdoi:\s*10\.\d+").unwrap());

/// `2013 Dec;23(6):914-20`, `2020;10(1):e123`, `2019 Jan 5;4(2):12`
static JOURNAL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b\d{4}(?:\s+[A-Z][a-z]{2}(?:\s+\d{1,2})?)?;\s*\d+(?:\(\d+\))?:\s*[A-Za-z]?\d+|\b\d{4}[;\s][A-Za-z\s]+\d+\(\d+\):\d+",
    )
    .unwrap()
});

/// Surname followed by initials at the very start, a year later on the line.
static AUTHOR_YEAR_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][a-z]+\s+[A-Z]{1,3}[a-z]*.*\d{4}").unwrap());

static URL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:https?://|www\.)\S+$").unwrap());

/// Line openings that only show up in source code.
const CODE_LINE_PREFIXES: &[&str] = &[
    "def ", "import ", "from typing", "class ", "return ", "fn ", "pub fn ", "let ", "const ",
    "#include", "function ", "var ",
];

/// Fragments that never appear in a bibliographic reference.
const CODE_FRAGMENTS: &[&str] = &["if __name__", "print(", "\"\"\"", "();", "=>", "::", "{\n", "};"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CitationSignals {
    pub long_enough: bool,
    pub looks_like_code: bool,
    pub looks_like_url: bool,
    pub has_year: bool,
    pub has_title_segment: bool,
    pub has_pmid: bool,
    pub has_doi: bool,
    pub has_journal_format: bool,
    pub has_author_year: bool,
    pub has_epub: bool,
    pub has_pmcid: bool,
}

impl CitationSignals {
    pub fn inspect(text: &str) -> Self {
        let text = text.trim();
        let lower = text.to_lowercase();

        Self {
            long_enough: text.chars().count() >= MIN_CITATION_CHARS,
            looks_like_code: looks_like_code(text),
            looks_like_url: URL_REGEX.is_match(text),
            has_year: YEAR_REGEX.is_match(text),
            has_title_segment: has_title_segment(text),
            has_pmid: PMID_REGEX.is_match(text),
            has_doi: DOI_REGEX.is_match(text),
            has_journal_format: JOURNAL_REGEX.is_match(text),
            has_author_year: AUTHOR_YEAR_REGEX.is_match(text),
            has_epub: lower.contains("epub"),
            has_pmcid: lower.contains("pmcid:"),
        }
    }

    /// All of these must hold before any evidence is considered.
    pub fn passes_gates(&self) -> bool {
        self.long_enough
            && !self.looks_like_code
            && !self.looks_like_url
            && self.has_year
            && self.has_title_segment
    }

    pub fn strong_evidence(&self) -> usize {
        [
            self.has_pmid,
            self.has_doi,
            self.has_journal_format && self.has_author_year,
        ]
        .into_iter()
        .filter(|hit| *hit)
        .count()
    }

    pub fn weak_evidence(&self) -> usize {
        [self.has_epub, self.has_pmcid]
            .into_iter()
            .filter(|hit| *hit)
            .count()
    }

    pub fn is_citation(&self) -> bool {
        self.passes_gates() && (self.strong_evidence() >= 1 || self.weak_evidence() >= 2)
    }
}

fn looks_like_code(text: &str) -> bool {
    if CODE_FRAGMENTS.iter().any(|fragment| text.contains(fragment)) {
        return true;
    }
    text.lines().map(str::trim_start).any(|line| {
        CODE_LINE_PREFIXES
            .iter()
            .any(|prefix| line.starts_with(prefix))
    })
}

/// A `.`-delimited segment with enough words, one of them a real word.
fn has_title_segment(text: &str) -> bool {
    text.split(|c: char| c == '.' || c == '\n')
        .map(str::trim)
        .any(|segment| {
            let words: Vec<&str> = segment.split_whitespace().collect();
            words.len() >= MIN_TITLE_WORDS
                && words.iter().any(|word| {
                    word.chars().filter(|c| c.is_alphabetic()).count() >= 3
                })
        })
}

/// PubMed identifier, if the text carries one.
pub fn extract_pmid(text: &str) -> Option<String> {
    PMID_REGEX
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Lower-cased first author surname, used to order exports.
pub fn first_author_key(text: &str) -> String {
    static SURNAME_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([A-Z][a-z]+)").unwrap());

    let trimmed = text.trim();
    if let Some(caps) = SURNAME_REGEX.captures(trimmed) {
        return caps[1].to_lowercase();
    }
    trimmed
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_lowercase()
}
