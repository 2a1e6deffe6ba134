//! Decides whether clipboard text is a PubMed-style citation.

pub mod signals;

pub use signals::{extract_pmid, first_author_key, CitationSignals, MIN_CITATION_CHARS};

/// Pure, deterministic citation predicate. Empty and short text is rejected.
pub fn is_citation(text: &str) -> bool {
    CitationSignals::inspect(text).is_citation()
}

/// Typed entry point for clipboard reads: `None` means the clipboard held no
/// plain text, which is never a citation.
pub fn classify(candidate: Option<&str>) -> bool {
    candidate.map(is_citation).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PMID_ONLY: &str = "Zuchero JB, Barres BA. Intrinsic and extrinsic control of \
        oligodendrocyte development. Curr Opin Neurobiol. 2013 Dec;23(6):914-20. PMID: 23831087";

    #[test]
    fn accepts_cite_button_output() {
        assert!(is_citation(PMID_ONLY));
        assert!(is_citation(&format!("\n  {PMID_ONLY}  \n")));
    }

    #[test]
    fn accepts_journal_and_author_without_identifiers() {
        let text = "Smith AB, Jones C. Myelin plasticity in the adult brain. \
            Nat Rev Neurosci. 2018 Mar;19(3):145-160.";
        assert!(is_citation(text));
    }

    #[test]
    fn accepts_two_weak_markers() {
        let text = "Lee K. Remyelination after injury in mice. Glia. Epub 2021 Feb 2. PMCID: PMC1234567.";
        assert!(is_citation(text));
    }

    #[test]
    fn rejects_edge_cases() {
        assert!(!is_citation(""));
        assert!(!is_citation("   "));
        assert!(!is_citation("PMID: 1 2020"));
        assert!(!is_citation("Zuchero JB, Barres BA."));
        assert!(!is_citation("https://pubmed.ncbi.nlm.nih.gov/23831087/"));
        assert!(!is_citation(
            "We met in 2019 and talked about the weather for a long while."
        ));
    }

    #[test]
    fn rejects_code_mentioning_pmid() {
        let code = "def fetch(pmid):\n    return get('PMID: 23831087 from 2013 is a good paper')";
        assert!(!is_citation(code));
    }

    #[test]
    fn single_weak_marker_is_not_enough() {
        let text = "Lee K. Remyelination after injury in mice. Glia. Epub 2021 Feb 2.";
        assert!(!is_citation(text));
    }

    #[test]
    fn classify_treats_missing_text_as_miss() {
        assert!(!classify(None));
        assert!(classify(Some(PMID_ONLY)));
    }
}
