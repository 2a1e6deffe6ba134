use citecatch_lib::classifier::{classify, is_citation, CitationSignals};
use proptest::prelude::*;

const NLM_SAMPLE: &str = "Zuchero JB, Barres BA. Intrinsic and extrinsic control of \
    oligodendrocyte development. Curr Opin Neurobiol. 2013 Dec;23(6):914-20. \
    doi: 10.1016/j.conb.2013.06.005. Epub 2013 Jul 6. PMID: 23831087; PMCID: PMC3891862.";

#[test]
fn nlm_cite_export_is_a_citation() {
    assert!(is_citation(NLM_SAMPLE));
    assert!(classify(Some(NLM_SAMPLE)));

    let signals = CitationSignals::inspect(NLM_SAMPLE);
    assert!(signals.has_pmid && signals.has_doi && signals.has_journal_format);
    assert_eq!(signals.strong_evidence(), 3);
    assert_eq!(signals.weak_evidence(), 2);
}

#[test]
fn missing_clipboard_text_is_not_a_citation() {
    assert!(!classify(None));
    assert!(!classify(Some("")));
}

proptest! {
    #[test]
    fn text_without_digits_is_never_a_citation(text in "[^0-9]{0,300}") {
        prop_assert!(!is_citation(&text));
    }

    #[test]
    fn text_without_title_segment_is_never_a_citation(
        words in prop::collection::vec("[A-Za-z0-9:;()]{1,12}", 0..3),
    ) {
        // Fewer than three words cannot form a title segment.
        let text = words.join(" ");
        prop_assert!(!CitationSignals::inspect(&text).has_title_segment);
        prop_assert!(!is_citation(&text));
    }

    #[test]
    fn surrounding_whitespace_does_not_change_the_verdict(
        pad_left in "[ \t\n]{0,5}",
        pad_right in "[ \t\n]{0,5}",
    ) {
        let padded = format!("{pad_left}{NLM_SAMPLE}{pad_right}");
        prop_assert!(is_citation(&padded));
    }
}
