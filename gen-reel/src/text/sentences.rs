//! Sentence splitting via the seams dialog-aware detector.

use seams::sentence_detector::dialog_detector::SentenceDetectorDialog;
use std::sync::OnceLock;

static DETECTOR: OnceLock<SentenceDetectorDialog> = OnceLock::new();

fn detector() -> &'static SentenceDetectorDialog {
    DETECTOR.get_or_init(|| {
        SentenceDetectorDialog::new().expect("seams sentence detector should initialize")
    })
}

/// Split text into sentences, dropping empty ones.
pub fn split_sentences(text: &str) -> Vec<String> {
    let detected = detector()
        .detect_sentences_borrowed(text)
        .expect("seams sentence detection should succeed");

    detected
        .iter()
        .map(|s| s.normalize())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_split() {
        let sentences = split_sentences("First sentence. Second sentence.");
        assert_eq!(sentences.len(), 2);
        assert!(sentences[0].contains("First"));
        assert!(sentences[1].contains("Second"));
    }

    #[test]
    fn test_question_and_exclamation() {
        let sentences = split_sentences("Really? Yes! Good.");
        assert_eq!(sentences.len(), 3);
    }

    #[test]
    fn test_empty_input() {
        assert!(split_sentences("").is_empty());
    }
}
