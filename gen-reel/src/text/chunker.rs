//! Sentence-boundary chunking under word-count constraints.
//!
//! Splits normalized input into narration-sized chunks. Chunks never
//! break mid-sentence and never drop content; a pathologically long
//! sentence passes through as its own oversized chunk.

use super::sentences::split_sentences;
use crate::error::PipelineError;

/// Word-count constraints for chunking.
#[derive(Debug, Clone)]
pub struct ChunkConstraints {
    /// Minimum words per chunk (only the final chunk may fall below)
    pub min_words: usize,
    /// Maximum words per chunk (a single over-long sentence may exceed)
    pub max_words: usize,
    /// Hard cap on chunk count; the last chunk absorbs any remainder
    pub max_chunks: usize,
}

impl Default for ChunkConstraints {
    fn default() -> Self {
        Self {
            min_words: 60,
            max_words: 130,
            max_chunks: 8,
        }
    }
}

impl ChunkConstraints {
    fn validate(&self) -> Result<(), PipelineError> {
        if self.min_words == 0 || self.max_words < self.min_words || self.max_chunks == 0 {
            return Err(PipelineError::InvalidInput(format!(
                "invalid chunk constraints: min_words={}, max_words={}, max_chunks={}",
                self.min_words, self.max_words, self.max_chunks
            )));
        }
        Ok(())
    }
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Split text into narration chunks.
///
/// Greedy sentence packing: sentences accumulate into the current chunk
/// until adding the next one would exceed `max_words`; the chunk then
/// closes, unless it is still below `min_words`, in which case the
/// sentence is force-included. A chunk sitting exactly at `max_words`
/// closes before the next sentence is considered. Once the chunk count
/// reaches `max_chunks`, the final chunk absorbs everything remaining.
///
/// Pure function of its inputs; the same text and constraints always
/// yield the same chunk sequence.
pub fn chunk(text: &str, constraints: &ChunkConstraints) -> Result<Vec<String>, PipelineError> {
    constraints.validate()?;

    if text.trim().is_empty() {
        return Err(PipelineError::InvalidInput(
            "input text is empty".to_string(),
        ));
    }

    let sentences = split_sentences(text);
    if sentences.is_empty() {
        return Err(PipelineError::InvalidInput(
            "input text contains no sentences".to_string(),
        ));
    }

    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_words = 0usize;

    for sentence in sentences {
        let sentence_words = word_count(&sentence);
        // Closing now would make `current` chunk number chunks.len() + 1;
        // the last permitted chunk never closes early.
        let may_close = chunks.len() + 1 < constraints.max_chunks;

        if !current.is_empty()
            && may_close
            && current_words >= constraints.min_words
            && current_words + sentence_words > constraints.max_words
        {
            chunks.push(std::mem::take(&mut current));
            current_words = 0;
        }

        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&sentence);
        current_words += sentence_words;
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constraints(min: usize, max: usize, cap: usize) -> ChunkConstraints {
        ChunkConstraints {
            min_words: min,
            max_words: max,
            max_chunks: cap,
        }
    }

    /// Independent greedy repack used to cross-check chunk boundaries.
    fn greedy_word_counts(sentence_words: &[usize], min: usize, max: usize) -> Vec<usize> {
        let mut counts = Vec::new();
        let mut current = 0usize;
        for &w in sentence_words {
            if current >= min && current + w > max {
                counts.push(current);
                current = 0;
            }
            current += w;
        }
        if current > 0 {
            counts.push(current);
        }
        counts
    }

    #[test]
    fn test_short_input_single_chunk() {
        let text = "Hello world. How are you?";
        let chunks = chunk(text, &constraints(50, 100, 8)).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], "Hello world. How are you?");
    }

    #[test]
    fn test_empty_input_rejected() {
        let result = chunk("", &ChunkConstraints::default());
        assert!(matches!(result, Err(PipelineError::InvalidInput(_))));

        let result = chunk("   \n\t ", &ChunkConstraints::default());
        assert!(matches!(result, Err(PipelineError::InvalidInput(_))));
    }

    #[test]
    fn test_no_content_loss() {
        let text = "One two three. Four five six. Seven eight nine. Ten eleven twelve.";
        let chunks = chunk(text, &constraints(3, 6, 8)).unwrap();
        assert!(chunks.len() > 1);
        assert_eq!(chunks.join(" "), text);
    }

    #[test]
    fn test_max_bound_respected() {
        // Ten sentences of five words each, max 12 per chunk.
        let text = "Alpha beta gamma delta one. ".repeat(10);
        let chunks = chunk(text.trim(), &constraints(5, 12, 100)).unwrap();
        for c in &chunks {
            assert!(
                word_count(c) <= 12,
                "chunk exceeds bound: {} words",
                word_count(c)
            );
        }
    }

    #[test]
    fn test_min_bound_respected_except_final() {
        let text = "Alpha beta gamma delta one. ".repeat(9);
        let chunks = chunk(text.trim(), &constraints(8, 12, 100)).unwrap();
        for c in &chunks[..chunks.len() - 1] {
            assert!(word_count(c) >= 8, "non-final chunk below floor: {c}");
        }
    }

    #[test]
    fn test_oversized_sentence_passes_through() {
        let long = "Blah ".repeat(40);
        let text = format!("Short one here. {}. Another short one.", long.trim());
        let chunks = chunk(&text, &constraints(2, 10, 100)).unwrap();
        // The 40-word sentence lands in its own chunk rather than being
        // truncated or split.
        assert!(chunks.iter().any(|c| word_count(c) >= 40));
        let total: usize = chunks.iter().map(|c| word_count(c)).sum();
        assert_eq!(total, word_count(&text));
    }

    #[test]
    fn test_idempotent() {
        let text = "First sentence here. Second sentence here. Third sentence here. \
                    Fourth sentence here. Fifth sentence here.";
        let c = constraints(4, 8, 8);
        let first = chunk(text, &c).unwrap();
        let second = chunk(text, &c).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_max_chunks_cap_absorbs_remainder() {
        let text = "Alpha beta gamma delta one. ".repeat(20);
        let chunks = chunk(text.trim(), &constraints(5, 10, 3)).unwrap();
        assert_eq!(chunks.len(), 3);
        let total: usize = chunks.iter().map(|c| word_count(c)).sum();
        assert_eq!(total, 100);
        // Remainder piled into the final chunk.
        assert!(word_count(&chunks[2]) > 10);
    }

    #[test]
    fn test_matches_independent_greedy_packing() {
        // Forty sentences with varying lengths, bound of 80 words.
        let mut text = String::new();
        let mut sentence_words = Vec::new();
        for i in 0..40 {
            let n = 3 + (i % 7);
            sentence_words.push(n);
            let mut parts = vec!["Every".to_string()];
            parts.extend(std::iter::repeat_n("word".to_string(), n - 2));
            parts.push("counts.".to_string());
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(&parts.join(" "));
        }

        let chunks = chunk(&text, &constraints(20, 80, 100)).unwrap();
        let expected = greedy_word_counts(&sentence_words, 20, 80);
        let actual: Vec<usize> = chunks.iter().map(|c| word_count(c)).collect();
        assert_eq!(actual, expected);
        for c in &chunks[..chunks.len() - 1] {
            assert!(word_count(c) <= 80);
        }
    }

    #[test]
    fn test_invalid_constraints_rejected() {
        let result = chunk("Some text.", &constraints(10, 5, 8));
        assert!(matches!(result, Err(PipelineError::InvalidInput(_))));
        let result = chunk("Some text.", &constraints(1, 10, 0));
        assert!(matches!(result, Err(PipelineError::InvalidInput(_))));
    }
}
