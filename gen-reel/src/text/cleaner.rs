//! Input text normalization ahead of chunking.

/// Characters that trip up speech synthesis, with replacements.
const PROBLEMATIC_CHARS: &[(char, &str)] = &[
    ('\u{2018}', "'"),   // Left single quote
    ('\u{2019}', "'"),   // Right single quote
    ('\u{201c}', "\""),  // Left double quote
    ('\u{201d}', "\""),  // Right double quote
    ('\u{2013}', "-"),   // En dash
    ('\u{2014}', "-"),   // Em dash
    ('\u{2026}', "..."), // Ellipsis
    ('\u{00a0}', " "),   // Non-breaking space
    ('\u{200b}', ""),    // Zero-width space
    ('\u{feff}', ""),    // BOM
];

/// Normalize input text: replace problematic Unicode characters, drop
/// control characters, and collapse all whitespace runs to single
/// spaces. Pure; the chunker operates on the output of this function.
pub fn clean_text(text: &str) -> String {
    let mut replaced = String::with_capacity(text.len());

    for c in text.chars() {
        let replacement = PROBLEMATIC_CHARS
            .iter()
            .find(|(ch, _)| *ch == c)
            .map(|(_, r)| *r);

        if let Some(r) = replacement {
            replaced.push_str(r);
        } else if c.is_whitespace() {
            replaced.push(' ');
        } else if !c.is_control() {
            replaced.push(c);
        }
    }

    // Collapse runs of spaces introduced above.
    let mut result = String::with_capacity(replaced.len());
    let mut last_was_space = true;
    for c in replaced.chars() {
        if c == ' ' {
            if !last_was_space {
                result.push(' ');
            }
            last_was_space = true;
        } else {
            result.push(c);
            last_was_space = false;
        }
    }

    result.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smart_quotes_replaced() {
        let text = "\u{201c}It\u{2019}s fine\u{201d}";
        assert_eq!(clean_text(text), "\"It's fine\"");
    }

    #[test]
    fn test_whitespace_collapsed() {
        let text = "First.\n\n\n   Second.\t\tThird.";
        assert_eq!(clean_text(text), "First. Second. Third.");
    }

    #[test]
    fn test_control_chars_dropped() {
        let text = "a\u{0000}b\u{0007}c";
        assert_eq!(clean_text(text), "abc");
    }

    #[test]
    fn test_empty_and_whitespace_only() {
        assert_eq!(clean_text(""), "");
        assert_eq!(clean_text("  \n\t  "), "");
    }

    #[test]
    fn test_idempotent() {
        let text = "Some \u{2014} messy\n\ninput.";
        let once = clean_text(text);
        assert_eq!(clean_text(&once), once);
    }
}
