#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Word-level diff rendering between an original response and its revised
//! version, for human review of the evaluator's corrections.

use similar::{Algorithm, ChangeTag, utils::diff_unicode_words};

/// Normalizes a transcript before comparison: strips surrounding whitespace,
/// then strips the leading and trailing runs of literal double quotes in a
/// single pass (transcripts often arrive quoted).
pub fn clean_text(text: &str) -> &str {
    text.trim().trim_matches('"')
}

/// Renders a word-level edit script from `original` to `revised`.
///
/// Unchanged spans appear as plain text, deletions wrapped in `<del>`, and
/// insertions wrapped in `<ins>`, in one left-to-right reading order —
/// how an editor would mark up the original document to arrive at the
/// revision. Identical inputs (after cleaning) produce no marked spans.
pub fn render_diff(original: &str, revised: &str) -> String {
    let original_clean = clean_text(original);
    let revised_clean = clean_text(revised);

    if original_clean == revised_clean {
        return original_clean.to_string();
    }

    let diff = diff_unicode_words(Algorithm::Patience, original_clean, revised_clean);

    let mut markup = String::new();
    for (change, value) in diff {
        match change {
            ChangeTag::Equal => markup.push_str(value),
            ChangeTag::Delete => {
                markup.push_str("<del>");
                markup.push_str(value);
                markup.push_str("</del>");
            }
            ChangeTag::Insert => {
                markup.push_str("<ins>");
                markup.push_str(value);
                markup.push_str("</ins>");
            }
        }
    }

    markup
}
