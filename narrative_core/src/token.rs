//! Token estimation and budget-aware truncation.
//!
//! Tokens are approximated as 1.2 per character. Characters, not bytes: the
//! stories are largely Vietnamese and diacritics would otherwise count double.

use std::borrow::Cow;

/// Marker placed where the middle of a truncated text was removed.
pub const ELISION: &str = "\n[...]\n";

/// Estimate the token count for a string: `ceil(chars * 1.2)`.
pub fn estimate_tokens(text: &str) -> usize {
    let chars = text.chars().count();
    (chars * 6 + 4) / 5
}

/// Approximate number of characters that fit in `budget` tokens, with a 10%
/// safety margin.
pub fn char_limit(budget: usize) -> usize {
    // budget / 1.2 * 0.9
    budget * 3 / 4
}

/// Fit `text` into `budget` tokens.
///
/// Text that already fits is returned unchanged. Otherwise the head (~60%)
/// and tail (~30%) of the character allowance are kept around [`ELISION`], so
/// both the setup and the most recent content survive.
pub fn truncate_to_budget(text: &str, budget: usize) -> Cow<'_, str> {
    if estimate_tokens(text) <= budget {
        return Cow::Borrowed(text);
    }

    let limit = char_limit(budget);
    let total = text.chars().count();
    if total <= limit {
        return Cow::Borrowed(text);
    }

    let head_len = limit * 6 / 10;
    let tail_len = limit * 3 / 10;
    if head_len == 0 {
        return Cow::Owned(String::new());
    }

    let head: String = text.chars().take(head_len).collect();
    let tail: String = text.chars().skip(total - tail_len).collect();
    Cow::Owned(format!("{}{}{}", head.trim_end(), ELISION, tail.trim_start()))
}

/// Cut `text` to at most `max_chars` characters, marking the cut.
pub fn clip_chars(text: &str, max_chars: usize) -> Cow<'_, str> {
    if text.chars().count() <= max_chars {
        return Cow::Borrowed(text);
    }
    let cut: String = text.chars().take(max_chars).collect();
    Cow::Owned(format!("{}…", cut.trim_end()))
}
