//! Plain-text helpers over scene content.
//!
//! Scene content is stored as lightweight HTML. Summaries, word counts,
//! search context and Markdown export all work on the tag-stripped text.

/// Maximum summary length in characters, before the ellipsis.
pub const SUMMARY_LENGTH: usize = 200;

/// Remove everything between `<` and the next `>`.
///
/// An unterminated `<` drops the rest of the input.
pub fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

/// Decode the handful of HTML entities an editor emits.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Count words: maximal runs of ASCII letters, apostrophes and hyphens.
///
/// A run must contain at least one letter, so a bare `-` separator is not
/// a word.
pub fn word_count(text: &str) -> i32 {
    let mut count = 0;
    let mut in_word = false;
    let mut has_letter = false;
    for c in text.chars() {
        if c.is_ascii_alphabetic() || c == '\'' || c == '-' {
            in_word = true;
            has_letter |= c.is_ascii_alphabetic();
        } else {
            if in_word && has_letter {
                count += 1;
            }
            in_word = false;
            has_letter = false;
        }
    }
    if in_word && has_letter {
        count += 1;
    }
    count
}

/// Word count of an HTML fragment.
pub fn content_word_count(content: &str) -> i32 {
    word_count(&decode_entities(&strip_tags(content)))
}

/// Keep the first `max` characters, appending `...` when anything was cut.
pub fn limit(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => format!("{}...", text[..byte_idx].trim_end()),
        None => text.to_string(),
    }
}

/// Summary of an HTML fragment: the first [`SUMMARY_LENGTH`] characters of
/// the stripped text, cut back to the last space, with `...` when truncated.
pub fn summarize(content: &str) -> String {
    let text = strip_tags(content);
    let summary = match text.char_indices().nth(SUMMARY_LENGTH) {
        Some((byte_idx, _)) => {
            let head = &text[..byte_idx];
            let head = match head.rfind(' ') {
                Some(space) => &head[..space],
                None => head,
            };
            format!("{head}...")
        }
        None => text,
    };
    summary.trim().to_string()
}

/// Uppercase the first character.
pub fn ucfirst(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
