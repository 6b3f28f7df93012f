//! Conversation title derived from the first prompt.

/// Titles longer than this many characters are shortened.
pub const TITLE_MAX_CHARS: usize = 50;

/// Derive a conversation title from its first prompt.
///
/// Prompts of at most [`TITLE_MAX_CHARS`] characters are used as-is;
/// longer ones keep their first [`TITLE_MAX_CHARS`] characters followed by
/// `...`.
pub fn derive_title(prompt: &str) -> String {
    match prompt.char_indices().nth(TITLE_MAX_CHARS) {
        Some((cut, _)) => format!("{}...", &prompt[..cut]),
        None => prompt.to_string(),
    }
}
