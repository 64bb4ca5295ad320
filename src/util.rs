// src/util.rs — Shared utility functions

/// Shorten `s` to at most `max_chars` characters for log lines and error
/// messages, marking the cut with an ellipsis. Never splits a character.
pub fn preview(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}…", &s[..end]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_short() {
        assert_eq!(preview("hello", 10), "hello");
    }

    #[test]
    fn test_preview_exact() {
        assert_eq!(preview("hello", 5), "hello");
    }

    #[test]
    fn test_preview_long() {
        assert_eq!(preview("hello world", 5), "hello…");
    }

    #[test]
    fn test_preview_multibyte() {
        assert_eq!(preview("привет мир", 6), "привет…");
    }

    #[test]
    fn test_preview_empty() {
        assert_eq!(preview("", 5), "");
    }
}
