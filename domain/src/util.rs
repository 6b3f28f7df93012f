//! Shared utility functions.

/// Truncate a string to approximately `max_bytes` without splitting a UTF-8
/// character boundary.
///
/// Returns a sub-slice of the original string. If the string is shorter than
/// `max_bytes`, the entire string is returned unchanged.
pub fn truncate_str(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Single-line preview of untrusted text for log output.
///
/// Line breaks are escaped so one log record stays on one line, and the
/// result is cut at `max_bytes` with a trailing `…` when shortened.
pub fn log_preview(s: &str, max_bytes: usize) -> String {
    let cut = truncate_str(s, max_bytes);
    let mut out = cut.replace('\r', "\\r").replace('\n', "\\n");
    if cut.len() < s.len() {
        out.push('…');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_no_op_when_short() {
        assert_eq!(truncate_str("hi", 10), "hi");
    }

    #[test]
    fn truncate_multibyte_boundary() {
        let s = "あのね"; // 3 bytes per char
        assert_eq!(truncate_str(s, 4), "あ");
        assert_eq!(truncate_str(s, 6), "あの");
    }

    #[test]
    fn preview_escapes_newlines() {
        assert_eq!(log_preview("{\"a\":1}\n", 64), "{\"a\":1}\\n");
    }

    #[test]
    fn preview_marks_truncation() {
        assert_eq!(log_preview("abcdef", 3), "abc…");
        assert_eq!(log_preview("abc", 3), "abc");
    }
}
