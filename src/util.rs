// src/util.rs — Shared string helpers for command output

/// Longest prefix of `s` of at most `max_len` bytes (UTF-8 safe).
pub fn truncate_str(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        s
    } else {
        let mut end = max_len;
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        &s[..end]
    }
}

/// Longest suffix of `s` of at most `max_len` bytes (UTF-8 safe).
///
/// Compiler and tool diagnostics put the useful part last.
pub fn tail_str(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        s
    } else {
        let mut start = s.len() - max_len;
        while start < s.len() && !s.is_char_boundary(start) {
            start += 1;
        }
        &s[start..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short() {
        assert_eq!(truncate_str("hello", 10), "hello");
    }

    #[test]
    fn test_truncate_long() {
        assert_eq!(truncate_str("hello world", 5), "hello");
    }

    #[test]
    fn test_truncate_multibyte() {
        // "café" is 5 bytes; cutting at 4 must not split "é"
        assert_eq!(truncate_str("café", 4), "caf");
    }

    #[test]
    fn test_tail_keeps_end() {
        assert_eq!(tail_str("error: line 1\nerror: line 2", 13), "error: line 2");
        assert_eq!(tail_str("abc", 10), "abc");
        assert_eq!(tail_str("abc", 0), "");
    }

    #[test]
    fn test_tail_multibyte() {
        // "é" is 2 bytes; a cut inside it moves forward
        assert_eq!(tail_str("éx", 2), "x");
        assert_eq!(tail_str("xé", 2), "é");
    }
}
