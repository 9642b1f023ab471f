//! Single-pass scanners for `{key}` and `{{...}}` tokens.
//!
//! Braces and key characters are ASCII, so every index produced here falls
//! on a UTF-8 character boundary even when the surrounding text is CJK.

use std::ops::Range;

/// End offset (exclusive) of a `{key}` placeholder starting at `start`.
fn placeholder_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut end = start + 1;
    while end < bytes.len() && bytes[end].is_ascii_alphanumeric() {
        end += 1;
    }
    (end > start + 1 && end < bytes.len() && bytes[end] == b'}').then_some(end + 1)
}

/// Replace every `{key}` placeholder for which `lookup` returns a value.
///
/// The key is the exact text between the braces, so `{a1}` is never
/// matched by a lookup for `a`. Placeholders the lookup declines are kept
/// verbatim.
pub(crate) fn replace_placeholders<F>(text: &str, mut lookup: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'{' {
            if let Some(end) = placeholder_end(bytes, i) {
                if let Some(value) = lookup(&text[i + 1..end - 1]) {
                    out.push_str(&text[last..i]);
                    out.push_str(&value);
                    last = end;
                }
                i = end;
                continue;
            }
        }
        i += 1;
    }

    out.push_str(&text[last..]);
    out
}

/// End offset (exclusive) of a `{{...}}` expression starting at `start`.
///
/// The body may contain `{key}` placeholders but no other braces. An empty
/// body is not an expression.
fn expression_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut in_placeholder = false;
    let mut j = start + 2;

    while j < bytes.len() {
        match bytes[j] {
            b'{' if in_placeholder => return None,
            b'{' => in_placeholder = true,
            b'}' if in_placeholder => in_placeholder = false,
            b'}' => {
                return (j > start + 2 && bytes.get(j + 1) == Some(&b'}')).then_some(j + 2);
            }
            _ => {}
        }
        j += 1;
    }
    None
}

/// Byte ranges of all `{{...}}` expressions, left to right, non-overlapping.
pub(crate) fn expression_spans(text: &str) -> Vec<Range<usize>> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut i = 0;

    while i + 1 < bytes.len() {
        if bytes[i] == b'{' && bytes[i + 1] == b'{' {
            if let Some(end) = expression_end(bytes, i) {
                spans.push(i..end);
                i = end;
                continue;
            }
        }
        i += 1;
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_ab(key: &str) -> Option<String> {
        match key {
            "a" => Some("1".to_string()),
            "a1" => Some("2".to_string()),
            _ => None,
        }
    }

    #[test]
    fn test_exact_key_match() {
        assert_eq!(replace_placeholders("{a} {a1} {a2}", lookup_ab), "1 2 {a2}");
    }

    #[test]
    fn test_non_key_braces_untouched() {
        assert_eq!(replace_placeholders("{ a } {} {a-b}", lookup_ab), "{ a } {} {a-b}");
        assert_eq!(replace_placeholders("{{{a}+{a1}}}", lookup_ab), "{{1+2}}");
        assert_eq!(replace_placeholders("unterminated {a", lookup_ab), "unterminated {a");
    }

    #[test]
    fn test_cjk_text() {
        assert_eq!(replace_placeholders("每年{a}美金", lookup_ab), "每年1美金");
    }

    #[test]
    fn test_expression_spans() {
        let text = "x {{1+2}} y {{{a}*3}} z";
        let spans = expression_spans(text);
        let raw: Vec<&str> = spans.iter().map(|r| &text[r.clone()]).collect();
        assert_eq!(raw, vec!["{{1+2}}", "{{{a}*3}}"]);
    }

    #[test]
    fn test_expression_spans_rejects_malformed() {
        assert!(expression_spans("{{}}").is_empty());
        assert!(expression_spans("{{1+2}").is_empty());
        assert!(expression_spans("{{1+2").is_empty());
        assert!(expression_spans("{a}").is_empty());
    }
}
