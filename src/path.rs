//! Path-expression parsing for variable references.
//!
//! Template variable references are dotted/slashed property paths:
//! `user.address.city` and `user/address/city` are equivalent. A segment
//! wrapped in brackets is kept as one atomic token even when it contains
//! separator characters, which is how templates index into sequences
//! (`items.[3]`) and reach properties whose names are not identifiers
//! (`config.[my.key]`).
//!
//! Parsing is a pure function over the input string: deterministic, no shared
//! state, safe to call from concurrent renders and cheap enough that callers
//! memoize at their own discretion.

/// Both Mustache (`.`) and Handlebars (`/`) separators are accepted.
const SEPARATORS: [char; 2] = ['.', '/'];

/// Split a path expression into its segments.
///
/// Bracketed segments (`[...]`) survive as single tokens; separators inside
/// them are not split points. Empty input yields a one-element sequence so
/// callers can always index segment zero.
///
/// # Examples
///
/// ```rust
/// use scopestack::path::parse;
///
/// assert_eq!(parse("a.b.c"), vec!["a", "b", "c"]);
/// assert_eq!(parse("a/[b.c]/d"), vec!["a", "[b.c]", "d"]);
/// assert_eq!(parse("items.[0]"), vec!["items", "[0]"]);
/// ```
#[must_use]
pub fn parse(path: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let bytes = path.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        let ch = bytes[i] as char;
        if SEPARATORS.contains(&ch) {
            i += 1;
            continue;
        }
        if ch == '[' {
            if let Some(close) = path[i..].find(']') {
                segments.push(path[i..=i + close].to_string());
                i += close + 1;
                continue;
            }
            // Unterminated bracket: fall through and treat it as a plain run.
        }
        let start = i;
        while i < bytes.len() && !SEPARATORS.contains(&(bytes[i] as char)) {
            i += 1;
        }
        segments.push(path[start..i].to_string());
    }

    if segments.is_empty() {
        segments.push(path.to_string());
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_segment() {
        assert_eq!(parse("name"), vec!["name"]);
    }

    #[test]
    fn test_parse_dotted_path() {
        assert_eq!(parse("user.address.city"), vec!["user", "address", "city"]);
    }

    #[test]
    fn test_parse_slash_separator() {
        assert_eq!(parse("user/address/city"), vec!["user", "address", "city"]);
    }

    #[test]
    fn test_parse_mixed_separators() {
        assert_eq!(parse("user.address/city"), vec!["user", "address", "city"]);
    }

    #[test]
    fn test_parse_bracketed_index() {
        assert_eq!(parse("items.[3]"), vec!["items", "[3]"]);
    }

    #[test]
    fn test_parse_bracket_preserves_separators() {
        assert_eq!(parse("config.[my.key].value"), vec!["config", "[my.key]", "value"]);
        assert_eq!(parse("a/[b/c]/d"), vec!["a", "[b/c]", "d"]);
    }

    #[test]
    fn test_parse_empty_input_yields_one_segment() {
        assert_eq!(parse(""), vec![""]);
    }

    #[test]
    fn test_parse_separators_only_yields_one_segment() {
        // Degenerate input; callers still get something indexable.
        assert_eq!(parse("."), vec!["."]);
    }

    #[test]
    fn test_parse_leading_separator_dropped() {
        assert_eq!(parse(".city"), vec!["city"]);
        assert_eq!(parse("/city"), vec!["city"]);
    }

    #[test]
    fn test_parse_unterminated_bracket_is_plain_run() {
        assert_eq!(parse("a.[b.c"), vec!["a", "[b", "c"]);
    }

    #[test]
    fn test_parse_inline_bracket_stays_in_segment() {
        // Brackets only start an atomic token at a segment boundary.
        assert_eq!(parse("a[0].b"), vec!["a[0]", "b"]);
    }

    #[test]
    fn test_parse_is_deterministic() {
        let first = parse("a.[x.y].b");
        let second = parse("a.[x.y].b");
        assert_eq!(first, second);
    }
}
