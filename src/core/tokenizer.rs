//! Quote-aware argument tokenizer.
//!
//! Tokens are separated by whitespace. A double-quoted span is a single token
//! with the quotes stripped. There are no escape sequences: the first `"`
//! after an opening quote always closes it.

use super::TokenizeError;

/// Split a raw argument string into tokens.
///
/// # Examples
///
/// ```
/// use kimiko::core::tokenize;
///
/// let tokens = tokenize(r#""this is an event" 23:35:20 yes"#).unwrap();
/// assert_eq!(tokens, vec!["this is an event", "23:35:20", "yes"]);
///
/// // A quote also ends a bare token
/// assert_eq!(tokenize(r#"a"b c""#).unwrap(), vec!["a", "b c"]);
/// ```
pub fn tokenize(input: &str) -> Result<Vec<&str>, TokenizeError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        match c {
            c if c.is_whitespace() => continue,

            '"' => {
                let content_start = start + 1;
                let end = chars
                    .by_ref()
                    .find(|&(_, ch)| ch == '"')
                    .map(|(i, _)| i)
                    .ok_or(TokenizeError::UnterminatedString { position: start })?;

                tokens.push(&input[content_start..end]);
            }

            _ => {
                let mut end = start + c.len_utf8();

                while let Some(&(i, ch)) = chars.peek() {
                    if ch.is_whitespace() || ch == '"' {
                        break;
                    }
                    end = i + ch.len_utf8();
                    chars.next();
                }

                tokens.push(&input[start..end]);
            }
        }
    }

    Ok(tokens)
}

/// Split off the first whitespace-delimited token.
///
/// Returns the token and the remainder with its leading whitespace removed,
/// or `None` when the input is blank. Quotes are not interpreted; this is used
/// for command and sub-command labels.
pub fn split_label(input: &str) -> Option<(&str, &str)> {
    let trimmed = input.trim_start();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.find(char::is_whitespace) {
        Some(end) => Some((&trimmed[..end], trimmed[end..].trim_start())),
        None => Some((trimmed, "")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_simple() {
        assert_eq!(tokenize("hello world").unwrap(), vec!["hello", "world"]);
    }

    #[test]
    fn test_tokenize_double_quotes() {
        assert_eq!(tokenize(r#"say "hello world""#).unwrap(), vec!["say", "hello world"]);
    }

    #[test]
    fn test_tokenize_single_quotes_are_plain() {
        assert_eq!(tokenize("'hello world'").unwrap(), vec!["'hello", "world'"]);
    }

    #[test]
    fn test_tokenize_empty_quotes() {
        assert_eq!(tokenize(r#"a "" b"#).unwrap(), vec!["a", "", "b"]);
    }

    #[test]
    fn test_tokenize_no_escapes() {
        // The backslash is kept and the quote after it closes the string
        assert_eq!(tokenize(r#""a\" b"#).unwrap(), vec![r"a\", "b"]);
    }

    #[test]
    fn test_tokenize_unterminated_string() {
        assert_eq!(
            tokenize(r#"ok "never closed"#),
            Err(TokenizeError::UnterminatedString { position: 3 })
        );
    }

    #[test]
    fn test_tokenize_extra_whitespace() {
        assert_eq!(tokenize("  a \t  b\n c  ").unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_tokenize_empty() {
        assert!(tokenize("").unwrap().is_empty());
        assert!(tokenize("   \t\n  ").unwrap().is_empty());
    }

    #[test]
    fn test_tokenize_unicode() {
        assert_eq!(tokenize(r#"héllo "wörld ✓""#).unwrap(), vec!["héllo", "wörld ✓"]);
    }

    #[test]
    fn test_split_label() {
        assert_eq!(split_label("remindme a b"), Some(("remindme", "a b")));
        assert_eq!(split_label("  remindme   a b"), Some(("remindme", "a b")));
        assert_eq!(split_label("remindme"), Some(("remindme", "")));
        assert_eq!(split_label("   "), None);
        assert_eq!(split_label(""), None);
    }
}
