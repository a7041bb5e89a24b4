//! Splitting a raw console line into argument tokens.
//!
//! Tokens are raw byte strings: keys and values stored in the database are not
//! required to be UTF-8, so nothing here decodes the input.

/// A single console argument.
pub type Token = Vec<u8>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexingState {
    None,
    Word,
    Quote,
    Escaped,
}

struct LexingFSM<'a> {
    input: &'a [u8],
    state: LexingState,
    buffer: Vec<u8>,
}

impl<'a> LexingFSM<'a> {
    fn new(input: &'a [u8]) -> Self {
        LexingFSM {
            input,
            state: LexingState::None,
            buffer: Vec::new(),
        }
    }

    /// Runs the machine over the whole input.
    ///
    /// Never fails: a quoted region that is still open at end of input is
    /// dropped, while a bare word is flushed.
    fn make_tokens(mut self) -> Vec<Token> {
        let mut out = Vec::new();

        for &b in self.input {
            match self.state {
                LexingState::None => self.handle_none(b),
                LexingState::Word => self.handle_word(b, &mut out),
                LexingState::Quote => self.handle_quote(b, &mut out),
                LexingState::Escaped => {
                    self.buffer.push(b);
                    self.state = LexingState::Quote;
                }
            }
        }

        if self.state == LexingState::Word {
            out.push(self.buffer);
        }
        out
    }

    fn handle_none(&mut self, b: u8) {
        if is_quote(b) {
            self.state = LexingState::Quote;
        } else if !is_whitespace(b) {
            self.buffer.push(b);
            self.state = LexingState::Word;
        }
    }

    fn handle_word(&mut self, b: u8, out: &mut Vec<Token>) {
        if is_whitespace(b) {
            out.push(std::mem::take(&mut self.buffer));
            self.state = LexingState::None;
        } else {
            self.buffer.push(b);
        }
    }

    // Any quote byte closes the region, whichever one opened it.
    fn handle_quote(&mut self, b: u8, out: &mut Vec<Token>) {
        match b {
            b'\\' => self.state = LexingState::Escaped,
            b if is_quote(b) => {
                out.push(std::mem::take(&mut self.buffer));
                self.state = LexingState::None;
            }
            b => self.buffer.push(b),
        }
    }
}

/// ASCII whitespace including vertical tab. Bytes above 0x7f are never
/// separators so multi-byte UTF-8 sequences stay intact.
fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\x0b' | b'\x0c' | b'\r')
}

fn is_quote(b: u8) -> bool {
    matches!(b, b'"' | b'\'' | b'`')
}

/// Splits a console line into tokens.
///
/// Whitespace separates tokens outside of quotes. `"`, `'` and `` ` `` open a
/// quoted region in which whitespace is kept and a backslash makes the next
/// byte literal. Quoted regions may produce empty tokens (`""`).
///
/// Only ASCII whitespace and vertical tab separate tokens. The single bytes
/// 0x85 (NEL) and 0xA0 (NBSP) are Unicode spaces but are kept inside words,
/// so a line that relies on them as separators tokenizes differently.
pub fn split_into_tokens(line: &[u8]) -> Vec<Token> {
    LexingFSM::new(line).make_tokens()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(line: &str) -> Vec<String> {
        split_into_tokens(line.as_bytes())
            .into_iter()
            .map(|t| String::from_utf8(t).unwrap())
            .collect()
    }

    #[test]
    fn test_plain_words() {
        assert_eq!(tokens("get foo"), vec!["get", "foo"]);
        assert_eq!(tokens("  get \t foo  \n"), vec!["get", "foo"]);
    }

    #[test]
    fn test_double_quoted_keeps_whitespace() {
        assert_eq!(tokens(r#"put "a b" c"#), vec!["put", "a b", "c"]);
    }

    #[test]
    fn test_escaped_quote_inside_quotes() {
        assert_eq!(tokens(r"put 'a\'b' c"), vec!["put", "a'b", "c"]);
        assert_eq!(tokens(r#"put "a\\b" c"#), vec!["put", r"a\b", "c"]);
    }

    #[test]
    fn test_any_quote_closes_region() {
        assert_eq!(tokens(r#"put "abc' d"#), vec!["put", "abc", "d"]);
        assert_eq!(tokens("put `x\" y"), vec!["put", "x", "y"]);
    }

    #[test]
    fn test_empty_quoted_token() {
        assert_eq!(tokens(r#"put k """#), vec!["put", "k", ""]);
    }

    #[test]
    fn test_unterminated_quote_is_dropped() {
        assert_eq!(tokens(r#"put k "never closed"#), vec!["put", "k"]);
        assert_eq!(tokens(r#"get "k\"#), vec!["get"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(split_into_tokens(b"").is_empty());
        assert!(split_into_tokens(b" \t\r\n").is_empty());
    }

    #[test]
    fn test_backslash_outside_quotes_is_literal() {
        assert_eq!(tokens(r"get a\b"), vec!["get", r"a\b"]);
    }

    #[test]
    fn test_non_utf8_bytes_survive() {
        let out = split_into_tokens(b"get \xff\xa0\x85");
        assert_eq!(out, vec![b"get".to_vec(), vec![0xff, 0xa0, 0x85]]);
    }
}
