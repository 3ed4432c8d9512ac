//! Text tokenizer: a hand-rolled character scanner over the text
//! encoding's grammar.

use crate::error::{Error, Result};

/// One lexical token. Numeric and timestamp lexemes are carried raw; the
/// parser is responsible for classifying and converting them.
#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    Number(String),
    BinaryInt(String),
    HexInt(String),
    PosInf,
    NegInf,
    Timestamp(String),
    Symbol(String),
    QuotedSymbol(String),
    OperatorSymbol(String),
    ShortString(String),
    LongString(String),
    Dot,
    Comma,
    Colon,
    ColonColon,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LobOpen,
    LobClose,
    Eof,
}

const OPERATOR_CHARS: &str = "!#%&*+-/;<=>?@^`|~";

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_identifier_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

fn is_stop_char(c: char) -> bool {
    c.is_whitespace() || matches!(c, '(' | ')' | '{' | '}' | '[' | ']' | ',' | '"' | '\'' | ':')
}

/// A pull-tokenizer over an in-memory text stream. Position is tracked in
/// characters, not bytes, so error offsets line up with what a user would
/// count by eye.
pub struct Tokenizer {
    chars: Vec<char>,
    pos: usize,
    /// Set after a token with an unread payload (a long-form value the
    /// parser must consume before calling `next_token` again). The text
    /// grammar here has no such deferred-payload tokens, so this stays
    /// `false`; kept for symmetry with the binary reader's `Unfinished`
    /// state.
    unfinished: bool,
}

impl Tokenizer {
    pub fn new(input: &str) -> Self {
        let normalized: String = {
            let mut out = String::with_capacity(input.len());
            let mut it = input.chars().peekable();
            while let Some(c) = it.next() {
                if c == '\r' {
                    if it.peek() == Some(&'\n') {
                        it.next();
                    }
                    out.push('\n');
                } else {
                    out.push(c);
                }
            }
            out
        };
        Tokenizer {
            chars: normalized.chars().collect(),
            pos: 0,
            unfinished: false,
        }
    }

    pub fn offset(&self) -> usize {
        self.pos
    }

    pub fn is_unfinished(&self) -> bool {
        self.unfinished
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    /// Look `k` characters ahead (`k` in `1..=5`), without consuming.
    fn peek_n(&self, k: usize) -> Option<char> {
        self.chars.get(self.pos + k).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<()> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') if self.peek_n(1) == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                Some('/') if self.peek_n(1) == Some('*') => {
                    self.bump();
                    self.bump();
                    loop {
                        match self.peek() {
                            None => return Err(Error::UnexpectedEof { offset: self.pos }),
                            Some('*') if self.peek_n(1) == Some('/') => {
                                self.bump();
                                self.bump();
                                break;
                            }
                            Some(_) => {
                                self.bump();
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    /// Skip whitespace/comments and report the next character without
    /// consuming it. Used by the parser to classify a `{{ ... }}` lob's
    /// payload (clob vs. blob) before deciding how to read it — a blob's
    /// base64 text includes characters (`=`) the general token grammar
    /// does not recognize.
    pub fn peek_non_ws(&mut self) -> Result<Option<char>> {
        self.skip_whitespace_and_comments()?;
        Ok(self.peek())
    }

    /// Read a blob's raw base64 payload, stopping at (and consuming) the
    /// closing `}}`. Whitespace within the payload is skipped rather than
    /// included, matching the permissive layout real encoders use.
    pub fn read_blob_payload(&mut self) -> Result<String> {
        let mut out = String::new();
        loop {
            self.skip_whitespace_and_comments()?;
            match self.peek() {
                None => return Err(Error::UnexpectedEof { offset: self.pos }),
                Some('}') if self.peek_n(1) == Some('}') => {
                    self.pos += 2;
                    return Ok(out);
                }
                Some(c) => {
                    out.push(c);
                    self.bump();
                }
            }
        }
    }

    pub fn next_token(&mut self) -> Result<Token> {
        self.unfinished = false;
        self.skip_whitespace_and_comments()?;
        let Some(c) = self.peek() else {
            return Ok(Token::Eof);
        };

        match c {
            '(' => {
                self.bump();
                Ok(Token::LParen)
            }
            ')' => {
                self.bump();
                Ok(Token::RParen)
            }
            '[' => {
                self.bump();
                Ok(Token::LBracket)
            }
            ']' => {
                self.bump();
                Ok(Token::RBracket)
            }
            ',' => {
                self.bump();
                Ok(Token::Comma)
            }
            '.' => {
                self.bump();
                Ok(Token::Dot)
            }
            ':' => {
                self.bump();
                if self.peek() == Some(':') {
                    self.bump();
                    Ok(Token::ColonColon)
                } else {
                    Ok(Token::Colon)
                }
            }
            '{' => {
                self.bump();
                if self.peek() == Some('{') {
                    self.bump();
                    Ok(Token::LobOpen)
                } else {
                    Ok(Token::LBrace)
                }
            }
            '}' => {
                self.bump();
                if self.peek() == Some('}') {
                    self.bump();
                    Ok(Token::LobClose)
                } else {
                    Ok(Token::RBrace)
                }
            }
            '"' => self.read_short_string(),
            '\'' => {
                if self.peek_n(1) == Some('\'') && self.peek_n(2) == Some('\'') {
                    self.read_long_string()
                } else {
                    self.read_quoted_symbol()
                }
            }
            '+' if self.matches_keyword(1, "inf") && self.stop_after_keyword(1, 3) => {
                self.pos += 4;
                Ok(Token::PosInf)
            }
            '-' if self.matches_keyword(1, "inf") && self.stop_after_keyword(1, 3) => {
                self.pos += 4;
                Ok(Token::NegInf)
            }
            '0'..='9' => self.read_number_or_timestamp(None),
            '+' | '-' if self.peek_n(1).is_some_and(|n| n.is_ascii_digit()) => {
                let sign = self.bump();
                self.read_number_or_timestamp(sign)
            }
            c if is_identifier_start(c) => self.read_identifier(),
            c if OPERATOR_CHARS.contains(c) => self.read_operator_symbol(),
            c => Err(Error::UnexpectedRune { offset: self.pos, rune: c }),
        }
    }

    fn matches_keyword(&self, start: usize, kw: &str) -> bool {
        kw.chars()
            .enumerate()
            .all(|(i, c)| self.peek_n(start + i) == Some(c))
    }

    fn stop_after_keyword(&self, start: usize, kw_len: usize) -> bool {
        match self.peek_n(start + kw_len) {
            None => true,
            Some(c) => is_stop_char(c) || OPERATOR_CHARS.contains(c),
        }
    }

    fn read_identifier(&mut self) -> Result<Token> {
        let start = self.pos;
        while self.peek().is_some_and(is_identifier_continue) {
            self.bump();
        }
        Ok(Token::Symbol(self.chars[start..self.pos].iter().collect()))
    }

    fn read_operator_symbol(&mut self) -> Result<Token> {
        let start = self.pos;
        while self.peek().is_some_and(|c| OPERATOR_CHARS.contains(c)) {
            self.bump();
        }
        Ok(Token::OperatorSymbol(self.chars[start..self.pos].iter().collect()))
    }

    fn read_quoted_symbol(&mut self) -> Result<Token> {
        self.bump(); // opening '
        let text = self.read_escaped_run('\'', false)?;
        Ok(Token::QuotedSymbol(text))
    }

    fn read_short_string(&mut self) -> Result<Token> {
        self.bump(); // opening "
        let text = self.read_escaped_run('"', false)?;
        Ok(Token::ShortString(text))
    }

    fn read_long_string(&mut self) -> Result<Token> {
        let mut out = String::new();
        loop {
            self.pos += 3; // opening '''
            out.push_str(&self.read_escaped_run_triple()?);
            // Concatenation: skip whitespace/comments and look for another '''.
            let checkpoint = self.pos;
            self.skip_whitespace_and_comments()?;
            if self.peek() == Some('\'') && self.peek_n(1) == Some('\'') && self.peek_n(2) == Some('\'') {
                continue;
            }
            self.pos = checkpoint;
            break;
        }
        Ok(Token::LongString(out))
    }

    fn read_escaped_run_triple(&mut self) -> Result<String> {
        let mut out = String::new();
        loop {
            match self.peek() {
                None => return Err(Error::UnexpectedEof { offset: self.pos }),
                Some('\'') if self.peek_n(1) == Some('\'') && self.peek_n(2) == Some('\'') => {
                    self.pos += 3;
                    return Ok(out);
                }
                Some('\\') => {
                    if let Some(c) = self.read_escape()? {
                        out.push(c);
                    }
                }
                Some(c) => {
                    out.push(c);
                    self.bump();
                }
            }
        }
    }

    fn read_escaped_run(&mut self, quote: char, clob: bool) -> Result<String> {
        let mut out = String::new();
        loop {
            match self.peek() {
                None => return Err(Error::UnexpectedEof { offset: self.pos }),
                Some(c) if c == quote => {
                    self.bump();
                    return Ok(out);
                }
                Some('\n') => return Err(Error::UnexpectedRune { offset: self.pos, rune: '\n' }),
                Some('\\') => {
                    if let Some(c) = self.read_escape()? {
                        if clob && c as u32 > 0x7F {
                            return Err(Error::Syntax {
                                offset: self.pos,
                                cause: "clob escape widened an octet past 0x7F".into(),
                            });
                        }
                        out.push(c);
                    }
                }
                Some(c) => {
                    if clob && c as u32 > 0x7F {
                        return Err(Error::Syntax {
                            offset: self.pos,
                            cause: "clob octet exceeds 0x7F".into(),
                        });
                    }
                    out.push(c);
                    self.bump();
                }
            }
        }
    }

    /// Read one `\...` escape, having already peeked the backslash.
    /// Returns `None` for a line continuation (backslash-newline), which
    /// produces no output.
    fn read_escape(&mut self) -> Result<Option<char>> {
        self.bump(); // the backslash
        let offset = self.pos;
        let c = self.bump().ok_or(Error::UnexpectedEof { offset })?;
        Ok(Some(match c {
            '0' => '\0',
            'a' => '\x07',
            'b' => '\x08',
            't' => '\t',
            'n' => '\n',
            'f' => '\x0C',
            'r' => '\r',
            'v' => '\x0B',
            '?' => '?',
            '/' => '/',
            '\'' => '\'',
            '"' => '"',
            '\\' => '\\',
            '\n' => return Ok(None),
            'x' => {
                let hex = self.read_hex_digits(2, offset)?;
                char::from_u32(hex).ok_or(Error::Syntax {
                    offset,
                    cause: "invalid \\x escape".into(),
                })?
            }
            'u' => {
                let hex = self.read_hex_digits(4, offset)?;
                char::from_u32(hex).ok_or(Error::Syntax {
                    offset,
                    cause: "invalid \\u escape".into(),
                })?
            }
            'U' => {
                let hex = self.read_hex_digits(8, offset)?;
                char::from_u32(hex).ok_or(Error::Syntax {
                    offset,
                    cause: "invalid \\U escape".into(),
                })?
            }
            other => {
                return Err(Error::UnexpectedRune { offset, rune: other });
            }
        }))
    }

    fn read_hex_digits(&mut self, n: usize, offset: usize) -> Result<u32> {
        let mut v: u32 = 0;
        for _ in 0..n {
            let c = self.bump().ok_or(Error::UnexpectedEof { offset })?;
            let digit = c.to_digit(16).ok_or(Error::UnexpectedRune { offset, rune: c })?;
            v = v * 16 + digit;
        }
        Ok(v)
    }

    /// After a leading digit (and optional consumed sign), disambiguate
    /// binary/hex/timestamp/number using a four-character lookahead.
    fn read_number_or_timestamp(&mut self, sign: Option<char>) -> Result<Token> {
        let start = sign.map(|_| self.pos - 1).unwrap_or(self.pos);

        if self.peek() == Some('0') {
            match self.peek_n(1) {
                Some('b') | Some('B') => {
                    self.pos += 2;
                    self.read_radix_digits(|c| c == '0' || c == '1')?;
                    return Ok(Token::BinaryInt(self.chars[start..self.pos].iter().collect()));
                }
                Some('x') | Some('X') => {
                    self.pos += 2;
                    self.read_radix_digits(|c| c.is_ascii_hexdigit())?;
                    return Ok(Token::HexInt(self.chars[start..self.pos].iter().collect()));
                }
                _ => {}
            }
        }

        // Four digits followed by '-' or 'T' commits to a timestamp.
        let four_digits = (0..4).all(|i| self.peek_n(i).is_some_and(|c| c.is_ascii_digit()));
        if sign.is_none() && four_digits {
            match self.peek_n(4) {
                Some('-') | Some('T') => return self.read_timestamp(start),
                _ => {}
            }
        }

        while self.peek().is_some_and(|c| c.is_ascii_digit() || c == '_') {
            self.bump();
        }
        if self.peek() == Some('.') && self.peek_n(1).is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
            while self.peek().is_some_and(|c| c.is_ascii_digit() || c == '_') {
                self.bump();
            }
        } else if self.peek() == Some('.') {
            self.bump();
        }
        if matches!(self.peek(), Some('e') | Some('E') | Some('d') | Some('D')) {
            self.bump();
            if matches!(self.peek(), Some('+') | Some('-')) {
                self.bump();
            }
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
            }
        }
        Ok(Token::Number(self.chars[start..self.pos].iter().collect()))
    }

    fn read_radix_digits(&mut self, valid: impl Fn(char) -> bool) -> Result<()> {
        if self.peek() == Some('_') {
            return Err(Error::Syntax {
                offset: self.pos,
                cause: "'_' not allowed immediately after radix prefix".into(),
            });
        }
        let mut last_was_underscore = false;
        while let Some(c) = self.peek() {
            if c == '_' {
                if last_was_underscore {
                    return Err(Error::Syntax {
                        offset: self.pos,
                        cause: "adjacent '_' digit separators".into(),
                    });
                }
                last_was_underscore = true;
                self.bump();
            } else if valid(c) {
                last_was_underscore = false;
                self.bump();
            } else {
                break;
            }
        }
        Ok(())
    }

    fn read_timestamp(&mut self, start: usize) -> Result<Token> {
        // Consume the fixed grammar greedily; semantic validation happens
        // in the parser once the full lexeme is isolated.
        for _ in 0..4 {
            self.bump();
        }
        if self.peek() == Some('T') {
            self.bump();
            return Ok(Token::Timestamp(self.chars[start..self.pos].iter().collect()));
        }
        // -MM
        self.bump(); // '-'
        for _ in 0..2 {
            self.bump();
        }
        if self.peek() == Some('T') {
            self.bump();
            return Ok(Token::Timestamp(self.chars[start..self.pos].iter().collect()));
        }
        // -DD
        self.bump(); // '-'
        for _ in 0..2 {
            self.bump();
        }
        if self.peek() != Some('T') {
            return Ok(Token::Timestamp(self.chars[start..self.pos].iter().collect()));
        }
        self.bump();
        // Optional HH:MM(:SS(.fff*)?)?(±HH:MM|Z)?
        if self.peek().is_some_and(|c| c.is_ascii_digit()) {
            for _ in 0..2 {
                self.bump();
            }
            self.bump(); // ':'
            for _ in 0..2 {
                self.bump();
            }
            if self.peek() == Some(':') {
                self.bump();
                for _ in 0..2 {
                    self.bump();
                }
                if self.peek() == Some('.') {
                    self.bump();
                    while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                        self.bump();
                    }
                }
            }
            match self.peek() {
                Some('Z') => {
                    self.bump();
                }
                Some('+') | Some('-') => {
                    self.bump();
                    for _ in 0..2 {
                        self.bump();
                    }
                    self.bump(); // ':'
                    for _ in 0..2 {
                        self.bump();
                    }
                }
                _ => {}
            }
        }
        Ok(Token::Timestamp(self.chars[start..self.pos].iter().collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_punctuation() {
        let mut t = Tokenizer::new("{}[](),::.");
        assert_eq!(t.next_token().unwrap(), Token::LBrace);
        assert_eq!(t.next_token().unwrap(), Token::RBrace);
        assert_eq!(t.next_token().unwrap(), Token::LBracket);
        assert_eq!(t.next_token().unwrap(), Token::RBracket);
        assert_eq!(t.next_token().unwrap(), Token::LParen);
        assert_eq!(t.next_token().unwrap(), Token::RParen);
        assert_eq!(t.next_token().unwrap(), Token::Comma);
        assert_eq!(t.next_token().unwrap(), Token::ColonColon);
        assert_eq!(t.next_token().unwrap(), Token::Dot);
        assert_eq!(t.next_token().unwrap(), Token::Eof);
    }

    #[test]
    fn tokenizes_lob_delimiters() {
        let mut t = Tokenizer::new("{{ }}");
        assert_eq!(t.next_token().unwrap(), Token::LobOpen);
        assert_eq!(t.next_token().unwrap(), Token::LobClose);
    }

    #[test]
    fn skips_comments_and_whitespace() {
        let mut t = Tokenizer::new("// line\n/* block */  foo");
        assert_eq!(t.next_token().unwrap(), Token::Symbol("foo".into()));
    }

    #[test]
    fn distinguishes_binary_hex_and_plain_numbers() {
        let mut t = Tokenizer::new("0b101 0xFF 42");
        assert_eq!(t.next_token().unwrap(), Token::BinaryInt("0b101".into()));
        assert_eq!(t.next_token().unwrap(), Token::HexInt("0xFF".into()));
        assert_eq!(t.next_token().unwrap(), Token::Number("42".into()));
    }

    #[test]
    fn distinguishes_number_from_timestamp() {
        let mut t = Tokenizer::new("2023-11-09T 3.14");
        match t.next_token().unwrap() {
            Token::Timestamp(s) => assert!(s.starts_with("2023-11-09")),
            other => panic!("expected timestamp, got {other:?}"),
        }
        assert_eq!(t.next_token().unwrap(), Token::Number("3.14".into()));
    }

    #[test]
    fn reads_plus_and_minus_inf() {
        let mut t = Tokenizer::new("+inf -inf");
        assert_eq!(t.next_token().unwrap(), Token::PosInf);
        assert_eq!(t.next_token().unwrap(), Token::NegInf);
    }

    #[test]
    fn reads_quoted_symbol_and_short_string_with_escapes() {
        let mut t = Tokenizer::new(r#"'a\tb' "line1\nline2""#);
        assert_eq!(t.next_token().unwrap(), Token::QuotedSymbol("a\tb".into()));
        assert_eq!(t.next_token().unwrap(), Token::ShortString("line1\nline2".into()));
    }

    #[test]
    fn reads_triple_quoted_concatenation() {
        let mut t = Tokenizer::new("'''hello ''' '''world'''");
        assert_eq!(t.next_token().unwrap(), Token::LongString("hello world".into()));
    }

    #[test]
    fn reads_operator_symbol_for_sexp() {
        let mut t = Tokenizer::new("+- <=>");
        assert_eq!(t.next_token().unwrap(), Token::OperatorSymbol("+-".into()));
        assert_eq!(t.next_token().unwrap(), Token::OperatorSymbol("<=>".into()));
    }

    #[test]
    fn rejects_underscore_immediately_after_radix_prefix() {
        let mut t = Tokenizer::new("0x_FF");
        assert!(t.next_token().is_err());
    }
}
