//! LL(1) text parser: drives the tokenizer, one token of lookahead (two when
//! detecting an annotation's trailing `::`), building the [`Value`] tree.

use std::collections::VecDeque;

use num_bigint::BigInt;
use num_traits::Zero;

use crate::bigint::Int;
use crate::decimal::Decimal;
use crate::depth_tracking::DepthTracker;
use crate::error::{Error, Result};
use crate::symbol::SymbolToken;
use crate::timestamp::{Offset, Precision, Timestamp};
use crate::value::{Element, Value, ValueKind};

use super::tokenizer::{Token, Tokenizer};

pub struct Parser {
    tokenizer: Tokenizer,
    lookahead: VecDeque<Token>,
    depth: DepthTracker,
}

impl Parser {
    pub fn new(input: &str) -> Self {
        Parser {
            tokenizer: Tokenizer::new(input),
            lookahead: VecDeque::new(),
            depth: DepthTracker::new(),
        }
    }

    fn fill(&mut self, n: usize) -> Result<()> {
        while self.lookahead.len() <= n {
            let already_eof = matches!(self.lookahead.back(), Some(Token::Eof));
            if already_eof {
                break;
            }
            let tok = self.tokenizer.next_token()?;
            self.lookahead.push_back(tok);
        }
        Ok(())
    }

    fn peek(&mut self, n: usize) -> Result<Token> {
        self.fill(n)?;
        Ok(self.lookahead.get(n).cloned().unwrap_or(Token::Eof))
    }

    fn bump(&mut self) -> Result<Token> {
        self.fill(0)?;
        Ok(self.lookahead.pop_front().unwrap_or(Token::Eof))
    }

    fn expect(&mut self, want: &Token) -> Result<()> {
        let got = self.bump()?;
        if &got != want {
            return Err(Error::UnexpectedToken {
                offset: self.tokenizer.offset(),
                lexeme: format!("{got:?}"),
            });
        }
        Ok(())
    }

    /// Read the next top-level value, or `None` at end of input.
    pub fn next_value(&mut self) -> Result<Option<Element>> {
        if matches!(self.peek(0)?, Token::Eof) {
            return Ok(None);
        }
        Ok(Some(self.parse_value(false)?))
    }

    fn parse_value(&mut self, in_sexp: bool) -> Result<Element> {
        let mut annotations = Vec::new();
        loop {
            let is_annotation = matches!(self.peek(0)?, Token::Symbol(_) | Token::QuotedSymbol(_))
                && matches!(self.peek(1)?, Token::ColonColon);
            if !is_annotation {
                break;
            }
            let text = match self.bump()? {
                Token::Symbol(s) | Token::QuotedSymbol(s) => s,
                _ => unreachable!(),
            };
            self.expect(&Token::ColonColon)?;
            annotations.push(SymbolToken::from_text(text));
        }
        let value = self.parse_unannotated_value(in_sexp)?;
        Ok(value.into_element().with_annotations(annotations))
    }

    fn parse_unannotated_value(&mut self, in_sexp: bool) -> Result<Value> {
        let tok = self.bump()?;
        match tok {
            Token::Symbol(s) => self.parse_keyword_or_symbol(s),
            Token::QuotedSymbol(s) => Ok(Value::Symbol(SymbolToken::from_text(s))),
            Token::OperatorSymbol(s) => {
                if in_sexp {
                    Ok(Value::Symbol(SymbolToken::from_text(s)))
                } else {
                    Err(Error::UnexpectedToken {
                        offset: self.tokenizer.offset(),
                        lexeme: s,
                    })
                }
            }
            Token::ShortString(s) | Token::LongString(s) => Ok(Value::String(s)),
            Token::Number(s) => self.parse_number(&s),
            Token::BinaryInt(s) => parse_radix_literal(&s, 2),
            Token::HexInt(s) => parse_radix_literal(&s, 16),
            Token::PosInf => Ok(Value::Float(f64::INFINITY)),
            Token::NegInf => Ok(Value::Float(f64::NEG_INFINITY)),
            Token::Timestamp(s) => parse_timestamp_literal(&s).map(Value::Timestamp),
            Token::LParen => self.parse_sexp(),
            Token::LBracket => self.parse_list(),
            Token::LBrace => self.parse_struct(),
            Token::LobOpen => self.parse_lob(),
            other => Err(Error::UnexpectedToken {
                offset: self.tokenizer.offset(),
                lexeme: format!("{other:?}"),
            }),
        }
    }

    fn parse_keyword_or_symbol(&mut self, s: String) -> Result<Value> {
        match s.as_str() {
            "null" => {
                if matches!(self.peek(0)?, Token::Dot) {
                    self.bump()?;
                    let kind = match self.bump()? {
                        Token::Symbol(k) => keyword_to_kind(&k)?,
                        other => {
                            return Err(Error::UnexpectedToken {
                                offset: self.tokenizer.offset(),
                                lexeme: format!("{other:?}"),
                            })
                        }
                    };
                    Ok(Value::Null(kind))
                } else {
                    Ok(Value::Null(ValueKind::Null))
                }
            }
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            "nan" => Ok(Value::Float(f64::NAN)),
            _ => Ok(Value::Symbol(SymbolToken::from_text(s))),
        }
    }

    fn parse_number(&self, s: &str) -> Result<Value> {
        let lower = s.to_ascii_lowercase();
        if lower.contains('e') {
            let cleaned: String = s.chars().filter(|&c| c != '_').collect();
            let f: f64 = cleaned.parse().map_err(|_| Error::Syntax {
                offset: 0,
                cause: format!("invalid float literal '{s}'"),
            })?;
            Ok(Value::Float(f))
        } else if lower.contains('d') || s.contains('.') {
            parse_decimal_literal(s)
        } else {
            let cleaned: String = s.chars().filter(|&c| c != '_').collect();
            let big: BigInt = cleaned.parse().map_err(|_| Error::Syntax {
                offset: 0,
                cause: format!("invalid integer literal '{s}'"),
            })?;
            Ok(Value::Int(Int::from(big)))
        }
    }

    fn parse_sexp(&mut self) -> Result<Value> {
        self.depth.step_in()?;
        let mut items = Vec::new();
        loop {
            if matches!(self.peek(0)?, Token::RParen) {
                self.bump()?;
                break;
            }
            items.push(self.parse_value(true)?);
        }
        self.depth.step_out()?;
        Ok(Value::SExp(items))
    }

    fn parse_list(&mut self) -> Result<Value> {
        self.depth.step_in()?;
        let mut items = Vec::new();
        let mut expect_comma = false;
        loop {
            if matches!(self.peek(0)?, Token::RBracket) {
                self.bump()?;
                break;
            }
            if expect_comma {
                self.expect(&Token::Comma)?;
                if matches!(self.peek(0)?, Token::RBracket) {
                    return Err(Error::UnexpectedToken {
                        offset: self.tokenizer.offset(),
                        lexeme: "trailing comma".into(),
                    });
                }
            }
            items.push(self.parse_value(false)?);
            expect_comma = true;
        }
        self.depth.step_out()?;
        Ok(Value::List(items))
    }

    fn parse_struct(&mut self) -> Result<Value> {
        self.depth.step_in()?;
        let mut fields = Vec::new();
        let mut expect_comma = false;
        loop {
            if matches!(self.peek(0)?, Token::RBrace) {
                self.bump()?;
                break;
            }
            if expect_comma {
                self.expect(&Token::Comma)?;
                if matches!(self.peek(0)?, Token::RBrace) {
                    return Err(Error::UnexpectedToken {
                        offset: self.tokenizer.offset(),
                        lexeme: "trailing comma".into(),
                    });
                }
            }
            let field_name = match self.bump()? {
                Token::Symbol(s) | Token::QuotedSymbol(s) => SymbolToken::from_text(s),
                other => {
                    return Err(Error::UnexpectedToken {
                        offset: self.tokenizer.offset(),
                        lexeme: format!("{other:?}"),
                    })
                }
            };
            self.expect(&Token::Colon)?;
            let el = self.parse_value(false)?;
            fields.push((field_name, el));
            expect_comma = true;
        }
        self.depth.step_out()?;
        Ok(Value::Struct(fields))
    }

    /// A `{{ ... }}` lob: a quoted/triple-quoted string payload is a clob
    /// (bytes restricted to <= 0x7F); anything else is base64-encoded blob
    /// bytes. Classified by peeking the raw character, since a blob's
    /// base64 text (which may contain `=` padding) is read straight off
    /// the tokenizer rather than through `next_token`.
    fn parse_lob(&mut self) -> Result<Value> {
        debug_assert!(self.lookahead.is_empty());
        match self.tokenizer.peek_non_ws()? {
            Some('"') | Some('\'') => {
                let bytes = match self.bump()? {
                    Token::ShortString(s) | Token::LongString(s) => s.into_bytes(),
                    other => {
                        return Err(Error::UnexpectedToken {
                            offset: self.tokenizer.offset(),
                            lexeme: format!("{other:?}"),
                        })
                    }
                };
                if bytes.iter().any(|&b| b > 0x7F) {
                    return Err(Error::Syntax {
                        offset: self.tokenizer.offset(),
                        cause: "clob octet exceeds 0x7F".into(),
                    });
                }
                self.expect(&Token::LobClose)?;
                Ok(Value::Clob(bytes))
            }
            _ => {
                let text = self.tokenizer.read_blob_payload()?;
                let bytes = base64::Engine::decode(
                    &base64::engine::general_purpose::STANDARD,
                    text.trim(),
                )
                .map_err(|e| Error::Syntax {
                    offset: self.tokenizer.offset(),
                    cause: format!("invalid base64 blob: {e}"),
                })?;
                Ok(Value::Blob(bytes))
            }
        }
    }
}

fn keyword_to_kind(k: &str) -> Result<ValueKind> {
    Ok(match k {
        "null" => ValueKind::Null,
        "bool" => ValueKind::Bool,
        "int" => ValueKind::Int,
        "float" => ValueKind::Float,
        "decimal" => ValueKind::Decimal,
        "timestamp" => ValueKind::Timestamp,
        "symbol" => ValueKind::Symbol,
        "string" => ValueKind::String,
        "clob" => ValueKind::Clob,
        "blob" => ValueKind::Blob,
        "list" => ValueKind::List,
        "sexp" => ValueKind::SExp,
        "struct" => ValueKind::Struct,
        other => {
            return Err(Error::Syntax {
                offset: 0,
                cause: format!("unknown typed-null kind '{other}'"),
            })
        }
    })
}

fn parse_radix_literal(s: &str, radix: u32) -> Result<Value> {
    let (negative, rest) = match s.strip_prefix('-') {
        Some(r) => (true, r),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let digits = &rest[2..]; // skip 0b/0B/0x/0X
    let cleaned: String = digits.chars().filter(|&c| c != '_').collect();
    let mut big = BigInt::parse_bytes(cleaned.as_bytes(), radix).ok_or_else(|| Error::Syntax {
        offset: 0,
        cause: format!("invalid base-{radix} literal '{s}'"),
    })?;
    if negative {
        big = -big;
    }
    Ok(Value::Int(Int::from(big)))
}

/// Parse a decimal lexeme (`1.20`, `-0.`, `5d2`, `-0d0`) into coefficient +
/// exponent, preserving the negative-zero sentinel.
fn parse_decimal_literal(s: &str) -> Result<Value> {
    let cleaned: String = s.chars().filter(|&c| c != '_').collect();
    let lower = cleaned.to_ascii_lowercase();
    let (mantissa, exp_part) = match lower.find('d') {
        Some(idx) => (cleaned[..idx].to_string(), Some(cleaned[idx + 1..].to_string())),
        None => (cleaned.clone(), None),
    };
    let negative = mantissa.starts_with('-');
    let (int_part, frac_part) = match mantissa.split_once('.') {
        Some((i, f)) => (i.to_string(), f.to_string()),
        None => (mantissa.clone(), String::new()),
    };
    let digit_str: String = int_part
        .chars()
        .filter(|c| c.is_ascii_digit())
        .chain(frac_part.chars())
        .collect();
    let digit_str = if digit_str.is_empty() { "0".to_string() } else { digit_str };
    let mut coefficient: BigInt = digit_str.parse().map_err(|_| Error::Syntax {
        offset: 0,
        cause: format!("invalid decimal literal '{s}'"),
    })?;
    if negative {
        coefficient = -coefficient;
    }
    let extra_exp: i64 = match exp_part {
        Some(e) if !e.is_empty() => e.parse().map_err(|_| Error::Syntax {
            offset: 0,
            cause: format!("invalid decimal exponent in '{s}'"),
        })?,
        _ => 0,
    };
    let exponent = extra_exp - frac_part.len() as i64;
    if coefficient.is_zero() && negative {
        Ok(Value::Decimal(Decimal::negative_zero(exponent)))
    } else {
        Ok(Value::Decimal(Decimal::new(coefficient, exponent)))
    }
}

/// Parse a timestamp lexeme per the fixed grammar `YYYY(T | -MM(T |
/// -DD(T(HH:MM(:SS(.fff*)?)?( ±HH:MM | Z ))?)?))?`.
fn parse_timestamp_literal(s: &str) -> Result<Timestamp> {
    let chars: Vec<char> = s.chars().collect();
    let mut i = 0usize;

    fn read_digits(chars: &[char], i: &mut usize, n: usize) -> Result<u32> {
        let mut v = 0u32;
        for _ in 0..n {
            let c = *chars.get(*i).ok_or(Error::UnexpectedEof { offset: *i })?;
            let d = c.to_digit(10).ok_or(Error::UnexpectedRune { offset: *i, rune: c })?;
            v = v * 10 + d;
            *i += 1;
        }
        Ok(v)
    }

    let year = read_digits(&chars, &mut i, 4)? as u16;
    if chars.get(i) == Some(&'T') {
        return Timestamp::new(year, 1, 1, 0, 0, 0, 0, Precision::Year, Offset::Unknown);
    }
    i += 1; // '-'
    let month = read_digits(&chars, &mut i, 2)? as u8;
    if chars.get(i) == Some(&'T') {
        return Timestamp::new(year, month, 1, 0, 0, 0, 0, Precision::Month, Offset::Unknown);
    }
    i += 1; // '-'
    let day = read_digits(&chars, &mut i, 2)? as u8;
    if chars.get(i) != Some(&'T') || i + 1 >= chars.len() {
        return Timestamp::new(year, month, day, 0, 0, 0, 0, Precision::Day, Offset::Unknown);
    }
    i += 1; // 'T'

    let hour = read_digits(&chars, &mut i, 2)?;
    i += 1; // ':'
    let minute = read_digits(&chars, &mut i, 2)?;
    let mut second = 0u32;
    let mut fraction = 0u64;
    let mut precision = Precision::Minute;

    if chars.get(i) == Some(&':') {
        i += 1;
        second = read_digits(&chars, &mut i, 2)?;
        precision = Precision::Second;
        if chars.get(i) == Some(&'.') {
            i += 1;
            let start = i;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
            let frac_str: String = chars[start..i].iter().collect();
            let digits = frac_str.len().clamp(1, 9) as u8;
            fraction = frac_str.parse().unwrap_or(0);
            precision = Precision::Fractional(digits);
        }
    }

    let offset = match chars.get(i) {
        Some('Z') => Offset::Utc,
        Some('+') | Some('-') => {
            let negative = chars[i] == '-';
            i += 1;
            let oh = read_digits(&chars, &mut i, 2)?;
            i += 1; // ':'
            let om = read_digits(&chars, &mut i, 2)?;
            let total = (oh * 60 + om) as i32;
            if negative && total == 0 {
                Offset::Unknown
            } else if negative {
                Offset::Known(-total)
            } else {
                Offset::Known(total)
            }
        }
        _ => Offset::Unknown,
    };

    Timestamp::new(year, month, day, hour as u8, minute as u8, second as u8, fraction, precision, offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_one(input: &str) -> Value {
        let mut p = Parser::new(input);
        p.next_value().unwrap().unwrap().into_value()
    }

    #[test]
    fn parses_plain_int() {
        assert_eq!(parse_one("42"), Value::int(42));
        assert_eq!(parse_one("-7"), Value::int(-7));
    }

    #[test]
    fn parses_hex_and_binary() {
        assert_eq!(parse_one("0xFF"), Value::int(255));
        assert_eq!(parse_one("0b101"), Value::int(5));
    }

    #[test]
    fn parses_decimal_and_float() {
        match parse_one("1.20") {
            Value::Decimal(d) => assert_eq!(d.to_string(), "120d-2"),
            other => panic!("expected decimal, got {other:?}"),
        }
        match parse_one("1.5e0") {
            Value::Float(f) => assert_eq!(f, 1.5),
            other => panic!("expected float, got {other:?}"),
        }
    }

    #[test]
    fn parses_bool_and_null_keywords() {
        assert_eq!(parse_one("true"), Value::Bool(true));
        assert_eq!(parse_one("false"), Value::Bool(false));
        assert_eq!(parse_one("null"), Value::Null(ValueKind::Null));
        assert_eq!(parse_one("null.string"), Value::Null(ValueKind::String));
    }

    #[test]
    fn parses_plain_symbol_and_quoted_symbol() {
        assert_eq!(parse_one("foo"), Value::Symbol(SymbolToken::from_text("foo")));
        assert_eq!(parse_one("'has space'"), Value::Symbol(SymbolToken::from_text("has space")));
    }

    #[test]
    fn parses_short_string() {
        assert_eq!(parse_one(r#""hi""#), Value::String("hi".into()));
    }

    #[test]
    fn parses_list_and_rejects_trailing_comma() {
        assert_eq!(parse_one("[1, 2, 3]"), Value::List(vec![
            Value::int(1).into_element(),
            Value::int(2).into_element(),
            Value::int(3).into_element(),
        ]));
        let mut p = Parser::new("[1, 2,]");
        assert!(p.next_value().is_err());
    }

    #[test]
    fn parses_struct_with_field_names() {
        match parse_one(r#"{a: 1, b: "x"}"#) {
            Value::Struct(fields) => {
                assert_eq!(fields.len(), 2);
                assert_eq!(fields[0].0.text(), Some("a"));
                assert_eq!(fields[0].1.value(), &Value::int(1));
            }
            other => panic!("expected struct, got {other:?}"),
        }
    }

    #[test]
    fn parses_annotated_value() {
        let el = {
            let mut p = Parser::new("meters::5");
            p.next_value().unwrap().unwrap()
        };
        assert_eq!(el.annotations()[0].text(), Some("meters"));
        assert_eq!(el.value(), &Value::int(5));
    }

    #[test]
    fn parses_sexp_with_operator_symbol() {
        match parse_one("(+ 1 2)") {
            Value::SExp(items) => {
                assert_eq!(items[0].value(), &Value::Symbol(SymbolToken::from_text("+")));
            }
            other => panic!("expected sexp, got {other:?}"),
        }
    }

    #[test]
    fn rejects_operator_symbol_outside_sexp() {
        let mut p = Parser::new("+");
        assert!(p.next_value().is_err());
    }

    #[test]
    fn parses_timestamp_year_precision() {
        match parse_one("2019T") {
            Value::Timestamp(ts) => assert_eq!(ts.precision(), Precision::Year),
            other => panic!("expected timestamp, got {other:?}"),
        }
    }

    #[test]
    fn parses_pos_and_neg_inf() {
        assert_eq!(parse_one("+inf"), Value::Float(f64::INFINITY));
        assert_eq!(parse_one("-inf"), Value::Float(f64::NEG_INFINITY));
    }

    #[test]
    fn parses_clob() {
        assert_eq!(parse_one(r#"{{ "clob text" }}"#), Value::Clob(b"clob text".to_vec()));
    }

    #[test]
    fn parses_blob_with_padding() {
        // base64 for "hi" is "aGk=".
        assert_eq!(parse_one("{{aGk=}}"), Value::Blob(b"hi".to_vec()));
    }

    #[test]
    fn parses_empty_blob() {
        assert_eq!(parse_one("{{}}"), Value::Blob(Vec::new()));
    }

    #[test]
    fn rejects_nesting_beyond_max_depth() {
        use crate::depth_tracking::MAX_DEPTH;
        let input = format!("{}1{}", "[".repeat(MAX_DEPTH + 1), "]".repeat(MAX_DEPTH + 1));
        let mut p = Parser::new(&input);
        assert!(p.next_value().is_err());
    }

    #[test]
    fn accepts_nesting_up_to_max_depth() {
        use crate::depth_tracking::MAX_DEPTH;
        let input = format!("{}1{}", "[".repeat(MAX_DEPTH), "]".repeat(MAX_DEPTH));
        let mut p = Parser::new(&input);
        assert!(p.next_value().unwrap().is_some());
    }
}
