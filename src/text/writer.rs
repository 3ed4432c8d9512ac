//! The text writer.
//!
//! Mirrors the binary writer's incremental, event-based API — the same
//! `field_name`/`annotation`/`write_*`/`begin_*`/`end_*`/`finish` surface —
//! so a caller can target either encoding through (nearly) the same call
//! sequence. What differs is purely how an atom is rendered: text instead of
//! tag bytes, with a pretty or compact layout chosen at construction.

use std::fmt::Write as _;

use crate::decimal::Decimal;
use crate::depth_tracking::DepthTracker;
use crate::error::{Error, Result};
use crate::symbol::SymbolToken;
use crate::timestamp::Timestamp;
use crate::value::ValueKind;

/// Characters accepted in an unquoted operator symbol inside an s-expression
/// (must track the tokenizer's own set).
const OPERATOR_CHARS: &str = "!#%&*+-/;<=>?@^`|~";

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_identifier_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

/// Whether `s` needs `'single quotes'` to round-trip as a symbol: empty,
/// a reserved keyword, `$<digits>` (collides with an ID reference), or
/// containing a character outside the bare-identifier set. `allow_operator`
/// additionally lets an all-operator-character symbol (valid only inside an
/// s-expression) through unquoted.
fn needs_quoting(s: &str, allow_operator: bool) -> bool {
    if s.is_empty() {
        return true;
    }
    if matches!(s, "null" | "true" | "false" | "nan") {
        return true;
    }
    if s.len() > 1 && s.starts_with('$') && s[1..].bytes().all(|b| b.is_ascii_digit()) {
        return true;
    }
    if allow_operator && s.chars().all(|c| OPERATOR_CHARS.contains(c)) {
        return false;
    }
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if is_identifier_start(c) => {}
        _ => return true,
    }
    !chars.all(is_identifier_continue)
}

/// Append `s`'s escaped form (no surrounding quotes) to `out`, using the
/// same escape table the tokenizer recognizes on the way in.
fn escape_into(out: &mut String, s: &str, quote: char) {
    for c in s.chars() {
        match c {
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            '\\' => out.push_str("\\\\"),
            '\0' => out.push_str("\\0"),
            '\x07' => out.push_str("\\a"),
            '\x08' => out.push_str("\\b"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\x0C' => out.push_str("\\f"),
            '\r' => out.push_str("\\r"),
            '\x0B' => out.push_str("\\v"),
            c if (c as u32) < 0x20 || c as u32 == 0x7F => {
                let _ = write!(out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
}

fn format_float(v: f64) -> String {
    if v.is_nan() {
        return "nan".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "+inf".to_string() } else { "-inf".to_string() };
    }
    if v == 0.0 {
        return if v.is_sign_negative() { "-0e0".to_string() } else { "0e0".to_string() };
    }
    // `{:e}` always carries an explicit exponent, which is what
    // distinguishes a float lexeme from a decimal one on the way back in.
    format!("{v:e}")
}

fn format_decimal(d: &Decimal) -> String {
    let sign = if d.is_negative_zero() { "-" } else { "" };
    if d.exponent() == 0 {
        format!("{sign}{}.", d.coefficient())
    } else {
        format!("{sign}{}d{}", d.coefficient(), d.exponent())
    }
}

fn null_keyword(kind: ValueKind) -> &'static str {
    match kind {
        ValueKind::Null => "null",
        ValueKind::Bool => "bool",
        ValueKind::Int => "int",
        ValueKind::Float => "float",
        ValueKind::Decimal => "decimal",
        ValueKind::Timestamp => "timestamp",
        ValueKind::Symbol => "symbol",
        ValueKind::String => "string",
        ValueKind::Clob => "clob",
        ValueKind::Blob => "blob",
        ValueKind::List => "list",
        ValueKind::SExp => "sexp",
        ValueKind::Struct => "struct",
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Kind {
    List,
    SExp,
    Struct,
}

struct Frame {
    kind: Kind,
    first: bool,
}

/// Constructs a [`TextWriter`] with pretty or compact layout. Compact
/// (the default) is the only mode a stream needs to round-trip; pretty
/// exists for humans reading the output.
pub struct TextWriterBuilder {
    pretty: bool,
}

impl TextWriterBuilder {
    pub fn new() -> Self {
        TextWriterBuilder { pretty: false }
    }

    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn build(self) -> TextWriter {
        TextWriter::with_pretty(self.pretty)
    }
}

impl Default for TextWriterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub struct TextWriter {
    out: String,
    pretty: bool,
    stack: Vec<Frame>,
    top_first: bool,
    pending_field_name: Option<SymbolToken>,
    pending_annotations: Vec<SymbolToken>,
    depth: DepthTracker,
    error: Option<Error>,
}

impl TextWriter {
    pub fn new() -> Self {
        TextWriter::with_pretty(false)
    }

    fn with_pretty(pretty: bool) -> Self {
        TextWriter {
            out: String::new(),
            pretty,
            stack: Vec::new(),
            top_first: true,
            pending_field_name: None,
            pending_annotations: Vec::new(),
            depth: DepthTracker::new(),
            error: None,
        }
    }

    fn guard<F: FnOnce(&mut Self) -> Result<()>>(&mut self, f: F) -> Result<()> {
        if let Some(e) = &self.error {
            return Err(e.clone());
        }
        match f(self) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.error = Some(e.clone());
                Err(e)
            }
        }
    }

    fn in_struct(&self) -> bool {
        matches!(self.stack.last(), Some(f) if f.kind == Kind::Struct)
    }

    fn in_sexp(&self) -> bool {
        matches!(self.stack.last(), Some(f) if f.kind == Kind::SExp)
    }

    pub fn field_name(&mut self, tok: SymbolToken) -> Result<()> {
        self.guard(|w| {
            w.pending_field_name = Some(tok);
            Ok(())
        })
    }

    pub fn annotation(&mut self, tok: SymbolToken) -> Result<()> {
        self.guard(|w| {
            w.pending_annotations.push(tok);
            Ok(())
        })
    }

    pub fn annotations<I: IntoIterator<Item = SymbolToken>>(&mut self, toks: I) -> Result<()> {
        self.guard(|w| {
            w.pending_annotations.extend(toks);
            Ok(())
        })
    }

    fn push_symbol_text(&mut self, t: &str) {
        if needs_quoting(t, self.in_sexp()) {
            self.out.push('\'');
            escape_into(&mut self.out, t, '\'');
            self.out.push('\'');
        } else {
            self.out.push_str(t);
        }
    }

    fn push_symbol_ref(&mut self, tok: &SymbolToken) {
        match tok.text() {
            Some(t) => self.push_symbol_text(t),
            None => {
                let _ = write!(self.out, "${}", tok.local_id().unwrap_or(0));
            }
        }
    }

    /// Separator + indentation emitted before every member, container
    /// value, or top-level value — comma between list/struct siblings,
    /// nothing between s-expression siblings, a leading space at top level
    /// in compact mode, or a newline and indent in pretty mode.
    fn write_separator(&mut self) {
        let is_top = self.stack.is_empty();
        let first = if is_top {
            self.top_first
        } else {
            self.stack.last().unwrap().first
        };
        if !first {
            let needs_comma = !is_top && self.stack.last().unwrap().kind != Kind::SExp;
            if needs_comma {
                self.out.push(',');
            }
            if !self.pretty {
                self.out.push(' ');
            }
        }
        if is_top {
            self.top_first = false;
        } else {
            self.stack.last_mut().unwrap().first = false;
        }
        if self.pretty && !(is_top && first) {
            self.out.push('\n');
            for _ in 0..self.stack.len() {
                self.out.push_str("  ");
            }
        }
    }

    fn begin_value(&mut self) -> Result<()> {
        self.write_separator();
        if self.in_struct() {
            let tok = self
                .pending_field_name
                .take()
                .ok_or(Error::Usage("missing field name inside struct"))?;
            self.push_symbol_ref(&tok);
            self.out.push_str(": ");
        } else if self.pending_field_name.take().is_some() {
            return Err(Error::Usage("field name set outside a struct"));
        }
        if !self.pending_annotations.is_empty() {
            let annotations = std::mem::take(&mut self.pending_annotations);
            for tok in &annotations {
                self.push_symbol_ref(tok);
                self.out.push_str("::");
            }
        }
        Ok(())
    }

    fn write_atom<F: FnOnce(&mut Self)>(&mut self, emit: F) -> Result<()> {
        self.guard(|w| {
            w.begin_value()?;
            emit(w);
            Ok(())
        })
    }

    pub fn write_bool(&mut self, v: bool) -> Result<()> {
        self.write_atom(|w| w.out.push_str(if v { "true" } else { "false" }))
    }

    pub fn write_int(&mut self, v: i64) -> Result<()> {
        self.write_atom(|w| {
            let _ = write!(w.out, "{v}");
        })
    }

    pub fn write_uint(&mut self, v: u64) -> Result<()> {
        self.write_atom(|w| {
            let _ = write!(w.out, "{v}");
        })
    }

    pub fn write_bigint(&mut self, v: &crate::bigint::Int) -> Result<()> {
        self.write_atom(|w| {
            let _ = write!(w.out, "{v}");
        })
    }

    pub fn write_float(&mut self, v: f64) -> Result<()> {
        self.write_atom(|w| w.out.push_str(&format_float(v)))
    }

    pub fn write_decimal(&mut self, v: &Decimal) -> Result<()> {
        self.write_atom(|w| w.out.push_str(&format_decimal(v)))
    }

    pub fn write_timestamp(&mut self, v: &Timestamp) -> Result<()> {
        self.write_atom(|w| {
            let _ = write!(w.out, "{v}");
        })
    }

    pub fn write_symbol(&mut self, token: &SymbolToken) -> Result<()> {
        self.write_atom(|w| w.push_symbol_ref(token))
    }

    pub fn write_symbol_from_string(&mut self, text: &str) -> Result<()> {
        self.write_symbol(&SymbolToken::from_text(text))
    }

    pub fn write_string(&mut self, s: &str) -> Result<()> {
        self.write_atom(|w| {
            w.out.push('"');
            escape_into(&mut w.out, s, '"');
            w.out.push('"');
        })
    }

    pub fn write_clob(&mut self, bytes: &[u8]) -> Result<()> {
        self.guard(|w| {
            if bytes.iter().any(|&b| b > 0x7F) {
                return Err(Error::Usage("write_clob: octet exceeds 0x7F"));
            }
            w.begin_value()?;
            let text: String = bytes.iter().map(|&b| b as char).collect();
            w.out.push_str("{{\"");
            escape_into(&mut w.out, &text, '"');
            w.out.push_str("\"}}");
            Ok(())
        })
    }

    pub fn write_blob(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_atom(|w| {
            let encoded = base64::Engine::encode(&base64::engine::general_purpose::STANDARD, bytes);
            w.out.push_str("{{");
            w.out.push_str(&encoded);
            w.out.push_str("}}");
        })
    }

    pub fn write_null(&mut self) -> Result<()> {
        self.write_null_type(ValueKind::Null)
    }

    pub fn write_null_type(&mut self, kind: ValueKind) -> Result<()> {
        self.write_atom(|w| {
            if matches!(kind, ValueKind::Null) {
                w.out.push_str("null");
            } else {
                w.out.push_str("null.");
                w.out.push_str(null_keyword(kind));
            }
        })
    }

    fn begin_container(&mut self, kind: Kind, open: char) -> Result<()> {
        self.guard(|w| {
            w.begin_value()?;
            w.depth.step_in()?;
            w.out.push(open);
            w.stack.push(Frame { kind, first: true });
            Ok(())
        })
    }

    fn end_container(&mut self, expected: Kind, close: char) -> Result<()> {
        self.guard(|w| {
            let frame = w.stack.pop().ok_or(Error::Usage("End*: no open container"))?;
            if frame.kind != expected {
                return Err(Error::Usage("End* does not match the open container kind"));
            }
            w.depth.step_out()?;
            if w.pretty && !frame.first {
                w.out.push('\n');
                for _ in 0..w.stack.len() {
                    w.out.push_str("  ");
                }
            }
            w.out.push(close);
            Ok(())
        })
    }

    pub fn begin_list(&mut self) -> Result<()> {
        self.begin_container(Kind::List, '[')
    }
    pub fn end_list(&mut self) -> Result<()> {
        self.end_container(Kind::List, ']')
    }
    pub fn begin_sexp(&mut self) -> Result<()> {
        self.begin_container(Kind::SExp, '(')
    }
    pub fn end_sexp(&mut self) -> Result<()> {
        self.end_container(Kind::SExp, ')')
    }
    pub fn begin_struct(&mut self) -> Result<()> {
        self.begin_container(Kind::Struct, '{')
    }
    pub fn end_struct(&mut self) -> Result<()> {
        self.end_container(Kind::Struct, '}')
    }

    /// Flush the writer, returning the rendered text. Fails if a container
    /// is still open.
    pub fn finish(self) -> Result<String> {
        if let Some(e) = &self.error {
            return Err(e.clone());
        }
        if !self.stack.is_empty() {
            return Err(Error::Usage("Finish called with an open container"));
        }
        Ok(self.out)
    }
}

impl Default for TextWriter {
    fn default() -> Self {
        TextWriter::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;

    #[test]
    fn write_bool_and_null() {
        let mut w = TextWriter::new();
        w.write_bool(true).unwrap();
        w.write_null().unwrap();
        w.write_null_type(ValueKind::String).unwrap();
        assert_eq!(w.finish().unwrap(), "true null null.string");
    }

    #[test]
    fn write_plain_symbol_unquoted() {
        let mut w = TextWriter::new();
        w.write_symbol_from_string("foo").unwrap();
        assert_eq!(w.finish().unwrap(), "foo");
    }

    #[test]
    fn write_symbol_needing_quotes() {
        let mut w = TextWriter::new();
        w.write_symbol_from_string("has space").unwrap();
        assert_eq!(w.finish().unwrap(), "'has space'");
    }

    #[test]
    fn write_symbol_colliding_with_id_reference_is_quoted() {
        let mut w = TextWriter::new();
        w.write_symbol_from_string("$10").unwrap();
        assert_eq!(w.finish().unwrap(), "'$10'");
    }

    #[test]
    fn write_reserved_keyword_symbol_is_quoted() {
        let mut w = TextWriter::new();
        w.write_symbol_from_string("true").unwrap();
        assert_eq!(w.finish().unwrap(), "'true'");
    }

    #[test]
    fn write_string_escapes_quote_and_newline() {
        let mut w = TextWriter::new();
        w.write_string("a\"b\nc").unwrap();
        assert_eq!(w.finish().unwrap(), r#""a\"b\nc""#);
    }

    #[test]
    fn write_list_compact() {
        let mut w = TextWriter::new();
        w.begin_list().unwrap();
        w.write_int(1).unwrap();
        w.write_int(2).unwrap();
        w.end_list().unwrap();
        assert_eq!(w.finish().unwrap(), "[1, 2]");
    }

    #[test]
    fn write_struct_with_field_names() {
        let mut w = TextWriter::new();
        w.begin_struct().unwrap();
        w.field_name(SymbolToken::from_text("a")).unwrap();
        w.write_int(1).unwrap();
        w.field_name(SymbolToken::from_text("b")).unwrap();
        w.write_bool(false).unwrap();
        w.end_struct().unwrap();
        assert_eq!(w.finish().unwrap(), "{a: 1, b: false}");
    }

    #[test]
    fn write_sexp_with_operator_symbol_unquoted() {
        let mut w = TextWriter::new();
        w.begin_sexp().unwrap();
        w.write_symbol_from_string("+").unwrap();
        w.write_int(1).unwrap();
        w.write_int(2).unwrap();
        w.end_sexp().unwrap();
        assert_eq!(w.finish().unwrap(), "(+ 1 2)");
    }

    #[test]
    fn write_annotated_value() {
        let mut w = TextWriter::new();
        w.annotation(SymbolToken::from_text("meters")).unwrap();
        w.write_int(5).unwrap();
        assert_eq!(w.finish().unwrap(), "meters::5");
    }

    #[test]
    fn write_blob_and_clob() {
        let mut w = TextWriter::new();
        w.write_blob(b"hi").unwrap();
        w.write_clob(b"hey").unwrap();
        assert_eq!(w.finish().unwrap(), r#"{{aGk=}} {{"hey"}}"#);
    }

    #[test]
    fn write_decimal_forms() {
        let mut w = TextWriter::new();
        w.write_decimal(&Decimal::new(BigInt::from(120), -2)).unwrap();
        w.write_decimal(&Decimal::new(BigInt::from(5), 0)).unwrap();
        assert_eq!(w.finish().unwrap(), "120d-2 5.");
    }

    #[test]
    fn write_negative_zero_decimal() {
        let mut w = TextWriter::new();
        w.write_decimal(&Decimal::negative_zero(0)).unwrap();
        assert_eq!(w.finish().unwrap(), "-0.");
    }

    #[test]
    fn write_float_special_values() {
        let mut w = TextWriter::new();
        w.write_float(f64::NAN).unwrap();
        w.write_float(f64::INFINITY).unwrap();
        w.write_float(f64::NEG_INFINITY).unwrap();
        assert_eq!(w.finish().unwrap(), "nan +inf -inf");
    }

    #[test]
    fn write_timestamp_uses_tightest_form() {
        let mut w = TextWriter::new();
        let ts = Timestamp::new(2019, 1, 1, 0, 0, 0, 0, crate::timestamp::Precision::Year, crate::timestamp::Offset::Unknown).unwrap();
        w.write_timestamp(&ts).unwrap();
        assert_eq!(w.finish().unwrap(), "2019T");
    }

    #[test]
    fn pretty_mode_indents_containers() {
        let mut w = TextWriterBuilder::new().pretty(true).build();
        w.begin_list().unwrap();
        w.write_int(1).unwrap();
        w.write_int(2).unwrap();
        w.end_list().unwrap();
        assert_eq!(w.finish().unwrap(), "[\n  1,\n  2\n]");
    }

    #[test]
    fn missing_field_name_inside_struct_is_usage_error() {
        let mut w = TextWriter::new();
        w.begin_struct().unwrap();
        assert!(w.write_int(1).is_err());
    }

    #[test]
    fn finish_inside_open_container_is_usage_error() {
        let mut w = TextWriter::new();
        w.begin_list().unwrap();
        assert!(w.finish().is_err());
    }

    #[test]
    fn sticky_error_after_first_failure() {
        let mut w = TextWriter::new();
        w.begin_struct().unwrap();
        assert!(w.write_int(1).is_err());
        assert!(w.write_int(2).is_err());
    }
}
