//! The buffer-stack binary writer.
//!
//! Container lengths aren't known until their children are written, so each
//! open container gets its own growable `Vec<u8>`; child emissions append to
//! the top of the stack, and on close the buffer is finalized — tag byte
//! plus back-patched length — and concatenated into its parent. An
//! annotation wrapper is modeled as a synthetic container pushed at
//! `BeginValue` and popped at `EndValue`, so no primitive writer needs
//! special-case annotation handling.

use crate::decimal::Decimal;
use crate::depth_tracking::DepthTracker;
use crate::error::{Error, Result};
use crate::marker::{LengthCode, Marker, TypeCode};
use crate::symbol::{LocalTable, SymbolToken};
use crate::timestamp::Timestamp;
use crate::value::ValueKind;
use crate::varint;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Kind {
    List,
    SExp,
    Struct,
    Annotation,
}

struct Frame {
    kind: Kind,
    buf: Vec<u8>,
}

/// A buffer-stack binary writer producing a complete, version-marker-framed
/// stream on [`Writer::finish`].
pub struct Writer {
    local_table: LocalTable,
    stack: Vec<Frame>,
    top: Vec<u8>,
    pending_field_name: Option<SymbolToken>,
    pending_annotations: Vec<SymbolToken>,
    depth: DepthTracker,
    error: Option<Error>,
}

impl Writer {
    pub fn new() -> Self {
        Writer {
            local_table: LocalTable::new(),
            stack: Vec::new(),
            top: Vec::new(),
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

    fn current_buf_mut(&mut self) -> &mut Vec<u8> {
        match self.stack.last_mut() {
            Some(f) => &mut f.buf,
            None => &mut self.top,
        }
    }

    fn in_struct(&self) -> bool {
        matches!(self.stack.last(), Some(f) if f.kind == Kind::Struct)
    }

    /// Queue a field name for the next value written (valid only when the
    /// innermost open container is a struct).
    pub fn field_name(&mut self, tok: SymbolToken) -> Result<()> {
        self.guard(|w| {
            w.pending_field_name = Some(tok);
            Ok(())
        })
    }

    /// Queue a single annotation for the next value written.
    pub fn annotation(&mut self, tok: SymbolToken) -> Result<()> {
        self.guard(|w| {
            w.pending_annotations.push(tok);
            Ok(())
        })
    }

    /// Queue a chain of annotations (in order) for the next value written.
    pub fn annotations<I: IntoIterator<Item = SymbolToken>>(&mut self, toks: I) -> Result<()> {
        self.guard(|w| {
            w.pending_annotations.extend(toks);
            Ok(())
        })
    }

    fn resolve_write_id(&mut self, token: &SymbolToken) -> Result<u32> {
        if let Some(text) = token.text() {
            Ok(self.local_table.intern(text))
        } else if let Some(id) = token.local_id() {
            Ok(id)
        } else {
            Err(Error::Usage("symbol token has neither text nor id"))
        }
    }

    /// Prelude run before every value: writes the pending field name (or
    /// fails if inside a struct with none queued) and opens the annotation
    /// wrapper pseudo-container if annotations are queued.
    fn begin_value(&mut self) -> Result<()> {
        if self.in_struct() {
            let tok = self
                .pending_field_name
                .take()
                .ok_or(Error::Usage("missing field name inside struct"))?;
            let id = self.resolve_write_id(&tok)?;
            let mut tmp = Vec::new();
            varint::write_varuint(&mut tmp, id as u64);
            self.current_buf_mut().extend_from_slice(&tmp);
        } else if self.pending_field_name.take().is_some() {
            return Err(Error::Usage("field name set outside a struct"));
        }

        if !self.pending_annotations.is_empty() {
            let tokens = std::mem::take(&mut self.pending_annotations);
            let mut ids_buf = Vec::new();
            for tok in &tokens {
                let id = self.resolve_write_id(tok)?;
                varint::write_varuint(&mut ids_buf, id as u64);
            }
            let mut frame_buf = Vec::new();
            varint::write_varuint(&mut frame_buf, ids_buf.len() as u64);
            frame_buf.extend_from_slice(&ids_buf);
            self.stack.push(Frame {
                kind: Kind::Annotation,
                buf: frame_buf,
            });
        }
        Ok(())
    }

    /// Postlude run after every value: closes the annotation wrapper, if
    /// one was opened by `begin_value`, by finalizing its tag + length and
    /// concatenating it into the new top of the stack.
    fn end_value(&mut self) -> Result<()> {
        if matches!(self.stack.last(), Some(f) if f.kind == Kind::Annotation) {
            let frame = self.stack.pop().unwrap();
            self.emit_container_bytes(TypeCode::Annotation, frame.buf);
        }
        Ok(())
    }

    fn emit_container_bytes(&mut self, type_code: TypeCode, payload: Vec<u8>) {
        let mut out = Vec::new();
        super::encode_tag(&mut out, type_code, payload.len());
        out.extend_from_slice(&payload);
        self.current_buf_mut().extend_from_slice(&out);
    }

    fn write_atom<F: FnOnce(&mut Vec<u8>)>(&mut self, emit: F) -> Result<()> {
        self.guard(|w| {
            w.begin_value()?;
            emit(w.current_buf_mut());
            w.end_value()
        })
    }

    pub fn write_bool(&mut self, v: bool) -> Result<()> {
        self.write_atom(|buf| {
            let length_code = if v { LengthCode::BoolTrue } else { LengthCode::Zero };
            buf.push(
                Marker {
                    type_code: TypeCode::Bool,
                    length_code,
                }
                .into_u8(),
            );
        })
    }

    pub fn write_int(&mut self, v: i64) -> Result<()> {
        self.write_bigint(&crate::bigint::Int::from(v))
    }

    pub fn write_uint(&mut self, v: u64) -> Result<()> {
        self.write_bigint(&crate::bigint::Int::from(v))
    }

    pub fn write_bigint(&mut self, v: &crate::bigint::Int) -> Result<()> {
        self.write_atom(|buf| {
            if v.is_zero() {
                super::encode_tag(buf, TypeCode::PosInt, 0);
            } else {
                let (negative, magnitude) = v.to_sign_magnitude_be();
                let type_code = if negative { TypeCode::NegInt } else { TypeCode::PosInt };
                super::encode_tag(buf, type_code, magnitude.len());
                buf.extend_from_slice(&magnitude);
            }
        })
    }

    pub fn write_float(&mut self, v: f64) -> Result<()> {
        self.write_atom(|buf| {
            if v == 0.0 && !v.is_sign_negative() {
                buf.push(
                    Marker {
                        type_code: TypeCode::Float,
                        length_code: LengthCode::Zero,
                    }
                    .into_u8(),
                );
            } else if v.is_nan() {
                // Canonical NaN: the 4-byte single-precision bit pattern
                // 0x7FC00000, regardless of the input NaN's payload bits.
                super::encode_tag(buf, TypeCode::Float, 4);
                buf.extend_from_slice(&0x7FC0_0000u32.to_be_bytes());
            } else {
                let as_f32 = v as f32;
                if as_f32 as f64 == v {
                    super::encode_tag(buf, TypeCode::Float, 4);
                    buf.extend_from_slice(&as_f32.to_be_bytes());
                } else {
                    super::encode_tag(buf, TypeCode::Float, 8);
                    buf.extend_from_slice(&v.to_be_bytes());
                }
            }
        })
    }

    pub fn write_decimal(&mut self, v: &Decimal) -> Result<()> {
        self.write_atom(|buf| {
            if v.is_zero() && !v.is_negative_zero() && v.exponent() == 0 {
                buf.push(
                    Marker {
                        type_code: TypeCode::Decimal,
                        length_code: LengthCode::Zero,
                    }
                    .into_u8(),
                );
            } else {
                let mut payload = Vec::new();
                v.encode_payload(&mut payload);
                super::encode_tag(buf, TypeCode::Decimal, payload.len());
                buf.extend_from_slice(&payload);
            }
        })
    }

    pub fn write_timestamp(&mut self, v: &Timestamp) -> Result<()> {
        self.write_atom(|buf| {
            let mut payload = Vec::new();
            v.encode_payload(&mut payload);
            super::encode_tag(buf, TypeCode::Timestamp, payload.len());
            buf.extend_from_slice(&payload);
        })
    }

    pub fn write_symbol(&mut self, token: &SymbolToken) -> Result<()> {
        self.guard(|w| {
            let id = w.resolve_write_id(token)?;
            w.begin_value()?;
            let bytes = be_min_bytes(id as u64);
            super::encode_tag(w.current_buf_mut(), TypeCode::Symbol, bytes.len());
            w.current_buf_mut().extend_from_slice(&bytes);
            w.end_value()
        })
    }

    pub fn write_symbol_from_string(&mut self, text: &str) -> Result<()> {
        self.write_symbol(&SymbolToken::from_text(text))
    }

    pub fn write_string(&mut self, s: &str) -> Result<()> {
        self.write_atom(|buf| {
            let bytes = s.as_bytes();
            super::encode_tag(buf, TypeCode::String, bytes.len());
            buf.extend_from_slice(bytes);
        })
    }

    pub fn write_clob(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_atom(|buf| {
            super::encode_tag(buf, TypeCode::Clob, bytes.len());
            buf.extend_from_slice(bytes);
        })
    }

    pub fn write_blob(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_atom(|buf| {
            super::encode_tag(buf, TypeCode::Blob, bytes.len());
            buf.extend_from_slice(bytes);
        })
    }

    pub fn write_null(&mut self) -> Result<()> {
        self.write_null_type_code(TypeCode::NullOrNop)
    }

    pub fn write_null_type(&mut self, kind: ValueKind) -> Result<()> {
        self.write_null_type_code(type_code_for_kind(kind))
    }

    fn write_null_type_code(&mut self, type_code: TypeCode) -> Result<()> {
        self.write_atom(|buf| {
            buf.push(
                Marker {
                    type_code,
                    length_code: LengthCode::TypedNull,
                }
                .into_u8(),
            );
        })
    }

    fn begin_container(&mut self, kind: Kind) -> Result<()> {
        self.guard(|w| {
            w.begin_value()?;
            w.depth.step_in()?;
            w.stack.push(Frame { kind, buf: Vec::new() });
            Ok(())
        })
    }

    fn end_container(&mut self, expected: Kind, type_code: TypeCode) -> Result<()> {
        self.guard(|w| {
            let frame = w
                .stack
                .pop()
                .ok_or(Error::Usage("End*: no open container"))?;
            if frame.kind != expected {
                return Err(Error::Usage("End* does not match the open container kind"));
            }
            w.depth.step_out()?;
            w.emit_container_bytes(type_code, frame.buf);
            w.end_value()
        })
    }

    pub fn begin_list(&mut self) -> Result<()> {
        self.begin_container(Kind::List)
    }
    pub fn end_list(&mut self) -> Result<()> {
        self.end_container(Kind::List, TypeCode::List)
    }
    pub fn begin_sexp(&mut self) -> Result<()> {
        self.begin_container(Kind::SExp)
    }
    pub fn end_sexp(&mut self) -> Result<()> {
        self.end_container(Kind::SExp, TypeCode::SExp)
    }
    pub fn begin_struct(&mut self) -> Result<()> {
        self.begin_container(Kind::Struct)
    }
    pub fn end_struct(&mut self) -> Result<()> {
        self.end_container(Kind::Struct, TypeCode::Struct)
    }

    /// Serialize the accumulated local symbol table as an in-band
    /// `$ion_symbol_table`-annotated struct, using a fresh sub-writer so no
    /// interning of `"$ion_symbol_table"`/`"symbols"` is needed (both are
    /// referenced by their fixed system-table IDs). Returns `None` if no
    /// local symbols were ever interned.
    fn encode_symbol_table_bytes(&self) -> Option<Vec<u8>> {
        let locals = self.local_table.locals();
        if locals.is_empty() {
            return None;
        }
        let mut sub = Writer::new();
        sub.annotation(SymbolToken::from_id(3)).ok()?; // $ion_symbol_table
        sub.begin_struct().ok()?;
        sub.field_name(SymbolToken::from_id(7)).ok()?; // symbols
        sub.begin_list().ok()?;
        for slot in locals {
            match slot {
                Some(text) => sub.write_string(text).ok()?,
                None => sub.write_null().ok()?,
            }
        }
        sub.end_list().ok()?;
        sub.end_struct().ok()?;
        let bytes = sub.finish().ok()?;
        Some(bytes[super::VERSION_MARKER.len()..].to_vec())
    }

    /// Flush the writer: serialize the local symbol table (if any symbols
    /// were interned) before the buffered value stream, behind a fresh
    /// version marker, and return the complete byte stream. Establishes a
    /// happens-before barrier — every previously written value is included.
    pub fn finish(self) -> Result<Vec<u8>> {
        if let Some(e) = &self.error {
            return Err(e.clone());
        }
        if !self.stack.is_empty() {
            return Err(Error::Usage("Finish called with an open container"));
        }
        let mut out = super::VERSION_MARKER.to_vec();
        if let Some(symtab) = self.encode_symbol_table_bytes() {
            out.extend_from_slice(&symtab);
        }
        out.extend_from_slice(&self.top);
        Ok(out)
    }
}

impl Default for Writer {
    fn default() -> Self {
        Writer::new()
    }
}

fn be_min_bytes(mut v: u64) -> Vec<u8> {
    if v == 0 {
        return Vec::new();
    }
    let mut bytes = Vec::new();
    while v > 0 {
        bytes.push((v & 0xFF) as u8);
        v >>= 8;
    }
    bytes.reverse();
    bytes
}

fn type_code_for_kind(kind: ValueKind) -> TypeCode {
    match kind {
        ValueKind::Null => TypeCode::NullOrNop,
        ValueKind::Bool => TypeCode::Bool,
        ValueKind::Int => TypeCode::PosInt,
        ValueKind::Float => TypeCode::Float,
        ValueKind::Decimal => TypeCode::Decimal,
        ValueKind::Timestamp => TypeCode::Timestamp,
        ValueKind::Symbol => TypeCode::Symbol,
        ValueKind::String => TypeCode::String,
        ValueKind::Clob => TypeCode::Clob,
        ValueKind::Blob => TypeCode::Blob,
        ValueKind::List => TypeCode::List,
        ValueKind::SExp => TypeCode::SExp,
        ValueKind::Struct => TypeCode::Struct,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::Reader;

    #[test]
    fn write_bool_true() {
        let mut w = Writer::new();
        w.write_bool(true).unwrap();
        assert_eq!(w.finish().unwrap(), vec![0xE0, 0x01, 0x00, 0xEA, 0x11]);
    }

    #[test]
    fn write_int_zero() {
        let mut w = Writer::new();
        w.write_int(0).unwrap();
        assert_eq!(w.finish().unwrap(), vec![0xE0, 0x01, 0x00, 0xEA, 0x20]);
    }

    #[test]
    fn write_positive_zero_float() {
        let mut w = Writer::new();
        w.write_float(0.0).unwrap();
        assert_eq!(w.finish().unwrap(), vec![0xE0, 0x01, 0x00, 0xEA, 0x40]);
    }

    #[test]
    fn write_nan_canonical_form() {
        let mut w = Writer::new();
        w.write_float(f64::NAN).unwrap();
        assert_eq!(
            w.finish().unwrap(),
            vec![0xE0, 0x01, 0x00, 0xEA, 0x44, 0x7F, 0xC0, 0x00, 0x00]
        );
    }

    #[test]
    fn write_positive_zero_decimal() {
        let mut w = Writer::new();
        w.write_decimal(&Decimal::new(num_bigint::BigInt::from(0), 0)).unwrap();
        assert_eq!(w.finish().unwrap(), vec![0xE0, 0x01, 0x00, 0xEA, 0x50]);
    }

    #[test]
    fn write_empty_string_and_blob() {
        let mut w = Writer::new();
        w.write_string("").unwrap();
        w.write_blob(&[]).unwrap();
        assert_eq!(
            w.finish().unwrap(),
            vec![0xE0, 0x01, 0x00, 0xEA, 0x80, 0xA0]
        );
    }

    #[test]
    fn write_typed_null_bool() {
        let mut w = Writer::new();
        w.write_null_type(ValueKind::Bool).unwrap();
        assert_eq!(w.finish().unwrap(), vec![0xE0, 0x01, 0x00, 0xEA, 0x1F]);
    }

    #[test]
    fn write_and_read_round_trip_list() {
        let mut w = Writer::new();
        w.begin_list().unwrap();
        w.write_int(1).unwrap();
        w.write_int(2).unwrap();
        w.end_list().unwrap();
        let bytes = w.finish().unwrap();

        let mut r = Reader::new(&bytes).unwrap();
        assert_eq!(r.next().unwrap(), Some(ValueKind::List));
        r.step_in().unwrap();
        assert_eq!(r.next().unwrap(), Some(ValueKind::Int));
        assert_eq!(r.read_int().unwrap(), 1);
        assert_eq!(r.next().unwrap(), Some(ValueKind::Int));
        assert_eq!(r.read_int().unwrap(), 2);
        assert_eq!(r.next().unwrap(), None);
        r.step_out().unwrap();
    }

    #[test]
    fn write_struct_with_field_names_round_trips() {
        let mut w = Writer::new();
        w.begin_struct().unwrap();
        w.field_name(SymbolToken::from_text("a")).unwrap();
        w.write_int(42).unwrap();
        w.field_name(SymbolToken::from_text("b")).unwrap();
        w.write_int(0).unwrap();
        w.end_struct().unwrap();
        let bytes = w.finish().unwrap();

        let mut r = Reader::new(&bytes).unwrap();
        assert_eq!(r.next().unwrap(), Some(ValueKind::Struct));
        r.step_in().unwrap();
        assert_eq!(r.next().unwrap(), Some(ValueKind::Int));
        assert_eq!(r.field_name().unwrap().text(), Some("a"));
        assert_eq!(r.read_int().unwrap(), 42);
        assert_eq!(r.next().unwrap(), Some(ValueKind::Int));
        assert_eq!(r.field_name().unwrap().text(), Some("b"));
        assert_eq!(r.read_int().unwrap(), 0);
    }

    #[test]
    fn missing_field_name_inside_struct_is_usage_error() {
        let mut w = Writer::new();
        w.begin_struct().unwrap();
        assert!(w.write_int(1).is_err());
    }

    #[test]
    fn write_annotated_value_round_trips() {
        let mut w = Writer::new();
        w.annotation(SymbolToken::from_text("tag")).unwrap();
        w.write_bool(true).unwrap();
        let bytes = w.finish().unwrap();

        let mut r = Reader::new(&bytes).unwrap();
        assert_eq!(r.next().unwrap(), Some(ValueKind::Bool));
        assert_eq!(r.annotations()[0].text(), Some("tag"));
        assert!(r.read_bool().unwrap());
    }

    #[test]
    fn finish_inside_open_container_is_usage_error() {
        let mut w = Writer::new();
        w.begin_list().unwrap();
        assert!(w.finish().is_err());
    }

    #[test]
    fn sticky_error_after_first_failure() {
        let mut w = Writer::new();
        w.begin_struct().unwrap();
        assert!(w.write_int(1).is_err());
        assert!(w.write_int(2).is_err());
    }

    #[test]
    fn local_symbol_table_flushed_before_values() {
        let mut w = Writer::new();
        w.write_symbol_from_string("custom").unwrap();
        let bytes = w.finish().unwrap();

        let mut r = Reader::new(&bytes).unwrap();
        // First value should be the values stream's symbol, with "custom"
        // resolved via the flushed in-band symbol table.
        assert_eq!(r.next().unwrap(), Some(ValueKind::Symbol));
        assert_eq!(r.read_symbol().unwrap().text(), Some("custom"));
    }
}
