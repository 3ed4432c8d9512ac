//! The streaming binary reader: a pull-parser state machine over a byte
//! slice.
//!
//! `Next` is the single entry point that advances the state machine
//! (`BeforeValue -> OnValue`, or inside a struct `BeforeFieldId ->
//! OnFieldId -> BeforeValue -> OnValue`). Containers are tracked with a
//! stack of `(type, end offset)` frames rather than recursion, so
//! `StepIn`/`StepOut` are O(1) and the reader never holds more state than
//! its current nesting depth.

use std::sync::Arc;

use crate::bigint::Int;
use crate::decimal::Decimal;
use crate::depth_tracking::DepthTracker;
use crate::error::{syntax, Error, Result};
use crate::marker::{LengthCode, Marker, TypeCode};
use crate::symbol::{self, Catalog, LocalTable, SharedTable, SymbolToken};
use crate::timestamp::Timestamp;
use crate::value::ValueKind;
use crate::varint;

use super::decode_length;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum State {
    BeforeValue,
    OnValue,
    BeforeFieldId,
    OnFieldId,
}

struct Frame {
    type_code: TypeCode,
    end: usize,
    /// Set when this struct was opened with the ordered-struct sentinel
    /// (`L=1`): its field IDs must appear in strictly ascending order.
    ordered: bool,
    /// Most recently read field ID, when `ordered` is set.
    last_sid: Option<u32>,
}

struct Current {
    type_code: TypeCode,
    length_code: LengthCode,
    payload_start: usize,
    payload_end: usize,
    annotations: Vec<SymbolToken>,
    field_name: Option<SymbolToken>,
    is_null: bool,
}

/// A pull-parser over an in-memory binary stream.
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
    stack: Vec<Frame>,
    state: State,
    local_table: LocalTable,
    catalog: Option<Arc<dyn Catalog>>,
    depth: DepthTracker,
    current: Option<Current>,
    error: Option<Error>,
}

impl<'a> Reader<'a> {
    /// Create a reader over `buf`, validating the leading version marker.
    pub fn new(buf: &'a [u8]) -> Result<Self> {
        Self::with_catalog(buf, None)
    }

    /// Create a reader with a catalog used to resolve imported shared
    /// symbol tables named by in-band symbol-table structs.
    pub fn with_catalog(buf: &'a [u8], catalog: Option<Arc<dyn Catalog>>) -> Result<Self> {
        let consumed = super::read_version_marker(buf, 0)?;
        Ok(Reader {
            buf,
            pos: consumed,
            stack: Vec::new(),
            state: State::BeforeValue,
            local_table: LocalTable::new(),
            catalog,
            depth: DepthTracker::new(),
            current: None,
            error: None,
        })
    }

    fn check_sticky(&self) -> Result<()> {
        if let Some(e) = &self.error {
            return Err(e.clone());
        }
        Ok(())
    }

    fn fail(&mut self, e: Error) -> Error {
        self.error = Some(e.clone());
        e
    }

    fn in_struct(&self) -> bool {
        matches!(self.stack.last(), Some(f) if f.type_code == TypeCode::Struct)
    }

    fn frame_end(&self) -> usize {
        self.stack.last().map(|f| f.end).unwrap_or(self.buf.len())
    }

    /// Advance to the next value (or field, then value, inside a struct).
    /// Returns `Ok(None)` at the end of the current container or stream.
    pub fn next(&mut self) -> Result<Option<ValueKind>> {
        self.check_sticky()?;
        match self.advance() {
            Ok(v) => Ok(v),
            Err(e) => Err(self.fail(e)),
        }
    }

    fn advance(&mut self) -> Result<Option<ValueKind>> {
        if matches!(self.state, State::OnValue | State::OnFieldId) {
            if let Some(cur) = self.current.take() {
                self.pos = cur.payload_end;
            }
        }

        // A top-level version marker resets the local symbol table.
        if self.stack.is_empty() {
            while self.pos + 4 <= self.buf.len() && &self.buf[self.pos..self.pos + 4] == super::VERSION_MARKER {
                self.pos += 4;
                self.local_table = LocalTable::new();
            }
        }

        let end = self.frame_end();
        if self.pos >= end {
            self.current = None;
            self.state = if self.in_struct() {
                State::BeforeFieldId
            } else {
                State::BeforeValue
            };
            return Ok(None);
        }

        let field_name = if self.in_struct() {
            self.state = State::BeforeFieldId;
            let (id, len) = varint::read_varuint(&self.buf[self.pos..], self.pos)?;
            let sid = symbol::check_symbol_id(id, self.pos)?;
            let field_offset = self.pos;
            self.pos += len;
            self.state = State::OnFieldId;
            let frame = self.stack.last_mut().expect("in_struct implies a frame");
            if frame.ordered {
                if let Some(last) = frame.last_sid {
                    if sid <= last {
                        return Err(syntax(
                            field_offset,
                            "ordered struct field IDs must be strictly ascending",
                        ));
                    }
                }
                frame.last_sid = Some(sid);
            }
            Some(self.local_table.token_for_id(sid))
        } else {
            self.state = State::BeforeValue;
            None
        };

        let (type_code, length_code, payload_start, payload_end, annotations) =
            self.read_value_header(end)?;

        if self.maybe_consume_symbol_table(type_code, payload_start, payload_end, &annotations)? {
            return self.advance();
        }

        // NullOrNop reaches this point only via the untyped-null byte
        // (L=0x0F); every other length code for that type is a nop-pad
        // and is skipped transparently inside `read_value_header`.
        let is_null = matches!(length_code, LengthCode::TypedNull);

        if type_code == TypeCode::Struct
            && length_code == LengthCode::OrderedStruct
            && payload_end == payload_start
        {
            return Err(syntax(payload_start, "ordered struct with zero fields"));
        }

        let kind = kind_for_type_code(type_code)?;

        self.current = Some(Current {
            type_code,
            length_code,
            payload_start,
            payload_end,
            annotations,
            field_name,
            is_null,
        });
        self.pos = payload_start;
        self.state = State::OnValue;
        Ok(Some(kind))
    }

    /// Parse (skipping nop-pads and unwrapping at most one annotation
    /// wrapper) until a real value's tag is found, leaving `self.pos` at
    /// the start of its payload.
    fn read_value_header(
        &mut self,
        end: usize,
    ) -> Result<(TypeCode, LengthCode, usize, usize, Vec<SymbolToken>)> {
        let mut annotations: Vec<SymbolToken> = Vec::new();
        let mut wrapper_end: Option<usize> = None;
        loop {
            if self.pos >= end {
                return Err(Error::UnexpectedEof { offset: self.pos });
            }
            let tag = self.buf[self.pos];
            let marker = Marker::from_u8(tag, self.pos)?;

            if marker.type_code == TypeCode::NullOrNop && !matches!(marker.length_code, LengthCode::TypedNull) {
                if !annotations.is_empty() {
                    return Err(syntax(self.pos, "nop-pad may not carry annotations"));
                }
                let (len, header_len) = decode_length(self.buf, self.pos, marker)?;
                self.pos += header_len + len;
                continue;
            }

            if marker.type_code == TypeCode::Annotation {
                if !annotations.is_empty() {
                    return Err(syntax(self.pos, "annotation wrapper directly wraps another"));
                }
                let (total_len, header_len) = decode_length(self.buf, self.pos, marker)?;
                let value_end = self.pos + header_len + total_len;
                self.pos += header_len;
                let (ann_len, ann_len_bytes) =
                    varint::read_varuint(&self.buf[self.pos..], self.pos)?;
                self.pos += ann_len_bytes;
                if ann_len == 0 {
                    return Err(syntax(self.pos, "annotation wrapper has zero-length annotation field"));
                }
                let ann_end = self.pos + ann_len as usize;
                if ann_end > value_end {
                    return Err(syntax(self.pos, "annotation field overruns wrapper length"));
                }
                while self.pos < ann_end {
                    let (id, len) = varint::read_varuint(&self.buf[self.pos..], self.pos)?;
                    let sid = symbol::check_symbol_id(id, self.pos)?;
                    self.pos += len;
                    annotations.push(self.local_table.token_for_id(sid));
                }
                if self.pos != ann_end {
                    return Err(syntax(self.pos, "annotation ids overran declared length"));
                }
                wrapper_end = Some(value_end);
                continue;
            }

            let (len, header_len) = decode_length(self.buf, self.pos, marker)?;
            let payload_start = self.pos + header_len;
            let payload_end = payload_start + len;

            if let Some(wend) = wrapper_end {
                if payload_end != wend {
                    return Err(syntax(
                        payload_end,
                        "enclosed value does not exactly fill annotation wrapper length",
                    ));
                }
            }

            self.pos = payload_start;
            return Ok((marker.type_code, marker.length_code, payload_start, payload_end, annotations));
        }
    }

    /// If the struct at `[payload_start, payload_end)` is annotated
    /// `$ion_symbol_table` and sits at top level, consume it as a local
    /// symbol table update rather than a value: parse its `imports` and
    /// `symbols` fields, rebuild `self.local_table`, and advance `self.pos`
    /// past it. Returns `true` if the struct was consumed this way.
    fn maybe_consume_symbol_table(
        &mut self,
        type_code: TypeCode,
        payload_start: usize,
        payload_end: usize,
        annotations: &[SymbolToken],
    ) -> Result<bool> {
        if !self.stack.is_empty() || type_code != TypeCode::Struct {
            return Ok(false);
        }
        if !annotations.iter().any(|a| a.text() == Some("$ion_symbol_table")) {
            return Ok(false);
        }

        let mut pos = payload_start;
        let mut import_descs: Vec<(String, u32, Option<u32>)> = Vec::new();
        let mut append_current = false;
        let mut symbol_slots: Vec<Option<String>> = Vec::new();

        while pos < payload_end {
            let (id, len) = varint::read_varuint(&self.buf[pos..], pos)?;
            let sid = symbol::check_symbol_id(id, pos)?;
            pos += len;
            let field_name = self.local_table.token_for_id(sid);
            let marker = Marker::from_u8(self.buf[pos], pos)?;
            let (vlen, header_len) = decode_length(self.buf, pos, marker)?;
            let vstart = pos + header_len;
            let vend = vstart + vlen;

            match field_name.text() {
                Some("imports") if marker.type_code == TypeCode::Symbol => {
                    append_current = true;
                }
                Some("imports") if marker.type_code == TypeCode::List => {
                    let mut p = vstart;
                    while p < vend {
                        let m2 = Marker::from_u8(self.buf[p], p)?;
                        let (l2, h2) = decode_length(self.buf, p, m2)?;
                        let s2 = p + h2;
                        let e2 = s2 + l2;
                        if m2.type_code == TypeCode::Struct {
                            import_descs.push(self.parse_import_descriptor(s2, e2)?);
                        }
                        p = e2;
                    }
                }
                Some("symbols") if marker.type_code == TypeCode::List => {
                    let mut p = vstart;
                    while p < vend {
                        let m2 = Marker::from_u8(self.buf[p], p)?;
                        let (l2, h2) = decode_length(self.buf, p, m2)?;
                        let s2 = p + h2;
                        let e2 = s2 + l2;
                        if m2.type_code == TypeCode::String && !matches!(m2.length_code, LengthCode::TypedNull)
                        {
                            symbol_slots.push(Some(String::from_utf8(self.buf[s2..e2].to_vec())?));
                        } else {
                            symbol_slots.push(None);
                        }
                        p = e2;
                    }
                }
                _ => {}
            }
            pos = vend;
        }

        let mut new_table = if append_current {
            self.local_table.clone()
        } else {
            let mut t = LocalTable::new();
            for (name, version, max_id) in &import_descs {
                let shared = self.catalog.as_ref().and_then(|c| c.lookup(name, *version));
                match shared {
                    Some(tbl) => {
                        let effective = max_id.unwrap_or_else(|| tbl.max_id());
                        t.add_import(Arc::new(tbl.adjusted(effective)), effective);
                    }
                    None => {
                        // Bogus-import policy: reserve the declared ID range
                        // with every ID resolving to unknown text.
                        let effective = max_id.unwrap_or(0);
                        let placeholder =
                            SharedTable::new(name.clone(), *version, vec![None; effective as usize]);
                        t.add_import(Arc::new(placeholder), effective);
                    }
                }
            }
            t
        };
        for slot in symbol_slots {
            match slot {
                Some(text) => {
                    new_table.add_local(text);
                }
                None => {
                    new_table.add_gap();
                }
            }
        }
        self.local_table = new_table;
        self.pos = payload_end;
        Ok(true)
    }

    fn parse_import_descriptor(&self, start: usize, end: usize) -> Result<(String, u32, Option<u32>)> {
        let mut pos = start;
        let mut name = String::new();
        let mut version = 1u32;
        let mut max_id = None;
        while pos < end {
            let (id, len) = varint::read_varuint(&self.buf[pos..], pos)?;
            let sid = symbol::check_symbol_id(id, pos)?;
            pos += len;
            let field_name = self.local_table.token_for_id(sid);
            let marker = Marker::from_u8(self.buf[pos], pos)?;
            let (vlen, header_len) = decode_length(self.buf, pos, marker)?;
            let vstart = pos + header_len;
            let vend = vstart + vlen;
            match field_name.text() {
                Some("name") => name = String::from_utf8(self.buf[vstart..vend].to_vec())?,
                Some("version") => version = be_bytes_to_u64(&self.buf[vstart..vend]) as u32,
                Some("max_id") => max_id = Some(be_bytes_to_u64(&self.buf[vstart..vend]) as u32),
                _ => {}
            }
            pos = vend;
        }
        Ok((name, version, max_id))
    }

    /// The type of the value currently positioned on, without consuming it.
    pub fn value_type(&self) -> Option<ValueKind> {
        self.current.as_ref().map(|c| kind_for_type_code(c.type_code).unwrap())
    }

    pub fn is_null(&self) -> bool {
        self.current.as_ref().map(|c| c.is_null).unwrap_or(false)
    }

    pub fn field_name(&self) -> Option<&SymbolToken> {
        self.current.as_ref().and_then(|c| c.field_name.as_ref())
    }

    pub fn annotations(&self) -> &[SymbolToken] {
        self.current
            .as_ref()
            .map(|c| c.annotations.as_slice())
            .unwrap_or(&[])
    }

    pub fn symbol_table(&self) -> &LocalTable {
        &self.local_table
    }

    fn current(&self, op: &'static str) -> Result<&Current> {
        self.current.as_ref().ok_or(Error::Usage(op))
    }

    fn payload(&self, cur: &Current) -> &'a [u8] {
        &self.buf[cur.payload_start..cur.payload_end]
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        let cur = self.current("ReadBool")?;
        if cur.type_code != TypeCode::Bool {
            return Err(Error::Usage("ReadBool: not a bool"));
        }
        Ok(cur.length_code == LengthCode::BoolTrue)
    }

    pub fn read_bigint(&mut self) -> Result<Int> {
        let cur = self.current("ReadBigInt")?;
        if !matches!(cur.type_code, TypeCode::PosInt | TypeCode::NegInt) {
            return Err(Error::Usage("ReadBigInt: not an int"));
        }
        let negative = cur.type_code == TypeCode::NegInt;
        let payload = self.payload(cur);
        if negative && payload.iter().all(|&b| b == 0) && !payload.is_empty() {
            return Err(syntax(cur.payload_start, "negative int with all-zero magnitude"));
        }
        Ok(Int::from_sign_magnitude_be(negative, payload))
    }

    pub fn read_int(&mut self) -> Result<i64> {
        self.read_bigint()?
            .as_i64()
            .ok_or(Error::Usage("ReadInt: value does not fit in i64"))
    }

    pub fn read_float(&mut self) -> Result<f64> {
        let cur = self.current("ReadFloat")?;
        if cur.type_code != TypeCode::Float {
            return Err(Error::Usage("ReadFloat: not a float"));
        }
        let payload = self.payload(cur);
        match payload.len() {
            0 => Ok(0.0),
            4 => {
                let bytes: [u8; 4] = payload.try_into().unwrap();
                Ok(f32::from_be_bytes(bytes) as f64)
            }
            8 => {
                let bytes: [u8; 8] = payload.try_into().unwrap();
                Ok(f64::from_be_bytes(bytes))
            }
            n => Err(syntax(cur.payload_start, format!("invalid float payload length {n}"))),
        }
    }

    pub fn read_decimal(&mut self) -> Result<Decimal> {
        let cur = self.current("ReadDecimal")?;
        if cur.type_code != TypeCode::Decimal {
            return Err(Error::Usage("ReadDecimal: not a decimal"));
        }
        let payload = self.payload(cur);
        let (decimal, consumed) = Decimal::decode_payload(payload, cur.payload_start)?;
        if consumed != payload.len() {
            return Err(syntax(cur.payload_start, "trailing bytes in decimal payload"));
        }
        Ok(decimal)
    }

    pub fn read_timestamp(&mut self) -> Result<Timestamp> {
        let cur = self.current("ReadTimestamp")?;
        if cur.type_code != TypeCode::Timestamp {
            return Err(Error::Usage("ReadTimestamp: not a timestamp"));
        }
        let payload = self.payload(cur);
        let (ts, consumed) = Timestamp::decode_payload(payload, cur.payload_start)?;
        if consumed != payload.len() {
            return Err(syntax(cur.payload_start, "trailing bytes in timestamp payload"));
        }
        Ok(ts)
    }

    pub fn read_symbol(&mut self) -> Result<SymbolToken> {
        let cur = self.current("ReadSymbol")?;
        if cur.type_code != TypeCode::Symbol {
            return Err(Error::Usage("ReadSymbol: not a symbol"));
        }
        let payload = self.payload(cur);
        if payload.is_empty() {
            return Ok(self.local_table.token_for_id(0));
        }
        let id = be_bytes_to_u64(payload);
        let sid = symbol::check_symbol_id(id, cur.payload_start)?;
        Ok(self.local_table.token_for_id(sid))
    }

    pub fn read_string(&mut self) -> Result<String> {
        let cur = self.current("ReadString")?;
        if cur.type_code != TypeCode::String {
            return Err(Error::Usage("ReadString: not a string"));
        }
        let payload = self.payload(cur);
        Ok(String::from_utf8(payload.to_vec())?)
    }

    pub fn read_bytes(&mut self) -> Result<Vec<u8>> {
        let cur = self.current("ReadBytes")?;
        if !matches!(cur.type_code, TypeCode::Clob | TypeCode::Blob) {
            return Err(Error::Usage("ReadBytes: not a clob or blob"));
        }
        Ok(self.payload(cur).to_vec())
    }

    /// Enter the current container value (list, sexp, or struct).
    pub fn step_in(&mut self) -> Result<()> {
        self.check_sticky()?;
        let cur = self
            .current
            .as_ref()
            .ok_or(Error::Usage("StepIn: not positioned on a value"))?;
        if !matches!(cur.type_code, TypeCode::List | TypeCode::SExp | TypeCode::Struct) {
            return Err(self.fail(Error::Usage("StepIn: value is not a container")));
        }
        self.depth.step_in().map_err(|e| self.fail(e))?;
        let end = cur.payload_end;
        let type_code = cur.type_code;
        let ordered = type_code == TypeCode::Struct && cur.length_code == LengthCode::OrderedStruct;
        self.stack.push(Frame {
            type_code,
            end,
            ordered,
            last_sid: None,
        });
        self.pos = self.current.as_ref().unwrap().payload_start;
        self.current = None;
        self.state = if type_code == TypeCode::Struct {
            State::BeforeFieldId
        } else {
            State::BeforeValue
        };
        Ok(())
    }

    /// Leave the current container, consuming any unread trailing bytes.
    pub fn step_out(&mut self) -> Result<()> {
        self.check_sticky()?;
        let frame = self
            .stack
            .pop()
            .ok_or(Error::Usage("StepOut: no open container"))?;
        self.depth.step_out().map_err(|e| self.fail(e))?;
        self.pos = frame.end;
        self.current = None;
        self.state = if self.in_struct() {
            State::BeforeFieldId
        } else {
            State::BeforeValue
        };
        Ok(())
    }

    /// Skip past the current value without reading it.
    pub fn skip_value(&mut self) -> Result<()> {
        self.check_sticky()?;
        if let Some(cur) = self.current.take() {
            self.pos = cur.payload_end;
        }
        self.state = if self.in_struct() {
            State::BeforeFieldId
        } else {
            State::BeforeValue
        };
        Ok(())
    }
}

fn be_bytes_to_u64(bytes: &[u8]) -> u64 {
    let mut v: u64 = 0;
    for &b in bytes {
        v = (v << 8) | b as u64;
    }
    v
}

fn kind_for_type_code(type_code: TypeCode) -> Result<ValueKind> {
    Ok(match type_code {
        TypeCode::NullOrNop => ValueKind::Null,
        TypeCode::Bool => ValueKind::Bool,
        TypeCode::PosInt | TypeCode::NegInt => ValueKind::Int,
        TypeCode::Float => ValueKind::Float,
        TypeCode::Decimal => ValueKind::Decimal,
        TypeCode::Timestamp => ValueKind::Timestamp,
        TypeCode::Symbol => ValueKind::Symbol,
        TypeCode::String => ValueKind::String,
        TypeCode::Clob => ValueKind::Clob,
        TypeCode::Blob => ValueKind::Blob,
        TypeCode::List => ValueKind::List,
        TypeCode::SExp => ValueKind::SExp,
        TypeCode::Struct => ValueKind::Struct,
        TypeCode::Annotation => return Err(Error::Usage("annotation wrapper is not a value kind")),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(payload: &[u8]) -> Vec<u8> {
        let mut v = super::super::VERSION_MARKER.to_vec();
        v.extend_from_slice(payload);
        v
    }

    #[test]
    fn reads_bool_true() {
        let buf = stream(&[0x11]);
        let mut r = Reader::new(&buf).unwrap();
        assert_eq!(r.next().unwrap(), Some(ValueKind::Bool));
        assert!(r.read_bool().unwrap());
        assert_eq!(r.next().unwrap(), None);
    }

    #[test]
    fn reads_positive_int() {
        let buf = stream(&[0x21, 0x2A]);
        let mut r = Reader::new(&buf).unwrap();
        assert_eq!(r.next().unwrap(), Some(ValueKind::Int));
        assert_eq!(r.read_int().unwrap(), 42);
    }

    #[test]
    fn reads_string() {
        let buf = stream(&[0x83, b'b', b'o', b'o']);
        let mut r = Reader::new(&buf).unwrap();
        assert_eq!(r.next().unwrap(), Some(ValueKind::String));
        assert_eq!(r.read_string().unwrap(), "boo");
    }

    #[test]
    fn reads_nested_list() {
        // [1, 2]: list payload of two 2-byte positive-int values (tag + 1-byte magnitude each).
        let buf = stream(&[0xB4, 0x21, 0x01, 0x21, 0x02]);
        let mut r = Reader::new(&buf).unwrap();
        assert_eq!(r.next().unwrap(), Some(ValueKind::List));
        r.step_in().unwrap();
        assert_eq!(r.next().unwrap(), Some(ValueKind::Int));
        assert_eq!(r.read_int().unwrap(), 1);
        assert_eq!(r.next().unwrap(), Some(ValueKind::Int));
        assert_eq!(r.read_int().unwrap(), 2);
        assert_eq!(r.next().unwrap(), None);
        r.step_out().unwrap();
        assert_eq!(r.next().unwrap(), None);
    }

    #[test]
    fn typed_null_reports_is_null_and_kind() {
        let buf = stream(&[0x1F]);
        let mut r = Reader::new(&buf).unwrap();
        assert_eq!(r.next().unwrap(), Some(ValueKind::Bool));
        assert!(r.is_null());
    }

    #[test]
    fn nop_pad_is_skipped_silently() {
        let buf = stream(&[0x00, 0x21, 0x05]);
        let mut r = Reader::new(&buf).unwrap();
        assert_eq!(r.next().unwrap(), Some(ValueKind::Int));
        assert_eq!(r.read_int().unwrap(), 5);
    }

    #[test]
    fn negative_int_all_zero_magnitude_is_error() {
        let buf = stream(&[0x31, 0x00]);
        let mut r = Reader::new(&buf).unwrap();
        r.next().unwrap();
        assert!(r.read_bigint().is_err());
    }

    #[test]
    fn annotation_wrapper_zero_length_is_error() {
        // tag E, len 1 byte payload which is ann-len varuint 0x80 (0), invalid.
        let buf = stream(&[0xE1, 0x80]);
        let mut r = Reader::new(&buf).unwrap();
        assert!(r.next().is_err());
    }

    #[test]
    fn struct_field_names_resolve_against_symbol_table() {
        // struct field id 4 ("name" in the system table) -> bool true.
        let buf = stream(&[0xD2, 0x84, 0x11]);
        let mut r = Reader::new(&buf).unwrap();
        assert_eq!(r.next().unwrap(), Some(ValueKind::Struct));
        r.step_in().unwrap();
        assert_eq!(r.next().unwrap(), Some(ValueKind::Bool));
        assert_eq!(r.field_name().unwrap().text(), Some("name"));
    }

    #[test]
    fn ordered_struct_accepts_ascending_field_ids() {
        // D1 (ordered struct), len 6: field 1 -> Int(1), field 2 -> Int(2).
        let buf = stream(&[0xD1, 0x86, 0x81, 0x21, 0x01, 0x82, 0x21, 0x02]);
        let mut r = Reader::new(&buf).unwrap();
        assert_eq!(r.next().unwrap(), Some(ValueKind::Struct));
        r.step_in().unwrap();
        assert_eq!(r.next().unwrap(), Some(ValueKind::Int));
        assert_eq!(r.read_int().unwrap(), 1);
        assert_eq!(r.next().unwrap(), Some(ValueKind::Int));
        assert_eq!(r.read_int().unwrap(), 2);
    }

    #[test]
    fn ordered_struct_rejects_out_of_order_field_ids() {
        // Same struct as above but with fields 2 and 1 swapped.
        let buf = stream(&[0xD1, 0x86, 0x82, 0x21, 0x02, 0x81, 0x21, 0x01]);
        let mut r = Reader::new(&buf).unwrap();
        assert_eq!(r.next().unwrap(), Some(ValueKind::Struct));
        r.step_in().unwrap();
        assert_eq!(r.next().unwrap(), Some(ValueKind::Int));
        assert!(r.next().is_err());
    }

    #[test]
    fn ordered_struct_rejects_duplicate_field_ids() {
        let buf = stream(&[0xD1, 0x86, 0x81, 0x21, 0x01, 0x81, 0x21, 0x02]);
        let mut r = Reader::new(&buf).unwrap();
        assert_eq!(r.next().unwrap(), Some(ValueKind::Struct));
        r.step_in().unwrap();
        assert_eq!(r.next().unwrap(), Some(ValueKind::Int));
        assert!(r.next().is_err());
    }

    #[test]
    fn sticky_error_after_first_failure() {
        let buf = stream(&[0xFF]);
        let mut r = Reader::new(&buf).unwrap();
        assert!(r.next().is_err());
        assert!(r.next().is_err());
    }

    #[test]
    fn in_band_symbol_table_struct_is_consumed_not_yielded() {
        // $ion_symbol_table::{symbols: ["custom"]} followed by symbol $10.
        let mut payload = vec![
            0xEC, 0x81, 0x83, 0xD9, 0x87, 0xB7, 0x86, b'c', b'u', b's', b't', b'o', b'm',
        ];
        payload.extend_from_slice(&[0x71, 0x0A]);
        let buf = stream(&payload);
        let mut r = Reader::new(&buf).unwrap();
        assert_eq!(r.next().unwrap(), Some(ValueKind::Symbol));
        assert_eq!(r.read_symbol().unwrap().text(), Some("custom"));
        assert_eq!(r.next().unwrap(), None);
    }
}
