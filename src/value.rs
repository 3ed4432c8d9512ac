//! The closed value model: a fourteen-variant tagged union, plus the
//! annotation/field-name envelope every value may carry.
//!
//! An owned tree that both the binary and text readers build and both
//! writers consume. Distinct typed-null and symbol/clob variants set it
//! apart from a plain JSON-shaped value model.

use num_bigint::BigInt;

use crate::bigint::Int;
use crate::decimal::Decimal;
use crate::symbol::SymbolToken;
use crate::timestamp::Timestamp;

/// Which of the fourteen kinds a (possibly null) value belongs to. Used
/// both as `Value`'s discriminant and to qualify a typed null
/// (`null.bool`, `null.list`, ...).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    Float,
    Decimal,
    Timestamp,
    Symbol,
    String,
    Clob,
    Blob,
    List,
    SExp,
    Struct,
}

/// A struct's fields: an ordered sequence of `(field name, value)` pairs.
/// Duplicate field names are permitted, so this is a `Vec`, not a map. Each
/// value is an `Element` rather than a bare `Value` so a field's value can
/// itself carry annotations (`foo: bar::1`).
pub type Fields = Vec<(SymbolToken, Element)>;

/// A decoded or to-be-encoded value, independent of its annotations or
/// field-name envelope (those live on [`Element`]).
#[derive(Clone, Debug)]
pub enum Value {
    /// An untyped `null`, or a typed null qualified by `ValueKind` (e.g.
    /// `null.bool`). `ValueKind::Null` itself means untyped.
    Null(ValueKind),
    Bool(bool),
    Int(Int),
    Float(f64),
    Decimal(Decimal),
    Timestamp(Timestamp),
    Symbol(SymbolToken),
    String(String),
    /// A clob: a byte string whose bytes are restricted to <= 0x7F in text
    /// form but carried here as raw bytes regardless of encoding.
    Clob(Vec<u8>),
    Blob(Vec<u8>),
    List(Vec<Element>),
    /// An S-expression: like `List`, but its text form additionally
    /// accepts operator-symbol tokens as peer values; those appear here as
    /// ordinary `Symbol` elements.
    SExp(Vec<Element>),
    Struct(Fields),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null(k) => *k,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Decimal(_) => ValueKind::Decimal,
            Value::Timestamp(_) => ValueKind::Timestamp,
            Value::Symbol(_) => ValueKind::Symbol,
            Value::String(_) => ValueKind::String,
            Value::Clob(_) => ValueKind::Clob,
            Value::Blob(_) => ValueKind::Blob,
            Value::List(_) => ValueKind::List,
            Value::SExp(_) => ValueKind::SExp,
            Value::Struct(_) => ValueKind::Struct,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null(_))
    }

    /// Wrap in an [`Element`] with no annotations and no field name.
    pub fn into_element(self) -> Element {
        Element {
            annotations: Vec::new(),
            field_name: None,
            value: self,
        }
    }

    pub fn int(n: impl Into<BigInt>) -> Self {
        Value::Int(Int::from(n.into()))
    }
}

/// A value together with its annotation sequence and, when it is an
/// immediate child of a `Struct`, its field name.
#[derive(Clone, Debug)]
pub struct Element {
    annotations: Vec<SymbolToken>,
    field_name: Option<SymbolToken>,
    value: Value,
}

impl Element {
    pub fn new(value: Value) -> Self {
        Element {
            annotations: Vec::new(),
            field_name: None,
            value,
        }
    }

    pub fn with_annotations(mut self, annotations: Vec<SymbolToken>) -> Self {
        self.annotations = annotations;
        self
    }

    pub fn with_field_name(mut self, field_name: SymbolToken) -> Self {
        self.field_name = Some(field_name);
        self
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    pub fn annotations(&self) -> &[SymbolToken] {
        &self.annotations
    }

    pub fn field_name(&self) -> Option<&SymbolToken> {
        self.field_name.as_ref()
    }

    pub fn kind(&self) -> ValueKind {
        self.value.kind()
    }
}

/// Structural equality between two elements' values. A `Struct`'s fields
/// are treated as an ordered list of `(field_name, value)` pairs — two
/// structs with the same fields in a different order are not equal.
/// Annotation text and field-name text participate in comparison only
/// through [`SymbolToken`]'s own text-or-id equality.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null(a), Value::Null(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => {
                a.to_bits() == b.to_bits() || a == b
            }
            (Value::Decimal(a), Value::Decimal(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Clob(a), Value::Clob(b)) => a == b,
            (Value::Blob(a), Value::Blob(b)) => a == b,
            (Value::List(a), Value::List(b)) | (Value::SExp(a), Value::SExp(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x == y)
            }
            (Value::Struct(a), Value::Struct(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b)
                        .all(|((fa, ea), (fb, eb))| fa == fb && ea == eb)
            }
            _ => false,
        }
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
            && self.annotations == other.annotations
            && self.field_name == other.field_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_null_carries_its_kind() {
        let v = Value::Null(ValueKind::String);
        assert!(v.is_null());
        assert_eq!(v.kind(), ValueKind::String);
    }

    #[test]
    fn struct_field_order_matters_for_equality() {
        let a = Value::Struct(vec![
            (SymbolToken::from_text("a"), Value::int(1).into_element()),
            (SymbolToken::from_text("b"), Value::int(2).into_element()),
        ]);
        let b = Value::Struct(vec![
            (SymbolToken::from_text("b"), Value::int(2).into_element()),
            (SymbolToken::from_text("a"), Value::int(1).into_element()),
        ]);
        assert_ne!(a, b);
    }

    #[test]
    fn struct_allows_duplicate_field_names() {
        let s = Value::Struct(vec![
            (SymbolToken::from_text("a"), Value::int(1).into_element()),
            (SymbolToken::from_text("a"), Value::int(2).into_element()),
        ]);
        if let Value::Struct(fields) = s {
            assert_eq!(fields.len(), 2);
        } else {
            panic!("expected struct");
        }
    }

    #[test]
    fn struct_field_value_carries_its_own_annotations() {
        let s = Value::Struct(vec![(
            SymbolToken::from_text("a"),
            Value::int(1).into_element().with_annotations(vec![SymbolToken::from_text("tag")]),
        )]);
        if let Value::Struct(fields) = s {
            assert_eq!(fields[0].1.annotations()[0].text(), Some("tag"));
        } else {
            panic!("expected struct");
        }
    }

    #[test]
    fn element_carries_annotations_and_field_name() {
        let el = Value::Bool(true)
            .into_element()
            .with_annotations(vec![SymbolToken::from_text("tag")])
            .with_field_name(SymbolToken::from_text("flag"));
        assert_eq!(el.annotations().len(), 1);
        assert_eq!(el.field_name().unwrap().text(), Some("flag"));
    }
}
