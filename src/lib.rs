//! A self-describing, richly-typed data serialization format with binary
//! and text encodings: a closed tagged-union value model shared by a
//! streaming binary reader/writer and a text tokenizer/parser/writer,
//! governed by a two-level shared/local symbol table.
//!
//! No reflection or derive layer lives here — callers build and walk the
//! [`Value`] tree directly, the same way they'd drive either [`binary`] or
//! [`text`] writer through its `Begin*`/`Write*`/`End*`/`finish` calls.

#![allow(clippy::too_many_arguments)]

pub mod bigint;
pub mod binary;
pub mod decimal;
pub mod depth_tracking;
pub mod error;
pub mod marker;
pub mod symbol;
pub mod text;
pub mod timestamp;
pub mod value;
pub mod varint;

pub use bigint::Int;
pub use binary::{Reader, Writer};
pub use decimal::Decimal;
pub use error::{Error, Result};
pub use symbol::{Catalog, LocalTable, MemoryCatalog, SharedTable, SymbolToken};
pub use text::{Parser, TextWriter, TextWriterBuilder};
pub use timestamp::{Offset, Precision, Timestamp};
pub use value::{Element, Fields, Value, ValueKind};

/// Deepest container nesting a reader or writer will accept before
/// declaring the stream malformed.
pub use depth_tracking::MAX_DEPTH;

/// Largest symbol ID this crate will assign or resolve.
pub use symbol::MAX_SYMBOL_ID;
