//! Symbol interning: system table, shared tables, local tables, and the
//! symbol token that ties a stream value to a resolved or unresolved name.
//!
//! Imports contribute contiguous ID ranges, with local symbols appended
//! after them; a symbol ID that resolves against none of those ranges
//! becomes an unresolved token rather than an error.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};

/// Maximum symbol ID this crate will assign or resolve.
pub const MAX_SYMBOL_ID: u32 = (1 << 31) - 1;

/// A reference to where a symbol token's identity came from: a shared table
/// name and the 1-based position within it, or nothing (e.g. a bare local
/// symbol or a fully-unknown token).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Source {
    pub table: String,
    pub sid: u32,
}

/// A symbol token: `(text?, local_id?, source?)`. At least one of `text` or
/// `local_id` must be present; enforced by the constructors, not by the
/// type itself, since a token freshly parsed from text has no ID yet and
/// one freshly read from a binary stream with an unresolvable ID has no
/// text yet.
#[derive(Clone, Debug)]
pub struct SymbolToken {
    text: Option<String>,
    local_id: Option<u32>,
    source: Option<Source>,
}

impl SymbolToken {
    /// A token known only by its text (e.g. freshly parsed from text Ion,
    /// not yet interned against any table).
    pub fn from_text(text: impl Into<String>) -> Self {
        SymbolToken {
            text: Some(text.into()),
            local_id: None,
            source: None,
        }
    }

    /// A token known only by a local symbol ID (e.g. read from a binary
    /// stream before the active table was consulted).
    pub fn from_id(id: u32) -> Self {
        SymbolToken {
            text: None,
            local_id: Some(id),
            source: None,
        }
    }

    /// A token with both text and a resolved ID, optionally attributing the
    /// text to a shared table.
    pub fn new(text: impl Into<String>, local_id: u32, source: Option<Source>) -> Self {
        SymbolToken {
            text: Some(text.into()),
            local_id: Some(local_id),
            source,
        }
    }

    /// A token whose ID could not be resolved against any known table.
    /// Carries no text; kept rather than rejected as an error.
    pub fn unresolved(id: u32) -> Self {
        SymbolToken {
            text: None,
            local_id: Some(id),
            source: None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn local_id(&self) -> Option<u32> {
        self.local_id
    }

    pub fn source(&self) -> Option<&Source> {
        self.source.as_ref()
    }

    /// True if this token's ID could not be resolved to text by the table
    /// active when it was read.
    pub fn is_unknown(&self) -> bool {
        self.text.is_none()
    }
}

/// Two tokens are equal iff their resolved texts are equal; if either side
/// lacks text, fall back to comparing IDs under the governing symbol
/// table.
impl PartialEq for SymbolToken {
    fn eq(&self, other: &Self) -> bool {
        match (&self.text, &other.text) {
            (Some(a), Some(b)) => a == b,
            _ => self.local_id.is_some() && self.local_id == other.local_id,
        }
    }
}

impl fmt::Display for SymbolToken {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match (&self.text, self.local_id) {
            (Some(t), _) => write!(f, "{t}"),
            (None, Some(id)) => write!(f, "${id}"),
            (None, None) => write!(f, "$0"),
        }
    }
}

/// An immutable, externally-referenceable symbol table. Defines a
/// contiguous range of symbol IDs starting at 1.
#[derive(Clone, Debug)]
pub struct SharedTable {
    name: String,
    version: u32,
    symbols: Vec<Option<String>>,
}

impl SharedTable {
    pub fn new(name: impl Into<String>, version: u32, symbols: Vec<Option<String>>) -> Self {
        SharedTable {
            name: name.into(),
            version,
            symbols,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// The table's own `max_id`: the number of symbol slots it defines.
    pub fn max_id(&self) -> u32 {
        self.symbols.len() as u32
    }

    /// Resolve a 1-based position within this table to text, if any.
    pub fn get(&self, sid: u32) -> Option<&str> {
        if sid == 0 {
            return None;
        }
        self.symbols
            .get(sid as usize - 1)
            .and_then(|s| s.as_deref())
    }

    /// Adjust this table to a different `max_id`. Shrinking truncates and
    /// re-indexes (later IDs cease to exist); growing reserves unresolved
    /// IDs at the top, a "gap" region that resolves to no text (spec
    /// §4.5).
    pub fn adjusted(&self, max_id: u32) -> SharedTable {
        let mut symbols = self.symbols.clone();
        symbols.resize(max_id as usize, None);
        SharedTable {
            name: self.name.clone(),
            version: self.version,
            symbols,
        }
    }
}

/// The built-in shared system table, version 1.
pub fn system_table() -> SharedTable {
    SharedTable::new(
        "$ion",
        1,
        vec![
            Some("$ion".to_string()),
            Some("$ion_1_0".to_string()),
            Some("$ion_symbol_table".to_string()),
            Some("name".to_string()),
            Some("version".to_string()),
            Some("imports".to_string()),
            Some("symbols".to_string()),
            Some("max_id".to_string()),
            Some("$ion_shared_symbol_table".to_string()),
        ],
    )
}

/// One entry in a local table's import list: a shared table plus the
/// `max_id` this stream actually uses from it (which may differ from the
/// table's own `max_id` after an adjustment).
#[derive(Clone)]
struct Import {
    table: Arc<SharedTable>,
    max_id: u32,
}

/// `(imports, locals)`: the active table for a stream segment. Lookup order
/// is the system table (implicitly at position 0), then declared imports in
/// order, then locally appended symbols.
#[derive(Clone)]
pub struct LocalTable {
    system: SharedTable,
    imports: Vec<Import>,
    locals: Vec<Option<String>>,
}

impl LocalTable {
    /// A fresh local table with no imports beyond the system table, as
    /// established at every version-marker boundary.
    pub fn new() -> Self {
        LocalTable {
            system: system_table(),
            imports: Vec::new(),
            locals: Vec::new(),
        }
    }

    /// Sum of every import's contributed `max_id` (including the system
    /// table), i.e. the first ID a locally-appended symbol receives.
    fn imports_max_id(&self) -> u32 {
        self.system.max_id() + self.imports.iter().map(|i| i.max_id).sum::<u32>()
    }

    /// Append a shared-table import with the given effective `max_id`.
    pub fn add_import(&mut self, table: Arc<SharedTable>, max_id: u32) {
        self.imports.push(Import { table, max_id });
    }

    /// Intern a new local symbol, returning its assigned ID.
    pub fn add_local(&mut self, text: impl Into<String>) -> u32 {
        self.locals.push(Some(text.into()));
        self.imports_max_id() + self.locals.len() as u32
    }

    /// Reserve a gap ID: a local slot with no text (from a `null` or
    /// non-string entry in an in-band `symbols` list).
    pub fn add_gap(&mut self) -> u32 {
        self.locals.push(None);
        self.imports_max_id() + self.locals.len() as u32
    }

    /// Resolve an ID to text, if any table in the lookup chain defines it.
    pub fn resolve(&self, sid: u32) -> Option<&str> {
        if sid == 0 {
            return None;
        }
        if sid <= self.system.max_id() {
            return self.system.get(sid);
        }
        let mut base = self.system.max_id();
        for import in &self.imports {
            if sid <= base + import.max_id {
                return import.table.get(sid - base);
            }
            base += import.max_id;
        }
        let local_index = sid.checked_sub(base)?;
        self.locals
            .get(local_index as usize - 1)
            .and_then(|s| s.as_deref())
    }

    /// Intern `text`, reusing an existing ID if one already resolves to the
    /// same text, otherwise minting a new local one.
    pub fn intern(&mut self, text: &str) -> u32 {
        if let Some(id) = self.find(text) {
            return id;
        }
        self.add_local(text)
    }

    /// Find the lowest ID (by lookup order) currently resolving to `text`.
    pub fn find(&self, text: &str) -> Option<u32> {
        for (i, s) in self.system.symbols.iter().enumerate() {
            if s.as_deref() == Some(text) {
                return Some(i as u32 + 1);
            }
        }
        let mut base = self.system.max_id();
        for import in &self.imports {
            for i in 0..import.max_id {
                if import.table.get(i + 1) == Some(text) {
                    return Some(base + i + 1);
                }
            }
            base += import.max_id;
        }
        for (i, s) in self.locals.iter().enumerate() {
            if s.as_deref() == Some(text) {
                return Some(base + i as u32 + 1);
            }
        }
        None
    }

    /// Turn a bare ID into a full [`SymbolToken`]. When resolution fails
    /// the token is kept with no text rather than rejected as an error.
    pub fn token_for_id(&self, sid: u32) -> SymbolToken {
        match self.resolve(sid) {
            Some(text) => SymbolToken::new(text, sid, None),
            None => SymbolToken::unresolved(sid),
        }
    }

    /// The highest ID currently assigned by this table (imports + locals).
    pub fn max_id(&self) -> u32 {
        self.imports_max_id() + self.locals.len() as u32
    }

    /// The locally-appended symbol slots, in assignment order. Used by the
    /// binary writer to serialize the `symbols` field of an in-band
    /// `$ion_symbol_table` struct at `Finish`.
    pub(crate) fn locals(&self) -> &[Option<String>] {
        &self.locals
    }
}

impl Default for LocalTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Caller-supplied resolver for shared-table imports named in an in-band
/// `$ion_symbol_table` struct. Persistence (loading a named/versioned table
/// from disk or network) is explicitly out of scope; this trait is only the
/// lookup seam.
pub trait Catalog {
    /// Look up a shared table by name and version. Returns `None` if the
    /// table is unknown, in which case the importing local table falls back
    /// to the bogus-placeholder policy: the import contributes `max_id`
    /// unresolved IDs with no text.
    fn lookup(&self, name: &str, version: u32) -> Option<Arc<SharedTable>>;
}

/// An in-memory [`Catalog`] backed by a `HashMap`, suitable for tests and
/// small embedders that don't need external persistence.
#[derive(Default)]
pub struct MemoryCatalog {
    tables: HashMap<(String, u32), Arc<SharedTable>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        MemoryCatalog::default()
    }

    pub fn insert(&mut self, table: SharedTable) {
        self.tables
            .insert((table.name().to_string(), table.version()), Arc::new(table));
    }
}

impl Catalog for MemoryCatalog {
    fn lookup(&self, name: &str, version: u32) -> Option<Arc<SharedTable>> {
        self.tables.get(&(name.to_string(), version)).cloned()
    }
}

/// Validate a symbol ID against the format's hard ceiling (`2^31`).
pub(crate) fn check_symbol_id(id: u64, offset: usize) -> Result<u32> {
    if id >= 1u64 << 31 {
        return Err(Error::Syntax {
            offset,
            cause: format!("symbol ID {id} exceeds 2^31"),
        });
    }
    Ok(id as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_table_has_nine_fixed_entries() {
        let sys = system_table();
        assert_eq!(sys.max_id(), 9);
        assert_eq!(sys.get(1), Some("$ion"));
        assert_eq!(sys.get(9), Some("$ion_shared_symbol_table"));
    }

    #[test]
    fn local_table_assigns_ids_after_system_table() {
        let mut t = LocalTable::new();
        let id = t.add_local("foo");
        assert_eq!(id, 10);
        assert_eq!(t.resolve(10), Some("foo"));
    }

    #[test]
    fn intern_reuses_existing_id() {
        let mut t = LocalTable::new();
        let a = t.intern("foo");
        let b = t.intern("foo");
        assert_eq!(a, b);
        assert_eq!(t.resolve(a), Some("foo"));
    }

    #[test]
    fn import_contributes_contiguous_range() {
        let shared = Arc::new(SharedTable::new(
            "shared",
            1,
            vec![Some("a".into()), Some("b".into())],
        ));
        let mut t = LocalTable::new();
        t.add_import(shared, 2);
        assert_eq!(t.resolve(10), Some("a"));
        assert_eq!(t.resolve(11), Some("b"));
        let local = t.add_local("c");
        assert_eq!(local, 12);
    }

    #[test]
    fn adjusted_growing_reserves_gap_ids() {
        let shared = SharedTable::new("shared", 1, vec![Some("a".into())]);
        let grown = shared.adjusted(3);
        assert_eq!(grown.max_id(), 3);
        assert_eq!(grown.get(1), Some("a"));
        assert_eq!(grown.get(2), None);
        assert_eq!(grown.get(3), None);
    }

    #[test]
    fn adjusted_shrinking_truncates() {
        let shared = SharedTable::new(
            "shared",
            1,
            vec![Some("a".into()), Some("b".into()), Some("c".into())],
        );
        let shrunk = shared.adjusted(1);
        assert_eq!(shrunk.max_id(), 1);
        assert_eq!(shrunk.get(1), Some("a"));
        assert_eq!(shrunk.get(2), None);
    }

    #[test]
    fn unresolved_id_is_bogus_placeholder_not_error() {
        let t = LocalTable::new();
        let token = t.token_for_id(999);
        assert!(token.is_unknown());
        assert_eq!(token.local_id(), Some(999));
    }

    #[test]
    fn token_equality_by_text_or_id() {
        let a = SymbolToken::from_text("foo");
        let b = SymbolToken::new("foo", 42, None);
        assert_eq!(a, b);

        let c = SymbolToken::unresolved(5);
        let d = SymbolToken::unresolved(5);
        assert_eq!(c, d);

        let e = SymbolToken::unresolved(6);
        assert_ne!(c, e);
    }

    #[test]
    fn memory_catalog_round_trip() {
        let mut cat = MemoryCatalog::new();
        cat.insert(SharedTable::new("shared", 1, vec![Some("x".into())]));
        let found = cat.lookup("shared", 1).unwrap();
        assert_eq!(found.get(1), Some("x"));
        assert!(cat.lookup("shared", 2).is_none());
    }

    #[test]
    fn symbol_id_over_limit_is_rejected() {
        assert!(check_symbol_id(1u64 << 31, 0).is_err());
        assert!(check_symbol_id((1u64 << 31) - 1, 0).is_ok());
    }
}
