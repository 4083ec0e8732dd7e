//! The flat, append-only symbol table shared by the parser and code generator.

use crate::error::{resource_error, ResourceError};

/// Entries never shrink below this; exhaustion past it is a [`ResourceError`].
pub const CAPACITY: usize = 256;

#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum SymbolKind {
    Var,
    Func,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub value: i32,
    pub name: String,
}

/// A 1-based directory of variables and functions. Index `0` means "absent".
#[derive(Debug, Default)]
pub struct SymbolTable {
    entries: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new() -> SymbolTable {
        SymbolTable { entries: Vec::new() }
    }

    /// Newest-to-oldest linear scan for `(name, kind)`; `0` if not found.
    pub fn find(&self, name: &str, kind: SymbolKind) -> usize {
        for (i, entry) in self.entries.iter().enumerate().rev() {
            if entry.kind == kind && entry.name == name {
                return i + 1;
            }
        }
        0
    }

    /// Appends a new entry with `value` initialized to `0` and returns its index.
    pub fn insert(&mut self, name: &str, kind: SymbolKind) -> Result<usize, ResourceError> {
        if self.entries.len() >= CAPACITY {
            return Err(resource_error("symbol table is full"));
        }
        self.entries.push(Symbol { kind, value: 0, name: name.to_string() });
        Ok(self.entries.len())
    }

    pub fn get(&self, index: usize) -> &Symbol {
        &self.entries[index - 1]
    }

    pub fn set_value(&mut self, index: usize, value: i32) {
        self.entries[index - 1].value = value;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in insertion order, 1-based index paired with the symbol.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Symbol)> {
        self.entries.iter().enumerate().map(|(i, s)| (i + 1, s))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn insert_returns_one_based_indices() {
        let mut table = SymbolTable::new();
        assert_eq!(table.insert("a", SymbolKind::Var).unwrap(), 1);
        assert_eq!(table.insert("b", SymbolKind::Var).unwrap(), 2);
    }

    #[test]
    fn find_prefers_the_newest_match() {
        let mut table = SymbolTable::new();
        table.insert("x", SymbolKind::Var).unwrap();
        let newest = table.insert("x", SymbolKind::Var).unwrap();
        assert_eq!(table.find("x", SymbolKind::Var), newest);
    }

    #[test]
    fn var_and_func_kinds_coexist_under_the_same_name() {
        let mut table = SymbolTable::new();
        let var = table.insert("f", SymbolKind::Var).unwrap();
        let func = table.insert("f", SymbolKind::Func).unwrap();
        assert_eq!(table.find("f", SymbolKind::Var), var);
        assert_eq!(table.find("f", SymbolKind::Func), func);
    }

    #[test]
    fn find_misses_return_zero() {
        let table = SymbolTable::new();
        assert_eq!(table.find("missing", SymbolKind::Var), 0);
    }

    #[test]
    fn insert_fails_once_capacity_is_exhausted() {
        let mut table = SymbolTable::new();
        for i in 0..CAPACITY {
            table.insert(&format!("v{}", i), SymbolKind::Var).unwrap();
        }
        assert!(table.insert("overflow", SymbolKind::Var).is_err());
    }
}
