//! Scope chain for name resolution (`spec.md` §3, §9).
//!
//! A program re-creates its whole symbol table from scratch on every
//! analysis run, and scopes never outlive that one run, so this is a
//! plain stack of frames with a parent *index* rather than the teacher's
//! `RibId`/`IndexVec` arena — no lifetime coupling to worry about once a
//! call's frame is popped, and nothing here is reused across runs.

use pseudoc_par::{ArrayDim, DataType};
use pseudoc_util::Symbol;
use rustc_hash::FxHashMap;

#[derive(Clone, Debug)]
pub struct SymbolEntry {
    pub ty: DataType,
    pub assigned: bool,
    pub is_array: bool,
    pub dimensions: Option<Vec<ArrayDim>>,
    pub is_constant: bool,
}

struct Scope {
    bindings: FxHashMap<Symbol, SymbolEntry>,
    parent: Option<usize>,
}

/// A stack of scopes threaded by parent index. `DECLARE` writes only to
/// the current scope; `lookup` walks toward the root.
pub struct SymbolTable {
    scopes: Vec<Scope>,
    current: usize,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self { scopes: vec![Scope { bindings: FxHashMap::default(), parent: None }], current: 0 }
    }

    pub fn enter_scope(&mut self) {
        self.scopes.push(Scope { bindings: FxHashMap::default(), parent: Some(self.current) });
        self.current = self.scopes.len() - 1;
    }

    pub fn exit_scope(&mut self) {
        if let Some(parent) = self.scopes[self.current].parent {
            self.current = parent;
        }
    }

    /// `true` if `name` is already bound in the *current* scope — used to
    /// report "duplicate declaration in same scope" without rejecting
    /// shadowing of an outer scope's name.
    pub fn declared_in_current_scope(&self, name: Symbol) -> bool {
        self.scopes[self.current].bindings.contains_key(&name)
    }

    pub fn declare(&mut self, name: Symbol, entry: SymbolEntry) {
        self.scopes[self.current].bindings.insert(name, entry);
    }

    pub fn lookup(&self, name: Symbol) -> Option<&SymbolEntry> {
        let mut scope_id = self.current;
        loop {
            if let Some(entry) = self.scopes[scope_id].bindings.get(&name) {
                return Some(entry);
            }
            match self.scopes[scope_id].parent {
                Some(parent) => scope_id = parent,
                None => return None,
            }
        }
    }

    /// Marks `name` assigned in whichever scope along the chain binds it.
    /// Returns `false` if `name` is not bound anywhere.
    pub fn mark_assigned(&mut self, name: Symbol) -> bool {
        let mut scope_id = self.current;
        loop {
            if let Some(entry) = self.scopes[scope_id].bindings.get_mut(&name) {
                entry.assigned = true;
                return true;
            }
            match self.scopes[scope_id].parent {
                Some(parent) => scope_id = parent,
                None => return false,
            }
        }
    }
}
