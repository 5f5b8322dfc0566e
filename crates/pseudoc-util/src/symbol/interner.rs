use super::Symbol;
use rustc_hash::FxHashMap;

/// Owned string table for one compilation.
///
/// Interning is a hash lookup into `by_name`; on a miss the string is
/// boxed once and pushed to `strings`, so `resolve` is a plain index into
/// a `Vec` rather than the linear scan a concurrent, append-only table
/// would need.
#[derive(Debug, Default)]
pub struct Interner {
    strings: Vec<Box<str>>,
    by_name: FxHashMap<Box<str>, u32>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `s`, returning the existing symbol if already interned.
    pub fn intern(&mut self, s: &str) -> Symbol {
        if let Some(&index) = self.by_name.get(s) {
            return Symbol::from_index(index);
        }
        let index = self.strings.len() as u32;
        let boxed: Box<str> = s.into();
        self.strings.push(boxed.clone());
        self.by_name.insert(boxed, index);
        Symbol::from_index(index)
    }

    /// Look up the string a symbol was interned from.
    ///
    /// # Panics
    /// Panics if `symbol` was interned by a different `Interner`.
    pub fn resolve(&self, symbol: Symbol) -> &str {
        &self.strings[symbol.index()]
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_same_string_returns_same_symbol() {
        let mut interner = Interner::new();
        let a = interner.intern("total");
        let b = interner.intern("total");
        assert_eq!(a, b);
    }

    #[test]
    fn interning_different_strings_returns_different_symbols() {
        let mut interner = Interner::new();
        let a = interner.intern("total");
        let b = interner.intern("count");
        assert_ne!(a, b);
    }

    #[test]
    fn resolve_roundtrips_the_original_string() {
        let mut interner = Interner::new();
        let sym = interner.intern("Index");
        assert_eq!(interner.resolve(sym), "Index");
    }

    #[test]
    fn case_is_preserved_for_identifiers() {
        let mut interner = Interner::new();
        let lower = interner.intern("x");
        let upper = interner.intern("X");
        assert_ne!(lower, upper);
    }
}
