//! Arity-aware alias canonicalization.
//!
//! Facade names map to arity-tagged canonical names: `IList<T>` resolves
//! through the table to `IList_1<T>`. Catalog resolution order is
//! alias table → TS-name → CLR-name, with a deterministic arity-suffix
//! retry for names that were registered pre-tagged.

use rustc_hash::FxHashMap;

/// Facade-name → canonical-name table.
#[derive(Debug, Default)]
pub struct AliasTable {
    map: FxHashMap<String, String>,
}

impl AliasTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, facade: impl Into<String>, canonical: impl Into<String>) {
        self.map.insert(facade.into(), canonical.into());
    }

    /// Direct table lookup.
    #[must_use]
    pub fn lookup(&self, facade: &str) -> Option<&str> {
        self.map.get(facade).map(String::as_str)
    }

    /// Canonicalize a facade name used with `arity` type arguments.
    ///
    /// The table wins; otherwise generic uses retry with the `_N` arity
    /// suffix, and non-generic uses keep the name unchanged.
    #[must_use]
    pub fn canonicalize(&self, name: &str, arity: usize) -> String {
        if let Some(canonical) = self.map.get(name) {
            return canonical.clone();
        }
        if arity > 0 && !name.contains('_') {
            return format!("{name}_{arity}");
        }
        name.to_string()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_lookup() {
        let mut table = AliasTable::new();
        table.add("IList", "IList_1");
        assert_eq!(table.lookup("IList"), Some("IList_1"));
        assert_eq!(table.canonicalize("IList", 1), "IList_1");
    }

    #[test]
    fn test_arity_suffix_retry() {
        let table = AliasTable::new();
        assert_eq!(table.canonicalize("Dictionary", 2), "Dictionary_2");
        assert_eq!(table.canonicalize("Point", 0), "Point");
        // Already arity-tagged names pass through.
        assert_eq!(table.canonicalize("IList_1", 1), "IList_1");
    }
}
