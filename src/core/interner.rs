use crate::core::error::LispError;
use crate::core::heap::Heap;
use crate::core::value::{Handle, Symbol, Val};
use indexmap::IndexMap;

/// Names longer than this are truncated at intern time.
pub const MAX_SYMBOL_LEN: usize = 32;
/// Fixed pool capacity; interning past it is a resource error.
pub const MAX_SYMBOLS: usize = 256;

/// Fixed-capacity symbol pool.
///
/// Each name maps to one pinned heap record, so symbol identity is object
/// identity and two symbols are the same object exactly when their names
/// match. The insertion index doubles as the [`Symbol`] id. Symbols are
/// never collected.
#[derive(Debug, Default)]
pub struct SymbolPool {
    names: IndexMap<String, Handle>,
}

impl SymbolPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the canonical handle for `name`, interning it if new.
    pub fn intern(&mut self, heap: &mut Heap, name: &str) -> Result<Handle, LispError> {
        let name = truncate(name);
        if let Some(&h) = self.names.get(name) {
            return Ok(h);
        }
        if self.names.len() >= MAX_SYMBOLS {
            return Err(LispError::Resource("symbol pool full".to_string()));
        }
        let sym = Symbol(self.names.len() as u32);
        let h = heap.alloc_pinned(Val::Sym(sym));
        self.names.insert(name.to_string(), h);
        Ok(h)
    }

    pub fn name(&self, sym: Symbol) -> &str {
        self.names
            .get_index(sym.0 as usize)
            .map(|(name, _)| name.as_str())
            .unwrap_or("?")
    }

    pub fn handle(&self, sym: Symbol) -> Option<Handle> {
        self.names.get_index(sym.0 as usize).map(|(_, &h)| h)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

fn truncate(name: &str) -> &str {
    if name.len() <= MAX_SYMBOL_LEN {
        return name;
    }
    let mut end = MAX_SYMBOL_LEN;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_idempotent() {
        let mut heap = Heap::new();
        let mut pool = SymbolPool::new();
        let a = pool.intern(&mut heap, "foo").unwrap();
        let b = pool.intern(&mut heap, "foo").unwrap();
        assert_eq!(a, b);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn distinct_names_get_distinct_handles() {
        let mut heap = Heap::new();
        let mut pool = SymbolPool::new();
        let a = pool.intern(&mut heap, "foo").unwrap();
        let b = pool.intern(&mut heap, "bar").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn long_names_are_truncated() {
        let mut heap = Heap::new();
        let mut pool = SymbolPool::new();
        let long = "a".repeat(40);
        let a = pool.intern(&mut heap, &long).unwrap();
        let b = pool.intern(&mut heap, &"a".repeat(MAX_SYMBOL_LEN)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn symbols_survive_collection_without_roots() {
        let mut heap = Heap::new();
        let mut pool = SymbolPool::new();
        let h = pool.intern(&mut heap, "keepme").unwrap();
        heap.collect(&[]);
        assert!(matches!(heap.get(h), Val::Sym(_)));
    }

    #[test]
    fn pool_exhaustion_is_a_resource_error() {
        let mut heap = Heap::new();
        let mut pool = SymbolPool::new();
        for i in 0..MAX_SYMBOLS {
            pool.intern(&mut heap, &format!("sym-{}", i)).unwrap();
        }
        assert!(matches!(
            pool.intern(&mut heap, "one-too-many"),
            Err(LispError::Resource(_))
        ));
    }
}
