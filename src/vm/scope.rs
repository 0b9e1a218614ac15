//! Environment-stack operations.
//!
//! The environment stack is a heap vector of environment chains; a chain is
//! a cons list of scope-frame dicts, innermost frame first. The bottom chain
//! is the global environment and is never popped.

use crate::core::error::LispError;
use crate::core::value::{Handle, Val};
use crate::vm::engine::Interp;
use tracing::trace;

impl Interp {
    /// The currently active environment chain (top of the stack).
    pub fn current_chain(&self) -> Result<Handle, LispError> {
        self.heap.vec_get(self.scopes, -1)
    }

    pub fn push_chain(&mut self, chain: Handle) {
        trace!(depth = self.env_depth(), "pushing scope chain");
        self.heap
            .vec_push(self.scopes, chain)
            .expect("environment stack is a vector");
    }

    pub fn pop_chain(&mut self) {
        trace!(depth = self.env_depth(), "popping scope chain");
        self.heap
            .vec_remove(self.scopes, -1)
            .expect("environment stack is non-empty");
    }

    pub fn env_depth(&self) -> usize {
        self.heap
            .vec_len(self.scopes)
            .expect("environment stack is a vector")
    }

    /// Bind `sym` in the innermost frame of the active chain. Fails if the
    /// frame already binds it.
    pub fn define(&mut self, sym: Handle, val: Handle) -> Result<(), LispError> {
        let chain = self.current_chain()?;
        let (frame, _) = self.heap.cons_parts(chain)?;
        if self.heap.dict_get(frame, sym)?.is_some() {
            return Err(LispError::Redefined {
                name: self.symbol_name(sym),
            });
        }
        self.heap.dict_set(frame, sym, val)
    }

    /// Resolve `sym` against the active chain, innermost frame outward.
    pub fn lookup(&self, sym: Handle) -> Result<Handle, LispError> {
        let mut node = self.current_chain()?;
        while node != self.nil {
            let (frame, next) = self.heap.cons_parts(node)?;
            if let Some(val) = self.heap.dict_get(frame, sym)? {
                return Ok(val);
            }
            node = next;
        }
        Err(LispError::Unbound {
            name: self.symbol_name(sym),
        })
    }

    /// Update the first frame that binds `sym`. Fails if no frame does.
    pub fn assign(&mut self, sym: Handle, val: Handle) -> Result<(), LispError> {
        let mut node = self.current_chain()?;
        while node != self.nil {
            let (frame, next) = self.heap.cons_parts(node)?;
            if self.heap.dict_get(frame, sym)?.is_some() {
                return self.heap.dict_set(frame, sym, val);
            }
            node = next;
        }
        Err(LispError::Unbound {
            name: self.symbol_name(sym),
        })
    }

    pub fn symbol_name(&self, h: Handle) -> String {
        match self.heap.get(h) {
            Val::Sym(sym) => self.symbols.name(*sym).to_string(),
            other => format!("<{}>", other.type_name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::core::error::LispError;
    use crate::core::value::Val;
    use crate::vm::engine::Interp;

    #[test]
    fn define_then_lookup() {
        let mut interp = Interp::new();
        let sym = interp.intern("x").unwrap();
        let val = interp.heap.alloc(Val::Int(10));
        interp.define(sym, val).unwrap();
        assert_eq!(interp.lookup(sym).unwrap(), val);
    }

    #[test]
    fn define_twice_in_same_frame_fails() {
        let mut interp = Interp::new();
        let sym = interp.intern("x").unwrap();
        let val = interp.heap.alloc(Val::Int(10));
        interp.define(sym, val).unwrap();
        assert!(matches!(
            interp.define(sym, val),
            Err(LispError::Redefined { .. })
        ));
    }

    #[test]
    fn lookup_of_missing_symbol_fails() {
        let mut interp = Interp::new();
        let sym = interp.intern("nope").unwrap();
        assert!(matches!(
            interp.lookup(sym),
            Err(LispError::Unbound { .. })
        ));
    }

    #[test]
    fn inner_frame_shadows_outer() {
        let mut interp = Interp::new();
        let sym = interp.intern("x").unwrap();
        let outer = interp.heap.alloc(Val::Int(1));
        interp.define(sym, outer).unwrap();

        // build a chain with a fresh inner frame over the global chain
        let global = interp.current_chain().unwrap();
        let frame = interp
            .heap
            .alloc(Val::Dict(crate::core::dict::DictTable::new()));
        let chain = interp.heap.alloc(Val::Cons(frame, global));
        interp.push_chain(chain);

        assert_eq!(interp.lookup(sym).unwrap(), outer);
        let inner = interp.heap.alloc(Val::Int(2));
        interp.define(sym, inner).unwrap();
        assert_eq!(interp.lookup(sym).unwrap(), inner);

        interp.pop_chain();
        assert_eq!(interp.lookup(sym).unwrap(), outer);
    }

    #[test]
    fn assign_updates_the_binding_frame() {
        let mut interp = Interp::new();
        let sym = interp.intern("x").unwrap();
        let first = interp.heap.alloc(Val::Int(1));
        interp.define(sym, first).unwrap();

        let second = interp.heap.alloc(Val::Int(2));
        interp.assign(sym, second).unwrap();
        assert_eq!(interp.lookup(sym).unwrap(), second);
    }

    #[test]
    fn assign_to_unbound_symbol_fails() {
        let mut interp = Interp::new();
        let sym = interp.intern("ghost").unwrap();
        let val = interp.heap.alloc(Val::Int(1));
        assert!(matches!(
            interp.assign(sym, val),
            Err(LispError::Unbound { .. })
        ));
    }
}
