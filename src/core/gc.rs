//! Tracing mark-and-sweep collection over the slot heap.
//!
//! The object graph may be cyclic: a closure captures an environment chain
//! whose innermost frame can name the closure itself. Marking is therefore
//! an iterative worklist that visits each record at most once. Pinned slots
//! (symbols, `nil`/`t`, type descriptors, builtins) survive every sweep
//! without being rooted.

use crate::core::heap::{Heap, RECORD_OVERHEAD};
use crate::core::value::{Handle, Val};
use tracing::{debug, warn};

/// Types that can enumerate their contained handle references for the
/// mark phase.
pub trait Traceable {
    /// Call `tracer(handle)` for each handle reference contained in this
    /// value.
    fn trace_handles(&self, tracer: &mut dyn FnMut(Handle));
}

impl Traceable for Val {
    fn trace_handles(&self, tracer: &mut dyn FnMut(Handle)) {
        match self {
            Val::Cons(car, cdr) => {
                tracer(*car);
                tracer(*cdr);
            }
            Val::Closure(c) => {
                tracer(c.params);
                tracer(c.body);
                tracer(c.context);
            }
            Val::Vector(v) => {
                for h in v.iter() {
                    tracer(h);
                }
            }
            Val::Dict(d) => {
                for (k, v) in d.iter() {
                    tracer(k);
                    tracer(v);
                }
            }
            // No outgoing references
            Val::Int(_) | Val::Sym(_) | Val::Str(_) | Val::Builtin(_) | Val::Type(_) => {}
        }
    }
}

impl Heap {
    /// Run mark-and-sweep collection.
    ///
    /// Marks everything reachable from `roots`, then frees every unmarked,
    /// unpinned record and returns how many were freed. A traced handle
    /// that resolves to no record is diagnosed with a warning and skipped;
    /// the collector never treats it as fatal.
    pub fn collect(&mut self, roots: &[Handle]) -> usize {
        for mark in self.marks.iter_mut() {
            *mark = false;
        }

        let mut worklist: Vec<Handle> = roots.to_vec();
        while let Some(h) = worklist.pop() {
            let idx = h.0 as usize;
            if idx >= self.storage.len() {
                warn!(handle = h.0, "traced handle outside the allocation index");
                continue;
            }
            if self.marks[idx] {
                continue;
            }
            match &self.storage[idx] {
                Some(val) => {
                    self.marks[idx] = true;
                    val.trace_handles(&mut |child| worklist.push(child));
                }
                None => warn!(handle = h.0, "traced handle refers to a freed slot"),
            }
        }

        let mut collected = 0;
        let mut freed_bytes = 0;
        for i in 0..self.storage.len() {
            if self.storage[i].is_some() && !self.marks[i] && !self.pinned[i] {
                self.storage[i] = None;
                self.free_slots.push(i);
                freed_bytes += self.sizes[i] + RECORD_OVERHEAD;
                collected += 1;
            }
        }

        self.live -= collected;
        self.bytes -= freed_bytes;
        debug!(collected, freed_bytes, live = self.live, "collection finished");
        collected
    }
}
