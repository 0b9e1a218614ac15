//! The evaluator and its shared state.
//!
//! `Interp` owns the heap, the symbol pool, the pinned singletons and type
//! descriptors, and the two stacks the collector roots: the environment
//! stack and the call stack (both heap vectors). Evaluation reduces a value
//! to a value; errors propagate as `Result` and unwind to the most recently
//! installed catch point.

use crate::core::dict::DictTable;
use crate::core::error::LispError;
use crate::core::heap::Heap;
use crate::core::interner::SymbolPool;
use crate::core::value::{
    ClosureData, ClosureKind, Handle, NativeFn, TypeTag, Val,
};
use crate::core::vector::VecBuf;
use crate::printer;
use crate::reader::Reader;
use smallvec::SmallVec;
use std::io::Write;
use tracing::trace;

/// Catch points deeper than this raise a resource error.
pub const MAX_CATCH_POINTS: usize = 256;

/// Inline capacity for evaluated-argument buffers.
type ArgVec = SmallVec<[Handle; 8]>;

/// Depths recorded when a catch point is installed; a raise truncates both
/// stacks back to them.
#[derive(Debug, Clone, Copy)]
struct CatchPoint {
    env_depth: usize,
    call_depth: usize,
}

pub trait OutputWriter {
    fn write(&mut self, bytes: &[u8]) -> Result<(), LispError>;
    fn flush(&mut self) -> Result<(), LispError>;
}

#[derive(Default)]
pub struct StdoutWriter;

impl OutputWriter for StdoutWriter {
    fn write(&mut self, bytes: &[u8]) -> Result<(), LispError> {
        std::io::stdout()
            .write_all(bytes)
            .map_err(|e| LispError::Io(e.to_string()))
    }

    fn flush(&mut self) -> Result<(), LispError> {
        std::io::stdout()
            .flush()
            .map_err(|e| LispError::Io(e.to_string()))
    }
}

pub struct Interp {
    pub heap: Heap,
    pub symbols: SymbolPool,
    /// The distinguished empty-list/false singleton.
    pub nil: Handle,
    /// The canonical truthy marker.
    pub t: Handle,
    /// Environment stack: heap vector of environment chains.
    pub scopes: Handle,
    /// Call stack: heap vector of the callables currently being applied.
    pub call_stack: Handle,
    /// One pinned descriptor per value variant, in `TypeTag::ALL` order.
    type_handles: Vec<Handle>,
    catch_points: Vec<CatchPoint>,
    /// Error channel: the rendered message of the last caught raise.
    pub last_error: String,
    pub output: Box<dyn OutputWriter>,
}

impl Interp {
    pub fn new() -> Self {
        let mut heap = Heap::new();

        let nil = heap.alloc_pinned(Val::Cons(Handle(0), Handle(0)));
        *heap.get_mut(nil) = Val::Cons(nil, nil);
        let t = heap.alloc_pinned(Val::Cons(Handle(0), Handle(0)));
        *heap.get_mut(t) = Val::Cons(t, t);

        let type_handles = TypeTag::ALL
            .iter()
            .map(|&tag| heap.alloc_pinned(Val::Type(tag)))
            .collect();

        let scopes = heap.alloc(Val::Vector(VecBuf::new()));
        let global_frame = heap.alloc(Val::Dict(DictTable::new()));
        let global_chain = heap.alloc(Val::Cons(global_frame, nil));
        heap.vec_push(scopes, global_chain)
            .expect("environment stack is a vector");
        let call_stack = heap.alloc(Val::Vector(VecBuf::new()));

        let mut interp = Self {
            heap,
            symbols: SymbolPool::new(),
            nil,
            t,
            scopes,
            call_stack,
            type_handles,
            catch_points: Vec::new(),
            last_error: String::new(),
            output: Box::new(StdoutWriter),
        };
        crate::builtins::register_all(&mut interp).expect("builtin registration failed");
        interp
    }

    pub fn set_output_writer(&mut self, writer: Box<dyn OutputWriter>) {
        self.output = writer;
    }

    pub fn write_output(&mut self, bytes: &[u8]) -> Result<(), LispError> {
        self.output.write(bytes)
    }

    pub fn flush_output(&mut self) -> Result<(), LispError> {
        self.output.flush()
    }

    pub fn intern(&mut self, name: &str) -> Result<Handle, LispError> {
        self.symbols.intern(&mut self.heap, name)
    }

    /// The pinned descriptor value for a variant.
    pub fn type_descriptor(&self, tag: TypeTag) -> Handle {
        self.type_handles[TypeTag::ALL.iter().position(|&x| x == tag).unwrap_or(0)]
    }

    //=list helpers=========================================================

    /// Split a list cell into (car, cdr), raising a shape error on an
    /// improper list.
    pub fn list_next(&self, cell: Handle) -> Result<(Handle, Handle), LispError> {
        self.heap
            .cons_parts(cell)
            .map_err(|_| LispError::Shape("improper list where proper list required".to_string()))
    }

    pub fn list_length(&self, mut cell: Handle) -> Result<usize, LispError> {
        let mut n = 0;
        while cell != self.nil {
            let (_, cdr) = self.list_next(cell)?;
            cell = cdr;
            n += 1;
        }
        Ok(n)
    }

    pub fn nth_list(&self, mut cell: Handle, n: usize) -> Result<Handle, LispError> {
        for i in 0..n {
            if cell == self.nil {
                return Err(LispError::Index {
                    index: n as i64,
                    len: i,
                });
            }
            let (_, cdr) = self.list_next(cell)?;
            cell = cdr;
        }
        if cell == self.nil {
            return Err(LispError::Index {
                index: n as i64,
                len: n,
            });
        }
        let (car, _) = self.list_next(cell)?;
        Ok(car)
    }

    //=evaluation===========================================================

    /// Reduce a form to a value.
    pub fn eval(&mut self, form: Handle) -> Result<Handle, LispError> {
        if form == self.nil || form == self.t {
            return Ok(form);
        }
        let (head, args) = match self.heap.get(form) {
            Val::Sym(_) => return self.lookup(form),
            Val::Cons(car, cdr) => (*car, *cdr),
            _ => return Ok(form),
        };
        self.apply(head, args)
    }

    /// Evaluate `func_form` to a callable and apply it to the raw argument
    /// list `args`. The callable sits on the call stack for the duration of
    /// the dispatch.
    pub fn apply(&mut self, func_form: Handle, args: Handle) -> Result<Handle, LispError> {
        if !matches!(self.heap.get(args), Val::Cons(..)) {
            return Err(LispError::Shape(
                "argument list is not a list".to_string(),
            ));
        }
        let callee = self.eval(func_form)?;
        trace!(callee = %printer::render(self, callee), "applying");

        self.heap
            .vec_push(self.call_stack, callee)
            .expect("call stack is a vector");
        let out = self.dispatch(callee, args)?;
        self.heap
            .vec_remove(self.call_stack, -1)
            .expect("call stack entry present");
        Ok(out)
    }

    fn dispatch(&mut self, callee: Handle, args: Handle) -> Result<Handle, LispError> {
        enum Callee {
            Builtin(NativeFn),
            Closure(ClosureData),
        }
        let kind = match self.heap.get(callee) {
            Val::Builtin(b) => Callee::Builtin(b.func),
            Val::Closure(c) => Callee::Closure(c.clone()),
            other => {
                return Err(LispError::Type {
                    expected: "closure",
                    got: other.type_name(),
                });
            }
        };
        match kind {
            Callee::Builtin(func) => func(self, args),
            Callee::Closure(closure) => self.apply_closure(closure, args),
        }
    }

    /// Apply a function or macro closure.
    ///
    /// Functions evaluate each argument in the caller's environment, then
    /// run their body under `frame ∷ captured-chain`. Macros bind the raw
    /// argument forms under `frame ∷ caller-top-chain`, reduce the body to
    /// an expansion, and evaluate that expansion back in the caller's
    /// environment.
    fn apply_closure(&mut self, closure: ClosureData, args: Handle) -> Result<Handle, LispError> {
        let mut values: ArgVec = SmallVec::new();
        let mut cell = args;
        while cell != self.nil {
            let (raw, next) = self.list_next(cell)?;
            let bound = match closure.kind {
                ClosureKind::Function => self.eval(raw)?,
                ClosureKind::Macro => raw,
            };
            values.push(bound);
            cell = next;
        }
        if values.len() != closure.arity {
            return Err(LispError::Arity {
                callee: self.closure_label(&closure),
                expected: closure.arity,
                got: values.len(),
            });
        }

        let frame = self.heap.alloc(Val::Dict(DictTable::new()));
        let mut param = closure.params;
        for &value in &values {
            let (name, next) = self.list_next(param)?;
            self.heap.dict_set(frame, name, value)?;
            param = next;
        }

        let rest = match closure.kind {
            ClosureKind::Function => closure.context,
            ClosureKind::Macro => self.current_chain()?,
        };
        let chain = self.heap.alloc(Val::Cons(frame, rest));
        self.push_chain(chain);
        let out = self.eval_do(closure.body)?;
        self.pop_chain();

        match closure.kind {
            ClosureKind::Function => Ok(out),
            ClosureKind::Macro => self.eval(out),
        }
    }

    /// Evaluate a list of forms in order; the last result is the value, or
    /// nil if the list is empty.
    pub fn eval_do(&mut self, mut forms: Handle) -> Result<Handle, LispError> {
        let mut out = self.nil;
        while forms != self.nil {
            let (car, cdr) = self.list_next(forms)?;
            out = self.eval(car)?;
            forms = cdr;
        }
        Ok(out)
    }

    /// Build a closure, validating the parameter list (proper, symbols
    /// only) and precomputing its arity. Functions capture the active
    /// chain; macros capture nothing.
    pub fn new_closure(
        &mut self,
        params: Handle,
        body: Handle,
        kind: ClosureKind,
    ) -> Result<Handle, LispError> {
        let mut arity = 0;
        let mut cell = params;
        while cell != self.nil {
            let (name, next) = match self.heap.get(cell) {
                Val::Cons(car, cdr) => (*car, *cdr),
                _ => {
                    return Err(LispError::Shape(
                        "parameter list is not a proper list".to_string(),
                    ));
                }
            };
            if !matches!(self.heap.get(name), Val::Sym(_)) {
                return Err(LispError::Shape(
                    "parameter list contains a non-symbol".to_string(),
                ));
            }
            arity += 1;
            cell = next;
        }
        let context = match kind {
            ClosureKind::Function => self.current_chain()?,
            ClosureKind::Macro => self.nil,
        };
        Ok(self.heap.alloc(Val::Closure(ClosureData {
            params,
            body,
            context,
            kind,
            name: None,
            arity,
        })))
    }

    pub fn closure_label(&self, closure: &ClosureData) -> String {
        match closure.name {
            Some(sym) => self.symbols.name(sym).to_string(),
            None => "anonymous function".to_string(),
        }
    }

    //=non-local exit=======================================================

    /// Record the current stack depths as a catch point.
    pub fn install_catch(&mut self) -> Result<(), LispError> {
        if self.catch_points.len() >= MAX_CATCH_POINTS {
            return Err(LispError::Resource("too many nested catch points".to_string()));
        }
        self.catch_points.push(CatchPoint {
            env_depth: self.env_depth(),
            call_depth: self.call_depth(),
        });
        Ok(())
    }

    /// Remove the topmost catch point after an orderly exit.
    pub fn uninstall_catch(&mut self) {
        self.catch_points.pop();
    }

    /// Unwind to the topmost catch point: drop it, truncate both stacks to
    /// its recorded depths, and buffer the error string.
    pub fn catch_unwind(&mut self, err: &LispError) {
        let point = self
            .catch_points
            .pop()
            .expect("catch point installed before unwind");
        self.truncate_stacks(point.env_depth, point.call_depth);
        self.last_error = err.to_string();
    }

    fn truncate_stacks(&mut self, env_depth: usize, call_depth: usize) {
        while self.env_depth() > env_depth {
            self.heap
                .vec_remove(self.scopes, -1)
                .expect("environment stack entry present");
        }
        while self.call_depth() > call_depth {
            self.heap
                .vec_remove(self.call_stack, -1)
                .expect("call stack entry present");
        }
    }

    pub fn call_depth(&self) -> usize {
        self.heap
            .vec_len(self.call_stack)
            .expect("call stack is a vector")
    }

    /// Restore the resting state after an uncaught raise: the single global
    /// chain, an empty call stack, no catch points.
    pub fn reset_after_error(&mut self) {
        self.truncate_stacks(1, 0);
        self.catch_points.clear();
    }

    /// Renderings of the call stack entries, outermost first.
    pub fn stack_trace(&self) -> Vec<String> {
        (0..self.call_depth())
            .map(|i| {
                let h = self
                    .heap
                    .vec_get(self.call_stack, i as i64)
                    .expect("call stack entry present");
                printer::render(self, h)
            })
            .collect()
    }

    //=driver entry points==================================================

    /// Collect garbage, rooting the environment stack and the call stack.
    /// Runs between top-level forms, never mid-form.
    pub fn collect_garbage(&mut self) -> usize {
        let roots = [self.scopes, self.call_stack];
        self.heap.collect(&roots)
    }

    /// Evaluate every form in `src`, returning the last result. No
    /// collection runs; the caller decides when to collect.
    pub fn eval_source(&mut self, src: &str) -> Result<Option<Handle>, LispError> {
        let mut reader = Reader::new(src);
        let mut last = None;
        while let Some(form) = reader.read(self)? {
            last = Some(self.eval(form)?);
        }
        Ok(last)
    }

    /// Evaluate a file (`-` reads standard input), collecting garbage
    /// between top-level forms.
    pub fn eval_path(&mut self, path: &str) -> Result<(), LispError> {
        let source = if path == "-" {
            let mut buf = String::new();
            std::io::Read::read_to_string(&mut std::io::stdin(), &mut buf)
                .map_err(|e| LispError::Io(format!("cannot read standard input: {}", e)))?;
            buf
        } else {
            std::fs::read_to_string(path)
                .map_err(|e| LispError::Io(format!("cannot open {}: {}", path, e)))?
        };
        let mut reader = Reader::new(&source);
        while let Some(form) = reader.read(self)? {
            self.eval(form)?;
            self.collect_garbage();
        }
        Ok(())
    }
}

impl Default for Interp {
    fn default() -> Self {
        Self::new()
    }
}
