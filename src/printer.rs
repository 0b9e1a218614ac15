//! Budgeted value rendering.
//!
//! Every variant renders through one dispatch so the REPL, `print`, error
//! reporting, and stack traces share a single textual form. Output is
//! bounded by a byte budget and is simply cut off when the budget runs out,
//! which also bounds work on cyclic structures.

use crate::core::value::{ClosureKind, Handle, Val};
use crate::vm::engine::Interp;

/// Default budget for one rendered value.
pub const RENDER_BUDGET: usize = 4000;

/// Render with the default budget.
pub fn render(interp: &Interp, h: Handle) -> String {
    let mut out = String::new();
    render_into(interp, h, &mut out, RENDER_BUDGET);
    out
}

/// Render `h` into `out`, producing at most `budget` bytes. Returns the
/// number of bytes produced.
pub fn render_into(interp: &Interp, h: Handle, out: &mut String, budget: usize) -> usize {
    let start = out.len();
    let limit = start + budget;
    render_value(interp, h, out, limit);
    out.len() - start
}

fn remaining(out: &String, limit: usize) -> usize {
    limit.saturating_sub(out.len())
}

fn push_bounded(out: &mut String, limit: usize, s: &str) {
    let room = remaining(out, limit);
    if room == 0 {
        return;
    }
    if s.len() <= room {
        out.push_str(s);
        return;
    }
    let mut end = room;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    out.push_str(&s[..end]);
}

fn render_value(interp: &Interp, h: Handle, out: &mut String, limit: usize) {
    if remaining(out, limit) == 0 {
        return;
    }
    match interp.heap.get(h) {
        Val::Int(n) => push_bounded(out, limit, &n.to_string()),
        Val::Sym(sym) => push_bounded(out, limit, interp.symbols.name(*sym)),
        Val::Str(s) => {
            push_bounded(out, limit, "\"");
            push_bounded(out, limit, &String::from_utf8_lossy(s.as_bytes()));
            push_bounded(out, limit, "\"");
        }
        Val::Cons(..) => render_cons(interp, h, out, limit),
        Val::Vector(v) => {
            push_bounded(out, limit, "[");
            let items: Vec<Handle> = v.iter().collect();
            for (i, &item) in items.iter().enumerate() {
                if i > 0 {
                    push_bounded(out, limit, ", ");
                }
                if remaining(out, limit) == 0 {
                    return;
                }
                render_value(interp, item, out, limit);
            }
            push_bounded(out, limit, "]");
        }
        Val::Dict(d) => {
            push_bounded(out, limit, "{");
            let entries: Vec<(Handle, Handle)> = d.iter().collect();
            for (i, &(key, val)) in entries.iter().enumerate() {
                if i > 0 {
                    push_bounded(out, limit, ", ");
                }
                if remaining(out, limit) == 0 {
                    return;
                }
                render_value(interp, key, out, limit);
                push_bounded(out, limit, " : ");
                render_value(interp, val, out, limit);
            }
            push_bounded(out, limit, "}");
        }
        Val::Closure(c) => {
            let label = match c.kind {
                ClosureKind::Function => "function",
                ClosureKind::Macro => "macro",
            };
            match c.name {
                Some(sym) => {
                    push_bounded(out, limit, label);
                    push_bounded(out, limit, " ");
                    push_bounded(out, limit, interp.symbols.name(sym));
                }
                None => {
                    push_bounded(out, limit, "anonymous ");
                    push_bounded(out, limit, label);
                }
            }
        }
        Val::Builtin(b) => {
            push_bounded(out, limit, "Builtin function ");
            push_bounded(out, limit, b.name);
        }
        Val::Type(tag) => {
            push_bounded(out, limit, "Type ");
            push_bounded(out, limit, tag.name());
        }
    }
}

/// Proper lists render as `(a b c)` so reader-producible lists round-trip;
/// an improper tail falls back to the dotted form.
fn render_cons(interp: &Interp, h: Handle, out: &mut String, limit: usize) {
    if h == interp.nil {
        push_bounded(out, limit, "nil");
        return;
    }
    if h == interp.t {
        push_bounded(out, limit, "t");
        return;
    }
    push_bounded(out, limit, "(");
    let (mut car, mut cdr) = match interp.heap.get(h) {
        Val::Cons(a, b) => (*a, *b),
        _ => unreachable!("render_cons called on a cons"),
    };
    loop {
        render_value(interp, car, out, limit);
        if remaining(out, limit) == 0 {
            return;
        }
        if cdr == interp.nil {
            push_bounded(out, limit, ")");
            return;
        }
        match interp.heap.get(cdr) {
            Val::Cons(a, b) if cdr != interp.t => {
                push_bounded(out, limit, " ");
                car = *a;
                cdr = *b;
            }
            _ => {
                push_bounded(out, limit, " . ");
                render_value(interp, cdr, out, limit);
                push_bounded(out, limit, ")");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::value::Val;

    #[test]
    fn renders_scalars() {
        let mut interp = Interp::new();
        let n = interp.heap.alloc(Val::Int(-42));
        assert_eq!(render(&interp, n), "-42");
        assert_eq!(render(&interp, interp.nil), "nil");
        assert_eq!(render(&interp, interp.t), "t");
    }

    #[test]
    fn renders_symbols_as_bare_names() {
        let mut interp = Interp::new();
        let sym = interp.intern("hello").unwrap();
        assert_eq!(render(&interp, sym), "hello");
    }

    #[test]
    fn renders_proper_lists_in_list_form() {
        let mut interp = Interp::new();
        let form = interp.eval_source("(quote (1 2 3))").unwrap().unwrap();
        assert_eq!(render(&interp, form), "(1 2 3)");
    }

    #[test]
    fn renders_improper_tails_dotted() {
        let mut interp = Interp::new();
        let pair = interp.eval_source("(cons 1 2)").unwrap().unwrap();
        assert_eq!(render(&interp, pair), "(1 . 2)");
    }

    #[test]
    fn renders_vectors_and_strings() {
        let mut interp = Interp::new();
        let v = interp.eval_source("(vector 1 2)").unwrap().unwrap();
        assert_eq!(render(&interp, v), "[1, 2]");
        let s = interp.eval_source("\"hi\"").unwrap().unwrap();
        assert_eq!(render(&interp, s), "\"hi\"");
    }

    #[test]
    fn renders_named_and_anonymous_closures() {
        let mut interp = Interp::new();
        let f = interp
            .eval_source("(do (def double (fn (x) (+ x x))) double)")
            .unwrap()
            .unwrap();
        assert_eq!(render(&interp, f), "function double");
        let anon = interp.eval_source("(fn (x) x)").unwrap().unwrap();
        assert_eq!(render(&interp, anon), "anonymous function");
    }

    #[test]
    fn budget_bounds_output() {
        let mut interp = Interp::new();
        let form = interp
            .eval_source("(quote (1 2 3 4 5 6 7 8 9 10))")
            .unwrap()
            .unwrap();
        let mut out = String::new();
        let produced = render_into(&interp, form, &mut out, 8);
        assert_eq!(produced, 8);
        assert_eq!(out.len(), 8);
    }

    #[test]
    fn budget_terminates_cyclic_structures() {
        let mut interp = Interp::new();
        let a = interp.heap.alloc(Val::Int(1));
        let cell = interp.heap.alloc(Val::Cons(a, a));
        *interp.heap.get_mut(cell) = Val::Cons(a, cell);
        let mut out = String::new();
        render_into(&interp, cell, &mut out, 64);
        assert!(out.len() <= 64);
    }
}
