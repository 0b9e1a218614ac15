//! Special forms and control operations.

use crate::builtins::expect_arity;
use crate::core::error::LispError;
use crate::core::value::{ClosureKind, Handle, Val};
use crate::vm::engine::Interp;

/// Evaluates its single argument twice: once to obtain a form, then again
/// to reduce that form. The double evaluation is longstanding observable
/// behavior and is kept.
pub fn eval(interp: &mut Interp, args: Handle) -> Result<Handle, LispError> {
    expect_arity(interp, args, "eval", 1)?;
    let form = interp.nth_list(args, 0)?;
    let once = interp.eval(form)?;
    interp.eval(once)
}

/// `(apply f xs)`: evaluates `xs` to a list and applies `f` to it as a raw
/// argument list.
pub fn apply(interp: &mut Interp, args: Handle) -> Result<Handle, LispError> {
    expect_arity(interp, args, "apply", 2)?;
    let func_form = interp.nth_list(args, 0)?;
    let list_form = interp.nth_list(args, 1)?;
    let func_args = interp.eval(list_form)?;
    interp.apply(func_form, func_args)
}

pub fn do_(interp: &mut Interp, args: Handle) -> Result<Handle, LispError> {
    interp.eval_do(args)
}

pub fn quote(interp: &mut Interp, args: Handle) -> Result<Handle, LispError> {
    expect_arity(interp, args, "quote", 1)?;
    interp.nth_list(args, 0)
}

/// `(if test then else)`; nil is the only false value.
pub fn if_(interp: &mut Interp, args: Handle) -> Result<Handle, LispError> {
    expect_arity(interp, args, "if", 3)?;
    let test = interp.nth_list(args, 0)?;
    if interp.eval(test)? != interp.nil {
        let then = interp.nth_list(args, 1)?;
        interp.eval(then)
    } else {
        let alt = interp.nth_list(args, 2)?;
        interp.eval(alt)
    }
}

/// `(while test body...)`: re-evaluates the test before each pass, runs the
/// body as a `do` while it is non-nil, and returns the last body value.
pub fn while_(interp: &mut Interp, args: Handle) -> Result<Handle, LispError> {
    if args == interp.nil {
        return Err(LispError::Arity {
            callee: "while".to_string(),
            expected: 1,
            got: 0,
        });
    }
    let (test, body) = interp.list_next(args)?;
    let mut out = interp.nil;
    while interp.eval(test)? != interp.nil {
        out = interp.eval_do(body)?;
    }
    Ok(out)
}

/// `(def sym form)`: binds in the innermost frame. A closure defined this
/// way receives the symbol as its bound name if it has none yet.
pub fn def(interp: &mut Interp, args: Handle) -> Result<Handle, LispError> {
    expect_arity(interp, args, "def", 2)?;
    let sym = interp.nth_list(args, 0)?;
    let sym_id = interp.heap.as_sym(sym)?;
    let form = interp.nth_list(args, 1)?;
    let val = interp.eval(form)?;
    interp.define(sym, val)?;

    if let Val::Closure(closure) = interp.heap.get_mut(val) {
        if closure.name.is_none() {
            closure.name = Some(sym_id);
        }
    }
    Ok(val)
}

/// `(set sym form)`: assigns to an existing binding.
pub fn set(interp: &mut Interp, args: Handle) -> Result<Handle, LispError> {
    expect_arity(interp, args, "set", 2)?;
    let form = interp.nth_list(args, 1)?;
    let val = interp.eval(form)?;
    let sym = interp.nth_list(args, 0)?;
    interp.heap.as_sym(sym)?;
    interp.assign(sym, val)?;
    Ok(val)
}

/// `(fn (params...) body...)`: a function closure capturing the current
/// chain.
pub fn fn_(interp: &mut Interp, args: Handle) -> Result<Handle, LispError> {
    make_closure(interp, args, "fn", ClosureKind::Function)
}

/// `(macro (params...) body...)`: a macro closure; its context is resolved
/// at expansion time.
pub fn macro_(interp: &mut Interp, args: Handle) -> Result<Handle, LispError> {
    make_closure(interp, args, "macro", ClosureKind::Macro)
}

fn make_closure(
    interp: &mut Interp,
    args: Handle,
    callee: &str,
    kind: ClosureKind,
) -> Result<Handle, LispError> {
    if args == interp.nil {
        return Err(LispError::Arity {
            callee: callee.to_string(),
            expected: 1,
            got: 0,
        });
    }
    let (params, body) = interp.list_next(args)?;
    if !matches!(interp.heap.get(params), Val::Cons(..)) {
        return Err(LispError::Type {
            expected: "cons",
            got: interp.heap.get(params).type_name(),
        });
    }
    interp.new_closure(params, body, kind)
}

/// `(try-catch form handler)`: installs a catch point around `form`; on a
/// raise, unwinds to it and evaluates `handler`.
pub fn try_catch(interp: &mut Interp, args: Handle) -> Result<Handle, LispError> {
    expect_arity(interp, args, "try-catch", 2)?;
    let protected = interp.nth_list(args, 0)?;
    let handler = interp.nth_list(args, 1)?;

    interp.install_catch()?;
    match interp.eval(protected) {
        Ok(val) => {
            interp.uninstall_catch();
            Ok(val)
        }
        Err(err) => {
            interp.catch_unwind(&err);
            interp.eval(handler)
        }
    }
}

/// `(exit)` or `(exit status)`: terminate the process.
pub fn exit(interp: &mut Interp, args: Handle) -> Result<Handle, LispError> {
    let status = if args == interp.nil {
        0
    } else {
        let form = interp.nth_list(args, 0)?;
        let val = interp.eval(form)?;
        interp.heap.as_int(val)?
    };
    let _ = interp.flush_output();
    std::process::exit(status as i32);
}
