//! String operations.

use crate::builtins::expect_arity;
use crate::core::error::LispError;
use crate::core::value::{Handle, LispStr, Val};
use crate::vm::engine::Interp;

/// `(slice s start len)`: a fresh substring; negative `start` counts from
/// the end.
pub fn slice(interp: &mut Interp, args: Handle) -> Result<Handle, LispError> {
    expect_arity(interp, args, "slice", 3)?;
    let str_form = interp.nth_list(args, 0)?;
    let string = interp.eval(str_form)?;
    let start_form = interp.nth_list(args, 1)?;
    let start_val = interp.eval(start_form)?;
    let start = interp.heap.as_int(start_val)?;
    let len_form = interp.nth_list(args, 2)?;
    let len_val = interp.eval(len_form)?;
    let len = interp.heap.as_int(len_val)?;

    let out = interp.heap.as_str(string)?.slice(start, len)?;
    Ok(interp.heap.alloc(Val::Str(out)))
}

/// `(concat ...)`: folds strings left to right; the identity is the empty
/// string, and a single argument passes through unchanged.
pub fn concat(interp: &mut Interp, args: Handle) -> Result<Handle, LispError> {
    let len = interp.list_length(args)?;
    if len == 0 {
        return Ok(interp.heap.alloc(Val::Str(LispStr::new())));
    }

    let first_form = interp.nth_list(args, 0)?;
    let first = interp.eval(first_form)?;
    interp.heap.as_str(first)?;
    if len == 1 {
        return Ok(first);
    }

    let mut acc = interp.heap.as_str(first)?.clone();
    let (_, mut cell) = interp.list_next(args)?;
    while cell != interp.nil {
        let (form, next) = interp.list_next(cell)?;
        let piece = interp.eval(form)?;
        acc = acc.concat(interp.heap.as_str(piece)?);
        cell = next;
    }
    Ok(interp.heap.alloc(Val::Str(acc)))
}
