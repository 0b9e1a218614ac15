//! Integer arithmetic and equality.

use crate::builtins::expect_arity;
use crate::core::error::LispError;
use crate::core::value::{Handle, Val};
use crate::vm::engine::Interp;

/// `(+ ...)`: the sum of all evaluated arguments, 0 with none.
pub fn plus(interp: &mut Interp, args: Handle) -> Result<Handle, LispError> {
    let mut out: i64 = 0;
    let mut cell = args;
    while cell != interp.nil {
        let (form, next) = interp.list_next(cell)?;
        let val = interp.eval(form)?;
        out = out.wrapping_add(interp.heap.as_int(val)?);
        cell = next;
    }
    Ok(interp.heap.alloc(Val::Int(out)))
}

/// `(-)` is 0, `(- a)` is the negation of `a`, `(- a b c)` is
/// `a - (b + c)`.
pub fn minus(interp: &mut Interp, args: Handle) -> Result<Handle, LispError> {
    let mut out: i64 = 0;
    let mut first = true;
    let mut more_than_one = false;
    let mut cell = args;
    while cell != interp.nil {
        let (form, next) = interp.list_next(cell)?;
        let evaluated = interp.eval(form)?;
        let val = interp.heap.as_int(evaluated)?;
        if first {
            out = val;
            first = false;
        } else {
            out = out.wrapping_sub(val);
            more_than_one = true;
        }
        cell = next;
    }
    if !more_than_one {
        out = out.wrapping_neg();
    }
    Ok(interp.heap.alloc(Val::Int(out)))
}

/// `(= a b)`: t when both evaluate to the same variant and are either
/// integers with the same value or the same object, else nil. Strings,
/// lists, and every other aggregate compare by identity.
pub fn equals(interp: &mut Interp, args: Handle) -> Result<Handle, LispError> {
    expect_arity(interp, args, "=", 2)?;
    let a_form = interp.nth_list(args, 0)?;
    let b_form = interp.nth_list(args, 1)?;
    let a = interp.eval(a_form)?;
    let b = interp.eval(b_form)?;

    let equal = match (interp.heap.get(a), interp.heap.get(b)) {
        (Val::Int(x), Val::Int(y)) => x == y,
        (x, y) if x.type_tag() != y.type_tag() => false,
        _ => a == b,
    };
    Ok(if equal { interp.t } else { interp.nil })
}
