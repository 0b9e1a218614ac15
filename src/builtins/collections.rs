//! Pairs, lists, vectors, and dicts.

use crate::builtins::expect_arity;
use crate::core::dict::DictTable;
use crate::core::error::LispError;
use crate::core::value::{Handle, Val};
use crate::core::vector::VecBuf;
use crate::vm::engine::Interp;
use smallvec::SmallVec;

/// `(cons a b)`: a fresh pair of the two evaluated arguments.
pub fn cons(interp: &mut Interp, args: Handle) -> Result<Handle, LispError> {
    expect_arity(interp, args, "cons", 2)?;
    let car_form = interp.nth_list(args, 0)?;
    let cdr_form = interp.nth_list(args, 1)?;
    let car = interp.eval(car_form)?;
    let cdr = interp.eval(cdr_form)?;
    Ok(interp.heap.alloc(Val::Cons(car, cdr)))
}

/// `(list ...)`: evaluates every argument into a fresh proper list.
pub fn list(interp: &mut Interp, args: Handle) -> Result<Handle, LispError> {
    let mut values: SmallVec<[Handle; 8]> = SmallVec::new();
    let mut cell = args;
    while cell != interp.nil {
        let (form, next) = interp.list_next(cell)?;
        values.push(interp.eval(form)?);
        cell = next;
    }
    let mut out = interp.nil;
    for &v in values.iter().rev() {
        out = interp.heap.alloc(Val::Cons(v, out));
    }
    Ok(out)
}

pub fn car(interp: &mut Interp, args: Handle) -> Result<Handle, LispError> {
    expect_arity(interp, args, "car", 1)?;
    let form = interp.nth_list(args, 0)?;
    let pair = interp.eval(form)?;
    if pair == interp.nil {
        return Err(LispError::Shape("car of empty list".to_string()));
    }
    let (head, _) = interp.heap.cons_parts(pair)?;
    Ok(head)
}

pub fn cdr(interp: &mut Interp, args: Handle) -> Result<Handle, LispError> {
    expect_arity(interp, args, "cdr", 1)?;
    let form = interp.nth_list(args, 0)?;
    let pair = interp.eval(form)?;
    if pair == interp.nil {
        return Err(LispError::Shape("cdr of empty list".to_string()));
    }
    let (_, tail) = interp.heap.cons_parts(pair)?;
    Ok(tail)
}

/// `(vector ...)`: a fresh vector of the evaluated arguments.
pub fn vector(interp: &mut Interp, args: Handle) -> Result<Handle, LispError> {
    let out = interp.heap.alloc(Val::Vector(VecBuf::new()));
    let mut cell = args;
    while cell != interp.nil {
        let (form, next) = interp.list_next(cell)?;
        let val = interp.eval(form)?;
        interp.heap.vec_push(out, val)?;
        cell = next;
    }
    Ok(out)
}

/// `(nth v i)`: vector indexing; negative indices count from the back.
pub fn nth(interp: &mut Interp, args: Handle) -> Result<Handle, LispError> {
    expect_arity(interp, args, "nth", 2)?;
    let vec_form = interp.nth_list(args, 0)?;
    let vec = interp.eval(vec_form)?;
    let idx_form = interp.nth_list(args, 1)?;
    let idx_val = interp.eval(idx_form)?;
    let idx = interp.heap.as_int(idx_val)?;
    interp.heap.vec_get(vec, idx)
}

/// `(insert v i x)`: shifts toward the nearer end; returns the vector.
pub fn insert(interp: &mut Interp, args: Handle) -> Result<Handle, LispError> {
    expect_arity(interp, args, "insert", 3)?;
    let vec_form = interp.nth_list(args, 0)?;
    let vec = interp.eval(vec_form)?;
    let idx_form = interp.nth_list(args, 1)?;
    let idx_val = interp.eval(idx_form)?;
    let idx = interp.heap.as_int(idx_val)?;
    let item_form = interp.nth_list(args, 2)?;
    let item = interp.eval(item_form)?;
    interp.heap.vec_insert(vec, idx, item)?;
    Ok(vec)
}

/// `(append v x)`: pushes onto the back; returns the vector.
pub fn append(interp: &mut Interp, args: Handle) -> Result<Handle, LispError> {
    expect_arity(interp, args, "append", 2)?;
    let vec_form = interp.nth_list(args, 0)?;
    let vec = interp.eval(vec_form)?;
    let item_form = interp.nth_list(args, 1)?;
    let item = interp.eval(item_form)?;
    interp.heap.vec_push(vec, item)?;
    Ok(vec)
}

/// `(dict)` or `(dict keys values)`: empty, or populated pairwise from two
/// proper lists of equal length.
pub fn dict(interp: &mut Interp, args: Handle) -> Result<Handle, LispError> {
    let out = interp.heap.alloc(Val::Dict(DictTable::new()));
    let len = interp.list_length(args)?;
    if len == 2 {
        let keys_form = interp.nth_list(args, 0)?;
        let vals_form = interp.nth_list(args, 1)?;
        let mut keys = interp.eval(keys_form)?;
        let mut vals = interp.eval(vals_form)?;
        interp.heap.cons_parts(keys)?;
        interp.heap.cons_parts(vals)?;

        while keys != interp.nil {
            if vals == interp.nil {
                return Err(LispError::Shape(
                    "mismatch in length of argument lists to dict".to_string(),
                ));
            }
            let (key, next_keys) = interp.list_next(keys)?;
            let (val, next_vals) = interp.list_next(vals)?;
            interp.heap.dict_set(out, key, val)?;
            keys = next_keys;
            vals = next_vals;
        }
        if vals != interp.nil {
            return Err(LispError::Shape(
                "mismatch in length of argument lists to dict".to_string(),
            ));
        }
    } else if len != 0 {
        return Err(LispError::Arity {
            callee: "dict".to_string(),
            expected: 2,
            got: len,
        });
    }
    Ok(out)
}

/// `(getitem c k)`: dict lookup by identity, or vector indexing when the
/// container is a vector.
pub fn getitem(interp: &mut Interp, args: Handle) -> Result<Handle, LispError> {
    expect_arity(interp, args, "getitem", 2)?;
    let container_form = interp.nth_list(args, 0)?;
    let container = interp.eval(container_form)?;
    let key_form = interp.nth_list(args, 1)?;
    let key = interp.eval(key_form)?;

    match interp.heap.get(container) {
        Val::Dict(_) => interp
            .heap
            .dict_get(container, key)?
            .ok_or(LispError::Missing { container: "dict" }),
        Val::Vector(_) => {
            let idx = interp.heap.as_int(key)?;
            interp.heap.vec_get(container, idx)
        }
        other => Err(LispError::Type {
            expected: "dict",
            got: other.type_name(),
        }),
    }
}

/// `(setitem c k x)`: dict store by identity, or vector element update;
/// returns the container.
pub fn setitem(interp: &mut Interp, args: Handle) -> Result<Handle, LispError> {
    expect_arity(interp, args, "setitem", 3)?;
    let container_form = interp.nth_list(args, 0)?;
    let container = interp.eval(container_form)?;
    let key_form = interp.nth_list(args, 1)?;
    let key = interp.eval(key_form)?;
    let val_form = interp.nth_list(args, 2)?;
    let val = interp.eval(val_form)?;

    match interp.heap.get(container) {
        Val::Dict(_) => interp.heap.dict_set(container, key, val)?,
        Val::Vector(_) => {
            let idx = interp.heap.as_int(key)?;
            interp.heap.vec_set(container, idx, val)?;
        }
        other => {
            return Err(LispError::Type {
                expected: "dict",
                got: other.type_name(),
            });
        }
    }
    Ok(container)
}
