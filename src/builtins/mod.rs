//! The primitive operations exposed to programs.
//!
//! Every builtin receives its argument list raw; evaluation is the
//! builtin's own business (`quote`, `if`, `while`, `do`, `macro`, `fn`,
//! `def`, `set`, `try-catch` leave arguments untouched, most others reduce
//! them).

pub mod collections;
pub mod forms;
pub mod math;
pub mod output;
pub mod strings;

use crate::core::error::LispError;
use crate::core::value::{BuiltinData, Handle, NativeFn, Val};
use crate::vm::engine::Interp;

/// Create the builtin values and bind them, plus the `nil` and `t`
/// singletons, in the global frame.
pub fn register_all(interp: &mut Interp) -> Result<(), LispError> {
    let table: &[(&'static str, NativeFn)] = &[
        ("eval", forms::eval),
        ("apply", forms::apply),
        ("do", forms::do_),
        ("quote", forms::quote),
        ("cons", collections::cons),
        ("list", collections::list),
        ("macro", forms::macro_),
        ("fn", forms::fn_),
        ("def", forms::def),
        ("car", collections::car),
        ("cdr", collections::cdr),
        ("if", forms::if_),
        ("=", math::equals),
        ("+", math::plus),
        ("-", math::minus),
        ("print", output::print),
        ("while", forms::while_),
        ("set", forms::set),
        ("try-catch", forms::try_catch),
        ("show-symbol-table", output::show_symbol_table),
        ("vector", collections::vector),
        ("nth", collections::nth),
        ("insert", collections::insert),
        ("append", collections::append),
        ("dict", collections::dict),
        ("getitem", collections::getitem),
        ("setitem", collections::setitem),
        ("exit", forms::exit),
        ("slice", strings::slice),
        ("concat", strings::concat),
    ];

    for &(name, func) in table {
        let sym = interp.intern(name)?;
        let builtin = interp
            .heap
            .alloc_pinned(Val::Builtin(BuiltinData { name, func }));
        interp.define(sym, builtin)?;
    }

    let nil_sym = interp.intern("nil")?;
    let nil = interp.nil;
    interp.define(nil_sym, nil)?;
    let t_sym = interp.intern("t")?;
    let t = interp.t;
    interp.define(t_sym, t)?;
    Ok(())
}

/// Raise unless the raw argument list has exactly `expected` elements.
pub(crate) fn expect_arity(
    interp: &Interp,
    args: Handle,
    callee: &str,
    expected: usize,
) -> Result<(), LispError> {
    let got = interp.list_length(args)?;
    if got != expected {
        return Err(LispError::Arity {
            callee: callee.to_string(),
            expected,
            got,
        });
    }
    Ok(())
}
