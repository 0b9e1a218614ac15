//! Output operations.

use crate::core::error::LispError;
use crate::core::value::Handle;
use crate::printer;
use crate::vm::engine::Interp;

/// `(print ...)`: renders each evaluated argument followed by a space,
/// then a newline. Returns the last printed value, or nil if none.
pub fn print(interp: &mut Interp, args: Handle) -> Result<Handle, LispError> {
    let mut last = interp.nil;
    let mut cell = args;
    while cell != interp.nil {
        let (form, next) = interp.list_next(cell)?;
        last = interp.eval(form)?;
        let rendered = printer::render(interp, last);
        interp.write_output(rendered.as_bytes())?;
        interp.write_output(b" ")?;
        cell = next;
    }
    interp.write_output(b"\n")?;
    interp.flush_output()?;
    Ok(last)
}

/// `(show-symbol-table)`: renders every environment chain on the stack,
/// bottom first.
pub fn show_symbol_table(interp: &mut Interp, _args: Handle) -> Result<Handle, LispError> {
    let depth = interp.env_depth();
    let mut report = format!("nscopes: {}\n", depth);
    for i in 0..depth {
        let chain = interp.heap.vec_get(interp.scopes, i as i64)?;
        report.push_str(&format!("Scope #{}:\n", i));
        report.push_str(&printer::render(interp, chain));
        report.push('\n');
    }
    interp.write_output(report.as_bytes())?;
    Ok(interp.nil)
}
