//! Shared helpers for interpreter integration tests.
#![allow(dead_code)]

use lisp_rs::core::error::LispError;
use lisp_rs::core::value::{Handle, Val};
use lisp_rs::vm::engine::{Interp, OutputWriter};
use std::cell::RefCell;
use std::rc::Rc;

/// Evaluate every form in `src` on a fresh interpreter and return the last
/// result. Panics if evaluation fails.
pub fn run_code(src: &str) -> (Interp, Handle) {
    let mut interp = Interp::new();
    let h = run_in(&mut interp, src);
    (interp, h)
}

/// Evaluate every form in `src` and return the last result. Panics if
/// evaluation fails or `src` holds no form.
pub fn run_in(interp: &mut Interp, src: &str) -> Handle {
    interp
        .eval_source(src)
        .expect("evaluation failed")
        .expect("no form in source")
}

/// Evaluate `src` and unwrap an integer result.
pub fn run_int(src: &str) -> i64 {
    let (interp, h) = run_code(src);
    match interp.heap.get(h) {
        Val::Int(n) => *n,
        other => panic!("expected int, got {:?}", other),
    }
}

/// Evaluate `src` expecting a raise; return the error.
pub fn run_err(src: &str) -> LispError {
    let mut interp = Interp::new();
    interp.eval_source(src).expect_err("expected a raise")
}

/// Output writer capturing everything `print` emits.
pub struct BufferWriter {
    pub buffer: Rc<RefCell<Vec<u8>>>,
}

impl OutputWriter for BufferWriter {
    fn write(&mut self, bytes: &[u8]) -> Result<(), LispError> {
        self.buffer.borrow_mut().extend_from_slice(bytes);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), LispError> {
        Ok(())
    }
}

/// Install a capture buffer on the interpreter and return it.
pub fn capture_output(interp: &mut Interp) -> Rc<RefCell<Vec<u8>>> {
    let buffer = Rc::new(RefCell::new(Vec::new()));
    interp.set_output_writer(Box::new(BufferWriter {
        buffer: buffer.clone(),
    }));
    buffer
}
