mod common;

use common::capture_output;
use lisp_rs::core::error::LispError;
use lisp_rs::core::value::Val;
use lisp_rs::vm::engine::Interp;
use std::io::Write;

fn write_temp(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write source");
    file
}

#[test]
fn every_top_level_form_in_a_file_is_evaluated() {
    let file = write_temp("(def x 1)\n(def y 2)\n(print (+ x y))\n");
    let mut interp = Interp::new();
    let buffer = capture_output(&mut interp);
    interp
        .eval_path(file.path().to_str().unwrap())
        .expect("file evaluation");
    assert_eq!(&*buffer.borrow(), b"3 \n");
}

#[test]
fn definitions_survive_the_collections_between_forms() {
    let file = write_temp(
        "(def make-adder (fn (n) (fn (x) (+ x n))))\n\
         (def add10 (make-adder 10))\n\
         (print (add10 5))\n",
    );
    let mut interp = Interp::new();
    let buffer = capture_output(&mut interp);
    interp
        .eval_path(file.path().to_str().unwrap())
        .expect("file evaluation");
    assert_eq!(&*buffer.borrow(), b"15 \n");
}

#[test]
fn missing_file_raises_before_evaluation() {
    let mut interp = Interp::new();
    let err = interp
        .eval_path("/nonexistent/definitely-not-here.l")
        .expect_err("missing file");
    assert!(matches!(err, LispError::Io(_)));
}

#[test]
fn a_raise_in_a_file_stops_evaluation() {
    let file = write_temp("(def x 1)\n(car (quote ()))\n(def y 2)\n");
    let mut interp = Interp::new();
    let err = interp
        .eval_path(file.path().to_str().unwrap())
        .expect_err("raise");
    assert!(matches!(err, LispError::Shape(_)));
    // the first definition landed, the one after the raise did not
    let x = interp.intern("x").unwrap();
    assert!(matches!(
        interp.heap.get(interp.lookup(x).unwrap()),
        Val::Int(1)
    ));
    let y = interp.intern("y").unwrap();
    assert!(interp.lookup(y).is_err());
}

#[test]
fn try_catch_in_a_file_keeps_evaluation_going() {
    let file = write_temp("(try-catch (car (quote ())) (print 99))\n(print 1)\n");
    let mut interp = Interp::new();
    let buffer = capture_output(&mut interp);
    interp
        .eval_path(file.path().to_str().unwrap())
        .expect("file evaluation");
    assert_eq!(&*buffer.borrow(), b"99 \n1 \n");
}
