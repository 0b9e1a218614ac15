mod common;

use common::run_in;
use lisp_rs::core::value::Val;
use lisp_rs::printer;
use lisp_rs::reader::Reader;
use lisp_rs::vm::engine::Interp;

/// Read one form and render it back.
fn read_print(interp: &mut Interp, src: &str) -> String {
    let h = Reader::new(src)
        .read(interp)
        .expect("read failed")
        .expect("no value");
    printer::render(interp, h)
}

#[test]
fn integers_round_trip() {
    let mut interp = Interp::new();
    for src in ["0", "7", "12345"] {
        assert_eq!(read_print(&mut interp, src), src);
    }
}

#[test]
fn symbols_round_trip() {
    let mut interp = Interp::new();
    for src in ["foo", "make-adder", "+", "-5"] {
        assert_eq!(read_print(&mut interp, src), src);
    }
}

#[test]
fn literal_lists_round_trip() {
    let mut interp = Interp::new();
    for src in ["(1 2 3)", "(a (b c) 3)", "nil"] {
        assert_eq!(read_print(&mut interp, src), src);
    }
}

#[test]
fn literal_strings_round_trip() {
    let mut interp = Interp::new();
    assert_eq!(read_print(&mut interp, "\"abc\""), "\"abc\"");
}

#[test]
fn printed_symbol_reads_back_to_the_same_object() {
    let mut interp = Interp::new();
    let first = Reader::new("widget")
        .read(&mut interp)
        .unwrap()
        .unwrap();
    let printed = printer::render(&interp, first);
    let second = Reader::new(&printed).read(&mut interp).unwrap().unwrap();
    assert_eq!(first, second);
}

#[test]
fn printed_integer_reads_back_to_the_same_value() {
    let mut interp = Interp::new();
    let first = Reader::new("9001").read(&mut interp).unwrap().unwrap();
    let printed = printer::render(&interp, first);
    let second = Reader::new(&printed).read(&mut interp).unwrap().unwrap();
    match (interp.heap.get(first), interp.heap.get(second)) {
        (Val::Int(a), Val::Int(b)) => assert_eq!(a, b),
        other => panic!("expected ints, got {:?}", other),
    }
}

#[test]
fn evaluated_list_prints_in_list_form() {
    let mut interp = Interp::new();
    let h = run_in(&mut interp, "(list 1 2 3)");
    assert_eq!(printer::render(&interp, h), "(1 2 3)");
}

#[test]
fn dict_rendering_shows_identity_keyed_entries() {
    let mut interp = Interp::new();
    let h = run_in(
        &mut interp,
        "(do (def d (dict)) (setitem d (quote k) 1) d)",
    );
    assert_eq!(printer::render(&interp, h), "{k : 1}");
}
