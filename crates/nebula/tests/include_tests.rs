//! Module-loader tests against real files in a temp directory: both
//! include forms, the resolution rules, cross-module inheritance, and the
//! at-most-once guarantee.

use std::fs;
use std::path::Path;

use nebula::{CollectStringPrint, ErrorKind, NoPrint, Object, Runner};
use pretty_assertions::assert_eq;

/// Runs a program as if it lived at `dir/main.fn`, capturing output.
fn run_in(dir: &Path, source: &str) -> (Result<Object, nebula::Error>, String) {
    let mut print = CollectStringPrint::new();
    let result = Runner::new(source)
        .with_script_path(dir.join("main.fn"))
        .run(&mut print);
    (result, print.into_output())
}

fn write(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).unwrap();
}

#[test]
fn statement_include_leaks_bindings_into_the_current_scope() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "util.fn",
        "def add(a, b) { return a + b; } base = 10;",
    );
    let (result, output) = run_in(dir.path(), "include \"util.fn\"; print(add(2, 3)); print(base);");
    result.unwrap();
    assert_eq!(output, "5\n10\n");
}

#[test]
fn statement_include_runs_a_file_at_most_once() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "noisy.fn", "print(\"loaded\");");
    let (result, output) = run_in(
        dir.path(),
        "include \"noisy.fn\"; include \"noisy.fn\"; include \"noisy.fn\";",
    );
    result.unwrap();
    assert_eq!(output, "loaded\n");
}

#[test]
fn missing_include_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let (result, _) = run_in(dir.path(), "include \"ghost.fn\";");
    let err = result.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IoError);
    assert_eq!(err.message(), "Included file 'ghost.fn' not found");
}

#[test]
fn call_include_returns_a_module_object() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "mathutil.fn",
        "def double(n) { return n * 2; } def triple(n) { return n * 3; }",
    );
    let (result, output) = run_in(
        dir.path(),
        "m = include(\"mathutil\"); print(m[\"double\"](4)); print(m[\"triple\"](4));",
    );
    result.unwrap();
    assert_eq!(output, "8\n12\n");
}

#[test]
fn call_include_appends_the_fn_extension() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "lib.fn", "def one() { return 1; }");
    let (result, output) = run_in(dir.path(), "m = include(\"lib\"); print(m[\"one\"]());");
    result.unwrap();
    assert_eq!(output, "1\n");
}

#[test]
fn module_classes_construct_and_cross_module_inheritance_works() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "shapes.fn",
        "class Shape { name = \"shape\"; def label(self) { return self.name; } }",
    );
    let source = "
        m = include(\"shapes\");
        s = m[\"Shape\"]();
        print(s.label());
        class Circle(Shape) { }
        c = Circle();
        print(c.label());
    ";
    let (result, output) = run_in(dir.path(), source);
    result.unwrap();
    assert_eq!(output, "shape\nshape\n");
}

#[test]
fn module_methods_attach_to_module_classes() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "points.fn",
        "class Point { x = 1; }\ndef Point.double(self) { return self.x * 2; }",
    );
    let source = "
        m = include(\"points\");
        p = m[\"Point\"]();
        print(p.double());
    ";
    let (result, output) = run_in(dir.path(), source);
    result.unwrap();
    assert_eq!(output, "2\n");
}

#[test]
fn call_include_caches_the_module_object() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "once.fn", "def f() { return 1; }");
    let source = "
        a = include(\"once\");
        a[\"marker\"] = 7;
        b = include(\"once\");
        print(b[\"marker\"]);
    ";
    let (result, output) = run_in(dir.path(), source);
    result.unwrap();
    assert_eq!(output, "7\n");
}

#[test]
fn module_top_level_statements_do_not_run_in_call_form() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "quiet.fn", "print(\"side effect\"); def f() { return 2; }");
    let (result, output) = run_in(dir.path(), "m = include(\"quiet\"); print(m[\"f\"]());");
    result.unwrap();
    assert_eq!(output, "2\n");
}

#[test]
fn includes_resolve_relative_to_the_working_directory_as_fallback() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "here.fn", "def f() { return 3; }");
    // Script dir points elsewhere; the path relative to cwd still wins.
    let elsewhere = tempfile::tempdir().unwrap();
    let mut print = NoPrint;
    let source = format!(
        "m = include(\"{}\"); return m[\"f\"]();",
        dir.path().join("here").display()
    );
    let result = Runner::new(source)
        .with_script_path(elsewhere.path().join("main.fn"))
        .run(&mut print)
        .unwrap();
    assert_eq!(result, Object::Int(3));
}
