//! End-to-end program tests: source in, printed output and top-level value
//! out, with print output captured through `CollectStringPrint`.

use nebula::{CollectStringPrint, ErrorKind, Object, Runner};
use pretty_assertions::assert_eq;

/// Runs a program and returns its captured print output.
fn output(source: &str) -> String {
    let mut print = CollectStringPrint::new();
    Runner::new(source)
        .run(&mut print)
        .unwrap_or_else(|err| panic!("program failed: {err}\nsource: {source}"));
    print.into_output()
}

/// Runs a program and returns its top-level value.
fn result(source: &str) -> Object {
    let mut print = CollectStringPrint::new();
    Runner::new(source)
        .run(&mut print)
        .unwrap_or_else(|err| panic!("program failed: {err}\nsource: {source}"))
}

/// Runs a program expecting an error; returns its kind and message.
fn error(source: &str) -> (ErrorKind, String) {
    let mut print = CollectStringPrint::new();
    let err = Runner::new(source)
        .run(&mut print)
        .expect_err("program should have failed");
    (err.kind(), err.message().to_owned())
}

// =============================================================================
// Arithmetic and precedence
// =============================================================================

#[test]
fn arithmetic_precedence() {
    assert_eq!(output("print(2 + 3 * 4);"), "14\n");
}

#[test]
fn parentheses_override_precedence() {
    assert_eq!(output("print((2 + 3) * 4);"), "20\n");
}

#[test]
fn division_is_true_division() {
    assert_eq!(output("print(7 / 2);"), "3.5\n");
}

#[test]
fn modulo_follows_the_divisor_sign() {
    assert_eq!(output("print(-7 % 3);"), "2\n");
    assert_eq!(output("print(7 % -3);"), "-2\n");
}

#[test]
fn float_literals_reassemble_across_the_dot() {
    assert_eq!(output("print(0.5);"), "0.5\n");
    assert_eq!(output("print(1.25 + 0.75);"), "2.0\n");
}

#[test]
fn string_and_list_concatenation() {
    assert_eq!(output(r#"print("ab" + "cd");"#), "abcd\n");
    assert_eq!(output("print([1] + [2, 3]);"), "[1, 2, 3]\n");
}

#[test]
fn mixed_operand_addition_is_a_type_error() {
    let (kind, message) = error(r#"x = 1 + "one";"#);
    assert_eq!(kind, ErrorKind::TypeError);
    assert!(message.contains("unsupported operand types"), "{message}");
}

#[test]
fn division_by_zero_is_an_error() {
    let (kind, _) = error("x = 1 / 0;");
    assert_eq!(kind, ErrorKind::TypeError);
}

// =============================================================================
// Truthiness and short-circuit logic
// =============================================================================

#[test]
fn and_returns_false_or_the_right_value() {
    assert_eq!(output("print(0 and 5);"), "false\n");
    assert_eq!(output("print(1 and 5);"), "5\n");
}

#[test]
fn or_returns_true_or_the_right_value() {
    assert_eq!(output("print(2 or 9);"), "true\n");
    assert_eq!(output("print(0 or 9);"), "9\n");
    assert_eq!(output("print(None or 0);"), "0\n");
}

#[test]
fn not_negates_truthiness() {
    assert_eq!(output("print(not 0); print(not [1]);"), "true\nfalse\n");
}

#[test]
fn short_circuit_skips_the_right_operand() {
    // boom() is undefined; short-circuiting must never evaluate it.
    assert_eq!(output("print(0 and boom());"), "false\n");
    assert_eq!(output("print(1 or boom());"), "true\n");
}

#[test]
fn ternary_branches_are_lazy() {
    assert_eq!(output("print(1 == 1 ? 10 : boom());"), "10\n");
    assert_eq!(output("x = 5; print(x > 9 ? 1 : 2);"), "2\n");
}

// =============================================================================
// Variables, assignment, scoping
// =============================================================================

#[test]
fn assignment_yields_its_value() {
    assert_eq!(result("x = 5"), Object::Int(5));
}

#[test]
fn undefined_variable_is_a_name_error() {
    let (kind, message) = error("print(nope);");
    assert_eq!(kind, ErrorKind::NameError);
    assert_eq!(message, "Undefined variable nope");
}

#[test]
fn augmented_assignment_forms() {
    assert_eq!(output("x = 10; x += 5; x -= 3; x *= 2; print(x);"), "24\n");
    assert_eq!(output("x = 7; x %= 4; print(x);"), "3\n");
    assert_eq!(output("x = 1; x /= 2; print(x);"), "0.5\n");
}

#[test]
fn increment_and_decrement_expand() {
    assert_eq!(output("x = 1; x++; x++; x--; print(x);"), "2\n");
}

#[test]
fn augmented_assignment_requires_an_existing_target() {
    let (kind, message) = error("missing += 1;");
    assert_eq!(kind, ErrorKind::NameError);
    assert_eq!(message, "missing not defined");
}

#[test]
fn augmented_assignment_on_attributes_and_indexes() {
    assert_eq!(output("d = {'n': 1}; d.n += 4; print(d.n);"), "5\n");
    assert_eq!(output("xs = [1, 2]; xs[1] += 10; print(xs);"), "[1, 12]\n");
}

#[test]
fn global_declaration_aliases_the_root_cell() {
    let source = "
        count = 0;
        def bump() { global count; count += 1; }
        bump(); bump(); bump();
        print(count);
    ";
    assert_eq!(output(source), "3\n");
}

#[test]
fn global_seeds_a_missing_binding() {
    let source = "
        def init() { global fresh; fresh = 41; }
        init();
        print(fresh + 1);
    ";
    assert_eq!(output(source), "42\n");
}

// =============================================================================
// Control flow
// =============================================================================

#[test]
fn if_elif_else_picks_the_first_truthy_branch() {
    let source = "
        x = 7;
        if (x > 10) { print(1); }
        elif (x > 5) { print(2); }
        else { print(3); }
    ";
    assert_eq!(output(source), "2\n");
}

#[test]
fn while_loops_until_falsy() {
    assert_eq!(output("i = 0; while (i < 4) { i += 1; } print(i);"), "4\n");
}

#[test]
fn for_iterates_a_list_with_optional_step() {
    assert_eq!(output("for (v, [10, 20, 30]) { print(v); }"), "10\n20\n30\n");
    assert_eq!(output("for (v, range(6), 2) { print(v); }"), "0\n2\n4\n");
}

#[test]
fn for_requires_a_list() {
    let (kind, message) = error("for (v, 5) { print(v); }");
    assert_eq!(kind, ErrorKind::TypeError);
    assert_eq!(message, "Expected list for 'for' loop iterable");
}

#[test]
fn break_and_continue_reach_the_nearest_loop() {
    let source = "
        for (v, range(10)) {
            if (v == 3) { continue; }
            if (v == 5) { break; }
            print(v);
        }
    ";
    assert_eq!(output(source), "0\n1\n2\n4\n");
}

#[test]
fn non_local_return_through_loops() {
    let source = "
        def find(xs, t) {
            for (v, xs) {
                if (v == t) { return true; }
            }
            return false;
        }
        print(find([1, 2, 3], 2));
    ";
    assert_eq!(output(source), "true\n");
}

#[test]
fn top_level_return_yields_the_value() {
    assert_eq!(result("return 1 + 2;"), Object::Int(3));
}

#[test]
fn break_outside_a_loop_is_an_error() {
    let (kind, _) = error("break;");
    assert_eq!(kind, ErrorKind::SyntaxError);
}

#[test]
fn match_selects_the_first_equal_pattern() {
    let source = "
        x = 3;
        match (x) {
            case 1 | 2 { print(\"low\"); }
            case 3 { print(\"three\"); }
            else { print(\"other\"); }
        }
    ";
    assert_eq!(output(source), "three\n");
}

#[test]
fn match_falls_back_to_else() {
    let source = "
        r = match (99) { case 1 { 10 } else { 20 } };
        print(r);
    ";
    assert_eq!(output(source), "20\n");
}

// =============================================================================
// Functions, closures, and calls
// =============================================================================

#[test]
fn closure_capture() {
    let source = "
        def make(n) { return lambda() { return n; }; }
        f = make(7);
        print(f());
    ";
    assert_eq!(output(source), "7\n");
}

#[test]
fn closures_observe_later_writes_to_captured_scopes() {
    let source = "
        def counter() {
            n = 0;
            bump = lambda() { n = n + 1; return n; };
            return bump;
        }
        c = counter();
        c(); c();
        print(c());
    ";
    // The lambda's frame is a child of counter's; each call rebinds n in
    // the lambda's own frame, so the captured cell stays at 0 and every
    // call sees n = 0 + 1.
    assert_eq!(output(source), "1\n");
}

#[test]
fn default_arguments_evaluate_at_call_time() {
    let source = "
        base = 10;
        def f(x = base + 1) { return x; }
        base = 20;
        print(f());
        print(f(5));
    ";
    assert_eq!(output(source), "21\n5\n");
}

#[test]
fn keyword_and_varargs_binding() {
    let source = "
        def f(a, *rest, **kw) { print(a); print(rest); print(kw); }
        f(1, 2, 3, x = 4);
    ";
    assert_eq!(output(source), "1\n[2, 3]\n{'x': 4}\n");
}

#[test]
fn positional_unpack_splices_in_place() {
    let source = "
        def add3(a, b, c) { return a + b + c; }
        xs = [1, 2, 3];
        print(add3(*xs));
    ";
    assert_eq!(output(source), "6\n");
}

#[test]
fn keyword_unpack_merges_into_the_bundle() {
    let source = "
        def f(a, b) { return a - b; }
        kw = **{'b': 1};
        print(f(5, kw));
        print(f(**{'a': 10, 'b': 4}));
    ";
    assert_eq!(output(source), "4\n6\n");
}

#[test]
fn missing_argument_is_an_arity_error() {
    let (kind, message) = error("def f(a, b) { return a; } f(1);");
    assert_eq!(kind, ErrorKind::ArityError);
    assert_eq!(message, "Missing required argument 'b'");
}

#[test]
fn unexpected_keyword_is_an_arity_error() {
    let (kind, message) = error("def f(a) { return a; } f(1, z = 2);");
    assert_eq!(kind, ErrorKind::ArityError);
    assert_eq!(message, "Unexpected keyword arguments: z");
}

#[test]
fn too_many_arguments_is_an_arity_error() {
    let (kind, message) = error("def f(a) { return a; } f(1, 2);");
    assert_eq!(kind, ErrorKind::ArityError);
    assert_eq!(message, "Too many arguments provided");
}

#[test]
fn calling_a_non_callable_is_a_type_error() {
    let (kind, _) = error("x = 5; x();");
    assert_eq!(kind, ErrorKind::TypeError);
}

#[test]
fn function_body_without_return_yields_its_last_value() {
    assert_eq!(result("def f() { 1 + 1; 40 + 2 } f()"), Object::Int(42));
}

// =============================================================================
// Classes and instances
// =============================================================================

#[test]
fn class_with_inheritance() {
    let source = "
        class A { x = 1; def show(self) { print(self.x); } }
        class B(A) { }
        b = B();
        b.show();
    ";
    assert_eq!(output(source), "1\n");
}

#[test]
fn constructor_binds_positionals_then_defaults() {
    let source = "
        class Point { x = 0; y = 0; }
        p = Point(3);
        print(p.x);
        print(p.y);
    ";
    assert_eq!(output(source), "3\n0\n");
}

#[test]
fn constructor_accepts_field_keywords() {
    let source = "
        class Point { x = 0; y = 0; }
        p = Point(y = 9);
        print(p.x); print(p.y);
    ";
    assert_eq!(output(source), "0\n9\n");
}

#[test]
fn constructor_rejects_surplus_positionals() {
    let (kind, message) = error("class P { x; } p = P(1, 2);");
    assert_eq!(kind, ErrorKind::TypeError);
    assert_eq!(message, "P expects 1 fields, got 2");
}

#[test]
fn methods_bind_their_receiver() {
    let source = "
        class Counter {
            n = 0;
            def bump(self) { self.n += 1; return self.n; }
        }
        c = Counter();
        c.bump(); c.bump();
        print(c.bump());
    ";
    assert_eq!(output(source), "3\n");
}

#[test]
fn dotted_def_attaches_a_method() {
    let source = "
        class Greeter { name = \"world\"; }
        def Greeter.hello(self) { return \"hi \" + self.name; }
        g = Greeter();
        print(g.hello());
    ";
    assert_eq!(output(source), "hi world\n");
}

#[test]
fn method_resolution_tracks_visited_classes() {
    // A and B inherit from each other; lookup must terminate and still
    // find methods through the cycle.
    let source = "
        class A(B) { def from_a(self) { return 1; } }
        class B(A) { def from_b(self) { return 2; } }
        a = A();
        print(a.from_b());
    ";
    assert_eq!(output(source), "2\n");
}

#[test]
fn missing_attribute_lists_available_names() {
    let (kind, message) = error("class P { x; def go(self) { } } p = P(); p.nope;");
    assert_eq!(kind, ErrorKind::AttributeError);
    assert!(message.contains("has no attribute 'nope'"), "{message}");
    assert!(message.contains("'go'"), "{message}");
    assert!(message.contains("'x'"), "{message}");
}

#[test]
fn undeclared_fields_can_still_be_assigned_and_read() {
    let source = "
        class Bag { }
        b = Bag();
        b.extra = 5;
        print(b.extra);
    ";
    assert_eq!(output(source), "5\n");
}

#[test]
fn nested_classes_register_qualified_and_feed_defaults() {
    let source = "
        class Outer {
            class Inner { v = 7; }
            box = Inner();
        }
        o = Outer();
        print(type(o.box));
        print(o.box.v);
    ";
    assert_eq!(output(source), "Outer.Inner\n7\n");
}

#[test]
fn instances_index_like_dicts() {
    let source = "
        class P { x = 1; }
        p = P();
        p[\"x\"] = 5;
        print(p[\"x\"]);
        print(p[\"__type__\"]);
    ";
    assert_eq!(output(source), "5\nP\n");
}

// =============================================================================
// Errors, try/catch, throw
// =============================================================================

#[test]
fn try_catch_binds_the_message() {
    assert_eq!(output("try { throw \"bad\"; } catch (e) { print(e); }"), "bad\n");
}

#[test]
fn catch_receives_runtime_error_messages() {
    let source = "try { print(nope); } catch (e) { print(e); }";
    assert_eq!(output(source), "Undefined variable nope\n");
}

#[test]
fn thrown_values_stringify() {
    assert_eq!(output("try { throw 42; } catch (e) { print(e); }"), "42\n");
}

#[test]
fn catch_without_a_binder_is_allowed() {
    assert_eq!(output("try { throw \"x\"; } catch { print(\"caught\"); }"), "caught\n");
}

#[test]
fn uncaught_throw_is_a_user_error() {
    let (kind, message) = error("throw \"boom\";");
    assert_eq!(kind, ErrorKind::UserError);
    assert_eq!(message, "boom");
}

#[test]
fn control_signals_pass_through_try_blocks() {
    // break must reach the loop, not the catch arm.
    let source = "
        for (v, [1, 2, 3]) {
            try { if (v == 2) { break; } print(v); }
            catch (e) { print(\"caught\"); }
        }
    ";
    assert_eq!(output(source), "1\n");
}

// =============================================================================
// Collections, indexing, slicing, membership
// =============================================================================

#[test]
fn list_and_dict_literals_render_like_the_language() {
    assert_eq!(output("print([1, \"two\", 3.0]);"), "[1, 'two', 3.0]\n");
    assert_eq!(output("print({'a': 1, 2: 'b'});"), "{'a': 1, 2: 'b'}\n");
}

#[test]
fn empty_braces_are_an_empty_dict() {
    assert_eq!(output("x = {}; print(length(x)); print(x);"), "0\n{}\n");
}

#[test]
fn negative_indices_count_from_the_end() {
    assert_eq!(output("xs = [1, 2, 3]; print(xs[-1]);"), "3\n");
    assert_eq!(output("print(\"abc\"[-2]);"), "b\n");
}

#[test]
fn full_slice_copies_the_sequence() {
    let source = "
        xs = [1, 2, 3];
        ys = xs[:];
        ys.append(4);
        print(xs);
        print(ys);
    ";
    assert_eq!(output(source), "[1, 2, 3]\n[1, 2, 3, 4]\n");
}

#[test]
fn slices_honor_bounds_and_steps() {
    assert_eq!(output("xs = [0, 1, 2, 3, 4, 5]; print(xs[1:4]);"), "[1, 2, 3]\n");
    assert_eq!(output("xs = [0, 1, 2, 3, 4, 5]; print(xs[::2]);"), "[0, 2, 4]\n");
    assert_eq!(output("xs = [0, 1, 2, 3]; print(xs[::-1]);"), "[3, 2, 1, 0]\n");
    assert_eq!(output("print(\"hello\"[1:3]);"), "el\n");
}

#[test]
fn slicing_a_dict_is_a_type_error() {
    let (kind, _) = error("d = {'a': 1}; d[:];");
    assert_eq!(kind, ErrorKind::TypeError);
}

#[test]
fn membership_covers_lists_strings_and_dict_keys() {
    assert_eq!(output("print(2 in [1, 2, 3]);"), "true\n");
    assert_eq!(output("print(\"ell\" in \"hello\");"), "true\n");
    assert_eq!(output("print(\"x\" in {'x': 1});"), "true\n");
    assert_eq!(output("print(\"q\" not in \"hello\");"), "true\n");
    assert_eq!(output("print(5 in [1, 2]);"), "false\n");
}

#[test]
fn dict_updates_preserve_insertion_order() {
    let source = "
        d = {'b': 1, 'a': 2};
        d['c'] = 3;
        d['b'] = 9;
        print(d);
    ";
    assert_eq!(output(source), "{'b': 9, 'a': 2, 'c': 3}\n");
}

#[test]
fn list_comprehension_applies_step_and_conditions() {
    assert_eq!(output("print([v * 2 | v, range(5), 1 | v % 2 == 0]);"), "[0, 4, 8]\n");
    assert_eq!(output("print([v | v, range(10), 3]);"), "[0, 3, 6, 9]\n");
    assert_eq!(
        output("print([v | v, range(10), 1 | v > 2 | v < 6]);"),
        "[3, 4, 5]\n"
    );
}

#[test]
fn dict_comprehension_maps_keys_to_values() {
    assert_eq!(output("print({k | k * k, k, range(4)});"), "{0: 0, 1: 1, 2: 4, 3: 9}\n");
    assert_eq!(
        output("print({k | 1, k, range(6) | k % 3 == 0});"),
        "{0: 1, 3: 1}\n"
    );
}

// =============================================================================
// Native methods on strings, lists
// =============================================================================

#[test]
fn string_methods() {
    assert_eq!(output("print(\"abc\".reverse());"), "cba\n");
    assert_eq!(output("print(\"hi\".upper()); print(\"HI\".lower());"), "HI\nhi\n");
    assert_eq!(output("print(\",\".join([\"a\", \"b\", \"c\"]));"), "a,b,c\n");
    assert_eq!(output("print(\"a b c\".split());"), "['a', 'b', 'c']\n");
    assert_eq!(output("print(\"a-b\".split(\"-\"));"), "['a', 'b']\n");
    assert_eq!(output("print(\"  pad  \".strip());"), "pad\n");
}

#[test]
fn join_stringifies_elements() {
    assert_eq!(output("print(\"-\".join([1, 2, 3]));"), "1-2-3\n");
}

#[test]
fn reverse_round_trips() {
    assert_eq!(output("s = \"nebula\"; print(s.reverse().reverse() == s);"), "true\n");
    let source = "
        xs = [1, 2, 3];
        xs.reverse(); xs.reverse();
        print(xs == [1, 2, 3]);
    ";
    assert_eq!(output(source), "true\n");
}

#[test]
fn list_methods() {
    assert_eq!(output("xs = [1]; xs.append(2); xs.extend([3, 4]); print(xs);"), "[1, 2, 3, 4]\n");
    assert_eq!(output("xs = [1, 2, 3]; xs.remove(2); print(xs);"), "[1, 3]\n");
    assert_eq!(output("xs = [3, 1, 2]; xs.sort(); print(xs);"), "[1, 2, 3]\n");
    assert_eq!(output("xs = [3, 1, 2]; xs.sort(True); print(xs);"), "[3, 2, 1]\n");
    assert_eq!(output("xs = [1, 2, 3]; print(xs.pop()); print(xs);"), "3\n[1, 2]\n");
    assert_eq!(output("xs = [5, 6, 7]; print(xs.index(6));"), "1\n");
}

#[test]
fn list_mutation_is_visible_through_aliases() {
    let source = "
        xs = [1];
        ys = xs;
        ys.append(2);
        print(xs);
    ";
    assert_eq!(output(source), "[1, 2]\n");
}

// =============================================================================
// Builtins
// =============================================================================

#[test]
fn range_produces_materialized_integer_lists() {
    assert_eq!(output("print(range(4));"), "[0, 1, 2, 3]\n");
    assert_eq!(output("print(range(2, 5));"), "[2, 3, 4]\n");
    assert_eq!(output("print(range(10, 0, -3));"), "[10, 7, 4, 1]\n");
    assert_eq!(output("print(range(0));"), "[]\n");
}

#[test]
fn length_of_range_round_trips() {
    assert_eq!(output("print(length(range(9)));"), "9\n");
}

#[test]
fn int_str_round_trip() {
    assert_eq!(output("print(int(str(12345)) == 12345);"), "true\n");
    assert_eq!(output("print(int(str(-7)) == -7);"), "true\n");
}

#[test]
fn type_names() {
    let source = "
        print(type(1)); print(type(1.5)); print(type(\"s\"));
        print(type(True)); print(type(None)); print(type([]));
        print(type({})); print(type(lambda() { }));
    ";
    assert_eq!(
        output(source),
        "int\nfloat\nstr\nbool\nNoneType\nlist\ndict\nfunction\n"
    );
}

#[test]
fn coercions() {
    assert_eq!(output("print(int(3.9));"), "3\n");
    assert_eq!(output("print(float(2));"), "2.0\n");
    assert_eq!(output("print(str([1, 2]));"), "[1, 2]\n");
    assert_eq!(output("print(list(\"ab\"));"), "['a', 'b']\n");
    assert_eq!(output("print(list({'x': 1, 'y': 2}));"), "['x', 'y']\n");
    assert_eq!(output("print(dict({'k': 1}));"), "{'k': 1}\n");
}

#[test]
fn bad_coercions_are_type_errors() {
    let (kind, message) = error("int(\"three\");");
    assert_eq!(kind, ErrorKind::TypeError);
    assert_eq!(message, "invalid literal for int(): 'three'");
}

#[test]
fn chr_and_ord_round_trip() {
    assert_eq!(output("print(chr(97));"), "a\n");
    assert_eq!(output("print(ord(\"a\"));"), "97\n");
    assert_eq!(output("print(chr(ord(\"Q\")));"), "Q\n");
}

#[test]
fn map_filter_reduce() {
    assert_eq!(
        output("print(map(lambda(x) { return x * x; }, [1, 2, 3]));"),
        "[1, 4, 9]\n"
    );
    assert_eq!(
        output("print(filter(lambda(x) { return x % 2 == 0; }, range(6)));"),
        "[0, 2, 4]\n"
    );
    assert_eq!(
        output("print(reduce(lambda(a, b) { return a + b; }, [1, 2, 3, 4]));"),
        "10\n"
    );
    assert_eq!(
        output("print(reduce(lambda(a, b) { return a + b; }, [], 99));"),
        "99\n"
    );
}

#[test]
fn printf_takes_separator_and_terminator() {
    assert_eq!(output("printf(1, 2, 3, \"-\", \"!\\n\");"), "1-2-3!\n");
    assert_eq!(output("printf(\"\\n\");"), "\n");
}

#[test]
fn constants_are_prebound() {
    assert_eq!(output("print(True); print(False); print(None == None);"), "true\nfalse\ntrue\n");
    assert_eq!(output("print(__argc >= 0);"), "true\n");
}

#[test]
fn comparisons_order_numbers_and_strings_only() {
    assert_eq!(output("print(1 < 2.5);"), "true\n");
    assert_eq!(output("print(\"a\" < \"b\");"), "true\n");
    let (kind, message) = error("x = 1 < \"2\";");
    assert_eq!(kind, ErrorKind::TypeError);
    assert!(message.contains("Cannot compare"), "{message}");
}

#[test]
fn structural_equality_spans_containers() {
    assert_eq!(output("print([1, [2]] == [1, [2]]);"), "true\n");
    assert_eq!(output("print({'a': 1} == {'a': 1});"), "true\n");
    assert_eq!(output("print({'a': 1} != {'a': 2});"), "true\n");
    assert_eq!(output("print(1 == 1.0);"), "true\n");
}

// =============================================================================
// Blocks and statement plumbing
// =============================================================================

#[test]
fn brace_blocks_run_in_the_enclosing_scope() {
    assert_eq!(output("{ x = 1; x += 1; } print(x);"), "2\n");
}

#[test]
fn type_annotations_are_discarded() {
    assert_eq!(output("x :: <int> = 3; print(x);"), "3\n");
}

#[test]
fn comments_are_stripped() {
    let source = "
        // a line comment
        x = 1; /* a block
        comment */ y = 2;
        print(x + y);
    ";
    assert_eq!(output(source), "3\n");
}
