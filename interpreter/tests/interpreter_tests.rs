#[cfg(test)]
mod interpreter_tests {

  use std::{cell::RefCell, io, io::Write, rc::Rc};

  use diagnostic::DiagnosticEngine;
  use interpreter::Interpreter;
  use lexer::Lexer;
  use parser::Parser;
  use typechecker::TypeChecker;

  /// An `io::Write` sink that can be read back after the interpreter is
  /// done with its half.
  #[derive(Clone, Default)]
  struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

  impl SharedBuffer {
    fn contents(&self) -> String {
      String::from_utf8(self.0.borrow().clone()).expect("output is UTF-8")
    }
  }

  impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
      self.0.borrow_mut().extend_from_slice(buf);
      Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
      Ok(())
    }
  }

  /// Lex, parse, type check, and run; returns everything `print` wrote.
  fn run(source: &str) -> String {
    let mut engine = DiagnosticEngine::new();

    let mut lexer = Lexer::new(source.to_string());
    lexer.scan_tokens(&mut engine).expect("lexes");

    let mut parser = Parser::new(lexer.tokens);
    let program = parser.parse_program(&mut engine).expect("parses");

    let mut checker = TypeChecker::new();
    checker
      .check_program(&program, &mut engine)
      .unwrap_or_else(|_| panic!("type checks:\n{}", engine.format_all_plain(source)));

    let buffer = SharedBuffer::default();
    let mut interpreter = Interpreter::with_output(Box::new(buffer.clone()));
    interpreter
      .run_program(&program, &mut engine)
      .unwrap_or_else(|_| panic!("runs:\n{}", engine.format_all_plain(source)));

    buffer.contents()
  }

  /// Same pipeline, expecting the run (not the earlier stages) to fail.
  fn run_expecting_runtime_error(source: &str) -> String {
    let mut engine = DiagnosticEngine::new();

    let mut lexer = Lexer::new(source.to_string());
    lexer.scan_tokens(&mut engine).expect("lexes");

    let mut parser = Parser::new(lexer.tokens);
    let program = parser.parse_program(&mut engine).expect("parses");

    let mut checker = TypeChecker::new();
    checker
      .check_program(&program, &mut engine)
      .expect("type checks");

    let buffer = SharedBuffer::default();
    let mut interpreter = Interpreter::with_output(Box::new(buffer.clone()));
    assert!(interpreter.run_program(&program, &mut engine).is_err());
    assert!(engine.has_errors());

    engine.format_all_plain(source)
  }

  // ---- the reference end-to-end scenarios ----

  #[test]
  fn test_arithmetic_precedence() {
    let output = run("fn main() -> void { var x: = 3 + 4 * 2; print(x); return; }");
    assert_eq!(output, "11\n");
  }

  #[test]
  fn test_array_mutation_and_printing() {
    let output = run(
      "fn main() -> void { var a: []int = int.[1, 2, 3]; a[1] = a[0] + a[2]; print(a); return; }",
    );
    assert_eq!(output, "[1, 4, 3]\n");
  }

  #[test]
  fn test_for_loop_with_continue() {
    let output = run(
      "fn main() -> void { \
         for (var i: = 0; i < 3; i = i + 1) { if (i == 1) { continue; } print(i); } \
         return; }",
    );
    assert_eq!(output, "0\n2\n");
  }

  #[test]
  fn test_function_call_returns_a_value() {
    let output = run(
      "fn f(x: int) -> int { return x * x; } fn main() -> void { print(f(5)); return; }",
    );
    assert_eq!(output, "25\n");
  }

  #[test]
  fn test_struct_literal_and_member_mutation() {
    let output = run(
      "struct P { x: int, y: int, } \
       fn main() -> void { var p: = P.{1, 2}; p.x = 9; print(p.x + p.y); return; }",
    );
    assert_eq!(output, "11\n");
  }

  #[test]
  fn test_defer_runs_at_scope_exit() {
    let output = run(
      "fn main() -> void { { defer print(\"B\"); print(\"A\"); } print(\"C\"); return; }",
    );
    assert_eq!(output, "A\nB\nC\n");
  }

  // ---- defer ordering on every exit path ----

  #[test]
  fn test_defer_lifo_order() {
    let output = run(
      "fn main() -> void { \
         { defer print(1); defer print(2); defer print(3); print(0); } \
         return; }",
    );
    assert_eq!(output, "0\n3\n2\n1\n");
  }

  #[test]
  fn test_defer_runs_on_break_and_continue() {
    let output = run(
      "fn main() -> void { \
         for (var i: = 0; i < 3; i = i + 1) { \
           defer print(\"exit\" + i); \
           if (i == 1) { continue; } \
           if (i == 2) { break; } \
           print(\"body\" + i); \
         } \
         return; }",
    );
    assert_eq!(output, "body0\nexit0\nexit1\nexit2\n");
  }

  #[test]
  fn test_defer_runs_on_return() {
    let output = run(
      "fn f() -> int { defer print(\"cleanup\"); print(\"work\"); return 7; } \
       fn main() -> void { print(f()); return; }",
    );
    assert_eq!(output, "work\ncleanup\n7\n");
  }

  #[test]
  fn test_deferred_block_runs_whole_body() {
    let output = run(
      "fn main() -> void { \
         { defer { print(\"d1\"); print(\"d2\"); } print(\"body\"); } \
         return; }",
    );
    assert_eq!(output, "body\nd1\nd2\n");
  }

  #[test]
  fn test_defer_runs_on_fatal_error() {
    let rendered = run_expecting_runtime_error(
      "fn main() -> void { \
         var a: []int = int.[1]; \
         { defer print(\"released\"); print(a[5]); } \
         return; }",
    );
    assert!(rendered.contains("array index 5 out of range for length 1"));
  }

  // ---- short-circuit evaluation ----

  #[test]
  fn test_short_circuit_skips_side_effects() {
    let output = run(
      "fn noisy() -> bool { print(\"evaluated\"); return true; } \
       fn main() -> void { \
         var a: = true || noisy(); \
         var b: = false && noisy(); \
         print(a); print(b); \
         var c: = false || noisy(); \
         print(c); \
         return; }",
    );
    // noisy() runs exactly once, for the non-deciding `||` case.
    assert_eq!(output, "true\nfalse\nevaluated\ntrue\n");
  }

  // ---- reference semantics ----

  #[test]
  fn test_array_aliases_share_the_container() {
    let output = run(
      "fn main() -> void { \
         var a: []int = int.[1, 2, 3]; \
         var b: []int = a; \
         b[0] = 99; \
         print(a[0]); \
         return; }",
    );
    assert_eq!(output, "99\n");
  }

  #[test]
  fn test_struct_aliases_share_the_container() {
    let output = run(
      "struct P { x: int, } \
       fn main() -> void { \
         var p: = P.{1}; \
         var q: = p; \
         q.x = 42; \
         print(p.x); \
         return; }",
    );
    assert_eq!(output, "42\n");
  }

  #[test]
  fn test_composites_mutate_through_function_calls() {
    let output = run(
      "fn bump(a: []int) -> void { a[0] = a[0] + 1; return; } \
       fn main() -> void { \
         var xs: []int = int.[10]; \
         bump(xs); bump(xs); \
         print(xs[0]); \
         return; }",
    );
    assert_eq!(output, "12\n");
  }

  // ---- evaluation details ----

  #[test]
  fn test_mixed_arithmetic_promotes_to_float() {
    let output = run("fn main() -> void { print(1 + 0.5); print(3 * 1.5); return; }");
    assert_eq!(output, "1.5\n4.5\n");
  }

  #[test]
  fn test_string_concatenation_formats_numbers() {
    let output = run(
      "fn main() -> void { \
         print(\"n=\" + 42); \
         print(\"f=\" + 2.5); \
         print(\"big=\" + 123456.0); \
         print(1 + \"!\"); \
         return; }",
    );
    assert_eq!(output, "n=42\nf=2.5\nbig=1.2346e+05\n1!\n");
  }

  #[test]
  fn test_casts() {
    let output = run(
      "fn main() -> void { \
         print(cast(float) 3); \
         print(cast(int) 2.9); \
         print(cast(string) 7 + \"!\"); \
         print(cast(string) 1.25); \
         return; }",
    );
    assert_eq!(output, "3\n2\n7!\n1.25\n");
  }

  #[test]
  fn test_len_on_arrays_and_strings() {
    let output = run(
      "fn main() -> void { \
         var a: []int = int.[1, 2, 3]; \
         print(len(a)); \
         print(len(\"hello\")); \
         return; }",
    );
    assert_eq!(output, "3\n5\n");
  }

  #[test]
  fn test_while_loop_with_break() {
    let output = run(
      "fn main() -> void { \
         var i: = 0; \
         while (true) { \
           if (i == 3) { break; } \
           print(i); \
           i = i + 1; \
         } \
         return; }",
    );
    assert_eq!(output, "0\n1\n2\n");
  }

  #[test]
  fn test_recursion() {
    let output = run(
      "fn fact(n: int) -> int { \
         if (n <= 1) { return 1; } \
         return n * fact(n - 1); \
       } \
       fn main() -> void { print(fact(5)); return; }",
    );
    assert_eq!(output, "120\n");
  }

  #[test]
  fn test_union_parameter_runs_per_call_site() {
    let output = run(
      "fn twice(x: int || float) -> void { print(x + x); return; } \
       fn main() -> void { twice(2); twice(1.25); return; }",
    );
    assert_eq!(output, "4\n2.5\n");
  }

  #[test]
  fn test_nested_array_access_and_mutation() {
    let output = run(
      "fn main() -> void { \
         var m: [][]int = []int.[[1, 2], [3, 4]]; \
         m[1][0] = 30; \
         print(m[1][0] + m[0][1]); \
         print(m); \
         return; }",
    );
    assert_eq!(output, "32\n[[1, 2], [30, 4]]\n");
  }

  #[test]
  fn test_struct_prints_multiline_at_top_level() {
    let output = run(
      "struct P { x: int, y: float, } \
       fn main() -> void { var p: = P.{9, 2.5}; print(p); return; }",
    );
    assert_eq!(output, "{\n    x: int = 9,\n    y: float = 2.5\n}\n");
  }

  #[test]
  fn test_nested_struct_prints_inline() {
    let output = run(
      "struct P { x: int, } \
       struct Box { p: P, } \
       fn main() -> void { var b: = Box.{P.{7}}; print(b); return; }",
    );
    assert_eq!(output, "{\n    p: P = { x: int = 7 }\n}\n");
  }

  #[test]
  fn test_string_newline_escape_renders_as_line_break() {
    let output = run("fn main() -> void { print(\"a\\nb\"); return; }");
    assert_eq!(output, "a\nb\n");
  }

  #[test]
  fn test_global_variables_are_visible_in_functions() {
    let output = run(
      "var base: = 10; \
       fn shifted(x: int) -> int { return base + x; } \
       fn main() -> void { print(shifted(5)); return; }",
    );
    assert_eq!(output, "15\n");
  }

  // ---- runtime failures ----

  #[test]
  fn test_index_out_of_range_is_fatal() {
    let rendered = run_expecting_runtime_error(
      "fn main() -> void { var a: []int = int.[1, 2]; print(a[2]); return; }",
    );
    assert!(rendered.contains("array index 2 out of range for length 2"));
  }

  #[test]
  fn test_negative_index_is_fatal() {
    let rendered = run_expecting_runtime_error(
      "fn main() -> void { var a: []int = int.[1, 2]; a[0 - 1] = 5; return; }",
    );
    assert!(rendered.contains("out of range"));
  }

  #[test]
  fn test_division_by_zero_is_fatal() {
    let rendered = run_expecting_runtime_error(
      "fn main() -> void { var zero: = 0; print(1 / zero); return; }",
    );
    assert!(rendered.contains("integer division by zero"));
  }

  #[test]
  fn test_void_assignment_is_fatal() {
    let rendered = run_expecting_runtime_error(
      "fn shout() -> void { print(\"hi\"); return; } \
       fn main() -> void { var x: = shout(); print(x); return; }",
    );
    assert!(rendered.contains("attempting to assign void to variable 'x'"));
  }

  #[test]
  fn test_missing_main_is_fatal() {
    let mut engine = DiagnosticEngine::new();

    let mut lexer = Lexer::new("fn helper() -> void { return; }".to_string());
    lexer.scan_tokens(&mut engine).expect("lexes");
    let mut parser = Parser::new(lexer.tokens);
    let program = parser.parse_program(&mut engine).expect("parses");
    TypeChecker::new()
      .check_program(&program, &mut engine)
      .expect("type checks");

    let buffer = SharedBuffer::default();
    let mut interpreter = Interpreter::with_output(Box::new(buffer.clone()));
    assert!(interpreter.run_program(&program, &mut engine).is_err());
    assert!(engine
      .format_all_plain("")
      .contains("main function not found"));
  }
}
