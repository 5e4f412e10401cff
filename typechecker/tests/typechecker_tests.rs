#[cfg(test)]
mod typechecker_tests {

  use diagnostic::DiagnosticEngine;
  use lexer::Lexer;
  use parser::{
    ast::{Declaration, Node, Program},
    types::Type,
    Parser,
  };
  use typechecker::TypeChecker;

  fn parse(source: &str) -> Program {
    let mut engine = DiagnosticEngine::new();
    let mut lexer = Lexer::new(source.to_string());
    lexer.scan_tokens(&mut engine).expect("lexes");

    let mut parser = Parser::new(lexer.tokens);
    parser.parse_program(&mut engine).expect("parses")
  }

  fn check(source: &str) -> (Program, DiagnosticEngine, Result<(), ()>) {
    let program = parse(source);
    let mut engine = DiagnosticEngine::new();
    let mut checker = TypeChecker::new();
    let result = checker.check_program(&program, &mut engine);
    (program, engine, result)
  }

  fn check_ok(source: &str) {
    let (_, engine, result) = check(source);
    assert!(result.is_ok(), "{}", engine.format_all_plain(source));
    assert!(!engine.has_errors());
  }

  fn check_err(source: &str, needle: &str) {
    let (_, engine, result) = check(source);
    assert!(result.is_err(), "expected a type error");
    let rendered = engine.format_all_plain(source);
    assert!(
      rendered.contains(needle),
      "missing '{}' in:\n{}",
      needle,
      rendered
    );
  }

  #[test]
  fn test_inference_adopts_rhs_type() {
    let (program, engine, result) = check(
      "fn main() -> void { var x: = 3 + 4 * 2; var f: = 2.5; print(x); print(f); return; }",
    );
    assert!(result.is_ok());
    assert!(!engine.has_errors());

    let Declaration::Function(main) = &program.declarations[0] else {
      panic!("expected main");
    };
    let Node::Declaration(Declaration::Variable(x)) = &main.block.body[0] else {
      panic!("expected var x");
    };
    let Node::Declaration(Declaration::Variable(f)) = &main.block.body[1] else {
      panic!("expected var f");
    };

    assert_eq!(*x.inferred.borrow(), Some(Type::Int));
    assert_eq!(*f.inferred.borrow(), Some(Type::Float));
  }

  #[test]
  fn test_annotation_must_match_rhs() {
    check_err(
      "fn main() -> void { var x: int = true; return; }",
      "cannot assign bool to variable 'x' of type int",
    );
  }

  #[test]
  fn test_redeclaration_in_same_scope_is_rejected() {
    check_err(
      "fn main() -> void { var x: = 1; var x: = 2; return; }",
      "already declared in this scope",
    );
  }

  #[test]
  fn test_shadowing_outer_scope_is_allowed() {
    check_ok(
      "fn main() -> void { var x: = 1; { var x: = true; print(x); } print(x); return; }",
    );
  }

  #[test]
  fn test_non_void_function_requires_trailing_return() {
    check_err(
      "fn f() -> int { var x: = 1; print(x); } fn main() -> void { return; }",
      "missing return at the end of 'f'",
    );
  }

  #[test]
  fn test_void_function_cannot_return_a_value() {
    check_err(
      "fn main() -> void { return 1; }",
      "returning a int from 'main' with return type void",
    );
  }

  #[test]
  fn test_return_type_must_match() {
    check_err(
      "fn f() -> int { return true; } fn main() -> void { return; }",
      "'f' returns int, found bool",
    );
    check_err(
      "fn f() -> int { return; } fn main() -> void { return; }",
      "'f' must return a int",
    );
  }

  #[test]
  fn test_returns_inside_nested_blocks_are_collected() {
    check_err(
      "fn f(x: int) -> int { if (x > 0) { return true; } return 1; } \
       fn main() -> void { return; }",
      "'f' returns int, found bool",
    );
  }

  #[test]
  fn test_break_and_continue_require_a_loop() {
    check_err(
      "fn main() -> void { break; return; }",
      "break statement outside of a loop",
    );
    check_err(
      "fn main() -> void { continue; return; }",
      "continue statement outside of a loop",
    );
    check_ok(
      "fn main() -> void { while (true) { break; } \
       for (var i: = 0; i < 3; i = i + 1) { continue; } return; }",
    );
  }

  #[test]
  fn test_condition_must_be_bool() {
    check_err(
      "fn main() -> void { if (1) { print(1); } return; }",
      "condition must be a bool, found int",
    );
    check_err(
      "fn main() -> void { while (1 + 2) { print(1); } return; }",
      "condition must be a bool, found int",
    );
  }

  #[test]
  fn test_invalid_binary_operation() {
    check_err(
      "fn main() -> void { var x: = 1 + true; return; }",
      "invalid binary operation: int + bool",
    );
    check_err(
      "fn main() -> void { var x: = \"a\" < \"b\"; return; }",
      "invalid binary operation: string < string",
    );
  }

  #[test]
  fn test_equality_works_on_bools_and_strings() {
    check_ok(
      "fn main() -> void { var a: = true == false; var b: = \"x\" != \"y\"; \
       print(a); print(b); return; }",
    );
  }

  #[test]
  fn test_cast_legality() {
    check_ok(
      "fn main() -> void { var a: = cast(float) 1; var b: = cast(int) 2.5; \
       var c: = cast(string) 42; var d: = cast(string) 1.5; \
       print(a); print(b); print(c); print(d); return; }",
    );
    check_err(
      "fn main() -> void { var x: = cast(int) \"42\"; return; }",
      "cannot cast string to int",
    );
  }

  #[test]
  fn test_len_requires_array_or_string() {
    check_ok(
      "fn main() -> void { var a: []int = int.[1, 2]; var s: = \"abc\"; \
       print(len(a)); print(len(s)); return; }",
    );
    check_err(
      "fn main() -> void { print(len(1)); return; }",
      "len expects an array or string, found int",
    );
  }

  #[test]
  fn test_array_elements_must_match_element_type() {
    check_err(
      "fn main() -> void { var a: []int = int.[1, true]; return; }",
      "array element has type bool, expected int",
    );
  }

  #[test]
  fn test_nested_array_literals_inherit_element_type() {
    check_ok(
      "fn main() -> void { var m: [][]int = []int.[[1, 2], [3, 4]]; \
       print(m[1][0]); return; }",
    );
    check_err(
      "fn main() -> void { var m: [][]int = []int.[[1, true]]; return; }",
      "array element has type bool, expected int",
    );
  }

  #[test]
  fn test_access_chain_typing() {
    let source = "struct P { x: int, y: float, } \
                  struct Box { p: P, tags: []string, } \
                  fn main() -> void { \
                    var b: = Box.{P.{1, 2.0}, string.[\"a\"]}; \
                    var x: int = b.p.x; \
                    var t: string = b.tags[0]; \
                    print(x); print(t); return; }";
    check_ok(source);
  }

  #[test]
  fn test_access_chain_rejects_bad_keys() {
    check_err(
      "fn main() -> void { var x: = 1; var y: = x.field; return; }",
      "type int has no members",
    );
    check_err(
      "struct P { x: int, } fn main() -> void { var p: = P.{1}; var y: = p.z; return; }",
      "struct 'P' has no member 'z'",
    );
    check_err(
      "fn main() -> void { var a: []int = int.[1]; var x: = a[true]; return; }",
      "array index must be an int, found bool",
    );
    check_err(
      "fn main() -> void { var x: = 1; x[0] = 2; return; }",
      "cannot index into int",
    );
  }

  #[test]
  fn test_call_arity_and_argument_types() {
    check_err(
      "fn f(x: int) -> int { return x; } fn main() -> void { print(f(1, 2)); return; }",
      "'f' expects 1 argument(s), got 2",
    );
    check_err(
      "fn f(x: int) -> int { return x; } fn main() -> void { print(f(true)); return; }",
      "argument 'x' of 'f' expects int, got bool",
    );
    check_err(
      "fn main() -> void { print(g()); return; }",
      "unknown function 'g'",
    );
  }

  #[test]
  fn test_function_redeclaration_is_rejected() {
    check_err(
      "fn f() -> void { return; } fn f() -> void { return; } fn main() -> void { return; }",
      "function 'f' is already declared",
    );
  }

  #[test]
  fn test_struct_redeclaration_is_rejected() {
    check_err(
      "struct P { x: int, } struct P { y: int, } fn main() -> void { return; }",
      "struct 'P' is already declared",
    );
  }

  #[test]
  fn test_struct_literal_member_types() {
    check_err(
      "struct P { x: int, y: int, } fn main() -> void { var p: = P.{1, true}; return; }",
      "member 'y' of 'P' has type int, value has type bool",
    );
  }

  #[test]
  fn test_assignment_types_must_agree() {
    check_err(
      "fn main() -> void { var x: = 1; x = true; return; }",
      "cannot assign bool to a target of type int",
    );
    check_err(
      "struct P { x: int, } fn main() -> void { var p: = P.{1}; p.x = 2.5; return; }",
      "cannot assign float to a target of type int",
    );
  }

  #[test]
  fn test_union_parameters_resolve_per_call_site() {
    let source = "fn twice(x: int || float) -> void { var d: = x + x; print(d); return; } \
                  fn main() -> void { twice(2); twice(1.5); return; }";
    let (program, engine, result) = check(source);
    assert!(result.is_ok(), "{}", engine.format_all_plain(source));
    assert!(!engine.has_errors());

    // The blueprint pass must leave no inferred types behind.
    let Declaration::Function(twice) = &program.declarations[0] else {
      panic!("expected twice");
    };
    let Node::Declaration(Declaration::Variable(d)) = &twice.block.body[0] else {
      panic!("expected var d");
    };
    assert_eq!(*d.inferred.borrow(), None);
  }

  #[test]
  fn test_union_argument_must_match_an_alternative() {
    check_err(
      "fn twice(x: int || float) -> void { print(x); return; } \
       fn main() -> void { twice(true); return; }",
      "argument 'x' of 'twice' expects int || float, got bool",
    );
  }

  #[test]
  fn test_union_blueprint_catches_per_site_errors() {
    // `x % 2` is only valid when x resolves to int.
    check_err(
      "fn parity(x: int || float) -> void { var p: = x % 2; print(p); return; } \
       fn main() -> void { parity(1.5); return; }",
      "invalid binary operation: float % int",
    );
  }

  #[test]
  fn test_unused_variable_warning() {
    let (_, engine, result) =
      check("fn main() -> void { var unused: = 1; return; }");
    assert!(result.is_ok());
    assert!(!engine.has_errors());
    assert!(engine.has_warnings());
    let rendered = engine.format_all_plain("");
    assert!(rendered.contains("variable 'unused' is never used"));
  }

  #[test]
  fn test_functions_do_not_close_over_caller_locals() {
    check_err(
      "fn helper() -> int { return local; } \
       fn main() -> void { var local: = 1; print(helper()); return; }",
      "undeclared identifier 'local'",
    );
  }
}
