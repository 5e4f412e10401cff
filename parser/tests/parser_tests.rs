#[cfg(test)]
mod parser_tests {

  use diagnostic::DiagnosticEngine;
  use lexer::Lexer;
  use parser::{
    ast::{Declaration, Node, Program},
    expr::{AccessKey, Expression},
    json,
    stmt::Statement,
    types::Type,
    Parser,
  };

  fn parse(source: &str) -> Program {
    let mut engine = DiagnosticEngine::new();
    let mut lexer = Lexer::new(source.to_string());
    lexer.scan_tokens(&mut engine).expect("lexes");

    let mut parser = Parser::new(lexer.tokens);
    let program = parser.parse_program(&mut engine).expect("parses");
    assert!(!engine.has_errors());
    program
  }

  fn parse_error(source: &str) -> DiagnosticEngine {
    let mut engine = DiagnosticEngine::new();
    let mut lexer = Lexer::new(source.to_string());
    lexer.scan_tokens(&mut engine).expect("lexes");

    let mut parser = Parser::new(lexer.tokens);
    assert!(parser.parse_program(&mut engine).is_err());
    assert!(engine.has_errors());
    engine
  }

  fn main_body(program: &Program) -> &Vec<Node> {
    match &program.declarations[0] {
      Declaration::Function(f) => &f.block.body,
      other => panic!("expected a function declaration, got {:?}", other),
    }
  }

  #[test]
  fn test_multiplication_binds_tighter_than_addition() {
    let program = parse("fn main() -> void { var x: = 3 + 4 * 2; return; }");

    let body = main_body(&program);
    let Node::Declaration(Declaration::Variable(variable)) = &body[0] else {
      panic!("expected a variable declaration");
    };

    assert!(variable.declared.is_none());
    let Expression::Binary {
      operator, right, ..
    } = &variable.rhs
    else {
      panic!("expected a binary rhs");
    };
    assert_eq!(operator.lexeme, "+");
    assert!(matches!(**right, Expression::Binary { ref operator, .. } if operator.lexeme == "*"));
  }

  #[test]
  fn test_typed_array_literal_with_nested_elements() {
    let program =
      parse("fn main() -> void { var m: [][]int = []int.[[1, 2], [3, 4]]; return; }");

    let body = main_body(&program);
    let Node::Declaration(Declaration::Variable(variable)) = &body[0] else {
      panic!("expected a variable declaration");
    };

    assert_eq!(
      variable.declared,
      Some(Type::Int.wrap_array().wrap_array())
    );

    let Expression::Array(array) = &variable.rhs else {
      panic!("expected an array literal");
    };
    assert_eq!(
      *array.element_type.borrow(),
      Some(Type::Int.wrap_array())
    );
    assert_eq!(array.elements.len(), 2);

    // Nested literals have no written element type yet.
    let Expression::Array(nested) = &array.elements[0] else {
      panic!("expected a nested array literal");
    };
    assert_eq!(*nested.element_type.borrow(), None);
    assert_eq!(nested.elements.len(), 2);
  }

  #[test]
  fn test_array_literal_allows_trailing_comma() {
    let program = parse("fn main() -> void { var a: []int = int.[1, 2, 3,]; return; }");

    let body = main_body(&program);
    let Node::Declaration(Declaration::Variable(variable)) = &body[0] else {
      panic!("expected a variable declaration");
    };
    let Expression::Array(array) = &variable.rhs else {
      panic!("expected an array literal");
    };
    assert_eq!(array.elements.len(), 3);
  }

  #[test]
  fn test_struct_literal_binds_positionally() {
    let program = parse(
      "struct P { x: int, y: int, } fn main() -> void { var p: = P.{1, 2}; return; }",
    );

    assert!(matches!(&program.declarations[0], Declaration::Struct(s) if s.members.len() == 2));

    let Declaration::Function(f) = &program.declarations[1] else {
      panic!("expected main");
    };
    let Node::Declaration(Declaration::Variable(variable)) = &f.block.body[0] else {
      panic!("expected a variable declaration");
    };
    let Expression::StructLiteral(literal) = &variable.rhs else {
      panic!("expected a struct literal");
    };

    assert_eq!(literal.name.lexeme, "P");
    assert_eq!(literal.values[0].0, "x");
    assert_eq!(literal.values[1].0, "y");
    assert!(matches!(literal.values[0].1, Expression::Integer(1)));
    assert!(matches!(literal.values[1].1, Expression::Integer(2)));
  }

  #[test]
  fn test_struct_literal_arity_mismatch_is_fatal() {
    let engine = parse_error(
      "struct P { x: int, y: int, } fn main() -> void { var p: = P.{1, 2, 3}; return; }",
    );
    let rendered = engine.format_all_plain("");
    assert!(rendered.contains("struct 'P' has 2 members, literal provides 3"));
  }

  #[test]
  fn test_access_chain_collects_keys_in_order() {
    let program = parse("fn main() -> void { grid[0].cells[1] = 5; return; }");

    let body = main_body(&program);
    let Node::Statement(Statement::Assignment(assignment)) = &body[0] else {
      panic!("expected an assignment");
    };
    let Expression::AccessChain(chain) = &assignment.target else {
      panic!("expected an access chain target");
    };

    assert_eq!(chain.root.lexeme, "grid");
    assert_eq!(chain.keys.len(), 3);
    assert!(matches!(chain.keys[0], AccessKey::Index { .. }));
    assert!(matches!(&chain.keys[1], AccessKey::Member(t) if t.lexeme == "cells"));
    assert!(matches!(chain.keys[2], AccessKey::Index { .. }));
  }

  #[test]
  fn test_defer_accepts_calls_prints_and_blocks() {
    let program = parse(
      "fn tidy() -> void { return; } \
       fn main() -> void { defer tidy(); defer print(1); defer { print(2); } return; }",
    );

    let Declaration::Function(f) = &program.declarations[1] else {
      panic!("expected main");
    };

    let deferred: Vec<&Statement> = f
      .block
      .body
      .iter()
      .filter_map(|node| match node {
        Node::Statement(Statement::Defer { statement, .. }) => Some(statement.as_ref()),
        _ => None,
      })
      .collect();

    assert_eq!(deferred.len(), 3);
    assert!(matches!(deferred[0], Statement::Call(_)));
    assert!(matches!(deferred[1], Statement::Print { .. }));
    assert!(matches!(deferred[2], Statement::Block(_)));
  }

  #[test]
  fn test_defer_rejects_assignments() {
    let engine = parse_error("fn main() -> void { var x: = 1; defer x = 2; return; }");
    let rendered = engine.format_all_plain("");
    assert!(rendered.contains("cannot defer"));
  }

  #[test]
  fn test_union_parameter_type() {
    let program = parse("fn show(x: int || float) -> void { print(x); return; }");

    let Declaration::Function(f) = &program.declarations[0] else {
      panic!("expected a function");
    };
    assert_eq!(
      f.parameters[0].ty,
      Type::Union(vec![Type::Int, Type::Float])
    );
    assert!(f.has_union_parameters());
  }

  #[test]
  fn test_else_if_chains_nest() {
    let program = parse(
      "fn main() -> void { \
         var x: = 1; \
         if (x == 0) { print(0); } else if (x == 1) { print(1); } else { print(2); } \
         return; \
       }",
    );

    let body = main_body(&program);
    let Node::Statement(Statement::IfElse { else_block, .. }) = &body[1] else {
      panic!("expected an if statement");
    };

    let chained = else_block.as_ref().expect("has an else");
    assert!(matches!(
      chained.body[0],
      Node::Statement(Statement::IfElse { .. })
    ));
  }

  #[test]
  fn test_missing_semicolon_reports_expected_vs_found() {
    let engine = parse_error("fn main() -> void { var x: = 1 return; }");
    let rendered = engine.format_all_plain("");
    assert!(rendered.contains("expected SEMI_COLON, found 'return'"));
  }

  #[test]
  fn test_nullptr_is_rejected() {
    let engine = parse_error("fn main() -> void { var x: = nullptr; return; }");
    let rendered = engine.format_all_plain("");
    assert!(rendered.contains("not implemented"));
  }

  #[test]
  fn test_json_dump_is_stable() {
    let source = "struct P { x: int, y: float, } \
                  fn main() -> void { var p: = P.{1, 2.5}; p.x = 3; print(p); return; }";

    let first = json::pretty(&parse(source));
    let second = json::pretty(&parse(source));

    assert_eq!(first, second);
    assert!(first.contains("\"Declarations\""));
    assert!(first.contains("\"StructDeclaration\""));
    assert!(first.contains("\"FunctionDeclaration\""));
    // 4-space indentation at the first nesting level
    assert!(first.starts_with("{\n    \"Declarations\""));
  }
}
