//! Pretty-prints a (checked) program as a JSON document. Debug surface for
//! the `--ast` flag; object keys serialize in sorted order so the dump is
//! byte-stable for a given program.

use serde::Serialize;
use serde_json::{json, ser::PrettyFormatter, Serializer, Value};

use crate::{
  ast::{Declaration, Node, Program},
  expr::{AccessKey, Expression},
  stmt::Statement,
};

pub fn pretty(program: &Program) -> String {
  let declarations: Vec<Value> = program.declarations.iter().map(declaration_to_json).collect();
  let document = json!({ "Declarations": declarations });

  let mut buffer = Vec::new();
  let formatter = PrettyFormatter::with_indent(b"    ");
  let mut serializer = Serializer::with_formatter(&mut buffer, formatter);

  if document.serialize(&mut serializer).is_err() {
    return String::new();
  }

  String::from_utf8(buffer).unwrap_or_default()
}

fn declaration_to_json(declaration: &Declaration) -> Value {
  match declaration {
    Declaration::Variable(variable) => json!({
      "VariableDeclaration": {
        "Name": variable.name.lexeme,
        "DeclType": variable.ty().map(|t| t.to_string()),
        "RHS": expression_to_json(&variable.rhs),
      }
    }),

    Declaration::Function(function) => {
      let parameters: Vec<Value> = function
        .parameters
        .iter()
        .map(|p| {
          json!({
            "Name": p.name.lexeme,
            "DeclType": p.ty.to_string(),
          })
        })
        .collect();

      let body: Vec<Value> = function.block.body.iter().map(node_to_json).collect();

      json!({
        "FunctionDeclaration": {
          "Name": function.name.lexeme,
          "Parameters": parameters,
          "DeclType": function.return_type.to_string(),
          "Body": body,
        }
      })
    },

    Declaration::Struct(declaration) => {
      let members: Vec<Value> = declaration
        .members
        .iter()
        .map(|m| {
          json!({
            "Name": m.name.lexeme,
            "DeclType": m.ty.to_string(),
          })
        })
        .collect();

      json!({
        "StructDeclaration": {
          "Name": declaration.name.lexeme,
          "Members": members,
        }
      })
    },
  }
}

fn node_to_json(node: &Node) -> Value {
  match node {
    Node::Declaration(declaration) => declaration_to_json(declaration),
    Node::Statement(statement) => statement_to_json(statement),
  }
}

fn statement_to_json(statement: &Statement) -> Value {
  match statement {
    Statement::Print { expr, .. } => json!({
      "PrintStatement": expression_to_json(expr),
    }),

    Statement::Assignment(assignment) => json!({
      "AssignmentStatement": {
        "Target": expression_to_json(&assignment.target),
        "RHS": expression_to_json(&assignment.rhs),
      }
    }),

    Statement::Block(block) => {
      let body: Vec<Value> = block.body.iter().map(node_to_json).collect();
      json!({ "BlockStatement": body })
    },

    Statement::Return { expr, .. } => json!({
      "ReturnStatement": expr.as_ref().map(expression_to_json),
    }),

    Statement::Defer { statement, .. } => json!({
      "DeferStatement": statement_to_json(statement),
    }),

    Statement::Break(_) => json!({ "BreakStatement": {} }),
    Statement::Continue(_) => json!({ "ContinueStatement": {} }),

    Statement::For {
      initializer,
      condition,
      increment,
      block,
    } => {
      let body: Vec<Value> = block.body.iter().map(node_to_json).collect();
      json!({
        "ForStatement": {
          "Initializer": {
            "Name": initializer.name.lexeme,
            "DeclType": initializer.ty().map(|t| t.to_string()),
            "RHS": expression_to_json(&initializer.rhs),
          },
          "Condition": expression_to_json(condition),
          "Increment": {
            "Target": expression_to_json(&increment.target),
            "RHS": expression_to_json(&increment.rhs),
          },
          "Body": body,
        }
      })
    },

    Statement::While { condition, block } => {
      let body: Vec<Value> = block.body.iter().map(node_to_json).collect();
      json!({
        "WhileStatement": {
          "Condition": expression_to_json(condition),
          "Body": body,
        }
      })
    },

    Statement::IfElse {
      condition,
      then_block,
      else_block,
    } => {
      let then_body: Vec<Value> = then_block.body.iter().map(node_to_json).collect();
      let else_body: Option<Vec<Value>> = else_block
        .as_ref()
        .map(|block| block.body.iter().map(node_to_json).collect());

      json!({
        "IfElseStatement": {
          "Condition": expression_to_json(condition),
          "Then": then_body,
          "Else": else_body,
        }
      })
    },

    Statement::Call(call) => {
      let arguments: Vec<Value> = call.arguments.iter().map(expression_to_json).collect();
      json!({
        "FunctionCall": {
          "Name": call.name.lexeme,
          "Arguments": arguments,
        }
      })
    },
  }
}

fn expression_to_json(expression: &Expression) -> Value {
  match expression {
    Expression::Integer(value) => json!(value),
    Expression::Float(value) => json!(value),
    Expression::Boolean(value) => json!(value),
    Expression::Str(value) => json!(value),

    Expression::Identifier(token) => json!({ "Identifier": token.lexeme }),

    Expression::Grouping(inner) => json!({ "Grouping": expression_to_json(inner) }),

    Expression::Unary { operator, operand } => json!({
      "UnaryOp": {
        "Op": operator.lexeme,
        "Operand": expression_to_json(operand),
      }
    }),

    Expression::Binary {
      operator,
      left,
      right,
    } => json!({
      "BinaryOp": {
        "Op": operator.lexeme,
        "Left": expression_to_json(left),
        "Right": expression_to_json(right),
      }
    }),

    Expression::Cast { target, expr, .. } => json!({
      "Cast": {
        "CastType": target.to_string(),
        "Expr": expression_to_json(expr),
      }
    }),

    Expression::Array(array) => {
      let elements: Vec<Value> = array.elements.iter().map(expression_to_json).collect();
      json!({
        "ArrayLiteral": {
          "DeclType": array.element_type.borrow().as_ref().map(|t| t.to_string()),
          "Elements": elements,
        }
      })
    },

    Expression::StructLiteral(literal) => {
      let values: Vec<Value> = literal
        .values
        .iter()
        .map(|(name, value)| {
          let mut pair = serde_json::Map::new();
          pair.insert(name.clone(), expression_to_json(value));
          Value::Object(pair)
        })
        .collect();

      json!({
        "StructLiteral": {
          "Name": literal.name.lexeme,
          "MemberValues": values,
        }
      })
    },

    Expression::AccessChain(chain) => {
      let keys: Vec<Value> = chain
        .keys
        .iter()
        .map(|key| match key {
          AccessKey::Member(token) => json!({ "Member": token.lexeme }),
          AccessKey::Index { index, .. } => json!({ "Index": expression_to_json(index) }),
        })
        .collect();

      json!({
        "AccessChain": {
          "Root": chain.root.lexeme,
          "Keys": keys,
        }
      })
    },

    Expression::Len { operand, .. } => json!({ "Len": expression_to_json(operand) }),

    Expression::Call(call) => {
      let arguments: Vec<Value> = call.arguments.iter().map(expression_to_json).collect();
      json!({
        "FunctionCall": {
          "Name": call.name.lexeme,
          "Arguments": arguments,
        }
      })
    },
  }
}
