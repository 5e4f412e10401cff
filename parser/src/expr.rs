use std::cell::RefCell;

use lexer::token::Token;

use crate::types::Type;

#[derive(Debug, Clone)]
pub enum Expression {
  Integer(i64),
  Float(f64),
  Boolean(bool),
  Str(String),
  Identifier(Token),
  Grouping(Box<Expression>),
  Unary {
    operator: Token,
    operand: Box<Expression>,
  },
  Binary {
    operator: Token,
    left: Box<Expression>,
    right: Box<Expression>,
  },
  Cast {
    token: Token,
    target: Type,
    expr: Box<Expression>,
  },
  Array(ExpressionArray),
  StructLiteral(ExpressionStruct),
  AccessChain(ExpressionAccessChain),
  Len {
    token: Token,
    operand: Box<Expression>,
  },
  Call(ExpressionCall),
}

/// `int.[1, 2, 3]` at statement depth, `[1, 2]` when nested inside another
/// array literal. Nested literals have no written element type; the checker
/// fills it in top-down.
#[derive(Debug, Clone)]
pub struct ExpressionArray {
  pub token: Token,
  pub elements: Vec<Expression>,
  pub element_type: RefCell<Option<Type>>,
}

/// `P.{1, 2}` — values already paired with member names in declaration
/// order by the parser.
#[derive(Debug, Clone)]
pub struct ExpressionStruct {
  pub name: Token,
  pub values: Vec<(String, Expression)>,
}

/// `root.member[index].member…` — an identifier root and the ordered keys
/// walked left to right against the runtime value.
#[derive(Debug, Clone)]
pub struct ExpressionAccessChain {
  pub root: Token,
  pub keys: Vec<AccessKey>,
}

#[derive(Debug, Clone)]
pub enum AccessKey {
  Member(Token),
  Index {
    token: Token,
    index: Box<Expression>,
  },
}

#[derive(Debug, Clone)]
pub struct ExpressionCall {
  pub name: Token,
  pub arguments: Vec<Expression>,
}

impl Expression {
  /// A representative token for error reporting. Plain literals carry no
  /// token of their own.
  pub fn token(&self) -> Option<&Token> {
    match self {
      Expression::Integer(_)
      | Expression::Float(_)
      | Expression::Boolean(_)
      | Expression::Str(_) => None,
      Expression::Identifier(token) => Some(token),
      Expression::Grouping(inner) => inner.token(),
      Expression::Unary { operator, .. } => Some(operator),
      Expression::Binary { operator, .. } => Some(operator),
      Expression::Cast { token, .. } => Some(token),
      Expression::Array(array) => Some(&array.token),
      Expression::StructLiteral(literal) => Some(&literal.name),
      Expression::AccessChain(chain) => Some(&chain.root),
      Expression::Len { token, .. } => Some(token),
      Expression::Call(call) => Some(&call.name),
    }
  }
}
