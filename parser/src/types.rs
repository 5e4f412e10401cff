use std::fmt;

use lexer::token::Token;

/// A composed type. Arrays, struct wrappers, and function types nest through
/// the boxed inner type; a union holds the alternatives a parameter accepts.
///
/// Parameters exist only on the `Function` variant, so the old
/// "parameters on a non-function" failure mode is unrepresentable.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
  Invalid,
  Void,
  Int,
  Float,
  Bool,
  Str,
  Array(Box<Type>),
  Struct(String),
  Function {
    parameters: Vec<Parameter>,
    return_type: Box<Type>,
  },
  Union(Vec<Type>),
}

#[derive(Debug, Clone)]
pub struct Parameter {
  pub name: Token,
  pub ty: Type,
}

impl PartialEq for Parameter {
  fn eq(&self, other: &Self) -> bool {
    self.name.lexeme == other.name.lexeme && self.ty == other.ty
  }
}

impl Type {
  /// Resolves a written type name to its scalar kind, or a struct wrapper
  /// for anything that is not a builtin name.
  pub fn from_name(name: &str) -> Self {
    match name {
      "void" => Type::Void,
      "int" => Type::Int,
      "float" => Type::Float,
      "bool" => Type::Bool,
      "string" => Type::Str,
      _ => Type::Struct(name.to_string()),
    }
  }

  pub fn is_array(&self) -> bool {
    matches!(self, Type::Array(_))
  }

  pub fn is_struct(&self) -> bool {
    matches!(self, Type::Struct(_))
  }

  pub fn is_union(&self) -> bool {
    matches!(self, Type::Union(_))
  }

  /// One array modifier on top of this type.
  pub fn wrap_array(self) -> Type {
    Type::Array(Box::new(self))
  }

  /// Strips one array modifier. `None` when this is not an array; callers
  /// report that as a type error at the use site.
  pub fn unwrap_array(&self) -> Option<Type> {
    match self {
      Type::Array(inner) => Some((**inner).clone()),
      _ => None,
    }
  }

  /// Whether a parameter of this type accepts an argument of `other`.
  /// A union accepts any of its alternatives; everything else requires
  /// structural equality.
  pub fn accepts(&self, other: &Type) -> bool {
    match self {
      Type::Union(alternatives) => alternatives.iter().any(|alt| alt == other),
      _ => self == other,
    }
  }
}

impl fmt::Display for Type {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Type::Invalid => write!(f, "INVALID"),
      Type::Void => write!(f, "void"),
      Type::Int => write!(f, "int"),
      Type::Float => write!(f, "float"),
      Type::Bool => write!(f, "bool"),
      Type::Str => write!(f, "string"),
      Type::Array(inner) => write!(f, "[]{}", inner),
      Type::Struct(name) => write!(f, "{}", name),
      Type::Function { return_type, .. } => write!(f, "fn(...) -> {}", return_type),
      Type::Union(alternatives) => {
        let parts: Vec<String> = alternatives.iter().map(|t| t.to_string()).collect();
        write!(f, "{}", parts.join(" || "))
      },
    }
  }
}

/// Result type of a binary operation, keyed by operator lexeme and the
/// scalar kinds of both operands. `Invalid` means the combination is a type
/// error at the use site.
pub fn promoted_type(operator: &str, left: &Type, right: &Type) -> Type {
  match (operator, left, right) {
    ("+" | "-" | "*" | "/", Type::Int, Type::Int) => Type::Int,
    ("+" | "-" | "*" | "/", Type::Int, Type::Float) => Type::Float,
    ("+" | "-" | "*" | "/", Type::Float, Type::Int) => Type::Float,
    ("+" | "-" | "*" | "/", Type::Float, Type::Float) => Type::Float,

    ("%", Type::Int, Type::Int) => Type::Int,

    ("+", Type::Str, Type::Str | Type::Int | Type::Float) => Type::Str,
    ("+", Type::Int | Type::Float, Type::Str) => Type::Str,

    (
      "==" | "!=" | "<" | "<=" | ">" | ">=",
      Type::Int | Type::Float,
      Type::Int | Type::Float,
    ) => Type::Bool,

    // Booleans and strings support equality only, no ordering.
    ("==" | "!=", Type::Bool, Type::Bool) => Type::Bool,
    ("==" | "!=", Type::Str, Type::Str) => Type::Bool,

    ("&&" | "||", Type::Bool, Type::Bool) => Type::Bool,

    _ => Type::Invalid,
  }
}

/// Cast legality: identity always, plus the small numeric/string set.
pub fn can_cast(target: &Type, source: &Type) -> bool {
  if target == source {
    return true;
  }

  matches!(
    (target, source),
    (Type::Int, Type::Float)
      | (Type::Float, Type::Int)
      | (Type::Str, Type::Int)
      | (Type::Str, Type::Float)
  )
}
