use std::{cell::RefCell, rc::Rc};

use lexer::token::Token;

use crate::{
  expr::Expression,
  stmt::{Statement, StatementBlock},
  types::{Parameter, Type},
};

/// The root of a parsed source file. Owns every declaration.
#[derive(Debug, Default, Clone)]
pub struct Program {
  pub declarations: Vec<Declaration>,
}

/// Blocks hold declarations and statements side by side, in source order.
#[derive(Debug, Clone)]
pub enum Node {
  Declaration(Declaration),
  Statement(Statement),
}

#[derive(Debug, Clone)]
pub enum Declaration {
  Variable(DeclarationVariable),
  Function(Rc<DeclarationFunction>),
  Struct(Rc<DeclarationStruct>),
}

#[derive(Debug, Clone)]
pub struct DeclarationVariable {
  pub name: Token,
  /// The annotation as written, absent when the declaration relies on
  /// inference.
  pub declared: Option<Type>,
  /// Filled in by the type checker when the annotation is absent. Reset
  /// between union-parameter blueprint passes.
  pub inferred: RefCell<Option<Type>>,
  pub rhs: Expression,
}

impl DeclarationVariable {
  /// The effective type after checking: the annotation, or the inferred one.
  pub fn ty(&self) -> Option<Type> {
    match &self.declared {
      Some(ty) if *ty != Type::Invalid => Some(ty.clone()),
      _ => self.inferred.borrow().clone(),
    }
  }
}

#[derive(Debug, Clone)]
pub struct DeclarationFunction {
  pub name: Token,
  pub parameters: Vec<Parameter>,
  pub return_type: Type,
  pub block: StatementBlock,
}

impl DeclarationFunction {
  pub fn has_union_parameters(&self) -> bool {
    self.parameters.iter().any(|p| p.ty.is_union())
  }
}

#[derive(Debug, Clone)]
pub struct StructMember {
  pub name: Token,
  pub ty: Type,
}

#[derive(Debug, Clone)]
pub struct DeclarationStruct {
  pub name: Token,
  /// Declaration order matters: struct literals bind positionally.
  pub members: Vec<StructMember>,
}

impl DeclarationStruct {
  pub fn member(&self, name: &str) -> Option<&StructMember> {
    self.members.iter().find(|m| m.name.lexeme == name)
  }
}
