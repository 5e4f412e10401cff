use std::{
  collections::{HashMap, HashSet},
  rc::Rc,
};

use diagnostic::{code::DiagnosticCode, diagnostic::Diagnostic, DiagnosticEngine};
use lexer::token::Token;
use parser::{
  ast::{Declaration, DeclarationFunction, DeclarationStruct, Node, Program},
  types::Type,
};

mod declarations;
mod expressions;
mod statements;

/// What the checker is currently inside of. `ResolvingBlueprint` marks the
/// re-check of a union-parameter function body against the argument types
/// of one call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
  Normal,
  InLoop,
  ResolvingBlueprint,
}

#[derive(Debug, Clone)]
struct VariableState {
  ty: Type,
  token: Token,
  used: bool,
  warnable: bool,
}

/// Walks the AST after parsing, attaching inferred types to variable
/// declarations and validating every operation against the type tables.
pub struct TypeChecker {
  pub functions: HashMap<String, Rc<DeclarationFunction>>,
  pub structs: HashMap<String, Rc<DeclarationStruct>>,
  scopes: Vec<HashMap<String, VariableState>>,
  returns: Vec<(Token, Option<Type>)>,
  status: Status,
  blueprints_in_flight: HashSet<String>,
}

impl TypeChecker {
  pub fn new() -> Self {
    Self {
      functions: HashMap::new(),
      structs: HashMap::new(),
      scopes: vec![],
      returns: vec![],
      status: Status::Normal,
      blueprints_in_flight: HashSet::new(),
    }
  }

  /// Checks the whole program. The first semantic error is emitted into
  /// the engine and aborts the check.
  pub fn check_program(
    &mut self,
    program: &Program,
    engine: &mut DiagnosticEngine,
  ) -> Result<(), ()> {
    self.scopes = vec![HashMap::new()];

    for declaration in &program.declarations {
      self.check_declaration(declaration, engine)?;
    }

    Ok(())
  }

  pub(crate) fn check_node(&mut self, node: &Node, engine: &mut DiagnosticEngine) -> Result<(), ()> {
    match node {
      Node::Declaration(declaration) => self.check_declaration(declaration, engine),
      Node::Statement(statement) => self.check_statement(statement, engine),
    }
  }

  pub(crate) fn check_declaration(
    &mut self,
    declaration: &Declaration,
    engine: &mut DiagnosticEngine,
  ) -> Result<(), ()> {
    match declaration {
      Declaration::Variable(variable) => self.check_variable_declaration(variable, engine),
      Declaration::Function(function) => self.check_function_declaration(function, engine),
      Declaration::Struct(declaration) => self.check_struct_declaration(declaration, engine),
    }
  }

  // ---- scope helpers ----

  pub(crate) fn begin_scope(&mut self) {
    self.scopes.push(HashMap::new());
  }

  /// Pops the innermost scope, warning about block locals that were never
  /// read. Blueprint passes stay silent so one body cannot warn per call
  /// site.
  pub(crate) fn end_scope(&mut self, engine: &mut DiagnosticEngine) {
    let Some(scope) = self.scopes.pop() else {
      return;
    };

    if self.status == Status::ResolvingBlueprint {
      return;
    }

    for (name, state) in scope {
      if state.warnable && !state.used {
        let diagnostic = Diagnostic::new(
          DiagnosticCode::UnusedVariable,
          format!("variable '{}' is never used", name),
        )
        .at(state.token.to_span(), "declared here".to_string());

        engine.emit(diagnostic);
      }
    }
  }

  pub(crate) fn declare(
    &mut self,
    token: &Token,
    ty: Type,
    warnable: bool,
    engine: &mut DiagnosticEngine,
  ) -> Result<(), ()> {
    let already_declared = self
      .scopes
      .last()
      .is_some_and(|scope| scope.contains_key(&token.lexeme));

    if already_declared {
      return self.error(
        engine,
        DiagnosticCode::VariableRedeclaration,
        format!(
          "variable '{}' is already declared in this scope",
          token.lexeme
        ),
        token,
        "second declaration here".to_string(),
      );
    }

    let is_global = self.scopes.len() == 1;
    if let Some(scope) = self.scopes.last_mut() {
      scope.insert(
        token.lexeme.clone(),
        VariableState {
          ty,
          token: token.clone(),
          used: false,
          warnable: warnable && !is_global,
        },
      );
    }

    Ok(())
  }

  /// Walks the scope stack innermost-first, marking the variable as read.
  pub(crate) fn lookup(&mut self, name: &str) -> Option<Type> {
    for scope in self.scopes.iter_mut().rev() {
      if let Some(state) = scope.get_mut(name) {
        state.used = true;
        return Some(state.ty.clone());
      }
    }

    None
  }

  pub(crate) fn set_status(&mut self, status: Status) -> Status {
    std::mem::replace(&mut self.status, status)
  }

  pub(crate) fn status(&self) -> Status {
    self.status
  }

  pub(crate) fn error(
    &self,
    engine: &mut DiagnosticEngine,
    code: DiagnosticCode,
    message: String,
    token: &Token,
    label: String,
  ) -> Result<(), ()> {
    let diagnostic = Diagnostic::new(code, message).at(token.to_span(), label);

    engine.emit(diagnostic);
    Err(())
  }

  /// Same as `error`, for call sites that may not have a token to point at.
  pub(crate) fn error_at(
    &self,
    engine: &mut DiagnosticEngine,
    code: DiagnosticCode,
    message: String,
    token: Option<&Token>,
    label: String,
  ) -> Result<(), ()> {
    let mut diagnostic = Diagnostic::new(code, message);
    if let Some(token) = token {
      diagnostic = diagnostic.at(token.to_span(), label);
    }

    engine.emit(diagnostic);
    Err(())
  }
}

impl Default for TypeChecker {
  fn default() -> Self {
    Self::new()
  }
}
