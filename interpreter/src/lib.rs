use std::{cell::RefCell, collections::HashMap, io, io::Write, rc::Rc};

use diagnostic::{code::DiagnosticCode, diagnostic::Diagnostic, DiagnosticEngine};
use lexer::token::{Token, TokenKind};
use parser::{
  ast::{Declaration, DeclarationFunction, DeclarationStruct, Node, Program},
  expr::ExpressionCall,
  stmt::{Statement, StatementAssignment, StatementBlock},
};

use crate::{
  scope::Scope,
  value::{render, InterpreterError, Value},
};

pub mod scope;
pub mod value;

mod expressions;

/// Tree-walking evaluator over the type-checked AST. Holds the global
/// function and struct tables, the global scope, and the output sink
/// `print` writes to (stdout in production, a buffer in tests).
pub struct Interpreter {
  pub functions: HashMap<String, Rc<DeclarationFunction>>,
  pub structs: HashMap<String, Rc<DeclarationStruct>>,
  pub globals: Rc<RefCell<Scope>>,
  out: Box<dyn Write>,
}

impl Interpreter {
  pub fn new() -> Self {
    Self::with_output(Box::new(io::stdout()))
  }

  pub fn with_output(out: Box<dyn Write>) -> Self {
    Self {
      functions: HashMap::new(),
      structs: HashMap::new(),
      globals: Rc::new(RefCell::new(Scope::new())),
      out,
    }
  }

  /// Installs every top-level declaration, then invokes `main` with no
  /// arguments. A missing `main` and any runtime error are fatal.
  pub fn run_program(&mut self, program: &Program, engine: &mut DiagnosticEngine) -> Result<(), ()> {
    let globals = Rc::clone(&self.globals);

    for declaration in &program.declarations {
      let node = Node::Declaration(declaration.clone());
      if self.eval_node(&node, &globals, engine).is_err() {
        return Err(());
      }
    }

    if !self.functions.contains_key("main") {
      engine.emit(Diagnostic::new(
        DiagnosticCode::MissingMain,
        "main function not found".to_string(),
      ));
      return Err(());
    }

    let call = ExpressionCall {
      name: Token::new(TokenKind::Identifier, "main".to_string(), 0, 0),
      arguments: vec![],
    };

    match self.eval_call(&call, &globals, engine) {
      Ok(_) => Ok(()),
      Err(_) => Err(()),
    }
  }

  pub(crate) fn eval_node(
    &mut self,
    node: &Node,
    scope: &Rc<RefCell<Scope>>,
    engine: &mut DiagnosticEngine,
  ) -> Result<(), InterpreterError> {
    match node {
      Node::Declaration(Declaration::Variable(variable)) => {
        let value = self.eval_expression(&variable.rhs, scope, engine)?;

        let Some(value) = value else {
          return Err(self.runtime_error(
            engine,
            DiagnosticCode::VoidAssignment,
            format!(
              "attempting to assign void to variable '{}'",
              variable.name.lexeme
            ),
            &variable.name,
            "initializer produces no value".to_string(),
          ));
        };

        scope
          .borrow_mut()
          .define(variable.name.lexeme.clone(), value);
        Ok(())
      },

      Node::Declaration(Declaration::Function(function)) => {
        self
          .functions
          .insert(function.name.lexeme.clone(), Rc::clone(function));
        Ok(())
      },

      Node::Declaration(Declaration::Struct(declaration)) => {
        self
          .structs
          .insert(declaration.name.lexeme.clone(), Rc::clone(declaration));
        Ok(())
      },

      Node::Statement(statement) => self.eval_statement(statement, scope, engine),
    }
  }

  pub(crate) fn eval_statement(
    &mut self,
    statement: &Statement,
    scope: &Rc<RefCell<Scope>>,
    engine: &mut DiagnosticEngine,
  ) -> Result<(), InterpreterError> {
    match statement {
      Statement::Print { expr, newline } => {
        let value = self.eval_expression(expr, scope, engine)?;

        let Some(value) = value else {
          return Err(self.runtime_error_at(
            engine,
            DiagnosticCode::VoidAssignment,
            "cannot print a void expression".to_string(),
            expr.token(),
            "expression produces no value".to_string(),
          ));
        };

        let rendered = render(&value, &self.structs, true);
        if *newline {
          let _ = writeln!(self.out, "{}", rendered);
        } else {
          let _ = write!(self.out, "{}", rendered);
        }
        Ok(())
      },

      Statement::Assignment(assignment) => self.eval_assignment(assignment, scope, engine),

      Statement::Block(block) => self.eval_block(block, scope, engine),

      Statement::Return { expr, .. } => {
        let value = match expr {
          Some(expr) => self.eval_expression(expr, scope, engine)?,
          None => None,
        };

        Err(InterpreterError::Return(value))
      },

      Statement::Defer { statement, .. } => {
        scope.borrow_mut().deferred.push((**statement).clone());
        Ok(())
      },

      Statement::Break(_) => Err(InterpreterError::Break),
      Statement::Continue(_) => Err(InterpreterError::Continue),

      Statement::For {
        initializer,
        condition,
        increment,
        block,
      } => {
        let for_scope = Rc::new(RefCell::new(Scope::with_parent(Rc::clone(scope))));

        let init_node = Node::Declaration(Declaration::Variable(initializer.clone()));
        self.eval_node(&init_node, &for_scope, engine)?;

        loop {
          if !self.eval_condition(condition, &for_scope, engine)? {
            break;
          }

          match self.eval_block(block, &for_scope, engine) {
            Ok(()) => {},
            Err(InterpreterError::Break) => break,
            Err(InterpreterError::Continue) => {},
            Err(error) => return Err(error),
          }

          self.eval_assignment(increment, &for_scope, engine)?;
        }

        Ok(())
      },

      Statement::While { condition, block } => {
        loop {
          if !self.eval_condition(condition, scope, engine)? {
            break;
          }

          match self.eval_block(block, scope, engine) {
            Ok(()) => {},
            Err(InterpreterError::Break) => break,
            Err(InterpreterError::Continue) => {},
            Err(error) => return Err(error),
          }
        }

        Ok(())
      },

      Statement::IfElse {
        condition,
        then_block,
        else_block,
      } => {
        if self.eval_condition(condition, scope, engine)? {
          self.eval_block(then_block, scope, engine)
        } else if let Some(block) = else_block {
          self.eval_block(block, scope, engine)
        } else {
          Ok(())
        }
      },

      Statement::Call(call) => {
        self.eval_call(call, scope, engine)?;
        Ok(())
      },
    }
  }

  /// Runs a block in a child scope. On every exit path — fall-through,
  /// break, continue, return, or a fatal error — the scope's deferred
  /// statements execute in LIFO order before the result propagates.
  pub(crate) fn eval_block(
    &mut self,
    block: &StatementBlock,
    parent: &Rc<RefCell<Scope>>,
    engine: &mut DiagnosticEngine,
  ) -> Result<(), InterpreterError> {
    let scope = Rc::new(RefCell::new(Scope::with_parent(Rc::clone(parent))));

    let mut result = Ok(());
    for node in &block.body {
      result = self.eval_node(node, &scope, engine);
      if result.is_err() {
        break;
      }
    }

    loop {
      let deferred = scope.borrow_mut().deferred.pop();
      let Some(statement) = deferred else {
        break;
      };

      match self.eval_statement(&statement, &scope, engine) {
        // A signal raised inside a deferred statement does not replace
        // the one already unwinding.
        Ok(()) | Err(InterpreterError::Break) | Err(InterpreterError::Continue)
        | Err(InterpreterError::Return(_)) => {},
        Err(InterpreterError::Runtime) => return Err(InterpreterError::Runtime),
      }
    }

    result
  }

  pub(crate) fn eval_assignment(
    &mut self,
    assignment: &StatementAssignment,
    scope: &Rc<RefCell<Scope>>,
    engine: &mut DiagnosticEngine,
  ) -> Result<(), InterpreterError> {
    let value = self.eval_expression(&assignment.rhs, scope, engine)?;

    let Some(value) = value else {
      return Err(self.runtime_error_at(
        engine,
        DiagnosticCode::VoidAssignment,
        "attempting to assign void".to_string(),
        assignment.rhs.token().or(assignment.target.token()),
        "right-hand side produces no value".to_string(),
      ));
    };

    match &assignment.target {
      parser::expr::Expression::Identifier(token) => {
        if !scope.borrow_mut().assign(&token.lexeme, value) {
          return Err(self.runtime_error(
            engine,
            DiagnosticCode::UndeclaredIdentifier,
            format!("attempting to assign to undeclared identifier '{}'", token.lexeme),
            token,
            "not declared in any enclosing scope".to_string(),
          ));
        }
        Ok(())
      },

      parser::expr::Expression::AccessChain(chain) => {
        self.assign_chain(chain, value, scope, engine)
      },

      other => Err(self.runtime_error_at(
        engine,
        DiagnosticCode::InvalidAssignmentTarget,
        "assignment target must be a variable or an access chain".to_string(),
        other.token(),
        "cannot assign to this expression".to_string(),
      )),
    }
  }

  pub(crate) fn runtime_error(
    &self,
    engine: &mut DiagnosticEngine,
    code: DiagnosticCode,
    message: String,
    token: &Token,
    label: String,
  ) -> InterpreterError {
    let diagnostic = Diagnostic::new(code, message).at(token.to_span(), label);
    engine.emit(diagnostic);

    InterpreterError::Runtime
  }

  pub(crate) fn runtime_error_at(
    &self,
    engine: &mut DiagnosticEngine,
    code: DiagnosticCode,
    message: String,
    token: Option<&Token>,
    label: String,
  ) -> InterpreterError {
    let mut diagnostic = Diagnostic::new(code, message);
    if let Some(token) = token {
      diagnostic = diagnostic.at(token.to_span(), label);
    }
    engine.emit(diagnostic);

    InterpreterError::Runtime
  }
}

impl Default for Interpreter {
  fn default() -> Self {
    Self::new()
  }
}
