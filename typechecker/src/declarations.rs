use std::rc::Rc;

use diagnostic::{code::DiagnosticCode, DiagnosticEngine};
use parser::{
  ast::{Declaration, DeclarationFunction, DeclarationStruct, DeclarationVariable, Node},
  stmt::Statement,
  types::{Parameter, Type},
};

use crate::{Status, TypeChecker};

impl TypeChecker {
  /// Checks the right-hand side, adopts its type when the annotation is
  /// absent, and installs the variable into the current scope.
  pub(crate) fn check_variable_declaration(
    &mut self,
    variable: &DeclarationVariable,
    engine: &mut DiagnosticEngine,
  ) -> Result<(), ()> {
    let rhs_type = self.check_expression(&variable.rhs, engine)?;

    let ty = match &variable.declared {
      Some(declared) if *declared != Type::Invalid => {
        if *declared != rhs_type {
          return self.error(
            engine,
            DiagnosticCode::TypeMismatch,
            format!(
              "cannot assign {} to variable '{}' of type {}",
              rhs_type, variable.name.lexeme, declared
            ),
            &variable.name,
            format!("expression has type {}", rhs_type),
          );
        }
        declared.clone()
      },
      _ => {
        *variable.inferred.borrow_mut() = Some(rhs_type.clone());
        rhs_type
      },
    };

    self.declare(&variable.name, ty, true, engine)
  }

  pub(crate) fn check_function_declaration(
    &mut self,
    function: &Rc<DeclarationFunction>,
    engine: &mut DiagnosticEngine,
  ) -> Result<(), ()> {
    if self.status() != Status::ResolvingBlueprint {
      if self.functions.contains_key(&function.name.lexeme) {
        return self.error(
          engine,
          DiagnosticCode::FunctionRedeclaration,
          format!("function '{}' is already declared", function.name.lexeme),
          &function.name,
          "second declaration here".to_string(),
        );
      }

      self
        .functions
        .insert(function.name.lexeme.clone(), Rc::clone(function));
    }

    // A non-void function must end its body with a return statement.
    if function.return_type != Type::Void {
      let ends_with_return = matches!(
        function.block.body.last(),
        Some(Node::Statement(Statement::Return { .. }))
      );

      if !ends_with_return {
        return self.error(
          engine,
          DiagnosticCode::MissingReturn,
          format!(
            "missing return at the end of '{}' returning {}",
            function.name.lexeme, function.return_type
          ),
          &function.name,
          "body must end with a return statement".to_string(),
        );
      }
    }

    // Union parameters cannot be checked in the abstract; each call site
    // re-checks the body with its argument types substituted.
    if function.has_union_parameters() && self.status() != Status::ResolvingBlueprint {
      return Ok(());
    }

    self.check_function_body(function, &function.parameters, engine)
  }

  /// Walks a function body against a fresh scope chained to the globals
  /// (function bodies never see the caller's locals) seeded with the given
  /// parameters. The return stack drains after every top-level body node.
  pub(crate) fn check_function_body(
    &mut self,
    function: &DeclarationFunction,
    parameters: &[Parameter],
    engine: &mut DiagnosticEngine,
  ) -> Result<(), ()> {
    let globals = self.scopes.first().cloned().unwrap_or_default();
    let saved_scopes = std::mem::replace(&mut self.scopes, vec![globals]);
    let saved_returns = std::mem::take(&mut self.returns);
    let saved_status = if self.status() == Status::ResolvingBlueprint {
      self.set_status(Status::ResolvingBlueprint)
    } else {
      self.set_status(Status::Normal)
    };

    self.begin_scope();

    let mut result = Ok(());
    for parameter in parameters {
      result = self.declare(&parameter.name, parameter.ty.clone(), false, engine);
      if result.is_err() {
        break;
      }
    }

    if result.is_ok() {
      for node in &function.block.body {
        result = self
          .check_node(node, engine)
          .and_then(|_| self.drain_returns(function, engine));

        if result.is_err() {
          break;
        }
      }
    }

    self.end_scope(engine);
    self.set_status(saved_status);
    self.returns = saved_returns;
    self.scopes = saved_scopes;

    result
  }

  /// Every collected return must agree with the declared return type.
  fn drain_returns(
    &mut self,
    function: &DeclarationFunction,
    engine: &mut DiagnosticEngine,
  ) -> Result<(), ()> {
    while let Some((token, ty)) = self.returns.pop() {
      match ty {
        Some(ty) if function.return_type == Type::Void => {
          return self.error(
            engine,
            DiagnosticCode::VoidReturnValue,
            format!(
              "returning a {} from '{}' with return type void",
              ty, function.name.lexeme
            ),
            &token,
            "remove the return value".to_string(),
          );
        },
        Some(ty) if ty != function.return_type => {
          return self.error(
            engine,
            DiagnosticCode::ReturnTypeMismatch,
            format!(
              "'{}' returns {}, found {}",
              function.name.lexeme, function.return_type, ty
            ),
            &token,
            format!("expression has type {}", ty),
          );
        },
        None if function.return_type != Type::Void => {
          return self.error(
            engine,
            DiagnosticCode::ReturnTypeMismatch,
            format!(
              "'{}' must return a {}",
              function.name.lexeme, function.return_type
            ),
            &token,
            "bare return in a non-void function".to_string(),
          );
        },
        _ => {},
      }
    }

    Ok(())
  }

  pub(crate) fn check_struct_declaration(
    &mut self,
    declaration: &Rc<DeclarationStruct>,
    engine: &mut DiagnosticEngine,
  ) -> Result<(), ()> {
    if self.status() == Status::ResolvingBlueprint {
      return Ok(());
    }

    if self.structs.contains_key(&declaration.name.lexeme) {
      return self.error(
        engine,
        DiagnosticCode::StructRedeclaration,
        format!("struct '{}' is already declared", declaration.name.lexeme),
        &declaration.name,
        "second declaration here".to_string(),
      );
    }

    self
      .structs
      .insert(declaration.name.lexeme.clone(), Rc::clone(declaration));

    Ok(())
  }

  /// Resets the inferred type of every annotation-less variable in the
  /// body, so the next blueprint pass re-infers from its own argument
  /// types.
  pub(crate) fn clear_inferred(&self, nodes: &[Node]) {
    for node in nodes {
      match node {
        Node::Declaration(Declaration::Variable(variable)) => {
          if variable.declared.is_none() {
            *variable.inferred.borrow_mut() = None;
          }
        },
        Node::Declaration(Declaration::Function(function)) => {
          self.clear_inferred(&function.block.body);
        },
        Node::Declaration(Declaration::Struct(_)) => {},
        Node::Statement(statement) => self.clear_inferred_statement(statement),
      }
    }
  }

  fn clear_inferred_statement(&self, statement: &Statement) {
    match statement {
      Statement::Block(block) => self.clear_inferred(&block.body),
      Statement::Defer { statement, .. } => self.clear_inferred_statement(statement),
      Statement::For {
        initializer, block, ..
      } => {
        if initializer.declared.is_none() {
          *initializer.inferred.borrow_mut() = None;
        }
        self.clear_inferred(&block.body);
      },
      Statement::While { block, .. } => self.clear_inferred(&block.body),
      Statement::IfElse {
        then_block,
        else_block,
        ..
      } => {
        self.clear_inferred(&then_block.body);
        if let Some(block) = else_block {
          self.clear_inferred(&block.body);
        }
      },
      _ => {},
    }
  }
}
