use diagnostic::{code::DiagnosticCode, DiagnosticEngine};
use parser::{
  expr::Expression,
  stmt::{Statement, StatementAssignment, StatementBlock},
  types::Type,
};

use crate::{Status, TypeChecker};

impl TypeChecker {
  pub(crate) fn check_statement(
    &mut self,
    statement: &Statement,
    engine: &mut DiagnosticEngine,
  ) -> Result<(), ()> {
    match statement {
      Statement::Print { expr, .. } => {
        self.check_expression(expr, engine)?;
        Ok(())
      },

      Statement::Assignment(assignment) => self.check_assignment(assignment, engine),

      Statement::Block(block) => self.check_block(block, engine),

      Statement::Return { token, expr } => {
        let ty = match expr {
          Some(expr) => Some(self.check_expression(expr, engine)?),
          None => None,
        };

        self.returns.push((token.clone(), ty));
        Ok(())
      },

      // The deferred node is checked now; only its evaluation is
      // postponed.
      Statement::Defer { statement, .. } => self.check_statement(statement, engine),

      Statement::Break(token) => {
        if self.status() != Status::InLoop {
          return self.error(
            engine,
            DiagnosticCode::BreakOutsideLoop,
            "break statement outside of a loop".to_string(),
            token,
            "break is only valid inside for and while bodies".to_string(),
          );
        }
        Ok(())
      },

      Statement::Continue(token) => {
        if self.status() != Status::InLoop {
          return self.error(
            engine,
            DiagnosticCode::ContinueOutsideLoop,
            "continue statement outside of a loop".to_string(),
            token,
            "continue is only valid inside for and while bodies".to_string(),
          );
        }
        Ok(())
      },

      Statement::For {
        initializer,
        condition,
        increment,
        block,
      } => {
        self.begin_scope();

        let result = self
          .check_variable_declaration(initializer, engine)
          .and_then(|_| self.check_condition(condition, engine))
          .and_then(|_| self.check_assignment(increment, engine))
          .and_then(|_| {
            let saved = self.set_status(Status::InLoop);
            let result = self.check_block(block, engine);
            self.set_status(saved);
            result
          });

        self.end_scope(engine);
        result
      },

      Statement::While { condition, block } => {
        self.check_condition(condition, engine)?;

        let saved = self.set_status(Status::InLoop);
        let result = self.check_block(block, engine);
        self.set_status(saved);
        result
      },

      Statement::IfElse {
        condition,
        then_block,
        else_block,
      } => {
        self.check_condition(condition, engine)?;
        self.check_block(then_block, engine)?;

        if let Some(block) = else_block {
          self.check_block(block, engine)?;
        }

        Ok(())
      },

      Statement::Call(call) => {
        self.check_call(call, engine)?;
        Ok(())
      },
    }
  }

  pub(crate) fn check_block(
    &mut self,
    block: &StatementBlock,
    engine: &mut DiagnosticEngine,
  ) -> Result<(), ()> {
    self.begin_scope();

    let mut result = Ok(());
    for node in &block.body {
      result = self.check_node(node, engine);
      if result.is_err() {
        break;
      }
    }

    self.end_scope(engine);
    result
  }

  /// Both sides of an assignment must have the same type, and the target
  /// must be an lvalue: an identifier or an access chain.
  fn check_assignment(
    &mut self,
    assignment: &StatementAssignment,
    engine: &mut DiagnosticEngine,
  ) -> Result<(), ()> {
    let target_type = match &assignment.target {
      Expression::Identifier(token) => match self.lookup(&token.lexeme) {
        Some(ty) => ty,
        None => {
          return self.error(
            engine,
            DiagnosticCode::UndeclaredIdentifier,
            format!("undeclared identifier '{}'", token.lexeme),
            token,
            "not declared in any enclosing scope".to_string(),
          );
        },
      },
      Expression::AccessChain(chain) => self.check_access_chain(chain, engine)?,
      other => {
        return self.error_at(
          engine,
          DiagnosticCode::InvalidAssignmentTarget,
          "assignment target must be a variable or an access chain".to_string(),
          other.token(),
          "cannot assign to this expression".to_string(),
        );
      },
    };

    let rhs_type = self.check_expression(&assignment.rhs, engine)?;

    if target_type != rhs_type {
      return self.error_at(
        engine,
        DiagnosticCode::TypeMismatch,
        format!("cannot assign {} to a target of type {}", rhs_type, target_type),
        assignment.target.token(),
        format!("target has type {}", target_type),
      );
    }

    Ok(())
  }

  fn check_condition(
    &mut self,
    condition: &Expression,
    engine: &mut DiagnosticEngine,
  ) -> Result<(), ()> {
    let ty = self.check_expression(condition, engine)?;

    if ty != Type::Bool {
      return self.error_at(
        engine,
        DiagnosticCode::NonBoolCondition,
        format!("condition must be a bool, found {}", ty),
        condition.token(),
        "condition evaluated here".to_string(),
      );
    }

    Ok(())
  }
}
