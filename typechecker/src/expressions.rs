use std::rc::Rc;

use diagnostic::{code::DiagnosticCode, DiagnosticEngine};
use parser::{
  expr::{
    AccessKey, Expression, ExpressionAccessChain, ExpressionArray, ExpressionCall,
    ExpressionStruct,
  },
  types::{can_cast, promoted_type, Parameter, Type},
};

use crate::{Status, TypeChecker};

impl TypeChecker {
  pub(crate) fn check_expression(
    &mut self,
    expression: &Expression,
    engine: &mut DiagnosticEngine,
  ) -> Result<Type, ()> {
    match expression {
      Expression::Integer(_) => Ok(Type::Int),
      Expression::Float(_) => Ok(Type::Float),
      Expression::Boolean(_) => Ok(Type::Bool),
      Expression::Str(_) => Ok(Type::Str),

      Expression::Identifier(token) => match self.lookup(&token.lexeme) {
        Some(ty) => Ok(ty),
        None => {
          self.error(
            engine,
            DiagnosticCode::UndeclaredIdentifier,
            format!("undeclared identifier '{}'", token.lexeme),
            token,
            "not declared in any enclosing scope".to_string(),
          )?;
          Err(())
        },
      },

      Expression::Grouping(inner) => self.check_expression(inner, engine),

      Expression::Unary { operator, operand } => {
        let ty = self.check_expression(operand, engine)?;

        let valid = match operator.lexeme.as_str() {
          "-" | "+" => matches!(ty, Type::Int | Type::Float),
          "!" => ty == Type::Bool,
          _ => false,
        };

        if !valid {
          self.error(
            engine,
            DiagnosticCode::InvalidUnaryOperation,
            format!("invalid unary operation: {}{}", operator.lexeme, ty),
            operator,
            format!("operand has type {}", ty),
          )?;
          return Err(());
        }

        Ok(ty)
      },

      Expression::Binary {
        operator,
        left,
        right,
      } => {
        let left_type = self.check_expression(left, engine)?;
        let right_type = self.check_expression(right, engine)?;

        let promoted = promoted_type(&operator.lexeme, &left_type, &right_type);
        if promoted == Type::Invalid {
          self.error(
            engine,
            DiagnosticCode::InvalidBinaryOperation,
            format!(
              "invalid binary operation: {} {} {}",
              left_type, operator.lexeme, right_type
            ),
            operator,
            "no rule promotes these operand types".to_string(),
          )?;
          return Err(());
        }

        Ok(promoted)
      },

      Expression::Cast {
        token,
        target,
        expr,
      } => {
        let source = self.check_expression(expr, engine)?;

        if !can_cast(target, &source) {
          self.error(
            engine,
            DiagnosticCode::InvalidCast,
            format!("cannot cast {} to {}", source, target),
            token,
            "no conversion between these types".to_string(),
          )?;
          return Err(());
        }

        Ok(target.clone())
      },

      Expression::Array(array) => self.check_array_literal(array, engine),
      Expression::StructLiteral(literal) => self.check_struct_literal(literal, engine),
      Expression::AccessChain(chain) => self.check_access_chain(chain, engine),

      Expression::Len { token, operand } => {
        let ty = self.check_expression(operand, engine)?;

        if !ty.is_array() && ty != Type::Str {
          self.error(
            engine,
            DiagnosticCode::NotIterable,
            format!("len expects an array or string, found {}", ty),
            token,
            "not an iterable value".to_string(),
          )?;
          return Err(());
        }

        Ok(Type::Int)
      },

      Expression::Call(call) => self.check_call(call, engine),
    }
  }

  /// Every element must match the literal's element type; bare nested
  /// literals inherit theirs from the enclosing one, top-down.
  fn check_array_literal(
    &mut self,
    array: &ExpressionArray,
    engine: &mut DiagnosticEngine,
  ) -> Result<Type, ()> {
    let element_type = match array.element_type.borrow().clone() {
      Some(ty) => ty,
      None => {
        self.error(
          engine,
          DiagnosticCode::TypeMismatch,
          "array literal has no element type to infer from".to_string(),
          &array.token,
          "write the element type before '.['".to_string(),
        )?;
        return Err(());
      },
    };

    for element in &array.elements {
      if let Expression::Array(nested) = element {
        if nested.element_type.borrow().is_none() {
          match element_type.unwrap_array() {
            Some(inner) => *nested.element_type.borrow_mut() = Some(inner),
            None => {
              self.error(
                engine,
                DiagnosticCode::TypeMismatch,
                format!(
                  "nested array literal where the element type is {}",
                  element_type
                ),
                &nested.token,
                "elements here are not arrays".to_string(),
              )?;
              return Err(());
            },
          }
        }
      }

      let ty = self.check_expression(element, engine)?;
      if ty != element_type {
        self.error_at(
          engine,
          DiagnosticCode::TypeMismatch,
          format!(
            "array element has type {}, expected {}",
            ty, element_type
          ),
          element.token().or(Some(&array.token)),
          "does not match the element type".to_string(),
        )?;
        return Err(());
      }
    }

    Ok(element_type.wrap_array())
  }

  /// Positional values were already paired with member names by the
  /// parser; each value must match the member's declared type.
  fn check_struct_literal(
    &mut self,
    literal: &ExpressionStruct,
    engine: &mut DiagnosticEngine,
  ) -> Result<Type, ()> {
    let declaration = match self.structs.get(&literal.name.lexeme) {
      Some(declaration) => Rc::clone(declaration),
      None => {
        self.error(
          engine,
          DiagnosticCode::UnknownStruct,
          format!("unknown struct '{}'", literal.name.lexeme),
          &literal.name,
          "no struct declaration with this name".to_string(),
        )?;
        return Err(());
      },
    };

    if literal.values.len() != declaration.members.len() {
      self.error(
        engine,
        DiagnosticCode::StructLiteralArity,
        format!(
          "struct '{}' has {} members, literal provides {}",
          literal.name.lexeme,
          declaration.members.len(),
          literal.values.len()
        ),
        &literal.name,
        "wrong number of member values".to_string(),
      )?;
      return Err(());
    }

    for ((name, value), member) in literal.values.iter().zip(&declaration.members) {
      let ty = self.check_expression(value, engine)?;

      if ty != member.ty {
        self.error(
          engine,
          DiagnosticCode::TypeMismatch,
          format!(
            "member '{}' of '{}' has type {}, value has type {}",
            name, literal.name.lexeme, member.ty, ty
          ),
          &literal.name,
          format!("value for '{}' here", name),
        )?;
        return Err(());
      }
    }

    Ok(Type::Struct(literal.name.lexeme.clone()))
  }

  /// Walks the keys left to right: member keys need a struct, index keys
  /// need an array and an int index.
  pub(crate) fn check_access_chain(
    &mut self,
    chain: &ExpressionAccessChain,
    engine: &mut DiagnosticEngine,
  ) -> Result<Type, ()> {
    let mut ty = match self.lookup(&chain.root.lexeme) {
      Some(ty) => ty,
      None => {
        self.error(
          engine,
          DiagnosticCode::UndeclaredIdentifier,
          format!("undeclared identifier '{}'", chain.root.lexeme),
          &chain.root,
          "not declared in any enclosing scope".to_string(),
        )?;
        return Err(());
      },
    };

    for key in &chain.keys {
      match key {
        AccessKey::Member(member) => {
          let Type::Struct(struct_name) = &ty else {
            self.error(
              engine,
              DiagnosticCode::NotAStruct,
              format!("type {} has no members", ty),
              member,
              format!("'.{}' requires a struct", member.lexeme),
            )?;
            return Err(());
          };

          let Some(declaration) = self.structs.get(struct_name).cloned() else {
            self.error(
              engine,
              DiagnosticCode::UnknownStruct,
              format!("unknown struct '{}'", struct_name),
              member,
              "no struct declaration with this name".to_string(),
            )?;
            return Err(());
          };

          let Some(found) = declaration.member(&member.lexeme) else {
            self.error(
              engine,
              DiagnosticCode::UnknownMember,
              format!(
                "struct '{}' has no member '{}'",
                struct_name, member.lexeme
              ),
              member,
              "unknown member name".to_string(),
            )?;
            return Err(());
          };

          ty = found.ty.clone();
        },

        AccessKey::Index { token, index } => {
          let index_type = self.check_expression(index, engine)?;
          if index_type != Type::Int {
            self.error(
              engine,
              DiagnosticCode::NonIntegerIndex,
              format!("array index must be an int, found {}", index_type),
              token,
              "index expression here".to_string(),
            )?;
            return Err(());
          }

          match ty.unwrap_array() {
            Some(inner) => ty = inner,
            None => {
              self.error(
                engine,
                DiagnosticCode::NotAnArray,
                format!("cannot index into {}", ty),
                token,
                "'[ ]' requires an array".to_string(),
              )?;
              return Err(());
            },
          }
        },
      }
    }

    Ok(ty)
  }

  /// Arity and argument types against the declaration; a callee with
  /// union parameters gets its body re-checked under the substituted
  /// argument types (the blueprint pass).
  pub(crate) fn check_call(
    &mut self,
    call: &ExpressionCall,
    engine: &mut DiagnosticEngine,
  ) -> Result<Type, ()> {
    let function = match self.functions.get(&call.name.lexeme) {
      Some(function) => Rc::clone(function),
      None => {
        self.error(
          engine,
          DiagnosticCode::UnknownFunction,
          format!("unknown function '{}'", call.name.lexeme),
          &call.name,
          "no function declaration with this name".to_string(),
        )?;
        return Err(());
      },
    };

    if call.arguments.len() != function.parameters.len() {
      self.error(
        engine,
        DiagnosticCode::WrongNumberOfArguments,
        format!(
          "'{}' expects {} argument(s), got {}",
          call.name.lexeme,
          function.parameters.len(),
          call.arguments.len()
        ),
        &call.name,
        "call site here".to_string(),
      )?;
      return Err(());
    }

    let mut argument_types = vec![];
    for (argument, parameter) in call.arguments.iter().zip(&function.parameters) {
      let ty = self.check_expression(argument, engine)?;

      if !parameter.ty.accepts(&ty) {
        self.error_at(
          engine,
          DiagnosticCode::TypeMismatch,
          format!(
            "argument '{}' of '{}' expects {}, got {}",
            parameter.name.lexeme, call.name.lexeme, parameter.ty, ty
          ),
          argument.token().or(Some(&call.name)),
          format!("argument has type {}", ty),
        )?;
        return Err(());
      }

      argument_types.push(ty);
    }

    if function.has_union_parameters()
      && !self.blueprints_in_flight.contains(&call.name.lexeme)
    {
      let resolved: Vec<Parameter> = function
        .parameters
        .iter()
        .zip(argument_types)
        .map(|(parameter, ty)| Parameter {
          name: parameter.name.clone(),
          ty,
        })
        .collect();

      self.blueprints_in_flight.insert(call.name.lexeme.clone());
      let saved_status = self.set_status(Status::ResolvingBlueprint);

      let result = self.check_function_body(&function, &resolved, engine);

      self.set_status(saved_status);
      self.blueprints_in_flight.remove(&call.name.lexeme);
      self.clear_inferred(&function.block.body);

      result?;
    }

    Ok(function.return_type.clone())
  }
}
