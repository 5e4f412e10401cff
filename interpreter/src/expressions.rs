use std::{cell::RefCell, collections::HashMap, rc::Rc};

use diagnostic::{code::DiagnosticCode, DiagnosticEngine};
use lexer::token::Token;
use parser::{
  expr::{AccessKey, Expression, ExpressionAccessChain, ExpressionCall},
  types::Type,
};

use crate::{
  scope::Scope,
  value::{format_float, InterpreterError, Value},
  Interpreter,
};

impl Interpreter {
  /// Evaluates an expression to a value; a call to a void function
  /// produces `None`, which only statement positions accept.
  pub(crate) fn eval_expression(
    &mut self,
    expression: &Expression,
    scope: &Rc<RefCell<Scope>>,
    engine: &mut DiagnosticEngine,
  ) -> Result<Option<Value>, InterpreterError> {
    match expression {
      Expression::Integer(value) => Ok(Some(Value::Int(*value))),
      Expression::Float(value) => Ok(Some(Value::Float(*value))),
      Expression::Boolean(value) => Ok(Some(Value::Bool(*value))),
      Expression::Str(value) => Ok(Some(Value::Str(value.clone()))),

      Expression::Identifier(token) => {
        let value = scope.borrow().get(&token.lexeme);
        match value {
          Some(value) => Ok(Some(value)),
          None => Err(self.runtime_error(
            engine,
            DiagnosticCode::UndeclaredIdentifier,
            format!("undeclared identifier '{}'", token.lexeme),
            token,
            "not declared in any enclosing scope".to_string(),
          )),
        }
      },

      Expression::Grouping(inner) => self.eval_expression(inner, scope, engine),

      Expression::Unary { operator, operand } => {
        let value = self.eval_operand(operand, operator, scope, engine)?;

        let result = match (operator.lexeme.as_str(), value) {
          ("-", Value::Int(n)) => Value::Int(-n),
          ("-", Value::Float(x)) => Value::Float(-x),
          ("+", value @ (Value::Int(_) | Value::Float(_))) => value,
          ("!", Value::Bool(b)) => Value::Bool(!b),
          (_, value) => {
            return Err(self.runtime_error(
              engine,
              DiagnosticCode::InvalidUnaryOperation,
              format!(
                "invalid unary operation: {}{}",
                operator.lexeme,
                value.kind_name()
              ),
              operator,
              "operand does not support this operator".to_string(),
            ));
          },
        };

        Ok(Some(result))
      },

      Expression::Binary {
        operator,
        left,
        right,
      } => {
        if operator.lexeme == "&&" || operator.lexeme == "||" {
          return self.eval_logical(operator, left, right, scope, engine);
        }

        let left = self.eval_operand(left, operator, scope, engine)?;
        let right = self.eval_operand(right, operator, scope, engine)?;

        self
          .eval_binary_values(operator, left, right, engine)
          .map(Some)
      },

      Expression::Cast {
        token,
        target,
        expr,
      } => {
        let value = self.eval_operand(expr, token, scope, engine)?;
        self.eval_cast(token, target, value, engine).map(Some)
      },

      Expression::Array(array) => {
        let mut elements = vec![];
        for element in &array.elements {
          elements.push(self.eval_operand(element, &array.token, scope, engine)?);
        }

        Ok(Some(Value::array(elements)))
      },

      Expression::StructLiteral(literal) => {
        let mut fields = HashMap::new();
        for (name, value) in &literal.values {
          let value = self.eval_operand(value, &literal.name, scope, engine)?;
          fields.insert(name.clone(), value);
        }

        Ok(Some(Value::struct_instance(
          literal.name.lexeme.clone(),
          fields,
        )))
      },

      Expression::AccessChain(chain) => {
        let mut value = self.chain_root(chain, scope, engine)?;

        for key in &chain.keys {
          value = self.step(value, key, scope, engine)?;
        }

        Ok(Some(value))
      },

      Expression::Len { token, operand } => {
        let value = self.eval_operand(operand, token, scope, engine)?;

        let length = match value {
          Value::Array(elements) => elements.borrow().len(),
          Value::Str(s) => s.len(),
          value => {
            return Err(self.runtime_error(
              engine,
              DiagnosticCode::NotIterable,
              format!("len expects an array or string, found {}", value.kind_name()),
              token,
              "not an iterable value".to_string(),
            ));
          },
        };

        Ok(Some(Value::Int(length as i64)))
      },

      Expression::Call(call) => self.eval_call(call, scope, engine),
    }
  }

  /// Evaluates a sub-expression that must produce a value.
  fn eval_operand(
    &mut self,
    expression: &Expression,
    context: &Token,
    scope: &Rc<RefCell<Scope>>,
    engine: &mut DiagnosticEngine,
  ) -> Result<Value, InterpreterError> {
    let value = self.eval_expression(expression, scope, engine)?;

    match value {
      Some(value) => Ok(value),
      None => Err(self.runtime_error(
        engine,
        DiagnosticCode::VoidAssignment,
        "void expression used as a value".to_string(),
        expression.token().unwrap_or(context),
        "produces no value".to_string(),
      )),
    }
  }

  pub(crate) fn eval_condition(
    &mut self,
    condition: &Expression,
    scope: &Rc<RefCell<Scope>>,
    engine: &mut DiagnosticEngine,
  ) -> Result<bool, InterpreterError> {
    let value = self.eval_expression(condition, scope, engine)?;

    match value {
      Some(Value::Bool(b)) => Ok(b),
      other => Err(self.runtime_error_at(
        engine,
        DiagnosticCode::NonBoolCondition,
        format!(
          "condition must be a bool, found {}",
          other.map_or("void", |v| v.kind_name())
        ),
        condition.token(),
        "condition evaluated here".to_string(),
      )),
    }
  }

  /// `&&` and `||` never evaluate the right operand when the left decides
  /// the result.
  fn eval_logical(
    &mut self,
    operator: &Token,
    left: &Expression,
    right: &Expression,
    scope: &Rc<RefCell<Scope>>,
    engine: &mut DiagnosticEngine,
  ) -> Result<Option<Value>, InterpreterError> {
    let left = self.eval_operand(left, operator, scope, engine)?;

    let Value::Bool(left_value) = &left else {
      return Err(self.binary_type_error(engine, operator, &left, &left));
    };

    if operator.lexeme == "||" && *left_value {
      return Ok(Some(Value::Bool(true)));
    }
    if operator.lexeme == "&&" && !*left_value {
      return Ok(Some(Value::Bool(false)));
    }

    let right = self.eval_operand(right, operator, scope, engine)?;
    let Value::Bool(right_value) = &right else {
      return Err(self.binary_type_error(engine, operator, &right, &right));
    };

    Ok(Some(Value::Bool(*right_value)))
  }

  fn eval_binary_values(
    &mut self,
    operator: &Token,
    left: Value,
    right: Value,
    engine: &mut DiagnosticEngine,
  ) -> Result<Value, InterpreterError> {
    match (left, right) {
      (Value::Int(a), Value::Int(b)) => self.eval_ints(operator, a, b, engine),
      (Value::Float(a), Value::Float(b)) => self.eval_floats(operator, a, b, engine),

      // Mixed int/float promotes the int side.
      (Value::Int(a), Value::Float(b)) => self.eval_floats(operator, a as f64, b, engine),
      (Value::Float(a), Value::Int(b)) => self.eval_floats(operator, a, b as f64, engine),

      (Value::Str(a), Value::Str(b)) => match operator.lexeme.as_str() {
        "+" => Ok(Value::Str(format!("{}{}", a, b))),
        "==" => Ok(Value::Bool(a == b)),
        "!=" => Ok(Value::Bool(a != b)),
        _ => Err(self.binary_type_error(engine, operator, &Value::Str(a), &Value::Str(b))),
      },

      (Value::Str(a), Value::Int(b)) if operator.lexeme == "+" => {
        Ok(Value::Str(format!("{}{}", a, b)))
      },
      (Value::Int(a), Value::Str(b)) if operator.lexeme == "+" => {
        Ok(Value::Str(format!("{}{}", a, b)))
      },
      (Value::Str(a), Value::Float(b)) if operator.lexeme == "+" => {
        Ok(Value::Str(format!("{}{}", a, format_float(b))))
      },
      (Value::Float(a), Value::Str(b)) if operator.lexeme == "+" => {
        Ok(Value::Str(format!("{}{}", format_float(a), b)))
      },

      (Value::Bool(a), Value::Bool(b)) => match operator.lexeme.as_str() {
        "==" => Ok(Value::Bool(a == b)),
        "!=" => Ok(Value::Bool(a != b)),
        _ => Err(self.binary_type_error(engine, operator, &Value::Bool(a), &Value::Bool(b))),
      },

      (left, right) => Err(self.binary_type_error(engine, operator, &left, &right)),
    }
  }

  fn eval_ints(
    &mut self,
    operator: &Token,
    a: i64,
    b: i64,
    engine: &mut DiagnosticEngine,
  ) -> Result<Value, InterpreterError> {
    let value = match operator.lexeme.as_str() {
      "+" => Value::Int(a + b),
      "-" => Value::Int(a - b),
      "*" => Value::Int(a * b),
      "/" | "%" => {
        if b == 0 {
          return Err(self.runtime_error(
            engine,
            DiagnosticCode::DivisionByZero,
            "integer division by zero".to_string(),
            operator,
            "right operand is zero".to_string(),
          ));
        }

        if operator.lexeme == "/" {
          Value::Int(a / b)
        } else {
          Value::Int(a % b)
        }
      },
      "==" => Value::Bool(a == b),
      "!=" => Value::Bool(a != b),
      "<" => Value::Bool(a < b),
      "<=" => Value::Bool(a <= b),
      ">" => Value::Bool(a > b),
      ">=" => Value::Bool(a >= b),
      _ => {
        return Err(self.binary_type_error(engine, operator, &Value::Int(a), &Value::Int(b)));
      },
    };

    Ok(value)
  }

  fn eval_floats(
    &mut self,
    operator: &Token,
    a: f64,
    b: f64,
    engine: &mut DiagnosticEngine,
  ) -> Result<Value, InterpreterError> {
    let value = match operator.lexeme.as_str() {
      "+" => Value::Float(a + b),
      "-" => Value::Float(a - b),
      "*" => Value::Float(a * b),
      "/" => Value::Float(a / b),
      "==" => Value::Bool(a == b),
      "!=" => Value::Bool(a != b),
      "<" => Value::Bool(a < b),
      "<=" => Value::Bool(a <= b),
      ">" => Value::Bool(a > b),
      ">=" => Value::Bool(a >= b),
      _ => {
        return Err(self.binary_type_error(
          engine,
          operator,
          &Value::Float(a),
          &Value::Float(b),
        ));
      },
    };

    Ok(value)
  }

  fn binary_type_error(
    &self,
    engine: &mut DiagnosticEngine,
    operator: &Token,
    left: &Value,
    right: &Value,
  ) -> InterpreterError {
    self.runtime_error(
      engine,
      DiagnosticCode::InvalidBinaryOperation,
      format!(
        "invalid binary operation: {} {} {}",
        left.kind_name(),
        operator.lexeme,
        right.kind_name()
      ),
      operator,
      "operands do not support this operator".to_string(),
    )
  }

  fn eval_cast(
    &mut self,
    token: &Token,
    target: &Type,
    value: Value,
    engine: &mut DiagnosticEngine,
  ) -> Result<Value, InterpreterError> {
    let result = match (target, value) {
      (Type::Int, Value::Float(x)) => Value::Int(x as i64),
      (Type::Float, Value::Int(n)) => Value::Float(n as f64),
      (Type::Str, Value::Int(n)) => Value::Str(n.to_string()),
      (Type::Str, Value::Float(x)) => Value::Str(format_float(x)),

      // Identity casts pass the value through untouched.
      (Type::Int, value @ Value::Int(_)) => value,
      (Type::Float, value @ Value::Float(_)) => value,
      (Type::Bool, value @ Value::Bool(_)) => value,
      (Type::Str, value @ Value::Str(_)) => value,
      (Type::Array(_), value @ Value::Array(_)) => value,
      (Type::Struct(_), value @ Value::Struct(_)) => value,

      (target, value) => {
        return Err(self.runtime_error(
          engine,
          DiagnosticCode::InvalidCast,
          format!("cannot cast {} to {}", value.kind_name(), target),
          token,
          "no conversion between these types".to_string(),
        ));
      },
    };

    Ok(result)
  }

  /// Calls a declared function: arguments evaluate in the caller's scope,
  /// the body runs in a fresh scope chained to the globals. The first
  /// `Return` signal supplies the result.
  pub(crate) fn eval_call(
    &mut self,
    call: &ExpressionCall,
    scope: &Rc<RefCell<Scope>>,
    engine: &mut DiagnosticEngine,
  ) -> Result<Option<Value>, InterpreterError> {
    let Some(function) = self.functions.get(&call.name.lexeme).cloned() else {
      return Err(self.runtime_error(
        engine,
        DiagnosticCode::UnknownFunction,
        format!("unknown function '{}'", call.name.lexeme),
        &call.name,
        "no function declaration with this name".to_string(),
      ));
    };

    if call.arguments.len() != function.parameters.len() {
      return Err(self.runtime_error(
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
      ));
    }

    let mut arguments = vec![];
    for argument in &call.arguments {
      arguments.push(self.eval_operand(argument, &call.name, scope, engine)?);
    }

    let function_scope = Rc::new(RefCell::new(Scope::with_parent(Rc::clone(&self.globals))));
    for (parameter, value) in function.parameters.iter().zip(arguments) {
      function_scope
        .borrow_mut()
        .define(parameter.name.lexeme.clone(), value);
    }

    match self.eval_block(&function.block, &function_scope, engine) {
      Ok(()) => Ok(None),
      Err(InterpreterError::Return(value)) => Ok(value),
      // break/continue cannot cross a call boundary; the checker rejects
      // them outside loops, so nothing observable reaches here.
      Err(InterpreterError::Break) | Err(InterpreterError::Continue) => Ok(None),
      Err(InterpreterError::Runtime) => Err(InterpreterError::Runtime),
    }
  }

  fn chain_root(
    &mut self,
    chain: &ExpressionAccessChain,
    scope: &Rc<RefCell<Scope>>,
    engine: &mut DiagnosticEngine,
  ) -> Result<Value, InterpreterError> {
    let value = scope.borrow().get(&chain.root.lexeme);

    match value {
      Some(value) => Ok(value),
      None => Err(self.runtime_error(
        engine,
        DiagnosticCode::UndeclaredIdentifier,
        format!("undeclared identifier '{}'", chain.root.lexeme),
        &chain.root,
        "not declared in any enclosing scope".to_string(),
      )),
    }
  }

  /// One access-chain step against a runtime value.
  fn step(
    &mut self,
    value: Value,
    key: &AccessKey,
    scope: &Rc<RefCell<Scope>>,
    engine: &mut DiagnosticEngine,
  ) -> Result<Value, InterpreterError> {
    match key {
      AccessKey::Member(member) => match value {
        Value::Struct(instance) => {
          let fields = instance.fields.borrow();
          match fields.get(&member.lexeme) {
            Some(value) => Ok(value.clone()),
            None => Err(self.runtime_error(
              engine,
              DiagnosticCode::UnknownMember,
              format!(
                "struct '{}' has no member '{}'",
                instance.name, member.lexeme
              ),
              member,
              "unknown member name".to_string(),
            )),
          }
        },
        value => Err(self.runtime_error(
          engine,
          DiagnosticCode::NotAStruct,
          format!("{} has no members", value.kind_name()),
          member,
          format!("'.{}' requires a struct", member.lexeme),
        )),
      },

      AccessKey::Index { token, index } => {
        let index = self.eval_index(token, index, scope, engine)?;

        match value {
          Value::Array(elements) => {
            let elements = elements.borrow();
            if index < 0 || index as usize >= elements.len() {
              return Err(self.runtime_error(
                engine,
                DiagnosticCode::IndexOutOfRange,
                format!(
                  "array index {} out of range for length {}",
                  index,
                  elements.len()
                ),
                token,
                "index evaluated here".to_string(),
              ));
            }

            Ok(elements[index as usize].clone())
          },
          value => Err(self.runtime_error(
            engine,
            DiagnosticCode::NotAnArray,
            format!("cannot index into {}", value.kind_name()),
            token,
            "'[ ]' requires an array".to_string(),
          )),
        }
      },
    }
  }

  fn eval_index(
    &mut self,
    token: &Token,
    index: &Expression,
    scope: &Rc<RefCell<Scope>>,
    engine: &mut DiagnosticEngine,
  ) -> Result<i64, InterpreterError> {
    let value = self.eval_operand(index, token, scope, engine)?;

    match value {
      Value::Int(n) => Ok(n),
      value => Err(self.runtime_error(
        engine,
        DiagnosticCode::NonIntegerIndex,
        format!("array index must be an int, found {}", value.kind_name()),
        token,
        "index expression here".to_string(),
      )),
    }
  }

  /// Writes through an access chain: the container is resolved by walking
  /// all but the last key, then the terminal slot is replaced in place so
  /// every alias of the container observes the write.
  pub(crate) fn assign_chain(
    &mut self,
    chain: &ExpressionAccessChain,
    value: Value,
    scope: &Rc<RefCell<Scope>>,
    engine: &mut DiagnosticEngine,
  ) -> Result<(), InterpreterError> {
    let mut container = self.chain_root(chain, scope, engine)?;

    let Some((terminal, walked)) = chain.keys.split_last() else {
      // A chain with no keys degenerates to a plain identifier.
      if !scope.borrow_mut().assign(&chain.root.lexeme, value) {
        return Err(self.runtime_error(
          engine,
          DiagnosticCode::UndeclaredIdentifier,
          format!(
            "attempting to assign to undeclared identifier '{}'",
            chain.root.lexeme
          ),
          &chain.root,
          "not declared in any enclosing scope".to_string(),
        ));
      }
      return Ok(());
    };

    for key in walked {
      container = self.step(container, key, scope, engine)?;
    }

    match terminal {
      AccessKey::Member(member) => match container {
        Value::Struct(instance) => {
          if !instance.fields.borrow().contains_key(&member.lexeme) {
            return Err(self.runtime_error(
              engine,
              DiagnosticCode::UnknownMember,
              format!(
                "struct '{}' has no member '{}'",
                instance.name, member.lexeme
              ),
              member,
              "unknown member name".to_string(),
            ));
          }

          instance
            .fields
            .borrow_mut()
            .insert(member.lexeme.clone(), value);
          Ok(())
        },
        container => Err(self.runtime_error(
          engine,
          DiagnosticCode::NotAStruct,
          format!("{} has no members", container.kind_name()),
          member,
          format!("'.{}' requires a struct", member.lexeme),
        )),
      },

      AccessKey::Index { token, index } => {
        let index = self.eval_index(token, index, scope, engine)?;

        match container {
          Value::Array(elements) => {
            let mut elements = elements.borrow_mut();
            if index < 0 || index as usize >= elements.len() {
              return Err(self.runtime_error(
                engine,
                DiagnosticCode::IndexOutOfRange,
                format!(
                  "array index {} out of range for length {}",
                  index,
                  elements.len()
                ),
                token,
                "index evaluated here".to_string(),
              ));
            }

            elements[index as usize] = value;
            Ok(())
          },
          container => Err(self.runtime_error(
            engine,
            DiagnosticCode::NotAnArray,
            format!("cannot index into {}", container.kind_name()),
            token,
            "'[ ]' requires an array".to_string(),
          )),
        }
      },
    }
  }
}
