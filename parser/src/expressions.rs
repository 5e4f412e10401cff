use std::cell::RefCell;

use diagnostic::{code::DiagnosticCode, DiagnosticEngine};
use lexer::token::{Token, TokenKind};

use crate::{
  expr::{Expression, ExpressionAccessChain, ExpressionArray, ExpressionStruct},
  types::Type,
  Parser,
};

impl Parser {
  pub(crate) fn parse_expression(&mut self, engine: &mut DiagnosticEngine) -> Result<Expression, ()> {
    self.parse_logical(engine)
  }

  fn parse_logical(&mut self, engine: &mut DiagnosticEngine) -> Result<Expression, ()> {
    let mut expr = self.parse_comparison(engine)?;

    while self.consume_on_match(TokenKind::LogicalAnd) || self.consume_on_match(TokenKind::LogicalOr)
    {
      let operator = self.previous_token();
      let right = self.parse_comparison(engine)?;
      expr = Expression::Binary {
        operator,
        left: Box::new(expr),
        right: Box::new(right),
      };
    }

    Ok(expr)
  }

  fn parse_comparison(&mut self, engine: &mut DiagnosticEngine) -> Result<Expression, ()> {
    let mut expr = self.parse_additive(engine)?;

    while self.consume_on_match(TokenKind::EqualsEquals)
      || self.consume_on_match(TokenKind::NotEquals)
      || self.consume_on_match(TokenKind::LessThan)
      || self.consume_on_match(TokenKind::LessThanEquals)
      || self.consume_on_match(TokenKind::GreaterThan)
      || self.consume_on_match(TokenKind::GreaterThanEquals)
    {
      let operator = self.previous_token();
      let right = self.parse_additive(engine)?;
      expr = Expression::Binary {
        operator,
        left: Box::new(expr),
        right: Box::new(right),
      };
    }

    Ok(expr)
  }

  fn parse_additive(&mut self, engine: &mut DiagnosticEngine) -> Result<Expression, ()> {
    let mut expr = self.parse_multiplicative(engine)?;

    while self.consume_on_match(TokenKind::Plus) || self.consume_on_match(TokenKind::Minus) {
      let operator = self.previous_token();
      let right = self.parse_multiplicative(engine)?;
      expr = Expression::Binary {
        operator,
        left: Box::new(expr),
        right: Box::new(right),
      };
    }

    Ok(expr)
  }

  fn parse_multiplicative(&mut self, engine: &mut DiagnosticEngine) -> Result<Expression, ()> {
    let mut expr = self.parse_unary(engine)?;

    while self.consume_on_match(TokenKind::Star)
      || self.consume_on_match(TokenKind::Division)
      || self.consume_on_match(TokenKind::Modulus)
    {
      let operator = self.previous_token();
      let right = self.parse_unary(engine)?;
      expr = Expression::Binary {
        operator,
        left: Box::new(expr),
        right: Box::new(right),
      };
    }

    Ok(expr)
  }

  fn parse_unary(&mut self, engine: &mut DiagnosticEngine) -> Result<Expression, ()> {
    if self.consume_on_match(TokenKind::Not)
      || self.consume_on_match(TokenKind::Minus)
      || self.consume_on_match(TokenKind::Plus)
    {
      let operator = self.previous_token();
      let operand = self.parse_unary(engine)?;

      return Ok(Expression::Unary {
        operator,
        operand: Box::new(operand),
      });
    }

    self.parse_primary(engine)
  }

  fn parse_primary(&mut self, engine: &mut DiagnosticEngine) -> Result<Expression, ()> {
    let current = self.current_token();

    match current.kind {
      TokenKind::IntegerLiteral => {
        self.advance();
        match current.lexeme.parse::<i64>() {
          Ok(value) => Ok(Expression::Integer(value)),
          Err(_) => {
            self.report(
              engine,
              DiagnosticCode::InvalidNumber,
              format!("integer literal '{}' is out of range", current.lexeme),
              &current,
              "does not fit a 64-bit integer".to_string(),
            )?;
            Err(())
          },
        }
      },
      TokenKind::FloatLiteral => {
        self.advance();
        match current.lexeme.parse::<f64>() {
          Ok(value) => Ok(Expression::Float(value)),
          Err(_) => {
            self.report(
              engine,
              DiagnosticCode::InvalidNumber,
              format!("float literal '{}' cannot be parsed", current.lexeme),
              &current,
              "not a valid float".to_string(),
            )?;
            Err(())
          },
        }
      },
      TokenKind::BooleanLiteral => {
        self.advance();
        Ok(Expression::Boolean(current.lexeme == "true"))
      },
      TokenKind::StringLiteral => {
        self.advance();
        Ok(Expression::Str(current.lexeme))
      },

      TokenKind::BuiltinLen => {
        let token = self.advance();
        self.expect(TokenKind::LeftParen, engine)?;
        let operand = self.parse_expression(engine)?;
        self.expect(TokenKind::RightParen, engine)?;

        Ok(Expression::Len {
          token,
          operand: Box::new(operand),
        })
      },

      TokenKind::Cast => {
        let token = self.advance();
        self.expect(TokenKind::LeftParen, engine)?;
        let target = self.parse_type(engine)?;
        self.expect(TokenKind::RightParen, engine)?;
        let expr = self.parse_unary(engine)?;

        Ok(Expression::Cast {
          token,
          target,
          expr: Box::new(expr),
        })
      },

      TokenKind::LeftParen => {
        self.advance();
        let expr = self.parse_expression(engine)?;
        self.expect(TokenKind::RightParen, engine)?;

        Ok(Expression::Grouping(Box::new(expr)))
      },

      TokenKind::LeftBracket => {
        if self.array_depth > 0 {
          // A bare `[ … ]` is a nested literal; its element type flows
          // down from the enclosing literal during type checking.
          let token = self.advance();
          return self.parse_array_elements(token, None, engine);
        }

        // Otherwise this is a typed literal whose element type is itself
        // an array: `[]int.[ … ]`.
        let token = self.current_token();
        let element_type = self.parse_type(engine)?;
        self.expect(TokenKind::Dot, engine)?;
        self.expect(TokenKind::LeftBracket, engine)?;
        self.parse_array_elements(token, Some(element_type), engine)
      },

      TokenKind::Identifier => {
        if self.peek_nth(1).kind == TokenKind::LeftParen {
          return Ok(Expression::Call(self.parse_call(engine)?));
        }

        if self.peek_nth(1).kind == TokenKind::Dot
          && self.peek_nth(2).kind == TokenKind::LeftBracket
        {
          // `int.[ … ]` — the identifier is the element type.
          let token = self.advance();
          let element_type = Type::from_name(&token.lexeme);
          self.expect(TokenKind::Dot, engine)?;
          self.expect(TokenKind::LeftBracket, engine)?;
          return self.parse_array_elements(token, Some(element_type), engine);
        }

        if self.peek_nth(1).kind == TokenKind::Dot
          && self.peek_nth(2).kind == TokenKind::LeftCurly
        {
          return self.parse_struct_literal(engine);
        }

        let root = self.advance();
        let keys = self.parse_access_keys(engine)?;

        if keys.is_empty() {
          Ok(Expression::Identifier(root))
        } else {
          Ok(Expression::AccessChain(ExpressionAccessChain { root, keys }))
        }
      },

      TokenKind::Nullptr => {
        self.report(
          engine,
          DiagnosticCode::NotImplemented,
          "'nullptr' is reserved but not implemented".to_string(),
          &current,
          "no pointer values exist yet".to_string(),
        )?;
        Err(())
      },

      _ => {
        self.report(
          engine,
          DiagnosticCode::ExpectedExpression,
          format!("expected an expression, found '{}'", current.lexeme),
          &current,
          "not a valid start of an expression".to_string(),
        )?;
        Err(())
      },
    }
  }

  /// Elements up to the closing `]`, with the opening bracket already
  /// consumed.
  fn parse_array_elements(
    &mut self,
    token: Token,
    element_type: Option<Type>,
    engine: &mut DiagnosticEngine,
  ) -> Result<Expression, ()> {
    let mut elements = vec![];

    self.array_depth += 1;
    let result = loop {
      if self.consume_on_match(TokenKind::RightBracket) {
        break Ok(());
      }

      match self.parse_expression(engine) {
        Ok(expr) => elements.push(expr),
        Err(()) => break Err(()),
      }

      if self.peek_nth(0).kind != TokenKind::RightBracket {
        if self.expect(TokenKind::Comma, engine).is_err() {
          break Err(());
        }
      }
    };
    self.array_depth -= 1;
    result?;

    Ok(Expression::Array(ExpressionArray {
      token,
      elements,
      element_type: RefCell::new(element_type),
    }))
  }

  /// `Name.{ v1, v2, … }` — values bind to the members in declaration
  /// order, so the struct must already be known.
  fn parse_struct_literal(&mut self, engine: &mut DiagnosticEngine) -> Result<Expression, ()> {
    let name = self.expect(TokenKind::Identifier, engine)?;
    self.expect(TokenKind::Dot, engine)?;
    self.expect(TokenKind::LeftCurly, engine)?;

    let declaration = match self.structs.get(&name.lexeme) {
      Some(declaration) => declaration.clone(),
      None => {
        self.report(
          engine,
          DiagnosticCode::UnknownStruct,
          format!("unknown struct '{}'", name.lexeme),
          &name,
          "no struct declaration with this name".to_string(),
        )?;
        return Err(());
      },
    };

    let mut provided = vec![];
    while !self.consume_on_match(TokenKind::RightCurly) {
      provided.push(self.parse_expression(engine)?);

      if self.peek_nth(0).kind != TokenKind::RightCurly {
        self.expect(TokenKind::Comma, engine)?;
      }
    }

    if provided.len() != declaration.members.len() {
      self.report(
        engine,
        DiagnosticCode::StructLiteralArity,
        format!(
          "struct '{}' has {} members, literal provides {}",
          name.lexeme,
          declaration.members.len(),
          provided.len()
        ),
        &name,
        "wrong number of member values".to_string(),
      )?;
      return Err(());
    }

    let values = declaration
      .members
      .iter()
      .zip(provided)
      .map(|(member, value)| (member.name.lexeme.clone(), value))
      .collect();

    Ok(Expression::StructLiteral(ExpressionStruct { name, values }))
  }
}
