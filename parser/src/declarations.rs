use std::{cell::RefCell, rc::Rc};

use diagnostic::{code::DiagnosticCode, DiagnosticEngine};
use lexer::token::TokenKind;

use crate::{
  ast::{Declaration, DeclarationFunction, DeclarationStruct, DeclarationVariable, StructMember},
  types::{Parameter, Type},
  Parser,
};

impl Parser {
  pub(crate) fn parse_declaration(
    &mut self,
    engine: &mut DiagnosticEngine,
  ) -> Result<Declaration, ()> {
    let current = self.current_token();

    match current.kind {
      TokenKind::Var => Ok(Declaration::Variable(
        self.parse_variable_declaration(engine)?,
      )),
      TokenKind::Fn => self.parse_function_declaration(engine),
      TokenKind::Struct => self.parse_struct_declaration(engine),
      _ => {
        self.report(
          engine,
          DiagnosticCode::UnexpectedToken,
          format!("expected a declaration, found '{}'", current.lexeme),
          &current,
          "only var, fn, and struct declarations can start here".to_string(),
        )?;
        Err(())
      },
    }
  }

  /// `var name: type? = expression ;` — a missing type is resolved by the
  /// type checker from the right-hand side.
  pub(crate) fn parse_variable_declaration(
    &mut self,
    engine: &mut DiagnosticEngine,
  ) -> Result<DeclarationVariable, ()> {
    self.expect(TokenKind::Var, engine)?;
    let name = self.expect(TokenKind::Identifier, engine)?;
    self.expect(TokenKind::Colon, engine)?;

    let declared = if self.peek_nth(0).kind == TokenKind::Equals {
      None
    } else {
      Some(self.parse_type(engine)?)
    };

    self.expect(TokenKind::Equals, engine)?;
    let rhs = self.parse_expression(engine)?;
    self.expect(TokenKind::SemiColon, engine)?;

    Ok(DeclarationVariable {
      name,
      declared,
      inferred: RefCell::new(None),
      rhs,
    })
  }

  fn parse_function_declaration(
    &mut self,
    engine: &mut DiagnosticEngine,
  ) -> Result<Declaration, ()> {
    self.expect(TokenKind::Fn, engine)?;
    let name = self.expect(TokenKind::Identifier, engine)?;
    let parameters = self.parse_parameters(engine)?;
    self.expect(TokenKind::RightArrow, engine)?;
    let return_type = self.parse_type(engine)?;
    let block = self.parse_block(engine)?;

    Ok(Declaration::Function(Rc::new(DeclarationFunction {
      name,
      parameters,
      return_type,
      block,
    })))
  }

  fn parse_parameters(&mut self, engine: &mut DiagnosticEngine) -> Result<Vec<Parameter>, ()> {
    let mut parameters = vec![];

    self.expect(TokenKind::LeftParen, engine)?;
    while !self.consume_on_match(TokenKind::RightParen) {
      let name = self.expect(TokenKind::Identifier, engine)?;
      self.expect(TokenKind::Colon, engine)?;
      let ty = self.parse_parameter_type(engine)?;

      parameters.push(Parameter { name, ty });

      if self.peek_nth(0).kind != TokenKind::RightParen {
        self.expect(TokenKind::Comma, engine)?;
      }
    }

    Ok(parameters)
  }

  fn parse_struct_declaration(
    &mut self,
    engine: &mut DiagnosticEngine,
  ) -> Result<Declaration, ()> {
    self.expect(TokenKind::Struct, engine)?;
    let name = self.expect(TokenKind::Identifier, engine)?;

    let mut members = vec![];
    self.expect(TokenKind::LeftCurly, engine)?;
    while !self.consume_on_match(TokenKind::RightCurly) {
      let member_name = self.expect(TokenKind::Identifier, engine)?;
      self.expect(TokenKind::Colon, engine)?;
      let ty = self.parse_type(engine)?;

      members.push(StructMember {
        name: member_name,
        ty,
      });

      if self.peek_nth(0).kind != TokenKind::RightCurly {
        self.expect(TokenKind::Comma, engine)?;
      }
    }

    let declaration = Rc::new(DeclarationStruct { name, members });

    // Struct literals parse against this table; later redeclarations are
    // rejected by the type checker.
    self
      .structs
      .insert(declaration.name.lexeme.clone(), Rc::clone(&declaration));

    Ok(Declaration::Struct(declaration))
  }

  /// `[]` modifiers followed by a builtin or struct name.
  pub(crate) fn parse_type(&mut self, engine: &mut DiagnosticEngine) -> Result<Type, ()> {
    if self.consume_on_match(TokenKind::LeftBracket) {
      self.expect(TokenKind::RightBracket, engine)?;
      let inner = self.parse_type(engine)?;
      return Ok(inner.wrap_array());
    }

    let token = self.expect(TokenKind::Identifier, engine)?;
    Ok(Type::from_name(&token.lexeme))
  }

  /// A parameter type may be a union of alternatives: `int || float`.
  fn parse_parameter_type(&mut self, engine: &mut DiagnosticEngine) -> Result<Type, ()> {
    let first = self.parse_type(engine)?;

    if self.peek_nth(0).kind != TokenKind::LogicalOr {
      return Ok(first);
    }

    let mut alternatives = vec![first];
    while self.consume_on_match(TokenKind::LogicalOr) {
      alternatives.push(self.parse_type(engine)?);
    }

    Ok(Type::Union(alternatives))
  }
}
