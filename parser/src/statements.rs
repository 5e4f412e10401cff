use diagnostic::{code::DiagnosticCode, DiagnosticEngine};
use lexer::token::TokenKind;

use crate::{
  ast::Node,
  expr::{AccessKey, Expression, ExpressionAccessChain, ExpressionCall},
  stmt::{Statement, StatementAssignment, StatementBlock},
  Parser,
};

impl Parser {
  pub(crate) fn parse_statement(&mut self, engine: &mut DiagnosticEngine) -> Result<Statement, ()> {
    let current = self.current_token();

    match current.kind {
      TokenKind::LeftCurly => Ok(Statement::Block(self.parse_block(engine)?)),
      TokenKind::Print | TokenKind::Println => self.parse_print_statement(engine),
      TokenKind::Return => self.parse_return_statement(engine),
      TokenKind::If => self.parse_if_statement(engine),
      TokenKind::For => self.parse_for_statement(engine),
      TokenKind::While => self.parse_while_statement(engine),
      TokenKind::Defer => self.parse_defer_statement(engine),
      TokenKind::Break => {
        let token = self.advance();
        self.expect(TokenKind::SemiColon, engine)?;
        Ok(Statement::Break(token))
      },
      TokenKind::Continue => {
        let token = self.advance();
        self.expect(TokenKind::SemiColon, engine)?;
        Ok(Statement::Continue(token))
      },
      TokenKind::Identifier => {
        if self.peek_nth(1).kind == TokenKind::LeftParen {
          let call = self.parse_call(engine)?;
          self.expect(TokenKind::SemiColon, engine)?;
          return Ok(Statement::Call(call));
        }

        let assignment = self.parse_assignment(engine)?;
        self.expect(TokenKind::SemiColon, engine)?;
        Ok(Statement::Assignment(assignment))
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
          DiagnosticCode::UnexpectedToken,
          format!("expected a statement, found '{}'", current.lexeme),
          &current,
          "not a valid start of a statement".to_string(),
        )?;
        Err(())
      },
    }
  }

  /// `{ … }` — declarations and statements interleave freely in a block.
  pub(crate) fn parse_block(&mut self, engine: &mut DiagnosticEngine) -> Result<StatementBlock, ()> {
    let open = self.expect(TokenKind::LeftCurly, engine)?;
    let mut body = vec![];

    while !self.consume_on_match(TokenKind::RightCurly) {
      if self.is_eof() {
        self.report(
          engine,
          DiagnosticCode::UnexpectedToken,
          "block is missing its closing '}'".to_string(),
          &open,
          "block opened here".to_string(),
        )?;
        return Err(());
      }

      let node = match self.peek_nth(0).kind {
        TokenKind::Var | TokenKind::Fn | TokenKind::Struct => {
          Node::Declaration(self.parse_declaration(engine)?)
        },
        _ => Node::Statement(self.parse_statement(engine)?),
      };

      body.push(node);
    }

    Ok(StatementBlock { body })
  }

  fn parse_print_statement(&mut self, engine: &mut DiagnosticEngine) -> Result<Statement, ()> {
    // Both print and println write a complete line.
    self.advance();
    self.expect(TokenKind::LeftParen, engine)?;
    let expr = self.parse_expression(engine)?;
    self.expect(TokenKind::RightParen, engine)?;
    self.expect(TokenKind::SemiColon, engine)?;

    Ok(Statement::Print {
      expr,
      newline: true,
    })
  }

  fn parse_return_statement(&mut self, engine: &mut DiagnosticEngine) -> Result<Statement, ()> {
    let token = self.expect(TokenKind::Return, engine)?;

    let expr = if self.peek_nth(0).kind == TokenKind::SemiColon {
      None
    } else {
      Some(self.parse_expression(engine)?)
    };

    self.expect(TokenKind::SemiColon, engine)?;
    Ok(Statement::Return { token, expr })
  }

  fn parse_if_statement(&mut self, engine: &mut DiagnosticEngine) -> Result<Statement, ()> {
    self.expect(TokenKind::If, engine)?;
    self.expect(TokenKind::LeftParen, engine)?;
    let condition = self.parse_expression(engine)?;
    self.expect(TokenKind::RightParen, engine)?;
    let then_block = self.parse_block(engine)?;

    let else_block = if self.consume_on_match(TokenKind::Else) {
      if self.peek_nth(0).kind == TokenKind::If {
        // `else if` chains nest as a block holding the next if.
        let chained = self.parse_statement(engine)?;
        Some(StatementBlock {
          body: vec![Node::Statement(chained)],
        })
      } else {
        Some(self.parse_block(engine)?)
      }
    } else {
      None
    };

    Ok(Statement::IfElse {
      condition,
      then_block,
      else_block,
    })
  }

  fn parse_for_statement(&mut self, engine: &mut DiagnosticEngine) -> Result<Statement, ()> {
    self.expect(TokenKind::For, engine)?;
    self.expect(TokenKind::LeftParen, engine)?;
    let initializer = self.parse_variable_declaration(engine)?;
    let condition = self.parse_expression(engine)?;
    self.expect(TokenKind::SemiColon, engine)?;
    let increment = self.parse_assignment(engine)?;
    self.expect(TokenKind::RightParen, engine)?;
    let block = self.parse_block(engine)?;

    Ok(Statement::For {
      initializer,
      condition,
      increment,
      block,
    })
  }

  fn parse_while_statement(&mut self, engine: &mut DiagnosticEngine) -> Result<Statement, ()> {
    self.expect(TokenKind::While, engine)?;
    self.expect(TokenKind::LeftParen, engine)?;
    let condition = self.parse_expression(engine)?;
    self.expect(TokenKind::RightParen, engine)?;
    let block = self.parse_block(engine)?;

    Ok(Statement::While { condition, block })
  }

  /// `defer` accepts a call, a print, or a block. Anything else cannot be
  /// postponed.
  fn parse_defer_statement(&mut self, engine: &mut DiagnosticEngine) -> Result<Statement, ()> {
    let token = self.expect(TokenKind::Defer, engine)?;
    let next = self.current_token();

    let statement = match next.kind {
      TokenKind::Print | TokenKind::Println => self.parse_print_statement(engine)?,
      TokenKind::LeftCurly => Statement::Block(self.parse_block(engine)?),
      TokenKind::Identifier if self.peek_nth(1).kind == TokenKind::LeftParen => {
        let call = self.parse_call(engine)?;
        self.expect(TokenKind::SemiColon, engine)?;
        Statement::Call(call)
      },
      _ => {
        self.report(
          engine,
          DiagnosticCode::NotDeferrable,
          format!("cannot defer '{}'", next.lexeme),
          &next,
          "only calls, prints, and blocks can be deferred".to_string(),
        )?;
        return Err(());
      },
    };

    Ok(Statement::Defer {
      token,
      statement: Box::new(statement),
    })
  }

  /// The assignment target is an identifier or an access chain rooted at
  /// one. The semicolon is left to the caller, so the same parse serves
  /// both statements and for increments.
  pub(crate) fn parse_assignment(
    &mut self,
    engine: &mut DiagnosticEngine,
  ) -> Result<StatementAssignment, ()> {
    let root = self.expect(TokenKind::Identifier, engine)?;
    let keys = self.parse_access_keys(engine)?;

    let target = if keys.is_empty() {
      Expression::Identifier(root)
    } else {
      Expression::AccessChain(ExpressionAccessChain { root, keys })
    };

    self.expect(TokenKind::Equals, engine)?;
    let rhs = self.parse_expression(engine)?;

    Ok(StatementAssignment { target, rhs })
  }

  /// `name(arg, …)` with the name already at the cursor.
  pub(crate) fn parse_call(&mut self, engine: &mut DiagnosticEngine) -> Result<ExpressionCall, ()> {
    let name = self.expect(TokenKind::Identifier, engine)?;
    let arguments = self.parse_arguments(engine)?;

    Ok(ExpressionCall { name, arguments })
  }

  pub(crate) fn parse_arguments(
    &mut self,
    engine: &mut DiagnosticEngine,
  ) -> Result<Vec<Expression>, ()> {
    let mut arguments = vec![];

    self.expect(TokenKind::LeftParen, engine)?;
    while !self.consume_on_match(TokenKind::RightParen) {
      arguments.push(self.parse_expression(engine)?);

      if self.peek_nth(0).kind != TokenKind::RightParen {
        self.expect(TokenKind::Comma, engine)?;
      }
    }

    Ok(arguments)
  }

  /// `.member` and `[index]` keys after an identifier root.
  pub(crate) fn parse_access_keys(
    &mut self,
    engine: &mut DiagnosticEngine,
  ) -> Result<Vec<AccessKey>, ()> {
    let mut keys = vec![];

    loop {
      if self.peek_nth(0).kind == TokenKind::Dot
        && self.peek_nth(1).kind == TokenKind::Identifier
      {
        self.advance();
        let member = self.expect(TokenKind::Identifier, engine)?;
        keys.push(AccessKey::Member(member));
        continue;
      }

      if self.peek_nth(0).kind == TokenKind::LeftBracket {
        let token = self.advance();
        let index = self.parse_expression(engine)?;
        self.expect(TokenKind::RightBracket, engine)?;
        keys.push(AccessKey::Index {
          token,
          index: Box::new(index),
        });
        continue;
      }

      return Ok(keys);
    }
  }
}
