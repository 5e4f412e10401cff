use diagnostic::{code::DiagnosticCode, DiagnosticEngine};

use crate::{
  token::{builtin_kind, keyword_kind, Token, TokenKind},
  Lexer,
};

impl Lexer {
  pub(crate) fn scan_token(&mut self, engine: &mut DiagnosticEngine) -> Result<(), ()> {
    let c = self.advance();

    match c {
      ' ' | '\t' | '\r' => Ok(()),
      '\n' => {
        self.new_line();
        Ok(())
      },

      '(' => {
        self.add_token(TokenKind::LeftParen);
        Ok(())
      },
      ')' => {
        self.add_token(TokenKind::RightParen);
        Ok(())
      },
      '[' => {
        self.add_token(TokenKind::LeftBracket);
        Ok(())
      },
      ']' => {
        self.add_token(TokenKind::RightBracket);
        Ok(())
      },
      '{' => {
        self.add_token(TokenKind::LeftCurly);
        Ok(())
      },
      '}' => {
        self.add_token(TokenKind::RightCurly);
        Ok(())
      },
      ',' => {
        self.add_token(TokenKind::Comma);
        Ok(())
      },
      ':' => {
        self.add_token(TokenKind::Colon);
        Ok(())
      },
      ';' => {
        self.add_token(TokenKind::SemiColon);
        Ok(())
      },
      '.' => {
        self.add_token(TokenKind::Dot);
        Ok(())
      },

      '+' => {
        self.add_token(TokenKind::Plus);
        Ok(())
      },
      '-' => {
        // Maximal munch: `->` wins over `-` `>`.
        if self.match_char('>') {
          self.add_token(TokenKind::RightArrow);
        } else {
          self.add_token(TokenKind::Minus);
        }
        Ok(())
      },
      '*' => {
        self.add_token(TokenKind::Star);
        Ok(())
      },
      '%' => {
        self.add_token(TokenKind::Modulus);
        Ok(())
      },
      '!' => {
        if self.match_char('=') {
          self.add_token(TokenKind::NotEquals);
        } else {
          self.add_token(TokenKind::Not);
        }
        Ok(())
      },
      '=' => {
        if self.match_char('=') {
          self.add_token(TokenKind::EqualsEquals);
        } else {
          self.add_token(TokenKind::Equals);
        }
        Ok(())
      },
      '<' => {
        if self.match_char('=') {
          self.add_token(TokenKind::LessThanEquals);
        } else {
          self.add_token(TokenKind::LessThan);
        }
        Ok(())
      },
      '>' => {
        if self.match_char('=') {
          self.add_token(TokenKind::GreaterThanEquals);
        } else {
          self.add_token(TokenKind::GreaterThan);
        }
        Ok(())
      },
      '&' => {
        if self.match_char('&') {
          self.add_token(TokenKind::LogicalAnd);
          Ok(())
        } else {
          self.report(
            engine,
            DiagnosticCode::IllegalCharacter,
            "illegal character '&'".to_string(),
            "did you mean '&&'?".to_string(),
          )
        }
      },
      '|' => {
        if self.match_char('|') {
          self.add_token(TokenKind::LogicalOr);
          Ok(())
        } else {
          self.report(
            engine,
            DiagnosticCode::IllegalCharacter,
            "illegal character '|'".to_string(),
            "did you mean '||'?".to_string(),
          )
        }
      },

      '/' => self.scan_slash(engine),
      '"' => self.scan_string(engine),
      '\'' => self.scan_character(engine),

      c if c.is_ascii_digit() => {
        self.scan_number();
        Ok(())
      },
      c if c.is_alphabetic() => {
        self.scan_word();
        Ok(())
      },

      c => self.report(
        engine,
        DiagnosticCode::IllegalCharacter,
        format!("illegal character '{}'", c),
        "not part of the language".to_string(),
      ),
    }
  }

  /// Division, a `//` line comment, or a `/* */` block comment.
  fn scan_slash(&mut self, engine: &mut DiagnosticEngine) -> Result<(), ()> {
    if self.match_char('/') {
      while self.peek() != '\n' && !self.is_at_end() {
        self.advance();
      }
      return Ok(());
    }

    if self.match_char('*') {
      while !(self.peek() == '*' && self.peek_next() == '/') {
        if self.is_at_end() {
          return self.report(
            engine,
            DiagnosticCode::UnterminatedComment,
            "block comment does not terminate".to_string(),
            "comment opened here".to_string(),
          );
        }

        if self.advance() == '\n' {
          self.new_line();
        }
      }

      self.advance(); // '*'
      self.advance(); // '/'
      return Ok(());
    }

    self.add_token(TokenKind::Division);
    Ok(())
  }

  fn scan_string(&mut self, engine: &mut DiagnosticEngine) -> Result<(), ()> {
    while self.peek() != '"' {
      if self.is_at_end() || self.peek() == '\n' {
        return self.report(
          engine,
          DiagnosticCode::UnterminatedString,
          "string literal does not have a closing double quote".to_string(),
          "string opened here".to_string(),
        );
      }

      self.advance();
    }

    self.advance(); // closing '"'

    // The stored lexeme drops the surrounding quotes.
    let lexeme: String = self.source[self.start + 1..self.current - 1].iter().collect();
    let column = self.column();
    self
      .tokens
      .push(Token::new(TokenKind::StringLiteral, lexeme, self.line, column));

    Ok(())
  }

  fn scan_character(&mut self, engine: &mut DiagnosticEngine) -> Result<(), ()> {
    while self.peek() != '\'' {
      if self.is_at_end() || self.peek() == '\n' {
        return self.report(
          engine,
          DiagnosticCode::UnterminatedString,
          "character literal does not have a closing quote".to_string(),
          "literal opened here".to_string(),
        );
      }

      self.advance();
    }

    self.advance(); // closing '\''

    let lexeme: String = self.source[self.start + 1..self.current - 1].iter().collect();
    let column = self.column();
    self
      .tokens
      .push(Token::new(TokenKind::CharacterLiteral, lexeme, self.line, column));

    Ok(())
  }

  /// Contiguous digits, with at most one `.` promoting to a float literal.
  fn scan_number(&mut self) {
    let mut kind = TokenKind::IntegerLiteral;

    while self.peek().is_ascii_digit() {
      self.advance();
    }

    if self.peek() == '.' && self.peek_next().is_ascii_digit() {
      kind = TokenKind::FloatLiteral;
      self.advance(); // '.'

      while self.peek().is_ascii_digit() {
        self.advance();
      }
    }

    self.add_token(kind);
  }

  /// An identifier, promoted by the keyword and builtin tables.
  fn scan_word(&mut self) {
    while self.peek().is_alphanumeric() || self.peek() == '_' {
      self.advance();
    }

    let lexeme: String = self.source[self.start..self.current].iter().collect();

    if let Some(kind) = keyword_kind(&lexeme) {
      self.add_token(kind);
      return;
    }

    if let Some(kind) = builtin_kind(&lexeme) {
      self.add_token(kind);
      return;
    }

    self.add_token(TokenKind::Identifier);
  }
}
