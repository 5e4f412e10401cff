use diagnostic::{
  code::DiagnosticCode,
  diagnostic::{Diagnostic, Span},
  DiagnosticEngine,
};

use crate::token::{Token, TokenKind};

pub mod token;
mod scanners;

/// Left-to-right scanner over the source text. Produces the token stream
/// terminated by an EOF token.
pub struct Lexer {
  pub tokens: Vec<Token>,
  source: Vec<char>,
  start: usize,
  current: usize,
  line: usize,
  line_start: usize,
}

impl Lexer {
  pub fn new(source: String) -> Self {
    Self {
      tokens: vec![],
      source: source.chars().collect(),
      start: 0,
      current: 0,
      line: 1,
      line_start: 0,
    }
  }

  /// Scans the whole source. The first lexical error is emitted into the
  /// engine and aborts the scan.
  pub fn scan_tokens(&mut self, engine: &mut DiagnosticEngine) -> Result<(), ()> {
    while !self.is_at_end() {
      self.start = self.current;
      self.scan_token(engine)?;
    }

    self.tokens.push(Token::new(
      TokenKind::Eof,
      String::new(),
      self.line,
      self.current - self.line_start,
    ));

    Ok(())
  }

  pub(crate) fn is_at_end(&self) -> bool {
    self.current >= self.source.len()
  }

  pub(crate) fn advance(&mut self) -> char {
    let c = self.source[self.current];
    self.current += 1;
    c
  }

  pub(crate) fn peek(&self) -> char {
    if self.is_at_end() {
      return '\0';
    }
    self.source[self.current]
  }

  pub(crate) fn peek_next(&self) -> char {
    if self.current + 1 >= self.source.len() {
      return '\0';
    }
    self.source[self.current + 1]
  }

  /// Consumes the next character only when it matches the expected one.
  pub(crate) fn match_char(&mut self, expected: char) -> bool {
    if self.peek() != expected {
      return false;
    }

    self.current += 1;
    true
  }

  pub(crate) fn new_line(&mut self) {
    self.line += 1;
    self.line_start = self.current;
  }

  pub(crate) fn column(&self) -> usize {
    self.start.saturating_sub(self.line_start)
  }

  pub(crate) fn add_token(&mut self, kind: TokenKind) {
    let lexeme: String = self.source[self.start..self.current].iter().collect();
    let column = self.column();
    self.tokens.push(Token::new(kind, lexeme, self.line, column));
  }

  pub(crate) fn report(
    &self,
    engine: &mut DiagnosticEngine,
    code: DiagnosticCode,
    message: String,
    label: String,
  ) -> Result<(), ()> {
    let length = (self.current - self.start).max(1);
    let diagnostic =
      Diagnostic::new(code, message).at(Span::new(self.line, self.column(), length), label);

    engine.emit(diagnostic);
    Err(())
  }
}
