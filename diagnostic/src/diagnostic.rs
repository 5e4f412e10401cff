use crate::code::{DiagnosticCode, Severity};

/// A region of one source line, 1-based line and 0-based column. The
/// pipeline runs a single file at a time, so spans carry no path; the
/// driver knows what it fed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
  pub line: usize,
  pub column: usize,
  pub length: usize,
}

impl Span {
  pub fn new(line: usize, column: usize, length: usize) -> Self {
    Self {
      line,
      column,
      length,
    }
  }
}

/// One reported problem. Every stage stops at its first error, so a
/// diagnostic anchors at most one offending span; the label captions its
/// underline, and extra context goes into notes and the help line.
/// Severity is a property of the code, not stored separately.
#[derive(Debug, Clone)]
pub struct Diagnostic {
  pub code: DiagnosticCode,
  pub message: String,
  pub span: Option<Span>,
  pub label: Option<String>,
  pub notes: Vec<String>,
  pub help: Option<String>,
}

impl Diagnostic {
  pub fn new(code: DiagnosticCode, message: String) -> Self {
    Self {
      code,
      message,
      span: None,
      label: None,
      notes: Vec::new(),
      help: None,
    }
  }

  /// Anchors the diagnostic at the offending span.
  pub fn at(mut self, span: Span, label: String) -> Self {
    self.span = Some(span);
    self.label = Some(label);
    self
  }

  pub fn with_note(mut self, note: String) -> Self {
    self.notes.push(note);
    self
  }

  pub fn with_help(mut self, help: String) -> Self {
    self.help = Some(help);
    self
  }

  pub fn severity(&self) -> Severity {
    self.code.severity()
  }
}
