use colored::*;

use crate::{code::Severity, diagnostic::Diagnostic};

/// Renders diagnostics against the source text:
///
/// ```text
/// error[E0210] (type): declared type int does not match bool
///   --> 1:13
///  1 | var x: int = true;
///    |              ^^^^ expression has type bool
///    = help: change the annotation or the initializer
/// ```
///
/// One code path serves both the colored console form and the plain form
/// used by tests and stderr captures.
pub struct DiagnosticRenderer<'a> {
  source: &'a str,
}

impl<'a> DiagnosticRenderer<'a> {
  pub fn new(source: &'a str) -> Self {
    Self { source }
  }

  pub fn render(&self, diagnostic: &Diagnostic) -> String {
    self.render_with(diagnostic, true)
  }

  pub fn render_plain(&self, diagnostic: &Diagnostic) -> String {
    self.render_with(diagnostic, false)
  }

  fn render_with(&self, diagnostic: &Diagnostic, colored: bool) -> String {
    let severity = diagnostic.severity();
    let mut out = String::new();

    let head = format!("{}[{}]", severity_text(severity), diagnostic.code.code());
    out.push_str(&paint(&head, severity, colored));
    out.push_str(&format!(
      " ({}): {}\n",
      diagnostic.code.category(),
      diagnostic.message
    ));

    if let Some(span) = diagnostic.span {
      let gutter = " ".repeat(span.line.to_string().len());

      out.push_str(&format!("{}  --> {}:{}\n", gutter, span.line, span.column));

      if let Some(text) = self.source_line(span.line) {
        out.push_str(&format!(" {} | {}\n", span.line, text));

        let underline = "^".repeat(span.length.max(1));
        let mut marker = paint(&underline, severity, colored);
        if let Some(label) = &diagnostic.label {
          marker.push_str(&paint(&format!(" {}", label), severity, colored));
        }

        out.push_str(&format!(
          " {} | {}{}\n",
          gutter,
          " ".repeat(span.column),
          marker
        ));
      }
    }

    for note in &diagnostic.notes {
      out.push_str(&format!("  = note: {}\n", note));
    }

    if let Some(help) = &diagnostic.help {
      out.push_str(&format!("  = help: {}\n", help));
    }

    out
  }

  fn source_line(&self, line: usize) -> Option<&str> {
    self.source.lines().nth(line.checked_sub(1)?)
  }
}

fn severity_text(severity: Severity) -> &'static str {
  match severity {
    Severity::Error => "error",
    Severity::Warning => "warning",
  }
}

fn paint(text: &str, severity: Severity, colored: bool) -> String {
  if !colored {
    return text.to_string();
  }

  match severity {
    Severity::Error => text.red().bold().to_string(),
    Severity::Warning => text.yellow().bold().to_string(),
  }
}
