pub mod code;
pub mod diagnostic;
pub mod formatter;

use colored::*;

use crate::{code::Severity, diagnostic::Diagnostic, formatter::DiagnosticRenderer};

/// Collector for all diagnostics during compilation
#[derive(Debug, Default)]
pub struct DiagnosticEngine {
  diagnostics: Vec<Diagnostic>,
  error_count: usize,
  warning_count: usize,
}

impl DiagnosticEngine {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn emit(&mut self, diagnostic: Diagnostic) {
    match diagnostic.severity() {
      Severity::Error => self.error_count += 1,
      Severity::Warning => self.warning_count += 1,
    }
    self.diagnostics.push(diagnostic);
  }

  pub fn has_errors(&self) -> bool {
    self.error_count > 0
  }

  pub fn has_warnings(&self) -> bool {
    self.warning_count > 0
  }

  pub fn error_count(&self) -> usize {
    self.error_count
  }

  pub fn warning_count(&self) -> usize {
    self.warning_count
  }

  pub fn clear(&mut self) {
    self.diagnostics.clear();
    self.error_count = 0;
    self.warning_count = 0;
  }

  /// Print all diagnostics with colors to stdout
  pub fn print_all(&self, source_code: &str) {
    let renderer = DiagnosticRenderer::new(source_code);
    for diagnostic in &self.diagnostics {
      print!("{}", renderer.render(diagnostic));
    }

    self.print_summary();
  }

  /// Print all diagnostics with colors to stderr
  pub fn eprint_all(&self, source_code: &str) {
    let renderer = DiagnosticRenderer::new(source_code);
    for diagnostic in &self.diagnostics {
      eprint!("{}", renderer.render(diagnostic));
    }

    let summary = self.summary_line();
    if !summary.is_empty() {
      eprintln!();
      eprintln!("{}", summary);
    }
  }

  /// Get all diagnostics as plain text (for tests and file logging)
  pub fn format_all_plain(&self, source_code: &str) -> String {
    let renderer = DiagnosticRenderer::new(source_code);
    let mut output = String::new();

    for diagnostic in &self.diagnostics {
      output.push_str(&renderer.render_plain(diagnostic));
      output.push('\n');
    }

    output.push_str(&self.summary_line());
    output
  }

  pub fn get_diagnostics(&self) -> &[Diagnostic] {
    &self.diagnostics
  }

  fn print_summary(&self) {
    if self.error_count == 0 && self.warning_count == 0 {
      return;
    }

    println!();
    if self.has_errors() {
      println!(
        "{}: {}",
        "error".red().bold(),
        self.summary_line().trim_start_matches("error: ")
      );
    } else {
      println!(
        "{}: {}",
        "warning".yellow().bold(),
        self.summary_line().trim_start_matches("warning: ")
      );
    }
  }

  fn summary_line(&self) -> String {
    if self.has_errors() {
      let warnings = if self.warning_count > 0 {
        format!(
          "; {} {} emitted",
          self.warning_count,
          plural(self.warning_count, "warning")
        )
      } else {
        String::new()
      };

      format!(
        "error: could not run due to {} previous {}{}",
        self.error_count,
        plural(self.error_count, "error"),
        warnings
      )
    } else if self.warning_count > 0 {
      format!(
        "warning: {} {} emitted",
        self.warning_count,
        plural(self.warning_count, "warning")
      )
    } else {
      String::new()
    }
  }
}

fn plural(count: usize, word: &str) -> String {
  if count == 1 {
    word.to_string()
  } else {
    format!("{}s", word)
  }
}
