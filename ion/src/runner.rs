use std::fs;

use diagnostic::{code::DiagnosticCode, diagnostic::Diagnostic, DiagnosticEngine};
use interpreter::Interpreter;
use lexer::Lexer;
use parser::{json, Parser};
use typechecker::TypeChecker;

/// Drives the pipeline: lex, parse, type check, run. Debug dumps for the
/// token stream and the checked AST sit behind flags so program output
/// stays clean by default.
pub struct Runner {
  pub show_tokens: bool,
  pub show_ast: bool,
}

impl Runner {
  pub fn new() -> Self {
    Self {
      show_tokens: false,
      show_ast: false,
    }
  }

  /// Reads and runs a source file. Exit code 66 when the file cannot be
  /// read; other failures leave their diagnostics in the engine.
  pub fn run_file(&mut self, path: &str, engine: &mut DiagnosticEngine) -> Result<(), ()> {
    let source = match fs::read_to_string(path) {
      Ok(content) => content,
      Err(error) => {
        let diagnostic = Diagnostic::new(
          DiagnosticCode::FileNotFound,
          format!("could not read file: {}", path),
        )
        .with_help(format!("reason: {}", error));

        engine.emit(diagnostic);
        engine.eprint_all("");
        std::process::exit(66);
      },
    };

    self.interpret(source, engine)
  }

  pub fn interpret(&mut self, source: String, engine: &mut DiagnosticEngine) -> Result<(), ()> {
    let mut lexer = Lexer::new(source.clone());
    if lexer.scan_tokens(engine).is_err() {
      engine.eprint_all(&source);
      return Err(());
    }

    if self.show_tokens {
      for token in &lexer.tokens {
        println!("Type: {}({}) | Line:{}", token.kind, token.lexeme, token.line);
      }
    }

    let mut parser = Parser::new(lexer.tokens);
    let program = match parser.parse_program(engine) {
      Ok(program) => program,
      Err(()) => {
        engine.eprint_all(&source);
        return Err(());
      },
    };

    let mut checker = TypeChecker::new();
    if checker.check_program(&program, engine).is_err() {
      engine.eprint_all(&source);
      return Err(());
    }

    // Warnings are reported once, then dropped, so a later runtime
    // failure does not repeat them.
    if engine.has_warnings() {
      engine.eprint_all(&source);
      engine.clear();
    }

    if self.show_ast {
      println!("{}", json::pretty(&program));
    }

    let mut interpreter = Interpreter::new();
    if interpreter.run_program(&program, engine).is_err() {
      engine.eprint_all(&source);
      return Err(());
    }

    Ok(())
  }
}

impl Default for Runner {
  fn default() -> Self {
    Self::new()
  }
}
