use diagnostic::{code::DiagnosticCode, diagnostic::Diagnostic, DiagnosticEngine};

use crate::runner::Runner;

mod runner;

fn main() {
  let args: Vec<String> = std::env::args().skip(1).collect();

  let mut engine = DiagnosticEngine::new();
  let mut runner = Runner::new();
  let mut path = None;

  for arg in &args {
    match arg.as_str() {
      "--tokens" => runner.show_tokens = true,
      "--ast" => runner.show_ast = true,
      _ if arg.starts_with("--") => {
        usage_error(&mut engine, format!("unknown flag '{}'", arg));
      },
      _ => {
        if path.replace(arg.clone()).is_some() {
          usage_error(&mut engine, "more than one source file given".to_string());
        }
      },
    }
  }

  let Some(path) = path else {
    usage_error(&mut engine, "no source file given".to_string());
  };

  if runner.run_file(&path, &mut engine).is_err() {
    std::process::exit(65);
  }
}

fn usage_error(engine: &mut DiagnosticEngine, message: String) -> ! {
  let diagnostic = Diagnostic::new(DiagnosticCode::InvalidArguments, message)
    .with_help("Usage: ion [--tokens] [--ast] <file.ion>".to_string());

  engine.emit(diagnostic);
  engine.eprint_all("");
  std::process::exit(64);
}
