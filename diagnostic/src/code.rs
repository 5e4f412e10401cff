/// Severity of a diagnostic. Everything the pipeline reports is either
/// fatal or a lint-style warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
  Error,
  Warning,
}

/// Unique identifier for each type of diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
  // Lexical
  IllegalCharacter,
  UnterminatedComment,
  UnterminatedString,

  // Syntax
  UnexpectedToken,
  ExpectedExpression,
  InvalidAssignmentTarget,
  NotDeferrable,
  StructLiteralArity,
  UnknownStruct,
  NotImplemented,
  InvalidNumber,

  // Declarations
  FunctionRedeclaration,
  StructRedeclaration,
  VariableRedeclaration,
  MissingReturn,

  // Types
  TypeMismatch,
  InvalidBinaryOperation,
  InvalidUnaryOperation,
  InvalidCast,
  NonBoolCondition,
  BreakOutsideLoop,
  ContinueOutsideLoop,
  NotIterable,
  NotAStruct,
  NotAnArray,
  NonIntegerIndex,
  UnknownMember,
  ReturnTypeMismatch,
  VoidReturnValue,
  WrongNumberOfArguments,
  UnknownFunction,

  // Runtime
  UndeclaredIdentifier,
  VoidAssignment,
  IndexOutOfRange,
  DivisionByZero,
  MissingMain,

  // Driver
  FileNotFound,
  InvalidArguments,

  // Warnings
  UnusedVariable,
}

impl DiagnosticCode {
  pub fn code(&self) -> String {
    match self {
      // Lexical
      Self::IllegalCharacter => "E0001".to_string(),
      Self::UnterminatedComment => "E0002".to_string(),
      Self::UnterminatedString => "E0003".to_string(),

      // Syntax
      Self::UnexpectedToken => "E0100".to_string(),
      Self::ExpectedExpression => "E0101".to_string(),
      Self::InvalidAssignmentTarget => "E0102".to_string(),
      Self::NotDeferrable => "E0103".to_string(),
      Self::StructLiteralArity => "E0104".to_string(),
      Self::UnknownStruct => "E0105".to_string(),
      Self::NotImplemented => "E0106".to_string(),
      Self::InvalidNumber => "E0107".to_string(),

      // Declarations
      Self::FunctionRedeclaration => "E0200".to_string(),
      Self::StructRedeclaration => "E0201".to_string(),
      Self::VariableRedeclaration => "E0202".to_string(),
      Self::MissingReturn => "E0203".to_string(),

      // Types
      Self::TypeMismatch => "E0210".to_string(),
      Self::InvalidBinaryOperation => "E0211".to_string(),
      Self::InvalidUnaryOperation => "E0212".to_string(),
      Self::InvalidCast => "E0213".to_string(),
      Self::NonBoolCondition => "E0214".to_string(),
      Self::BreakOutsideLoop => "E0215".to_string(),
      Self::ContinueOutsideLoop => "E0216".to_string(),
      Self::NotIterable => "E0217".to_string(),
      Self::NotAStruct => "E0218".to_string(),
      Self::NotAnArray => "E0219".to_string(),
      Self::NonIntegerIndex => "E0220".to_string(),
      Self::UnknownMember => "E0221".to_string(),
      Self::ReturnTypeMismatch => "E0222".to_string(),
      Self::VoidReturnValue => "E0223".to_string(),
      Self::WrongNumberOfArguments => "E0224".to_string(),
      Self::UnknownFunction => "E0225".to_string(),

      // Runtime
      Self::UndeclaredIdentifier => "E0300".to_string(),
      Self::VoidAssignment => "E0301".to_string(),
      Self::IndexOutOfRange => "E0302".to_string(),
      Self::DivisionByZero => "E0303".to_string(),
      Self::MissingMain => "E0304".to_string(),

      // Driver
      Self::FileNotFound => "E0400".to_string(),
      Self::InvalidArguments => "E0401".to_string(),

      // Warnings
      Self::UnusedVariable => "W0001".to_string(),
    }
  }

  /// Which family of failure this is. Codes shared between the checker
  /// and the interpreter keep the family of their numbering.
  pub fn category(&self) -> &'static str {
    match self {
      Self::IllegalCharacter | Self::UnterminatedComment | Self::UnterminatedString => "lexical",

      Self::UnexpectedToken
      | Self::ExpectedExpression
      | Self::InvalidAssignmentTarget
      | Self::NotDeferrable
      | Self::StructLiteralArity
      | Self::UnknownStruct
      | Self::NotImplemented
      | Self::InvalidNumber => "syntax",

      Self::FunctionRedeclaration
      | Self::StructRedeclaration
      | Self::VariableRedeclaration
      | Self::MissingReturn => "declaration",

      Self::TypeMismatch
      | Self::InvalidBinaryOperation
      | Self::InvalidUnaryOperation
      | Self::InvalidCast
      | Self::NonBoolCondition
      | Self::BreakOutsideLoop
      | Self::ContinueOutsideLoop
      | Self::NotIterable
      | Self::NotAStruct
      | Self::NotAnArray
      | Self::NonIntegerIndex
      | Self::UnknownMember
      | Self::ReturnTypeMismatch
      | Self::VoidReturnValue
      | Self::WrongNumberOfArguments
      | Self::UnknownFunction => "type",

      Self::UndeclaredIdentifier
      | Self::VoidAssignment
      | Self::IndexOutOfRange
      | Self::DivisionByZero
      | Self::MissingMain => "runtime",

      Self::FileNotFound | Self::InvalidArguments => "driver",

      Self::UnusedVariable => "lint",
    }
  }

  pub fn severity(&self) -> Severity {
    match self {
      Self::UnusedVariable => Severity::Warning,
      _ => Severity::Error,
    }
  }
}
