//! Shared error types used across the compilation pipeline.
//!
//! Every failure is a value of `CompileError`, grouped by taxonomy: load
//! failures are recoverable by the caller and keep the pipeline from ever
//! running, malformed input halts the current compilation unit, and
//! register-pool misuse is reported separately from parse errors so the two
//! cannot be confused in diagnostics.

use snafu::Snafu;

pub type CompileResult<T> = Result<T, CompileError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CompileError {
  /// The caller passed an empty path.
  #[snafu(display("no input file given"))]
  EmptyPath,

  /// The path is shorter than the shortest legal name (`a.rep`).
  #[snafu(display("file name \"{path}\" is too short"))]
  NameTooShort { path: String },

  /// The path does not end in the source extension.
  #[snafu(display("\"{path}\" is not a .rep file"))]
  WrongExtension { path: String },

  #[snafu(display("file not found: {path}"))]
  FileNotFound { path: String },

  #[snafu(display("file is empty: {path}"))]
  EmptyFile { path: String },

  #[snafu(display("failed to read {path}: {source}"))]
  Io {
    path: String,
    source: std::io::Error,
  },

  /// The parser met a token no grammar rule accepts, or ran out of tokens
  /// mid-rule. Fatal for the compilation unit.
  #[snafu(display("malformed input at row {row}, column {column}: {message} (near \"{lexeme}\")"))]
  MalformedInput {
    message: String,
    lexeme: String,
    row: u32,
    column: u32,
  },

  /// Every scratch register is live; the expression is too deeply nested.
  #[snafu(display("out of scratch registers ({capacity} in use)"))]
  RegisterExhausted { capacity: usize },

  /// A register was released twice without an intervening allocation.
  #[snafu(display("scratch register {name} freed while already free"))]
  RegisterDoubleFree { name: String },

  /// A pipeline invariant did not hold. Indicates a defect in the compiler
  /// itself rather than in the input.
  #[snafu(display("internal error: {message}"))]
  Internal { message: String },
}

impl CompileError {
  /// Construct a malformed-input error anchored at a token position.
  pub fn malformed(
    message: impl Into<String>,
    lexeme: impl Into<String>,
    row: u32,
    column: u32,
  ) -> Self {
    Self::MalformedInput {
      message: message.into(),
      lexeme: lexeme.into(),
      row,
      column,
    }
  }

  pub fn internal(message: impl Into<String>) -> Self {
    Self::Internal {
      message: message.into(),
    }
  }
}
