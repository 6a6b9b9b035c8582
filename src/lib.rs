//! Crate root: wires together the compilation pipeline.
//!
//! The stages are intentionally small and composable, and data only flows
//! forward — each stage fully finishes before the next one starts:
//! - `source` loads a `.rep` file into an in-memory buffer.
//! - `lexer` runs the character FSM and produces a flat token stream plus a
//!   statement count.
//! - `parser` owns all syntactic knowledge and returns one tree per
//!   statement.
//! - `codegen` walks each tree in post-order and emits the symbolic
//!   instruction trace, drawing scratch registers from `regalloc`.
//! - `error` centralises the error types shared by every stage.

pub mod codegen;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod regalloc;
pub mod source;

pub use codegen::{CodeGenerator, Instruction};
pub use error::{CompileError, CompileResult};
pub use lexer::{Lexer, Token, TokenKind, TokenStream};
pub use parser::{AstKind, AstNode, TreeList};
pub use source::SourceBuffer;

/// Compiler version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Compile a source string into its symbolic instruction trace.
pub fn compile_source(source: &str) -> CompileResult<Vec<Instruction>> {
  let stream = lexer::tokenize(source);
  let mut trees = parser::parse(&stream)?;
  codegen::generate(&mut trees)
}

/// Load a `.rep` file and compile it.
pub fn compile_file(path: &str) -> CompileResult<Vec<Instruction>> {
  let buffer = SourceBuffer::load(path)?;
  compile_source(buffer.contents())
}
