//! Command-line entry point for the `.rep` compiler.
//!
//! `repc <FILE>` compiles one source file and prints the symbolic
//! instruction trace to stdout. The `--emit-tokens` and `--emit-ast` flags
//! additionally dump intermediate stage output for debugging. Diagnostics
//! go to stderr and a failed compilation exits with status 1.

use clap::Parser;
use std::process;
use tracing_subscriber::EnvFilter;

use repc::source::SourceBuffer;
use repc::{codegen, lexer, parser};

#[derive(Parser)]
#[command(name = "repc")]
#[command(version = repc::VERSION)]
#[command(about = "Compile a .rep file into a symbolic instruction trace", long_about = None)]
struct Cli {
  /// Input file to compile
  #[arg(value_name = "FILE")]
  input: String,

  /// Print the token table before compiling
  #[arg(long)]
  emit_tokens: bool,

  /// Print each statement's tree before generating code
  #[arg(long)]
  emit_ast: bool,
}

fn main() {
  tracing_subscriber::fmt()
    .with_target(false)
    .with_env_filter(EnvFilter::from_default_env())
    .init();

  let cli = Cli::parse();

  if let Err(err) = run(&cli) {
    eprintln!("{err}");
    process::exit(1);
  }
}

fn run(cli: &Cli) -> repc::CompileResult<()> {
  let buffer = SourceBuffer::load(&cli.input)?;
  let stream = lexer::tokenize(buffer.contents());

  if cli.emit_tokens {
    for token in stream.tokens() {
      println!(
        "lexeme: {:<20}\ttype: {:<20}\trow: {:<5}\tcolumn: {:<5}",
        token.lexeme,
        token.kind.descriptor(),
        token.row,
        token.column
      );
    }
  }

  let mut trees = parser::parse(&stream)?;

  if cli.emit_ast {
    for tree in &trees {
      print!("{}", parser::format_tree(tree));
    }
  }

  let trace = codegen::generate(&mut trees)?;
  for instruction in &trace {
    println!("{instruction}");
  }

  Ok(())
}
