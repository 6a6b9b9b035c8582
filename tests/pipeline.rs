//! End-to-end pipeline tests driving the public API only.

use repc::{CompileError, Instruction, compile_file, compile_source};

fn trace_lines(source: &str) -> Vec<String> {
  compile_source(source)
    .expect("source should compile")
    .iter()
    .map(Instruction::to_string)
    .collect()
}

#[test]
fn compiles_a_small_program() {
  assert_eq!(
    trace_lines("x = 1 + 2;\ny = x * 3;"),
    vec![
      "mov x, r0",
      "mov 1, r1",
      "mov 2, r2",
      "add r1, r2",
      "mov r2, r0",
      "mov y, r1",
      "mov x, r2",
      "mov 3, r3",
      "mul r2, r3",
      "mov r3, r1",
    ]
  );
}

#[test]
fn mnemonics_are_the_documented_five() {
  let lines = trace_lines("a + b; a - b; a * b; a / b; a = b;");
  let mut mnemonics: Vec<&str> = lines
    .iter()
    .map(|line| line.split_whitespace().next().unwrap())
    .collect();
  mnemonics.sort();
  mnemonics.dedup();
  assert_eq!(mnemonics, vec!["add", "div", "mov", "mul", "sub"]);
}

#[test]
fn subtraction_chain_compiles_the_documented_shape() {
  // `- c` never joins the statement's tree, so it is absent from the trace.
  assert_eq!(
    trace_lines("a - b - c;"),
    vec!["mov a, r0", "mov b, r1", "sub r0, r1"]
  );
}

#[test]
fn malformed_statement_fails_the_whole_compilation() {
  assert!(matches!(
    compile_source("1 + ;"),
    Err(CompileError::MalformedInput { .. })
  ));
}

#[test]
fn deeply_nested_statement_exhausts_the_register_pool() {
  assert!(matches!(
    compile_source("a + b + c + d + e + f + g;"),
    Err(CompileError::RegisterExhausted { .. })
  ));
}

#[test]
fn load_errors_are_distinct() {
  assert!(matches!(compile_file(""), Err(CompileError::EmptyPath)));
  assert!(matches!(
    compile_file("a.txt"),
    Err(CompileError::WrongExtension { .. })
  ));
  assert!(matches!(
    compile_file("no-such-file-anywhere.rep"),
    Err(CompileError::FileNotFound { .. })
  ));
}

#[test]
fn compile_file_runs_the_whole_pipeline() {
  let mut path = std::env::temp_dir();
  path.push(format!("repc-pipeline-{}.rep", std::process::id()));
  std::fs::write(&path, "2 + 2;\n").unwrap();

  let trace = compile_file(path.to_str().unwrap()).unwrap();
  std::fs::remove_file(&path).unwrap();

  let lines: Vec<String> = trace.iter().map(Instruction::to_string).collect();
  assert_eq!(lines, vec!["mov 2, r0", "mov 2, r1", "add r0, r1"]);
}
