//! Code generation: walk each statement tree in post-order and emit one
//! symbolic two-operand instruction per node.
//!
//! Conventions:
//! - a leaf loads its lexeme into a freshly allocated register
//!   (`mov <lexeme>, <reg>`);
//! - a binary operation leaves its result in the right operand's register
//!   and frees the left one;
//! - an assignment allocates a fresh register for the statement node, moves
//!   the right child's register into the left child's, and frees only the
//!   right child. The left child's register stays live for the rest of the
//!   run — each assignment statement retires one pool slot.
//!
//! The previous statement's result register is released when the next
//! statement starts reusing the pool; the final one is released when the
//! trace is taken.

use std::fmt;
use std::mem;

use tracing::debug;

use crate::error::{CompileError, CompileResult};
use crate::parser::{AstKind, AstNode, TreeList};
use crate::regalloc::{RegisterPool, ScratchRegister};

/// Instruction mnemonics appearing in the trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mnemonic {
  Mov,
  Add,
  Sub,
  Mul,
  Div,
}

impl fmt::Display for Mnemonic {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let text = match self {
      Mnemonic::Mov => "mov",
      Mnemonic::Add => "add",
      Mnemonic::Sub => "sub",
      Mnemonic::Mul => "mul",
      Mnemonic::Div => "div",
    };
    f.write_str(text)
  }
}

/// Either the literal source lexeme (first load of a leaf) or a register
/// name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
  Lexeme(String),
  Register(ScratchRegister),
}

impl fmt::Display for Operand {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Operand::Lexeme(text) => f.write_str(text),
      Operand::Register(register) => write!(f, "{register}"),
    }
  }
}

/// One symbolic instruction: `<mnemonic> <src>, <dst>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
  pub mnemonic: Mnemonic,
  pub src: Operand,
  pub dst: Operand,
}

impl fmt::Display for Instruction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} {}, {}", self.mnemonic, self.src, self.dst)
  }
}

/// The generator context: register pool plus the accumulated trace.
#[derive(Debug)]
pub struct CodeGenerator {
  pool: RegisterPool,
  trace: Vec<Instruction>,
  pending_result: Option<ScratchRegister>,
}

impl Default for CodeGenerator {
  fn default() -> Self {
    Self::new()
  }
}

impl CodeGenerator {
  pub fn new() -> Self {
    Self {
      pool: RegisterPool::new(),
      trace: Vec::new(),
      pending_result: None,
    }
  }

  /// Generate the whole program and hand back the trace. Resets the
  /// context first, so one generator can process successive compilations.
  pub fn generate(&mut self, trees: &mut TreeList) -> CompileResult<Vec<Instruction>> {
    self.reset();
    for tree in trees.iter_mut() {
      self.generate_statement(tree)?;
    }
    self.take_trace()
  }

  fn reset(&mut self) {
    self.pool.reset();
    self.trace.clear();
    self.pending_result = None;
  }

  /// Walk one statement tree. The previous statement's result register is
  /// released first; this is the boundary where the pool gets reused.
  pub fn generate_statement(&mut self, root: &mut AstNode) -> CompileResult<()> {
    if let Some(register) = self.pending_result.take() {
      self.pool.free(register)?;
    }
    self.visit(root)?;
    self.pending_result = root.register;
    Ok(())
  }

  /// Release the final statement's result register and return the trace.
  pub fn take_trace(&mut self) -> CompileResult<Vec<Instruction>> {
    if let Some(register) = self.pending_result.take() {
      self.pool.free(register)?;
    }
    Ok(mem::take(&mut self.trace))
  }

  pub fn pool(&self) -> &RegisterPool {
    &self.pool
  }

  /// Strict post-order: both children before the node, leaves immediately.
  fn visit(&mut self, node: &mut AstNode) -> CompileResult<()> {
    if let Some(left) = node.left.as_deref_mut() {
      self.visit(left)?;
    }
    if let Some(right) = node.right.as_deref_mut() {
      self.visit(right)?;
    }

    match node.kind {
      AstKind::Identifier => self.load_leaf(node),
      AstKind::Add => self.binary(node, Mnemonic::Add),
      AstKind::Subtract => self.binary(node, Mnemonic::Sub),
      AstKind::Multiply => self.binary(node, Mnemonic::Mul),
      AstKind::Divide => self.binary(node, Mnemonic::Div),
      AstKind::Assign => self.assign(node),
    }
  }

  fn load_leaf(&mut self, node: &mut AstNode) -> CompileResult<()> {
    let register = self.pool.allocate()?;
    self.emit(
      Mnemonic::Mov,
      Operand::Lexeme(node.token.lexeme.clone()),
      Operand::Register(register),
    );
    node.register = Some(register);
    Ok(())
  }

  fn binary(&mut self, node: &mut AstNode, mnemonic: Mnemonic) -> CompileResult<()> {
    let left = child_register(&node.left, "left")?;
    let right = child_register(&node.right, "right")?;

    self.emit(mnemonic, Operand::Register(left), Operand::Register(right));

    // The result lands in the right operand; the left one is done.
    node.register = Some(right);
    self.pool.free(left)?;
    Ok(())
  }

  fn assign(&mut self, node: &mut AstNode) -> CompileResult<()> {
    let left = child_register(&node.left, "left")?;
    let right = child_register(&node.right, "right")?;

    let register = self.pool.allocate()?;
    self.emit(
      Mnemonic::Mov,
      Operand::Register(right),
      Operand::Register(left),
    );
    self.pool.free(right)?;

    // The statement node's result is the fresh register; the left child's
    // register is not released here.
    node.register = Some(register);
    Ok(())
  }

  fn emit(&mut self, mnemonic: Mnemonic, src: Operand, dst: Operand) {
    let instruction = Instruction { mnemonic, src, dst };
    debug!(instruction = %instruction, "emit");
    self.trace.push(instruction);
  }
}

fn child_register(
  child: &Option<Box<AstNode>>,
  side: &str,
) -> CompileResult<ScratchRegister> {
  child
    .as_deref()
    .and_then(|node| node.register)
    .ok_or_else(|| CompileError::internal(format!("{side} child has no result register")))
}

/// Generate a program's trace with a throwaway context.
pub fn generate(trees: &mut TreeList) -> CompileResult<Vec<Instruction>> {
  CodeGenerator::new().generate(trees)
}
