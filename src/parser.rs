//! Recursive-descent parser producing one tree per statement.
//!
//! The grammar keeps the rule set small: `factor`, `term`, `expression`,
//! `statement`, with one token of lookahead. Operator handling is
//! asymmetric: `+` and `*` recurse into their own full rule and absorb
//! everything rightward at that precedence, while `-` and `/` bind exactly
//! the next unit and then the rule returns. `a - b - c;` therefore parses
//! to `Subtract(a, b)` with the trailing `- c` left outside the
//! statement's tree. Changing this needs a language-level decision, not a
//! parser patch.

use tracing::trace;

use crate::error::{CompileError, CompileResult};
use crate::lexer::{Token, TokenKind, TokenStream};
use crate::regalloc::ScratchRegister;

/// Node variants. Leaves (identifiers and literals) share one variant;
/// every other variant has exactly two children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AstKind {
  Identifier,
  Add,
  Subtract,
  Multiply,
  Divide,
  Assign,
}

/// A binary tree node. The token is a deep copy of whatever created the
/// node; `register` stays `None` until code generation assigns the scratch
/// register holding the node's result.
#[derive(Debug, Clone)]
pub struct AstNode {
  pub kind: AstKind,
  pub token: Token,
  pub left: Option<Box<AstNode>>,
  pub right: Option<Box<AstNode>>,
  pub register: Option<ScratchRegister>,
}

impl AstNode {
  fn leaf(token: &Token) -> Self {
    Self {
      kind: AstKind::Identifier,
      token: token.clone(),
      left: None,
      right: None,
      register: None,
    }
  }

  fn create(token: &Token, left: AstNode, right: AstNode) -> CompileResult<Self> {
    let kind = match token.kind {
      TokenKind::OpAdd => AstKind::Add,
      TokenKind::OpSubtract => AstKind::Subtract,
      TokenKind::OpMultiply => AstKind::Multiply,
      TokenKind::OpDivide => AstKind::Divide,
      TokenKind::OpAssign => AstKind::Assign,
      _ => {
        return Err(CompileError::malformed(
          "token cannot form an interior node",
          &token.lexeme,
          token.row,
          token.column,
        ));
      }
    };

    Ok(Self {
      kind,
      token: token.clone(),
      left: Some(Box::new(left)),
      right: Some(Box::new(right)),
      register: None,
    })
  }

  pub fn is_leaf(&self) -> bool {
    self.left.is_none() && self.right.is_none()
  }
}

/// Ordered tree roots, one per parsed statement.
pub type TreeList = Vec<AstNode>;

/// Parse the token stream into exactly `num_statements` trees.
pub fn parse(stream: &TokenStream) -> CompileResult<TreeList> {
  let mut parser = Parser { stream, pos: 0 };
  let mut trees = TreeList::new();

  for index in 0..stream.num_statements() {
    let root = parser.statement()?;
    trace!(statement = index, root = %root.token.lexeme, "parsed statement");
    trees.push(root);
    // The delimiter, in well-formed input.
    parser.consume();
  }

  Ok(trees)
}

/// Indented tree rendering with root/left/right side markers, one node
/// lexeme per line.
pub fn format_tree(root: &AstNode) -> String {
  let mut out = String::new();
  render(root, 0, 'X', &mut out);
  out
}

fn render(node: &AstNode, level: usize, side: char, out: &mut String) {
  for i in 0..level {
    if i == level - 1 {
      out.push('|');
      out.push(side);
      out.push_str(" -> ");
    } else {
      out.push_str("      ");
    }
  }
  out.push_str(&node.token.lexeme);
  out.push('\n');

  if let Some(left) = &node.left {
    render(left, level + 1, 'L', out);
  }
  if let Some(right) = &node.right {
    render(right, level + 1, 'R', out);
  }
}

/// Lightweight cursor over the token stream.
struct Parser<'a> {
  stream: &'a TokenStream,
  pos: usize,
}

impl<'a> Parser<'a> {
  fn current(&self) -> Option<&Token> {
    self.stream.get(self.pos)
  }

  fn current_kind(&self) -> Option<TokenKind> {
    self.current().map(|token| token.kind)
  }

  fn consume(&mut self) {
    self.pos += 1;
  }

  /// Take a deep copy of the current token and move past it.
  fn take_current(&mut self) -> Option<Token> {
    let token = self.current().cloned();
    if token.is_some() {
      self.consume();
    }
    token
  }

  fn end_of_input(&self) -> CompileError {
    let (row, column) = self
      .stream
      .tokens()
      .last()
      .map(|token| (token.row, token.column))
      .unwrap_or((0, 0));
    CompileError::malformed("unexpected end of input", "", row, column)
  }

  /// statement := expression ( '=' expression )*, stopping early once a
  /// delimiter follows a completed assignment.
  fn statement(&mut self) -> CompileResult<AstNode> {
    let mut node = self.expression()?;

    while self.current_kind() == Some(TokenKind::OpAssign) {
      let Some(op) = self.take_current() else { break };
      trace!(lexeme = %op.lexeme, "statement");
      node = AstNode::create(&op, node, self.expression()?)?;

      if self.current_kind() == Some(TokenKind::Delim) {
        break;
      }
    }

    Ok(node)
  }

  /// expression := term [ '+' expression | '-' term ]
  fn expression(&mut self) -> CompileResult<AstNode> {
    let node = self.term()?;

    match self.current_kind() {
      Some(TokenKind::OpAdd) => {
        let Some(op) = self.take_current() else {
          return Ok(node);
        };
        trace!(lexeme = %op.lexeme, "expression");
        AstNode::create(&op, node, self.expression()?)
      }
      Some(TokenKind::OpSubtract) => {
        let Some(op) = self.take_current() else {
          return Ok(node);
        };
        trace!(lexeme = %op.lexeme, "expression");
        AstNode::create(&op, node, self.term()?)
      }
      _ => Ok(node),
    }
  }

  /// term := factor [ '*' term | '/' factor ]
  fn term(&mut self) -> CompileResult<AstNode> {
    let node = self.factor()?;

    match self.current_kind() {
      Some(TokenKind::OpMultiply) => {
        let Some(op) = self.take_current() else {
          return Ok(node);
        };
        trace!(lexeme = %op.lexeme, "term");
        AstNode::create(&op, node, self.term()?)
      }
      Some(TokenKind::OpDivide) => {
        let Some(op) = self.take_current() else {
          return Ok(node);
        };
        trace!(lexeme = %op.lexeme, "term");
        AstNode::create(&op, node, self.factor()?)
      }
      _ => Ok(node),
    }
  }

  /// factor := '(' statement ')' | INT_LITERAL | IDENTIFIER
  fn factor(&mut self) -> CompileResult<AstNode> {
    let Some(token) = self.current().cloned() else {
      return Err(self.end_of_input());
    };
    trace!(lexeme = %token.lexeme, "factor");

    match token.kind {
      TokenKind::OpenParen => {
        self.consume();
        let node = self.statement()?;
        // The closing paren.
        self.consume();
        Ok(node)
      }
      TokenKind::IntLiteral | TokenKind::Identifier => {
        self.consume();
        Ok(AstNode::leaf(&token))
      }
      _ => Err(CompileError::malformed(
        "expected '(', an integer literal, or an identifier",
        &token.lexeme,
        token.row,
        token.column,
      )),
    }
  }
}
