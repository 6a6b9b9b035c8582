//! Lexical analysis: a character-driven finite-state machine that turns the
//! source buffer into a flat token stream plus a statement count.
//!
//! The lexer makes exactly one left-to-right pass. Each incoming character
//! is classified independently of the current state; the (state, class)
//! pair then decides whether the pending lexeme is flushed, extended, or
//! restarted. Classification of the finished lexeme into a `TokenKind`
//! happens only at flush time, which is what lets a digit-then-letter run
//! such as `12ab` mutate from an in-progress number into an identifier
//! candidate before anything is committed.

use std::mem;

use tracing::{debug, trace};

/// Longest lexeme the accumulator will hold, in bytes.
pub const MAX_LEXEME_LEN: usize = 255;

/// Substituted for any lexeme that outgrew `MAX_LEXEME_LEN`.
pub const LEXEME_OVERFLOW_SENTINEL: &str = "MAX_LEXEME_SIZE_EXCEEDED";

/// Kinds of tokens recognised by the front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
  Unknown,
  Identifier,
  IntLiteral,
  OpenParen,
  CloseParen,
  OpAssign,
  OpAdd,
  OpSubtract,
  OpMultiply,
  OpDivide,
  Delim,
}

impl TokenKind {
  /// Stable uppercase descriptor used by the token dump.
  pub fn descriptor(self) -> &'static str {
    match self {
      TokenKind::Unknown => "UNKNOWN",
      TokenKind::Identifier => "IDENTIFIER",
      TokenKind::IntLiteral => "INT_LITERAL",
      TokenKind::OpenParen => "OPEN_PAREN",
      TokenKind::CloseParen => "CLOSE_PAREN",
      TokenKind::OpAssign => "OP_ASSIGNMENT",
      TokenKind::OpAdd => "OP_ADD",
      TokenKind::OpSubtract => "OP_SUBTRACT",
      TokenKind::OpMultiply => "OP_MULTIPLY",
      TokenKind::OpDivide => "OP_DIVIDE",
      TokenKind::Delim => "DELIM",
    }
  }
}

/// Classified lexeme plus its source position. Immutable once flushed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
  pub kind: TokenKind,
  pub lexeme: String,
  pub row: u32,
  pub column: u32,
}

/// Ordered token sequence plus the statement count observed while lexing.
#[derive(Debug, Default)]
pub struct TokenStream {
  tokens: Vec<Token>,
  num_statements: u32,
}

impl TokenStream {
  pub fn tokens(&self) -> &[Token] {
    &self.tokens
  }

  pub fn get(&self, index: usize) -> Option<&Token> {
    self.tokens.get(index)
  }

  pub fn len(&self) -> usize {
    self.tokens.len()
  }

  pub fn is_empty(&self) -> bool {
    self.tokens.is_empty()
  }

  /// Number of delimiter events seen by the lexer; the parser builds
  /// exactly this many trees.
  pub fn num_statements(&self) -> u32 {
    self.num_statements
  }
}

/// FSM states. `AwaitWhitespace` and `AwaitDelim` behave exactly like
/// `Start`; they are kept distinct because the transition into `AwaitDelim`
/// is the statement-count event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexState {
  Start,
  AwaitWhitespace,
  AwaitDelim,
  ScanIdentifier,
  ScanNumber,
  ScanOperator,
  ScanControl,
}

/// Character classes, decided by the character alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
  Whitespace,
  Delim,
  Alpha,
  Digit,
  Operator,
  Control,
  /// Symbol characters with no token kind of their own. They terminate the
  /// pending lexeme like control characters and never coalesce.
  StrayPunct,
  /// Everything else accumulates into whatever lexeme is open.
  Unclassified,
}

fn classify(c: char) -> CharClass {
  match c {
    ' ' | '\t' | '\n' | '\r' | '\x0b' | '\x0c' => CharClass::Whitespace,
    ';' => CharClass::Delim,
    '_' => CharClass::Alpha,
    '+' | '-' | '*' | '/' | '=' => CharClass::Operator,
    '(' | ')' => CharClass::Control,
    '#' | '$' | '%' | '&' | '^' | '!' | '~' | '|' | '\\' | '`' | '<' | '>' | '[' | ']' | '{'
    | '}' => CharClass::StrayPunct,
    c if c.is_ascii_alphabetic() => CharClass::Alpha,
    c if c.is_ascii_digit() => CharClass::Digit,
    _ => CharClass::Unclassified,
  }
}

/// Bounded lexeme accumulator. Once an append would cross
/// `MAX_LEXEME_LEN` bytes the buffer stops accepting characters and marks
/// itself overflowed; the flush then substitutes the sentinel.
#[derive(Debug, Default)]
struct LexemeBuffer {
  text: String,
  overflowed: bool,
}

impl LexemeBuffer {
  fn is_empty(&self) -> bool {
    self.text.is_empty()
  }

  fn push(&mut self, c: char) {
    if self.text.len() + c.len_utf8() > MAX_LEXEME_LEN {
      self.overflowed = true;
      return;
    }
    self.text.push(c);
  }

  fn take(&mut self) -> (String, bool) {
    let overflowed = self.overflowed;
    self.overflowed = false;
    (mem::take(&mut self.text), overflowed)
  }
}

/// The lexer context. `run` resets all counters first, so one instance can
/// process any number of compilation units back to back.
#[derive(Debug)]
pub struct Lexer {
  state: LexState,
  row: u32,
  column: u32,
  lexeme: LexemeBuffer,
  tokens: Vec<Token>,
  num_statements: u32,
}

impl Default for Lexer {
  fn default() -> Self {
    Self::new()
  }
}

impl Lexer {
  pub fn new() -> Self {
    Self {
      state: LexState::Start,
      row: 0,
      column: 0,
      lexeme: LexemeBuffer::default(),
      tokens: Vec::new(),
      num_statements: 0,
    }
  }

  /// Consume the whole source once and produce the token stream.
  pub fn run(&mut self, source: &str) -> TokenStream {
    self.restore_defaults();

    for c in source.chars() {
      self.step(c);
    }

    // End of input flushes whatever is pending.
    self.flush();

    debug!(
      tokens = self.tokens.len(),
      statements = self.num_statements,
      "lexing finished"
    );

    TokenStream {
      tokens: mem::take(&mut self.tokens),
      num_statements: self.num_statements,
    }
  }

  fn restore_defaults(&mut self) {
    self.state = LexState::Start;
    self.row = 0;
    self.column = 0;
    self.lexeme = LexemeBuffer::default();
    self.tokens.clear();
    self.num_statements = 0;
  }

  /// Feed one character through the state machine.
  fn step(&mut self, c: char) {
    self.column += 1;

    trace!(
      ch = %printable(c),
      state = ?self.state,
      row = self.row,
      column = self.column,
      "fsm step"
    );

    match classify(c) {
      CharClass::Whitespace => {
        self.flush();
        if c == '\n' {
          self.row += 1;
          self.column = 0;
        }
        self.go_to(LexState::AwaitWhitespace);
      }
      CharClass::Delim => {
        self.flush();
        self.lexeme.push(c);
        self.go_to(LexState::AwaitDelim);
        self.flush();
      }
      CharClass::Alpha => match self.state {
        LexState::ScanIdentifier => self.lexeme.push(c),
        // A letter turns an in-progress number into an identifier
        // candidate; the digits already scanned stay in the lexeme.
        LexState::ScanNumber => {
          self.lexeme.push(c);
          self.go_to(LexState::ScanIdentifier);
        }
        _ => {
          self.flush();
          self.lexeme.push(c);
          self.go_to(LexState::ScanIdentifier);
        }
      },
      CharClass::Digit => match self.state {
        LexState::ScanIdentifier | LexState::ScanNumber => self.lexeme.push(c),
        _ => {
          self.flush();
          self.lexeme.push(c);
          self.go_to(LexState::ScanNumber);
        }
      },
      // Operators flush unconditionally, so a second consecutive operator
      // character starts its own lexeme and multi-character operators
      // never form.
      CharClass::Operator => {
        self.flush();
        self.lexeme.push(c);
        self.go_to(LexState::ScanOperator);
      }
      CharClass::Control | CharClass::StrayPunct => {
        self.flush();
        self.lexeme.push(c);
        self.go_to(LexState::ScanControl);
      }
      CharClass::Unclassified => self.lexeme.push(c),
    }
  }

  fn go_to(&mut self, state: LexState) {
    if state == LexState::AwaitDelim {
      self.num_statements += 1;
    }
    self.state = state;
  }

  /// Close the pending lexeme, classify it, and append the token.
  fn flush(&mut self) {
    if self.lexeme.is_empty() {
      return;
    }

    let (text, overflowed) = self.lexeme.take();
    let (kind, lexeme) = if overflowed {
      (TokenKind::Unknown, LEXEME_OVERFLOW_SENTINEL.to_string())
    } else {
      (classify_lexeme(&text), text)
    };

    debug!(lexeme = %lexeme, kind = kind.descriptor(), "token");

    self.tokens.push(Token {
      kind,
      lexeme,
      row: self.row,
      column: self.column,
    });
  }
}

/// Lexeme classification, applied only at flush time.
fn classify_lexeme(text: &str) -> TokenKind {
  let mut chars = text.chars();
  match (chars.next(), chars.next()) {
    (Some(c), None) => match c {
      '0'..='9' => TokenKind::IntLiteral,
      'a'..='z' | 'A'..='Z' | '_' => TokenKind::Identifier,
      '(' => TokenKind::OpenParen,
      ')' => TokenKind::CloseParen,
      '=' => TokenKind::OpAssign,
      '+' => TokenKind::OpAdd,
      '-' => TokenKind::OpSubtract,
      '*' => TokenKind::OpMultiply,
      '/' => TokenKind::OpDivide,
      ';' => TokenKind::Delim,
      _ => TokenKind::Unknown,
    },
    _ => {
      if text.chars().all(|c| c.is_ascii_digit()) {
        TokenKind::IntLiteral
      } else if text.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        TokenKind::Identifier
      } else {
        // A multi-character lexeme with a leading digit (or stray leading
        // punctuation) is not an identifier.
        TokenKind::Unknown
      }
    }
  }
}

/// Render whitespace characters readably in trace output.
fn printable(c: char) -> String {
  match c {
    '\n' => "\\n".to_string(),
    '\t' => "\\t".to_string(),
    c => c.to_string(),
  }
}

/// Lex a whole source buffer with a throwaway context.
pub fn tokenize(source: &str) -> TokenStream {
  Lexer::new().run(source)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn kinds(source: &str) -> Vec<TokenKind> {
    tokenize(source).tokens().iter().map(|t| t.kind).collect()
  }

  fn lexemes(source: &str) -> Vec<String> {
    tokenize(source)
      .tokens()
      .iter()
      .map(|t| t.lexeme.clone())
      .collect()
  }

  #[test]
  fn empty_source_yields_nothing() {
    let stream = tokenize("");
    assert!(stream.is_empty());
    assert_eq!(stream.num_statements(), 0);
  }

  #[test]
  fn whitespace_only_yields_nothing() {
    let stream = tokenize("  \t\n \r ");
    assert!(stream.is_empty());
    assert_eq!(stream.num_statements(), 0);
  }

  #[test]
  fn two_plus_two() {
    let stream = tokenize("2 + 2;");
    assert_eq!(
      stream.tokens().iter().map(|t| t.kind).collect::<Vec<_>>(),
      vec![
        TokenKind::IntLiteral,
        TokenKind::OpAdd,
        TokenKind::IntLiteral,
        TokenKind::Delim
      ]
    );
    assert_eq!(stream.num_statements(), 1);
  }

  #[test]
  fn two_statements_over_two_lines() {
    let stream = tokenize("2 + 2;\n3 * 3;");
    assert_eq!(stream.len(), 8);
    assert_eq!(stream.num_statements(), 2);
    assert_eq!(
      stream.tokens()[4..]
        .iter()
        .map(|t| t.kind)
        .collect::<Vec<_>>(),
      vec![
        TokenKind::IntLiteral,
        TokenKind::OpMultiply,
        TokenKind::IntLiteral,
        TokenKind::Delim
      ]
    );
    for token in &stream.tokens()[4..] {
      assert_eq!(token.row, 1);
    }
  }

  #[test]
  fn every_delimiter_counts_one_statement() {
    let stream = tokenize(";;;1 + 1;;;");
    assert_eq!(stream.num_statements(), 6);
    assert_eq!(stream.len(), 9);
    let delims = stream
      .tokens()
      .iter()
      .filter(|t| t.kind == TokenKind::Delim)
      .count();
    assert_eq!(delims, 6);
  }

  #[test]
  fn leading_digit_disqualifies_identifier() {
    assert_eq!(kinds("123abc;"), vec![TokenKind::Unknown, TokenKind::Delim]);
    assert_eq!(lexemes("123abc;")[0], "123abc");
  }

  #[test]
  fn trailing_digits_keep_identifier() {
    assert_eq!(
      kinds("abc123;"),
      vec![TokenKind::Identifier, TokenKind::Delim]
    );
  }

  #[test]
  fn underscores_make_identifiers() {
    assert_eq!(
      kinds("_abcd_;"),
      vec![TokenKind::Identifier, TokenKind::Delim]
    );
  }

  #[test]
  fn single_letter_is_identifier() {
    assert_eq!(kinds("a;"), vec![TokenKind::Identifier, TokenKind::Delim]);
  }

  #[test]
  fn stray_punctuation_splits_rather_than_blobs() {
    assert_eq!(lexemes("a?@#$^;"), vec!["a?@", "#", "$", "^", ";"]);
    assert_eq!(
      kinds("a?@#$^;"),
      vec![
        TokenKind::Identifier,
        TokenKind::Unknown,
        TokenKind::Unknown,
        TokenKind::Unknown,
        TokenKind::Delim
      ]
    );
  }

  #[test]
  fn operators_never_coalesce() {
    assert_eq!(lexemes("1+-2;"), vec!["1", "+", "-", "2", ";"]);
    assert_eq!(
      kinds("1+-2;"),
      vec![
        TokenKind::IntLiteral,
        TokenKind::OpAdd,
        TokenKind::OpSubtract,
        TokenKind::IntLiteral,
        TokenKind::Delim
      ]
    );
    // Two `=` in a row are two assignment tokens, not one operator.
    assert_eq!(
      kinds("a == b;"),
      vec![
        TokenKind::Identifier,
        TokenKind::OpAssign,
        TokenKind::OpAssign,
        TokenKind::Identifier,
        TokenKind::Delim
      ]
    );
  }

  #[test]
  fn parens_are_single_tokens() {
    assert_eq!(
      kinds("((x));"),
      vec![
        TokenKind::OpenParen,
        TokenKind::OpenParen,
        TokenKind::Identifier,
        TokenKind::CloseParen,
        TokenKind::CloseParen,
        TokenKind::Delim
      ]
    );
  }

  #[test]
  fn lexeme_at_bound_round_trips() {
    let name = "a".repeat(MAX_LEXEME_LEN);
    let source = format!("{name};");
    let stream = tokenize(&source);
    assert_eq!(stream.tokens()[0].kind, TokenKind::Identifier);
    assert_eq!(stream.tokens()[0].lexeme, name);
  }

  #[test]
  fn lexeme_over_bound_becomes_sentinel() {
    let name = "a".repeat(MAX_LEXEME_LEN + 1);
    let source = format!("{name};");
    let stream = tokenize(&source);
    assert_eq!(stream.tokens()[0].kind, TokenKind::Unknown);
    assert_eq!(stream.tokens()[0].lexeme, LEXEME_OVERFLOW_SENTINEL);
  }

  #[test]
  fn rows_and_columns_track_consumed_characters() {
    let stream = tokenize("ab c\nd;");
    let positions: Vec<(u32, u32)> = stream.tokens().iter().map(|t| (t.row, t.column)).collect();
    assert_eq!(positions, vec![(0, 3), (0, 5), (1, 2), (1, 2)]);
  }

  #[test]
  fn lexer_context_is_reusable() {
    let mut lexer = Lexer::new();
    let first = lexer.run("a + b;");
    assert_eq!(first.len(), 4);
    assert_eq!(first.num_statements(), 1);
    let second = lexer.run("1;");
    assert_eq!(second.len(), 2);
    assert_eq!(second.num_statements(), 1);
    assert_eq!(second.tokens()[0].row, 0);
  }
}
