//! Respawn source parser
//!
//! This module turns `.rsp` source text into a checked Abstract Syntax Tree:
//! - [`lexer`]: Tokenization (source text → tokens), including delimiter checks
//! - [`parse`]: The [`Parser`] and its helpers; statement, declaration and
//!   expression rules are split across sibling files
//! - [`semantics`]: Static types and the typing rules the parser enforces
//! - [`ast`]: AST node definitions
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent parser, one method per precedence level.
//! Parsing and semantic checking happen in the same pass: the parser keeps
//! its own environment and stops at the first error.

pub mod ast;
pub mod declarations;
pub mod delimiters;
pub mod expressions;
pub mod lexer;
pub mod parse;
pub mod semantics;
pub mod statements;
pub mod token;

pub use lexer::{tokenize, LexError, LexOutput};
pub use parse::{ParseError, ParseErrorKind, Parser};
pub use token::{Token, TokenKind};

use ast::Program;

/// Parse and statically check a token stream
pub fn parse_and_check(tokens: Vec<Token>) -> Result<Program, ParseError> {
    Parser::new(tokens).parse_program()
}
