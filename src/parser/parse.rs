//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and core parsing infrastructure,
//! including the error type, token navigation helpers, and the program entry
//! point.
//!
//! # Parser Architecture
//!
//! The Parser uses a recursive descent approach with the following organization:
//! - This module: Parser struct, helper methods, and top-level items
//! - `declarations`: Variables, arrays, `build` types, `access` instances, functions
//! - `statements`: Assignments, control flow and built-in statements
//! - `expressions`: Expressions by precedence level
//!
//! Parser methods are split across those files using `impl Parser` blocks.
//!
//! # Static checking
//!
//! The parser is also the semantic checker. It keeps an [`Environment`]
//! filled with placeholder values and mirrors the interpreter's scoping:
//! blocks push frames, function bodies only see globals and parameters. The
//! first violation aborts the parse with one positioned [`ParseError`].

use crate::environment::{Binding, EnvError, Environment};
use crate::parser::ast::*;
use crate::parser::token::{Token, TokenKind};
use thiserror::Error;

/// Which of the two parse-time categories an error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    Syntax,
    Semantic,
}

impl ParseErrorKind {
    pub fn category(self) -> &'static str {
        match self {
            ParseErrorKind::Syntax => "Syntax Error",
            ParseErrorKind::Semantic => "Semantic Error",
        }
    }
}

/// Parser error type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}: {} at {}", .kind.category(), .message, .span.start)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    pub span: SourceSpan,
}

impl ParseError {
    pub fn syntax(message: impl Into<String>, span: SourceSpan) -> Self {
        ParseError {
            kind: ParseErrorKind::Syntax,
            message: message.into(),
            span,
        }
    }

    pub fn semantic(message: impl Into<String>, span: SourceSpan) -> Self {
        ParseError {
            kind: ParseErrorKind::Semantic,
            message: message.into(),
            span,
        }
    }

    pub(crate) fn from_env(err: EnvError, span: SourceSpan) -> Self {
        ParseError::semantic(err.to_string(), span)
    }
}

/// Bookkeeping for the function body being parsed
#[derive(Debug, Clone)]
pub(crate) struct FunctionContext {
    pub name: String,
    /// Values yielded by the first `recall` seen, if any
    pub arity: Option<usize>,
}

/// Recursive descent parser and static checker
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) position: usize,
    /// End of the most recently consumed token
    pub(crate) last_end: SourceLocation,
    pub(crate) env: Environment,
    pub(crate) loop_depth: usize,
    pub(crate) function: Option<FunctionContext>,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let end = tokens
                .last()
                .map(|t| t.end)
                .unwrap_or(SourceLocation::new(1, 1));
            tokens.push(Token {
                kind: TokenKind::Eof,
                lexeme: String::new(),
                line: end.line,
                column: end.column,
                end,
            });
        }
        Self {
            tokens,
            position: 0,
            last_end: SourceLocation::new(1, 1),
            env: Environment::new(),
            loop_depth: 0,
            function: None,
        }
    }

    /// Parse the entire program: global items followed by the `play` block
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut program = Program::new();
        let mut seen_play = false;

        self.skip_newlines();
        while !self.is_at_end() {
            if seen_play {
                return Err(ParseError::syntax(
                    format!(
                        "play() must be the last item in the program, found {}",
                        self.peek()
                    ),
                    self.peek().span(),
                ));
            }

            let item = self.parse_top_level_item()?;
            seen_play = matches!(item, Stmt::Play { .. });
            program.items.push(item);
            self.skip_newlines();
        }

        if !seen_play {
            return Err(ParseError::syntax(
                "program has no play() block",
                self.peek().span(),
            ));
        }

        tracing::debug!(items = program.items.len(), "parsed program");
        Ok(program)
    }

    /// One global item
    fn parse_top_level_item(&mut self) -> Result<Stmt, ParseError> {
        match self.peek_kind() {
            TokenKind::Play => self.parse_play(),
            TokenKind::Identifier(_) if self.peek_nth(1).kind == TokenKind::LParen => {
                self.parse_function_definition()
            }
            _ => {
                let stmt = self.parse_statement()?;
                self.end_statement()?;
                Ok(stmt)
            }
        }
    }

    /// `play() { ... }`
    fn parse_play(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current_location();
        self.advance();
        self.expect_token(TokenKind::LParen, "Expected '(' after 'play'")?;
        self.expect_token(TokenKind::RParen, "Expected ')' after 'play('")?;

        self.env.enter_scope("play");
        let body = self.parse_block_body("play block")?;
        self.env.exit_scope(true);

        Ok(Stmt::Play {
            body,
            span: self.span_from(start),
        })
    }

    // ===== Helper methods =====

    /// Index of the first non-space token at or after `from`
    fn skip_space_from(&self, from: usize) -> usize {
        let mut i = from;
        while i + 1 < self.tokens.len() && self.tokens[i].kind == TokenKind::Space {
            i += 1;
        }
        i.min(self.tokens.len() - 1)
    }

    /// Next significant token (newlines are significant)
    pub(crate) fn peek(&self) -> &Token {
        &self.tokens[self.skip_space_from(self.position)]
    }

    pub(crate) fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    /// The `n`-th token ahead, looking past spaces
    pub(crate) fn peek_nth(&self, n: usize) -> &Token {
        let mut i = self.skip_space_from(self.position);
        for _ in 0..n {
            if self.tokens[i].kind == TokenKind::Eof {
                break;
            }
            i = self.skip_space_from(i + 1);
        }
        &self.tokens[i]
    }

    /// Next token kind, looking past spaces and newlines
    pub(crate) fn peek_past_newlines(&self) -> TokenKind {
        self.tokens[self.position..]
            .iter()
            .map(|t| t.kind)
            .find(|k| !k.is_layout())
            .unwrap_or(TokenKind::Eof)
    }

    pub(crate) fn advance(&mut self) -> Token {
        let i = self.skip_space_from(self.position);
        let token = self.tokens[i].clone();
        if token.kind != TokenKind::Eof {
            self.position = i + 1;
            self.last_end = token.end;
        } else {
            self.position = i;
        }
        token
    }

    pub(crate) fn skip_newlines(&mut self) {
        while self.position < self.tokens.len() - 1 && self.tokens[self.position].kind.is_layout()
        {
            self.position += 1;
        }
    }

    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind().same_terminal(kind)
    }

    pub(crate) fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.peek_kind() == TokenKind::Eof
    }

    pub(crate) fn current_location(&self) -> SourceLocation {
        self.peek().location()
    }

    pub(crate) fn span_from(&self, start: SourceLocation) -> SourceSpan {
        SourceSpan::new(start, self.last_end.max(start))
    }

    /// Syntax error pointing at the next token
    pub(crate) fn unexpected(&self, message: &str) -> ParseError {
        let token = self.peek();
        ParseError::syntax(format!("{}, found {}", message, token), token.span())
    }

    pub(crate) fn expect_token(
        &mut self,
        kind: TokenKind,
        message: &str,
    ) -> Result<Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(message))
        }
    }

    pub(crate) fn expect_identifier(
        &mut self,
        context: &str,
    ) -> Result<(String, SourceSpan), ParseError> {
        if self.peek().is_identifier() {
            let token = self.advance();
            Ok((token.lexeme.clone(), token.span()))
        } else {
            Err(self.unexpected(&format!("Expected identifier {}", context)))
        }
    }

    /// A statement ends at a newline, a closing brace, or the end of input
    pub(crate) fn end_statement(&mut self) -> Result<(), ParseError> {
        match self.peek_kind() {
            TokenKind::Newline => {
                self.skip_newlines();
                Ok(())
            }
            TokenKind::RBrace | TokenKind::Eof => Ok(()),
            _ => Err(self.unexpected("Expected end of statement")),
        }
    }

    /// `{ statements }` parsed in the current frame
    pub(crate) fn parse_block_body(&mut self, context: &str) -> Result<Vec<Stmt>, ParseError> {
        self.expect_token(TokenKind::LBrace, &format!("Expected '{{' to open {}", context))?;
        self.skip_newlines();

        let mut statements = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            statements.push(self.parse_statement()?);
            self.end_statement()?;
        }

        self.expect_token(TokenKind::RBrace, &format!("Expected '}}' to close {}", context))?;
        Ok(statements)
    }

    /// `{ statements }` in a fresh frame
    pub(crate) fn parse_scoped_block(&mut self, context: &str) -> Result<Vec<Stmt>, ParseError> {
        self.env.enter_scope(context);
        let body = self.parse_block_body(context);
        self.env.exit_scope(true);
        body
    }

    /// Look a name up, turning a miss into a use-before-declare error
    pub(crate) fn lookup(&self, name: &str, span: SourceSpan) -> Result<&Binding, ParseError> {
        self.env
            .lookup(name)
            .map_err(|err| ParseError::from_env(err, span))
    }

    /// Whether the visible binding for `name` lives in the global frame
    pub(crate) fn is_global_binding(&self, name: &str) -> bool {
        self.env
            .frames()
            .iter()
            .rposition(|frame| frame.contains(name))
            == Some(0)
    }

    pub(crate) fn declare(
        &mut self,
        name: &str,
        binding: Binding,
        span: SourceSpan,
    ) -> Result<(), ParseError> {
        self.env
            .declare(name, binding)
            .map_err(|err| ParseError::from_env(err, span))
    }

    /// Reject statements that are not allowed outside function bodies
    pub(crate) fn reject_at_global(&self, what: &str, span: SourceSpan) -> Result<(), ParseError> {
        if self.env.is_global_scope() {
            Err(ParseError::semantic(
                format!("{} is not allowed at global scope", what),
                span,
            ))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lexer::tokenize;

    fn parse(source: &str) -> Result<Program, ParseError> {
        let out = tokenize(source);
        assert!(out.is_clean(), "lexer diagnostics: {:?}", out.diagnostics);
        Parser::new(out.tokens).parse_program()
    }

    #[test]
    fn test_parse_minimal_program() {
        let program = parse("play() {\n}\n").unwrap();
        assert_eq!(program.items.len(), 1);
        assert!(matches!(program.items[0], Stmt::Play { .. }));
    }

    #[test]
    fn test_missing_play_is_an_error() {
        let err = parse("hp x: 1\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::Syntax);
        assert!(err.message.contains("play"));
    }

    #[test]
    fn test_play_must_be_last() {
        let err = parse("play() {\n}\nhp x: 1\n").unwrap_err();
        assert!(err.message.contains("last item"), "{}", err.message);
    }

    #[test]
    fn test_globals_then_play() {
        let program = parse("hp lives: 3\nxp speed: 1.5\nplay() {\n\tshootNxt(lives)\n}").unwrap();
        assert_eq!(program.items.len(), 3);
    }

    #[test]
    fn test_output_is_rejected_at_global_scope() {
        let err = parse("shoot(1)\nplay() {\n}").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::Semantic);
        assert!(err.message.contains("global scope"));
    }

    #[test]
    fn test_error_display_names_category_and_location() {
        let err = parse("play() {\n\tshoot(y)\n}").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Semantic Error: 'y' is not declared at line 2, column 11"
        );
    }
}
