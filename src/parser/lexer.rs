//! Lexer (tokenizer) for Respawn source code
//!
//! Converts raw source text into a flat [`Token`] stream consumed by the
//! parser. Unlike the parser, the lexer never stops at the first problem:
//! every malformed literal, illegal character or delimiter violation becomes
//! a [`LexError`] in the returned diagnostics list and scanning resumes.
//!
//! Layout is kept: runs of spaces/tabs become one `Space` token and runs of
//! line breaks become one `Newline` token. Comments (`# ...` and
//! ```` ``` ... ``` ````) are dropped.

use super::ast::SourceLocation;
use super::delimiters::delimiters_for;
use super::token::{IdentifierTable, Token, TokenKind};
use thiserror::Error;

/// Longest identifier accepted
pub const MAX_IDENTIFIER_LEN: usize = 30;
/// Significant digits allowed before the decimal point
pub const MAX_INTEGER_DIGITS: usize = 10;
/// Significant digits allowed after the decimal point
pub const MAX_FRACTION_DIGITS: usize = 7;
/// Tab stops every this many columns
pub const TAB_WIDTH: usize = 4;

/// Lexical diagnostics. None of these stop the scan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("Lexical Error: illegal character '{ch}' at {location}")]
    IllegalCharacter { ch: char, location: SourceLocation },

    #[error(
        "Lexical Error: identifier '{name}' exceeds {MAX_IDENTIFIER_LEN} characters at {location}"
    )]
    IdentifierTooLong {
        name: String,
        location: SourceLocation,
    },

    #[error(
        "Lexical Error: integer part of '{literal}' exceeds {MAX_INTEGER_DIGITS} digits at {location}"
    )]
    IntegerTooLong {
        literal: String,
        location: SourceLocation,
    },

    #[error(
        "Lexical Error: fractional part of '{literal}' exceeds {MAX_FRACTION_DIGITS} digits at {location}"
    )]
    FractionTooLong {
        literal: String,
        location: SourceLocation,
    },

    #[error("Lexical Error: '{literal}' has no digits after its decimal point at {location}")]
    TrailingDecimalPoint {
        literal: String,
        location: SourceLocation,
    },

    #[error(
        "Lexical Error: format suffix '{literal}' asks for more than {MAX_FRACTION_DIGITS} decimal places at {location}"
    )]
    FormatTooWide {
        literal: String,
        location: SourceLocation,
    },

    #[error("Lexical Error: unterminated comms literal at {location}")]
    UnterminatedString { location: SourceLocation },

    #[error("Lexical Error: unknown escape sequence '\\{escape}' at {location}")]
    InvalidEscape {
        escape: char,
        location: SourceLocation,
    },

    #[error("Lexical Error: unterminated block comment at {location}")]
    UnterminatedComment { location: SourceLocation },

    #[error(
        "Delimiter Error: {found} cannot follow {after}; expected one of: {expected} at {location}"
    )]
    IllegalDelimiter {
        found: String,
        after: String,
        expected: String,
        location: SourceLocation,
    },
}

impl LexError {
    pub fn location(&self) -> SourceLocation {
        match self {
            LexError::IllegalCharacter { location, .. }
            | LexError::IdentifierTooLong { location, .. }
            | LexError::IntegerTooLong { location, .. }
            | LexError::FractionTooLong { location, .. }
            | LexError::TrailingDecimalPoint { location, .. }
            | LexError::FormatTooWide { location, .. }
            | LexError::UnterminatedString { location }
            | LexError::InvalidEscape { location, .. }
            | LexError::UnterminatedComment { location }
            | LexError::IllegalDelimiter { location, .. } => *location,
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            LexError::IllegalDelimiter { .. } => "Delimiter Error",
            _ => "Lexical Error",
        }
    }
}

/// Everything one scan produces
#[derive(Debug, Clone, Default)]
pub struct LexOutput {
    pub tokens: Vec<Token>,
    pub diagnostics: Vec<LexError>,
    pub identifiers: IdentifierTable,
}

impl LexOutput {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Tokenize `source` in one call
pub fn tokenize(source: &str) -> LexOutput {
    Lexer::new(source).tokenize()
}

/// Decode the escapes of a comms lexeme (quotes included).
///
/// The lexer has already rejected unknown escapes, so anything unexpected is
/// passed through verbatim.
pub fn decode_comms(lexeme: &str) -> String {
    let inner = lexeme
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(lexeme);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Lexer for Respawn source code
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    tokens: Vec<Token>,
    diagnostics: Vec<LexError>,
    identifiers: IdentifierTable,
}

impl Lexer {
    /// Create a new lexer for the given source string.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            tokens: Vec::new(),
            diagnostics: Vec::new(),
            identifiers: IdentifierTable::new(),
        }
    }

    /// Tokenize the entire input
    pub fn tokenize(mut self) -> LexOutput {
        while !self.is_at_end() {
            self.scan_token();
        }

        let loc = self.current_location();
        self.tokens.push(Token {
            kind: TokenKind::Eof,
            lexeme: String::new(),
            line: loc.line,
            column: loc.column,
            end: loc,
        });

        tracing::debug!(
            tokens = self.tokens.len(),
            diagnostics = self.diagnostics.len(),
            "lexing finished"
        );

        LexOutput {
            tokens: self.tokens,
            diagnostics: self.diagnostics,
            identifiers: self.identifiers,
        }
    }

    /// Scan one token (or skip one comment / bad character)
    fn scan_token(&mut self) {
        let start = self.position;
        let loc = self.current_location();
        let Some(ch) = self.peek() else {
            return;
        };

        let kind = match ch {
            ' ' | '\t' | '\r' if !self.at_crlf() => {
                while matches!(self.peek(), Some(' ' | '\t')) || (self.peek() == Some('\r') && !self.at_crlf()) {
                    self.advance();
                }
                Some(TokenKind::Space)
            }
            '\n' | '\r' => {
                while matches!(self.peek(), Some('\n')) || self.at_crlf() {
                    self.advance();
                }
                Some(TokenKind::Newline)
            }
            '#' => {
                self.skip_line_comment();
                None
            }
            '`' => {
                if self.peek_ahead(1) == Some('`') && self.peek_ahead(2) == Some('`') {
                    self.skip_block_comment();
                } else {
                    self.advance();
                    self.diagnostics
                        .push(LexError::IllegalCharacter { ch, location: loc });
                }
                None
            }
            '"' => self.comms_literal(loc),
            '0'..='9' => self.number_literal(start, loc),
            'a'..='z' | 'A'..='Z' | '_' => self.identifier_or_keyword(loc),
            '-' => self.minus(loc),
            '.' => self.dot(loc),
            _ => self.operator(ch, loc),
        };

        if let Some(kind) = kind {
            self.push_token(kind, start, loc);
        }
    }

    fn push_token(&mut self, kind: TokenKind, start: usize, loc: SourceLocation) {
        let lexeme: String = self.input[start..self.position].iter().collect();
        let token = Token {
            kind,
            lexeme,
            line: loc.line,
            column: loc.column,
            end: self.current_location(),
        };
        self.tokens.push(token);
        self.check_delimiter(kind);
    }

    /// Validate the character right after a token; skip it on violation
    fn check_delimiter(&mut self, kind: TokenKind) {
        let Some(set) = delimiters_for(kind) else {
            return;
        };
        let Some(next) = self.peek() else {
            return;
        };
        if set.allows(next) {
            return;
        }

        let after = self
            .tokens
            .last()
            .map(|t| format!("'{}'", t.lexeme))
            .unwrap_or_else(|| kind.to_string());
        let found = match next {
            '\n' => "newline".to_string(),
            '\t' => "tab".to_string(),
            ' ' => "whitespace".to_string(),
            c => format!("'{}'", c),
        };
        self.diagnostics.push(LexError::IllegalDelimiter {
            found,
            after,
            expected: set.describe(),
            location: self.current_location(),
        });
        self.advance();
    }

    /// `"..."` with `\n`, `\t`, `\"` and `\\` escapes
    fn comms_literal(&mut self, loc: SourceLocation) -> Option<TokenKind> {
        self.advance(); // opening quote

        loop {
            match self.peek() {
                None | Some('\n') => {
                    self.diagnostics
                        .push(LexError::UnterminatedString { location: loc });
                    return None;
                }
                Some('"') => {
                    self.advance();
                    return Some(TokenKind::CommsLiteral);
                }
                Some('\\') => {
                    let escape_loc = self.current_location();
                    self.advance();
                    match self.peek() {
                        Some('n' | 't' | '"' | '\\') => {
                            self.advance();
                        }
                        None | Some('\n') => {}
                        Some(other) => {
                            self.advance();
                            self.diagnostics.push(LexError::InvalidEscape {
                                escape: other,
                                location: escape_loc,
                            });
                        }
                    }
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    /// Integer or decimal literal; the sign (if any) was consumed by the caller
    fn number_literal(&mut self, literal_start: usize, loc: SourceLocation) -> Option<TokenKind> {
        // Leading zeros are not significant
        let mut integer_digits = 0;
        while let Some(ch) = self.peek() {
            if !ch.is_ascii_digit() {
                break;
            }
            if ch != '0' || integer_digits > 0 {
                integer_digits += 1;
            }
            self.advance();
        }

        let mut is_decimal = false;
        let mut fraction_digits = 0;
        if self.peek() == Some('.') {
            if !self.peek_ahead(1).is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
                let literal = self.text_from(literal_start);
                self.diagnostics
                    .push(LexError::TrailingDecimalPoint { literal, location: loc });
                return None;
            }
            self.advance();
            is_decimal = true;

            // Zeros only count once a non-zero digit follows them
            let mut pending_zeros = 0;
            while let Some(ch) = self.peek() {
                if !ch.is_ascii_digit() {
                    break;
                }
                if ch == '0' {
                    pending_zeros += 1;
                } else {
                    fraction_digits += pending_zeros + 1;
                    pending_zeros = 0;
                }
                self.advance();
            }
        }

        if integer_digits > MAX_INTEGER_DIGITS {
            let literal = self.text_from(literal_start);
            self.diagnostics
                .push(LexError::IntegerTooLong { literal, location: loc });
            return None;
        }
        if fraction_digits > MAX_FRACTION_DIGITS {
            let literal = self.text_from(literal_start);
            self.diagnostics
                .push(LexError::FractionTooLong { literal, location: loc });
            return None;
        }

        Some(if is_decimal {
            TokenKind::XpLiteral
        } else {
            TokenKind::HpLiteral
        })
    }

    /// Parse identifier or keyword
    fn identifier_or_keyword(&mut self, loc: SourceLocation) -> Option<TokenKind> {
        let start = self.position;
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                self.advance();
            } else {
                break;
            }
        }

        let word = self.text_from(start);
        if let Some(keyword) = TokenKind::keyword(&word) {
            return Some(keyword);
        }

        if word.chars().count() > MAX_IDENTIFIER_LEN {
            self.diagnostics.push(LexError::IdentifierTooLong {
                name: word,
                location: loc,
            });
            return None;
        }

        Some(TokenKind::Identifier(self.identifiers.intern(&word)))
    }

    /// `-` is subtraction after an operand, otherwise a signed literal or negation
    fn minus(&mut self, loc: SourceLocation) -> Option<TokenKind> {
        let after_operand = self
            .previous_non_space()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_' || c == ')' || c == ']');

        if after_operand {
            self.advance();
            if self.peek() == Some('=') {
                self.advance();
                return Some(TokenKind::MinusEq);
            }
            return Some(TokenKind::Minus);
        }

        let starts_number = match self.peek_ahead(1) {
            Some(c) if c.is_ascii_digit() => true,
            Some('.') => self.peek_ahead(2).is_some_and(|c| c.is_ascii_digit()),
            _ => false,
        };

        let start = self.position;
        self.advance();
        if starts_number {
            if self.peek() == Some('.') {
                return self.leading_dot_literal(start, loc);
            }
            return self.number_literal(start, loc);
        }
        Some(TokenKind::Neg)
    }

    /// `.` is a format suffix after an operand, a literal like `.5`, or a dot
    fn dot(&mut self, loc: SourceLocation) -> Option<TokenKind> {
        let previous = if self.position > 0 {
            Some(self.input[self.position - 1])
        } else {
            None
        };
        let after_operand =
            previous.is_some_and(|c| c.is_ascii_alphanumeric() || c == '_' || c == ')' || c == ']');

        if after_operand {
            if let Some(len) = self.format_suffix_len() {
                let suffix_start = self.position;
                for _ in 0..len {
                    self.advance();
                }
                let literal = self.text_from(suffix_start);
                let places = literal[1..literal.len() - 1].trim_start_matches('0');
                if places.len() > 1 || places.parse::<usize>().unwrap_or(0) > MAX_FRACTION_DIGITS {
                    self.diagnostics
                        .push(LexError::FormatTooWide { literal, location: loc });
                    return None;
                }
                return Some(TokenKind::Format);
            }
            self.advance();
            return Some(TokenKind::Dot);
        }

        if self.peek_ahead(1).is_some_and(|c| c.is_ascii_digit()) {
            return self.leading_dot_literal(self.position, loc);
        }

        self.advance();
        Some(TokenKind::Dot)
    }

    /// `.5` or `-.5`: an xp literal with an empty integer part
    fn leading_dot_literal(&mut self, literal_start: usize, loc: SourceLocation) -> Option<TokenKind> {
        self.advance(); // '.'

        let mut fraction_digits = 0;
        let mut pending_zeros = 0;
        while let Some(ch) = self.peek() {
            if !ch.is_ascii_digit() {
                break;
            }
            if ch == '0' {
                pending_zeros += 1;
            } else {
                fraction_digits += pending_zeros + 1;
                pending_zeros = 0;
            }
            self.advance();
        }

        if fraction_digits > MAX_FRACTION_DIGITS {
            let literal = self.text_from(literal_start);
            self.diagnostics
                .push(LexError::FractionTooLong { literal, location: loc });
            return None;
        }
        Some(TokenKind::XpLiteral)
    }

    /// Length of a `.Nf` suffix starting at the current `.`, if there is one
    fn format_suffix_len(&self) -> Option<usize> {
        let mut offset = 1;
        while self.peek_ahead(offset).is_some_and(|c| c.is_ascii_digit()) {
            offset += 1;
        }
        if offset == 1 || self.peek_ahead(offset) != Some('f') {
            return None;
        }
        let after = self.peek_ahead(offset + 1);
        if after.is_some_and(|c| c.is_ascii_alphanumeric() || c == '_') {
            return None;
        }
        Some(offset + 1)
    }

    /// Operators and punctuation
    fn operator(&mut self, ch: char, loc: SourceLocation) -> Option<TokenKind> {
        self.advance();
        let with_eq = |lexer: &mut Self, eq: TokenKind, plain: TokenKind| {
            if lexer.peek() == Some('=') {
                lexer.advance();
                eq
            } else {
                plain
            }
        };

        let kind = match ch {
            '+' => with_eq(self, TokenKind::PlusEq, TokenKind::Plus),
            '*' => with_eq(self, TokenKind::StarEq, TokenKind::Star),
            '/' => with_eq(self, TokenKind::SlashEq, TokenKind::Slash),
            '%' => with_eq(self, TokenKind::PercentEq, TokenKind::Percent),
            '<' => with_eq(self, TokenKind::Le, TokenKind::Lt),
            '>' => with_eq(self, TokenKind::Ge, TokenKind::Gt),
            '!' => with_eq(self, TokenKind::NotEq, TokenKind::Bang),
            '=' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::EqEq
                } else {
                    self.diagnostics
                        .push(LexError::IllegalCharacter { ch, location: loc });
                    return None;
                }
            }
            '^' => TokenKind::Caret,
            ':' => TokenKind::Colon,
            ',' => TokenKind::Comma,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            _ => {
                self.diagnostics
                    .push(LexError::IllegalCharacter { ch, location: loc });
                return None;
            }
        };
        Some(kind)
    }

    /// Skip single-line comment (# ...), leaving the line break in place
    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
    }

    /// Skip block comment (``` ... ```)
    fn skip_block_comment(&mut self) {
        let start_loc = self.current_location();
        for _ in 0..3 {
            self.advance();
        }

        while !self.is_at_end() {
            if self.peek() == Some('`')
                && self.peek_ahead(1) == Some('`')
                && self.peek_ahead(2) == Some('`')
            {
                for _ in 0..3 {
                    self.advance();
                }
                return;
            }
            self.advance();
        }

        self.diagnostics
            .push(LexError::UnterminatedComment { location: start_loc });
    }

    /// Last character before the current one that is not a space or tab
    fn previous_non_space(&self) -> Option<char> {
        self.input[..self.position]
            .iter()
            .rev()
            .find(|c| !matches!(c, ' ' | '\t'))
            .copied()
    }

    fn text_from(&self, start: usize) -> String {
        self.input[start..self.position].iter().collect()
    }

    fn at_crlf(&self) -> bool {
        self.peek() == Some('\r') && self.peek_ahead(1) == Some('\n')
    }

    /// Peek at current character without consuming
    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    /// Peek ahead n characters
    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }

    /// Advance to next character, keeping line/column in step
    fn advance(&mut self) -> Option<char> {
        let ch = *self.input.get(self.position)?;
        self.position += 1;

        match ch {
            '\n' => {
                self.line += 1;
                self.column = 1;
            }
            '\t' => {
                self.column = ((self.column - 1) / TAB_WIDTH + 1) * TAB_WIDTH + 1;
            }
            _ => self.column += 1,
        }

        Some(ch)
    }

    /// Check if at end of input
    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    /// Get current source location
    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::token::tokens_to_source;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .tokens
            .into_iter()
            .map(|t| t.kind)
            .filter(|k| !k.is_layout() && *k != TokenKind::Eof)
            .collect()
    }

    fn lexemes(source: &str) -> Vec<String> {
        tokenize(source)
            .tokens
            .into_iter()
            .filter(|t| !t.kind.is_layout() && t.kind != TokenKind::Eof)
            .map(|t| t.lexeme)
            .collect()
    }

    #[test]
    fn test_simple_declaration() {
        let out = tokenize("hp x: 5");
        assert!(out.is_clean(), "{:?}", out.diagnostics);
        let k: Vec<TokenKind> = out.tokens.iter().map(|t| t.kind).collect();
        assert!(matches!(k[0], TokenKind::Hp));
        assert!(matches!(k[1], TokenKind::Space));
        assert!(matches!(k[2], TokenKind::Identifier(_)));
        assert!(matches!(k[3], TokenKind::Colon));
        assert!(matches!(k[4], TokenKind::Space));
        assert!(matches!(k[5], TokenKind::HpLiteral));
        assert!(matches!(k[6], TokenKind::Eof));
    }

    #[test]
    fn test_integer_digit_limit() {
        assert!(tokenize("hp x: 1234567890").is_clean());
        let out = tokenize("hp x: 12345678901");
        assert!(matches!(
            out.diagnostics.as_slice(),
            [LexError::IntegerTooLong { .. }]
        ));
    }

    #[test]
    fn test_leading_zeros_do_not_count() {
        assert!(tokenize("hp x: 0001234567890").is_clean());
    }

    #[test]
    fn test_fraction_digit_limit() {
        assert!(tokenize("xp x: 0.1234567").is_clean());
        let out = tokenize("xp x: 0.12345678");
        assert!(matches!(
            out.diagnostics.as_slice(),
            [LexError::FractionTooLong { .. }]
        ));
    }

    #[test]
    fn test_fraction_zeros_are_deferred() {
        // six zeros then one digit: seven significant places
        assert!(tokenize("xp x: 0.0000001").is_clean());
        // seven zeros then one digit: eight
        assert!(!tokenize("xp x: 0.00000001").is_clean());
        // trailing zeros never become significant
        assert!(tokenize("xp x: 1.500000000").is_clean());
    }

    #[test]
    fn test_trailing_decimal_point() {
        let out = tokenize("xp x: 5.");
        assert!(matches!(
            out.diagnostics.as_slice(),
            [LexError::TrailingDecimalPoint { .. }]
        ));
    }

    #[test]
    fn test_negative_disambiguation() {
        assert_eq!(
            kinds("a-1")[1..],
            [TokenKind::Minus, TokenKind::HpLiteral]
        );
        assert_eq!(
            kinds("a - 1")[1..],
            [TokenKind::Minus, TokenKind::HpLiteral]
        );
        assert_eq!(kinds("x: -1")[1..], [TokenKind::Colon, TokenKind::HpLiteral]);
        assert_eq!(lexemes("x: -1")[2], "-1");
        assert_eq!(kinds("(-x)")[1], TokenKind::Neg);
        assert_eq!(kinds("f(a)-1")[4], TokenKind::Minus);
        assert_eq!(kinds("x -= 2")[1], TokenKind::MinusEq);
    }

    #[test]
    fn test_identifier_classes() {
        let out = tokenize("hp a: b + a");
        let ids: Vec<TokenKind> = out
            .tokens
            .iter()
            .filter(|t| t.is_identifier())
            .map(|t| t.kind)
            .collect();
        assert_eq!(ids.len(), 3);
        assert_eq!(ids[0], ids[2]);
        assert_ne!(ids[0], ids[1]);
        assert_eq!(out.identifiers.len(), 2);
    }

    #[test]
    fn test_identifier_length_limit() {
        let ok = format!("hp {}: 1", "a".repeat(30));
        assert!(tokenize(&ok).is_clean());
        let long = format!("hp {}: 1", "a".repeat(31));
        assert!(matches!(
            tokenize(&long).diagnostics.as_slice(),
            [LexError::IdentifierTooLong { .. }]
        ));
    }

    #[test]
    fn test_comms_escapes() {
        let out = tokenize(r#"comms s: "a\tb\n\"q\"\\""#);
        assert!(out.is_clean(), "{:?}", out.diagnostics);
        let lit = out
            .tokens
            .iter()
            .find(|t| t.kind == TokenKind::CommsLiteral)
            .unwrap();
        assert_eq!(decode_comms(&lit.lexeme), "a\tb\n\"q\"\\");
    }

    #[test]
    fn test_unterminated_string_is_reported() {
        let out = tokenize("comms s: \"oops\nhp x: 1");
        assert!(matches!(
            out.diagnostics.as_slice(),
            [LexError::UnterminatedString { .. }]
        ));
        // scanning resumed on the next line
        assert!(out.tokens.iter().any(|t| t.kind == TokenKind::Hp));
    }

    #[test]
    fn test_comments_are_dropped() {
        let out = tokenize("hp x: 1 # note\n```block\ncomment``` hp y: 2");
        assert!(out.is_clean(), "{:?}", out.diagnostics);
        let count = out.tokens.iter().filter(|t| t.kind == TokenKind::Hp).count();
        assert_eq!(count, 2);
        let y = out.tokens.iter().find(|t| t.lexeme == "y").unwrap();
        assert_eq!(y.line, 3);
    }

    #[test]
    fn test_unterminated_block_comment() {
        let out = tokenize("hp x: 1 ``` never closed");
        assert!(matches!(
            out.diagnostics.as_slice(),
            [LexError::UnterminatedComment { .. }]
        ));
    }

    #[test]
    fn test_delimiter_violation_recovers() {
        let out = tokenize("shoot(x)y\nhp z: 1");
        assert_eq!(out.diagnostics.len(), 1);
        match &out.diagnostics[0] {
            LexError::IllegalDelimiter { found, after, .. } => {
                assert_eq!(found, "'y'");
                assert_eq!(after, "')'");
            }
            other => panic!("unexpected diagnostic {:?}", other),
        }
        assert!(out.tokens.iter().any(|t| t.lexeme == "z"));
    }

    #[test]
    fn test_layout_runs_are_coalesced() {
        let out = tokenize("hp   x: 1\n\n\nhp y: 2");
        let spaces = out
            .tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Space)
            .count();
        let newlines: Vec<&Token> = out
            .tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Newline)
            .collect();
        assert_eq!(spaces, 4);
        assert_eq!(newlines.len(), 1);
        assert_eq!(newlines[0].lexeme, "\n\n\n");
    }

    #[test]
    fn test_tab_aware_columns() {
        let out = tokenize("\thp x: 1");
        let hp = out.tokens.iter().find(|t| t.kind == TokenKind::Hp).unwrap();
        assert_eq!(hp.column, 5);
    }

    #[test]
    fn test_format_suffix() {
        assert_eq!(
            kinds("shoot(avg.2f)"),
            [
                TokenKind::Shoot,
                TokenKind::LParen,
                TokenKind::Identifier(crate::parser::token::IdentId(1)),
                TokenKind::Format,
                TokenKind::RParen
            ]
        );
        assert_eq!(kinds("p.x")[1], TokenKind::Dot);
    }

    #[test]
    fn test_format_suffix_places_are_bounded() {
        assert!(tokenize("shoot(avg.7f)").is_clean());
        assert!(tokenize("shoot(avg.007f)").is_clean());

        for source in ["shoot(avg.8f)", "shoot(avg.99999999f)"] {
            let out = tokenize(source);
            assert!(
                matches!(out.diagnostics.as_slice(), [LexError::FormatTooWide { .. }]),
                "{}: {:?}",
                source,
                out.diagnostics
            );
        }
    }

    #[test]
    fn test_single_equals_is_illegal() {
        let out = tokenize("hp x = 1");
        assert!(matches!(
            out.diagnostics.as_slice(),
            [LexError::IllegalCharacter { ch: '=', .. }]
        ));
    }

    #[test]
    fn test_round_trip_through_pretty_printer() {
        let source = "hp a[3]: [1, -2, 3]\nplay() {\n\tshootNxt(a[0] - 1)  # out\n}\n";
        let first = tokenize(source);
        assert!(first.is_clean(), "{:?}", first.diagnostics);
        let printed = tokens_to_source(&first.tokens);
        let second = tokenize(&printed);
        assert!(second.is_clean());
        let strip = |out: &LexOutput| -> Vec<(String, bool)> {
            out.tokens
                .iter()
                .map(|t| (t.lexeme.trim_end().to_string(), t.is_identifier()))
                .collect()
        };
        assert_eq!(strip(&first), strip(&second));
    }
}
