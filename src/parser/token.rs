//! Token definitions for the Respawn lexer
//!
//! A [`Token`] pairs a [`TokenKind`] with its raw source lexeme and position.
//! Identifiers are interned through an [`IdentifierTable`]: every distinct
//! spelling gets its own [`IdentId`], so the parser can ask "is this an
//! identifier?" with a single discriminant check while the spelling stays in
//! the lexeme for name resolution.

use super::ast::{SourceLocation, SourceSpan};
use rustc_hash::FxHashMap;
use std::fmt;

/// Synthetic identifier class, stable for the lifetime of one lexer run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdentId(pub u32);

impl fmt::Display for IdentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "id{}", self.0)
    }
}

/// All token kinds produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Layout
    Space,
    Newline,

    // Literals
    HpLiteral,
    XpLiteral,
    CommsLiteral,
    Format, // .2f

    // Identifiers
    Identifier(IdentId),

    // Type keywords
    Hp,
    Xp,
    Comms,
    Flag,

    // Value keywords
    True,
    False,
    Dead,

    // Declaration keywords
    Immo,
    Build,
    Access,

    // Control flow
    If,
    Elif,
    Else,
    Flank,
    Choice,
    Backup,
    For,
    Grind,
    While,
    Checkpoint,
    Resume,
    Play,
    Recall,

    // Built-ins
    Load,
    LoadNum,
    Shoot,
    ShootNxt,
    Rounds,
    Join,
    Drop,
    Seek,
    LevelUp,
    LevelDown,
    ToHp,
    ToXp,
    ToComms,

    // Logical
    And,
    Or,
    Bang,

    // Arithmetic
    Plus,
    Minus,
    Neg,
    Star,
    Slash,
    Percent,
    Caret,

    // Comparison
    Lt,
    Le,
    Gt,
    Ge,
    EqEq,
    NotEq,

    // Compound assignment
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    PercentEq,

    // Punctuation
    Colon,
    Comma,
    Dot,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,

    Eof,
}

impl TokenKind {
    /// Map a word to its keyword kind, if it is reserved
    pub fn keyword(word: &str) -> Option<TokenKind> {
        let kind = match word {
            "hp" => TokenKind::Hp,
            "xp" => TokenKind::Xp,
            "comms" => TokenKind::Comms,
            "flag" => TokenKind::Flag,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "dead" => TokenKind::Dead,
            "immo" => TokenKind::Immo,
            "build" => TokenKind::Build,
            "access" => TokenKind::Access,
            "if" => TokenKind::If,
            "elif" => TokenKind::Elif,
            "else" => TokenKind::Else,
            "flank" => TokenKind::Flank,
            "choice" => TokenKind::Choice,
            "backup" => TokenKind::Backup,
            "for" => TokenKind::For,
            "grind" => TokenKind::Grind,
            "while" => TokenKind::While,
            "checkpoint" => TokenKind::Checkpoint,
            "resume" => TokenKind::Resume,
            "play" => TokenKind::Play,
            "recall" => TokenKind::Recall,
            "load" => TokenKind::Load,
            "loadNum" => TokenKind::LoadNum,
            "shoot" => TokenKind::Shoot,
            "shootNxt" => TokenKind::ShootNxt,
            "rounds" => TokenKind::Rounds,
            "join" => TokenKind::Join,
            "drop" => TokenKind::Drop,
            "seek" => TokenKind::Seek,
            "levelUp" => TokenKind::LevelUp,
            "levelDown" => TokenKind::LevelDown,
            "toHp" => TokenKind::ToHp,
            "toXp" => TokenKind::ToXp,
            "toComms" => TokenKind::ToComms,
            "AND" => TokenKind::And,
            "OR" => TokenKind::Or,
            _ => return None,
        };
        Some(kind)
    }

    pub fn is_layout(self) -> bool {
        matches!(self, TokenKind::Space | TokenKind::Newline)
    }

    pub fn is_type_keyword(self) -> bool {
        matches!(
            self,
            TokenKind::Hp | TokenKind::Xp | TokenKind::Comms | TokenKind::Flag
        )
    }

    /// Equality that treats every identifier class as the same terminal
    pub fn same_terminal(self, other: TokenKind) -> bool {
        std::mem::discriminant(&self) == std::mem::discriminant(&other)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TokenKind::Space => "whitespace",
            TokenKind::Newline => "newline",
            TokenKind::HpLiteral => "hp literal",
            TokenKind::XpLiteral => "xp literal",
            TokenKind::CommsLiteral => "comms literal",
            TokenKind::Format => "format suffix",
            TokenKind::Identifier(_) => "identifier",
            TokenKind::Hp => "'hp'",
            TokenKind::Xp => "'xp'",
            TokenKind::Comms => "'comms'",
            TokenKind::Flag => "'flag'",
            TokenKind::True => "'true'",
            TokenKind::False => "'false'",
            TokenKind::Dead => "'dead'",
            TokenKind::Immo => "'immo'",
            TokenKind::Build => "'build'",
            TokenKind::Access => "'access'",
            TokenKind::If => "'if'",
            TokenKind::Elif => "'elif'",
            TokenKind::Else => "'else'",
            TokenKind::Flank => "'flank'",
            TokenKind::Choice => "'choice'",
            TokenKind::Backup => "'backup'",
            TokenKind::For => "'for'",
            TokenKind::Grind => "'grind'",
            TokenKind::While => "'while'",
            TokenKind::Checkpoint => "'checkpoint'",
            TokenKind::Resume => "'resume'",
            TokenKind::Play => "'play'",
            TokenKind::Recall => "'recall'",
            TokenKind::Load => "'load'",
            TokenKind::LoadNum => "'loadNum'",
            TokenKind::Shoot => "'shoot'",
            TokenKind::ShootNxt => "'shootNxt'",
            TokenKind::Rounds => "'rounds'",
            TokenKind::Join => "'join'",
            TokenKind::Drop => "'drop'",
            TokenKind::Seek => "'seek'",
            TokenKind::LevelUp => "'levelUp'",
            TokenKind::LevelDown => "'levelDown'",
            TokenKind::ToHp => "'toHp'",
            TokenKind::ToXp => "'toXp'",
            TokenKind::ToComms => "'toComms'",
            TokenKind::And => "'AND'",
            TokenKind::Or => "'OR'",
            TokenKind::Bang => "'!'",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Neg => "negation '-'",
            TokenKind::Star => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::Percent => "'%'",
            TokenKind::Caret => "'^'",
            TokenKind::Lt => "'<'",
            TokenKind::Le => "'<='",
            TokenKind::Gt => "'>'",
            TokenKind::Ge => "'>='",
            TokenKind::EqEq => "'=='",
            TokenKind::NotEq => "'!='",
            TokenKind::PlusEq => "'+='",
            TokenKind::MinusEq => "'-='",
            TokenKind::StarEq => "'*='",
            TokenKind::SlashEq => "'/='",
            TokenKind::PercentEq => "'%='",
            TokenKind::Colon => "':'",
            TokenKind::Comma => "','",
            TokenKind::Dot => "'.'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::Eof => "end of file",
        };
        f.write_str(text)
    }
}

/// A single token with its raw lexeme and source position
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: usize,
    pub column: usize,
    /// Position just past the last character of the lexeme
    pub end: SourceLocation,
}

impl Token {
    pub fn location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }

    pub fn span(&self) -> SourceSpan {
        SourceSpan::new(self.location(), self.end)
    }

    pub fn is_identifier(&self) -> bool {
        matches!(self.kind, TokenKind::Identifier(_))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Identifier(_) => write!(f, "identifier '{}'", self.lexeme),
            TokenKind::HpLiteral | TokenKind::XpLiteral | TokenKind::CommsLiteral => {
                write!(f, "{} {}", self.kind, self.lexeme)
            }
            kind => write!(f, "{}", kind),
        }
    }
}

/// Spelling → synthetic identifier class, assigned in order of first sight
#[derive(Debug, Clone, Default)]
pub struct IdentifierTable {
    ids: FxHashMap<String, IdentId>,
    names: Vec<String>,
}

impl IdentifierTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the class for `name`, registering it on first use
    pub fn intern(&mut self, name: &str) -> IdentId {
        if let Some(id) = self.ids.get(name) {
            return *id;
        }
        let id = IdentId(self.names.len() as u32 + 1);
        self.ids.insert(name.to_string(), id);
        self.names.push(name.to_string());
        id
    }

    pub fn get(&self, name: &str) -> Option<IdentId> {
        self.ids.get(name).copied()
    }

    pub fn name(&self, id: IdentId) -> Option<&str> {
        self.names.get((id.0 as usize).checked_sub(1)?).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Render a token stream back to source text.
///
/// Comments never become tokens, so they do not survive the trip.
pub fn tokens_to_source(tokens: &[Token]) -> String {
    tokens
        .iter()
        .filter(|t| t.kind != TokenKind::Eof)
        .map(|t| t.lexeme.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_is_stable() {
        let mut table = IdentifierTable::new();
        let a = table.intern("score");
        let b = table.intern("lives");
        assert_eq!(table.intern("score"), a);
        assert_ne!(a, b);
        assert_eq!(table.name(b), Some("lives"));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_keywords_are_case_sensitive() {
        assert_eq!(TokenKind::keyword("AND"), Some(TokenKind::And));
        assert_eq!(TokenKind::keyword("and"), None);
        assert_eq!(TokenKind::keyword("loadNum"), Some(TokenKind::LoadNum));
    }

    #[test]
    fn test_identifier_classes_share_a_terminal() {
        let a = TokenKind::Identifier(IdentId(1));
        let b = TokenKind::Identifier(IdentId(7));
        assert!(a.same_terminal(b));
        assert!(!a.same_terminal(TokenKind::Hp));
    }
}
