//! Per-token delimiter rules
//!
//! Every token kind (except layout tokens) names the set of characters that
//! may legally follow it directly. The lexer checks the character after each
//! token against its set and reports a delimiter error on a mismatch.

use super::token::TokenKind;

/// Characters allowed immediately after a token
#[derive(Debug)]
pub struct DelimiterSet {
    pub letters: bool,
    pub digits: bool,
    pub whitespace: bool,
    pub newline: bool,
    pub symbols: &'static str,
}

impl DelimiterSet {
    pub fn allows(&self, ch: char) -> bool {
        match ch {
            ' ' | '\t' | '\r' => self.whitespace,
            '\n' => self.newline,
            c if c.is_ascii_alphabetic() || c == '_' => self.letters,
            c if c.is_ascii_digit() => self.digits,
            c => self.symbols.contains(c),
        }
    }

    /// Human-readable listing used in diagnostics
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if self.whitespace {
            parts.push("whitespace".to_string());
        }
        if self.newline {
            parts.push("newline".to_string());
        }
        if self.letters {
            parts.push("letter".to_string());
        }
        if self.digits {
            parts.push("digit".to_string());
        }
        parts.extend(self.symbols.chars().map(|c| format!("'{}'", c)));
        parts.join(", ")
    }
}

/// End of an operand: literals, `true`/`false`/`dead`, format suffixes
const OPERAND_END: DelimiterSet = DelimiterSet {
    letters: false,
    digits: false,
    whitespace: true,
    newline: true,
    symbols: ")]},:+-*/%^<>=!{#`",
};

const IDENTIFIER: DelimiterSet = DelimiterSet {
    letters: false,
    digits: false,
    whitespace: true,
    newline: true,
    symbols: ")]},:+-*/%^<>=!{#`([.",
};

const CLOSE_PAREN: DelimiterSet = DelimiterSet {
    letters: false,
    digits: false,
    whitespace: true,
    newline: true,
    symbols: ")]},:+-*/%^<>=!{#`.",
};

const CLOSE_BRACKET: DelimiterSet = DelimiterSet {
    letters: false,
    digits: false,
    whitespace: true,
    newline: true,
    symbols: ")]},:+-*/%^<>=!{#`[.",
};

/// Anything that starts an operand
const OPERAND_START: DelimiterSet = DelimiterSet {
    letters: true,
    digits: true,
    whitespace: true,
    newline: false,
    symbols: "\"([-.!",
};

/// Like [`OPERAND_START`], but a line break may follow
const LIST_SEPARATOR: DelimiterSet = DelimiterSet {
    letters: true,
    digits: true,
    whitespace: true,
    newline: true,
    symbols: "\"([-.!",
};

const OPEN_PAREN: DelimiterSet = DelimiterSet {
    letters: true,
    digits: true,
    whitespace: true,
    newline: true,
    symbols: "\"([-.!)",
};

const OPEN_BRACKET: DelimiterSet = DelimiterSet {
    letters: true,
    digits: true,
    whitespace: true,
    newline: true,
    symbols: "\"([-.!]",
};

const BRACE: DelimiterSet = DelimiterSet {
    letters: false,
    digits: false,
    whitespace: true,
    newline: true,
    symbols: "}#`",
};

const NEGATION: DelimiterSet = DelimiterSet {
    letters: true,
    digits: false,
    whitespace: true,
    newline: false,
    symbols: "(!-",
};

const BANG: DelimiterSet = DelimiterSet {
    letters: true,
    digits: true,
    whitespace: true,
    newline: false,
    symbols: "(!",
};

const DOT: DelimiterSet = DelimiterSet {
    letters: true,
    digits: false,
    whitespace: false,
    newline: false,
    symbols: "",
};

/// Declaration keywords: `hp`, `immo`, `build`, ...
const WORD: DelimiterSet = DelimiterSet {
    letters: false,
    digits: false,
    whitespace: true,
    newline: false,
    symbols: "",
};

/// `if`, `elif`, `while`, `flank`, `choice`
const CONDITION_KEYWORD: DelimiterSet = DelimiterSet {
    letters: false,
    digits: false,
    whitespace: true,
    newline: false,
    symbols: "(!-\"",
};

/// `else`, `grind`
const BLOCK_KEYWORD: DelimiterSet = DelimiterSet {
    letters: false,
    digits: false,
    whitespace: true,
    newline: true,
    symbols: "{",
};

const BACKUP: DelimiterSet = DelimiterSet {
    letters: false,
    digits: false,
    whitespace: true,
    newline: false,
    symbols: ":",
};

/// `recall`, `checkpoint`, `resume`
const STATEMENT_END: DelimiterSet = DelimiterSet {
    letters: false,
    digits: false,
    whitespace: true,
    newline: true,
    symbols: "}#`",
};

/// Built-ins and `play`: only an argument list may follow
const CALL_KEYWORD: DelimiterSet = DelimiterSet {
    letters: false,
    digits: false,
    whitespace: true,
    newline: false,
    symbols: "(",
};

const LOGICAL_WORD: DelimiterSet = DelimiterSet {
    letters: false,
    digits: false,
    whitespace: true,
    newline: false,
    symbols: "(!",
};

/// The delimiter set for `kind`, or `None` when nothing is checked
pub fn delimiters_for(kind: TokenKind) -> Option<&'static DelimiterSet> {
    let set = match kind {
        TokenKind::Space | TokenKind::Newline | TokenKind::Eof => return None,

        TokenKind::HpLiteral
        | TokenKind::XpLiteral
        | TokenKind::CommsLiteral
        | TokenKind::Format
        | TokenKind::True
        | TokenKind::False
        | TokenKind::Dead => &OPERAND_END,

        TokenKind::Identifier(_) => &IDENTIFIER,

        TokenKind::Hp
        | TokenKind::Xp
        | TokenKind::Comms
        | TokenKind::Flag
        | TokenKind::Immo
        | TokenKind::Build
        | TokenKind::Access
        | TokenKind::For => &WORD,

        TokenKind::If
        | TokenKind::Elif
        | TokenKind::While
        | TokenKind::Flank
        | TokenKind::Choice => &CONDITION_KEYWORD,

        TokenKind::Else | TokenKind::Grind => &BLOCK_KEYWORD,
        TokenKind::Backup => &BACKUP,
        TokenKind::Checkpoint | TokenKind::Resume | TokenKind::Recall => &STATEMENT_END,

        TokenKind::Play
        | TokenKind::Load
        | TokenKind::LoadNum
        | TokenKind::Shoot
        | TokenKind::ShootNxt
        | TokenKind::Rounds
        | TokenKind::Join
        | TokenKind::Drop
        | TokenKind::Seek
        | TokenKind::LevelUp
        | TokenKind::LevelDown
        | TokenKind::ToHp
        | TokenKind::ToXp
        | TokenKind::ToComms => &CALL_KEYWORD,

        TokenKind::And | TokenKind::Or => &LOGICAL_WORD,
        TokenKind::Bang => &BANG,
        TokenKind::Neg => &NEGATION,

        TokenKind::Plus
        | TokenKind::Minus
        | TokenKind::Star
        | TokenKind::Slash
        | TokenKind::Percent
        | TokenKind::Caret
        | TokenKind::Lt
        | TokenKind::Le
        | TokenKind::Gt
        | TokenKind::Ge
        | TokenKind::EqEq
        | TokenKind::NotEq
        | TokenKind::PlusEq
        | TokenKind::MinusEq
        | TokenKind::StarEq
        | TokenKind::SlashEq
        | TokenKind::PercentEq => &OPERAND_START,

        TokenKind::Colon | TokenKind::Comma => &LIST_SEPARATOR,
        TokenKind::Dot => &DOT,
        TokenKind::LParen => &OPEN_PAREN,
        TokenKind::RParen => &CLOSE_PAREN,
        TokenKind::LBracket => &OPEN_BRACKET,
        TokenKind::RBracket => &CLOSE_BRACKET,
        TokenKind::LBrace | TokenKind::RBrace => &BRACE,
    };
    Some(set)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_paren_rejects_letters() {
        let set = delimiters_for(TokenKind::RParen).unwrap();
        assert!(set.allows(' '));
        assert!(set.allows('+'));
        assert!(set.allows('{'));
        assert!(!set.allows('x'));
        assert!(!set.allows('"'));
    }

    #[test]
    fn test_layout_tokens_are_unchecked() {
        assert!(delimiters_for(TokenKind::Space).is_none());
        assert!(delimiters_for(TokenKind::Newline).is_none());
    }

    #[test]
    fn test_describe_lists_every_class() {
        let text = delimiters_for(TokenKind::Backup).unwrap().describe();
        assert_eq!(text, "whitespace, ':'");
    }
}
