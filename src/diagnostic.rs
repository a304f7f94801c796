//! Source excerpts for positioned errors
//!
//! ```text
//! Semantic Error: 'score' is not declared at line 3, column 11
//!   3 | shoot(score)
//!     |       ^^^^^
//! ```
//!
//! Columns count tab stops every 4 characters, matching the lexer, so the
//! excerpt line is printed with tabs expanded to keep the carets aligned.

use crate::parser::ast::SourceSpan;

const TAB_WIDTH: usize = 4;

fn expand_tabs(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    for ch in line.chars() {
        if ch == '\t' {
            let pad = TAB_WIDTH - out.chars().count() % TAB_WIDTH;
            out.extend(std::iter::repeat(' ').take(pad));
        } else {
            out.push(ch);
        }
    }
    out
}

/// Render a headline plus the offending source line with a caret underline
///
/// A span running past the end of its first line is underlined to the end
/// of that line.
pub fn render(source: &str, category: &str, message: &str, span: SourceSpan) -> String {
    let start = span.start;
    let mut out = format!("{}: {} at {}", category, message, start);

    let Some(line) = source.lines().nth(start.line.saturating_sub(1)) else {
        return out;
    };
    let line = expand_tabs(line);
    let width = line.chars().count();

    let first = start.column.max(1);
    let last = if span.end.line == start.line {
        span.end.column.max(first + 1)
    } else {
        width + 1
    };
    // at least one caret, even at the end of the line
    let carets = last.min(width + 1).saturating_sub(first).max(1);

    let number = start.line.to_string();
    let gutter = " ".repeat(number.len());
    out.push_str(&format!("\n  {} | {}", number, line));
    out.push_str(&format!(
        "\n  {} | {}{}",
        gutter,
        " ".repeat(first - 1),
        "^".repeat(carets)
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::SourceLocation;
    use pretty_assertions::assert_eq;

    fn span(line: usize, start: usize, end: usize) -> SourceSpan {
        SourceSpan::new(SourceLocation::new(line, start), SourceLocation::new(line, end))
    }

    #[test]
    fn test_underline_covers_span() {
        let source = "play() {\n    shoot(score)\n}";
        let rendered = render(
            source,
            "Semantic Error",
            "'score' is not declared",
            span(2, 11, 16),
        );
        assert_eq!(
            rendered,
            "Semantic Error: 'score' is not declared at line 2, column 11\n\
             \x20 2 |     shoot(score)\n\
             \x20   |           ^^^^^"
        );
    }

    #[test]
    fn test_tabs_are_expanded() {
        let source = "\tx: 1";
        let rendered = render(source, "Runtime Error", "boom", span(1, 5, 6));
        assert!(rendered.ends_with("  1 |     x: 1\n    |     ^"));
    }

    #[test]
    fn test_missing_line_gives_headline_only() {
        let rendered = render("", "Syntax Error", "Expected 'play'", span(4, 1, 2));
        assert_eq!(rendered, "Syntax Error: Expected 'play' at line 4, column 1");
    }
}
