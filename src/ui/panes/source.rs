//! Source code pane rendering with syntax highlighting
//!
//! Displays the `.rsp` program with line numbers and marks the line of the
//! `load` being waited on, or the line of the error that stopped the run.
//!
//! # Rendering
//!
//! Words are classified through the lexer's keyword table, so the pane
//! always agrees with the language about what is reserved. Everything else
//! is a small character scanner: `#` line comments, ```` ``` ```` block
//! comments that may span lines, string literals and numbers.

use crate::parser::TokenKind;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Why a line is marked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineMark {
    /// The run is waiting for input requested on this line
    Input,
    /// The error that stopped the run points here
    Error,
}

fn word_style(word: &str, is_call: bool) -> Style {
    match TokenKind::keyword(word) {
        Some(kind) if kind.is_type_keyword() => Style::default().fg(DEFAULT_THEME.type_name),
        Some(TokenKind::True | TokenKind::False | TokenKind::Dead) => {
            Style::default().fg(DEFAULT_THEME.number)
        }
        Some(
            TokenKind::Load
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
            | TokenKind::ToComms,
        ) => Style::default().fg(DEFAULT_THEME.builtin),
        Some(_) => Style::default()
            .fg(DEFAULT_THEME.keyword)
            .add_modifier(Modifier::BOLD),
        None if word.chars().all(|c| c.is_ascii_digit()) => {
            Style::default().fg(DEFAULT_THEME.number)
        }
        None if is_call => Style::default().fg(DEFAULT_THEME.builtin),
        None => Style::default().fg(DEFAULT_THEME.fg),
    }
}

/// Highlight one line; `in_block` carries an open ```` ``` ```` comment
/// from line to line
fn highlight_line(line: &str, in_block: &mut bool) -> Line<'static> {
    let comment = Style::default().fg(DEFAULT_THEME.comment);
    let chars: Vec<char> = line.chars().collect();
    let mut spans = Vec::new();
    let mut word = String::new();
    let mut i = 0;

    let flush = |word: &mut String, spans: &mut Vec<Span<'static>>, is_call: bool| {
        if !word.is_empty() {
            spans.push(Span::styled(word.clone(), word_style(word, is_call)));
            word.clear();
        }
    };
    let fence_at = |i: usize| chars.get(i..i + 3) == Some(&['`', '`', '`'][..]);

    while i < chars.len() {
        if *in_block {
            let start = i;
            while i < chars.len() && !fence_at(i) {
                i += 1;
            }
            if i < chars.len() {
                i += 3;
                *in_block = false;
            }
            spans.push(Span::styled(chars[start..i].iter().collect::<String>(), comment));
            continue;
        }

        let c = chars[i];

        if fence_at(i) {
            flush(&mut word, &mut spans, false);
            *in_block = true;
            spans.push(Span::styled("```", comment));
            i += 3;
            continue;
        }

        if c == '#' {
            flush(&mut word, &mut spans, false);
            spans.push(Span::styled(chars[i..].iter().collect::<String>(), comment));
            break;
        }

        if c == '"' {
            flush(&mut word, &mut spans, false);
            let mut end = i + 1;
            while end < chars.len() && chars[end] != '"' {
                end += if chars[end] == '\\' { 2 } else { 1 };
            }
            let end = (end + 1).min(chars.len());
            spans.push(Span::styled(
                chars[i..end].iter().collect::<String>(),
                Style::default().fg(DEFAULT_THEME.string),
            ));
            i = end;
            continue;
        }

        if !c.is_alphanumeric() && c != '_' {
            flush(&mut word, &mut spans, c == '(');
            let style = match c {
                '{' | '}' | '(' | ')' | '[' | ']' => Style::default().fg(DEFAULT_THEME.primary),
                _ => Style::default().fg(DEFAULT_THEME.fg),
            };
            spans.push(Span::styled(c.to_string(), style));
            i += 1;
            continue;
        }

        word.push(c);
        i += 1;
    }
    flush(&mut word, &mut spans, false);

    Line::from(spans)
}

/// Render the source code pane
///
/// `scroll` is the first visible line; it is moved just enough to keep a
/// marked line in view.
pub fn render_source_pane(
    frame: &mut Frame,
    area: Rect,
    source_code: &str,
    mark: Option<(usize, LineMark)>,
    is_focused: bool,
    scroll: &mut usize,
) {
    let border_style = if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    };

    let block = Block::default()
        .title(" Source ")
        .borders(Borders::ALL)
        .border_style(border_style);

    let lines: Vec<&str> = source_code.lines().collect();
    let total_lines = lines.len();
    let visible_height = area.height.saturating_sub(2).max(1) as usize; // borders

    if let Some((line, _)) = mark {
        let idx = line.saturating_sub(1);
        if idx < *scroll {
            *scroll = idx;
        } else if idx >= *scroll + visible_height {
            *scroll = idx + 1 - visible_height;
        }
    }
    *scroll = (*scroll).min(total_lines.saturating_sub(visible_height));

    // block comments need every line before the window
    let mut in_block = false;
    let highlighted: Vec<Line> = lines
        .iter()
        .map(|line| highlight_line(line, &mut in_block))
        .collect();

    let visible_lines: Vec<Line> = highlighted
        .into_iter()
        .enumerate()
        .skip(*scroll)
        .take(visible_height)
        .map(|(idx, mut content)| {
            let line_num = idx + 1;
            let line_mark = mark.and_then(|(line, kind)| (line == line_num).then_some(kind));

            let (num_style, line_style) = match line_mark {
                Some(LineMark::Error) => (
                    Style::default()
                        .fg(DEFAULT_THEME.error)
                        .add_modifier(Modifier::BOLD),
                    Some(
                        Style::default()
                            .bg(DEFAULT_THEME.error)
                            .fg(Color::White)
                            .add_modifier(Modifier::BOLD),
                    ),
                ),
                Some(LineMark::Input) => (
                    Style::default()
                        .fg(DEFAULT_THEME.secondary)
                        .add_modifier(Modifier::BOLD),
                    Some(Style::default().bg(DEFAULT_THEME.current_line_bg)),
                ),
                None => (Style::default().fg(DEFAULT_THEME.comment), None),
            };

            if let Some(style) = line_style {
                for span in &mut content.spans {
                    span.style = span.style.patch(style);
                }
            }

            let mut spans = vec![Span::styled(format!("{:4} ", line_num), num_style)];
            spans.extend(content.spans);
            Line::from(spans)
        })
        .collect();

    let paragraph = Paragraph::new(visible_lines).block(block);
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_highlight_keeps_text() {
        let mut in_block = false;
        let line = highlight_line("hp x: 5 # health", &mut in_block);
        assert_eq!(text_of(&line), "hp x: 5 # health");
        assert_eq!(line.spans[0].style.fg, Some(DEFAULT_THEME.type_name));
    }

    #[test]
    fn test_block_comment_spans_lines() {
        let mut in_block = false;
        highlight_line("``` start", &mut in_block);
        assert!(in_block);
        let line = highlight_line("still comment ``` hp", &mut in_block);
        assert!(!in_block);
        assert_eq!(text_of(&line), "still comment ``` hp");
        assert_eq!(line.spans[0].style.fg, Some(DEFAULT_THEME.comment));
    }
}
