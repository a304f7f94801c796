//! Program output pane with the input line at the bottom

use crate::host::Transcript;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Padding, Paragraph},
    Frame,
};

/// A pending `load`: its prompt and what has been typed so far
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputLine {
    pub prompt: String,
    pub buffer: String,
}

/// Render the output pane
///
/// While `input` is set the last row shows the prompt, the typed text and a
/// cursor block, and the transcript is scrolled to keep it visible.
pub fn render_terminal_pane(
    frame: &mut Frame,
    area: Rect,
    transcript: &Transcript,
    input: Option<&InputLine>,
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let border_style = if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    };

    let title = if input.is_some() {
        " Output · waiting for input "
    } else {
        " Output "
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style);

    if transcript.is_empty() && input.is_none() {
        let paragraph = Paragraph::new("(no output)")
            .block(block)
            .style(Style::default().fg(DEFAULT_THEME.comment));
        frame.render_widget(paragraph, area);
        return;
    }

    let block = block.padding(Padding::new(1, 0, 0, 0));
    let mut items: Vec<ListItem> = transcript
        .lines
        .iter()
        .map(|line| {
            ListItem::new(line.text.as_str()).style(Style::default().fg(DEFAULT_THEME.fg))
        })
        .collect();

    if let Some(input) = input {
        items.push(ListItem::new(Line::from(vec![
            Span::styled(
                format!("{} ", input.prompt),
                Style::default()
                    .fg(DEFAULT_THEME.secondary)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(input.buffer.clone(), Style::default().fg(DEFAULT_THEME.string)),
            Span::styled(" ", Style::default().bg(DEFAULT_THEME.fg)),
        ])));
    }

    let total_items = items.len();
    let visible_height = area.height.saturating_sub(2).max(1) as usize;

    if total_items > visible_height {
        let max_scroll = total_items - visible_height;
        *scroll_offset = if input.is_some() {
            max_scroll
        } else {
            (*scroll_offset).min(max_scroll)
        };
    } else {
        *scroll_offset = 0;
    }

    let visible_items: Vec<ListItem> = items
        .into_iter()
        .skip(*scroll_offset)
        .take(visible_height)
        .collect();

    frame.render_widget(List::new(visible_items).block(block), area);
}
