use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::calc_engine::{tokenize, Token};

/// Greedy word wrap by display width. Words wider than a line are cut on
/// grapheme boundaries.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![String::new()];
    }

    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        for chunk in split_to_width(word, width) {
            let needed = if current.is_empty() {
                chunk.width()
            } else {
                current.width() + 1 + chunk.width()
            };
            if needed > width && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(chunk);
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

fn split_to_width(word: &str, width: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut chunk_width = 0;

    for (idx, grapheme) in word.grapheme_indices(true) {
        let grapheme_width = grapheme.width();
        if chunk_width > 0 && chunk_width + grapheme_width > width {
            chunks.push(&word[start..idx]);
            start = idx;
            chunk_width = 0;
        }
        chunk_width += grapheme_width;
    }
    chunks.push(&word[start..]);
    chunks
}

pub fn highlight_expression(expr: &str, base_style: Style) -> Vec<Span<'static>> {
    let operator_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);

    let number_style = Style::default().fg(Color::LightGreen);

    let unknown_style = Style::default()
        .fg(Color::Red)
        .add_modifier(Modifier::UNDERLINED);

    let mut spans = Vec::new();
    for (i, token) in tokenize(expr).iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" "));
        }
        let style = match token {
            Token::Number(_) => number_style,
            Token::Operator(_) | Token::Negate => operator_style,
            Token::LeftParen | Token::RightParen => base_style,
            Token::Unrecognized(_) => unknown_style,
        };
        spans.push(Span::styled(token.to_string(), style));
    }
    spans
}
