use crate::tui_mode::app::App;
use ratatui::{
    layout::Alignment,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};

fn heading(text: &'static str) -> Line<'static> {
    Line::from(Span::styled(
        text,
        Style::default().fg(Color::Cyan).add_modifier(Modifier::UNDERLINED),
    ))
}

pub fn help_lines() -> Vec<Line<'static>> {
    vec![
        Line::from(Span::styled(
            "rpncalc - infix calculator with an RPN engine",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        heading("Operators (lowest to highest precedence):"),
        Line::from("  +  -      : Addition, subtraction      (10 - 2 - 3 = 5)"),
        Line::from("  *  /      : Multiplication, division   (5 / 2 = 2.5)"),
        Line::from("  %         : Remainder                  (10 % 3 = 1)"),
        Line::from("  //        : Floor division             (-7 // 2 = -4)"),
        Line::from("  - (prefix): Negation                   (2 * -5 = -10)"),
        Line::from("  ^  **     : Power                      (2 * 3 ^ 2 = 18)"),
        Line::from("  ( )       : Grouping                   ((2 + 3) * 4 = 20)"),
        Line::from(""),
        Line::from("  Operators of equal precedence group left to right, ^ included."),
        Line::from("  Both '.' and ',' work as the decimal separator."),
        Line::from(""),
        heading("Commands:"),
        Line::from("  details <expression> : Show each step of the evaluation with time"),
        Line::from("  history              : List saved calculations with their numbers"),
        Line::from("  export [path]        : Save the whole history (no path: show history file)"),
        Line::from("  export-selected 0, 2 [into <path>]"),
        Line::from("                       : Save only the numbered entries"),
        Line::from("  clear                : Forget all saved calculations"),
        Line::from("  help                 : Show this screen"),
        Line::from("  quit                 : Exit the calculator"),
        Line::from(""),
        heading("Keys:"),
        Line::from("  ← →        : Move cursor"),
        Line::from("  Ctrl+← →   : Jump between numbers"),
        Line::from("  Home/End   : Start/end of line"),
        Line::from("  ↑ ↓        : Recall earlier input"),
        Line::from("  PgUp/PgDn  : Page through history"),
        Line::from("  Ctrl+U     : Clear input"),
        Line::from("  Esc / F1   : Close this screen"),
    ]
}

pub fn render_help(frame: &mut Frame, app: &mut App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Help ")
        .title_alignment(Alignment::Center)
        .style(Style::default().bg(Color::Black));

    let paragraph = Paragraph::new(help_lines())
        .block(block)
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: false })
        .scroll((app.help_scroll as u16, 0));

    frame.render_widget(Clear, frame.size());
    frame.render_widget(paragraph, frame.size());
}
