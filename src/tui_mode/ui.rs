use super::app::{App, FeedBody, FeedItem};
use super::helpers::{highlight_expression, wrap_text};
use crate::calc_engine::{format_result, spaced};
use crate::render_help::render_help;
use crate::session::Calculation;
use anyhow::Result;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use std::time::Duration;
use unicode_width::UnicodeWidthStr;

const MIN_TERMINAL_WIDTH: u16 = 50;
const MIN_TERMINAL_HEIGHT: u16 = 10;
const MOUSE_SCROLL_LINES: usize = 3;

pub fn run_ui_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|f| {
            if app.show_help {
                render_help(f, app);
            } else {
                ui(f, app);
            }
        })?;

        if !crossterm::event::poll(Duration::from_millis(50))? {
            continue;
        }
        match crossterm::event::read()? {
            Event::Key(KeyEvent { code, modifiers, kind: KeyEventKind::Press, .. }) => {
                if app.show_help {
                    handle_help_key(app, code);
                } else {
                    handle_key_event(app, code, modifiers);
                }
            }
            Event::Mouse(event) => handle_mouse_event(app, event),
            _ => {}
        }
    }
    Ok(())
}

fn handle_help_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Down => app.help_scroll = app.help_scroll.saturating_add(1),
        KeyCode::Up => app.help_scroll = app.help_scroll.saturating_sub(1),
        KeyCode::PageDown => app.help_scroll = app.help_scroll.saturating_add(10),
        KeyCode::PageUp => app.help_scroll = app.help_scroll.saturating_sub(10),
        KeyCode::Esc | KeyCode::F(1) | KeyCode::Char('q') => {
            app.show_help = false;
            app.help_scroll = 0;
        }
        _ => {}
    }
}

fn handle_key_event(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    let ctrl = modifiers.contains(KeyModifiers::CONTROL);
    match code {
        KeyCode::Char('u') | KeyCode::Char('U') if ctrl => app.clear_input(),
        KeyCode::Char('c') if ctrl => app.should_quit = true,
        KeyCode::Char(c) if !ctrl => app.insert_char(c),
        KeyCode::Backspace => app.delete_before_cursor(),
        KeyCode::Delete => app.delete_at_cursor(),
        KeyCode::Left if ctrl => app.move_cursor_by_words(-1),
        KeyCode::Right if ctrl => app.move_cursor_by_words(1),
        KeyCode::Left => app.move_cursor(-1),
        KeyCode::Right => app.move_cursor(1),
        KeyCode::Home => {
            app.cursor_position = 0;
            app.input_scroll = 0;
        }
        KeyCode::End => app.cursor_position = app.input.chars().count(),
        KeyCode::Up => app.navigate_history(-1),
        KeyCode::Down => app.navigate_history(1),
        KeyCode::PageUp => app.scroll_history(-1),
        KeyCode::PageDown => app.scroll_history(1),
        KeyCode::Enter => app.submit(),
        KeyCode::F(1) => {
            app.show_help = true;
            app.help_scroll = 0;
        }
        _ => {}
    }
}

fn handle_mouse_event(app: &mut App, event: MouseEvent) {
    let scroll = if app.show_help { &mut app.help_scroll } else { &mut app.history_scroll };
    match event.kind {
        MouseEventKind::ScrollDown => *scroll = scroll.saturating_add(MOUSE_SCROLL_LINES),
        MouseEventKind::ScrollUp => *scroll = scroll.saturating_sub(MOUSE_SCROLL_LINES),
        _ => {}
    }
}

fn ui(frame: &mut Frame, app: &mut App) {
    let area = frame.size();

    app.terminal_too_small = area.width < MIN_TERMINAL_WIDTH || area.height < MIN_TERMINAL_HEIGHT;
    if app.terminal_too_small {
        render_resize_message(frame, area);
        return;
    }

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(3),
        ])
        .split(area);

    render_input(frame, app, layout[0]);
    render_status(frame, app, layout[1]);
    render_history(frame, app, layout[2]);
    app.list_height = layout[2].height as usize;
}

fn render_resize_message(frame: &mut Frame, area: Rect) {
    let text = vec![
        Line::from(Span::styled(
            format!(
                "Need at least {}x{}, have {}x{}",
                MIN_TERMINAL_WIDTH, MIN_TERMINAL_HEIGHT, area.width, area.height
            ),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Make the terminal window larger",
            Style::default().fg(Color::Yellow),
        )),
    ];

    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red))
                .title(" Terminal Too Small ")
                .title_alignment(Alignment::Center),
        )
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, area);
}

fn render_history(frame: &mut Frame, app: &mut App, area: Rect) {
    let title = format!(" Calculations ({}) ", app.session.history().len());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(title)
        .title_alignment(Alignment::Center);

    let feed_area = block.inner(area);
    frame.render_widget(block, area);

    if app.history.is_empty() {
        let hint = Paragraph::new("Type an expression such as 2 + 3 * 4 and press Enter.")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        frame.render_widget(hint, feed_area);
        return;
    }

    let mut items = Vec::new();
    app.item_start_indices.clear();

    let wrap_width = feed_area.width.saturating_sub(4) as usize;
    let last = app.history.len() - 1;

    for (i, item) in app.history.iter().enumerate() {
        app.item_start_indices.push(items.len());

        let expression_style = if i == app.cursor_history {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::Cyan)
        };

        match &item.body {
            FeedBody::Calculation(calculation) => {
                push_calculation(&mut items, calculation, expression_style, wrap_width);
            }
            FeedBody::Notice { lines, is_error } => {
                push_notice(&mut items, item, lines, *is_error, expression_style, wrap_width);
            }
        }

        if i != last {
            items.push(ListItem::new(Line::from(Span::styled(
                "·".repeat(feed_area.width as usize),
                Style::default().fg(Color::DarkGray),
            ))));
        }
    }

    if app.scroll_to_bottom {
        app.history_scroll = items.len().saturating_sub(feed_area.height as usize);
        app.scroll_to_bottom = false;
    }

    let mut state = ListState::default()
        .with_selected(app.item_start_indices.get(app.cursor_history).copied())
        .with_offset(app.history_scroll);
    let feed = List::new(items).highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    frame.render_stateful_widget(feed, feed_area, &mut state);
}

fn push_calculation(
    items: &mut Vec<ListItem<'static>>,
    calculation: &Calculation,
    base_style: Style,
    wrap_width: usize,
) {
    let input = spaced(&calculation.expression);

    for (line_idx, line) in wrap_text(&input, wrap_width).into_iter().enumerate() {
        let mut result_spans = vec![];

        if line_idx == 0 {
            result_spans.push(Span::styled("> ", Style::default().fg(Color::Green)));
        } else {
            result_spans.push(Span::raw("  "));
        }

        result_spans.extend(highlight_expression(&line, base_style));

        if line_idx == 0 {
            result_spans.push(Span::styled(" = ", Style::default().fg(Color::Gray)));
            match &calculation.outcome {
                Ok(result) => result_spans.push(Span::styled(
                    result.clone(),
                    Style::default().fg(Color::LightMagenta).add_modifier(Modifier::BOLD)
                )),
                Err(e) => result_spans.push(Span::styled(
                    format!("Error: {}", e),
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
                )),
            }
        }

        items.push(ListItem::new(Line::from(result_spans)));
    }

    if calculation.detailed_mode {
        for (j, step) in calculation.steps.iter().enumerate() {
            let step_text = format!("Step {}: {} = {}", j + 1, step.operation, format_result(step.result));
            push_indented(items, &step_text, Style::default().fg(Color::DarkGray), wrap_width);
        }

        let time_str = format!("Time: {:.6} ms", calculation.duration.as_secs_f64() * 1000.0);
        push_indented(items, &time_str, Style::default().fg(Color::Magenta), wrap_width);
    }

    if let Some(warning) = &calculation.save_warning {
        push_indented(items, warning, Style::default().fg(Color::Red), wrap_width);
    }
}

fn push_notice(
    items: &mut Vec<ListItem<'static>>,
    item: &FeedItem,
    lines: &[String],
    is_error: bool,
    base_style: Style,
    wrap_width: usize,
) {
    items.push(ListItem::new(Line::from(vec![
        Span::styled("> ", Style::default().fg(Color::Green)),
        Span::styled(item.input.clone(), base_style),
    ])));

    let style = if is_error {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };
    for line in lines {
        push_indented(items, line, style, wrap_width);
    }
}

fn push_indented(items: &mut Vec<ListItem<'static>>, text: &str, style: Style, wrap_width: usize) {
    let width = wrap_width.saturating_sub(6);
    for (idx, line) in wrap_text(text, width).into_iter().enumerate() {
        let prefix = if idx == 0 { "    - " } else { "      " };
        items.push(ListItem::new(Line::from(Span::styled(format!("{}{}", prefix, line), style))));
    }
}

fn status_spans(app: &App) -> Vec<Span<'static>> {
    let keys = [
        ("Enter", "Calculate"),
        ("Up/Down", "Recall"),
        ("F1", "Help"),
        ("Ctrl+U", "Clear"),
        ("Ctrl+C", "Quit"),
    ];

    let mut spans: Vec<Span<'static>> = keys
        .iter()
        .flat_map(|(key, desc)| {
            [
                Span::styled(*key, Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
                Span::styled(format!(" {} ", desc), Style::default().fg(Color::DarkGray)),
            ]
        })
        .collect();

    let saved_to = match app.session.history().path() {
        Some(path) => format!("| saved to {}", path.display()),
        None => "| history not saved".to_string(),
    };
    spans.push(Span::styled(saved_to, Style::default().fg(Color::DarkGray)));
    spans
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    frame.render_widget(Paragraph::new(Line::from(status_spans(app))), area);
}

/// Part of the input that fits, and the cursor column inside it.
fn visible_input(app: &App, visible_width: usize) -> (String, usize) {
    let visible: String = app
        .input
        .chars()
        .skip(app.input_scroll)
        .take(visible_width)
        .collect();
    let cursor_chars = app.cursor_position.saturating_sub(app.input_scroll);
    let prefix: String = visible.chars().take(cursor_chars).collect();
    let cursor_column = prefix.width();
    (visible, cursor_column)
}

fn render_input(frame: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Expression ")
        .title_alignment(Alignment::Center);

    let inner_area = block.inner(area);
    frame.render_widget(block, area);

    let visible_width = inner_area.width.saturating_sub(2) as usize;
    app.adjust_input_scroll(visible_width);
    let (visible, cursor_column) = visible_input(app, visible_width);

    frame.render_widget(Paragraph::new(format!("> {}", visible)), inner_area);
    frame.set_cursor(inner_area.x + 2 + cursor_column as u16, inner_area.y);

    let indicator_style = Style::default().fg(Color::DarkGray);
    if app.input_scroll > 0 {
        frame.render_widget(
            Paragraph::new("<").style(indicator_style),
            Rect::new(inner_area.x, inner_area.y, 1, 1),
        );
    }
    if app.input.chars().count() > app.input_scroll + visible_width {
        frame.render_widget(
            Paragraph::new(">").style(indicator_style),
            Rect::new(inner_area.x + inner_area.width - 1, inner_area.y, 1, 1),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::History;
    use crate::session::Session;

    fn app_with_input(text: &str) -> App {
        let mut app = App::new(Session::new(History::in_memory(), false));
        for c in text.chars() {
            app.insert_char(c);
        }
        app
    }

    #[test]
    fn test_keys_edit_and_submit() {
        let mut app = app_with_input("");
        for c in "7//2".chars() {
            handle_key_event(&mut app, KeyCode::Char(c), KeyModifiers::NONE);
        }
        handle_key_event(&mut app, KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(app.session.history().entries()[0].result, "3");

        handle_key_event(&mut app, KeyCode::Up, KeyModifiers::NONE);
        assert_eq!(app.input, "7//2");
        handle_key_event(&mut app, KeyCode::Char('u'), KeyModifiers::CONTROL);
        assert!(app.input.is_empty());
    }

    #[test]
    fn test_help_keys() {
        let mut app = app_with_input("");
        handle_key_event(&mut app, KeyCode::F(1), KeyModifiers::NONE);
        assert!(app.show_help);
        handle_help_key(&mut app, KeyCode::PageDown);
        assert_eq!(app.help_scroll, 10);
        handle_help_key(&mut app, KeyCode::Esc);
        assert!(!app.show_help);
        assert_eq!(app.help_scroll, 0);
    }

    #[test]
    fn test_ctrl_c_quits() {
        let mut app = app_with_input("1+");
        handle_key_event(&mut app, KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(app.should_quit);
        assert_eq!(app.input, "1+");
    }

    #[test]
    fn test_visible_input() {
        let mut app = app_with_input("12345678");
        app.adjust_input_scroll(4);
        assert_eq!(visible_input(&app, 4), ("5678".to_string(), 4));

        app.cursor_position = 0;
        app.adjust_input_scroll(4);
        assert_eq!(visible_input(&app, 4), ("1234".to_string(), 0));
    }

    #[test]
    fn test_status_mentions_history_file() {
        let app = app_with_input("");
        let text: String = status_spans(&app).iter().map(|s| s.content.as_ref()).collect();
        assert!(text.ends_with("| history not saved"));
    }
}
