use crate::history::CalculationEntry;
use crate::session::{Calculation, Reply, Session};
use std::time::Duration;
use unicode_segmentation::UnicodeSegmentation;

pub enum FeedBody {
    Calculation(Calculation),
    Notice { lines: Vec<String>, is_error: bool },
}

/// Calculations from earlier runs show up as plain results.
impl From<&CalculationEntry> for Calculation {
    fn from(entry: &CalculationEntry) -> Self {
        Calculation {
            expression: entry.expression.clone(),
            outcome: Ok(entry.result.clone()),
            steps: Vec::new(),
            detailed_mode: false,
            duration: Duration::ZERO,
            save_warning: None,
        }
    }
}

/// One submitted line and what it produced.
pub struct FeedItem {
    pub input: String,
    pub body: FeedBody,
}

pub struct App {
    pub session: Session,
    pub input: String,
    pub cursor_position: usize,
    pub input_scroll: usize,
    pub history: Vec<FeedItem>,
    pub cursor_history: usize,
    pub should_quit: bool,
    pub show_help: bool,
    pub help_scroll: usize,
    pub list_height: usize,
    pub item_start_indices: Vec<usize>,
    pub history_scroll: usize,
    pub scroll_to_bottom: bool,
    pub terminal_too_small: bool,
}

impl App {
    pub fn new(session: Session) -> Self {
        let history: Vec<FeedItem> = session
            .history()
            .entries()
            .iter()
            .map(|entry| FeedItem {
                input: entry.expression.clone(),
                body: FeedBody::Calculation(entry.into()),
            })
            .collect();

        App {
            session,
            input: String::new(),
            cursor_position: 0,
            input_scroll: 0,
            cursor_history: history.len(),
            history,
            should_quit: false,
            show_help: false,
            help_scroll: 0,
            list_height: 5,
            item_start_indices: Vec::new(),
            history_scroll: 0,
            scroll_to_bottom: true,
            terminal_too_small: false,
        }
    }

    pub fn adjust_input_scroll(&mut self, visible_width: usize) {
        let total_chars = self.input.chars().count();
        let cursor_pos = self.cursor_position;

        if cursor_pos < self.input_scroll {
            self.input_scroll = cursor_pos;
        } else if cursor_pos >= self.input_scroll + visible_width {
            self.input_scroll = cursor_pos + 1 - visible_width;
        }

        self.input_scroll = self.input_scroll.min(total_chars.saturating_sub(visible_width));
    }

    pub fn submit(&mut self) {
        let input = self.input.trim().to_string();
        if input.is_empty() {
            return;
        }

        let body = match self.session.handle(&input) {
            Reply::Quit => {
                self.should_quit = true;
                return;
            }
            Reply::Help => {
                self.show_help = true;
                self.help_scroll = 0;
                self.clear_input();
                return;
            }
            Reply::Cleared => {
                self.history.clear();
                self.cursor_history = 0;
                self.history_scroll = 0;
                self.clear_input();
                return;
            }
            Reply::Calculated(calculation) => FeedBody::Calculation(calculation),
            Reply::Info(lines) => FeedBody::Notice { lines, is_error: false },
            Reply::Error(message) => FeedBody::Notice {
                lines: vec![message],
                is_error: true,
            },
        };

        self.history.push(FeedItem { input, body });
        self.cursor_history = self.history.len();
        self.clear_input();
        self.scroll_to_bottom = true;
    }

    pub fn insert_char(&mut self, c: char) {
        let byte_idx = Self::char_index_to_byte_index(&self.input, self.cursor_position);
        self.input.insert(byte_idx, c);
        self.cursor_position += 1;
    }

    pub fn delete_before_cursor(&mut self) {
        if self.cursor_position > 0 {
            self.cursor_position -= 1;
            self.delete_at_cursor();
        }
    }

    pub fn delete_at_cursor(&mut self) {
        let byte_idx = Self::char_index_to_byte_index(&self.input, self.cursor_position);
        if let Some(c) = self.input[byte_idx..].chars().next() {
            self.input.drain(byte_idx..byte_idx + c.len_utf8());
        }
    }

    pub fn move_cursor(&mut self, direction: i32) {
        match direction {
            -1 => self.cursor_position = self.cursor_position.saturating_sub(1),
            1 => self.cursor_position = (self.cursor_position + 1).min(self.input.chars().count()),
            _ => {}
        }
    }

    /// Jumps between numbers; operators and spaces are not words.
    pub fn move_cursor_by_words(&mut self, direction: i32) {
        let starts: Vec<usize> = self
            .input
            .unicode_word_indices()
            .map(|(byte, _)| self.input[..byte].chars().count())
            .collect();

        self.cursor_position = if direction < 0 {
            starts
                .into_iter()
                .rev()
                .find(|&start| start < self.cursor_position)
                .unwrap_or(0)
        } else {
            starts
                .into_iter()
                .find(|&start| start > self.cursor_position)
                .unwrap_or_else(|| self.input.chars().count())
        };
    }

    /// `cursor_history == history.len()` is the fresh line below the newest
    /// item, where Down lands after walking back up.
    pub fn navigate_history(&mut self, direction: i32) {
        if direction < 0 && self.cursor_history > 0 {
            self.cursor_history -= 1;
        } else if direction > 0 && self.cursor_history < self.history.len() {
            self.cursor_history += 1;
        }
        self.recall_selected();
    }

    pub fn scroll_history(&mut self, direction: i32) {
        let step = self.list_height.saturating_sub(1);
        if direction < 0 {
            self.cursor_history = self.cursor_history.saturating_sub(step);
        } else {
            self.cursor_history = self
                .cursor_history
                .saturating_add(step)
                .min(self.history.len().saturating_sub(1));
        }
        self.recall_selected();
    }

    fn recall_selected(&mut self) {
        match self.history.get(self.cursor_history) {
            Some(item) => self.input = item.input.clone(),
            None => self.input.clear(),
        }
        self.cursor_position = self.input.chars().count();
        self.input_scroll = 0;
        self.scroll_to_bottom = false;
    }

    pub fn clear_input(&mut self) {
        self.input.clear();
        self.cursor_position = 0;
        self.input_scroll = 0;
    }

    pub fn char_index_to_byte_index(s: &str, char_index: usize) -> usize {
        s.char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(s.len())
    }
}
