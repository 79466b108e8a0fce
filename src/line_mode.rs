use anyhow::{Context, Result};
use std::io::{stdin, stdout, Write};
use termion::{
    clear::CurrentLine as ClearLine,
    cursor::{DetectCursorPos, Goto},
    event::Key,
    input::TermRead,
    raw::IntoRawMode,
};

use crate::session::{render_reply, Reply, Session};

const PROMPT: &str = "Expression: ";

// Cursor positions are counted in chars, the string is indexed in bytes.
fn char_index_to_byte_index(s: &str, char_index: usize) -> usize {
    s.char_indices()
        .nth(char_index)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

fn remove_char_at(s: &mut String, char_index: usize) {
    let byte_idx = char_index_to_byte_index(s, char_index);
    if let Some(c) = s[byte_idx..].chars().next() {
        s.drain(byte_idx..byte_idx + c.len_utf8());
    }
}

pub fn run_line(session: &mut Session) -> Result<()> {
    println!("Rust Console Calculator");
    println!("Supports: + - * / % // ^ (or **), parentheses");
    println!("Navigation: ←/→, Backspace/Delete, Home/End, ↑/↓ for recall");
    println!("Type 'help' for commands, 'quit' to exit\n");

    let mut stdout = stdout().into_raw_mode().context("failed to enable raw mode")?;
    let stdin = stdin();
    let mut keys = stdin.keys();

    let mut recall: Vec<String> = session
        .history()
        .entries()
        .iter()
        .map(|entry| entry.expression.clone())
        .collect();
    let mut recall_index = recall.len();

    loop {
        write!(stdout, "{}{}", ClearLine, PROMPT)?;
        stdout.flush()?;

        let mut expression = String::new();
        let mut cursor_pos = 0;
        let (_, initial_y) = stdout.cursor_pos()?;

        loop {
            write!(stdout, "{}{}{}{}", Goto(1, initial_y), ClearLine, PROMPT, expression)?;
            let column = PROMPT.len() + cursor_pos + 1;
            write!(stdout, "{}", Goto(column as u16, initial_y))?;
            stdout.flush()?;

            let Some(key) = keys.next() else {
                write!(stdout, "\r\n")?;
                return Ok(());
            };

            match key? {
                Key::Char('\n') => break,
                Key::Ctrl('c') | Key::Ctrl('d') => {
                    write!(stdout, "\r\nGoodbye!\r\n")?;
                    return Ok(());
                }
                Key::Ctrl('u') => {
                    expression.clear();
                    cursor_pos = 0;
                }
                Key::Char(c) => {
                    let byte_idx = char_index_to_byte_index(&expression, cursor_pos);
                    expression.insert(byte_idx, c);
                    cursor_pos += 1;
                }
                Key::Backspace if cursor_pos > 0 => {
                    cursor_pos -= 1;
                    remove_char_at(&mut expression, cursor_pos);
                }
                Key::Delete if cursor_pos < expression.chars().count() => {
                    remove_char_at(&mut expression, cursor_pos);
                }
                Key::Left if cursor_pos > 0 => cursor_pos -= 1,
                Key::Right if cursor_pos < expression.chars().count() => cursor_pos += 1,
                Key::Home => cursor_pos = 0,
                Key::End => cursor_pos = expression.chars().count(),
                Key::Up if recall_index > 0 => {
                    recall_index -= 1;
                    expression = recall[recall_index].clone();
                    cursor_pos = expression.chars().count();
                }
                Key::Down => {
                    if recall_index + 1 < recall.len() {
                        recall_index += 1;
                        expression = recall[recall_index].clone();
                    } else {
                        recall_index = recall.len();
                        expression.clear();
                    }
                    cursor_pos = expression.chars().count();
                }
                _ => {}
            }
        }

        let input = expression.trim();
        if input.is_empty() {
            write!(stdout, "\r\n")?;
            continue;
        }

        recall.push(input.to_string());
        recall_index = recall.len();

        let reply = session.handle(input);
        write!(stdout, "\r\n")?;
        for line in render_reply(&reply) {
            write!(stdout, "{line}\r\n")?;
        }
        write!(stdout, "\r\n")?;

        match reply {
            Reply::Quit => {
                stdout.flush()?;
                return Ok(());
            }
            Reply::Cleared => {
                recall.clear();
                recall_index = 0;
            }
            _ => {}
        }
    }
}
