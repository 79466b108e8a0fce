use anyhow::{Context, Result};
use std::io::{BufRead, Write};

use crate::session::{render_reply, Reply, Session};

/// Line-buffered loop for pipes and dumb terminals.
pub fn run_plain<R: BufRead, W: Write>(session: &mut Session, input: R, mut output: W) -> Result<()> {
    writeln!(output, "Rust Console Calculator")?;
    writeln!(output, "Type an expression, 'help' for commands or 'quit' to exit.")?;
    prompt(&mut output)?;

    for line in input.lines() {
        let line = line.context("failed to read input")?;
        let reply = session.handle(&line);
        for text in render_reply(&reply) {
            writeln!(output, "{text}")?;
        }
        if matches!(reply, Reply::Quit) {
            return Ok(());
        }
        prompt(&mut output)?;
    }

    writeln!(output)?;
    Ok(())
}

fn prompt<W: Write>(output: &mut W) -> Result<()> {
    write!(output, "> ")?;
    output.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::History;
    use std::io::Cursor;

    fn run(script: &str) -> (String, Session) {
        let mut session = Session::new(History::in_memory(), false);
        let mut output = Vec::new();
        run_plain(&mut session, Cursor::new(script), &mut output).unwrap();
        (String::from_utf8(output).unwrap(), session)
    }

    #[test]
    fn test_session_transcript() {
        let (output, session) = run("2+3*4\n(1+2\nhistory\nquit\n1+1\n");
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Rust Console Calculator",
                "Type an expression, 'help' for commands or 'quit' to exit.",
                ">   2 + 3 * 4 = 14",
                ">   ( 1 + 2 = Error: unbalanced parentheses",
                "> 0) 2+3*4 = 14",
                "> Goodbye!",
            ]
        );
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn test_end_of_input_stops_the_loop() {
        let (output, session) = run("7//2");
        assert!(output.contains("7 // 2 = 3"));
        assert_eq!(session.history().entries()[0].result, "3");
    }
}
