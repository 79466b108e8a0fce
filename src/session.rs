use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::calc_engine::{evaluate, evaluate_traced, format_result, spaced, EvalError, EvaluationTrace, Step};
use crate::history::{parse_selection, History};

pub const USAGE: &[&str] = &[
    "Operators: + - * / % // ^ (** is the same as ^), parentheses for grouping",
    "Decimal separator: '.' or ','",
    "  details <expression>            show every step of the evaluation",
    "  history                         list saved calculations",
    "  export [path]                   save the whole history to a file",
    "  export-selected <i, j> [into <path>]",
    "                                  save chosen history entries",
    "  clear                           forget the history",
    "  help                            show this text",
    "  quit                            exit",
];

#[derive(Debug, PartialEq, Eq)]
pub enum Command<'a> {
    Evaluate { expression: &'a str, details: bool },
    ShowHistory,
    Export { target: &'a str },
    ExportSelected { indexes: &'a str, target: &'a str },
    Clear,
    Help,
    Quit,
    Empty,
}

impl<'a> Command<'a> {
    pub fn parse(input: &'a str) -> Self {
        let input = input.trim();
        if input.is_empty() {
            return Command::Empty;
        }

        match input.to_lowercase().as_str() {
            "quit" | "exit" | "q" => return Command::Quit,
            "clear" | "reset" => return Command::Clear,
            "help" => return Command::Help,
            "history" => return Command::ShowHistory,
            _ => {}
        }

        if let Some(rest) = strip_keyword(input, "export-selected") {
            let (indexes, target) = match rest.split_once(" into ") {
                Some((indexes, target)) => (indexes.trim(), target.trim()),
                None => (rest, ""),
            };
            return Command::ExportSelected { indexes, target };
        }
        if let Some(target) = strip_keyword(input, "export") {
            return Command::Export { target };
        }

        if let Some(expression) = strip_keyword(input, "details") {
            return Command::Evaluate { expression, details: true };
        }
        if let Some(expression) = strip_suffix_keyword(input, "details") {
            return Command::Evaluate { expression, details: true };
        }

        Command::Evaluate { expression: input, details: false }
    }
}

/// `keyword` alone or followed by whitespace, case-insensitive.
fn strip_keyword<'a>(input: &'a str, keyword: &str) -> Option<&'a str> {
    let head = input.get(..keyword.len())?;
    let rest = &input[keyword.len()..];
    if head.eq_ignore_ascii_case(keyword) && (rest.is_empty() || rest.starts_with(char::is_whitespace)) {
        Some(rest.trim())
    } else {
        None
    }
}

fn strip_suffix_keyword<'a>(input: &'a str, keyword: &str) -> Option<&'a str> {
    let split = input.len().checked_sub(keyword.len())?;
    let tail = input.get(split..)?;
    let rest = &input[..split];
    if tail.eq_ignore_ascii_case(keyword) && rest.ends_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

#[derive(Debug, Clone)]
pub struct Calculation {
    pub expression: String,
    pub outcome: Result<String, EvalError>,
    pub steps: Vec<Step>,
    pub detailed_mode: bool,
    pub duration: Duration,
    /// Set when the result could not be written to the history file.
    pub save_warning: Option<String>,
}

#[derive(Debug)]
pub enum Reply {
    Calculated(Calculation),
    Info(Vec<String>),
    Error(String),
    Cleared,
    Help,
    Quit,
}

impl Reply {
    pub fn is_failure(&self) -> bool {
        match self {
            Reply::Calculated(calculation) => calculation.outcome.is_err(),
            Reply::Error(_) => true,
            _ => false,
        }
    }
}

pub struct Session {
    history: History,
    details_by_default: bool,
}

impl Session {
    pub fn new(history: History, details_by_default: bool) -> Self {
        Session { history, details_by_default }
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn handle(&mut self, input: &str) -> Reply {
        self.execute(Command::parse(input))
    }

    pub fn execute(&mut self, command: Command<'_>) -> Reply {
        match command {
            Command::Empty => Reply::Error("Expression cannot be empty.".to_string()),
            Command::Evaluate { expression, .. } if expression.is_empty() => {
                Reply::Error("Please enter a valid expression after 'details'.".to_string())
            }
            Command::Evaluate { expression, details } => {
                Reply::Calculated(self.calculate(expression, details || self.details_by_default))
            }
            Command::ShowHistory => Reply::Info(self.history_lines()),
            Command::Export { target } => self.export_all(target),
            Command::ExportSelected { indexes, target } => self.export_selected(indexes, target),
            Command::Clear => match self.history.clear() {
                Ok(()) => Reply::Cleared,
                Err(e) => Reply::Error(format!("History cleared, but the file was not updated: {e:#}")),
            },
            Command::Help => Reply::Help,
            Command::Quit => Reply::Quit,
        }
    }

    pub fn calculate(&mut self, expression: &str, detailed_mode: bool) -> Calculation {
        let start_time = Instant::now();
        let mut trace = EvaluationTrace::new(detailed_mode);
        let outcome = if detailed_mode {
            evaluate_traced(expression, &mut trace)
        } else {
            evaluate(expression)
        };
        let duration = start_time.elapsed();

        let save_warning = match &outcome {
            Ok(result) => self.history.record(expression, result).err().map(|e| {
                warn!("could not save history: {e:#}");
                format!("History was not saved: {e:#}")
            }),
            Err(e) => {
                debug!(expression, kind = e.kind(), "calculation failed");
                None
            }
        };

        Calculation {
            expression: expression.to_string(),
            outcome,
            steps: trace.steps,
            detailed_mode,
            duration,
            save_warning,
        }
    }

    fn history_lines(&self) -> Vec<String> {
        if self.history.is_empty() {
            return vec!["History is empty.".to_string()];
        }
        self.history
            .entries()
            .iter()
            .enumerate()
            .map(|(i, entry)| format!("{i}) {entry}"))
            .collect()
    }

    fn export_all(&self, target: &str) -> Reply {
        if target.is_empty() {
            return match self.history.path() {
                Some(path) => Reply::Info(vec![format!(
                    "Default history file: {}",
                    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf()).display()
                )]),
                None => Reply::Error("History is not persisted; give a path to export to.".to_string()),
            };
        }

        match self.history.export_all(target) {
            Ok(path) => Reply::Info(vec![format!("File saved: {}", path.display())]),
            Err(e) => Reply::Error(format!("Could not save the file: {e:#}")),
        }
    }

    fn export_selected(&self, indexes: &str, target: &str) -> Reply {
        if self.history.is_empty() {
            return Reply::Error("History is empty.".to_string());
        }

        let selection = parse_selection(indexes, self.history.len());
        if selection.indexes.is_empty() {
            let mut lines = selection.warnings;
            lines.push("No entries selected. Export cancelled.".to_string());
            return Reply::Info(lines);
        }

        let mut lines = selection.warnings;
        match self.history.export_selected(&selection.indexes, target) {
            Ok(path) => lines.push(format!("File saved: {}", path.display())),
            Err(e) => return Reply::Error(format!("Could not save the file: {e:#}")),
        }
        Reply::Info(lines)
    }
}

/// Plain text rendering of a reply, one string per output line.
pub fn render_reply(reply: &Reply) -> Vec<String> {
    match reply {
        Reply::Calculated(calculation) => render_calculation(calculation),
        Reply::Info(lines) => lines.clone(),
        Reply::Error(message) => vec![format!("Error: {message}")],
        Reply::Cleared => vec!["History cleared.".to_string()],
        Reply::Help => USAGE.iter().map(|line| line.to_string()).collect(),
        Reply::Quit => vec!["Goodbye!".to_string()],
    }
}

fn render_calculation(calculation: &Calculation) -> Vec<String> {
    let expression = spaced(&calculation.expression);
    let mut lines = match &calculation.outcome {
        Ok(result) => vec![format!("  {expression} = {result}")],
        Err(e) => vec![format!("  {expression} = Error: {e}")],
    };

    if calculation.detailed_mode && !calculation.steps.is_empty() {
        lines.push("  Step-by-step evaluation:".to_string());
        for (i, step) in calculation.steps.iter().enumerate() {
            lines.push(format!(
                "  Step {}: {} = {}",
                i + 1,
                step.operation,
                format_result(step.result)
            ));
        }
        lines.push(format!("  Time: {:.6} ms", calculation.duration.as_secs_f64() * 1000.0));
    }
    if let Some(warning) = &calculation.save_warning {
        lines.push(format!("  {warning}"));
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::tests::scratch_dir;
    use crate::history::CalculationEntry;

    fn session() -> Session {
        Session::new(History::in_memory(), false)
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("  "), Command::Empty);
        assert_eq!(Command::parse("QUIT"), Command::Quit);
        assert_eq!(Command::parse("history"), Command::ShowHistory);
        assert_eq!(Command::parse("export"), Command::Export { target: "" });
        assert_eq!(Command::parse("export logs/"), Command::Export { target: "logs/" });
        assert_eq!(
            Command::parse("export-selected 0, 2 into out.txt"),
            Command::ExportSelected { indexes: "0, 2", target: "out.txt" }
        );
        assert_eq!(
            Command::parse("export-selected 1"),
            Command::ExportSelected { indexes: "1", target: "" }
        );
    }

    #[test]
    fn test_parse_details() {
        assert_eq!(
            Command::parse("details 2+2"),
            Command::Evaluate { expression: "2+2", details: true }
        );
        assert_eq!(
            Command::parse("2+2 DETAILS"),
            Command::Evaluate { expression: "2+2", details: true }
        );
        assert_eq!(
            Command::parse("details"),
            Command::Evaluate { expression: "", details: true }
        );
        assert_eq!(
            Command::parse("exporter"),
            Command::Evaluate { expression: "exporter", details: false }
        );
    }

    #[test]
    fn test_successful_calculations_are_recorded() {
        let mut session = session();
        let reply = session.handle("2+3*4");
        assert_eq!(render_reply(&reply), vec!["  2 + 3 * 4 = 14"]);

        let reply = session.handle("5/0");
        assert!(reply.is_failure());
        assert_eq!(render_reply(&reply), vec!["  5 / 0 = Error: division by zero"]);

        assert_eq!(
            session.history().entries(),
            &[CalculationEntry::new("2+3*4", "14")]
        );
    }

    #[test]
    fn test_details_lists_steps() {
        let mut session = session();
        let lines = render_reply(&session.handle("details (2+3)*4"));
        assert_eq!(
            lines[..4],
            [
                "  ( 2 + 3 ) * 4 = 20",
                "  Step-by-step evaluation:",
                "  Step 1: 2 + 3 = 5",
                "  Step 2: 5 * 4 = 20",
            ]
        );
        assert_eq!(lines.len(), 5);
        assert!(lines[4].starts_with("  Time: ") && lines[4].ends_with(" ms"));
    }

    #[test]
    fn test_plain_calculation_has_no_trace() {
        let mut session = session();
        match session.handle("(2+3)*4") {
            Reply::Calculated(calculation) => {
                assert!(calculation.steps.is_empty());
                assert!(!calculation.detailed_mode);
            }
            other => panic!("unexpected reply {other:?}"),
        }
        assert_eq!(render_reply(&session.handle("(2+3)*4")), vec!["  ( 2 + 3 ) * 4 = 20"]);
    }

    #[test]
    fn test_details_by_default() {
        let mut session = Session::new(History::in_memory(), true);
        match session.handle("1+1") {
            Reply::Calculated(calculation) => assert_eq!(calculation.steps.len(), 1),
            other => panic!("unexpected reply {other:?}"),
        }
    }

    #[test]
    fn test_empty_input_is_rejected() {
        let mut session = session();
        assert_eq!(
            render_reply(&session.handle("")),
            vec!["Error: Expression cannot be empty."]
        );
        assert!(session.handle("details").is_failure());
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_history_listing() {
        let mut session = session();
        assert_eq!(render_reply(&session.handle("history")), vec!["History is empty."]);

        session.handle("1+1");
        session.handle("7//2");
        assert_eq!(
            render_reply(&session.handle("history")),
            vec!["0) 1+1 = 2", "1) 7//2 = 3"]
        );

        assert!(matches!(session.handle("clear"), Reply::Cleared));
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_export_without_path_reports_default_file() {
        let dir = scratch_dir("session-default");
        let mut session = Session::new(History::open(dir.join("h.txt")), false);
        let lines = render_reply(&session.handle("export"));
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("Default history file: "));
        assert!(lines[0].ends_with("h.txt"));

        assert!(!session.handle("export").is_failure());
        assert!(Session::new(History::in_memory(), false).handle("export").is_failure());
    }

    #[test]
    fn test_export_selected_reports_skipped_indexes() {
        let dir = scratch_dir("session-selected");
        let mut session = session();
        session.handle("1+1");
        session.handle("2*3");

        let target = dir.join("out.txt");
        let lines = render_reply(&session.handle(&format!(
            "export-selected 1, 5, x into {}",
            target.display()
        )));
        assert_eq!(lines[0], "Index 5 is outside the history range, skipped.");
        assert_eq!(lines[1], "'x' is not a number, skipped.");
        assert!(lines[2].starts_with("File saved: "));
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "2*3 = 6\n");

        let lines = render_reply(&session.handle("export-selected 7"));
        assert_eq!(lines.last().unwrap(), "No entries selected. Export cancelled.");
    }
}
