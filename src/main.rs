mod calc_engine;
mod config;
mod history;
#[cfg(feature = "line")]
mod line_mode;
mod plain_mode;
#[cfg(feature = "tui")]
mod render_help;
mod session;
#[cfg(feature = "tui")]
mod tui_mode;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use config::Config;
use history::History;
use session::{render_reply, Session};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Full screen terminal interface
    Tui,
    /// Raw-mode line editor with recall
    Line,
    /// Reads lines from stdin, suitable for pipes
    Plain,
}

#[derive(Debug, Parser)]
#[command(name = "rpncalc", version, about = "Infix calculator evaluated through reverse Polish notation")]
struct Cli {
    /// Expression or command to run once, e.g. `rpncalc "2 + 3 * 4"`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    expression: Vec<String>,

    /// Interactive front-end; picked from the terminal when omitted
    #[arg(short, long, value_enum)]
    mode: Option<Mode>,

    /// Config file to use instead of the default location
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// History file, overrides the config
    #[arg(long)]
    history_file: Option<PathBuf>,

    /// Keep the history in memory only
    #[arg(long)]
    no_history: bool,

    /// Show evaluation steps for every calculation
    #[arg(short, long)]
    details: bool,
}

impl Cli {
    fn resolved_mode(&self) -> Mode {
        if let Some(mode) = self.mode {
            return mode;
        }
        if !io::stdin().is_terminal() {
            Mode::Plain
        } else if cfg!(feature = "tui") {
            Mode::Tui
        } else if cfg!(feature = "line") {
            Mode::Line
        } else {
            Mode::Plain
        }
    }
}

fn init_logging(mode: Option<Mode>) {
    // The full screen interface owns the terminal, so stay quiet unless asked.
    let fallback = if mode == Some(Mode::Tui) { "off" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn build_session(cli: &Cli, config: &Config) -> Session {
    let history = if cli.no_history || !config.persist_history {
        debug!("history kept in memory");
        History::in_memory()
    } else {
        let path = cli.history_file.clone().unwrap_or_else(|| config.history_file.clone());
        History::open(path)
    };
    let history = history.with_export_file_name(config.export_file_name.clone());
    Session::new(history, cli.details || config.details)
}

/// Returns false when the expression or command failed.
fn run_once(session: &mut Session, words: &[String]) -> bool {
    let input = words.join(" ");
    let reply = session.handle(&input);
    for line in render_reply(&reply) {
        println!("{line}");
    }
    !reply.is_failure()
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let mode = if cli.expression.is_empty() {
        Some(cli.resolved_mode())
    } else {
        None
    };
    init_logging(mode);

    let config = Config::load(cli.config.as_deref())?;
    let mut session = build_session(&cli, &config);

    let Some(mode) = mode else {
        let succeeded = run_once(&mut session, &cli.expression);
        return Ok(if succeeded { ExitCode::SUCCESS } else { ExitCode::FAILURE });
    };
    info!(?mode, "starting");

    match mode {
        #[cfg(feature = "tui")]
        Mode::Tui => tui_mode::run_tui(session)?,
        #[cfg(not(feature = "tui"))]
        Mode::Tui => anyhow::bail!("this build has no full screen interface, try --mode line or plain"),
        #[cfg(feature = "line")]
        Mode::Line => line_mode::run_line(&mut session)?,
        #[cfg(not(feature = "line"))]
        Mode::Line => anyhow::bail!("this build has no line editor, try --mode plain"),
        Mode::Plain => plain_mode::run_plain(&mut session, io::stdin().lock(), io::stdout().lock())?,
    }
    Ok(ExitCode::SUCCESS)
}
