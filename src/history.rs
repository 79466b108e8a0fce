use anyhow::{bail, Context, Result};
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const DEFAULT_HISTORY_FILE: &str = "calc_history.txt";
pub const DEFAULT_EXPORT_FILE: &str = "log.log";

const SEPARATOR: &str = " = ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalculationEntry {
    pub expression: String,
    pub result: String,
}

impl CalculationEntry {
    pub fn new(expression: impl Into<String>, result: impl Into<String>) -> Self {
        CalculationEntry {
            expression: expression.into(),
            result: result.into(),
        }
    }

    /// Splits `"<expr> = <result>"` on the first separator.
    pub fn parse_line(line: &str) -> Option<Self> {
        let (expression, result) = line.split_once(SEPARATOR)?;
        Some(Self::new(expression, result))
    }
}

impl fmt::Display for CalculationEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.expression, SEPARATOR, self.result)
    }
}

/// Successful calculations, mirrored to a text file one entry per line.
pub struct History {
    entries: Vec<CalculationEntry>,
    path: Option<PathBuf>,
    export_file_name: String,
}

impl History {
    /// Loads the file if it exists. A file that cannot be read leaves the
    /// history empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match load_entries(&path) {
            Ok(entries) => {
                info!(path = %path.display(), count = entries.len(), "history loaded");
                entries
            }
            Err(e) => {
                warn!(path = %path.display(), "could not load history: {e:#}");
                Vec::new()
            }
        };

        History {
            entries,
            path: Some(path),
            export_file_name: DEFAULT_EXPORT_FILE.to_string(),
        }
    }

    pub fn in_memory() -> Self {
        History {
            entries: Vec::new(),
            path: None,
            export_file_name: DEFAULT_EXPORT_FILE.to_string(),
        }
    }

    pub fn with_export_file_name(mut self, name: impl Into<String>) -> Self {
        self.export_file_name = name.into();
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn entries(&self) -> &[CalculationEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entry stays in memory even if the file could not be rewritten.
    pub fn record(&mut self, expression: &str, result: &str) -> Result<()> {
        self.entries.push(CalculationEntry::new(expression, result));
        self.save()
    }

    pub fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        self.save()
    }

    fn save(&self) -> Result<()> {
        if let Some(path) = &self.path {
            write_entries(path, &self.entries)?;
        }
        Ok(())
    }

    /// Blank input and directories both get the export file name, anything
    /// else is used as given. Exports never overwrite the history file
    /// through a blank target.
    pub fn resolve_target(&self, user_input: &str) -> PathBuf {
        let target = PathBuf::from(user_input.trim());
        if user_input.trim().is_empty() || target.is_dir() {
            target.join(&self.export_file_name)
        } else {
            target
        }
    }

    /// Returns the absolute path that was written.
    pub fn export_all(&self, user_input: &str) -> Result<PathBuf> {
        write_entries(&self.resolve_target(user_input), &self.entries)
    }

    pub fn export_selected(&self, indexes: &[usize], user_input: &str) -> Result<PathBuf> {
        let selected: Vec<CalculationEntry> = indexes
            .iter()
            .filter_map(|&i| self.entries.get(i).cloned())
            .collect();

        if selected.is_empty() {
            bail!("no matching entries selected for export");
        }

        write_entries(&self.resolve_target(user_input), &selected)
    }
}

fn load_entries(path: &Path) -> Result<Vec<CalculationEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    read_entries(BufReader::new(file))
}

/// Lines without the `" = "` separator are skipped.
pub fn read_entries<R: BufRead>(reader: R) -> Result<Vec<CalculationEntry>> {
    let mut entries = Vec::new();
    for line in reader.lines() {
        let line = line.context("failed to read history line")?;
        if let Some(entry) = CalculationEntry::parse_line(&line) {
            entries.push(entry);
        }
    }
    Ok(entries)
}

pub fn write_entries_to<W: Write>(mut writer: W, entries: &[CalculationEntry]) -> io::Result<()> {
    for entry in entries {
        writeln!(writer, "{entry}")?;
    }
    writer.flush()
}

fn write_entries(path: &Path, entries: &[CalculationEntry]) -> Result<PathBuf> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    write_entries_to(BufWriter::new(file), entries)
        .with_context(|| format!("failed to write {}", path.display()))?;

    std::path::absolute(path).with_context(|| format!("failed to resolve {}", path.display()))
}

pub struct Selection {
    pub indexes: Vec<usize>,
    pub warnings: Vec<String>,
}

/// Parses `"0, 2, 5"` against a history of `len` entries. Bad parts are
/// skipped, each with a warning.
pub fn parse_selection(input: &str, len: usize) -> Selection {
    let mut selection = Selection {
        indexes: Vec::new(),
        warnings: Vec::new(),
    };

    for part in input.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        match part.parse::<usize>() {
            Ok(index) if index < len => selection.indexes.push(index),
            Ok(index) => selection
                .warnings
                .push(format!("Index {index} is outside the history range, skipped.")),
            Err(_) => selection
                .warnings
                .push(format!("'{part}' is not a number, skipped.")),
        }
    }

    selection
}
