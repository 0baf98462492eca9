//! Terminal output for command results.
//!
//! Human-readable output goes to stdout with optional color; `--json` swaps
//! it for one pretty-printed JSON value per command. Warnings and errors
//! always go to stderr.

use serde::Serialize;
use std::io::{self, IsTerminal};

use docmerge::model::{Document, MergeKind, MergeOutcome};

/// Level of an output message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    /// Plain informational line.
    Info,
    /// Completed action.
    Success,
    /// Something skipped or degraded.
    Warning,
    /// Failure.
    Error,
    /// Extra detail, shown with `-v`.
    Debug,
}

/// Prints command results according to the global output flags.
#[derive(Debug, Clone)]
pub struct OutputFormatter {
    quiet: bool,
    verbose: bool,
    json: bool,
    colored: bool,
}

impl OutputFormatter {
    /// Create a formatter; color is enabled when stdout is a terminal.
    pub fn new(quiet: bool, verbose: bool, json: bool) -> Self {
        Self {
            quiet,
            verbose,
            json,
            colored: !json && io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
        }
    }

    /// Whether human-readable output should be printed.
    pub fn should_print(&self) -> bool {
        !self.quiet && !self.json
    }

    /// Whether results are printed as JSON.
    pub fn is_json(&self) -> bool {
        self.json
    }

    /// Whether `-v` was given.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn info(&self, message: &str) {
        if self.should_print() {
            self.print_message(MessageLevel::Info, message);
        }
    }

    pub fn success(&self, message: &str) {
        if self.should_print() {
            self.print_message(MessageLevel::Success, message);
        }
    }

    /// Shown even in quiet mode.
    pub fn warning(&self, message: &str) {
        self.print_message(MessageLevel::Warning, message);
    }

    pub fn error(&self, message: &str) {
        self.print_message(MessageLevel::Error, message);
    }

    pub fn debug(&self, message: &str) {
        if self.verbose && self.should_print() {
            self.print_message(MessageLevel::Debug, message);
        }
    }

    /// Print a `label: value` line, only with `-v`.
    pub fn detail(&self, label: &str, value: &str) {
        if self.verbose && self.should_print() {
            println!("  {label}: {value}");
        }
    }

    /// Print `value` as pretty JSON when in JSON mode.
    pub fn json<T: Serialize + ?Sized>(&self, value: &T) -> io::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        Ok(())
    }

    /// Print one line per document, or the whole list as JSON.
    pub fn documents(&self, documents: &[Document]) -> io::Result<()> {
        if self.json {
            return self.json(documents);
        }
        if !self.should_print() {
            return Ok(());
        }
        if documents.is_empty() {
            self.info("No documents");
            return Ok(());
        }
        for doc in documents {
            println!("{}", document_line(doc));
        }
        Ok(())
    }

    /// Print the outcome of a merge.
    pub fn merge_outcome(&self, outcome: &MergeOutcome) -> io::Result<()> {
        if self.json {
            return self.json(outcome);
        }
        let unit = match outcome.kind {
            MergeKind::Spreadsheet => "row",
            MergeKind::Pdf => "page",
        };
        self.success(&format!(
            "Merged {} {} files into document {} ({} {unit}{})",
            outcome.sources,
            outcome.kind.label(),
            outcome.id,
            outcome.items,
            if outcome.items == 1 { "" } else { "s" },
        ));
        self.detail("Stored at", &outcome.path);
        Ok(())
    }

    fn print_message(&self, level: MessageLevel, message: &str) {
        let (prefix, color_code) = match level {
            MessageLevel::Info => ("", ""),
            MessageLevel::Success => ("✓ ", "\x1b[32m"),
            MessageLevel::Warning => ("⚠ ", "\x1b[33m"),
            MessageLevel::Error => ("✗ ", "\x1b[31m"),
            MessageLevel::Debug => ("→ ", "\x1b[36m"),
        };
        let line = if self.colored && !color_code.is_empty() {
            format!("{color_code}{prefix}{message}\x1b[0m")
        } else {
            format!("{prefix}{message}")
        };

        match level {
            MessageLevel::Warning | MessageLevel::Error => eprintln!("{line}"),
            _ => println!("{line}"),
        }
    }
}

/// One-line summary of a document for listings.
pub fn document_line(doc: &Document) -> String {
    let mut line = format!("{:>5}  {}  {}", doc.id, doc.title, doc.file_path);
    let class: Vec<&str> = [doc.session.as_deref(), doc.semester.as_deref()]
        .into_iter()
        .flatten()
        .collect();
    if !class.is_empty() {
        line.push_str(&format!("  [{}]", class.join(", ")));
    }
    line
}
