//! Message formatting and display.
//!
//! This module renders job events for the terminal, with support for quiet
//! and verbose modes and a machine-readable JSON-lines mode.
//!
//! # Examples
//!
//! ```
//! use mergesplit::output::formatter::OutputFormatter;
//!
//! let formatter = OutputFormatter::new(false, false);
//! formatter.info("Processing files...");
//! formatter.success("Operation completed");
//! formatter.error("Something went wrong");
//! ```

use std::io::{self, Write};

use crate::job::{ErrorRecord, JobEvent, LogLevel, format_elapsed};

/// Level of output message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    /// Informational message.
    Info,
    /// Success message.
    Success,
    /// Warning message.
    Warning,
    /// Error message.
    Error,
    /// Debug/verbose message.
    Debug,
}

impl From<LogLevel> for MessageLevel {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Info => Self::Info,
            LogLevel::Success => Self::Success,
            LogLevel::Warning => Self::Warning,
            LogLevel::Error => Self::Error,
        }
    }
}

/// Output formatter with configurable verbosity.
pub struct OutputFormatter {
    /// Whether to suppress non-error output.
    quiet: bool,
    /// Whether to show verbose output.
    verbose: bool,
    /// Whether to use colored output.
    colored: bool,
    /// Whether to print events as JSON lines instead of text.
    json: bool,
    /// Whether a status line is currently drawn and must be cleared first.
    status_drawn: bool,
    /// Last progress percentage seen, shown on the status line.
    percent: u8,
}

impl OutputFormatter {
    /// Create a new output formatter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - Suppress non-error output
    /// * `verbose` - Show verbose output
    pub fn new(quiet: bool, verbose: bool) -> Self {
        Self {
            quiet,
            verbose,
            colored: Self::should_use_color(),
            json: false,
            status_drawn: false,
            percent: 0,
        }
    }

    /// Switch to JSON-lines output.
    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    /// Create a quiet formatter (only errors).
    pub fn quiet() -> Self {
        Self::new(true, false)
    }

    /// Create a verbose formatter.
    pub fn verbose() -> Self {
        Self::new(false, true)
    }

    /// Detect if colored output should be used.
    ///
    /// Returns true if stdout is a TTY and TERM is set.
    fn should_use_color() -> bool {
        use std::io::IsTerminal;
        io::stdout().is_terminal() && std::env::var("TERM").is_ok()
    }

    /// Print an informational message.
    ///
    /// Suppressed in quiet mode.
    pub fn info(&self, message: &str) {
        if !self.quiet {
            self.print_message(MessageLevel::Info, message);
        }
    }

    /// Print a success message.
    ///
    /// Suppressed in quiet mode.
    pub fn success(&self, message: &str) {
        if !self.quiet {
            self.print_message(MessageLevel::Success, message);
        }
    }

    /// Print a warning message.
    ///
    /// Always displayed (even in quiet mode).
    pub fn warning(&self, message: &str) {
        self.print_message(MessageLevel::Warning, message);
    }

    /// Print an error message.
    ///
    /// Always displayed.
    pub fn error(&self, message: &str) {
        self.print_message(MessageLevel::Error, message);
    }

    /// Print a debug/verbose message.
    ///
    /// Only displayed in verbose mode.
    pub fn debug(&self, message: &str) {
        if self.verbose {
            self.print_message(MessageLevel::Debug, message);
        }
    }

    /// Render one job event.
    pub fn event(&mut self, event: &JobEvent) {
        if self.json {
            if let Ok(line) = serde_json::to_string(event) {
                println!("{line}");
            }
            return;
        }

        match event {
            JobEvent::Started { kind, inputs } => {
                self.clear_status();
                self.debug(&format!("{kind} started with {inputs} input(s)"));
            }
            JobEvent::Log { level, message } => {
                self.clear_status();
                match MessageLevel::from(*level) {
                    MessageLevel::Info => self.info(message),
                    MessageLevel::Success => self.success(message),
                    MessageLevel::Warning => self.warning(message),
                    MessageLevel::Error | MessageLevel::Debug => self.error(message),
                }
            }
            JobEvent::Progress { percent } => {
                self.percent = *percent;
                if !self.colored {
                    self.debug(&format!("Progress: {percent}%"));
                }
            }
            JobEvent::Elapsed { elapsed } => {
                if self.colored && !self.quiet {
                    let line = status_line(self.percent, &format_elapsed(*elapsed));
                    print!("\r\x1b[K{line}");
                    io::stdout().flush().ok();
                    self.status_drawn = true;
                } else {
                    self.debug(&format!("Elapsed: {}", format_elapsed(*elapsed)));
                }
            }
            JobEvent::ErrorReport { records } => {
                self.clear_status();
                self.error_summary(records);
            }
            JobEvent::Finished { .. } => self.clear_status(),
        }
    }

    /// Print the consolidated error report. Prints nothing when empty.
    ///
    /// Always displayed.
    pub fn error_summary(&self, records: &[ErrorRecord]) {
        if let Some(block) = error_summary_block(records) {
            print!("{block}");
            io::stdout().flush().ok();
        }
    }

    /// Print a message with level-appropriate formatting.
    fn print_message(&self, level: MessageLevel, message: &str) {
        let (prefix, color_code) = match level {
            MessageLevel::Info => ("", ""),
            MessageLevel::Success => ("✓ ", "\x1b[32m"), // Green
            MessageLevel::Warning => ("⚠ ", "\x1b[33m"), // Yellow
            MessageLevel::Error => ("✗ ", "\x1b[31m"),   // Red
            MessageLevel::Debug => ("→ ", "\x1b[36m"),   // Cyan
        };

        let reset = "\x1b[0m";

        if self.colored && !color_code.is_empty() {
            println!("{color_code}{prefix}{message}{reset}");
        } else {
            println!("{prefix}{message}");
        }
    }

    /// Clear the status line if one is drawn.
    fn clear_status(&mut self) {
        if self.status_drawn {
            print!("\r\x1b[K");
            io::stdout().flush().ok();
            self.status_drawn = false;
        }
    }

    /// Check if verbose output should be shown.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Check if quiet mode is enabled.
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Check if JSON-lines mode is enabled.
    pub fn is_json(&self) -> bool {
        self.json
    }
}

impl Default for OutputFormatter {
    fn default() -> Self {
        Self::new(false, false)
    }
}

const RULE: &str = "────────────────────────────────────────";

/// Framed "Error summary:" block, one record per line.
pub fn error_summary_block(records: &[ErrorRecord]) -> Option<String> {
    if records.is_empty() {
        return None;
    }

    let mut block = format!("{RULE}\nError summary:\n");
    for record in records {
        block.push_str(&format!("  {record}\n"));
    }
    block.push_str(RULE);
    block.push('\n');
    Some(block)
}

fn status_line(percent: u8, elapsed: &str) -> String {
    format!("[{percent:>3}%] Elapsed: {elapsed}")
}
