//! Command-line interface for signsheet.
//!
//! This module provides the CLI structure and the small pieces of
//! presentation shared by the command handlers in the `signsheet` binary.

mod commands;

use std::fmt;
use std::io::BufRead;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::attendance::AttendanceRecord;

pub use commands::{ConfigCommand, DriversCommand, RecordCommand, RecordIdArgs, StatusCommand};

/// signsheet - Driver roster lookup and document sign-off sheets
///
/// Look up driver staff numbers and record which drivers received and signed
/// for a document or PPE item on a given date.
#[derive(Debug, Parser)]
#[command(name = "signsheet")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Look up and add drivers
    #[command(subcommand)]
    Drivers(DriversCommand),

    /// Create, sign and delete attendance records
    #[command(subcommand)]
    Record(RecordCommand),

    /// Show storage and roster status
    Status(StatusCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        crate::logging::Verbosity::from_flags(self.quiet, self.verbose)
    }
}

/// How a user-facing message should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The action succeeded.
    Success,
    /// The action was rejected; nothing changed.
    Error,
}

/// A user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Presentation class.
    pub severity: Severity,
    /// Message text.
    pub text: String,
}

impl Message {
    /// A success message.
    #[must_use]
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Success,
            text: text.into(),
        }
    }

    /// An error message.
    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            text: text.into(),
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.severity {
            Severity::Success => write!(f, "\u{2713} {}", self.text),
            Severity::Error => write!(f, "\u{2717} {}", self.text),
        }
    }
}

/// Confirmation question asked before deleting `record`.
#[must_use]
pub fn delete_prompt(record: &AttendanceRecord) -> String {
    format!(
        "Delete record \"{}\" on {}?\nThis will remove all signatures for this document on this date.",
        record.name, record.date
    )
}

/// Whether an answer to a yes/no prompt means yes.
#[must_use]
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Read one line from `input` and interpret it as a yes/no answer.
///
/// End of input counts as "no".
///
/// # Errors
///
/// Returns an error if reading from `input` fails.
pub fn read_confirmation<R: BufRead>(input: &mut R) -> std::io::Result<bool> {
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(is_affirmative(&answer))
}
