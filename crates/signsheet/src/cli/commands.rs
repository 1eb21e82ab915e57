//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Driver roster commands.
#[derive(Debug, Subcommand)]
pub enum DriversCommand {
    /// List every driver, shipped and added on this device
    List {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the staff number for a driver name (exact match)
    Lookup {
        /// Driver name as it appears in the list
        name: String,
    },

    /// Add a driver on this device
    Add {
        /// Driver name
        name: String,
        /// Staff number
        staff_number: String,
    },
}

/// Attendance record commands.
#[derive(Debug, Subcommand)]
pub enum RecordCommand {
    /// Load the record for a document on a date, creating it if needed
    Open {
        /// Document or PPE name
        name: String,
        /// Date as YYYY-MM-DD (defaults to today)
        #[arg(short, long)]
        date: Option<String>,
    },

    /// List all records, most recent first
    List {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show a record and its signatures
    Show(RecordIdArgs),

    /// Mark a driver as having received and signed a record
    Sign {
        /// Record id (`YYYY-MM-DD|Name`)
        id: String,
        /// Staff number of the signing driver
        staff_number: String,
    },

    /// Delete a record and all its signatures
    Delete {
        /// Record id (`YYYY-MM-DD|Name`)
        id: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// List drivers who have not signed a record yet
    Pending {
        /// Record id (`YYYY-MM-DD|Name`)
        id: String,
    },
}

/// Arguments naming a record, with optional JSON output.
#[derive(Debug, Args)]
pub struct RecordIdArgs {
    /// Record id (`YYYY-MM-DD|Name`)
    pub id: String,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}
