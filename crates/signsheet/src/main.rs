//! `signsheet` - CLI for driver lookup and document sign-off sheets
//!
//! Each invocation opens the local database, performs one command and exits.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use signsheet::attendance::{format_uk_datetime, AttendanceRecord};
use signsheet::cli::{
    delete_prompt, read_confirmation, Cli, Command, ConfigCommand, DriversCommand, Message,
    RecordCommand, RecordIdArgs,
};
use signsheet::storage::{Degradation, PersistenceHealth};
use signsheet::{init_logging, lookup, AttendanceStore, Baseline, Config, Error, RosterStore};
use signsheet::{Storage, StorageStats};

/// Everything a data command needs, opened once per invocation.
#[derive(Debug)]
struct Session {
    config: Config,
    storage: Storage,
    baseline: Baseline,
}

impl Session {
    fn load(config_path: Option<PathBuf>) -> Result<Self> {
        Self::open(Config::load_from(config_path)?)
    }

    fn open(config: Config) -> Result<Self> {
        let path = config.database_path();
        let storage = Storage::open(&path)
            .with_context(|| format!("failed to open database at {}", path.display()))?;
        let baseline = config.baseline()?;
        Ok(Self {
            config,
            storage,
            baseline,
        })
    }

    fn roster(&self) -> RosterStore<&Storage> {
        RosterStore::load(
            &self.storage,
            self.config.storage.drivers_key.as_str(),
            self.baseline.clone(),
        )
    }

    fn records(&self) -> AttendanceStore<&Storage> {
        AttendanceStore::load(
            &self.storage,
            self.config.storage.records_key.as_str(),
            self.baseline.clone(),
        )
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    let Cli {
        config: config_path,
        command,
        ..
    } = cli;

    let result = match command {
        Command::Drivers(cmd) => Session::load(config_path).and_then(|s| handle_drivers(&s, cmd)),
        Command::Record(cmd) => Session::load(config_path).and_then(|s| handle_record(&s, cmd)),
        Command::Status(cmd) => {
            Session::load(config_path).and_then(|s| handle_status(&s, cmd.json))
        }
        Command::Config(cmd) => handle_config(config_path, cmd),
    };

    match result {
        Ok(code) => Ok(code),
        Err(e) => match e.downcast_ref::<Error>() {
            Some(err) if err.is_user_error() => {
                println!("{}", Message::error(err.to_string()));
                Ok(ExitCode::FAILURE)
            }
            _ => Err(e),
        },
    }
}

fn handle_drivers(session: &Session, cmd: DriversCommand) -> Result<ExitCode> {
    let mut roster = session.roster();

    match cmd {
        DriversCommand::List { json } => {
            let drivers = roster.combined_roster();
            if json {
                println!("{}", serde_json::to_string_pretty(&drivers)?);
            } else {
                for driver in &drivers {
                    let added = roster.added().iter().any(|a| a.name == driver.name);
                    println!(
                        "{:<32} {:>8}{}",
                        driver.name,
                        driver.staff_number,
                        if added { "  (added on this device)" } else { "" }
                    );
                }
                println!();
                println!(
                    "{} drivers ({} added on this device)",
                    drivers.len(),
                    roster.added().len()
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        DriversCommand::Lookup { name } => {
            let drivers = roster.combined_roster();
            match lookup::find_by_name(&drivers, &name) {
                Some(driver) => {
                    println!("{}: {}", driver.name, driver.staff_number);
                    Ok(ExitCode::SUCCESS)
                }
                None => {
                    println!("{}", Message::error(format!("No driver named \"{name}\".")));
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        DriversCommand::Add { name, staff_number } => {
            let driver = roster.add_driver(&name, &staff_number)?;
            println!("{}", Message::success("Driver added on this device."));
            println!("{}: {}", driver.name, driver.staff_number);
            Ok(report_write_failures(roster.health()))
        }
    }
}

fn handle_record(session: &Session, cmd: RecordCommand) -> Result<ExitCode> {
    let mut records = session.records();

    match cmd {
        RecordCommand::Open { name, date } => {
            let (outcome, _) = records.load_or_create(&name, date.as_deref())?;
            println!("{}", Message::success(outcome.to_string()));
            if let Some(record) = records.active_record() {
                print_record(&records, record);
            }
            Ok(report_write_failures(records.health()))
        }
        RecordCommand::List { json } => {
            let all = records.list_all();
            if json {
                println!("{}", serde_json::to_string_pretty(&all)?);
            } else if all.is_empty() {
                println!("No records yet. Open one with `signsheet record open <NAME>`.");
            } else {
                for record in all {
                    let progress = records.progress(record);
                    println!(
                        "{:<48} {:>4} of {}",
                        record.id, progress.signed, progress.total
                    );
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        RecordCommand::Show(RecordIdArgs { id, json }) => {
            let record = records.get(&id).ok_or_else(|| Error::record_not_found(&id))?;
            if json {
                println!("{}", serde_json::to_string_pretty(record)?);
            } else {
                print_record(&records, record);
            }
            Ok(ExitCode::SUCCESS)
        }
        RecordCommand::Sign { id, staff_number } => {
            records.select_existing(&id)?;
            let outcome = records.mark_signed(&staff_number)?;
            println!("{}", Message::success(outcome.to_string()));
            if let Some(record) = records.active_record() {
                println!("{}", records.progress(record));
            }
            Ok(report_write_failures(records.health()))
        }
        RecordCommand::Delete { id, yes } => {
            let record = records.select_existing(&id)?;
            if !yes {
                print!("{} [y/N] ", delete_prompt(record));
                io::stdout().flush()?;
                if !read_confirmation(&mut io::stdin().lock())? {
                    println!("Deletion cancelled.");
                    return Ok(ExitCode::SUCCESS);
                }
            }
            let deleted = records.delete()?;
            println!(
                "{}",
                Message::success(format!(
                    "Record \"{}\" deleted with {} signature(s).",
                    deleted.label(),
                    deleted.signed_count()
                ))
            );
            Ok(report_write_failures(records.health()))
        }
        RecordCommand::Pending { id } => {
            let record = records.get(&id).ok_or_else(|| Error::record_not_found(&id))?;
            let pending = records.unsigned_drivers(Some(record));
            if pending.is_empty() {
                println!("All drivers have signed for {}.", record.label());
            } else {
                for driver in &pending {
                    println!("{:<32} {:>8}", driver.name, driver.staff_number);
                }
                println!();
                println!("{} drivers still to sign.", pending.len());
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_record<S: signsheet::KeyValueStore>(
    records: &AttendanceStore<S>,
    record: &AttendanceRecord,
) {
    println!();
    println!("{}", record.label());
    println!("{}", "-".repeat(record.label().chars().count()));
    println!("Id:       {}", record.id);
    println!("Created:  {}", format_uk_datetime(&record.created_at));
    println!("{}", records.progress(record));

    if record.signatures.is_empty() {
        return;
    }
    println!();
    for signature in record.signatures_by_name() {
        println!(
            "{:<32} {:>8}  {}",
            signature.name,
            signature.staff_number,
            format_uk_datetime(&signature.timestamp)
        );
    }
}

/// Surface writes that did not reach storage; the process is about to exit
/// and those changes are lost.
fn report_write_failures(health: &PersistenceHealth) -> ExitCode {
    let mut failed = false;
    for event in health.events() {
        if let Degradation::WriteFailed { message, .. } = event {
            println!(
                "{}",
                Message::error(format!("Could not save changes on this device: {message}"))
            );
            failed = true;
        }
    }
    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn handle_status(session: &Session, json: bool) -> Result<ExitCode> {
    let roster = session.roster();
    let records = session.records();
    let stats: StorageStats = session.storage.stats()?;
    let issues: Vec<String> = roster
        .health()
        .events()
        .iter()
        .chain(records.health().events())
        .map(ToString::to_string)
        .collect();

    if json {
        let status = serde_json::json!({
            "database_path": session.storage.path(),
            "total_keys": stats.total_keys,
            "db_size_bytes": stats.db_size_bytes,
            "last_write": stats.last_write,
            "baseline_drivers": roster.baseline().len(),
            "added_drivers": roster.added().len(),
            "records": records.len(),
            "degraded": !issues.is_empty(),
            "issues": issues,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("signsheet status");
        println!("----------------");
        println!("Database:      {}", session.storage.path().display());
        println!("Size:          {} bytes", stats.db_size_bytes);
        println!(
            "Last write:    {}",
            stats
                .last_write
                .as_ref()
                .map_or_else(|| "never".to_string(), format_uk_datetime)
        );
        println!("Base drivers:  {}", roster.baseline().len());
        println!("Added drivers: {}", roster.added().len());
        println!("Records:       {}", records.len());
        if issues.is_empty() {
            println!("Storage:       ok");
        } else {
            println!("Storage:       degraded");
            for issue in &issues {
                println!("  - {issue}");
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_config(config_path: Option<PathBuf>, cmd: ConfigCommand) -> Result<ExitCode> {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = Config::load_from(config_path)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:  {}", config.database_path().display());
                println!("  Drivers key:    {}", config.storage.drivers_key);
                println!("  Records key:    {}", config.storage.records_key);
                println!();
                println!("[Roster]");
                match &config.roster.baseline_path {
                    Some(path) => println!("  Baseline file:  {}", path.display()),
                    None => println!("  Baseline file:  (shipped list)"),
                }
            }
        }
        ConfigCommand::Path => {
            let path = config_path.unwrap_or_else(Config::default_config_path);
            println!("{}", path.display());
        }
        ConfigCommand::Validate { file } => {
            let path = file
                .or(config_path)
                .unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            if let Err(e) = Config::load_from(Some(path)) {
                println!("{}", Message::error(format!("Configuration error: {e}")));
                return Ok(ExitCode::FAILURE);
            }
            println!("{}", Message::success("Configuration is valid."));
        }
    }
    Ok(ExitCode::SUCCESS)
}
