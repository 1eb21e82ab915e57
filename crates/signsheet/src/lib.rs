//! `signsheet` - Driver roster lookup and document sign-off sheets
//!
//! This library keeps a roster of drivers (a shipped baseline plus drivers
//! added on the device) and per-document attendance records listing which
//! baseline drivers received and signed for a document or PPE item on a
//! given date. Everything is persisted as JSON blobs in a local key-value
//! store.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod attendance;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod lookup;
pub mod roster;
pub mod storage;

pub use attendance::{AttendanceRecord, AttendanceStore, LoadOutcome, SignOutcome, Signature};
pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use roster::{Baseline, Driver, RosterStore};
pub use storage::{KeyValueStore, MemoryStore, Storage, StorageStats};
