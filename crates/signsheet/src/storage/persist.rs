//! Whole-blob JSON persistence with degraded-mode tracking.
//!
//! Reads treat a missing key, a failing backend or unparsable JSON as "no
//! data". Writes that fail are dropped. Neither case is returned to the
//! caller; both are logged and recorded in a [`PersistenceHealth`].

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use super::KeyValueStore;

/// A persistence fallback that was swallowed instead of surfaced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Degradation {
    /// Stored data had the wrong encoding or shape and was treated as empty.
    #[error("corrupt data under '{key}': {message}")]
    Corrupt {
        /// Key that held the bad data.
        key: String,
        /// What was wrong with it.
        message: String,
    },
    /// The backend failed to read a key.
    #[error("failed to read '{key}': {message}")]
    ReadFailed {
        /// Key being read.
        key: String,
        /// The backend error.
        message: String,
    },
    /// The backend failed to write a key; in-memory state is ahead of storage.
    #[error("failed to write '{key}': {message}")]
    WriteFailed {
        /// Key being written.
        key: String,
        /// The backend error.
        message: String,
    },
}

impl Degradation {
    /// The storage key involved.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Corrupt { key, .. }
            | Self::ReadFailed { key, .. }
            | Self::WriteFailed { key, .. } => key,
        }
    }
}

/// Record of every persistence fallback taken by a store this session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistenceHealth {
    events: Vec<Degradation>,
}

impl PersistenceHealth {
    /// Record a fallback and log it.
    pub fn record(&mut self, event: Degradation) {
        warn!("Persistence degraded: {}", event);
        self.events.push(event);
    }

    /// Whether any fallback has been taken.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        !self.events.is_empty()
    }

    /// All recorded fallbacks, oldest first.
    #[must_use]
    pub fn events(&self) -> &[Degradation] {
        &self.events
    }
}

/// Read and parse the JSON blob stored under `key`.
///
/// Returns `None` when the key is absent or unusable.
pub(crate) fn read_json<S: KeyValueStore + ?Sized>(
    store: &S,
    key: &str,
    health: &mut PersistenceHealth,
) -> Option<Value> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!("No stored data under '{}'", key);
            return None;
        }
        Err(e) => {
            health.record(Degradation::ReadFailed {
                key: key.to_string(),
                message: e.to_string(),
            });
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            health.record(Degradation::Corrupt {
                key: key.to_string(),
                message: e.to_string(),
            });
            None
        }
    }
}

/// Short name of a JSON value's type, for shape errors.
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Serialize `value` and replace the blob stored under `key`.
pub(crate) fn write_json<S: KeyValueStore + ?Sized, T: Serialize + ?Sized>(
    store: &S,
    key: &str,
    value: &T,
    health: &mut PersistenceHealth,
) {
    let result = serde_json::to_string(value)
        .map_err(crate::Error::from)
        .and_then(|json| store.set(key, &json));

    match result {
        Ok(()) => debug!("Persisted '{}'", key),
        Err(e) => health.record(Degradation::WriteFailed {
            key: key.to_string(),
            message: e.to_string(),
        }),
    }
}
