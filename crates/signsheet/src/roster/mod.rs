//! Driver roster: the shipped baseline plus drivers added on this device.
//!
//! The combined roster is never stored. It is recomputed from the baseline
//! and the device additions on every read, keyed by lower-cased name with
//! device additions taking precedence.

mod baseline;

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::error::{Error, Result};
use crate::storage::{
    json_kind, read_json, write_json, Degradation, KeyValueStore, PersistenceHealth,
};

pub use baseline::{parse_roster, Baseline};

/// A driver on the roster.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    /// Display name, unique case-insensitively within the combined roster.
    pub name: String,
    /// Staff number, the external identifier.
    pub staff_number: String,
}

impl Driver {
    /// Create a driver.
    #[must_use]
    pub fn new(name: impl Into<String>, staff_number: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            staff_number: staff_number.into(),
        }
    }
}

/// Identity key for a name: lower-cased char by char.
///
/// Two names with the same key are the same driver.
#[must_use]
pub fn name_key(name: &str) -> String {
    name.chars().flat_map(char::to_lowercase).collect()
}

/// Ordering key for a name: accents stripped, then lower-cased.
fn collation_key(name: &str) -> String {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Compare two names the way the roster is displayed, ignoring case and
/// accents ("Éamon" sorts with "E").
#[must_use]
pub fn cmp_names(a: &str, b: &str) -> Ordering {
    collation_key(a).cmp(&collation_key(b))
}

/// Case-insensitive name equality, using [`name_key`].
#[must_use]
pub fn same_name(a: &str, b: &str) -> bool {
    name_key(a) == name_key(b)
}

/// Merge device additions over the baseline.
///
/// Entries are unique by [`name_key`]; later entries replace earlier
/// ones, so an added driver overrides a baseline driver of the same name.
/// The result is sorted by name.
#[must_use]
pub fn merge_roster(baseline: &[Driver], added: &[Driver]) -> Vec<Driver> {
    let mut by_name: HashMap<String, &Driver> = HashMap::new();
    for driver in baseline.iter().chain(added) {
        by_name.insert(name_key(&driver.name), driver);
    }

    let mut roster: Vec<Driver> = by_name.into_values().cloned().collect();
    roster.sort_by(|a, b| cmp_names(&a.name, &b.name).then_with(|| a.name.cmp(&b.name)));
    roster
}

/// The roster store: baseline drivers plus device additions.
///
/// Device additions are read once from the key-value store when the roster
/// is loaded and written back in full after every addition.
#[derive(Debug)]
pub struct RosterStore<S> {
    store: S,
    key: String,
    baseline: Baseline,
    added: Vec<Driver>,
    health: PersistenceHealth,
}

impl<S: KeyValueStore> RosterStore<S> {
    /// Load the roster, reading device additions stored under `key`.
    ///
    /// Missing or malformed data loads as "no additions".
    pub fn load(store: S, key: impl Into<String>, baseline: Baseline) -> Self {
        let key = key.into();
        let mut health = PersistenceHealth::default();
        let added = load_added(&store, &key, &mut health);
        debug!(
            "Roster loaded: {} baseline, {} added on device",
            baseline.len(),
            added.len()
        );

        Self {
            store,
            key,
            baseline,
            added,
            health,
        }
    }

    /// The effective roster, sorted by name.
    #[must_use]
    pub fn combined_roster(&self) -> Vec<Driver> {
        merge_roster(self.baseline.drivers(), &self.added)
    }

    /// Add a driver on this device.
    ///
    /// Both fields are trimmed. No uniqueness check is made on the staff
    /// number.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if either field is empty, or
    /// [`Error::DuplicateName`] if the name is already on the combined roster
    /// (case-insensitive).
    pub fn add_driver(&mut self, name: &str, staff_number: &str) -> Result<Driver> {
        let name = name.trim();
        let staff_number = staff_number.trim();
        if name.is_empty() || staff_number.is_empty() {
            return Err(Error::validation(
                if name.is_empty() { "name" } else { "staff_number" },
                "Please enter both a name and staff number.",
            ));
        }

        if self
            .combined_roster()
            .iter()
            .any(|d| same_name(&d.name, name))
        {
            return Err(Error::duplicate_name(name));
        }

        let driver = Driver::new(name, staff_number);
        self.added.push(driver.clone());
        write_json(&self.store, &self.key, &self.added, &mut self.health);
        info!(
            "Added driver {} ({}) on this device",
            driver.name, driver.staff_number
        );
        Ok(driver)
    }

    /// The shipped baseline.
    #[must_use]
    pub fn baseline(&self) -> &Baseline {
        &self.baseline
    }

    /// Drivers added on this device, in the order they were added.
    #[must_use]
    pub fn added(&self) -> &[Driver] {
        &self.added
    }

    /// Persistence fallbacks taken by this store.
    #[must_use]
    pub fn health(&self) -> &PersistenceHealth {
        &self.health
    }

    /// Whether this store fell back on missing/corrupt data or a failed write.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.health.is_degraded()
    }
}

fn load_added<S: KeyValueStore>(
    store: &S,
    key: &str,
    health: &mut PersistenceHealth,
) -> Vec<Driver> {
    let items = match read_json(store, key, health) {
        None => return Vec::new(),
        Some(Value::Array(items)) => items,
        Some(other) => {
            health.record(Degradation::Corrupt {
                key: key.to_string(),
                message: format!("expected an array, found {}", json_kind(&other)),
            });
            return Vec::new();
        }
    };

    let mut added = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<Driver>(item) {
            Ok(driver) => added.push(driver),
            Err(e) => health.record(Degradation::Corrupt {
                key: key.to_string(),
                message: format!("skipped entry {index}: {e}"),
            }),
        }
    }
    added
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::init_test_logging;
    use crate::storage::MemoryStore;

    const KEY: &str = "driver-staff-lookup-extra-drivers";

    fn small_baseline() -> Baseline {
        Baseline::from_drivers(vec![
            Driver::new("Zoe Quinn", "3"),
            Driver::new("adam scanlon", "1"),
            Driver::new("Brian Wakefield", "2"),
        ])
    }

    #[test]
    fn test_driver_json_shape() {
        let json = serde_json::to_string(&Driver::new("Adam Scanlon", "497584")).unwrap();
        assert_eq!(json, r#"{"name":"Adam Scanlon","staffNumber":"497584"}"#);
    }

    #[test]
    fn test_cmp_names_ignores_case() {
        assert_eq!(cmp_names("adam", "Adam"), Ordering::Equal);
        assert_eq!(cmp_names("adam", "Brian"), Ordering::Less);
        assert_eq!(cmp_names("Zoe", "brian"), Ordering::Greater);
        assert!(same_name("ADAM SCANLON", "Adam Scanlon"));
    }

    #[test]
    fn test_merge_sorts_case_insensitively() {
        let roster = merge_roster(small_baseline().drivers(), &[]);
        let names: Vec<_> = roster.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["adam scanlon", "Brian Wakefield", "Zoe Quinn"]);
    }

    #[test]
    fn test_merge_sorts_accented_names_with_their_base_letter() {
        let baseline = [
            Driver::new("Zoe Quinn", "1"),
            Driver::new("Patrick Ryan", "2"),
            Driver::new("Nora Kelly", "3"),
        ];
        let added = [Driver::new("Órla Murphy", "4"), Driver::new("Éamon Walsh", "5")];

        let roster = merge_roster(&baseline, &added);
        let names: Vec<_> = roster.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Éamon Walsh",
                "Nora Kelly",
                "Órla Murphy",
                "Patrick Ryan",
                "Zoe Quinn"
            ]
        );
    }

    #[test]
    fn test_cmp_names_ignores_accents() {
        assert_eq!(cmp_names("Seán", "sean"), Ordering::Equal);
        assert_eq!(cmp_names("Éamon", "Nora"), Ordering::Less);
        assert!(!same_name("Seán", "Sean"));
    }

    #[test]
    fn test_duplicate_check_and_merge_agree_on_case_folding() {
        let store = MemoryStore::new();
        let baseline = Baseline::from_drivers(vec![Driver::new("κωστας", "1")]);
        let mut roster = RosterStore::load(&store, KEY, baseline);

        roster.add_driver("ΚΩΣΤΑΣ", "2").unwrap();
        assert_eq!(roster.combined_roster().len(), 2);

        let err = roster.add_driver("κωστασ", "3").unwrap_err();
        assert!(matches!(err, Error::DuplicateName { .. }));
    }

    #[test]
    fn test_merge_added_overrides_baseline() {
        let added = vec![Driver::new("Adam Scanlon", "999")];
        let roster = merge_roster(small_baseline().drivers(), &added);

        assert_eq!(roster.len(), 3);
        assert_eq!(roster[0], Driver::new("Adam Scanlon", "999"));
    }

    #[test]
    fn test_merge_later_addition_wins() {
        let added = vec![Driver::new("New Person", "10"), Driver::new("new person", "11")];
        let roster = merge_roster(&[], &added);
        assert_eq!(roster, vec![Driver::new("new person", "11")]);
    }

    #[test]
    fn test_merge_is_deterministic() {
        let added = vec![Driver::new("Carl Added", "7")];
        let first = merge_roster(small_baseline().drivers(), &added);
        for _ in 0..10 {
            assert_eq!(merge_roster(small_baseline().drivers(), &added), first);
        }
    }

    #[test]
    fn test_load_without_data() {
        let store = MemoryStore::new();
        let roster = RosterStore::load(&store, KEY, small_baseline());

        assert!(roster.added().is_empty());
        assert_eq!(roster.combined_roster().len(), 3);
        assert!(!roster.is_degraded());
    }

    #[test]
    fn test_load_reads_stored_additions() {
        let store = MemoryStore::new();
        store.insert(KEY, r#"[{"name":"Carl Added","staffNumber":"7"}]"#);
        let roster = RosterStore::load(&store, KEY, small_baseline());

        assert_eq!(roster.added(), &[Driver::new("Carl Added", "7")]);
        assert_eq!(roster.combined_roster().len(), 4);
    }

    #[test]
    fn test_load_corrupt_json_is_empty_and_degraded() {
        init_test_logging();
        let store = MemoryStore::new();
        store.insert(KEY, "not json at all");
        let roster = RosterStore::load(&store, KEY, small_baseline());

        assert!(roster.added().is_empty());
        assert!(roster.is_degraded());
    }

    #[test]
    fn test_load_non_array_is_empty_and_degraded() {
        let store = MemoryStore::new();
        store.insert(KEY, r#"{"name":"Carl Added","staffNumber":"7"}"#);
        let roster = RosterStore::load(&store, KEY, small_baseline());

        assert!(roster.added().is_empty());
        assert!(roster.health().events()[0].to_string().contains("an object"));
    }

    #[test]
    fn test_load_skips_malformed_entries() {
        let store = MemoryStore::new();
        store.insert(
            KEY,
            r#"[{"name":"Carl Added","staffNumber":"7"}, {"staffNumber":"8"}, 42]"#,
        );
        let roster = RosterStore::load(&store, KEY, small_baseline());

        assert_eq!(roster.added().len(), 1);
        assert_eq!(roster.health().events().len(), 2);
    }

    #[test]
    fn test_add_driver_persists() {
        let store = MemoryStore::new();
        let mut roster = RosterStore::load(&store, KEY, small_baseline());

        let driver = roster.add_driver("  Carl Added ", " 7 ").unwrap();
        assert_eq!(driver, Driver::new("Carl Added", "7"));
        assert_eq!(
            store.snapshot(KEY).as_deref(),
            Some(r#"[{"name":"Carl Added","staffNumber":"7"}]"#)
        );

        let reloaded = RosterStore::load(&store, KEY, small_baseline());
        assert_eq!(reloaded.combined_roster(), roster.combined_roster());
    }

    #[test]
    fn test_add_driver_rejects_baseline_name() {
        let store = MemoryStore::new();
        let mut roster = RosterStore::load(&store, KEY, Baseline::shipped());

        let err = roster.add_driver("Adam Scanlon", "000000").unwrap_err();
        assert!(matches!(err, Error::DuplicateName { .. }));
        assert!(store.snapshot(KEY).is_none());
    }

    #[test]
    fn test_add_driver_rejects_name_case_insensitively() {
        let store = MemoryStore::new();
        let mut roster = RosterStore::load(&store, KEY, small_baseline());
        roster.add_driver("Carl Added", "7").unwrap();

        assert!(roster.add_driver("CARL ADDED", "8").is_err());
        assert!(roster.add_driver("ADAM SCANLON", "9").is_err());
        assert_eq!(roster.added().len(), 1);
    }

    #[test]
    fn test_add_driver_allows_duplicate_staff_number() {
        let store = MemoryStore::new();
        let mut roster = RosterStore::load(&store, KEY, small_baseline());

        assert!(roster.add_driver("Other Adam", "1").is_ok());
    }

    #[test]
    fn test_add_driver_requires_both_fields() {
        let store = MemoryStore::new();
        let mut roster = RosterStore::load(&store, KEY, small_baseline());

        let err = roster.add_driver("   ", "7").unwrap_err();
        assert!(matches!(err, Error::Validation { field: "name", .. }));
        let err = roster.add_driver("Carl Added", "").unwrap_err();
        assert!(matches!(err, Error::Validation { field: "staff_number", .. }));
        assert!(roster.added().is_empty());
    }

    #[test]
    fn test_add_driver_survives_write_failure_in_memory() {
        init_test_logging();
        let store = MemoryStore::new();
        store.fail_writes(true);
        let mut roster = RosterStore::load(&store, KEY, small_baseline());

        roster.add_driver("Carl Added", "7").unwrap();
        assert_eq!(roster.combined_roster().len(), 4);
        assert!(roster.is_degraded());
        assert!(store.snapshot(KEY).is_none());
    }
}
