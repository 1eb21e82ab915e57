//! Attendance records: who received and signed for which document, when.
//!
//! [`AttendanceStore`] owns every record for the session plus the "active"
//! record the user is working on. Records live in one map keyed by record id,
//! read from the key-value store once at load and written back whole after
//! every mutation.
//!
//! Only baseline drivers can sign, and progress is reported against the
//! baseline size. Drivers added on the device are not counted.

mod record;

use std::collections::BTreeMap;

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::lookup;
use crate::roster::{cmp_names, Baseline, Driver};
use crate::storage::{
    json_kind, read_json, write_json, Degradation, KeyValueStore, PersistenceHealth,
};

pub use record::{
    format_uk_datetime, format_uk_datetime_in, record_id, AttendanceRecord, SignOutcome,
    Signature, ID_SEPARATOR,
};

/// Whether [`AttendanceStore::load_or_create`] found or made the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A new, empty record was created.
    Created,
    /// The record already existed and was left untouched.
    Loaded,
}

impl std::fmt::Display for LoadOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "New record created."),
            Self::Loaded => write!(f, "Existing record loaded."),
        }
    }
}

/// Signed count against the baseline roster size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Drivers who signed.
    pub signed: usize,
    /// Baseline roster size.
    pub total: usize,
}

impl std::fmt::Display for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} of {} drivers recorded for this document.",
            self.signed, self.total
        )
    }
}

/// Parse a record date, defaulting to today (local) when none is given.
///
/// # Errors
///
/// Returns [`Error::Validation`] if the date is not `YYYY-MM-DD`.
pub fn parse_record_date(input: Option<&str>, now: DateTime<Utc>) -> Result<NaiveDate> {
    match input.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(now.with_timezone(&Local).date_naive()),
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
            Error::validation(
                "date",
                format!("Please enter a date as YYYY-MM-DD, not {raw:?}."),
            )
        }),
    }
}

/// The attendance record store.
#[derive(Debug)]
pub struct AttendanceStore<S> {
    store: S,
    key: String,
    baseline: Baseline,
    records: BTreeMap<String, AttendanceRecord>,
    active: Option<String>,
    health: PersistenceHealth,
}

impl<S: KeyValueStore> AttendanceStore<S> {
    /// Load all records stored under `key`.
    ///
    /// Missing or malformed data loads as "no records". `baseline` decides
    /// who may sign.
    pub fn load(store: S, key: impl Into<String>, baseline: Baseline) -> Self {
        let key = key.into();
        let mut health = PersistenceHealth::default();
        let records = load_records(&store, &key, &mut health);
        debug!("Loaded {} attendance records", records.len());

        Self {
            store,
            key,
            baseline,
            records,
            active: None,
            health,
        }
    }

    /// Open the record for `name` on `date`, creating it if needed.
    ///
    /// See [`Self::load_or_create_at`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for a blank name or a malformed date.
    pub fn load_or_create(
        &mut self,
        name: &str,
        date: Option<&str>,
    ) -> Result<(LoadOutcome, &AttendanceRecord)> {
        self.load_or_create_at(name, date, Utc::now())
    }

    /// Open the record for `name` on `date` as of `now`.
    ///
    /// `name` is trimmed; a missing date means today. An existing record is
    /// returned untouched. A new record is created empty and persisted.
    /// Either way it becomes the active record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for a blank name or a malformed date.
    pub fn load_or_create_at(
        &mut self,
        name: &str,
        date: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(LoadOutcome, &AttendanceRecord)> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::validation(
                "name",
                "Please enter a document or PPE name.",
            ));
        }
        let date = parse_record_date(date, now)?;
        let id = record_id(date, name);

        let outcome = if self.records.contains_key(&id) {
            debug!("Loaded existing record {}", id);
            LoadOutcome::Loaded
        } else {
            self.records
                .insert(id.clone(), AttendanceRecord::new(name, date, now));
            self.persist();
            info!("Created record {}", id);
            LoadOutcome::Created
        };

        self.active = Some(id);
        let record = self.active_record().ok_or(Error::NoActiveRecord)?;
        Ok((outcome, record))
    }

    /// Make an existing record active.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RecordNotFound`] if no record has this id; the active
    /// record is left unchanged.
    pub fn select_existing(&mut self, id: &str) -> Result<&AttendanceRecord> {
        let record = self
            .records
            .get(id)
            .ok_or_else(|| Error::record_not_found(id))?;
        self.active = Some(id.to_string());
        Ok(record)
    }

    /// Mark a baseline driver as having received and signed the active
    /// record, timestamped now.
    ///
    /// # Errors
    ///
    /// See [`Self::mark_signed_at`].
    pub fn mark_signed(&mut self, staff_number: &str) -> Result<SignOutcome> {
        self.mark_signed_at(staff_number, Utc::now())
    }

    /// Mark a baseline driver as having signed the active record at `now`.
    ///
    /// Signing twice keeps a single entry and moves its timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoActiveRecord`] if no record is active,
    /// [`Error::Validation`] for a blank staff number, or
    /// [`Error::DriverNotFound`] if the staff number is not on the baseline.
    /// The record is not modified in any of these cases.
    pub fn mark_signed_at(
        &mut self,
        staff_number: &str,
        now: DateTime<Utc>,
    ) -> Result<SignOutcome> {
        let id = self.active.clone().ok_or(Error::NoActiveRecord)?;

        let staff_number = staff_number.trim();
        if staff_number.is_empty() {
            return Err(Error::validation("staff_number", "Please choose a driver."));
        }
        let driver = lookup::find_by_staff_number(&self.baseline, staff_number)
            .cloned()
            .ok_or_else(|| Error::driver_not_found(staff_number))?;

        let record = self.records.get_mut(&id).ok_or(Error::NoActiveRecord)?;
        let outcome = record.sign(&driver, now);
        info!("Record {}: {}", id, outcome);

        self.persist();
        Ok(outcome)
    }

    /// Delete the active record and all its signatures.
    ///
    /// Irreversible: callers must obtain confirmation first. Afterwards no
    /// record is active, and opening the same name and date creates a fresh
    /// empty record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoActiveRecord`] if no record is active.
    pub fn delete(&mut self) -> Result<AttendanceRecord> {
        let id = self.active.take().ok_or(Error::NoActiveRecord)?;
        let record = self.records.remove(&id).ok_or(Error::NoActiveRecord)?;
        self.persist();
        info!(
            "Deleted record {} with {} signatures",
            id,
            record.signed_count()
        );
        Ok(record)
    }

    /// The active record, if any.
    #[must_use]
    pub fn active_record(&self) -> Option<&AttendanceRecord> {
        self.active.as_ref().and_then(|id| self.records.get(id))
    }

    /// Look up a record by id without changing the active record.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&AttendanceRecord> {
        self.records.get(id)
    }

    /// Every record, most recent date first, then by name.
    #[must_use]
    pub fn list_all(&self) -> Vec<&AttendanceRecord> {
        let mut records: Vec<&AttendanceRecord> = self.records.values().collect();
        records.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| cmp_names(&a.name, &b.name))
                .then_with(|| a.name.cmp(&b.name))
        });
        records
    }

    /// Number of drivers who signed `record`.
    #[must_use]
    #[allow(clippy::unused_self)]
    pub fn signed_count(&self, record: &AttendanceRecord) -> usize {
        record.signed_count()
    }

    /// Number of drivers who can sign: the baseline roster size.
    #[must_use]
    pub fn total_roster_size(&self) -> usize {
        self.baseline.len()
    }

    /// "X of Y drivers recorded" for `record`.
    #[must_use]
    pub fn progress(&self, record: &AttendanceRecord) -> Progress {
        Progress {
            signed: self.signed_count(record),
            total: self.total_roster_size(),
        }
    }

    /// Baseline drivers who have not signed `record`, sorted by name.
    ///
    /// With no record, every baseline driver is returned.
    #[must_use]
    pub fn unsigned_drivers(&self, record: Option<&AttendanceRecord>) -> Vec<&Driver> {
        let mut drivers: Vec<&Driver> = self
            .baseline
            .drivers()
            .iter()
            .filter(|d| !record.is_some_and(|r| r.has_signed(&d.staff_number)))
            .collect();
        drivers.sort_by(|a, b| cmp_names(&a.name, &b.name));
        drivers
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether there are no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The drivers eligible to sign.
    #[must_use]
    pub fn baseline(&self) -> &Baseline {
        &self.baseline
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

    fn persist(&mut self) {
        write_json(&self.store, &self.key, &self.records, &mut self.health);
    }
}

fn load_records<S: KeyValueStore>(
    store: &S,
    key: &str,
    health: &mut PersistenceHealth,
) -> BTreeMap<String, AttendanceRecord> {
    let mut records = BTreeMap::new();
    let entries = match read_json(store, key, health) {
        None => return records,
        Some(Value::Object(entries)) => entries,
        Some(other) => {
            health.record(Degradation::Corrupt {
                key: key.to_string(),
                message: format!("expected an object, found {}", json_kind(&other)),
            });
            return records;
        }
    };

    for (id, value) in entries {
        match serde_json::from_value::<AttendanceRecord>(value) {
            Ok(mut record) => {
                let derived = record_id(record.date, &record.name);
                if id != derived {
                    health.record(Degradation::Corrupt {
                        key: key.to_string(),
                        message: format!("skipped record {id}: name and date give {derived}"),
                    });
                    continue;
                }
                if record.id != derived {
                    health.record(Degradation::Corrupt {
                        key: key.to_string(),
                        message: format!("record {id}: replaced stored id {:?}", record.id),
                    });
                    record.id = derived;
                }

                let dropped = record.dedup_signatures();
                if dropped > 0 {
                    health.record(Degradation::Corrupt {
                        key: key.to_string(),
                        message: format!("record {id}: dropped {dropped} repeated signature(s)"),
                    });
                }
                records.insert(id, record);
            }
            Err(e) => health.record(Degradation::Corrupt {
                key: key.to_string(),
                message: format!("skipped record {id}: {e}"),
            }),
        }
    }
    records
}
