//! Attendance records and signatures.

use std::collections::HashSet;

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::roster::{cmp_names, Driver};

/// Separator between date and document name in a record id.
pub const ID_SEPARATOR: char = '|';

/// Build the id of the record for `name` on `date`.
#[must_use]
pub fn record_id(date: NaiveDate, name: &str) -> String {
    format!("{date}{ID_SEPARATOR}{name}")
}

/// One driver's confirmation that they received and signed for a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signature {
    /// Staff number of the signer.
    pub staff_number: String,
    /// Signer's name at the time of signing.
    pub name: String,
    /// When the driver (last) signed.
    pub timestamp: DateTime<Utc>,
}

/// The sign-off sheet for one document or PPE item on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    /// `date|name`, see [`record_id`].
    pub id: String,
    /// Document or PPE item name.
    pub name: String,
    /// Day the record covers.
    pub date: NaiveDate,
    /// When the record was first created.
    pub created_at: DateTime<Utc>,
    /// Signatures in the order drivers first signed.
    #[serde(default)]
    pub signatures: Vec<Signature>,
}

/// What [`AttendanceRecord::sign`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignOutcome {
    /// A new signature was appended.
    Signed {
        /// The signer.
        driver: Driver,
    },
    /// The driver had already signed; only the timestamp moved.
    TimestampUpdated {
        /// The signer.
        driver: Driver,
    },
}

impl SignOutcome {
    /// The driver that signed.
    #[must_use]
    pub fn driver(&self) -> &Driver {
        match self {
            Self::Signed { driver } | Self::TimestampUpdated { driver } => driver,
        }
    }
}

impl std::fmt::Display for SignOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Signed { driver } => {
                write!(f, "{} marked as received & signed.", driver.name)
            }
            Self::TimestampUpdated { driver } => {
                write!(f, "{} was already recorded. Time updated to now.", driver.name)
            }
        }
    }
}

impl AttendanceRecord {
    /// Create an empty record.
    #[must_use]
    pub fn new(name: impl Into<String>, date: NaiveDate, created_at: DateTime<Utc>) -> Self {
        let name = name.into();
        Self {
            id: record_id(date, &name),
            name,
            date,
            created_at,
            signatures: Vec::new(),
        }
    }

    /// Record that `driver` signed at `now`.
    ///
    /// A driver appears at most once: signing again only refreshes the
    /// timestamp of the existing entry.
    pub fn sign(&mut self, driver: &Driver, now: DateTime<Utc>) -> SignOutcome {
        if let Some(existing) = self
            .signatures
            .iter_mut()
            .find(|s| s.staff_number == driver.staff_number)
        {
            existing.timestamp = now;
            return SignOutcome::TimestampUpdated {
                driver: driver.clone(),
            };
        }

        self.signatures.push(Signature {
            staff_number: driver.staff_number.clone(),
            name: driver.name.clone(),
            timestamp: now,
        });
        SignOutcome::Signed {
            driver: driver.clone(),
        }
    }

    /// Number of drivers who have signed.
    #[must_use]
    pub fn signed_count(&self) -> usize {
        self.signatures.len()
    }

    /// The signature for a staff number, if that driver signed.
    #[must_use]
    pub fn signature_for(&self, staff_number: &str) -> Option<&Signature> {
        self.signatures
            .iter()
            .find(|s| s.staff_number == staff_number)
    }

    /// Whether the driver with this staff number has signed.
    #[must_use]
    pub fn has_signed(&self, staff_number: &str) -> bool {
        self.signature_for(staff_number).is_some()
    }

    /// Signatures ordered by signer name for display.
    #[must_use]
    pub fn signatures_by_name(&self) -> Vec<&Signature> {
        let mut sorted: Vec<&Signature> = self.signatures.iter().collect();
        sorted.sort_by(|a, b| cmp_names(&a.name, &b.name));
        sorted
    }

    /// Collapse repeated staff numbers, keeping the first entry of each.
    ///
    /// Returns how many entries were dropped.
    pub fn dedup_signatures(&mut self) -> usize {
        let before = self.signatures.len();
        let mut seen = HashSet::new();
        self.signatures.retain(|s| seen.insert(s.staff_number.clone()));
        before - self.signatures.len()
    }

    /// Picker label: `date – name`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} \u{2013} {}", self.date, self.name)
    }
}

/// Format a timestamp UK style, `dd/mm/yyyy, HH:MM:SS`, in the given zone.
#[must_use]
pub fn format_uk_datetime_in<Tz: TimeZone>(timestamp: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    timestamp
        .with_timezone(tz)
        .format("%d/%m/%Y, %H:%M:%S")
        .to_string()
}

/// Format a timestamp UK style in local time.
#[must_use]
pub fn format_uk_datetime(timestamp: &DateTime<Utc>) -> String {
    format_uk_datetime_in(timestamp, &Local)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn adam() -> Driver {
        Driver::new("Adam Scanlon", "497584")
    }

    #[test]
    fn test_record_id() {
        assert_eq!(
            record_id(date("2024-03-01"), "Hi-Vis Vest"),
            "2024-03-01|Hi-Vis Vest"
        );
    }

    #[test]
    fn test_new_record_is_empty() {
        let record = AttendanceRecord::new("Hi-Vis Vest", date("2024-03-01"), Utc::now());
        assert_eq!(record.id, "2024-03-01|Hi-Vis Vest");
        assert_eq!(record.signed_count(), 0);
    }

    #[test]
    fn test_sign_appends() {
        let mut record = AttendanceRecord::new("Hi-Vis Vest", date("2024-03-01"), Utc::now());
        let now = at("2024-03-01T09:00:00Z");

        let outcome = record.sign(&adam(), now);
        assert!(matches!(outcome, SignOutcome::Signed { .. }));
        assert_eq!(
            record.signatures,
            vec![Signature {
                staff_number: "497584".to_string(),
                name: "Adam Scanlon".to_string(),
                timestamp: now,
            }]
        );
    }

    #[test]
    fn test_resign_updates_timestamp_only() {
        let mut record = AttendanceRecord::new("Hi-Vis Vest", date("2024-03-01"), Utc::now());
        let first = at("2024-03-01T09:00:00Z");
        let second = first + Duration::minutes(5);

        record.sign(&adam(), first);
        record.sign(&Driver::new("Brian Wakefield", "672807"), first);
        let outcome = record.sign(&adam(), second);

        assert!(matches!(outcome, SignOutcome::TimestampUpdated { .. }));
        assert_eq!(record.signed_count(), 2);
        assert_eq!(record.signatures[0].staff_number, "497584");
        assert_eq!(record.signatures[0].timestamp, second);
        assert_eq!(record.signatures[1].timestamp, first);
    }

    #[test]
    fn test_outcome_messages() {
        let signed = SignOutcome::Signed { driver: adam() };
        assert_eq!(signed.to_string(), "Adam Scanlon marked as received & signed.");
        let updated = SignOutcome::TimestampUpdated { driver: adam() };
        assert_eq!(
            updated.to_string(),
            "Adam Scanlon was already recorded. Time updated to now."
        );
        assert_eq!(updated.driver(), &adam());
    }

    #[test]
    fn test_signatures_by_name() {
        let mut record = AttendanceRecord::new("Gloves", date("2024-03-01"), Utc::now());
        let now = Utc::now();
        record.sign(&Driver::new("William Hurley", "678619"), now);
        record.sign(&Driver::new("aidan Browne", "845809"), now);
        record.sign(&adam(), now);

        let names: Vec<_> = record
            .signatures_by_name()
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, vec!["Adam Scanlon", "aidan Browne", "William Hurley"]);
        assert_eq!(record.signatures[0].name, "William Hurley");
    }

    #[test]
    fn test_dedup_signatures_keeps_first() {
        let mut record = AttendanceRecord::new("Gloves", date("2024-03-01"), Utc::now());
        let first = at("2024-03-01T09:00:00Z");
        record.signatures = vec![
            Signature {
                staff_number: "1".to_string(),
                name: "A".to_string(),
                timestamp: first,
            },
            Signature {
                staff_number: "1".to_string(),
                name: "A".to_string(),
                timestamp: first + Duration::hours(1),
            },
        ];

        assert_eq!(record.dedup_signatures(), 1);
        assert_eq!(record.signatures.len(), 1);
        assert_eq!(record.signatures[0].timestamp, first);
    }

    #[test]
    fn test_has_signed() {
        let mut record = AttendanceRecord::new("Gloves", date("2024-03-01"), Utc::now());
        assert!(!record.has_signed("497584"));
        record.sign(&adam(), Utc::now());
        assert!(record.has_signed("497584"));
        assert!(record.signature_for("000000").is_none());
    }

    #[test]
    fn test_label() {
        let record = AttendanceRecord::new("Hi-Vis Vest", date("2024-03-01"), Utc::now());
        assert_eq!(record.label(), "2024-03-01 \u{2013} Hi-Vis Vest");
    }

    #[test]
    fn test_json_matches_device_format() {
        let raw = r#"{
            "id": "2024-03-01|Hi-Vis Vest",
            "name": "Hi-Vis Vest",
            "date": "2024-03-01",
            "createdAt": "2024-03-01T08:15:30.123Z",
            "signatures": [
                {"staffNumber": "497584", "name": "Adam Scanlon", "timestamp": "2024-03-01T09:00:00.000Z"}
            ]
        }"#;
        let record: AttendanceRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(record.date, date("2024-03-01"));
        assert_eq!(record.signatures[0].timestamp, at("2024-03-01T09:00:00Z"));

        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("createdAt").is_some());
        assert_eq!(json["signatures"][0]["staffNumber"], "497584");
        assert_eq!(json["date"], "2024-03-01");
    }

    #[test]
    fn test_missing_signatures_defaults_to_empty() {
        let raw = r#"{"id":"2024-03-01|Gloves","name":"Gloves","date":"2024-03-01","createdAt":"2024-03-01T08:00:00Z"}"#;
        let record: AttendanceRecord = serde_json::from_str(raw).unwrap();
        assert!(record.signatures.is_empty());
    }

    #[test]
    fn test_format_uk_datetime() {
        let ts = at("2024-03-01T09:05:07Z");
        assert_eq!(format_uk_datetime_in(&ts, &Utc), "01/03/2024, 09:05:07");

        let dublin_summer = FixedOffset::east_opt(3600).unwrap();
        assert_eq!(
            format_uk_datetime_in(&ts, &dublin_summer),
            "01/03/2024, 10:05:07"
        );
        assert_eq!(format_uk_datetime(&ts).len(), "01/03/2024, 09:05:07".len());
    }
}
