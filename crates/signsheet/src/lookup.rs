//! Driver lookups.
//!
//! Name lookups run against whatever roster the caller shows (names come
//! from a picker populated by that roster, so the match is exact and
//! case-sensitive). Staff-number lookups only consult the baseline: drivers
//! added on the device are not eligible to sign records.

use crate::roster::{Baseline, Driver};

/// Find a driver by exact name.
#[must_use]
pub fn find_by_name<'a>(roster: &'a [Driver], name: &str) -> Option<&'a Driver> {
    roster.iter().find(|d| d.name == name)
}

/// Find a baseline driver by staff number.
#[must_use]
pub fn find_by_staff_number<'a>(
    baseline: &'a Baseline,
    staff_number: &str,
) -> Option<&'a Driver> {
    baseline
        .drivers()
        .iter()
        .find(|d| d.staff_number == staff_number)
}
