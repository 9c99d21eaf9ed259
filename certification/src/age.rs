//! Birthdate parsing and age computation.

use chrono::{Datelike, NaiveDate};

use crate::error::CertificationError;

/// Parse a provider birthdate (`YYYYMMDD`) into a calendar date.
pub fn parse_birthdate(raw: &str) -> Result<NaiveDate, CertificationError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y%m%d")
        .map_err(|_| CertificationError::Malformed(format!("invalid birthdate: {raw:?}")))
}

/// Completed years of age on `today`.
///
/// Year difference, minus one if the birthday has not yet occurred this
/// year (month/day tuple comparison).
pub fn age_on(birthdate: NaiveDate, today: NaiveDate) -> u32 {
    let mut age = today.year() - birthdate.year();
    if (today.month(), today.day()) < (birthdate.month(), birthdate.day()) {
        age -= 1;
    }
    age.max(0) as u32
}
