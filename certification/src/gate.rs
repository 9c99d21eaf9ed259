//! Adult gate — the business rule consuming verification results.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::age::{age_on, parse_birthdate};
use crate::error::CertificationError;

/// Minimum age for adult-gated content and account fields.
pub const ADULT_AGE: u32 = 19;

/// The verdict of the age rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateDecision {
    Adult { age: u32 },
    Underage { age: u32 },
}

/// Applies the minimum-age rule to a verified birthdate.
#[derive(Clone, Copy, Debug)]
pub struct AdultGate {
    pub min_age: u32,
}

impl Default for AdultGate {
    fn default() -> Self {
        Self { min_age: ADULT_AGE }
    }
}

impl AdultGate {
    pub fn evaluate(&self, birthdate_raw: &str, today: NaiveDate) -> Result<GateDecision, CertificationError> {
        let birthdate = parse_birthdate(birthdate_raw)?;
        let age = age_on(birthdate, today);
        if age >= self.min_age {
            Ok(GateDecision::Adult { age })
        } else {
            Ok(GateDecision::Underage { age })
        }
    }
}

/// Account-side flag flipped by a successful adult verification.
///
/// Unblocks gated catalog entries and the adult account fields; never
/// flipped back by a later failed attempt.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdultVerification {
    pub adult_verified: bool,
    pub verified_age: Option<u32>,
}

impl AdultVerification {
    pub fn apply(&mut self, decision: GateDecision) {
        if let GateDecision::Adult { age } = decision {
            self.adult_verified = true;
            self.verified_age = Some(age);
        }
    }
}
