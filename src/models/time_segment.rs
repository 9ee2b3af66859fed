//! Time-of-day segment configuration.
//!
//! A config is an ordered list of `HH:mm` segments, each carrying the moving-
//! average bands and profit target active from that time. Entries are always
//! persisted sorted ascending by minute-of-day; later readers assume the
//! order.
//!
//! Percentage fields are edited and held in percent form (`0.5` = 0.5%) but
//! persisted in decimal form (`0.005`). The conversion lives exactly at the
//! serde boundary; the validator never sees decimal-form values.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

/// One segment row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSegmentEntry {
    /// Strict 24-hour `HH:mm` token.
    pub time_segment: String,

    /// Buy band below the moving average, in percent.
    #[serde(
        serialize_with = "serialize_percent",
        deserialize_with = "deserialize_percent"
    )]
    pub ma_below_percent: Decimal,

    /// Buy band above the moving average, in percent.
    #[serde(
        serialize_with = "serialize_percent",
        deserialize_with = "deserialize_percent"
    )]
    pub ma_above_percent: Decimal,

    /// Profit target for the segment, in percent.
    #[serde(
        serialize_with = "serialize_percent",
        deserialize_with = "deserialize_percent"
    )]
    pub profit_percent: Decimal,
}

/// Ordered segment list for one stock (strategy default) or one
/// account-stock pair (override).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSegmentConfig {
    pub entries: Vec<TimeSegmentEntry>,
}

impl TimeSegmentConfig {
    pub fn new(entries: Vec<TimeSegmentEntry>) -> Self {
        Self { entries }
    }

    /// Check every segment token and reject duplicates.
    ///
    /// Format errors carry the offending literal; the duplicate error lists
    /// every value that occurs more than once.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for entry in &self.entries {
            if minute_of_day(&entry.time_segment).is_none() {
                return Err(ValidationError::BadTimeSegment(
                    entry.time_segment.clone(),
                ));
            }
        }

        let mut duplicates = Vec::new();
        for (i, entry) in self.entries.iter().enumerate() {
            let value = &entry.time_segment;
            let first_at = self
                .entries
                .iter()
                .position(|e| &e.time_segment == value)
                .unwrap_or(i);
            let repeated = self.entries[i + 1..]
                .iter()
                .any(|e| &e.time_segment == value);
            if first_at == i && repeated {
                duplicates.push(value.clone());
            }
        }
        if !duplicates.is_empty() {
            return Err(ValidationError::DuplicateTimeSegments(duplicates));
        }

        Ok(())
    }

    /// Sort ascending by minute-of-day. Call after [`Self::validate`]; on
    /// unvalidated input, malformed tokens sort first.
    pub fn canonicalize(&mut self) {
        self.entries
            .sort_by_key(|e| minute_of_day(&e.time_segment).unwrap_or(0));
    }

    /// Validate, then return the canonically sorted config ready to persist.
    pub fn into_canonical(mut self) -> Result<Self, ValidationError> {
        self.validate()?;
        self.canonicalize();
        Ok(self)
    }
}

/// Parse a strict 24-hour `HH:mm` token into minutes since midnight
/// (0–1439). Two-digit hour required: `"9:30"` is rejected, `"09:30"` is not.
pub fn minute_of_day(token: &str) -> Option<u32> {
    let (hh, mm) = token.split_once(':')?;
    if hh.len() != 2 || mm.len() != 2 {
        return None;
    }
    if !hh.bytes().all(|b| b.is_ascii_digit()) || !mm.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: u32 = hh.parse().ok()?;
    let minutes: u32 = mm.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    Some(hours * 60 + minutes)
}

fn serialize_percent<S>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    Serialize::serialize(&(value / Decimal::ONE_HUNDRED), serializer)
}

fn deserialize_percent<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let stored = <Decimal as Deserialize>::deserialize(deserializer)?;
    Ok(stored * Decimal::ONE_HUNDRED)
}
