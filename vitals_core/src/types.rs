//! Core domain types for the vitals log.
//!
//! This module defines:
//! - `Entry`, the validated per-day record
//! - `RawEntry`, the textual form every input path goes through
//! - `EntryPatch`, a partial update that keeps unspecified fields
//! - `WeightTrend`, derived day-over-day direction

use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Date format used on every boundary (CLI, CSV, JSON)
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ============================================================================
// Entry
// ============================================================================

/// One day's health record, keyed by `date`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub date: NaiveDate,
    /// Body weight in pounds
    pub weight: Option<f64>,
    pub sleep_hours: Option<f64>,
    /// Resting heart rate in beats per minute
    pub resting_heart_rate: Option<u32>,
    pub notes: Option<String>,
}

impl Entry {
    /// An entry for `date` with every measurement absent
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            weight: None,
            sleep_hours: None,
            resting_heart_rate: None,
            notes: None,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn with_sleep_hours(mut self, hours: f64) -> Self {
        self.sleep_hours = Some(hours);
        self
    }

    pub fn with_resting_heart_rate(mut self, bpm: u32) -> Self {
        self.resting_heart_rate = Some(bpm);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Check range constraints on every present field
    ///
    /// Weight must be strictly positive, sleep non-negative, and both finite.
    pub fn validate(&self) -> Result<()> {
        if let Some(weight) = self.weight {
            check_weight(weight)?;
        }
        if let Some(hours) = self.sleep_hours {
            check_sleep_hours(hours)?;
        }
        Ok(())
    }

    /// Validate and collapse blank notes to `None`
    pub fn normalized(mut self) -> Result<Self> {
        self.validate()?;
        if self.notes.as_deref().is_some_and(|n| n.trim().is_empty()) {
            self.notes = None;
        }
        Ok(self)
    }
}

// ============================================================================
// Field parsing
// ============================================================================

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::validation("date", "is required"));
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT).map_err(|_| {
        Error::validation("date", format!("'{}' is not a valid YYYY-MM-DD date", trimmed))
    })
}

/// Parse a weight in pounds (must be > 0)
pub fn parse_weight(input: &str) -> Result<f64> {
    let value = parse_number("weight", input)?;
    check_weight(value)?;
    Ok(value)
}

/// Parse a sleep duration in hours (must be >= 0)
pub fn parse_sleep_hours(input: &str) -> Result<f64> {
    let value = parse_number("sleep_hours", input)?;
    check_sleep_hours(value)?;
    Ok(value)
}

/// Parse a resting heart rate as a whole, non-negative number of bpm
pub fn parse_resting_heart_rate(input: &str) -> Result<u32> {
    let trimmed = input.trim();
    let not_whole = || {
        Error::validation(
            "resting_heart_rate",
            format!("'{}' is not a whole number", trimmed),
        )
    };
    // Spreadsheet exports write whole numbers as "58.0"
    let value: i64 = match trimmed.parse::<i64>() {
        Ok(v) => v,
        Err(_) => match trimmed.parse::<f64>() {
            Ok(f) if f.is_finite() && f.fract() == 0.0 => f as i64,
            _ => return Err(not_whole()),
        },
    };
    if value < 0 {
        return Err(Error::validation("resting_heart_rate", "cannot be negative"));
    }
    u32::try_from(value)
        .map_err(|_| Error::validation("resting_heart_rate", format!("{} is out of range", value)))
}

fn parse_number(field: &'static str, input: &str) -> Result<f64> {
    let trimmed = input.trim();
    trimmed
        .parse::<f64>()
        .map_err(|_| Error::validation(field, format!("'{}' is not a number", trimmed)))
}

fn check_weight(value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(Error::validation("weight", "must be a finite number"));
    }
    if value <= 0.0 {
        return Err(Error::validation("weight", "must be greater than zero"));
    }
    Ok(())
}

fn check_sleep_hours(value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(Error::validation("sleep_hours", "must be a finite number"));
    }
    if value < 0.0 {
        return Err(Error::validation("sleep_hours", "cannot be negative"));
    }
    Ok(())
}

/// Blank input means "absent"
fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.trim().is_empty())
}

// ============================================================================
// Raw (textual) entries
// ============================================================================

/// Unvalidated textual entry, as typed on the command line or read from CSV
///
/// Field names double as the CSV header. Legacy backup headers (`Date`,
/// `Weight`, `SleepDrtn`, `RestingHr`, `Notes`) are accepted as aliases and
/// unknown columns are ignored.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawEntry {
    #[serde(alias = "Date")]
    pub date: Option<String>,
    #[serde(alias = "Weight")]
    pub weight: Option<String>,
    #[serde(alias = "SleepDrtn")]
    pub sleep_hours: Option<String>,
    #[serde(alias = "RestingHr")]
    pub resting_heart_rate: Option<String>,
    #[serde(alias = "Notes")]
    pub notes: Option<String>,
}

impl TryFrom<RawEntry> for Entry {
    type Error = Error;

    fn try_from(raw: RawEntry) -> Result<Self> {
        let date = match present(&raw.date) {
            Some(d) => parse_date(d)?,
            None => return Err(Error::validation("date", "is required")),
        };

        Entry {
            date,
            weight: present(&raw.weight).map(parse_weight).transpose()?,
            sleep_hours: present(&raw.sleep_hours)
                .map(parse_sleep_hours)
                .transpose()?,
            resting_heart_rate: present(&raw.resting_heart_rate)
                .map(parse_resting_heart_rate)
                .transpose()?,
            notes: raw.notes,
        }
        .normalized()
    }
}

// ============================================================================
// Patches
// ============================================================================

/// Partial update of an existing entry
///
/// `None` keeps the stored value; a patch can overwrite but never clear.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EntryPatch {
    pub weight: Option<f64>,
    pub sleep_hours: Option<f64>,
    pub resting_heart_rate: Option<u32>,
    pub notes: Option<String>,
}

impl EntryPatch {
    pub fn is_empty(&self) -> bool {
        self.weight.is_none()
            && self.sleep_hours.is_none()
            && self.resting_heart_rate.is_none()
            && self.notes.is_none()
    }

    /// Produce the entry that results from applying this patch to `current`
    pub fn apply(&self, current: &Entry) -> Entry {
        Entry {
            date: current.date,
            weight: self.weight.or(current.weight),
            sleep_hours: self.sleep_hours.or(current.sleep_hours),
            resting_heart_rate: self.resting_heart_rate.or(current.resting_heart_rate),
            notes: self.notes.clone().or_else(|| current.notes.clone()),
        }
    }
}

impl TryFrom<RawEntry> for EntryPatch {
    type Error = Error;

    /// Ignores `date`; the caller addresses the entry separately.
    fn try_from(raw: RawEntry) -> Result<Self> {
        Ok(EntryPatch {
            weight: present(&raw.weight).map(parse_weight).transpose()?,
            sleep_hours: present(&raw.sleep_hours)
                .map(parse_sleep_hours)
                .transpose()?,
            resting_heart_rate: present(&raw.resting_heart_rate)
                .map(parse_resting_heart_rate)
                .transpose()?,
            notes: present(&raw.notes).map(str::to_string),
        })
    }
}

// ============================================================================
// Trend
// ============================================================================

/// Direction of an entry's weight relative to the previous recorded weight
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightTrend {
    Increasing,
    Decreasing,
    Stable,
    /// First weight on record
    NoPrevious,
    /// Entry carries no weight
    NoWeight,
}

impl fmt::Display for WeightTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WeightTrend::Increasing => "increasing",
            WeightTrend::Decreasing => "decreasing",
            WeightTrend::Stable => "stable",
            WeightTrend::NoPrevious => "no trend",
            WeightTrend::NoWeight => "no weight",
        };
        f.write_str(label)
    }
}
