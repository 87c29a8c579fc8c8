//! Descriptive statistics over the entry log.
//!
//! Every function here is pure: it takes the entries (normally the output of
//! `EntryStore::list_all`) and never touches the store. Functions that need a
//! particular field fail with `Error::InsufficientData` when no entry carries
//! it, rather than returning zeros or NaN.

use crate::{Entry, Error, Result, WeightTrend};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

/// Count, extremes and arithmetic mean of one numeric field
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl FieldStats {
    fn from_values(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        let mut iter = values.into_iter();
        let first = iter.next()?;
        let (mut min, mut max, mut sum, mut count) = (first, first, first, 1usize);
        for v in iter {
            min = min.min(v);
            max = max.max(v);
            sum += v;
            count += 1;
        }
        Some(Self {
            count,
            min,
            max,
            mean: sum / count as f64,
        })
    }
}

/// Resting heart rate aggregates; extremes stay whole numbers
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HeartRateStats {
    pub count: usize,
    pub min: u32,
    pub max: u32,
    pub mean: f64,
}

/// Change between the first and last recorded weights
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChangeStats {
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub first_weight: f64,
    pub last_weight: f64,
    pub total_change: f64,
    pub days_spanned: i64,
    /// `None` when all weights fall on a single day
    pub average_daily_change: Option<f64>,
}

/// Weight change within one calendar month
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MonthlyChange {
    pub year: i32,
    pub month: u32,
    /// Weight-bearing entries in the month
    pub entries: usize,
    /// Last minus first weight; `None` with fewer than two entries
    pub change: Option<f64>,
}

impl MonthlyChange {
    /// e.g. "January 2024"
    pub fn label(&self) -> String {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .map(|d| d.format("%B %Y").to_string())
            .unwrap_or_else(|| format!("{}-{:02}", self.year, self.month))
    }
}

/// Everything the `stats` command reports
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Summary {
    pub weight: FieldStats,
    pub change: ChangeStats,
    pub monthly: Vec<MonthlyChange>,
    pub sleep: Option<FieldStats>,
    pub heart_rate: Option<HeartRateStats>,
}

/// Weight-bearing (date, weight) pairs in date order
pub(crate) fn weighed(entries: &[Entry]) -> Vec<(NaiveDate, f64)> {
    let mut points: Vec<_> = entries
        .iter()
        .filter_map(|e| e.weight.map(|w| (e.date, w)))
        .collect();
    points.sort_by_key(|(date, _)| *date);
    points
}

fn no_weights() -> Error {
    Error::insufficient("no entries with a recorded weight")
}

pub fn weight_stats(entries: &[Entry]) -> Result<FieldStats> {
    FieldStats::from_values(entries.iter().filter_map(|e| e.weight)).ok_or_else(no_weights)
}

pub fn sleep_stats(entries: &[Entry]) -> Result<FieldStats> {
    FieldStats::from_values(entries.iter().filter_map(|e| e.sleep_hours))
        .ok_or_else(|| Error::insufficient("no entries with recorded sleep"))
}

pub fn heart_rate_stats(entries: &[Entry]) -> Result<HeartRateStats> {
    let rates: Vec<u32> = entries
        .iter()
        .filter_map(|e| e.resting_heart_rate)
        .collect();
    let stats = FieldStats::from_values(rates.iter().map(|&r| f64::from(r)))
        .ok_or_else(|| Error::insufficient("no entries with a resting heart rate"))?;

    Ok(HeartRateStats {
        count: stats.count,
        min: rates.iter().copied().min().unwrap_or_default(),
        max: rates.iter().copied().max().unwrap_or_default(),
        mean: stats.mean,
    })
}

/// Total and average daily weight change across the whole log
pub fn change_stats(entries: &[Entry]) -> Result<ChangeStats> {
    let points = weighed(entries);
    let (&(first_date, first_weight), &(last_date, last_weight)) =
        match (points.first(), points.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(no_weights()),
        };

    let total_change = last_weight - first_weight;
    let days_spanned = (last_date - first_date).num_days();
    let average_daily_change = if days_spanned > 0 {
        Some(total_change / days_spanned as f64)
    } else {
        None
    };

    Ok(ChangeStats {
        first_date,
        last_date,
        first_weight,
        last_weight,
        total_change,
        days_spanned,
        average_daily_change,
    })
}

/// Per-month weight change, oldest month first
pub fn monthly_changes(entries: &[Entry]) -> Result<Vec<MonthlyChange>> {
    let points = weighed(entries);
    if points.is_empty() {
        return Err(no_weights());
    }

    let mut months: BTreeMap<(i32, u32), Vec<f64>> = BTreeMap::new();
    for (date, weight) in points {
        months
            .entry((date.year(), date.month()))
            .or_default()
            .push(weight);
    }

    Ok(months
        .into_iter()
        .map(|((year, month), weights)| {
            let change = match (weights.first(), weights.last()) {
                (Some(first), Some(last)) if weights.len() >= 2 => Some(last - first),
                _ => None,
            };
            MonthlyChange {
                year,
                month,
                entries: weights.len(),
                change,
            }
        })
        .collect())
}

/// Full report; requires at least one recorded weight
pub fn summarize(entries: &[Entry]) -> Result<Summary> {
    Ok(Summary {
        weight: weight_stats(entries)?,
        change: change_stats(entries)?,
        monthly: monthly_changes(entries)?,
        sleep: sleep_stats(entries).ok(),
        heart_rate: heart_rate_stats(entries).ok(),
    })
}

/// Trend of each entry against the closest earlier recorded weight
///
/// `entries` must be in date order; the result lines up index for index.
pub fn weight_trends(entries: &[Entry]) -> Vec<WeightTrend> {
    let mut previous: Option<f64> = None;
    entries
        .iter()
        .map(|entry| {
            let Some(weight) = entry.weight else {
                return WeightTrend::NoWeight;
            };
            let trend = match previous {
                None => WeightTrend::NoPrevious,
                Some(prev) if weight > prev => WeightTrend::Increasing,
                Some(prev) if weight < prev => WeightTrend::Decreasing,
                Some(_) => WeightTrend::Stable,
            };
            previous = Some(weight);
            trend
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::parse_date;

    fn weigh(date: &str, weight: f64) -> Entry {
        Entry::new(parse_date(date).unwrap()).with_weight(weight)
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_two_entry_example() {
        let entries = vec![weigh("2024-01-01", 180.0), weigh("2024-01-08", 178.0)];

        let weight = weight_stats(&entries).unwrap();
        assert_eq!(weight.count, 2);
        assert!(close(weight.mean, 179.0));
        assert!(close(weight.min, 178.0));
        assert!(close(weight.max, 180.0));

        let change = change_stats(&entries).unwrap();
        assert!(close(change.total_change, -2.0));
        assert_eq!(change.days_spanned, 7);
        assert!(close(change.average_daily_change.unwrap(), -2.0 / 7.0));
    }

    #[test]
    fn test_empty_log_is_insufficient() {
        assert!(matches!(weight_stats(&[]), Err(Error::InsufficientData(_))));
        assert!(matches!(change_stats(&[]), Err(Error::InsufficientData(_))));
        assert!(matches!(monthly_changes(&[]), Err(Error::InsufficientData(_))));
        assert!(matches!(heart_rate_stats(&[]), Err(Error::InsufficientData(_))));
        assert!(matches!(summarize(&[]), Err(Error::InsufficientData(_))));
    }

    #[test]
    fn test_entries_without_weight_are_insufficient() {
        let d = parse_date("2024-01-01").unwrap();
        let entries = vec![Entry::new(d).with_sleep_hours(7.0).with_resting_heart_rate(60)];

        assert!(matches!(weight_stats(&entries), Err(Error::InsufficientData(_))));
        assert!(matches!(summarize(&entries), Err(Error::InsufficientData(_))));
        // Heart rate is still reportable on its own
        assert_eq!(heart_rate_stats(&entries).unwrap().min, 60);
    }

    #[test]
    fn test_single_day_has_no_daily_average() {
        let entries = vec![weigh("2024-01-01", 180.0)];
        let change = change_stats(&entries).unwrap();
        assert_eq!(change.days_spanned, 0);
        assert!(close(change.total_change, 0.0));
        assert_eq!(change.average_daily_change, None);
    }

    #[test]
    fn test_change_skips_entries_without_weight() {
        let entries = vec![
            Entry::new(parse_date("2023-12-30").unwrap()).with_notes("travel"),
            weigh("2024-01-01", 181.0),
            weigh("2024-01-11", 176.0),
            Entry::new(parse_date("2024-01-20").unwrap()).with_sleep_hours(8.0),
        ];

        let change = change_stats(&entries).unwrap();
        assert_eq!(change.first_date, parse_date("2024-01-01").unwrap());
        assert_eq!(change.last_date, parse_date("2024-01-11").unwrap());
        assert!(close(change.average_daily_change.unwrap(), -0.5));
    }

    #[test]
    fn test_monthly_changes() {
        let entries = vec![
            weigh("2024-01-03", 182.0),
            weigh("2024-01-17", 180.5),
            weigh("2024-01-30", 179.0),
            weigh("2024-02-14", 178.0),
            weigh("2024-03-01", 178.5),
            weigh("2024-03-31", 176.0),
        ];

        let monthly = monthly_changes(&entries).unwrap();
        assert_eq!(monthly.len(), 3);

        assert_eq!((monthly[0].year, monthly[0].month), (2024, 1));
        assert_eq!(monthly[0].entries, 3);
        assert!(close(monthly[0].change.unwrap(), -3.0));

        assert_eq!(monthly[1].entries, 1);
        assert_eq!(monthly[1].change, None);

        assert!(close(monthly[2].change.unwrap(), -2.5));
        assert_eq!(monthly[0].label(), "January 2024");
    }

    #[test]
    fn test_heart_rate_stats() {
        let d = |s: &str| parse_date(s).unwrap();
        let entries = vec![
            Entry::new(d("2024-01-01")).with_resting_heart_rate(62),
            Entry::new(d("2024-01-02")),
            Entry::new(d("2024-01-03")).with_resting_heart_rate(55),
            Entry::new(d("2024-01-04")).with_resting_heart_rate(58),
        ];

        let hr = heart_rate_stats(&entries).unwrap();
        assert_eq!(hr.count, 3);
        assert_eq!(hr.min, 55);
        assert_eq!(hr.max, 62);
        assert!(close(hr.mean, 175.0 / 3.0));
    }

    #[test]
    fn test_summary_optional_sections() {
        let entries = vec![weigh("2024-01-01", 180.0), weigh("2024-01-02", 179.0)];
        let summary = summarize(&entries).unwrap();
        assert!(summary.sleep.is_none());
        assert!(summary.heart_rate.is_none());
        assert_eq!(summary.monthly.len(), 1);
    }

    #[test]
    fn test_weight_trends() {
        let entries = vec![
            weigh("2024-01-01", 180.0),
            Entry::new(parse_date("2024-01-02").unwrap()),
            weigh("2024-01-03", 179.0),
            weigh("2024-01-04", 179.0),
            weigh("2024-01-05", 179.5),
        ];

        assert_eq!(
            weight_trends(&entries),
            vec![
                WeightTrend::NoPrevious,
                WeightTrend::NoWeight,
                WeightTrend::Decreasing,
                WeightTrend::Stable,
                WeightTrend::Increasing,
            ]
        );
    }
}
