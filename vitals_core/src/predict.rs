//! Linear weight trend and forward projection.
//!
//! Fits ordinary least squares over (day offset, weight) pairs, where the
//! offset counts days from the earliest recorded weight, and extends the line
//! past the latest recorded weight.

use crate::{stats::weighed, Entry, Error, Result};
use chrono::{Days, NaiveDate};
use serde::Serialize;

/// Default number of days to project
pub const DEFAULT_HORIZON_DAYS: u32 = 30;

/// Longest projection accepted, about ten years
pub const MAX_HORIZON_DAYS: u32 = 3650;

/// Fitted line `weight = intercept + slope * days_since(origin)`
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LinearFit {
    /// Date at offset zero (earliest recorded weight)
    pub origin: NaiveDate,
    /// Date of the latest recorded weight
    pub last: NaiveDate,
    /// Pounds per day
    pub slope: f64,
    pub intercept: f64,
    pub samples: usize,
}

impl LinearFit {
    /// Fitted weight on `date`
    pub fn weight_on(&self, date: NaiveDate) -> f64 {
        let x = (date - self.origin).num_days() as f64;
        self.intercept + self.slope * x
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PredictedWeight {
    pub date: NaiveDate,
    pub weight: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Prediction {
    pub fit: LinearFit,
    /// One point per day after the last recorded weight
    pub points: Vec<PredictedWeight>,
}

/// Fit a least-squares line through every recorded weight
///
/// Requires at least two weight-bearing entries. If every sample shares one
/// day offset the slope is reported as zero and the intercept as the mean.
pub fn fit_linear(entries: &[Entry]) -> Result<LinearFit> {
    let samples = weighed(entries);

    let (origin, last) = match (samples.first(), samples.last()) {
        (Some(&(first, _)), Some(&(last, _))) if samples.len() >= 2 => (first, last),
        _ => {
            return Err(Error::insufficient(format!(
                "prediction needs at least 2 recorded weights, found {}",
                samples.len()
            )))
        }
    };

    let points: Vec<(f64, f64)> = samples
        .iter()
        .map(|&(date, w)| ((date - origin).num_days() as f64, w))
        .collect();

    let n = points.len() as f64;
    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;

    // Centered sums keep precision when offsets grow into the thousands
    let (sxy, sxx) = points.iter().fold((0.0, 0.0), |(sxy, sxx), (x, y)| {
        let dx = x - mean_x;
        (sxy + dx * (y - mean_y), sxx + dx * dx)
    });

    let (slope, intercept) = if sxx == 0.0 {
        tracing::warn!("All recorded weights share one date; using a flat trend");
        (0.0, mean_y)
    } else {
        let slope = sxy / sxx;
        (slope, mean_y - slope * mean_x)
    };

    tracing::debug!(
        "Fitted weight trend over {} samples: slope={:.4} intercept={:.2}",
        points.len(),
        slope,
        intercept
    );

    Ok(LinearFit {
        origin,
        last,
        slope,
        intercept,
        samples: points.len(),
    })
}

/// Project weights for `horizon_days` days following the last recorded weight
///
/// Fails with a `horizon_days` validation error when the horizon is longer
/// than [`MAX_HORIZON_DAYS`] or would run past the last representable date.
pub fn predict(entries: &[Entry], horizon_days: u32) -> Result<Prediction> {
    if horizon_days > MAX_HORIZON_DAYS {
        return Err(Error::validation(
            "horizon_days",
            format!(
                "{} exceeds the maximum of {} days",
                horizon_days, MAX_HORIZON_DAYS
            ),
        ));
    }

    let fit = fit_linear(entries)?;

    let points = (1..=u64::from(horizon_days))
        .map(|offset| {
            let date = fit.last.checked_add_days(Days::new(offset)).ok_or_else(|| {
                Error::validation(
                    "horizon_days",
                    format!(
                        "{} days after {} is outside the supported date range",
                        offset, fit.last
                    ),
                )
            })?;
            Ok(PredictedWeight {
                date,
                weight: fit.weight_on(date),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Prediction { fit, points })
}
