//! Statistical quality checks over arbitrary result sets and measurement series.
//!
//! Nothing here depends on a particular order, so the same functions serve
//! the aggregate's completion check and cross-order reporting.

use serde::{Deserialize, Serialize};

use crate::inspection::{InspectionResult, MeasuredValue, QualityStandard};

/// Number of consecutive points on one side of the center line that signals drift.
pub const SPC_RUN_LENGTH: usize = 7;

/// Side of the center line a point falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    Above,
    Below,
}

impl Side {
    /// Classifies a value against the center line. A value on the line
    /// (or NaN) belongs to neither side.
    fn of(value: f64, center: f64) -> Option<Self> {
        if value > center {
            Some(Side::Above)
        } else if value < center {
            Some(Side::Below)
        } else {
            None
        }
    }
}

/// A run of consecutive points on one side of the center line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendRun {
    pub side: Side,
    /// Index of the first point of the run.
    pub start: usize,
    pub length: usize,
}

/// Stateless quality statistics.
#[derive(Debug, Clone, Copy, Default)]
pub struct QualityService;

impl QualityService {
    /// Fraction of results that failed their standard, in `[0.0, 1.0]`.
    ///
    /// An empty set has a defect rate of 0.0.
    pub fn calculate_defect_rate(results: &[InspectionResult]) -> f64 {
        if results.is_empty() {
            return 0.0;
        }
        let failed = results.iter().filter(|r| !r.passed()).count();
        failed as f64 / results.len() as f64
    }

    /// Applies the "seven consecutive points on one side of the mean" run rule.
    ///
    /// Returns `false` when the series drifts, even if every point is inside
    /// the standard's band. Series shorter than [`SPC_RUN_LENGTH`] are
    /// always in control.
    pub fn is_within_spc(measurements: &[MeasuredValue], standard: &QualityStandard) -> bool {
        Self::find_trend(measurements, standard).is_none()
    }

    /// Returns the first run that violates the run rule, if any.
    pub fn find_trend(
        measurements: &[MeasuredValue],
        standard: &QualityStandard,
    ) -> Option<TrendRun> {
        if measurements.len() < SPC_RUN_LENGTH {
            return None;
        }
        Self::detect_trend(measurements.iter().map(MeasuredValue::value), standard.mean())
    }

    /// Scans `values` once and returns the first run of at least
    /// [`SPC_RUN_LENGTH`] points on the same side of `center`.
    ///
    /// The run is reported with its full length: scanning continues until
    /// the run is broken or the series ends.
    pub fn detect_trend<I>(values: I, center: f64) -> Option<TrendRun>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut run: Option<TrendRun> = None;

        for (index, value) in values.into_iter().enumerate() {
            let side = Side::of(value, center);
            match (run.as_mut(), side) {
                (Some(current), Some(side)) if current.side == side => current.length += 1,
                _ => {
                    if let Some(current) = run.take()
                        && current.length >= SPC_RUN_LENGTH
                    {
                        return Some(current);
                    }
                    run = side.map(|side| TrendRun {
                        side,
                        start: index,
                        length: 1,
                    });
                }
            }
        }

        run.filter(|current| current.length >= SPC_RUN_LENGTH)
    }
}
