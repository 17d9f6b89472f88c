//! Summaries of a snapshot for the presentation layer

use crate::reading::Reading;
use std::fmt;

/// Default padding applied around a series when scaling it for display
pub const DISPLAY_MARGIN: f64 = 0.1;

/// Statistics for one quantity over a snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesStats {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub count: usize,
}

impl SeriesStats {
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        let mut count = 0;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for value in values {
            count += 1;
            sum += value;
            min = min.min(value);
            max = max.max(value);
        }

        (count > 0).then(|| Self {
            min,
            max,
            avg: sum / count as f64,
            count,
        })
    }

    /// Plotting range padded by `margin_frac` of the span on each side.
    ///
    /// A flat series is first widened by one unit both ways so it never
    /// collapses to a zero-height range.
    pub fn display_range(&self, margin_frac: f64) -> (f64, f64) {
        let (mut low, mut high) = (self.min, self.max);
        if low == high {
            low -= 1.0;
            high += 1.0;
        }
        let margin = (high - low) * margin_frac;
        (low - margin, high + margin)
    }
}

impl fmt::Display for SeriesStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "min {:.2} / avg {:.2} / max {:.2}",
            self.min, self.avg, self.max
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapshotSummary {
    pub temperature: SeriesStats,
    pub humidity: SeriesStats,
    pub pressure: SeriesStats,
}

impl SnapshotSummary {
    pub fn of(history: &[Reading]) -> Option<Self> {
        Some(Self {
            temperature: SeriesStats::from_values(history.iter().map(|r| r.temperature_c))?,
            humidity: SeriesStats::from_values(history.iter().map(|r| r.humidity_pct))?,
            pressure: SeriesStats::from_values(history.iter().map(|r| r.pressure_hpa))?,
        })
    }
}
