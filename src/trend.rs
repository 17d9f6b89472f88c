use crate::reading::{Reading, format_value};
use std::fmt;

pub const INSUFFICIENT_DATA: &str = "Collecting data...";

const TEMPERATURE_TOLERANCE: f64 = 0.3;
const HUMIDITY_TOLERANCE: f64 = 1.0;
const PRESSURE_TOLERANCE: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Rising,
    Falling,
    Stable,
}

impl Trend {
    /// Changes no larger than `tolerance` in either direction count as stable.
    pub fn classify(previous: f64, last: f64, tolerance: f64) -> Self {
        if last - previous > tolerance {
            Trend::Rising
        } else if previous - last > tolerance {
            Trend::Falling
        } else {
            Trend::Stable
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Rising => "rising",
            Trend::Falling => "falling",
            Trend::Stable => "stable",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendReport {
    pub temperature: Trend,
    pub humidity: Trend,
    pub pressure: Trend,
    pub latest: Reading,
}

impl TrendReport {
    pub fn between(previous: &Reading, last: &Reading) -> Self {
        Self {
            temperature: Trend::classify(
                previous.temperature_c,
                last.temperature_c,
                TEMPERATURE_TOLERANCE,
            ),
            humidity: Trend::classify(previous.humidity_pct, last.humidity_pct, HUMIDITY_TOLERANCE),
            pressure: Trend::classify(previous.pressure_hpa, last.pressure_hpa, PRESSURE_TOLERANCE),
            latest: *last,
        }
    }
}

impl fmt::Display for TrendReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Temperature {} ({} °C), humidity {} ({} %), pressure {} ({} hPa).",
            self.temperature,
            format_value(self.latest.temperature_c),
            self.humidity,
            format_value(self.latest.humidity_pct),
            self.pressure,
            format_value(self.latest.pressure_hpa),
        )
    }
}

/// Compare the two newest readings of a snapshot, or `None` with fewer than two.
pub fn analyze(history: &[Reading]) -> Option<TrendReport> {
    match history {
        [.., previous, last] => Some(TrendReport::between(previous, last)),
        _ => None,
    }
}

pub fn describe_trend(history: &[Reading]) -> String {
    analyze(history)
        .map(|report| report.to_string())
        .unwrap_or_else(|| INSUFFICIENT_DATA.to_string())
}
