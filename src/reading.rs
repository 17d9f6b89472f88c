use chrono::{Local, NaiveDateTime};
use std::num::ParseFloatError;
use thiserror::Error;

pub const HEADER: &str = "datetime,temperature_C,humidity_percent,pressure_hPa";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";
const FIELD_COUNT: usize = 4;

/// One immutable sample of the station's three physical quantities.
///
/// Values are rounded to two decimals when the reading is built, so every
/// consumer (the log, the trend sentence, the summaries) sees the same numbers.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Reading {
    pub timestamp: NaiveDateTime,
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub pressure_hpa: f64,
}

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("expected 4 fields, found {found}")]
    FieldCount { found: usize },
    #[error("invalid timestamp {value:?}")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error("invalid {field} value {value:?}")]
    Number {
        field: &'static str,
        value: String,
        #[source]
        source: ParseFloatError,
    },
}

impl Reading {
    pub fn new(
        timestamp: NaiveDateTime,
        temperature_c: f64,
        humidity_pct: f64,
        pressure_hpa: f64,
    ) -> Self {
        Self {
            timestamp,
            temperature_c: round2(temperature_c),
            humidity_pct: round2(humidity_pct),
            pressure_hpa: round2(pressure_hpa),
        }
    }

    /// Stamp the given values with the current local time.
    pub fn now(temperature_c: f64, humidity_pct: f64, pressure_hpa: f64) -> Self {
        Self::new(
            Local::now().naive_local(),
            temperature_c,
            humidity_pct,
            pressure_hpa,
        )
    }

    /// Render as one durable-log row, without the line terminator.
    pub fn to_record(&self) -> String {
        format!(
            "{},{},{},{}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            format_value(self.temperature_c),
            format_value(self.humidity_pct),
            format_value(self.pressure_hpa),
        )
    }

    pub fn parse_record(line: &str) -> Result<Self, RecordError> {
        let fields: Vec<&str> = line.trim_end().split(',').collect();
        if fields.len() != FIELD_COUNT {
            return Err(RecordError::FieldCount {
                found: fields.len(),
            });
        }

        let timestamp = NaiveDateTime::parse_from_str(fields[0], TIMESTAMP_FORMAT).map_err(
            |source| RecordError::Timestamp {
                value: fields[0].to_string(),
                source,
            },
        )?;

        Ok(Self::new(
            timestamp,
            parse_value("temperature", fields[1])?,
            parse_value("humidity", fields[2])?,
            parse_value("pressure", fields[3])?,
        ))
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// Whole numbers keep one fractional digit so every column reads as a decimal.
pub(crate) fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

fn parse_value(field: &'static str, value: &str) -> Result<f64, RecordError> {
    value.parse().map_err(|source| RecordError::Number {
        field,
        value: value.to_string(),
        source,
    })
}
