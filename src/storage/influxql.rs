//! InfluxQL rendering of the statements the engine issues.
//!
//! Gateways talking to a real server forward `statement.to_string()`;
//! in-process stores interpret the structured form.

use super::filter::{Filter, quote_identifier};
use crate::datamodel::TidyDateTime;
use hifitime::{Duration, Unit};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeOrder {
    OldestFirst,
    NewestFirst,
}

/// `SELECT * FROM <measurement> [WHERE ..] [ORDER BY time ..] [LIMIT n]`
#[derive(Debug, Clone, PartialEq)]
pub struct RowQuery {
    pub measurement: String,
    pub filter: Option<Filter>,
    pub order: Option<TimeOrder>,
    pub limit: Option<usize>,
}

impl RowQuery {
    pub fn all(measurement: impl Into<String>) -> Self {
        Self {
            measurement: measurement.into(),
            filter: None,
            order: None,
            limit: None,
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn newest_first(mut self) -> Self {
        self.order = Some(TimeOrder::NewestFirst);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

impl fmt::Display for RowQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SELECT * FROM {}", quote_identifier(&self.measurement))?;
        if let Some(filter) = &self.filter {
            write!(f, " WHERE {}", filter)?;
        }
        match self.order {
            Some(TimeOrder::NewestFirst) => write!(f, " ORDER BY time DESC")?,
            Some(TimeOrder::OldestFirst) => write!(f, " ORDER BY time ASC")?,
            None => {}
        }
        if let Some(limit) = self.limit {
            write!(f, " LIMIT {}", limit)?;
        }
        Ok(())
    }
}

/// Per-field reduction used when downsampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reducer {
    Sum,
    Max,
    Min,
    Mean,
}

impl Reducer {
    pub fn function_name(&self) -> &'static str {
        match self {
            Reducer::Sum => "SUM",
            Reducer::Max => "MAX",
            Reducer::Min => "MIN",
            Reducer::Mean => "MEAN",
        }
    }

    /// Reduces a bucket of values. `None` for an empty bucket.
    pub fn apply(&self, values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        Some(match self {
            Reducer::Sum => values.iter().sum(),
            Reducer::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Reducer::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            Reducer::Mean => values.iter().sum::<f64>() / values.len() as f64,
        })
    }
}

impl fmt::Display for Reducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.function_name())
    }
}

/// Grouped downsampling written into another measurement:
///
/// `SELECT <reducer>("f") AS "f", .. INTO <target> FROM <source>
///  WHERE time < <cutoff> GROUP BY time(<interval>), *`
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationQuery {
    pub source: String,
    pub target: String,
    pub cutoff: TidyDateTime,
    pub interval: Duration,
    pub fields: Vec<(String, Reducer)>,
}

impl fmt::Display for AggregationQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let projections = self
            .fields
            .iter()
            .map(|(field, reducer)| {
                let field = quote_identifier(field);
                format!("{}({}) AS {}", reducer, field, field)
            })
            .collect::<Vec<_>>()
            .join(", ");
        write!(
            f,
            "SELECT {} INTO {} FROM {} WHERE {} GROUP BY time({}), *",
            projections,
            quote_identifier(&self.target),
            quote_identifier(&self.source),
            Filter::OlderThan(self.cutoff),
            duration_literal(self.interval)
        )
    }
}

/// Every statement the engine sends to a store.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    ShowMeasurements,
    ShowFieldKeys {
        measurement: String,
    },
    ShowTagKeys {
        measurement: String,
    },
    ShowTagValues {
        measurement: String,
        key: String,
    },
    Select(RowQuery),
    Count {
        measurement: String,
        filter: Option<Filter>,
    },
    DropMeasurement {
        measurement: String,
    },
    Delete {
        measurement: String,
        filter: Filter,
    },
    SelectInto(AggregationQuery),
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::ShowMeasurements => write!(f, "SHOW MEASUREMENTS"),
            Statement::ShowFieldKeys { measurement } => {
                write!(f, "SHOW FIELD KEYS FROM {}", quote_identifier(measurement))
            }
            Statement::ShowTagKeys { measurement } => {
                write!(f, "SHOW TAG KEYS FROM {}", quote_identifier(measurement))
            }
            Statement::ShowTagValues { measurement, key } => write!(
                f,
                "SHOW TAG VALUES FROM {} WITH KEY = {}",
                quote_identifier(measurement),
                quote_identifier(key)
            ),
            Statement::Select(query) => write!(f, "{}", query),
            Statement::Count {
                measurement,
                filter,
            } => {
                write!(f, "SELECT COUNT(*) FROM {}", quote_identifier(measurement))?;
                if let Some(filter) = filter {
                    write!(f, " WHERE {}", filter)?;
                }
                Ok(())
            }
            Statement::DropMeasurement { measurement } => {
                write!(f, "DROP MEASUREMENT {}", quote_identifier(measurement))
            }
            Statement::Delete {
                measurement,
                filter,
            } => write!(
                f,
                "DELETE FROM {} WHERE {}",
                quote_identifier(measurement),
                filter
            ),
            Statement::SelectInto(query) => write!(f, "{}", query),
        }
    }
}

/// InfluxQL duration literal using the largest unit that divides exactly.
pub fn duration_literal(duration: Duration) -> String {
    let nanos = duration.total_nanoseconds();
    let units: [(i128, &str); 5] = [
        ((1_i64 * Unit::Week).total_nanoseconds(), "w"),
        ((1_i64 * Unit::Day).total_nanoseconds(), "d"),
        ((1_i64 * Unit::Hour).total_nanoseconds(), "h"),
        ((1_i64 * Unit::Minute).total_nanoseconds(), "m"),
        ((1_i64 * Unit::Second).total_nanoseconds(), "s"),
    ];
    for (width, suffix) in units {
        if nanos > 0 && nanos % width == 0 {
            return format!("{}{}", nanos / width, suffix);
        }
    }
    format!("{}ns", nanos)
}
