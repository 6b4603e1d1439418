use super::Journal;
use crate::datamodel::{Point, Row, TidyDateTime, TidyDateTimeExt, Value};
use crate::storage::{
    AggregationQuery, Filter, RowQuery, Statement, StoreError, TimeOrder, TimeSeriesStore,
};
use anyhow::Result;
use async_trait::async_trait;
use influxdb_line_protocol::{FieldValue, parse_lines};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

/// Gateway calls that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreCall {
    Ping,
    ListMeasurements,
    QueryRows,
    Count,
    WritePoints,
    DropMeasurement,
    DeleteRows,
    ListFieldKeys,
    ListTagKeys,
    ListTagValues,
    AggregationWrite,
}

type Tags = BTreeMap<String, String>;
type Fields = BTreeMap<String, Value>;
/// Points of one measurement, keyed like InfluxDB keys them.
type Series = BTreeMap<(i128, Tags), Fields>;

#[derive(Debug, Default)]
struct State {
    measurements: BTreeMap<String, Series>,
    failures: Vec<(StoreCall, Option<String>)>,
}

/// In-memory store with InfluxDB 1.x semantics for the statements the
/// engine issues.
///
/// A point is identified by measurement, time and tag set; writing the same
/// identity again merges the new fields over the old ones. Mutating calls are
/// appended to a [`Journal`] as InfluxQL text (`WRITE "m" <n>` for writes).
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    journal: Journal,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_journal(journal: Journal) -> Self {
        Self {
            state: Mutex::default(),
            journal,
        }
    }

    /// Seed a store from InfluxDB line protocol with nanosecond timestamps.
    pub fn from_line_protocol(lines: &str) -> Result<Self> {
        let store = Self::new();
        store.insert_line_protocol(lines)?;
        Ok(store)
    }

    /// Insert line protocol without journaling it.
    pub fn insert_line_protocol(&self, lines: &str) -> Result<()> {
        let mut points = Vec::new();
        for line in parse_lines(lines) {
            let line = line?;
            let time = match line.timestamp {
                Some(timestamp) => TidyDateTime::from_unix_nanoseconds_i64(timestamp),
                None => TidyDateTime::now()?,
            };
            let mut point = Point::new(line.series.measurement.to_string(), time);
            if let Some(tags) = line.series.tag_set {
                for (key, value) in tags {
                    point = point.tag(key.to_string(), value.to_string());
                }
            }
            for (key, value) in line.field_set {
                let value = match value {
                    FieldValue::I64(value) => Value::Integer(value),
                    FieldValue::U64(value) => Value::Integer(i64::try_from(value)?),
                    FieldValue::F64(value) => Value::Float(value),
                    FieldValue::String(value) => Value::String(value.to_string()),
                    FieldValue::Boolean(value) => Value::Boolean(value),
                };
                point = point.field(key.to_string(), value);
            }
            points.push(point);
        }
        self.insert(&points);
        Ok(())
    }

    /// Insert points without journaling them.
    pub fn insert(&self, points: &[Point]) {
        let mut state = self.state();
        for point in points {
            let series = state
                .measurements
                .entry(point.measurement.clone())
                .or_default();
            series
                .entry((point.time.to_unix_nanoseconds_i128(), point.tags.clone()))
                .or_default()
                .extend(point.fields.clone());
        }
    }

    pub fn journal(&self) -> Journal {
        self.journal.clone()
    }

    /// Make every `call` fail, for one measurement or for all of them.
    pub fn fail(&self, call: StoreCall, measurement: Option<&str>) {
        self.state()
            .failures
            .push((call, measurement.map(str::to_string)));
    }

    pub fn clear_failures(&self) {
        self.state().failures.clear();
    }

    pub fn measurement_names(&self) -> Vec<String> {
        self.state().measurements.keys().cloned().collect()
    }

    /// Number of distinct points (not field values) held by a measurement.
    pub fn point_count(&self, measurement: &str) -> usize {
        self.state()
            .measurements
            .get(measurement)
            .map(BTreeMap::len)
            .unwrap_or(0)
    }

    /// All rows of a measurement, oldest first.
    pub fn rows(&self, measurement: &str) -> Vec<Row> {
        self.state()
            .measurements
            .get(measurement)
            .map(|series| series.iter().map(|(key, fields)| to_row(key, fields)).collect())
            .unwrap_or_default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        // Tests never continue after a panic while holding the lock
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn check(
        &self,
        call: StoreCall,
        measurement: Option<&str>,
        statement: impl std::fmt::Display,
    ) -> Result<(), StoreError> {
        let injected = self.state().failures.iter().any(|(failing, target)| {
            *failing == call
                && match (target, measurement) {
                    (None, _) => true,
                    (Some(target), Some(measurement)) => target == measurement,
                    (Some(_), None) => false,
                }
        });
        if injected {
            return Err(match (call, measurement) {
                (StoreCall::WritePoints, Some(measurement)) => {
                    StoreError::write(measurement, "injected failure")
                }
                _ => StoreError::query(statement, "injected failure"),
            });
        }
        Ok(())
    }

    fn matching(
        &self,
        measurement: &str,
        filter: Option<&Filter>,
    ) -> Vec<((i128, Tags), Fields)> {
        let state = self.state();
        let Some(series) = state.measurements.get(measurement) else {
            return Vec::new();
        };
        series
            .iter()
            .filter(|((time, tags), _)| {
                filter.is_none_or(|filter| {
                    filter.matches(TidyDateTime::from_unix_nanoseconds_i128(*time), tags)
                })
            })
            .map(|(key, fields)| (key.clone(), fields.clone()))
            .collect()
    }
}

/// `time` first, then tags and fields in column name order.
fn to_row((time, tags): &(i128, Tags), fields: &Fields) -> Row {
    let mut columns: BTreeMap<&str, Value> = BTreeMap::new();
    for (key, value) in tags {
        columns.insert(key, Value::String(value.clone()));
    }
    for (key, value) in fields {
        columns.insert(key, value.clone());
    }
    let mut row = Row::at(TidyDateTime::from_unix_nanoseconds_i128(*time));
    for (column, value) in columns {
        row.set(column, value);
    }
    row
}

#[async_trait]
impl TimeSeriesStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.check(StoreCall::Ping, None, "PING")
            .map_err(|err| StoreError::Connection(err.to_string()))
    }

    async fn list_measurement_names(&self) -> Result<Vec<String>, StoreError> {
        self.check(StoreCall::ListMeasurements, None, Statement::ShowMeasurements)?;
        Ok(self.measurement_names())
    }

    async fn query_rows(&self, query: &RowQuery) -> Result<Vec<Row>, StoreError> {
        self.check(StoreCall::QueryRows, Some(query.measurement.as_str()), query)?;
        let mut rows: Vec<Row> = self
            .matching(&query.measurement, query.filter.as_ref())
            .iter()
            .map(|(key, fields)| to_row(key, fields))
            .collect();
        // Series keys sort by time first, so rows are already oldest first
        if query.order == Some(TimeOrder::NewestFirst) {
            rows.reverse();
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn count_row(
        &self,
        measurement: &str,
        filter: Option<&Filter>,
    ) -> Result<Option<Row>, StoreError> {
        let statement = Statement::Count {
            measurement: measurement.to_string(),
            filter: filter.cloned(),
        };
        self.check(StoreCall::Count, Some(measurement), statement)?;
        let points = self.matching(measurement, filter);
        if points.is_empty() {
            return Ok(None);
        }
        let mut counts: BTreeMap<String, i64> = BTreeMap::new();
        for (_, fields) in &points {
            for field in fields.keys() {
                *counts.entry(field.clone()).or_default() += 1;
            }
        }
        let mut row = Row::at(TidyDateTime::from_unix_nanoseconds_i64(0));
        for (field, count) in counts {
            row.set(format!("count_{}", field), count);
        }
        Ok(Some(row))
    }

    async fn write_points(&self, points: &[Point]) -> Result<(), StoreError> {
        let mut per_measurement: BTreeMap<&str, usize> = BTreeMap::new();
        for point in points {
            *per_measurement.entry(&point.measurement).or_default() += 1;
        }
        for measurement in per_measurement.keys().copied() {
            self.check(StoreCall::WritePoints, Some(measurement), "WRITE")?;
        }
        for point in points {
            if point.fields.is_empty() {
                return Err(StoreError::write(
                    &point.measurement,
                    "point carries no fields",
                ));
            }
        }
        self.insert(points);
        for (measurement, count) in per_measurement {
            self.journal.record(format!("WRITE \"{}\" {}", measurement, count));
        }
        Ok(())
    }

    async fn drop_measurement(&self, measurement: &str) -> Result<(), StoreError> {
        let statement = Statement::DropMeasurement {
            measurement: measurement.to_string(),
        };
        self.check(StoreCall::DropMeasurement, Some(measurement), &statement)?;
        self.state().measurements.remove(measurement);
        self.journal.record(statement.to_string());
        Ok(())
    }

    async fn delete_rows(&self, measurement: &str, filter: &Filter) -> Result<(), StoreError> {
        let statement = Statement::Delete {
            measurement: measurement.to_string(),
            filter: filter.clone(),
        };
        self.check(StoreCall::DeleteRows, Some(measurement), &statement)?;
        {
            let mut state = self.state();
            let emptied = match state.measurements.get_mut(measurement) {
                Some(series) => {
                    series.retain(|(time, tags), _| {
                        !filter.matches(TidyDateTime::from_unix_nanoseconds_i128(*time), tags)
                    });
                    series.is_empty()
                }
                None => false,
            };
            if emptied {
                state.measurements.remove(measurement);
            }
        }
        self.journal.record(statement.to_string());
        Ok(())
    }

    async fn list_field_keys(&self, measurement: &str) -> Result<Vec<String>, StoreError> {
        let statement = Statement::ShowFieldKeys {
            measurement: measurement.to_string(),
        };
        self.check(StoreCall::ListFieldKeys, Some(measurement), statement)?;
        let keys: BTreeSet<String> = self
            .matching(measurement, None)
            .into_iter()
            .flat_map(|(_, fields)| fields.into_keys())
            .collect();
        Ok(keys.into_iter().collect())
    }

    async fn list_tag_keys(&self, measurement: &str) -> Result<Vec<String>, StoreError> {
        let statement = Statement::ShowTagKeys {
            measurement: measurement.to_string(),
        };
        self.check(StoreCall::ListTagKeys, Some(measurement), statement)?;
        let keys: BTreeSet<String> = self
            .matching(measurement, None)
            .into_iter()
            .flat_map(|((_, tags), _)| tags.into_keys())
            .collect();
        Ok(keys.into_iter().collect())
    }

    async fn list_tag_values(
        &self,
        measurement: &str,
        tag_key: &str,
    ) -> Result<Vec<String>, StoreError> {
        let statement = Statement::ShowTagValues {
            measurement: measurement.to_string(),
            key: tag_key.to_string(),
        };
        self.check(StoreCall::ListTagValues, Some(measurement), statement)?;
        let values: BTreeSet<String> = self
            .matching(measurement, None)
            .into_iter()
            .filter_map(|((_, mut tags), _)| tags.remove(tag_key))
            .collect();
        Ok(values.into_iter().collect())
    }

    async fn run_aggregation_write(&self, query: &AggregationQuery) -> Result<u64, StoreError> {
        self.check(StoreCall::AggregationWrite, Some(query.source.as_str()), query)?;

        let filter = Filter::older_than(query.cutoff);
        let mut buckets: BTreeMap<(i128, Tags), BTreeMap<&str, Vec<f64>>> = BTreeMap::new();
        for ((time, tags), fields) in self.matching(&query.source, Some(&filter)) {
            let start = TidyDateTime::from_unix_nanoseconds_i128(time)
                .floor_to_bucket(query.interval)
                .to_unix_nanoseconds_i128();
            let bucket = buckets.entry((start, tags)).or_default();
            for (field, _) in &query.fields {
                if let Some(value) = fields.get(field).and_then(Value::as_f64) {
                    bucket.entry(field.as_str()).or_default().push(value);
                }
            }
        }

        let points: Vec<Point> = buckets
            .into_iter()
            .filter_map(|((start, tags), values)| {
                let mut point =
                    Point::new(&query.target, TidyDateTime::from_unix_nanoseconds_i128(start));
                point.tags = tags;
                for (field, reducer) in &query.fields {
                    if let Some(reduced) = values
                        .get(field.as_str())
                        .and_then(|values| reducer.apply(values))
                    {
                        point.fields.insert(field.clone(), Value::Float(reduced));
                    }
                }
                (!point.fields.is_empty()).then_some(point)
            })
            .collect();

        self.insert(&points);
        self.journal.record(query.to_string());
        Ok(points.len() as u64)
    }
}
