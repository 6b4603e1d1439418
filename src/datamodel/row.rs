use super::{TidyDateTime, Value};
use serde::ser::{Serialize, SerializeMap, Serializer};
use smallvec::SmallVec;

pub const TIME_COLUMN: &str = "time";

pub type Columns = SmallVec<[(String, Value); 8]>;

/// One result row as returned by the store: an ordered mapping of column
/// name to value, always carrying a `time` column.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    columns: Columns,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(time: TidyDateTime) -> Self {
        let mut row = Self::new();
        row.set(TIME_COLUMN, Value::Time(time));
        row
    }

    /// Builder-style `set`.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Sets a column, replacing its value in place when it already exists.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.columns.iter_mut().find(|(column, _)| *column == name) {
            Some((_, existing)) => *existing = value,
            None => self.columns.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value)
    }

    pub fn time(&self) -> Option<TidyDateTime> {
        self.get(TIME_COLUMN).and_then(Value::as_time)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .iter()
            .map(|(column, value)| (column.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Sum of the numeric cells of the row.
    ///
    /// Used on `COUNT(*)` result rows, where every field yields a
    /// `count_<field>` column next to the `time` identifier column. Only
    /// integer and float cells are summed.
    pub fn numeric_total(&self) -> u64 {
        let total: f64 = self.columns.iter().filter_map(|(_, v)| v.as_f64()).sum();
        if total.is_finite() && total > 0.0 {
            total.round() as u64
        } else {
            0
        }
    }

    /// Largest numeric cell of the row.
    ///
    /// On a `COUNT(*)` row this is the number of points: every point carries
    /// at least one field, and the densest field is present in all of them.
    pub fn numeric_max(&self) -> u64 {
        self.columns
            .iter()
            .filter_map(|(_, v)| v.as_f64())
            .filter(|v| v.is_finite() && *v > 0.0)
            .fold(0.0_f64, f64::max)
            .round() as u64
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        let mut row = Row::new();
        for (name, value) in iter {
            row.set(name, value);
        }
        row
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, value) in &self.columns {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}
