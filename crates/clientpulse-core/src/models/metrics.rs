//! Canonical metrics representation.
//!
//! A [`MetricsDocument`] is either a list of manually entered
//! [`MetricEntry`] pairs or a list of tabular [`MetricRow`]s. Both
//! serialize to a JSON array and keep insertion order, so the same
//! document always produces the same bytes.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A single metric value. Values are stored as provided; consumers
/// coerce as needed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    #[default]
    Null,
    Number(serde_json::Number),
    Text(String),
}

impl MetricValue {
    /// `true` for `Null` and for text that is empty after trimming.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Number(_) => false,
            Self::Text(s) => s.trim().is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for MetricValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for MetricValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for MetricValue {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

/// A manually entered `(name, value)` pair.
///
/// On the wire the name travels as `metric`; `name` is accepted as an
/// alias on input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricEntry {
    #[serde(rename = "metric", alias = "name", default)]
    pub name: String,
    #[serde(default)]
    pub value: MetricValue,
}

impl MetricEntry {
    pub fn new(name: impl Into<String>, value: impl Into<MetricValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// An entry is usable when both its name and value are non-blank.
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty() && !self.value.is_blank()
    }
}

/// One tabular row: an ordered column → value mapping.
///
/// Inserting a column that already exists overwrites its value but keeps
/// the position of the first occurrence.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MetricRow {
    cells: Vec<(String, MetricValue)>,
}

impl MetricRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a cell, returning the previous value when the column was
    /// already present.
    pub fn insert(
        &mut self,
        column: impl Into<String>,
        value: impl Into<MetricValue>,
    ) -> Option<MetricValue> {
        let column = column.into();
        let value = value.into();
        match self.cells.iter_mut().find(|(name, _)| *name == column) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.cells.push((column, value));
                None
            }
        }
    }

    pub fn get(&self, column: &str) -> Option<&MetricValue> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetricValue)> {
        self.cells.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl<K, V> FromIterator<(K, V)> for MetricRow
where
    K: Into<String>,
    V: Into<MetricValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = MetricRow::new();
        for (column, value) in iter {
            row.insert(column, value);
        }
        row
    }
}

impl Serialize for MetricRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (column, value) in &self.cells {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for MetricRow {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RowVisitor;

        impl<'de> Visitor<'de> for RowVisitor {
            type Value = MetricRow;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of column names to metric values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<MetricRow, A::Error> {
                let mut row = MetricRow::new();
                while let Some((column, value)) = access.next_entry::<String, MetricValue>()? {
                    row.insert(column, value);
                }
                Ok(row)
            }
        }

        deserializer.deserialize_map(RowVisitor)
    }
}

/// Where a metrics document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricsSource {
    Tabular,
    Manual,
}

impl MetricsSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tabular => "tabular",
            Self::Manual => "manual",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "tabular" => Some(Self::Tabular),
            "manual" => Some(Self::Manual),
            _ => None,
        }
    }
}

/// Canonical metrics of a report.
///
/// Deserializing an untyped JSON array tries manual entries first (objects
/// with only `metric`/`value` keys) and falls back to tabular rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricsDocument {
    Manual(Vec<MetricEntry>),
    Tabular(Vec<MetricRow>),
}

impl MetricsDocument {
    pub fn source(&self) -> MetricsSource {
        match self {
            Self::Manual(_) => MetricsSource::Manual,
            Self::Tabular(_) => MetricsSource::Tabular,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Manual(entries) => entries.len(),
            Self::Tabular(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 1-based position of the first tabular row without any columns.
    /// Parsed uploads never contain one; only hand-built documents can.
    pub fn first_empty_row(&self) -> Option<usize> {
        match self {
            Self::Manual(_) => None,
            Self::Tabular(rows) => rows.iter().position(MetricRow::is_empty).map(|i| i + 1),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Decode a stored document whose source is known, so a tabular
    /// upload with `metric,value` columns stays tabular.
    pub fn from_json(source: MetricsSource, json: &str) -> serde_json::Result<Self> {
        match source {
            MetricsSource::Manual => serde_json::from_str(json).map(Self::Manual),
            MetricsSource::Tabular => serde_json::from_str(json).map(Self::Tabular),
        }
    }
}
