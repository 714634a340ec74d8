//! Wire types exchanged with the profiling backend.
//!
//! Field names follow the backend's JSON (snake_case). Everything here is plain data:
//! no type in this module talks to the network or the UI.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Broad type of a profiled column, as classified by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Numeric,
    Categorical,
    Datetime,
}

/// Cardinality badge. The backend currently only emits `low` and `high`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    Low,
    Medium,
    High,
}

impl Cardinality {
    /// Badge class name, also used as the badge text.
    pub fn as_str(self) -> &'static str {
        match self {
            Cardinality::Low => "low",
            Cardinality::Medium => "medium",
            Cardinality::High => "high",
        }
    }
}

/// Statistics for one column. The column name is the key of [`ColumnProfiles`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub cardinality: Cardinality,
    pub unique_count: u64,
    /// In `[0, 100]`, already rounded by the backend.
    pub missing_percentage: f64,
}

/// Column profiles keyed by column name, in the order the backend sent them.
pub type ColumnProfiles = IndexMap<String, ColumnProfile>;

/// Successful `POST /upload` reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub filename: String,
    pub columns: ColumnProfiles,
}

/// Chart kind of a suggestion.
///
/// Unknown kinds are kept verbatim so that the configuration can be
/// sent back to the backend unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChartType {
    Line,
    Bar,
    Scatter,
    Histogram,
    Box,
    Pie,
    Heatmap,
    Other(String),
}

impl ChartType {
    pub fn as_str(&self) -> &str {
        match self {
            ChartType::Line => "line",
            ChartType::Bar => "bar",
            ChartType::Scatter => "scatter",
            ChartType::Histogram => "histogram",
            ChartType::Box => "box",
            ChartType::Pie => "pie",
            ChartType::Heatmap => "heatmap",
            ChartType::Other(name) => name,
        }
    }
}

impl From<String> for ChartType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "line" => ChartType::Line,
            "bar" => ChartType::Bar,
            "scatter" => ChartType::Scatter,
            "histogram" => ChartType::Histogram,
            "box" => ChartType::Box,
            "pie" => ChartType::Pie,
            "heatmap" => ChartType::Heatmap,
            _ => ChartType::Other(value),
        }
    }
}

impl From<ChartType> for String {
    fn from(value: ChartType) -> Self {
        match value {
            ChartType::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A chart suggestion.
///
/// Only `chart_type` and `title` are interpreted here; every other field
/// (`x`, `y`, `names`, `aggregation`, ...) is carried in `fields` and
/// posted back to `/generate-chart` as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartConfig {
    pub chart_type: ChartType,
    pub title: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ChartConfig {
    pub fn new(chart_type: ChartType, title: impl Into<String>) -> Self {
        ChartConfig {
            chart_type,
            title: title.into(),
            fields: Map::new(),
        }
    }

    /// Adds a backend-defined field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Two suggestions are the same entry when `(chart_type, title)` match.
    pub fn same_suggestion(&self, other: &ChartConfig) -> bool {
        self.chart_type == other.chart_type && self.title == other.title
    }
}

/// A renderable figure: Plotly-style `data` traces plus `layout`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub data: Value,
    #[serde(default)]
    pub layout: Value,
}

/// Error body of a non-2xx backend reply.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub detail: Option<Value>,
}

impl ApiErrorBody {
    /// The `detail` as display text. Structured details (validation errors) become compact JSON.
    pub fn message(&self) -> Option<String> {
        match self.detail.as_ref()? {
            Value::Null => None,
            Value::String(text) if text.is_empty() => None,
            Value::String(text) => Some(text.clone()),
            other => Some(other.to_string()),
        }
    }
}
