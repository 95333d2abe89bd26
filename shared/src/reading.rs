//! Telemetry records and stored rows
//!
//! A [`TelemetryRecord`] is what the sensor node posts. Once stored it becomes a
//! [`SensorRow`]: a timestamp followed by the twelve sensor values, addressed
//! by column position only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema;

/// One telemetry sample as posted by the sensor node.
///
/// Every field is optional and untyped; a missing field becomes an empty cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperatura: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humedad: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lpg_ppm: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h2_ppm: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humo_ppm: Option<Value>,
    #[serde(default, rename = "benceno_mgL", skip_serializing_if = "Option::is_none")]
    pub benceno_mg_l: Option<Value>,
    #[serde(default, rename = "alcohol_mgL", skip_serializing_if = "Option::is_none")]
    pub alcohol_mg_l: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub co_ppm: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub co2_ppm: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amoniaco_ppm: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolueno_ppm: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ica_valor: Option<Value>,
}

impl TelemetryRecord {
    /// Field values in storage column order
    pub fn values(&self) -> [Option<&Value>; schema::FIELD_NAMES.len()] {
        [
            self.temperatura.as_ref(),
            self.humedad.as_ref(),
            self.lpg_ppm.as_ref(),
            self.h2_ppm.as_ref(),
            self.humo_ppm.as_ref(),
            self.benceno_mg_l.as_ref(),
            self.alcohol_mg_l.as_ref(),
            self.co_ppm.as_ref(),
            self.co2_ppm.as_ref(),
            self.amoniaco_ppm.as_ref(),
            self.tolueno_ppm.as_ref(),
            self.ica_valor.as_ref(),
        ]
    }

    /// Build the row to append: `[timestamp, field1, ..., field12]`
    pub fn to_row(&self, timestamp: DateTime<Utc>) -> SensorRow {
        let mut cells = Vec::with_capacity(schema::COLUMN_COUNT);
        cells.push(Cell::Timestamp(timestamp));
        cells.extend(
            self.values()
                .into_iter()
                .map(|v| v.map(Cell::from_json).unwrap_or(Cell::Empty)),
        );
        SensorRow::new(cells)
    }
}

/// A single stored value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
    Timestamp(DateTime<Utc>),
}

static EMPTY_CELL: Cell = Cell::Empty;

impl Cell {
    /// Convert a JSON value the way a spreadsheet stores it
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Cell::Empty,
            Value::Bool(b) => Cell::Bool(*b),
            Value::Number(n) => n.as_f64().map(Cell::Number).unwrap_or(Cell::Empty),
            Value::String(s) => Cell::Text(s.clone()),
            // Nested values keep their compact JSON text
            other => Cell::Text(other.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            // f64 Display already drops the trailing ".0" of integral values
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Text(s) => write!(f, "{}", s),
            Cell::Bool(b) => write!(f, "{}", b),
            Cell::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
        }
    }
}

/// One stored row. Column position is the identity of a field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SensorRow(Vec<Cell>);

impl SensorRow {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self(cells)
    }

    /// Cell at `index`; columns past the end read as empty
    pub fn cell(&self, index: usize) -> &Cell {
        self.0.get(index).unwrap_or(&EMPTY_CELL)
    }

    /// The leading timestamp cell
    pub fn timestamp(&self) -> &Cell {
        self.cell(schema::TIMESTAMP_COLUMN)
    }

    pub fn cells(&self) -> &[Cell] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
