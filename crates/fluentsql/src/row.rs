//! Result rows returned by a [`Driver`](crate::Driver).

use crate::client::FetchShape;
use crate::error::{QueryError, QueryResult};
use serde::de::DeserializeOwned;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::{Map, Value};
use std::sync::Arc;

/// A single result row.
///
/// Object-shaped rows carry their column names (shared across all rows of one
/// result set); row-shaped rows are positional only.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Option<Arc<[String]>>,
    values: Vec<Value>,
}

impl Row {
    /// Build an object-shaped row. `columns` and `values` are paired by position.
    pub fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        Self {
            columns: Some(columns),
            values,
        }
    }

    /// Build a positional row.
    pub fn positional(values: Vec<Value>) -> Self {
        Self {
            columns: None,
            values,
        }
    }

    /// Build an object-shaped row from a JSON object.
    pub fn from_object(object: Map<String, Value>) -> Self {
        let (columns, values): (Vec<String>, Vec<Value>) = object.into_iter().unzip();
        Self::new(columns.into(), values)
    }

    /// Re-shape the row. Converting to [`FetchShape::Row`] drops column names.
    pub fn into_shape(self, shape: FetchShape) -> Self {
        match shape {
            FetchShape::Row => Self::positional(self.values),
            FetchShape::Object => self,
        }
    }

    /// Column names, when the row is object-shaped.
    pub fn columns(&self) -> Option<&[String]> {
        self.columns.as_deref()
    }

    /// Values in column order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Consume the row, returning its values.
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at `index`.
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Value of `column` (object-shaped rows only).
    pub fn get(&self, column: &str) -> Option<&Value> {
        let columns = self.columns.as_ref()?;
        let idx = columns.iter().position(|c| c == column)?;
        self.values.get(idx)
    }

    /// Decode the value of `column` into `T`.
    pub fn try_get<T: DeserializeOwned>(&self, column: &str) -> QueryResult<T> {
        let value = self
            .get(column)
            .ok_or_else(|| QueryError::decode(column, "column not present in row"))?;
        T::deserialize(value).map_err(|e| QueryError::decode(column, e.to_string()))
    }

    /// Object view of the row (`None` for positional rows).
    pub fn to_object(&self) -> Option<Map<String, Value>> {
        let columns = self.columns.as_ref()?;
        Some(
            columns
                .iter()
                .cloned()
                .zip(self.values.iter().cloned())
                .collect(),
        )
    }

    /// Map the whole row into `T`.
    ///
    /// Object-shaped rows deserialize as a map (structs, `HashMap`, ...);
    /// positional rows deserialize as a sequence (tuples, `Vec`, ...).
    pub fn deserialize<T: DeserializeOwned>(&self) -> QueryResult<T> {
        let value = match self.to_object() {
            Some(object) => Value::Object(object),
            None => Value::Array(self.values.clone()),
        };
        serde_json::from_value(value).map_err(|e| QueryError::decode("<row>", e.to_string()))
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.columns {
            Some(columns) => {
                let mut map = serializer.serialize_map(Some(self.values.len()))?;
                for (column, value) in columns.iter().zip(&self.values) {
                    map.serialize_entry(column, value)?;
                }
                map.end()
            }
            None => {
                let mut seq = serializer.serialize_seq(Some(self.values.len()))?;
                for value in &self.values {
                    seq.serialize_element(value)?;
                }
                seq.end()
            }
        }
    }
}
