//! JSON trace format.
//!
//! One JSON object per file: `{ "<table>": [ { "<column>": value, … }, … ] }`
//! with string or numeric cells. Parses eagerly into an in-memory trace;
//! tables keep file order.

use std::fs;
use std::path::Path;

use serde_json::Value;

use super::inmem::InMemoryTrace;
use super::{ColumnValue, Trace, TraceFormat, row};
use crate::compute::ComputeError;

pub struct JsonTraceFormat;

impl TraceFormat for JsonTraceFormat {
    fn name(&self) -> &str {
        "json"
    }

    fn open(&self, path: &Path) -> Result<Box<dyn Trace>, ComputeError> {
        let raw = fs::read_to_string(path).map_err(|e| {
            ComputeError::InvalidArgument(format!("cannot open trace {}: {e}", path.display()))
        })?;
        Ok(Box::new(Self::parse(&raw)?))
    }
}

impl JsonTraceFormat {
    pub fn parse(raw: &str) -> Result<InMemoryTrace, ComputeError> {
        let root: Value = serde_json::from_str(raw)
            .map_err(|e| ComputeError::InvalidArgument(format!("malformed trace JSON: {e}")))?;
        let Value::Object(tables) = root else {
            return Err(ComputeError::InvalidArgument(
                "trace JSON must be an object of tables".into(),
            ));
        };

        let mut builder = InMemoryTrace::builder();
        for (table_name, rows_value) in &tables {
            let Value::Array(raw_rows) = rows_value else {
                return Err(ComputeError::InvalidArgument(format!(
                    "table {table_name:?} must be an array of rows"
                )));
            };
            let mut rows = Vec::with_capacity(raw_rows.len());
            for raw_row in raw_rows {
                let Value::Object(cells) = raw_row else {
                    return Err(ComputeError::InvalidArgument(format!(
                        "rows of table {table_name:?} must be objects"
                    )));
                };
                let mut columns = Vec::with_capacity(cells.len());
                for (column, cell) in cells {
                    let value = match cell {
                        Value::String(s) => ColumnValue::Str(s.clone()),
                        Value::Number(n) => {
                            ColumnValue::Num(n.as_f64().ok_or_else(|| {
                                ComputeError::InvalidArgument(format!(
                                    "column {column:?} of table {table_name:?} is not representable as f64"
                                ))
                            })?)
                        }
                        other => {
                            return Err(ComputeError::InvalidArgument(format!(
                                "column {column:?} of table {table_name:?} has unsupported type {other}"
                            )));
                        }
                    };
                    columns.push((column.as_str(), value));
                }
                rows.push(row(columns));
            }
            builder = builder.table(table_name, rows);
        }
        Ok(builder.build())
    }
}
