//! In-memory trace: named tables built from row maps.
//!
//! Backs the JSON format and the test suites; also the cheapest way to feed
//! hand-made task rows to the workload layer.

use std::collections::HashMap;

use super::{ColumnValue, Table, TableReader, Trace};
use crate::compute::ComputeError;

/// A single table row: column name to cell value.
pub type Row = HashMap<String, ColumnValue>;

/// Build a row from column/value pairs.
pub fn row<'a, I>(columns: I) -> Row
where
    I: IntoIterator<Item = (&'a str, ColumnValue)>,
{
    columns
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

#[derive(Debug)]
pub struct InMemoryTrace {
    tables: Vec<InMemoryTable>,
}

#[derive(Debug)]
struct InMemoryTable {
    name: String,
    rows: Vec<Row>,
}

impl InMemoryTrace {
    pub fn builder() -> InMemoryTraceBuilder {
        InMemoryTraceBuilder { tables: Vec::new() }
    }
}

pub struct InMemoryTraceBuilder {
    tables: Vec<InMemoryTable>,
}

impl InMemoryTraceBuilder {
    /// Append a table; tables keep insertion order.
    pub fn table(mut self, name: &str, rows: Vec<Row>) -> Self {
        self.tables.push(InMemoryTable {
            name: name.to_string(),
            rows,
        });
        self
    }

    pub fn build(self) -> InMemoryTrace {
        InMemoryTrace {
            tables: self.tables,
        }
    }
}

impl Trace for InMemoryTrace {
    fn tables(&self) -> Vec<String> {
        self.tables.iter().map(|t| t.name.clone()).collect()
    }

    fn table(&self, name: &str) -> Option<&dyn Table> {
        self.tables
            .iter()
            .find(|t| t.name == name)
            .map(|t| t as &dyn Table)
    }
}

impl Table for InMemoryTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn new_reader(
        &self,
        partition: Option<&str>,
    ) -> Result<Box<dyn TableReader + '_>, ComputeError> {
        if let Some(p) = partition {
            return Err(ComputeError::InvalidArgument(format!(
                "unsupported partition {p:?}"
            )));
        }
        Ok(Box::new(InMemoryTableReader {
            rows: &self.rows,
            next: 0,
            current: None,
        }))
    }
}

#[derive(Debug)]
struct InMemoryTableReader<'a> {
    rows: &'a [Row],
    next: usize,
    current: Option<&'a Row>,
}

impl TableReader for InMemoryTableReader<'_> {
    fn next_row(&mut self) -> bool {
        match self.rows.get(self.next) {
            Some(r) => {
                self.current = Some(r);
                self.next += 1;
                true
            }
            None => {
                self.current = None;
                false
            }
        }
    }

    fn get_str(&self, column: &str) -> Option<&str> {
        match self.current?.get(column)? {
            ColumnValue::Str(s) => Some(s),
            ColumnValue::Num(_) => None,
        }
    }

    fn get_f64(&self, column: &str) -> Option<f64> {
        match self.current?.get(column)? {
            ColumnValue::Num(v) => Some(*v),
            ColumnValue::Str(_) => None,
        }
    }

    fn get_u64(&self, column: &str) -> Option<u64> {
        match self.current?.get(column)? {
            ColumnValue::Num(v) if *v >= 0.0 && v.fract() == 0.0 => Some(*v as u64),
            _ => None,
        }
    }
}
