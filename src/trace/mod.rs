//! Tabular trace contract.
//!
//! A trace is an ordered collection of named tables characterizing a
//! workload, read through lazy forward-only cursors. Looking up an unknown
//! table is a normal outcome and yields `None`; only malformed input and
//! unknown format names are errors. Heavy workload-archive parsers live
//! outside this crate; the in-memory and JSON implementations here give the
//! engine a working input path.

mod format;
mod inmem;
mod json;

pub use format::{FormatRegistry, TraceFormat};
pub use inmem::{InMemoryTrace, InMemoryTraceBuilder, Row, row};
pub use json::JsonTraceFormat;

use crate::compute::ComputeError;

/// Task table consumed by the workload layer.
pub const TABLE_TASKS: &str = "tasks";
pub const TASK_ID: &str = "id";
pub const TASK_SUBMIT_TIME_MS: &str = "submit_time_ms";
pub const TASK_BURST: &str = "burst_mhz_s";
pub const TASK_MAX_USAGE: &str = "max_usage_mhz";
pub const TASK_DEADLINE_MS: &str = "deadline_ms";

/// A cell value. Numbers are carried as `f64`; integral accessors check
/// that the value round-trips.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Str(String),
    Num(f64),
}

impl From<&str> for ColumnValue {
    fn from(v: &str) -> Self {
        ColumnValue::Str(v.to_string())
    }
}

impl From<f64> for ColumnValue {
    fn from(v: f64) -> Self {
        ColumnValue::Num(v)
    }
}

impl From<u64> for ColumnValue {
    fn from(v: u64) -> Self {
        ColumnValue::Num(v as f64)
    }
}

/// A collection of related tables.
pub trait Trace: std::fmt::Debug {
    /// Table names, in trace order.
    fn tables(&self) -> Vec<String>;

    fn contains_table(&self, name: &str) -> bool {
        self.table(name).is_some()
    }

    /// `None` when the trace does not define the table.
    fn table(&self, name: &str) -> Option<&dyn Table>;
}

/// One named table of rows.
pub trait Table {
    fn name(&self) -> &str;

    /// Open a forward-only cursor. An unsupported partition is rejected.
    fn new_reader(
        &self,
        partition: Option<&str>,
    ) -> Result<Box<dyn TableReader + '_>, ComputeError>;
}

/// Forward-only cursor over a table. Positioned before the first row;
/// accessors return `None` until the first `next_row` and for absent columns.
pub trait TableReader: std::fmt::Debug {
    /// Advance to the next row. `false` once the table is exhausted.
    fn next_row(&mut self) -> bool;

    fn get_str(&self, column: &str) -> Option<&str>;
    fn get_f64(&self, column: &str) -> Option<f64>;
    fn get_u64(&self, column: &str) -> Option<u64>;
}
