//! Trace format registry: open a trace by location and format name.

use std::path::Path;

use tracing::debug;

use super::Trace;
use crate::compute::ComputeError;

/// A named, openable trace format.
pub trait TraceFormat: Send + Sync {
    fn name(&self) -> &str;

    /// Open the trace at `path`. A missing or malformed file is rejected
    /// with `InvalidArgument`.
    fn open(&self, path: &Path) -> Result<Box<dyn Trace>, ComputeError>;
}

/// Registry of trace formats, consulted by name.
pub struct FormatRegistry {
    formats: Vec<Box<dyn TraceFormat>>,
}

impl FormatRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            formats: Vec::new(),
        }
    }

    pub fn register(&mut self, format: Box<dyn TraceFormat>) {
        debug!(format = format.name(), "注册 trace 格式");
        self.formats.push(format);
    }

    pub fn format_names(&self) -> Vec<String> {
        self.formats.iter().map(|f| f.name().to_string()).collect()
    }

    /// Open a trace in the given format; an unknown format name is rejected.
    pub fn open(&self, path: &Path, format: &str) -> Result<Box<dyn Trace>, ComputeError> {
        let provider = self
            .formats
            .iter()
            .find(|f| f.name() == format)
            .ok_or_else(|| ComputeError::InvalidArgument(format!("unknown format {format}")))?;
        provider.open(path)
    }
}

impl Default for FormatRegistry {
    /// The default registry knows the built-in `json` format.
    fn default() -> Self {
        let mut reg = Self::new();
        reg.register(Box::new(super::JsonTraceFormat));
        reg
    }
}
