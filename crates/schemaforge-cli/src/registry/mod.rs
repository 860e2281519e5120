mod logging;
mod run;

pub use logging::init_logging;
pub use run::{start_run, write_catalog, write_graph_report, write_schema, RunContext};

use thiserror::Error;

use crate::writer::WriterError;

/// Registry-level errors for run artifacts.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("artifact write error: {0}")]
    Write(#[from] WriterError),
    #[error("logging error: {0}")]
    Logging(String),
}

/// Result type for registry operations.
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;
