use thiserror::Error;

/// Error type shared across schemaforge crates.
///
/// The schema build itself never fails; these variants surface from catalog
/// access and from strict-mode checks layered on top of the build.
#[derive(Debug, Error)]
pub enum Error {
    /// Catalog query or driver failure.
    #[error("database error: {0}")]
    Db(String),
    /// The schema violates a check the caller asked to enforce.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
}

/// Convenience alias for results returned by schemaforge crates.
pub type Result<T> = std::result::Result<T, Error>;
