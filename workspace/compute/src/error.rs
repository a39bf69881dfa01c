use thiserror::Error;

/// Error types for the compute module
#[derive(Error, Debug)]
pub enum ComputeError {
    /// Error from the database operations
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// A data source endpoint failed and no further fallback tier exists
    #[error("Data source error: {0}")]
    Source(String),

    /// Fetched data did not have the expected shape. The message is surfaced
    /// to the caller verbatim.
    #[error("{0}")]
    Shape(String),

    /// A month filter string could not be parsed
    #[error("Invalid month filter: {0}")]
    Month(String),
}

/// Type alias for Result with ComputeError
pub type Result<T> = std::result::Result<T, ComputeError>;
