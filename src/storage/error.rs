use thiserror::Error;

/// Failures reported by a time-series store gateway.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// The store could not be reached
    #[error("Connection error: {0}")]
    Connection(String),

    /// A statement was rejected or failed while executing
    #[error("Query failed: {statement} - {details}")]
    Query { statement: String, details: String },

    /// Points could not be written
    #[error("Write to {measurement} failed: {details}")]
    Write {
        measurement: String,
        details: String,
    },

    /// Measurement not found
    #[error("Measurement not found: {measurement}")]
    MeasurementNotFound { measurement: String },
}

impl StoreError {
    /// Create a query error from the rendered statement
    pub fn query(statement: impl std::fmt::Display, details: impl Into<String>) -> Self {
        StoreError::Query {
            statement: statement.to_string(),
            details: details.into(),
        }
    }

    pub fn write(measurement: &str, details: impl Into<String>) -> Self {
        StoreError::Write {
            measurement: measurement.to_string(),
            details: details.into(),
        }
    }
}
