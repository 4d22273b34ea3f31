//! Error types shared by the executor, forms and page composer.

use thiserror::Error;

/// Failures raised while talking to the database.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database connection failed: {0}")]
    Connect(#[source] rusqlite::Error),

    #[error("Database error: {0}")]
    Statement(#[from] rusqlite::Error),

    /// A declared guard found dependent rows; nothing was written.
    #[error("{0}")]
    Blocked(String),

    #[error("{0} not found")]
    NotFound(String),
}

impl DbError {
    pub fn code(&self) -> &'static str {
        match self {
            DbError::Connect(_) => "connection_failed",
            DbError::Statement(_) => "db_write_failed",
            DbError::Blocked(_) => "blocked",
            DbError::NotFound(_) => "not_found",
        }
    }
}

/// Submitted form values that cannot be turned into statement parameters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormError {
    #[error("Please fill all required fields: {0}")]
    Missing(String),

    #[error("{label}: '{choice}' is not one of the available options")]
    UnknownOption { label: String, choice: String },

    #[error("{label}: {value} is outside {min}..={max}")]
    OutOfRange {
        label: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{label}: '{value}' is not a date (expected YYYY-MM-DD)")]
    InvalidDate { label: String, value: String },

    #[error("{label}: '{value}' is not a number")]
    InvalidNumber { label: String, value: String },
}

/// Errors surfaced by the entity page views.
#[derive(Error, Debug)]
pub enum CrudError {
    #[error(transparent)]
    Form(#[from] FormError),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error("{entity} does not support {view}")]
    Unsupported { entity: String, view: &'static str },

    #[error("{0}")]
    Selection(String),

    #[error("{0}")]
    NotFound(String),
}

impl CrudError {
    pub fn code(&self) -> &'static str {
        match self {
            CrudError::Form(_) => "invalid_input",
            CrudError::Db(e) => e.code(),
            CrudError::Unsupported { .. } => "unsupported",
            CrudError::Selection(_) => "bad_params",
            CrudError::NotFound(_) => "not_found",
        }
    }
}
