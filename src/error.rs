use thiserror::Error;

use crate::data::model::ColumnType;

// ---------------------------------------------------------------------------
// Error taxonomy
// ---------------------------------------------------------------------------

/// Everything that can abort report preparation.
///
/// Both variants are fatal: the pipeline never hands out a partially
/// prepared table.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A source could not be opened, fetched, or parsed.
    #[error("cannot read {origin}: {message}")]
    Io { origin: String, message: String },

    /// A table does not have the shape the next stage needs.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl PipelineError {
    pub fn io(origin: impl Into<String>, err: impl std::fmt::Display) -> Self {
        PipelineError::Io {
            origin: origin.into(),
            message: err.to_string(),
        }
    }

    pub fn is_io(&self) -> bool {
        matches!(self, PipelineError::Io { .. })
    }

    pub fn is_schema(&self) -> bool {
        matches!(self, PipelineError::Schema(_))
    }
}

/// Structural problems with a table's columns or index.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("column '{0}' is missing")]
    MissingColumn(String),

    #[error("column '{column}' is {found}, expected {expected}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        found: ColumnType,
    },

    #[error("column '{0}' appears more than once")]
    DuplicateColumn(String),

    #[error("index '{column}' has duplicate label '{label}'")]
    DuplicateIndex { column: String, label: String },

    #[error("column '{column}' has {found} rows, table has {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("rename mapping is not disjoint: '{0}' is both a raw and a canonical name")]
    ConflictingMapping(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
