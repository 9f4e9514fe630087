/// Errors raised by [`crate::Table`] operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TableError {
    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),

    #[error("column '{column}' has {found} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("row {row} out of range ({rows} rows)")]
    RowOutOfRange { row: usize, rows: usize },

    /// No row matched the lookup key, not even as a substring.
    #[error("unknown {column} '{key}'")]
    NotFound { column: String, key: String },

    /// Several rows contain the lookup key and none matches it exactly.
    #[error("incomplete {column} '{key}'. Possible values: {}", candidates.join(", "))]
    Ambiguous {
        column: String,
        key: String,
        candidates: Vec<String>,
    },
}
