use exofile_core::TableError;

#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),

    /// Config validation error (empty column name, overlapping groups, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),

    /// A source table cannot be merged without this column.
    #[error("table '{table}': missing required column '{column}'")]
    MissingColumn { table: String, column: String },

    #[error(transparent)]
    Table(#[from] TableError),
}

pub type MergeResult<T> = Result<T, MergeError>;
