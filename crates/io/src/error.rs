use std::path::PathBuf;

use exofile_core::TableError;

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("{}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Header row missing, empty or duplicated column names.
    #[error("bad header: {0}")]
    Header(String),

    #[error("row {row} has {found} fields, header has {expected}")]
    Ragged {
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error(transparent)]
    Table(#[from] TableError),
}

impl IoError {
    pub(crate) fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        IoError::File {
            path: path.into(),
            source,
        }
    }
}

pub type IoResult<T> = Result<T, IoError>;
