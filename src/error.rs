use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("failed to read student file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("file has no header row")]
    MissingHeader,

    #[error("column {0:?} appears more than once in the header")]
    DuplicateColumn(String),
}

pub type Result<T> = std::result::Result<T, IngestError>;
