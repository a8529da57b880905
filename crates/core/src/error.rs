use crate::sheet::SheetError;

#[derive(Debug, thiserror::Error)]
pub enum CensusError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("unknown disposition: {0}")]
    UnknownDisposition(String),
    #[error("unknown special category: {0}")]
    UnknownSpecialTag(String),
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("row {0} does not hold a patient record")]
    RecordNotFound(usize),
    #[error("row {0} is a header row and cannot be written")]
    HeaderRowWrite(usize),

    #[error("{0}")]
    Backend(#[from] SheetError),

    #[error("invalid text: {0}")]
    Text(#[from] census_types::TextError),
}

pub type CensusResult<T> = std::result::Result<T, CensusError>;
