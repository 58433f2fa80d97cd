use thiserror::Error;

pub type Result<T> = std::result::Result<T, LedgerError>;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Invalid ownership event: {0}")]
    InvalidData(String),

    #[error("Unsupported trade side: {0}")]
    UnsupportedSide(String),

    #[error("Ownership event not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<diesel::result::Error> for LedgerError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => LedgerError::NotFound(err.to_string()),
            _ => LedgerError::DatabaseError(err.to_string()),
        }
    }
}
