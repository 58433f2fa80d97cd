use thiserror::Error;

pub type Result<T> = std::result::Result<T, InstrumentError>;

#[derive(Error, Debug)]
pub enum InstrumentError {
    #[error("Instrument not found: {0}")]
    NotFound(String),

    #[error("Invalid instrument data: {0}")]
    InvalidData(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<diesel::result::Error> for InstrumentError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => InstrumentError::NotFound(err.to_string()),
            _ => InstrumentError::DatabaseError(err.to_string()),
        }
    }
}
