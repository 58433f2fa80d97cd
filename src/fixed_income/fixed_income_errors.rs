use thiserror::Error;

pub type Result<T> = std::result::Result<T, FixedIncomeError>;

#[derive(Error, Debug)]
pub enum FixedIncomeError {
    #[error("Invalid holding data: {0}")]
    InvalidData(String),

    #[error("Holding not found: {0}")]
    NotFound(String),

    #[error("Revaluation failed: {0}")]
    RevaluationFailed(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<diesel::result::Error> for FixedIncomeError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => FixedIncomeError::NotFound(err.to_string()),
            _ => FixedIncomeError::DatabaseError(err.to_string()),
        }
    }
}
