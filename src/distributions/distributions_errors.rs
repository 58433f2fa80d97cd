use thiserror::Error;

pub type Result<T> = std::result::Result<T, DistributionError>;

#[derive(Error, Debug)]
pub enum DistributionError {
    #[error("Invalid distribution data: {0}")]
    InvalidData(String),

    #[error("Instrument not found for distribution: {0}")]
    InstrumentNotFound(String),

    /// An explicit manual entry collided with an existing ledger row.
    /// Batch crediting treats the same collision as a no-op instead.
    #[error("Distribution already recorded for {owner_id}/{instrument_id} paid {payment_date} (origin {origin})")]
    AlreadyRecorded {
        owner_id: String,
        instrument_id: String,
        payment_date: chrono::NaiveDate,
        origin: String,
    },

    #[error("Credited distribution not found: {0}")]
    NotFound(String),

    #[error("Announcement feed unavailable: {0}")]
    FeedUnavailable(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<diesel::result::Error> for DistributionError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => DistributionError::NotFound(err.to_string()),
            _ => DistributionError::DatabaseError(err.to_string()),
        }
    }
}
