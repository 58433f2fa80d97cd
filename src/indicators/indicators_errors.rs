use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndicatorError>;

/// Errors from the secondary indicator source and its pipeline.
///
/// `SymbolNotFound` is terminal and never retried; `TransientUnavailable`
/// is what the retry loop reports after backoff is exhausted.
#[derive(Error, Debug)]
pub enum IndicatorError {
    #[error("Symbol not found at indicator source: {0}")]
    SymbolNotFound(String),

    #[error("Indicator source unavailable: {0}")]
    TransientUnavailable(String),

    /// Consistency fault: a scraped value failed locale normalization.
    #[error("Failed to normalize '{raw}': {reason}")]
    NormalizationFailed { raw: String, reason: String },

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Instrument not registered: {0}")]
    UnknownInstrument(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<diesel::result::Error> for IndicatorError {
    fn from(err: diesel::result::Error) -> Self {
        IndicatorError::DatabaseError(err.to_string())
    }
}
