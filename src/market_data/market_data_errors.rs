use thiserror::Error;

pub type Result<T> = std::result::Result<T, MarketDataError>;

#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Parsing error: {0}")]
    ParsingError(String),

    /// Terminal: the symbol has no resolvable data. Never retried.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Transient: the provider is throttling us.
    #[error("Rate limit exceeded")]
    RateLimitExceeded,
}
