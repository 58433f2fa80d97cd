use diesel::result::Error as DieselError;
use thiserror::Error;

use crate::distributions::distributions_errors::DistributionError;
use crate::fixed_income::fixed_income_errors::FixedIncomeError;
use crate::indicators::indicators_errors::IndicatorError;
use crate::instruments::instruments_errors::InstrumentError;
use crate::ledger::ledger_errors::LedgerError;
use crate::market_data::market_data_errors::MarketDataError;
use crate::positions::positions_errors::PositionError;

// Create a type alias for Result using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the ledger engine
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Instrument error: {0}")]
    Instrument(#[from] InstrumentError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Position reconstruction error: {0}")]
    Position(#[from] PositionError),

    #[error("Distribution error: {0}")]
    Distribution(#[from] DistributionError),

    #[error("Market data operation failed: {0}")]
    MarketData(#[from] MarketDataError),

    #[error("Indicator operation failed: {0}")]
    Indicator(#[from] IndicatorError),

    #[error("Fixed income error: {0}")]
    FixedIncome(#[from] FixedIncomeError),
}

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(#[from] diesel::result::ConnectionError),

    #[error("Failed to create database pool: {0}")]
    PoolCreationFailed(#[from] r2d2::Error),

    #[error("Database query failed: {0}")]
    QueryFailed(#[from] DieselError),

    #[error("Database migration failed: {0}")]
    MigrationFailed(String),
}

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Required field '{0}' is missing")]
    MissingField(String),

    #[error("Failed to parse decimal number: {0}")]
    DecimalParse(#[from] rust_decimal::Error),
}

impl From<DieselError> for Error {
    fn from(err: DieselError) -> Self {
        Error::Database(DatabaseError::QueryFailed(err))
    }
}

impl From<r2d2::Error> for Error {
    fn from(e: r2d2::Error) -> Self {
        Error::Database(DatabaseError::PoolCreationFailed(e))
    }
}

impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::Validation(ValidationError::DecimalParse(err))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Validation(ValidationError::InvalidInput(err.to_string()))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Validation(ValidationError::InvalidInput(err.to_string()))
    }
}
