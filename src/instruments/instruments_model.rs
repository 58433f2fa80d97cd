use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::instruments::instruments_errors::{InstrumentError, Result};

/// Tradable security classes tracked by the ledger.
///
/// `RealEstateFund` distributions are exempt from withholding; every other
/// class applies the rate carried by the announcement source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstrumentClass {
    Stock,
    RealEstateFund,
    Etf,
    DepositaryReceipt,
    Other,
}

impl InstrumentClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstrumentClass::Stock => "STOCK",
            InstrumentClass::RealEstateFund => "REAL_ESTATE_FUND",
            InstrumentClass::Etf => "ETF",
            InstrumentClass::DepositaryReceipt => "DEPOSITARY_RECEIPT",
            InstrumentClass::Other => "OTHER",
        }
    }

    /// Whether distributions for this class are paid without withholding.
    pub fn is_tax_exempt(&self) -> bool {
        matches!(self, InstrumentClass::RealEstateFund)
    }
}

impl FromStr for InstrumentClass {
    type Err = InstrumentError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "STOCK" => Ok(InstrumentClass::Stock),
            "REAL_ESTATE_FUND" => Ok(InstrumentClass::RealEstateFund),
            "ETF" => Ok(InstrumentClass::Etf),
            "DEPOSITARY_RECEIPT" => Ok(InstrumentClass::DepositaryReceipt),
            "OTHER" => Ok(InstrumentClass::Other),
            other => Err(InstrumentError::InvalidData(format!(
                "Unknown instrument class: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for InstrumentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Domain model for a tradable instrument.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub class: InstrumentClass,
    pub currency: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database model for instruments
#[derive(Queryable, Selectable, Identifiable, Insertable, AsChangeset, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::instruments)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct InstrumentDb {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub instrument_class: String,
    pub currency: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<InstrumentDb> for Instrument {
    fn from(db: InstrumentDb) -> Self {
        Instrument {
            id: db.id,
            symbol: db.symbol,
            name: db.name,
            // Unknown class strings degrade to Other rather than poisoning reads.
            class: InstrumentClass::from_str(&db.instrument_class)
                .unwrap_or(InstrumentClass::Other),
            currency: db.currency,
            is_active: db.is_active,
            created_at: DateTime::from_naive_utc_and_offset(db.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(db.updated_at, Utc),
        }
    }
}

/// Input model for registering a new instrument
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewInstrument {
    pub id: Option<String>,
    pub symbol: String,
    pub name: String,
    pub class: InstrumentClass,
    pub currency: String,
}

impl NewInstrument {
    pub fn validate(&self) -> Result<()> {
        if self.symbol.trim().is_empty() {
            return Err(InstrumentError::InvalidData(
                "Symbol cannot be empty".to_string(),
            ));
        }
        if self.name.trim().is_empty() {
            return Err(InstrumentError::InvalidData(
                "Name cannot be empty".to_string(),
            ));
        }
        if self.currency.trim().is_empty() {
            return Err(InstrumentError::InvalidData(
                "Currency cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Mutable descriptive fields refreshed by the reference-data sync.
#[derive(Debug, Clone)]
pub struct InstrumentProfileUpdate {
    pub symbol: String,
    pub name: Option<String>,
    pub currency: Option<String>,
}
