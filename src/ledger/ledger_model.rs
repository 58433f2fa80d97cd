use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use diesel::prelude::*;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ledger::ledger_errors::{LedgerError, Result};

/// Direction of an ownership event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeSide {
    Acquire,
    Dispose,
}

impl TradeSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSide::Acquire => "ACQUIRE",
            TradeSide::Dispose => "DISPOSE",
        }
    }
}

impl FromStr for TradeSide {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ACQUIRE" => Ok(TradeSide::Acquire),
            "DISPOSE" => Ok(TradeSide::Dispose),
            other => Err(LedgerError::UnsupportedSide(other.to_string())),
        }
    }
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable entry of the append-only buy/sell log.
///
/// Events are never updated or deleted; a correction is a new event. Replay
/// order is (effective_date, sequence), where `sequence` is the insertion
/// counter assigned by the repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnershipEvent {
    pub id: String,
    pub owner_id: String,
    pub instrument_id: String,
    pub side: TradeSide,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub fees: Decimal,
    pub effective_date: NaiveDate,
    pub venue: Option<String>,
    pub sequence: i64,
    pub created_at: DateTime<Utc>,
}

/// Database model for ownership events
#[derive(Queryable, Selectable, Identifiable, Insertable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::ownership_events)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct OwnershipEventDb {
    pub id: String,
    pub owner_id: String,
    pub instrument_id: String,
    pub side: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub fees: f64,
    pub effective_date: NaiveDate,
    pub venue: Option<String>,
    pub sequence: i64,
    pub created_at: NaiveDateTime,
}

impl From<OwnershipEventDb> for OwnershipEvent {
    fn from(db: OwnershipEventDb) -> Self {
        OwnershipEvent {
            id: db.id,
            owner_id: db.owner_id,
            instrument_id: db.instrument_id,
            side: TradeSide::from_str(&db.side).unwrap_or(TradeSide::Acquire),
            quantity: Decimal::from_f64_retain(db.quantity).unwrap_or_default(),
            unit_price: Decimal::from_f64_retain(db.unit_price).unwrap_or_default(),
            fees: Decimal::from_f64_retain(db.fees).unwrap_or_default(),
            effective_date: db.effective_date,
            venue: db.venue,
            sequence: db.sequence,
            created_at: DateTime::from_naive_utc_and_offset(db.created_at, Utc),
        }
    }
}

/// Input model for appending a new ownership event
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewOwnershipEvent {
    pub id: Option<String>,
    pub owner_id: String,
    pub instrument_id: String,
    pub side: TradeSide,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub fees: Decimal,
    pub effective_date: NaiveDate,
    pub venue: Option<String>,
}

impl NewOwnershipEvent {
    pub fn validate(&self) -> Result<()> {
        if self.owner_id.trim().is_empty() {
            return Err(LedgerError::InvalidData(
                "Owner ID cannot be empty".to_string(),
            ));
        }
        if self.instrument_id.trim().is_empty() {
            return Err(LedgerError::InvalidData(
                "Instrument ID cannot be empty".to_string(),
            ));
        }
        if self.quantity <= Decimal::ZERO {
            return Err(LedgerError::InvalidData(format!(
                "Quantity must be positive, got {}",
                self.quantity
            )));
        }
        if self.unit_price < Decimal::ZERO {
            return Err(LedgerError::InvalidData(format!(
                "Unit price cannot be negative, got {}",
                self.unit_price
            )));
        }
        if self.fees < Decimal::ZERO {
            return Err(LedgerError::InvalidData(format!(
                "Fees cannot be negative, got {}",
                self.fees
            )));
        }
        Ok(())
    }
}
