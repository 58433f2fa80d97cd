use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use diesel::prelude::*;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::fixed_income::fixed_income_errors::{FixedIncomeError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HoldingStatus {
    Active,
    Closed,
}

impl HoldingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HoldingStatus::Active => "ACTIVE",
            HoldingStatus::Closed => "CLOSED",
        }
    }
}

impl FromStr for HoldingStatus {
    type Err = FixedIncomeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ACTIVE" => Ok(HoldingStatus::Active),
            "CLOSED" => Ok(HoldingStatus::Closed),
            other => Err(FixedIncomeError::InvalidData(format!(
                "Unknown holding status: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for HoldingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A manually-valued fixed-income-like product. No unit quantities and no
/// event log: it is created on entry, revalued by an external rate-indexed
/// calculator, and closed by a status change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedIncomeHolding {
    pub id: String,
    pub owner_id: String,
    pub category: String,
    pub invested_amount: Decimal,
    pub current_value: Option<Decimal>,
    pub status: HoldingStatus,
    pub opened_at: NaiveDate,
    pub closed_at: Option<NaiveDate>,
    pub updated_at: DateTime<Utc>,
}

impl FixedIncomeHolding {
    /// Valuation falls back to the invested amount until the first
    /// revaluation lands.
    pub fn effective_value(&self) -> Decimal {
        self.current_value.unwrap_or(self.invested_amount)
    }
}

/// Database model for fixed income holdings
#[derive(Queryable, Selectable, Identifiable, Insertable, AsChangeset, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::fixed_income_holdings)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct FixedIncomeHoldingDb {
    pub id: String,
    pub owner_id: String,
    pub category: String,
    pub invested_amount: f64,
    pub current_value: Option<f64>,
    pub status: String,
    pub opened_at: NaiveDate,
    pub closed_at: Option<NaiveDate>,
    pub updated_at: NaiveDateTime,
}

impl From<FixedIncomeHoldingDb> for FixedIncomeHolding {
    fn from(db: FixedIncomeHoldingDb) -> Self {
        FixedIncomeHolding {
            id: db.id,
            owner_id: db.owner_id,
            category: db.category,
            invested_amount: Decimal::from_f64_retain(db.invested_amount).unwrap_or_default(),
            current_value: db.current_value.and_then(Decimal::from_f64_retain),
            status: HoldingStatus::from_str(&db.status).unwrap_or(HoldingStatus::Active),
            opened_at: db.opened_at,
            closed_at: db.closed_at,
            updated_at: DateTime::from_naive_utc_and_offset(db.updated_at, Utc),
        }
    }
}

/// Input model for a new manually-valued holding
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewFixedIncomeHolding {
    pub owner_id: String,
    pub category: String,
    pub invested_amount: Decimal,
    pub opened_at: NaiveDate,
}

impl NewFixedIncomeHolding {
    pub fn validate(&self) -> Result<()> {
        if self.owner_id.trim().is_empty() {
            return Err(FixedIncomeError::InvalidData(
                "Owner ID cannot be empty".to_string(),
            ));
        }
        if self.category.trim().is_empty() {
            return Err(FixedIncomeError::InvalidData(
                "Category cannot be empty".to_string(),
            ));
        }
        if self.invested_amount <= Decimal::ZERO {
            return Err(FixedIncomeError::InvalidData(format!(
                "Invested amount must be positive, got {}",
                self.invested_amount
            )));
        }
        Ok(())
    }
}

/// Result summary of a revaluation batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevaluationSummary {
    pub processed: usize,
    pub revalued: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}
