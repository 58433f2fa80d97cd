use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use diesel::prelude::*;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::constants::ORIGIN_MANUAL;
use crate::distributions::distributions_errors::{DistributionError, Result};

/// One row of a normalized distribution history, as delivered by a feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionRecord {
    /// Ownership cutoff ("data com"); holders on this date are entitled.
    pub entitlement_date: NaiveDate,
    pub payment_date: NaiveDate,
    pub amount_per_unit: Decimal,
    #[serde(default)]
    pub kind: DistributionKind,
    /// Source-defined withholding rate, e.g. 15% on interest-on-capital.
    #[serde(default)]
    pub withholding_rate: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DistributionKind {
    #[default]
    Income,
    Other,
}

impl DistributionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistributionKind::Income => "INCOME",
            DistributionKind::Other => "OTHER",
        }
    }
}

/// A distribution announced by a feed, ready to be matched against the
/// ownership history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionAnnouncement {
    pub instrument_symbol: String,
    pub amount_per_unit: Decimal,
    pub entitlement_date: NaiveDate,
    pub payment_date: NaiveDate,
    pub kind: DistributionKind,
    /// Which feed produced the announcement; part of the ledger dedup key.
    pub origin: String,
    /// Source-defined withholding rate; ignored for the tax-exempt class.
    pub withholding_rate: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CreditStatus {
    Pending,
    Received,
}

impl CreditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreditStatus::Pending => "PENDING",
            CreditStatus::Received => "RECEIVED",
        }
    }
}

impl FromStr for CreditStatus {
    type Err = DistributionError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "PENDING" => Ok(CreditStatus::Pending),
            "RECEIVED" => Ok(CreditStatus::Received),
            other => Err(DistributionError::InvalidData(format!(
                "Unknown credit status: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for CreditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A distribution credited to an owner in the ledger.
///
/// At most one row exists per (owner, instrument, payment date, origin);
/// the unique index is the concurrency control for crediting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditedDistribution {
    pub id: String,
    pub owner_id: String,
    pub instrument_id: String,
    pub amount_per_unit: Decimal,
    pub quantity: Decimal,
    pub gross_amount: Decimal,
    pub withheld_amount: Decimal,
    pub net_amount: Decimal,
    pub entitlement_date: NaiveDate,
    pub payment_date: NaiveDate,
    pub status: CreditStatus,
    pub origin: String,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database model for credited distributions
#[derive(Queryable, Selectable, Identifiable, Insertable, AsChangeset, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::credited_distributions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CreditedDistributionDb {
    pub id: String,
    pub owner_id: String,
    pub instrument_id: String,
    pub amount_per_unit: f64,
    pub quantity: f64,
    pub gross_amount: f64,
    pub withheld_amount: f64,
    pub net_amount: f64,
    pub entitlement_date: NaiveDate,
    pub payment_date: NaiveDate,
    pub status: String,
    pub origin: String,
    pub note: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<CreditedDistributionDb> for CreditedDistribution {
    fn from(db: CreditedDistributionDb) -> Self {
        CreditedDistribution {
            id: db.id,
            owner_id: db.owner_id,
            instrument_id: db.instrument_id,
            amount_per_unit: Decimal::from_f64_retain(db.amount_per_unit).unwrap_or_default(),
            quantity: Decimal::from_f64_retain(db.quantity).unwrap_or_default(),
            gross_amount: Decimal::from_f64_retain(db.gross_amount).unwrap_or_default(),
            withheld_amount: Decimal::from_f64_retain(db.withheld_amount).unwrap_or_default(),
            net_amount: Decimal::from_f64_retain(db.net_amount).unwrap_or_default(),
            entitlement_date: db.entitlement_date,
            payment_date: db.payment_date,
            status: CreditStatus::from_str(&db.status).unwrap_or(CreditStatus::Pending),
            origin: db.origin,
            note: db.note,
            created_at: DateTime::from_naive_utc_and_offset(db.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(db.updated_at, Utc),
        }
    }
}

/// Input for a new ledger entry, computed by the crediting engine or the
/// manual-entry path.
#[derive(Debug, Clone)]
pub struct NewCreditedDistribution {
    pub owner_id: String,
    pub instrument_id: String,
    pub amount_per_unit: Decimal,
    pub quantity: Decimal,
    pub gross_amount: Decimal,
    pub withheld_amount: Decimal,
    pub net_amount: Decimal,
    pub entitlement_date: NaiveDate,
    pub payment_date: NaiveDate,
    pub status: CreditStatus,
    pub origin: String,
    pub note: Option<String>,
}

/// Outcome of the unique-key insert.
#[derive(Debug, Clone)]
pub enum InsertOutcome {
    Created(CreditedDistribution),
    /// The dedup key already exists; by design a successful no-op.
    Duplicate,
}

/// Input for the user-originated manual entry path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualDistributionInput {
    pub owner_id: String,
    pub instrument_symbol: String,
    pub amount_per_unit: Decimal,
    /// Defaults to the reconstructed entitlement-date position when absent.
    pub quantity: Option<Decimal>,
    pub entitlement_date: NaiveDate,
    pub payment_date: NaiveDate,
    pub withholding_rate: Option<Decimal>,
    pub note: Option<String>,
}

/// Result summary of one distribution sweep run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepSummary {
    pub processed: usize,
    pub created: usize,
    pub skipped: usize,
    pub errors: usize,
    pub error_messages: Vec<String>,
}

/// Selects the rows that count toward user-facing totals.
///
/// Rows for the same (instrument, payment date) arriving from different
/// origins all stay in the ledger, since origin is part of the dedup key.
/// A manual entry wins over automatic feeds when both recorded the same
/// payment, so aggregates never double-count it.
pub fn dedupe_for_totals(rows: &[CreditedDistribution]) -> Vec<&CreditedDistribution> {
    let mut groups: HashMap<(&str, NaiveDate), Vec<&CreditedDistribution>> = HashMap::new();
    for row in rows {
        groups
            .entry((row.instrument_id.as_str(), row.payment_date))
            .or_default()
            .push(row);
    }

    let mut selected: Vec<&CreditedDistribution> = Vec::new();
    for (_, group) in groups {
        let manual: Vec<&CreditedDistribution> = group
            .iter()
            .copied()
            .filter(|r| r.origin == ORIGIN_MANUAL)
            .collect();
        if manual.is_empty() {
            selected.extend(group);
        } else {
            selected.extend(manual);
        }
    }

    selected.sort_by(|a, b| {
        a.payment_date
            .cmp(&b.payment_date)
            .then_with(|| a.instrument_id.cmp(&b.instrument_id))
            .then_with(|| a.origin.cmp(&b.origin))
    });
    selected
}
