use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use log::warn;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::analytics::{DistributionTrend, RiskLevel};
use crate::distributions::distributions_model::DistributionRecord;

/// Normalized indicators for one instrument, as produced by the scraper
/// pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentIndicators {
    pub symbol: String,
    pub price: Option<Decimal>,
    /// Price-to-book equivalent (P/VP).
    pub valuation_ratio: Option<Decimal>,
    pub net_worth: Option<Decimal>,
    pub daily_liquidity: Option<Decimal>,
    pub holder_count: Option<i64>,
    /// Ascending by payment date.
    pub distribution_history: Vec<DistributionRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncStatus {
    Success,
    Failed,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Success => "SUCCESS",
            SyncStatus::Failed => "FAILED",
        }
    }
}

impl FromStr for SyncStatus {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, ()> {
        match s {
            "SUCCESS" => Ok(SyncStatus::Success),
            _ => Ok(SyncStatus::Failed),
        }
    }
}

/// One snapshot row per instrument, overwritten on each successful sync.
/// `sync_status` and `error_count` are the observability trail for the
/// unattended pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorSnapshot {
    pub instrument_id: String,
    pub indicators: InstrumentIndicators,
    pub trend: DistributionTrend,
    pub payment_consistency: Decimal,
    pub risk_level: RiskLevel,
    pub last_synced_at: DateTime<Utc>,
    pub sync_status: SyncStatus,
    pub error_count: i32,
}

/// Database model for indicator snapshots
#[derive(Queryable, Selectable, Identifiable, Insertable, AsChangeset, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::indicator_snapshots)]
#[diesel(primary_key(instrument_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct IndicatorSnapshotDb {
    pub instrument_id: String,
    pub price: Option<f64>,
    pub valuation_ratio: Option<f64>,
    pub net_worth: Option<f64>,
    pub daily_liquidity: Option<f64>,
    pub holder_count: Option<i64>,
    pub distribution_history: String,
    pub trend: String,
    pub payment_consistency: f64,
    pub risk_level: String,
    pub last_synced_at: NaiveDateTime,
    pub sync_status: String,
    pub error_count: i32,
}

impl IndicatorSnapshotDb {
    pub fn into_domain(self, symbol: &str) -> IndicatorSnapshot {
        let history: Vec<DistributionRecord> = serde_json::from_str(&self.distribution_history)
            .unwrap_or_else(|e| {
                warn!(
                    "Discarding unreadable distribution history for {}: {}",
                    self.instrument_id, e
                );
                Vec::new()
            });

        IndicatorSnapshot {
            instrument_id: self.instrument_id,
            indicators: InstrumentIndicators {
                symbol: symbol.to_string(),
                price: self.price.and_then(Decimal::from_f64_retain),
                valuation_ratio: self.valuation_ratio.and_then(Decimal::from_f64_retain),
                net_worth: self.net_worth.and_then(Decimal::from_f64_retain),
                daily_liquidity: self.daily_liquidity.and_then(Decimal::from_f64_retain),
                holder_count: self.holder_count,
                distribution_history: history,
            },
            trend: DistributionTrend::from_str(&self.trend).unwrap_or_default(),
            payment_consistency: Decimal::from_f64_retain(self.payment_consistency)
                .unwrap_or_default(),
            risk_level: RiskLevel::from_str(&self.risk_level).unwrap_or_default(),
            last_synced_at: DateTime::from_naive_utc_and_offset(self.last_synced_at, Utc),
            sync_status: SyncStatus::from_str(&self.sync_status).unwrap_or(SyncStatus::Failed),
            error_count: self.error_count,
        }
    }
}

/// Result summary of a catalog-wide indicator sync.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSyncSummary {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}
