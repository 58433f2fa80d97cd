use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use rust_decimal::prelude::*;
use std::sync::Arc;

use crate::db::get_connection;
use crate::indicators::indicators_errors::{IndicatorError, Result};
use crate::indicators::indicators_model::*;
use crate::indicators::indicators_traits::IndicatorSnapshotRepositoryTrait;
use crate::schema::indicator_snapshots;

/// Repository for cached indicator snapshots (one row per instrument)
pub struct IndicatorSnapshotRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
}

impl IndicatorSnapshotRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }
}

impl IndicatorSnapshotRepositoryTrait for IndicatorSnapshotRepository {
    /// Overwrites the instrument's snapshot row with the latest sync result.
    fn upsert(&self, snapshot: &IndicatorSnapshot) -> Result<()> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| IndicatorError::DatabaseError(e.to_string()))?;

        let history_json = serde_json::to_string(&snapshot.indicators.distribution_history)
            .map_err(|e| IndicatorError::DatabaseError(e.to_string()))?;

        let row = IndicatorSnapshotDb {
            instrument_id: snapshot.instrument_id.clone(),
            price: snapshot.indicators.price.and_then(|v| v.to_f64()),
            valuation_ratio: snapshot.indicators.valuation_ratio.and_then(|v| v.to_f64()),
            net_worth: snapshot.indicators.net_worth.and_then(|v| v.to_f64()),
            daily_liquidity: snapshot.indicators.daily_liquidity.and_then(|v| v.to_f64()),
            holder_count: snapshot.indicators.holder_count,
            distribution_history: history_json,
            trend: snapshot.trend.as_str().to_string(),
            payment_consistency: snapshot.payment_consistency.to_f64().unwrap_or(0.0),
            risk_level: snapshot.risk_level.as_str().to_string(),
            last_synced_at: snapshot.last_synced_at.naive_utc(),
            sync_status: snapshot.sync_status.as_str().to_string(),
            error_count: snapshot.error_count,
        };

        diesel::insert_into(indicator_snapshots::table)
            .values(&row)
            .on_conflict(indicator_snapshots::instrument_id)
            .do_update()
            .set(&row)
            .execute(&mut conn)
            .map_err(IndicatorError::from)?;

        Ok(())
    }

    fn get(&self, instrument_id: &str) -> Result<Option<IndicatorSnapshotDb>> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| IndicatorError::DatabaseError(e.to_string()))?;

        indicator_snapshots::table
            .find(instrument_id)
            .select(IndicatorSnapshotDb::as_select())
            .first::<IndicatorSnapshotDb>(&mut conn)
            .optional()
            .map_err(IndicatorError::from)
    }

    fn record_failure(&self, instrument_id: &str) -> Result<()> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| IndicatorError::DatabaseError(e.to_string()))?;

        let now = Utc::now().naive_utc();
        let updated = diesel::update(indicator_snapshots::table.find(instrument_id))
            .set((
                indicator_snapshots::sync_status.eq(SyncStatus::Failed.as_str()),
                indicator_snapshots::error_count.eq(indicator_snapshots::error_count + 1),
                indicator_snapshots::last_synced_at.eq(now),
            ))
            .execute(&mut conn)
            .map_err(IndicatorError::from)?;

        // First failure before any successful sync: create the row so the
        // error trail is still visible.
        if updated == 0 {
            let row = IndicatorSnapshotDb {
                instrument_id: instrument_id.to_string(),
                price: None,
                valuation_ratio: None,
                net_worth: None,
                daily_liquidity: None,
                holder_count: None,
                distribution_history: "[]".to_string(),
                trend: "UNKNOWN".to_string(),
                payment_consistency: 0.0,
                risk_level: "UNKNOWN".to_string(),
                last_synced_at: now,
                sync_status: SyncStatus::Failed.as_str().to_string(),
                error_count: 1,
            };
            diesel::insert_into(indicator_snapshots::table)
                .values(&row)
                .execute(&mut conn)
                .map_err(IndicatorError::from)?;
        }

        Ok(())
    }
}
