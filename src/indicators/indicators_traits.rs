use async_trait::async_trait;

use crate::distributions::distributions_model::DistributionRecord;
use crate::indicators::indicators_errors::Result;
use crate::indicators::indicators_model::*;

/// Trait defining the contract for indicator snapshot persistence.
pub trait IndicatorSnapshotRepositoryTrait: Send + Sync {
    fn upsert(&self, snapshot: &IndicatorSnapshot) -> Result<()>;
    fn get(&self, instrument_id: &str) -> Result<Option<IndicatorSnapshotDb>>;
    /// Stamps a failed sync on the row, bumping the error counter.
    fn record_failure(&self, instrument_id: &str) -> Result<()>;
}

/// Trait defining the contract for indicator sync operations.
#[async_trait]
pub trait IndicatorServiceTrait: Send + Sync {
    /// Explicit single-instrument sync; propagates the error taxonomy so
    /// callers can tell "not found" from "try again later".
    async fn sync_instrument(&self, symbol: &str) -> Result<InstrumentIndicators>;

    /// Batch sync over the scraped instrument class; one instrument's
    /// failure never aborts the batch.
    async fn sync_catalog(&self) -> CatalogSyncSummary;

    fn get_snapshot(&self, instrument_id: &str, symbol: &str) -> Result<Option<IndicatorSnapshot>>;

    /// Normalized payout history, served from a fresh snapshot when one
    /// exists and re-scraped otherwise.
    async fn distribution_history(&self, symbol: &str) -> Result<Vec<DistributionRecord>>;
}
