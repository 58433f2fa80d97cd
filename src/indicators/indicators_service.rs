use async_trait::async_trait;
use chrono::{Duration, Utc};
use log::{debug, error, info, warn};
use std::sync::Arc;

use crate::analytics;
use crate::constants::REFERENCE_CACHE_TTL_SECS;
use crate::distributions::distributions_model::DistributionRecord;
use crate::indicators::indicators_errors::{IndicatorError, Result};
use crate::indicators::indicators_model::*;
use crate::indicators::indicators_traits::{
    IndicatorSnapshotRepositoryTrait, IndicatorServiceTrait,
};
use crate::indicators::scraper_client::IndicatorScraper;
use crate::instruments::{InstrumentClass, InstrumentRepositoryTrait};

/// Orchestrates scrape -> normalize -> analyze -> snapshot for the
/// secondary indicator source.
pub struct IndicatorService {
    scraper: Arc<IndicatorScraper>,
    instruments: Arc<dyn InstrumentRepositoryTrait>,
    snapshots: Arc<dyn IndicatorSnapshotRepositoryTrait>,
}

impl IndicatorService {
    pub fn new(
        scraper: Arc<IndicatorScraper>,
        instruments: Arc<dyn InstrumentRepositoryTrait>,
        snapshots: Arc<dyn IndicatorSnapshotRepositoryTrait>,
    ) -> Self {
        Self {
            scraper,
            instruments,
            snapshots,
        }
    }

    fn build_snapshot(instrument_id: &str, indicators: InstrumentIndicators) -> IndicatorSnapshot {
        let today = Utc::now().date_naive();
        let trend = analytics::classify_trend(&indicators.distribution_history);
        let consistency =
            analytics::payment_consistency(&indicators.distribution_history, today);
        let risk = analytics::assess_risk(
            indicators.daily_liquidity,
            indicators.holder_count,
            Some(consistency),
            trend,
        );

        let valuation_band = indicators
            .valuation_ratio
            .map(analytics::classify_valuation_ratio);
        for insight in
            analytics::summarize(&indicators.symbol, trend, consistency, valuation_band, &risk)
        {
            debug!("{}", insight);
        }

        IndicatorSnapshot {
            instrument_id: instrument_id.to_string(),
            indicators,
            trend,
            payment_consistency: consistency,
            risk_level: risk.level,
            last_synced_at: Utc::now(),
            sync_status: SyncStatus::Success,
            // A successful sync wipes the failure trail.
            error_count: 0,
        }
    }
}

#[async_trait]
impl IndicatorServiceTrait for IndicatorService {
    async fn sync_instrument(&self, symbol: &str) -> Result<InstrumentIndicators> {
        let instrument = self
            .instruments
            .get_by_symbol(&symbol.to_uppercase())
            .map_err(|_| IndicatorError::UnknownInstrument(symbol.to_string()))?;

        let indicators = match self.scraper.scrape_indicators(&instrument.symbol).await {
            Ok(indicators) => indicators,
            Err(e) => {
                if let Err(record_err) = self.snapshots.record_failure(&instrument.id) {
                    error!(
                        "Could not record sync failure for {}: {}",
                        instrument.symbol, record_err
                    );
                }
                return Err(e);
            }
        };

        let snapshot = Self::build_snapshot(&instrument.id, indicators.clone());
        self.snapshots.upsert(&snapshot)?;

        info!(
            "Synced indicators for {}: trend {}, consistency {}%, risk {}",
            instrument.symbol,
            snapshot.trend,
            snapshot.payment_consistency.round_dp(0),
            snapshot.risk_level
        );
        Ok(indicators)
    }

    async fn sync_catalog(&self) -> CatalogSyncSummary {
        let mut summary = CatalogSyncSummary::default();

        let instruments = match self.instruments.list_active() {
            Ok(instruments) => instruments,
            Err(e) => {
                error!("Catalog sync aborted: cannot list instruments: {}", e);
                summary.errors.push(e.to_string());
                return summary;
            }
        };

        for instrument in instruments
            .iter()
            .filter(|i| i.class == InstrumentClass::RealEstateFund)
        {
            summary.processed += 1;
            match self.sync_instrument(&instrument.symbol).await {
                Ok(_) => summary.succeeded += 1,
                Err(e) => {
                    warn!("Catalog sync failed for {}: {}", instrument.symbol, e);
                    summary.failed += 1;
                    summary
                        .errors
                        .push(format!("{}: {}", instrument.symbol, e));
                }
            }
        }

        info!(
            "Catalog sync finished: {} processed, {} succeeded, {} failed",
            summary.processed, summary.succeeded, summary.failed
        );
        summary
    }

    fn get_snapshot(&self, instrument_id: &str, symbol: &str) -> Result<Option<IndicatorSnapshot>> {
        Ok(self
            .snapshots
            .get(instrument_id)?
            .map(|row| row.into_domain(symbol)))
    }

    async fn distribution_history(&self, symbol: &str) -> Result<Vec<DistributionRecord>> {
        let instrument = self
            .instruments
            .get_by_symbol(&symbol.to_uppercase())
            .map_err(|_| IndicatorError::UnknownInstrument(symbol.to_string()))?;

        if let Some(row) = self.snapshots.get(&instrument.id)? {
            let snapshot = row.into_domain(&instrument.symbol);
            let fresh_after =
                Utc::now() - Duration::seconds(REFERENCE_CACHE_TTL_SECS as i64);
            if snapshot.sync_status == SyncStatus::Success
                && snapshot.last_synced_at > fresh_after
            {
                return Ok(snapshot.indicators.distribution_history);
            }
        }

        let indicators = self.sync_instrument(&instrument.symbol).await?;
        Ok(indicators.distribution_history)
    }
}
