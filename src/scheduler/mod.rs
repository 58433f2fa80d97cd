//! Background schedulers for the unattended pipeline.
//!
//! Pure orchestration: every job body is a service call; the business
//! rules live in the services.

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use chrono_tz::America::Sao_Paulo;
use log::{info, warn};
use std::sync::Arc;
use tokio::time::{interval, sleep, Duration};

use crate::constants::{
    DISTRIBUTION_SWEEP_INTERVAL_SECS, QUOTE_REFRESH_INTERVAL_SECS, SCHEDULER_INITIAL_DELAY_SECS,
    TRADING_WINDOW_CLOSE_HOUR, TRADING_WINDOW_OPEN_HOUR,
};
use crate::distributions::distributions_traits::DividendServiceTrait;
use crate::indicators::indicators_traits::IndicatorServiceTrait;
use crate::instruments::InstrumentRepositoryTrait;
use crate::market_data::market_data_traits::MarketDataServiceTrait;

/// Services the scheduled jobs dispatch into.
pub struct JobContext {
    pub instruments: Arc<dyn InstrumentRepositoryTrait>,
    pub market_data: Arc<dyn MarketDataServiceTrait>,
    pub dividends: Arc<dyn DividendServiceTrait>,
    pub indicators: Arc<dyn IndicatorServiceTrait>,
}

/// Whether the B3 trading window is open at the given instant.
pub fn is_within_trading_window(now: DateTime<Utc>) -> bool {
    let local = now.with_timezone(&Sao_Paulo);
    let weekday = local.weekday();
    if weekday == Weekday::Sat || weekday == Weekday::Sun {
        return false;
    }
    let hour = local.hour();
    hour >= TRADING_WINDOW_OPEN_HOUR && hour < TRADING_WINDOW_CLOSE_HOUR
}

/// Refreshes live quotes for the active catalog every 30 minutes during
/// market hours.
pub fn start_quote_refresh_scheduler(context: Arc<JobContext>) {
    tokio::spawn(async move {
        info!("Quote refresh scheduler started");
        sleep(Duration::from_secs(SCHEDULER_INITIAL_DELAY_SECS)).await;

        let mut ticker = interval(Duration::from_secs(QUOTE_REFRESH_INTERVAL_SECS));
        loop {
            ticker.tick().await;

            if !is_within_trading_window(Utc::now()) {
                continue;
            }

            let symbols = match context.instruments.list_active() {
                Ok(instruments) => instruments
                    .into_iter()
                    .map(|i| i.symbol)
                    .collect::<Vec<_>>(),
                Err(e) => {
                    warn!("Quote refresh skipped: cannot list instruments: {}", e);
                    continue;
                }
            };
            if symbols.is_empty() {
                continue;
            }

            let quotes = context.market_data.get_quotes(&symbols).await;
            info!(
                "Scheduled quote refresh resolved {}/{} symbols",
                quotes.len(),
                symbols.len()
            );
        }
    });
}

/// Runs the distribution sweep twice a day. Safe to overlap with reads and
/// with itself: crediting is idempotent.
pub fn start_distribution_sweep_scheduler(context: Arc<JobContext>) {
    tokio::spawn(async move {
        info!("Distribution sweep scheduler started");
        sleep(Duration::from_secs(SCHEDULER_INITIAL_DELAY_SECS)).await;

        let mut ticker = interval(Duration::from_secs(DISTRIBUTION_SWEEP_INTERVAL_SECS));
        loop {
            ticker.tick().await;

            let summary = context.dividends.run_distribution_sweep().await;
            info!(
                "Scheduled sweep: {} processed, {} created, {} skipped, {} errors",
                summary.processed, summary.created, summary.skipped, summary.errors
            );
        }
    });
}

/// On-demand sync after a new purchase: refresh the instrument's quote and
/// indicators in the background without blocking the purchase flow.
pub fn trigger_post_purchase_sync(context: Arc<JobContext>, symbol: String) {
    tokio::spawn(async move {
        if let Err(e) = context.market_data.refresh_quote(&symbol).await {
            warn!("Post-purchase quote refresh failed for {}: {}", symbol, e);
        }
        if let Err(e) = context.indicators.sync_instrument(&symbol).await {
            warn!("Post-purchase indicator sync failed for {}: {}", symbol, e);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn weekday_mid_session_is_open() {
        // Wednesday 2024-06-12 14:00 São Paulo (17:00 UTC, BRT = UTC-3)
        let now = Utc.with_ymd_and_hms(2024, 6, 12, 17, 0, 0).unwrap();
        assert!(is_within_trading_window(now));
    }

    #[test]
    fn weekend_is_closed() {
        // Saturday 2024-06-15 14:00 São Paulo
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 17, 0, 0).unwrap();
        assert!(!is_within_trading_window(now));
    }

    #[test]
    fn early_morning_is_closed() {
        // Wednesday 2024-06-12 07:00 São Paulo (10:00 UTC)
        let now = Utc.with_ymd_and_hms(2024, 6, 12, 10, 0, 0).unwrap();
        assert!(!is_within_trading_window(now));
    }

    #[test]
    fn after_close_is_closed() {
        // Wednesday 2024-06-12 19:00 São Paulo (22:00 UTC)
        let now = Utc.with_ymd_and_hms(2024, 6, 12, 22, 0, 0).unwrap();
        assert!(!is_within_trading_window(now));
    }
}
