//! In-memory market data cache with TTL using moka

use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

use crate::constants::{QUOTE_CACHE_TTL_SECS, REFERENCE_CACHE_TTL_SECS};
use crate::distributions::distributions_model::DistributionRecord;
use crate::market_data::market_data_model::Quote;

/// Two-tier cache: a short TTL for live prices and a long TTL for
/// reference data (distribution histories). Staleness here is bounded by
/// TTL, not correctness-critical; reads and writes race harmlessly.
pub struct QuoteCache {
    quotes: Cache<String, Quote>,
    histories: Cache<String, Arc<Vec<DistributionRecord>>>,
}

impl QuoteCache {
    pub fn new() -> Self {
        Self {
            quotes: Cache::builder()
                .time_to_live(Duration::from_secs(QUOTE_CACHE_TTL_SECS))
                .max_capacity(1000)
                .build(),
            histories: Cache::builder()
                .time_to_live(Duration::from_secs(REFERENCE_CACHE_TTL_SECS))
                .max_capacity(1000)
                .build(),
        }
    }

    pub async fn get_quote(&self, symbol: &str) -> Option<Quote> {
        self.quotes.get(symbol).await
    }

    pub async fn set_quote(&self, quote: Quote) {
        self.quotes.insert(quote.symbol.clone(), quote).await;
    }

    pub async fn get_history(&self, symbol: &str) -> Option<Arc<Vec<DistributionRecord>>> {
        self.histories.get(symbol).await
    }

    pub async fn set_history(&self, symbol: &str, history: Vec<DistributionRecord>) {
        self.histories
            .insert(symbol.to_string(), Arc::new(history))
            .await;
    }

    /// Manual invalidation hook for the explicit "refresh now" action.
    pub async fn invalidate(&self, symbol: &str) {
        self.quotes.invalidate(symbol).await;
        self.histories.invalidate(symbol).await;
    }

    pub fn invalidate_all(&self) {
        self.quotes.invalidate_all();
        self.histories.invalidate_all();
    }
}

impl Default for QuoteCache {
    fn default() -> Self {
        Self::new()
    }
}
