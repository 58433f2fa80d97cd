use async_trait::async_trait;
use std::collections::HashMap;

use crate::distributions::distributions_model::DistributionRecord;
use crate::market_data::market_data_errors::Result;
use crate::market_data::market_data_model::Quote;

/// Contract for an external quote/distribution provider.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn get_latest_quote(&self, symbol: &str) -> Result<Quote>;

    /// Batch lookup; symbols the provider cannot resolve are simply absent
    /// from the map.
    async fn get_latest_quotes(&self, symbols: &[String]) -> Result<HashMap<String, Quote>>;

    /// Cash distribution history as reported by the provider.
    async fn get_distribution_history(&self, symbol: &str) -> Result<Vec<DistributionRecord>>;
}

/// Cache-fronted market data access used by the valuation and crediting
/// engines.
#[async_trait]
pub trait MarketDataServiceTrait: Send + Sync {
    /// `Ok(None)` when the symbol has no quote right now; read paths
    /// degrade, they do not fail.
    async fn get_quote(&self, symbol: &str) -> Result<Option<Quote>>;

    /// Partial-failure tolerant: whatever resolved is returned, the rest is
    /// absent.
    async fn get_quotes(&self, symbols: &[String]) -> HashMap<String, Quote>;

    async fn get_distribution_history(&self, symbol: &str) -> Result<Vec<DistributionRecord>>;

    /// Explicit "refresh now": drops the cached entry before refetching.
    async fn refresh_quote(&self, symbol: &str) -> Result<Option<Quote>>;

    async fn invalidate_all(&self);
}
