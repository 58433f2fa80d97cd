use async_trait::async_trait;
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::Arc;

use crate::distributions::distributions_model::DistributionRecord;
use crate::market_data::market_data_errors::{MarketDataError, Result};
use crate::market_data::market_data_model::Quote;
use crate::market_data::market_data_traits::{MarketDataServiceTrait, QuoteProvider};
use crate::market_data::quote_cache::QuoteCache;

/// Cache-fronted access to the quote provider.
///
/// Bounds the load placed on the provider and decouples read latency from
/// third-party availability: a failed fetch degrades to "no data" for that
/// symbol, never to a failed portfolio view.
pub struct MarketDataService {
    provider: Arc<dyn QuoteProvider>,
    cache: QuoteCache,
}

impl MarketDataService {
    pub fn new(provider: Arc<dyn QuoteProvider>) -> Self {
        Self {
            provider,
            cache: QuoteCache::new(),
        }
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<Option<Quote>> {
        match self.provider.get_latest_quote(symbol).await {
            Ok(quote) => {
                self.cache.set_quote(quote.clone()).await;
                Ok(Some(quote))
            }
            Err(MarketDataError::NotFound(_)) => Ok(None),
            Err(e) => {
                warn!("Quote fetch for {} degraded to no data: {}", symbol, e);
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl MarketDataServiceTrait for MarketDataService {
    async fn get_quote(&self, symbol: &str) -> Result<Option<Quote>> {
        if let Some(cached) = self.cache.get_quote(symbol).await {
            return Ok(Some(cached));
        }
        self.fetch_quote(symbol).await
    }

    async fn get_quotes(&self, symbols: &[String]) -> HashMap<String, Quote> {
        let mut quotes: HashMap<String, Quote> = HashMap::new();
        let mut missing: Vec<String> = Vec::new();

        for symbol in symbols {
            match self.cache.get_quote(symbol).await {
                Some(quote) => {
                    quotes.insert(symbol.clone(), quote);
                }
                None => missing.push(symbol.clone()),
            }
        }

        if missing.is_empty() {
            return quotes;
        }

        debug!("Fetching {} uncached quotes", missing.len());
        match self.provider.get_latest_quotes(&missing).await {
            Ok(fetched) => {
                for (symbol, quote) in fetched {
                    self.cache.set_quote(quote.clone()).await;
                    quotes.insert(symbol, quote);
                }
            }
            Err(e) => {
                // Serve whatever the cache had; stale beats absent here.
                warn!("Batch quote fetch degraded: {}", e);
            }
        }

        quotes
    }

    async fn get_distribution_history(&self, symbol: &str) -> Result<Vec<DistributionRecord>> {
        if let Some(cached) = self.cache.get_history(symbol).await {
            return Ok(cached.as_ref().clone());
        }

        let history = self.provider.get_distribution_history(symbol).await?;
        self.cache.set_history(symbol, history.clone()).await;
        Ok(history)
    }

    async fn refresh_quote(&self, symbol: &str) -> Result<Option<Quote>> {
        self.cache.invalidate(symbol).await;
        self.fetch_quote(symbol).await
    }

    async fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl QuoteProvider for CountingProvider {
        async fn get_latest_quote(&self, symbol: &str) -> Result<Quote> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Quote {
                symbol: symbol.to_string(),
                price: dec!(10),
                change_percent: None,
                currency: "BRL".to_string(),
                as_of: Utc::now(),
            })
        }

        async fn get_latest_quotes(&self, symbols: &[String]) -> Result<HashMap<String, Quote>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            // Resolve all but the deliberately broken symbol.
            Ok(symbols
                .iter()
                .filter(|s| s.as_str() != "BROKEN")
                .map(|s| {
                    (
                        s.clone(),
                        Quote {
                            symbol: s.clone(),
                            price: dec!(10),
                            change_percent: None,
                            currency: "BRL".to_string(),
                            as_of: Utc::now(),
                        },
                    )
                })
                .collect())
        }

        async fn get_distribution_history(
            &self,
            _symbol: &str,
        ) -> Result<Vec<DistributionRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn second_read_is_served_from_cache() {
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
        });
        let service = MarketDataService::new(provider.clone());

        service.get_quote("PETR4").await.unwrap();
        service.get_quote("PETR4").await.unwrap();

        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn partial_failures_resolve_the_rest() {
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
        });
        let service = MarketDataService::new(provider);

        let symbols = vec!["PETR4".to_string(), "BROKEN".to_string()];
        let quotes = service.get_quotes(&symbols).await;

        assert!(quotes.contains_key("PETR4"));
        assert!(!quotes.contains_key("BROKEN"));
    }

    #[tokio::test]
    async fn refresh_bypasses_cache() {
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
        });
        let service = MarketDataService::new(provider.clone());

        service.get_quote("PETR4").await.unwrap();
        service.refresh_quote("PETR4").await.unwrap();

        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }
}
