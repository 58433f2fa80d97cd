//! brapi.dev API client for B3-listed quotes and dividend feeds

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::constants::QUOTE_REQUEST_TIMEOUT_SECS;
use crate::distributions::distributions_model::{DistributionKind, DistributionRecord};
use crate::market_data::market_data_errors::{MarketDataError, Result};
use crate::market_data::market_data_model::Quote;
use crate::market_data::market_data_traits::QuoteProvider;

const BRAPI_BASE_URL: &str = "https://brapi.dev/api";

/// Withholding applied at source on interest-on-capital payments.
const JCP_WITHHOLDING_RATE: Decimal = dec!(0.15);

#[derive(Clone)]
pub struct BrapiProvider {
    client: Client,
    base_url: String,
}

#[derive(Deserialize, Debug)]
struct BrapiResponse {
    #[serde(default)]
    results: Vec<BrapiResult>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct BrapiResult {
    symbol: String,
    regular_market_price: Option<f64>,
    regular_market_change_percent: Option<f64>,
    currency: Option<String>,
    #[serde(default)]
    dividends_data: Option<BrapiDividendsData>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct BrapiDividendsData {
    #[serde(default)]
    cash_dividends: Vec<BrapiCashDividend>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct BrapiCashDividend {
    rate: Option<f64>,
    payment_date: Option<String>,
    last_date_prior: Option<String>,
    label: Option<String>,
}

impl BrapiProvider {
    pub fn new() -> Self {
        Self::with_base_url(BRAPI_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(QUOTE_REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch(&self, symbols: &str, with_dividends: bool) -> Result<BrapiResponse> {
        let mut url = format!("{}/quote/{}", self.base_url, symbols);
        if with_dividends {
            url.push_str("?dividends=true");
        }

        let response = self.client.get(&url).send().await?;

        match response.status() {
            status if status.is_success() => {}
            reqwest::StatusCode::NOT_FOUND => {
                return Err(MarketDataError::NotFound(symbols.to_string()))
            }
            reqwest::StatusCode::TOO_MANY_REQUESTS => {
                return Err(MarketDataError::RateLimitExceeded)
            }
            status => {
                return Err(MarketDataError::ProviderError(format!(
                    "brapi request for {} failed: {}",
                    symbols, status
                )))
            }
        }

        response
            .json::<BrapiResponse>()
            .await
            .map_err(|e| MarketDataError::ParsingError(e.to_string()))
    }

    fn to_quote(result: &BrapiResult) -> Option<Quote> {
        let price = result.regular_market_price?;
        Some(Quote {
            symbol: result.symbol.to_uppercase(),
            price: Decimal::from_f64_retain(price)?,
            change_percent: result
                .regular_market_change_percent
                .and_then(Decimal::from_f64_retain),
            currency: result.currency.clone().unwrap_or_else(|| "BRL".to_string()),
            as_of: Utc::now(),
        })
    }

    fn to_record(dividend: &BrapiCashDividend) -> Option<DistributionRecord> {
        let amount = Decimal::from_f64_retain(dividend.rate?)?;
        let payment_date = parse_feed_date(dividend.payment_date.as_deref()?)?;
        // Entitlement cutoff; falls back to the payment date when the feed
        // omits it.
        let entitlement_date = dividend
            .last_date_prior
            .as_deref()
            .and_then(parse_feed_date)
            .unwrap_or(payment_date);

        let is_interest_on_capital = dividend
            .label
            .as_deref()
            .map(|label| label.to_uppercase().contains("JCP"))
            .unwrap_or(false);

        Some(DistributionRecord {
            entitlement_date,
            payment_date,
            amount_per_unit: amount,
            kind: DistributionKind::Income,
            withholding_rate: is_interest_on_capital.then_some(JCP_WITHHOLDING_RATE),
        })
    }
}

impl Default for BrapiProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// brapi serves RFC 3339 timestamps or plain dates depending on endpoint.
fn parse_feed_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.date_naive());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

#[async_trait]
impl QuoteProvider for BrapiProvider {
    async fn get_latest_quote(&self, symbol: &str) -> Result<Quote> {
        let response = self.fetch(&symbol.to_uppercase(), false).await?;
        response
            .results
            .first()
            .and_then(Self::to_quote)
            .ok_or_else(|| MarketDataError::NotFound(symbol.to_string()))
    }

    async fn get_latest_quotes(&self, symbols: &[String]) -> Result<HashMap<String, Quote>> {
        if symbols.is_empty() {
            return Ok(HashMap::new());
        }

        let joined = symbols
            .iter()
            .map(|s| s.to_uppercase())
            .collect::<Vec<_>>()
            .join(",");
        let response = self.fetch(&joined, false).await?;

        // Symbols the provider failed to resolve are simply absent.
        Ok(response
            .results
            .iter()
            .filter_map(Self::to_quote)
            .map(|quote| (quote.symbol.clone(), quote))
            .collect())
    }

    async fn get_distribution_history(&self, symbol: &str) -> Result<Vec<DistributionRecord>> {
        let response = self.fetch(&symbol.to_uppercase(), true).await?;
        let result = response
            .results
            .first()
            .ok_or_else(|| MarketDataError::NotFound(symbol.to_string()))?;

        let mut records: Vec<DistributionRecord> = result
            .dividends_data
            .as_ref()
            .map(|data| {
                data.cash_dividends
                    .iter()
                    .filter_map(Self::to_record)
                    .collect()
            })
            .unwrap_or_default();

        records.sort_by_key(|record| record.payment_date);
        Ok(records)
    }
}
