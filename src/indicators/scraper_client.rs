//! Indicators page scraper with rate limiting and retry-with-backoff.

use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

use crate::constants::{SCRAPE_MAX_RETRIES, SCRAPE_MIN_INTERVAL_MS, SCRAPE_TIMEOUT_SECS};
use crate::distributions::distributions_model::{DistributionKind, DistributionRecord};
use crate::indicators::indicators_errors::{IndicatorError, Result};
use crate::indicators::indicators_model::InstrumentIndicators;
use crate::indicators::normalizer::{parse_count_br, parse_date_br, parse_decimal_br};

const FUNDSEXPLORER_BASE_URL: &str = "https://www.fundsexplorer.com.br/funds";

fn scraper_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(
            "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) \
             Chrome/124.0 Safari/537.36",
        ),
    );
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("pt-BR,pt;q=0.9"));
    headers
}

/// Raw strings lifted from the page before locale normalization.
#[derive(Debug, Default)]
struct RawIndicators {
    values: HashMap<String, String>,
    /// (entitlement date, payment date, amount) cells from the payout table.
    history_rows: Vec<(String, String, String)>,
}

pub struct IndicatorScraper {
    client: Client,
    base_url: String,
    /// Gate enforcing a minimum inter-request delay toward the source.
    last_request: Mutex<Option<Instant>>,
}

impl IndicatorScraper {
    pub fn new() -> Self {
        Self::with_base_url(FUNDSEXPLORER_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Self {
        let client = Client::builder()
            .default_headers(scraper_headers())
            .timeout(Duration::from_secs(SCRAPE_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            last_request: Mutex::new(None),
        }
    }

    /// Waits out the politeness interval. The lock is held across the sleep
    /// so concurrent callers queue instead of bursting.
    async fn rate_gate(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            let min_interval = Duration::from_millis(SCRAPE_MIN_INTERVAL_MS);
            if elapsed < min_interval {
                sleep(min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    async fn fetch_page(&self, symbol: &str) -> Result<String> {
        let url = format!("{}/{}", self.base_url, symbol.to_lowercase());
        let mut retries = 0u32;

        loop {
            self.rate_gate().await;
            debug!("GET {}", url);

            let outcome = self.client.get(&url).send().await;
            match outcome {
                Ok(response) => {
                    let status = response.status();
                    if status == reqwest::StatusCode::NOT_FOUND {
                        // Terminal; retrying a 404 cannot help.
                        return Err(IndicatorError::SymbolNotFound(symbol.to_string()));
                    }
                    if status.is_success() {
                        return response.text().await.map_err(IndicatorError::from);
                    }
                    if retries >= SCRAPE_MAX_RETRIES {
                        return Err(IndicatorError::TransientUnavailable(format!(
                            "{} returned {} after {} retries",
                            url, status, retries
                        )));
                    }
                    warn!("{} returned {}; backing off", url, status);
                }
                Err(e) => {
                    if retries >= SCRAPE_MAX_RETRIES {
                        return Err(IndicatorError::TransientUnavailable(e.to_string()));
                    }
                    warn!("Request to {} failed ({}); backing off", url, e);
                }
            }

            let wait = 2u64.pow(retries) * 1_000;
            sleep(Duration::from_millis(wait)).await;
            retries += 1;
        }
    }

    /// Fetches and normalizes the indicators page for one symbol.
    pub async fn scrape_indicators(&self, symbol: &str) -> Result<InstrumentIndicators> {
        let html = self.fetch_page(symbol).await?;
        let raw = parse_document(&html);
        Ok(normalize_indicators(symbol, raw))
    }
}

impl Default for IndicatorScraper {
    fn default() -> Self {
        Self::new()
    }
}

/// Pulls the labelled indicator boxes and the payout table out of the page.
/// Pure sync parsing; the `Html` document never crosses an await point.
fn parse_document(html: &str) -> RawIndicators {
    let document = Html::parse_document(html);
    let mut raw = RawIndicators::default();

    let box_selector = Selector::parse(".indicators__box").unwrap();
    let label_selector = Selector::parse("p").unwrap();
    let value_selector = Selector::parse("b").unwrap();

    for element in document.select(&box_selector) {
        let label = element
            .select(&label_selector)
            .next()
            .map(|node| node.text().collect::<String>());
        let value = element
            .select(&value_selector)
            .next()
            .map(|node| node.text().collect::<String>());

        if let (Some(label), Some(value)) = (label, value) {
            raw.values
                .insert(label.trim().to_lowercase(), value.trim().to_string());
        }
    }

    let row_selector = Selector::parse("#dividends-table tbody tr").unwrap();
    let cell_selector = Selector::parse("td").unwrap();

    for row in document.select(&row_selector) {
        let cells: Vec<String> = row
            .select(&cell_selector)
            .map(|cell| cell.text().collect::<String>().trim().to_string())
            .collect();

        // type | entitlement date | payment date | amount
        if cells.len() >= 4 {
            raw.history_rows
                .push((cells[1].clone(), cells[2].clone(), cells[3].clone()));
        }
    }

    raw
}

/// Locale-normalizes the raw page values. A malformed value is a
/// consistency fault: it is logged and that one field or row is skipped,
/// the rest of the snapshot survives.
fn normalize_indicators(symbol: &str, raw: RawIndicators) -> InstrumentIndicators {
    let mut indicators = InstrumentIndicators {
        symbol: symbol.to_uppercase(),
        ..Default::default()
    };

    let lookup = |needle: &str| -> Option<String> {
        raw.values
            .iter()
            .find(|(label, _)| label.contains(needle))
            .map(|(_, value)| value.clone())
    };

    indicators.price = normalize_field(symbol, "price", lookup("valor da cota").as_deref());
    indicators.valuation_ratio = normalize_field(symbol, "p/vp", lookup("p/vp").as_deref());
    indicators.net_worth = normalize_field(symbol, "net worth", lookup("patrim").as_deref());
    indicators.daily_liquidity =
        normalize_field(symbol, "liquidity", lookup("liquidez").as_deref());
    indicators.holder_count = lookup("cotistas")
        .as_deref()
        .and_then(|value| match parse_count_br(value) {
            Ok(count) => Some(count),
            Err(e) => {
                warn!("Skipping holder count for {}: {}", symbol, e);
                None
            }
        });

    for (entitlement_raw, payment_raw, amount_raw) in &raw.history_rows {
        let entitlement_date = parse_date_br(entitlement_raw);
        let payment_date = parse_date_br(payment_raw);
        let amount = parse_decimal_br(amount_raw);

        match (entitlement_date, payment_date, amount) {
            (Ok(entitlement_date), Ok(payment_date), Ok(amount_per_unit)) => {
                indicators.distribution_history.push(DistributionRecord {
                    entitlement_date,
                    payment_date,
                    amount_per_unit,
                    kind: DistributionKind::Income,
                    withholding_rate: None,
                });
            }
            (entitlement, payment, amount) => {
                warn!(
                    "Skipping malformed payout row for {} ({:?} / {:?} / {:?})",
                    symbol,
                    entitlement.err(),
                    payment.err(),
                    amount.err()
                );
            }
        }
    }

    indicators
        .distribution_history
        .sort_by_key(|record| record.payment_date);

    indicators
}

fn normalize_field(symbol: &str, field: &str, raw: Option<&str>) -> Option<rust_decimal::Decimal> {
    raw.and_then(|value| match parse_decimal_br(value) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!("Skipping {} for {}: {}", field, symbol, e);
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    const SAMPLE_PAGE: &str = r#"
        <html><body>
          <div class="indicators__box"><p>Valor da cota</p><b>R$ 160,50</b></div>
          <div class="indicators__box"><p>P/VP</p><b>0,93</b></div>
          <div class="indicators__box"><p>Patrimônio Líquido</p><b>R$ 3,2 bi</b></div>
          <div class="indicators__box"><p>Liquidez Diária</p><b>1,8 M</b></div>
          <div class="indicators__box"><p>Número de Cotistas</p><b>142.511</b></div>
          <table id="dividends-table"><tbody>
            <tr><td>Rendimento</td><td>31/01/2024</td><td>14/02/2024</td><td>R$ 1,10</td></tr>
            <tr><td>Rendimento</td><td>29/02/2024</td><td>14/03/2024</td><td>R$ 1,12</td></tr>
            <tr><td>Rendimento</td><td>bogus</td><td>15/04/2024</td><td>R$ 1,10</td></tr>
          </tbody></table>
        </body></html>
    "#;

    #[test]
    fn parses_indicator_boxes() {
        let raw = parse_document(SAMPLE_PAGE);
        let indicators = normalize_indicators("hglg11", raw);

        assert_eq!(indicators.symbol, "HGLG11");
        assert_eq!(indicators.price, Some(dec!(160.50)));
        assert_eq!(indicators.valuation_ratio, Some(dec!(0.93)));
        assert_eq!(indicators.net_worth, Some(dec!(3_200_000_000)));
        assert_eq!(indicators.daily_liquidity, Some(dec!(1_800_000)));
        assert_eq!(indicators.holder_count, Some(142_511));
    }

    #[test]
    fn malformed_payout_rows_are_skipped_not_fatal() {
        let raw = parse_document(SAMPLE_PAGE);
        let indicators = normalize_indicators("hglg11", raw);

        assert_eq!(indicators.distribution_history.len(), 2);
        assert_eq!(
            indicators.distribution_history[0].entitlement_date,
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()
        );
        assert_eq!(
            indicators.distribution_history[1].amount_per_unit,
            dec!(1.12)
        );
    }
}
