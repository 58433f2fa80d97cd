use async_trait::async_trait;
use chrono::NaiveDate;
use log::debug;
use std::sync::Arc;

use crate::constants::{ORIGIN_INDICATOR_FEED, ORIGIN_QUOTE_FEED};
use crate::distributions::distributions_errors::{DistributionError, Result};
use crate::distributions::distributions_model::*;
use crate::distributions::distributions_traits::AnnouncementSource;
use crate::indicators::indicators_traits::IndicatorServiceTrait;
use crate::instruments::{Instrument, InstrumentClass};
use crate::market_data::market_data_traits::MarketDataServiceTrait;

/// Announcement source backed by the external feeds.
///
/// Real-estate funds come from the scraped indicator history; every other
/// class comes from the quote provider's dividend feed. One feed per class
/// keeps automatic origins from shadow-crediting the same payment twice.
pub struct FeedAnnouncementSource {
    market_data: Arc<dyn MarketDataServiceTrait>,
    indicators: Arc<dyn IndicatorServiceTrait>,
}

impl FeedAnnouncementSource {
    pub fn new(
        market_data: Arc<dyn MarketDataServiceTrait>,
        indicators: Arc<dyn IndicatorServiceTrait>,
    ) -> Self {
        Self {
            market_data,
            indicators,
        }
    }

    fn to_announcements(
        instrument: &Instrument,
        history: Vec<DistributionRecord>,
        origin: &str,
        since: NaiveDate,
    ) -> Vec<DistributionAnnouncement> {
        history
            .into_iter()
            .filter(|record| record.payment_date >= since)
            .map(|record| DistributionAnnouncement {
                instrument_symbol: instrument.symbol.clone(),
                amount_per_unit: record.amount_per_unit,
                entitlement_date: record.entitlement_date,
                payment_date: record.payment_date,
                kind: record.kind,
                origin: origin.to_string(),
                withholding_rate: record.withholding_rate,
            })
            .collect()
    }
}

#[async_trait]
impl AnnouncementSource for FeedAnnouncementSource {
    async fn recent_announcements(
        &self,
        instrument: &Instrument,
        since: NaiveDate,
    ) -> Result<Vec<DistributionAnnouncement>> {
        let announcements = match instrument.class {
            InstrumentClass::RealEstateFund => {
                let history = self
                    .indicators
                    .distribution_history(&instrument.symbol)
                    .await
                    .map_err(|e| DistributionError::FeedUnavailable(e.to_string()))?;
                Self::to_announcements(instrument, history, ORIGIN_INDICATOR_FEED, since)
            }
            _ => {
                let history = self
                    .market_data
                    .get_distribution_history(&instrument.symbol)
                    .await
                    .map_err(|e| DistributionError::FeedUnavailable(e.to_string()))?;
                Self::to_announcements(instrument, history, ORIGIN_QUOTE_FEED, since)
            }
        };

        debug!(
            "{} announcements for {} paid since {}",
            announcements.len(),
            instrument.symbol,
            since
        );
        Ok(announcements)
    }
}
