use async_trait::async_trait;
use chrono::{Datelike, Duration, Months, NaiveDate, Utc};
use log::{debug, warn};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::Arc;

use crate::analytics::{DistributionTrend, RiskAssessment, RiskLevel};
use crate::constants::{DISPLAY_DECIMAL_PRECISION, TRAILING_INCOME_MONTHS};
use crate::distributions::distributions_traits::DividendServiceTrait;
use crate::errors::Result;
use crate::fixed_income::fixed_income_traits::FixedIncomeRepositoryTrait;
use crate::indicators::indicators_traits::IndicatorServiceTrait;
use crate::instruments::{Instrument, InstrumentRepositoryTrait};
use crate::market_data::market_data_model::Quote;
use crate::market_data::market_data_traits::MarketDataServiceTrait;
use crate::portfolio::portfolio_model::*;
use crate::positions::positions_model::Position;
use crate::positions::positions_traits::PositionServiceTrait;

const RANKING_SIZE: usize = 5;
const CONCENTRATION_BREACH_PCT: Decimal = dec!(25);
const CONCENTRATION_PENALTY: Decimal = dec!(10);
const HIGH_RISK_PENALTY: Decimal = dec!(5);
const MIN_DIVERSIFIED_POSITIONS: usize = 5;
const DIVERSIFICATION_PENALTY: Decimal = dec!(10);
const RISING_TREND_BONUS: Decimal = dec!(2);
const RISING_TREND_BONUS_CAP: Decimal = dec!(10);

#[async_trait]
pub trait PortfolioServiceTrait: Send + Sync {
    async fn get_portfolio(&self, owner_id: &str) -> Result<PortfolioSnapshot>;
    async fn get_portfolio_evolution(
        &self,
        owner_id: &str,
        months: u32,
    ) -> Result<Vec<EvolutionPoint>>;
}

/// Valuation & metrics engine.
///
/// Aggregates reconstructed positions, live quotes, indicator snapshots,
/// the credited distribution ledger and manually-valued holdings into one
/// document. Every monetary output carries its derivation; a missing quote
/// degrades that one position to average cost and marks it stale.
pub struct PortfolioService {
    positions: Arc<dyn PositionServiceTrait>,
    instruments: Arc<dyn InstrumentRepositoryTrait>,
    market_data: Arc<dyn MarketDataServiceTrait>,
    dividends: Arc<dyn DividendServiceTrait>,
    indicators: Arc<dyn IndicatorServiceTrait>,
    fixed_income: Arc<dyn FixedIncomeRepositoryTrait>,
}

impl PortfolioService {
    pub fn new(
        positions: Arc<dyn PositionServiceTrait>,
        instruments: Arc<dyn InstrumentRepositoryTrait>,
        market_data: Arc<dyn MarketDataServiceTrait>,
        dividends: Arc<dyn DividendServiceTrait>,
        indicators: Arc<dyn IndicatorServiceTrait>,
        fixed_income: Arc<dyn FixedIncomeRepositoryTrait>,
    ) -> Self {
        Self {
            positions,
            instruments,
            market_data,
            dividends,
            indicators,
            fixed_income,
        }
    }

    /// Open positions joined with their catalog rows. Instruments missing
    /// from the catalog are skipped with a warning, not fatal.
    fn resolve_instruments(
        &self,
        positions: &HashMap<String, Position>,
    ) -> Vec<(Instrument, Position)> {
        let mut resolved = Vec::new();
        for (instrument_id, position) in positions {
            if !position.is_open() {
                continue;
            }
            match self.instruments.get_by_id(instrument_id) {
                Ok(instrument) => resolved.push((instrument, position.clone())),
                Err(e) => {
                    warn!("Skipping position for unknown instrument {}: {}", instrument_id, e)
                }
            }
        }
        resolved.sort_by(|a, b| a.0.symbol.cmp(&b.0.symbol));
        resolved
    }

    fn build_position_metrics(
        instrument: &Instrument,
        position: &Position,
        quote: Option<&Quote>,
        dividends_received: Decimal,
        trend: DistributionTrend,
        risk: RiskAssessment,
    ) -> PositionMetrics {
        let average_cost = position.average_cost();
        let (unit_price, price_is_stale) = match quote {
            Some(quote) => (quote.price, false),
            None => (average_cost, true),
        };

        let current_value = position.quantity * unit_price;
        let capital_gain = current_value - position.cost_basis;
        let total_return = capital_gain + dividends_received;

        let breakdown = PositionBreakdown {
            current_value: MetricBreakdown::new(
                "currentValue = quantity * unitPrice",
                vec![
                    ("quantity", position.quantity),
                    ("unitPrice", unit_price),
                ],
                current_value,
            ),
            capital_gain: MetricBreakdown::new(
                "capitalGain = currentValue - investedCapital",
                vec![
                    ("currentValue", current_value),
                    ("investedCapital", position.cost_basis),
                ],
                capital_gain,
            ),
            total_return: MetricBreakdown::new(
                "totalReturn = capitalGain + dividendsReceived",
                vec![
                    ("capitalGain", capital_gain),
                    ("dividendsReceived", dividends_received),
                ],
                total_return,
            ),
            // Filled in once the portfolio total is known.
            concentration: MetricBreakdown::new(
                "concentration = positionValue / portfolioValue * 100",
                vec![("positionValue", current_value)],
                Decimal::ZERO,
            ),
        };

        PositionMetrics {
            instrument_id: instrument.id.clone(),
            symbol: instrument.symbol.clone(),
            name: instrument.name.clone(),
            class: instrument.class,
            quantity: position.quantity,
            average_cost,
            invested_capital: position.cost_basis,
            current_price: quote.map(|q| q.price),
            price_is_stale,
            current_value,
            capital_gain,
            dividends_received,
            total_return,
            concentration_pct: Decimal::ZERO,
            trend,
            risk,
            breakdown,
        }
    }

    /// Concentration needs every position's value, so it runs globally and
    /// is merged back per position.
    fn apply_concentration(positions: &mut [PositionMetrics], portfolio_value: Decimal) {
        for position in positions.iter_mut() {
            let pct = if portfolio_value > Decimal::ZERO {
                position.current_value / portfolio_value * dec!(100)
            } else {
                Decimal::ZERO
            };
            position.concentration_pct = pct;
            position.breakdown.concentration = MetricBreakdown::new(
                "concentration = positionValue / portfolioValue * 100",
                vec![
                    ("positionValue", position.current_value),
                    ("portfolioValue", portfolio_value),
                ],
                pct,
            );
        }
    }

    fn build_rankings(positions: &[PositionMetrics]) -> PortfolioRankings {
        let mut by_value: Vec<&PositionMetrics> = positions.iter().collect();
        by_value.sort_by(|a, b| b.current_value.cmp(&a.current_value));

        let mut by_dividends: Vec<&PositionMetrics> = positions.iter().collect();
        by_dividends.sort_by(|a, b| b.dividends_received.cmp(&a.dividends_received));

        let mut by_return: Vec<&PositionMetrics> = positions.iter().collect();
        by_return.sort_by(|a, b| b.total_return.cmp(&a.total_return));

        let top = |items: &[&PositionMetrics], pick: fn(&PositionMetrics) -> Decimal| {
            items
                .iter()
                .take(RANKING_SIZE)
                .map(|p| RankedEntry {
                    symbol: p.symbol.clone(),
                    value: pick(p),
                })
                .collect::<Vec<_>>()
        };

        PortfolioRankings {
            largest_positions: top(&by_value, |p| p.current_value),
            top_dividend_payers: top(
                &by_dividends
                    .iter()
                    .copied()
                    .filter(|p| p.dividends_received > Decimal::ZERO)
                    .collect::<Vec<_>>(),
                |p| p.dividends_received,
            ),
            most_profitable: top(&by_return, |p| p.total_return),
            least_profitable: {
                let mut worst = by_return.clone();
                worst.reverse();
                top(&worst, |p| p.total_return)
            },
        }
    }

    fn build_health_score(positions: &[PositionMetrics]) -> HealthScore {
        let mut score = dec!(100);
        let mut adjustments: Vec<ScoreAdjustment> = Vec::new();

        for position in positions {
            if position.concentration_pct > CONCENTRATION_BREACH_PCT {
                adjustments.push(ScoreAdjustment {
                    factor: format!(
                        "Concentration in {} at {}%",
                        position.symbol,
                        position.concentration_pct.round_dp(1)
                    ),
                    impact: -CONCENTRATION_PENALTY,
                });
            }
        }

        let high_risk = positions
            .iter()
            .filter(|p| p.risk.level == RiskLevel::High)
            .count();
        if high_risk > 0 {
            adjustments.push(ScoreAdjustment {
                factor: format!("{} high-risk holdings", high_risk),
                impact: -HIGH_RISK_PENALTY * Decimal::from(high_risk),
            });
        }

        if positions.len() < MIN_DIVERSIFIED_POSITIONS && !positions.is_empty() {
            adjustments.push(ScoreAdjustment {
                factor: format!("Only {} distinct holdings", positions.len()),
                impact: -DIVERSIFICATION_PENALTY,
            });
        }

        let rising = positions
            .iter()
            .filter(|p| p.trend == DistributionTrend::Rising)
            .count();
        if rising > 0 {
            let bonus =
                (RISING_TREND_BONUS * Decimal::from(rising)).min(RISING_TREND_BONUS_CAP);
            adjustments.push(ScoreAdjustment {
                factor: format!("{} holdings with rising distributions", rising),
                impact: bonus,
            });
        }

        for adjustment in &adjustments {
            score += adjustment.impact;
        }

        HealthScore {
            score: score.clamp(Decimal::ZERO, dec!(100)),
            adjustments,
        }
    }

    fn round_for_display(snapshot: &mut PortfolioSnapshot) {
        let dp = DISPLAY_DECIMAL_PRECISION;
        snapshot.securities_value = snapshot.securities_value.round_dp(dp);
        snapshot.fixed_income_value = snapshot.fixed_income_value.round_dp(dp);
        snapshot.total_value = snapshot.total_value.round_dp(dp);
        snapshot.total_invested = snapshot.total_invested.round_dp(dp);
        snapshot.total_capital_gain = snapshot.total_capital_gain.round_dp(dp);
        snapshot.total_dividends = snapshot.total_dividends.round_dp(dp);
        snapshot.total_return = snapshot.total_return.round_dp(dp);
    }
}

#[async_trait]
impl PortfolioServiceTrait for PortfolioService {
    async fn get_portfolio(&self, owner_id: &str) -> Result<PortfolioSnapshot> {
        let today = Utc::now().date_naive();
        debug!("Building portfolio snapshot for {}", owner_id);

        let raw_positions = self.positions.positions_as_of(owner_id, today)?;
        let resolved = self.resolve_instruments(&raw_positions);

        let symbols: Vec<String> = resolved
            .iter()
            .map(|(instrument, _)| instrument.symbol.clone())
            .collect();
        let quotes = self.market_data.get_quotes(&symbols).await;

        let since = today
            .checked_sub_months(Months::new(TRAILING_INCOME_MONTHS as u32))
            .unwrap_or(NaiveDate::MIN);
        // The read path degrades to zero dividends rather than failing.
        let trailing_dividends = self
            .dividends
            .trailing_net_by_instrument(owner_id, since)
            .unwrap_or_else(|e| {
                warn!("Trailing dividends unavailable for {}: {}", owner_id, e);
                HashMap::new()
            });

        let mut positions: Vec<PositionMetrics> = Vec::new();
        for (instrument, position) in &resolved {
            let (trend, risk) = match self.indicators.get_snapshot(&instrument.id, &instrument.symbol)
            {
                Ok(Some(snapshot)) => {
                    let risk = crate::analytics::assess_risk(
                        snapshot.indicators.daily_liquidity,
                        snapshot.indicators.holder_count,
                        Some(snapshot.payment_consistency),
                        snapshot.trend,
                    );
                    (snapshot.trend, risk)
                }
                Ok(None) => (DistributionTrend::Unknown, RiskAssessment::default()),
                Err(e) => {
                    warn!("Indicator snapshot unavailable for {}: {}", instrument.symbol, e);
                    (DistributionTrend::Unknown, RiskAssessment::default())
                }
            };

            positions.push(Self::build_position_metrics(
                instrument,
                position,
                quotes.get(&instrument.symbol),
                trailing_dividends
                    .get(&instrument.id)
                    .copied()
                    .unwrap_or(Decimal::ZERO),
                trend,
                risk,
            ));
        }

        let fixed_income = self
            .fixed_income
            .list_for_owner(owner_id)
            .unwrap_or_else(|e| {
                warn!("Fixed income holdings unavailable for {}: {}", owner_id, e);
                Vec::new()
            });

        let securities_value: Decimal = positions.iter().map(|p| p.current_value).sum();
        let fixed_income_value: Decimal =
            fixed_income.iter().map(|h| h.effective_value()).sum();
        let total_value = securities_value + fixed_income_value;

        Self::apply_concentration(&mut positions, total_value);

        let total_invested: Decimal = positions.iter().map(|p| p.invested_capital).sum();
        let total_capital_gain: Decimal = positions.iter().map(|p| p.capital_gain).sum();
        let total_dividends: Decimal = positions.iter().map(|p| p.dividends_received).sum();

        let rankings = Self::build_rankings(&positions);
        let health = Self::build_health_score(&positions);

        let mut snapshot = PortfolioSnapshot {
            owner_id: owner_id.to_string(),
            as_of: today,
            securities_value,
            fixed_income_value,
            total_value,
            total_invested,
            total_capital_gain,
            total_dividends,
            total_return: total_capital_gain + total_dividends,
            positions,
            fixed_income,
            rankings,
            health,
        };
        Self::round_for_display(&mut snapshot);

        Ok(snapshot)
    }

    async fn get_portfolio_evolution(
        &self,
        owner_id: &str,
        months: u32,
    ) -> Result<Vec<EvolutionPoint>> {
        let today = Utc::now().date_naive();

        // Collect quotes once; earlier months fall back to average cost per
        // position when the instrument had no quote.
        let current = self.positions.positions_as_of(owner_id, today)?;
        let resolved = self.resolve_instruments(&current);
        let symbols: Vec<String> = resolved
            .iter()
            .map(|(instrument, _)| instrument.symbol.clone())
            .collect();
        let quotes = self.market_data.get_quotes(&symbols).await;
        let symbol_by_id: HashMap<String, String> = resolved
            .iter()
            .map(|(instrument, _)| (instrument.id.clone(), instrument.symbol.clone()))
            .collect();

        let mut series = Vec::new();
        for offset in (0..months).rev() {
            let month_end = match today.checked_sub_months(Months::new(offset)) {
                Some(date) => end_of_month(date).min(today),
                None => continue,
            };

            let positions = self.positions.positions_as_of(owner_id, month_end)?;

            let mut invested = Decimal::ZERO;
            let mut market_value = Decimal::ZERO;
            for position in positions.values().filter(|p| p.is_open()) {
                invested += position.cost_basis;
                let price = symbol_by_id
                    .get(&position.instrument_id)
                    .and_then(|symbol| quotes.get(symbol))
                    .map(|quote| quote.price)
                    .unwrap_or_else(|| position.average_cost());
                market_value += position.quantity * price;
            }

            series.push(EvolutionPoint {
                month_end,
                invested: invested.round_dp(DISPLAY_DECIMAL_PRECISION),
                market_value: market_value.round_dp(DISPLAY_DECIMAL_PRECISION),
            });
        }

        Ok(series)
    }
}

fn end_of_month(date: NaiveDate) -> NaiveDate {
    let first_of_next = if date.month() == 12 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
    };
    first_of_next
        .map(|d| d - Duration::days(1))
        .unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::DistributionTrend;
    use crate::distributions::distributions_errors::Result as DistributionResult;
    use crate::distributions::distributions_model::{
        CreditedDistribution, ManualDistributionInput, SweepSummary,
    };
    use crate::fixed_income::fixed_income_errors::Result as FixedIncomeResult;
    use crate::fixed_income::{
        FixedIncomeHolding, HoldingStatus, NewFixedIncomeHolding,
    };
    use crate::indicators::indicators_errors::{
        IndicatorError, Result as IndicatorResult,
    };
    use crate::indicators::indicators_model::{
        CatalogSyncSummary, IndicatorSnapshot, InstrumentIndicators, SyncStatus,
    };
    use crate::instruments::{
        InstrumentClass, InstrumentError, InstrumentProfileUpdate, NewInstrument,
    };
    use crate::positions::positions_errors::Result as PositionResult;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    struct FakePositions {
        positions: HashMap<String, Position>,
    }

    impl PositionServiceTrait for FakePositions {
        fn position_as_of(
            &self,
            owner_id: &str,
            instrument_id: &str,
            as_of: NaiveDate,
        ) -> PositionResult<Position> {
            Ok(self
                .positions
                .get(instrument_id)
                .cloned()
                .unwrap_or_else(|| Position::empty(owner_id, instrument_id, as_of)))
        }

        fn positions_as_of(
            &self,
            _owner_id: &str,
            _as_of: NaiveDate,
        ) -> PositionResult<HashMap<String, Position>> {
            Ok(self.positions.clone())
        }
    }

    struct FakeInstruments {
        instruments: Vec<Instrument>,
    }

    impl InstrumentRepositoryTrait for FakeInstruments {
        fn get_by_id(&self, instrument_id: &str) -> crate::instruments::Result<Instrument> {
            self.instruments
                .iter()
                .find(|i| i.id == instrument_id)
                .cloned()
                .ok_or_else(|| InstrumentError::NotFound(instrument_id.to_string()))
        }

        fn get_by_symbol(&self, symbol: &str) -> crate::instruments::Result<Instrument> {
            self.instruments
                .iter()
                .find(|i| i.symbol == symbol)
                .cloned()
                .ok_or_else(|| InstrumentError::NotFound(symbol.to_string()))
        }

        fn list_active(&self) -> crate::instruments::Result<Vec<Instrument>> {
            Ok(self.instruments.clone())
        }

        fn create(&self, _new: NewInstrument) -> crate::instruments::Result<Instrument> {
            Err(InstrumentError::InvalidData("read-only fake".to_string()))
        }

        fn update_profile(
            &self,
            update: InstrumentProfileUpdate,
        ) -> crate::instruments::Result<Instrument> {
            Err(InstrumentError::NotFound(update.symbol))
        }

        fn set_active(&self, _id: &str, _active: bool) -> crate::instruments::Result<()> {
            Ok(())
        }
    }

    struct FakeMarketData {
        quotes: HashMap<String, Quote>,
    }

    #[async_trait]
    impl MarketDataServiceTrait for FakeMarketData {
        async fn get_quote(
            &self,
            symbol: &str,
        ) -> crate::market_data::Result<Option<Quote>> {
            Ok(self.quotes.get(symbol).cloned())
        }

        async fn get_quotes(&self, symbols: &[String]) -> HashMap<String, Quote> {
            symbols
                .iter()
                .filter_map(|s| self.quotes.get(s).map(|q| (s.clone(), q.clone())))
                .collect()
        }

        async fn get_distribution_history(
            &self,
            _symbol: &str,
        ) -> crate::market_data::Result<Vec<crate::distributions::DistributionRecord>> {
            Ok(Vec::new())
        }

        async fn refresh_quote(
            &self,
            symbol: &str,
        ) -> crate::market_data::Result<Option<Quote>> {
            Ok(self.quotes.get(symbol).cloned())
        }

        async fn invalidate_all(&self) {}
    }

    struct FakeDividends {
        trailing: HashMap<String, Decimal>,
    }

    #[async_trait]
    impl DividendServiceTrait for FakeDividends {
        async fn run_distribution_sweep(&self) -> SweepSummary {
            SweepSummary::default()
        }

        fn record_manual_distribution(
            &self,
            input: ManualDistributionInput,
        ) -> DistributionResult<CreditedDistribution> {
            Err(crate::distributions::DistributionError::InstrumentNotFound(
                input.instrument_symbol,
            ))
        }

        fn list_credited(
            &self,
            _owner_id: &str,
        ) -> DistributionResult<Vec<CreditedDistribution>> {
            Ok(Vec::new())
        }

        fn trailing_net_by_instrument(
            &self,
            _owner_id: &str,
            _since: NaiveDate,
        ) -> DistributionResult<HashMap<String, Decimal>> {
            Ok(self.trailing.clone())
        }

        fn delete_entry(&self, _owner_id: &str, entry_id: &str) -> DistributionResult<()> {
            Err(crate::distributions::DistributionError::NotFound(
                entry_id.to_string(),
            ))
        }
    }

    struct FakeIndicators {
        snapshots: HashMap<String, IndicatorSnapshot>,
    }

    #[async_trait]
    impl IndicatorServiceTrait for FakeIndicators {
        async fn sync_instrument(
            &self,
            symbol: &str,
        ) -> IndicatorResult<InstrumentIndicators> {
            Err(IndicatorError::TransientUnavailable(symbol.to_string()))
        }

        async fn sync_catalog(&self) -> CatalogSyncSummary {
            CatalogSyncSummary::default()
        }

        fn get_snapshot(
            &self,
            instrument_id: &str,
            _symbol: &str,
        ) -> IndicatorResult<Option<IndicatorSnapshot>> {
            Ok(self.snapshots.get(instrument_id).cloned())
        }

        async fn distribution_history(
            &self,
            _symbol: &str,
        ) -> IndicatorResult<Vec<crate::distributions::DistributionRecord>> {
            Ok(Vec::new())
        }
    }

    struct FakeFixedIncome {
        holdings: Vec<FixedIncomeHolding>,
    }

    impl FixedIncomeRepositoryTrait for FakeFixedIncome {
        fn create(
            &self,
            new_holding: NewFixedIncomeHolding,
        ) -> FixedIncomeResult<FixedIncomeHolding> {
            Err(crate::fixed_income::FixedIncomeError::InvalidData(
                new_holding.category,
            ))
        }

        fn list_for_owner(&self, _owner_id: &str) -> FixedIncomeResult<Vec<FixedIncomeHolding>> {
            Ok(self.holdings.clone())
        }

        fn list_active(&self) -> FixedIncomeResult<Vec<FixedIncomeHolding>> {
            Ok(self.holdings.clone())
        }

        fn update_current_value(
            &self,
            holding_id: &str,
            _value: Decimal,
        ) -> FixedIncomeResult<()> {
            Err(crate::fixed_income::FixedIncomeError::NotFound(
                holding_id.to_string(),
            ))
        }

        fn close(
            &self,
            _owner_id: &str,
            holding_id: &str,
            _closed_at: NaiveDate,
        ) -> FixedIncomeResult<()> {
            Err(crate::fixed_income::FixedIncomeError::NotFound(
                holding_id.to_string(),
            ))
        }
    }

    fn instrument(id: &str, symbol: &str, class: InstrumentClass) -> Instrument {
        Instrument {
            id: id.to_string(),
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            class,
            currency: "BRL".to_string(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn position(instrument_id: &str, quantity: Decimal, cost_basis: Decimal) -> Position {
        Position {
            owner_id: "owner-1".to_string(),
            instrument_id: instrument_id.to_string(),
            quantity,
            cost_basis,
            as_of: date(2024, 6, 1),
        }
    }

    fn quote(symbol: &str, price: Decimal) -> Quote {
        Quote {
            symbol: symbol.to_string(),
            price,
            change_percent: None,
            currency: "BRL".to_string(),
            as_of: Utc::now(),
        }
    }

    fn low_liquidity_snapshot(instrument_id: &str, symbol: &str) -> IndicatorSnapshot {
        IndicatorSnapshot {
            instrument_id: instrument_id.to_string(),
            indicators: InstrumentIndicators {
                symbol: symbol.to_string(),
                price: Some(dec!(10)),
                valuation_ratio: Some(dec!(0.9)),
                net_worth: Some(dec!(1_000_000_000)),
                daily_liquidity: Some(dec!(10_000)),
                holder_count: Some(100_000),
                distribution_history: Vec::new(),
            },
            trend: DistributionTrend::Stable,
            payment_consistency: dec!(100),
            risk_level: RiskLevel::Medium,
            last_synced_at: Utc::now(),
            sync_status: SyncStatus::Success,
            error_count: 0,
        }
    }

    fn service(
        positions: HashMap<String, Position>,
        instruments: Vec<Instrument>,
        quotes: HashMap<String, Quote>,
        trailing: HashMap<String, Decimal>,
        snapshots: HashMap<String, IndicatorSnapshot>,
        holdings: Vec<FixedIncomeHolding>,
    ) -> PortfolioService {
        PortfolioService::new(
            Arc::new(FakePositions { positions }),
            Arc::new(FakeInstruments { instruments }),
            Arc::new(FakeMarketData { quotes }),
            Arc::new(FakeDividends { trailing }),
            Arc::new(FakeIndicators { snapshots }),
            Arc::new(FakeFixedIncome { holdings }),
        )
    }

    #[tokio::test]
    async fn breakdowns_are_internally_consistent() {
        let mut positions = HashMap::new();
        positions.insert("inst-1".to_string(), position("inst-1", dec!(100), dec!(1000)));

        let mut quotes = HashMap::new();
        quotes.insert("HGLG11".to_string(), quote("HGLG11", dec!(12)));

        let mut trailing = HashMap::new();
        trailing.insert("inst-1".to_string(), dec!(110));

        let svc = service(
            positions,
            vec![instrument("inst-1", "HGLG11", InstrumentClass::RealEstateFund)],
            quotes,
            trailing,
            HashMap::new(),
            Vec::new(),
        );

        let snapshot = svc.get_portfolio("owner-1").await.unwrap();
        assert_eq!(snapshot.positions.len(), 1);
        let p = &snapshot.positions[0];

        assert_eq!(p.current_value, dec!(1200));
        assert_eq!(p.capital_gain, dec!(200));
        assert_eq!(p.total_return, dec!(310));

        // The breakdown identities hold exactly.
        assert_eq!(
            p.breakdown.capital_gain.result,
            p.breakdown.current_value.result - p.invested_capital
        );
        assert_eq!(p.breakdown.total_return.result, p.capital_gain + p.dividends_received);
        assert!(p
            .breakdown
            .total_return
            .inputs
            .iter()
            .any(|input| input.name == "dividendsReceived" && input.value == dec!(110)));
    }

    #[tokio::test]
    async fn missing_quote_falls_back_to_average_cost_and_marks_stale() {
        let mut positions = HashMap::new();
        positions.insert("inst-1".to_string(), position("inst-1", dec!(100), dec!(1000)));

        let svc = service(
            positions,
            vec![instrument("inst-1", "HGLG11", InstrumentClass::RealEstateFund)],
            HashMap::new(),
            HashMap::new(),
            HashMap::new(),
            Vec::new(),
        );

        let snapshot = svc.get_portfolio("owner-1").await.unwrap();
        let p = &snapshot.positions[0];

        assert!(p.price_is_stale);
        assert_eq!(p.current_price, None);
        // Valued at average cost: no phantom gain.
        assert_eq!(p.current_value, dec!(1000));
        assert_eq!(p.capital_gain, dec!(0));
    }

    #[tokio::test]
    async fn concentration_is_global_and_sums_to_one_hundred() {
        let mut positions = HashMap::new();
        positions.insert("inst-1".to_string(), position("inst-1", dec!(100), dec!(1000)));
        positions.insert("inst-2".to_string(), position("inst-2", dec!(300), dec!(3000)));

        let mut quotes = HashMap::new();
        quotes.insert("HGLG11".to_string(), quote("HGLG11", dec!(10)));
        quotes.insert("XPML11".to_string(), quote("XPML11", dec!(10)));

        let svc = service(
            positions,
            vec![
                instrument("inst-1", "HGLG11", InstrumentClass::RealEstateFund),
                instrument("inst-2", "XPML11", InstrumentClass::RealEstateFund),
            ],
            quotes,
            HashMap::new(),
            HashMap::new(),
            Vec::new(),
        );

        let snapshot = svc.get_portfolio("owner-1").await.unwrap();
        let total_pct: Decimal = snapshot
            .positions
            .iter()
            .map(|p| p.concentration_pct)
            .sum();
        assert_eq!(total_pct, dec!(100));

        let large = snapshot
            .positions
            .iter()
            .find(|p| p.symbol == "XPML11")
            .unwrap();
        assert_eq!(large.concentration_pct, dec!(75));
        assert!(large
            .breakdown
            .concentration
            .inputs
            .iter()
            .any(|input| input.name == "portfolioValue" && input.value == dec!(4000)));
    }

    #[tokio::test]
    async fn low_liquidity_position_carries_a_liquidity_reason() {
        let mut positions = HashMap::new();
        positions.insert("inst-1".to_string(), position("inst-1", dec!(100), dec!(1000)));

        let mut quotes = HashMap::new();
        quotes.insert("HGLG11".to_string(), quote("HGLG11", dec!(10)));

        let mut snapshots = HashMap::new();
        snapshots.insert(
            "inst-1".to_string(),
            low_liquidity_snapshot("inst-1", "HGLG11"),
        );

        let svc = service(
            positions,
            vec![instrument("inst-1", "HGLG11", InstrumentClass::RealEstateFund)],
            quotes,
            HashMap::new(),
            snapshots,
            Vec::new(),
        );

        let snapshot = svc.get_portfolio("owner-1").await.unwrap();
        let p = &snapshot.positions[0];

        assert!(p
            .risk
            .reasons
            .iter()
            .any(|reason| reason.to_lowercase().contains("liquidity")));
    }

    #[tokio::test]
    async fn health_score_names_concentration_breach() {
        // One holding at 100% concentration, fewer than five holdings: both
        // adjustments must be present and named.
        let mut positions = HashMap::new();
        positions.insert("inst-1".to_string(), position("inst-1", dec!(100), dec!(1000)));

        let mut quotes = HashMap::new();
        quotes.insert("HGLG11".to_string(), quote("HGLG11", dec!(10)));

        let svc = service(
            positions,
            vec![instrument("inst-1", "HGLG11", InstrumentClass::RealEstateFund)],
            quotes,
            HashMap::new(),
            HashMap::new(),
            Vec::new(),
        );

        let snapshot = svc.get_portfolio("owner-1").await.unwrap();
        let health = &snapshot.health;

        assert!(health
            .adjustments
            .iter()
            .any(|a| a.factor.contains("Concentration in HGLG11") && a.impact < Decimal::ZERO));
        assert!(health
            .adjustments
            .iter()
            .any(|a| a.factor.contains("distinct holdings")));
        assert_eq!(health.score, dec!(80));
    }

    #[tokio::test]
    async fn fixed_income_contributes_to_totals() {
        let mut positions = HashMap::new();
        positions.insert("inst-1".to_string(), position("inst-1", dec!(100), dec!(1000)));

        let mut quotes = HashMap::new();
        quotes.insert("HGLG11".to_string(), quote("HGLG11", dec!(10)));

        let holding = FixedIncomeHolding {
            id: "fi-1".to_string(),
            owner_id: "owner-1".to_string(),
            category: "CDB".to_string(),
            invested_amount: dec!(5000),
            current_value: Some(dec!(5300)),
            status: HoldingStatus::Active,
            opened_at: date(2023, 1, 1),
            closed_at: None,
            updated_at: Utc::now(),
        };

        let svc = service(
            positions,
            vec![instrument("inst-1", "HGLG11", InstrumentClass::RealEstateFund)],
            quotes,
            HashMap::new(),
            HashMap::new(),
            vec![holding],
        );

        let snapshot = svc.get_portfolio("owner-1").await.unwrap();
        assert_eq!(snapshot.securities_value, dec!(1000));
        assert_eq!(snapshot.fixed_income_value, dec!(5300));
        assert_eq!(snapshot.total_value, dec!(6300));
    }

    #[tokio::test]
    async fn evolution_series_is_ascending_and_bounded() {
        let mut positions = HashMap::new();
        positions.insert("inst-1".to_string(), position("inst-1", dec!(100), dec!(1000)));

        let mut quotes = HashMap::new();
        quotes.insert("HGLG11".to_string(), quote("HGLG11", dec!(12)));

        let svc = service(
            positions,
            vec![instrument("inst-1", "HGLG11", InstrumentClass::RealEstateFund)],
            quotes,
            HashMap::new(),
            HashMap::new(),
            Vec::new(),
        );

        let series = svc.get_portfolio_evolution("owner-1", 6).await.unwrap();
        assert_eq!(series.len(), 6);
        for window in series.windows(2) {
            assert!(window[0].month_end < window[1].month_end);
        }
        let last = series.last().unwrap();
        assert_eq!(last.invested, dec!(1000));
        assert_eq!(last.market_value, dec!(1200));
    }
}
