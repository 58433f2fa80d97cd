use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::analytics::{DistributionTrend, RiskAssessment};
use crate::fixed_income::FixedIncomeHolding;
use crate::instruments::InstrumentClass;

/// One named input of a metric derivation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownInput {
    pub name: String,
    pub value: Decimal,
}

/// A metric together with its derivation: the formula applied and the
/// literal numbers that went in. No metric leaves the engine without one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricBreakdown {
    pub formula: String,
    pub inputs: Vec<BreakdownInput>,
    pub result: Decimal,
}

impl MetricBreakdown {
    pub fn new(formula: &str, inputs: Vec<(&str, Decimal)>, result: Decimal) -> Self {
        MetricBreakdown {
            formula: formula.to_string(),
            inputs: inputs
                .into_iter()
                .map(|(name, value)| BreakdownInput {
                    name: name.to_string(),
                    value,
                })
                .collect(),
            result,
        }
    }
}

/// Derivations for every monetary metric of a position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionBreakdown {
    pub current_value: MetricBreakdown,
    pub capital_gain: MetricBreakdown,
    pub total_return: MetricBreakdown,
    pub concentration: MetricBreakdown,
}

/// A fully enriched position as served to the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionMetrics {
    pub instrument_id: String,
    pub symbol: String,
    pub name: String,
    pub class: InstrumentClass,
    pub quantity: Decimal,
    pub average_cost: Decimal,
    pub invested_capital: Decimal,
    pub current_price: Option<Decimal>,
    /// Set when no live quote was available and the average cost stood in.
    pub price_is_stale: bool,
    pub current_value: Decimal,
    pub capital_gain: Decimal,
    pub dividends_received: Decimal,
    pub total_return: Decimal,
    /// Share of total portfolio value, 0-100.
    pub concentration_pct: Decimal,
    pub trend: DistributionTrend,
    pub risk: RiskAssessment,
    pub breakdown: PositionBreakdown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedEntry {
    pub symbol: String,
    pub value: Decimal,
}

/// Simple sorts over the enriched position list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioRankings {
    pub largest_positions: Vec<RankedEntry>,
    pub top_dividend_payers: Vec<RankedEntry>,
    pub most_profitable: Vec<RankedEntry>,
    pub least_profitable: Vec<RankedEntry>,
}

/// One named, signed adjustment applied to the health score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreAdjustment {
    pub factor: String,
    pub impact: Decimal,
}

/// Portfolio health: starts at 100, applies named adjustments, clamped to
/// [0, 100].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthScore {
    pub score: Decimal,
    pub adjustments: Vec<ScoreAdjustment>,
}

/// The full valuation + metrics document for one owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSnapshot {
    pub owner_id: String,
    pub as_of: NaiveDate,
    pub securities_value: Decimal,
    pub fixed_income_value: Decimal,
    pub total_value: Decimal,
    pub total_invested: Decimal,
    pub total_capital_gain: Decimal,
    pub total_dividends: Decimal,
    pub total_return: Decimal,
    pub positions: Vec<PositionMetrics>,
    pub fixed_income: Vec<FixedIncomeHolding>,
    pub rankings: PortfolioRankings,
    pub health: HealthScore,
}

/// One point of the month-end portfolio series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvolutionPoint {
    pub month_end: NaiveDate,
    pub invested: Decimal,
    pub market_value: Decimal,
}
