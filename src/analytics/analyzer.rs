//! Pure derived-metrics analysis over normalized indicators.
//!
//! No I/O here: everything takes normalized inputs and returns
//! classifications with the reasons that produced them.

use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::analytics::analytics_constants::*;
use crate::distributions::distributions_model::DistributionRecord;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DistributionTrend {
    Rising,
    Falling,
    Stable,
    #[default]
    Unknown,
}

impl DistributionTrend {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistributionTrend::Rising => "RISING",
            DistributionTrend::Falling => "FALLING",
            DistributionTrend::Stable => "STABLE",
            DistributionTrend::Unknown => "UNKNOWN",
        }
    }
}

impl FromStr for DistributionTrend {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, ()> {
        match s {
            "RISING" => Ok(DistributionTrend::Rising),
            "FALLING" => Ok(DistributionTrend::Falling),
            "STABLE" => Ok(DistributionTrend::Stable),
            _ => Ok(DistributionTrend::Unknown),
        }
    }
}

impl fmt::Display for DistributionTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValuationBand {
    Discount,
    Fair,
    Premium,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    #[default]
    Unknown,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
            RiskLevel::Unknown => "UNKNOWN",
        }
    }
}

impl FromStr for RiskLevel {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, ()> {
        match s {
            "LOW" => Ok(RiskLevel::Low),
            "MEDIUM" => Ok(RiskLevel::Medium),
            "HIGH" => Ok(RiskLevel::High),
            _ => Ok(RiskLevel::Unknown),
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Risk classification with every contributing factor spelled out.
///
/// The reasons are part of the contract: downstream consumers must be able
/// to show why a position is risky, not just that it scored a number.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub score: Option<Decimal>,
    pub reasons: Vec<String>,
}

/// Compares the mean of the most recent `TREND_WINDOW` payouts against the
/// mean of the up-to-`TREND_WINDOW` preceding them. History must be sorted
/// ascending by payment date.
pub fn classify_trend(history: &[DistributionRecord]) -> DistributionTrend {
    if history.len() < TREND_MIN_POINTS {
        return DistributionTrend::Unknown;
    }

    let recent = &history[history.len() - TREND_WINDOW..];
    let preceding_start = history.len().saturating_sub(TREND_WINDOW * 2);
    let preceding = &history[preceding_start..history.len() - TREND_WINDOW];

    let recent_mean = mean(recent);
    let preceding_mean = mean(preceding);
    if preceding_mean.is_zero() {
        return DistributionTrend::Unknown;
    }

    let change = (recent_mean - preceding_mean) / preceding_mean;
    if change > TREND_RISING_THRESHOLD {
        DistributionTrend::Rising
    } else if change < TREND_FALLING_THRESHOLD {
        DistributionTrend::Falling
    } else {
        DistributionTrend::Stable
    }
}

fn mean(records: &[DistributionRecord]) -> Decimal {
    if records.is_empty() {
        return Decimal::ZERO;
    }
    let total: Decimal = records.iter().map(|r| r.amount_per_unit).sum();
    total / Decimal::from(records.len())
}

/// Share of the trailing twelve months with a payout, as a 0-100 score.
/// A monthly payer scores 100.
pub fn payment_consistency(history: &[DistributionRecord], today: NaiveDate) -> Decimal {
    let window_start = today
        .checked_sub_months(Months::new(12))
        .unwrap_or(NaiveDate::MIN);

    let paid_in_window = history
        .iter()
        .filter(|r| r.payment_date > window_start && r.payment_date <= today)
        .count();

    let score = Decimal::from(paid_in_window) / dec!(12) * dec!(100);
    score.min(dec!(100))
}

/// Price-to-book-equivalent band.
pub fn classify_valuation_ratio(ratio: Decimal) -> ValuationBand {
    if ratio < VALUATION_DISCOUNT_BELOW {
        ValuationBand::Discount
    } else if ratio <= VALUATION_FAIR_UPTO {
        ValuationBand::Fair
    } else {
        ValuationBand::Premium
    }
}

/// Additive scoring over up to four independent signals. Signals without
/// data do not count toward the average; with no applicable signal at all
/// the level is Unknown.
pub fn assess_risk(
    daily_liquidity: Option<Decimal>,
    holder_count: Option<i64>,
    consistency: Option<Decimal>,
    trend: DistributionTrend,
) -> RiskAssessment {
    let mut total = Decimal::ZERO;
    let mut applicable = 0u32;
    let mut reasons: Vec<String> = Vec::new();

    if let Some(liquidity) = daily_liquidity {
        applicable += 1;
        if liquidity < LIQUIDITY_RISK_FLOOR {
            total += dec!(2);
            reasons.push(format!(
                "Daily liquidity of {} is below the {} floor",
                liquidity, LIQUIDITY_RISK_FLOOR
            ));
        } else if liquidity < LIQUIDITY_RISK_COMFORT {
            total += dec!(1);
            reasons.push(format!(
                "Daily liquidity of {} is thin (comfort level {})",
                liquidity, LIQUIDITY_RISK_COMFORT
            ));
        }
    }

    if let Some(count) = holder_count {
        applicable += 1;
        if count < HOLDER_COUNT_RISK_FLOOR {
            total += dec!(2);
            reasons.push(format!(
                "Holder base of {} is very small (floor {})",
                count, HOLDER_COUNT_RISK_FLOOR
            ));
        } else if count < HOLDER_COUNT_RISK_COMFORT {
            total += dec!(1);
            reasons.push(format!(
                "Holder base of {} is small (comfort level {})",
                count, HOLDER_COUNT_RISK_COMFORT
            ));
        }
    }

    if let Some(consistency) = consistency {
        applicable += 1;
        if consistency < CONSISTENCY_RISK_FLOOR {
            total += dec!(2);
            reasons.push(format!(
                "Payment consistency of {}% is below {}%",
                consistency.round_dp(0),
                CONSISTENCY_RISK_FLOOR
            ));
        } else if consistency < CONSISTENCY_RISK_COMFORT {
            total += dec!(1);
            reasons.push(format!(
                "Payment consistency of {}% is below {}%",
                consistency.round_dp(0),
                CONSISTENCY_RISK_COMFORT
            ));
        }
    }

    match trend {
        DistributionTrend::Falling => {
            applicable += 1;
            total += dec!(2);
            reasons.push("Distribution trend is falling".to_string());
        }
        DistributionTrend::Rising | DistributionTrend::Stable => {
            applicable += 1;
        }
        DistributionTrend::Unknown => {}
    }

    if applicable == 0 {
        return RiskAssessment {
            level: RiskLevel::Unknown,
            score: None,
            reasons,
        };
    }

    let average = total / Decimal::from(applicable);
    let level = if average < RISK_LOW_BELOW {
        RiskLevel::Low
    } else if average < RISK_MEDIUM_BELOW {
        RiskLevel::Medium
    } else {
        RiskLevel::High
    };

    RiskAssessment {
        level,
        score: Some(average),
        reasons,
    }
}

/// Human-readable reading of the classifications, for the sync log and the
/// instrument detail view.
pub fn summarize(
    symbol: &str,
    trend: DistributionTrend,
    consistency: Decimal,
    valuation: Option<ValuationBand>,
    risk: &RiskAssessment,
) -> Vec<String> {
    let mut insights = Vec::new();

    match trend {
        DistributionTrend::Rising => {
            insights.push(format!("{} distributions are trending up", symbol))
        }
        DistributionTrend::Falling => {
            insights.push(format!("{} distributions are trending down", symbol))
        }
        DistributionTrend::Stable => {
            insights.push(format!("{} distributions are stable", symbol))
        }
        DistributionTrend::Unknown => {
            insights.push(format!("{} has too little payout history for a trend", symbol))
        }
    }

    insights.push(format!(
        "Paid in {} of the last 12 months",
        (consistency / dec!(100) * dec!(12)).round_dp(0)
    ));

    if let Some(band) = valuation {
        let reading = match band {
            ValuationBand::Discount => "trades at a discount to book",
            ValuationBand::Fair => "trades around fair value",
            ValuationBand::Premium => "trades at a premium to book",
        };
        insights.push(format!("{} {}", symbol, reading));
    }

    insights.push(format!("Risk level: {}", risk.level));
    insights
}
