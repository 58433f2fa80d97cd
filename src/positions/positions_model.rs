use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Point-in-time holding for an owner+instrument pair, derived by replaying
/// the event log. Never persisted as a source of truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub owner_id: String,
    pub instrument_id: String,
    pub quantity: Decimal,
    pub cost_basis: Decimal,
    pub as_of: NaiveDate,
}

impl Position {
    pub fn empty(owner_id: &str, instrument_id: &str, as_of: NaiveDate) -> Self {
        Position {
            owner_id: owner_id.to_string(),
            instrument_id: instrument_id.to_string(),
            quantity: Decimal::ZERO,
            cost_basis: Decimal::ZERO,
            as_of,
        }
    }

    /// Weighted-average cost per unit; zero for an empty position.
    pub fn average_cost(&self) -> Decimal {
        if self.quantity > Decimal::ZERO {
            self.cost_basis / self.quantity
        } else {
            Decimal::ZERO
        }
    }

    pub fn is_open(&self) -> bool {
        self.quantity > Decimal::ZERO
    }
}
