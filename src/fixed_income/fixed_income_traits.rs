use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::fixed_income::fixed_income_errors::Result;
use crate::fixed_income::fixed_income_model::*;

/// Trait defining the contract for manually-valued holding storage.
pub trait FixedIncomeRepositoryTrait: Send + Sync {
    fn create(&self, new_holding: NewFixedIncomeHolding) -> Result<FixedIncomeHolding>;
    fn list_for_owner(&self, owner_id: &str) -> Result<Vec<FixedIncomeHolding>>;
    fn list_active(&self) -> Result<Vec<FixedIncomeHolding>>;
    fn update_current_value(&self, holding_id: &str, value: Decimal) -> Result<()>;
    fn close(&self, owner_id: &str, holding_id: &str, closed_at: NaiveDate) -> Result<()>;
}

/// External rate-indexed calculator (e.g. CDI-tracking accrual).
///
/// The engine never computes fixed-income value itself; it asks this
/// collaborator and stores the answer.
#[async_trait]
pub trait RateIndexCalculator: Send + Sync {
    async fn current_value(
        &self,
        holding: &FixedIncomeHolding,
        as_of: NaiveDate,
    ) -> Result<Decimal>;
}
