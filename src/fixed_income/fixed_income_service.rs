use chrono::{NaiveDate, Utc};
use log::{info, warn};
use std::sync::Arc;

use crate::fixed_income::fixed_income_errors::Result;
use crate::fixed_income::fixed_income_model::*;
use crate::fixed_income::fixed_income_traits::{
    FixedIncomeRepositoryTrait, RateIndexCalculator,
};

/// Lifecycle service for manually-valued holdings.
pub struct FixedIncomeService {
    repository: Arc<dyn FixedIncomeRepositoryTrait>,
    calculator: Arc<dyn RateIndexCalculator>,
}

impl FixedIncomeService {
    pub fn new(
        repository: Arc<dyn FixedIncomeRepositoryTrait>,
        calculator: Arc<dyn RateIndexCalculator>,
    ) -> Self {
        Self {
            repository,
            calculator,
        }
    }

    pub fn open(&self, new_holding: NewFixedIncomeHolding) -> Result<FixedIncomeHolding> {
        self.repository.create(new_holding)
    }

    pub fn list_for_owner(&self, owner_id: &str) -> Result<Vec<FixedIncomeHolding>> {
        self.repository.list_for_owner(owner_id)
    }

    pub fn close(&self, owner_id: &str, holding_id: &str, closed_at: NaiveDate) -> Result<()> {
        self.repository.close(owner_id, holding_id, closed_at)
    }

    /// Periodic revaluation of every active holding through the external
    /// rate-indexed calculator. One holding's failure never aborts the run.
    pub async fn revalue_all(&self) -> RevaluationSummary {
        let mut summary = RevaluationSummary::default();
        let today = Utc::now().date_naive();

        let holdings = match self.repository.list_active() {
            Ok(holdings) => holdings,
            Err(e) => {
                warn!("Revaluation aborted: cannot list holdings: {}", e);
                summary.errors.push(e.to_string());
                return summary;
            }
        };

        for holding in &holdings {
            summary.processed += 1;
            match self.calculator.current_value(holding, today).await {
                Ok(value) => match self.repository.update_current_value(&holding.id, value) {
                    Ok(()) => summary.revalued += 1,
                    Err(e) => {
                        summary.failed += 1;
                        summary.errors.push(format!("{}: {}", holding.id, e));
                    }
                },
                Err(e) => {
                    warn!("Revaluation failed for holding {}: {}", holding.id, e);
                    summary.failed += 1;
                    summary.errors.push(format!("{}: {}", holding.id, e));
                }
            }
        }

        info!(
            "Revaluation finished: {} processed, {} revalued, {} failed",
            summary.processed, summary.revalued, summary.failed
        );
        summary
    }
}
