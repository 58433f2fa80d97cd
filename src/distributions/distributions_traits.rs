use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::distributions::distributions_errors::Result;
use crate::distributions::distributions_model::*;
use crate::instruments::Instrument;

/// Trait defining the contract for the credited distribution ledger.
pub trait CreditedDistributionRepositoryTrait: Send + Sync {
    fn insert_unique(&self, new_entry: NewCreditedDistribution) -> Result<InsertOutcome>;
    fn promote_due(&self, today: NaiveDate) -> Result<usize>;
    fn list_for_owner(&self, owner_id: &str) -> Result<Vec<CreditedDistribution>>;
    fn list_for_owner_since(
        &self,
        owner_id: &str,
        since: NaiveDate,
    ) -> Result<Vec<CreditedDistribution>>;
    fn delete(&self, owner_id: &str, entry_id: &str) -> Result<()>;
}

/// Source of recent distribution announcements for an instrument.
///
/// The crediting engine and the feeds have a mutual contract; this boundary
/// keeps the engine free of any concrete feed dependency.
#[async_trait]
pub trait AnnouncementSource: Send + Sync {
    async fn recent_announcements(
        &self,
        instrument: &Instrument,
        since: NaiveDate,
    ) -> Result<Vec<DistributionAnnouncement>>;
}

/// Trait defining the contract for dividend crediting operations.
#[async_trait]
pub trait DividendServiceTrait: Send + Sync {
    /// Runs one entitlement-and-crediting batch over recently paid
    /// announcements. Safe to re-run: duplicates are skipped.
    async fn run_distribution_sweep(&self) -> SweepSummary;

    /// User-originated entry; a collision with an existing manual row is an
    /// error here, not a silent no-op.
    fn record_manual_distribution(
        &self,
        input: ManualDistributionInput,
    ) -> Result<CreditedDistribution>;

    fn list_credited(&self, owner_id: &str) -> Result<Vec<CreditedDistribution>>;

    /// Net amounts credited per instrument in the trailing window, with
    /// manual-over-automatic dedup applied for totals.
    fn trailing_net_by_instrument(
        &self,
        owner_id: &str,
        since: NaiveDate,
    ) -> Result<HashMap<String, Decimal>>;

    fn delete_entry(&self, owner_id: &str, entry_id: &str) -> Result<()>;
}
