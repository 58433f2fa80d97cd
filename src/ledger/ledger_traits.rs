use crate::ledger::ledger_errors::Result;
use crate::ledger::ledger_model::*;

/// Trait defining the contract for the ownership event log.
///
/// The log is append-only: there is deliberately no update or delete here.
pub trait OwnershipEventRepositoryTrait: Send + Sync {
    fn append(&self, new_event: NewOwnershipEvent) -> Result<OwnershipEvent>;
    fn get_events_for_pair(
        &self,
        owner_id: &str,
        instrument_id: &str,
    ) -> Result<Vec<OwnershipEvent>>;
    fn get_events_for_owner(&self, owner_id: &str) -> Result<Vec<OwnershipEvent>>;
    fn owners_with_events(&self, instrument_id: &str) -> Result<Vec<String>>;
}
