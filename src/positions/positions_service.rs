use chrono::NaiveDate;
use log::error;
use std::collections::HashMap;
use std::sync::Arc;

use crate::ledger::ledger_traits::OwnershipEventRepositoryTrait;
use crate::positions::positions_errors::Result;
use crate::positions::positions_model::Position;
use crate::positions::positions_traits::PositionServiceTrait;
use crate::positions::reconstruction::PositionCalculator;

/// Reconstruction service: loads the committed event stream in replay order
/// and folds it with [`PositionCalculator`].
pub struct PositionService {
    ledger: Arc<dyn OwnershipEventRepositoryTrait>,
    calculator: PositionCalculator,
}

impl PositionService {
    pub fn new(ledger: Arc<dyn OwnershipEventRepositoryTrait>) -> Self {
        Self {
            ledger,
            calculator: PositionCalculator::new(),
        }
    }
}

impl PositionServiceTrait for PositionService {
    fn position_as_of(
        &self,
        owner_id: &str,
        instrument_id: &str,
        as_of: NaiveDate,
    ) -> Result<Position> {
        let events = self.ledger.get_events_for_pair(owner_id, instrument_id)?;
        self.calculator
            .position_as_of(owner_id, instrument_id, &events, as_of)
    }

    fn positions_as_of(
        &self,
        owner_id: &str,
        as_of: NaiveDate,
    ) -> Result<HashMap<String, Position>> {
        let events = self.ledger.get_events_for_owner(owner_id)?;
        let (positions, faults) = self.calculator.positions_as_of(owner_id, &events, as_of);

        for fault in &faults {
            error!(
                "Consistency fault while reconstructing positions for owner {}: {}",
                owner_id, fault
            );
        }

        Ok(positions)
    }
}
