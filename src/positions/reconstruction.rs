use chrono::NaiveDate;
use log::debug;
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::ledger::{OwnershipEvent, TradeSide};
use crate::positions::positions_errors::{PositionError, Result};
use crate::positions::positions_model::Position;

/// Replays ownership events into point-in-time positions.
///
/// Acquisitions add `quantity * unit_price + fees` to cost basis; disposals
/// shrink cost basis proportionally to the disposed quantity (weighted
/// average, not lot matching). A disposal exceeding the running quantity is
/// a consistency fault and aborts the fold for that pair.
#[derive(Default, Debug, Clone)]
pub struct PositionCalculator {}

impl PositionCalculator {
    pub fn new() -> Self {
        PositionCalculator {}
    }

    /// Folds the pair's events with `effective_date <= as_of`.
    ///
    /// Events must arrive in (effective_date, sequence) order, the
    /// repository's replay order. The fold itself does no sorting so that
    /// reconstruction stays a pure function of the committed log order.
    pub fn position_as_of(
        &self,
        owner_id: &str,
        instrument_id: &str,
        events: &[OwnershipEvent],
        as_of: NaiveDate,
    ) -> Result<Position> {
        let mut position = Position::empty(owner_id, instrument_id, as_of);

        for event in events {
            if event.effective_date > as_of {
                break;
            }
            apply_event(&mut position, event)?;
        }

        Ok(position)
    }

    /// One pass over an owner's full ordered stream, producing every
    /// instrument's position at once. Used by the valuation engine to avoid
    /// rescanning the log per instrument.
    ///
    /// A consistency fault in one instrument's history does not poison the
    /// others: the faulty pair is dropped and reported alongside the result.
    pub fn positions_as_of(
        &self,
        owner_id: &str,
        events: &[OwnershipEvent],
        as_of: NaiveDate,
    ) -> (HashMap<String, Position>, Vec<PositionError>) {
        let mut positions: HashMap<String, Position> = HashMap::new();
        let mut faults: Vec<PositionError> = Vec::new();
        let mut poisoned: Vec<String> = Vec::new();

        for event in events {
            if event.effective_date > as_of {
                break;
            }
            if poisoned.iter().any(|id| id == &event.instrument_id) {
                continue;
            }

            let position = positions
                .entry(event.instrument_id.clone())
                .or_insert_with(|| Position::empty(owner_id, &event.instrument_id, as_of));

            if let Err(fault) = apply_event(position, event) {
                poisoned.push(event.instrument_id.clone());
                positions.remove(&event.instrument_id);
                faults.push(fault);
            }
        }

        debug!(
            "Reconstructed {} positions for owner {} as of {} ({} faults)",
            positions.len(),
            owner_id,
            as_of,
            faults.len()
        );

        (positions, faults)
    }
}

/// Applies a single event to the running position state.
fn apply_event(position: &mut Position, event: &OwnershipEvent) -> Result<()> {
    match event.side {
        TradeSide::Acquire => {
            position.cost_basis += event.quantity * event.unit_price + event.fees;
            position.quantity += event.quantity;
        }
        TradeSide::Dispose => {
            if event.quantity > position.quantity {
                return Err(PositionError::DisposalExceedsHoldings {
                    event_id: event.id.clone(),
                    requested: event.quantity,
                    held: position.quantity,
                });
            }

            let ratio = event.quantity / position.quantity;
            position.cost_basis -= position.cost_basis * ratio;
            position.quantity -= event.quantity;

            if position.quantity.is_zero() {
                position.cost_basis = Decimal::ZERO;
            }
        }
    }
    Ok(())
}
