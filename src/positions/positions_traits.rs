use chrono::NaiveDate;
use std::collections::HashMap;

use crate::positions::positions_errors::Result;
use crate::positions::positions_model::Position;

/// Trait defining the contract for point-in-time position reconstruction.
///
/// Consumed by the crediting and valuation engines; injected as a trait so
/// neither needs a concrete dependency on the ledger storage.
pub trait PositionServiceTrait: Send + Sync {
    /// Position for one owner+instrument pair as of a date (inclusive).
    fn position_as_of(
        &self,
        owner_id: &str,
        instrument_id: &str,
        as_of: NaiveDate,
    ) -> Result<Position>;

    /// All of an owner's positions as of a date, reconstructed in a single
    /// pass over the owner's event stream. Faulty instruments are dropped
    /// and logged, never silently negative.
    fn positions_as_of(
        &self,
        owner_id: &str,
        as_of: NaiveDate,
    ) -> Result<HashMap<String, Position>>;
}
