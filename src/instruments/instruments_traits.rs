use crate::instruments::instruments_errors::Result;
use crate::instruments::instruments_model::*;

/// Trait defining the contract for instrument catalog operations.
pub trait InstrumentRepositoryTrait: Send + Sync {
    fn get_by_id(&self, instrument_id: &str) -> Result<Instrument>;
    fn get_by_symbol(&self, symbol: &str) -> Result<Instrument>;
    fn list_active(&self) -> Result<Vec<Instrument>>;
    fn create(&self, new_instrument: NewInstrument) -> Result<Instrument>;
    fn update_profile(&self, update: InstrumentProfileUpdate) -> Result<Instrument>;
    fn set_active(&self, instrument_id: &str, active: bool) -> Result<()>;
}
