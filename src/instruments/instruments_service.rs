use log::debug;
use std::sync::Arc;

use crate::instruments::instruments_errors::{InstrumentError, Result};
use crate::instruments::instruments_model::*;
use crate::instruments::instruments_traits::InstrumentRepositoryTrait;

/// Catalog service: resolves symbols and keeps descriptive fields fresh.
pub struct InstrumentService {
    repository: Arc<dyn InstrumentRepositoryTrait>,
}

impl InstrumentService {
    pub fn new(repository: Arc<dyn InstrumentRepositoryTrait>) -> Self {
        Self { repository }
    }

    pub fn get_by_symbol(&self, symbol: &str) -> Result<Instrument> {
        self.repository.get_by_symbol(&symbol.to_uppercase())
    }

    pub fn list_active(&self) -> Result<Vec<Instrument>> {
        self.repository.list_active()
    }

    /// Resolves a symbol, registering the instrument on first sight.
    pub fn ensure_registered(&self, new_instrument: NewInstrument) -> Result<Instrument> {
        let symbol = new_instrument.symbol.to_uppercase();
        match self.repository.get_by_symbol(&symbol) {
            Ok(existing) => Ok(existing),
            Err(InstrumentError::NotFound(_)) => {
                debug!("Registering new instrument {}", symbol);
                self.repository.create(new_instrument)
            }
            Err(e) => Err(e),
        }
    }

    pub fn refresh_profile(&self, update: InstrumentProfileUpdate) -> Result<Instrument> {
        self.repository.update_profile(update)
    }
}
