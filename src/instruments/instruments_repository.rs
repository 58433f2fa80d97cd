use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::get_connection;
use crate::instruments::instruments_errors::{InstrumentError, Result};
use crate::instruments::instruments_model::*;
use crate::instruments::instruments_traits::InstrumentRepositoryTrait;
use crate::schema::instruments;

/// Repository for the instrument catalog
pub struct InstrumentRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
}

impl InstrumentRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }
}

impl InstrumentRepositoryTrait for InstrumentRepository {
    fn get_by_id(&self, instrument_id: &str) -> Result<Instrument> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| InstrumentError::DatabaseError(e.to_string()))?;

        instruments::table
            .find(instrument_id)
            .select(InstrumentDb::as_select())
            .first::<InstrumentDb>(&mut conn)
            .map(Instrument::from)
            .map_err(|_| InstrumentError::NotFound(instrument_id.to_string()))
    }

    fn get_by_symbol(&self, symbol: &str) -> Result<Instrument> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| InstrumentError::DatabaseError(e.to_string()))?;

        instruments::table
            .filter(instruments::symbol.eq(symbol))
            .select(InstrumentDb::as_select())
            .first::<InstrumentDb>(&mut conn)
            .map(Instrument::from)
            .map_err(|_| InstrumentError::NotFound(symbol.to_string()))
    }

    fn list_active(&self) -> Result<Vec<Instrument>> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| InstrumentError::DatabaseError(e.to_string()))?;

        instruments::table
            .filter(instruments::is_active.eq(true))
            .select(InstrumentDb::as_select())
            .order(instruments::symbol.asc())
            .load::<InstrumentDb>(&mut conn)
            .map(|rows| rows.into_iter().map(Instrument::from).collect())
            .map_err(InstrumentError::from)
    }

    fn create(&self, new_instrument: NewInstrument) -> Result<Instrument> {
        new_instrument.validate()?;

        let mut conn = get_connection(&self.pool)
            .map_err(|e| InstrumentError::DatabaseError(e.to_string()))?;

        let now = Utc::now().naive_utc();
        let row = InstrumentDb {
            id: new_instrument
                .id
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            symbol: new_instrument.symbol.to_uppercase(),
            name: new_instrument.name,
            instrument_class: new_instrument.class.as_str().to_string(),
            currency: new_instrument.currency,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        diesel::insert_into(instruments::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(InstrumentError::from)?;

        Ok(Instrument::from(row))
    }

    /// Refreshes mutable descriptive fields; identity fields never change.
    fn update_profile(&self, update: InstrumentProfileUpdate) -> Result<Instrument> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| InstrumentError::DatabaseError(e.to_string()))?;

        let existing = instruments::table
            .filter(instruments::symbol.eq(&update.symbol))
            .select(InstrumentDb::as_select())
            .first::<InstrumentDb>(&mut conn)
            .map_err(|_| InstrumentError::NotFound(update.symbol.clone()))?;

        let name = update.name.unwrap_or_else(|| existing.name.clone());
        let currency = update.currency.unwrap_or_else(|| existing.currency.clone());

        diesel::update(instruments::table.find(&existing.id))
            .set((
                instruments::name.eq(&name),
                instruments::currency.eq(&currency),
                instruments::updated_at.eq(Utc::now().naive_utc()),
            ))
            .execute(&mut conn)
            .map_err(InstrumentError::from)?;

        self.get_by_id(&existing.id)
    }

    fn set_active(&self, instrument_id: &str, active: bool) -> Result<()> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| InstrumentError::DatabaseError(e.to_string()))?;

        diesel::update(instruments::table.find(instrument_id))
            .set((
                instruments::is_active.eq(active),
                instruments::updated_at.eq(Utc::now().naive_utc()),
            ))
            .execute(&mut conn)
            .map_err(InstrumentError::from)?;
        Ok(())
    }
}
