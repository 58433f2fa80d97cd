use chrono::Utc;
use diesel::dsl::max;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use rust_decimal::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::get_connection;
use crate::ledger::ledger_errors::{LedgerError, Result};
use crate::ledger::ledger_model::*;
use crate::ledger::ledger_traits::OwnershipEventRepositoryTrait;
use crate::schema::ownership_events;

/// Repository for the append-only ownership event log
pub struct OwnershipEventRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
}

impl OwnershipEventRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }
}

impl OwnershipEventRepositoryTrait for OwnershipEventRepository {
    /// Appends an event, assigning the next insertion sequence inside the
    /// transaction so concurrent inserts with the same effective date still
    /// replay deterministically.
    fn append(&self, new_event: NewOwnershipEvent) -> Result<OwnershipEvent> {
        new_event.validate()?;

        let mut conn = get_connection(&self.pool)
            .map_err(|e| LedgerError::DatabaseError(e.to_string()))?;

        let row = conn.transaction::<OwnershipEventDb, diesel::result::Error, _>(|conn| {
            let next_sequence: i64 = ownership_events::table
                .select(max(ownership_events::sequence))
                .first::<Option<i64>>(conn)?
                .unwrap_or(0)
                + 1;

            let row = OwnershipEventDb {
                id: new_event
                    .id
                    .clone()
                    .unwrap_or_else(|| Uuid::new_v4().to_string()),
                owner_id: new_event.owner_id.clone(),
                instrument_id: new_event.instrument_id.clone(),
                side: new_event.side.as_str().to_string(),
                quantity: new_event.quantity.to_f64().unwrap_or(0.0),
                unit_price: new_event.unit_price.to_f64().unwrap_or(0.0),
                fees: new_event.fees.to_f64().unwrap_or(0.0),
                effective_date: new_event.effective_date,
                venue: new_event.venue.clone(),
                sequence: next_sequence,
                created_at: Utc::now().naive_utc(),
            };

            diesel::insert_into(ownership_events::table)
                .values(&row)
                .execute(conn)?;

            Ok(row)
        })?;

        Ok(OwnershipEvent::from(row))
    }

    fn get_events_for_pair(
        &self,
        owner_id: &str,
        instrument_id: &str,
    ) -> Result<Vec<OwnershipEvent>> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| LedgerError::DatabaseError(e.to_string()))?;

        ownership_events::table
            .filter(ownership_events::owner_id.eq(owner_id))
            .filter(ownership_events::instrument_id.eq(instrument_id))
            .select(OwnershipEventDb::as_select())
            .order((
                ownership_events::effective_date.asc(),
                ownership_events::sequence.asc(),
            ))
            .load::<OwnershipEventDb>(&mut conn)
            .map(|rows| rows.into_iter().map(OwnershipEvent::from).collect())
            .map_err(LedgerError::from)
    }

    fn get_events_for_owner(&self, owner_id: &str) -> Result<Vec<OwnershipEvent>> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| LedgerError::DatabaseError(e.to_string()))?;

        ownership_events::table
            .filter(ownership_events::owner_id.eq(owner_id))
            .select(OwnershipEventDb::as_select())
            .order((
                ownership_events::effective_date.asc(),
                ownership_events::sequence.asc(),
            ))
            .load::<OwnershipEventDb>(&mut conn)
            .map(|rows| rows.into_iter().map(OwnershipEvent::from).collect())
            .map_err(LedgerError::from)
    }

    /// Owners with at least one event for the instrument. Disposals may have
    /// zeroed them out since; entitlement is decided by replay, not by this
    /// list.
    fn owners_with_events(&self, instrument_id: &str) -> Result<Vec<String>> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| LedgerError::DatabaseError(e.to_string()))?;

        ownership_events::table
            .filter(ownership_events::instrument_id.eq(instrument_id))
            .select(ownership_events::owner_id)
            .distinct()
            .load::<String>(&mut conn)
            .map_err(LedgerError::from)
    }
}
