use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use rust_decimal::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::get_connection;
use crate::distributions::distributions_errors::{DistributionError, Result};
use crate::distributions::distributions_model::*;
use crate::distributions::distributions_traits::CreditedDistributionRepositoryTrait;
use crate::schema::credited_distributions;

/// Repository for the credited distribution ledger
pub struct CreditedDistributionRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
}

impl CreditedDistributionRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }
}

impl CreditedDistributionRepositoryTrait for CreditedDistributionRepository {
    /// Inserts against the (owner, instrument, payment_date, origin) unique
    /// index. A conflict means another run already credited this row; the
    /// constraint is the only concurrency control on this path.
    fn insert_unique(&self, new_entry: NewCreditedDistribution) -> Result<InsertOutcome> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| DistributionError::DatabaseError(e.to_string()))?;

        let now = Utc::now().naive_utc();
        let row = CreditedDistributionDb {
            id: Uuid::new_v4().to_string(),
            owner_id: new_entry.owner_id,
            instrument_id: new_entry.instrument_id,
            amount_per_unit: new_entry.amount_per_unit.to_f64().unwrap_or(0.0),
            quantity: new_entry.quantity.to_f64().unwrap_or(0.0),
            gross_amount: new_entry.gross_amount.to_f64().unwrap_or(0.0),
            withheld_amount: new_entry.withheld_amount.to_f64().unwrap_or(0.0),
            net_amount: new_entry.net_amount.to_f64().unwrap_or(0.0),
            entitlement_date: new_entry.entitlement_date,
            payment_date: new_entry.payment_date,
            status: new_entry.status.as_str().to_string(),
            origin: new_entry.origin,
            note: new_entry.note,
            created_at: now,
            updated_at: now,
        };

        let inserted = diesel::insert_into(credited_distributions::table)
            .values(&row)
            .on_conflict((
                credited_distributions::owner_id,
                credited_distributions::instrument_id,
                credited_distributions::payment_date,
                credited_distributions::origin,
            ))
            .do_nothing()
            .execute(&mut conn)
            .map_err(DistributionError::from)?;

        if inserted == 0 {
            Ok(InsertOutcome::Duplicate)
        } else {
            Ok(InsertOutcome::Created(CreditedDistribution::from(row)))
        }
    }

    /// Flips Pending entries whose payment date has arrived to Received.
    fn promote_due(&self, today: NaiveDate) -> Result<usize> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| DistributionError::DatabaseError(e.to_string()))?;

        diesel::update(
            credited_distributions::table
                .filter(credited_distributions::status.eq(CreditStatus::Pending.as_str()))
                .filter(credited_distributions::payment_date.le(today)),
        )
        .set((
            credited_distributions::status.eq(CreditStatus::Received.as_str()),
            credited_distributions::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(&mut conn)
        .map_err(DistributionError::from)
    }

    fn list_for_owner(&self, owner_id: &str) -> Result<Vec<CreditedDistribution>> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| DistributionError::DatabaseError(e.to_string()))?;

        credited_distributions::table
            .filter(credited_distributions::owner_id.eq(owner_id))
            .select(CreditedDistributionDb::as_select())
            .order(credited_distributions::payment_date.desc())
            .load::<CreditedDistributionDb>(&mut conn)
            .map(|rows| rows.into_iter().map(CreditedDistribution::from).collect())
            .map_err(DistributionError::from)
    }

    fn list_for_owner_since(
        &self,
        owner_id: &str,
        since: NaiveDate,
    ) -> Result<Vec<CreditedDistribution>> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| DistributionError::DatabaseError(e.to_string()))?;

        credited_distributions::table
            .filter(credited_distributions::owner_id.eq(owner_id))
            .filter(credited_distributions::payment_date.ge(since))
            .select(CreditedDistributionDb::as_select())
            .order(credited_distributions::payment_date.desc())
            .load::<CreditedDistributionDb>(&mut conn)
            .map(|rows| rows.into_iter().map(CreditedDistribution::from).collect())
            .map_err(DistributionError::from)
    }

    /// Explicit user action; the ledger is otherwise never deleted from.
    fn delete(&self, owner_id: &str, entry_id: &str) -> Result<()> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| DistributionError::DatabaseError(e.to_string()))?;

        let deleted = diesel::delete(
            credited_distributions::table
                .filter(credited_distributions::id.eq(entry_id))
                .filter(credited_distributions::owner_id.eq(owner_id)),
        )
        .execute(&mut conn)
        .map_err(DistributionError::from)?;

        if deleted == 0 {
            return Err(DistributionError::NotFound(entry_id.to_string()));
        }
        Ok(())
    }
}
