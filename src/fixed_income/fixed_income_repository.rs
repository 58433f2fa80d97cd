use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::get_connection;
use crate::fixed_income::fixed_income_errors::{FixedIncomeError, Result};
use crate::fixed_income::fixed_income_model::*;
use crate::fixed_income::fixed_income_traits::FixedIncomeRepositoryTrait;
use crate::schema::fixed_income_holdings;

/// Repository for manually-valued holdings
pub struct FixedIncomeRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
}

impl FixedIncomeRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }
}

impl FixedIncomeRepositoryTrait for FixedIncomeRepository {
    fn create(&self, new_holding: NewFixedIncomeHolding) -> Result<FixedIncomeHolding> {
        new_holding.validate()?;

        let mut conn = get_connection(&self.pool)
            .map_err(|e| FixedIncomeError::DatabaseError(e.to_string()))?;

        let row = FixedIncomeHoldingDb {
            id: Uuid::new_v4().to_string(),
            owner_id: new_holding.owner_id,
            category: new_holding.category,
            invested_amount: new_holding.invested_amount.to_f64().unwrap_or(0.0),
            current_value: None,
            status: HoldingStatus::Active.as_str().to_string(),
            opened_at: new_holding.opened_at,
            closed_at: None,
            updated_at: Utc::now().naive_utc(),
        };

        diesel::insert_into(fixed_income_holdings::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(FixedIncomeError::from)?;

        Ok(FixedIncomeHolding::from(row))
    }

    fn list_for_owner(&self, owner_id: &str) -> Result<Vec<FixedIncomeHolding>> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| FixedIncomeError::DatabaseError(e.to_string()))?;

        fixed_income_holdings::table
            .filter(fixed_income_holdings::owner_id.eq(owner_id))
            .filter(fixed_income_holdings::status.eq(HoldingStatus::Active.as_str()))
            .select(FixedIncomeHoldingDb::as_select())
            .order(fixed_income_holdings::opened_at.asc())
            .load::<FixedIncomeHoldingDb>(&mut conn)
            .map(|rows| rows.into_iter().map(FixedIncomeHolding::from).collect())
            .map_err(FixedIncomeError::from)
    }

    fn list_active(&self) -> Result<Vec<FixedIncomeHolding>> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| FixedIncomeError::DatabaseError(e.to_string()))?;

        fixed_income_holdings::table
            .filter(fixed_income_holdings::status.eq(HoldingStatus::Active.as_str()))
            .select(FixedIncomeHoldingDb::as_select())
            .load::<FixedIncomeHoldingDb>(&mut conn)
            .map(|rows| rows.into_iter().map(FixedIncomeHolding::from).collect())
            .map_err(FixedIncomeError::from)
    }

    fn update_current_value(&self, holding_id: &str, value: Decimal) -> Result<()> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| FixedIncomeError::DatabaseError(e.to_string()))?;

        let updated = diesel::update(fixed_income_holdings::table.find(holding_id))
            .set((
                fixed_income_holdings::current_value.eq(value.to_f64()),
                fixed_income_holdings::updated_at.eq(Utc::now().naive_utc()),
            ))
            .execute(&mut conn)
            .map_err(FixedIncomeError::from)?;

        if updated == 0 {
            return Err(FixedIncomeError::NotFound(holding_id.to_string()));
        }
        Ok(())
    }

    fn close(&self, owner_id: &str, holding_id: &str, closed_at: NaiveDate) -> Result<()> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| FixedIncomeError::DatabaseError(e.to_string()))?;

        let updated = diesel::update(
            fixed_income_holdings::table
                .find(holding_id)
                .filter(fixed_income_holdings::owner_id.eq(owner_id)),
        )
        .set((
            fixed_income_holdings::status.eq(HoldingStatus::Closed.as_str()),
            fixed_income_holdings::closed_at.eq(Some(closed_at)),
            fixed_income_holdings::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(&mut conn)
        .map_err(FixedIncomeError::from)?;

        if updated == 0 {
            return Err(FixedIncomeError::NotFound(holding_id.to_string()));
        }
        Ok(())
    }
}
