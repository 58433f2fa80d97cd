use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use log::{debug, error, info, warn};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;

use crate::constants::{ORIGIN_MANUAL, SWEEP_LOOKBACK_DAYS};
use crate::distributions::distributions_errors::{DistributionError, Result};
use crate::distributions::distributions_model::*;
use crate::distributions::distributions_traits::{
    AnnouncementSource, CreditedDistributionRepositoryTrait, DividendServiceTrait,
};
use crate::instruments::{Instrument, InstrumentRepositoryTrait};
use crate::ledger::ledger_traits::OwnershipEventRepositoryTrait;
use crate::notifications::{NewNotification, NotificationSink};
use crate::positions::positions_traits::PositionServiceTrait;

/// Entitlement & crediting engine.
///
/// Matches announced distributions against ownership reconstructed "as of"
/// the entitlement date (never against current holdings) and performs the
/// idempotent unique-key insert into the ledger.
pub struct DividendCreditingService {
    instruments: Arc<dyn InstrumentRepositoryTrait>,
    ledger: Arc<dyn OwnershipEventRepositoryTrait>,
    positions: Arc<dyn PositionServiceTrait>,
    credited: Arc<dyn CreditedDistributionRepositoryTrait>,
    announcements: Arc<dyn AnnouncementSource>,
    notifier: Arc<dyn NotificationSink>,
}

impl DividendCreditingService {
    pub fn new(
        instruments: Arc<dyn InstrumentRepositoryTrait>,
        ledger: Arc<dyn OwnershipEventRepositoryTrait>,
        positions: Arc<dyn PositionServiceTrait>,
        credited: Arc<dyn CreditedDistributionRepositoryTrait>,
        announcements: Arc<dyn AnnouncementSource>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            instruments,
            ledger,
            positions,
            credited,
            announcements,
            notifier,
        }
    }

    /// Gross/withheld/net for one owner's entitlement. Withholding is zero
    /// for the tax-exempt class; otherwise the announcement's source-defined
    /// rate applies.
    fn compute_amounts(
        instrument: &Instrument,
        quantity: Decimal,
        amount_per_unit: Decimal,
        withholding_rate: Option<Decimal>,
    ) -> (Decimal, Decimal, Decimal) {
        let gross = quantity * amount_per_unit;
        let withheld = if instrument.class.is_tax_exempt() {
            Decimal::ZERO
        } else {
            withholding_rate
                .map(|rate| gross * rate)
                .unwrap_or(Decimal::ZERO)
        };
        (gross, withheld, gross - withheld)
    }

    fn credit_announcement_for_owner(
        &self,
        instrument: &Instrument,
        owner_id: &str,
        announcement: &DistributionAnnouncement,
        today: NaiveDate,
        summary: &mut SweepSummary,
    ) {
        summary.processed += 1;

        let position = match self.positions.position_as_of(
            owner_id,
            &instrument.id,
            announcement.entitlement_date,
        ) {
            Ok(position) => position,
            Err(e) => {
                error!(
                    "Skipping {} for owner {}: reconstruction failed: {}",
                    instrument.symbol, owner_id, e
                );
                summary.errors += 1;
                summary
                    .error_messages
                    .push(format!("{}/{}: {}", instrument.symbol, owner_id, e));
                return;
            }
        };

        // Not entitled on the cutoff date; nothing to credit.
        if !position.is_open() {
            debug!(
                "Owner {} held no {} on {}",
                owner_id, instrument.symbol, announcement.entitlement_date
            );
            return;
        }

        let (gross, withheld, net) = Self::compute_amounts(
            instrument,
            position.quantity,
            announcement.amount_per_unit,
            announcement.withholding_rate,
        );

        let status = if announcement.payment_date <= today {
            CreditStatus::Received
        } else {
            CreditStatus::Pending
        };

        let new_entry = NewCreditedDistribution {
            owner_id: owner_id.to_string(),
            instrument_id: instrument.id.clone(),
            amount_per_unit: announcement.amount_per_unit,
            quantity: position.quantity,
            gross_amount: gross,
            withheld_amount: withheld,
            net_amount: net,
            entitlement_date: announcement.entitlement_date,
            payment_date: announcement.payment_date,
            status,
            origin: announcement.origin.clone(),
            note: None,
        };

        match self.credited.insert_unique(new_entry) {
            Ok(InsertOutcome::Created(entry)) => {
                summary.created += 1;
                self.notify_credited(instrument, &entry);
            }
            Ok(InsertOutcome::Duplicate) => {
                // Already credited by an earlier run or a concurrent sweep.
                summary.skipped += 1;
            }
            Err(e) => {
                error!(
                    "Failed to credit {} for owner {}: {}",
                    instrument.symbol, owner_id, e
                );
                summary.errors += 1;
                summary
                    .error_messages
                    .push(format!("{}/{}: {}", instrument.symbol, owner_id, e));
            }
        }
    }

    /// Fire-and-forget; a sink failure never fails the credit.
    fn notify_credited(&self, instrument: &Instrument, entry: &CreditedDistribution) {
        self.notifier.deliver(NewNotification {
            owner_id: entry.owner_id.clone(),
            title: format!("Provento de {}", instrument.symbol),
            message: format!(
                "{} x {} = {} a receber em {}",
                entry.quantity, entry.amount_per_unit, entry.net_amount, entry.payment_date
            ),
            scheduled_for: Utc::now(),
        });
    }
}

#[async_trait]
impl DividendServiceTrait for DividendCreditingService {
    async fn run_distribution_sweep(&self) -> SweepSummary {
        let today = Utc::now().date_naive();
        let since = today - Duration::days(SWEEP_LOOKBACK_DAYS);
        let mut summary = SweepSummary::default();

        info!("Starting distribution sweep (paid since {})", since);

        let instruments = match self.instruments.list_active() {
            Ok(instruments) => instruments,
            Err(e) => {
                error!("Distribution sweep aborted: cannot list instruments: {}", e);
                summary.errors += 1;
                summary.error_messages.push(e.to_string());
                return summary;
            }
        };

        for instrument in &instruments {
            let owners = match self.ledger.owners_with_events(&instrument.id) {
                Ok(owners) => owners,
                Err(e) => {
                    error!("Cannot list owners for {}: {}", instrument.symbol, e);
                    summary.errors += 1;
                    summary
                        .error_messages
                        .push(format!("{}: {}", instrument.symbol, e));
                    continue;
                }
            };
            if owners.is_empty() {
                continue;
            }

            let announcements = match self
                .announcements
                .recent_announcements(instrument, since)
                .await
            {
                Ok(announcements) => announcements,
                Err(e) => {
                    // One feed being down must not sink the whole batch.
                    warn!("No announcements for {}: {}", instrument.symbol, e);
                    summary.errors += 1;
                    summary
                        .error_messages
                        .push(format!("{}: {}", instrument.symbol, e));
                    continue;
                }
            };

            for announcement in &announcements {
                for owner_id in &owners {
                    self.credit_announcement_for_owner(
                        instrument,
                        owner_id,
                        announcement,
                        today,
                        &mut summary,
                    );
                }
            }
        }

        match self.credited.promote_due(today) {
            Ok(promoted) if promoted > 0 => {
                info!("Promoted {} ledger entries to received", promoted)
            }
            Ok(_) => {}
            Err(e) => {
                error!("Failed to promote due entries: {}", e);
                summary.errors += 1;
                summary.error_messages.push(e.to_string());
            }
        }

        info!(
            "Distribution sweep finished: {} processed, {} created, {} skipped, {} errors",
            summary.processed, summary.created, summary.skipped, summary.errors
        );
        summary
    }

    fn record_manual_distribution(
        &self,
        input: ManualDistributionInput,
    ) -> Result<CreditedDistribution> {
        if input.amount_per_unit <= Decimal::ZERO {
            return Err(DistributionError::InvalidData(format!(
                "Amount per unit must be positive, got {}",
                input.amount_per_unit
            )));
        }

        let instrument = self
            .instruments
            .get_by_symbol(&input.instrument_symbol)
            .map_err(|_| DistributionError::InstrumentNotFound(input.instrument_symbol.clone()))?;

        let quantity = match input.quantity {
            Some(quantity) if quantity > Decimal::ZERO => quantity,
            Some(quantity) => {
                return Err(DistributionError::InvalidData(format!(
                    "Quantity must be positive, got {}",
                    quantity
                )))
            }
            None => {
                let position = self
                    .positions
                    .position_as_of(&input.owner_id, &instrument.id, input.entitlement_date)
                    .map_err(|e| DistributionError::InvalidData(e.to_string()))?;
                if !position.is_open() {
                    return Err(DistributionError::InvalidData(format!(
                        "Owner held no {} on {}",
                        instrument.symbol, input.entitlement_date
                    )));
                }
                position.quantity
            }
        };

        let (gross, withheld, net) = Self::compute_amounts(
            &instrument,
            quantity,
            input.amount_per_unit,
            input.withholding_rate,
        );

        let today = Utc::now().date_naive();
        let status = if input.payment_date <= today {
            CreditStatus::Received
        } else {
            CreditStatus::Pending
        };

        let new_entry = NewCreditedDistribution {
            owner_id: input.owner_id.clone(),
            instrument_id: instrument.id.clone(),
            amount_per_unit: input.amount_per_unit,
            quantity,
            gross_amount: gross,
            withheld_amount: withheld,
            net_amount: net,
            entitlement_date: input.entitlement_date,
            payment_date: input.payment_date,
            status,
            origin: ORIGIN_MANUAL.to_string(),
            note: input.note,
        };

        match self.credited.insert_unique(new_entry)? {
            InsertOutcome::Created(entry) => Ok(entry),
            InsertOutcome::Duplicate => Err(DistributionError::AlreadyRecorded {
                owner_id: input.owner_id,
                instrument_id: instrument.id,
                payment_date: input.payment_date,
                origin: ORIGIN_MANUAL.to_string(),
            }),
        }
    }

    fn list_credited(&self, owner_id: &str) -> Result<Vec<CreditedDistribution>> {
        self.credited.list_for_owner(owner_id)
    }

    fn trailing_net_by_instrument(
        &self,
        owner_id: &str,
        since: NaiveDate,
    ) -> Result<HashMap<String, Decimal>> {
        let rows = self.credited.list_for_owner_since(owner_id, since)?;
        let mut totals: HashMap<String, Decimal> = HashMap::new();
        for row in dedupe_for_totals(&rows) {
            *totals.entry(row.instrument_id.clone()).or_default() += row.net_amount;
        }
        Ok(totals)
    }

    fn delete_entry(&self, owner_id: &str, entry_id: &str) -> Result<()> {
        self.credited.delete(owner_id, entry_id)
    }
}
