use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal_macros::dec;

use carteira_core::distributions::{
    CreditStatus, CreditedDistributionRepository, CreditedDistributionRepositoryTrait,
    InsertOutcome, NewCreditedDistribution,
};
use carteira_core::instruments::{
    InstrumentClass, InstrumentRepository, InstrumentRepositoryTrait, NewInstrument,
};
use carteira_core::ledger::{
    NewOwnershipEvent, OwnershipEventRepository, OwnershipEventRepositoryTrait, TradeSide,
};
use carteira_core::positions::{PositionError, PositionService, PositionServiceTrait};

mod common;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn new_event(
    owner: &str,
    instrument: &str,
    side: TradeSide,
    quantity: rust_decimal::Decimal,
    unit_price: rust_decimal::Decimal,
    effective_date: NaiveDate,
) -> NewOwnershipEvent {
    NewOwnershipEvent {
        id: None,
        owner_id: owner.to_string(),
        instrument_id: instrument.to_string(),
        side,
        quantity,
        unit_price,
        fees: dec!(0),
        effective_date,
        venue: None,
    }
}

fn register_fund(repo: &InstrumentRepository, symbol: &str) -> String {
    repo.create(NewInstrument {
        id: None,
        symbol: symbol.to_string(),
        name: format!("{} Fundo Imobiliario", symbol),
        class: InstrumentClass::RealEstateFund,
        currency: "BRL".to_string(),
    })
    .unwrap()
    .id
}

#[test]
fn replay_is_deterministic_across_same_day_events() {
    let (pool, _dir) = common::setup_test_db();
    let instruments = InstrumentRepository::new(pool.clone());
    let ledger = Arc::new(OwnershipEventRepository::new(pool));

    let fund_id = register_fund(&instruments, "HGLG11");

    // Two buys and a partial sell all on the same effective date; insertion
    // order must decide the replay order.
    ledger
        .append(new_event(
            "owner-1",
            &fund_id,
            TradeSide::Acquire,
            dec!(100),
            dec!(10),
            date(2024, 1, 15),
        ))
        .unwrap();
    ledger
        .append(new_event(
            "owner-1",
            &fund_id,
            TradeSide::Acquire,
            dec!(50),
            dec!(12),
            date(2024, 1, 15),
        ))
        .unwrap();
    ledger
        .append(new_event(
            "owner-1",
            &fund_id,
            TradeSide::Dispose,
            dec!(30),
            dec!(13),
            date(2024, 1, 15),
        ))
        .unwrap();

    let events = ledger.get_events_for_pair("owner-1", &fund_id).unwrap();
    assert_eq!(events.len(), 3);
    assert!(events.windows(2).all(|w| w[0].sequence < w[1].sequence));

    let positions = PositionService::new(ledger);
    let position = positions
        .position_as_of("owner-1", &fund_id, date(2024, 1, 31))
        .unwrap();

    // 100@10 + 50@12 = 1600 cost for 150 units; selling 30 removes a fifth.
    assert_eq!(position.quantity, dec!(120));
    assert_eq!(position.cost_basis, dec!(1280));
}

#[test]
fn partial_disposal_keeps_average_cost() {
    let (pool, _dir) = common::setup_test_db();
    let instruments = InstrumentRepository::new(pool.clone());
    let ledger = Arc::new(OwnershipEventRepository::new(pool));

    let fund_id = register_fund(&instruments, "XPML11");

    ledger
        .append(new_event(
            "owner-1",
            &fund_id,
            TradeSide::Acquire,
            dec!(100),
            dec!(10),
            date(2024, 1, 2),
        ))
        .unwrap();
    ledger
        .append(new_event(
            "owner-1",
            &fund_id,
            TradeSide::Dispose,
            dec!(40),
            dec!(12),
            date(2024, 2, 2),
        ))
        .unwrap();

    let positions = PositionService::new(ledger);
    let position = positions
        .position_as_of("owner-1", &fund_id, date(2024, 3, 1))
        .unwrap();

    assert_eq!(position.quantity, dec!(60));
    assert_eq!(position.cost_basis, dec!(600));
    assert_eq!(position.average_cost(), dec!(10));
}

#[test]
fn oversell_surfaces_a_consistency_fault() {
    let (pool, _dir) = common::setup_test_db();
    let instruments = InstrumentRepository::new(pool.clone());
    let ledger = Arc::new(OwnershipEventRepository::new(pool));

    let fund_id = register_fund(&instruments, "KNRI11");

    ledger
        .append(new_event(
            "owner-1",
            &fund_id,
            TradeSide::Acquire,
            dec!(10),
            dec!(10),
            date(2024, 1, 2),
        ))
        .unwrap();
    // The log is append-only; the bad disposal is recorded and the fault
    // surfaces at replay time instead.
    ledger
        .append(new_event(
            "owner-1",
            &fund_id,
            TradeSide::Dispose,
            dec!(15),
            dec!(10),
            date(2024, 1, 3),
        ))
        .unwrap();

    let positions = PositionService::new(ledger);
    let err = positions
        .position_as_of("owner-1", &fund_id, date(2024, 1, 31))
        .unwrap_err();

    assert!(matches!(
        err,
        PositionError::DisposalExceedsHoldings { .. }
    ));
}

#[test]
fn crediting_unique_key_makes_inserts_idempotent() {
    let (pool, _dir) = common::setup_test_db();
    let instruments = InstrumentRepository::new(pool.clone());
    let credited = CreditedDistributionRepository::new(pool);

    let fund_id = register_fund(&instruments, "HGRU11");

    let entry = NewCreditedDistribution {
        owner_id: "owner-1".to_string(),
        instrument_id: fund_id.clone(),
        amount_per_unit: dec!(1.05),
        quantity: dec!(200),
        gross_amount: dec!(210),
        withheld_amount: dec!(0),
        net_amount: dec!(210),
        entitlement_date: date(2024, 1, 31),
        payment_date: date(2024, 2, 14),
        status: CreditStatus::Pending,
        origin: "fundsexplorer".to_string(),
        note: None,
    };

    let first = credited.insert_unique(entry.clone()).unwrap();
    assert!(matches!(first, InsertOutcome::Created(_)));

    // Same dedup key again: the database constraint resolves the race.
    let second = credited.insert_unique(entry.clone()).unwrap();
    assert!(matches!(second, InsertOutcome::Duplicate));

    // A different origin for the same payment is a distinct ledger row.
    let manual = NewCreditedDistribution {
        origin: "manual".to_string(),
        ..entry
    };
    let third = credited.insert_unique(manual).unwrap();
    assert!(matches!(third, InsertOutcome::Created(_)));

    let rows = credited.list_for_owner("owner-1").unwrap();
    assert_eq!(rows.len(), 2);
}

#[test]
fn due_pending_entries_are_promoted_to_received() {
    let (pool, _dir) = common::setup_test_db();
    let instruments = InstrumentRepository::new(pool.clone());
    let credited = CreditedDistributionRepository::new(pool);

    let fund_id = register_fund(&instruments, "VISC11");

    let mut entry = NewCreditedDistribution {
        owner_id: "owner-1".to_string(),
        instrument_id: fund_id,
        amount_per_unit: dec!(0.80),
        quantity: dec!(100),
        gross_amount: dec!(80),
        withheld_amount: dec!(0),
        net_amount: dec!(80),
        entitlement_date: date(2024, 1, 31),
        payment_date: date(2024, 2, 14),
        status: CreditStatus::Pending,
        origin: "fundsexplorer".to_string(),
        note: None,
    };
    credited.insert_unique(entry.clone()).unwrap();

    // A second entry not yet due.
    entry.payment_date = date(2024, 3, 14);
    credited.insert_unique(entry).unwrap();

    let promoted = credited.promote_due(date(2024, 2, 20)).unwrap();
    assert_eq!(promoted, 1);

    let rows = credited.list_for_owner("owner-1").unwrap();
    let received = rows
        .iter()
        .filter(|r| r.status == CreditStatus::Received)
        .count();
    let pending = rows
        .iter()
        .filter(|r| r.status == CreditStatus::Pending)
        .count();
    assert_eq!(received, 1);
    assert_eq!(pending, 1);
}
