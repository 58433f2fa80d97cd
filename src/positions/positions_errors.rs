use rust_decimal::Decimal;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PositionError>;

#[derive(Error, Debug)]
pub enum PositionError {
    /// Consistency fault: the event log records a disposal larger than the
    /// reconstructed holding. Surfaced, never clamped.
    #[error(
        "Disposal in event {event_id} exceeds recorded holdings: requested {requested}, held {held}"
    )]
    DisposalExceedsHoldings {
        event_id: String,
        requested: Decimal,
        held: Decimal,
    },

    #[error("Ledger error: {0}")]
    Ledger(#[from] crate::ledger::ledger_errors::LedgerError),
}
