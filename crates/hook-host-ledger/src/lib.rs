//! Ledger model for the hook execution host.
//!
//! The host treats the surrounding ledger as a keylet-addressed store of
//! serialized objects. This crate provides:
//!
//! - the keylet factory (typed 34-byte object identifiers),
//! - constructors and accessors for the entry kinds the host reads and
//!   writes (account roots, hook definitions, hook state, directories,
//!   emitted transactions),
//! - an in-memory [`LedgerView`] with the fee/reserve schedule, owner and
//!   emitted directories, hook-state write-through and execution metadata,
//! - the transaction master (transaction id → serialized form).
//!
//! Block production, consensus and persistence live outside the host; the
//! view here is the slice of ledger behavior the commit engine needs.

pub mod entry;
pub mod keylet;
pub mod view;

pub use keylet::KeyletType;
pub use view::{Fees, HookExecutionMeta, LedgerView, SharedLedger, TransactionMaster};

use thiserror::Error;

/// Errors from ledger mutation.
///
/// The `Internal` and `BadLedger` variants correspond to the fatal
/// apply-time conditions of the surrounding ledger (`tefINTERNAL`,
/// `tefBAD_LEDGER`); the rest are ordinary rejections.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("internal ledger inconsistency: {0}")]
    Internal(&'static str),
    #[error("ledger structure damaged: {0}")]
    BadLedger(&'static str),
    #[error("state data exceeds the hook's maximum")]
    StateDataTooLarge,
    #[error("account balance below the reserve for a new owner entry")]
    InsufficientReserve,
    #[error("directory page is full")]
    DirectoryFull,
}

/// Ledger result type.
pub type Result<T> = std::result::Result<T, LedgerError>;
