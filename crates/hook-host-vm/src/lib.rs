//! Hook execution.
//!
//! This crate is the host side of the guest ABI: the per-invocation
//! context (slot table, state cache, emitted-transaction queue), the
//! handlers behind every exported host call, the wasmtime linker that
//! mounts them, and the execution driver with its commit engine.
//!
//! An invocation flows through [`apply::apply_hook`]: the driver builds a
//! [`HookContext`] from the originating transaction and the hook install
//! record, instantiates the guest, calls its `hook` (or `cbak`) export,
//! and hands the context to the commit engine, which stages the accepted
//! effects onto the [`hook_host_ledger::LedgerView`] — or discards them on
//! rollback — and appends an execution-metadata record either way.

pub mod api;
pub mod apply;
pub mod config;
pub mod context;
pub mod emit;
pub mod linker;
pub mod otxn;
pub mod trace;

pub use apply::{
    apply_hook, apply_installed_hook, can_hook, commit, is_emitted_txn, HookOutcome,
};
pub use config::HookHostConfig;
pub use context::{ExitType, HookContext, SlotEntry};
pub use otxn::OtxnFrame;

use thiserror::Error;

/// Driver-level failures: conditions that prevent an invocation from
/// running at all. Guest-visible failures are ABI sentinels, never this
/// type.
#[derive(Debug, Error)]
pub enum HookError {
    #[error("wasm engine error: {0}")]
    Engine(String),
    #[error("hook bytecode rejected: {0}")]
    BadModule(String),
}

/// VM result type.
pub type Result<T> = std::result::Result<T, HookError>;
