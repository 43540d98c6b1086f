//! Execution driver and commit engine.
//!
//! The driver owns the wasmtime lifecycle: compile the hook bytecode,
//! mount the host calls, give the guest a fuel budget, call its export
//! and read the verdict off the context. The commit engine then stages
//! the invocation's effects onto the ledger view — or discards them —
//! and appends the execution-metadata record.

use tracing::{debug, trace, warn};
use wasmtime::{Config, Engine, Linker, Module, Store};

use hook_host_common::{AccountId, Hash256};
use hook_host_ledger::{HookExecutionMeta, LedgerError, SharedLedger};

use crate::config::HookHostConfig;
use crate::context::{ExitType, HookContext};
use crate::linker::{link_host_calls, HookExit};
use crate::otxn::OtxnFrame;
use crate::{HookError, Result};

/// Commit mode bit: apply staged state changes and emissions.
pub const CCL_APPLY: u8 = 0b01;
/// Commit mode bit: remove the originating transaction from the emitted
/// directory.
pub const CCL_REMOVE: u8 = 0b10;

/// Transaction type that installs hooks; its trigger bit is active-high.
const TT_HOOK_SET: u16 = 22;

/// What a finished invocation looks like to the surrounding transactor.
#[derive(Debug, Clone)]
pub struct HookOutcome {
    pub exit_type: ExitType,
    pub exit_code: i64,
    pub exit_reason: String,
    pub instruction_count: u64,
    pub emit_count: u16,
    pub state_change_count: u16,
    pub execution_index: u16,
}

/// Whether a transaction type triggers a hook under the given `HookOn`
/// bitfield. Every bit is active low except the SetHook bit.
pub fn can_hook(txn_type: u16, hook_on: u64) -> bool {
    let mask = (hook_on ^ (1u64 << TT_HOOK_SET)) ^ u64::MAX;
    (mask >> txn_type) & 1 == 1
}

/// Whether a transaction was emitted by a hook.
pub fn is_emitted_txn(otxn: &OtxnFrame) -> bool {
    otxn.is_emitted()
}

/// Run a hook against an originating transaction and commit the result.
///
/// `callback` selects the `cbak` export and the emitted-directory removal
/// path of the commit engine.
#[allow(clippy::too_many_arguments)]
pub fn apply_hook(
    ledger: SharedLedger,
    config: HookHostConfig,
    bytecode: &[u8],
    otxn: OtxnFrame,
    account: AccountId,
    hook_hash: Hash256,
    hook_set_txn_id: Hash256,
    callback: bool,
) -> Result<HookOutcome> {
    let ctx = HookContext::new(account, hook_hash, hook_set_txn_id, otxn, ledger, config);

    let mut ctx = run_guest(ctx, bytecode, callback);

    let mode = if callback {
        CCL_REMOVE
            | if ctx.exit.exit_type == ExitType::Accept {
                CCL_APPLY
            } else {
                0
            }
    } else if ctx.exit.exit_type == ExitType::Accept {
        CCL_APPLY
    } else {
        0
    };

    Ok(commit(&mut ctx, mode))
}

/// Instantiate the guest and drive it to a verdict, recording the verdict
/// and instruction count on the context.
fn run_guest(mut ctx: HookContext, bytecode: &[u8], callback: bool) -> HookContext {
    let fuel_limit = ctx.config.fuel_limit;
    let account = ctx.hook_account;

    let mut engine_config = Config::new();
    engine_config.consume_fuel(true);
    let engine = match Engine::new(&engine_config) {
        Ok(engine) => engine,
        Err(err) => {
            warn!(account = %account, %err, "wasm engine construction failed");
            ctx.exit.exit_type = ExitType::WasmError;
            return ctx;
        }
    };

    let module = match Module::new(&engine, bytecode) {
        Ok(module) => module,
        Err(err) => {
            warn!(account = %account, %err, "hook bytecode rejected");
            ctx.exit.exit_type = ExitType::WasmError;
            return ctx;
        }
    };

    let mut linker: Linker<HookContext> = Linker::new(&engine);
    if let Err(err) = link_host_calls(&mut linker) {
        warn!(account = %account, %err, "host call registration failed");
        ctx.exit.exit_type = ExitType::WasmError;
        return ctx;
    }

    let mut store = Store::new(&engine, ctx);
    if store.set_fuel(fuel_limit).is_err() {
        let mut ctx = store.into_data();
        ctx.exit.exit_type = ExitType::WasmError;
        return ctx;
    }

    trace!(account = %account, callback, "creating wasm instance");
    let export = if callback { "cbak" } else { "hook" };
    let call_result = linker.instantiate(&mut store, &module).and_then(|instance| {
        let func = instance.get_typed_func::<i64, i64>(&mut store, export)?;
        func.call(&mut store, 0)
    });

    let consumed = store
        .get_fuel()
        .map(|remaining| fuel_limit.saturating_sub(remaining))
        .unwrap_or(0);
    let mut ctx = store.into_data();
    ctx.instruction_count = consumed;

    match call_result {
        Ok(_) => {
            // fell off the end without accept/rollback: the default
            // rollback verdict stands
        }
        Err(err) if err.downcast_ref::<HookExit>().is_some() => {
            // requested termination; verdict already recorded
        }
        Err(err) => {
            warn!(account = %account, %err, "wasm execution error");
            ctx.exit.exit_type = ExitType::WasmError;
        }
    }

    trace!(
        account = %account,
        exit = ?ctx.exit.exit_type,
        code = ctx.exit.code,
        reason = %ctx.exit.reason,
        instructions = ctx.instruction_count,
        "hook finished"
    );
    ctx
}

/// Stage the invocation's effects onto the ledger.
///
/// `CCL_APPLY` writes modified state-cache entries through and inserts
/// queued emissions into the emitted directory; `CCL_REMOVE` retires the
/// originating transaction's own emitted-directory entry. The metadata
/// record is appended regardless of mode.
pub fn commit(ctx: &mut HookContext, mode: u8) -> HookOutcome {
    let account = ctx.hook_account;
    let mut change_count: u16 = 0;
    let mut emission_count: u16 = 0;

    let mut ledger = ctx.ledger.write();

    if mode & CCL_APPLY != 0 {
        for (key, (modified, blob)) in ctx.state_cache.iter() {
            if !modified {
                continue;
            }
            match ledger.set_hook_state(&account, key, blob) {
                Ok(()) => change_count += 1,
                Err(LedgerError::Internal(what)) | Err(LedgerError::BadLedger(what)) => {
                    warn!(account = %account, key = %key, what, "state commit failed");
                }
                Err(err) => {
                    warn!(account = %account, key = %key, %err, "state change dropped");
                }
            }
        }

        for emitted in ctx.emitted.drain(..) {
            trace!(account = %account, txn = %emitted.id, "inserting emitted txn");
            match ledger.insert_emitted_txn(&emitted.id, &emitted.serialized) {
                Ok(true) => {
                    ledger
                        .txn_master_mut()
                        .insert(emitted.id, emitted.serialized);
                    emission_count += 1;
                }
                Ok(false) => {}
                Err(err) => {
                    warn!(account = %account, txn = %emitted.id, %err,
                        "emitted directory rejected txn");
                    break;
                }
            }
        }
    }

    if mode & CCL_REMOVE != 0 && ctx.otxn.is_emitted() {
        let id = ctx.otxn.id();
        match ledger.remove_emitted_txn(&id) {
            Ok(true) => {}
            Ok(false) => {
                warn!(account = %account, txn = %id, "emitted txn already removed")
            }
            Err(err) => {
                warn!(account = %account, txn = %id, %err, "emitted txn removal failed")
            }
        }
    }

    let biased_code = if ctx.exit.code >= 0 {
        ctx.exit.code as u64
    } else {
        0x8000_0000_0000_0000u64 + ctx.exit.code.unsigned_abs()
    };
    let execution_index = ledger.push_hook_execution(HookExecutionMeta {
        result: ctx.exit.exit_type as u8,
        hook_hash: ctx.hook_hash,
        account,
        return_code: biased_code,
        return_string: ctx.exit.reason.clone().into_bytes(),
        instruction_count: ctx.instruction_count,
        emit_count: emission_count,
        execution_index: 0,
        state_change_count: change_count,
    });
    drop(ledger);

    debug!(
        account = %account,
        exit = ?ctx.exit.exit_type,
        changes = change_count,
        emissions = emission_count,
        "hook committed"
    );

    HookOutcome {
        exit_type: ctx.exit.exit_type,
        exit_code: ctx.exit.code,
        exit_reason: ctx.exit.reason.clone(),
        instruction_count: ctx.instruction_count,
        emit_count: emission_count,
        state_change_count: change_count,
        execution_index,
    }
}

/// Convenience used by embedders that fetch the hook definition from the
/// ledger: run the hook installed on `account` against `otxn`.
pub fn apply_installed_hook(
    ledger: SharedLedger,
    config: HookHostConfig,
    otxn: OtxnFrame,
    account: AccountId,
    callback: bool,
) -> Result<HookOutcome> {
    use hook_host_codec::sf;
    use hook_host_ledger::{entry, keylet};

    let (bytecode, hook_hash, hook_set_txn_id, hook_on) = {
        let view = ledger.read();
        let Some(hook_entry) = view.get(&keylet::hook(&account)) else {
            return Err(HookError::BadModule("no hook installed".into()));
        };
        (
            entry::read_vl(hook_entry, sf::CREATE_CODE)
                .ok_or_else(|| HookError::BadModule("hook entry carries no bytecode".into()))?,
            entry::read_h256(hook_entry, sf::HOOK_HASH).unwrap_or(Hash256::ZERO),
            entry::read_h256(hook_entry, sf::HOOK_SET_TXN_ID).unwrap_or(Hash256::ZERO),
            entry::read_u64(hook_entry, sf::HOOK_ON).unwrap_or(0),
        )
    };

    if let Some(txn_type) = otxn.txn_type() {
        if !can_hook(txn_type, hook_on) {
            return Err(HookError::BadModule(
                "transaction type does not trigger this hook".into(),
            ));
        }
    }

    apply_hook(
        ledger,
        config,
        &bytecode,
        otxn,
        account,
        hook_hash,
        hook_set_txn_id,
        callback,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hook_on_default_triggers_everything_but_sethook() {
        assert!(can_hook(0, 0)); // payments
        assert!(can_hook(2, 0));
        assert!(!can_hook(TT_HOOK_SET, 0));
        // opting out of payments
        assert!(!can_hook(0, 1));
        // opting into SetHook
        assert!(can_hook(TT_HOOK_SET, 1 << TT_HOOK_SET));
    }
}
