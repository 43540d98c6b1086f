//! wasmtime glue.
//!
//! Mounts every host call under the `env` module. Each shim resolves the
//! guest's exported linear memory, splits the store into memory and
//! context, and delegates to the handler in [`crate::api`]. The exit
//! calls and the guard terminate the guest by raising [`HookExit`], which
//! the driver recognizes as a requested stop rather than a fault.

use std::fmt;

use wasmtime::{Caller, Linker};

use crate::api;
use crate::context::HookContext;

/// Raised to unwind the guest after `accept`, `rollback` or a guard
/// violation recorded its verdict on the context.
#[derive(Debug)]
pub struct HookExit;

impl fmt::Display for HookExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hook requested termination")
    }
}

impl std::error::Error for HookExit {}

type WtResult<T> = std::result::Result<T, wasmtime::Error>;

fn memory_and_context<'a>(
    caller: &'a mut Caller<'_, HookContext>,
) -> WtResult<(&'a mut [u8], &'a mut HookContext)> {
    let memory = caller
        .get_export("memory")
        .and_then(|export| export.into_memory())
        .ok_or_else(|| wasmtime::Error::msg("guest does not export linear memory"))?;
    Ok(memory.data_and_store_mut(caller))
}

/// Check for a requested termination after a control call.
fn finish(ctx: &HookContext, rc: i64) -> WtResult<i64> {
    if ctx.exit.complete {
        return Err(HookExit.into());
    }
    Ok(rc)
}

/// Register the full host-call surface on a linker.
pub fn link_host_calls(linker: &mut Linker<HookContext>) -> WtResult<()> {
    macro_rules! host_fn {
        // handler needs memory + context
        (mem $name:literal, $handler:path, ($($arg:ident : $ty:ty),*)) => {
            linker.func_wrap(
                "env",
                $name,
                |mut caller: Caller<'_, HookContext>, $($arg: $ty),*| -> WtResult<i64> {
                    let (mem, ctx) = memory_and_context(&mut caller)?;
                    Ok($handler(ctx, mem, $($arg),*))
                },
            )?;
        };
        // handler needs the context only
        (ctx $name:literal, $handler:path, ($($arg:ident : $ty:ty),*)) => {
            linker.func_wrap(
                "env",
                $name,
                |mut caller: Caller<'_, HookContext>, $($arg: $ty),*| -> WtResult<i64> {
                    Ok($handler(caller.data_mut(), $($arg),*))
                },
            )?;
        };
        // control calls that may terminate the guest
        (exit $name:literal, $handler:path, ($($arg:ident : $ty:ty),*)) => {
            linker.func_wrap(
                "env",
                $name,
                |mut caller: Caller<'_, HookContext>, $($arg: $ty),*| -> WtResult<i64> {
                    let (mem, ctx) = memory_and_context(&mut caller)?;
                    let rc = $handler(ctx, mem, $($arg),*);
                    finish(ctx, rc)
                },
            )?;
        };
    }

    // identity and environment
    host_fn!(mem "hook_account", api::control::hook_account, (write_ptr: u32, write_len: u32));
    host_fn!(mem "hook_hash", api::control::hook_hash, (write_ptr: u32, write_len: u32));
    host_fn!(ctx "ledger_seq", api::control::ledger_seq, ());
    host_fn!(ctx "fee_base", api::control::fee_base, ());
    host_fn!(mem "nonce", api::control::nonce, (write_ptr: u32, write_len: u32));

    // exit and guard
    host_fn!(exit "accept", api::control::accept, (read_ptr: u32, read_len: u32, error_code: i64));
    host_fn!(exit "rollback", api::control::rollback, (read_ptr: u32, read_len: u32, error_code: i64));
    linker.func_wrap(
        "env",
        "_g",
        |mut caller: Caller<'_, HookContext>, id: u32, max_iter: u32| -> WtResult<i64> {
            let ctx = caller.data_mut();
            let rc = api::control::guard(ctx, id, max_iter);
            finish(ctx, rc)
        },
    )?;

    // tracing
    host_fn!(mem "trace", api::control::trace_data,
        (mread_ptr: u32, mread_len: u32, dread_ptr: u32, dread_len: u32, as_hex: u32));
    host_fn!(mem "trace_num", api::control::trace_num, (read_ptr: u32, read_len: u32, number: i64));
    host_fn!(mem "trace_slot", api::control::trace_slot, (read_ptr: u32, read_len: u32, slot_no: u32));
    host_fn!(mem "trace_float", api::control::trace_float, (read_ptr: u32, read_len: u32, float1: i64));

    // hook state
    host_fn!(mem "state", api::state::state,
        (write_ptr: u32, write_len: u32, kread_ptr: u32, kread_len: u32));
    host_fn!(mem "state_set", api::state::state_set,
        (read_ptr: u32, read_len: u32, kread_ptr: u32, kread_len: u32));
    host_fn!(mem "state_foreign", api::state::state_foreign,
        (write_ptr: u32, write_len: u32, kread_ptr: u32, kread_len: u32, aread_ptr: u32, aread_len: u32));

    // originating transaction
    host_fn!(mem "otxn_id", api::otxn::otxn_id, (write_ptr: u32, write_len: u32));
    host_fn!(ctx "otxn_type", api::otxn::otxn_type, ());
    host_fn!(ctx "otxn_burden", api::otxn::otxn_burden, ());
    host_fn!(ctx "otxn_generation", api::otxn::otxn_generation, ());
    host_fn!(ctx "otxn_slot", api::otxn::otxn_slot, (slot_into: u32));
    host_fn!(mem "otxn_field", api::otxn::otxn_field, (write_ptr: u32, write_len: u32, field_id: u32));
    host_fn!(mem "otxn_field_txt", api::otxn::otxn_field_txt, (write_ptr: u32, write_len: u32, field_id: u32));

    // slots
    host_fn!(mem "slot", api::slot::slot, (write_ptr: u32, write_len: u32, slot_no: u32));
    host_fn!(mem "slot_set", api::slot::slot_set, (read_ptr: u32, read_len: u32, slot_into: i32));
    host_fn!(ctx "slot_subfield", api::slot::slot_subfield, (parent_slot: u32, field_id: u32, new_slot: u32));
    host_fn!(ctx "slot_subarray", api::slot::slot_subarray, (parent_slot: u32, array_index: u32, new_slot: u32));
    host_fn!(ctx "slot_count", api::slot::slot_count, (slot_no: u32));
    host_fn!(ctx "slot_size", api::slot::slot_size, (slot_no: u32));
    host_fn!(ctx "slot_type", api::slot::slot_type, (slot_no: u32, flags: u32));
    host_fn!(ctx "slot_float", api::slot::slot_float, (slot_no: u32));
    host_fn!(ctx "slot_clear", api::slot::slot_clear, (slot_no: u32));
    host_fn!(mem "slot_id", api::slot::slot_id, (write_ptr: u32, write_len: u32, slot_no: u32));

    // serialized objects
    host_fn!(mem "sto_subfield", api::sto::sto_subfield, (read_ptr: u32, read_len: u32, field_id: u32));
    host_fn!(mem "sto_subarray", api::sto::sto_subarray, (read_ptr: u32, read_len: u32, index: u32));
    host_fn!(mem "sto_validate", api::sto::sto_validate, (read_ptr: u32, read_len: u32));
    host_fn!(mem "sto_emplace", api::sto::sto_emplace,
        (write_ptr: u32, write_len: u32, sread_ptr: u32, sread_len: u32, fread_ptr: u32, fread_len: u32, field_id: u32));
    host_fn!(mem "sto_erase", api::sto::sto_erase,
        (write_ptr: u32, write_len: u32, read_ptr: u32, read_len: u32, field_id: u32));

    // utilities
    host_fn!(mem "util_sha512h", api::util::util_sha512h,
        (write_ptr: u32, write_len: u32, read_ptr: u32, read_len: u32));
    host_fn!(mem "util_verify", api::util::util_verify,
        (dread_ptr: u32, dread_len: u32, sread_ptr: u32, sread_len: u32, kread_ptr: u32, kread_len: u32));
    host_fn!(mem "util_raddr", api::util::util_raddr,
        (write_ptr: u32, write_len: u32, read_ptr: u32, read_len: u32));
    host_fn!(mem "util_accid", api::util::util_accid,
        (write_ptr: u32, write_len: u32, read_ptr: u32, read_len: u32));
    host_fn!(mem "util_keylet", api::util::util_keylet,
        (write_ptr: u32, write_len: u32, keylet_type: u32, a: u32, b: u32, c: u32, d: u32, e: u32, f: u32));

    // emission
    host_fn!(mem "emit", api::etxn::emit, (read_ptr: u32, read_len: u32));
    host_fn!(ctx "etxn_reserve", api::etxn::etxn_reserve, (count: u32));
    host_fn!(ctx "etxn_burden", api::etxn::etxn_burden, ());
    host_fn!(ctx "etxn_generation", api::etxn::etxn_generation, ());
    host_fn!(ctx "etxn_fee_base", api::etxn::etxn_fee_base, (tx_byte_count: u32));
    host_fn!(mem "etxn_details", api::etxn::etxn_details, (write_ptr: u32, write_len: u32));

    // floats
    host_fn!(ctx "float_set", api::float::float_set, (exponent: i32, mantissa: i64));
    host_fn!(ctx "float_one", api::float::float_one, ());
    host_fn!(ctx "float_multiply", api::float::float_multiply, (float1: i64, float2: i64));
    host_fn!(ctx "float_mulratio", api::float::float_mulratio,
        (float1: i64, round_up: u32, numerator: u32, denominator: u32));
    host_fn!(ctx "float_negate", api::float::float_negate, (float1: i64));
    host_fn!(ctx "float_compare", api::float::float_compare, (float1: i64, float2: i64, mode: u32));
    host_fn!(ctx "float_sum", api::float::float_sum, (float1: i64, float2: i64));
    host_fn!(ctx "float_divide", api::float::float_divide, (float1: i64, float2: i64));
    host_fn!(ctx "float_invert", api::float::float_invert, (float1: i64));
    host_fn!(ctx "float_mantissa", api::float::float_mantissa, (float1: i64));
    host_fn!(ctx "float_exponent", api::float::float_exponent, (float1: i64));
    host_fn!(ctx "float_sign", api::float::float_sign, (float1: i64));
    host_fn!(ctx "float_mantissa_set", api::float::float_mantissa_set, (float1: i64, mantissa: i64));
    host_fn!(ctx "float_exponent_set", api::float::float_exponent_set, (float1: i64, exponent: i32));
    host_fn!(ctx "float_sign_set", api::float::float_sign_set, (float1: i64, negative: u32));
    host_fn!(ctx "float_int", api::float::float_int, (float1: i64, decimal_places: u32, absolute: u32));
    host_fn!(mem "float_sto", api::float::float_sto,
        (write_ptr: u32, write_len: u32, cread_ptr: u32, cread_len: u32, iread_ptr: u32, iread_len: u32, float1: i64, field_code: u32));
    host_fn!(mem "float_sto_set", api::float::float_sto_set, (read_ptr: u32, read_len: u32));

    Ok(())
}
