//! Identity, exit, guard and trace calls.

use tracing::trace;

use hook_host_common::{caps, codes};

use super::{guest_slice, not_in_bounds, write_mem};
use crate::context::{ExitType, HookContext};
use crate::emit;
use crate::trace::render_text;

/// Write the 20-byte account the hook is installed on.
pub fn hook_account(ctx: &mut HookContext, mem: &mut [u8], write_ptr: u32, _write_len: u32) -> i64 {
    if not_in_bounds(mem, write_ptr, 20) {
        return codes::OUT_OF_BOUNDS;
    }
    write_mem(mem, write_ptr, 20, ctx.hook_account.as_bytes())
}

/// Write the 32-byte hash of the executing hook's bytecode.
pub fn hook_hash(ctx: &mut HookContext, mem: &mut [u8], write_ptr: u32, write_len: u32) -> i64 {
    if write_len < 32 {
        return codes::TOO_SMALL;
    }
    if not_in_bounds(mem, write_ptr, write_len) {
        return codes::OUT_OF_BOUNDS;
    }
    write_mem(mem, write_ptr, 32, ctx.hook_hash.as_bytes())
}

/// The sequence number of the ledger this invocation will land in.
pub fn ledger_seq(ctx: &mut HookContext) -> i64 {
    ctx.ledger.read().seq() as i64 + 1
}

/// The margin-adjusted ledger base fee.
pub fn fee_base(ctx: &mut HookContext) -> i64 {
    emit::fee_base(ctx) as i64
}

/// Draw a deterministic nonce into guest memory.
pub fn nonce(ctx: &mut HookContext, mem: &mut [u8], write_ptr: u32, write_len: u32) -> i64 {
    if write_len < 32 {
        return codes::TOO_SMALL;
    }
    if not_in_bounds(mem, write_ptr, write_len) {
        return codes::OUT_OF_BOUNDS;
    }
    let Some(hash) = ctx.next_nonce() else {
        return codes::TOO_MANY_NONCES;
    };
    write_mem(mem, write_ptr, 32, hash.as_bytes())
}

fn record_exit(
    ctx: &mut HookContext,
    mem: &[u8],
    read_ptr: u32,
    read_len: u32,
    error_code: i64,
    exit_type: ExitType,
) -> i64 {
    let read_len = read_len.min(caps::MAX_EXIT_REASON as u32);
    let mut reason = String::new();
    if read_ptr != 0 {
        if not_in_bounds(mem, read_ptr, read_len) {
            trace!(
                account = %ctx.hook_account,
                "exit reason string lies outside guest memory"
            );
            return codes::OUT_OF_BOUNDS;
        }
        reason = render_text(guest_slice(mem, read_ptr, read_len));
    }
    ctx.set_exit(exit_type, error_code, reason);
    if exit_type == ExitType::Accept {
        codes::RC_ACCEPT
    } else {
        codes::RC_ROLLBACK
    }
}

/// Terminate with ACCEPT: originating transaction proceeds, staged
/// effects commit.
pub fn accept(
    ctx: &mut HookContext,
    mem: &mut [u8],
    read_ptr: u32,
    read_len: u32,
    error_code: i64,
) -> i64 {
    record_exit(ctx, mem, read_ptr, read_len, error_code, ExitType::Accept)
}

/// Terminate with ROLLBACK: originating transaction is rejected, staged
/// effects discard.
pub fn rollback(
    ctx: &mut HookContext,
    mem: &mut [u8],
    read_ptr: u32,
    read_len: u32,
    error_code: i64,
) -> i64 {
    record_exit(ctx, mem, read_ptr, read_len, error_code, ExitType::Rollback)
}

/// The guard call: the guest promises each loop body runs at most
/// `max_iter` times; exceeding it rolls the invocation back.
pub fn guard(ctx: &mut HookContext, id: u32, max_iter: u32) -> i64 {
    let count = ctx.guard_map.entry(id).or_insert(0);
    *count += 1;
    if *count > max_iter {
        trace!(
            account = %ctx.hook_account,
            guard = id,
            iterations = *count,
            "guard violation"
        );
        ctx.set_exit(ExitType::Rollback, codes::GUARD_VIOLATION, String::new());
        return codes::RC_ROLLBACK;
    }
    1
}

/// Log a message with a data blob, optionally hex-rendered.
pub fn trace_data(
    ctx: &mut HookContext,
    mem: &mut [u8],
    mread_ptr: u32,
    mread_len: u32,
    dread_ptr: u32,
    dread_len: u32,
    as_hex: u32,
) -> i64 {
    if not_in_bounds(mem, mread_ptr, mread_len) || not_in_bounds(mem, dread_ptr, dread_len) {
        return codes::OUT_OF_BOUNDS;
    }
    let mread_len = mread_len.min(caps::MAX_TRACE_MESSAGE as u32);
    let dread_len = dread_len.min(caps::MAX_TRACE_DATA as u32);
    let message = render_text(guest_slice(mem, mread_ptr, mread_len));
    let data = guest_slice(mem, dread_ptr, dread_len);
    let rendered = if as_hex != 0 {
        hex::encode_upper(data)
    } else {
        render_text(data)
    };
    trace!(account = %ctx.hook_account, %message, data = %rendered, "hook trace");
    0
}

/// Log a message with a number.
pub fn trace_num(
    ctx: &mut HookContext,
    mem: &mut [u8],
    read_ptr: u32,
    read_len: u32,
    number: i64,
) -> i64 {
    if not_in_bounds(mem, read_ptr, read_len) {
        return codes::OUT_OF_BOUNDS;
    }
    let read_len = read_len.min(caps::MAX_TRACE_DATA as u32);
    let message = render_text(guest_slice(mem, read_ptr, read_len));
    trace!(account = %ctx.hook_account, %message, number, "hook trace");
    0
}

/// Log a message with a slot's identifier.
pub fn trace_slot(
    ctx: &mut HookContext,
    mem: &mut [u8],
    read_ptr: u32,
    read_len: u32,
    slot_no: u32,
) -> i64 {
    let Some(entry) = ctx.slot(slot_no) else {
        return codes::DOESNT_EXIST;
    };
    let id = hex::encode_upper(&entry.id[..entry.id.len().min(32)]);
    if not_in_bounds(mem, read_ptr, read_len) {
        return codes::OUT_OF_BOUNDS;
    }
    let read_len = read_len.min(caps::MAX_TRACE_DATA as u32);
    let message = render_text(guest_slice(mem, read_ptr, read_len));
    trace!(account = %ctx.hook_account, %message, slot = slot_no, id = %id, "hook trace");
    0
}

/// Log a message with a decoded float.
pub fn trace_float(
    ctx: &mut HookContext,
    mem: &mut [u8],
    read_ptr: u32,
    read_len: u32,
    float1: i64,
) -> i64 {
    if not_in_bounds(mem, read_ptr, read_len) {
        return codes::OUT_OF_BOUNDS;
    }
    let read_len = read_len.min(caps::MAX_TRACE_DATA as u32);
    let message = render_text(guest_slice(mem, read_ptr, read_len));
    let value = if float1 == 0 {
        "0*10^(0)".to_string()
    } else if !hook_host_float::is_valid(float1) {
        "<invalid>".to_string()
    } else {
        let sign = if hook_host_float::is_negative(float1) { "-" } else { "" };
        format!(
            "{}{}*10^({})",
            sign,
            hook_host_float::mantissa(float1),
            hook_host_float::exponent(float1)
        )
    };
    trace!(account = %ctx.hook_account, %message, float = %value, "hook trace");
    0
}
