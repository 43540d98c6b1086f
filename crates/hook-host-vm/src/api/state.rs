//! Hook-state calls.
//!
//! Reads go through the per-invocation cache; writes stage into it. The
//! cache applies to the ledger only at commit, and only on ACCEPT.

use hook_host_codec::sf;
use hook_host_common::{codes, AccountId};
use hook_host_ledger::{entry, keylet};

use super::{data_as_int64, guest_slice, not_in_bounds, write_mem};
use crate::context::{make_state_key, HookContext};

/// Stage a state write. A zero-length value deletes on commit.
pub fn state_set(
    ctx: &mut HookContext,
    mem: &mut [u8],
    read_ptr: u32,
    read_len: u32,
    kread_ptr: u32,
    kread_len: u32,
) -> i64 {
    if not_in_bounds(mem, kread_ptr, kread_len) {
        return codes::OUT_OF_BOUNDS;
    }
    // zero pointer and length is the delete form; anything else must be
    // in bounds
    if !(read_ptr == 0 && read_len == 0) && not_in_bounds(mem, read_ptr, read_len) {
        return codes::OUT_OF_BOUNDS;
    }
    if kread_len > 32 {
        return codes::TOO_BIG;
    }
    if kread_len < 1 {
        return codes::TOO_SMALL;
    }

    let max_size = {
        let ledger = ctx.ledger.read();
        let Some(hook_entry) = ledger.get(&keylet::hook(&ctx.hook_account)).cloned() else {
            return codes::INTERNAL_ERROR;
        };
        entry::read_u32(&hook_entry, sf::HOOK_STATE_DATA_MAX_SIZE)
            .unwrap_or(hook_host_common::caps::HOOK_STATE_DATA_MAX)
    };
    if read_len > max_size {
        return codes::TOO_BIG;
    }

    let Some(key) = make_state_key(guest_slice(mem, kread_ptr, kread_len)) else {
        return codes::INVALID_ARGUMENT;
    };
    let data = guest_slice(mem, read_ptr, read_len).to_vec();
    ctx.state_cache.insert(key, (true, data));
    read_len as i64
}

/// Read local state.
pub fn state(
    ctx: &mut HookContext,
    mem: &mut [u8],
    write_ptr: u32,
    write_len: u32,
    kread_ptr: u32,
    kread_len: u32,
) -> i64 {
    state_foreign(ctx, mem, write_ptr, write_len, kread_ptr, kread_len, 0, 0)
}

/// Read state, locally or from another account's store.
///
/// A zero account pointer selects the local store; local reads populate
/// the cache, foreign reads never do.
#[allow(clippy::too_many_arguments)]
pub fn state_foreign(
    ctx: &mut HookContext,
    mem: &mut [u8],
    write_ptr: u32,
    write_len: u32,
    kread_ptr: u32,
    kread_len: u32,
    aread_ptr: u32,
    aread_len: u32,
) -> i64 {
    let is_foreign = aread_ptr > 0;

    if not_in_bounds(mem, kread_ptr, kread_len)
        || not_in_bounds(mem, aread_ptr, aread_len)
        || not_in_bounds(mem, write_ptr, write_len)
    {
        return codes::OUT_OF_BOUNDS;
    }
    if kread_len > 32 {
        return codes::TOO_BIG;
    }
    if is_foreign && aread_len != 20 {
        return codes::INVALID_ACCOUNT;
    }

    let Some(key) = make_state_key(guest_slice(mem, kread_ptr, kread_len)) else {
        return codes::INVALID_ARGUMENT;
    };

    if !is_foreign {
        if let Some((modified, cached)) = ctx.state_cache.get(&key) {
            // a staged delete reads back as absent
            if *modified && cached.is_empty() {
                return codes::DOESNT_EXIST;
            }
            if write_ptr == 0 {
                return data_as_int64(cached);
            }
            if cached.len() > write_len as usize {
                return codes::TOO_SMALL;
            }
            let cached = cached.clone();
            return write_mem(mem, write_ptr, write_len, &cached);
        }
    }

    let owner = if is_foreign {
        let Some(account) = AccountId::from_slice(guest_slice(mem, aread_ptr, 20)) else {
            return codes::INVALID_ACCOUNT;
        };
        account
    } else {
        ctx.hook_account
    };

    let blob = {
        let ledger = ctx.ledger.read();
        if ledger.get(&keylet::hook(&ctx.hook_account)).is_none() {
            return codes::INTERNAL_ERROR;
        }
        match ledger.get_hook_state(&owner, &key) {
            Some(blob) => blob,
            None => return codes::DOESNT_EXIST,
        }
    };

    if !is_foreign {
        ctx.state_cache.insert(key, (false, blob.clone()));
    }

    if write_ptr == 0 {
        return data_as_int64(&blob);
    }
    if blob.len() > write_len as usize {
        return codes::TOO_SMALL;
    }
    write_mem(mem, write_ptr, write_len, &blob)
}
