//! Slot-table calls.
//!
//! Slots give the guest stable handles onto serialized ledger objects and
//! transactions, with field- and element-level drill-down that never
//! copies the underlying object.

use hook_host_codec::{count_children, find_element, find_field, types};
use hook_host_common::{caps, codes, Hash256, Keylet};

use super::{data_as_int64, guest_slice, not_in_bounds, write_mem};
use crate::context::{EntryRef, HookContext, SlotEntry};

/// Serialize the current entry of a slot into guest memory. A zero
/// buffer packs the first eight bytes into the return value.
pub fn slot(ctx: &mut HookContext, mem: &mut [u8], write_ptr: u32, write_len: u32, slot_no: u32) -> i64 {
    if !(write_ptr == 0 && write_len == 0) && not_in_bounds(mem, write_ptr, write_len) {
        return codes::OUT_OF_BOUNDS;
    }
    if write_ptr != 0 && write_len == 0 {
        return codes::TOO_SMALL;
    }
    let Some(entry) = ctx.slot(slot_no) else {
        return codes::DOESNT_EXIST;
    };
    let Some(mut value) = entry.value() else {
        return codes::INTERNAL_ERROR;
    };

    if write_ptr == 0 {
        return data_as_int64(&value);
    }

    // account payloads shed the length prefix at the ABI boundary
    if entry.type_code() == types::ACCOUNT && !value.is_empty() {
        value.remove(0);
    }
    if value.len() > write_len as usize {
        return codes::TOO_SMALL;
    }
    write_mem(mem, write_ptr, write_len, &value)
}

/// Load a ledger entry (34-byte keylet) or transaction (32-byte id) into
/// a slot.
pub fn slot_set(ctx: &mut HookContext, mem: &mut [u8], read_ptr: u32, read_len: u32, slot_into: i32) -> i64 {
    if not_in_bounds(mem, read_ptr, read_len) {
        return codes::OUT_OF_BOUNDS;
    }
    if (read_len != 32 && read_len != 34) || slot_into < 0 || slot_into as u32 > caps::MAX_SLOTS {
        return codes::INVALID_ARGUMENT;
    }
    if slot_into == 0 && ctx.no_free_slots() {
        return codes::NO_FREE_SLOTS;
    }

    let id = guest_slice(mem, read_ptr, read_len).to_vec();
    let storage: std::sync::Arc<[u8]> = if read_len == 34 {
        let Some(keylet) = Keylet::from_bytes(&id) else {
            return codes::DOESNT_EXIST;
        };
        let ledger = ctx.ledger.read();
        match ledger.get(&keylet) {
            Some(entry) => entry.clone().into(),
            None => return codes::DOESNT_EXIST,
        }
    } else {
        let Some(hash) = Hash256::from_slice(&id) else {
            return codes::DOESNT_EXIST;
        };
        let ledger = ctx.ledger.read();
        match ledger.txn_master().fetch(&hash) {
            Some(txn) => txn.clone().into(),
            None => return codes::DOESNT_EXIST,
        }
    };

    let slot_into = if slot_into == 0 {
        ctx.take_free_slot()
    } else {
        slot_into as u32
    };
    ctx.put_slot(slot_into, SlotEntry::root(id, storage));
    slot_into as i64
}

fn alloc_target(ctx: &mut HookContext, requested: u32) -> Result<u32, i64> {
    if requested > caps::MAX_SLOTS {
        return Err(codes::INVALID_ARGUMENT);
    }
    if requested == 0 {
        if ctx.no_free_slots() {
            return Err(codes::NO_FREE_SLOTS);
        }
        return Ok(ctx.take_free_slot());
    }
    Ok(requested)
}

/// Move a slot (or a copy of it) onto a named subfield of its current
/// entry.
pub fn slot_subfield(ctx: &mut HookContext, parent_slot: u32, field_id: u32, new_slot: u32) -> i64 {
    let Some(parent) = ctx.slot(parent_slot) else {
        return codes::DOESNT_EXIST;
    };
    let parent = parent.clone();
    if !types::is_known(hook_host_codec::type_code(field_id)) {
        return codes::INVALID_FIELD;
    }
    if let EntryRef::Field { .. } = parent.entry {
        if parent.type_code() != types::OBJECT {
            return codes::NOT_AN_OBJECT;
        }
    }
    let Some((region_start, region)) = parent.search_region() else {
        return codes::INTERNAL_ERROR;
    };
    let found = match find_field(region, field_id) {
        Err(_) => return codes::NOT_AN_OBJECT,
        Ok(None) => return codes::DOESNT_EXIST,
        Ok(Some(found)) => found,
    };

    let target = match alloc_target(ctx, new_slot) {
        Ok(t) => t,
        Err(code) => return code,
    };
    let mut child = parent;
    child.entry = EntryRef::Field {
        start: region_start + found.start,
    };
    ctx.put_slot(target, child);
    target as i64
}

/// Move a slot (or a copy of it) onto an element of its current array
/// entry.
pub fn slot_subarray(ctx: &mut HookContext, parent_slot: u32, array_index: u32, new_slot: u32) -> i64 {
    let Some(parent) = ctx.slot(parent_slot) else {
        return codes::DOESNT_EXIST;
    };
    let parent = parent.clone();
    if parent.type_code() != types::ARRAY {
        return codes::NOT_AN_ARRAY;
    }
    let Some((region_start, region)) = parent.search_region() else {
        return codes::INTERNAL_ERROR;
    };
    let found = match find_element(region, array_index) {
        Err(_) => return codes::NOT_AN_ARRAY,
        Ok(None) => return codes::DOESNT_EXIST,
        Ok(Some(found)) => found,
    };

    let target = match alloc_target(ctx, new_slot) {
        Ok(t) => t,
        Err(code) => return code,
    };
    let mut child = parent;
    child.entry = EntryRef::Field {
        start: region_start + found.start,
    };
    ctx.put_slot(target, child);
    target as i64
}

/// Number of elements of an array entry.
pub fn slot_count(ctx: &mut HookContext, slot_no: u32) -> i64 {
    let Some(entry) = ctx.slot(slot_no) else {
        return codes::DOESNT_EXIST;
    };
    if entry.type_code() != types::ARRAY {
        return codes::NOT_AN_ARRAY;
    }
    let Some((_, region)) = entry.search_region() else {
        return codes::INTERNAL_ERROR;
    };
    match count_children(region) {
        Ok(count) => count as i64,
        Err(_) => codes::NOT_AN_ARRAY,
    }
}

/// Serialized size of the current entry.
pub fn slot_size(ctx: &mut HookContext, slot_no: u32) -> i64 {
    let Some(entry) = ctx.slot(slot_no) else {
        return codes::DOESNT_EXIST;
    };
    match entry.value() {
        Some(value) => value.len() as i64,
        None => codes::INTERNAL_ERROR,
    }
}

/// With flag 0, the packed field id of the current entry (0 for a root
/// object, which carries no preamble). With flag 1, whether an amount
/// entry is native.
pub fn slot_type(ctx: &mut HookContext, slot_no: u32, flags: u32) -> i64 {
    let Some(entry) = ctx.slot(slot_no) else {
        return codes::DOESNT_EXIST;
    };
    match flags {
        0 => match entry.parsed() {
            None => 0,
            Some(field) => field.field_id() as i64,
        },
        1 => {
            let Some(field) = entry.parsed() else {
                return codes::NOT_AN_AMOUNT;
            };
            if field.type_code != types::AMOUNT {
                return codes::NOT_AN_AMOUNT;
            }
            let first = entry.storage[field.payload_start];
            (first >> 6 == 1) as i64
        }
        _ => codes::INVALID_ARGUMENT,
    }
}

/// Interpret an amount entry as a decimal float.
pub fn slot_float(ctx: &mut HookContext, slot_no: u32) -> i64 {
    let Some(entry) = ctx.slot(slot_no) else {
        return codes::DOESNT_EXIST;
    };
    let Some(field) = entry.parsed() else {
        return codes::NOT_AN_AMOUNT;
    };
    if field.type_code != types::AMOUNT {
        return codes::NOT_AN_AMOUNT;
    }
    let payload = &entry.storage[field.payload_start..field.payload_start + field.payload_len];
    hook_host_float::from_amount_bytes(payload)
}

/// Release a slot handle.
pub fn slot_clear(ctx: &mut HookContext, slot_no: u32) -> i64 {
    if ctx.clear_slot(slot_no) {
        1
    } else {
        codes::DOESNT_EXIST
    }
}

/// Write the identifier a slot was loaded under.
pub fn slot_id(ctx: &mut HookContext, mem: &mut [u8], write_ptr: u32, write_len: u32, slot_no: u32) -> i64 {
    let Some(entry) = ctx.slot(slot_no) else {
        return codes::DOESNT_EXIST;
    };
    let id = entry.id.clone();
    if (write_len as usize) < id.len() {
        return codes::TOO_SMALL;
    }
    if not_in_bounds(mem, write_ptr, write_len) {
        return codes::OUT_OF_BOUNDS;
    }
    write_mem(mem, write_ptr, write_len, &id)
}
