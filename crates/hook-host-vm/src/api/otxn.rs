//! Originating-transaction calls.

use hook_host_codec::{field_text, types};
use hook_host_common::{caps, codes};

use super::{data_as_int64, not_in_bounds, write_mem};
use crate::context::{HookContext, SlotEntry};

/// Write the originating transaction's id.
pub fn otxn_id(ctx: &mut HookContext, mem: &mut [u8], write_ptr: u32, write_len: u32) -> i64 {
    let id = ctx.otxn.id();
    if (write_len as usize) < id.as_bytes().len() {
        return codes::TOO_SMALL;
    }
    if not_in_bounds(mem, write_ptr, 32) {
        return codes::OUT_OF_BOUNDS;
    }
    write_mem(mem, write_ptr, 32, id.as_bytes())
}

/// The numeric transaction type.
pub fn otxn_type(ctx: &mut HookContext) -> i64 {
    match ctx.otxn.txn_type() {
        Some(t) => t as i64,
        None => codes::INTERNAL_ERROR,
    }
}

/// Burden of the originating transaction.
pub fn otxn_burden(ctx: &mut HookContext) -> i64 {
    ctx.otxn_burden() as i64
}

/// Generation of the originating transaction.
pub fn otxn_generation(ctx: &mut HookContext) -> i64 {
    ctx.otxn_generation() as i64
}

/// Load the originating transaction into a slot.
pub fn otxn_slot(ctx: &mut HookContext, slot_into: u32) -> i64 {
    if slot_into > caps::MAX_SLOTS {
        return codes::INVALID_ARGUMENT;
    }
    if slot_into == 0 && ctx.no_free_slots() {
        return codes::NO_FREE_SLOTS;
    }
    let slot_into = if slot_into == 0 {
        ctx.take_free_slot()
    } else {
        slot_into
    };

    let id = ctx.otxn.id().as_bytes().to_vec();
    let storage = ctx.otxn.bytes().clone();
    ctx.put_slot(slot_into, SlotEntry::root(id, storage));
    slot_into as i64
}

/// Copy a field of the originating transaction into guest memory.
///
/// Account fields lose their length prefix: the guest receives the raw
/// 20 bytes. With a zero write pointer the value packs into the return
/// value instead.
pub fn otxn_field(
    ctx: &mut HookContext,
    mem: &mut [u8],
    write_ptr: u32,
    write_len: u32,
    field_id: u32,
) -> i64 {
    if write_ptr != 0 && not_in_bounds(mem, write_ptr, write_len) {
        return codes::OUT_OF_BOUNDS;
    }
    if hook_host_codec::type_code(field_id) == 0 {
        return codes::INVALID_FIELD;
    }

    let Some(field) = ctx.otxn.field(field_id) else {
        return codes::DOESNT_EXIST;
    };
    let bytes = ctx.otxn.bytes().clone();
    let payload = &bytes[field.payload_start..field.payload_start + field.payload_len];

    // serialized value: VL types carry their length prefix
    let mut value = if types::is_vl(field.type_code) {
        let mut v = hook_host_codec::encode_vl(payload.len());
        v.extend_from_slice(payload);
        v
    } else {
        payload.to_vec()
    };

    if write_ptr == 0 {
        return data_as_int64(&value);
    }

    if field.type_code == types::ACCOUNT {
        value.remove(0);
    }
    if value.len() > write_len as usize {
        return codes::TOO_SMALL;
    }
    write_mem(mem, write_ptr, write_len, &value)
}

/// Render a field of the originating transaction as text.
pub fn otxn_field_txt(
    ctx: &mut HookContext,
    mem: &mut [u8],
    write_ptr: u32,
    write_len: u32,
    field_id: u32,
) -> i64 {
    if not_in_bounds(mem, write_ptr, write_len) {
        return codes::OUT_OF_BOUNDS;
    }
    if hook_host_codec::type_code(field_id) == 0 {
        return codes::INVALID_FIELD;
    }
    let Some(field) = ctx.otxn.field(field_id) else {
        return codes::DOESNT_EXIST;
    };
    let bytes = ctx.otxn.bytes().clone();
    let payload = &bytes[field.payload_start..field.payload_start + field.payload_len];
    let text = field_text(field.type_code, payload);
    if text.len() > write_len as usize {
        return codes::TOO_SMALL;
    }
    write_mem(mem, write_ptr, write_len, text.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testutil::{guest_mem, test_context, OTXN_ACCOUNT};
    use hook_host_codec::sf;

    #[test]
    fn otxn_id_round_trip() {
        let mut ctx = test_context();
        let mut mem = guest_mem();
        assert_eq!(otxn_id(&mut ctx, &mut mem, 0, 32), 32);
        assert_eq!(&mem[..32], ctx.otxn.id().as_bytes());
        assert_eq!(otxn_id(&mut ctx, &mut mem, 0, 31), codes::TOO_SMALL);
    }

    #[test]
    fn otxn_type_reads_field() {
        let mut ctx = test_context();
        assert_eq!(otxn_type(&mut ctx), 0);
    }

    #[test]
    fn account_field_strips_prefix() {
        let mut ctx = test_context();
        let mut mem = guest_mem();
        let written = otxn_field(&mut ctx, &mut mem, 0x100, 20, sf::ACCOUNT);
        assert_eq!(written, 20);
        assert_eq!(&mem[0x100..0x114], OTXN_ACCOUNT.as_bytes());
    }

    #[test]
    fn scalar_field_packs_into_return() {
        let mut ctx = test_context();
        let mut mem = guest_mem();
        // Sequence = 4 in the test transaction
        assert_eq!(otxn_field(&mut ctx, &mut mem, 0, 0, sf::SEQUENCE), 4);
    }

    #[test]
    fn absent_and_invalid_fields() {
        let mut ctx = test_context();
        let mut mem = guest_mem();
        assert_eq!(
            otxn_field(&mut ctx, &mut mem, 0x100, 32, sf::LAST_LEDGER_SEQUENCE),
            codes::DOESNT_EXIST
        );
        assert_eq!(otxn_field(&mut ctx, &mut mem, 0x100, 32, 0x7), codes::INVALID_FIELD);
    }

    #[test]
    fn field_txt_renders_account() {
        let mut ctx = test_context();
        let mut mem = guest_mem();
        let written = otxn_field_txt(&mut ctx, &mut mem, 0x100, 64, sf::ACCOUNT);
        assert!(written > 0);
        assert_eq!(mem[0x100], b'r');
    }

    #[test]
    fn otxn_slot_allocates() {
        let mut ctx = test_context();
        let handle = otxn_slot(&mut ctx, 0);
        assert_eq!(handle, 1);
        let entry = ctx.slot(1).unwrap();
        assert_eq!(entry.id, ctx.otxn.id().as_bytes().to_vec());
        assert_eq!(otxn_slot(&mut ctx, 300), codes::INVALID_ARGUMENT);
    }
}
