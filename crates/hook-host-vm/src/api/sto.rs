//! Serialized-object calls: lookup, validation and splicing of guest
//! supplied objects.

use hook_host_codec as codec;
use hook_host_common::{caps, codes};

use super::{guest_slice, not_in_bounds, pack_offset_len, write_mem};
use crate::context::HookContext;

/// Locate a field's payload inside a serialized object in guest memory.
/// Returns offset and length packed into one i64; arrays come back fully
/// wrapped.
pub fn sto_subfield(
    _ctx: &mut HookContext,
    mem: &mut [u8],
    read_ptr: u32,
    read_len: u32,
    field_id: u32,
) -> i64 {
    if not_in_bounds(mem, read_ptr, read_len) {
        return codes::OUT_OF_BOUNDS;
    }
    if read_len < 1 {
        return codes::TOO_SMALL;
    }
    match codec::subfield(guest_slice(mem, read_ptr, read_len), field_id) {
        Err(_) => codes::PARSE_ERROR,
        Ok(None) => codes::DOESNT_EXIST,
        Ok(Some((offset, length))) => pack_offset_len(offset, length),
    }
}

/// Locate an array element inside a serialized array in guest memory.
pub fn sto_subarray(
    _ctx: &mut HookContext,
    mem: &mut [u8],
    read_ptr: u32,
    read_len: u32,
    index: u32,
) -> i64 {
    if not_in_bounds(mem, read_ptr, read_len) {
        return codes::OUT_OF_BOUNDS;
    }
    if read_len < 1 {
        return codes::TOO_SMALL;
    }
    match codec::subarray(guest_slice(mem, read_ptr, read_len), index) {
        Err(_) => codes::PARSE_ERROR,
        Ok(None) => codes::DOESNT_EXIST,
        Ok(Some((offset, length))) => pack_offset_len(offset, length),
    }
}

/// Whether the bytes parse as a serialized object. 1 or 0.
pub fn sto_validate(_ctx: &mut HookContext, mem: &mut [u8], read_ptr: u32, read_len: u32) -> i64 {
    if not_in_bounds(mem, read_ptr, read_len) {
        return codes::OUT_OF_BOUNDS;
    }
    if read_len < 1 {
        return codes::TOO_SMALL;
    }
    codec::validate(guest_slice(mem, read_ptr, read_len)) as i64
}

/// Inject a fully formed field into a serialized object at its canonical
/// position, writing the result to guest memory.
#[allow(clippy::too_many_arguments)]
pub fn sto_emplace(
    _ctx: &mut HookContext,
    mem: &mut [u8],
    write_ptr: u32,
    write_len: u32,
    sread_ptr: u32,
    sread_len: u32,
    fread_ptr: u32,
    fread_len: u32,
    field_id: u32,
) -> i64 {
    if not_in_bounds(mem, write_ptr, write_len)
        || not_in_bounds(mem, sread_ptr, sread_len)
        || not_in_bounds(mem, fread_ptr, fread_len)
    {
        return codes::OUT_OF_BOUNDS;
    }
    if (write_len as u64) < sread_len as u64 + fread_len as u64 {
        return codes::TOO_SMALL;
    }
    if sread_len as usize > caps::MAX_EMPLACE_SOURCE {
        return codes::TOO_BIG;
    }
    if fread_len as usize > caps::MAX_FIELD_BLOB {
        return codes::TOO_BIG;
    }

    let source = guest_slice(mem, sread_ptr, sread_len).to_vec();
    let field = guest_slice(mem, fread_ptr, fread_len).to_vec();
    match codec::emplace(&source, &field, field_id) {
        Err(_) => codes::PARSE_ERROR,
        Ok(out) => write_mem(mem, write_ptr, write_len, &out),
    }
}

/// Remove a field from a serialized object, writing the remainder to
/// guest memory.
pub fn sto_erase(
    _ctx: &mut HookContext,
    mem: &mut [u8],
    write_ptr: u32,
    write_len: u32,
    read_ptr: u32,
    read_len: u32,
    field_id: u32,
) -> i64 {
    if not_in_bounds(mem, write_ptr, write_len) || not_in_bounds(mem, read_ptr, read_len) {
        return codes::OUT_OF_BOUNDS;
    }
    if read_len as usize > caps::MAX_EMPLACE_SOURCE {
        return codes::TOO_BIG;
    }
    if write_len < read_len {
        return codes::TOO_SMALL;
    }

    let source = guest_slice(mem, read_ptr, read_len).to_vec();
    match codec::erase(&source, field_id) {
        Err(_) => codes::PARSE_ERROR,
        Ok(None) => codes::DOESNT_EXIST,
        Ok(Some(out)) => write_mem(mem, write_ptr, write_len, &out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testutil::{guest_mem, payment_txn, test_context, OTXN_ACCOUNT};
    use hook_host_codec::{sf, StoBuilder};

    fn stage(mem: &mut [u8], at: usize, bytes: &[u8]) -> (u32, u32) {
        mem[at..at + bytes.len()].copy_from_slice(bytes);
        (at as u32, bytes.len() as u32)
    }

    #[test]
    fn subfield_points_into_buffer() {
        let mut ctx = test_context();
        let mut mem = guest_mem();
        let txn = payment_txn(&OTXN_ACCOUNT);
        let (ptr, len) = stage(&mut mem, 0, &txn);

        let packed = sto_subfield(&mut ctx, &mut mem, ptr, len, sf::SEQUENCE);
        assert!(packed > 0);
        let off = (packed >> 32) as usize;
        let flen = (packed & 0xFFFF_FFFF) as usize;
        assert_eq!(&mem[off..off + flen], &4u32.to_be_bytes());

        assert_eq!(
            sto_subfield(&mut ctx, &mut mem, ptr, len, sf::EMIT_DETAILS),
            codes::DOESNT_EXIST
        );
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let mut ctx = test_context();
        let mut mem = guest_mem();
        let (ptr, len) = stage(&mut mem, 0, &[0x91, 0x00, 0x01]);
        assert_eq!(
            sto_subfield(&mut ctx, &mut mem, ptr, len, sf::SEQUENCE),
            codes::PARSE_ERROR
        );
        assert_eq!(sto_validate(&mut ctx, &mut mem, ptr, len), 0);
    }

    #[test]
    fn validate_accepts_txn() {
        let mut ctx = test_context();
        let mut mem = guest_mem();
        let txn = payment_txn(&OTXN_ACCOUNT);
        let (ptr, len) = stage(&mut mem, 0, &txn);
        assert_eq!(sto_validate(&mut ctx, &mut mem, ptr, len), 1);
        assert_eq!(sto_validate(&mut ctx, &mut mem, ptr, 0), codes::TOO_SMALL);
    }

    #[test]
    fn subarray_walks_elements() {
        let mut ctx = test_context();
        let mut mem = guest_mem();
        let mut b = StoBuilder::new();
        b.begin_array(sf::SIGNER_ENTRIES);
        for w in 1..=2u16 {
            b.begin_object(sf::SIGNER_ENTRY);
            b.u16_field(sf::SIGNER_WEIGHT, w);
            b.end_object();
        }
        b.end_array();
        let arr = b.into_bytes();
        let (ptr, len) = stage(&mut mem, 0, &arr);

        let packed = sto_subarray(&mut ctx, &mut mem, ptr, len, 1);
        assert!(packed > 0);
        assert_eq!(
            sto_subarray(&mut ctx, &mut mem, ptr, len, 2),
            codes::DOESNT_EXIST
        );
    }

    #[test]
    fn emplace_and_erase_round_trip() {
        let mut ctx = test_context();
        let mut mem = guest_mem();
        let txn = payment_txn(&OTXN_ACCOUNT);
        let (sptr, slen) = stage(&mut mem, 0, &txn);

        let mut fb = StoBuilder::new();
        fb.u32_field(sf::LAST_LEDGER_SEQUENCE, 900);
        let field = fb.into_bytes();
        let (fptr, flen) = stage(&mut mem, 0x1000, &field);

        let out_len = sto_emplace(&mut ctx, &mut mem, 0x2000, 2048, sptr, slen, fptr, flen, sf::LAST_LEDGER_SEQUENCE);
        assert_eq!(out_len, (txn.len() + field.len()) as i64);

        let erased_len = sto_erase(
            &mut ctx, &mut mem, 0x3000, 2048, 0x2000, out_len as u32, sf::LAST_LEDGER_SEQUENCE,
        );
        assert_eq!(erased_len, txn.len() as i64);
        assert_eq!(&mem[0x3000..0x3000 + txn.len()], &txn[..]);
    }

    #[test]
    fn erase_missing_field() {
        let mut ctx = test_context();
        let mut mem = guest_mem();
        let txn = payment_txn(&OTXN_ACCOUNT);
        let (ptr, len) = stage(&mut mem, 0, &txn);
        assert_eq!(
            sto_erase(&mut ctx, &mut mem, 0x2000, 2048, ptr, len, sf::EMIT_DETAILS),
            codes::DOESNT_EXIST
        );
    }

    #[test]
    fn emplace_size_caps() {
        let mut ctx = test_context();
        let mut mem = vec![0u8; 64 * 1024];
        assert_eq!(
            sto_emplace(&mut ctx, &mut mem, 0, 40000, 0, 20000, 0, 8, sf::FEE),
            codes::TOO_BIG
        );
        assert_eq!(
            sto_emplace(&mut ctx, &mut mem, 0, 10000, 0, 1000, 0, 5000, sf::FEE),
            codes::TOO_BIG
        );
        assert_eq!(
            sto_emplace(&mut ctx, &mut mem, 0, 10, 0, 1000, 0, 8, sf::FEE),
            codes::TOO_SMALL
        );
    }
}
