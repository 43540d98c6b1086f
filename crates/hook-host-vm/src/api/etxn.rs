//! Emission calls.

use tracing::trace;

use hook_host_common::{caps, codes};

use super::{guest_slice, not_in_bounds, write_mem};
use crate::context::{EmittedTxn, HookContext};
use crate::emit::{self, validate_emitted};

/// Reserve emission capacity for this invocation. One-shot.
pub fn etxn_reserve(ctx: &mut HookContext, count: u32) -> i64 {
    if ctx.expected_etxn_count > -1 {
        return codes::ALREADY_SET;
    }
    if count > caps::MAX_EMIT {
        return codes::TOO_BIG;
    }
    ctx.expected_etxn_count = count as i64;
    count as i64
}

/// Burden emitted transactions must carry.
pub fn etxn_burden(ctx: &mut HookContext) -> i64 {
    match emit::etxn_burden(ctx) {
        Ok(burden) => burden as i64,
        Err(code) => code,
    }
}

/// Generation emitted transactions must carry.
pub fn etxn_generation(ctx: &mut HookContext) -> i64 {
    emit::etxn_generation(ctx) as i64
}

/// Fee floor for an emitted transaction of the given byte count.
pub fn etxn_fee_base(ctx: &mut HookContext, tx_byte_count: u32) -> i64 {
    match emit::etxn_fee_base(ctx, tx_byte_count) {
        Ok(fee) => fee as i64,
        Err(code) => code,
    }
}

/// Write the canonical EmitDetails object for this invocation into guest
/// memory. Always `caps::ETXN_DETAILS_LEN` bytes.
pub fn etxn_details(ctx: &mut HookContext, mem: &mut [u8], write_ptr: u32, write_len: u32) -> i64 {
    if not_in_bounds(mem, write_ptr, write_len) {
        return codes::OUT_OF_BOUNDS;
    }
    if (write_len as usize) < caps::ETXN_DETAILS_LEN {
        return codes::TOO_SMALL;
    }
    if ctx.expected_etxn_count <= -1 {
        return codes::PREREQUISITE_NOT_MET;
    }

    let generation = emit::etxn_generation(ctx);
    let burden = match emit::etxn_burden(ctx) {
        Ok(burden) if burden >= 1 => burden,
        Ok(_) => return codes::FEE_TOO_LARGE,
        Err(code) => return code,
    };
    let Some(nonce) = ctx.next_nonce() else {
        return codes::TOO_MANY_NONCES;
    };

    let mut out = Vec::with_capacity(caps::ETXN_DETAILS_LEN);
    out.push(0xEC); // EmitDetails object
    out.push(0x20); // EmitGeneration
    out.push(0x2B);
    out.extend_from_slice(&generation.to_be_bytes());
    out.push(0x3C); // EmitBurden
    out.extend_from_slice(&burden.to_be_bytes());
    out.push(0x5A); // EmitParentTxnID
    out.extend_from_slice(ctx.otxn.id().as_bytes());
    out.push(0x5B); // EmitNonce
    out.extend_from_slice(nonce.as_bytes());
    out.push(0x89); // EmitCallback, VL-prefixed account
    out.push(0x14);
    out.extend_from_slice(ctx.hook_account.as_bytes());
    out.push(0xE1); // end object

    debug_assert_eq!(out.len(), caps::ETXN_DETAILS_LEN);
    write_mem(mem, write_ptr, write_len, &out)
}

/// Validate and enqueue an emitted transaction. Returns the byte length
/// on success.
pub fn emit(ctx: &mut HookContext, mem: &mut [u8], read_ptr: u32, read_len: u32) -> i64 {
    if not_in_bounds(mem, read_ptr, read_len) {
        return codes::OUT_OF_BOUNDS;
    }
    if ctx.expected_etxn_count < 0 {
        return codes::PREREQUISITE_NOT_MET;
    }
    if ctx.emitted.len() as i64 >= ctx.expected_etxn_count {
        return codes::TOO_MANY_EMITTED_TXN;
    }

    let blob = guest_slice(mem, read_ptr, read_len).to_vec();
    let id = match validate_emitted(ctx, &blob) {
        Ok(id) => id,
        Err(code) => return code,
    };
    trace!(account = %ctx.hook_account, txn = %id, "hook emits txn");
    ctx.emitted.push(EmittedTxn {
        id,
        serialized: blob,
    });
    read_len as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testutil::{guest_mem, test_context, HOOK_ACCOUNT};
    use hook_host_codec::{sf, StoBuilder};
    use hook_host_common::Hash256;

    #[test]
    fn reserve_is_one_shot_and_capped() {
        let mut ctx = test_context();
        assert_eq!(etxn_reserve(&mut ctx, 300), codes::TOO_BIG);
        assert_eq!(etxn_reserve(&mut ctx, 2), 2);
        assert_eq!(etxn_reserve(&mut ctx, 1), codes::ALREADY_SET);
    }

    #[test]
    fn details_layout() {
        let mut ctx = test_context();
        let mut mem = guest_mem();
        assert_eq!(
            etxn_details(&mut ctx, &mut mem, 0, 200),
            codes::PREREQUISITE_NOT_MET
        );
        etxn_reserve(&mut ctx, 1);
        let written = etxn_details(&mut ctx, &mut mem, 0, 200);
        assert_eq!(written, hook_host_common::caps::ETXN_DETAILS_LEN as i64);

        let details = &mem[..written as usize];
        assert_eq!(details[0], 0xEC);
        assert_eq!(details[written as usize - 1], 0xE1);
        // generation = otxn generation + 1 = 2
        assert_eq!(&details[3..7], &2u32.to_be_bytes());
        // burden = 1
        assert_eq!(&details[8..16], &1u64.to_be_bytes());
        // parent txn id
        assert_eq!(&details[17..49], ctx.otxn.id().as_bytes());
        // nonce was registered
        let nonce = Hash256::from_slice(&details[50..82]).unwrap();
        assert!(ctx.nonces_used.contains(&nonce));
        // callback account
        assert_eq!(&details[84..104], HOOK_ACCOUNT.as_bytes());

        // the inner object parses under the codec
        let parsed = hook_host_codec::parse_field_at(details, 0).unwrap();
        assert_eq!(parsed.field_id(), sf::EMIT_DETAILS);
        assert_eq!(parsed.end, details.len());

        assert_eq!(etxn_details(&mut ctx, &mut mem, 0, 100), codes::TOO_SMALL);
    }

    fn emitted_blob(ctx: &mut HookContext, mem: &mut [u8]) -> Vec<u8> {
        // build EmitDetails through the host call, then embed it in a txn
        let w = etxn_details(ctx, mem, 0x1000, 200);
        assert!(w > 0);
        let details = mem[0x1000..0x1000 + w as usize].to_vec();

        let mut b = StoBuilder::new();
        b.u16_field(sf::TRANSACTION_TYPE, 0);
        b.u32_field(sf::SEQUENCE, 0);
        b.u32_field(sf::FIRST_LEDGER_SEQUENCE, 101);
        b.u32_field(sf::LAST_LEDGER_SEQUENCE, 110);
        b.amount_drops_field(sf::FEE, 50_000_000);
        b.vl_field(sf::SIGNING_PUB_KEY, &[0u8; 33]);
        b.account_field(sf::ACCOUNT, HOOK_ACCOUNT.as_bytes());
        b.raw_field(&details);
        b.into_bytes()
    }

    #[test]
    fn emit_enqueues_validated_txn() {
        let mut ctx = test_context();
        let mut mem = guest_mem();
        etxn_reserve(&mut ctx, 1);
        let blob = emitted_blob(&mut ctx, &mut mem);
        mem[0x2000..0x2000 + blob.len()].copy_from_slice(&blob);

        let result = emit(&mut ctx, &mut mem, 0x2000, blob.len() as u32);
        assert_eq!(result, blob.len() as i64);
        assert_eq!(ctx.emitted.len(), 1);
        assert_eq!(ctx.emitted[0].id, crate::otxn::txn_id(&blob));

        // reservation exhausted
        let again = emit(&mut ctx, &mut mem, 0x2000, blob.len() as u32);
        assert_eq!(again, codes::TOO_MANY_EMITTED_TXN);
    }

    #[test]
    fn emit_requires_reservation() {
        let mut ctx = test_context();
        let mut mem = guest_mem();
        assert_eq!(emit(&mut ctx, &mut mem, 0, 16), codes::PREREQUISITE_NOT_MET);
    }

    #[test]
    fn emit_rejects_malformed() {
        let mut ctx = test_context();
        let mut mem = guest_mem();
        etxn_reserve(&mut ctx, 1);
        mem[0..4].copy_from_slice(&[0x91, 0, 0, 0]);
        assert_eq!(emit(&mut ctx, &mut mem, 0, 4), codes::EMISSION_FAILURE);
    }

    #[test]
    fn fee_base_requires_reservation_then_scales() {
        let mut ctx = test_context();
        assert_eq!(etxn_fee_base(&mut ctx, 100), codes::PREREQUISITE_NOT_MET);
        etxn_reserve(&mut ctx, 1);
        let fee = etxn_fee_base(&mut ctx, 100);
        assert!(fee > 0);
        assert_eq!(etxn_burden(&mut ctx), 1);
        assert_eq!(etxn_generation(&mut ctx), 2);
    }
}
