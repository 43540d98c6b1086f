//! Emitted-transaction validation and fee arithmetic.
//!
//! A hook emits fully formed serialized transactions; the host never
//! repairs them, it only checks them. The seven shape rules live in
//! [`validate_emitted`]; the burden/fee derivations are shared with the
//! `etxn_*` host calls.

use tracing::trace;

use hook_host_codec::sf;
use hook_host_common::{codes, AccountId, Hash256};
use hook_host_ledger::entry::{read_account, read_drops, read_h256, read_u32};

use crate::context::HookContext;
use crate::otxn::txn_id;

/// Generation a transaction emitted by this invocation must carry.
pub fn etxn_generation(ctx: &mut HookContext) -> u32 {
    ctx.otxn_generation().saturating_add(1)
}

/// Burden a transaction emitted by this invocation must carry:
/// the originating burden multiplied by the emission reservation.
pub fn etxn_burden(ctx: &mut HookContext) -> Result<u64, i64> {
    if ctx.expected_etxn_count < 0 {
        return Err(codes::PREREQUISITE_NOT_MET);
    }
    let last = ctx.otxn_burden();
    last.checked_mul(ctx.expected_etxn_count as u64)
        .ok_or(codes::FEE_TOO_LARGE)
}

/// The fee base hooks see: ledger base fee with the host margin.
pub fn fee_base(ctx: &HookContext) -> u64 {
    let base = ctx.ledger.read().fees().base_fee;
    ctx.config.fee_base(base)
}

/// Fee floor for an emitted transaction of `byte_count` bytes. Caches the
/// burden-scaled fee base on the context.
pub fn etxn_fee_base(ctx: &mut HookContext, byte_count: u32) -> Result<u64, i64> {
    if ctx.expected_etxn_count < 0 {
        return Err(codes::PREREQUISITE_NOT_MET);
    }
    let burden = etxn_burden(ctx)?;
    if burden < 1 {
        return Err(codes::FEE_TOO_LARGE);
    }
    let fee = fee_base(ctx)
        .checked_mul(burden)
        .ok_or(codes::FEE_TOO_LARGE)?;
    // reject fees that could not survive the per-byte multiplication
    if fee & (3u64 << 62) != 0 {
        return Err(codes::FEE_TOO_LARGE);
    }
    ctx.fee_base = fee;

    fee.checked_mul(ctx.config.drops_per_byte)
        .and_then(|f| f.checked_mul(byte_count as u64))
        .ok_or(codes::FEE_TOO_LARGE)
}

/// Minimum fee an emitted transaction of `byte_count` bytes must pay.
fn min_fee(ctx: &mut HookContext, byte_count: usize) -> Result<u64, i64> {
    if ctx.fee_base == 0 {
        let burden = etxn_burden(ctx).map_err(|_| codes::EMISSION_FAILURE)?;
        ctx.fee_base = fee_base(ctx)
            .checked_mul(burden)
            .ok_or(codes::EMISSION_FAILURE)?;
    }
    ctx.fee_base
        .checked_mul(ctx.config.drops_per_byte)
        .and_then(|f| f.checked_mul(byte_count as u64))
        .ok_or(codes::EMISSION_FAILURE)
}

macro_rules! fail_emit {
    ($ctx:expr, $($why:tt)*) => {{
        trace!(account = %$ctx.hook_account, $($why)*);
        return Err(codes::EMISSION_FAILURE);
    }};
}

/// Check an emitted transaction against the seven shape rules. Returns
/// its transaction id when acceptable.
pub fn validate_emitted(ctx: &mut HookContext, blob: &[u8]) -> Result<Hash256, i64> {
    if !hook_host_codec::validate(blob) {
        fail_emit!(ctx, "emitted txn does not parse");
    }

    // rule 1: Sequence present and zero
    match read_u32(blob, sf::SEQUENCE) {
        Some(0) => {}
        _ => fail_emit!(ctx, "Sequence missing or non-zero"),
    }

    // rule 2: SigningPubKey present, empty or 33 zero bytes
    let Some(pubkey) = hook_host_ledger::entry::read_vl(blob, sf::SIGNING_PUB_KEY) else {
        fail_emit!(ctx, "SigningPubKey missing");
    };
    if !pubkey.is_empty() && pubkey.len() != 33 {
        fail_emit!(ctx, "SigningPubKey present but wrong size");
    }
    if pubkey.iter().any(|&b| b != 0) {
        fail_emit!(ctx, "SigningPubKey present but non-zero");
    }

    // rule 3: EmitDetails present and consistent with this invocation
    let Some(details) = ctx.emit_details_of(blob) else {
        fail_emit!(ctx, "EmitDetails missing");
    };
    let (generation, burden, parent, nonce, callback) = details;

    let expected_generation = etxn_generation(ctx);
    if generation != expected_generation {
        fail_emit!(
            ctx,
            generation,
            expected_generation,
            "EmitGeneration incorrect"
        );
    }
    let expected_burden = etxn_burden(ctx).map_err(|_| codes::EMISSION_FAILURE)?;
    if burden != expected_burden {
        fail_emit!(ctx, burden, expected_burden, "EmitBurden incorrect");
    }
    if parent != ctx.otxn.id() {
        fail_emit!(ctx, "EmitParentTxnID is not the originating txn id");
    }
    if !ctx.nonces_used.contains(&nonce) {
        fail_emit!(ctx, "EmitNonce was not produced by the nonce api");
    }
    if callback != ctx.hook_account {
        fail_emit!(ctx, "EmitCallback must be the emitting hook account");
    }

    // rule 4: no signature
    if hook_host_codec::subfield(blob, sf::SIGNATURE)
        .ok()
        .flatten()
        .is_some()
    {
        fail_emit!(ctx, "Signature present but must not be");
    }

    // rules 5 and 6: ledger sequence window
    let current_seq = ctx.ledger.read().seq() + 1;
    let Some(last_ledger_seq) = read_u32(blob, sf::LAST_LEDGER_SEQUENCE) else {
        fail_emit!(ctx, "LastLedgerSequence missing");
    };
    if last_ledger_seq < current_seq + 1 {
        fail_emit!(ctx, last_ledger_seq, current_seq, "LastLedgerSequence too low");
    }
    match read_u32(blob, sf::FIRST_LEDGER_SEQUENCE) {
        Some(first) if first <= last_ledger_seq => {}
        _ => fail_emit!(ctx, "FirstLedgerSequence missing or after LastLedgerSequence"),
    }

    // rule 7: fee floor
    let floor = min_fee(ctx, blob.len())?;
    let Some(fee) = read_drops(blob, sf::FEE) else {
        fail_emit!(ctx, "Fee missing or not native");
    };
    if fee < floor {
        fail_emit!(ctx, fee, floor, "Fee below the emission floor");
    }

    Ok(txn_id(blob))
}

impl HookContext {
    /// Pull the five mandatory EmitDetails fields out of a candidate
    /// emitted transaction.
    fn emit_details_of(
        &self,
        blob: &[u8],
    ) -> Option<(u32, u64, Hash256, Hash256, AccountId)> {
        let details = hook_host_codec::find_field(blob, sf::EMIT_DETAILS).ok()??;
        let inner = &blob[details.payload_start..details.payload_start + details.payload_len];
        Some((
            read_u32(inner, sf::EMIT_GENERATION)?,
            hook_host_ledger::entry::read_u64(inner, sf::EMIT_BURDEN)?,
            read_h256(inner, sf::EMIT_PARENT_TXN_ID)?,
            read_h256(inner, sf::EMIT_NONCE)?,
            read_account(inner, sf::EMIT_CALLBACK)?,
        ))
    }
}
