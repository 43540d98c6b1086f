//! Host-call handlers.
//!
//! One function per guest-visible host call, taking the invocation
//! context and the guest's linear memory. Every handler returns an `i64`
//! ABI value; failures toward the guest are the sentinels of
//! `hook_host_common::codes`, never Rust errors. The wasmtime glue in
//! [`crate::linker`] is a thin shim over these, which keeps the handlers
//! testable against a plain byte buffer.

pub mod control;
pub mod etxn;
pub mod float;
pub mod otxn;
pub mod slot;
pub mod state;
pub mod sto;
pub mod util;

use hook_host_common::codes;

/// Whether `(ptr, len)` reaches past the end of guest memory.
pub(crate) fn not_in_bounds(mem: &[u8], ptr: u32, len: u32) -> bool {
    ptr as u64 + len as u64 > mem.len() as u64
}

/// Borrow `(ptr, len)` out of guest memory. Bounds must be checked
/// first.
pub(crate) fn guest_slice(mem: &[u8], ptr: u32, len: u32) -> &[u8] {
    &mem[ptr as usize..ptr as usize + len as usize]
}

/// Copy `src` into guest memory at `(dst_ptr, dst_len)`, bounded by the
/// shorter of the two, returning the bytes written.
pub(crate) fn write_mem(mem: &mut [u8], dst_ptr: u32, dst_len: u32, src: &[u8]) -> i64 {
    let count = (src.len() as u64).min(dst_len as u64);
    if dst_ptr as u64 + count > mem.len() as u64 {
        return codes::OUT_OF_BOUNDS;
    }
    let dst = dst_ptr as usize;
    mem[dst..dst + count as usize].copy_from_slice(&src[..count as usize]);
    count as i64
}

/// Pack up to eight bytes big-endian into a non-negative i64.
pub(crate) fn data_as_int64(data: &[u8]) -> i64 {
    if data.len() > 8 {
        return codes::TOO_BIG;
    }
    let mut out = 0u64;
    for &b in data {
        out = (out << 8) | b as u64;
    }
    if out & (1u64 << 63) != 0 {
        return codes::TOO_BIG;
    }
    out as i64
}

/// Pack an `(offset, length)` pair the way the `sto_*` lookups return
/// them: offset in the high half, length in the low.
pub(crate) fn pack_offset_len(offset: usize, length: usize) -> i64 {
    ((offset as i64) << 32) + length as u32 as i64
}

#[cfg(test)]
pub(crate) mod testutil {
    use hook_host_codec::{sf, StoBuilder};
    use hook_host_common::{caps, AccountId, Hash256};
    use hook_host_ledger::{entry, keylet, Fees, LedgerView, SharedLedger};

    use crate::config::HookHostConfig;
    use crate::context::HookContext;
    use crate::otxn::OtxnFrame;

    pub const HOOK_ACCOUNT: AccountId = AccountId([0xA1u8; 20]);
    pub const OTXN_ACCOUNT: AccountId = AccountId([0xB2u8; 20]);

    /// A guest memory buffer for handler tests.
    pub fn guest_mem() -> Vec<u8> {
        vec![0u8; 1 << 16]
    }

    /// A payment-shaped originating transaction from `from`.
    pub fn payment_txn(from: &AccountId) -> Vec<u8> {
        let mut b = StoBuilder::new();
        b.u16_field(sf::TRANSACTION_TYPE, 0);
        b.u32_field(sf::SEQUENCE, 4);
        b.amount_drops_field(sf::AMOUNT, 5_000_000);
        b.amount_drops_field(sf::FEE, 12);
        b.vl_field(sf::SIGNING_PUB_KEY, &[3u8; 33]);
        b.account_field(sf::ACCOUNT, from.as_bytes());
        b.account_field(sf::DESTINATION, HOOK_ACCOUNT.as_bytes());
        b.into_bytes()
    }

    /// A ledger seeded with the hook account, its hook entry and a
    /// signer list.
    pub fn seeded_ledger() -> SharedLedger {
        let mut view = LedgerView::new(100, Fees::default());
        view.insert(
            keylet::account(&HOOK_ACCOUNT),
            entry::account_root(&HOOK_ACCOUNT, 100_000_000, 0, 7),
        );
        view.insert(
            keylet::hook(&HOOK_ACCOUNT),
            entry::hook(
                &HOOK_ACCOUNT,
                0,
                0,
                caps::HOOK_STATE_DATA_MAX,
                &Hash256([0x11u8; 32]),
                &Hash256([0x22u8; 32]),
                b"\0asm",
            ),
        );
        view.insert(
            keylet::signers(&HOOK_ACCOUNT),
            entry::signer_list(1, &[(OTXN_ACCOUNT, 1), (AccountId([0xC3u8; 20]), 2)]),
        );
        view.into_shared()
    }

    /// A ready-to-run context over [`seeded_ledger`].
    pub fn test_context() -> HookContext {
        HookContext::new(
            HOOK_ACCOUNT,
            Hash256([0x11u8; 32]),
            Hash256([0x22u8; 32]),
            OtxnFrame::new(payment_txn(&OTXN_ACCOUNT)),
            seeded_ledger(),
            HookHostConfig::default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_check() {
        let mem = vec![0u8; 16];
        assert!(!not_in_bounds(&mem, 0, 16));
        assert!(not_in_bounds(&mem, 1, 16));
        assert!(not_in_bounds(&mem, u32::MAX, 2));
    }

    #[test]
    fn bounded_write() {
        let mut mem = vec![0u8; 8];
        assert_eq!(write_mem(&mut mem, 2, 4, b"abcdef"), 4);
        assert_eq!(&mem[2..6], b"abcd");
        assert_eq!(write_mem(&mut mem, 7, 4, b"zz"), codes::OUT_OF_BOUNDS);
    }

    #[test]
    fn int64_packing() {
        assert_eq!(data_as_int64(&[0, 0, 1, 0]), 256);
        assert_eq!(data_as_int64(&[]), 0);
        assert_eq!(data_as_int64(&[1; 9]), codes::TOO_BIG);
        assert_eq!(data_as_int64(&[0x80, 0, 0, 0, 0, 0, 0, 0]), codes::TOO_BIG);
    }

    #[test]
    fn offset_len_packing() {
        let packed = pack_offset_len(5, 9);
        assert_eq!(packed >> 32, 5);
        assert_eq!(packed & 0xFFFF_FFFF, 9);
    }
}
