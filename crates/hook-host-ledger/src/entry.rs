//! Serialized ledger entry constructors and field accessors.
//!
//! Entries live in the view as their serialized bytes; the codec provides
//! the structure. Constructors append fields in canonical order.

use hook_host_codec::{sf, subfield, StoBuilder};
use hook_host_common::{AccountId, Hash256};

use crate::keylet::lt;

/// Read a u32 field from a serialized entry.
pub fn read_u32(entry: &[u8], field: u32) -> Option<u32> {
    let (off, len) = subfield(entry, field).ok()??;
    if len != 4 {
        return None;
    }
    Some(u32::from_be_bytes(entry[off..off + 4].try_into().ok()?))
}

/// Read a u64 field from a serialized entry.
pub fn read_u64(entry: &[u8], field: u32) -> Option<u64> {
    let (off, len) = subfield(entry, field).ok()??;
    if len != 8 {
        return None;
    }
    Some(u64::from_be_bytes(entry[off..off + 8].try_into().ok()?))
}

/// Read a 256-bit hash field from a serialized entry.
pub fn read_h256(entry: &[u8], field: u32) -> Option<Hash256> {
    let (off, len) = subfield(entry, field).ok()??;
    if len != 32 {
        return None;
    }
    Hash256::from_slice(&entry[off..off + 32])
}

/// Read a VL blob field from a serialized entry.
pub fn read_vl(entry: &[u8], field: u32) -> Option<Vec<u8>> {
    let (off, len) = subfield(entry, field).ok()??;
    Some(entry[off..off + len].to_vec())
}

/// Read an account field from a serialized entry.
pub fn read_account(entry: &[u8], field: u32) -> Option<AccountId> {
    let (off, len) = subfield(entry, field).ok()??;
    if len != 20 {
        return None;
    }
    AccountId::from_slice(&entry[off..off + 20])
}

/// Read the drops of a native balance field.
pub fn read_drops(entry: &[u8], field: u32) -> Option<u64> {
    let (off, len) = subfield(entry, field).ok()??;
    if len != 8 {
        return None;
    }
    let raw = u64::from_be_bytes(entry[off..off + 8].try_into().ok()?);
    Some(raw & ((1u64 << 62) - 1))
}

/// Build an account root entry.
pub fn account_root(account: &AccountId, balance_drops: u64, owner_count: u32, sequence: u32) -> Vec<u8> {
    let mut b = StoBuilder::new();
    b.u16_field(sf::LEDGER_ENTRY_TYPE, lt::ACCOUNT_ROOT);
    b.u32_field(sf::SEQUENCE, sequence);
    b.u32_field(sf::OWNER_COUNT, owner_count);
    b.amount_drops_field(sf::BALANCE, balance_drops);
    b.account_field(sf::ACCOUNT, account.as_bytes());
    b.into_bytes()
}

/// Build a hook definition entry.
pub fn hook(
    account: &AccountId,
    hook_on: u64,
    state_count: u32,
    state_data_max: u32,
    hook_hash: &Hash256,
    hook_set_txn_id: &Hash256,
    code: &[u8],
) -> Vec<u8> {
    let mut b = StoBuilder::new();
    b.u16_field(sf::LEDGER_ENTRY_TYPE, lt::HOOK);
    b.u32_field(sf::HOOK_STATE_COUNT, state_count);
    b.u32_field(sf::HOOK_STATE_DATA_MAX_SIZE, state_data_max);
    b.u64_field(sf::HOOK_ON, hook_on);
    b.hash256_field(sf::HOOK_HASH, hook_hash.as_bytes());
    b.hash256_field(sf::HOOK_SET_TXN_ID, hook_set_txn_id.as_bytes());
    b.vl_field(sf::CREATE_CODE, code);
    b.account_field(sf::ACCOUNT, account.as_bytes());
    b.into_bytes()
}

/// Build a hook state entry.
pub fn hook_state(owner: &AccountId, key: &Hash256, data: &[u8], owner_node: u64) -> Vec<u8> {
    let mut b = StoBuilder::new();
    b.u16_field(sf::LEDGER_ENTRY_TYPE, lt::HOOK_STATE);
    b.u64_field(sf::OWNER_NODE, owner_node);
    b.hash256_field(sf::HOOK_STATE_KEY, key.as_bytes());
    b.vl_field(sf::HOOK_STATE_DATA, data);
    b.account_field(sf::ACCOUNT, owner.as_bytes());
    b.into_bytes()
}

/// Build a signer list entry.
pub fn signer_list(quorum: u32, signers: &[(AccountId, u16)]) -> Vec<u8> {
    let mut b = StoBuilder::new();
    b.u16_field(sf::LEDGER_ENTRY_TYPE, lt::SIGNER_LIST);
    b.u32_field(sf::SIGNER_QUORUM, quorum);
    b.begin_array(sf::SIGNER_ENTRIES);
    for (account, weight) in signers {
        b.begin_object(sf::SIGNER_ENTRY);
        b.u16_field(sf::SIGNER_WEIGHT, *weight);
        b.account_field(sf::ACCOUNT, account.as_bytes());
        b.end_object();
    }
    b.end_array();
    b.into_bytes()
}

/// Build an emitted-transaction holder entry.
pub fn emitted_txn(txn: &[u8], owner_node: u64) -> Vec<u8> {
    let mut b = StoBuilder::new();
    b.u16_field(sf::LEDGER_ENTRY_TYPE, lt::EMITTED_TXN);
    b.u64_field(sf::OWNER_NODE, owner_node);
    b.begin_object(sf::EMITTED_TXN);
    b.raw_field(txn);
    b.end_object();
    b.into_bytes()
}

/// Build a directory node holding the given keys.
pub fn directory(keys: &[Hash256], owner_node: u64) -> Vec<u8> {
    let mut b = StoBuilder::new();
    b.u16_field(sf::LEDGER_ENTRY_TYPE, lt::DIR_NODE);
    b.u64_field(sf::OWNER_NODE, owner_node);
    let mut joined = Vec::with_capacity(keys.len() * 32);
    for key in keys {
        joined.extend_from_slice(key.as_bytes());
    }
    b.vl_field(sf::INDEXES, &joined);
    b.into_bytes()
}

/// Read the keys held by a directory node.
pub fn directory_keys(entry: &[u8]) -> Vec<Hash256> {
    let Some(joined) = read_vl(entry, sf::INDEXES) else {
        return Vec::new();
    };
    joined
        .chunks_exact(32)
        .filter_map(Hash256::from_slice)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hook_host_codec::validate;

    #[test]
    fn account_root_round_trip() {
        let acc = AccountId([3u8; 20]);
        let entry = account_root(&acc, 25_000_000, 2, 11);
        assert!(validate(&entry));
        assert_eq!(read_u32(&entry, sf::SEQUENCE), Some(11));
        assert_eq!(read_u32(&entry, sf::OWNER_COUNT), Some(2));
        assert_eq!(read_drops(&entry, sf::BALANCE), Some(25_000_000));
        assert_eq!(read_account(&entry, sf::ACCOUNT), Some(acc));
    }

    #[test]
    fn hook_entry_round_trip() {
        let acc = AccountId([4u8; 20]);
        let hash = Hash256([5u8; 32]);
        let set_id = Hash256([6u8; 32]);
        let entry = hook(&acc, 0, 3, 128, &hash, &set_id, b"\0asm");
        assert!(validate(&entry));
        assert_eq!(read_u32(&entry, sf::HOOK_STATE_COUNT), Some(3));
        assert_eq!(read_u32(&entry, sf::HOOK_STATE_DATA_MAX_SIZE), Some(128));
        assert_eq!(read_h256(&entry, sf::HOOK_HASH), Some(hash));
        assert_eq!(read_vl(&entry, sf::CREATE_CODE).as_deref(), Some(&b"\0asm"[..]));
    }

    #[test]
    fn hook_state_round_trip() {
        let acc = AccountId([7u8; 20]);
        let key = Hash256([8u8; 32]);
        let entry = hook_state(&acc, &key, &[1, 2, 3], 0);
        assert!(validate(&entry));
        assert_eq!(read_h256(&entry, sf::HOOK_STATE_KEY), Some(key));
        assert_eq!(read_vl(&entry, sf::HOOK_STATE_DATA).as_deref(), Some(&[1u8, 2, 3][..]));
    }

    #[test]
    fn directory_round_trip() {
        let keys = vec![Hash256([1u8; 32]), Hash256([2u8; 32])];
        let entry = directory(&keys, 0);
        assert!(validate(&entry));
        assert_eq!(directory_keys(&entry), keys);
    }

    #[test]
    fn signer_list_structure() {
        let entry = signer_list(2, &[(AccountId([1u8; 20]), 1), (AccountId([2u8; 20]), 1)]);
        assert!(validate(&entry));
        let (off, len) = subfield(&entry, sf::SIGNER_ENTRIES).unwrap().unwrap();
        // fully wrapped array
        assert_eq!(entry[off + len - 1], 0xF1);
    }
}
