//! The originating transaction, viewed through the codec.
//!
//! The host never re-parses the transaction into a tree; every access
//! scans the serialized form on demand. Burden and generation derive from
//! the EmitDetails object when the transaction was itself emitted.

use std::sync::Arc;

use hook_host_codec::{find_field, sf, ParsedField};
use hook_host_common::Hash256;
use hook_host_crypto::sha512h_parts;

/// Hash prefix for transaction ids.
const TXN_ID_PREFIX: [u8; 4] = *b"TXN\0";

/// An immutable view over the serialized originating transaction.
#[derive(Debug, Clone)]
pub struct OtxnFrame {
    bytes: Arc<[u8]>,
    id: Hash256,
}

impl OtxnFrame {
    pub fn new(serialized: Vec<u8>) -> Self {
        let id = txn_id(&serialized);
        Self {
            bytes: serialized.into(),
            id,
        }
    }

    /// The transaction id.
    pub fn id(&self) -> Hash256 {
        self.id
    }

    /// The serialized form.
    pub fn bytes(&self) -> &Arc<[u8]> {
        &self.bytes
    }

    /// The numeric transaction type, when present.
    pub fn txn_type(&self) -> Option<u16> {
        let field = self.field(sf::TRANSACTION_TYPE)?;
        let payload = &self.bytes[field.payload_start..field.payload_start + field.payload_len];
        Some(u16::from_be_bytes(payload.try_into().ok()?))
    }

    /// Locate a top-level field.
    pub fn field(&self, field_id: u32) -> Option<ParsedField> {
        find_field(&self.bytes, field_id).ok()?
    }

    /// Whether this transaction carries EmitDetails, i.e. was itself
    /// emitted by a hook.
    pub fn is_emitted(&self) -> bool {
        self.field(sf::EMIT_DETAILS).is_some()
    }

    /// A field of the EmitDetails object, as raw payload bytes.
    fn emit_details_field(&self, field_id: u32) -> Option<Vec<u8>> {
        let details = self.field(sf::EMIT_DETAILS)?;
        let inner = &self.bytes[details.payload_start..details.payload_start + details.payload_len];
        let field = find_field(inner, field_id).ok()??;
        Some(inner[field.payload_start..field.payload_start + field.payload_len].to_vec())
    }

    /// The burden of this transaction: 1 unless emitted, in which case
    /// the EmitBurden value with the top bit cleared.
    pub fn burden(&self) -> u64 {
        let Some(payload) = self.emit_details_field(sf::EMIT_BURDEN) else {
            return 1;
        };
        let Ok(raw) = <[u8; 8]>::try_from(payload.as_slice()) else {
            return 1;
        };
        u64::from_be_bytes(raw) & ((1u64 << 63) - 1)
    }

    /// The generation of this transaction: 1 unless emitted, in which
    /// case one past the stored EmitGeneration.
    pub fn generation(&self) -> u32 {
        let Some(payload) = self.emit_details_field(sf::EMIT_GENERATION) else {
            return 1;
        };
        let Ok(raw) = <[u8; 4]>::try_from(payload.as_slice()) else {
            return 1;
        };
        u32::from_be_bytes(raw).saturating_add(1)
    }
}

/// Compute a transaction id: SHA-512-half over the prefixed serialization.
pub fn txn_id(serialized: &[u8]) -> Hash256 {
    Hash256(sha512h_parts(&[&TXN_ID_PREFIX, serialized]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hook_host_codec::StoBuilder;

    fn plain_txn() -> OtxnFrame {
        let mut b = StoBuilder::new();
        b.u16_field(sf::TRANSACTION_TYPE, 0);
        b.u32_field(sf::SEQUENCE, 5);
        b.account_field(sf::ACCOUNT, &[7u8; 20]);
        OtxnFrame::new(b.into_bytes())
    }

    fn emitted_txn(generation: u32, burden: u64) -> OtxnFrame {
        let mut b = StoBuilder::new();
        b.u16_field(sf::TRANSACTION_TYPE, 0);
        b.u32_field(sf::SEQUENCE, 0);
        b.account_field(sf::ACCOUNT, &[7u8; 20]);
        b.begin_object(sf::EMIT_DETAILS);
        b.u32_field(sf::EMIT_GENERATION, generation);
        b.u64_field(sf::EMIT_BURDEN, burden);
        b.hash256_field(sf::EMIT_PARENT_TXN_ID, &[1u8; 32]);
        b.hash256_field(sf::EMIT_NONCE, &[2u8; 32]);
        b.account_field(sf::EMIT_CALLBACK, &[7u8; 20]);
        b.end_object();
        OtxnFrame::new(b.into_bytes())
    }

    #[test]
    fn id_is_deterministic_and_prefixed() {
        let a = plain_txn();
        let b = plain_txn();
        assert_eq!(a.id(), b.id());
        assert_ne!(a.id().as_bytes(), &[0u8; 32]);
        assert_ne!(a.id(), emitted_txn(1, 1).id());
    }

    #[test]
    fn plain_txn_lineage_defaults() {
        let txn = plain_txn();
        assert!(!txn.is_emitted());
        assert_eq!(txn.burden(), 1);
        assert_eq!(txn.generation(), 1);
        assert_eq!(txn.txn_type(), Some(0));
    }

    #[test]
    fn emitted_txn_lineage() {
        let txn = emitted_txn(3, 12);
        assert!(txn.is_emitted());
        assert_eq!(txn.generation(), 4);
        assert_eq!(txn.burden(), 12);
    }

    #[test]
    fn burden_top_bit_is_cleared() {
        let txn = emitted_txn(1, (1u64 << 63) | 9);
        assert_eq!(txn.burden(), 9);
    }
}
