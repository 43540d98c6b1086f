//! Field identifiers.
//!
//! A field id packs the serialized type code into the high 16 bits and the
//! field code into the low 16 bits, matching the ABI's `field_id`
//! arguments.

/// Serialized type codes.
pub mod types {
    pub const UINT16: u8 = 1;
    pub const UINT32: u8 = 2;
    pub const UINT64: u8 = 3;
    pub const UINT128: u8 = 4;
    pub const UINT256: u8 = 5;
    pub const AMOUNT: u8 = 6;
    pub const BLOB: u8 = 7;
    pub const ACCOUNT: u8 = 8;
    pub const OBJECT: u8 = 14;
    pub const ARRAY: u8 = 15;
    pub const UINT8: u8 = 16;
    pub const UINT160: u8 = 17;
    pub const VL1: u8 = 18;
    pub const VL2: u8 = 19;

    /// Object terminator byte.
    pub const OBJECT_END: u8 = 0xE1;
    /// Array terminator byte.
    pub const ARRAY_END: u8 = 0xF1;

    /// Whether the type carries a variable-length prefix.
    pub fn is_vl(type_code: u8) -> bool {
        matches!(type_code, BLOB | ACCOUNT | VL1 | VL2)
    }

    /// Payload width of fixed-width types.
    pub fn fixed_len(type_code: u8) -> Option<usize> {
        match type_code {
            UINT16 => Some(2),
            UINT32 => Some(4),
            UINT64 => Some(8),
            UINT128 => Some(16),
            UINT256 => Some(32),
            UINT8 => Some(1),
            UINT160 => Some(20),
            _ => None,
        }
    }

    /// Whether the code names a known serialized type.
    pub fn is_known(type_code: u8) -> bool {
        matches!(type_code, 1..=8 | 14..=19)
    }
}

/// Pack a `(type, field)` pair into a field id.
pub const fn field_id(type_code: u8, field_code: u8) -> u32 {
    ((type_code as u32) << 16) | field_code as u32
}

/// Extract the type code of a field id.
pub const fn type_code(id: u32) -> u8 {
    (id >> 16) as u8
}

/// Extract the field code of a field id.
pub const fn field_code(id: u32) -> u8 {
    id as u8
}

/// The field table, i.e. the subset of the ledger's field dictionary the
/// hook host reads or writes.
pub mod sf {
    use super::field_id;

    // 16-bit integers
    pub const LEDGER_ENTRY_TYPE: u32 = field_id(1, 1);
    pub const TRANSACTION_TYPE: u32 = field_id(1, 2);
    pub const SIGNER_WEIGHT: u32 = field_id(1, 3);
    pub const HOOK_EMIT_COUNT: u32 = field_id(1, 16);
    pub const HOOK_EXECUTION_INDEX: u32 = field_id(1, 17);
    pub const HOOK_STATE_CHANGE_COUNT: u32 = field_id(1, 18);

    // 32-bit integers
    pub const FLAGS: u32 = field_id(2, 2);
    pub const SEQUENCE: u32 = field_id(2, 4);
    pub const OWNER_COUNT: u32 = field_id(2, 19);
    pub const FIRST_LEDGER_SEQUENCE: u32 = field_id(2, 26);
    pub const LAST_LEDGER_SEQUENCE: u32 = field_id(2, 27);
    pub const SIGNER_QUORUM: u32 = field_id(2, 35);
    pub const EMIT_GENERATION: u32 = field_id(2, 43);
    pub const HOOK_STATE_COUNT: u32 = field_id(2, 45);
    pub const HOOK_STATE_DATA_MAX_SIZE: u32 = field_id(2, 46);

    // 64-bit integers
    pub const OWNER_NODE: u32 = field_id(3, 4);
    pub const EMIT_BURDEN: u32 = field_id(3, 12);
    pub const HOOK_ON: u32 = field_id(3, 16);
    pub const HOOK_INSTRUCTION_COUNT: u32 = field_id(3, 17);
    pub const HOOK_RETURN_CODE: u32 = field_id(3, 18);

    // 256-bit hashes
    pub const EMIT_PARENT_TXN_ID: u32 = field_id(5, 10);
    pub const EMIT_NONCE: u32 = field_id(5, 11);
    pub const HOOK_STATE_KEY: u32 = field_id(5, 30);
    pub const HOOK_HASH: u32 = field_id(5, 31);
    pub const HOOK_SET_TXN_ID: u32 = field_id(5, 32);

    // amounts
    pub const AMOUNT: u32 = field_id(6, 1);
    pub const BALANCE: u32 = field_id(6, 2);
    pub const FEE: u32 = field_id(6, 8);

    // variable-length blobs
    pub const SIGNING_PUB_KEY: u32 = field_id(7, 3);
    pub const TXN_SIGNATURE: u32 = field_id(7, 4);
    pub const SIGNATURE: u32 = field_id(7, 6);
    pub const CREATE_CODE: u32 = field_id(7, 11);
    pub const HOOK_STATE_DATA: u32 = field_id(7, 22);
    pub const HOOK_RETURN_STRING: u32 = field_id(7, 23);

    // accounts
    pub const ACCOUNT: u32 = field_id(8, 1);
    pub const DESTINATION: u32 = field_id(8, 3);
    pub const EMIT_CALLBACK: u32 = field_id(8, 9);
    pub const HOOK_ACCOUNT: u32 = field_id(8, 10);

    // objects
    pub const SIGNER_ENTRY: u32 = field_id(14, 11);
    pub const EMIT_DETAILS: u32 = field_id(14, 12);
    pub const HOOK_EXECUTION: u32 = field_id(14, 13);
    pub const EMITTED_TXN: u32 = field_id(14, 14);

    // arrays
    pub const SIGNER_ENTRIES: u32 = field_id(15, 4);

    // 8-bit integers
    pub const HOOK_RESULT: u32 = field_id(16, 16);

    // 256-bit vectors (VL-encoded)
    pub const INDEXES: u32 = field_id(19, 1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_id_packing() {
        assert_eq!(field_id(2, 4), 0x0002_0004);
        assert_eq!(type_code(sf::SEQUENCE), 2);
        assert_eq!(field_code(sf::SEQUENCE), 4);
    }

    #[test]
    fn emit_details_codes_match_wire_layout() {
        // fixed by the canonical EmitDetails byte layout
        assert_eq!(sf::EMIT_DETAILS, field_id(14, 12));
        assert_eq!(sf::EMIT_GENERATION, field_id(2, 43));
        assert_eq!(sf::EMIT_BURDEN, field_id(3, 12));
        assert_eq!(sf::EMIT_PARENT_TXN_ID, field_id(5, 10));
        assert_eq!(sf::EMIT_NONCE, field_id(5, 11));
        assert_eq!(sf::EMIT_CALLBACK, field_id(8, 9));
    }

    #[test]
    fn type_predicates() {
        assert!(types::is_vl(types::BLOB));
        assert!(types::is_vl(types::ACCOUNT));
        assert!(!types::is_vl(types::AMOUNT));
        assert_eq!(types::fixed_len(types::UINT256), Some(32));
        assert!(types::is_known(19));
        assert!(!types::is_known(9));
        assert!(!types::is_known(13));
        assert!(!types::is_known(20));
    }
}
