//! Full-text rendering of decoded field payloads, for `otxn_field_txt`.

use hook_host_crypto::encode_account_id;

use crate::field::types;

/// Render a field payload as text the way the ledger prints it: integers
/// in decimal, hashes and blobs in hex, accounts as r-addresses.
pub fn field_text(type_code: u8, payload: &[u8]) -> String {
    match type_code {
        types::UINT8 | types::UINT16 | types::UINT32 | types::UINT64 => {
            let mut value = 0u64;
            for &b in payload.iter().take(8) {
                value = (value << 8) | b as u64;
            }
            value.to_string()
        }
        types::ACCOUNT => match <&[u8; 20]>::try_from(payload) {
            Ok(id) => encode_account_id(id),
            Err(_) => hex::encode_upper(payload),
        },
        types::AMOUNT => amount_text(payload),
        _ => hex::encode_upper(payload),
    }
}

fn amount_text(payload: &[u8]) -> String {
    if payload.len() == 8 && payload[0] >> 6 == 1 {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(payload);
        let drops = u64::from_be_bytes(raw) & ((1u64 << 62) - 1);
        format!("{} drops", drops)
    } else {
        hex::encode_upper(payload)
    }
}
