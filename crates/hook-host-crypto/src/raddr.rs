//! r-address codec: base58-check over the ledger alphabet.
//!
//! An account id is encoded as `version byte (0x00) || 20-byte id || 4-byte
//! checksum`, where the checksum is the first four bytes of
//! SHA-256(SHA-256(payload)), rendered with the ledger's base58 alphabet
//! (the `r...` form).

use bs58::Alphabet;
use sha2::{Digest, Sha256};

use crate::CryptoError;

const VERSION_ACCOUNT_ID: u8 = 0x00;

fn checksum(payload: &[u8]) -> [u8; 4] {
    let first = Sha256::digest(payload);
    let second = Sha256::digest(first);
    let mut out = [0u8; 4];
    out.copy_from_slice(&second[..4]);
    out
}

/// Encode a 20-byte account id as an r-address.
pub fn encode_account_id(id: &[u8; 20]) -> String {
    let mut payload = Vec::with_capacity(25);
    payload.push(VERSION_ACCOUNT_ID);
    payload.extend_from_slice(id);
    let check = checksum(&payload);
    payload.extend_from_slice(&check);
    bs58::encode(payload)
        .with_alphabet(Alphabet::RIPPLE)
        .into_string()
}

/// Decode an r-address back into a 20-byte account id.
pub fn decode_account_id(s: &str) -> Result<[u8; 20], CryptoError> {
    let decoded = bs58::decode(s)
        .with_alphabet(Alphabet::RIPPLE)
        .into_vec()
        .map_err(|e| CryptoError::InvalidAddress(e.to_string()))?;

    // version + 20 id bytes + 4 checksum bytes
    if decoded.len() != 25 {
        return Err(CryptoError::InvalidAddress(format!(
            "decoded length {} != 25",
            decoded.len()
        )));
    }
    if decoded[0] != VERSION_ACCOUNT_ID {
        return Err(CryptoError::InvalidAddress(format!(
            "version byte {:02x}",
            decoded[0]
        )));
    }

    let check = checksum(&decoded[..21]);
    if check != decoded[21..25] {
        return Err(CryptoError::InvalidAddress("checksum mismatch".into()));
    }

    let mut id = [0u8; 20];
    id.copy_from_slice(&decoded[1..21]);
    Ok(id)
}
