//! Cryptographic primitives used by the hook host.
//!
//! Three concerns live here, all consumed by host calls:
//!
//! - `sha512h`: SHA-512 truncated to its first 32 bytes, the digest the
//!   ledger uses for object keys, transaction ids and `util_sha512h`.
//! - the r-address codec: base58-check over the ledger alphabet, backing
//!   `util_raddr` / `util_accid`.
//! - `verify`: ed25519 or secp256k1 signature verification with the
//!   ledger's key-type convention, backing `util_verify`.

mod error;
mod raddr;
mod verify;

pub use error::CryptoError;
pub use raddr::{decode_account_id, encode_account_id};
pub use verify::verify;

use sha2::{Digest, Sha512};

/// Compute the SHA-512-half digest: SHA-512, keeping the first 32 bytes.
pub fn sha512h(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha512::new();
    hasher.update(data);
    let full = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&full[..32]);
    out
}

/// SHA-512-half over several concatenated parts, avoiding a joined copy.
pub fn sha512h_parts(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha512::new();
    for part in parts {
        hasher.update(part);
    }
    let full = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&full[..32]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha512h_is_truncated_sha512() {
        let d = sha512h(b"hook");
        let mut hasher = Sha512::new();
        hasher.update(b"hook");
        assert_eq!(&hasher.finalize()[..32], &d);
    }

    #[test]
    fn sha512h_parts_matches_concatenation() {
        assert_eq!(sha512h(b"abcdef"), sha512h_parts(&[b"abc", b"def"]));
    }
}
