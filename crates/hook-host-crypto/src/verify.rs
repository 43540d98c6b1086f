//! Signature verification with the ledger's key-type convention.
//!
//! Public keys are 33 bytes. A leading 0xED marks an ed25519 key (the
//! remaining 32 bytes are the key itself, signing the raw message); a
//! leading 0x02/0x03 marks a compressed secp256k1 key, which signs the
//! SHA-512-half of the message with a DER-encoded ECDSA signature.

use ed25519_dalek::{Signature as Ed25519Signature, Verifier, VerifyingKey};
use secp256k1::{ecdsa::Signature as EcdsaSignature, Message, PublicKey, Secp256k1};

use crate::sha512h;

const ED25519_PREFIX: u8 = 0xED;

/// Verify `signature` over `message` with the 33-byte `public_key`.
///
/// Returns false for malformed keys or signatures; verification never
/// errors toward the caller.
pub fn verify(public_key: &[u8], message: &[u8], signature: &[u8]) -> bool {
    if public_key.len() != 33 {
        return false;
    }

    if public_key[0] == ED25519_PREFIX {
        let Ok(key_bytes) = <[u8; 32]>::try_from(&public_key[1..33]) else {
            return false;
        };
        let Ok(key) = VerifyingKey::from_bytes(&key_bytes) else {
            return false;
        };
        let Ok(sig_bytes) = <[u8; 64]>::try_from(signature) else {
            return false;
        };
        let sig = Ed25519Signature::from_bytes(&sig_bytes);
        return key.verify(message, &sig).is_ok();
    }

    let Ok(key) = PublicKey::from_slice(public_key) else {
        return false;
    };
    let Ok(mut sig) = EcdsaSignature::from_der(signature) else {
        return false;
    };
    // accept high-s signatures the way the ledger's loose verifier does
    sig.normalize_s();
    let digest = sha512h(message);
    let msg = Message::from_digest(digest);
    Secp256k1::verification_only()
        .verify_ecdsa(&msg, &sig, &key)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};
    use rand::rngs::OsRng;

    #[test]
    fn ed25519_round_trip() {
        let signing = SigningKey::generate(&mut OsRng);
        let msg = b"emitted txn payload";
        let sig = signing.sign(msg);

        let mut key = vec![0xEDu8];
        key.extend_from_slice(signing.verifying_key().as_bytes());

        assert!(verify(&key, msg, &sig.to_bytes()));
        assert!(!verify(&key, b"different payload", &sig.to_bytes()));
    }

    #[test]
    fn secp256k1_round_trip() {
        let secp = Secp256k1::new();
        let (secret, public) = secp.generate_keypair(&mut rand::thread_rng());
        let msg = b"emitted txn payload";
        let digest = sha512h(msg);
        let sig = secp.sign_ecdsa(&Message::from_digest(digest), &secret);

        let key = public.serialize();
        assert!(verify(&key, msg, &sig.serialize_der()));
        assert!(!verify(&key, b"different payload", &sig.serialize_der()));
    }

    #[test]
    fn rejects_malformed_keys() {
        assert!(!verify(&[0u8; 32], b"m", &[0u8; 64]));
        assert!(!verify(&[0xFFu8; 33], b"m", &[0u8; 64]));
    }
}
