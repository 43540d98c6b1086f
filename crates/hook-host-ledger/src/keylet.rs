//! Keylet factory.
//!
//! A keylet names a ledger object: a 2-byte entry type plus the 32-byte
//! key the ledger stores it under. Keys are SHA-512-half digests of a
//! 2-byte namespace discriminator followed by the identifying arguments
//! of the object.

use hook_host_common::{AccountId, Currency, Hash256, Keylet};
use hook_host_crypto::sha512h_parts;

/// Ledger entry type codes.
pub mod lt {
    pub const ANY: u16 = 0x0000;
    pub const ACCOUNT_ROOT: u16 = 0x0061;
    pub const DIR_NODE: u16 = 0x0064;
    pub const RIPPLE_STATE: u16 = 0x0072;
    pub const OFFER: u16 = 0x006F;
    pub const SIGNER_LIST: u16 = 0x0053;
    pub const ESCROW: u16 = 0x0075;
    pub const PAYCHAN: u16 = 0x0078;
    pub const CHECK: u16 = 0x0043;
    pub const DEPOSIT_PREAUTH: u16 = 0x0070;
    pub const FEE_SETTINGS: u16 = 0x0073;
    pub const AMENDMENTS: u16 = 0x0066;
    pub const LEDGER_HASHES: u16 = 0x0068;
    pub const NEGATIVE_UNL: u16 = 0x004E;
    pub const CHILD: u16 = 0x1CD2;
    pub const HOOK: u16 = 0x0048;
    pub const HOOK_STATE: u16 = 0x0076;
    pub const EMITTED_TXN: u16 = 0x0045;
}

/// Key namespaces, one ascii discriminator each.
mod space {
    pub const ACCOUNT: u8 = b'a';
    pub const DIR_NODE: u8 = b'd';
    pub const TRUST_LINE: u8 = b'r';
    pub const OFFER: u8 = b'o';
    pub const OWNER_DIR: u8 = b'O';
    pub const SKIP_LIST: u8 = b's';
    pub const AMENDMENTS: u8 = b'f';
    pub const FEES: u8 = b'e';
    pub const SIGNER_LIST: u8 = b'S';
    pub const ESCROW: u8 = b'u';
    pub const PAYCHAN: u8 = b'x';
    pub const CHECK: u8 = b'C';
    pub const DEPOSIT_PREAUTH: u8 = b'p';
    pub const NEGATIVE_UNL: u8 = b'N';
    pub const CHILD: u8 = b'c';
    pub const HOOK: u8 = b'H';
    pub const HOOK_STATE: u8 = b'v';
    pub const EMITTED_TXN: u8 = b'E';
    pub const EMITTED_DIR: u8 = b'D';
}

/// The keylet kinds of the guest ABI's `util_keylet` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum KeyletType {
    Hook = 1,
    HookState = 2,
    Account = 3,
    Amendments = 4,
    Child = 5,
    Skip = 6,
    Fees = 7,
    NegativeUnl = 8,
    Line = 9,
    Offer = 10,
    Quality = 11,
    EmittedDir = 12,
    Signers = 13,
    Page = 14,
    Check = 15,
    Escrow = 16,
    Paychan = 17,
    Emitted = 18,
    DepositPreauth = 19,
    Unchecked = 20,
    OwnerDir = 21,
}

impl KeyletType {
    /// Map the ABI's integer discriminant onto a kind.
    pub fn from_u32(value: u32) -> Option<Self> {
        Some(match value {
            1 => Self::Hook,
            2 => Self::HookState,
            3 => Self::Account,
            4 => Self::Amendments,
            5 => Self::Child,
            6 => Self::Skip,
            7 => Self::Fees,
            8 => Self::NegativeUnl,
            9 => Self::Line,
            10 => Self::Offer,
            11 => Self::Quality,
            12 => Self::EmittedDir,
            13 => Self::Signers,
            14 => Self::Page,
            15 => Self::Check,
            16 => Self::Escrow,
            17 => Self::Paychan,
            18 => Self::Emitted,
            19 => Self::DepositPreauth,
            20 => Self::Unchecked,
            21 => Self::OwnerDir,
            _ => return None,
        })
    }
}

fn digest(space: u8, parts: &[&[u8]]) -> Hash256 {
    let prefix = [0u8, space];
    let mut all: Vec<&[u8]> = Vec::with_capacity(parts.len() + 1);
    all.push(&prefix);
    all.extend_from_slice(parts);
    Hash256(sha512h_parts(&all))
}

pub fn account(id: &AccountId) -> Keylet {
    Keylet::new(lt::ACCOUNT_ROOT, digest(space::ACCOUNT, &[id.as_bytes()]))
}

pub fn hook(id: &AccountId) -> Keylet {
    Keylet::new(lt::HOOK, digest(space::HOOK, &[id.as_bytes()]))
}

pub fn hook_state(owner: &AccountId, key: &Hash256) -> Keylet {
    Keylet::new(
        lt::HOOK_STATE,
        digest(space::HOOK_STATE, &[owner.as_bytes(), key.as_bytes()]),
    )
}

pub fn owner_dir(id: &AccountId) -> Keylet {
    Keylet::new(lt::DIR_NODE, digest(space::OWNER_DIR, &[id.as_bytes()]))
}

pub fn signers(id: &AccountId) -> Keylet {
    Keylet::new(lt::SIGNER_LIST, digest(space::SIGNER_LIST, &[id.as_bytes()]))
}

pub fn line(a: &AccountId, b: &AccountId, currency: &Currency) -> Keylet {
    // trust lines are unordered between the two accounts: hash the pair
    // low account first
    let (lo, hi) = if a.as_bytes() <= b.as_bytes() { (a, b) } else { (b, a) };
    Keylet::new(
        lt::RIPPLE_STATE,
        digest(
            space::TRUST_LINE,
            &[lo.as_bytes(), hi.as_bytes(), currency.as_bytes()],
        ),
    )
}

pub fn offer(id: &AccountId, sequence: u32) -> Keylet {
    Keylet::new(
        lt::OFFER,
        digest(space::OFFER, &[id.as_bytes(), &sequence.to_be_bytes()]),
    )
}

pub fn quality(dir: &Keylet, rate: u64) -> Keylet {
    // replace the low 8 bytes of a directory key with the quality rate
    let mut key = *dir.key.as_bytes();
    key[24..].copy_from_slice(&rate.to_be_bytes());
    Keylet::new(lt::DIR_NODE, Hash256(key))
}

pub fn page(root: &Hash256, index: u64) -> Keylet {
    if index == 0 {
        return Keylet::new(lt::DIR_NODE, *root);
    }
    Keylet::new(
        lt::DIR_NODE,
        digest(space::DIR_NODE, &[root.as_bytes(), &index.to_be_bytes()]),
    )
}

pub fn check(id: &AccountId, sequence: u32) -> Keylet {
    Keylet::new(
        lt::CHECK,
        digest(space::CHECK, &[id.as_bytes(), &sequence.to_be_bytes()]),
    )
}

pub fn escrow(id: &AccountId, sequence: u32) -> Keylet {
    Keylet::new(
        lt::ESCROW,
        digest(space::ESCROW, &[id.as_bytes(), &sequence.to_be_bytes()]),
    )
}

pub fn paychan(src: &AccountId, dst: &AccountId, sequence: u32) -> Keylet {
    Keylet::new(
        lt::PAYCHAN,
        digest(
            space::PAYCHAN,
            &[src.as_bytes(), dst.as_bytes(), &sequence.to_be_bytes()],
        ),
    )
}

pub fn deposit_preauth(owner: &AccountId, preauthorized: &AccountId) -> Keylet {
    Keylet::new(
        lt::DEPOSIT_PREAUTH,
        digest(
            space::DEPOSIT_PREAUTH,
            &[owner.as_bytes(), preauthorized.as_bytes()],
        ),
    )
}

pub fn child(key: &Hash256) -> Keylet {
    Keylet::new(lt::CHILD, digest(space::CHILD, &[key.as_bytes()]))
}

pub fn unchecked(key: &Hash256) -> Keylet {
    Keylet::new(lt::ANY, *key)
}

pub fn emitted(txn_id: &Hash256) -> Keylet {
    Keylet::new(lt::EMITTED_TXN, digest(space::EMITTED_TXN, &[txn_id.as_bytes()]))
}

pub fn emitted_dir() -> Keylet {
    Keylet::new(lt::DIR_NODE, digest(space::EMITTED_DIR, &[]))
}

pub fn skip(ledger: Option<u32>) -> Keylet {
    match ledger {
        None => Keylet::new(lt::LEDGER_HASHES, digest(space::SKIP_LIST, &[])),
        Some(seq) => Keylet::new(
            lt::LEDGER_HASHES,
            digest(space::SKIP_LIST, &[&(seq >> 16).to_be_bytes()]),
        ),
    }
}

pub fn amendments() -> Keylet {
    Keylet::new(lt::AMENDMENTS, digest(space::AMENDMENTS, &[]))
}

pub fn fees() -> Keylet {
    Keylet::new(lt::FEE_SETTINGS, digest(space::FEES, &[]))
}

pub fn negative_unl() -> Keylet {
    Keylet::new(lt::NEGATIVE_UNL, digest(space::NEGATIVE_UNL, &[]))
}
