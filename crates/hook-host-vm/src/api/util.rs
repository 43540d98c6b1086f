//! Utility calls: keylet construction, hashing, address codec and
//! signature verification.

use hook_host_common::{codes, AccountId, Currency, Hash256, Keylet};
use hook_host_crypto::{decode_account_id, encode_account_id, sha512h, verify};
use hook_host_ledger::{keylet, KeyletType};

use super::{guest_slice, not_in_bounds, write_mem};
use crate::context::HookContext;

/// Hash an arbitrary guest buffer with SHA-512-half.
pub fn util_sha512h(
    _ctx: &mut HookContext,
    mem: &mut [u8],
    write_ptr: u32,
    write_len: u32,
    read_ptr: u32,
    read_len: u32,
) -> i64 {
    if write_len < 32 {
        return codes::TOO_SMALL;
    }
    if not_in_bounds(mem, write_ptr, write_len) || not_in_bounds(mem, read_ptr, read_len) {
        return codes::OUT_OF_BOUNDS;
    }
    let digest = sha512h(guest_slice(mem, read_ptr, read_len));
    write_mem(mem, write_ptr, 32, &digest)
}

/// Verify an ed25519 or secp256k1 signature.
pub fn util_verify(
    _ctx: &mut HookContext,
    mem: &mut [u8],
    dread_ptr: u32,
    dread_len: u32,
    sread_ptr: u32,
    sread_len: u32,
    kread_ptr: u32,
    kread_len: u32,
) -> i64 {
    if not_in_bounds(mem, dread_ptr, dread_len)
        || not_in_bounds(mem, sread_ptr, sread_len)
        || not_in_bounds(mem, kread_ptr, kread_len)
    {
        return codes::OUT_OF_BOUNDS;
    }
    let key = guest_slice(mem, kread_ptr, kread_len).to_vec();
    let data = guest_slice(mem, dread_ptr, dread_len).to_vec();
    let sig = guest_slice(mem, sread_ptr, sread_len).to_vec();
    verify(&key, &data, &sig) as i64
}

/// Encode a 20-byte account id as an r-address.
pub fn util_raddr(
    _ctx: &mut HookContext,
    mem: &mut [u8],
    write_ptr: u32,
    write_len: u32,
    read_ptr: u32,
    read_len: u32,
) -> i64 {
    if not_in_bounds(mem, write_ptr, write_len) || not_in_bounds(mem, read_ptr, read_len) {
        return codes::OUT_OF_BOUNDS;
    }
    if read_len != 20 {
        return codes::INVALID_ARGUMENT;
    }
    let Some(id) = <&[u8; 20]>::try_from(guest_slice(mem, read_ptr, 20)).ok() else {
        return codes::INVALID_ARGUMENT;
    };
    let address = encode_account_id(id);
    if (write_len as usize) < address.len() {
        return codes::TOO_SMALL;
    }
    write_mem(mem, write_ptr, write_len, address.as_bytes())
}

/// Decode an r-address into a 20-byte account id.
pub fn util_accid(
    _ctx: &mut HookContext,
    mem: &mut [u8],
    write_ptr: u32,
    write_len: u32,
    read_ptr: u32,
    read_len: u32,
) -> i64 {
    if not_in_bounds(mem, write_ptr, write_len) || not_in_bounds(mem, read_ptr, read_len) {
        return codes::OUT_OF_BOUNDS;
    }
    if write_len < 20 {
        return codes::TOO_SMALL;
    }
    if read_len > 49 {
        return codes::TOO_BIG;
    }
    let Ok(address) = std::str::from_utf8(guest_slice(mem, read_ptr, read_len)) else {
        return codes::INVALID_ARGUMENT;
    };
    match decode_account_id(address) {
        Ok(id) => write_mem(mem, write_ptr, write_len, &id),
        Err(_) => codes::INVALID_ARGUMENT,
    }
}

struct KeyletArgs<'a> {
    mem: &'a [u8],
    a: u32,
    b: u32,
    c: u32,
    d: u32,
    e: u32,
    f: u32,
}

impl<'a> KeyletArgs<'a> {
    /// Require the arguments from `from` on to be zero.
    fn rest_zero(&self, from: usize) -> bool {
        let args = [self.a, self.b, self.c, self.d, self.e, self.f];
        args[from..].iter().all(|&v| v == 0)
    }

    fn read(&self, ptr: u32, len: u32, expected: u32) -> Result<&'a [u8], i64> {
        if ptr == 0 || len == 0 {
            return Err(codes::INVALID_ARGUMENT);
        }
        if not_in_bounds(self.mem, ptr, len) {
            return Err(codes::OUT_OF_BOUNDS);
        }
        if len != expected {
            return Err(codes::INVALID_ARGUMENT);
        }
        Ok(guest_slice(self.mem, ptr, len))
    }

    fn account(&self, ptr: u32, len: u32) -> Result<AccountId, i64> {
        let bytes = self.read(ptr, len, 20)?;
        AccountId::from_slice(bytes).ok_or(codes::INVALID_ARGUMENT)
    }

    fn hash(&self, ptr: u32, len: u32) -> Result<Hash256, i64> {
        let bytes = self.read(ptr, len, 32)?;
        Hash256::from_slice(bytes).ok_or(codes::INVALID_ARGUMENT)
    }

    fn keylet(&self, ptr: u32, len: u32) -> Result<Keylet, i64> {
        let bytes = self.read(ptr, len, 34)?;
        Keylet::from_bytes(bytes).ok_or(codes::NO_SUCH_KEYLET)
    }
}

/// Build a 34-byte keylet from positional arguments whose meaning depends
/// on the keylet kind.
#[allow(clippy::too_many_arguments)]
pub fn util_keylet(
    _ctx: &mut HookContext,
    mem: &mut [u8],
    write_ptr: u32,
    write_len: u32,
    keylet_type: u32,
    a: u32,
    b: u32,
    c: u32,
    d: u32,
    e: u32,
    f: u32,
) -> i64 {
    if not_in_bounds(mem, write_ptr, write_len) {
        return codes::OUT_OF_BOUNDS;
    }
    if write_len < Keylet::LEN as u32 {
        return codes::TOO_SMALL;
    }
    let Some(kind) = KeyletType::from_u32(keylet_type) else {
        return codes::INVALID_ARGUMENT;
    };

    let args = KeyletArgs { mem, a, b, c, d, e, f };
    let built = build_keylet(kind, &args);
    let keylet = match built {
        Ok(keylet) => keylet,
        Err(code) => return code,
    };
    write_mem(mem, write_ptr, write_len, &keylet.to_bytes())
}

fn build_keylet(kind: KeyletType, args: &KeyletArgs<'_>) -> Result<Keylet, i64> {
    use KeyletType::*;

    match kind {
        Quality => {
            if args.c == 0 || args.d == 0 || !args.rest_zero(4) {
                return Err(codes::INVALID_ARGUMENT);
            }
            let parent = args.keylet(args.a, args.b)?;
            let rate = ((args.c as u64) << 32) + args.d as u64;
            Ok(keylet::quality(&parent, rate))
        }
        Child | Emitted | Unchecked => {
            if !args.rest_zero(2) {
                return Err(codes::INVALID_ARGUMENT);
            }
            let hash = args.hash(args.a, args.b)?;
            Ok(match kind {
                Child => keylet::child(&hash),
                Emitted => keylet::emitted(&hash),
                _ => keylet::unchecked(&hash),
            })
        }
        OwnerDir | Signers | Account | Hook => {
            if !args.rest_zero(2) {
                return Err(codes::INVALID_ARGUMENT);
            }
            let id = args.account(args.a, args.b)?;
            Ok(match kind {
                Hook => keylet::hook(&id),
                Signers => keylet::signers(&id),
                OwnerDir => keylet::owner_dir(&id),
                _ => keylet::account(&id),
            })
        }
        Offer | Check | Escrow => {
            if args.c == 0 || !args.rest_zero(3) {
                return Err(codes::INVALID_ARGUMENT);
            }
            let id = args.account(args.a, args.b)?;
            Ok(match kind {
                Check => keylet::check(&id, args.c),
                Escrow => keylet::escrow(&id, args.c),
                _ => keylet::offer(&id, args.c),
            })
        }
        Page => {
            if args.c == 0 || args.d == 0 || !args.rest_zero(4) {
                return Err(codes::INVALID_ARGUMENT);
            }
            let root = args.hash(args.a, args.b)?;
            let index = ((args.c as u64) << 32) + args.d as u64;
            Ok(keylet::page(&root, index))
        }
        HookState => {
            if !args.rest_zero(4) {
                return Err(codes::INVALID_ARGUMENT);
            }
            let owner = args.account(args.a, args.b)?;
            let key = args.hash(args.c, args.d)?;
            Ok(keylet::hook_state(&owner, &key))
        }
        Skip => {
            if !args.rest_zero(2) {
                return Err(codes::INVALID_ARGUMENT);
            }
            Ok(if args.b == 0 {
                keylet::skip(None)
            } else {
                keylet::skip(Some(args.a))
            })
        }
        Amendments | Fees | NegativeUnl | EmittedDir => {
            if !args.rest_zero(0) {
                return Err(codes::INVALID_ARGUMENT);
            }
            Ok(match kind {
                Amendments => keylet::amendments(),
                Fees => keylet::fees(),
                NegativeUnl => keylet::negative_unl(),
                _ => keylet::emitted_dir(),
            })
        }
        Line => {
            let high = args.account(args.a, args.b)?;
            let low = args.account(args.c, args.d)?;
            let currency_bytes = args.read(args.e, args.f, 20)?;
            let Some(currency) = Currency::from_slice(currency_bytes) else {
                return Err(codes::INVALID_ARGUMENT);
            };
            Ok(keylet::line(&high, &low, &currency))
        }
        DepositPreauth => {
            if !args.rest_zero(4) {
                return Err(codes::INVALID_ARGUMENT);
            }
            let owner = args.account(args.a, args.b)?;
            let preauthorized = args.account(args.c, args.d)?;
            Ok(keylet::deposit_preauth(&owner, &preauthorized))
        }
        Paychan => {
            if args.e == 0 || args.f != 0 {
                return Err(codes::INVALID_ARGUMENT);
            }
            let src = args.account(args.a, args.b)?;
            let dst = args.account(args.c, args.d)?;
            Ok(keylet::paychan(&src, &dst, args.e))
        }
    }
}
