//! Return-code sentinels of the guest ABI.
//!
//! Every host call returns an `i64`; non-negative values carry the result
//! (usually a byte count or a handle) and negative values are one of the
//! sentinels below. `RC_ACCEPT` / `RC_ROLLBACK` never reach the guest:
//! they are the values the exit and guard calls hand to the execution
//! driver.

/// A `(ptr, len)` pair reached past the end of guest linear memory.
pub const OUT_OF_BOUNDS: i64 = -1;
/// The host could not satisfy the call for reasons internal to the ledger.
pub const INTERNAL_ERROR: i64 = -2;
/// An input exceeded the cap the call imposes on it.
pub const TOO_BIG: i64 = -3;
/// An input or output buffer was smaller than the call requires.
pub const TOO_SMALL: i64 = -4;
/// The named object, field, entry or key does not exist.
pub const DOESNT_EXIST: i64 = -5;
/// The slot table is full and no handle was freed.
pub const NO_FREE_SLOTS: i64 = -6;
/// An argument failed the call's schema.
pub const INVALID_ARGUMENT: i64 = -7;
/// A one-shot value was supplied twice.
pub const ALREADY_SET: i64 = -8;
/// The call requires an earlier call (e.g. `etxn_reserve`) first.
pub const PREREQUISITE_NOT_MET: i64 = -9;
/// A fee computation overflowed.
pub const FEE_TOO_LARGE: i64 = -10;
/// The emitted transaction failed structural validation.
pub const EMISSION_FAILURE: i64 = -11;
/// The invocation drew more than `caps::MAX_NONCE` nonces.
pub const TOO_MANY_NONCES: i64 = -12;
/// The invocation emitted past its reservation.
pub const TOO_MANY_EMITTED_TXN: i64 = -13;
/// An account argument was not 20 bytes.
pub const INVALID_ACCOUNT: i64 = -15;
/// A `_g` guard exceeded its iteration cap.
pub const GUARD_VIOLATION: i64 = -16;
/// The field id names no known field.
pub const INVALID_FIELD: i64 = -17;
/// A serialized object failed to parse.
pub const PARSE_ERROR: i64 = -18;
/// Driver sentinel: the guest rolled back.
pub const RC_ROLLBACK: i64 = -19;
/// Driver sentinel: the guest accepted.
pub const RC_ACCEPT: i64 = -20;
/// The keylet type is not one of the known kinds.
pub const NO_SUCH_KEYLET: i64 = -21;
/// The slot entry is not an array.
pub const NOT_AN_ARRAY: i64 = -22;
/// The slot entry is not an object.
pub const NOT_AN_OBJECT: i64 = -23;
/// The slot entry is not an amount.
pub const NOT_AN_AMOUNT: i64 = -24;
/// The float is negative and the call was not asked for an absolute value.
pub const CANT_RETURN_NEGATIVE: i64 = -25;
/// Division by zero in the float engine.
pub const DIVISION_BY_ZERO: i64 = -26;
/// A mantissa component was outside the normalized range.
pub const MANTISSA_OVERSIZED: i64 = -27;
/// An exponent component was above the representable range.
pub const EXPONENT_OVERSIZED: i64 = -28;
/// An exponent component was below the representable range.
pub const EXPONENT_UNDERSIZED: i64 = -29;
/// Float arithmetic overflowed.
pub const OVERFLOW: i64 = -30;
/// The value is not a valid packed decimal float.
pub const INVALID_FLOAT: i64 = -10024;
