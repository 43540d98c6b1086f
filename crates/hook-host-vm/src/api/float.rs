//! Float calls: thin ABI shims over the decimal float engine.

use hook_host_codec::{field_code, type_code};
use hook_host_common::codes;
use hook_host_float as xfl;

use super::{guest_slice, not_in_bounds, write_mem};
use crate::context::HookContext;

pub fn float_set(_ctx: &mut HookContext, exponent: i32, mantissa: i64) -> i64 {
    xfl::float_set(exponent, mantissa)
}

pub fn float_one(_ctx: &mut HookContext) -> i64 {
    xfl::ONE
}

pub fn float_multiply(_ctx: &mut HookContext, float1: i64, float2: i64) -> i64 {
    xfl::multiply(float1, float2)
}

pub fn float_mulratio(
    _ctx: &mut HookContext,
    float1: i64,
    round_up: u32,
    numerator: u32,
    denominator: u32,
) -> i64 {
    xfl::mulratio(float1, round_up != 0, numerator, denominator)
}

pub fn float_negate(_ctx: &mut HookContext, float1: i64) -> i64 {
    xfl::negate(float1)
}

pub fn float_compare(_ctx: &mut HookContext, float1: i64, float2: i64, mode: u32) -> i64 {
    xfl::compare(float1, float2, mode)
}

pub fn float_sum(_ctx: &mut HookContext, float1: i64, float2: i64) -> i64 {
    xfl::sum(float1, float2)
}

pub fn float_divide(_ctx: &mut HookContext, float1: i64, float2: i64) -> i64 {
    xfl::divide(float1, float2)
}

pub fn float_invert(_ctx: &mut HookContext, float1: i64) -> i64 {
    xfl::invert(float1)
}

pub fn float_mantissa(_ctx: &mut HookContext, float1: i64) -> i64 {
    if !xfl::is_valid(float1) {
        return codes::INVALID_FLOAT;
    }
    xfl::mantissa(float1) as i64
}

pub fn float_exponent(_ctx: &mut HookContext, float1: i64) -> i64 {
    if !xfl::is_valid(float1) {
        return codes::INVALID_FLOAT;
    }
    xfl::exponent(float1) as i64
}

pub fn float_sign(_ctx: &mut HookContext, float1: i64) -> i64 {
    if !xfl::is_valid(float1) {
        return codes::INVALID_FLOAT;
    }
    if float1 == 0 {
        return 0;
    }
    xfl::is_negative(float1) as i64
}

pub fn float_mantissa_set(_ctx: &mut HookContext, float1: i64, mantissa: i64) -> i64 {
    if !xfl::is_valid(float1) {
        return codes::INVALID_FLOAT;
    }
    if mantissa == 0 {
        return 0;
    }
    if mantissa < 0 {
        return codes::MANTISSA_OVERSIZED;
    }
    xfl::set_mantissa(float1, mantissa as u64)
}

pub fn float_exponent_set(_ctx: &mut HookContext, float1: i64, exponent: i32) -> i64 {
    if !xfl::is_valid(float1) {
        return codes::INVALID_FLOAT;
    }
    if float1 == 0 {
        return 0;
    }
    xfl::set_exponent(float1, exponent)
}

pub fn float_sign_set(_ctx: &mut HookContext, float1: i64, negative: u32) -> i64 {
    if !xfl::is_valid(float1) {
        return codes::INVALID_FLOAT;
    }
    if float1 == 0 {
        return 0;
    }
    xfl::set_sign(float1, negative != 0)
}

pub fn float_int(_ctx: &mut HookContext, float1: i64, decimal_places: u32, absolute: u32) -> i64 {
    xfl::float_int(float1, decimal_places, absolute != 0)
}

/// Serialize a float as a ledger amount field into guest memory.
///
/// `field_code` 0 selects the native drops form; 0xFFFFFFFF emits the
/// issued 8-byte body alone; anything else emits preamble, body, currency
/// and issuer.
#[allow(clippy::too_many_arguments)]
pub fn float_sto(
    _ctx: &mut HookContext,
    mem: &mut [u8],
    write_ptr: u32,
    write_len: u32,
    cread_ptr: u32,
    cread_len: u32,
    iread_ptr: u32,
    iread_len: u32,
    float1: i64,
    field_code_arg: u32,
) -> i64 {
    if !xfl::is_valid(float1) {
        return codes::INVALID_FLOAT;
    }
    if not_in_bounds(mem, write_ptr, write_len) {
        return codes::OUT_OF_BOUNDS;
    }

    let is_native = field_code_arg == xfl::NATIVE_FIELD_CODE;
    let is_short = field_code_arg == xfl::SHORT_FIELD_CODE;

    let mut out = Vec::with_capacity(49);
    if !is_native && !is_short {
        let t = type_code(field_code_arg);
        let f = field_code(field_code_arg);
        if t < 16 && f < 16 {
            out.push((t << 4) | f);
        } else if t < 16 {
            out.push(t << 4);
            out.push(f);
        } else if f < 16 {
            out.push(f);
            out.push(t);
        } else {
            out.push(0);
            out.push(t);
            out.push(f);
        }
    }

    let body = match xfl::amount_bytes(float1, is_native) {
        Ok(body) => body,
        Err(code) => return code,
    };
    out.extend_from_slice(&body);

    if !is_native && !is_short {
        if cread_ptr == 0 && cread_len == 0 && iread_ptr == 0 && iread_len == 0 {
            return codes::INVALID_ARGUMENT;
        }
        if not_in_bounds(mem, cread_ptr, cread_len) || not_in_bounds(mem, iread_ptr, iread_len) {
            return codes::OUT_OF_BOUNDS;
        }
        if cread_len != 20 || iread_len != 20 {
            return codes::INVALID_ARGUMENT;
        }
        let currency = guest_slice(mem, cread_ptr, 20).to_vec();
        let issuer = guest_slice(mem, iread_ptr, 20).to_vec();
        out.extend_from_slice(&currency);
        out.extend_from_slice(&issuer);
    }

    if (write_len as usize) < out.len() {
        return codes::TOO_SMALL;
    }
    write_mem(mem, write_ptr, write_len, &out)
}

/// Parse a serialized amount field back into a float.
pub fn float_sto_set(_ctx: &mut HookContext, mem: &mut [u8], read_ptr: u32, read_len: u32) -> i64 {
    if not_in_bounds(mem, read_ptr, read_len) {
        return codes::OUT_OF_BOUNDS;
    }
    xfl::from_sto(guest_slice(mem, read_ptr, read_len))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testutil::{guest_mem, test_context};
    use hook_host_codec::sf;

    #[test]
    fn native_sto_is_canonical() {
        let mut ctx = test_context();
        let mut mem = guest_mem();
        let one_xrp = xfl::float_set(-6, 1_000_000);
        let written = float_sto(&mut ctx, &mut mem, 0, 8, 0, 0, 0, 0, one_xrp, 0);
        assert_eq!(written, 8);
        assert_eq!(&mem[..8], &[0x40, 0x00, 0x00, 0x00, 0x00, 0x0F, 0x42, 0x40]);

        assert_eq!(float_sto_set(&mut ctx, &mut mem, 0, 8), one_xrp);
    }

    #[test]
    fn issued_sto_carries_currency_and_issuer() {
        let mut ctx = test_context();
        let mut mem = guest_mem();
        mem[0x100..0x114].copy_from_slice(&[0x11u8; 20]);
        mem[0x200..0x214].copy_from_slice(&[0x22u8; 20]);

        let value = xfl::float_set(-2, 314);
        let written = float_sto(
            &mut ctx, &mut mem, 0, 64, 0x100, 20, 0x200, 20, value, sf::AMOUNT,
        );
        // 1-byte preamble + 8-byte body + 20 + 20
        assert_eq!(written, 49);
        assert_eq!(mem[0], 0x61);
        assert_eq!(&mem[9..29], &[0x11u8; 20]);
        assert_eq!(&mem[29..49], &[0x22u8; 20]);

        assert_eq!(float_sto_set(&mut ctx, &mut mem, 0, 49), value);
    }

    #[test]
    fn short_form_is_body_only() {
        let mut ctx = test_context();
        let mut mem = guest_mem();
        let value = xfl::float_set(0, 7);
        let written = float_sto(
            &mut ctx, &mut mem, 0, 16, 0, 0, 0, 0, value, xfl::SHORT_FIELD_CODE,
        );
        assert_eq!(written, 8);
    }

    #[test]
    fn issued_requires_currency_and_issuer() {
        let mut ctx = test_context();
        let mut mem = guest_mem();
        let value = xfl::float_set(0, 7);
        assert_eq!(
            float_sto(&mut ctx, &mut mem, 0, 64, 0, 0, 0, 0, value, sf::AMOUNT),
            codes::INVALID_ARGUMENT
        );
        assert_eq!(
            float_sto(&mut ctx, &mut mem, 0, 64, 0x100, 19, 0x200, 20, value, sf::AMOUNT),
            codes::INVALID_ARGUMENT
        );
    }

    #[test]
    fn buffer_too_small() {
        let mut ctx = test_context();
        let mut mem = guest_mem();
        mem[0x100..0x114].copy_from_slice(&[0x11u8; 20]);
        mem[0x200..0x214].copy_from_slice(&[0x22u8; 20]);
        let value = xfl::float_set(0, 7);
        assert_eq!(
            float_sto(&mut ctx, &mut mem, 0, 48, 0x100, 20, 0x200, 20, value, sf::AMOUNT),
            codes::TOO_SMALL
        );
    }

    #[test]
    fn component_accessors() {
        let mut ctx = test_context();
        let f = xfl::float_set(3, 42);
        assert_eq!(float_mantissa(&mut ctx, f), 4_200_000_000_000_000);
        assert_eq!(float_exponent(&mut ctx, f), -11);
        assert_eq!(float_sign(&mut ctx, f), 0);
        assert_eq!(float_sign(&mut ctx, xfl::float_set(3, -42)), 1);
        assert_eq!(float_mantissa(&mut ctx, -3), codes::INVALID_FLOAT);
    }

    #[test]
    fn sign_set_round_trip() {
        let mut ctx = test_context();
        let f = xfl::float_set(0, 9);
        let sign = float_sign(&mut ctx, f);
        assert_eq!(float_sign_set(&mut ctx, f, sign as u32), f);
    }
}
