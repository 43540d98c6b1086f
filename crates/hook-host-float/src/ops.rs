//! Float arithmetic.
//!
//! Every operation takes and returns ABI scalars: a negative input that is
//! not a valid float yields `INVALID_FLOAT`, and failures are reported as
//! the engine's sentinel codes rather than Rust errors.

use hook_host_common::codes;

use crate::{
    exponent, is_negative, is_valid, make_float, mantissa, signed_mantissa, MAX_EXPONENT,
    MAX_MANTISSA, MIN_EXPONENT, MIN_MANTISSA,
};

/// Comparison mode bits for [`compare`].
pub mod compare_mode {
    pub const EQUAL: u32 = 1;
    pub const LESS: u32 = 2;
    pub const GREATER: u32 = 4;
}

macro_rules! reject_invalid {
    ($f:expr) => {
        if !is_valid($f) {
            return codes::INVALID_FLOAT;
        }
    };
}

/// Negate a float. Zero negates to zero.
pub fn negate(float1: i64) -> i64 {
    if float1 == 0 {
        return 0;
    }
    reject_invalid!(float1);
    crate::invert_sign(float1)
}

/// Multiply two floats.
pub fn multiply(float1: i64, float2: i64) -> i64 {
    reject_invalid!(float1);
    reject_invalid!(float2);
    if float1 == 0 || float2 == 0 {
        return 0;
    }

    let mut exp_out = exponent(float1) + exponent(float2);
    let negative = is_negative(float1) != is_negative(float2);

    // the 54-bit mantissas multiply out to at most 108 bits; shift the
    // product down to a u64 counting the shifts, then undo the power of
    // two with an exact ratio multiplication
    let mut product = mantissa(float1) as u128 * mantissa(float2) as u128;
    let mut shifted = 0u32;
    while product > u64::MAX as u128 {
        product >>= 1;
        shifted += 1;
    }
    let mut man = product as u64;

    while man > MAX_MANTISSA {
        if exp_out > MAX_EXPONENT {
            return codes::OVERFLOW;
        }
        man /= 10;
        exp_out += 1;
    }

    let mut man_signed = if negative { -(man as i64) } else { man as i64 };
    if shifted > 0 {
        match mul_ratio_parts(man_signed, exp_out, false, 1u64 << shifted, 1) {
            Ok((m, e)) => {
                man_signed = m;
                exp_out = e;
            }
            Err(code) => return code,
        }
    }

    make_float(man_signed, exp_out)
}

/// Multiply a float by the ratio `numerator / denominator`, rounding up or
/// down per `round_up`.
pub fn mulratio(float1: i64, round_up: bool, numerator: u32, denominator: u32) -> i64 {
    reject_invalid!(float1);
    if float1 == 0 {
        return 0;
    }
    if denominator == 0 {
        return codes::DIVISION_BY_ZERO;
    }

    match mul_ratio_parts(
        signed_mantissa(float1),
        exponent(float1),
        round_up,
        numerator as u64,
        denominator as u64,
    ) {
        Ok((man, exp)) => make_float(man, exp),
        Err(code) => code,
    }
}

/// Exact `mantissa * num / den` with directed rounding, renormalized.
fn mul_ratio_parts(
    mantissa: i64,
    mut exponent: i32,
    round_up: bool,
    numerator: u64,
    denominator: u64,
) -> Result<(i64, i32), i64> {
    let num = mantissa as i128 * numerator as i128;
    let den = denominator as i128;
    let mut quotient = num.div_euclid(den);
    if round_up && num.rem_euclid(den) != 0 {
        quotient += 1;
    }

    if quotient == 0 {
        return Ok((0, 0));
    }
    let negative = quotient < 0;
    let mut man = quotient.unsigned_abs();
    while man > MAX_MANTISSA as u128 {
        man /= 10;
        exponent += 1;
        if exponent > MAX_EXPONENT {
            return Err(codes::OVERFLOW);
        }
    }
    let mut man = man as u64;
    while man < MIN_MANTISSA {
        man *= 10;
        exponent -= 1;
        if exponent < MIN_EXPONENT {
            return Ok((0, 0));
        }
    }

    Ok((if negative { -(man as i64) } else { man as i64 }, exponent))
}

/// Add two floats, aligning exponents the way the ledger's IOU amounts do.
pub fn sum(float1: i64, float2: i64) -> i64 {
    reject_invalid!(float1);
    reject_invalid!(float2);
    if float1 == 0 {
        return float2;
    }
    if float2 == 0 {
        return float1;
    }

    let mut man1 = signed_mantissa(float1) as i128;
    let mut exp1 = exponent(float1);
    let mut man2 = signed_mantissa(float2) as i128;
    let mut exp2 = exponent(float2);

    // drop precision from the smaller-exponent operand until aligned
    while exp1 < exp2 {
        man1 /= 10;
        exp1 += 1;
    }
    while exp2 < exp1 {
        man2 /= 10;
        exp2 += 1;
    }

    let total = man1 + man2;
    if total == 0 {
        return 0;
    }
    let negative = total < 0;
    let mut man = total.unsigned_abs();
    while man > MAX_MANTISSA as u128 {
        man /= 10;
        exp1 += 1;
        if exp1 > MAX_EXPONENT {
            return codes::OVERFLOW;
        }
    }
    let mut man = man as u64;
    while man < MIN_MANTISSA {
        man *= 10;
        exp1 -= 1;
        if exp1 < MIN_EXPONENT {
            return 0;
        }
    }

    make_float(if negative { -(man as i64) } else { man as i64 }, exp1)
}

/// Compare two floats under a bitmask of `compare_mode` flags. Returns 1
/// when the relation holds, 0 when it does not.
pub fn compare(float1: i64, float2: i64, mode: u32) -> i64 {
    reject_invalid!(float1);
    reject_invalid!(float2);

    let equal_flag = mode & compare_mode::EQUAL != 0;
    let less_flag = mode & compare_mode::LESS != 0;
    let greater_flag = mode & compare_mode::GREATER != 0;

    if mode == 0 || (equal_flag && less_flag && greater_flag) {
        return codes::INVALID_ARGUMENT;
    }

    let ordering = order(float1, float2);
    let holds = match ordering {
        std::cmp::Ordering::Equal => equal_flag,
        std::cmp::Ordering::Less => less_flag,
        std::cmp::Ordering::Greater => greater_flag,
    };
    holds as i64
}

fn order(float1: i64, float2: i64) -> std::cmp::Ordering {
    use std::cmp::Ordering;

    let sign1 = if float1 == 0 { 0i8 } else if is_negative(float1) { -1 } else { 1 };
    let sign2 = if float2 == 0 { 0i8 } else if is_negative(float2) { -1 } else { 1 };
    if sign1 != sign2 {
        return sign1.cmp(&sign2);
    }
    if sign1 == 0 {
        return Ordering::Equal;
    }

    // same nonzero sign: normalized mantissas make exponent order value
    // order, inverted for negatives
    let magnitude = exponent(float1)
        .cmp(&exponent(float2))
        .then_with(|| mantissa(float1).cmp(&mantissa(float2)));
    if sign1 < 0 {
        magnitude.reverse()
    } else {
        magnitude
    }
}

/// Divide `float1` by `float2` with schoolbook long division over decimal
/// digits.
pub fn divide(float1: i64, float2: i64) -> i64 {
    reject_invalid!(float1);
    reject_invalid!(float2);
    if float2 == 0 {
        return codes::DIVISION_BY_ZERO;
    }
    if float1 == 0 {
        return 0;
    }

    let mut man1 = mantissa(float1);
    let exp1 = exponent(float1);
    let mut man2 = mantissa(float2);
    let mut exp2 = exponent(float2);
    let negative = is_negative(float1) != is_negative(float2);

    // scale the divisor against the dividend so the first quotient digit
    // is nonzero
    while man2 > man1 {
        man2 /= 10;
        exp2 += 1;
    }
    if man2 == 0 {
        return codes::DIVISION_BY_ZERO;
    }
    while man2 < man1 && man2 * 10 <= man1 {
        man2 *= 10;
        exp2 -= 1;
    }

    let mut man3 = 0u64;
    let mut exp3 = exp1 - exp2;
    loop {
        let digit = man1 / man2;
        man1 -= digit * man2;
        man3 = man3 * 10 + digit;
        man2 /= 10;
        if man2 == 0 {
            break;
        }
        exp3 -= 1;
    }

    // normalize
    while man3 != 0 && man3 < MIN_MANTISSA {
        man3 *= 10;
        exp3 -= 1;
        if exp3 < MIN_EXPONENT {
            return 0;
        }
    }
    while man3 > MAX_MANTISSA {
        man3 /= 10;
        exp3 += 1;
        if exp3 > MAX_EXPONENT {
            return codes::INVALID_FLOAT;
        }
    }
    if man3 == 0 {
        return 0;
    }

    make_float(if negative { -(man3 as i64) } else { man3 as i64 }, exp3)
}

/// The reciprocal `1 / float1`.
pub fn invert(float1: i64) -> i64 {
    if float1 == 0 {
        return codes::DIVISION_BY_ZERO;
    }
    divide(crate::ONE, float1)
}

/// Coerce a float to an integer with the decimal point shifted
/// `decimal_places` to the right. Negative inputs require `absolute`.
pub fn float_int(float1: i64, decimal_places: u32, absolute: bool) -> i64 {
    reject_invalid!(float1);
    if float1 == 0 {
        return 0;
    }
    if decimal_places > 15 {
        return codes::INVALID_ARGUMENT;
    }
    if is_negative(float1) && !absolute {
        return codes::CANT_RETURN_NEGATIVE;
    }

    let target_exp = -(decimal_places as i32);
    let mut man = mantissa(float1) as u128;
    let mut exp = exponent(float1);
    while exp > target_exp {
        man *= 10;
        exp -= 1;
        if man > i64::MAX as u128 {
            return codes::TOO_BIG;
        }
    }
    while exp < target_exp {
        man /= 10;
        exp += 1;
    }
    man as i64
}
