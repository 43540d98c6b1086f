//! Variable-length prefix codec.
//!
//! Lengths up to 192 take one byte, up to 12480 two bytes, and up to
//! 918744 three bytes.

use crate::{CodecError, Result};

/// Largest length the 3-byte form can carry.
pub const MAX_VL: usize = 918_744;

/// Decode a VL prefix. Returns `(payload_length, prefix_length)`.
pub fn decode_vl(buf: &[u8]) -> Result<(usize, usize)> {
    let b1 = *buf.first().ok_or(CodecError::Truncated)? as usize;
    if b1 < 193 {
        Ok((b1, 1))
    } else if b1 < 241 {
        let b2 = *buf.get(1).ok_or(CodecError::Truncated)? as usize;
        Ok((193 + (b1 - 193) * 256 + b2, 2))
    } else {
        let b2 = *buf.get(1).ok_or(CodecError::Truncated)? as usize;
        let b3 = *buf.get(2).ok_or(CodecError::Truncated)? as usize;
        Ok((12481 + (b1 - 241) * 65536 + b2 * 256 + b3, 3))
    }
}

/// Encode a VL prefix for `len` payload bytes.
///
/// # Panics
///
/// Panics if `len` exceeds [`MAX_VL`]; callers cap their inputs well below
/// it.
pub fn encode_vl(len: usize) -> Vec<u8> {
    if len <= 192 {
        vec![len as u8]
    } else if len <= 12480 {
        let adj = len - 193;
        vec![(193 + adj / 256) as u8, (adj % 256) as u8]
    } else if len <= MAX_VL {
        let adj = len - 12481;
        vec![
            (241 + adj / 65536) as u8,
            ((adj / 256) % 256) as u8,
            (adj % 256) as u8,
        ]
    } else {
        panic!("VL length {} exceeds the encodable maximum", len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_boundaries() {
        for len in [0usize, 1, 192, 193, 194, 12480, 12481, 12482, MAX_VL] {
            let prefix = encode_vl(len);
            let (decoded, consumed) = decode_vl(&prefix).unwrap();
            assert_eq!(decoded, len, "len {}", len);
            assert_eq!(consumed, prefix.len(), "len {}", len);
        }
    }

    #[test]
    fn prefix_widths() {
        assert_eq!(encode_vl(192).len(), 1);
        assert_eq!(encode_vl(193).len(), 2);
        assert_eq!(encode_vl(12480).len(), 2);
        assert_eq!(encode_vl(12481).len(), 3);
    }

    #[test]
    fn truncated_prefix() {
        assert_eq!(decode_vl(&[]), Err(CodecError::Truncated));
        assert_eq!(decode_vl(&[200]), Err(CodecError::Truncated));
        assert_eq!(decode_vl(&[241, 0]), Err(CodecError::Truncated));
    }
}
