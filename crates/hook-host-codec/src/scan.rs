//! Serialized-object scanner.
//!
//! [`parse_field_at`] reads one field — preamble, payload, terminator —
//! without materializing it, returning byte offsets into the scanned
//! buffer. Nesting is capped at `caps::MAX_NESTING` and each object or
//! array scan at `caps::MAX_SCAN_CHILDREN` children.

use hook_host_common::caps;

use crate::field::types;
use crate::vl::decode_vl;
use crate::{CodecError, Result};

/// One decoded field, located inside the buffer it was scanned from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedField {
    /// Serialized type code.
    pub type_code: u8,
    /// Field code within the type.
    pub field_code: u8,
    /// Offset of the first preamble byte.
    pub start: usize,
    /// Offset of the first payload byte. For VL types the length prefix is
    /// excluded; for objects and arrays this is the first child byte.
    pub payload_start: usize,
    /// Payload length. For objects and arrays, the content between
    /// preamble and terminator.
    pub payload_len: usize,
    /// Offset one past the field, terminator included.
    pub end: usize,
}

impl ParsedField {
    /// The packed `(type << 16) | field` id.
    pub fn field_id(&self) -> u32 {
        ((self.type_code as u32) << 16) | self.field_code as u32
    }
}

/// Parse the field starting at `offset`.
pub fn parse_field_at(buf: &[u8], offset: usize) -> Result<ParsedField> {
    scan_at(buf, offset, 0)
}

fn scan_at(buf: &[u8], offset: usize, depth: usize) -> Result<ParsedField> {
    if depth > caps::MAX_NESTING {
        return Err(CodecError::TooDeep);
    }

    let b0 = *buf.get(offset).ok_or(CodecError::Truncated)?;
    let high = b0 >> 4;
    let low = b0 & 0x0F;
    let mut upto = offset + 1;

    let (type_code, field_code) = if high > 0 && low > 0 {
        (high, low)
    } else if high > 0 {
        let f = *buf.get(upto).ok_or(CodecError::Truncated)?;
        upto += 1;
        (high, f)
    } else if low > 0 {
        let t = *buf.get(upto).ok_or(CodecError::Truncated)?;
        upto += 1;
        (t, low)
    } else {
        let t = *buf.get(upto).ok_or(CodecError::Truncated)?;
        let f = *buf.get(upto + 1).ok_or(CodecError::Truncated)?;
        upto += 2;
        (t, f)
    };

    if !types::is_known(type_code) {
        return Err(CodecError::UnknownType(type_code));
    }

    if types::is_vl(type_code) {
        let (len, consumed) = decode_vl(buf.get(upto..).ok_or(CodecError::Truncated)?)?;
        let payload_start = upto + consumed;
        let end = payload_start
            .checked_add(len)
            .filter(|&e| e <= buf.len())
            .ok_or(CodecError::Truncated)?;
        return Ok(ParsedField {
            type_code,
            field_code,
            start: offset,
            payload_start,
            payload_len: len,
            end,
        });
    }

    if let Some(len) = types::fixed_len(type_code) {
        let end = upto
            .checked_add(len)
            .filter(|&e| e <= buf.len())
            .ok_or(CodecError::Truncated)?;
        return Ok(ParsedField {
            type_code,
            field_code,
            start: offset,
            payload_start: upto,
            payload_len: len,
            end,
        });
    }

    if type_code == types::AMOUNT {
        // bit layout of the first payload byte decides the width:
        // 01...... is the native 8-byte form, anything else the 48-byte
        // currency/issuer form
        let first = *buf.get(upto).ok_or(CodecError::Truncated)?;
        let len = if first >> 6 == 1 { 8 } else { 48 };
        let end = upto
            .checked_add(len)
            .filter(|&e| e <= buf.len())
            .ok_or(CodecError::Truncated)?;
        return Ok(ParsedField {
            type_code,
            field_code,
            start: offset,
            payload_start: upto,
            payload_len: len,
            end,
        });
    }

    // object or array: scan children until the terminator
    let terminator = if type_code == types::OBJECT {
        types::OBJECT_END
    } else {
        types::ARRAY_END
    };

    let payload_start = upto;
    let mut cursor = upto;
    for _ in 0..caps::MAX_SCAN_CHILDREN {
        let next = *buf.get(cursor).ok_or(CodecError::Truncated)?;
        if next == terminator {
            return Ok(ParsedField {
                type_code,
                field_code,
                start: offset,
                payload_start,
                payload_len: cursor - payload_start,
                end: cursor + 1,
            });
        }
        let child = scan_at(buf, cursor, depth + 1)?;
        cursor = child.end;
    }
    Err(CodecError::TooManyChildren)
}

/// Count the fields of a bare field sequence (an object or array payload,
/// or a whole serialized transaction).
pub fn count_children(buf: &[u8]) -> Result<usize> {
    let mut count = 0usize;
    let mut cursor = 0usize;
    while cursor < buf.len() {
        if count == caps::MAX_SCAN_CHILDREN {
            return Err(CodecError::TooManyChildren);
        }
        let field = parse_field_at(buf, cursor)?;
        cursor = field.end;
        count += 1;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::sf;

    #[test]
    fn scans_fixed_width_scalar() {
        // Sequence (2,4) = 0
        let buf = [0x24u8, 0, 0, 0, 0];
        let f = parse_field_at(&buf, 0).unwrap();
        assert_eq!(f.field_id(), sf::SEQUENCE);
        assert_eq!((f.payload_start, f.payload_len), (1, 4));
        assert_eq!(f.end, 5);
    }

    #[test]
    fn scans_two_byte_preambles() {
        // field code >= 16: EmitGeneration (2,43)
        let buf = [0x20u8, 43, 0, 0, 0, 7];
        let f = parse_field_at(&buf, 0).unwrap();
        assert_eq!(f.field_id(), sf::EMIT_GENERATION);
        assert_eq!(f.payload_start, 2);

        // type code >= 16: a u8 field (16,16)
        let buf = [0x01u8, 16, 0xAA];
        let f = parse_field_at(&buf, 0).unwrap();
        assert_eq!(f.type_code, 16);
        assert_eq!(f.field_code, 1);
        assert_eq!(f.payload_len, 1);
    }

    #[test]
    fn scans_vl_blob() {
        // SigningPubKey (7,3), 2 bytes
        let buf = [0x73u8, 2, 0xDE, 0xAD];
        let f = parse_field_at(&buf, 0).unwrap();
        assert_eq!(f.field_id(), sf::SIGNING_PUB_KEY);
        assert_eq!(&buf[f.payload_start..f.payload_start + f.payload_len], &[0xDE, 0xAD]);
    }

    #[test]
    fn scans_native_and_iou_amounts() {
        let mut native = vec![0x61u8]; // Amount (6,1)
        native.push(0x40);
        native.extend_from_slice(&[0u8; 7]);
        let f = parse_field_at(&native, 0).unwrap();
        assert_eq!(f.payload_len, 8);

        let mut iou = vec![0x61u8];
        iou.push(0xC0);
        iou.extend_from_slice(&[0u8; 47]);
        let f = parse_field_at(&iou, 0).unwrap();
        assert_eq!(f.payload_len, 48);
    }

    #[test]
    fn scans_nested_object() {
        // object (14,12) { EmitGeneration = 1 } terminated by 0xE1
        let buf = [0xECu8, 0x20, 43, 0, 0, 0, 1, 0xE1];
        let f = parse_field_at(&buf, 0).unwrap();
        assert_eq!(f.field_id(), sf::EMIT_DETAILS);
        assert_eq!((f.payload_start, f.payload_len), (1, 6));
        assert_eq!(f.end, buf.len());
    }

    #[test]
    fn empty_object_parses() {
        let buf = [0xECu8, 0xE1];
        let f = parse_field_at(&buf, 0).unwrap();
        assert_eq!(f.payload_len, 0);
    }

    #[test]
    fn rejects_unknown_types() {
        // type 9 is a hole in the type table
        let buf = [0x91u8, 0, 0];
        assert_eq!(parse_field_at(&buf, 0), Err(CodecError::UnknownType(9)));
    }

    #[test]
    fn rejects_truncation() {
        let buf = [0x24u8, 0, 0];
        assert_eq!(parse_field_at(&buf, 0), Err(CodecError::Truncated));
        // object missing its terminator
        let buf = [0xECu8, 0x20, 43, 0, 0, 0, 1];
        assert_eq!(parse_field_at(&buf, 0), Err(CodecError::Truncated));
    }

    #[test]
    fn rejects_excessive_nesting() {
        // eleven nested objects
        let mut buf = vec![0xECu8; 12];
        buf.extend(std::iter::repeat(0xE1u8).take(12));
        assert_eq!(parse_field_at(&buf, 0), Err(CodecError::TooDeep));
    }

    #[test]
    fn counts_sequence_fields() {
        let mut buf = vec![0x24u8, 0, 0, 0, 0]; // Sequence
        buf.extend_from_slice(&[0x73, 1, 0xAB]); // SigningPubKey
        assert_eq!(count_children(&buf).unwrap(), 2);
        assert_eq!(count_children(&[]).unwrap(), 0);
    }
}
