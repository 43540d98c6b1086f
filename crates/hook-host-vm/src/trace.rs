//! Trace-text helpers.
//!
//! Some guest toolchains hand the host UTF-16LE strings. The heuristic
//! here spots them so log output stays readable; it is applied to trace
//! messages and exit reasons only, never to semantic payloads.

/// Heuristic UTF-16LE detection: even length, nonzero first byte, every
/// even byte ascii-ish and every odd byte zero.
pub fn is_utf16le(buffer: &[u8]) -> bool {
    if buffer.is_empty() || buffer.len() % 2 != 0 {
        return false;
    }
    buffer
        .chunks_exact(2)
        .all(|pair| pair[0] != 0 && pair[1] == 0)
}

/// Render guest text for logging, downcasting UTF-16LE to one byte per
/// character.
pub fn render_text(buffer: &[u8]) -> String {
    if is_utf16le(buffer) {
        let narrowed: Vec<u8> = buffer.chunks_exact(2).map(|pair| pair[0]).collect();
        String::from_utf8_lossy(&narrowed).into_owned()
    } else {
        String::from_utf8_lossy(buffer).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_utf16le() {
        assert!(is_utf16le(b"h\0i\0"));
        assert!(!is_utf16le(b"hi"));
        assert!(!is_utf16le(b""));
        assert!(!is_utf16le(b"h\0i"));
        assert!(!is_utf16le(b"\0h\0i"));
    }

    #[test]
    fn renders_both_encodings() {
        assert_eq!(render_text(b"h\0i\0"), "hi");
        assert_eq!(render_text(b"plain"), "plain");
    }
}
