//! Application-presentation text boundary.
//!
//! Everything below this module (the parser, negotiation engine, input
//! assembler, output buffer) treats bytes as opaque. Only here, at the
//! edge where application text meets the wire, do bytes become `String`
//! and back, using Windows-1252 (CP1252), a superset of ISO-8859-1 wide
//! enough to cover legacy terminal clients without pulling in a full
//! multi-byte negotiation story.

use encoding_rs::WINDOWS_1252;

/// The result of decoding a byte slice to text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeResult {
    /// The decoded text.
    pub text: String,
    /// Set if any byte required lossy substitution.
    pub had_errors: bool,
}

/// The result of encoding text to bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeResult {
    /// The encoded bytes.
    pub bytes: Vec<u8>,
    /// Set if any character had no CP1252 representation.
    pub had_errors: bool,
}

/// Decode raw bytes received from a client into text.
pub fn decode_from_client(bytes: &[u8]) -> DecodeResult {
    let (cow, _, had_errors) = WINDOWS_1252.decode(bytes);
    DecodeResult {
        text: cow.into_owned(),
        had_errors,
    }
}

/// Encode text for transmission to a client.
pub fn encode_for_client(text: &str) -> EncodeResult {
    let (cow, _, had_errors) = WINDOWS_1252.encode(text);
    EncodeResult {
        bytes: cow.into_owned(),
        had_errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_plain_ascii() {
        let result = decode_from_client(b"hello");
        assert_eq!(result.text, "hello");
        assert!(!result.had_errors);
    }

    #[test]
    fn test_encode_plain_ascii() {
        let result = encode_for_client("hello");
        assert_eq!(result.bytes, b"hello");
        assert!(!result.had_errors);
    }

    #[test]
    fn test_decode_cp1252_high_byte() {
        // 0x93 is a CP1252 "left double quote" (U+201C), unmapped in plain
        // Latin-1.
        let result = decode_from_client(&[0x93, b'h', b'i', 0x94]);
        assert!(!result.had_errors);
        assert!(result.text.contains('\u{201C}'));
    }

    #[test]
    fn test_roundtrip_latin1_byte() {
        let result = decode_from_client(&[0xE9]); // 'é'
        assert!(!result.had_errors);
        let encoded = encode_for_client(&result.text);
        assert_eq!(encoded.bytes, vec![0xE9]);
        assert!(!encoded.had_errors);
    }

    #[test]
    fn test_encode_unmappable_character_reports_error() {
        let result = encode_for_client("\u{4e2d}"); // a CJK character
        assert!(result.had_errors);
    }
}
