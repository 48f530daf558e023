// SPDX-License-Identifier: Apache-2.0

use crate::error::Malformed;

/// Pure helpers for decoding JSON string escapes.
pub(crate) struct EscapeProcessor;

impl EscapeProcessor {
    /// Process a simple escape sequence character and return the unescaped byte.
    ///
    /// # Arguments
    /// * `escape_char` - The character following the backslash in an escape sequence
    pub fn process_simple_escape(escape_char: u8) -> Result<u8, Malformed> {
        match escape_char {
            b'n' => Ok(b'\n'),
            b't' => Ok(b'\t'),
            b'r' => Ok(b'\r'),
            b'\\' => Ok(b'\\'),
            b'"' => Ok(b'"'),
            b'/' => Ok(b'/'),
            b'b' => Ok(0x08), // Backspace
            b'f' => Ok(0x0C), // Form feed
            _ => Err(Malformed::InvalidEscapeSequence),
        }
    }

    /// The numeric value (0-15) of a hex digit.
    pub fn validate_hex_digit(byte: u8) -> Result<u32, Malformed> {
        match byte {
            b'0'..=b'9' => Ok((byte - b'0') as u32),
            b'a'..=b'f' => Ok((byte - b'a' + 10) as u32),
            b'A'..=b'F' => Ok((byte - b'A' + 10) as u32),
            _ => Err(Malformed::InvalidUnicodeHex),
        }
    }

    /// Decode the four hex digits of a `\uXXXX` escape.
    pub fn decode_hex4(hex: [u8; 4]) -> Result<u32, Malformed> {
        let mut codepoint = 0u32;
        for byte in hex {
            codepoint = (codepoint << 4) | Self::validate_hex_digit(byte)?;
        }
        Ok(codepoint)
    }

    /// Check if a Unicode codepoint is a high surrogate (0xD800-0xDBFF)
    pub fn is_high_surrogate(codepoint: u32) -> bool {
        (0xD800..=0xDBFF).contains(&codepoint)
    }

    /// Check if a Unicode codepoint is a low surrogate (0xDC00-0xDFFF)
    pub fn is_low_surrogate(codepoint: u32) -> bool {
        (0xDC00..=0xDFFF).contains(&codepoint)
    }

    /// Combine a high and low surrogate pair into a single character.
    pub fn combine_surrogate_pair(high: u32, low: u32) -> Result<char, Malformed> {
        if !Self::is_high_surrogate(high) || !Self::is_low_surrogate(low) {
            return Err(Malformed::InvalidUnicodeCodepoint);
        }
        let codepoint = 0x10000 + ((high & 0x3FF) << 10) + (low & 0x3FF);
        char::from_u32(codepoint).ok_or(Malformed::InvalidUnicodeCodepoint)
    }

    /// A codepoint from a single `\u` escape that is not part of a pair.
    pub fn single_codepoint(codepoint: u32) -> Result<char, Malformed> {
        if Self::is_low_surrogate(codepoint) || Self::is_high_surrogate(codepoint) {
            return Err(Malformed::InvalidUnicodeCodepoint);
        }
        char::from_u32(codepoint).ok_or(Malformed::InvalidUnicodeCodepoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_escapes() {
        assert_eq!(EscapeProcessor::process_simple_escape(b'n'), Ok(b'\n'));
        assert_eq!(EscapeProcessor::process_simple_escape(b'b'), Ok(0x08));
        assert_eq!(EscapeProcessor::process_simple_escape(b'/'), Ok(b'/'));
        assert_eq!(
            EscapeProcessor::process_simple_escape(b'x'),
            Err(Malformed::InvalidEscapeSequence)
        );
    }

    #[test]
    fn test_hex_decoding() {
        assert_eq!(EscapeProcessor::decode_hex4(*b"0041"), Ok(0x41));
        assert_eq!(EscapeProcessor::decode_hex4(*b"d83D"), Ok(0xD83D));
        assert_eq!(
            EscapeProcessor::decode_hex4(*b"00G1"),
            Err(Malformed::InvalidUnicodeHex)
        );
    }

    #[test]
    fn test_surrogate_pairs() {
        // U+1F600 GRINNING FACE
        assert_eq!(
            EscapeProcessor::combine_surrogate_pair(0xD83D, 0xDE00),
            Ok('\u{1F600}')
        );
        assert_eq!(
            EscapeProcessor::combine_surrogate_pair(0xDE00, 0xD83D),
            Err(Malformed::InvalidUnicodeCodepoint)
        );
    }

    #[test]
    fn test_lone_surrogates_are_rejected() {
        assert_eq!(
            EscapeProcessor::single_codepoint(0xDC00),
            Err(Malformed::InvalidUnicodeCodepoint)
        );
        assert_eq!(EscapeProcessor::single_codepoint(0xE9), Ok('é'));
    }
}
