//! Best-effort encoding detection and decoding.
//!
//! Diagnostic bundles mix UTF-8 logs, UTF-16 registry exports and legacy
//! single-byte journals. Detection looks at byte-order marks first, then
//! UTF-8 validity of a bounded prefix, then the share of NUL bytes.
//! Decoding never fails: anything that is not UTF-8 or UTF-16 is read as
//! Latin-1.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Bytes inspected by [`TextEncoding::detect`].
const DETECT_WINDOW: usize = 8 * 1024;

/// Detected text encoding of a file or buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextEncoding {
    Utf8,
    Utf8Bom,
    Utf16Le,
    Utf16Be,
    Latin1,
    Binary,
}

impl TextEncoding {
    /// Detect the encoding of `bytes` from a bounded prefix.
    #[must_use]
    pub fn detect(bytes: &[u8]) -> Self {
        if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
            return Self::Utf8Bom;
        }
        if bytes.starts_with(&[0xFF, 0xFE]) {
            return Self::Utf16Le;
        }
        if bytes.starts_with(&[0xFE, 0xFF]) {
            return Self::Utf16Be;
        }

        let window = &bytes[..bytes.len().min(DETECT_WINDOW)];
        match std::str::from_utf8(window) {
            Ok(_) => {}
            // A multi-byte sequence cut by the window edge is still UTF-8.
            Err(error) if error.error_len().is_none() && window.len() < bytes.len() => {}
            Err(_) => {
                let nul = window.iter().filter(|&&b| b == 0).count();
                return if nul * 10 > window.len() {
                    Self::Binary
                } else {
                    Self::Latin1
                };
            }
        }

        if window.contains(&0) {
            let nul = window.iter().filter(|&&b| b == 0).count();
            if nul * 10 > window.len() {
                return Self::Binary;
            }
        }
        Self::Utf8
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Utf8 => "utf8",
            Self::Utf8Bom => "utf8_bom",
            Self::Utf16Le => "utf16_le",
            Self::Utf16Be => "utf16_be",
            Self::Latin1 => "latin1",
            Self::Binary => "binary",
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decode `bytes` to text, using the detected encoding.
///
/// UTF-8 input is borrowed; everything else is converted. Binary input is
/// decoded as Latin-1 so callers can still search it for markers.
#[must_use]
pub fn decode(bytes: &[u8]) -> Cow<'_, str> {
    match TextEncoding::detect(bytes) {
        TextEncoding::Utf8Bom => String::from_utf8_lossy(&bytes[3..]),
        TextEncoding::Utf16Le => Cow::Owned(decode_utf16(&bytes[2..], u16::from_le_bytes)),
        TextEncoding::Utf16Be => Cow::Owned(decode_utf16(&bytes[2..], u16::from_be_bytes)),
        TextEncoding::Utf8 => String::from_utf8_lossy(bytes),
        TextEncoding::Latin1 | TextEncoding::Binary => {
            Cow::Owned(bytes.iter().map(|&b| char::from(b)).collect())
        }
    }
}

fn decode_utf16(bytes: &[u8], read: fn([u8; 2]) -> u16) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| read([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn detects_plain_utf8() {
        assert_eq!(TextEncoding::detect(b"10:15:02 3201 card inserted"), TextEncoding::Utf8);
        assert_eq!(TextEncoding::detect("Ünïcode".as_bytes()), TextEncoding::Utf8);
    }

    #[test]
    fn detects_byte_order_marks() {
        assert_eq!(TextEncoding::detect(&[0xEF, 0xBB, 0xBF, b'a']), TextEncoding::Utf8Bom);
        assert_eq!(TextEncoding::detect(&[0xFF, 0xFE, b'a', 0]), TextEncoding::Utf16Le);
        assert_eq!(TextEncoding::detect(&[0xFE, 0xFF, 0, b'a']), TextEncoding::Utf16Be);
    }

    #[test]
    fn invalid_utf8_falls_back_to_latin1() {
        let bytes = [b'c', b'a', b'f', 0xE9, b' ', b'o', b'k'];
        assert_eq!(TextEncoding::detect(&bytes), TextEncoding::Latin1);
        assert_eq!(decode(&bytes), "café ok");
    }

    #[test]
    fn nul_heavy_input_is_binary() {
        let bytes = [0u8, 1, 0, 2, 0, 3, 0, 0xFF];
        assert_eq!(TextEncoding::detect(&bytes), TextEncoding::Binary);
    }

    #[test]
    fn decodes_utf16_registry_export() {
        let text = "Windows Registry Editor Version 5.00";
        let mut bytes = vec![0xFF, 0xFE];
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(decode(&bytes), text);
    }

    #[test]
    fn strips_utf8_bom() {
        assert_eq!(decode(&[0xEF, 0xBB, 0xBF, b'h', b'i']), "hi");
    }
}
