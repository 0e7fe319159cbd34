use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::error::{BufferError, Result};

/// Text encodings understood by `to_text` / `from_text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    /// UTF-8; invalid sequences decode to U+FFFD.
    Utf8,
    /// Lowercase hexadecimal, two digits per byte.
    Hex,
    /// Standard alphabet with padding.
    Base64,
    /// One char per byte, U+0000..=U+00FF.
    Latin1,
    /// 7-bit: the high bit of each byte is dropped.
    Ascii,
    /// UTF-16 little-endian code units.
    Utf16Le,
}

impl TextEncoding {
    pub fn name(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf8",
            TextEncoding::Hex => "hex",
            TextEncoding::Base64 => "base64",
            TextEncoding::Latin1 => "latin1",
            TextEncoding::Ascii => "ascii",
            TextEncoding::Utf16Le => "utf16le",
        }
    }

    /// Render `bytes` as text.
    pub fn encode(&self, bytes: &[u8]) -> String {
        match self {
            TextEncoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            TextEncoding::Hex => hex::encode(bytes),
            TextEncoding::Base64 => STANDARD.encode(bytes),
            TextEncoding::Latin1 => bytes.iter().map(|&b| b as char).collect(),
            TextEncoding::Ascii => bytes.iter().map(|&b| (b & 0x7f) as char).collect(),
            TextEncoding::Utf16Le => {
                let units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                    .collect();
                String::from_utf16_lossy(&units)
            }
        }
    }

    /// Parse `text` back into bytes.
    pub fn decode(&self, text: &str) -> Result<Vec<u8>> {
        match self {
            TextEncoding::Utf8 => Ok(text.as_bytes().to_vec()),
            TextEncoding::Hex => hex::decode(text).map_err(|e| BufferError::InvalidText {
                encoding: self.name(),
                reason: e.to_string(),
            }),
            TextEncoding::Base64 => STANDARD.decode(text).map_err(|e| BufferError::InvalidText {
                encoding: self.name(),
                reason: e.to_string(),
            }),
            TextEncoding::Latin1 => text
                .chars()
                .map(|c| {
                    u8::try_from(u32::from(c)).map_err(|_| BufferError::InvalidText {
                        encoding: self.name(),
                        reason: format!("character {c:?} is outside latin1"),
                    })
                })
                .collect(),
            TextEncoding::Ascii => text
                .chars()
                .map(|c| {
                    if c.is_ascii() {
                        Ok(c as u8)
                    } else {
                        Err(BufferError::InvalidText {
                            encoding: self.name(),
                            reason: format!("character {c:?} is not ascii"),
                        })
                    }
                })
                .collect(),
            TextEncoding::Utf16Le => Ok(text.encode_utf16().flat_map(u16::to_le_bytes).collect()),
        }
    }
}

impl FromStr for TextEncoding {
    type Err = BufferError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" => Ok(TextEncoding::Utf8),
            "hex" => Ok(TextEncoding::Hex),
            "base64" => Ok(TextEncoding::Base64),
            "latin1" | "binary" => Ok(TextEncoding::Latin1),
            "ascii" => Ok(TextEncoding::Ascii),
            "utf16le" | "utf-16le" | "ucs2" | "ucs-2" => Ok(TextEncoding::Utf16Le),
            _ => Err(BufferError::UnknownEncoding(s.to_string())),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
