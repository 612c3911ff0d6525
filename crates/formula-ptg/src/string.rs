//! BIFF8 unicode strings as they appear inside formulas.
//!
//! Both `PtgStr` (ShortXLUnicodeString, 8-bit length) and array-constant strings
//! (XLUnicodeString, 16-bit length) store a flags byte followed by either `cch` Latin-1 bytes
//! (`fHighByte = 0`) or `cch` UTF-16LE code units (`fHighByte = 1`). The stored form is kept
//! as-is: wide strings hold raw code units, so unpaired surrogates survive a round trip.

use crate::error::{DecodePtgError, EncodePtgError};
use crate::reader::PtgReader;

const STR_FLAG_HIGH_BYTE: u8 = 0x01;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BiffString {
    /// `fHighByte = 0`: one Latin-1 byte per character.
    Compressed(Vec<u8>),
    /// `fHighByte = 1`: UTF-16LE code units, not necessarily valid UTF-16.
    Wide(Vec<u16>),
}

impl BiffString {
    /// Build a string using the compact Latin-1 form whenever every character allows it.
    pub fn new(text: impl AsRef<str>) -> Self {
        let text = text.as_ref();
        if text.chars().all(|ch| (ch as u32) <= 0xFF) {
            BiffString::Compressed(text.chars().map(|ch| ch as u32 as u8).collect())
        } else {
            BiffString::wide(text)
        }
    }

    /// Build a string stored as UTF-16 regardless of its contents.
    pub fn wide(text: impl AsRef<str>) -> Self {
        BiffString::Wide(text.as_ref().encode_utf16().collect())
    }

    pub fn is_wide(&self) -> bool {
        matches!(self, BiffString::Wide(_))
    }

    /// Character count as stored on disk (`cch`).
    pub fn cch(&self) -> usize {
        match self {
            BiffString::Compressed(bytes) => bytes.len(),
            BiffString::Wide(units) => units.len(),
        }
    }

    /// Flags byte plus character data (excluding the `cch` prefix).
    pub fn body_len(&self) -> usize {
        match self {
            BiffString::Compressed(bytes) => 1 + bytes.len(),
            BiffString::Wide(units) => 1 + 2 * units.len(),
        }
    }

    /// The text, or `None` for a wide string with unpaired surrogates.
    pub fn to_text(&self) -> Option<String> {
        match self {
            BiffString::Compressed(bytes) => Some(bytes.iter().copied().map(char::from).collect()),
            BiffString::Wide(units) => String::from_utf16(units).ok(),
        }
    }

    /// The text with unpaired surrogates replaced by U+FFFD.
    pub fn to_string_lossy(&self) -> String {
        match self {
            BiffString::Compressed(bytes) => bytes.iter().copied().map(char::from).collect(),
            BiffString::Wide(units) => String::from_utf16_lossy(units),
        }
    }

    pub(crate) fn read_body(r: &mut PtgReader<'_>, cch: usize) -> Result<Self, DecodePtgError> {
        let flags = r.u8()?;
        if flags & !STR_FLAG_HIGH_BYTE != 0 {
            return Err(DecodePtgError::InvalidConstant {
                offset: r.ptg_offset(),
                ptg: r.ptg(),
                value: flags,
            });
        }
        if flags & STR_FLAG_HIGH_BYTE != 0 {
            let raw = r.bytes(cch.saturating_mul(2))?;
            let units = raw
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect();
            Ok(BiffString::Wide(units))
        } else {
            Ok(BiffString::Compressed(r.bytes(cch)?.to_vec()))
        }
    }

    /// Check that the string fits a `cch` field of at most `max_cch`.
    pub(crate) fn validate(&self, index: usize, max_cch: usize) -> Result<(), EncodePtgError> {
        let len = self.cch();
        if len > max_cch {
            return Err(EncodePtgError::StringTooLong { index, len });
        }
        Ok(())
    }

    /// Write the flags byte and character data.
    pub(crate) fn write_body(&self, out: &mut Vec<u8>) {
        match self {
            BiffString::Compressed(bytes) => {
                out.push(0);
                out.extend_from_slice(bytes);
            }
            BiffString::Wide(units) => {
                out.push(STR_FLAG_HIGH_BYTE);
                for unit in units {
                    out.extend_from_slice(&unit.to_le_bytes());
                }
            }
        }
    }
}
