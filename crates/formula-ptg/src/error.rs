use thiserror::Error;

/// Coarse failure category of a decode error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeErrorKind {
    /// Truncated payload, overrun, out-of-range field or trailing-data mismatch.
    MalformedStream,
    /// An opcode byte with no matching token family.
    UnknownOpcode,
}

/// Structured `rgce` decode failure with ptg id + offset.
///
/// Offsets are relative to the start of the token stream (not the enclosing buffer).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodePtgError {
    #[error("rgce range {offset}+{len} is out of bounds for a {buf_len}-byte buffer")]
    RangeOutOfBounds {
        offset: usize,
        len: usize,
        buf_len: usize,
    },
    #[error("unknown ptg=0x{ptg:02X} at rgce offset {offset}")]
    UnknownPtg { offset: usize, ptg: u8 },
    #[error(
        "unexpected eof decoding ptg=0x{ptg:02X} at rgce offset {offset} (needed {needed} bytes, remaining {remaining})"
    )]
    UnexpectedEof {
        offset: usize,
        ptg: u8,
        needed: usize,
        remaining: usize,
    },
    #[error("reserved class selector in ptg=0x{ptg:02X} at rgce offset {offset}")]
    InvalidClass { offset: usize, ptg: u8 },
    #[error("invalid constant 0x{value:02X} decoding ptg=0x{ptg:02X} at rgce offset {offset}")]
    InvalidConstant { offset: usize, ptg: u8, value: u8 },
    #[error(
        "invalid array constant entry type 0x{value_type:02X} for ptg=0x{ptg:02X} at rgce offset {offset}"
    )]
    InvalidArrayValue {
        offset: usize,
        ptg: u8,
        value_type: u8,
    },
    #[error(
        "function id {func_id} called with {arg_count} arguments (ptg=0x{ptg:02X} at rgce offset {offset})"
    )]
    ArityOutOfRange {
        offset: usize,
        ptg: u8,
        func_id: u16,
        arg_count: u8,
    },
    #[error(
        "unexpected eof reading trailing data for ptg=0x{ptg:02X} at rgce offset {offset} (needed {needed} bytes, remaining {remaining})"
    )]
    TrailingDataEof {
        offset: usize,
        ptg: u8,
        needed: usize,
        remaining: usize,
    },
    #[error("rgce exceeds the {max} token limit at offset {offset}")]
    TooManyTokens { offset: usize, max: usize },
}

impl DecodePtgError {
    pub fn kind(&self) -> DecodeErrorKind {
        match self {
            DecodePtgError::UnknownPtg { .. } => DecodeErrorKind::UnknownOpcode,
            _ => DecodeErrorKind::MalformedStream,
        }
    }

    pub fn offset(&self) -> usize {
        match *self {
            DecodePtgError::RangeOutOfBounds { offset, .. }
            | DecodePtgError::UnknownPtg { offset, .. }
            | DecodePtgError::UnexpectedEof { offset, .. }
            | DecodePtgError::InvalidClass { offset, .. }
            | DecodePtgError::InvalidConstant { offset, .. }
            | DecodePtgError::InvalidArrayValue { offset, .. }
            | DecodePtgError::ArityOutOfRange { offset, .. }
            | DecodePtgError::TrailingDataEof { offset, .. }
            | DecodePtgError::TooManyTokens { offset, .. } => offset,
        }
    }

    pub fn ptg(&self) -> Option<u8> {
        match *self {
            DecodePtgError::UnknownPtg { ptg, .. }
            | DecodePtgError::UnexpectedEof { ptg, .. }
            | DecodePtgError::InvalidClass { ptg, .. }
            | DecodePtgError::InvalidConstant { ptg, .. }
            | DecodePtgError::InvalidArrayValue { ptg, .. }
            | DecodePtgError::ArityOutOfRange { ptg, .. }
            | DecodePtgError::TrailingDataEof { ptg, .. } => Some(ptg),
            DecodePtgError::RangeOutOfBounds { .. } | DecodePtgError::TooManyTokens { .. } => None,
        }
    }
}

/// A token that cannot be represented in BIFF8 `rgce`.
///
/// `index` is the position of the offending token in the sequence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodePtgError {
    #[error("string at token {index} has {len} characters, more than its length field can hold")]
    StringTooLong { index: usize, len: usize },
    #[error("function call at token {index} has {arg_count} arguments (max 127)")]
    ArgCountTooLarge { index: usize, arg_count: u8 },
    #[error("function id {func_id} at token {index} does not fit in 15 bits")]
    FunctionIdTooLarge { index: usize, func_id: u16 },
    #[error("tAttrChoose at token {index} has {offsets} jump offsets for {choices} choices")]
    InvalidJumpTable {
        index: usize,
        choices: u16,
        offsets: usize,
    },
    #[error("array constant at token {index} is {rows}x{cols} with {values} values")]
    InvalidArrayShape {
        index: usize,
        rows: usize,
        cols: usize,
        values: usize,
    },
    #[error("PtgMemArea at token {index} carries {ranges} ranges (max 65535)")]
    TooManyRanges { index: usize, ranges: usize },
    #[error("destination buffer too small: need {needed} bytes at offset {offset}, have {available}")]
    BufferTooSmall {
        offset: usize,
        needed: usize,
        available: usize,
    },
}
