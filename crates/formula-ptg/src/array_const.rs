//! Array constants (`{1,2;3,4}`) carried by `PtgArray`.
//!
//! The `PtgArray` token itself only holds 7 reserved bytes. The array values live in the
//! trailing data block (`rgcb`) that follows the whole token stream:
//!
//! ```text
//! [ccol-1: u8][crw-1: u16] then ccol*crw entries in row-major order:
//!   0x00 empty   [reserved: 8]
//!   0x01 number  [f64]
//!   0x02 string  [cch: u16][flags: u8][chars]
//!   0x04 bool    [u8][reserved: 7]
//!   0x10 error   [u8][reserved: 7]
//! ```
//!
//! Reserved padding is not kept; it is written back as zeros.

use crate::error::{DecodePtgError, EncodePtgError};
use crate::ptg::error_literal;
use crate::reader::PtgReader;
use crate::string::BiffString;

const VALUE_EMPTY: u8 = 0x00;
const VALUE_NUMBER: u8 = 0x01;
const VALUE_STRING: u8 = 0x02;
const VALUE_BOOL: u8 = 0x04;
const VALUE_ERROR: u8 = 0x10;

pub const MAX_ARRAY_COLS: usize = 256;
pub const MAX_ARRAY_ROWS: usize = 65536;

// Smallest entry on disk: an empty string (type byte, cch u16, flags byte).
const MIN_ENTRY_LEN: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub enum ArrayValue {
    Empty,
    Number(f64),
    Str(BiffString),
    Bool(bool),
    /// BIFF error code (see [`error_literal`]).
    Error(u8),
}

impl ArrayValue {
    fn encoded_len(&self) -> usize {
        match self {
            ArrayValue::Str(s) => 1 + 2 + s.body_len(),
            _ => 9,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayConstant {
    pub rows: usize,
    pub cols: usize,
    /// Row-major values; `values.len() == rows * cols`.
    pub values: Vec<ArrayValue>,
}

impl ArrayConstant {
    pub fn new(rows: usize, cols: usize, values: Vec<ArrayValue>) -> Self {
        Self { rows, cols, values }
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&ArrayValue> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.values.get(row * self.cols + col)
    }

    /// Size of this constant's block in the trailing data.
    pub fn encoded_len(&self) -> usize {
        3 + self.values.iter().map(ArrayValue::encoded_len).sum::<usize>()
    }

    pub(crate) fn read(r: &mut PtgReader<'_>) -> Result<Self, DecodePtgError> {
        let cols = r.u8()? as usize + 1;
        let rows = r.u16()? as usize + 1;
        let count = rows * cols;

        // Reject impossible counts before allocating.
        r.require(count.saturating_mul(MIN_ENTRY_LEN))?;

        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            values.push(read_value(r)?);
        }
        Ok(Self { rows, cols, values })
    }

    pub(crate) fn validate(&self, index: usize) -> Result<(), EncodePtgError> {
        let shape_ok = (1..=MAX_ARRAY_COLS).contains(&self.cols)
            && (1..=MAX_ARRAY_ROWS).contains(&self.rows)
            && self.values.len() == self.rows * self.cols;
        if !shape_ok {
            return Err(EncodePtgError::InvalidArrayShape {
                index,
                rows: self.rows,
                cols: self.cols,
                values: self.values.len(),
            });
        }
        for value in &self.values {
            if let ArrayValue::Str(s) = value {
                s.validate(index, u16::MAX as usize)?;
            }
        }
        Ok(())
    }

    pub(crate) fn write(&self, out: &mut Vec<u8>) {
        out.push((self.cols - 1) as u8);
        out.extend_from_slice(&((self.rows - 1) as u16).to_le_bytes());
        for value in &self.values {
            match value {
                ArrayValue::Empty => {
                    out.push(VALUE_EMPTY);
                    out.extend_from_slice(&[0; 8]);
                }
                ArrayValue::Number(n) => {
                    out.push(VALUE_NUMBER);
                    out.extend_from_slice(&n.to_le_bytes());
                }
                ArrayValue::Str(s) => {
                    out.push(VALUE_STRING);
                    out.extend_from_slice(&(s.cch() as u16).to_le_bytes());
                    s.write_body(out);
                }
                ArrayValue::Bool(b) => {
                    out.push(VALUE_BOOL);
                    out.push(u8::from(*b));
                    out.extend_from_slice(&[0; 7]);
                }
                ArrayValue::Error(code) => {
                    out.push(VALUE_ERROR);
                    out.push(*code);
                    out.extend_from_slice(&[0; 7]);
                }
            }
        }
    }
}

fn read_value(r: &mut PtgReader<'_>) -> Result<ArrayValue, DecodePtgError> {
    let value_type = r.u8()?;
    match value_type {
        VALUE_EMPTY => {
            r.bytes(8)?;
            Ok(ArrayValue::Empty)
        }
        VALUE_NUMBER => Ok(ArrayValue::Number(r.f64()?)),
        VALUE_STRING => {
            let cch = r.u16()? as usize;
            Ok(ArrayValue::Str(BiffString::read_body(r, cch)?))
        }
        VALUE_BOOL => {
            let b = r.u8()?;
            r.bytes(7)?;
            match b {
                0 | 1 => Ok(ArrayValue::Bool(b == 1)),
                _ => Err(DecodePtgError::InvalidConstant {
                    offset: r.ptg_offset(),
                    ptg: r.ptg(),
                    value: b,
                }),
            }
        }
        VALUE_ERROR => {
            let code = r.u8()?;
            r.bytes(7)?;
            if error_literal(code).is_none() {
                return Err(DecodePtgError::InvalidConstant {
                    offset: r.ptg_offset(),
                    ptg: r.ptg(),
                    value: code,
                });
            }
            Ok(ArrayValue::Error(code))
        }
        _ => Err(DecodePtgError::InvalidArrayValue {
            offset: r.ptg_offset(),
            ptg: r.ptg(),
            value_type,
        }),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn one_by_two() -> Vec<u8> {
        let mut rgcb = vec![0x01, 0x00, 0x00]; // 2 cols, 1 row
        rgcb.push(VALUE_NUMBER);
        rgcb.extend_from_slice(&1.5f64.to_le_bytes());
        rgcb.extend_from_slice(&[VALUE_STRING, 0x02, 0x00, 0x00, b'h', b'i']);
        rgcb
    }

    #[test]
    fn reads_row_major_values() {
        let rgcb = one_by_two();
        let mut r = PtgReader::trailing(&rgcb);
        let array = ArrayConstant::read(&mut r).expect("decode");
        assert!(r.is_empty());
        assert_eq!(array.rows, 1);
        assert_eq!(array.cols, 2);
        assert_eq!(array.get(0, 0), Some(&ArrayValue::Number(1.5)));
        assert_eq!(
            array.get(0, 1),
            Some(&ArrayValue::Str(BiffString::new("hi")))
        );
        assert_eq!(array.get(1, 0), None);

        let mut out = Vec::new();
        array.write(&mut out);
        assert_eq!(out, rgcb);
        assert_eq!(array.encoded_len(), rgcb.len());
    }

    #[test]
    fn rejects_unknown_entry_type() {
        let rgcb = [0x00, 0x00, 0x00, 0x03, 0, 0, 0, 0, 0, 0, 0, 0];
        let mut r = PtgReader::trailing(&rgcb);
        r.begin_token(5, 0x60);
        assert_eq!(
            ArrayConstant::read(&mut r),
            Err(DecodePtgError::InvalidArrayValue {
                offset: 5,
                ptg: 0x60,
                value_type: 0x03
            })
        );
    }

    #[test]
    fn huge_declared_shape_fails_without_allocating() {
        let rgcb = [0xFF, 0xFF, 0xFF];
        let mut r = PtgReader::trailing(&rgcb);
        assert!(matches!(
            ArrayConstant::read(&mut r),
            Err(DecodePtgError::TrailingDataEof { .. })
        ));
    }

    #[test]
    fn validate_checks_shape() {
        let array = ArrayConstant::new(2, 2, vec![ArrayValue::Empty; 3]);
        assert_eq!(
            array.validate(0),
            Err(EncodePtgError::InvalidArrayShape {
                index: 0,
                rows: 2,
                cols: 2,
                values: 3
            })
        );
    }
}
