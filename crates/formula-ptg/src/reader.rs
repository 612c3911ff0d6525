use crate::error::DecodePtgError;

/// Bounds-checked little-endian reader over one token's payload.
///
/// Every read failure is reported against the token that owns the bytes (`ptg_offset` and
/// `ptg`), so a truncated stream points at the token that was cut short rather than at the end
/// of the buffer.
pub(crate) struct PtgReader<'a> {
    data: &'a [u8],
    pos: usize,
    ptg_offset: usize,
    ptg: u8,
    trailing: bool,
}

impl<'a> PtgReader<'a> {
    pub(crate) fn new(data: &'a [u8], pos: usize) -> Self {
        Self {
            data,
            pos,
            ptg_offset: pos,
            ptg: 0,
            trailing: false,
        }
    }

    /// Reader over the trailing (`rgcb`) data block that follows the token stream.
    pub(crate) fn trailing(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            ptg_offset: 0,
            ptg: 0,
            trailing: true,
        }
    }

    /// Attribute subsequent failures to the token with opcode `ptg` at `ptg_offset`.
    pub(crate) fn begin_token(&mut self, ptg_offset: usize, ptg: u8) {
        self.ptg_offset = ptg_offset;
        self.ptg = ptg;
    }

    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    pub(crate) fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub(crate) fn ptg_offset(&self) -> usize {
        self.ptg_offset
    }

    pub(crate) fn ptg(&self) -> u8 {
        self.ptg
    }

    pub(crate) fn eof(&self, needed: usize) -> DecodePtgError {
        let remaining = self.remaining();
        if self.trailing {
            DecodePtgError::TrailingDataEof {
                offset: self.ptg_offset,
                ptg: self.ptg,
                needed,
                remaining,
            }
        } else {
            DecodePtgError::UnexpectedEof {
                offset: self.ptg_offset,
                ptg: self.ptg,
                needed,
                remaining,
            }
        }
    }

    /// Fail unless at least `needed` bytes remain. Used to reject a token up front so no
    /// partially-read token is ever produced.
    pub(crate) fn require(&self, needed: usize) -> Result<(), DecodePtgError> {
        if self.remaining() < needed {
            return Err(self.eof(needed));
        }
        Ok(())
    }

    pub(crate) fn bytes(&mut self, len: usize) -> Result<&'a [u8], DecodePtgError> {
        self.require(len)?;
        let out = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }

    pub(crate) fn array<const N: usize>(&mut self) -> Result<[u8; N], DecodePtgError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.bytes(N)?);
        Ok(out)
    }

    pub(crate) fn u8(&mut self) -> Result<u8, DecodePtgError> {
        Ok(self.array::<1>()?[0])
    }

    pub(crate) fn u16(&mut self) -> Result<u16, DecodePtgError> {
        Ok(u16::from_le_bytes(self.array()?))
    }

    pub(crate) fn u32(&mut self) -> Result<u32, DecodePtgError> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    pub(crate) fn f64(&mut self) -> Result<f64, DecodePtgError> {
        Ok(f64::from_le_bytes(self.array()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian_fields() {
        let data = [0x1E, 0x34, 0x12, 0x78, 0x56, 0x34, 0x12];
        let mut r = PtgReader::new(&data, 1);
        assert_eq!(r.u16().unwrap(), 0x1234);
        assert_eq!(r.u32().unwrap(), 0x1234_5678);
        assert!(r.is_empty());
    }

    #[test]
    fn eof_is_attributed_to_the_current_token() {
        let data = [0x1E, 0x01, 0x00, 0x1F, 0x00];
        let mut r = PtgReader::new(&data, 4);
        r.begin_token(3, 0x1F);
        assert_eq!(
            r.f64().unwrap_err(),
            DecodePtgError::UnexpectedEof {
                offset: 3,
                ptg: 0x1F,
                needed: 8,
                remaining: 1,
            }
        );
    }

    #[test]
    fn trailing_reader_reports_trailing_eof() {
        let mut r = PtgReader::trailing(&[0x01]);
        r.begin_token(7, 0x40);
        assert!(matches!(
            r.u16().unwrap_err(),
            DecodePtgError::TrailingDataEof {
                offset: 7,
                ptg: 0x40,
                needed: 2,
                remaining: 1
            }
        ));
    }
}
