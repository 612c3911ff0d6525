//! `rgce` token stream decode and encode.
//!
//! Decode walks the declared `cce` bytes one token at a time and requires the cursor to land
//! exactly on the end of the stream. Tokens that own trailing data (`PtgArray`, `PtgMemArea`)
//! then read their blocks, in token order, from the bytes that follow the stream.
//!
//! Encode is two-pass: [`encoded_size`] validates every token and sums the widths without
//! emitting anything, then the bytes are written in one go.

use crate::array_const::ArrayConstant;
use crate::class::{split_opcode, PtgClass, ReservedClassPolicy, SplitOpcode};
use crate::error::{DecodePtgError, EncodePtgError};
use crate::function_table::{function_spec_from_id, FTAB_USER_DEFINED};
use crate::options::DecodeOptions;
use crate::ptg::{error_literal, read, Ptg, PtgKind};
use crate::reader::PtgReader;

/// Result of decoding a token stream.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedPtgs {
    pub ptgs: Vec<Ptg>,
    /// Bytes of the token stream consumed (always the declared length).
    pub rgce_len: usize,
    /// Bytes of trailing data consumed after the stream.
    pub rgcb_len: usize,
}

/// Byte widths computed by the first encode pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedSize {
    pub rgce_len: usize,
    pub rgcb_len: usize,
}

impl EncodedSize {
    pub fn total(&self) -> usize {
        self.rgce_len + self.rgcb_len
    }
}

/// Encoded token stream plus the trailing data block that follows it on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodedPtgs {
    pub rgce: Vec<u8>,
    pub rgcb: Vec<u8>,
}

impl EncodedPtgs {
    /// `rgce` followed by `rgcb`, as stored in a `FORMULA`/`ARRAY`/`NAME` record.
    pub fn into_bytes(self) -> Vec<u8> {
        let mut out = self.rgce;
        out.extend_from_slice(&self.rgcb);
        out
    }
}

/// Decode `len` bytes of token stream starting at `offset` in `buf`.
///
/// Trailing data for `PtgArray`/`PtgMemArea` is read from the bytes following the stream. Error
/// offsets are relative to `offset`.
pub fn decode_ptgs(
    buf: &[u8],
    offset: usize,
    len: usize,
    opts: &DecodeOptions,
) -> Result<DecodedPtgs, DecodePtgError> {
    let out_of_bounds = || DecodePtgError::RangeOutOfBounds {
        offset,
        len,
        buf_len: buf.len(),
    };
    let end = offset.checked_add(len).ok_or_else(out_of_bounds)?;
    let rgce = buf.get(offset..end).ok_or_else(out_of_bounds)?;
    let rgcb = buf.get(end..).unwrap_or_default();
    decode_parts(rgce, rgcb, opts)
}

/// Decode a complete token stream with default options and no trailing data.
pub fn decode_rgce(rgce: &[u8]) -> Result<Vec<Ptg>, DecodePtgError> {
    decode_rgce_with_rgcb(rgce, &[])
}

/// Decode a token stream whose trailing data is stored separately.
pub fn decode_rgce_with_rgcb(rgce: &[u8], rgcb: &[u8]) -> Result<Vec<Ptg>, DecodePtgError> {
    decode_parts(rgce, rgcb, &DecodeOptions::default()).map(|decoded| decoded.ptgs)
}

/// Like [`decode_ptgs`], but with the trailing data in its own buffer; returns the consumed
/// lengths alongside the tokens.
pub fn decode_rgce_with_options(
    rgce: &[u8],
    rgcb: &[u8],
    opts: &DecodeOptions,
) -> Result<DecodedPtgs, DecodePtgError> {
    decode_parts(rgce, rgcb, opts)
}

fn decode_parts(
    rgce: &[u8],
    rgcb: &[u8],
    opts: &DecodeOptions,
) -> Result<DecodedPtgs, DecodePtgError> {
    let mut r = PtgReader::new(rgce, 0);
    let mut ptgs = Vec::new();
    // (token index, rgce offset, opcode byte) of tokens that own trailing data.
    let mut owners = Vec::new();

    while !r.is_empty() {
        let offset = r.pos();
        if let Some(max) = opts.max_tokens {
            if ptgs.len() >= max {
                return Err(DecodePtgError::TooManyTokens { offset, max });
            }
        }

        let byte = r.u8()?;
        r.begin_token(offset, byte);
        let ptg = decode_one(&mut r, byte, opts)?;
        log::trace!(
            "rgce offset {offset}: {} (ptg=0x{byte:02X}, {} bytes)",
            ptg.kind().name(),
            r.pos() - offset
        );
        if ptg.kind().has_trailing_data() {
            owners.push((ptgs.len(), offset, byte));
        }
        ptgs.push(ptg);
    }

    let mut t = PtgReader::trailing(rgcb);
    for (index, offset, byte) in owners {
        t.begin_token(offset, byte);
        match &mut ptgs[index] {
            Ptg::Array { values, .. } => *values = ArrayConstant::read(&mut t)?,
            Ptg::MemArea { ranges, .. } => *ranges = read::mem_ranges(&mut t)?,
            _ => {}
        }
    }

    Ok(DecodedPtgs {
        ptgs,
        rgce_len: rgce.len(),
        rgcb_len: t.pos(),
    })
}

fn decode_one(
    r: &mut PtgReader<'_>,
    byte: u8,
    opts: &DecodeOptions,
) -> Result<Ptg, DecodePtgError> {
    let offset = r.ptg_offset();
    let unknown = || DecodePtgError::UnknownPtg { offset, ptg: byte };

    let (kind, class) = match split_opcode(byte) {
        SplitOpcode::Classless(base) => {
            (PtgKind::from_base_opcode(base).ok_or_else(unknown)?, None)
        }
        SplitOpcode::Classed(base, class) => {
            (PtgKind::from_base_opcode(base).ok_or_else(unknown)?, Some(class))
        }
        SplitOpcode::Reserved(base) => {
            let kind = PtgKind::from_base_opcode(base).ok_or_else(unknown)?;
            match opts.reserved_class {
                ReservedClassPolicy::Reject => {
                    return Err(DecodePtgError::InvalidClass { offset, ptg: byte })
                }
                ReservedClassPolicy::Normalize(class) => {
                    log::warn!(
                        "reserved class in ptg=0x{byte:02X} at rgce offset {offset}; treating as {class}"
                    );
                    (kind, Some(class))
                }
            }
        }
    };

    // Reject a truncated fixed-width token before reading any of it.
    if let Some(size) = kind.fixed_payload_size() {
        r.require(size)?;
    }

    match class {
        Some(class) => decode_classed(r, kind, class, opts),
        None => decode_classless(r, kind),
    }
}

fn decode_classless(r: &mut PtgReader<'_>, kind: PtgKind) -> Result<Ptg, DecodePtgError> {
    let ptg = match kind {
        PtgKind::Exp => Ptg::Exp {
            row: r.u16()?,
            col: r.u16()?,
        },
        PtgKind::Tbl => Ptg::Tbl {
            row: r.u16()?,
            col: r.u16()?,
        },
        PtgKind::Binary(op) => Ptg::Binary(op),
        PtgKind::Unary(op) => Ptg::Unary(op),
        PtgKind::Paren => Ptg::Paren,
        PtgKind::MissArg => Ptg::MissArg,
        PtgKind::Str => Ptg::Str(read::string(r)?),
        PtgKind::Attr => Ptg::Attr(read::attr(r)?),
        PtgKind::Err => {
            let code = r.u8()?;
            if error_literal(code).is_none() {
                return Err(invalid_constant(r, code));
            }
            Ptg::Err(code)
        }
        PtgKind::Bool => match r.u8()? {
            0 => Ptg::Bool(false),
            1 => Ptg::Bool(true),
            other => return Err(invalid_constant(r, other)),
        },
        PtgKind::Int => Ptg::Int(r.u16()?),
        PtgKind::Num => Ptg::Num(r.f64()?),
        _ => {
            return Err(DecodePtgError::UnknownPtg {
                offset: r.ptg_offset(),
                ptg: r.ptg(),
            })
        }
    };
    Ok(ptg)
}

fn invalid_constant(r: &PtgReader<'_>, value: u8) -> DecodePtgError {
    DecodePtgError::InvalidConstant {
        offset: r.ptg_offset(),
        ptg: r.ptg(),
        value,
    }
}

fn decode_classed(
    r: &mut PtgReader<'_>,
    kind: PtgKind,
    class: PtgClass,
    opts: &DecodeOptions,
) -> Result<Ptg, DecodePtgError> {
    let ptg = match kind {
        PtgKind::Array => Ptg::Array {
            class,
            reserved: r.array()?,
            // Filled from the trailing data once the whole stream is decoded.
            values: ArrayConstant::new(0, 0, Vec::new()),
        },
        PtgKind::Func => {
            let func_id = r.u16()?;
            let arg_count = fixed_arity(r, func_id, opts)?;
            Ptg::Func {
                class,
                func_id,
                arg_count,
            }
        }
        PtgKind::FuncVar | PtgKind::UserFunc => {
            let raw = read::func_var(r)?;
            if raw.func_id == FTAB_USER_DEFINED {
                Ptg::UserFunc {
                    class,
                    arg_count: raw.arg_count,
                    prompt: raw.prompt,
                    command_equivalent: raw.command_equivalent,
                }
            } else {
                check_var_arity(r, raw.func_id, raw.arg_count, opts)?;
                Ptg::FuncVar {
                    class,
                    func_id: raw.func_id,
                    arg_count: raw.arg_count,
                    prompt: raw.prompt,
                    command_equivalent: raw.command_equivalent,
                }
            }
        }
        PtgKind::Name => Ptg::Name {
            class,
            name_index: r.u16()?,
            reserved: r.u16()?,
        },
        PtgKind::Ref => Ptg::Ref {
            class,
            cell: read::cell(r)?,
        },
        PtgKind::Area => Ptg::Area {
            class,
            area: read::area(r)?,
        },
        PtgKind::MemArea => Ptg::MemArea {
            class,
            reserved: r.u32()?,
            cce: r.u16()?,
            ranges: Vec::new(),
        },
        PtgKind::MemErr => Ptg::MemErr {
            class,
            reserved: r.u32()?,
            cce: r.u16()?,
        },
        PtgKind::MemNoMem => Ptg::MemNoMem {
            class,
            reserved: r.u32()?,
            cce: r.u16()?,
        },
        PtgKind::MemFunc => Ptg::MemFunc {
            class,
            cce: r.u16()?,
        },
        PtgKind::RefErr => Ptg::RefErr {
            class,
            reserved: r.u32()?,
        },
        PtgKind::AreaErr => Ptg::AreaErr {
            class,
            reserved: r.array()?,
        },
        PtgKind::RefN => Ptg::RefN {
            class,
            cell: read::cell(r)?,
        },
        PtgKind::AreaN => Ptg::AreaN {
            class,
            area: read::area(r)?,
        },
        PtgKind::MemAreaN => Ptg::MemAreaN {
            class,
            cce: r.u16()?,
        },
        PtgKind::MemNoMemN => Ptg::MemNoMemN {
            class,
            cce: r.u16()?,
        },
        PtgKind::NameX => Ptg::NameX {
            class,
            ixti: r.u16()?,
            name_index: r.u16()?,
            reserved: r.u16()?,
        },
        PtgKind::Ref3d => Ptg::Ref3d {
            class,
            ixti: r.u16()?,
            cell: read::cell(r)?,
        },
        PtgKind::Area3d => Ptg::Area3d {
            class,
            ixti: r.u16()?,
            area: read::area(r)?,
        },
        PtgKind::RefErr3d => Ptg::RefErr3d {
            class,
            ixti: r.u16()?,
            reserved: r.u32()?,
        },
        PtgKind::AreaErr3d => Ptg::AreaErr3d {
            class,
            ixti: r.u16()?,
            reserved: r.array()?,
        },
        _ => {
            return Err(DecodePtgError::UnknownPtg {
                offset: r.ptg_offset(),
                ptg: r.ptg(),
            })
        }
    };
    Ok(ptg)
}

/// Resolve the implied argument count of a `PtgFunc`.
fn fixed_arity(
    r: &PtgReader<'_>,
    func_id: u16,
    opts: &DecodeOptions,
) -> Result<u8, DecodePtgError> {
    let Some(spec) = function_spec_from_id(func_id) else {
        // Functions newer than the table: keep the call, assume no arguments.
        log::debug!(
            "unknown function id {func_id} in PtgFunc at rgce offset {}; assuming 0 arguments",
            r.ptg_offset()
        );
        return Ok(0);
    };
    if !spec.is_fixed_arity() {
        if opts.strict_function_arity {
            return Err(DecodePtgError::ArityOutOfRange {
                offset: r.ptg_offset(),
                ptg: r.ptg(),
                func_id,
                arg_count: spec.min_args,
            });
        }
        log::warn!(
            "PtgFunc at rgce offset {} calls variable-arity {}; assuming {} arguments",
            r.ptg_offset(),
            spec.name,
            spec.min_args
        );
    }
    Ok(spec.min_args)
}

fn check_var_arity(
    r: &PtgReader<'_>,
    func_id: u16,
    arg_count: u8,
    opts: &DecodeOptions,
) -> Result<(), DecodePtgError> {
    let Some(spec) = function_spec_from_id(func_id) else {
        log::debug!(
            "unknown function id {func_id} in PtgFuncVar at rgce offset {}",
            r.ptg_offset()
        );
        return Ok(());
    };
    if spec.accepts(arg_count) {
        return Ok(());
    }
    if opts.strict_function_arity {
        return Err(DecodePtgError::ArityOutOfRange {
            offset: r.ptg_offset(),
            ptg: r.ptg(),
            func_id,
            arg_count,
        });
    }
    log::warn!(
        "{} called with {arg_count} arguments at rgce offset {}",
        spec.name,
        r.ptg_offset()
    );
    Ok(())
}

/// First encode pass: validate every token and compute the stream and trailing-data widths.
pub fn encoded_size(ptgs: &[Ptg]) -> Result<EncodedSize, EncodePtgError> {
    let mut size = EncodedSize {
        rgce_len: 0,
        rgcb_len: 0,
    };
    for (index, ptg) in ptgs.iter().enumerate() {
        ptg.validate(index)?;
        size.rgce_len += ptg.encoded_len();
        size.rgcb_len += ptg.trailing_size();
    }
    Ok(size)
}

/// Encode a token sequence into `rgce` and its trailing `rgcb` block.
///
/// Tokens are written exactly as stored; function argument counts are never re-derived.
pub fn encode_ptgs(ptgs: &[Ptg]) -> Result<EncodedPtgs, EncodePtgError> {
    let size = encoded_size(ptgs)?;
    let mut encoded = EncodedPtgs {
        rgce: Vec::with_capacity(size.rgce_len),
        rgcb: Vec::with_capacity(size.rgcb_len),
    };
    for ptg in ptgs {
        ptg.write(&mut encoded.rgce);
        ptg.write_trailing(&mut encoded.rgcb);
    }
    debug_assert_eq!(encoded.rgce.len(), size.rgce_len);
    debug_assert_eq!(encoded.rgcb.len(), size.rgcb_len);
    Ok(encoded)
}

/// Encode into `dst` starting at `offset`: the token stream, then its trailing data.
///
/// Nothing is written unless the whole encoding fits.
pub fn write_ptgs(
    ptgs: &[Ptg],
    dst: &mut [u8],
    offset: usize,
) -> Result<EncodedSize, EncodePtgError> {
    let size = encoded_size(ptgs)?;
    let available = dst.len().saturating_sub(offset);
    if available < size.total() {
        return Err(EncodePtgError::BufferTooSmall {
            offset,
            needed: size.total(),
            available,
        });
    }

    let bytes = encode_ptgs(ptgs)?.into_bytes();
    dst[offset..offset + bytes.len()].copy_from_slice(&bytes);
    Ok(size)
}
