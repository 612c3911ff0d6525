//! The BIFF8 parsed-token (Ptg) catalogue.
//!
//! A formula is stored as a flat `rgce` byte stream of tokens in reverse-polish order. Every
//! token starts with an opcode byte whose shape is described in [`crate::class`]; the payload
//! that follows is fully determined by the token family:
//!
//! - classless tokens (`0x01..=0x1F`): operators, constants, `PtgExp`/`PtgTbl`, `PtgAttr`
//! - class-bearing tokens (`0x20..=0x3D` plus class): references, names, function calls,
//!   array constants and the `PtgMem*` sub-expression markers
//!
//! `PtgArray` and `PtgMemArea` additionally own a block of trailing data stored after the whole
//! token stream (see [`crate::array_const`] and [`MemRange`]).
//!
//! [`Ptg`] values are plain immutable data. Encoding only reads them; in particular the
//! argument count stored on a function token is what gets written, never a recomputed one.

use crate::array_const::ArrayConstant;
use crate::class::{join_opcode, PtgClass};
use crate::error::{DecodePtgError, EncodePtgError};
use crate::function_table::{function_spec_from_id, FTAB_USER_DEFINED};
use crate::reader::PtgReader;
use crate::string::BiffString;

// Cell reference column field: 14-bit column index plus relative flags.
const COL_INDEX_MASK: u16 = 0x3FFF;
const ROW_RELATIVE_BIT: u16 = 0x4000;
const COL_RELATIVE_BIT: u16 = 0x8000;

// `PtgFuncVar` packs flags into the high bits of both fields.
const CARGS_MASK: u8 = 0x7F;
const CARGS_PROMPT_BIT: u8 = 0x80;
const IFTAB_MASK: u16 = 0x7FFF;
const IFTAB_CE_BIT: u16 = 0x8000;

/// Largest explicit argument count a `PtgFuncVar` can carry.
pub const MAX_FUNC_VAR_ARGS: u8 = CARGS_MASK;

/// Return the canonical Excel error literal for a BIFF8 error code, if known.
///
/// Used by `PtgErr` and by error entries in array constants.
pub fn error_literal(code: u8) -> Option<&'static str> {
    match code {
        0x00 => Some("#NULL!"),
        0x07 => Some("#DIV/0!"),
        0x0F => Some("#VALUE!"),
        0x17 => Some("#REF!"),
        0x1D => Some("#NAME?"),
        0x24 => Some("#NUM!"),
        0x2A => Some("#N/A"),
        0x2B => Some("#GETTING_DATA"),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Power,
    Concat,
    Lt,
    Le,
    Eq,
    Ge,
    Gt,
    Ne,
    /// Reference intersection (space operator).
    Isect,
    /// Reference union (`,` inside a reference expression).
    Union,
    /// Range operator (`:`).
    Range,
}

impl BinaryOp {
    pub const ALL: [BinaryOp; 15] = [
        BinaryOp::Add,
        BinaryOp::Sub,
        BinaryOp::Mul,
        BinaryOp::Div,
        BinaryOp::Power,
        BinaryOp::Concat,
        BinaryOp::Lt,
        BinaryOp::Le,
        BinaryOp::Eq,
        BinaryOp::Ge,
        BinaryOp::Gt,
        BinaryOp::Ne,
        BinaryOp::Isect,
        BinaryOp::Union,
        BinaryOp::Range,
    ];

    pub const fn opcode(self) -> u8 {
        match self {
            BinaryOp::Add => 0x03,
            BinaryOp::Sub => 0x04,
            BinaryOp::Mul => 0x05,
            BinaryOp::Div => 0x06,
            BinaryOp::Power => 0x07,
            BinaryOp::Concat => 0x08,
            BinaryOp::Lt => 0x09,
            BinaryOp::Le => 0x0A,
            BinaryOp::Eq => 0x0B,
            BinaryOp::Ge => 0x0C,
            BinaryOp::Gt => 0x0D,
            BinaryOp::Ne => 0x0E,
            BinaryOp::Isect => 0x0F,
            BinaryOp::Union => 0x10,
            BinaryOp::Range => 0x11,
        }
    }

    pub fn from_opcode(opcode: u8) -> Option<BinaryOp> {
        BinaryOp::ALL.into_iter().find(|op| op.opcode() == opcode)
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Power => "^",
            BinaryOp::Concat => "&",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Eq => "=",
            BinaryOp::Ge => ">=",
            BinaryOp::Gt => ">",
            BinaryOp::Ne => "<>",
            BinaryOp::Isect => " ",
            BinaryOp::Union => ",",
            BinaryOp::Range => ":",
        }
    }

    /// Reference operators combine references and yield a reference.
    pub const fn is_reference_op(self) -> bool {
        matches!(self, BinaryOp::Isect | BinaryOp::Union | BinaryOp::Range)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Plus,
    Minus,
    Percent,
}

impl UnaryOp {
    pub const fn opcode(self) -> u8 {
        match self {
            UnaryOp::Plus => 0x12,
            UnaryOp::Minus => 0x13,
            UnaryOp::Percent => 0x14,
        }
    }

    pub const fn from_opcode(opcode: u8) -> Option<UnaryOp> {
        match opcode {
            0x12 => Some(UnaryOp::Plus),
            0x13 => Some(UnaryOp::Minus),
            0x14 => Some(UnaryOp::Percent),
            _ => None,
        }
    }
}

/// A single cell reference as stored by `PtgRef`/`PtgRefN`/`PtgRef3d`.
///
/// For `PtgRefN` the row and column are offsets from the formula cell when the matching relative
/// flag is set; they are kept as raw field values either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRef8 {
    pub row: u16,
    /// 14-bit column field.
    pub col: u16,
    pub row_relative: bool,
    pub col_relative: bool,
}

impl CellRef8 {
    pub const fn absolute(row: u16, col: u16) -> Self {
        Self {
            row,
            col: col & COL_INDEX_MASK,
            row_relative: false,
            col_relative: false,
        }
    }

    pub const fn relative(row: u16, col: u16) -> Self {
        Self {
            row,
            col: col & COL_INDEX_MASK,
            row_relative: true,
            col_relative: true,
        }
    }

    pub const fn from_fields(row: u16, col_field: u16) -> Self {
        Self {
            row,
            col: col_field & COL_INDEX_MASK,
            row_relative: col_field & ROW_RELATIVE_BIT != 0,
            col_relative: col_field & COL_RELATIVE_BIT != 0,
        }
    }

    /// The packed column field (column index plus relative flags).
    pub const fn col_field(&self) -> u16 {
        let mut field = self.col & COL_INDEX_MASK;
        if self.row_relative {
            field |= ROW_RELATIVE_BIT;
        }
        if self.col_relative {
            field |= COL_RELATIVE_BIT;
        }
        field
    }

    fn read(r: &mut PtgReader<'_>) -> Result<Self, DecodePtgError> {
        let row = r.u16()?;
        let col_field = r.u16()?;
        Ok(Self::from_fields(row, col_field))
    }

    fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.row.to_le_bytes());
        out.extend_from_slice(&self.col_field().to_le_bytes());
    }
}

/// An area reference as stored by `PtgArea`/`PtgAreaN`/`PtgArea3d`.
///
/// On disk the fields are ordered `rwFirst, rwLast, colFirst, colLast`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AreaRef8 {
    pub first: CellRef8,
    pub last: CellRef8,
}

impl AreaRef8 {
    pub const fn new(first: CellRef8, last: CellRef8) -> Self {
        Self { first, last }
    }

    fn read(r: &mut PtgReader<'_>) -> Result<Self, DecodePtgError> {
        let first_row = r.u16()?;
        let last_row = r.u16()?;
        let first_col = r.u16()?;
        let last_col = r.u16()?;
        Ok(Self {
            first: CellRef8::from_fields(first_row, first_col),
            last: CellRef8::from_fields(last_row, last_col),
        })
    }

    fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.first.row.to_le_bytes());
        out.extend_from_slice(&self.last.row.to_le_bytes());
        out.extend_from_slice(&self.first.col_field().to_le_bytes());
        out.extend_from_slice(&self.last.col_field().to_le_bytes());
    }
}

/// A plain rectangle (`Ref8U`) listed in a `PtgMemArea`'s trailing data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemRange {
    pub first_row: u16,
    pub last_row: u16,
    pub first_col: u16,
    pub last_col: u16,
}

impl MemRange {
    const ENCODED_LEN: usize = 8;

    fn read(r: &mut PtgReader<'_>) -> Result<Self, DecodePtgError> {
        Ok(Self {
            first_row: r.u16()?,
            last_row: r.u16()?,
            first_col: r.u16()?,
            last_col: r.u16()?,
        })
    }

    fn write(&self, out: &mut Vec<u8>) {
        for field in [self.first_row, self.last_row, self.first_col, self.last_col] {
            out.extend_from_slice(&field.to_le_bytes());
        }
    }
}

/// `PtgAttr` control/hint token.
///
/// Flags are kept raw because Excel combines them (e.g. volatile + space). When the choose bit
/// is set, `data` is the number of choices and `jump_table` holds `data + 1` offsets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PtgAttr {
    pub flags: u8,
    pub data: u16,
    pub jump_table: Vec<u16>,
}

impl PtgAttr {
    pub const VOLATILE: u8 = 0x01;
    pub const IF: u8 = 0x02;
    pub const CHOOSE: u8 = 0x04;
    pub const SKIP: u8 = 0x08;
    pub const SUM: u8 = 0x10;
    pub const ASSIGN: u8 = 0x20;
    pub const SPACE: u8 = 0x40;

    pub const fn new(flags: u8, data: u16) -> Self {
        Self {
            flags,
            data,
            jump_table: Vec::new(),
        }
    }

    /// `SUM(x)` shortcut for a single-argument sum.
    pub const fn sum() -> Self {
        Self::new(Self::SUM, 0)
    }

    pub const fn volatile() -> Self {
        Self::new(Self::VOLATILE, 0)
    }

    /// `tAttrChoose` with `jump_table.len() - 1` choices.
    pub fn choose(jump_table: Vec<u16>) -> Self {
        let data = jump_table.len().saturating_sub(1).min(u16::MAX as usize) as u16;
        Self {
            flags: Self::CHOOSE,
            data,
            jump_table,
        }
    }

    pub const fn is_volatile(&self) -> bool {
        self.flags & Self::VOLATILE != 0
    }

    pub const fn is_if(&self) -> bool {
        self.flags & Self::IF != 0
    }

    pub const fn is_choose(&self) -> bool {
        self.flags & Self::CHOOSE != 0
    }

    pub const fn is_skip(&self) -> bool {
        self.flags & Self::SKIP != 0
    }

    pub const fn is_sum(&self) -> bool {
        self.flags & Self::SUM != 0
    }

    pub const fn is_space(&self) -> bool {
        self.flags & Self::SPACE != 0
    }

    fn read(r: &mut PtgReader<'_>) -> Result<Self, DecodePtgError> {
        let flags = r.u8()?;
        let data = r.u16()?;
        let mut jump_table = Vec::new();
        if flags & Self::CHOOSE != 0 {
            let count = data as usize + 1;
            let raw = r.bytes(count * 2)?;
            jump_table = raw
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect();
        }
        Ok(Self {
            flags,
            data,
            jump_table,
        })
    }

    fn validate(&self, index: usize) -> Result<(), EncodePtgError> {
        let expected = if self.is_choose() {
            self.data as usize + 1
        } else {
            0
        };
        if self.jump_table.len() != expected {
            return Err(EncodePtgError::InvalidJumpTable {
                index,
                choices: self.data,
                offsets: self.jump_table.len(),
            });
        }
        Ok(())
    }

    fn payload_size(&self) -> usize {
        3 + 2 * self.jump_table.len()
    }

    fn write(&self, out: &mut Vec<u8>) {
        out.push(self.flags);
        out.extend_from_slice(&self.data.to_le_bytes());
        for offset in &self.jump_table {
            out.extend_from_slice(&offset.to_le_bytes());
        }
    }
}

/// Token family, independent of payload values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PtgKind {
    Exp,
    Tbl,
    Binary(BinaryOp),
    Unary(UnaryOp),
    Paren,
    MissArg,
    Str,
    Attr,
    Err,
    Bool,
    Int,
    Num,
    Array,
    Func,
    FuncVar,
    /// `PtgFuncVar` with the user-defined function id.
    UserFunc,
    Name,
    Ref,
    Area,
    MemArea,
    MemErr,
    MemNoMem,
    MemFunc,
    RefErr,
    AreaErr,
    RefN,
    AreaN,
    MemAreaN,
    MemNoMemN,
    NameX,
    Ref3d,
    Area3d,
    RefErr3d,
    AreaErr3d,
}

impl PtgKind {
    /// Map a base opcode (class bits stripped) to its family.
    ///
    /// `0x22` maps to [`PtgKind::FuncVar`]; the user-defined refinement depends on the payload.
    pub fn from_base_opcode(base: u8) -> Option<PtgKind> {
        let kind = match base {
            0x01 => PtgKind::Exp,
            0x02 => PtgKind::Tbl,
            0x03..=0x11 => PtgKind::Binary(BinaryOp::from_opcode(base)?),
            0x12..=0x14 => PtgKind::Unary(UnaryOp::from_opcode(base)?),
            0x15 => PtgKind::Paren,
            0x16 => PtgKind::MissArg,
            0x17 => PtgKind::Str,
            0x19 => PtgKind::Attr,
            0x1C => PtgKind::Err,
            0x1D => PtgKind::Bool,
            0x1E => PtgKind::Int,
            0x1F => PtgKind::Num,
            0x20 => PtgKind::Array,
            0x21 => PtgKind::Func,
            0x22 => PtgKind::FuncVar,
            0x23 => PtgKind::Name,
            0x24 => PtgKind::Ref,
            0x25 => PtgKind::Area,
            0x26 => PtgKind::MemArea,
            0x27 => PtgKind::MemErr,
            0x28 => PtgKind::MemNoMem,
            0x29 => PtgKind::MemFunc,
            0x2A => PtgKind::RefErr,
            0x2B => PtgKind::AreaErr,
            0x2C => PtgKind::RefN,
            0x2D => PtgKind::AreaN,
            0x2E => PtgKind::MemAreaN,
            0x2F => PtgKind::MemNoMemN,
            0x39 => PtgKind::NameX,
            0x3A => PtgKind::Ref3d,
            0x3B => PtgKind::Area3d,
            0x3C => PtgKind::RefErr3d,
            0x3D => PtgKind::AreaErr3d,
            _ => return None,
        };
        Some(kind)
    }

    /// Base opcode; for class-bearing families this is the reference-class form.
    pub const fn base_opcode(self) -> u8 {
        match self {
            PtgKind::Exp => 0x01,
            PtgKind::Tbl => 0x02,
            PtgKind::Binary(op) => op.opcode(),
            PtgKind::Unary(op) => op.opcode(),
            PtgKind::Paren => 0x15,
            PtgKind::MissArg => 0x16,
            PtgKind::Str => 0x17,
            PtgKind::Attr => 0x19,
            PtgKind::Err => 0x1C,
            PtgKind::Bool => 0x1D,
            PtgKind::Int => 0x1E,
            PtgKind::Num => 0x1F,
            PtgKind::Array => 0x20,
            PtgKind::Func => 0x21,
            PtgKind::FuncVar | PtgKind::UserFunc => 0x22,
            PtgKind::Name => 0x23,
            PtgKind::Ref => 0x24,
            PtgKind::Area => 0x25,
            PtgKind::MemArea => 0x26,
            PtgKind::MemErr => 0x27,
            PtgKind::MemNoMem => 0x28,
            PtgKind::MemFunc => 0x29,
            PtgKind::RefErr => 0x2A,
            PtgKind::AreaErr => 0x2B,
            PtgKind::RefN => 0x2C,
            PtgKind::AreaN => 0x2D,
            PtgKind::MemAreaN => 0x2E,
            PtgKind::MemNoMemN => 0x2F,
            PtgKind::NameX => 0x39,
            PtgKind::Ref3d => 0x3A,
            PtgKind::Area3d => 0x3B,
            PtgKind::RefErr3d => 0x3C,
            PtgKind::AreaErr3d => 0x3D,
        }
    }

    pub const fn is_class_bearing(self) -> bool {
        self.base_opcode() >= 0x20
    }

    /// Payload width after the opcode byte, or `None` when it depends on the payload itself
    /// (`PtgStr` length, `PtgAttr` choose jump table).
    pub const fn fixed_payload_size(self) -> Option<usize> {
        let size = match self {
            PtgKind::Str | PtgKind::Attr => return None,
            PtgKind::Binary(_) | PtgKind::Unary(_) | PtgKind::Paren | PtgKind::MissArg => 0,
            PtgKind::Err | PtgKind::Bool => 1,
            PtgKind::Int | PtgKind::Func | PtgKind::MemFunc => 2,
            PtgKind::MemAreaN | PtgKind::MemNoMemN => 2,
            PtgKind::FuncVar | PtgKind::UserFunc => 3,
            PtgKind::Exp | PtgKind::Tbl | PtgKind::Name | PtgKind::Ref => 4,
            PtgKind::RefErr | PtgKind::RefN => 4,
            PtgKind::MemArea | PtgKind::MemErr | PtgKind::MemNoMem => 6,
            PtgKind::NameX | PtgKind::Ref3d | PtgKind::RefErr3d => 6,
            PtgKind::Array => 7,
            PtgKind::Num | PtgKind::Area | PtgKind::AreaErr | PtgKind::AreaN => 8,
            PtgKind::Area3d | PtgKind::AreaErr3d => 10,
        };
        Some(size)
    }

    /// Whether tokens of this family own a block in the trailing data.
    pub const fn has_trailing_data(self) -> bool {
        matches!(self, PtgKind::Array | PtgKind::MemArea)
    }

    /// Class a formula builder should assign by default for this family.
    ///
    /// Function calls should prefer [`crate::FunctionSpec::return_class`].
    pub const fn default_class(self) -> Option<PtgClass> {
        if !self.is_class_bearing() {
            return None;
        }
        Some(match self {
            PtgKind::Array => PtgClass::Array,
            PtgKind::Func | PtgKind::FuncVar | PtgKind::UserFunc => PtgClass::Value,
            _ => PtgClass::Reference,
        })
    }

    /// Documentation name (`PtgFunc`, `PtgAreaN`, ...).
    pub const fn name(self) -> &'static str {
        match self {
            PtgKind::Exp => "PtgExp",
            PtgKind::Tbl => "PtgTbl",
            PtgKind::Binary(op) => match op {
                BinaryOp::Add => "PtgAdd",
                BinaryOp::Sub => "PtgSub",
                BinaryOp::Mul => "PtgMul",
                BinaryOp::Div => "PtgDiv",
                BinaryOp::Power => "PtgPower",
                BinaryOp::Concat => "PtgConcat",
                BinaryOp::Lt => "PtgLt",
                BinaryOp::Le => "PtgLe",
                BinaryOp::Eq => "PtgEq",
                BinaryOp::Ge => "PtgGe",
                BinaryOp::Gt => "PtgGt",
                BinaryOp::Ne => "PtgNe",
                BinaryOp::Isect => "PtgIsect",
                BinaryOp::Union => "PtgUnion",
                BinaryOp::Range => "PtgRange",
            },
            PtgKind::Unary(op) => match op {
                UnaryOp::Plus => "PtgUplus",
                UnaryOp::Minus => "PtgUminus",
                UnaryOp::Percent => "PtgPercent",
            },
            PtgKind::Paren => "PtgParen",
            PtgKind::MissArg => "PtgMissArg",
            PtgKind::Str => "PtgStr",
            PtgKind::Attr => "PtgAttr",
            PtgKind::Err => "PtgErr",
            PtgKind::Bool => "PtgBool",
            PtgKind::Int => "PtgInt",
            PtgKind::Num => "PtgNum",
            PtgKind::Array => "PtgArray",
            PtgKind::Func => "PtgFunc",
            PtgKind::FuncVar => "PtgFuncVar",
            PtgKind::UserFunc => "PtgFuncVar(udf)",
            PtgKind::Name => "PtgName",
            PtgKind::Ref => "PtgRef",
            PtgKind::Area => "PtgArea",
            PtgKind::MemArea => "PtgMemArea",
            PtgKind::MemErr => "PtgMemErr",
            PtgKind::MemNoMem => "PtgMemNoMem",
            PtgKind::MemFunc => "PtgMemFunc",
            PtgKind::RefErr => "PtgRefErr",
            PtgKind::AreaErr => "PtgAreaErr",
            PtgKind::RefN => "PtgRefN",
            PtgKind::AreaN => "PtgAreaN",
            PtgKind::MemAreaN => "PtgMemAreaN",
            PtgKind::MemNoMemN => "PtgMemNoMemN",
            PtgKind::NameX => "PtgNameX",
            PtgKind::Ref3d => "PtgRef3d",
            PtgKind::Area3d => "PtgArea3d",
            PtgKind::RefErr3d => "PtgRefErr3d",
            PtgKind::AreaErr3d => "PtgAreaErr3d",
        }
    }
}

/// One formula token.
#[derive(Debug, Clone, PartialEq)]
pub enum Ptg {
    /// Anchor of a shared or array formula (`row`, `col` of the defining cell).
    Exp { row: u16, col: u16 },
    /// Anchor of a data table.
    Tbl { row: u16, col: u16 },
    Binary(BinaryOp),
    Unary(UnaryOp),
    Paren,
    MissArg,
    Str(BiffString),
    Attr(PtgAttr),
    /// BIFF error code (see [`error_literal`]).
    Err(u8),
    Bool(bool),
    Int(u16),
    /// IEEE-754 double. NaN payloads are written back bit for bit, but a decoded NaN never
    /// compares equal to the token it came from.
    Num(f64),
    Array {
        class: PtgClass,
        reserved: [u8; 7],
        values: ArrayConstant,
    },
    /// Fixed-arity built-in call; the argument count is implied by the function table.
    Func {
        class: PtgClass,
        func_id: u16,
        arg_count: u8,
    },
    /// Variable-arity built-in call with an explicit argument count.
    FuncVar {
        class: PtgClass,
        func_id: u16,
        arg_count: u8,
        prompt: bool,
        command_equivalent: bool,
    },
    /// User-defined / add-in / future function call. `arg_count` includes the name operand
    /// pushed before the arguments.
    UserFunc {
        class: PtgClass,
        arg_count: u8,
        prompt: bool,
        command_equivalent: bool,
    },
    Name {
        class: PtgClass,
        name_index: u16,
        reserved: u16,
    },
    Ref {
        class: PtgClass,
        cell: CellRef8,
    },
    Area {
        class: PtgClass,
        area: AreaRef8,
    },
    MemArea {
        class: PtgClass,
        reserved: u32,
        cce: u16,
        ranges: Vec<MemRange>,
    },
    MemErr {
        class: PtgClass,
        reserved: u32,
        cce: u16,
    },
    MemNoMem {
        class: PtgClass,
        reserved: u32,
        cce: u16,
    },
    MemFunc {
        class: PtgClass,
        cce: u16,
    },
    RefErr {
        class: PtgClass,
        reserved: u32,
    },
    AreaErr {
        class: PtgClass,
        reserved: [u8; 8],
    },
    RefN {
        class: PtgClass,
        cell: CellRef8,
    },
    AreaN {
        class: PtgClass,
        area: AreaRef8,
    },
    MemAreaN {
        class: PtgClass,
        cce: u16,
    },
    MemNoMemN {
        class: PtgClass,
        cce: u16,
    },
    NameX {
        class: PtgClass,
        ixti: u16,
        name_index: u16,
        reserved: u16,
    },
    Ref3d {
        class: PtgClass,
        ixti: u16,
        cell: CellRef8,
    },
    Area3d {
        class: PtgClass,
        ixti: u16,
        area: AreaRef8,
    },
    RefErr3d {
        class: PtgClass,
        ixti: u16,
        reserved: u32,
    },
    AreaErr3d {
        class: PtgClass,
        ixti: u16,
        reserved: [u8; 8],
    },
}

impl Ptg {
    /// Build a fixed-arity call, resolving the argument count from the function table.
    ///
    /// Unknown ids resolve to zero arguments, matching what decode does for the same bytes.
    pub fn func(class: PtgClass, func_id: u16) -> Ptg {
        let arg_count = match function_spec_from_id(func_id) {
            Some(spec) => spec.min_args,
            None => 0,
        };
        Ptg::Func {
            class,
            func_id,
            arg_count,
        }
    }

    pub fn func_var(class: PtgClass, func_id: u16, arg_count: u8) -> Ptg {
        if func_id == FTAB_USER_DEFINED {
            return Ptg::user_func(class, arg_count);
        }
        Ptg::FuncVar {
            class,
            func_id,
            arg_count,
            prompt: false,
            command_equivalent: false,
        }
    }

    pub fn user_func(class: PtgClass, arg_count: u8) -> Ptg {
        Ptg::UserFunc {
            class,
            arg_count,
            prompt: false,
            command_equivalent: false,
        }
    }

    /// Build the call token Excel would write for `func_id` with `arg_count` arguments:
    /// `PtgFunc` when the table lists the function as fixed-arity with that count,
    /// `PtgFuncVar` otherwise.
    pub fn call(class: PtgClass, func_id: u16, arg_count: u8) -> Ptg {
        match function_spec_from_id(func_id) {
            Some(spec) if spec.is_fixed_arity() && spec.min_args == arg_count => {
                Ptg::Func {
                    class,
                    func_id,
                    arg_count,
                }
            }
            _ => Ptg::func_var(class, func_id, arg_count),
        }
    }

    pub fn kind(&self) -> PtgKind {
        match self {
            Ptg::Exp { .. } => PtgKind::Exp,
            Ptg::Tbl { .. } => PtgKind::Tbl,
            Ptg::Binary(op) => PtgKind::Binary(*op),
            Ptg::Unary(op) => PtgKind::Unary(*op),
            Ptg::Paren => PtgKind::Paren,
            Ptg::MissArg => PtgKind::MissArg,
            Ptg::Str(_) => PtgKind::Str,
            Ptg::Attr(_) => PtgKind::Attr,
            Ptg::Err(_) => PtgKind::Err,
            Ptg::Bool(_) => PtgKind::Bool,
            Ptg::Int(_) => PtgKind::Int,
            Ptg::Num(_) => PtgKind::Num,
            Ptg::Array { .. } => PtgKind::Array,
            Ptg::Func { .. } => PtgKind::Func,
            Ptg::FuncVar { .. } => PtgKind::FuncVar,
            Ptg::UserFunc { .. } => PtgKind::UserFunc,
            Ptg::Name { .. } => PtgKind::Name,
            Ptg::Ref { .. } => PtgKind::Ref,
            Ptg::Area { .. } => PtgKind::Area,
            Ptg::MemArea { .. } => PtgKind::MemArea,
            Ptg::MemErr { .. } => PtgKind::MemErr,
            Ptg::MemNoMem { .. } => PtgKind::MemNoMem,
            Ptg::MemFunc { .. } => PtgKind::MemFunc,
            Ptg::RefErr { .. } => PtgKind::RefErr,
            Ptg::AreaErr { .. } => PtgKind::AreaErr,
            Ptg::RefN { .. } => PtgKind::RefN,
            Ptg::AreaN { .. } => PtgKind::AreaN,
            Ptg::MemAreaN { .. } => PtgKind::MemAreaN,
            Ptg::MemNoMemN { .. } => PtgKind::MemNoMemN,
            Ptg::NameX { .. } => PtgKind::NameX,
            Ptg::Ref3d { .. } => PtgKind::Ref3d,
            Ptg::Area3d { .. } => PtgKind::Area3d,
            Ptg::RefErr3d { .. } => PtgKind::RefErr3d,
            Ptg::AreaErr3d { .. } => PtgKind::AreaErr3d,
        }
    }

    /// Base opcode (class bits cleared).
    pub fn opcode(&self) -> u8 {
        self.kind().base_opcode()
    }

    pub fn is_class_bearing(&self) -> bool {
        self.kind().is_class_bearing()
    }

    /// The class stored in the opcode byte; `None` for classless tokens.
    pub fn class(&self) -> Option<PtgClass> {
        match self {
            Ptg::Array { class, .. }
            | Ptg::Func { class, .. }
            | Ptg::FuncVar { class, .. }
            | Ptg::UserFunc { class, .. }
            | Ptg::Name { class, .. }
            | Ptg::Ref { class, .. }
            | Ptg::Area { class, .. }
            | Ptg::MemArea { class, .. }
            | Ptg::MemErr { class, .. }
            | Ptg::MemNoMem { class, .. }
            | Ptg::MemFunc { class, .. }
            | Ptg::RefErr { class, .. }
            | Ptg::AreaErr { class, .. }
            | Ptg::RefN { class, .. }
            | Ptg::AreaN { class, .. }
            | Ptg::MemAreaN { class, .. }
            | Ptg::MemNoMemN { class, .. }
            | Ptg::NameX { class, .. }
            | Ptg::Ref3d { class, .. }
            | Ptg::Area3d { class, .. }
            | Ptg::RefErr3d { class, .. }
            | Ptg::AreaErr3d { class, .. } => Some(*class),
            _ => None,
        }
    }

    /// Class of the value this token leaves on the stack.
    ///
    /// Classless tokens have a class fixed by the format rather than stored in the opcode:
    /// reference operators yield references, everything else yields a value.
    pub fn result_class(&self) -> Option<PtgClass> {
        if let Some(class) = self.class() {
            return Some(class);
        }
        match self {
            Ptg::Binary(op) if op.is_reference_op() => Some(PtgClass::Reference),
            Ptg::Paren | Ptg::Attr(_) => None,
            _ => Some(PtgClass::Value),
        }
    }

    pub fn default_class(&self) -> Option<PtgClass> {
        self.kind().default_class()
    }

    /// The opcode byte as written: base opcode combined with the class, if any.
    pub fn opcode_byte(&self) -> u8 {
        join_opcode(self.opcode(), self.class())
    }

    pub fn fixed_payload_size(&self) -> Option<usize> {
        self.kind().fixed_payload_size()
    }

    /// Payload width after the opcode byte.
    pub fn payload_size(&self) -> usize {
        match self {
            Ptg::Str(s) => 1 + s.body_len(),
            Ptg::Attr(attr) => attr.payload_size(),
            _ => self.fixed_payload_size().unwrap_or(0),
        }
    }

    /// Bytes this token occupies in the token stream (opcode byte plus payload).
    pub fn encoded_len(&self) -> usize {
        1 + self.payload_size()
    }

    /// Bytes this token owns in the trailing data block.
    pub fn trailing_size(&self) -> usize {
        match self {
            Ptg::Array { values, .. } => values.encoded_len(),
            Ptg::MemArea { ranges, .. } => 2 + MemRange::ENCODED_LEN * ranges.len(),
            _ => 0,
        }
    }

    /// Number of operands this token pops when the formula is executed as a stack program.
    pub fn operand_count(&self) -> usize {
        match self {
            Ptg::Binary(_) => 2,
            Ptg::Unary(_) | Ptg::Paren => 1,
            Ptg::Attr(attr) if attr.is_sum() => 1,
            Ptg::Func { arg_count, .. }
            | Ptg::FuncVar { arg_count, .. }
            | Ptg::UserFunc { arg_count, .. } => *arg_count as usize,
            _ => 0,
        }
    }

    /// Number of values this token pushes.
    ///
    /// `PtgAttr` and the `PtgMem*` markers only annotate the sub-expression that follows them.
    pub fn push_count(&self) -> usize {
        match self {
            Ptg::Attr(attr) => usize::from(attr.is_sum()),
            Ptg::MemArea { .. }
            | Ptg::MemErr { .. }
            | Ptg::MemNoMem { .. }
            | Ptg::MemFunc { .. }
            | Ptg::MemAreaN { .. }
            | Ptg::MemNoMemN { .. } => 0,
            _ => 1,
        }
    }

    /// Check that this token can be represented on disk.
    pub fn validate(&self, index: usize) -> Result<(), EncodePtgError> {
        match self {
            Ptg::Str(s) => s.validate(index, u8::MAX as usize),
            Ptg::Attr(attr) => attr.validate(index),
            Ptg::Array { values, .. } => values.validate(index),
            Ptg::FuncVar {
                func_id,
                arg_count,
                ..
            } => {
                if *func_id > IFTAB_MASK {
                    return Err(EncodePtgError::FunctionIdTooLarge {
                        index,
                        func_id: *func_id,
                    });
                }
                validate_arg_count(index, *arg_count)
            }
            Ptg::UserFunc { arg_count, .. } => validate_arg_count(index, *arg_count),
            Ptg::MemArea { ranges, .. } if ranges.len() > u16::MAX as usize => {
                Err(EncodePtgError::TooManyRanges {
                    index,
                    ranges: ranges.len(),
                })
            }
            _ => Ok(()),
        }
    }

    /// Append the opcode byte and payload. Assumes [`Ptg::validate`] passed.
    pub(crate) fn write(&self, out: &mut Vec<u8>) {
        out.push(self.opcode_byte());
        match self {
            Ptg::Exp { row, col } | Ptg::Tbl { row, col } => {
                out.extend_from_slice(&row.to_le_bytes());
                out.extend_from_slice(&col.to_le_bytes());
            }
            Ptg::Binary(_) | Ptg::Unary(_) | Ptg::Paren | Ptg::MissArg => {}
            Ptg::Str(s) => {
                out.push(s.cch() as u8);
                s.write_body(out);
            }
            Ptg::Attr(attr) => attr.write(out),
            Ptg::Err(code) => out.push(*code),
            Ptg::Bool(b) => out.push(u8::from(*b)),
            Ptg::Int(n) => out.extend_from_slice(&n.to_le_bytes()),
            Ptg::Num(n) => out.extend_from_slice(&n.to_le_bytes()),
            Ptg::Array { reserved, .. } => out.extend_from_slice(reserved),
            // The argument count is implied by the function table and never written.
            Ptg::Func { func_id, .. } => out.extend_from_slice(&func_id.to_le_bytes()),
            Ptg::FuncVar {
                func_id,
                arg_count,
                prompt,
                command_equivalent,
                ..
            } => write_func_var(out, *func_id, *arg_count, *prompt, *command_equivalent),
            Ptg::UserFunc {
                arg_count,
                prompt,
                command_equivalent,
                ..
            } => write_func_var(
                out,
                FTAB_USER_DEFINED,
                *arg_count,
                *prompt,
                *command_equivalent,
            ),
            Ptg::Name {
                name_index,
                reserved,
                ..
            } => {
                out.extend_from_slice(&name_index.to_le_bytes());
                out.extend_from_slice(&reserved.to_le_bytes());
            }
            Ptg::Ref { cell, .. } | Ptg::RefN { cell, .. } => cell.write(out),
            Ptg::Area { area, .. } | Ptg::AreaN { area, .. } => area.write(out),
            Ptg::MemArea { reserved, cce, .. }
            | Ptg::MemErr { reserved, cce, .. }
            | Ptg::MemNoMem { reserved, cce, .. } => {
                out.extend_from_slice(&reserved.to_le_bytes());
                out.extend_from_slice(&cce.to_le_bytes());
            }
            Ptg::MemFunc { cce, .. } | Ptg::MemAreaN { cce, .. } | Ptg::MemNoMemN { cce, .. } => {
                out.extend_from_slice(&cce.to_le_bytes())
            }
            Ptg::RefErr { reserved, .. } => out.extend_from_slice(&reserved.to_le_bytes()),
            Ptg::AreaErr { reserved, .. } => out.extend_from_slice(reserved),
            Ptg::NameX {
                ixti,
                name_index,
                reserved,
                ..
            } => {
                out.extend_from_slice(&ixti.to_le_bytes());
                out.extend_from_slice(&name_index.to_le_bytes());
                out.extend_from_slice(&reserved.to_le_bytes());
            }
            Ptg::Ref3d { ixti, cell, .. } => {
                out.extend_from_slice(&ixti.to_le_bytes());
                cell.write(out);
            }
            Ptg::Area3d { ixti, area, .. } => {
                out.extend_from_slice(&ixti.to_le_bytes());
                area.write(out);
            }
            Ptg::RefErr3d { ixti, reserved, .. } => {
                out.extend_from_slice(&ixti.to_le_bytes());
                out.extend_from_slice(&reserved.to_le_bytes());
            }
            Ptg::AreaErr3d { ixti, reserved, .. } => {
                out.extend_from_slice(&ixti.to_le_bytes());
                out.extend_from_slice(reserved);
            }
        }
    }

    /// Append this token's trailing data block, if it owns one.
    pub(crate) fn write_trailing(&self, out: &mut Vec<u8>) {
        match self {
            Ptg::Array { values, .. } => values.write(out),
            Ptg::MemArea { ranges, .. } => {
                out.extend_from_slice(&(ranges.len() as u16).to_le_bytes());
                for range in ranges {
                    range.write(out);
                }
            }
            _ => {}
        }
    }
}

fn validate_arg_count(index: usize, arg_count: u8) -> Result<(), EncodePtgError> {
    if arg_count > MAX_FUNC_VAR_ARGS {
        return Err(EncodePtgError::ArgCountTooLarge { index, arg_count });
    }
    Ok(())
}

fn write_func_var(out: &mut Vec<u8>, func_id: u16, arg_count: u8, prompt: bool, ce: bool) {
    let mut cargs = arg_count & CARGS_MASK;
    if prompt {
        cargs |= CARGS_PROMPT_BIT;
    }
    let mut iftab = func_id & IFTAB_MASK;
    if ce {
        iftab |= IFTAB_CE_BIT;
    }
    out.push(cargs);
    out.extend_from_slice(&iftab.to_le_bytes());
}

/// Payload fields of a `PtgFuncVar` before arity policy is applied.
pub(crate) struct RawFuncVar {
    pub(crate) func_id: u16,
    pub(crate) arg_count: u8,
    pub(crate) prompt: bool,
    pub(crate) command_equivalent: bool,
}

/// Payload readers used by the decoder. Each consumes exactly its token's payload.
pub(crate) mod read {
    use super::*;

    pub(crate) fn cell(r: &mut PtgReader<'_>) -> Result<CellRef8, DecodePtgError> {
        CellRef8::read(r)
    }

    pub(crate) fn area(r: &mut PtgReader<'_>) -> Result<AreaRef8, DecodePtgError> {
        AreaRef8::read(r)
    }

    pub(crate) fn attr(r: &mut PtgReader<'_>) -> Result<PtgAttr, DecodePtgError> {
        PtgAttr::read(r)
    }

    pub(crate) fn string(r: &mut PtgReader<'_>) -> Result<BiffString, DecodePtgError> {
        let cch = r.u8()? as usize;
        BiffString::read_body(r, cch)
    }

    pub(crate) fn func_var(r: &mut PtgReader<'_>) -> Result<RawFuncVar, DecodePtgError> {
        let cargs = r.u8()?;
        let iftab = r.u16()?;
        Ok(RawFuncVar {
            func_id: iftab & IFTAB_MASK,
            arg_count: cargs & CARGS_MASK,
            prompt: cargs & CARGS_PROMPT_BIT != 0,
            command_equivalent: iftab & IFTAB_CE_BIT != 0,
        })
    }

    pub(crate) fn mem_ranges(r: &mut PtgReader<'_>) -> Result<Vec<MemRange>, DecodePtgError> {
        let count = r.u16()? as usize;
        r.require(count * MemRange::ENCODED_LEN)?;
        (0..count).map(|_| MemRange::read(r)).collect()
    }
}
