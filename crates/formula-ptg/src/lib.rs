//! BIFF8 formula token (Ptg) stream codec.
//!
//! Formulas in the legacy binary workbook format are stored as a flat `rgce` byte stream of
//! parsed tokens in reverse-polish order, optionally followed by a trailing `rgcb` block holding
//! array constants and `PtgMemArea` ranges. This crate converts between those bytes and a typed
//! [`Ptg`] sequence:
//! - [`decode_ptgs`] / [`decode_rgce`]: bytes to tokens, failing atomically on malformed input
//! - [`encoded_size`] / [`encode_ptgs`] / [`write_ptgs`]: two-pass encoding back to bytes
//! - [`function_spec_from_id`] and friends: the built-in function table used to resolve the
//!   implied argument count of `PtgFunc`
//! - [`check_stack_balance`]: a well-formedness check for callers building formulas
//!
//! Decoding then re-encoding a stream written by Excel reproduces it byte for byte, class bits
//! included. The exceptions are reserved padding inside array constants (written back as zeros)
//! and reserved class selectors accepted via [`ReservedClassPolicy::Normalize`].
//!
//! Formula text parsing/rendering and record framing live in other crates.

mod array_const;
mod class;
mod codec;
mod error;
mod function_table;
mod options;
mod ptg;
mod reader;
mod stack;
mod string;

pub use array_const::{ArrayConstant, ArrayValue, MAX_ARRAY_COLS, MAX_ARRAY_ROWS};
pub use class::{join_opcode, split_opcode, PtgClass, ReservedClassPolicy, SplitOpcode};
pub use codec::{
    decode_ptgs, decode_rgce, decode_rgce_with_options, decode_rgce_with_rgcb, encode_ptgs,
    encoded_size, write_ptgs, DecodedPtgs, EncodedPtgs, EncodedSize,
};
pub use error::{DecodeErrorKind, DecodePtgError, EncodePtgError};
pub use function_table::{
    function_id_from_name, function_name_from_id, function_spec_from_id,
    function_spec_from_name, iter_function_specs, FunctionSpec, FTAB_USER_DEFINED,
    MAX_ARGS_UNBOUNDED,
};
pub use options::DecodeOptions;
pub use ptg::{
    error_literal, AreaRef8, BinaryOp, CellRef8, MemRange, Ptg, PtgAttr, PtgKind, UnaryOp,
    MAX_FUNC_VAR_ARGS,
};
pub use stack::{check_stack_balance, StackError};
pub use string::BiffString;
