//! Ptg result classes.
//!
//! Class-bearing tokens (opcode bytes `0x20..=0x7F`) store a 2-bit class selector in bits 5-6
//! of the opcode byte:
//!
//! | selector | byte range | class |
//! |----------|------------|-------|
//! | `1` | `0x20..=0x3F` | reference (`R`) |
//! | `2` | `0x40..=0x5F` | value (`V`) |
//! | `3` | `0x60..=0x7F` | array (`A`) |
//!
//! The low 5 bits select the token family; the canonical base opcode is `0x20 | low5` (the
//! reference form). Bytes `0x00..=0x1F` are classless tokens (operators, constants, control).
//!
//! Bytes with bit 7 set have no assigned meaning. They are treated as a class-bearing token with
//! a reserved class selector and handled according to [`ReservedClassPolicy`].
//!
//! The codec never infers classes from formula semantics: the class read from an opcode byte is
//! stored verbatim on the token and written back verbatim.

use std::fmt;

const CLASS_SHIFT: u8 = 5;
const FAMILY_MASK: u8 = 0x1F;
const CLASS_BEARING_BASE: u8 = 0x20;

/// The result class of a class-bearing token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PtgClass {
    Reference,
    Value,
    Array,
}

impl PtgClass {
    pub const ALL: [PtgClass; 3] = [PtgClass::Reference, PtgClass::Value, PtgClass::Array];

    /// The 2-bit selector stored in bits 5-6 of the opcode byte.
    pub const fn selector(self) -> u8 {
        match self {
            PtgClass::Reference => 1,
            PtgClass::Value => 2,
            PtgClass::Array => 3,
        }
    }

    pub const fn from_selector(selector: u8) -> Option<PtgClass> {
        match selector {
            1 => Some(PtgClass::Reference),
            2 => Some(PtgClass::Value),
            3 => Some(PtgClass::Array),
            _ => None,
        }
    }

    /// Single-letter suffix used by Excel documentation (`PtgRefV`, `PtgFuncA`, ...).
    pub const fn suffix(self) -> char {
        match self {
            PtgClass::Reference => 'R',
            PtgClass::Value => 'V',
            PtgClass::Array => 'A',
        }
    }

    pub fn from_suffix(ch: char) -> Option<PtgClass> {
        match ch.to_ascii_uppercase() {
            'R' => Some(PtgClass::Reference),
            'V' => Some(PtgClass::Value),
            'A' => Some(PtgClass::Array),
            _ => None,
        }
    }

    /// Combine a class-bearing base opcode (`0x20..=0x3F`) with this class.
    pub const fn apply(self, base: u8) -> u8 {
        (base & FAMILY_MASK) | (self.selector() << CLASS_SHIFT)
    }
}

impl fmt::Display for PtgClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PtgClass::Reference => "reference",
            PtgClass::Value => "value",
            PtgClass::Array => "array",
        };
        f.write_str(name)
    }
}

/// What to do with an opcode byte whose class selector is reserved (bit 7 set).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReservedClassPolicy {
    /// Fail decode with [`crate::DecodePtgError::InvalidClass`].
    #[default]
    Reject,
    /// Decode the token family from the low 5 bits and assign this class instead.
    ///
    /// Re-encoding such a token writes the normalized class, so the original byte is not
    /// reproduced.
    Normalize(PtgClass),
}

/// An opcode byte split into its base opcode and class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitOpcode {
    /// `0x00..=0x1F`: no class is carried.
    Classless(u8),
    /// `0x20..=0x7F`: canonical base opcode (`0x20..=0x3F`) plus class.
    Classed(u8, PtgClass),
    /// Bit 7 set: canonical base opcode with a reserved class selector.
    Reserved(u8),
}

impl SplitOpcode {
    pub const fn base(self) -> u8 {
        match self {
            SplitOpcode::Classless(base)
            | SplitOpcode::Classed(base, _)
            | SplitOpcode::Reserved(base) => base,
        }
    }
}

/// Split an opcode byte into base opcode and class.
pub const fn split_opcode(byte: u8) -> SplitOpcode {
    let selector = byte >> CLASS_SHIFT;
    if selector == 0 {
        return SplitOpcode::Classless(byte);
    }
    let base = CLASS_BEARING_BASE | (byte & FAMILY_MASK);
    match PtgClass::from_selector(selector) {
        Some(class) => SplitOpcode::Classed(base, class),
        None => SplitOpcode::Reserved(base),
    }
}

/// Rebuild the opcode byte for a token. `class` is ignored for classless base opcodes.
pub const fn join_opcode(base: u8, class: Option<PtgClass>) -> u8 {
    match class {
        Some(class) if base >= CLASS_BEARING_BASE => class.apply(base),
        _ => base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_every_class_of_ptg_func() {
        assert_eq!(split_opcode(0x21), SplitOpcode::Classed(0x21, PtgClass::Reference));
        assert_eq!(split_opcode(0x41), SplitOpcode::Classed(0x21, PtgClass::Value));
        assert_eq!(split_opcode(0x61), SplitOpcode::Classed(0x21, PtgClass::Array));
    }

    #[test]
    fn classless_bytes_pass_through() {
        for byte in 0x00..=0x1F {
            assert_eq!(split_opcode(byte), SplitOpcode::Classless(byte));
            assert_eq!(join_opcode(byte, Some(PtgClass::Array)), byte);
        }
    }

    #[test]
    fn high_bit_is_reserved() {
        assert_eq!(split_opcode(0x81), SplitOpcode::Reserved(0x21));
        assert_eq!(split_opcode(0xE4), SplitOpcode::Reserved(0x24));
        assert_eq!(split_opcode(0x9F).base(), 0x3F);
    }

    #[test]
    fn join_inverts_split_for_all_class_bearing_bytes() {
        for byte in 0x20..=0x7Fu8 {
            let SplitOpcode::Classed(base, class) = split_opcode(byte) else {
                panic!("0x{byte:02X} should carry a class");
            };
            assert_eq!(join_opcode(base, Some(class)), byte);
        }
    }

    #[test]
    fn suffix_roundtrip() {
        for class in PtgClass::ALL {
            assert_eq!(PtgClass::from_suffix(class.suffix()), Some(class));
        }
        assert_eq!(PtgClass::from_suffix('x'), None);
    }
}
