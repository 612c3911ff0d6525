use crate::class::ReservedClassPolicy;

/// Knobs for [`crate::decode_ptgs`].
///
/// The defaults accept everything Excel writes and reject only streams that cannot be decoded
/// unambiguously.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// What to do with an opcode byte whose class selector is the reserved combination.
    pub reserved_class: ReservedClassPolicy,
    /// Fail on function calls whose argument count disagrees with the function table.
    ///
    /// When `false` the mismatch is logged and the token is kept as stored.
    pub strict_function_arity: bool,
    /// Upper bound on the number of decoded tokens.
    pub max_tokens: Option<usize>,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            reserved_class: ReservedClassPolicy::Reject,
            strict_function_arity: false,
            max_tokens: None,
        }
    }
}

impl DecodeOptions {
    pub fn strict() -> Self {
        Self {
            strict_function_arity: true,
            ..Self::default()
        }
    }
}
