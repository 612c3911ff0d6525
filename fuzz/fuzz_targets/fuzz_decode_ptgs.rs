#![no_main]

use libfuzzer_sys::fuzz_target;

use formula_ptg::{decode_ptgs, encode_ptgs, DecodeOptions, PtgClass, ReservedClassPolicy};

/// `cce` is a u16 in every record that carries a formula.
const MAX_INPUT_BYTES: usize = u16::MAX as usize * 2;

fuzz_target!(|data: &[u8]| {
    if data.len() < 3 {
        return;
    }
    let data = if data.len() > MAX_INPUT_BYTES {
        &data[..MAX_INPUT_BYTES]
    } else {
        data
    };

    // First byte picks decode options, next two the declared stream length.
    let selector = data[0];
    let buf = &data[3..];
    let len = usize::from(u16::from_le_bytes([data[1], data[2]])) % (buf.len() + 1);

    let reserved_class = match selector & 0b11 {
        0 => ReservedClassPolicy::Reject,
        1 => ReservedClassPolicy::Normalize(PtgClass::Reference),
        2 => ReservedClassPolicy::Normalize(PtgClass::Value),
        _ => ReservedClassPolicy::Normalize(PtgClass::Array),
    };
    let opts = DecodeOptions {
        reserved_class,
        strict_function_arity: selector & 0b100 != 0,
        max_tokens: (selector & 0b1000 != 0).then_some(64),
    };

    let Ok(decoded) = decode_ptgs(buf, 0, len, &opts) else {
        return;
    };
    let encoded = encode_ptgs(&decoded.ptgs).expect("decoded tokens must re-encode");
    assert_eq!(encoded.rgce.len(), decoded.rgce_len);
    assert_eq!(encoded.rgcb.len(), decoded.rgcb_len);
    if reserved_class == ReservedClassPolicy::Reject {
        assert_eq!(encoded.rgce, &buf[..len]);
    }
});
