//! Byte-exact re-serialization of token streams as Excel writes them.

use formula_ptg::{
    check_stack_balance, decode_ptgs, decode_rgce_with_options, encode_ptgs, encoded_size,
    ArrayConstant, ArrayValue, AreaRef8, BiffString, CellRef8, DecodeOptions, MemRange, Ptg,
    PtgAttr, PtgClass,
};
use pretty_assertions::assert_eq;

struct Fixture {
    formula: &'static str,
    rgce: &'static [u8],
    rgcb: &'static [u8],
}

const FIXTURES: &[Fixture] = &[
    Fixture {
        formula: "=SUM(A1:B2)",
        rgce: &[
            0x25, 0x00, 0x00, 0x01, 0x00, 0x00, 0xC0, 0x01, 0xC0, // PtgArea
            0x19, 0x10, 0x00, 0x00, // tAttrSum
        ],
        rgcb: &[],
    },
    Fixture {
        formula: "=IF(A1>0,\"yes\",\"no\")",
        rgce: &[
            0x44, 0x00, 0x00, 0x00, 0xC0, // PtgRefV A1
            0x1E, 0x00, 0x00, // 0
            0x0D, // >
            0x19, 0x02, 0x0A, 0x00, // tAttrIf
            0x17, 0x03, 0x00, b'y', b'e', b's', //
            0x19, 0x08, 0x09, 0x00, // tAttrSkip
            0x17, 0x02, 0x00, b'n', b'o', //
            0x19, 0x08, 0x03, 0x00, // tAttrSkip
            0x42, 0x03, 0x01, 0x00, // IF, 3 args
        ],
        rgcb: &[],
    },
    Fixture {
        formula: "=ROUND(PI()*2,1)",
        rgce: &[
            0x41, 0x13, 0x00, 0x1E, 0x02, 0x00, 0x05, 0x1E, 0x01, 0x00, 0x41, 0x1B, 0x00,
        ],
        rgcb: &[],
    },
    Fixture {
        formula: "=Sheet2!A1+1",
        rgce: &[
            0x5A, 0x01, 0x00, 0x00, 0x00, 0x00, 0xC0, 0x1E, 0x01, 0x00, 0x03,
        ],
        rgcb: &[],
    },
    Fixture {
        formula: "=SUM({1,\"a\";TRUE,#N/A})",
        rgce: &[
            0x60, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // PtgArrayA
            0x42, 0x01, 0x04, 0x00, // SUM, 1 arg
        ],
        rgcb: &[
            0x01, 0x01, 0x00, // 2 cols, 2 rows
            0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xF0, 0x3F, // 1.0
            0x02, 0x01, 0x00, 0x00, b'a', // "a"
            0x04, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // TRUE
            0x10, 0x2A, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // #N/A
        ],
    },
    Fixture {
        formula: "=\"\u{20ac}A\"",
        rgce: &[0x17, 0x02, 0x01, 0xAC, 0x20, 0x41, 0x00],
        rgcb: &[],
    },
    Fixture {
        formula: "shared formula anchor",
        rgce: &[0x01, 0x05, 0x00, 0x02, 0x00],
        rgcb: &[],
    },
    Fixture {
        formula: "=SUM(A1:B2 B1:C3)",
        rgce: &[
            0x29, 0x13, 0x00, // PtgMemFunc, cce=19
            0x25, 0x00, 0x00, 0x01, 0x00, 0x00, 0xC0, 0x01, 0xC0, //
            0x25, 0x00, 0x00, 0x02, 0x00, 0x01, 0xC0, 0x02, 0xC0, //
            0x0F, // intersection
            0x42, 0x01, 0x04, 0x00,
        ],
        rgcb: &[],
    },
    Fixture {
        formula: "=SUM((A1:B2 B1:C3))",
        rgce: &[
            0x26, 0x00, 0x00, 0x00, 0x00, 0x14, 0x00, // PtgMemArea, cce=20
            0x25, 0x00, 0x00, 0x01, 0x00, 0x00, 0xC0, 0x01, 0xC0, //
            0x25, 0x00, 0x00, 0x02, 0x00, 0x01, 0xC0, 0x02, 0xC0, //
            0x0F, 0x15, //
            0x42, 0x01, 0x04, 0x00,
        ],
        rgcb: &[
            0x01, 0x00, // one range
            0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x01, 0x00,
        ],
    },
    Fixture {
        formula: "=CHOOSE(2,10,20)",
        rgce: &[
            0x1E, 0x02, 0x00, //
            0x19, 0x04, 0x02, 0x00, 0x08, 0x00, 0x0C, 0x00, 0x10, 0x00, // tAttrChoose
            0x1E, 0x0A, 0x00, //
            0x19, 0x08, 0x07, 0x00, //
            0x1E, 0x14, 0x00, //
            0x19, 0x08, 0x03, 0x00, //
            0x42, 0x03, 0x64, 0x00, // CHOOSE, 3 args
        ],
        rgcb: &[],
    },
    Fixture {
        formula: "=IF(#DIV/0!,TRUE,2.5)",
        rgce: &[
            0x1C, 0x07, 0x1D, 0x01, 0x1F, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x04, 0x40, 0x42,
            0x03, 0x01, 0x00,
        ],
        rgcb: &[],
    },
    Fixture {
        formula: "=R[-1]C[-1]+SUM(RC:R[1]C[1]) (shared body)",
        rgce: &[
            0x4C, 0xFF, 0xFF, 0xFF, 0xFF, // PtgRefNV
            0x2D, 0x00, 0x00, 0x01, 0x00, 0x00, 0xC0, 0x01, 0xC0, // PtgAreaN
            0x42, 0x01, 0x04, 0x00, //
            0x03,
        ],
        rgcb: &[],
    },
    Fixture {
        formula: "=#REF!+Sheet3!#REF!",
        rgce: &[
            0x4A, 0x00, 0x00, 0x00, 0x00, // PtgRefErrV
            0x5C, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, // PtgRefErr3dV
            0x03,
        ],
        rgcb: &[],
    },
    Fixture {
        formula: "=MyName*2",
        rgce: &[
            0x43, 0x01, 0x00, 0x00, 0x00, // PtgNameV
            0x1E, 0x02, 0x00, 0x05,
        ],
        rgcb: &[],
    },
    Fixture {
        formula: "=MYUDF(,1)",
        rgce: &[
            0x39, 0x00, 0x00, 0x03, 0x00, 0x00, 0x00, // PtgNameX
            0x16, // PtgMissArg
            0x1E, 0x01, 0x00, //
            0x42, 0x03, 0xFF, 0x00, // user-defined, 3 operands
        ],
        rgcb: &[],
    },
];

#[test]
fn real_formulas_reencode_byte_for_byte() {
    for fixture in FIXTURES {
        let decoded = decode_rgce_with_options(fixture.rgce, fixture.rgcb, &DecodeOptions::strict())
            .unwrap_or_else(|err| panic!("{}: decode failed: {err}", fixture.formula));
        assert_eq!(decoded.rgce_len, fixture.rgce.len(), "{}", fixture.formula);
        assert_eq!(decoded.rgcb_len, fixture.rgcb.len(), "{}", fixture.formula);

        let size = encoded_size(&decoded.ptgs).expect("size");
        assert_eq!(size.rgce_len, fixture.rgce.len(), "{}", fixture.formula);
        assert_eq!(size.rgcb_len, fixture.rgcb.len(), "{}", fixture.formula);
        let summed: usize = decoded.ptgs.iter().map(|ptg| ptg.payload_size() + 1).sum();
        assert_eq!(summed, size.rgce_len, "{}", fixture.formula);

        let encoded = encode_ptgs(&decoded.ptgs).expect("encode");
        assert_eq!(encoded.rgce, fixture.rgce, "{}", fixture.formula);
        assert_eq!(encoded.rgcb, fixture.rgcb, "{}", fixture.formula);
    }
}

#[test]
fn complete_formulas_are_stack_balanced() {
    for fixture in FIXTURES {
        if !fixture.formula.starts_with('=') {
            continue;
        }
        let decoded =
            decode_rgce_with_options(fixture.rgce, fixture.rgcb, &DecodeOptions::default())
                .expect("decode");
        assert_eq!(
            check_stack_balance(&decoded.ptgs),
            Ok(()),
            "{}",
            fixture.formula
        );
    }
}

#[test]
fn array_constant_is_attached_to_its_token() {
    let fixture = &FIXTURES[4];
    let decoded =
        decode_rgce_with_options(fixture.rgce, fixture.rgcb, &DecodeOptions::default())
            .expect("decode");
    assert_eq!(
        decoded.ptgs[0],
        Ptg::Array {
            class: PtgClass::Array,
            reserved: [0; 7],
            values: ArrayConstant::new(
                2,
                2,
                vec![
                    ArrayValue::Number(1.0),
                    ArrayValue::Str(BiffString::new("a")),
                    ArrayValue::Bool(true),
                    ArrayValue::Error(0x2A),
                ],
            ),
        }
    );
}

#[test]
fn mem_area_ranges_are_attached_to_their_token() {
    let fixture = &FIXTURES[8];
    let decoded =
        decode_rgce_with_options(fixture.rgce, fixture.rgcb, &DecodeOptions::default())
            .expect("decode");
    let Ptg::MemArea { cce, ranges, .. } = &decoded.ptgs[0] else {
        panic!("expected PtgMemArea, got {:?}", decoded.ptgs[0]);
    };
    assert_eq!(*cce, 20);
    assert_eq!(
        ranges,
        &vec![MemRange {
            first_row: 0,
            last_row: 1,
            first_col: 1,
            last_col: 1,
        }]
    );
}

#[test]
fn trailing_blocks_are_read_in_token_order() {
    let ptgs = vec![
        Ptg::Array {
            class: PtgClass::Value,
            reserved: [0; 7],
            values: ArrayConstant::new(1, 1, vec![ArrayValue::Number(7.0)]),
        },
        Ptg::Array {
            class: PtgClass::Value,
            reserved: [0; 7],
            values: ArrayConstant::new(1, 2, vec![ArrayValue::Empty, ArrayValue::Bool(false)]),
        },
        Ptg::Binary(formula_ptg::BinaryOp::Add),
    ];
    let encoded = encode_ptgs(&ptgs).expect("encode");
    assert_eq!(encoded.rgcb.len(), (3 + 9) + (3 + 18));

    let record = encoded.clone().into_bytes();
    let decoded =
        decode_ptgs(&record, 0, encoded.rgce.len(), &DecodeOptions::default()).expect("decode");
    assert_eq!(decoded.ptgs, ptgs);
    assert_eq!(decoded.rgcb_len, encoded.rgcb.len());
}

#[test]
fn array_padding_is_rewritten_as_zero() {
    let rgce = [0x60, 0, 0, 0, 0, 0, 0, 0];
    let rgcb = [
        0x00, 0x00, 0x00, // 1x1
        0x04, 0x01, 0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x00, 0x00, // TRUE with junk padding
    ];
    let decoded =
        decode_rgce_with_options(&rgce, &rgcb, &DecodeOptions::default()).expect("decode");
    let encoded = encode_ptgs(&decoded.ptgs).expect("encode");
    assert_eq!(encoded.rgce, rgce);
    assert_eq!(
        encoded.rgcb,
        vec![0x00, 0x00, 0x00, 0x04, 0x01, 0, 0, 0, 0, 0, 0, 0]
    );
}

#[test]
fn hand_built_references_encode_expected_bytes() {
    let ptgs = vec![
        Ptg::Area3d {
            class: PtgClass::Reference,
            ixti: 2,
            area: AreaRef8::new(CellRef8::absolute(0, 0), CellRef8::absolute(99, 3)),
        },
        Ptg::Attr(PtgAttr::sum()),
    ];
    let encoded = encode_ptgs(&ptgs).expect("encode");
    assert_eq!(
        encoded.rgce,
        vec![
            0x3B, 0x02, 0x00, 0x00, 0x00, 0x63, 0x00, 0x00, 0x00, 0x03, 0x00, 0x19, 0x10, 0x00,
            0x00
        ]
    );
}

#[test]
fn wide_string_with_unpaired_surrogate_roundtrips() {
    let rgce = [0x17, 0x01, 0x01, 0x00, 0xD8];
    let decoded =
        decode_rgce_with_options(&rgce, &[], &DecodeOptions::strict()).expect("decode");
    assert_eq!(decoded.ptgs, vec![Ptg::Str(BiffString::Wide(vec![0xD800]))]);
    let Ptg::Str(s) = &decoded.ptgs[0] else {
        unreachable!()
    };
    assert_eq!(s.to_text(), None);
    assert_eq!(s.to_string_lossy(), "\u{FFFD}");
    assert_eq!(encode_ptgs(&decoded.ptgs).expect("encode").rgce, rgce);
}

#[test]
fn nan_payload_is_written_back_unchanged() {
    let rgce = [0x1F, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0xF8, 0x7F];
    let ptgs = decode_rgce_with_options(&rgce, &[], &DecodeOptions::default())
        .expect("decode")
        .ptgs;
    assert!(matches!(ptgs[0], Ptg::Num(n) if n.is_nan()));
    // NaN != NaN, so only the bytes can be compared.
    assert_eq!(encode_ptgs(&ptgs).expect("encode").rgce, rgce);
}
