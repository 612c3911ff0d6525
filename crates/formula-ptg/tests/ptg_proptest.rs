use formula_ptg::{
    decode_rgce_with_options, decode_rgce_with_rgcb, encode_ptgs, encoded_size, ArrayConstant,
    ArrayValue, AreaRef8, BiffString, BinaryOp, CellRef8, DecodeOptions, MemRange, Ptg, PtgAttr,
    PtgClass, UnaryOp, FTAB_USER_DEFINED,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

const MAX_INPUT_LEN: usize = 256;
const ERROR_CODES: [u8; 8] = [0x00, 0x07, 0x0F, 0x17, 0x1D, 0x24, 0x2A, 0x2B];

fn class() -> impl Strategy<Value = PtgClass> {
    prop_oneof![
        Just(PtgClass::Reference),
        Just(PtgClass::Value),
        Just(PtgClass::Array)
    ]
}

fn cell() -> impl Strategy<Value = CellRef8> {
    (any::<u16>(), any::<u16>()).prop_map(|(row, col_field)| CellRef8::from_fields(row, col_field))
}

fn area() -> impl Strategy<Value = AreaRef8> {
    (cell(), cell()).prop_map(|(first, last)| AreaRef8::new(first, last))
}

fn biff_string(max_cch: usize) -> impl Strategy<Value = BiffString> {
    prop_oneof![
        proptest::collection::vec(any::<u8>(), 0..=max_cch).prop_map(BiffString::Compressed),
        // Arbitrary code units, unpaired surrogates included.
        proptest::collection::vec(any::<u16>(), 0..=max_cch).prop_map(BiffString::Wide),
    ]
}

fn array_value() -> impl Strategy<Value = ArrayValue> {
    prop_oneof![
        Just(ArrayValue::Empty),
        (-1e12f64..1e12).prop_map(ArrayValue::Number),
        biff_string(16).prop_map(ArrayValue::Str),
        any::<bool>().prop_map(ArrayValue::Bool),
        proptest::sample::select(ERROR_CODES.to_vec()).prop_map(ArrayValue::Error),
    ]
}

fn array_constant() -> impl Strategy<Value = ArrayConstant> {
    (1usize..=3, 1usize..=3).prop_flat_map(|(rows, cols)| {
        proptest::collection::vec(array_value(), rows * cols)
            .prop_map(move |values| ArrayConstant::new(rows, cols, values))
    })
}

fn attr() -> impl Strategy<Value = PtgAttr> {
    prop_oneof![
        (
            proptest::sample::select(vec![
                PtgAttr::VOLATILE,
                PtgAttr::IF,
                PtgAttr::SKIP,
                PtgAttr::SUM,
                PtgAttr::SPACE,
                PtgAttr::VOLATILE | PtgAttr::SPACE,
            ]),
            any::<u16>()
        )
            .prop_map(|(flags, data)| PtgAttr::new(flags, data)),
        proptest::collection::vec(any::<u16>(), 1..6).prop_map(PtgAttr::choose),
    ]
}

fn func_var_id() -> impl Strategy<Value = u16> {
    (0u16..=0x7FFF).prop_filter("user-defined id decodes to its own variant", |id| {
        *id != FTAB_USER_DEFINED
    })
}

fn operator_ptg() -> impl Strategy<Value = Ptg> {
    prop_oneof![
        (any::<u16>(), any::<u16>()).prop_map(|(row, col)| Ptg::Exp { row, col }),
        (any::<u16>(), any::<u16>()).prop_map(|(row, col)| Ptg::Tbl { row, col }),
        proptest::sample::select(BinaryOp::ALL.to_vec()).prop_map(Ptg::Binary),
        proptest::sample::select(vec![UnaryOp::Plus, UnaryOp::Minus, UnaryOp::Percent])
            .prop_map(Ptg::Unary),
        Just(Ptg::Paren),
        Just(Ptg::MissArg),
    ]
}

fn constant_ptg() -> impl Strategy<Value = Ptg> {
    prop_oneof![
        biff_string(255).prop_map(Ptg::Str),
        attr().prop_map(Ptg::Attr),
        proptest::sample::select(ERROR_CODES.to_vec()).prop_map(Ptg::Err),
        any::<bool>().prop_map(Ptg::Bool),
        any::<u16>().prop_map(Ptg::Int),
        (-1e300f64..1e300).prop_map(Ptg::Num),
    ]
}

fn operand_ptg() -> impl Strategy<Value = Ptg> {
    prop_oneof![
        (class(), any::<[u8; 7]>(), array_constant()).prop_map(|(class, reserved, values)| {
            Ptg::Array {
                class,
                reserved,
                values,
            }
        }),
        (class(), any::<u16>()).prop_map(|(class, id)| Ptg::func(class, id)),
        (class(), func_var_id(), 0u8..=127, any::<bool>(), any::<bool>()).prop_map(
            |(class, func_id, arg_count, prompt, command_equivalent)| Ptg::FuncVar {
                class,
                func_id,
                arg_count,
                prompt,
                command_equivalent,
            }
        ),
        (class(), 0u8..=127, any::<bool>()).prop_map(|(class, arg_count, prompt)| {
            Ptg::UserFunc {
                class,
                arg_count,
                prompt,
                command_equivalent: false,
            }
        }),
        (class(), any::<u16>(), any::<u16>()).prop_map(|(class, name_index, reserved)| {
            Ptg::Name {
                class,
                name_index,
                reserved,
            }
        }),
        (class(), cell()).prop_map(|(class, cell)| Ptg::Ref { class, cell }),
        (class(), area()).prop_map(|(class, area)| Ptg::Area { class, area }),
    ]
}

fn mem_ptg() -> impl Strategy<Value = Ptg> {
    prop_oneof![
        (
            class(),
            any::<u32>(),
            any::<u16>(),
            proptest::collection::vec(
                (any::<u16>(), any::<u16>(), any::<u16>(), any::<u16>()),
                0..4
            )
        )
            .prop_map(|(class, reserved, cce, ranges)| Ptg::MemArea {
                class,
                reserved,
                cce,
                ranges: ranges
                    .into_iter()
                    .map(|(first_row, last_row, first_col, last_col)| MemRange {
                        first_row,
                        last_row,
                        first_col,
                        last_col,
                    })
                    .collect(),
            }),
        (class(), any::<u32>(), any::<u16>())
            .prop_map(|(class, reserved, cce)| Ptg::MemErr { class, reserved, cce }),
        (class(), any::<u32>(), any::<u16>())
            .prop_map(|(class, reserved, cce)| Ptg::MemNoMem { class, reserved, cce }),
        (class(), any::<u16>()).prop_map(|(class, cce)| Ptg::MemFunc { class, cce }),
        (class(), any::<u16>()).prop_map(|(class, cce)| Ptg::MemAreaN { class, cce }),
        (class(), any::<u16>()).prop_map(|(class, cce)| Ptg::MemNoMemN { class, cce }),
    ]
}

fn relative_and_3d_ptg() -> impl Strategy<Value = Ptg> {
    prop_oneof![
        (class(), any::<u32>()).prop_map(|(class, reserved)| Ptg::RefErr { class, reserved }),
        (class(), any::<[u8; 8]>()).prop_map(|(class, reserved)| Ptg::AreaErr { class, reserved }),
        (class(), cell()).prop_map(|(class, cell)| Ptg::RefN { class, cell }),
        (class(), area()).prop_map(|(class, area)| Ptg::AreaN { class, area }),
        (class(), any::<u16>(), any::<u16>(), any::<u16>()).prop_map(
            |(class, ixti, name_index, reserved)| Ptg::NameX {
                class,
                ixti,
                name_index,
                reserved,
            }
        ),
        (class(), any::<u16>(), cell()).prop_map(|(class, ixti, cell)| Ptg::Ref3d {
            class,
            ixti,
            cell
        }),
        (class(), any::<u16>(), area()).prop_map(|(class, ixti, area)| Ptg::Area3d {
            class,
            ixti,
            area
        }),
        (class(), any::<u16>(), any::<u32>()).prop_map(|(class, ixti, reserved)| {
            Ptg::RefErr3d {
                class,
                ixti,
                reserved,
            }
        }),
        (class(), any::<u16>(), any::<[u8; 8]>()).prop_map(|(class, ixti, reserved)| {
            Ptg::AreaErr3d {
                class,
                ixti,
                reserved,
            }
        }),
    ]
}

fn ptg() -> impl Strategy<Value = Ptg> {
    prop_oneof![
        1 => operator_ptg(),
        1 => constant_ptg(),
        2 => operand_ptg(),
        1 => mem_ptg(),
        2 => relative_and_3d_ptg(),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 512,
        rng_seed: proptest::test_runner::RngSeed::Fixed(0),
        failure_persistence: None,
        .. ProptestConfig::default()
    })]

    #[test]
    fn token_sequences_roundtrip(ptgs in proptest::collection::vec(ptg(), 0..16)) {
        let size = encoded_size(&ptgs).expect("generated tokens are encodable");
        let encoded = encode_ptgs(&ptgs).expect("encode");
        prop_assert_eq!(encoded.rgce.len(), size.rgce_len);
        prop_assert_eq!(encoded.rgcb.len(), size.rgcb_len);
        prop_assert_eq!(
            size.rgce_len,
            ptgs.iter().map(|ptg| ptg.payload_size() + 1).sum::<usize>()
        );

        let decoded = decode_rgce_with_options(&encoded.rgce, &encoded.rgcb, &DecodeOptions::default())
            .expect("decode");
        prop_assert_eq!(decoded.rgce_len, encoded.rgce.len());
        prop_assert_eq!(decoded.rgcb_len, encoded.rgcb.len());
        assert_eq!(decoded.ptgs, ptgs);
    }

    #[test]
    fn decode_is_panic_free_on_arbitrary_input(
        rgce in proptest::collection::vec(any::<u8>(), 0..=MAX_INPUT_LEN),
        rgcb in proptest::collection::vec(any::<u8>(), 0..=MAX_INPUT_LEN),
    ) {
        let result = std::panic::catch_unwind(|| decode_rgce_with_rgcb(&rgce, &rgcb));
        prop_assert!(result.is_ok(), "decode panicked");
    }

    #[test]
    fn decodable_streams_reencode_byte_for_byte(
        rgce in proptest::collection::vec(any::<u8>(), 0..=MAX_INPUT_LEN),
        rgcb in proptest::collection::vec(any::<u8>(), 0..=MAX_INPUT_LEN),
    ) {
        if let Ok(decoded) = decode_rgce_with_options(&rgce, &rgcb, &DecodeOptions::default()) {
            let encoded = encode_ptgs(&decoded.ptgs).expect("decoded tokens are encodable");
            prop_assert_eq!(&encoded.rgce, &rgce);
            // Array padding is not preserved, so only the length of the trailing data must agree.
            prop_assert_eq!(encoded.rgcb.len(), decoded.rgcb_len);
        }
    }
}
