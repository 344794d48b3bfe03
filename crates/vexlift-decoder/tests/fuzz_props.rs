use proptest::prelude::*;
use vexlift_decoder::{decode_instruction, DecodeMode, MAX_INSTRUCTION_LEN};

proptest! {
    /// §7: "the lifter must never panic on arbitrary input bytes". The
    /// decoder it sits on top of is where that guarantee has to start.
    #[test]
    fn decoder_never_panics_on_arbitrary_bytes(bytes in prop::collection::vec(any::<u8>(), 0..32)) {
        for mode in [DecodeMode::Bits16, DecodeMode::Bits32, DecodeMode::Bits64] {
            let _ = decode_instruction(mode, 0, &bytes);
        }
    }

    #[test]
    fn a_successful_decode_never_exceeds_the_architectural_length_limit(
        bytes in prop::collection::vec(any::<u8>(), 1..32),
    ) {
        if let Ok(decoded) = decode_instruction(DecodeMode::Bits64, 0, &bytes) {
            prop_assert!(decoded.len() <= MAX_INSTRUCTION_LEN);
            prop_assert!(decoded.len() <= bytes.len());
        }
    }

    #[test]
    fn decoding_is_deterministic(bytes in prop::collection::vec(any::<u8>(), 0..32)) {
        let a = decode_instruction(DecodeMode::Bits64, 0x4000, &bytes);
        let b = decode_instruction(DecodeMode::Bits64, 0x4000, &bytes);
        prop_assert_eq!(a, b);
    }
}
