use vexlift_decoder::{decode_instruction, DecodeError, DecodeMode, MAX_INSTRUCTION_LEN};

#[test]
fn no_more_bytes_with_full_15_byte_window_is_invalid_instruction() {
    // A stream of only prefix bytes can never form a valid instruction: x86
    // instructions must include at least one opcode byte within the
    // architectural 15-byte maximum length, so "need more bytes" at the
    // full window implies the instruction is invalid, not merely truncated.
    let bytes = [0x66u8; MAX_INSTRUCTION_LEN];
    assert_eq!(
        decode_instruction(DecodeMode::Bits64, 0, &bytes).unwrap_err(),
        DecodeError::InvalidInstruction
    );
}

#[test]
fn empty_input_needs_more_bytes() {
    let bytes: [u8; 0] = [];
    assert_eq!(
        decode_instruction(DecodeMode::Bits64, 0, &bytes).unwrap_err(),
        DecodeError::NeedMoreBytes
    );
}

#[test]
fn truncated_immediate_needs_more_bytes() {
    // B8 (MOV EAX, imm32) with only two of the four immediate bytes present.
    let bytes = [0xB8, 0x01, 0x02];
    assert_eq!(
        decode_instruction(DecodeMode::Bits32, 0, &bytes).unwrap_err(),
        DecodeError::NeedMoreBytes
    );
}

#[test]
fn unknown_two_byte_opcode_is_rejected_cleanly() {
    // 0F FF has no assigned meaning in this decoder's coverage.
    let bytes = [0x0F, 0xFF];
    let err = decode_instruction(DecodeMode::Bits64, 0, &bytes).unwrap_err();
    assert!(matches!(err, DecodeError::UnrecognisedTwoByteOpcode(0xFF)));
}

#[test]
fn rcl_rcr_are_rejected_rather_than_mislabelled() {
    // D1 /2 and D1 /3 are RCL/RCR by 1, which have no lifter emitter.
    let rcl = [0xD1, 0xD0]; // reg field = 010
    let rcr = [0xD1, 0xD8]; // reg field = 011
    assert!(matches!(
        decode_instruction(DecodeMode::Bits32, 0, &rcl).unwrap_err(),
        DecodeError::UnrecognisedOpcode(_)
    ));
    assert!(matches!(
        decode_instruction(DecodeMode::Bits32, 0, &rcr).unwrap_err(),
        DecodeError::UnrecognisedOpcode(_)
    ));
}
