//! Cross-checks instruction length against `iced-x86`, an independent,
//! widely-used x86 decoder, for the byte sequences this decoder claims to
//! support. `iced-x86` is a dev-only oracle; it is never linked into a
//! release build of this crate.
use iced_x86::{Decoder, DecoderOptions};
use vexlift_decoder::{decode_instruction, DecodeMode};

fn iced_length(bitness: u32, bytes: &[u8]) -> usize {
    let mut decoder = Decoder::with_ip(bitness, bytes, 0, DecoderOptions::NONE);
    decoder.decode().len()
}

fn assert_lengths_agree(mode: DecodeMode, bitness: u32, bytes: &[u8]) {
    let ours = decode_instruction(mode, 0, bytes).expect("our decode");
    let theirs = iced_length(bitness, bytes);
    assert_eq!(ours.len(), theirs, "length mismatch for {bytes:02x?}");
}

#[test]
fn scenario_mov_eax_imm32() {
    assert_lengths_agree(DecodeMode::Bits32, 32, &[0xB8, 0x2A, 0x00, 0x00, 0x00]);
}

#[test]
fn scenario_mov_rax_imm64() {
    assert_lengths_agree(
        DecodeMode::Bits64,
        64,
        &[0x48, 0xB8, 0x2A, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
    );
}

#[test]
fn scenario_add_eax_ebx() {
    assert_lengths_agree(DecodeMode::Bits32, 32, &[0x01, 0xD8]);
}

#[test]
fn scenario_call_rel32() {
    assert_lengths_agree(DecodeMode::Bits64, 64, &[0xE8, 0x00, 0x01, 0x00, 0x00]);
}

#[test]
fn scenario_jcc_rel8() {
    assert_lengths_agree(DecodeMode::Bits64, 64, &[0x74, 0x10]);
}

#[test]
fn scenario_cmovcc() {
    assert_lengths_agree(DecodeMode::Bits64, 64, &[0x0F, 0x44, 0xC1]);
}
