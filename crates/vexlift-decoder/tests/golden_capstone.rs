//! Differential test: decode a small corpus of byte sequences with both this
//! decoder and `capstone` (an independent, well-tested oracle) and compare
//! instruction length. A hand-written decoder's first bug is almost always a
//! length miscount, which silently desyncs the whole basic-block walk.
use capstone::prelude::*;
use vexlift_decoder::{decode_instruction, DecodeMode};

fn capstone_length(mode: DecodeMode, bytes: &[u8]) -> usize {
    let cs = match mode {
        DecodeMode::Bits16 => Capstone::new()
            .x86()
            .mode(arch::x86::ArchMode::Mode16)
            .build(),
        DecodeMode::Bits32 => Capstone::new()
            .x86()
            .mode(arch::x86::ArchMode::Mode32)
            .build(),
        DecodeMode::Bits64 => Capstone::new()
            .x86()
            .mode(arch::x86::ArchMode::Mode64)
            .build(),
    }
    .expect("capstone init");
    let insns = cs.disasm_count(bytes, 0, 1).expect("capstone disasm");
    insns.iter().next().expect("one instruction").len()
}

fn assert_lengths_agree(mode: DecodeMode, bytes: &[u8]) {
    let ours = decode_instruction(mode, 0, bytes).expect("our decode");
    let theirs = capstone_length(mode, bytes);
    assert_eq!(
        ours.len(),
        theirs,
        "length mismatch for {bytes:02x?} in {mode:?}"
    );
}

#[test]
fn mov_eax_imm32_length_agrees() {
    assert_lengths_agree(DecodeMode::Bits32, &[0xB8, 0x2A, 0x00, 0x00, 0x00]);
}

#[test]
fn mov_rax_imm64_length_agrees() {
    assert_lengths_agree(
        DecodeMode::Bits64,
        &[0x48, 0xB8, 0x2A, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
    );
}

#[test]
fn add_eax_ebx_length_agrees() {
    assert_lengths_agree(DecodeMode::Bits32, &[0x01, 0xD8]);
}

#[test]
fn push_eax_length_agrees() {
    assert_lengths_agree(DecodeMode::Bits32, &[0x50]);
}

#[test]
fn ret_length_agrees() {
    assert_lengths_agree(DecodeMode::Bits32, &[0xC3]);
}

#[test]
fn lock_add_dword_ptr_length_agrees() {
    assert_lengths_agree(DecodeMode::Bits32, &[0xF0, 0x83, 0x00, 0x01]);
}

#[test]
fn rip_relative_mov_length_agrees() {
    assert_lengths_agree(
        DecodeMode::Bits64,
        &[0x48, 0x8B, 0x05, 0x78, 0x56, 0x34, 0x12],
    );
}
