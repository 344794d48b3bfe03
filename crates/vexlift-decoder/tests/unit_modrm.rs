use vexlift_decoder::{decode_one, DecodeMode, MemoryOperand, Mnemonic, Operand};
use vexlift_guest::Gpr;

#[test]
fn decodes_rip_relative_memory_operand() {
    // 48 8B 05 78 56 34 12  => mov rax, qword ptr [rip+0x12345678]
    let bytes = [0x48, 0x8B, 0x05, 0x78, 0x56, 0x34, 0x12];
    let decoded = decode_one(DecodeMode::Bits64, 0x1000, &bytes).expect("decode");
    assert_eq!(decoded.mnemonic, Mnemonic::Mov);
    assert_eq!(decoded.op_count(), 2);
    match decoded.operands()[1] {
        Operand::Memory(MemoryOperand {
            base,
            index,
            rip_relative,
            disp,
            ..
        }) => {
            assert_eq!(base, None);
            assert_eq!(index, None);
            assert!(rip_relative);
            assert_eq!(disp, 0x12345678);
        }
        other => panic!("expected a memory operand, got {other:?}"),
    }
}

#[test]
fn decodes_sib_scaled_index() {
    // 48 8B 84 8B 78 56 34 12
    // mov rax, qword ptr [rbx+rcx*4+0x12345678]
    let bytes = [0x48, 0x8B, 0x84, 0x8B, 0x78, 0x56, 0x34, 0x12];
    let decoded = decode_one(DecodeMode::Bits64, 0, &bytes).expect("decode");
    match decoded.operands()[1] {
        Operand::Memory(MemoryOperand {
            base,
            index,
            scale,
            disp,
            ..
        }) => {
            assert_eq!(base, Some(Gpr::Rbx));
            assert_eq!(index, Some(Gpr::Rcx));
            assert_eq!(scale, 4);
            assert_eq!(disp, 0x12345678);
        }
        other => panic!("expected a memory operand, got {other:?}"),
    }
}

#[test]
fn mod_11_is_register_direct_not_memory() {
    // 01 D8 => add eax, ebx
    let bytes = [0x01, 0xD8];
    let decoded = decode_one(DecodeMode::Bits32, 0, &bytes).expect("decode");
    assert_eq!(decoded.mnemonic, Mnemonic::Add);
    assert_eq!(decoded.len(), 2);
    match decoded.operands()[0] {
        Operand::Register { gpr, width_bits, .. } => {
            assert_eq!(gpr, Gpr::Rax);
            assert_eq!(width_bits, 32);
        }
        other => panic!("expected a direct register operand, got {other:?}"),
    }
}

#[test]
fn disp32_no_base_addressing_is_distinguished_from_rip_relative() {
    // 8B 05 EF BE AD DE => mov eax, [0xDEADBEEF] in 32-bit mode (no REX, no SIB)
    let bytes = [0x8B, 0x05, 0xEF, 0xBE, 0xAD, 0xDE];
    let decoded = decode_one(DecodeMode::Bits32, 0, &bytes).expect("decode");
    match decoded.operands()[1] {
        Operand::Memory(MemoryOperand {
            base,
            rip_relative,
            disp,
            ..
        }) => {
            assert_eq!(base, None);
            assert!(!rip_relative);
            assert_eq!(disp, 0xDEADBEEFu32 as i64 as i32 as i64);
        }
        other => panic!("expected a memory operand, got {other:?}"),
    }
}
