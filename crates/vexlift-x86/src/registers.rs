//! Operand-width to [`IrType`] mapping and x86 sub-register naming.
//!
//! [`vexlift_guest::Gpr::name_at_width`] only covers the 32/64-bit names
//! (`EAX`/`RAX`); the 8/16-bit legacy names, including the high-byte
//! `AH`/`CH`/`DH`/`BH` quartet, are resolved here from the decoder's
//! `high_byte` flag instead, since only the decoder knows whether a REX
//! prefix was present.

use vexlift_guest::Gpr;
use vexlift_ir::IrConst;
use vexlift_types::IrType;

pub fn ir_type_for_width(width_bits: u32) -> IrType {
    match width_bits {
        8 => IrType::I8,
        16 => IrType::I16,
        32 => IrType::I32,
        64 => IrType::I64,
        other => unreachable!("x86 has no {other}-bit GPR operand"),
    }
}

/// Truncate `v` to `width_bits` and wrap it as the matching [`IrConst`]
/// variant, for immediates and synthesized constants (shift-by-one, etc).
pub fn const_for_width(v: i64, width_bits: u32) -> IrConst {
    match width_bits {
        8 => IrConst::I8(v as u8),
        16 => IrConst::I16(v as u16),
        32 => IrConst::I32(v as u32),
        64 => IrConst::I64(v as u64),
        other => unreachable!("x86 has no {other}-bit GPR operand"),
    }
}

pub fn gpr_name(gpr: Gpr, width_bits: u32, high_byte: bool) -> &'static str {
    use Gpr::*;
    if width_bits == 8 && high_byte {
        return match gpr {
            Rax => "AH",
            Rcx => "CH",
            Rdx => "DH",
            Rbx => "BH",
            _ => unreachable!("high-byte encoding is only defined for AX/CX/DX/BX"),
        };
    }
    match (gpr, width_bits) {
        (Rax, 8) => "AL",
        (Rcx, 8) => "CL",
        (Rdx, 8) => "DL",
        (Rbx, 8) => "BL",
        (Rsp, 8) => "SPL",
        (Rbp, 8) => "BPL",
        (Rsi, 8) => "SIL",
        (Rdi, 8) => "DIL",
        (R8, 8) => "R8B",
        (R9, 8) => "R9B",
        (R10, 8) => "R10B",
        (R11, 8) => "R11B",
        (R12, 8) => "R12B",
        (R13, 8) => "R13B",
        (R14, 8) => "R14B",
        (R15, 8) => "R15B",
        (Rax, 16) => "AX",
        (Rcx, 16) => "CX",
        (Rdx, 16) => "DX",
        (Rbx, 16) => "BX",
        (Rsp, 16) => "SP",
        (Rbp, 16) => "BP",
        (Rsi, 16) => "SI",
        (Rdi, 16) => "DI",
        (R8, 16) => "R8W",
        (R9, 16) => "R9W",
        (R10, 16) => "R10W",
        (R11, 16) => "R11W",
        (R12, 16) => "R12W",
        (R13, 16) => "R13W",
        (R14, 16) => "R14W",
        (R15, 16) => "R15W",
        (gpr, width) => gpr.name_at_width(width),
    }
}

/// The opcode-nibble encoding `ConditionCode::from_nibble` decodes from,
/// recovered for building the condition-evaluation helper call's argument.
pub fn condition_nibble(cc: vexlift_decoder::ConditionCode) -> u8 {
    use vexlift_decoder::ConditionCode::*;
    match cc {
        O => 0x0,
        No => 0x1,
        B => 0x2,
        Ae => 0x3,
        E => 0x4,
        Ne => 0x5,
        Be => 0x6,
        A => 0x7,
        S => 0x8,
        Ns => 0x9,
        P => 0xA,
        Np => 0xB,
        L => 0xC,
        Ge => 0xD,
        Le => 0xE,
        G => 0xF,
    }
}

/// `ZMM`/`YMM`/`XMM`, by the vector width the operand was decoded at.
pub fn vector_name(index: u8, width_bits: u32) -> String {
    let prefix = match width_bits {
        512 => "ZMM",
        256 => "YMM",
        _ => "XMM",
    };
    format!("{prefix}{index}")
}

pub fn vector_type(width_bits: u32) -> IrType {
    match width_bits {
        512 => IrType::V512,
        256 => IrType::V256,
        _ => IrType::V128,
    }
}

pub fn mask_name(index: u8) -> String {
    format!("K{index}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_byte_names_only_cover_the_four_legacy_registers() {
        assert_eq!(gpr_name(Gpr::Rax, 8, true), "AH");
        assert_eq!(gpr_name(Gpr::Rbx, 8, true), "BH");
    }

    #[test]
    fn low_byte_names_cover_the_rex_extended_registers() {
        assert_eq!(gpr_name(Gpr::Rsp, 8, false), "SPL");
        assert_eq!(gpr_name(Gpr::R12, 8, false), "R12B");
    }

    #[test]
    fn wide_names_delegate_to_gpr_name_at_width() {
        assert_eq!(gpr_name(Gpr::Rax, 32, false), "EAX");
        assert_eq!(gpr_name(Gpr::Rax, 64, false), "RAX");
    }

    #[test]
    fn condition_nibble_round_trips_through_from_nibble() {
        for n in 0..16u8 {
            let cc = vexlift_decoder::ConditionCode::from_nibble(n);
            assert_eq!(condition_nibble(cc), n);
        }
    }

    #[test]
    fn vector_name_picks_the_alias_matching_width() {
        assert_eq!(vector_name(1, 512), "ZMM1");
        assert_eq!(vector_name(1, 256), "YMM1");
        assert_eq!(vector_name(1, 128), "XMM1");
    }
}
