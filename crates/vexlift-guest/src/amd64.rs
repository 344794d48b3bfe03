//! AMD64 guest state (§4.4): 16 GPRs, RIP, segment selectors + FS/GS bases,
//! the AVX-512 ZMM register file (XMM/YMM alias its low 128/256 bits), eight
//! mask registers, and the four lazy-flags slots.

use memoffset::offset_of;
use vexlift_types::{IrType, V512};

use crate::cc_op::CcOp;
use crate::error::GuestStateError;
use crate::gpr::Gpr;
use crate::state::GuestState;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Amd64GuestState {
    pub rax: u64,
    pub rcx: u64,
    pub rdx: u64,
    pub rbx: u64,
    pub rsp: u64,
    pub rbp: u64,
    pub rsi: u64,
    pub rdi: u64,
    pub r8: u64,
    pub r9: u64,
    pub r10: u64,
    pub r11: u64,
    pub r12: u64,
    pub r13: u64,
    pub r14: u64,
    pub r15: u64,
    pub rip: u64,
    pub cs: u16,
    pub ss: u16,
    pub ds: u16,
    pub es: u16,
    pub fs: u16,
    pub gs: u16,
    pub fs_base: u64,
    pub gs_base: u64,
    /// Backs XMM0-31 (low 16 bytes), YMM0-31 (low 32 bytes), and ZMM0-31
    /// (full 64 bytes) as aliases at the same base offset, differing only in
    /// the `IrType` the caller requests.
    pub zmm: [V512; 32],
    pub k: [u64; 8],
    pub cc_op: u32,
    pub cc_dep1: u64,
    pub cc_dep2: u64,
    pub cc_ndep: u64,
}

impl Default for Amd64GuestState {
    fn default() -> Self {
        Self {
            rax: 0,
            rcx: 0,
            rdx: 0,
            rbx: 0,
            rsp: 0,
            rbp: 0,
            rsi: 0,
            rdi: 0,
            r8: 0,
            r9: 0,
            r10: 0,
            r11: 0,
            r12: 0,
            r13: 0,
            r14: 0,
            r15: 0,
            rip: 0,
            cs: 0,
            ss: 0,
            ds: 0,
            es: 0,
            fs: 0,
            gs: 0,
            fs_base: 0,
            gs_base: 0,
            zmm: [V512::zero(); 32],
            k: [0; 8],
            cc_op: CcOp::Copy.code(),
            cc_dep1: 0,
            cc_dep2: 0,
            cc_ndep: 0,
        }
    }
}

impl Amd64GuestState {
    pub fn new() -> Self {
        Self::default()
    }

    pub const RSP_OFFSET: u32 = offset_of!(Amd64GuestState, rsp) as u32;

    fn vector_offset(name: &str) -> Option<u32> {
        for prefix in ["ZMM", "YMM", "XMM"] {
            if let Some(idx) = name.strip_prefix(prefix) {
                let i: usize = idx.parse().ok()?;
                if i < 32 {
                    return Some((offset_of!(Amd64GuestState, zmm) + i * 64) as u32);
                }
            }
        }
        None
    }

    fn vector_type(name: &str) -> Option<IrType> {
        if name.starts_with("ZMM") {
            return Some(IrType::V512);
        }
        if name.starts_with("YMM") {
            return Some(IrType::V256);
        }
        if name.starts_with("XMM") {
            return Some(IrType::V128);
        }
        None
    }

    fn mask_offset(name: &str) -> Option<u32> {
        let idx = name.strip_prefix('K')?;
        let i: usize = idx.parse().ok()?;
        if i < 8 {
            Some((offset_of!(Amd64GuestState, k) + i * 8) as u32)
        } else {
            None
        }
    }

    const fn gpr64_offset(gpr: Gpr) -> u32 {
        (match gpr {
            Gpr::Rax => offset_of!(Amd64GuestState, rax),
            Gpr::Rcx => offset_of!(Amd64GuestState, rcx),
            Gpr::Rdx => offset_of!(Amd64GuestState, rdx),
            Gpr::Rbx => offset_of!(Amd64GuestState, rbx),
            Gpr::Rsp => offset_of!(Amd64GuestState, rsp),
            Gpr::Rbp => offset_of!(Amd64GuestState, rbp),
            Gpr::Rsi => offset_of!(Amd64GuestState, rsi),
            Gpr::Rdi => offset_of!(Amd64GuestState, rdi),
            Gpr::R8 => offset_of!(Amd64GuestState, r8),
            Gpr::R9 => offset_of!(Amd64GuestState, r9),
            Gpr::R10 => offset_of!(Amd64GuestState, r10),
            Gpr::R11 => offset_of!(Amd64GuestState, r11),
            Gpr::R12 => offset_of!(Amd64GuestState, r12),
            Gpr::R13 => offset_of!(Amd64GuestState, r13),
            Gpr::R14 => offset_of!(Amd64GuestState, r14),
            Gpr::R15 => offset_of!(Amd64GuestState, r15),
        }) as u32
    }

    /// Sub-64-bit GPR aliases: `AL`/`AX`/`EAX` all overlap `RAX`'s low bytes
    /// (little-endian, so they share byte offset 0), and the four legacy
    /// high-byte names `AH`/`CH`/`DH`/`BH` alias bits 8-15 of `RAX`/`RCX`/
    /// `RDX`/`RBX` — there is no REX-extended equivalent of those four.
    fn sub_register(name: &str) -> Option<(u32, IrType)> {
        let high_byte = match name {
            "AH" => Some(Gpr::Rax),
            "CH" => Some(Gpr::Rcx),
            "DH" => Some(Gpr::Rdx),
            "BH" => Some(Gpr::Rbx),
            _ => None,
        };
        if let Some(g) = high_byte {
            return Some((Self::gpr64_offset(g) + 1, IrType::I8));
        }

        let low_byte = match name {
            "AL" => Some(Gpr::Rax),
            "CL" => Some(Gpr::Rcx),
            "DL" => Some(Gpr::Rdx),
            "BL" => Some(Gpr::Rbx),
            "SPL" => Some(Gpr::Rsp),
            "BPL" => Some(Gpr::Rbp),
            "SIL" => Some(Gpr::Rsi),
            "DIL" => Some(Gpr::Rdi),
            "R8B" => Some(Gpr::R8),
            "R9B" => Some(Gpr::R9),
            "R10B" => Some(Gpr::R10),
            "R11B" => Some(Gpr::R11),
            "R12B" => Some(Gpr::R12),
            "R13B" => Some(Gpr::R13),
            "R14B" => Some(Gpr::R14),
            "R15B" => Some(Gpr::R15),
            _ => None,
        };
        if let Some(g) = low_byte {
            return Some((Self::gpr64_offset(g), IrType::I8));
        }

        let word = match name {
            "AX" => Some(Gpr::Rax),
            "CX" => Some(Gpr::Rcx),
            "DX" => Some(Gpr::Rdx),
            "BX" => Some(Gpr::Rbx),
            "SP" => Some(Gpr::Rsp),
            "BP" => Some(Gpr::Rbp),
            "SI" => Some(Gpr::Rsi),
            "DI" => Some(Gpr::Rdi),
            "R8W" => Some(Gpr::R8),
            "R9W" => Some(Gpr::R9),
            "R10W" => Some(Gpr::R10),
            "R11W" => Some(Gpr::R11),
            "R12W" => Some(Gpr::R12),
            "R13W" => Some(Gpr::R13),
            "R14W" => Some(Gpr::R14),
            "R15W" => Some(Gpr::R15),
            _ => None,
        };
        if let Some(g) = word {
            return Some((Self::gpr64_offset(g), IrType::I16));
        }

        let dword = match name {
            "EAX" => Some(Gpr::Rax),
            "ECX" => Some(Gpr::Rcx),
            "EDX" => Some(Gpr::Rdx),
            "EBX" => Some(Gpr::Rbx),
            "ESP" => Some(Gpr::Rsp),
            "EBP" => Some(Gpr::Rbp),
            "ESI" => Some(Gpr::Rsi),
            "EDI" => Some(Gpr::Rdi),
            "R8D" => Some(Gpr::R8),
            "R9D" => Some(Gpr::R9),
            "R10D" => Some(Gpr::R10),
            "R11D" => Some(Gpr::R11),
            "R12D" => Some(Gpr::R12),
            "R13D" => Some(Gpr::R13),
            "R14D" => Some(Gpr::R14),
            "R15D" => Some(Gpr::R15),
            _ => None,
        };
        dword.map(|g| (Self::gpr64_offset(g), IrType::I32))
    }
}

impl GuestState for Amd64GuestState {
    fn word_type(&self) -> IrType {
        IrType::I64
    }

    fn register_offset(&self, name: &str) -> Result<u32, GuestStateError> {
        let upper = name.to_ascii_uppercase();
        let off = match upper.as_str() {
            "RAX" => offset_of!(Amd64GuestState, rax),
            "RCX" => offset_of!(Amd64GuestState, rcx),
            "RDX" => offset_of!(Amd64GuestState, rdx),
            "RBX" => offset_of!(Amd64GuestState, rbx),
            "RSP" => offset_of!(Amd64GuestState, rsp),
            "RBP" => offset_of!(Amd64GuestState, rbp),
            "RSI" => offset_of!(Amd64GuestState, rsi),
            "RDI" => offset_of!(Amd64GuestState, rdi),
            "R8" => offset_of!(Amd64GuestState, r8),
            "R9" => offset_of!(Amd64GuestState, r9),
            "R10" => offset_of!(Amd64GuestState, r10),
            "R11" => offset_of!(Amd64GuestState, r11),
            "R12" => offset_of!(Amd64GuestState, r12),
            "R13" => offset_of!(Amd64GuestState, r13),
            "R14" => offset_of!(Amd64GuestState, r14),
            "R15" => offset_of!(Amd64GuestState, r15),
            "RIP" => offset_of!(Amd64GuestState, rip),
            "CS" => offset_of!(Amd64GuestState, cs),
            "SS" => offset_of!(Amd64GuestState, ss),
            "DS" => offset_of!(Amd64GuestState, ds),
            "ES" => offset_of!(Amd64GuestState, es),
            "FS" => offset_of!(Amd64GuestState, fs),
            "GS" => offset_of!(Amd64GuestState, gs),
            "FS_BASE" => offset_of!(Amd64GuestState, fs_base),
            "GS_BASE" => offset_of!(Amd64GuestState, gs_base),
            "CC_OP" => offset_of!(Amd64GuestState, cc_op),
            "CC_DEP1" => offset_of!(Amd64GuestState, cc_dep1),
            "CC_DEP2" => offset_of!(Amd64GuestState, cc_dep2),
            "CC_NDEP" => offset_of!(Amd64GuestState, cc_ndep),
            _ => {
                return Self::vector_offset(&upper)
                    .or_else(|| Self::mask_offset(&upper))
                    .or_else(|| Self::sub_register(&upper).map(|(off, _)| off))
                    .ok_or_else(|| GuestStateError::UnknownRegister(name.to_string()))
            }
        };
        Ok(off as u32)
    }

    fn register_type(&self, name: &str) -> Result<IrType, GuestStateError> {
        let upper = name.to_ascii_uppercase();
        Ok(match upper.as_str() {
            "RAX" | "RCX" | "RDX" | "RBX" | "RSP" | "RBP" | "RSI" | "RDI" | "R8" | "R9"
            | "R10" | "R11" | "R12" | "R13" | "R14" | "R15" | "RIP" | "FS_BASE" | "GS_BASE"
            | "CC_DEP1" | "CC_DEP2" | "CC_NDEP" => IrType::I64,
            "CC_OP" => IrType::I32,
            "CS" | "SS" | "DS" | "ES" | "FS" | "GS" => IrType::I16,
            _ => Self::vector_type(&upper)
                .or(if upper.starts_with('K') {
                    Some(IrType::I64)
                } else {
                    None
                })
                .or_else(|| Self::sub_register(&upper).map(|(_, ty)| ty))
                .ok_or_else(|| GuestStateError::UnknownRegister(name.to_string()))?,
        })
    }

    fn requires_precise_memory_exceptions(&self, lo: u32, hi: u32) -> bool {
        let rsp = Self::RSP_OFFSET;
        lo < rsp + 8 && hi > rsp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpr_aliases_share_the_same_64_bit_slot() {
        let gs = Amd64GuestState::new();
        assert_eq!(gs.register_offset("rax").unwrap(), gs.register_offset("RAX").unwrap());
    }

    #[test]
    fn xmm_ymm_zmm_alias_the_same_base_offset() {
        let gs = Amd64GuestState::new();
        let xmm0 = gs.register_offset("XMM0").unwrap();
        let ymm0 = gs.register_offset("YMM0").unwrap();
        let zmm0 = gs.register_offset("ZMM0").unwrap();
        assert_eq!(xmm0, ymm0);
        assert_eq!(ymm0, zmm0);
        assert_eq!(gs.register_type("XMM0").unwrap(), IrType::V128);
        assert_eq!(gs.register_type("YMM0").unwrap(), IrType::V256);
        assert_eq!(gs.register_type("ZMM0").unwrap(), IrType::V512);
    }

    #[test]
    fn al_ax_eax_overlap_the_low_bytes_of_rax() {
        let gs = Amd64GuestState::new();
        let rax = gs.register_offset("RAX").unwrap();
        let al = gs.register_offset("AL").unwrap();
        let ax = gs.register_offset("AX").unwrap();
        let eax = gs.register_offset("EAX").unwrap();
        assert_eq!(al, rax);
        assert_eq!(ax, rax);
        assert_eq!(eax, rax);
        assert_eq!(gs.register_type("AL").unwrap(), IrType::I8);
        assert_eq!(gs.register_type("AX").unwrap(), IrType::I16);
        assert_eq!(gs.register_type("EAX").unwrap(), IrType::I32);
    }

    #[test]
    fn ah_aliases_the_high_byte_of_ax() {
        let gs = Amd64GuestState::new();
        let rax = gs.register_offset("RAX").unwrap();
        let ah = gs.register_offset("AH").unwrap();
        assert_eq!(ah, rax + 1);
        assert_eq!(gs.register_type("AH").unwrap(), IrType::I8);
    }

    #[test]
    fn zmm1_offset_is_one_register_past_zmm0() {
        let gs = Amd64GuestState::new();
        let zmm0 = gs.register_offset("ZMM0").unwrap();
        let zmm1 = gs.register_offset("ZMM1").unwrap();
        assert_eq!(zmm1 - zmm0, 64);
    }

    #[test]
    fn mask_register_out_of_range_is_rejected() {
        let gs = Amd64GuestState::new();
        assert!(gs.register_offset("K8").is_err());
        assert!(gs.register_offset("K0").is_ok());
    }

    #[test]
    fn word_type_is_i64() {
        let gs = Amd64GuestState::new();
        assert_eq!(gs.word_type(), IrType::I64);
        assert_eq!(gs.ip_type(), IrType::I64);
    }
}
