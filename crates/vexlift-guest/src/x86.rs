//! 32-bit x86 guest state (§4.4): GPRs, segment selectors, the x87 FP stack,
//! eight XMM registers, and the four lazy-flags slots.

use memoffset::offset_of;
use vexlift_types::{IrType, V128};

use crate::cc_op::CcOp;
use crate::error::GuestStateError;
use crate::state::GuestState;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct X86GuestState {
    pub eax: u32,
    pub ecx: u32,
    pub edx: u32,
    pub ebx: u32,
    pub esp: u32,
    pub ebp: u32,
    pub esi: u32,
    pub edi: u32,
    pub eip: u32,
    pub cs: u16,
    pub ss: u16,
    pub ds: u16,
    pub es: u16,
    pub fs: u16,
    pub gs: u16,
    pub ftop: u32,
    pub fpreg: [u64; 8],
    pub xmm: [V128; 8],
    pub cc_op: u32,
    pub cc_dep1: u32,
    pub cc_dep2: u32,
    pub cc_ndep: u32,
}

impl Default for X86GuestState {
    fn default() -> Self {
        Self {
            eax: 0,
            ecx: 0,
            edx: 0,
            ebx: 0,
            esp: 0,
            ebp: 0,
            esi: 0,
            edi: 0,
            eip: 0,
            cs: 0,
            ss: 0,
            ds: 0,
            es: 0,
            fs: 0,
            gs: 0,
            ftop: 0,
            fpreg: [0; 8],
            xmm: [V128::zero(); 8],
            cc_op: CcOp::Copy.code(),
            cc_dep1: 0,
            cc_dep2: 0,
            cc_ndep: 0,
        }
    }
}

impl X86GuestState {
    pub fn new() -> Self {
        Self::default()
    }

    pub const ESP_OFFSET: u32 = offset_of!(X86GuestState, esp) as u32;

    fn indexed_offset(name: &str) -> Option<u32> {
        if let Some(idx) = name.strip_prefix("FPREG") {
            let i: usize = idx.parse().ok()?;
            if i < 8 {
                return Some((offset_of!(X86GuestState, fpreg) + i * 8) as u32);
            }
        }
        if let Some(idx) = name.strip_prefix("XMM") {
            let i: usize = idx.parse().ok()?;
            if i < 8 {
                return Some((offset_of!(X86GuestState, xmm) + i * 16) as u32);
            }
        }
        None
    }

    fn indexed_type(name: &str) -> Option<IrType> {
        if name.strip_prefix("FPREG").is_some() {
            return Some(IrType::I64);
        }
        if name.strip_prefix("XMM").is_some() {
            return Some(IrType::V128);
        }
        None
    }
}

impl GuestState for X86GuestState {
    fn word_type(&self) -> IrType {
        IrType::I32
    }

    fn register_offset(&self, name: &str) -> Result<u32, GuestStateError> {
        let upper = name.to_ascii_uppercase();
        let off = match upper.as_str() {
            "EAX" => offset_of!(X86GuestState, eax),
            "ECX" => offset_of!(X86GuestState, ecx),
            "EDX" => offset_of!(X86GuestState, edx),
            "EBX" => offset_of!(X86GuestState, ebx),
            "ESP" => offset_of!(X86GuestState, esp),
            "EBP" => offset_of!(X86GuestState, ebp),
            "ESI" => offset_of!(X86GuestState, esi),
            "EDI" => offset_of!(X86GuestState, edi),
            "EIP" => offset_of!(X86GuestState, eip),
            "CS" => offset_of!(X86GuestState, cs),
            "SS" => offset_of!(X86GuestState, ss),
            "DS" => offset_of!(X86GuestState, ds),
            "ES" => offset_of!(X86GuestState, es),
            "FS" => offset_of!(X86GuestState, fs),
            "GS" => offset_of!(X86GuestState, gs),
            "FTOP" => offset_of!(X86GuestState, ftop),
            "CC_OP" => offset_of!(X86GuestState, cc_op),
            "CC_DEP1" => offset_of!(X86GuestState, cc_dep1),
            "CC_DEP2" => offset_of!(X86GuestState, cc_dep2),
            "CC_NDEP" => offset_of!(X86GuestState, cc_ndep),
            _ => {
                return Self::indexed_offset(&upper)
                    .ok_or_else(|| GuestStateError::UnknownRegister(name.to_string()))
            }
        };
        Ok(off as u32)
    }

    fn register_type(&self, name: &str) -> Result<IrType, GuestStateError> {
        let upper = name.to_ascii_uppercase();
        Ok(match upper.as_str() {
            "EAX" | "ECX" | "EDX" | "EBX" | "ESP" | "EBP" | "ESI" | "EDI" | "EIP" | "FTOP"
            | "CC_OP" | "CC_DEP1" | "CC_DEP2" | "CC_NDEP" => IrType::I32,
            "CS" | "SS" | "DS" | "ES" | "FS" | "GS" => IrType::I16,
            _ => Self::indexed_type(&upper)
                .ok_or_else(|| GuestStateError::UnknownRegister(name.to_string()))?,
        })
    }

    fn requires_precise_memory_exceptions(&self, lo: u32, hi: u32) -> bool {
        let esp = Self::ESP_OFFSET;
        lo < esp + 4 && hi > esp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_lookup_is_case_insensitive() {
        let gs = X86GuestState::new();
        let a = gs.register_offset("EAX").unwrap();
        let b = gs.register_offset("eax").unwrap();
        let c = gs.register_offset("Eax").unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn out_of_range_indexed_register_is_rejected() {
        let gs = X86GuestState::new();
        assert!(gs.register_offset("FPREG99").is_err());
        assert!(gs.register_offset("XMM8").is_err());
    }

    #[test]
    fn synthetic_register_name_is_rejected() {
        let gs = X86GuestState::new();
        assert_eq!(
            gs.register_offset("NOTAREG"),
            Err(GuestStateError::UnknownRegister("NOTAREG".to_string()))
        );
    }

    #[test]
    fn xmm_registers_are_v128() {
        let gs = X86GuestState::new();
        assert_eq!(gs.register_type("xmm3").unwrap(), IrType::V128);
        assert_eq!(gs.register_offset("xmm0").unwrap(), gs.register_offset("XMM0").unwrap());
    }

    #[test]
    fn esp_range_requires_precise_memory_exceptions() {
        let gs = X86GuestState::new();
        let esp = X86GuestState::ESP_OFFSET;
        assert!(gs.requires_precise_memory_exceptions(esp, esp + 4));
        assert!(!gs.requires_precise_memory_exceptions(esp + 100, esp + 104));
    }

    #[test]
    fn deep_copy_is_independent() {
        let mut gs = X86GuestState::new();
        gs.eax = 42;
        let copy = gs.deep_copy();
        assert_eq!(copy.eax, 42);
        let mut mutated = gs;
        mutated.eax = 7;
        assert_eq!(copy.eax, 42);
    }
}
