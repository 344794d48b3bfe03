//! ARM guest state, defined only at the interface level (§1 Non-goals): the
//! register table, `SP`/`LR`/`PC` aliasing, and the D/S VFP aliasing scheme
//! are modelled; no ARM decoder or lifter exists in this workspace.

use memoffset::offset_of;
use vexlift_types::IrType;

use crate::error::GuestStateError;
use crate::state::GuestState;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArmGuestState {
    /// `r[13]` is `SP`, `r[14]` is `LR`, `r[15]` is `PC` with the Thumb bit
    /// packed into bit 0 — see [`ArmGuestState::set_pc`]/[`get_pc`]/
    /// [`is_thumb`].
    pub r: [u32; 16],
    pub cpsr: u32,
    /// VFP double registers; `S_(2i)`/`S_(2i+1)` alias `D_i`'s low/high
    /// 4 bytes respectively.
    pub d: [u64; 32],
}

impl Default for ArmGuestState {
    fn default() -> Self {
        Self {
            r: [0; 16],
            cpsr: 0,
            d: [0; 32],
        }
    }
}

impl ArmGuestState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_pc(&mut self, addr: u32, thumb: bool) {
        self.r[15] = addr | thumb as u32;
    }

    pub fn get_pc(&self) -> u32 {
        self.r[15] & !1
    }

    pub fn is_thumb(&self) -> bool {
        (self.r[15] & 1) != 0
    }

    fn gpr_offset(i: usize) -> u32 {
        (offset_of!(ArmGuestState, r) + i * 4) as u32
    }

    fn d_offset(i: usize) -> u32 {
        (offset_of!(ArmGuestState, d) + i * 8) as u32
    }

    /// `S_(2i)` is `D_i`'s low 4 bytes, `S_(2i+1)` is its high 4 bytes.
    fn s_offset(i: usize) -> u32 {
        Self::d_offset(i / 2) + (i % 2) as u32 * 4
    }
}

impl GuestState for ArmGuestState {
    fn word_type(&self) -> IrType {
        IrType::I32
    }

    fn register_offset(&self, name: &str) -> Result<u32, GuestStateError> {
        let upper = name.to_ascii_uppercase();
        match upper.as_str() {
            "SP" => return Ok(Self::gpr_offset(13)),
            "LR" => return Ok(Self::gpr_offset(14)),
            "PC" => return Ok(Self::gpr_offset(15)),
            "CPSR" => return Ok(offset_of!(ArmGuestState, cpsr) as u32),
            _ => {}
        }
        if let Some(idx) = upper.strip_prefix('R') {
            if let Ok(i) = idx.parse::<usize>() {
                if i < 16 {
                    return Ok(Self::gpr_offset(i));
                }
            }
        }
        if let Some(idx) = upper.strip_prefix('D') {
            if let Ok(i) = idx.parse::<usize>() {
                if i < 32 {
                    return Ok(Self::d_offset(i));
                }
            }
        }
        if let Some(idx) = upper.strip_prefix('S') {
            if let Ok(i) = idx.parse::<usize>() {
                if i < 64 {
                    return Ok(Self::s_offset(i));
                }
            }
        }
        Err(GuestStateError::UnknownRegister(name.to_string()))
    }

    fn register_type(&self, name: &str) -> Result<IrType, GuestStateError> {
        let upper = name.to_ascii_uppercase();
        match upper.as_str() {
            "SP" | "LR" | "PC" | "CPSR" => return Ok(IrType::I32),
            _ => {}
        }
        if upper.starts_with('R') && upper[1..].parse::<usize>().map(|i| i < 16).unwrap_or(false) {
            return Ok(IrType::I32);
        }
        if upper.starts_with('D') && upper[1..].parse::<usize>().map(|i| i < 32).unwrap_or(false) {
            return Ok(IrType::F64);
        }
        if upper.starts_with('S') && upper[1..].parse::<usize>().map(|i| i < 64).unwrap_or(false) {
            return Ok(IrType::F32);
        }
        Err(GuestStateError::UnknownRegister(name.to_string()))
    }

    fn requires_precise_memory_exceptions(&self, lo: u32, hi: u32) -> bool {
        let sp = Self::gpr_offset(13);
        lo < sp + 4 && hi > sp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sp_lr_pc_alias_r13_r14_r15() {
        let gs = ArmGuestState::new();
        assert_eq!(gs.register_offset("SP").unwrap(), gs.register_offset("R13").unwrap());
        assert_eq!(gs.register_offset("LR").unwrap(), gs.register_offset("R14").unwrap());
        assert_eq!(gs.register_offset("PC").unwrap(), gs.register_offset("R15").unwrap());
    }

    #[test]
    fn pc_packs_and_unpacks_the_thumb_bit() {
        let mut gs = ArmGuestState::new();
        gs.set_pc(0x8000, true);
        assert_eq!(gs.get_pc(), 0x8000);
        assert!(gs.is_thumb());

        gs.set_pc(0x8000, false);
        assert_eq!(gs.get_pc(), 0x8000);
        assert!(!gs.is_thumb());
    }

    #[test]
    fn s_registers_alias_the_correct_half_of_their_d_register() {
        let gs = ArmGuestState::new();
        let d0 = gs.register_offset("D0").unwrap();
        let s0 = gs.register_offset("S0").unwrap();
        let s1 = gs.register_offset("S1").unwrap();
        assert_eq!(s0, d0);
        assert_eq!(s1, d0 + 4);
        assert_eq!(gs.register_type("S0").unwrap(), IrType::F32);
        assert_eq!(gs.register_type("D0").unwrap(), IrType::F64);
    }
}
