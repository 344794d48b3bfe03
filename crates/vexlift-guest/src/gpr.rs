//! The general-purpose register encoding order shared by ModR/M's `reg`/`rm`
//! fields and the SIB `base`/`index` fields (§4.5): index 0..7 (plus REX.B/R/X
//! extension to 0..15 in 64-bit mode).

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Gpr {
    Rax = 0,
    Rcx = 1,
    Rdx = 2,
    Rbx = 3,
    Rsp = 4,
    Rbp = 5,
    Rsi = 6,
    Rdi = 7,
    R8 = 8,
    R9 = 9,
    R10 = 10,
    R11 = 11,
    R12 = 12,
    R13 = 13,
    R14 = 14,
    R15 = 15,
}

impl Gpr {
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Decode a 4-bit encoding (`rm`/`reg`/SIB field, already extended by the
    /// relevant REX/VEX bit) into a register identity.
    pub const fn from_encoding(enc: u8) -> Self {
        match enc & 0xF {
            0 => Gpr::Rax,
            1 => Gpr::Rcx,
            2 => Gpr::Rdx,
            3 => Gpr::Rbx,
            4 => Gpr::Rsp,
            5 => Gpr::Rbp,
            6 => Gpr::Rsi,
            7 => Gpr::Rdi,
            8 => Gpr::R8,
            9 => Gpr::R9,
            10 => Gpr::R10,
            11 => Gpr::R11,
            12 => Gpr::R12,
            13 => Gpr::R13,
            14 => Gpr::R14,
            _ => Gpr::R15,
        }
    }

    /// The guest-state register name for this GPR at a given operand width
    /// (8/16/32/64), resolvable via [`crate::state::GuestState::register_offset`].
    pub fn name_at_width(self, width_bits: u32) -> &'static str {
        match (self, width_bits) {
            (Gpr::Rax, 32) => "EAX",
            (Gpr::Rcx, 32) => "ECX",
            (Gpr::Rdx, 32) => "EDX",
            (Gpr::Rbx, 32) => "EBX",
            (Gpr::Rsp, 32) => "ESP",
            (Gpr::Rbp, 32) => "EBP",
            (Gpr::Rsi, 32) => "ESI",
            (Gpr::Rdi, 32) => "EDI",
            (Gpr::Rax, 64) => "RAX",
            (Gpr::Rcx, 64) => "RCX",
            (Gpr::Rdx, 64) => "RDX",
            (Gpr::Rbx, 64) => "RBX",
            (Gpr::Rsp, 64) => "RSP",
            (Gpr::Rbp, 64) => "RBP",
            (Gpr::Rsi, 64) => "RSI",
            (Gpr::Rdi, 64) => "RDI",
            (Gpr::R8, 64) => "R8",
            (Gpr::R9, 64) => "R9",
            (Gpr::R10, 64) => "R10",
            (Gpr::R11, 64) => "R11",
            (Gpr::R12, 64) => "R12",
            (Gpr::R13, 64) => "R13",
            (Gpr::R14, 64) => "R14",
            (Gpr::R15, 64) => "R15",
            _ => unreachable!("no 8/16-bit or extended-register-in-32-bit-mode name table yet"),
        }
    }
}

impl fmt::Display for Gpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name_at_width(64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_round_trips() {
        for i in 0..16u8 {
            assert_eq!(Gpr::from_encoding(i).as_u8(), i);
        }
    }

    #[test]
    fn width_selects_the_right_register_name() {
        assert_eq!(Gpr::Rax.name_at_width(32), "EAX");
        assert_eq!(Gpr::Rax.name_at_width(64), "RAX");
        assert_eq!(Gpr::R8.name_at_width(64), "R8");
    }
}
