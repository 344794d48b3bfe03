use vexlift_guest::Gpr;

use crate::mode::Segment;

/// A memory operand's addressing components (§4.5 step 5): base, index,
/// scale, displacement, and segment override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemoryOperand {
    pub base: Option<Gpr>,
    pub index: Option<Gpr>,
    pub scale: u8,
    pub disp: i64,
    pub segment: Option<Segment>,
    pub rip_relative: bool,
}

/// One decoded operand. Vector/mask operands are kept distinct from plain
/// GPR operands so the lifter can dispatch to the SIMD emitters without
/// re-deriving register class from a bare width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operand {
    None,
    Register {
        gpr: Gpr,
        width_bits: u32,
        /// True for the legacy 8-bit "high byte" encodings (`AH`/`CH`/`DH`/
        /// `BH`, register indices 4-7 with no REX prefix present). Always
        /// false outside `width_bits == 8`.
        high_byte: bool,
    },
    /// XMM/YMM/ZMM, indexed by the same 0-31 encoding; `width_bits`
    /// disambiguates which alias (128/256/512) is addressed.
    Vector {
        index: u8,
        width_bits: u32,
    },
    /// An MMX register (`MM0`-`MM7`).
    Mmx {
        index: u8,
    },
    Mask {
        index: u8,
    },
    Memory(MemoryOperand),
    Immediate(i64),
    /// A `rel8`/`rel32` displacement already resolved to an absolute target
    /// address by the decoder (base + instruction length + displacement).
    RelativeTarget(u64),
}

impl Default for Operand {
    fn default() -> Self {
        Operand::None
    }
}

/// Fixed capacity avoids a heap allocation per decoded instruction; no x86
/// instruction needs more than 4 explicit operands.
pub const MAX_OPERANDS: usize = 4;
