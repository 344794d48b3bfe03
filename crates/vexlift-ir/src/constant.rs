//! `IRConst` (§3): a tagged literal value, one of twelve kinds.
//!
//! Equality is "same tag and same payload bits" — floating point payloads
//! are compared by bit pattern, not IEEE-754 equality, so that e.g. two
//! identical NaN-bit-pattern constants compare equal (and `-0.0 != 0.0`,
//! matching VEX's own constant-folding semantics).

use std::fmt;
use vexlift_types::IrType;

#[derive(Debug, Clone, Copy)]
pub enum IrConst {
    I1(bool),
    I8(u8),
    I16(u16),
    I32(u32),
    I64(u64),
    F32(f32),
    /// Raw F32 bit pattern, used when the value was produced by a bitwise
    /// reinterpretation rather than an arithmetic float operation.
    F32i(u32),
    F64(f64),
    /// Raw F64 bit pattern.
    F64i(u64),
    /// 16-bit seed, byte-mask-expanded to fill a 128-bit vector (§9.c).
    V128(u16),
    /// 32-bit seed, byte-mask-expanded to fill a 256-bit vector.
    V256(u32),
    /// 64-bit seed, byte-mask-expanded to fill a 512-bit vector.
    V512(u64),
}

impl IrConst {
    pub const fn ir_type(self) -> IrType {
        match self {
            IrConst::I1(_) => IrType::I1,
            IrConst::I8(_) => IrType::I8,
            IrConst::I16(_) => IrType::I16,
            IrConst::I32(_) => IrType::I32,
            IrConst::I64(_) => IrType::I64,
            IrConst::F32(_) | IrConst::F32i(_) => IrType::F32,
            IrConst::F64(_) | IrConst::F64i(_) => IrType::F64,
            IrConst::V128(_) => IrType::V128,
            IrConst::V256(_) => IrType::V256,
            IrConst::V512(_) => IrType::V512,
        }
    }

    /// Interpret the constant as an unsigned integer, for the convenience of
    /// callers building addresses/offsets from a `Const(IrConst::I*)` node.
    /// Returns `None` for floating-point and vector kinds.
    pub const fn as_u64(self) -> Option<u64> {
        Some(match self {
            IrConst::I1(b) => b as u64,
            IrConst::I8(v) => v as u64,
            IrConst::I16(v) => v as u64,
            IrConst::I32(v) => v as u64,
            IrConst::I64(v) => v,
            _ => return None,
        })
    }

    fn bit_key(self) -> (u8, u64) {
        match self {
            IrConst::I1(b) => (0, b as u64),
            IrConst::I8(v) => (1, v as u64),
            IrConst::I16(v) => (2, v as u64),
            IrConst::I32(v) => (3, v as u64),
            IrConst::I64(v) => (4, v),
            IrConst::F32(v) => (5, v.to_bits() as u64),
            IrConst::F32i(v) => (6, v as u64),
            IrConst::F64(v) => (7, v.to_bits()),
            IrConst::F64i(v) => (8, v),
            IrConst::V128(v) => (9, v as u64),
            IrConst::V256(v) => (10, v as u64),
            IrConst::V512(v) => (11, v),
        }
    }
}

impl PartialEq for IrConst {
    fn eq(&self, other: &Self) -> bool {
        self.bit_key() == other.bit_key()
    }
}

impl Eq for IrConst {}

impl std::hash::Hash for IrConst {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.bit_key().hash(state);
    }
}

impl fmt::Display for IrConst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            IrConst::I1(b) => write!(f, "0x{}:I1", b as u8),
            IrConst::I8(v) => write!(f, "0x{:02X}:I8", v),
            IrConst::I16(v) => write!(f, "0x{:04X}:I16", v),
            IrConst::I32(v) => write!(f, "0x{:08X}:I32", v),
            IrConst::I64(v) => write!(f, "0x{:016X}:I64", v),
            IrConst::F32(v) => write!(f, "F32({:?})", v),
            IrConst::F32i(v) => write!(f, "F32i(0x{:08X})", v),
            IrConst::F64(v) => write!(f, "F64({:?})", v),
            IrConst::F64i(v) => write!(f, "F64i(0x{:016X})", v),
            IrConst::V128(seed) => write!(f, "V128(0x{:04X})", seed),
            IrConst::V256(seed) => write!(f, "V256(0x{:08X})", seed),
            IrConst::V512(seed) => write!(f, "V512(0x{:016X})", seed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_compares_bit_patterns_not_ieee_equality() {
        let nan_a = IrConst::F64(f64::from_bits(0x7ff8000000000001));
        let nan_b = IrConst::F64(f64::from_bits(0x7ff8000000000001));
        assert_eq!(nan_a, nan_b);

        let zero = IrConst::F64(0.0);
        let neg_zero = IrConst::F64(-0.0);
        assert_ne!(zero, neg_zero, "bit patterns of 0.0 and -0.0 differ");
    }

    #[test]
    fn display_matches_pretty_print_grammar() {
        assert_eq!(IrConst::I32(0x2A).to_string(), "0x0000002A:I32");
        assert_eq!(IrConst::I1(false).to_string(), "0x0:I1");
        assert_eq!(IrConst::I1(true).to_string(), "0x1:I1");
        assert_eq!(IrConst::V128(0x1234).to_string(), "V128(0x1234)");
    }

    #[test]
    fn ir_type_mapping_is_exhaustive_over_twelve_kinds() {
        let kinds = [
            IrConst::I1(true).ir_type(),
            IrConst::I8(0).ir_type(),
            IrConst::I16(0).ir_type(),
            IrConst::I32(0).ir_type(),
            IrConst::I64(0).ir_type(),
            IrConst::F32(0.0).ir_type(),
            IrConst::F32i(0).ir_type(),
            IrConst::F64(0.0).ir_type(),
            IrConst::F64i(0).ir_type(),
            IrConst::V128(0).ir_type(),
            IrConst::V256(0).ir_type(),
            IrConst::V512(0).ir_type(),
        ];
        assert_eq!(kinds.len(), 12);
    }
}
