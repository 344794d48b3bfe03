//! The operation catalogue (§4.1): a closed enum of opcodes usable inside
//! `Unop`/`Binop`/`Triop`/`Qop` expressions.
//!
//! Width-parametric integer arithmetic (`Add8`/`Add16`/`Add32`/`Add64`, and
//! likewise `Sub`/`Mul`/`And`/`Or`/`Xor`/`Shl`/`Shr`/`Sar`/`Not`/`CmpEQ`/
//! `CmpNE`) is grouped so that, for a given family, the four width variants
//! are declared consecutively and the width can be recovered by matching on
//! `IrOp::width_index`. A lifter picks the width-correct opcode with
//! [`IrOp::int_binop`]/[`IrOp::int_unop`] rather than doing enum-to-integer
//! arithmetic directly, which would be unsound across an `enum` that is not
//! `repr(u8)`-guaranteed-contiguous by construction.
//!
//! Extensibility contract (§9): adding an instruction never requires
//! touching this file. Adding a *new operation* means adding a variant here
//! and a matching arm in [`IrOp::arity`], [`IrOp::is_comparison`],
//! [`IrOp::is_floating_point`] and [`IrOp::result_type`] — the sanity
//! checker and pretty printer dispatch generically over the enum and need
//! no changes.

use vexlift_types::IrType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum IrOp {
    // -- width-parametric integer arithmetic -------------------------------
    Add8,
    Add16,
    Add32,
    Add64,
    Sub8,
    Sub16,
    Sub32,
    Sub64,
    Mul8,
    Mul16,
    Mul32,
    Mul64,
    And8,
    And16,
    And32,
    And64,
    Or8,
    Or16,
    Or32,
    Or64,
    Xor8,
    Xor16,
    Xor32,
    Xor64,
    Shl8,
    Shl16,
    Shl32,
    Shl64,
    Shr8,
    Shr16,
    Shr32,
    Shr64,
    Sar8,
    Sar16,
    Sar32,
    Sar64,
    Not8,
    Not16,
    Not32,
    Not64,
    CmpEQ8,
    CmpEQ16,
    CmpEQ32,
    CmpEQ64,
    CmpNE8,
    CmpNE16,
    CmpNE32,
    CmpNE64,

    // -- signed/unsigned ordering comparisons ------------------------------
    CmpLT32S,
    CmpLT32U,
    CmpLT64S,
    CmpLT64U,
    CmpLE32S,
    CmpLE32U,
    CmpLE64S,
    CmpLE64U,

    /// PPC-style 3-way ordered compare, result is a small flag bitmask in I32.
    CmpORD32S,
    CmpORD32U,
    CmpORD64S,
    CmpORD64U,

    // -- widening / narrowing conversions -----------------------------------
    Widen8Uto16,
    Widen8Sto16,
    Widen8Uto32,
    Widen8Sto32,
    Widen8Uto64,
    Widen8Sto64,
    Widen16Uto32,
    Widen16Sto32,
    Widen16Uto64,
    Widen16Sto64,
    Widen32Uto64,
    Widen32Sto64,
    Narrow16to8,
    Narrow32to8,
    Narrow32to16,
    Narrow64to8,
    Narrow64to16,
    Narrow64to32,

    /// Concatenate two I64 halves into an I128 (hi, lo).
    HLto128,
    /// Split an I128 into its high I64 half.
    HiHalfOf128,
    /// Split an I128 into its low I64 half.
    LoHalfOf128,

    // -- widening multiplies/divides ---------------------------------------
    MullU8,
    MullS8,
    MullU16,
    MullS16,
    MullU32,
    MullS32,
    MullU64,
    MullS64,
    DivModU64to32,
    DivModS64to32,
    DivModU128to64,
    DivModS128to64,

    // -- floating point -------------------------------------------------------
    AddF32,
    AddF64,
    SubF32,
    SubF64,
    MulF32,
    MulF64,
    DivF32,
    DivF64,
    /// Ordered compare, result is an I32 condition code (VEX-style `CmpF64`).
    CmpF32,
    CmpF64,
    NegF32,
    NegF64,
    AbsF32,
    AbsF64,
    F32toF64,
    F64toF32,
    I32StoF64,
    I64StoF64,
    F64toI32S,
    F64toI64S,
    /// Reinterpret bit patterns, used for the F32-bits/F64-bits constant kinds.
    ReinterpF32asI32,
    ReinterpI32asF32,
    ReinterpF64asI64,
    ReinterpI64asF64,

    /// Rounded fused multiply-add: `(rm, a, b, c) -> a*b+c`, a Qop.
    MAddF64,
    MSubF64,
    /// Rounded triops: `(rm, a, b) -> a op b`.
    AddF64r,
    SubF64r,
    MulF64r,
    DivF64r,

    // -- vector (MMX/SSE/AVX) -------------------------------------------------
    Add8x16,
    Add16x8,
    Add32x4,
    Add64x2,
    Sub8x16,
    Sub16x8,
    Sub32x4,
    Sub64x2,
    AndV128,
    OrV128,
    XorV128,
    NotV128,
    CmpEQ8x16,
    CmpEQ16x8,
    CmpEQ32x4,
    Add32x8,
    Sub32x8,
    AndV256,
    OrV256,
    XorV256,
    /// Construct a V256 from two V128 halves (hi, lo).
    V128HLtoV256,

    // -- memcheck-style definedness helpers -----------------------------------
    /// Non-zero test over a guest word, result is all-1s/all-0s of the same width.
    CmpwNEZ32,
    CmpwNEZ64,
}

impl IrOp {
    /// Number of operands this operator expects (1/2/3/4).
    pub const fn arity(self) -> u8 {
        use IrOp::*;
        match self {
            Not8 | Not16 | Not32 | Not64 | Widen8Uto16 | Widen8Sto16 | Widen8Uto32
            | Widen8Sto32 | Widen8Uto64 | Widen8Sto64 | Widen16Uto32 | Widen16Sto32
            | Widen16Uto64 | Widen16Sto64 | Widen32Uto64 | Widen32Sto64 | Narrow16to8
            | Narrow32to8 | Narrow32to16 | Narrow64to8 | Narrow64to16 | Narrow64to32
            | HiHalfOf128 | LoHalfOf128 | NegF32 | NegF64 | AbsF32 | AbsF64 | F32toF64
            | F64toF32 | I32StoF64 | I64StoF64 | F64toI32S | F64toI64S | ReinterpF32asI32
            | ReinterpI32asF32 | ReinterpF64asI64 | ReinterpI64asF64 | NotV128 | CmpwNEZ32
            | CmpwNEZ64 => 1,

            AddF64r | SubF64r | MulF64r | DivF64r => 3,

            MAddF64 | MSubF64 => 4,

            _ => 2,
        }
    }

    pub const fn is_comparison(self) -> bool {
        use IrOp::*;
        matches!(
            self,
            CmpEQ8 | CmpEQ16
                | CmpEQ32
                | CmpEQ64
                | CmpNE8
                | CmpNE16
                | CmpNE32
                | CmpNE64
                | CmpLT32S
                | CmpLT32U
                | CmpLT64S
                | CmpLT64U
                | CmpLE32S
                | CmpLE32U
                | CmpLE64S
                | CmpLE64U
                | CmpORD32S
                | CmpORD32U
                | CmpORD64S
                | CmpORD64U
                | CmpF32
                | CmpF64
                | CmpEQ8x16
                | CmpEQ16x8
                | CmpEQ32x4
        )
    }

    pub const fn is_floating_point(self) -> bool {
        use IrOp::*;
        matches!(
            self,
            AddF32
                | AddF64
                | SubF32
                | SubF64
                | MulF32
                | MulF64
                | DivF32
                | DivF64
                | CmpF32
                | CmpF64
                | NegF32
                | NegF64
                | AbsF32
                | AbsF64
                | F32toF64
                | F64toF32
                | I32StoF64
                | I64StoF64
                | F64toI32S
                | F64toI64S
                | MAddF64
                | MSubF64
                | AddF64r
                | SubF64r
                | MulF64r
                | DivF64r
        )
    }

    /// Result type of the operator. For comparisons the result is always `I1`;
    /// width-parametric ops return the family's own width.
    pub const fn result_type(self) -> IrType {
        use IrOp::*;
        match self {
            Add8 | Sub8 | Mul8 | And8 | Or8 | Xor8 | Shl8 | Shr8 | Sar8 | Not8 => IrType::I8,
            Add16 | Sub16 | Mul16 | And16 | Or16 | Xor16 | Shl16 | Shr16 | Sar16 | Not16 => {
                IrType::I16
            }
            Add32 | Sub32 | Mul32 | And32 | Or32 | Xor32 | Shl32 | Shr32 | Sar32 | Not32 => {
                IrType::I32
            }
            Add64 | Sub64 | Mul64 | And64 | Or64 | Xor64 | Shl64 | Shr64 | Sar64 | Not64 => {
                IrType::I64
            }

            CmpEQ8 | CmpEQ16 | CmpEQ32 | CmpEQ64 | CmpNE8 | CmpNE16 | CmpNE32 | CmpNE64
            | CmpLT32S | CmpLT32U | CmpLT64S | CmpLT64U | CmpLE32S | CmpLE32U | CmpLE64S
            | CmpLE64U => IrType::I1,

            CmpORD32S | CmpORD32U | CmpORD64S | CmpORD64U => IrType::I32,

            Widen8Uto16 | Widen8Sto16 => IrType::I16,
            Widen8Uto32 | Widen8Sto32 | Widen16Uto32 | Widen16Sto32 => IrType::I32,
            Widen8Uto64 | Widen8Sto64 | Widen16Uto64 | Widen16Sto64 | Widen32Uto64
            | Widen32Sto64 => IrType::I64,
            Narrow16to8 | Narrow32to8 | Narrow64to8 => IrType::I8,
            Narrow32to16 | Narrow64to16 => IrType::I16,
            Narrow64to32 => IrType::I32,

            HLto128 => IrType::I128,
            HiHalfOf128 | LoHalfOf128 => IrType::I64,

            MullU8 | MullS8 => IrType::I16,
            MullU16 | MullS16 => IrType::I32,
            MullU32 | MullS32 => IrType::I64,
            MullU64 | MullS64 => IrType::I128,
            DivModU64to32 | DivModS64to32 => IrType::I64,
            DivModU128to64 | DivModS128to64 => IrType::I128,

            AddF32 | SubF32 | MulF32 | DivF32 | NegF32 | AbsF32 => IrType::F32,
            AddF64 | SubF64 | MulF64 | DivF64 | NegF64 | AbsF64 | AddF64r | SubF64r | MulF64r
            | DivF64r | MAddF64 | MSubF64 => IrType::F64,
            CmpF32 | CmpF64 => IrType::I32,
            F32toF64 => IrType::F64,
            F64toF32 => IrType::F32,
            I32StoF64 | I64StoF64 => IrType::F64,
            F64toI32S => IrType::I32,
            F64toI64S => IrType::I64,
            ReinterpF32asI32 => IrType::I32,
            ReinterpI32asF32 => IrType::F32,
            ReinterpF64asI64 => IrType::I64,
            ReinterpI64asF64 => IrType::F64,

            Add8x16 | Sub8x16 | Add16x8 | Sub16x8 | Add32x4 | Sub32x4 | Add64x2 | Sub64x2
            | AndV128 | OrV128 | XorV128 | NotV128 | CmpEQ8x16 | CmpEQ16x8 | CmpEQ32x4 => {
                IrType::V128
            }
            Add32x8 | Sub32x8 | AndV256 | OrV256 | XorV256 | V128HLtoV256 => IrType::V256,

            CmpwNEZ32 => IrType::I32,
            CmpwNEZ64 => IrType::I64,
        }
    }

    /// Pick the width-correct binary arithmetic/bitwise/shift/comparison op
    /// for a guest integer type, e.g. `int_binop(IntBinKind::Add, IrType::I32)
    /// == Add32`.
    pub const fn int_binop(kind: IntBinKind, width: IrType) -> Option<IrOp> {
        use IntBinKind::*;
        use IrOp::*;
        Some(match (kind, width) {
            (Add, IrType::I8) => Add8,
            (Add, IrType::I16) => Add16,
            (Add, IrType::I32) => Add32,
            (Add, IrType::I64) => Add64,
            (Sub, IrType::I8) => Sub8,
            (Sub, IrType::I16) => Sub16,
            (Sub, IrType::I32) => Sub32,
            (Sub, IrType::I64) => Sub64,
            (Mul, IrType::I8) => Mul8,
            (Mul, IrType::I16) => Mul16,
            (Mul, IrType::I32) => Mul32,
            (Mul, IrType::I64) => Mul64,
            (And, IrType::I8) => And8,
            (And, IrType::I16) => And16,
            (And, IrType::I32) => And32,
            (And, IrType::I64) => And64,
            (Or, IrType::I8) => Or8,
            (Or, IrType::I16) => Or16,
            (Or, IrType::I32) => Or32,
            (Or, IrType::I64) => Or64,
            (Xor, IrType::I8) => Xor8,
            (Xor, IrType::I16) => Xor16,
            (Xor, IrType::I32) => Xor32,
            (Xor, IrType::I64) => Xor64,
            (Shl, IrType::I8) => Shl8,
            (Shl, IrType::I16) => Shl16,
            (Shl, IrType::I32) => Shl32,
            (Shl, IrType::I64) => Shl64,
            (Shr, IrType::I8) => Shr8,
            (Shr, IrType::I16) => Shr16,
            (Shr, IrType::I32) => Shr32,
            (Shr, IrType::I64) => Shr64,
            (Sar, IrType::I8) => Sar8,
            (Sar, IrType::I16) => Sar16,
            (Sar, IrType::I32) => Sar32,
            (Sar, IrType::I64) => Sar64,
            (CmpEQ, IrType::I8) => CmpEQ8,
            (CmpEQ, IrType::I16) => CmpEQ16,
            (CmpEQ, IrType::I32) => CmpEQ32,
            (CmpEQ, IrType::I64) => CmpEQ64,
            (CmpNE, IrType::I8) => CmpNE8,
            (CmpNE, IrType::I16) => CmpNE16,
            (CmpNE, IrType::I32) => CmpNE32,
            (CmpNE, IrType::I64) => CmpNE64,
            _ => return None,
        })
    }

    pub const fn int_unop_not(width: IrType) -> Option<IrOp> {
        Some(match width {
            IrType::I8 => IrOp::Not8,
            IrType::I16 => IrOp::Not16,
            IrType::I32 => IrOp::Not32,
            IrType::I64 => IrOp::Not64,
            _ => return None,
        })
    }
}

/// The family of a width-parametric integer binary operator, used by
/// [`IrOp::int_binop`] to select the width-correct variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntBinKind {
    Add,
    Sub,
    Mul,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    Sar,
    CmpEQ,
    CmpNE,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_family_selection_picks_correct_variant() {
        assert_eq!(IrOp::int_binop(IntBinKind::Add, IrType::I32), Some(IrOp::Add32));
        assert_eq!(IrOp::int_binop(IntBinKind::Sub, IrType::I64), Some(IrOp::Sub64));
        assert_eq!(IrOp::int_binop(IntBinKind::Add, IrType::F32), None);
    }

    #[test]
    fn arity_matches_declared_shape() {
        assert_eq!(IrOp::Add32.arity(), 2);
        assert_eq!(IrOp::Not32.arity(), 1);
        assert_eq!(IrOp::AddF64r.arity(), 3);
        assert_eq!(IrOp::MAddF64.arity(), 4);
    }

    #[test]
    fn comparisons_report_i1_result_except_ord_and_float() {
        assert!(IrOp::CmpEQ32.is_comparison());
        assert_eq!(IrOp::CmpEQ32.result_type(), IrType::I1);
        assert_eq!(IrOp::CmpORD32S.result_type(), IrType::I32);
        assert_eq!(IrOp::CmpF64.result_type(), IrType::I32);
    }

    #[test]
    fn mixed_width_multiply_widens() {
        assert_eq!(IrOp::MullS8.result_type(), IrType::I16);
        assert_eq!(IrOp::MullU32.result_type(), IrType::I64);
        assert_eq!(IrOp::MullS64.result_type(), IrType::I128);
    }
}
