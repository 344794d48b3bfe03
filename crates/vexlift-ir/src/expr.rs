//! `IRExpr` (§3, §4.2): the side-effect-free expression algebra.

use std::fmt;
use vexlift_types::{Endness, IrType};

use crate::atoms::{CallTarget, RegArray};
use crate::constant::IrConst;
use crate::error::IrError;
use crate::op::IrOp;
use crate::temp::{IrTemp, IrTypeEnv};

#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum IrExpr {
    /// Read a guest register at a fixed byte offset.
    Get { offset: u32, ty: IrType },
    /// Circularly-indexed guest register read: index = (ix + bias) mod n.
    GetI {
        array: RegArray,
        ix: Box<IrExpr>,
        bias: i32,
    },
    /// Read an SSA temp.
    RdTmp(IrTemp),
    /// Pure (possibly speculative) memory read.
    Load {
        endness: Endness,
        ty: IrType,
        addr: Box<IrExpr>,
    },
    Const(IrConst),
    Unop { op: IrOp, arg: Box<IrExpr> },
    Binop { op: IrOp, args: Box<(IrExpr, IrExpr)> },
    Triop {
        op: IrOp,
        args: Box<(IrExpr, IrExpr, IrExpr)>,
    },
    Qop {
        op: IrOp,
        args: Box<(IrExpr, IrExpr, IrExpr, IrExpr)>,
    },
    /// `cond ? then_expr : else_expr`; `then_expr` and `else_expr` must share a type.
    Ite {
        cond: Box<IrExpr>,
        then_expr: Box<IrExpr>,
        else_expr: Box<IrExpr>,
    },
    /// A pure helper call. The target must be idempotent and side-effect-free.
    CCall {
        target: CallTarget,
        ret_type: IrType,
        args: Vec<IrExpr>,
    },
    /// Pattern-matching placeholder; never emitted by a lifter, only used by
    /// instruction-selection tooling that pattern-matches over IR trees.
    Binder(i32),
    /// Usable only inside a `Dirty`'s argument list: stands for the return
    /// temp's storage.
    VecRet,
    /// Usable only inside a `Dirty`'s argument list: stands for a pointer to
    /// guest state.
    GsPtr,
}

impl IrExpr {
    pub fn get(offset: u32, ty: IrType) -> Result<Self, IrError> {
        if !ty.is_valid() {
            return Err(IrError::InvalidOperand("Get: type must not be Invalid"));
        }
        Ok(IrExpr::Get { offset, ty })
    }

    pub fn get_i(array: RegArray, ix: IrExpr, bias: i32) -> Result<Self, IrError> {
        Ok(IrExpr::GetI {
            array,
            ix: Box::new(ix),
            bias,
        })
    }

    pub fn rd_tmp(t: IrTemp) -> Result<Self, IrError> {
        if !t.is_valid() {
            return Err(IrError::InvalidOperand("RdTmp: temp must be valid"));
        }
        Ok(IrExpr::RdTmp(t))
    }

    pub fn load(endness: Endness, ty: IrType, addr: IrExpr) -> Result<Self, IrError> {
        if !ty.is_valid() {
            return Err(IrError::InvalidOperand("Load: type must not be Invalid"));
        }
        Ok(IrExpr::Load {
            endness,
            ty,
            addr: Box::new(addr),
        })
    }

    pub fn const_(c: IrConst) -> Self {
        IrExpr::Const(c)
    }

    pub fn unop(op: IrOp, arg: IrExpr) -> Result<Self, IrError> {
        check_arity(op, 1)?;
        Ok(IrExpr::Unop {
            op,
            arg: Box::new(arg),
        })
    }

    pub fn binop(op: IrOp, a: IrExpr, b: IrExpr) -> Result<Self, IrError> {
        check_arity(op, 2)?;
        Ok(IrExpr::Binop {
            op,
            args: Box::new((a, b)),
        })
    }

    pub fn triop(op: IrOp, a: IrExpr, b: IrExpr, c: IrExpr) -> Result<Self, IrError> {
        check_arity(op, 3)?;
        Ok(IrExpr::Triop {
            op,
            args: Box::new((a, b, c)),
        })
    }

    pub fn qop(op: IrOp, a: IrExpr, b: IrExpr, c: IrExpr, d: IrExpr) -> Result<Self, IrError> {
        check_arity(op, 4)?;
        Ok(IrExpr::Qop {
            op,
            args: Box::new((a, b, c, d)),
        })
    }

    pub fn ite(cond: IrExpr, then_expr: IrExpr, else_expr: IrExpr) -> Result<Self, IrError> {
        Ok(IrExpr::Ite {
            cond: Box::new(cond),
            then_expr: Box::new(then_expr),
            else_expr: Box::new(else_expr),
        })
    }

    pub fn ccall(target: CallTarget, ret_type: IrType, args: Vec<IrExpr>) -> Result<Self, IrError> {
        if !ret_type.is_valid() {
            return Err(IrError::InvalidOperand("CCall: return type must not be Invalid"));
        }
        Ok(IrExpr::CCall {
            target,
            ret_type,
            args,
        })
    }

    /// Derive this expression's type, recursively. Mirrors §4.7's "type of
    /// any expression" requirement used by the sanity checker.
    pub fn type_of(&self, env: &IrTypeEnv) -> Result<IrType, crate::error::TypeError> {
        use IrExpr::*;
        Ok(match self {
            Get { ty, .. } => *ty,
            GetI { array, .. } => array.elem_type,
            RdTmp(t) => env.get_type(*t)?,
            Load { ty, .. } => *ty,
            Const(c) => c.ir_type(),
            Unop { op, .. } => op.result_type(),
            Binop { op, .. } => op.result_type(),
            Triop { op, .. } => op.result_type(),
            Qop { op, .. } => op.result_type(),
            Ite {
                then_expr,
                else_expr,
                ..
            } => {
                let t_ty = then_expr.type_of(env)?;
                let e_ty = else_expr.type_of(env)?;
                if t_ty != e_ty {
                    return Err(crate::error::TypeMismatch {
                        expected: t_ty,
                        actual: e_ty,
                    }
                    .into());
                }
                t_ty
            }
            CCall { ret_type, .. } => *ret_type,
            Binder(_) | VecRet | GsPtr => IrType::Invalid,
        })
    }

    /// Recursively collect every `RdTmp` referenced by this expression.
    pub fn referenced_temps(&self, out: &mut Vec<IrTemp>) {
        use IrExpr::*;
        match self {
            Get { .. } | Const(_) | Binder(_) | VecRet | GsPtr => {}
            GetI { ix, .. } => ix.referenced_temps(out),
            RdTmp(t) => out.push(*t),
            Load { addr, .. } => addr.referenced_temps(out),
            Unop { arg, .. } => arg.referenced_temps(out),
            Binop { args, .. } => {
                args.0.referenced_temps(out);
                args.1.referenced_temps(out);
            }
            Triop { args, .. } => {
                args.0.referenced_temps(out);
                args.1.referenced_temps(out);
                args.2.referenced_temps(out);
            }
            Qop { args, .. } => {
                args.0.referenced_temps(out);
                args.1.referenced_temps(out);
                args.2.referenced_temps(out);
                args.3.referenced_temps(out);
            }
            Ite {
                cond,
                then_expr,
                else_expr,
            } => {
                cond.referenced_temps(out);
                then_expr.referenced_temps(out);
                else_expr.referenced_temps(out);
            }
            CCall { args, .. } => {
                for a in args {
                    a.referenced_temps(out);
                }
            }
        }
    }

    /// Structurally flat iff this expression is `Const`/`RdTmp`/`Get` — the
    /// shapes §4.7 allows on the RHS of a `WrTmp` when `require_flatness` is
    /// set.
    pub fn is_flat(&self) -> bool {
        matches!(self, IrExpr::Const(_) | IrExpr::RdTmp(_) | IrExpr::Get { .. })
    }
}

fn check_arity(op: IrOp, expected: u8) -> Result<(), IrError> {
    let actual = op.arity();
    if actual != expected {
        return Err(IrError::OpArityMismatch {
            op,
            expected,
            actual,
        });
    }
    Ok(())
}

impl fmt::Display for IrExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrExpr::Get { offset, ty } => write!(f, "GET:{ty}({offset})"),
            IrExpr::GetI { array, ix, bias } => write!(f, "GETI({array})[{ix},{bias}]"),
            IrExpr::RdTmp(t) => write!(f, "{t}"),
            IrExpr::Load { endness, ty, addr } => {
                write!(f, "LD{}:{ty}({addr})", endness.tag())
            }
            IrExpr::Const(c) => write!(f, "{c}"),
            IrExpr::Unop { op, arg } => write!(f, "{op:?}({arg})"),
            IrExpr::Binop { op, args } => write!(f, "{:?}({},{})", op, args.0, args.1),
            IrExpr::Triop { op, args } => {
                write!(f, "{:?}({},{},{})", op, args.0, args.1, args.2)
            }
            IrExpr::Qop { op, args } => {
                write!(f, "{:?}({},{},{},{})", op, args.0, args.1, args.2, args.3)
            }
            IrExpr::Ite {
                cond,
                then_expr,
                else_expr,
            } => write!(f, "ITE({cond},{then_expr},{else_expr})"),
            IrExpr::CCall {
                target,
                ret_type,
                args,
            } => {
                write!(f, "{target}(")?;
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{a}")?;
                }
                write!(f, "):{ret_type}")
            }
            IrExpr::Binder(n) => write!(f, "BIND-{n}"),
            IrExpr::VecRet => write!(f, "VECRET"),
            IrExpr::GsPtr => write!(f, "GSPTR"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TypeError;

    #[test]
    fn binop_rejects_wrong_arity_op() {
        let err = IrExpr::binop(IrOp::Not32, IrExpr::Const(IrConst::I32(1)), IrExpr::Const(IrConst::I32(2)))
            .unwrap_err();
        assert_eq!(
            err,
            IrError::OpArityMismatch {
                op: IrOp::Not32,
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn ite_branch_type_mismatch_is_rejected_by_type_of() {
        let env = IrTypeEnv::new();
        let e = IrExpr::ite(
            IrExpr::Const(IrConst::I1(true)),
            IrExpr::Const(IrConst::I32(1)),
            IrExpr::Const(IrConst::I64(1)),
        )
        .unwrap();
        let err = e.type_of(&env).unwrap_err();
        assert!(matches!(err, TypeError::Mismatch(_)));
    }

    #[test]
    fn get_type_of_matches_declared_type() {
        let env = IrTypeEnv::new();
        let e = IrExpr::get(0, IrType::I32).unwrap();
        assert_eq!(e.type_of(&env).unwrap(), IrType::I32);
    }

    #[test]
    fn rd_tmp_type_of_resolves_through_env() {
        let mut env = IrTypeEnv::new();
        let t = env.new_temp(IrType::I64);
        let e = IrExpr::rd_tmp(t).unwrap();
        assert_eq!(e.type_of(&env).unwrap(), IrType::I64);
    }

    #[test]
    fn binop_type_of_matches_op_result_type() {
        let env = IrTypeEnv::new();
        let e = IrExpr::binop(
            IrOp::Add32,
            IrExpr::Const(IrConst::I32(1)),
            IrExpr::Const(IrConst::I32(2)),
        )
        .unwrap();
        assert_eq!(e.type_of(&env).unwrap(), IrType::I32);
    }

    #[test]
    fn display_matches_pretty_print_grammar() {
        let e = IrExpr::get(12, IrType::I32).unwrap();
        assert_eq!(e.to_string(), "GET:I32(12)");
    }

    #[test]
    fn referenced_temps_collects_all_rdtmp_leaves() {
        let mut env = IrTypeEnv::new();
        let t0 = env.new_temp(IrType::I32);
        let t1 = env.new_temp(IrType::I32);
        let e = IrExpr::binop(IrOp::Add32, IrExpr::rd_tmp(t0).unwrap(), IrExpr::rd_tmp(t1).unwrap())
            .unwrap();
        let mut temps = Vec::new();
        e.referenced_temps(&mut temps);
        assert_eq!(temps, vec![t0, t1]);
    }
}
