//! `IRStmt` (§3, §4.2): the side-effecting statement algebra.

use std::fmt;
use vexlift_types::{Endness, IrType};

use crate::atoms::{CallTarget, DirtyMemFx, JumpKind, MemoryBusEvent, RegArray};
use crate::constant::IrConst;
use crate::error::IrError;
use crate::expr::IrExpr;
use crate::temp::{IrTemp, IrTypeEnv};

/// Sub-word-to-I32 widening convention for a guarded load (`LoadG`), mirroring
/// VEX's `IRLoadGOp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadGConv {
    Identity32,
    Identity64,
    Widen8Uto32,
    Widen8Sto32,
    Widen16Uto32,
    Widen16Sto32,
}

impl LoadGConv {
    pub const fn result_type(self) -> IrType {
        match self {
            LoadGConv::Identity64 => IrType::I64,
            _ => IrType::I32,
        }
    }
}

impl fmt::Display for LoadGConv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LoadGConv::Identity32 => "Ident32",
            LoadGConv::Identity64 => "Ident64",
            LoadGConv::Widen8Uto32 => "8Uto32",
            LoadGConv::Widen8Sto32 => "8Sto32",
            LoadGConv::Widen16Uto32 => "16Uto32",
            LoadGConv::Widen16Sto32 => "16Sto32",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum IrStmt {
    /// Removable filler; never emitted for a real effect.
    NoOp,
    /// Marks the start of a guest instruction's lowering.
    IMark { addr: u64, len: u32, delta: i32 },
    /// Declares an address range undefined between two points in the instruction stream.
    AbiHint {
        base: IrExpr,
        len: u32,
        nia: IrExpr,
    },
    Put { offset: u32, data: IrExpr },
    PutI {
        array: RegArray,
        ix: IrExpr,
        bias: i32,
        data: IrExpr,
    },
    WrTmp { temp: IrTemp, data: IrExpr },
    Store {
        endness: Endness,
        addr: IrExpr,
        data: IrExpr,
    },
    /// Guarded load: on a false guard, `dst` is written `alt` instead of the load result.
    LoadG {
        endness: Endness,
        conv: LoadGConv,
        dst: IrTemp,
        addr: IrExpr,
        alt: IrExpr,
        guard: IrExpr,
    },
    /// Guarded store: a no-op when `guard` is false.
    StoreG {
        endness: Endness,
        addr: IrExpr,
        data: IrExpr,
        guard: IrExpr,
    },
    /// Single- or double-wide atomic compare-and-swap.
    Cas {
        old_hi: Option<IrTemp>,
        old_lo: IrTemp,
        endness: Endness,
        addr: IrExpr,
        expd_hi: Option<IrExpr>,
        expd_lo: IrExpr,
        data_hi: Option<IrExpr>,
        data_lo: IrExpr,
    },
    /// Load-linked (`store_data` absent) or store-conditional (`store_data` present).
    Llsc {
        endness: Endness,
        result: IrTemp,
        addr: IrExpr,
        /// The type a load at `addr` would produce; used by the sanity
        /// checker to validate `result`'s declared type for the LL case.
        load_type: IrType,
        store_data: Option<IrExpr>,
    },
    /// A helper call permitted to have side effects and touch guest state.
    Dirty {
        target: CallTarget,
        guard: Option<IrExpr>,
        args: Vec<IrExpr>,
        result_temp: Option<IrTemp>,
        mem_fx: DirtyMemFx,
    },
    /// A fence or reservation-cancel.
    Mbe(MemoryBusEvent),
    /// Conditional mid-block exit; does not terminate the enclosing block by itself.
    Exit {
        guard: IrExpr,
        jump_kind: JumpKind,
        dst: IrConst,
        ip_offset: u32,
    },
}

impl IrStmt {
    pub fn no_op() -> Self {
        IrStmt::NoOp
    }

    pub fn imark(addr: u64, len: u32, delta: i32) -> Self {
        IrStmt::IMark { addr, len, delta }
    }

    pub fn mbe(event: MemoryBusEvent) -> Self {
        IrStmt::Mbe(event)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn dirty(
        target: CallTarget,
        guard: Option<IrExpr>,
        args: Vec<IrExpr>,
        result_temp: Option<IrTemp>,
        mem_fx: DirtyMemFx,
    ) -> Result<Self, IrError> {
        if let Some(t) = result_temp {
            if !t.is_valid() {
                return Err(IrError::InvalidOperand("Dirty: result_temp must be valid"));
            }
        }
        Ok(IrStmt::Dirty {
            target,
            guard,
            args,
            result_temp,
            mem_fx,
        })
    }

    pub fn wr_tmp(temp: IrTemp, data: IrExpr) -> Result<Self, IrError> {
        if !temp.is_valid() {
            return Err(IrError::InvalidOperand("WrTmp: temp must be valid"));
        }
        Ok(IrStmt::WrTmp { temp, data })
    }

    pub fn put(offset: u32, data: IrExpr) -> Self {
        IrStmt::Put { offset, data }
    }

    pub fn store(endness: Endness, addr: IrExpr, data: IrExpr) -> Self {
        IrStmt::Store { endness, addr, data }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn cas(
        old_hi: Option<IrTemp>,
        old_lo: IrTemp,
        endness: Endness,
        addr: IrExpr,
        expd_hi: Option<IrExpr>,
        expd_lo: IrExpr,
        data_hi: Option<IrExpr>,
        data_lo: IrExpr,
    ) -> Result<Self, IrError> {
        let hi_present = [old_hi.is_some(), expd_hi.is_some(), data_hi.is_some()];
        if hi_present.iter().any(|&x| x) && !hi_present.iter().all(|&x| x) {
            return Err(IrError::MalformedAtomic(
                "CAS: old_hi/expd_hi/data_hi must all be present or all absent",
            ));
        }
        Ok(IrStmt::Cas {
            old_hi,
            old_lo,
            endness,
            addr,
            expd_hi,
            expd_lo,
            data_hi,
            data_lo,
        })
    }

    pub fn llsc(
        endness: Endness,
        result: IrTemp,
        addr: IrExpr,
        load_type: IrType,
        store_data: Option<IrExpr>,
    ) -> Result<Self, IrError> {
        if !result.is_valid() {
            return Err(IrError::InvalidOperand("LLSC: result temp must be valid"));
        }
        Ok(IrStmt::Llsc {
            endness,
            result,
            addr,
            load_type,
            store_data,
        })
    }

    pub fn exit(guard: IrExpr, jump_kind: JumpKind, dst: IrConst, ip_offset: u32) -> Self {
        IrStmt::Exit {
            guard,
            jump_kind,
            dst,
            ip_offset,
        }
    }

    /// Every temp this statement *reads* (not the temp it may define).
    pub fn referenced_temps(&self, out: &mut Vec<IrTemp>) {
        use IrStmt::*;
        match self {
            NoOp | IMark { .. } | Mbe(_) => {}
            AbiHint { base, nia, .. } => {
                base.referenced_temps(out);
                nia.referenced_temps(out);
            }
            Put { data, .. } => data.referenced_temps(out),
            PutI { ix, data, .. } => {
                ix.referenced_temps(out);
                data.referenced_temps(out);
            }
            WrTmp { data, .. } => data.referenced_temps(out),
            Store { addr, data, .. } => {
                addr.referenced_temps(out);
                data.referenced_temps(out);
            }
            LoadG {
                addr, alt, guard, ..
            } => {
                addr.referenced_temps(out);
                alt.referenced_temps(out);
                guard.referenced_temps(out);
            }
            StoreG {
                addr, data, guard, ..
            } => {
                addr.referenced_temps(out);
                data.referenced_temps(out);
                guard.referenced_temps(out);
            }
            Cas {
                addr,
                expd_hi,
                expd_lo,
                data_hi,
                data_lo,
                ..
            } => {
                addr.referenced_temps(out);
                if let Some(e) = expd_hi {
                    e.referenced_temps(out);
                }
                expd_lo.referenced_temps(out);
                if let Some(d) = data_hi {
                    d.referenced_temps(out);
                }
                data_lo.referenced_temps(out);
            }
            Llsc {
                addr, store_data, ..
            } => {
                addr.referenced_temps(out);
                if let Some(d) = store_data {
                    d.referenced_temps(out);
                }
            }
            Dirty { guard, args, .. } => {
                if let Some(g) = guard {
                    g.referenced_temps(out);
                }
                for a in args {
                    a.referenced_temps(out);
                }
            }
            Exit { guard, .. } => guard.referenced_temps(out),
        }
    }

    /// The temp this statement defines, if any (`WrTmp`, `LoadG`, `Cas`,
    /// `Llsc`, or a result-bearing `Dirty`).
    pub fn defined_temps(&self) -> Vec<IrTemp> {
        use IrStmt::*;
        match self {
            WrTmp { temp, .. } => vec![*temp],
            LoadG { dst, .. } => vec![*dst],
            Cas { old_hi, old_lo, .. } => {
                let mut v = vec![*old_lo];
                if let Some(h) = old_hi {
                    v.push(*h);
                }
                v
            }
            Llsc { result, .. } => vec![*result],
            Dirty {
                result_temp: Some(t),
                ..
            } => vec![*t],
            _ => vec![],
        }
    }

    pub fn type_of(&self, env: &IrTypeEnv) -> Result<IrType, crate::error::TypeError> {
        match self {
            IrStmt::WrTmp { data, .. } => data.type_of(env),
            _ => Ok(IrType::Invalid),
        }
    }
}

impl fmt::Display for IrStmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrStmt::NoOp => write!(f, "IR-NoOp"),
            IrStmt::IMark { addr, len, delta } => {
                write!(f, "------ IMark(0x{addr:x}, {len}, {delta}) ------")
            }
            IrStmt::AbiHint { base, len, nia } => {
                write!(f, "====== AbiHint({base}, {len}, {nia}) ======")
            }
            IrStmt::Put { offset, data } => write!(f, "PUT({offset}) = {data}"),
            IrStmt::PutI {
                array,
                ix,
                bias,
                data,
            } => write!(f, "PUTI({array})[{ix},{bias}] = {data}"),
            IrStmt::WrTmp { temp, data } => write!(f, "{temp} = {data}"),
            IrStmt::Store {
                endness,
                addr,
                data,
            } => write!(f, "ST{}({addr}) = {data}", endness.tag()),
            IrStmt::LoadG {
                endness,
                conv,
                dst,
                addr,
                alt,
                guard,
            } => write!(
                f,
                "{dst} = if ({guard}) {conv}(LD{}({addr})) else {alt}",
                endness.tag()
            ),
            IrStmt::StoreG {
                endness,
                addr,
                data,
                guard,
            } => write!(f, "if ({guard}) ST{}({addr}) = {data}", endness.tag()),
            IrStmt::Cas {
                old_hi,
                old_lo,
                endness,
                addr,
                expd_hi,
                expd_lo,
                data_hi,
                data_lo,
            } => {
                if let (Some(old_hi), Some(expd_hi), Some(data_hi)) = (old_hi, expd_hi, data_hi) {
                    write!(
                        f,
                        "{old_lo}:{old_hi} = CAS{}({addr} :: {expd_lo},{expd_hi} -> {data_lo},{data_hi})",
                        endness.tag()
                    )
                } else {
                    write!(
                        f,
                        "{old_lo} = CAS{}({addr} :: {expd_lo} -> {data_lo})",
                        endness.tag()
                    )
                }
            }
            IrStmt::Llsc {
                endness,
                result,
                addr,
                store_data,
                ..
            } => match store_data {
                None => write!(f, "{result} = LD{}-Linked({addr})", endness.tag()),
                Some(d) => write!(f, "{result} = ( ST{}-Cond({addr}) = {d} )", endness.tag()),
            },
            IrStmt::Dirty {
                target,
                guard,
                args,
                result_temp,
                mem_fx,
            } => {
                let g = guard
                    .as_ref()
                    .map(|g| g.to_string())
                    .unwrap_or_else(|| "always".to_string());
                let dst = result_temp
                    .map(|t| t.to_string())
                    .unwrap_or_else(|| "_".to_string());
                write!(f, "{dst} = DIRTY {g} {mem_fx:?} ::: {target}(")?;
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{a}")?;
                }
                write!(f, ")")
            }
            IrStmt::Mbe(ev) => write!(f, "{ev}"),
            IrStmt::Exit {
                guard,
                jump_kind,
                dst,
                ..
            } => write!(f, "if ({guard}) goto {{{jump_kind}}} {dst}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::IrOp;

    #[test]
    fn cas_rejects_asymmetric_hi_lo() {
        let t0 = IrTemp::new(0);
        let err = IrStmt::cas(
            Some(t0),
            t0,
            Endness::Little,
            IrExpr::Const(IrConst::I64(0)),
            None,
            IrExpr::Const(IrConst::I64(0)),
            None,
            IrExpr::Const(IrConst::I64(0)),
        )
        .unwrap_err();
        assert_eq!(
            err,
            IrError::MalformedAtomic(
                "CAS: old_hi/expd_hi/data_hi must all be present or all absent"
            )
        );
    }

    #[test]
    fn cas_accepts_fully_symmetric_double_wide() {
        let t0 = IrTemp::new(0);
        let t1 = IrTemp::new(1);
        let result = IrStmt::cas(
            Some(t1),
            t0,
            Endness::Little,
            IrExpr::Const(IrConst::I64(0)),
            Some(IrExpr::Const(IrConst::I64(1))),
            IrExpr::Const(IrConst::I64(2)),
            Some(IrExpr::Const(IrConst::I64(3))),
            IrExpr::Const(IrConst::I64(4)),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn wr_tmp_type_of_matches_rhs_expr() {
        let env = IrTypeEnv::new();
        let t0 = IrTemp::new(0);
        let stmt = IrStmt::wr_tmp(
            t0,
            IrExpr::binop(
                IrOp::Add32,
                IrExpr::Const(IrConst::I32(1)),
                IrExpr::Const(IrConst::I32(2)),
            )
            .unwrap(),
        )
        .unwrap();
        assert_eq!(stmt.type_of(&env).unwrap(), IrType::I32);
    }

    #[test]
    fn display_matches_pretty_print_grammar_for_put() {
        let stmt = IrStmt::put(0, IrExpr::Const(IrConst::I32(42)));
        assert_eq!(stmt.to_string(), "PUT(0) = 0x0000002A:I32");
    }

    #[test]
    fn display_matches_pretty_print_grammar_for_imark() {
        let stmt = IrStmt::IMark {
            addr: 0x1000,
            len: 5,
            delta: 0,
        };
        assert_eq!(stmt.to_string(), "------ IMark(0x1000, 5, 0) ------");
    }
}
