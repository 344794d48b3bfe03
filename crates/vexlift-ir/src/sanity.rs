//! The sanity checker (§4.7): structural invariants on a completed [`IrSb`].

use std::collections::HashSet;

use vexlift_types::IrType;

use crate::error::SanityFailure;
use crate::expr::IrExpr;
use crate::sb::IrSb;
use crate::stmt::IrStmt;
use crate::temp::IrTemp;

/// Validate `sb`'s structural invariants. `where_` is a caller-supplied
/// label folded into any failure for diagnosis (e.g. the guest address the
/// block started at). Returns the *first* violation found.
pub fn sanity_check(
    sb: &IrSb,
    where_: &str,
    require_flatness: bool,
    guest_word_type: IrType,
) -> Result<(), SanityFailure> {
    for (t, ty) in sb.type_env().iter() {
        if !ty.is_valid() {
            return Err(SanityFailure::new(
                where_,
                format!("temp {t} has implausible type {ty}"),
            ));
        }
    }

    let mut defined: HashSet<IrTemp> = HashSet::new();
    for (i, stmt) in sb.iter().enumerate() {
        if require_flatness {
            if let IrStmt::WrTmp { data, .. } = stmt {
                if !data.is_flat() {
                    return Err(SanityFailure::new(
                        where_,
                        format!("statement {i} is not flat: {data}"),
                    ));
                }
            }
        }

        for t in stmt.defined_temps() {
            if !defined.insert(t) {
                return Err(SanityFailure::new(
                    where_,
                    format!("temp {t} written by more than one statement"),
                ));
            }
            if sb.type_of_temp(t).is_err() {
                return Err(SanityFailure::new(
                    where_,
                    format!("temp {t} written but not declared in the type environment"),
                ));
            }
        }

        let mut refs = Vec::new();
        stmt.referenced_temps(&mut refs);
        for t in refs {
            if sb.type_of_temp(t).is_err() {
                return Err(SanityFailure::new(
                    where_,
                    format!("statement {i} reads out-of-range temp {t}"),
                ));
            }
        }

        if let IrStmt::WrTmp { temp, data } = stmt {
            match data.type_of(sb.type_env()) {
                Ok(rhs_ty) => {
                    let declared = sb.type_of_temp(*temp);
                    if let Ok(declared) = declared {
                        if declared != rhs_ty {
                            return Err(SanityFailure::new(
                                where_,
                                format!(
                                    "statement {i}: {temp} declared {declared} but RHS has type {rhs_ty}"
                                ),
                            ));
                        }
                    }
                }
                Err(e) => {
                    return Err(SanityFailure::new(
                        where_,
                        format!("statement {i}: failed to type RHS: {e}"),
                    ))
                }
            }
        }

        if let IrStmt::Llsc {
            result,
            load_type,
            store_data,
            ..
        } = stmt
        {
            let expected = if store_data.is_some() {
                IrType::I1
            } else {
                *load_type
            };
            if let Ok(actual) = sb.type_of_temp(*result) {
                if actual != expected {
                    return Err(SanityFailure::new(
                        where_,
                        format!(
                            "statement {i}: LLSC result {result} declared {actual} but expected {expected}"
                        ),
                    ));
                }
            }
        }

        if let IrStmt::Exit { dst, .. } = stmt {
            if dst.ir_type() != guest_word_type {
                return Err(SanityFailure::new(
                    where_,
                    format!(
                        "statement {i}: Exit.dst has type {} but guest word type is {guest_word_type}",
                        dst.ir_type()
                    ),
                ));
            }
        }
    }

    match sb.next().type_of(sb.type_env()) {
        Ok(ty) if ty == guest_word_type => {}
        Ok(ty) => {
            return Err(SanityFailure::new(
                where_,
                format!("next has type {ty} but guest word type is {guest_word_type}"),
            ))
        }
        Err(e) => {
            return Err(SanityFailure::new(
                where_,
                format!("failed to type `next`: {e}"),
            ))
        }
    }

    // Every `RdTmp` must be defined *before* use, matching the SSA property
    // (§8: "every temp is written at most once... and every RdTmp appears
    // after it").
    let mut written_so_far: HashSet<IrTemp> = HashSet::new();
    for (i, stmt) in sb.iter().enumerate() {
        let mut refs = Vec::new();
        stmt.referenced_temps(&mut refs);
        for t in refs {
            if t.is_valid() && !written_so_far.contains(&t) {
                return Err(SanityFailure::new(
                    where_,
                    format!("statement {i} reads {t} before it is written"),
                ));
            }
        }
        for t in stmt.defined_temps() {
            written_so_far.insert(t);
        }
    }
    check_expr_use_before_def(sb.next(), &written_so_far, where_)?;

    Ok(())
}

fn check_expr_use_before_def(
    expr: &IrExpr,
    written: &HashSet<IrTemp>,
    where_: &str,
) -> Result<(), SanityFailure> {
    let mut refs = Vec::new();
    expr.referenced_temps(&mut refs);
    for t in refs {
        if t.is_valid() && !written.contains(&t) {
            return Err(SanityFailure::new(
                where_,
                format!("`next` reads {t} before it is written"),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::JumpKind;
    use crate::constant::IrConst;
    use crate::op::IrOp;
    use vexlift_types::Endness;

    #[test]
    fn empty_block_with_matching_next_type_passes() {
        let mut sb = IrSb::new(IrType::I32, 0);
        sb.set_next(IrExpr::Const(IrConst::I32(0x1000)));
        sb.set_jump_kind(JumpKind::Boring);
        assert!(sanity_check(&sb, "test", false, IrType::I32).is_ok());
    }

    #[test]
    fn mismatched_next_type_fails() {
        let mut sb = IrSb::new(IrType::I32, 0);
        sb.set_next(IrExpr::Const(IrConst::I64(0x1000)));
        let err = sanity_check(&sb, "test", false, IrType::I32).unwrap_err();
        assert!(err.reason.contains("next has type"));
    }

    #[test]
    fn duplicate_wrtmp_of_same_temp_fails() {
        let mut sb = IrSb::new(IrType::I32, 0);
        let t = sb.new_temp(IrType::I32);
        sb.add_statement(IrStmt::wr_tmp(t, IrExpr::Const(IrConst::I32(1))).unwrap());
        sb.add_statement(IrStmt::wr_tmp(t, IrExpr::Const(IrConst::I32(2))).unwrap());
        sb.set_next(IrExpr::Const(IrConst::I32(0)));
        let err = sanity_check(&sb, "test", false, IrType::I32).unwrap_err();
        assert!(err.reason.contains("more than one statement"));
    }

    #[test]
    fn use_before_def_fails() {
        let mut sb = IrSb::new(IrType::I32, 0);
        let t0 = sb.new_temp(IrType::I32);
        let t1 = sb.new_temp(IrType::I32);
        sb.add_statement(
            IrStmt::wr_tmp(t0, IrExpr::rd_tmp(t1).unwrap()).unwrap(),
        );
        sb.add_statement(IrStmt::wr_tmp(t1, IrExpr::Const(IrConst::I32(1))).unwrap());
        sb.set_next(IrExpr::Const(IrConst::I32(0)));
        let err = sanity_check(&sb, "test", false, IrType::I32).unwrap_err();
        assert!(err.reason.contains("before it is written"));
    }

    #[test]
    fn wrtmp_rhs_type_mismatch_fails() {
        let mut sb = IrSb::new(IrType::I32, 0);
        let t = sb.new_temp(IrType::I64);
        sb.add_statement(IrStmt::wr_tmp(t, IrExpr::Const(IrConst::I32(1))).unwrap());
        sb.set_next(IrExpr::Const(IrConst::I32(0)));
        let err = sanity_check(&sb, "test", false, IrType::I32).unwrap_err();
        assert!(err.reason.contains("declared I64 but RHS has type I32"));
    }

    #[test]
    fn flatness_rejects_nested_expression_on_wrtmp_rhs_when_required() {
        let mut sb = IrSb::new(IrType::I32, 0);
        let t = sb.new_temp(IrType::I32);
        let expr = IrExpr::binop(
            IrOp::Add32,
            IrExpr::Const(IrConst::I32(1)),
            IrExpr::Const(IrConst::I32(2)),
        )
        .unwrap();
        sb.add_statement(IrStmt::wr_tmp(t, expr).unwrap());
        sb.set_next(IrExpr::Const(IrConst::I32(0)));
        assert!(sanity_check(&sb, "test", true, IrType::I32).is_err());
        assert!(sanity_check(&sb, "test", false, IrType::I32).is_ok());
    }

    #[test]
    fn exit_dst_width_must_match_guest_word_type() {
        let mut sb = IrSb::new(IrType::I64, 0);
        sb.add_statement(IrStmt::exit(
            IrExpr::Const(IrConst::I1(true)),
            JumpKind::Boring,
            IrConst::I32(0x1000),
            0,
        ));
        sb.set_next(IrExpr::Const(IrConst::I64(0)));
        let err = sanity_check(&sb, "test", false, IrType::I64).unwrap_err();
        assert!(err.reason.contains("Exit.dst"));
    }

    #[test]
    fn llsc_result_type_must_match_load_type_for_load_linked() {
        let mut sb = IrSb::new(IrType::I64, 0);
        let result = sb.new_temp(IrType::I32);
        sb.add_statement(
            IrStmt::llsc(
                Endness::Little,
                result,
                IrExpr::Const(IrConst::I64(0x2000)),
                IrType::I64,
                None,
            )
            .unwrap(),
        );
        sb.set_next(IrExpr::Const(IrConst::I64(0)));
        let err = sanity_check(&sb, "test", false, IrType::I64).unwrap_err();
        assert!(err.reason.contains("LLSC result"));
    }
}
