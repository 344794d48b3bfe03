use vexlift_ir::{sanity_check, IrConst, IrExpr, IrOp, IrSb, IrStmt, JumpKind};
use vexlift_types::IrType;

#[test]
fn hand_assembled_block_passes_sanity_check() {
    let mut sb = IrSb::new(IrType::I32, 0);
    sb.add_statement(IrStmt::IMark {
        addr: 0x1000,
        len: 5,
        delta: 0,
    });

    let eax_off = 0;
    let t0 = sb.new_temp(IrType::I32);
    sb.add_statement(IrStmt::wr_tmp(t0, IrExpr::Const(IrConst::I32(42))).unwrap());
    sb.add_statement(IrStmt::put(eax_off, IrExpr::rd_tmp(t0).unwrap()));
    sb.set_next(IrExpr::Const(IrConst::I32(0x1005)));
    sb.set_jump_kind(JumpKind::Boring);

    assert!(sanity_check(&sb, "mov_eax_42", false, IrType::I32).is_ok());
    assert_eq!(sb.statements().len(), 3);
}

#[test]
fn deep_copy_round_trips_through_sanity_check() {
    let mut sb = IrSb::new(IrType::I64, 0);
    let t0 = sb.new_temp(IrType::I32);
    let t1 = sb.new_temp(IrType::I32);
    sb.add_statement(IrStmt::wr_tmp(t0, IrExpr::Const(IrConst::I32(1))).unwrap());
    sb.add_statement(IrStmt::wr_tmp(t1, IrExpr::rd_tmp(t0).unwrap()).unwrap());
    sb.set_next(IrExpr::Const(IrConst::I64(0x2000)));

    let copy = sb.deep_copy();
    assert_eq!(sb, copy);
    assert!(sanity_check(&copy, "copy", false, IrType::I64).is_ok());
}

#[test]
fn arithmetic_block_with_cc_slots_passes_non_flat_check() {
    let mut sb = IrSb::new(IrType::I32, 0);
    let eax_off = 0;
    let ebx_off = 4;
    let cc_op_off = 200;
    let cc_dep1_off = 204;
    let cc_dep2_off = 208;
    let cc_ndep_off = 212;

    let result = sb.new_temp(IrType::I32);
    let sum = IrExpr::binop(
        IrOp::Add32,
        IrExpr::get(eax_off, IrType::I32).unwrap(),
        IrExpr::get(ebx_off, IrType::I32).unwrap(),
    )
    .unwrap();
    sb.add_statement(IrStmt::wr_tmp(result, sum).unwrap());
    sb.add_statement(IrStmt::put(eax_off, IrExpr::rd_tmp(result).unwrap()));
    sb.add_statement(IrStmt::put(cc_op_off, IrExpr::Const(IrConst::I32(1))));
    sb.add_statement(IrStmt::put(
        cc_dep1_off,
        IrExpr::get(eax_off, IrType::I32).unwrap(),
    ));
    sb.add_statement(IrStmt::put(
        cc_dep2_off,
        IrExpr::get(ebx_off, IrType::I32).unwrap(),
    ));
    sb.add_statement(IrStmt::put(cc_ndep_off, IrExpr::rd_tmp(result).unwrap()));
    sb.set_next(IrExpr::Const(IrConst::I32(0x1002)));

    assert!(sanity_check(&sb, "add_eax_ebx", false, IrType::I32).is_ok());
    assert_eq!(sb.statements().len(), 6);
}
