//! End-to-end lifting scenarios: real encoded byte sequences through
//! `Lifter::lift_basic_block`, asserted against the resulting `IrSb`.

use vexlift_guest::Amd64GuestState;
use vexlift_ir::{IrExpr, IrStmt, JumpKind};
use vexlift_x86::{LiftConfig, Lifter};

fn lifter() -> Lifter<Amd64GuestState> {
    Lifter::new(Amd64GuestState::new())
}

fn imark_count(sb: &vexlift_x86::IrSb) -> usize {
    sb.iter().filter(|s| matches!(s, IrStmt::IMark { .. })).count()
}

#[test]
fn nop_falls_through_to_the_next_address() {
    let sb = lifter().lift_basic_block(&[0x90], 0x1000).unwrap();
    assert_eq!(imark_count(&sb), 1);
    assert_eq!(sb.jump_kind(), JumpKind::Boring);
    assert_eq!(*sb.next(), IrExpr::const_(vexlift_ir::IrConst::I64(0x1001)));
}

#[test]
fn ret_pops_the_stack_and_terminates_with_ret_kind() {
    let sb = lifter().lift_basic_block(&[0xC3], 0x1000).unwrap();
    assert_eq!(sb.jump_kind(), JumpKind::Ret);
    // Popping RSP means reading it before the Put that bumps it: the load's
    // address must come from the old RSP, not from a statement that already
    // rewrote it.
    let put_count = sb
        .iter()
        .filter(|s| matches!(s, IrStmt::Put { .. }))
        .count();
    assert_eq!(put_count, 1, "RET only updates RSP, the return address becomes `next`");
}

#[test]
fn int3_terminates_with_sigtrap_and_falls_through() {
    let sb = lifter().lift_basic_block(&[0xCC], 0x2000).unwrap();
    assert_eq!(sb.jump_kind(), JumpKind::SigTrap);
    assert_eq!(*sb.next(), IrExpr::const_(vexlift_ir::IrConst::I64(0x2001)));
}

#[test]
fn push_then_pop_round_trips_through_a_temp_without_reloading_the_stale_register() {
    // PUSH RBX; POP RBX.
    let sb = lifter().lift_basic_block(&[0x53, 0x5B], 0x1000).unwrap();
    assert_eq!(imark_count(&sb), 2);
    // RSP is adjusted down by PUSH and back up by POP: two `Put`s to RSP,
    // plus the POP's `Put` to RBX itself.
    let rsp_puts = sb
        .iter()
        .filter(|s| matches!(s, IrStmt::Put { offset, .. } if *offset == vexlift_guest::Amd64GuestState::RSP_OFFSET))
        .count();
    assert_eq!(rsp_puts, 2);
    // The POP's value must come from a `WrTmp`-captured load, not a second
    // `Load` issued after RSP was already bumped back up.
    let loads = sb.iter().filter(|s| matches!(s, IrStmt::WrTmp { data, .. } if matches!(data, IrExpr::Load { .. }))).count();
    assert_eq!(loads, 1);
}

#[test]
fn add_writes_the_sum_and_the_cc_thunk() {
    // ADD EAX, EBX.
    let sb = lifter().lift_basic_block(&[0x01, 0xD8], 0x1000).unwrap();
    assert_eq!(imark_count(&sb), 1);
    // CC_OP/CC_DEP1/CC_DEP2/CC_NDEP plus EAX: five Put statements.
    let puts = sb.iter().filter(|s| matches!(s, IrStmt::Put { .. })).count();
    assert_eq!(puts, 5);
}

#[test]
fn jcc_with_default_config_is_a_block_terminator() {
    // JE +4 relative to the next instruction.
    let sb = lifter().lift_basic_block(&[0x74, 0x04], 0x1000).unwrap();
    assert_eq!(imark_count(&sb), 1);
    assert!(sb.iter().any(|s| matches!(s, IrStmt::Exit { .. })));
    assert_eq!(sb.jump_kind(), JumpKind::Boring);
    assert_eq!(*sb.next(), IrExpr::const_(vexlift_ir::IrConst::I64(0x1002)));
}

#[test]
fn jcc_can_be_configured_to_keep_lifting_past_the_branch() {
    // JE +4, then NOP.
    let cfg = LiftConfig::default().with_jcc_is_terminator(false);
    let sb = Lifter::with_config(Amd64GuestState::new(), cfg)
        .lift_basic_block(&[0x74, 0x04, 0x90], 0x1000)
        .unwrap();
    assert_eq!(imark_count(&sb), 2);
    assert!(sb.iter().any(|s| matches!(s, IrStmt::Exit { .. })));
}

#[test]
fn call_pushes_the_return_address_and_terminates_with_call_kind() {
    // CALL rel32 = +0 (target is the next instruction itself).
    let sb = lifter()
        .lift_basic_block(&[0xE8, 0x00, 0x00, 0x00, 0x00], 0x1000)
        .unwrap();
    assert_eq!(sb.jump_kind(), JumpKind::Call);
    assert_eq!(*sb.next(), IrExpr::const_(vexlift_ir::IrConst::I64(0x1005)));
}

#[test]
fn an_empty_block_yields_no_instructions_and_falls_through_immediately() {
    let sb = lifter().lift_basic_block(&[], 0x1000).unwrap();
    assert_eq!(imark_count(&sb), 0);
    assert_eq!(sb.jump_kind(), JumpKind::Boring);
    assert_eq!(*sb.next(), IrExpr::const_(vexlift_ir::IrConst::I64(0x1000)));
}

#[test]
fn max_instructions_truncates_a_block_of_nops() {
    let cfg = LiftConfig::default().with_max_instructions(3);
    let code = [0x90u8; 10];
    let sb = Lifter::with_config(Amd64GuestState::new(), cfg)
        .lift_basic_block(&code, 0x1000)
        .unwrap();
    assert_eq!(imark_count(&sb), 3);
    assert_eq!(sb.jump_kind(), JumpKind::Boring);
    assert_eq!(*sb.next(), IrExpr::const_(vexlift_ir::IrConst::I64(0x1003)));
}

#[test]
fn require_flatness_rejects_a_block_truncated_mid_stream() {
    let cfg = LiftConfig::default()
        .with_max_instructions(2)
        .with_require_flatness(true);
    let code = [0x90u8; 5];
    let err = Lifter::with_config(Amd64GuestState::new(), cfg)
        .lift_basic_block(&code, 0x1000)
        .unwrap_err();
    match err {
        vexlift_x86::LiftError::LiftFailure { .. } => {}
        other => panic!("expected a LiftFailure from the budget/flatness check, got {other:?}"),
    }
}

#[test]
fn require_flatness_accepts_a_block_that_ends_on_a_real_terminator() {
    let cfg = LiftConfig::default().with_require_flatness(true);
    let sb = Lifter::with_config(Amd64GuestState::new(), cfg)
        .lift_basic_block(&[0x90, 0xC3], 0x1000)
        .unwrap();
    assert_eq!(imark_count(&sb), 2);
    assert_eq!(sb.jump_kind(), JumpKind::Ret);
}

#[test]
fn an_undecodable_opcode_stops_the_block_rather_than_erroring() {
    // 0x0F 0xFF is not a recognised two-byte opcode in this decoder.
    let sb = lifter().lift_basic_block(&[0x90, 0x0F, 0xFF], 0x1000).unwrap();
    assert_eq!(imark_count(&sb), 1);
    assert_eq!(sb.jump_kind(), JumpKind::Boring);
    assert_eq!(*sb.next(), IrExpr::const_(vexlift_ir::IrConst::I64(0x1001)));
}
