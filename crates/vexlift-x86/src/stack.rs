//! PUSH/POP (§4.6): shared by the direct mnemonics and by CALL/RET in
//! [`crate::control`].

use vexlift_decoder::Instruction;
use vexlift_ir::{IntBinKind, IrExpr, IrOp, IrSb, IrStmt};
use vexlift_types::{Endness, IrType};

use crate::error::LiftError;
use crate::lifter::{Lifter, X86Guest};
use crate::registers;

fn stack_pointer_name<G: X86Guest>(lifter: &Lifter<G>) -> &'static str {
    if lifter.word_type() == IrType::I64 {
        "RSP"
    } else {
        "ESP"
    }
}

fn word_op(kind: IntBinKind, lifter_word: IrType, at: u64) -> Result<IrOp, LiftError> {
    IrOp::int_binop(kind, lifter_word).ok_or(LiftError::LiftFailure {
        address: at,
        reason: "no integer binop at the guest's word width",
    })
}

/// Push `value` (already the guest's word width) onto the stack: adjusts
/// SP first, building the new-SP expression once and reusing it for both
/// the `Put` and the store address, rather than re-deriving it from a
/// temp that would need its own snapshot.
pub(crate) fn push_word<G: X86Guest>(
    lifter: &Lifter<G>,
    sb: &mut IrSb,
    value: IrExpr,
    at: u64,
) -> Result<(), LiftError> {
    let sp_name = stack_pointer_name(lifter);
    let sp = lifter.reg_get(sp_name)?;
    let word_bytes = lifter.word_bits() / 8;
    let sub = word_op(IntBinKind::Sub, lifter.word_type(), at)?;
    let new_sp = IrExpr::binop(sub, sp, IrExpr::const_(lifter.const_word(word_bytes as u64)))?;
    let new_sp_t = lifter.snapshot(sb, lifter.word_type(), new_sp)?;
    sb.add_statement(lifter.reg_put_stmt(sp_name, lifter.rd(new_sp_t)?)?);
    sb.add_statement(IrStmt::store(Endness::Little, lifter.rd(new_sp_t)?, value));
    Ok(())
}

/// Pop a word off the stack, returning its value and advancing SP. Same
/// rule: the old SP is read once into a temp so the load address and the
/// arithmetic that bumps SP both see the pre-pop value.
pub(crate) fn pop_word<G: X86Guest>(
    lifter: &Lifter<G>,
    sb: &mut IrSb,
    at: u64,
) -> Result<IrExpr, LiftError> {
    let sp_name = stack_pointer_name(lifter);
    let sp_t = lifter.snapshot(sb, lifter.word_type(), lifter.reg_get(sp_name)?)?;
    let value = IrExpr::load(Endness::Little, lifter.word_type(), lifter.rd(sp_t)?)?;
    let value_t = lifter.snapshot(sb, lifter.word_type(), value)?;

    let word_bytes = lifter.word_bits() / 8;
    let add = word_op(IntBinKind::Add, lifter.word_type(), at)?;
    let new_sp = IrExpr::binop(add, lifter.rd(sp_t)?, IrExpr::const_(lifter.const_word(word_bytes as u64)))?;
    sb.add_statement(lifter.reg_put_stmt(sp_name, new_sp)?);

    lifter.rd(value_t)
}

pub(crate) fn emit_push<G: X86Guest>(
    lifter: &Lifter<G>,
    sb: &mut IrSb,
    instr: &Instruction,
    next_addr: u64,
) -> Result<(), LiftError> {
    let ops = &instr.operands;
    let width_bits = lifter.operand_width(&ops[0], instr);
    let value = lifter.read_operand(sb, &ops[0], instr, next_addr)?;
    let value = if width_bits < lifter.word_bits() {
        lifter.widen_unsigned(value, registers::ir_type_for_width(width_bits), next_addr)?
    } else {
        value
    };
    push_word(lifter, sb, value, next_addr)
}

pub(crate) fn emit_pop<G: X86Guest>(
    lifter: &Lifter<G>,
    sb: &mut IrSb,
    instr: &Instruction,
    next_addr: u64,
) -> Result<(), LiftError> {
    let ops = &instr.operands;
    let value = pop_word(lifter, sb, next_addr)?;
    let dest = lifter.place(sb, &ops[0], instr, next_addr)?;
    lifter.write_place(sb, &dest, value)
}
