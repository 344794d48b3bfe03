//! Control-flow emitters (§4.6): JMP/Jcc/CALL/RET and the fixed-fallthrough
//! terminators (UD2, INT3, HLT, SYSCALL, ...).

use vexlift_decoder::{ConditionCode, Instruction, Operand};
use vexlift_ir::{IntBinKind, IrExpr, IrOp, IrSb, IrStmt, JumpKind};
use vexlift_types::IrType;

use crate::error::LiftError;
use crate::lifter::{Control, Lifter, X86Guest};
use crate::stack;

/// A terminator with no materializable guest successor (a trap, a syscall,
/// a privileged instruction). `next` is conservatively set to the address
/// right after the instruction, matching how a debugger would single-step
/// over it if the guest handler returned control there.
pub(crate) fn terminate_at_fallthrough<G: X86Guest>(
    lifter: &Lifter<G>,
    jump_kind: JumpKind,
    next_addr: u64,
) -> Control {
    Control::Terminate {
        jump_kind,
        next: IrExpr::const_(lifter.const_word(next_addr)),
    }
}

pub(crate) fn emit_jmp<G: X86Guest>(
    lifter: &Lifter<G>,
    sb: &mut IrSb,
    instr: &Instruction,
    next_addr: u64,
) -> Result<Control, LiftError> {
    let target = match instr.operands[0] {
        Operand::RelativeTarget(target) => IrExpr::const_(lifter.const_word(target)),
        _ => lifter.read_operand(sb, &instr.operands[0], instr, next_addr)?,
    };
    Ok(Control::Terminate {
        jump_kind: JumpKind::Boring,
        next: target,
    })
}

pub(crate) fn emit_jcc<G: X86Guest>(
    lifter: &Lifter<G>,
    sb: &mut IrSb,
    instr: &Instruction,
    next_addr: u64,
    cc: ConditionCode,
) -> Result<Control, LiftError> {
    let target = match instr.operands[0] {
        Operand::RelativeTarget(target) => target,
        _ => {
            return Err(LiftError::LiftFailure {
                address: next_addr,
                reason: "Jcc target must be a relative displacement",
            })
        }
    };
    let guard = lifter.condition_guard(cc)?;
    sb.add_statement(IrStmt::exit(
        guard,
        JumpKind::Boring,
        lifter.const_word(target),
        sb.offs_ip(),
    ));

    if lifter.config().jcc_is_terminator() {
        Ok(Control::Terminate {
            jump_kind: JumpKind::Boring,
            next: IrExpr::const_(lifter.const_word(next_addr)),
        })
    } else {
        Ok(Control::Continue)
    }
}

pub(crate) fn emit_call<G: X86Guest>(
    lifter: &Lifter<G>,
    sb: &mut IrSb,
    instr: &Instruction,
    next_addr: u64,
) -> Result<Control, LiftError> {
    let target = match instr.operands[0] {
        Operand::RelativeTarget(target) => IrExpr::const_(lifter.const_word(target)),
        _ => lifter.read_operand(sb, &instr.operands[0], instr, next_addr)?,
    };
    let return_addr = IrExpr::const_(lifter.const_word(next_addr));
    stack::push_word(lifter, sb, return_addr, next_addr)?;
    Ok(Control::Terminate {
        jump_kind: JumpKind::Call,
        next: target,
    })
}

pub(crate) fn emit_ret<G: X86Guest>(
    lifter: &Lifter<G>,
    sb: &mut IrSb,
    instr: &Instruction,
    next_addr: u64,
) -> Result<Control, LiftError> {
    let target = stack::pop_word(lifter, sb, next_addr)?;

    // `RET imm16` additionally deallocates `imm16` bytes of caller-pushed
    // arguments after popping the return address.
    if instr.operand_count > 0 {
        if let Operand::Immediate(extra) = instr.operands[0] {
            let sp_name = if lifter.word_type() == IrType::I64 {
                "RSP"
            } else {
                "ESP"
            };
            let sp = lifter.reg_get(sp_name)?;
            let add = IrOp::int_binop(IntBinKind::Add, lifter.word_type()).ok_or(
                LiftError::LiftFailure {
                    address: next_addr,
                    reason: "no Add op at the guest's word width",
                },
            )?;
            let bumped = IrExpr::binop(add, sp, IrExpr::const_(lifter.const_word(extra as u64)))?;
            sb.add_statement(lifter.reg_put_stmt(sp_name, bumped)?);
        }
    }

    Ok(Control::Terminate {
        jump_kind: JumpKind::Ret,
        next: target,
    })
}
