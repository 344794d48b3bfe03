//! Vector/fence/FPU-state emitters (§4.6, §8 VMOVDQU32 scenario).

use vexlift_decoder::Instruction;
use vexlift_ir::{CallTarget, DirtyMemFx, IrSb, IrStmt, MemoryBusEvent};

use crate::error::LiftError;
use crate::lifter::{Lifter, X86Guest};
use crate::registers;

pub(crate) fn emit_emms<G: X86Guest>(_lifter: &Lifter<G>, sb: &mut IrSb) -> Result<(), LiftError> {
    sb.add_statement(IrStmt::no_op());
    Ok(())
}

pub(crate) fn emit_fence<G: X86Guest>(_lifter: &Lifter<G>, sb: &mut IrSb) -> Result<(), LiftError> {
    sb.add_statement(IrStmt::mbe(MemoryBusEvent::Fence));
    Ok(())
}

/// VMOVDQU32: an unmasked move is a plain register/memory copy. A masked
/// move (`EVEX.aaa != 0`) is modelled as a `Dirty` call instead of a direct
/// `Put`/`Store`, since per-lane masking/zeroing reads both the old
/// destination and the mask register, something no single `IrExpr` shape
/// here captures as cleanly as a helper call.
pub(crate) fn emit_vmovdqu32<G: X86Guest>(
    lifter: &Lifter<G>,
    sb: &mut IrSb,
    instr: &Instruction,
    next_addr: u64,
) -> Result<(), LiftError> {
    let ops = &instr.operands;
    let dest = lifter.place(sb, &ops[0], instr, next_addr)?;

    match instr.evex {
        Some(evex) if evex.has_masking() => {
            let mask_name = registers::mask_name(evex.get_mask_register());
            let old = lifter.read_place(&dest)?;
            let new = lifter.read_operand(sb, &ops[1], instr, next_addr)?;
            let mask = lifter.reg_get(&mask_name)?;
            let mem_fx = match &ops[0] {
                vexlift_decoder::Operand::Memory(_) => DirtyMemFx::Write,
                _ => DirtyMemFx::None,
            };
            sb.add_statement(IrStmt::dirty(
                CallTarget::new("guest_masked_move_v512"),
                None,
                vec![mask, old, new],
                None,
                mem_fx,
            )?);
            Ok(())
        }
        _ => {
            let value = lifter.read_operand(sb, &ops[1], instr, next_addr)?;
            lifter.write_place(sb, &dest, value)
        }
    }
}
