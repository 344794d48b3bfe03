//! The `Lifter<G>` core (§4.6): decoder output to `IRSB`, shared helpers
//! every per-mnemonic emitter builds on.

use vexlift_decoder::{decode_one, ConditionCode, DecodeMode, Instruction, Mnemonic, Operand};
use vexlift_guest::{Amd64GuestState, CcOp, GuestState, X86GuestState};
use vexlift_ir::{
    sanity_check, CallTarget, IntBinKind, IrConst, IrExpr, IrOp, IrSb, IrStmt, IrTemp, JumpKind,
};
use vexlift_types::{Endness, IrType};

use crate::config::LiftConfig;
use crate::error::LiftError;
use crate::registers;
use crate::{arith, control, simd, stack};

/// A guest-state flavor this crate knows how to decode and lift. Only
/// [`X86GuestState`] and [`Amd64GuestState`] implement it; [`vexlift_guest::ArmGuestState`]
/// has no decoder in this workspace, so `Lifter<ArmGuestState>` simply never
/// type-checks rather than failing at runtime.
pub trait X86Guest: GuestState {
    fn decode_mode(&self) -> DecodeMode;
    fn ip_register_name(&self) -> &'static str;
}

impl X86Guest for X86GuestState {
    fn decode_mode(&self) -> DecodeMode {
        DecodeMode::Bits32
    }

    fn ip_register_name(&self) -> &'static str {
        "EIP"
    }
}

impl X86Guest for Amd64GuestState {
    fn decode_mode(&self) -> DecodeMode {
        DecodeMode::Bits64
    }

    fn ip_register_name(&self) -> &'static str {
        "RIP"
    }
}

/// A resolved read/write target for an operand: either a guest register at
/// a fixed offset, or a memory address already snapshotted into a temp so
/// every later read/write through it sees the same address.
pub(crate) enum Place {
    Reg { offset: u32, ty: IrType },
    Mem { addr: IrExpr, ty: IrType },
}

/// What a dispatched instruction did to the block's control flow.
pub(crate) enum Control {
    /// Keep decoding at the next address.
    Continue,
    /// The block ends here.
    Terminate { jump_kind: JumpKind, next: IrExpr },
}

pub struct Lifter<G: X86Guest> {
    guest: G,
    config: LiftConfig,
}

impl<G: X86Guest> Lifter<G> {
    pub fn new(guest: G) -> Self {
        Self::with_config(guest, LiftConfig::default())
    }

    pub fn with_config(guest: G, config: LiftConfig) -> Self {
        Self { guest, config }
    }

    pub fn config(&self) -> &LiftConfig {
        &self.config
    }

    pub fn guest(&self) -> &G {
        &self.guest
    }

    /// Lift the basic block starting at `address`, reading at most
    /// `code.len()` bytes but stopping early at the configured instruction
    /// or byte budget, or at the first terminator.
    #[tracing::instrument(name = "lift_basic_block", skip(self, code), fields(address = %format_args!("{address:#x}")))]
    pub fn lift_basic_block(&self, code: &[u8], address: u64) -> Result<IrSb, LiftError> {
        let mode = self.guest.decode_mode();
        let ip_offset = self.guest.register_offset(self.guest.ip_register_name())?;
        let mut sb = IrSb::new(self.word_type(), ip_offset);

        let mut pos: usize = 0;
        let mut count: u32 = 0;

        loop {
            let budget_exhausted =
                pos >= code.len() || count >= self.config.max_instructions() || pos as u32 >= self.config.max_bytes();
            if budget_exhausted {
                if self.config.require_flatness() && pos < code.len() {
                    tracing::debug!(bytes_consumed = pos, "block truncated by budget under require_flatness");
                    return Err(LiftError::LiftFailure {
                        address: address + pos as u64,
                        reason: "block exceeded its instruction/byte budget before reaching a terminator",
                    });
                }
                tracing::trace!(bytes_consumed = pos, instructions = count, "block budget exhausted");
                sb.set_jump_kind(JumpKind::Boring);
                sb.set_next(IrExpr::const_(self.const_word(address + pos as u64)));
                break;
            }

            let instr = match decode_one(mode, address + pos as u64, &code[pos..]) {
                Ok(instr) => instr,
                // A decode failure stops the block cleanly rather than propagating
                // (matches DecodeError's own documented contract).
                Err(err) => {
                    tracing::trace!(%err, at = %format_args!("{:#x}", address + pos as u64), "decode stopped the block");
                    sb.set_jump_kind(JumpKind::Boring);
                    sb.set_next(IrExpr::const_(self.const_word(address + pos as u64)));
                    break;
                }
            };

            let len = instr.len() as u32;
            sb.add_statement(IrStmt::imark(address + pos as u64, len, 0));
            let next_addr = address + pos as u64 + len as u64;

            let control = self.dispatch(&mut sb, &instr, next_addr)?;

            pos += len as usize;
            count += 1;

            match control {
                Control::Continue => continue,
                Control::Terminate { jump_kind, next } => {
                    sb.set_jump_kind(jump_kind);
                    sb.set_next(next);
                    break;
                }
            }
        }

        sanity_check(&sb, "lift_basic_block", self.config.require_flatness(), self.word_type())?;
        Ok(sb)
    }

    fn dispatch(&self, sb: &mut IrSb, instr: &Instruction, next_addr: u64) -> Result<Control, LiftError> {
        use Mnemonic::*;
        match instr.mnemonic {
            Mov => arith::emit_mov(self, sb, instr, next_addr).map(|_| Control::Continue),
            Add => arith::emit_alu(self, sb, instr, next_addr, IntBinKind::Add, CcOp::Add, true).map(|_| Control::Continue),
            Sub => arith::emit_alu(self, sb, instr, next_addr, IntBinKind::Sub, CcOp::Sub, true).map(|_| Control::Continue),
            Cmp => arith::emit_alu(self, sb, instr, next_addr, IntBinKind::Sub, CcOp::Sub, false).map(|_| Control::Continue),
            Test => arith::emit_alu(self, sb, instr, next_addr, IntBinKind::And, CcOp::And, false).map(|_| Control::Continue),
            And => arith::emit_alu(self, sb, instr, next_addr, IntBinKind::And, CcOp::And, true).map(|_| Control::Continue),
            Or => arith::emit_alu(self, sb, instr, next_addr, IntBinKind::Or, CcOp::Or, true).map(|_| Control::Continue),
            Xor => arith::emit_alu(self, sb, instr, next_addr, IntBinKind::Xor, CcOp::Xor, true).map(|_| Control::Continue),
            Adc => arith::emit_adc_sbb(self, sb, instr, next_addr, true).map(|_| Control::Continue),
            Sbb => arith::emit_adc_sbb(self, sb, instr, next_addr, false).map(|_| Control::Continue),
            Shl => arith::emit_shift(self, sb, instr, next_addr, IntBinKind::Shl, CcOp::Shl).map(|_| Control::Continue),
            Shr => arith::emit_shift(self, sb, instr, next_addr, IntBinKind::Shr, CcOp::Shr).map(|_| Control::Continue),
            Sar => arith::emit_shift(self, sb, instr, next_addr, IntBinKind::Sar, CcOp::Sar).map(|_| Control::Continue),
            Rol => arith::emit_rotate(self, sb, instr, next_addr, true).map(|_| Control::Continue),
            Ror => arith::emit_rotate(self, sb, instr, next_addr, false).map(|_| Control::Continue),
            Inc => arith::emit_inc_dec(self, sb, instr, next_addr, true).map(|_| Control::Continue),
            Dec => arith::emit_inc_dec(self, sb, instr, next_addr, false).map(|_| Control::Continue),
            Neg => arith::emit_neg(self, sb, instr, next_addr).map(|_| Control::Continue),
            Not => arith::emit_not(self, sb, instr, next_addr).map(|_| Control::Continue),
            Mul => arith::emit_mul(self, sb, instr, next_addr, false).map(|_| Control::Continue),
            Imul => arith::emit_mul(self, sb, instr, next_addr, true).map(|_| Control::Continue),
            Div => arith::emit_div(self, sb, instr, next_addr, false).map(|_| Control::Continue),
            Idiv => arith::emit_div(self, sb, instr, next_addr, true).map(|_| Control::Continue),
            Lea => arith::emit_lea(self, sb, instr, next_addr).map(|_| Control::Continue),
            Xchg => arith::emit_xchg(self, sb, instr, next_addr).map(|_| Control::Continue),
            Cmpxchg => arith::emit_cmpxchg(self, sb, instr, next_addr).map(|_| Control::Continue),
            Push => stack::emit_push(self, sb, instr, next_addr).map(|_| Control::Continue),
            Pop => stack::emit_pop(self, sb, instr, next_addr).map(|_| Control::Continue),
            Call => control::emit_call(self, sb, instr, next_addr),
            Ret => control::emit_ret(self, sb, instr, next_addr),
            Jmp => control::emit_jmp(self, sb, instr, next_addr),
            Jcc(cc) => control::emit_jcc(self, sb, instr, next_addr, cc),
            Cmovcc(cc) => arith::emit_cmovcc(self, sb, instr, next_addr, cc).map(|_| Control::Continue),
            Setcc(cc) => arith::emit_setcc(self, sb, instr, next_addr, cc).map(|_| Control::Continue),
            Bt => arith::emit_bit_test(self, sb, instr, next_addr, arith::BitTestOp::Test).map(|_| Control::Continue),
            Bts => arith::emit_bit_test(self, sb, instr, next_addr, arith::BitTestOp::Set).map(|_| Control::Continue),
            Btr => arith::emit_bit_test(self, sb, instr, next_addr, arith::BitTestOp::Reset).map(|_| Control::Continue),
            Btc => arith::emit_bit_test(self, sb, instr, next_addr, arith::BitTestOp::Complement).map(|_| Control::Continue),
            Bsf => arith::emit_bit_scan(self, sb, instr, next_addr, "guest_bsf").map(|_| Control::Continue),
            Bsr => arith::emit_bit_scan(self, sb, instr, next_addr, "guest_bsr").map(|_| Control::Continue),
            Bswap => arith::emit_bswap(self, sb, instr, next_addr).map(|_| Control::Continue),
            Popcnt => arith::emit_bit_scan(self, sb, instr, next_addr, "guest_popcnt").map(|_| Control::Continue),
            Lzcnt => arith::emit_bit_scan(self, sb, instr, next_addr, "guest_lzcnt").map(|_| Control::Continue),
            Tzcnt => arith::emit_bit_scan(self, sb, instr, next_addr, "guest_tzcnt").map(|_| Control::Continue),
            Nop => Ok(Control::Continue),
            Ud2 => Ok(control::terminate_at_fallthrough(self, JumpKind::SigIll, next_addr)),
            Int3 => Ok(control::terminate_at_fallthrough(self, JumpKind::SigTrap, next_addr)),
            Int => Ok(control::terminate_at_fallthrough(self, JumpKind::SysInt, next_addr)),
            Into => Ok(control::terminate_at_fallthrough(self, JumpKind::SigTrap, next_addr)),
            Hlt => Ok(control::terminate_at_fallthrough(self, JumpKind::Privileged, next_addr)),
            Syscall => Ok(control::terminate_at_fallthrough(self, JumpKind::SysSyscall, next_addr)),
            Sysenter => Ok(control::terminate_at_fallthrough(self, JumpKind::SysSysenter, next_addr)),
            Emms => simd::emit_emms(self, sb).map(|_| Control::Continue),
            Mfence | Lfence | Sfence => simd::emit_fence(self, sb).map(|_| Control::Continue),
            VMovdqu32 => simd::emit_vmovdqu32(self, sb, instr, next_addr).map(|_| Control::Continue),
        }
    }

    // -- shared helpers used by every emitter module -------------------

    pub(crate) fn word_type(&self) -> IrType {
        self.guest.word_type()
    }

    pub(crate) fn word_bits(&self) -> u32 {
        self.word_type().size_bits() as u32
    }

    pub(crate) fn const_word(&self, v: u64) -> IrConst {
        if self.word_type() == IrType::I64 {
            IrConst::I64(v)
        } else {
            IrConst::I32(v as u32)
        }
    }

    pub(crate) fn reg_get(&self, name: &str) -> Result<IrExpr, LiftError> {
        let offset = self.guest.register_offset(name)?;
        let ty = self.guest.register_type(name)?;
        Ok(IrExpr::get(offset, ty)?)
    }

    pub(crate) fn reg_put_stmt(&self, name: &str, value: IrExpr) -> Result<IrStmt, LiftError> {
        let offset = self.guest.register_offset(name)?;
        Ok(IrStmt::put(offset, value))
    }

    pub(crate) fn reg_place(&self, name: &str) -> Result<Place, LiftError> {
        let offset = self.guest.register_offset(name)?;
        let ty = self.guest.register_type(name)?;
        Ok(Place::Reg { offset, ty })
    }

    /// Resolve a decoded operand into a read/write target. `op` must not be
    /// `Immediate`/`RelativeTarget`/`None` — those have no storage location.
    pub(crate) fn place(
        &self,
        sb: &mut IrSb,
        op: &Operand,
        instr: &Instruction,
        next_addr: u64,
    ) -> Result<Place, LiftError> {
        match *op {
            Operand::Register { gpr, width_bits, high_byte } => {
                self.reg_place(registers::gpr_name(gpr, width_bits, high_byte))
            }
            Operand::Vector { index, width_bits } => self.reg_place(&registers::vector_name(index, width_bits)),
            Operand::Mask { index } => self.reg_place(&registers::mask_name(index)),
            Operand::Mmx { index } => self.reg_place(&format!("FPREG{index}")),
            Operand::Memory(mem) => {
                let addr_ty = self.word_type();
                let addr_expr = self.memory_address(&mem, instr, next_addr)?;
                let addr_temp = self.snapshot(sb, addr_ty, addr_expr)?;
                let width_bits = self.operand_width(op, instr);
                Ok(Place::Mem {
                    addr: IrExpr::rd_tmp(addr_temp)?,
                    ty: registers::ir_type_for_width(width_bits),
                })
            }
            Operand::Immediate(_) | Operand::RelativeTarget(_) | Operand::None => Err(LiftError::LiftFailure {
                address: next_addr,
                reason: "operand has no addressable storage location",
            }),
        }
    }

    pub(crate) fn read_place(&self, place: &Place) -> Result<IrExpr, LiftError> {
        match place {
            Place::Reg { offset, ty } => Ok(IrExpr::get(*offset, *ty)?),
            Place::Mem { addr, ty } => Ok(IrExpr::load(Endness::Little, *ty, addr.clone())?),
        }
    }

    pub(crate) fn write_place(&self, sb: &mut IrSb, place: &Place, value: IrExpr) -> Result<(), LiftError> {
        match place {
            Place::Reg { offset, .. } => sb.add_statement(IrStmt::put(*offset, value)),
            Place::Mem { addr, .. } => sb.add_statement(IrStmt::store(Endness::Little, addr.clone(), value)),
        }
        Ok(())
    }

    /// Read an operand's current value, resolving immediates/relative
    /// targets to constants directly instead of through a `Place`.
    pub(crate) fn read_operand(
        &self,
        sb: &mut IrSb,
        op: &Operand,
        instr: &Instruction,
        next_addr: u64,
    ) -> Result<IrExpr, LiftError> {
        match *op {
            Operand::Immediate(v) => Ok(IrExpr::const_(registers::const_for_width(v, self.operand_width(op, instr)))),
            Operand::RelativeTarget(target) => Ok(IrExpr::const_(self.const_word(target))),
            _ => {
                let place = self.place(sb, op, instr, next_addr)?;
                self.read_place(&place)
            }
        }
    }

    pub(crate) fn operand_width(&self, op: &Operand, instr: &Instruction) -> u32 {
        match *op {
            Operand::Register { width_bits, .. } => width_bits,
            Operand::Vector { width_bits, .. } => width_bits,
            Operand::Mmx { .. } => 64,
            Operand::Mask { .. } => 64,
            Operand::Memory(_) | Operand::Immediate(_) => instr.operand_width_bits,
            Operand::RelativeTarget(_) => self.word_bits(),
            Operand::None => 0,
        }
    }

    pub(crate) fn memory_address(
        &self,
        mem: &vexlift_decoder::MemoryOperand,
        instr: &Instruction,
        next_addr: u64,
    ) -> Result<IrExpr, LiftError> {
        let addr_ty = self.word_type();
        let add_op = IrOp::int_binop(IntBinKind::Add, addr_ty).ok_or(LiftError::LiftFailure {
            address: next_addr,
            reason: "no Add op at the guest's address width",
        })?;

        let mut expr: Option<IrExpr> = None;

        if mem.rip_relative {
            let target = next_addr.wrapping_add(mem.disp as u64);
            expr = Some(IrExpr::const_(self.const_word(target)));
        } else {
            if let Some(base) = mem.base {
                let name = registers::gpr_name(base, self.word_bits(), false);
                expr = Some(self.reg_get(name)?);
            }

            if let Some(index) = mem.index {
                let name = registers::gpr_name(index, self.word_bits(), false);
                let idx_expr = self.reg_get(name)?;
                let scaled = if mem.scale > 1 {
                    let mul_op = IrOp::int_binop(IntBinKind::Mul, addr_ty).ok_or(LiftError::LiftFailure {
                        address: next_addr,
                        reason: "no Mul op at the guest's address width",
                    })?;
                    IrExpr::binop(mul_op, idx_expr, IrExpr::const_(self.const_word(mem.scale as u64)))?
                } else {
                    idx_expr
                };
                expr = Some(match expr {
                    Some(base_expr) => IrExpr::binop(add_op, base_expr, scaled)?,
                    None => scaled,
                });
            }

            if mem.disp != 0 || expr.is_none() {
                let disp_expr = IrExpr::const_(self.const_word(mem.disp as u64));
                expr = Some(match expr {
                    Some(e) => IrExpr::binop(add_op, e, disp_expr)?,
                    None => disp_expr,
                });
            }

            if let Some(seg) = mem.segment {
                let base_name = match seg {
                    vexlift_decoder::Segment::Fs => Some("FS_BASE"),
                    vexlift_decoder::Segment::Gs => Some("GS_BASE"),
                    // Cs/Ss/Ds/Es are treated as zero-based.
                    _ => None,
                };
                if let Some(name) = base_name {
                    if let Ok(seg_expr) = self.reg_get(name) {
                        expr = Some(IrExpr::binop(add_op, expr.expect("disp branch always sets expr"), seg_expr)?);
                    }
                }
            }
        }

        Ok(expr.expect("disp branch always sets expr"))
    }

    pub(crate) fn snapshot(&self, sb: &mut IrSb, ty: IrType, expr: IrExpr) -> Result<IrTemp, LiftError> {
        let t = sb.new_temp(ty);
        sb.add_statement(IrStmt::wr_tmp(t, expr)?);
        Ok(t)
    }

    pub(crate) fn rd(&self, t: IrTemp) -> Result<IrExpr, LiftError> {
        Ok(IrExpr::rd_tmp(t)?)
    }

    /// Zero-extend `expr` (declared type `from`) up to the guest word width,
    /// for storing into a word-sized `CC_DEP*` slot.
    pub(crate) fn widen_unsigned(&self, expr: IrExpr, from: IrType, at: u64) -> Result<IrExpr, LiftError> {
        let to = self.word_type();
        if from == to {
            return Ok(expr);
        }
        let op = match (from, to) {
            (IrType::I8, IrType::I16) => IrOp::Widen8Uto16,
            (IrType::I8, IrType::I32) => IrOp::Widen8Uto32,
            (IrType::I8, IrType::I64) => IrOp::Widen8Uto64,
            (IrType::I16, IrType::I32) => IrOp::Widen16Uto32,
            (IrType::I16, IrType::I64) => IrOp::Widen16Uto64,
            (IrType::I32, IrType::I64) => IrOp::Widen32Uto64,
            _ => {
                return Err(LiftError::LiftFailure {
                    address: at,
                    reason: "no unsigned widening conversion between these types",
                })
            }
        };
        Ok(IrExpr::unop(op, expr)?)
    }

    pub(crate) fn write_cc(&self, sb: &mut IrSb, cc_op: CcOp, dep1: IrExpr, dep2: IrExpr, ndep: IrExpr) -> Result<(), LiftError> {
        sb.add_statement(self.reg_put_stmt("CC_OP", IrExpr::const_(IrConst::I32(cc_op.code())))?);
        sb.add_statement(self.reg_put_stmt("CC_DEP1", dep1)?);
        sb.add_statement(self.reg_put_stmt("CC_DEP2", dep2)?);
        sb.add_statement(self.reg_put_stmt("CC_NDEP", ndep)?);
        Ok(())
    }

    /// A pure `I1` guard evaluating `cc` against the current lazy-flags
    /// state, for `Jcc`/`SETcc`/`CMOVcc`.
    pub(crate) fn condition_guard(&self, cc: ConditionCode) -> Result<IrExpr, LiftError> {
        let nibble = registers::condition_nibble(cc);
        let args = vec![
            IrExpr::const_(IrConst::I8(nibble)),
            self.reg_get("CC_OP")?,
            self.reg_get("CC_DEP1")?,
            self.reg_get("CC_DEP2")?,
            self.reg_get("CC_NDEP")?,
        ];
        Ok(IrExpr::ccall(CallTarget::new("guest_calculate_condition"), IrType::I1, args)?)
    }

    /// The incoming carry flag widened to `ty`, for `ADC`/`SBB`.
    pub(crate) fn carry_in(&self, ty: IrType) -> Result<IrExpr, LiftError> {
        let args = vec![
            self.reg_get("CC_OP")?,
            self.reg_get("CC_DEP1")?,
            self.reg_get("CC_DEP2")?,
            self.reg_get("CC_NDEP")?,
        ];
        Ok(IrExpr::ccall(CallTarget::new("guest_carry_in"), ty, args)?)
    }
}
