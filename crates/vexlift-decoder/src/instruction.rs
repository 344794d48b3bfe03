use vexlift_guest::Gpr;

use crate::condition::ConditionCode;
use crate::error::DecodeError;
use crate::evex::Evex;
use crate::mnemonic::Mnemonic;
use crate::mode::DecodeMode;
use crate::modrm::{ModRm, Sib};
use crate::operand::{MemoryOperand, Operand, MAX_OPERANDS};
use crate::prefixes::{scan_prefixes, Prefixes};
use crate::rex::Rex;
use crate::vex::Vex;

pub const MAX_INSTRUCTION_LEN: usize = 15;

/// A fully decoded instruction (§4.5 step 5). Operands live in a fixed-size
/// array, never a `Vec`, so decoding a hot loop body does not allocate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Instruction {
    pub mnemonic: Mnemonic,
    pub opcode: u8,
    pub length: u8,
    pub operands: [Operand; MAX_OPERANDS],
    pub operand_count: u8,
    pub prefixes: Prefixes,
    pub rex: Option<Rex>,
    pub vex: Option<Vex>,
    pub evex: Option<Evex>,
    /// The instruction's resolved general operand width (REX.W / 0x66 /
    /// mode default). Kept at the top level because `Operand::Memory`
    /// carries addressing components but no width of its own, so a memory
    /// destination paired with an immediate source (e.g. `add dword [rax],
    /// 5`) has nowhere else to recover it from.
    pub operand_width_bits: u32,
}

impl Instruction {
    pub fn len(&self) -> usize {
        self.length as usize
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn operands(&self) -> &[Operand] {
        &self.operands[..self.operand_count as usize]
    }

    pub fn op_count(&self) -> usize {
        self.operand_count as usize
    }

    /// §4.6 terminator rules operate on the mnemonic alone; this just
    /// narrows to candidates (the lifter still applies Jcc policy etc).
    pub fn is_terminator_candidate(&self) -> bool {
        self.mnemonic.is_terminator_candidate()
    }
}

struct Builder<'a> {
    mode: DecodeMode,
    address: u64,
    bytes: &'a [u8],
    cursor: usize,
    prefixes: Prefixes,
    rex: Option<Rex>,
    vex: Option<Vex>,
    evex: Option<Evex>,
    operands: [Operand; MAX_OPERANDS],
    operand_count: u8,
}

impl<'a> Builder<'a> {
    fn push_operand(&mut self, operand: Operand) {
        debug_assert!((self.operand_count as usize) < MAX_OPERANDS);
        self.operands[self.operand_count as usize] = operand;
        self.operand_count += 1;
    }

    fn u8(&mut self) -> Result<u8, DecodeError> {
        let b = *self.bytes.get(self.cursor).ok_or(DecodeError::NeedMoreBytes)?;
        self.cursor += 1;
        Ok(b)
    }

    fn i8(&mut self) -> Result<i8, DecodeError> {
        Ok(self.u8()? as i8)
    }

    fn u16(&mut self) -> Result<u16, DecodeError> {
        let s = self
            .bytes
            .get(self.cursor..self.cursor + 2)
            .ok_or(DecodeError::NeedMoreBytes)?;
        self.cursor += 2;
        Ok(u16::from_le_bytes(s.try_into().unwrap()))
    }

    fn i32(&mut self) -> Result<i32, DecodeError> {
        let s = self
            .bytes
            .get(self.cursor..self.cursor + 4)
            .ok_or(DecodeError::NeedMoreBytes)?;
        self.cursor += 4;
        Ok(i32::from_le_bytes(s.try_into().unwrap()))
    }

    fn i64(&mut self) -> Result<i64, DecodeError> {
        let s = self
            .bytes
            .get(self.cursor..self.cursor + 8)
            .ok_or(DecodeError::NeedMoreBytes)?;
        self.cursor += 8;
        Ok(i64::from_le_bytes(s.try_into().unwrap()))
    }

    fn modrm(&mut self) -> Result<ModRm, DecodeError> {
        Ok(ModRm::from_byte(self.u8()?))
    }

    fn rex_r(&self) -> bool {
        self.rex.map(|r| r.r).unwrap_or(false)
    }

    fn rex_x(&self) -> bool {
        self.rex.map(|r| r.x).unwrap_or(false)
    }

    fn rex_b(&self) -> bool {
        self.rex.map(|r| r.b).unwrap_or(false)
    }

    fn rex_present(&self) -> bool {
        self.rex.is_some()
    }

    /// Operand width for general ALU/MOV forms: REX.W, else the 0x66
    /// toggle, else the mode default.
    fn operand_width(&self) -> u32 {
        if self.rex.map(|r| r.w).unwrap_or(false) {
            return 64;
        }
        if self.prefixes.operand_size_override {
            return if self.mode.default_operand_width() == 16 {
                32
            } else {
                16
            };
        }
        self.mode.default_operand_width()
    }

    /// push/pop/call/ret/jmp default to 64-bit operand size in 64-bit mode
    /// regardless of the 0x66 prefix (§4.6 "Stack operations").
    fn stack_operand_width(&self) -> u32 {
        if self.mode.is_64_bit() {
            64
        } else {
            self.operand_width()
        }
    }

    fn gpr_operand(&self, encoding: u8, width_bits: u32) -> Operand {
        let high_byte = width_bits == 8 && !self.rex_present() && (4..=7).contains(&encoding);
        Operand::Register {
            gpr: Gpr::from_encoding(encoding),
            width_bits,
            high_byte,
        }
    }

    fn reg_field_gpr(&self, modrm: ModRm, width_bits: u32) -> Operand {
        let encoding = modrm.reg | ((self.rex_r() as u8) << 3);
        self.gpr_operand(encoding, width_bits)
    }

    /// Decode the ModR/M `rm` field into either a register or memory
    /// operand, consuming SIB/displacement bytes as needed.
    fn rm_operand(&mut self, modrm: ModRm, width_bits: u32) -> Result<Operand, DecodeError> {
        if modrm.is_register_direct() {
            let encoding = modrm.rm | ((self.rex_b() as u8) << 3);
            return Ok(self.gpr_operand(encoding, width_bits));
        }
        self.memory_operand(modrm).map(Operand::Memory)
    }

    fn memory_operand(&mut self, modrm: ModRm) -> Result<MemoryOperand, DecodeError> {
        let segment = self.prefixes.segment;

        if modrm.is_rip_relative(self.mode.is_64_bit()) {
            let disp = self.i32()? as i64;
            return Ok(MemoryOperand {
                base: None,
                index: None,
                scale: 1,
                disp,
                segment,
                rip_relative: true,
            });
        }

        let (base_enc, index_enc, scale) = if modrm.needs_sib() {
            let sib = Sib::from_byte(self.u8()?);
            let index = if sib.has_no_index() && !self.rex_x() {
                None
            } else {
                Some(sib.index | ((self.rex_x() as u8) << 3))
            };
            let base = if sib.has_no_base(modrm.md) {
                None
            } else {
                Some(sib.base | ((self.rex_b() as u8) << 3))
            };
            (base, index, sib.scale_factor() as u8)
        } else if modrm.md == 0b00 && modrm.rm == 0b101 {
            // 16/32-bit addressing, no SIB: mod=00,rm=101 means disp32 with
            // no base register (distinct from RIP-relative, 64-bit only).
            (None, None, 1)
        } else {
            (Some(modrm.rm | ((self.rex_b() as u8) << 3)), None, 1)
        };

        let disp = match modrm.md {
            0b00 => {
                if base_enc.is_none() {
                    self.i32()? as i64
                } else {
                    0
                }
            }
            0b01 => self.i8()? as i64,
            0b10 => self.i32()? as i64,
            _ => unreachable!("register-direct handled above"),
        };

        Ok(MemoryOperand {
            base: base_enc.map(Gpr::from_encoding),
            index: index_enc.map(Gpr::from_encoding),
            scale,
            disp,
            segment,
            rip_relative: false,
        })
    }

    fn immediate_for_width(&mut self, width_bits: u32) -> Result<i64, DecodeError> {
        match width_bits {
            8 => Ok(self.i8()? as i64),
            16 => Ok(self.u16()? as i64),
            64 => self.i64(),
            _ => Ok(self.i32()? as i64),
        }
    }

    /// Immediates never widen past 32 bits except `MOV r64, imm64`; every
    /// other 64-bit-width instruction sign-extends a 32-bit immediate.
    fn immediate_sign_extended_32(&mut self, width_bits: u32) -> Result<i64, DecodeError> {
        if width_bits == 8 {
            Ok(self.i8()? as i64)
        } else if width_bits == 16 {
            Ok(self.u16()? as i16 as i64)
        } else {
            Ok(self.i32()? as i64)
        }
    }

    fn vector_width_bits(&self) -> u32 {
        if let Some(evex) = self.evex {
            evex.get_vector_length()
        } else if let Some(vex) = self.vex {
            vex.vector_length_bits()
        } else {
            128
        }
    }

    fn vector_operand(&self, index: u8) -> Operand {
        Operand::Vector {
            index,
            width_bits: self.vector_width_bits(),
        }
    }

    /// Resolve a `rel8`/`rel32` displacement into an absolute target: x86
    /// relative branches are relative to the address of the *next*
    /// instruction, i.e. `address + cursor` at the point the displacement
    /// has just been read.
    fn rel_target(&self, rel: i64) -> u64 {
        (self.address as i64 + self.cursor as i64 + rel) as u64
    }
}

fn evex_looks_plausible(mode: DecodeMode, next_byte: u8) -> bool {
    mode.is_64_bit() || next_byte & 0xC0 == 0xC0
}

/// Decode a single instruction at `address`, consuming a prefix of `bytes`
/// (which may be longer than one instruction; only `instruction.len()` bytes
/// are consumed).
pub fn decode_instruction(
    mode: DecodeMode,
    address: u64,
    bytes: &[u8],
) -> Result<Instruction, DecodeError> {
    let window = if bytes.len() > MAX_INSTRUCTION_LEN {
        &bytes[..MAX_INSTRUCTION_LEN]
    } else {
        bytes
    };

    let (prefixes, prefix_len) = scan_prefixes(mode, window)?;
    let mut b = Builder {
        mode,
        address,
        bytes: window,
        cursor: prefix_len,
        prefixes,
        rex: None,
        vex: None,
        evex: None,
        operands: [Operand::None; MAX_OPERANDS],
        operand_count: 0,
    };

    let first = *window.get(b.cursor).ok_or(DecodeError::NeedMoreBytes)?;
    if first == 0x62 && window.len() > b.cursor + 1 && evex_looks_plausible(mode, window[b.cursor + 1]) {
        b.cursor += 1;
        let p0 = b.u8()?;
        let p1 = b.u8()?;
        let p2 = b.u8()?;
        b.evex = Some(Evex::from_payload(p0, p1, p2));
    } else if first == 0xC4 && window.len() > b.cursor + 1 && evex_looks_plausible(mode, window[b.cursor + 1]) {
        b.cursor += 1;
        let byte1 = b.u8()?;
        let byte2 = b.u8()?;
        b.vex = Some(Vex::from_vex3(byte1, byte2));
    } else if first == 0xC5 && window.len() > b.cursor + 1 && evex_looks_plausible(mode, window[b.cursor + 1]) {
        b.cursor += 1;
        let byte1 = b.u8()?;
        b.vex = Some(Vex::from_vex2(byte1));
    } else if mode.is_64_bit() && Rex::is_rex_byte(first) {
        b.cursor += 1;
        b.rex = Some(Rex::from_byte(first));
    }

    let opcode_byte_pos = b.cursor;
    let mnemonic = if let Some(evex) = b.evex {
        decode_vex_evex_opcode(&mut b, evex.map_select(), evex.pp())?
    } else if let Some(vex) = b.vex {
        decode_vex_evex_opcode(&mut b, vex.map_select(), vex.pp())?
    } else {
        decode_legacy_opcode(&mut b)?
    };

    let length = b.cursor;
    if length > MAX_INSTRUCTION_LEN {
        return Err(DecodeError::InvalidInstruction);
    }

    let operand_width_bits = b.operand_width();

    Ok(Instruction {
        mnemonic,
        opcode: window[opcode_byte_pos],
        length: length as u8,
        operands: b.operands,
        operand_count: b.operand_count,
        prefixes: b.prefixes,
        rex: b.rex,
        vex: b.vex,
        evex: b.evex,
        operand_width_bits,
    })
}

/// Alias matching the common `decode_one` spelling used by callers that
/// already have `DecodeMode`/byte window in hand.
pub fn decode_one(mode: DecodeMode, address: u64, bytes: &[u8]) -> Result<Instruction, DecodeError> {
    decode_instruction(mode, address, bytes)
}

pub fn decode_prefixes(mode: DecodeMode, bytes: &[u8]) -> Result<Prefixes, DecodeError> {
    scan_prefixes(mode, bytes).map(|(p, _)| p)
}

fn decode_vex_evex_opcode(b: &mut Builder, map_select: u8, _pp: u8) -> Result<Mnemonic, DecodeError> {
    let opcode = b.u8()?;
    match (map_select, opcode) {
        // VMOVDQU32/VMOVDQA32 zmm/ymm/xmm, zmm/ymm/xmm (reg <- rm form).
        (1, 0x6F) => {
            let modrm = b.modrm()?;
            let dst = modrm.reg | ((b.rex_r() as u8) << 3);
            b.push_operand(b.vector_operand(dst));
            if modrm.is_register_direct() {
                let src = modrm.rm | ((b.rex_b() as u8) << 3);
                b.push_operand(b.vector_operand(src));
            } else {
                let mem = b.memory_operand(modrm)?;
                b.push_operand(Operand::Memory(mem));
            }
            Ok(Mnemonic::VMovdqu32)
        }
        _ => Err(DecodeError::UnrecognisedTwoByteOpcode(opcode)),
    }
}

fn decode_legacy_opcode(b: &mut Builder) -> Result<Mnemonic, DecodeError> {
    let opcode = b.u8()?;

    if opcode == 0x0F {
        return decode_two_byte_opcode(b);
    }

    // ALU group: ADD/OR/ADC/SBB/AND/SUB/XOR/CMP share the same five-form
    // layout at a 0x08 stride starting from their respective base opcode.
    const ALU_MNEMONICS: [Mnemonic; 8] = [
        Mnemonic::Add,
        Mnemonic::Or,
        Mnemonic::Adc,
        Mnemonic::Sbb,
        Mnemonic::And,
        Mnemonic::Sub,
        Mnemonic::Xor,
        Mnemonic::Cmp,
    ];
    if opcode < 0x40 && opcode & 0x07 <= 0x05 {
        let group = (opcode >> 3) as usize;
        if group < 8 {
            let mnemonic = ALU_MNEMONICS[group];
            let form = opcode & 0x07;
            return decode_alu_form(b, mnemonic, form);
        }
    }

    match opcode {
        0x50..=0x57 => {
            let width = b.stack_operand_width();
            let encoding = (opcode - 0x50) | ((b.rex_b() as u8) << 3);
            b.push_operand(b.gpr_operand(encoding, width));
            Ok(Mnemonic::Push)
        }
        0x58..=0x5F => {
            let width = b.stack_operand_width();
            let encoding = (opcode - 0x58) | ((b.rex_b() as u8) << 3);
            b.push_operand(b.gpr_operand(encoding, width));
            Ok(Mnemonic::Pop)
        }
        0x68 => {
            let width = b.stack_operand_width();
            let imm = b.immediate_sign_extended_32(if width == 16 { 16 } else { 32 })?;
            b.push_operand(Operand::Immediate(imm));
            Ok(Mnemonic::Push)
        }
        0x6A => {
            let imm = b.i8()? as i64;
            b.push_operand(Operand::Immediate(imm));
            Ok(Mnemonic::Push)
        }
        0x70..=0x7F => {
            let rel = b.i8()? as i64;
            let target = b.rel_target(rel);
            b.push_operand(Operand::RelativeTarget(target));
            Ok(Mnemonic::Jcc(ConditionCode::from_nibble(opcode & 0x0F)))
        }
        0x80 | 0x81 | 0x83 => decode_group1(b, opcode),
        0x84 | 0x85 => {
            let width = if opcode == 0x84 { 8 } else { b.operand_width() };
            let modrm = b.modrm()?;
            let rm = b.rm_operand(modrm, width)?;
            let reg = b.reg_field_gpr(modrm, width);
            b.push_operand(rm);
            b.push_operand(reg);
            Ok(Mnemonic::Test)
        }
        0x86 | 0x87 => {
            let width = if opcode == 0x86 { 8 } else { b.operand_width() };
            let modrm = b.modrm()?;
            let rm = b.rm_operand(modrm, width)?;
            let reg = b.reg_field_gpr(modrm, width);
            b.push_operand(rm);
            b.push_operand(reg);
            Ok(Mnemonic::Xchg)
        }
        0x88 => decode_modrm_dest_is_rm(b, Mnemonic::Mov, 8),
        0x89 => {
            let width = b.operand_width();
            decode_modrm_dest_is_rm(b, Mnemonic::Mov, width)
        }
        0x8A => decode_modrm_dest_is_reg(b, Mnemonic::Mov, 8),
        0x8B => {
            let width = b.operand_width();
            decode_modrm_dest_is_reg(b, Mnemonic::Mov, width)
        }
        0x8D => {
            let width = b.operand_width();
            let modrm = b.modrm()?;
            if modrm.is_register_direct() {
                return Err(DecodeError::UnrecognisedOpcode(opcode));
            }
            let mem = b.memory_operand(modrm)?;
            b.push_operand(b.reg_field_gpr(modrm, width));
            b.push_operand(Operand::Memory(mem));
            Ok(Mnemonic::Lea)
        }
        0x90 => Ok(Mnemonic::Nop),
        0xA8 => {
            let imm = b.i8()? as i64;
            b.push_operand(Operand::Immediate(imm));
            Ok(Mnemonic::Test)
        }
        0xA9 => {
            let width = b.operand_width();
            let imm = b.immediate_sign_extended_32(width)?;
            b.push_operand(Operand::Immediate(imm));
            Ok(Mnemonic::Test)
        }
        0xB0..=0xB7 => {
            let encoding = (opcode - 0xB0) | ((b.rex_b() as u8) << 3);
            let imm = b.i8()? as i64;
            b.push_operand(b.gpr_operand(encoding, 8));
            b.push_operand(Operand::Immediate(imm));
            Ok(Mnemonic::Mov)
        }
        0xB8..=0xBF => {
            let width = b.operand_width();
            let encoding = (opcode - 0xB8) | ((b.rex_b() as u8) << 3);
            let imm = b.immediate_for_width(width)?;
            b.push_operand(b.gpr_operand(encoding, width));
            b.push_operand(Operand::Immediate(imm));
            Ok(Mnemonic::Mov)
        }
        0xC0 | 0xC1 => decode_shift_group(b, opcode, ShiftCount::Immediate),
        0xC2 => {
            let imm = b.u16()? as i64;
            b.push_operand(Operand::Immediate(imm));
            Ok(Mnemonic::Ret)
        }
        0xC3 => Ok(Mnemonic::Ret),
        0xC6 => {
            let modrm = b.modrm()?;
            let rm = b.rm_operand(modrm, 8)?;
            let imm = b.i8()? as i64;
            b.push_operand(rm);
            b.push_operand(Operand::Immediate(imm));
            Ok(Mnemonic::Mov)
        }
        0xC7 => {
            let width = b.operand_width();
            let modrm = b.modrm()?;
            let rm = b.rm_operand(modrm, width)?;
            let imm = b.immediate_sign_extended_32(width)?;
            b.push_operand(rm);
            b.push_operand(Operand::Immediate(imm));
            Ok(Mnemonic::Mov)
        }
        0xCC => Ok(Mnemonic::Int3),
        0xCD => {
            let imm = b.u8()? as i64;
            b.push_operand(Operand::Immediate(imm));
            Ok(Mnemonic::Int)
        }
        0xCE => Ok(Mnemonic::Into),
        0xD0 | 0xD1 => decode_shift_group(b, opcode, ShiftCount::One),
        0xD2 | 0xD3 => decode_shift_group(b, opcode, ShiftCount::Cl),
        0xE8 => {
            let rel = b.i32()? as i64;
            let target = b.rel_target(rel);
            b.push_operand(Operand::RelativeTarget(target));
            Ok(Mnemonic::Call)
        }
        0xE9 => {
            let rel = b.i32()? as i64;
            let target = b.rel_target(rel);
            b.push_operand(Operand::RelativeTarget(target));
            Ok(Mnemonic::Jmp)
        }
        0xEB => {
            let rel = b.i8()? as i64;
            let target = b.rel_target(rel);
            b.push_operand(Operand::RelativeTarget(target));
            Ok(Mnemonic::Jmp)
        }
        0xF4 => Ok(Mnemonic::Hlt),
        0xF6 => decode_group3(b, 8),
        0xF7 => {
            let width = b.operand_width();
            decode_group3(b, width)
        }
        0xFE => decode_group_inc_dec(b, 8),
        0xFF => {
            let width = b.operand_width();
            decode_group_ff(b, width)
        }
        _ => Err(DecodeError::UnrecognisedOpcode(opcode)),
    }
}

fn decode_modrm_dest_is_rm(b: &mut Builder, mnemonic: Mnemonic, width: u32) -> Result<Mnemonic, DecodeError> {
    let modrm = b.modrm()?;
    let rm = b.rm_operand(modrm, width)?;
    let reg = b.reg_field_gpr(modrm, width);
    b.push_operand(rm);
    b.push_operand(reg);
    Ok(mnemonic)
}

fn decode_modrm_dest_is_reg(b: &mut Builder, mnemonic: Mnemonic, width: u32) -> Result<Mnemonic, DecodeError> {
    let modrm = b.modrm()?;
    let reg = b.reg_field_gpr(modrm, width);
    let rm = b.rm_operand(modrm, width)?;
    b.push_operand(reg);
    b.push_operand(rm);
    Ok(mnemonic)
}

/// form 0/2: Eb/Gb, Ev/Gv (dest=rm); form 1/3: Gb/Gv, Eb/Ev (dest=reg);
/// form 4: AL,Ib; form 5: eAX,Iz. Shared by the eight ALU mnemonics.
fn decode_alu_form(b: &mut Builder, mnemonic: Mnemonic, form: u8) -> Result<Mnemonic, DecodeError> {
    match form {
        0x00 => decode_modrm_dest_is_rm(b, mnemonic, 8),
        0x01 => {
            let width = b.operand_width();
            decode_modrm_dest_is_rm(b, mnemonic, width)
        }
        0x02 => decode_modrm_dest_is_reg(b, mnemonic, 8),
        0x03 => {
            let width = b.operand_width();
            decode_modrm_dest_is_reg(b, mnemonic, width)
        }
        0x04 => {
            let imm = b.i8()? as i64;
            b.push_operand(b.gpr_operand(0, 8));
            b.push_operand(Operand::Immediate(imm));
            Ok(mnemonic)
        }
        0x05 => {
            let width = b.operand_width();
            let imm = b.immediate_sign_extended_32(width)?;
            b.push_operand(b.gpr_operand(0, width));
            b.push_operand(Operand::Immediate(imm));
            Ok(mnemonic)
        }
        _ => Err(DecodeError::UnrecognisedOpcode(form)),
    }
}

const GROUP1_MNEMONICS: [Mnemonic; 8] = [
    Mnemonic::Add,
    Mnemonic::Or,
    Mnemonic::Adc,
    Mnemonic::Sbb,
    Mnemonic::And,
    Mnemonic::Sub,
    Mnemonic::Xor,
    Mnemonic::Cmp,
];

fn decode_group1(b: &mut Builder, opcode: u8) -> Result<Mnemonic, DecodeError> {
    let width = if opcode == 0x80 { 8 } else { b.operand_width() };
    let modrm = b.modrm()?;
    let mnemonic = GROUP1_MNEMONICS[modrm.reg as usize];
    let rm = b.rm_operand(modrm, width)?;
    let imm = if opcode == 0x81 {
        b.immediate_sign_extended_32(width)?
    } else {
        b.i8()? as i64
    };
    b.push_operand(rm);
    b.push_operand(Operand::Immediate(imm));
    Ok(mnemonic)
}

enum ShiftCount {
    One,
    Cl,
    Immediate,
}

/// Group-2 shift/rotate `reg` field. `RCL`/`RCR` (2/3) carry the flags
/// register through the rotation and have no emitter in the dispatch list;
/// they are rejected rather than mislabelled as `ROL`/`ROR`.
fn shift_group_mnemonic(reg: u8) -> Result<Mnemonic, DecodeError> {
    match reg {
        0 => Ok(Mnemonic::Rol),
        1 => Ok(Mnemonic::Ror),
        4 | 6 => Ok(Mnemonic::Shl), // 6 is the undocumented SAL alias
        5 => Ok(Mnemonic::Shr),
        7 => Ok(Mnemonic::Sar),
        _ => Err(DecodeError::UnrecognisedOpcode(0xC0 | reg)),
    }
}

fn decode_shift_group(b: &mut Builder, opcode: u8, count: ShiftCount) -> Result<Mnemonic, DecodeError> {
    let width = if opcode & 0x01 == 0 { 8 } else { b.operand_width() };
    let modrm = b.modrm()?;
    let mnemonic = shift_group_mnemonic(modrm.reg)?;
    let rm = b.rm_operand(modrm, width)?;
    b.push_operand(rm);
    match count {
        ShiftCount::One => {}
        ShiftCount::Cl => b.push_operand(b.gpr_operand(1, 8)),
        ShiftCount::Immediate => {
            let imm = b.i8()? as i64;
            b.push_operand(Operand::Immediate(imm));
        }
    }
    Ok(mnemonic)
}

fn decode_group3(b: &mut Builder, width: u32) -> Result<Mnemonic, DecodeError> {
    let modrm = b.modrm()?;
    let rm = b.rm_operand(modrm, width)?;
    b.push_operand(rm);
    match modrm.reg {
        0 | 1 => {
            let imm = if width == 8 {
                b.i8()? as i64
            } else {
                b.immediate_sign_extended_32(width)?
            };
            b.push_operand(Operand::Immediate(imm));
            Ok(Mnemonic::Test)
        }
        2 => Ok(Mnemonic::Not),
        3 => Ok(Mnemonic::Neg),
        4 => Ok(Mnemonic::Mul),
        5 => Ok(Mnemonic::Imul),
        6 => Ok(Mnemonic::Div),
        _ => Ok(Mnemonic::Idiv),
    }
}

fn decode_group_inc_dec(b: &mut Builder, width: u32) -> Result<Mnemonic, DecodeError> {
    let modrm = b.modrm()?;
    let rm = b.rm_operand(modrm, width)?;
    b.push_operand(rm);
    match modrm.reg {
        0 => Ok(Mnemonic::Inc),
        1 => Ok(Mnemonic::Dec),
        _ => Err(DecodeError::UnrecognisedOpcode(0xFE)),
    }
}

fn decode_group_ff(b: &mut Builder, width: u32) -> Result<Mnemonic, DecodeError> {
    let modrm = b.modrm()?;
    match modrm.reg {
        0 => {
            let rm = b.rm_operand(modrm, width)?;
            b.push_operand(rm);
            Ok(Mnemonic::Inc)
        }
        1 => {
            let rm = b.rm_operand(modrm, width)?;
            b.push_operand(rm);
            Ok(Mnemonic::Dec)
        }
        2 | 3 => {
            let rm = b.rm_operand(modrm, b.stack_operand_width())?;
            b.push_operand(rm);
            Ok(Mnemonic::Call)
        }
        4 | 5 => {
            let rm = b.rm_operand(modrm, b.stack_operand_width())?;
            b.push_operand(rm);
            Ok(Mnemonic::Jmp)
        }
        6 => {
            let rm = b.rm_operand(modrm, b.stack_operand_width())?;
            b.push_operand(rm);
            Ok(Mnemonic::Push)
        }
        _ => Err(DecodeError::UnrecognisedOpcode(0xFF)),
    }
}

fn decode_two_byte_opcode(b: &mut Builder) -> Result<Mnemonic, DecodeError> {
    let opcode = b.u8()?;
    match opcode {
        0x05 => Ok(Mnemonic::Syscall),
        0x1F => {
            let width = b.operand_width();
            let modrm = b.modrm()?;
            let rm = b.rm_operand(modrm, width)?;
            b.push_operand(rm);
            Ok(Mnemonic::Nop)
        }
        0x0B => Ok(Mnemonic::Ud2),
        0x31 => Err(DecodeError::UnrecognisedTwoByteOpcode(opcode)),
        0x34 => Ok(Mnemonic::Sysenter),
        0x40..=0x4F => {
            let width = b.operand_width();
            let cc = ConditionCode::from_nibble(opcode & 0x0F);
            decode_modrm_dest_is_reg(b, Mnemonic::Cmovcc(cc), width)
        }
        0x6F => {
            // Legacy (non-VEX) MOVDQU/MOVDQA: kept as VMovdqu32's scalar
            // sibling is out of scope; this path only exists via EVEX in
            // this workspace, so treat bare 0F 6F as unrecognised.
            Err(DecodeError::UnrecognisedTwoByteOpcode(opcode))
        }
        0x77 => Ok(Mnemonic::Emms),
        0x80..=0x8F => {
            let rel = b.i32()? as i64;
            let target = b.rel_target(rel);
            b.push_operand(Operand::RelativeTarget(target));
            Ok(Mnemonic::Jcc(ConditionCode::from_nibble(opcode & 0x0F)))
        }
        0x90..=0x9F => {
            let cc = ConditionCode::from_nibble(opcode & 0x0F);
            let modrm = b.modrm()?;
            let rm = b.rm_operand(modrm, 8)?;
            b.push_operand(rm);
            Ok(Mnemonic::Setcc(cc))
        }
        0xA3 => decode_modrm_dest_is_rm_bt(b, Mnemonic::Bt),
        0xAB => decode_modrm_dest_is_rm_bt(b, Mnemonic::Bts),
        0xAE => {
            let modrm = b.modrm()?;
            match modrm.rm {
                0b101 => Ok(Mnemonic::Lfence),
                0b110 => Ok(Mnemonic::Mfence),
                0b111 => Ok(Mnemonic::Sfence),
                _ => Err(DecodeError::UnrecognisedTwoByteOpcode(opcode)),
            }
        }
        0xAF => {
            let width = b.operand_width();
            decode_modrm_dest_is_reg(b, Mnemonic::Imul, width)
        }
        0xB0 | 0xB1 => {
            let width = if opcode == 0xB0 { 8 } else { b.operand_width() };
            decode_modrm_dest_is_rm(b, Mnemonic::Cmpxchg, width)
        }
        0xB3 => decode_modrm_dest_is_rm_bt(b, Mnemonic::Btr),
        0xB8 => {
            let width = b.operand_width();
            decode_modrm_dest_is_reg(b, Mnemonic::Popcnt, width)
        }
        0xBB => decode_modrm_dest_is_rm_bt(b, Mnemonic::Btc),
        0xBC => {
            let width = b.operand_width();
            let mnemonic = if b.prefixes.rep {
                Mnemonic::Tzcnt
            } else {
                Mnemonic::Bsf
            };
            decode_modrm_dest_is_reg(b, mnemonic, width)
        }
        0xBD => {
            let width = b.operand_width();
            let mnemonic = if b.prefixes.rep {
                Mnemonic::Lzcnt
            } else {
                Mnemonic::Bsr
            };
            decode_modrm_dest_is_reg(b, mnemonic, width)
        }
        0xC8..=0xCF => {
            let encoding = (opcode - 0xC8) | ((b.rex_b() as u8) << 3);
            b.push_operand(b.gpr_operand(encoding, b.operand_width()));
            Ok(Mnemonic::Bswap)
        }
        _ => Err(DecodeError::UnrecognisedTwoByteOpcode(opcode)),
    }
}

fn decode_modrm_dest_is_rm_bt(b: &mut Builder, mnemonic: Mnemonic) -> Result<Mnemonic, DecodeError> {
    let width = b.operand_width();
    decode_modrm_dest_is_rm(b, mnemonic, width)
}
