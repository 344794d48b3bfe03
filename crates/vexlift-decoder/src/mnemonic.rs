use crate::condition::ConditionCode;

/// The instruction classes the lifter's per-mnemonic dispatch (§4.6) switches
/// on. Coverage matches the dispatch list named there; exotic or privileged
/// forms outside it are rejected by the decoder with
/// [`crate::DecodeError::UnrecognisedOpcode`] rather than silently mistyped,
/// per the "completeness of the instruction set is out of scope" Non-goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mnemonic {
    Mov,
    Add,
    Sub,
    Cmp,
    Test,
    And,
    Or,
    Xor,
    Adc,
    Sbb,
    Shl,
    Shr,
    Sar,
    Rol,
    Ror,
    Inc,
    Dec,
    Neg,
    Not,
    Mul,
    Imul,
    Div,
    Idiv,
    Lea,
    Xchg,
    Cmpxchg,
    Push,
    Pop,
    Call,
    Ret,
    Jmp,
    Jcc(ConditionCode),
    Cmovcc(ConditionCode),
    Setcc(ConditionCode),
    Bt,
    Bts,
    Btr,
    Btc,
    Bsf,
    Bsr,
    Bswap,
    Popcnt,
    Lzcnt,
    Tzcnt,
    Nop,
    Ud2,
    Int3,
    Int,
    Into,
    Hlt,
    Syscall,
    Sysenter,
    Emms,
    Mfence,
    Lfence,
    Sfence,
    /// `VMOVDQU32`, the EVEX scenario mnemonic from §8.
    VMovdqu32,
}

impl Mnemonic {
    /// Opcodes the lifter treats as basic-block terminators, per the
    /// terminator rules table.
    pub const fn is_terminator_candidate(self) -> bool {
        matches!(
            self,
            Mnemonic::Ret
                | Mnemonic::Call
                | Mnemonic::Jmp
                | Mnemonic::Jcc(_)
                | Mnemonic::Int
                | Mnemonic::Int3
                | Mnemonic::Into
                | Mnemonic::Hlt
                | Mnemonic::Syscall
                | Mnemonic::Sysenter
                | Mnemonic::Ud2
        )
    }
}
