//! IR atoms (component B): the small closed vocabularies expressions and
//! statements are built from, beyond the operation catalogue in [`crate::op`].

use std::fmt;
use vexlift_types::IrType;

/// A circularly-indexed guest-register array descriptor, used by `GetI`/
/// `PutI` for register files the guest addresses modulo `n` (e.g. the x87
/// FP stack, or AArch64 vector register banks addressed by a rotating
/// index). The effective index is `(ix + bias) mod n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegArray {
    /// Byte offset of element 0 in guest-state.
    pub base: u32,
    pub elem_type: IrType,
    pub n: u32,
}

impl fmt::Display for RegArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}x{}", self.base, self.n, self.elem_type)
    }
}

/// A reference to a pure (`CCall`) or side-effecting (`Dirty`) helper
/// function. The IR never inlines the helper's body: it is an opaque,
/// named call target resolved by the consumer (simulator/JIT backend).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallTarget {
    pub name: std::borrow::Cow<'static, str>,
}

impl CallTarget {
    pub fn new(name: impl Into<std::borrow::Cow<'static, str>>) -> Self {
        Self { name: name.into() }
    }
}

impl fmt::Display for CallTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// How a super-block's final control transfer should be interpreted by the
/// consumer (§3 IRSB invariants).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum JumpKind {
    Boring,
    Call,
    Ret,
    ClientReq,
    Yield,
    EmWarn,
    EmFail,
    NoDecode,
    MapFail,
    InvalICache,
    InvalDCache,
    NoRedir,
    SigIll,
    SigTrap,
    SigSegv,
    SigBus,
    SigFpe,
    Privileged,
    SysInt,
    SysSyscall,
    SysSysenter,
}

impl fmt::Display for JumpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JumpKind::Boring => "Boring",
            JumpKind::Call => "Call",
            JumpKind::Ret => "Ret",
            JumpKind::ClientReq => "ClientReq",
            JumpKind::Yield => "Yield",
            JumpKind::EmWarn => "EmWarn",
            JumpKind::EmFail => "EmFail",
            JumpKind::NoDecode => "NoDecode",
            JumpKind::MapFail => "MapFail",
            JumpKind::InvalICache => "InvalICache",
            JumpKind::InvalDCache => "InvalDCache",
            JumpKind::NoRedir => "NoRedir",
            JumpKind::SigIll => "SigILL",
            JumpKind::SigTrap => "SigTRAP",
            JumpKind::SigSegv => "SigSEGV",
            JumpKind::SigBus => "SigBUS",
            JumpKind::SigFpe => "SigFPE",
            JumpKind::Privileged => "Privileged",
            JumpKind::SysInt => "Sys_int",
            JumpKind::SysSyscall => "Sys_syscall",
            JumpKind::SysSysenter => "Sys_sysenter",
        };
        f.write_str(s)
    }
}

/// A memory-bus side effect that is neither a load nor a store (§3 `MBE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryBusEvent {
    Fence,
    CancelReservation,
}

impl fmt::Display for MemoryBusEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryBusEvent::Fence => write!(f, "MBusEvent-Fence"),
            MemoryBusEvent::CancelReservation => write!(f, "MBusEvent-CancelReservation"),
        }
    }
}

/// The memory-effect class of a `Dirty` call (§3), describing what access
/// pattern the consumer should assume the helper performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirtyMemFx {
    None,
    Read,
    Write,
    Modify,
}
