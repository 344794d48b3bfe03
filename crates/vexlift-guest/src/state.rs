use std::fmt;
use vexlift_types::IrType;

use crate::error::GuestStateError;

/// A per-architecture guest register file (§4.4): a flat, offset-addressed
/// record that the lifter consults for every `Get`/`Put` it emits. The
/// offset table is the single source of truth — lifters must never hard-code
/// a numeric offset.
pub trait GuestState: Clone + fmt::Debug {
    /// Width of a native machine word for this guest (`I32`/`I64`); also the
    /// type of `IRSB::next`.
    fn word_type(&self) -> IrType;

    /// Width of the instruction pointer register. Equal to [`Self::word_type`]
    /// for every architecture this crate models.
    fn ip_type(&self) -> IrType {
        self.word_type()
    }

    /// Byte offset of `name` within this guest-state record. Lookup is
    /// ASCII-case-insensitive; unknown or out-of-range names (`FPREG99`)
    /// fail with [`GuestStateError::UnknownRegister`].
    fn register_offset(&self, name: &str) -> Result<u32, GuestStateError>;

    /// Declared [`IrType`] of `name`.
    fn register_type(&self, name: &str) -> Result<IrType, GuestStateError>;

    /// True iff `[lo, hi)` overlaps the stack-pointer word, guiding a
    /// consumer's memory-reordering discipline around precise exceptions.
    fn requires_precise_memory_exceptions(&self, lo: u32, hi: u32) -> bool;

    /// An independent copy sharing no mutable state with `self`.
    fn deep_copy(&self) -> Self
    where
        Self: Sized,
    {
        self.clone()
    }
}
