//! Per-architecture guest register files (§4.4): the offset/type map every
//! lifter consults instead of hard-coding numeric register offsets.

mod amd64;
mod arm;
mod cc_op;
mod error;
mod gpr;
mod state;
mod x86;

pub use amd64::Amd64GuestState;
pub use arm::ArmGuestState;
pub use cc_op::CcOp;
pub use error::GuestStateError;
pub use gpr::Gpr;
pub use state::GuestState;
pub use x86::X86GuestState;

/// Which concrete guest-state/decoder/lifter triple a caller wants. ARM is
/// listed for [`GuestState`] completeness but has no decoder or lifter in
/// this workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuestArch {
    X86,
    Amd64,
    Arm,
}

impl GuestArch {
    pub const fn is_64_bit(self) -> bool {
        matches!(self, GuestArch::Amd64)
    }
}
