//! Lifter-level error type (§7): wraps decoder, IR-construction, and
//! guest-state failures behind one enum, plus the lifter's own conditions.

use thiserror::Error;
use vexlift_decoder::DecodeError;
use vexlift_guest::GuestStateError;
use vexlift_ir::{IrError, SanityFailure};

#[derive(Debug, Error, PartialEq)]
pub enum LiftError {
    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("IR construction failed: {0}")]
    Ir(#[from] IrError),

    #[error("guest state error: {0}")]
    GuestState(#[from] GuestStateError),

    /// The completed block failed [`vexlift_ir::sanity_check`]. With
    /// `require_flatness` off this only fires on a genuine lifter bug
    /// (use-before-def, a mistyped temp); with it on, a block whose
    /// emitters hoisted a computed value into a temp also lands here.
    #[error("sanity check failed: {0}")]
    Sanity(#[from] SanityFailure),

    /// A decoded mnemonic/operand-width combination has no emitter. Raised
    /// instead of producing stub IR (§9, Open Question b).
    #[error("no lifter support for {mnemonic} ({detail})")]
    Unimplemented {
        mnemonic: &'static str,
        detail: &'static str,
    },

    /// The lifter's own address arithmetic or operand shape assumptions
    /// were violated by a decoded instruction (e.g. an operand count the
    /// dispatch table didn't expect).
    #[error("lift failed at 0x{address:x}: {reason}")]
    LiftFailure { address: u64, reason: &'static str },
}
