//! x86/AMD64 basic-block lifter (§4.6): turns a byte slice into an [`IrSb`]
//! by decoding instructions one at a time and handing each to a per-mnemonic
//! emitter.
//!
//! [`Lifter::lift_basic_block`] is the entry point. It is generic over
//! [`X86Guest`], implemented only for [`vexlift_guest::X86GuestState`] and
//! [`vexlift_guest::Amd64GuestState`] — a guest this crate has no decoder
//! mode for (e.g. ARM) simply can't name a `Lifter<G>` that type-checks.

mod arith;
mod config;
mod control;
mod error;
mod lifter;
mod registers;
mod simd;
mod stack;

pub use config::LiftConfig;
pub use error::LiftError;
pub use lifter::{Lifter, X86Guest};
pub use vexlift_ir::IrSb;
