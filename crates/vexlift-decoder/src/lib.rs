//! Hand-written x86/AMD64 instruction decoder (§4.5): no decode backend
//! dependency, so the hot path never allocates. `iced-x86`/`capstone` are
//! dev-only oracles for differential testing, never linked into a release
//! build of this crate.

mod condition;
mod error;
mod evex;
mod instruction;
mod mnemonic;
mod mode;
mod modrm;
mod operand;
mod prefixes;
mod rex;
mod vex;

pub use condition::ConditionCode;
pub use error::DecodeError;
pub use evex::Evex;
pub use instruction::{decode_instruction, decode_one, decode_prefixes, Instruction, MAX_INSTRUCTION_LEN};
pub use mnemonic::Mnemonic;
pub use mode::{DecodeMode, Segment};
pub use modrm::{ModRm, Sib};
pub use operand::{MemoryOperand, Operand, MAX_OPERANDS};
pub use prefixes::{scan_prefixes, Prefixes};
pub use rex::Rex;
pub use vex::Vex;
