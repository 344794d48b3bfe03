//! The intermediate representation: expressions, statements, super-blocks,
//! and the sanity checker that validates them (§3-§4, §6-§7).

mod atoms;
mod constant;
mod error;
mod expr;
mod op;
mod sanity;
mod sb;
mod stmt;
mod temp;

pub use atoms::{CallTarget, DirtyMemFx, JumpKind, MemoryBusEvent, RegArray};
pub use constant::IrConst;
pub use error::{IrError, SanityFailure, TypeError, TypeMismatch};
pub use expr::IrExpr;
pub use op::{IntBinKind, IrOp};
pub use sanity::sanity_check;
pub use sb::IrSb;
pub use stmt::{IrStmt, LoadGConv};
pub use temp::{IrTemp, IrTypeEnv};
