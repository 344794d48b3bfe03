use thiserror::Error;
use vexlift_types::IrType;

/// Errors raised while constructing or validating IR nodes.
///
/// These are programmer errors (§7 of the design): a lifter that trips one
/// of these has a bug, so callers are expected to propagate them immediately
/// rather than retry.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum IrError {
    #[error("invalid operand: {0}")]
    InvalidOperand(&'static str),

    #[error("operator {op:?} expects arity {expected} but got {actual}")]
    OpArityMismatch {
        op: crate::op::IrOp,
        expected: u8,
        actual: u8,
    },

    #[error("malformed atomic: {0}")]
    MalformedAtomic(&'static str),

    #[error("temp t{0} is out of bounds for this type environment")]
    UnboundTemp(u32),

    #[error("unknown register: {0}")]
    UnknownRegister(String),
}

/// A structural invariant failure discovered by the sanity checker (§4.7).
#[derive(Debug, Error, PartialEq, Eq, Clone)]
#[error("sanity check failed at {where_}: {reason}")]
pub struct SanityFailure {
    pub where_: String,
    pub reason: String,
}

impl SanityFailure {
    pub fn new(where_: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            where_: where_.into(),
            reason: reason.into(),
        }
    }
}

/// Mismatch between an expected and an actually-derived [`IrType`], used by
/// both construction-time checks and the sanity checker.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
#[error("expected type {expected} but found {actual}")]
pub struct TypeMismatch {
    pub expected: IrType,
    pub actual: IrType,
}

/// Everything that can go wrong while deriving the type of an expression or
/// statement (§4.7): either an `IrError` surfaced through an ill-formed
/// temp/register reference, or a genuine type mismatch between sub-terms.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum TypeError {
    #[error(transparent)]
    Construction(#[from] IrError),
    #[error(transparent)]
    Mismatch(#[from] TypeMismatch),
}
