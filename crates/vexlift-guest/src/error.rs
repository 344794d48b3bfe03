use thiserror::Error;

/// Errors raised while resolving a named guest register.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum GuestStateError {
    #[error("unknown register: {0}")]
    UnknownRegister(String),
}
