use thiserror::Error;

/// DecodeFailure (§7): unrecognised opcode or truncated input mid-instruction.
/// The lifter's response to any of these is to stop the basic block cleanly,
/// never to propagate as an exceptional condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("instruction truncated: needed more bytes than the input provided")]
    NeedMoreBytes,
    #[error("instruction exceeds the architectural 15-byte maximum length")]
    InvalidInstruction,
    #[error("unrecognised opcode at byte {0:#04x}")]
    UnrecognisedOpcode(u8),
    #[error("unrecognised two-byte opcode 0F {0:#04x}")]
    UnrecognisedTwoByteOpcode(u8),
    #[error("ModR/M byte required but not present")]
    MissingModRm,
    #[error("mutually exclusive prefix forms present (VEX/EVEX/REX overlap)")]
    ConflictingPrefixForms,
}
