use crate::error::DecodeError;
use crate::mode::{DecodeMode, Segment};

/// Legacy prefixes (§4.5 step 1): segment overrides, operand-size `66`,
/// address-size `67`, lock `F0`, repeat `F2`/`F3`. Duplicate prefixes of the
/// same kind collapse to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Prefixes {
    pub lock: bool,
    pub rep: bool,
    pub repne: bool,
    pub operand_size_override: bool,
    pub address_size_override: bool,
    pub segment: Option<Segment>,
}

/// Scan the legacy prefix run at the start of `bytes`, returning the
/// collapsed prefix set and the number of bytes it consumed.
pub fn scan_prefixes(_mode: DecodeMode, bytes: &[u8]) -> Result<(Prefixes, usize), DecodeError> {
    let mut prefixes = Prefixes::default();
    let mut consumed = 0usize;

    while consumed < bytes.len() && consumed < crate::MAX_INSTRUCTION_LEN {
        match bytes[consumed] {
            0xF0 => prefixes.lock = true,
            0xF2 => {
                prefixes.repne = true;
                prefixes.rep = false;
            }
            0xF3 => {
                prefixes.rep = true;
                prefixes.repne = false;
            }
            0x66 => prefixes.operand_size_override = true,
            0x67 => prefixes.address_size_override = true,
            b if Segment::from_prefix_byte(b).is_some() => {
                prefixes.segment = Segment::from_prefix_byte(b);
            }
            _ => break,
        }
        consumed += 1;
    }

    if consumed >= crate::MAX_INSTRUCTION_LEN {
        return Err(DecodeError::InvalidInstruction);
    }

    Ok((prefixes, consumed))
}
