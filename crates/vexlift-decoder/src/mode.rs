/// Decode mode: which default operand/address width and prefix legality
/// apply. Bit64 additionally permits REX and makes push/pop/call/ret/jcc
/// default to a 64-bit operand size regardless of the 0x66 prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodeMode {
    Bits16,
    Bits32,
    Bits64,
}

impl DecodeMode {
    pub const fn is_64_bit(self) -> bool {
        matches!(self, DecodeMode::Bits64)
    }

    pub const fn default_operand_width(self) -> u32 {
        match self {
            DecodeMode::Bits16 => 16,
            DecodeMode::Bits32 => 32,
            DecodeMode::Bits64 => 32,
        }
    }

    pub const fn default_address_width(self) -> u32 {
        match self {
            DecodeMode::Bits16 => 16,
            DecodeMode::Bits32 => 32,
            DecodeMode::Bits64 => 64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Segment {
    Cs,
    Ss,
    Ds,
    Es,
    Fs,
    Gs,
}

impl Segment {
    pub(crate) fn from_prefix_byte(byte: u8) -> Option<Self> {
        match byte {
            0x2E => Some(Segment::Cs),
            0x36 => Some(Segment::Ss),
            0x3E => Some(Segment::Ds),
            0x26 => Some(Segment::Es),
            0x64 => Some(Segment::Fs),
            0x65 => Some(Segment::Gs),
            _ => None,
        }
    }
}
