//! Primitive value kinds and fixed-width vector containers shared by every
//! other crate in the workspace.
//!
//! This crate has no dependencies and performs no I/O: it is pure data and
//! arithmetic, the same role the teacher workspace's primitive-types crate
//! plays for its own JIT IR (`aero-types`).

use std::fmt;

/// The shape of any value that can live in guest-state, in memory, or in an
/// IR temporary.
///
/// Every variant has a fixed size in bytes (`I1` occupies a full byte of
/// storage even though it represents a single bit of meaning) — see
/// [`IrType::size_bytes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[non_exhaustive]
pub enum IrType {
    /// Reserved; never a legal operand/result type. Lifters must not emit it.
    Invalid,
    I1,
    I8,
    I16,
    I32,
    I64,
    I128,
    F16,
    F32,
    F64,
    F128,
    D32,
    D64,
    D128,
    V128,
    V256,
    V512,
}

impl IrType {
    /// Size in bytes that a value of this type occupies in guest-state or
    /// memory. `I1` is stored in a full byte.
    pub const fn size_bytes(self) -> usize {
        match self {
            IrType::Invalid => 0,
            IrType::I1 | IrType::I8 => 1,
            IrType::I16 | IrType::F16 => 2,
            IrType::I32 | IrType::F32 | IrType::D32 => 4,
            IrType::I64 | IrType::F64 | IrType::D64 => 8,
            IrType::I128 | IrType::F128 | IrType::D128 => 16,
            IrType::V128 => 16,
            IrType::V256 => 32,
            IrType::V512 => 64,
        }
    }

    /// Size in bits of the *meaningful* payload (distinct from storage size
    /// only for `I1`, which is 1 bit stored in 1 byte).
    pub const fn size_bits(self) -> usize {
        match self {
            IrType::I1 => 1,
            other => other.size_bytes() * 8,
        }
    }

    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            IrType::I1 | IrType::I8 | IrType::I16 | IrType::I32 | IrType::I64 | IrType::I128
        )
    }

    pub const fn is_float(self) -> bool {
        matches!(self, IrType::F16 | IrType::F32 | IrType::F64 | IrType::F128)
    }

    pub const fn is_decimal(self) -> bool {
        matches!(self, IrType::D32 | IrType::D64 | IrType::D128)
    }

    pub const fn is_vector(self) -> bool {
        matches!(self, IrType::V128 | IrType::V256 | IrType::V512)
    }

    pub const fn is_valid(self) -> bool {
        !matches!(self, IrType::Invalid)
    }

    /// The guest word type for a given pointer width, used to type `IRSB::next`
    /// and the stack pointer.
    pub const fn word_type(bits64: bool) -> IrType {
        if bits64 {
            IrType::I64
        } else {
            IrType::I32
        }
    }
}

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IrType::Invalid => "INVALID",
            IrType::I1 => "I1",
            IrType::I8 => "I8",
            IrType::I16 => "I16",
            IrType::I32 => "I32",
            IrType::I64 => "I64",
            IrType::I128 => "I128",
            IrType::F16 => "F16",
            IrType::F32 => "F32",
            IrType::F64 => "F64",
            IrType::F128 => "F128",
            IrType::D32 => "D32",
            IrType::D64 => "D64",
            IrType::D128 => "D128",
            IrType::V128 => "V128",
            IrType::V256 => "V256",
            IrType::V512 => "V512",
        };
        f.write_str(s)
    }
}

/// Guest/IR endianness for a memory access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endness {
    Little,
    Big,
}

impl Endness {
    pub const fn tag(self) -> &'static str {
        match self {
            Endness::Little => "le",
            Endness::Big => "be",
        }
    }
}

/// A fixed-size byte-addressable vector value, generic over its byte width.
///
/// Used both for guest-state SIMD registers (XMM/YMM/ZMM) and for `V128`/
/// `V256`/`V512` constant payloads.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct VecBytes<const N: usize>(pub [u8; N]);

pub type V128 = VecBytes<16>;
pub type V256 = VecBytes<32>;
pub type V512 = VecBytes<64>;

impl<const N: usize> VecBytes<N> {
    pub const fn zero() -> Self {
        Self([0u8; N])
    }

    pub const fn from_bytes(bytes: [u8; N]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; N] {
        &self.0
    }

    pub fn words(&self) -> Vec<u16> {
        self.0
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect()
    }

    pub fn dwords(&self) -> Vec<u32> {
        self.0
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes(c.try_into().unwrap()))
            .collect()
    }

    pub fn qwords(&self) -> Vec<u64> {
        self.0
            .chunks_exact(8)
            .map(|c| u64::from_le_bytes(c.try_into().unwrap()))
            .collect()
    }

    /// Byte-mask expansion matching VEX's constant encoding: a short integer
    /// "seed" is repeated across the full vector width, not stored as a
    /// genuine `N`-byte payload. This is the representation `IRConst` uses
    /// for `V128`/`V256`/`V512` literals (design note, spec §9.c); general
    /// guest-state vector registers use [`VecBytes::from_bytes`] instead.
    pub fn from_seed_bytes(seed: &[u8]) -> Self {
        let mut out = [0u8; N];
        for (i, b) in out.iter_mut().enumerate() {
            *b = seed[i % seed.len()];
        }
        Self(out)
    }
}

impl VecBytes<16> {
    /// Construct from the 16-bit seed VEX stores for a `V128` constant.
    pub fn from_seed16(seed: u16) -> Self {
        Self::from_seed_bytes(&seed.to_le_bytes())
    }
}

impl VecBytes<32> {
    /// Construct from the 32-bit seed VEX stores for a `V256` constant.
    pub fn from_seed32(seed: u32) -> Self {
        Self::from_seed_bytes(&seed.to_le_bytes())
    }
}

impl VecBytes<64> {
    /// Construct from the 64-bit seed VEX stores for a `V512` constant.
    pub fn from_seed64(seed: u64) -> Self {
        Self::from_seed_bytes(&seed.to_le_bytes())
    }
}

impl<const N: usize> fmt::Debug for VecBytes<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VecBytes<{}>(0x", N)?;
        for b in self.0.iter().rev() {
            write!(f, "{:02x}", b)?;
        }
        write!(f, ")")
    }
}

impl<const N: usize> Default for VecBytes<N> {
    fn default() -> Self {
        Self::zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_sizes_match_spec() {
        assert_eq!(IrType::I1.size_bytes(), 1);
        assert_eq!(IrType::I1.size_bits(), 1);
        assert_eq!(IrType::I8.size_bytes(), 1);
        assert_eq!(IrType::I16.size_bytes(), 2);
        assert_eq!(IrType::I32.size_bytes(), 4);
        assert_eq!(IrType::I64.size_bytes(), 8);
        assert_eq!(IrType::I128.size_bytes(), 16);
        assert_eq!(IrType::V128.size_bytes(), 16);
        assert_eq!(IrType::V256.size_bytes(), 32);
        assert_eq!(IrType::V512.size_bytes(), 64);
    }

    #[test]
    fn display_matches_pretty_print_grammar() {
        assert_eq!(IrType::I1.to_string(), "I1");
        assert_eq!(IrType::V512.to_string(), "V512");
        assert_eq!(IrType::D128.to_string(), "D128");
    }

    #[test]
    fn word_type_selects_guest_pointer_width() {
        assert_eq!(IrType::word_type(true), IrType::I64);
        assert_eq!(IrType::word_type(false), IrType::I32);
    }

    #[test]
    fn seed_expansion_repeats_across_full_width() {
        let v = V128::from_seed16(0x1234);
        let bytes = v.as_bytes();
        assert_eq!(&bytes[0..2], &0x1234u16.to_le_bytes());
        assert_eq!(&bytes[2..4], &0x1234u16.to_le_bytes());
        assert_eq!(bytes.len(), 16);
    }

    #[test]
    fn dword_view_round_trips() {
        let mut bytes = [0u8; 32];
        bytes[0..4].copy_from_slice(&42u32.to_le_bytes());
        bytes[4..8].copy_from_slice(&7u32.to_le_bytes());
        let v = V256::from_bytes(bytes);
        let dwords = v.dwords();
        assert_eq!(dwords[0], 42);
        assert_eq!(dwords[1], 7);
    }
}
