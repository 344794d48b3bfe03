//! SSA temporaries ([`IrTemp`]) and their enclosing type environment
//! ([`IrTypeEnv`]) — §3, §4.3.

use std::fmt;
use vexlift_types::IrType;

use crate::error::IrError;

/// An SSA handle: either a dense index into the enclosing [`IrTypeEnv`], or
/// the sentinel "invalid" value used as a placeholder before a temp has been
/// allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IrTemp(Option<u32>);

impl IrTemp {
    pub const INVALID: IrTemp = IrTemp(None);

    pub const fn new(index: u32) -> Self {
        IrTemp(Some(index))
    }

    pub const fn is_valid(self) -> bool {
        self.0.is_some()
    }

    /// The dense index, or `None` for [`IrTemp::INVALID`].
    pub const fn index(self) -> Option<u32> {
        self.0
    }
}

impl fmt::Display for IrTemp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(i) => write!(f, "t{i}"),
            None => write!(f, "t_INVALID"),
        }
    }
}

/// Maps each SSA temp index (0..N, strictly dense) to its declared
/// [`IrType`]. Owned exclusively by one [`crate::sb::IrSb`]; append-only
/// during lifting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IrTypeEnv {
    types: Vec<IrType>,
}

impl IrTypeEnv {
    pub fn new() -> Self {
        Self { types: Vec::new() }
    }

    /// Number of temps declared so far.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Allocate a fresh temp of type `ty`. The returned temp's index equals
    /// the environment's length *before* this call, so indices are strictly
    /// dense 0..N-1.
    pub fn new_temp(&mut self, ty: IrType) -> IrTemp {
        let idx = self.types.len() as u32;
        self.types.push(ty);
        IrTemp::new(idx)
    }

    /// Look up the declared type of `temp`. Fails with [`IrError::UnboundTemp`]
    /// if `temp` is invalid or out of range.
    pub fn get_type(&self, temp: IrTemp) -> Result<IrType, IrError> {
        match temp.index() {
            Some(i) => self
                .types
                .get(i as usize)
                .copied()
                .ok_or(IrError::UnboundTemp(i)),
            None => Err(IrError::UnboundTemp(u32::MAX)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (IrTemp, IrType)> + '_ {
        self.types
            .iter()
            .enumerate()
            .map(|(i, &ty)| (IrTemp::new(i as u32), ty))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temps_are_strictly_dense() {
        let mut env = IrTypeEnv::new();
        let t0 = env.new_temp(IrType::I32);
        let t1 = env.new_temp(IrType::I64);
        assert_eq!(t0.index(), Some(0));
        assert_eq!(t1.index(), Some(1));
        assert_eq!(env.len(), 2);
    }

    #[test]
    fn out_of_range_lookup_fails_with_unbound_temp() {
        let env = IrTypeEnv::new();
        let err = env.get_type(IrTemp::new(0)).unwrap_err();
        assert_eq!(err, IrError::UnboundTemp(0));
    }

    #[test]
    fn invalid_temp_prints_sentinel() {
        assert_eq!(IrTemp::INVALID.to_string(), "t_INVALID");
        assert_eq!(IrTemp::new(7).to_string(), "t7");
    }

    #[test]
    fn deep_copy_is_independent() {
        let mut env = IrTypeEnv::new();
        env.new_temp(IrType::I8);
        let mut copy = env.clone();
        copy.new_temp(IrType::I16);
        assert_eq!(env.len(), 1);
        assert_eq!(copy.len(), 2);
    }
}
