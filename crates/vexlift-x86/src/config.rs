//! Lifter configuration (§4.6 Limits, §9 Open Question a).

/// Tunables for a single [`crate::Lifter`]. Construct with [`LiftConfig::default`]
/// and override fields with the builder methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiftConfig {
    max_instructions: u32,
    max_bytes: u32,
    require_flatness: bool,
    jcc_is_terminator: bool,
}

impl Default for LiftConfig {
    fn default() -> Self {
        Self {
            max_instructions: 50,
            max_bytes: 500,
            require_flatness: false,
            jcc_is_terminator: true,
        }
    }
}

impl LiftConfig {
    pub fn max_instructions(&self) -> u32 {
        self.max_instructions
    }

    pub fn with_max_instructions(mut self, n: u32) -> Self {
        self.max_instructions = n;
        self
    }

    pub fn max_bytes(&self) -> u32 {
        self.max_bytes
    }

    pub fn with_max_bytes(mut self, n: u32) -> Self {
        self.max_bytes = n;
        self
    }

    pub fn require_flatness(&self) -> bool {
        self.require_flatness
    }

    pub fn with_require_flatness(mut self, flat: bool) -> Self {
        self.require_flatness = flat;
        self
    }

    /// Default `true`: a conditional jump ends the block, emitting both the
    /// `Exit` to the taken target and a `Boring` fall-through `next`.
    /// `false` keeps lifting past the `Jcc`, leaving only the `Exit`
    /// statement to record the taken path.
    pub fn jcc_is_terminator(&self) -> bool {
        self.jcc_is_terminator
    }

    pub fn with_jcc_is_terminator(mut self, terminator: bool) -> Self {
        self.jcc_is_terminator = terminator;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_limits() {
        let cfg = LiftConfig::default();
        assert_eq!(cfg.max_instructions(), 50);
        assert_eq!(cfg.max_bytes(), 500);
        assert!(!cfg.require_flatness());
        assert!(cfg.jcc_is_terminator());
    }

    #[test]
    fn builder_methods_override_individual_fields() {
        let cfg = LiftConfig::default()
            .with_max_instructions(4)
            .with_jcc_is_terminator(false);
        assert_eq!(cfg.max_instructions(), 4);
        assert!(!cfg.jcc_is_terminator());
        assert_eq!(cfg.max_bytes(), 500);
    }
}
