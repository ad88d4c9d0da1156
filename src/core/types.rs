use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable index of a particle inside its owning system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticleId(pub usize);

impl ParticleId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ParticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "particle#{}", self.0)
    }
}

/// Stable index of a spring inside its owning system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpringId(pub usize);

impl SpringId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for SpringId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "spring#{}", self.0)
    }
}
