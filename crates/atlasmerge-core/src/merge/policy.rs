//! Overlap precedence between atlases.

use std::fmt;

/// Which atlas keeps a voxel labelled by more than one input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlapPolicy {
    /// Later atlases only fill voxels that are still background.
    #[default]
    FirstWins,
    /// Later atlases overwrite whatever is already there.
    LastWins,
}

impl fmt::Display for OverlapPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverlapPolicy::FirstWins => write!(f, "first-wins"),
            OverlapPolicy::LastWins => write!(f, "last-wins"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_first_wins() {
        assert_eq!(OverlapPolicy::default(), OverlapPolicy::FirstWins);
        assert_eq!(OverlapPolicy::LastWins.to_string(), "last-wins");
    }
}
