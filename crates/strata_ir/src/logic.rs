//! Three-state logic values for gate-level netlists.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single logic value on a gate-level net.
///
/// `X` stands in for "unknown / don't care" and is the value of every
/// flip-flop that carries no initial-value annotation.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[repr(u8)]
pub enum Logic {
    /// Logic low (0).
    Zero = 0,
    /// Logic high (1).
    One = 1,
    /// Unknown or don't-care.
    X = 2,
}

impl Logic {
    /// Converts a character to a [`Logic`] value.
    ///
    /// Accepts '0', '1' and 'x'/'X'.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '0' => Some(Logic::Zero),
            '1' => Some(Logic::One),
            'x' | 'X' => Some(Logic::X),
            _ => None,
        }
    }

    /// Returns `true` for a driven 0 or 1, `false` for `X`.
    pub fn is_definite(self) -> bool {
        !matches!(self, Logic::X)
    }
}

impl fmt::Display for Logic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Logic::Zero => write!(f, "0"),
            Logic::One => write!(f, "1"),
            Logic::X => write!(f, "x"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_char_accepts_all_states() {
        assert_eq!(Logic::from_char('0'), Some(Logic::Zero));
        assert_eq!(Logic::from_char('1'), Some(Logic::One));
        assert_eq!(Logic::from_char('x'), Some(Logic::X));
        assert_eq!(Logic::from_char('X'), Some(Logic::X));
        assert_eq!(Logic::from_char('z'), None);
    }

    #[test]
    fn definiteness() {
        assert!(Logic::Zero.is_definite());
        assert!(Logic::One.is_definite());
        assert!(!Logic::X.is_definite());
    }

    #[test]
    fn display() {
        assert_eq!(format!("{}{}{}", Logic::One, Logic::Zero, Logic::X), "10x");
    }
}
