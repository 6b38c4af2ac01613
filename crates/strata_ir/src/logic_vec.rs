//! Vectors of logic values, used for initial values and LUT truth tables.

use crate::logic::Logic;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A fixed-width vector of [`Logic`] values.
///
/// Index 0 is the least significant bit. Used for per-wire initial values and
/// for LUT contents (bit `i` of the vector is the output for input pattern
/// `i`).
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogicVec {
    bits: Vec<Logic>,
}

impl LogicVec {
    /// Creates a vector of the given width, initialized to all `X`.
    pub fn filled_x(width: u32) -> Self {
        Self {
            bits: vec![Logic::X; width as usize],
        }
    }

    /// Creates a vector from individual bits, LSB first.
    pub fn from_bits(bits: Vec<Logic>) -> Self {
        Self { bits }
    }

    /// Returns the number of logic values in this vector.
    pub fn width(&self) -> u32 {
        self.bits.len() as u32
    }

    /// Gets the logic value at the given index.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.width()`.
    pub fn get(&self, index: u32) -> Logic {
        self.bits[index as usize]
    }

    /// Sets the logic value at the given index.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.width()`.
    pub fn set(&mut self, index: u32, value: Logic) {
        self.bits[index as usize] = value;
    }

    /// Iterates over bits, LSB first.
    pub fn iter(&self) -> impl Iterator<Item = Logic> + '_ {
        self.bits.iter().copied()
    }

    /// Parses a binary string like `"10x1"` into a vector.
    ///
    /// The leftmost character is the most significant bit. Returns `None` if
    /// the string contains characters outside `0`/`1`/`x`.
    pub fn from_binary_str(s: &str) -> Option<Self> {
        let mut bits = Vec::with_capacity(s.len());
        for c in s.chars().rev() {
            bits.push(Logic::from_char(c)?);
        }
        Some(Self { bits })
    }

    /// Converts to a `u64`, if every bit is a definite 0 or 1 and the width
    /// fits.
    pub fn to_u64(&self) -> Option<u64> {
        if self.width() > 64 {
            return None;
        }
        let mut result = 0u64;
        for (i, bit) in self.bits.iter().enumerate() {
            match bit {
                Logic::Zero => {}
                Logic::One => result |= 1 << i,
                Logic::X => return None,
            }
        }
        Some(result)
    }
}

impl fmt::Display for LogicVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in self.bits.iter().rev() {
            write!(f, "{bit}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for LogicVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LogicVec({self})")
    }
}
