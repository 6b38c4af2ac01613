//! Single-bit signal references.
//!
//! A [`SigBit`] names one bit of one wire, or a constant logic value. A
//! [`SigSpec`] is an ordered vector of bits, the unit of every port
//! connection in the netlist.

use crate::ids::WireId;
use crate::logic::Logic;
use serde::{Deserialize, Serialize};

/// One bit of a signal: either a bit of a wire or a constant.
///
/// Two `SigBit`s refer to the same net only after canonicalization through
/// [`SigMap`](crate::sigmap::SigMap); structural equality here is identity of
/// the *reference*, not of the net.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum SigBit {
    /// A constant logic value.
    Const(Logic),
    /// Bit `offset` of the given wire.
    Wire {
        /// The referenced wire.
        wire: WireId,
        /// Bit offset within the wire (0-based, LSB first).
        offset: u32,
    },
}

impl SigBit {
    /// Returns the wire this bit belongs to, or `None` for a constant.
    pub fn wire(&self) -> Option<WireId> {
        match self {
            SigBit::Wire { wire, .. } => Some(*wire),
            SigBit::Const(_) => None,
        }
    }

    /// Returns the constant value, or `None` for a wire bit.
    pub fn as_const(&self) -> Option<Logic> {
        match self {
            SigBit::Const(value) => Some(*value),
            SigBit::Wire { .. } => None,
        }
    }
}

/// An ordered vector of [`SigBit`]s.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Serialize, Deserialize)]
pub struct SigSpec {
    bits: Vec<SigBit>,
}

impl SigSpec {
    /// Creates an empty signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a one-bit signal.
    pub fn from_bit(bit: SigBit) -> Self {
        Self { bits: vec![bit] }
    }

    /// Creates a signal from a vector of bits.
    pub fn from_bits(bits: Vec<SigBit>) -> Self {
        Self { bits }
    }

    /// Creates a one-bit constant signal.
    pub fn from_const(value: Logic) -> Self {
        Self::from_bit(SigBit::Const(value))
    }

    /// Returns the number of bits.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Returns `true` if the signal has no bits.
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Returns the bits as a slice.
    pub fn bits(&self) -> &[SigBit] {
        &self.bits
    }

    /// Iterates over the bits, LSB first. Double-ended so diagnostics can
    /// render MSB first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = SigBit> + '_ {
        self.bits.iter().copied()
    }

    /// Returns the single bit of a one-bit signal.
    ///
    /// # Panics
    ///
    /// Panics if the signal is not exactly one bit wide. Port widths of the
    /// primitive gate catalogue are a caller-guaranteed structural invariant.
    pub fn as_bit(&self) -> SigBit {
        assert!(
            self.bits.len() == 1,
            "expected a single-bit signal, got {} bits",
            self.bits.len()
        );
        self.bits[0]
    }

    /// Appends a bit.
    pub fn push(&mut self, bit: SigBit) {
        self.bits.push(bit);
    }

    /// Appends all bits of another signal.
    pub fn append(&mut self, other: &SigSpec) {
        self.bits.extend_from_slice(&other.bits);
    }

    /// Returns `true` if every bit is a constant.
    pub fn is_fully_const(&self) -> bool {
        self.bits.iter().all(|b| matches!(b, SigBit::Const(_)))
    }
}

impl From<SigBit> for SigSpec {
    fn from(bit: SigBit) -> Self {
        SigSpec::from_bit(bit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn const_bit_accessors() {
        let bit = SigBit::Const(Logic::One);
        assert_eq!(bit.wire(), None);
        assert_eq!(bit.as_const(), Some(Logic::One));
    }

    #[test]
    fn wire_bit_accessors() {
        let bit = SigBit::Wire {
            wire: WireId::from_raw(3),
            offset: 1,
        };
        assert_eq!(bit.wire(), Some(WireId::from_raw(3)));
        assert_eq!(bit.as_const(), None);
    }

    #[test]
    fn single_bit_spec() {
        let spec = SigSpec::from_const(Logic::Zero);
        assert_eq!(spec.len(), 1);
        assert_eq!(spec.as_bit(), SigBit::Const(Logic::Zero));
        assert!(spec.is_fully_const());
    }

    #[test]
    #[should_panic(expected = "single-bit")]
    fn as_bit_rejects_wide_spec() {
        let mut spec = SigSpec::new();
        spec.push(SigBit::Const(Logic::Zero));
        spec.push(SigBit::Const(Logic::One));
        spec.as_bit();
    }

    #[test]
    fn append_concatenates() {
        let mut a = SigSpec::from_const(Logic::Zero);
        let b = SigSpec::from_const(Logic::One);
        a.append(&b);
        assert_eq!(a.len(), 2);
        assert_eq!(a.bits()[1], SigBit::Const(Logic::One));
    }

    #[test]
    fn structural_ordering_is_stable() {
        let a = SigSpec::from_bit(SigBit::Wire {
            wire: WireId::from_raw(0),
            offset: 0,
        });
        let b = SigSpec::from_bit(SigBit::Wire {
            wire: WireId::from_raw(1),
            offset: 0,
        });
        assert!(a < b);
    }
}
