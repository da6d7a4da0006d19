//! Occupation-number basis states and the integer types used to address them.

use std::fmt;
use crate::error::{ EdError, EdResult };

/// Identifies a single mode (a site + orbital + spin combination).
pub type ParticleIndex = u16;

/// Dense global index of a basis state; equal to the raw bit pattern of the
/// corresponding [`FockState`].
pub type QuantumState = usize;

/// Identifies a symmetry sector.
pub type BlockNumber = usize;

/// Index of a state within its block.
pub type InnerQuantumState = usize;

/// A single occupation-number basis state over a fixed number of modes.
///
/// Bit `i` of the backing word is set if mode `i` is occupied. States are
/// compared, ordered, and hashed by their raw bit pattern.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FockState {
    bits: u64,
    modes: ParticleIndex,
}

impl FockState {
    /// Largest number of modes a `FockState` can describe.
    pub const MAX_MODES: usize = u64::BITS as usize;

    /// Create the vacuum state over `modes` modes.
    ///
    /// Fails if `modes` exceeds [`Self::MAX_MODES`].
    pub fn vacuum(modes: ParticleIndex) -> EdResult<Self> {
        if usize::from(modes) > Self::MAX_MODES {
            return Err(EdError::TooManyModes(modes.into(), Self::MAX_MODES));
        }
        Ok(Self { bits: 0, modes })
    }

    /// Create a state from a raw bit pattern, discarding any bits at or above
    /// `modes`.
    ///
    /// Fails if `modes` exceeds [`Self::MAX_MODES`].
    pub fn from_bits(bits: u64, modes: ParticleIndex) -> EdResult<Self> {
        Self::vacuum(modes).map(|vac| vac.with_bits(bits))
    }

    /// Like [`Self::from_bits`] for a mode count already known to be in range.
    pub(crate) fn from_bits_unchecked(bits: u64, modes: ParticleIndex) -> Self {
        Self { bits: 0, modes }.with_bits(bits)
    }

    /// Create a state with exactly the listed modes occupied, ignoring any
    /// index at or above `modes`.
    ///
    /// Fails if `modes` exceeds [`Self::MAX_MODES`].
    pub fn from_occupied<I>(occupied: I, modes: ParticleIndex) -> EdResult<Self>
    where I: IntoIterator<Item = ParticleIndex>
    {
        let bits: u64
            = occupied.into_iter()
            .filter(|i| *i < modes)
            .filter_map(|i| 1_u64.checked_shl(u32::from(i)))
            .fold(0, |acc, b| acc | b);
        Self::from_bits(bits, modes)
    }

    fn with_bits(mut self, bits: u64) -> Self {
        self.bits = bits & self.mask();
        self
    }

    fn mask(&self) -> u64 {
        if usize::from(self.modes) == Self::MAX_MODES {
            u64::MAX
        } else {
            (1_u64 << self.modes) - 1
        }
    }

    /// Return the raw bit pattern.
    pub fn bits(&self) -> u64 { self.bits }

    /// Return the number of modes.
    pub fn modes(&self) -> ParticleIndex { self.modes }

    /// Return the global quantum state index.
    pub fn quantum_state(&self) -> QuantumState { self.bits as QuantumState }

    /// Return `true` if mode `i` is occupied.
    pub fn test(&self, i: ParticleIndex) -> bool {
        i < self.modes && (self.bits >> i) & 1 == 1
    }

    /// Return the total number of occupied modes.
    pub fn count(&self) -> u32 { self.bits.count_ones() }

    /// Iterate over the indices of all occupied modes in ascending order.
    pub fn occupied(&self) -> impl Iterator<Item = ParticleIndex> + '_ {
        (0..self.modes).filter(|i| self.test(*i))
    }

    /// Fermionic sign picked up by an elementary operator acting on mode `i`:
    /// `(-1)^n`, where `n` is the number of occupied modes with index below
    /// `i`.
    pub fn sign_at(&self, i: ParticleIndex) -> f64 {
        let below_mask: u64
            = 1_u64.checked_shl(u32::from(i)).map_or(u64::MAX, |b| b - 1);
        let below: u64 = self.bits & below_mask;
        if below.count_ones() % 2 == 0 { 1.0 } else { -1.0 }
    }

    /// Apply a creation operator on mode `i`.
    ///
    /// Returns `None` if the mode is already occupied or out of range.
    pub fn create(&self, i: ParticleIndex) -> Option<(Self, f64)> {
        (i < self.modes && !self.test(i))
            .then(|| {
                let sign = self.sign_at(i);
                (Self { bits: self.bits | (1 << i), modes: self.modes }, sign)
            })
    }

    /// Apply an annihilation operator on mode `i`.
    ///
    /// Returns `None` if the mode is empty or out of range.
    pub fn annihilate(&self, i: ParticleIndex) -> Option<(Self, f64)> {
        self.test(i)
            .then(|| {
                let sign = self.sign_at(i);
                (Self { bits: self.bits & !(1 << i), modes: self.modes }, sign)
            })
    }
}

impl fmt::Debug for FockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FockState({self})")
    }
}

impl fmt::Display for FockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "|")?;
        for i in 0..self.modes {
            write!(f, "{}", if self.test(i) { '1' } else { '0' })?;
        }
        write!(f, ">")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn occupation_and_count() {
        let s = FockState::from_occupied([0, 2], 3).unwrap();
        assert_eq!(s.bits(), 0b101);
        assert_eq!(s.quantum_state(), 5);
        assert!(s.test(0) && !s.test(1) && s.test(2));
        assert!(!s.test(7));
        assert_eq!(s.count(), 2);
        assert_eq!(s.occupied().collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(s.to_string(), "|101>");
    }

    #[test]
    fn bits_above_modes_are_discarded() {
        let s = FockState::from_bits(0b1111, 2).unwrap();
        assert_eq!(s.bits(), 0b11);
        let full = FockState::from_bits(u64::MAX, 64).unwrap();
        assert_eq!(full.count(), 64);
    }

    #[test]
    fn pauli_exclusion() {
        let vac = FockState::vacuum(2).unwrap();
        let (one, sign) = vac.create(1).unwrap();
        assert_eq!(sign, 1.0);
        assert!(one.create(1).is_none());
        assert!(vac.annihilate(0).is_none());
        assert!(vac.create(2).is_none());
    }

    #[test]
    fn jordan_wigner_sign() {
        let s = FockState::from_occupied([0, 1], 3).unwrap();
        assert_eq!(s.sign_at(0), 1.0);
        assert_eq!(s.sign_at(1), -1.0);
        assert_eq!(s.sign_at(2), 1.0);
        let (t, sign) = s.annihilate(1).unwrap();
        assert_eq!(t, FockState::from_occupied([0], 3).unwrap());
        assert_eq!(sign, -1.0);
    }

    #[test]
    fn too_many_modes() {
        assert!(matches!(
            FockState::vacuum(65),
            Err(EdError::TooManyModes(65, 64))
        ));
        assert!(FockState::from_bits(1, 100).is_err());
        assert!(FockState::from_occupied([0], 65).is_err());
        assert!(FockState::vacuum(64).is_ok());
    }

    #[test]
    fn sign_beyond_last_mode() {
        let s = FockState::from_occupied([0, 2, 3], 4).unwrap();
        assert_eq!(s.sign_at(64), -1.0);
        assert_eq!(s.sign_at(u16::MAX), -1.0);
        let full = FockState::from_bits(u64::MAX, 64).unwrap();
        assert_eq!(full.sign_at(63), -1.0);
        assert_eq!(full.sign_at(64), 1.0);
        assert!(s.create(64).is_none());
        assert!(s.annihilate(64).is_none());
    }
}
