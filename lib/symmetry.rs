//! Conserved quantum numbers used to split the Fock space into blocks.

use std::fmt;
use crate::{
    error::{ EdError, EdResult },
    fock::{ FockState, ParticleIndex },
    index::{ IndexClassification, Spin },
};

/// A composite quantum-number label.
///
/// Labels are ordered lexicographically; this ordering fixes the numbering of
/// blocks. Half-integer quantities are stored as a number of halves.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QuantumNumbers(pub Vec<i32>);

impl From<Vec<i32>> for QuantumNumbers {
    fn from(qn: Vec<i32>) -> Self { Self(qn) }
}

impl<const K: usize> From<[i32; K]> for QuantumNumbers {
    fn from(qn: [i32; K]) -> Self { Self(qn.to_vec()) }
}

impl fmt::Display for QuantumNumbers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (k, q) in self.0.iter().enumerate() {
            if k > 0 { write!(f, ", ")?; }
            write!(f, "{q}")?;
        }
        write!(f, ")")
    }
}

/// A label functional on basis states.
///
/// Any operator used with the resulting classification must commute with the
/// label, i.e. map states only onto states with equal labels.
pub trait Symmetry: Sync {
    /// Compute the label of a basis state.
    fn quantum_numbers(&self, state: &FockState) -> QuantumNumbers;
}

impl<F> Symmetry for F
where F: Fn(&FockState) -> QuantumNumbers + Sync
{
    fn quantum_numbers(&self, state: &FockState) -> QuantumNumbers {
        self(state)
    }
}

/// Total particle number.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ParticleNumber;

impl Symmetry for ParticleNumber {
    fn quantum_numbers(&self, state: &FockState) -> QuantumNumbers {
        QuantumNumbers(vec![state.count() as i32])
    }
}

/// Total particle number together with the spin projection `2 Sz`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParticleNumberSz {
    up: Vec<ParticleIndex>,
    down: Vec<ParticleIndex>,
}

impl ParticleNumberSz {
    /// Create a new label from paired lists of spin-up and spin-down indices.
    ///
    /// Fails if the lists have unequal lengths.
    pub fn new(up: Vec<ParticleIndex>, down: Vec<ParticleIndex>)
        -> EdResult<Self>
    {
        if up.len() != down.len() {
            return Err(EdError::SpinIndicesMismatch(up.len(), down.len()));
        }
        Ok(Self { up, down })
    }

    /// Take spin-resolved index lists from an [`IndexClassification`].
    pub fn from_indices(indices: &IndexClassification) -> EdResult<Self> {
        Self::new(indices.spin_indices(Spin::Up), indices.spin_indices(Spin::Dn))
    }
}

impl Symmetry for ParticleNumberSz {
    fn quantum_numbers(&self, state: &FockState) -> QuantumNumbers {
        let n_up = self.up.iter().filter(|i| state.test(**i)).count() as i32;
        let n_dn = self.down.iter().filter(|i| state.test(**i)).count() as i32;
        QuantumNumbers(vec![
            state.count() as i32,
            Spin::Up.halves() * n_up + Spin::Dn.halves() * n_dn,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels() {
        let s = FockState::from_occupied([0, 1, 3], 4).unwrap();
        assert_eq!(ParticleNumber.quantum_numbers(&s), [3].into());
        let nsz = ParticleNumberSz::new(vec![2, 3], vec![0, 1]).unwrap();
        assert_eq!(nsz.quantum_numbers(&s), [3, -1].into());
        let parity = |s: &FockState| QuantumNumbers(vec![(s.count() % 2) as i32]);
        assert_eq!(parity.quantum_numbers(&s), [1].into());
    }

    #[test]
    fn lexicographic_order() {
        let a: QuantumNumbers = [1, 1].into();
        let b: QuantumNumbers = [2, -2].into();
        assert!(a < b);
        assert_eq!(b.to_string(), "(2, -2)");
    }

    #[test]
    fn unequal_spin_lists() {
        assert!(ParticleNumberSz::new(vec![0], vec![]).is_err());
    }
}
