//! Partition of the Fock space into symmetry blocks.

use std::collections::BTreeMap;
use rayon::iter::{ IntoParallelIterator, ParallelIterator };
use rustc_hash::FxHashMap as HashMap;
use crate::{
    error::{ EdError, EdResult },
    fock::{
        BlockNumber,
        FockState,
        InnerQuantumState,
        ParticleIndex,
        QuantumState,
    },
    status::ObjectStatus,
    symmetry::{ QuantumNumbers, Symmetry },
};

/// Enumerates all basis states over a fixed number of modes and groups them
/// into blocks of equal [`QuantumNumbers`].
///
/// Blocks are numbered by ascending quantum numbers and states within a block
/// by ascending [`QuantumState`], so the numbering is reproducible across runs.
/// All lookups are O(1) after [`Self::compute`].
pub struct StatesClassification {
    modes: ParticleIndex,
    symmetry: Box<dyn Symmetry + Send>,
    status: ObjectStatus,
    // (block, inner) for every quantum state
    locations: Vec<(BlockNumber, InnerQuantumState)>,
    blocks: Vec<Vec<QuantumState>>,
    labels: Vec<QuantumNumbers>,
    label_to_block: HashMap<QuantumNumbers, BlockNumber>,
}

impl std::fmt::Debug for StatesClassification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatesClassification")
            .field("modes", &self.modes)
            .field("status", &self.status)
            .field("blocks", &self.labels)
            .finish()
    }
}

impl StatesClassification {
    /// Largest number of modes for which the full Fock space is enumerated.
    pub const MAX_MODES: usize = (usize::BITS - 1) as usize;

    /// Create a new classification of the `2^modes`-dimensional Fock space.
    pub fn new<S>(modes: ParticleIndex, symmetry: S) -> EdResult<Self>
    where S: Symmetry + Send + 'static
    {
        Self::from_boxed(modes, Box::new(symmetry))
    }

    /// Like [`Self::new`], but for a symmetry chosen at run time.
    pub fn from_boxed(modes: ParticleIndex, symmetry: Box<dyn Symmetry + Send>)
        -> EdResult<Self>
    {
        if usize::from(modes) > Self::MAX_MODES.min(FockState::MAX_MODES) {
            return Err(EdError::TooManyModes(
                modes.into(), Self::MAX_MODES.min(FockState::MAX_MODES)));
        }
        Ok(Self {
            modes,
            symmetry,
            status: ObjectStatus::Constructed,
            locations: Vec::new(),
            blocks: Vec::new(),
            labels: Vec::new(),
            label_to_block: HashMap::default(),
        })
    }

    /// Label every basis state and group states into blocks.
    pub fn compute(&mut self) {
        if self.status.is_computed() { return; }
        let dim = self.dimension();
        let modes = self.modes;
        let symmetry = &self.symmetry;
        let labels: Vec<QuantumNumbers>
            = (0..dim).into_par_iter()
            .map(|q| symmetry.quantum_numbers(&FockState::from_bits_unchecked(q as u64, modes)))
            .collect();

        let mut grouped: BTreeMap<QuantumNumbers, Vec<QuantumState>>
            = BTreeMap::new();
        for (q, label) in labels.into_iter().enumerate() {
            grouped.entry(label).or_default().push(q);
        }

        self.locations = vec![(0, 0); dim];
        self.blocks = Vec::with_capacity(grouped.len());
        self.labels = Vec::with_capacity(grouped.len());
        self.label_to_block = HashMap::default();
        for (block, (label, states)) in grouped.into_iter().enumerate() {
            for (inner, q) in states.iter().enumerate() {
                self.locations[*q] = (block, inner);
            }
            log::debug!("block {block}: quantum numbers {label}, {} states", states.len());
            self.label_to_block.insert(label.clone(), block);
            self.labels.push(label);
            self.blocks.push(states);
        }
        log::info!(
            "classified {dim} states over {modes} modes into {} blocks",
            self.blocks.len(),
        );
        self.status.advance(ObjectStatus::Computed);
    }

    fn check_computed(&self) -> EdResult<()> {
        if self.status.is_computed() {
            Ok(())
        } else {
            Err(EdError::NotComputed("StatesClassification"))
        }
    }

    fn check_block(&self, block: BlockNumber) -> EdResult<()> {
        self.check_computed()?;
        if block < self.blocks.len() {
            Ok(())
        } else {
            Err(EdError::BlockOutOfRange(block, self.blocks.len()))
        }
    }

    fn location(&self, state: QuantumState)
        -> EdResult<(BlockNumber, InnerQuantumState)>
    {
        self.check_computed()?;
        self.locations.get(state).copied()
            .ok_or(EdError::QuantumStateOutOfRange(state, self.dimension()))
    }

    /// Return the current status.
    pub fn status(&self) -> ObjectStatus { self.status }

    /// Return the number of modes.
    pub fn modes(&self) -> ParticleIndex { self.modes }

    /// Return the dimension of the full Fock space.
    pub fn dimension(&self) -> usize { 1 << self.modes }

    /// Return the number of blocks.
    pub fn number_of_blocks(&self) -> EdResult<usize> {
        self.check_computed()?;
        Ok(self.blocks.len())
    }

    /// Return the block containing a quantum state.
    pub fn block_number(&self, state: QuantumState) -> EdResult<BlockNumber> {
        self.location(state).map(|(block, _)| block)
    }

    /// Return the index of a quantum state within its block.
    pub fn inner_state(&self, state: QuantumState)
        -> EdResult<InnerQuantumState>
    {
        self.location(state).map(|(_, inner)| inner)
    }

    /// Return the quantum state at a position within a block.
    pub fn quantum_state(&self, block: BlockNumber, inner: InnerQuantumState)
        -> EdResult<QuantumState>
    {
        self.check_block(block)?;
        let states = &self.blocks[block];
        states.get(inner).copied()
            .ok_or(EdError::InnerStateOutOfRange {
                block,
                inner,
                size: states.len(),
            })
    }

    /// Return the number of states in a block.
    pub fn block_size(&self, block: BlockNumber) -> EdResult<usize> {
        self.check_block(block)?;
        Ok(self.blocks[block].len())
    }

    /// Return all quantum states of a block, ordered by inner index.
    pub fn block_states(&self, block: BlockNumber) -> EdResult<&[QuantumState]> {
        self.check_block(block)?;
        Ok(&self.blocks[block])
    }

    /// Return the quantum numbers shared by all states of a block.
    pub fn block_quantum_numbers(&self, block: BlockNumber)
        -> EdResult<&QuantumNumbers>
    {
        self.check_block(block)?;
        Ok(&self.labels[block])
    }

    /// Return the block with given quantum numbers, if any state carries them.
    pub fn find_block(&self, qn: &QuantumNumbers)
        -> EdResult<Option<BlockNumber>>
    {
        self.check_computed()?;
        Ok(self.label_to_block.get(qn).copied())
    }

    /// Return the basis state for a quantum state.
    pub fn fock_state(&self, state: QuantumState) -> EdResult<FockState> {
        if state < self.dimension() {
            Ok(FockState::from_bits_unchecked(state as u64, self.modes))
        } else {
            Err(EdError::QuantumStateOutOfRange(state, self.dimension()))
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use super::*;
    use crate::symmetry::{ ParticleNumber, ParticleNumberSz };

    fn classified(modes: ParticleIndex) -> StatesClassification {
        let mut states = StatesClassification::new(modes, ParticleNumber).unwrap();
        states.compute();
        states
    }

    #[test]
    fn two_modes_by_particle_number() {
        let states = classified(2);
        assert_eq!(states.number_of_blocks().unwrap(), 3);
        let blocks: Vec<usize>
            = (0..4).map(|q| states.block_number(q).unwrap()).collect();
        assert_eq!(blocks, vec![0, 1, 1, 2]);
        assert_eq!(states.block_size(0).unwrap(), 1);
        assert_eq!(states.block_size(1).unwrap(), 2);
        assert_eq!(states.block_states(1).unwrap(), &[1, 2]);
        assert_eq!(states.block_quantum_numbers(2).unwrap(), &[2].into());
        assert_eq!(states.find_block(&[1].into()).unwrap(), Some(1));
        assert_eq!(states.find_block(&[5].into()).unwrap(), None);
    }

    #[test]
    fn blocks_partition_the_space() {
        let mut states = StatesClassification::new(
            6, ParticleNumberSz::new(vec![3, 4, 5], vec![0, 1, 2]).unwrap()
        ).unwrap();
        states.compute();
        let nblocks = states.number_of_blocks().unwrap();
        // N in 0..=6, 2Sz constrained by N: 16 sectors
        assert_eq!(nblocks, 16);
        let total: usize = (0..nblocks).map(|b| states.block_size(b).unwrap()).sum();
        assert_eq!(total, states.dimension());
        for b in 0..nblocks {
            assert!(states.block_size(b).unwrap() >= 1);
        }
        for b in 1..nblocks {
            assert!(states.block_quantum_numbers(b - 1).unwrap()
                < states.block_quantum_numbers(b).unwrap());
        }
    }

    #[test]
    fn compute_is_idempotent() {
        let mut states = classified(3);
        let before: Vec<usize> = (0..8).map(|q| states.block_number(q).unwrap()).collect();
        states.compute();
        let after: Vec<usize> = (0..8).map(|q| states.block_number(q).unwrap()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn errors() {
        let mut states = StatesClassification::new(2, ParticleNumber).unwrap();
        assert!(matches!(states.block_number(0), Err(EdError::NotComputed(_))));
        states.compute();
        assert!(matches!(
            states.block_number(4),
            Err(EdError::QuantumStateOutOfRange(4, 4))
        ));
        assert!(matches!(states.block_size(3), Err(EdError::BlockOutOfRange(3, 3))));
        assert!(matches!(
            states.quantum_state(0, 1),
            Err(EdError::InnerStateOutOfRange { block: 0, inner: 1, size: 1 })
        ));
        assert!(StatesClassification::new(64, ParticleNumber).is_err());
    }

    proptest! {
        #[test]
        fn bijection(q in 0_usize..256) {
            let states = classified(8);
            let block = states.block_number(q).unwrap();
            let inner = states.inner_state(q).unwrap();
            prop_assert_eq!(states.quantum_state(block, inner).unwrap(), q);
            prop_assert_eq!(
                states.fock_state(q).unwrap().count() as i32,
                states.block_quantum_numbers(block).unwrap().0[0]
            );
        }
    }

    #[test]
    fn inverse_bijection() {
        let states = classified(5);
        for b in 0..states.number_of_blocks().unwrap() {
            for inner in 0..states.block_size(b).unwrap() {
                let q = states.quantum_state(b, inner).unwrap();
                assert_eq!(states.block_number(q).unwrap(), b);
                assert_eq!(states.inner_state(q).unwrap(), inner);
            }
        }
    }
}
