//! Block-wise construction and diagonalization of the Hamiltonian.

use std::path::Path;
use ndarray as nd;
use ndarray_linalg::{ EighInto, UPLO };
use num_complex::Complex64 as C64;
use rayon::iter::{
    IntoParallelIterator,
    IntoParallelRefMutIterator,
    ParallelIterator,
};
use crate::{
    classification::StatesClassification,
    error::{ EdError, EdResult },
    fock::{ BlockNumber, InnerQuantumState },
    operators::Operator,
    status::ObjectStatus,
    storage,
};

/// Largest tolerated deviation `|H_ij - conj(H_ji)|` in a block.
pub const HERMITIAN_TOL: f64 = 1e-10;

/// The Hamiltonian restricted to a single block.
///
/// After [`Self::compute`], holds eigenvalues in ascending order with the
/// corresponding eigenvectors as the columns of [`Self::eigenvectors`],
/// expressed in the basis of the block's inner states.
#[derive(Clone, Debug, PartialEq)]
pub struct HamiltonianPart {
    block: BlockNumber,
    size: usize,
    status: ObjectStatus,
    matrix: nd::Array2<C64>,
    eigenvalues: nd::Array1<f64>,
    eigenvectors: nd::Array2<C64>,
}

impl HamiltonianPart {
    /// Create a new, empty part for a block of `size` states.
    pub fn new(block: BlockNumber, size: usize) -> Self {
        Self {
            block,
            size,
            status: ObjectStatus::Constructed,
            matrix: nd::Array2::zeros((0, 0)),
            eigenvalues: nd::Array1::zeros(0),
            eigenvectors: nd::Array2::zeros((0, 0)),
        }
    }

    /// Fill the block matrix with `<i|H|j>` for all inner states `i`, `j`.
    ///
    /// Fails if `H` maps any state of the block outside of it.
    pub fn prepare<O>(&mut self, states: &StatesClassification, H: &O)
        -> EdResult<()>
    where O: Operator + ?Sized
    {
        if self.status.is_prepared() { return Ok(()); }
        let mut matrix: nd::Array2<C64> = nd::Array2::zeros((self.size, self.size));
        for (j, q) in states.block_states(self.block)?.iter().enumerate() {
            let ket = states.fock_state(*q)?;
            for (bra, melem) in H.act_right(&ket).into_iter() {
                let q_bra = bra.quantum_state();
                let to = states.block_number(q_bra)?;
                if to != self.block {
                    return Err(EdError::BlockMismatch { from: self.block, to });
                }
                let i: InnerQuantumState = states.inner_state(q_bra)?;
                matrix[[i, j]] += melem;
            }
        }
        self.matrix = matrix;
        self.status.advance(ObjectStatus::Prepared);
        Ok(())
    }

    /// Return the largest deviation of the block matrix from Hermiticity.
    pub fn hermitian_deviation(&self) -> f64 {
        self.matrix.iter()
            .zip(self.matrix.t().iter())
            .map(|(hij, hji)| (*hij - hji.conj()).norm())
            .fold(0.0, f64::max)
    }

    /// Diagonalize the block matrix.
    ///
    /// Fails if the part is not prepared or the matrix is not Hermitian.
    pub fn compute(&mut self) -> EdResult<()> {
        if self.status.is_computed() { return Ok(()); }
        if !self.status.is_prepared() {
            return Err(EdError::NotComputed("HamiltonianPart matrix"));
        }
        let deviation = self.hermitian_deviation();
        if deviation > HERMITIAN_TOL {
            return Err(EdError::NotHermitian { block: self.block, deviation });
        }
        let (E, V) = self.matrix.clone().eigh_into(UPLO::Lower)?;
        log::debug!(
            "diagonalized block {} ({} states), lowest eigenvalue {:?}",
            self.block, self.size, E.get(0),
        );
        self.eigenvalues = E;
        self.eigenvectors = V;
        self.status.advance(ObjectStatus::Computed);
        Ok(())
    }

    fn check_computed(&self) -> EdResult<()> {
        if self.status.is_computed() {
            Ok(())
        } else {
            Err(EdError::NotComputed("HamiltonianPart"))
        }
    }

    /// Return the current status.
    pub fn status(&self) -> ObjectStatus { self.status }

    /// Return the block number.
    pub fn block(&self) -> BlockNumber { self.block }

    /// Return the number of states in the block.
    pub fn size(&self) -> usize { self.size }

    /// Return the block matrix, which is empty before preparation.
    pub fn matrix(&self) -> &nd::Array2<C64> { &self.matrix }

    /// Return the eigenvalues in ascending order.
    pub fn eigenvalues(&self) -> EdResult<&nd::Array1<f64>> {
        self.check_computed()?;
        Ok(&self.eigenvalues)
    }

    /// Return the eigenvectors as columns.
    pub fn eigenvectors(&self) -> EdResult<&nd::Array2<C64>> {
        self.check_computed()?;
        Ok(&self.eigenvectors)
    }

    /// Return the lowest eigenvalue of the block.
    pub fn ground_energy(&self) -> EdResult<f64> {
        self.check_computed()?;
        Ok(self.eigenvalues[0])
    }

    /// Write eigenvalues and eigenvectors to `dir`.
    pub fn save(&self, dir: &Path) -> EdResult<()> {
        self.check_computed()?;
        storage::mkdir(dir)?;
        storage::write_array(dir, "eigenvalues", &self.eigenvalues)?;
        storage::write_array(dir, "eigenvectors", &self.eigenvectors)?;
        Ok(())
    }

    fn read(&self, dir: &Path) -> EdResult<(nd::Array1<f64>, nd::Array2<C64>)> {
        let E: nd::Array1<f64> = storage::read_array(dir, "eigenvalues")?;
        let V: nd::Array2<C64> = storage::read_array(dir, "eigenvectors")?;
        if E.len() != self.size {
            return Err(EdError::ShapeMismatch {
                block: self.block,
                stored: E.shape().to_vec(),
                live: vec![self.size],
            });
        }
        if V.dim() != (self.size, self.size) {
            return Err(EdError::ShapeMismatch {
                block: self.block,
                stored: V.shape().to_vec(),
                live: vec![self.size, self.size],
            });
        }
        Ok((E, V))
    }
}

/// The Hamiltonian of the full Fock space, held as one [`HamiltonianPart`] per
/// block of a [`StatesClassification`].
pub struct Hamiltonian<'a> {
    states: &'a StatesClassification,
    operator: &'a dyn Operator,
    status: ObjectStatus,
    parts: Vec<HamiltonianPart>,
    ground_energy: f64,
}

impl<'a> Hamiltonian<'a> {
    /// Create a new `Hamiltonian` for a computed classification and an
    /// operator that conserves its quantum numbers.
    pub fn new(states: &'a StatesClassification, operator: &'a dyn Operator)
        -> EdResult<Self>
    {
        if !states.status().is_computed() {
            return Err(EdError::NotComputed("StatesClassification"));
        }
        Ok(Self {
            states,
            operator,
            status: ObjectStatus::Constructed,
            parts: Vec::new(),
            ground_energy: f64::NAN,
        })
    }

    /// Build the matrix of every block.
    pub fn prepare(&mut self) -> EdResult<()> {
        if self.status.is_prepared() { return Ok(()); }
        let states = self.states;
        let operator = self.operator;
        let nblocks = states.number_of_blocks()?;
        self.parts
            = (0..nblocks).into_par_iter()
            .map(|block| -> EdResult<HamiltonianPart> {
                let mut part = HamiltonianPart::new(block, states.block_size(block)?);
                part.prepare(states, operator)?;
                Ok(part)
            })
            .collect::<EdResult<Vec<HamiltonianPart>>>()?;
        self.status.advance(ObjectStatus::Prepared);
        Ok(())
    }

    /// Diagonalize every block and find the global ground energy.
    pub fn compute(&mut self) -> EdResult<()> {
        if self.status.is_computed() { return Ok(()); }
        self.prepare()?;
        self.parts.par_iter_mut().try_for_each(|part| part.compute())?;
        self.ground_energy = self.min_energy()?;
        log::info!(
            "diagonalized {} blocks; ground energy {}",
            self.parts.len(), self.ground_energy,
        );
        self.status.advance(ObjectStatus::Computed);
        Ok(())
    }

    fn min_energy(&self) -> EdResult<f64> {
        self.parts.iter()
            .map(|part| part.ground_energy())
            .try_fold(f64::INFINITY, |acc, e| e.map(|e| acc.min(e)))
    }

    fn check_computed(&self) -> EdResult<()> {
        if self.status.is_computed() {
            Ok(())
        } else {
            Err(EdError::NotComputed("Hamiltonian"))
        }
    }

    /// Return the current status.
    pub fn status(&self) -> ObjectStatus { self.status }

    /// Return the underlying classification.
    pub fn states(&self) -> &'a StatesClassification { self.states }

    /// Return the lowest eigenvalue over all blocks.
    pub fn ground_energy(&self) -> EdResult<f64> {
        self.check_computed()?;
        Ok(self.ground_energy)
    }

    /// Return the number of parts.
    pub fn number_of_parts(&self) -> usize { self.parts.len() }

    /// Return the part for a block.
    pub fn part(&self, block: BlockNumber) -> EdResult<&HamiltonianPart> {
        self.parts.get(block)
            .ok_or(EdError::BlockOutOfRange(block, self.parts.len()))
    }

    /// Return all eigenvalues, ordered by block and then ascending within
    /// each block.
    pub fn eigenvalues(&self) -> EdResult<Vec<f64>> {
        self.check_computed()?;
        Ok(
            self.parts.iter()
                .flat_map(|part| part.eigenvalues.iter().copied())
                .collect()
        )
    }

    /// Write all eigen-data under `<root>/Hamiltonian`.
    pub fn save(&self, root: &Path) -> EdResult<()> {
        self.check_computed()?;
        let dir = root.join("Hamiltonian");
        storage::mkdir(&dir)?;
        storage::write_scalar(&dir, "ground_energy", self.ground_energy)?;
        for part in self.parts.iter() {
            part.save(&storage::part_dir(&dir, part.block))?;
        }
        log::info!("saved Hamiltonian to {}", dir.display());
        Ok(())
    }

    /// Read eigen-data from `<root>/Hamiltonian` in place of diagonalization.
    ///
    /// Nothing is overwritten unless every stored part matches the live block
    /// structure.
    pub fn load(&mut self, root: &Path) -> EdResult<()> {
        let dir = root.join("Hamiltonian");
        let nblocks = self.states.number_of_blocks()?;
        let stored = storage::count_parts(&dir)?;
        if stored != nblocks {
            return Err(EdError::PartsMismatch { stored, live: nblocks });
        }
        let data: Vec<(nd::Array1<f64>, nd::Array2<C64>)>
            = (0..nblocks)
            .map(|block| {
                HamiltonianPart::new(block, self.states.block_size(block)?)
                    .read(&storage::part_dir(&dir, block))
            })
            .collect::<EdResult<_>>()?;
        self.prepare()?;
        for (part, (E, V)) in self.parts.iter_mut().zip(data) {
            part.eigenvalues = E;
            part.eigenvectors = V;
            part.status.advance(ObjectStatus::Computed);
        }
        self.ground_energy = self.min_energy()?;
        self.status.advance(ObjectStatus::Computed);
        log::info!("loaded Hamiltonian from {}", dir.display());
        Ok(())
    }
}
