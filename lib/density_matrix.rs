//! The grand-canonical density matrix `ρ = exp(-βH) / Z` in the eigenbasis of
//! the Hamiltonian.
//!
//! Boltzmann weights are computed relative to the global ground energy `E0`,
//! `w_i = exp(-β (E_i - E0))`, so that the largest weight is exactly 1 and no
//! weight can overflow. Consequently [`DensityMatrix::partition_function`]
//! returns `Z exp(β E0)`.

use std::path::Path;
use ndarray as nd;
use num_complex::Complex64 as C64;
use num_traits::Zero;
use rayon::iter::{ IntoParallelRefMutIterator, ParallelIterator };
use crate::{
    classification::StatesClassification,
    error::{ EdError, EdResult },
    fock::{ BlockNumber, FockState, InnerQuantumState, ParticleIndex, QuantumState },
    hamiltonian::{ Hamiltonian, HamiltonianPart },
    operators::{ MelemType, Operator },
    status::ObjectStatus,
    storage,
    symmetry::QuantumNumbers,
};

/// Check that an inverse temperature is usable.
pub fn check_beta(beta: f64) -> EdResult<f64> {
    if beta.is_finite() && beta >= 0.0 {
        Ok(beta)
    } else {
        Err(EdError::InvalidBeta(beta))
    }
}

/// The density matrix restricted to a single block.
///
/// Holds one weight per eigenstate of the block's [`HamiltonianPart`].
#[derive(Clone, Debug)]
pub struct DensityMatrixPart<'a> {
    states: &'a StatesClassification,
    hpart: &'a HamiltonianPart,
    beta: f64,
    ground_energy: f64,
    eigenvalues: nd::Array1<f64>,
    weights: nd::Array1<f64>,
    z_part: f64,
}

impl<'a> DensityMatrixPart<'a> {
    /// Create a new part from a diagonalized block and the global ground
    /// energy.
    pub fn new(
        states: &'a StatesClassification,
        hpart: &'a HamiltonianPart,
        beta: f64,
        ground_energy: f64,
    ) -> EdResult<Self>
    {
        let eigenvalues = hpart.eigenvalues()?.clone();
        let weights = nd::Array1::zeros(eigenvalues.len());
        Ok(Self {
            states,
            hpart,
            beta,
            ground_energy,
            eigenvalues,
            weights,
            z_part: 0.0,
        })
    }

    /// Compute unnormalized Boltzmann weights, returning their sum.
    pub fn compute_unnormalized(&mut self) -> f64 {
        let beta = self.beta;
        let e0 = self.ground_energy;
        self.weights = self.eigenvalues.mapv(|e| (-beta * (e - e0)).exp());
        self.z_part = self.weights.sum();
        self.z_part
    }

    /// Divide all weights by the total partition function.
    pub fn normalize(&mut self, z: f64) {
        self.weights /= z;
        self.z_part /= z;
    }

    /// Return the block number.
    pub fn block(&self) -> BlockNumber { self.hpart.block() }

    /// Return the weight of an eigenstate of the block.
    pub fn weight(&self, inner: InnerQuantumState) -> EdResult<f64> {
        self.weights.get(inner).copied()
            .ok_or(EdError::InnerStateOutOfRange {
                block: self.block(),
                inner,
                size: self.weights.len(),
            })
    }

    /// Return all weights of the block.
    pub fn weights(&self) -> &nd::Array1<f64> { &self.weights }

    /// Return the eigenvalues the weights were computed from.
    pub fn eigenvalues(&self) -> &nd::Array1<f64> { &self.eigenvalues }

    /// Return the total weight of the block.
    pub fn partition_function(&self) -> f64 { self.z_part }

    /// Return `Σ_i w_i E_i` over the block.
    pub fn average_energy(&self) -> f64 {
        self.weights.dot(&self.eigenvalues)
    }

    /// Return `Σ_i w_i <i|f|i>` over the block for a quantity `f` that is
    /// diagonal in the Fock basis.
    pub fn average_diagonal<F>(&self, f: F) -> EdResult<f64>
    where F: Fn(&FockState) -> f64
    {
        let V = self.hpart.eigenvectors()?;
        let fk: nd::Array1<f64>
            = self.states.block_states(self.block())?.iter()
            .map(|q| self.states.fock_state(*q).map(|s| f(&s)))
            .collect::<EdResult<_>>()?;
        // probability of basis state k in eigenstate i: |V_ki|^2
        let probs: nd::Array2<f64> = V.mapv(|v| v.norm_sqr());
        Ok(fk.dot(&probs.dot(&self.weights)))
    }

    /// Return the average total particle number over the block.
    pub fn average_occupancy(&self) -> EdResult<f64> {
        self.average_diagonal(|s| f64::from(s.count()))
    }

    /// Return the average of `n_i n_j` over the block.
    pub fn average_double_occupancy(&self, i: ParticleIndex, j: ParticleIndex)
        -> EdResult<f64>
    {
        self.average_diagonal(|s| if s.test(i) && s.test(j) { 1.0 } else { 0.0 })
    }

    /// Return `Σ_i w_i <i|O|i>` over the block.
    ///
    /// Matrix elements of `O` leading out of the block do not contribute.
    pub fn average_operator<T>(&self, op: &T) -> EdResult<MelemType>
    where T: Operator + ?Sized
    {
        let V = self.hpart.eigenvectors()?;
        let block = self.block();
        let size = self.weights.len();
        let mut matrix: nd::Array2<C64> = nd::Array2::zeros((size, size));
        for (k, q) in self.states.block_states(block)?.iter().enumerate() {
            for (bra, melem) in op.act_right(&self.states.fock_state(*q)?) {
                let q_bra = bra.quantum_state();
                if self.states.block_number(q_bra)? == block {
                    matrix[[self.states.inner_state(q_bra)?, k]] += melem;
                }
            }
        }
        // diag(V† O V) weighted by w
        let rotated: nd::Array2<C64>
            = V.t().mapv(|v| v.conj()).dot(&matrix.dot(V));
        Ok(
            rotated.diag().iter()
                .zip(&self.weights)
                .map(|(o, w)| *o * *w)
                .fold(C64::zero(), |acc, x| acc + x)
        )
    }

    fn save(&self, dir: &Path) -> EdResult<()> {
        storage::mkdir(dir)?;
        storage::write_array(dir, "weights", &self.weights)?;
        storage::write_array(dir, "eigenvalues", &self.eigenvalues)?;
        Ok(())
    }

    fn read(&self, dir: &Path) -> EdResult<(nd::Array1<f64>, nd::Array1<f64>)> {
        let weights: nd::Array1<f64> = storage::read_array(dir, "weights")?;
        let eigenvalues: nd::Array1<f64> = storage::read_array(dir, "eigenvalues")?;
        for stored in [&weights, &eigenvalues] {
            if stored.len() != self.hpart.size() {
                return Err(EdError::ShapeMismatch {
                    block: self.block(),
                    stored: stored.shape().to_vec(),
                    live: vec![self.hpart.size()],
                });
            }
        }
        Ok((weights, eigenvalues))
    }
}

/// The density matrix of the full Fock space, held as one
/// [`DensityMatrixPart`] per block.
pub struct DensityMatrix<'a> {
    states: &'a StatesClassification,
    hamiltonian: &'a Hamiltonian<'a>,
    beta: f64,
    status: ObjectStatus,
    parts: Vec<DensityMatrixPart<'a>>,
    z: f64,
}

impl<'a> DensityMatrix<'a> {
    /// Create a new density matrix at inverse temperature `beta`.
    ///
    /// Fails if `beta` is negative or not finite.
    pub fn new(
        states: &'a StatesClassification,
        hamiltonian: &'a Hamiltonian<'a>,
        beta: f64,
    ) -> EdResult<Self>
    {
        Ok(Self {
            states,
            hamiltonian,
            beta: check_beta(beta)?,
            status: ObjectStatus::Constructed,
            parts: Vec::new(),
            z: f64::NAN,
        })
    }

    /// Create one part per block of the Hamiltonian, sharing its ground
    /// energy.
    ///
    /// Fails if the Hamiltonian is not computed.
    pub fn prepare(&mut self) -> EdResult<()> {
        if self.status.is_prepared() { return Ok(()); }
        self.parts = self.build_parts()?;
        self.status.advance(ObjectStatus::Prepared);
        Ok(())
    }

    fn build_parts(&self) -> EdResult<Vec<DensityMatrixPart<'a>>> {
        let states = self.states;
        let hamiltonian = self.hamiltonian;
        let beta = self.beta;
        let ground_energy = hamiltonian.ground_energy()?;
        (0..states.number_of_blocks()?)
            .map(|block| {
                DensityMatrixPart::new(
                    states, hamiltonian.part(block)?, beta, ground_energy)
            })
            .collect()
    }

    /// Compute and normalize all weights.
    ///
    /// All block sums are reduced into the partition function before any
    /// block is normalized.
    pub fn compute(&mut self) -> EdResult<()> {
        if self.status.is_computed() { return Ok(()); }
        self.prepare()?;
        let z_parts: Vec<f64>
            = self.parts.par_iter_mut()
            .map(|part| part.compute_unnormalized())
            .collect();
        let z: f64 = z_parts.iter().sum();
        self.parts.par_iter_mut().for_each(|part| part.normalize(z));
        self.z = z;
        log::info!("beta = {}: partition function {} (relative to ground energy)", self.beta, z);
        self.status.advance(ObjectStatus::Computed);
        Ok(())
    }

    fn check_computed(&self) -> EdResult<()> {
        if self.status.is_computed() {
            Ok(())
        } else {
            Err(EdError::NotComputed("DensityMatrix"))
        }
    }

    /// Return the current status.
    pub fn status(&self) -> ObjectStatus { self.status }

    /// Return the inverse temperature.
    pub fn beta(&self) -> f64 { self.beta }

    /// Return the normalized weight of the eigenstate at a quantum state's
    /// position.
    pub fn weight(&self, state: QuantumState) -> EdResult<f64> {
        self.check_computed()?;
        let block = self.states.block_number(state)?;
        let inner = self.states.inner_state(state)?;
        self.parts[block].weight(inner)
    }

    /// Return the part for a block.
    pub fn part(&self, block: BlockNumber) -> EdResult<&DensityMatrixPart<'a>> {
        self.check_computed()?;
        self.parts.get(block)
            .ok_or(EdError::BlockOutOfRange(block, self.parts.len()))
    }

    /// Return the part for the block with given quantum numbers.
    pub fn part_by_quantum_numbers(&self, qn: &QuantumNumbers)
        -> EdResult<Option<&DensityMatrixPart<'a>>>
    {
        self.check_computed()?;
        Ok(self.states.find_block(qn)?.map(|block| &self.parts[block]))
    }

    /// Return the partition function relative to the ground energy,
    /// `Σ exp(-β (E_i - E0))`.
    pub fn partition_function(&self) -> EdResult<f64> {
        self.check_computed()?;
        Ok(self.z)
    }

    /// Return the free energy `E0 - ln(Z') / β`, where `Z'` is
    /// [`Self::partition_function`].
    ///
    /// Tends to the ground energy for large `β`. At `β = 0` it is `-∞`, or
    /// `NaN` for a zero-mode space, where `Z' = 1`.
    pub fn free_energy(&self) -> EdResult<f64> {
        self.check_computed()?;
        let e0 = self.hamiltonian.ground_energy()?;
        Ok(e0 - self.z.ln() / self.beta)
    }

    /// Return the thermal average of the energy.
    pub fn average_energy(&self) -> EdResult<f64> {
        self.check_computed()?;
        Ok(self.parts.iter().map(|part| part.average_energy()).sum())
    }

    /// Return the thermal average of the total particle number.
    pub fn average_occupancy(&self) -> EdResult<f64> {
        self.check_computed()?;
        self.parts.iter()
            .map(|part| part.average_occupancy())
            .sum()
    }

    /// Return the thermal average of `n_i n_j`.
    pub fn average_double_occupancy(&self, i: ParticleIndex, j: ParticleIndex)
        -> EdResult<f64>
    {
        self.check_computed()?;
        let modes = usize::from(self.states.modes());
        for k in [i, j] {
            if usize::from(k) >= modes {
                return Err(EdError::ParticleIndexOutOfRange(k, modes));
            }
        }
        self.parts.iter()
            .map(|part| part.average_double_occupancy(i, j))
            .sum()
    }

    /// Return the thermal average of an operator that conserves the quantum
    /// numbers of the classification.
    pub fn average_operator<T>(&self, op: &T) -> EdResult<MelemType>
    where T: Operator + ?Sized
    {
        self.check_computed()?;
        self.parts.iter()
            .map(|part| part.average_operator(op))
            .try_fold(C64::zero(), |acc, x| x.map(|x| acc + x))
    }

    /// Write the weights of all blocks under `<root>/DensityMatrix`.
    ///
    /// Fails if `self` is not computed.
    pub fn save(&self, root: &Path) -> EdResult<()> {
        self.check_computed()?;
        let dir = root.join("DensityMatrix");
        storage::mkdir(&dir)?;
        storage::write_scalar(&dir, "beta", self.beta)?;
        storage::write_scalar(&dir, "partition_function", self.z)?;
        for (n, part) in self.parts.iter().enumerate() {
            part.save(&storage::part_dir(&dir, n))?;
        }
        log::info!("saved DensityMatrix to {}", dir.display());
        Ok(())
    }

    /// Read weights from `<root>/DensityMatrix` in place of computing them.
    ///
    /// Fails if the stored temperature differs from `self.beta()` or the
    /// stored parts do not match the live block structure; in that case
    /// `self` keeps its previous status and values.
    pub fn load(&mut self, root: &Path) -> EdResult<()> {
        let dir = root.join("DensityMatrix");
        let stored_beta = storage::read_scalar(&dir, "beta")?;
        if stored_beta != self.beta {
            return Err(EdError::BetaMismatch { stored: stored_beta, live: self.beta });
        }
        let mut parts = self.build_parts()?;
        let stored = storage::count_parts(&dir)?;
        if stored != parts.len() {
            return Err(EdError::PartsMismatch { stored, live: parts.len() });
        }
        let z = storage::read_scalar(&dir, "partition_function")?;
        let data: Vec<(nd::Array1<f64>, nd::Array1<f64>)>
            = parts.iter().enumerate()
            .map(|(n, part)| part.read(&storage::part_dir(&dir, n)))
            .collect::<EdResult<_>>()?;
        for (part, (weights, eigenvalues)) in parts.iter_mut().zip(data) {
            part.z_part = weights.sum();
            part.weights = weights;
            part.eigenvalues = eigenvalues;
        }
        self.parts = parts;
        self.z = z;
        self.status.advance(ObjectStatus::Computed);
        log::info!("loaded DensityMatrix from {}", dir.display());
        Ok(())
    }
}
