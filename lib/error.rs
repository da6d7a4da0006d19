//! Error type shared by all stages of the diagonalization pipeline.

use std::path::PathBuf;
use thiserror::Error;
use crate::{
    fock::{ BlockNumber, InnerQuantumState, ParticleIndex, QuantumState },
    index::Spin,
};

#[derive(Debug, Error)]
pub enum EdError {
    /// Returned when a quantity is requested from an object that has not
    /// reached the required stage of its lifecycle.
    #[error("{0} is not computed yet")]
    NotComputed(&'static str),

    /// Returned when a Fock space is requested over more modes than fit in a
    /// single machine word.
    #[error("error in Fock space creation: {0} modes exceed the maximum of {1}")]
    TooManyModes(usize, usize),

    /// Returned when a quantum state lies outside of the Fock space.
    #[error("quantum state {0} is out of range for a space of dimension {1}")]
    QuantumStateOutOfRange(QuantumState, usize),

    /// Returned when a block number does not exist.
    #[error("block {0} is out of range; there are {1} blocks")]
    BlockOutOfRange(BlockNumber, usize),

    /// Returned when an inner state does not exist in its block.
    #[error("inner state {inner} is out of range for block {block} of size {size}")]
    InnerStateOutOfRange {
        block: BlockNumber,
        inner: InnerQuantumState,
        size: usize,
    },

    /// Returned when a particle index is not below the number of modes.
    #[error("particle index {0} is out of range for {1} modes")]
    ParticleIndexOutOfRange(ParticleIndex, usize),

    /// Returned when no index is assigned to a site label.
    #[error("site '{0}' not found")]
    SiteNotFound(String),

    /// Returned when no index is assigned to a (site, orbital, spin) triple.
    #[error("no index for site '{site}', orbital {orbital}, spin {spin:?}")]
    IndexNotFound {
        site: String,
        orbital: u16,
        spin: Spin,
    },

    /// Returned when the same (site, orbital, spin) triple is registered
    /// twice.
    #[error("duplicate index for site '{site}', orbital {orbital}, spin {spin:?}")]
    DuplicateIndex {
        site: String,
        orbital: u16,
        spin: Spin,
    },

    /// Returned when spin-up and spin-down index lists differ in length.
    #[error("unequal numbers of spin-up ({0}) and spin-down ({1}) indices")]
    SpinIndicesMismatch(usize, usize),

    /// Returned for an inverse temperature that is negative or not finite.
    #[error("invalid inverse temperature {0}")]
    InvalidBeta(f64),

    /// Returned when an operator maps a state of one block into another block.
    #[error("operator couples block {from} to block {to}; it does not conserve the chosen quantum numbers")]
    BlockMismatch {
        from: BlockNumber,
        to: BlockNumber,
    },

    /// Returned when a block of the Hamiltonian is not Hermitian.
    #[error("Hamiltonian block {block} is not Hermitian (max deviation {deviation:e})")]
    NotHermitian {
        block: BlockNumber,
        deviation: f64,
    },

    /// Returned when stored data belongs to a different temperature.
    #[error("stored data is for beta = {stored}, but the live value is {live}")]
    BetaMismatch {
        stored: f64,
        live: f64,
    },

    /// Returned when the number of stored parts differs from the number of
    /// blocks.
    #[error("inconsistent number of stored parts: found {stored}, expected {live}")]
    PartsMismatch {
        stored: usize,
        live: usize,
    },

    /// Returned when a stored array has the wrong shape for its block.
    #[error("stored data for block {block} has shape {stored:?}, expected {live:?}")]
    ShapeMismatch {
        block: BlockNumber,
        stored: Vec<usize>,
        live: Vec<usize>,
    },

    #[error("diagonalization error: {0}")]
    Linalg(#[from] ndarray_linalg::error::LinalgError),

    #[error("error reading {path}: {source}")]
    ReadNpy {
        path: PathBuf,
        source: ndarray_npy::ReadNpyError,
    },

    #[error("error writing {path}: {source}")]
    WriteNpy {
        path: PathBuf,
        source: ndarray_npy::WriteNpyError,
    },

    #[error("I/O error: {0}")]
    IO(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
pub type EdResult<T> = Result<T, EdError>;
