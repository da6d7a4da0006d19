#![allow(dead_code, non_snake_case, non_upper_case_globals)]

//! Exact diagonalization of fermionic lattice Hamiltonians in a
//! symmetry-blocked Fock basis, with thermal averages from the grand-canonical
//! density matrix.

pub mod error;
pub mod status;
pub mod fock;
pub mod operators;
pub mod index;
pub mod symmetry;
pub mod classification;
pub mod hamiltonian;
pub mod density_matrix;
pub mod storage;
pub mod config;

pub use error::{ EdError, EdResult };
pub use status::ObjectStatus;
pub use fock::{
    BlockNumber,
    FockState,
    InnerQuantumState,
    ParticleIndex,
    QuantumState,
};
pub use operators::{ ElemOp, MelemType, Operator, OperatorSum, Term };
pub use index::{ IndexClassification, IndexInfo, Spin };
pub use symmetry::{ ParticleNumber, ParticleNumberSz, QuantumNumbers, Symmetry };
pub use classification::StatesClassification;
pub use hamiltonian::{ Hamiltonian, HamiltonianPart };
pub use density_matrix::{ DensityMatrix, DensityMatrixPart };
pub use config::Config;
