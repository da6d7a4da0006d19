//! Second-quantized operators as sums of products of elementary creation and
//! annihilation operators.

use std::ops::{ Add, AddAssign };
use num_complex::Complex64 as C64;
use num_traits::Zero;
use rustc_hash::FxHashMap as HashMap;
use crate::fock::{ FockState, ParticleIndex };

pub mod presets;
pub use presets::{ C, Cdag, N, Sz };

/// Type of a single matrix element.
pub type MelemType = C64;

/// An elementary fermionic operator acting on a single mode.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ElemOp {
    /// Creation operator `c†_i`.
    Create(ParticleIndex),
    /// Annihilation operator `c_i`.
    Annihilate(ParticleIndex),
}

impl ElemOp {
    /// Return the mode acted on.
    pub fn index(&self) -> ParticleIndex {
        match *self {
            Self::Create(i) | Self::Annihilate(i) => i,
        }
    }

    /// Takes `Create` variants to `Annihilate` and vice-versa, leaving the
    /// mode invariant.
    pub fn adjoint(self) -> Self {
        match self {
            Self::Create(i) => Self::Annihilate(i),
            Self::Annihilate(i) => Self::Create(i),
        }
    }

    /// Act on a basis state, returning the result and its fermionic sign, or
    /// `None` if the state is annihilated.
    pub fn act(&self, ket: &FockState) -> Option<(FockState, f64)> {
        match *self {
            Self::Create(i) => ket.create(i),
            Self::Annihilate(i) => ket.annihilate(i),
        }
    }
}

/// A scalar coefficient times an ordered product of elementary operators.
///
/// The product `ops[0] ops[1] ... ops[n - 1]` acts on a ket from the right, so
/// the last operator is applied first.
#[derive(Clone, Debug, PartialEq)]
pub struct Term {
    pub coeff: MelemType,
    pub ops: Vec<ElemOp>,
}

impl Term {
    /// Create a new term.
    pub fn new<A, I>(coeff: A, ops: I) -> Self
    where
        A: Into<MelemType>,
        I: IntoIterator<Item = ElemOp>,
    {
        Self { coeff: coeff.into(), ops: ops.into_iter().collect() }
    }

    /// Act on a basis state, returning the resulting state and accumulated
    /// matrix element, or `None` if any factor annihilates the state.
    pub fn act(&self, ket: &FockState) -> Option<(FockState, MelemType)> {
        self.ops.iter().rev()
            .try_fold((*ket, 1.0), |(state, sign), op| {
                op.act(&state).map(|(next, s)| (next, sign * s))
            })
            .map(|(state, sign)| (state, self.coeff * sign))
    }

    /// Return the Hermitian conjugate of `self`.
    pub fn adjoint(&self) -> Self {
        Self {
            coeff: self.coeff.conj(),
            ops: self.ops.iter().rev().map(|op| op.adjoint()).collect(),
        }
    }
}

/// Basic requirements for any operator.
///
/// Implementors only need to provide their expansion in [`Term`]s; closed-form
/// shortcuts may override [`Self::act_right`] and [`Self::matrix_element`],
/// but must agree with the generic definitions.
pub trait Operator: Sync {
    /// Return the expansion of `self` as a sum of terms.
    fn terms(&self) -> &[Term];

    /// Apply `self` to a ket, returning every resulting basis state with a
    /// non-zero matrix element.
    fn act_right(&self, ket: &FockState) -> HashMap<FockState, MelemType> {
        let mut output: HashMap<FockState, MelemType> = HashMap::default();
        self.terms().iter()
            .filter_map(|term| term.act(ket))
            .for_each(|(state, melem)| {
                *output.entry(state).or_insert_with(MelemType::zero) += melem;
            });
        output.retain(|_, melem| !melem.is_zero());
        output
    }

    /// Compute `<bra|self|ket>`.
    fn matrix_element(&self, bra: &FockState, ket: &FockState) -> MelemType {
        self.act_right(ket).get(bra).copied().unwrap_or_else(MelemType::zero)
    }
}

/// A generic operator assembled from arbitrary terms.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OperatorSum {
    terms: Vec<Term>,
}

impl OperatorSum {
    /// Create a new operator with no terms (the zero operator).
    pub fn new() -> Self { Self::default() }

    /// Add a term to `self`.
    pub fn add_term<A, I>(&mut self, coeff: A, ops: I) -> &mut Self
    where
        A: Into<MelemType>,
        I: IntoIterator<Item = ElemOp>,
    {
        self.terms.push(Term::new(coeff, ops));
        self
    }

    /// Builder-style version of [`Self::add_term`].
    pub fn with_term<A, I>(mut self, coeff: A, ops: I) -> Self
    where
        A: Into<MelemType>,
        I: IntoIterator<Item = ElemOp>,
    {
        self.add_term(coeff, ops);
        self
    }

    /// Add every term of another operator to `self`.
    pub fn add_operator<O>(&mut self, other: &O) -> &mut Self
    where O: Operator + ?Sized
    {
        self.terms.extend(other.terms().iter().cloned());
        self
    }

    /// Return the Hermitian conjugate of `self`.
    pub fn adjoint(&self) -> Self {
        self.terms.iter().map(Term::adjoint).collect()
    }

    /// Return the number of terms.
    pub fn len(&self) -> usize { self.terms.len() }

    /// Return `true` if `self` has no terms.
    pub fn is_empty(&self) -> bool { self.terms.is_empty() }
}

impl Operator for OperatorSum {
    fn terms(&self) -> &[Term] { &self.terms }
}

impl From<Vec<Term>> for OperatorSum {
    fn from(terms: Vec<Term>) -> Self { Self { terms } }
}

impl FromIterator<Term> for OperatorSum {
    fn from_iter<I>(iter: I) -> Self
    where I: IntoIterator<Item = Term>
    {
        Self { terms: iter.into_iter().collect() }
    }
}

impl AddAssign for OperatorSum {
    fn add_assign(&mut self, rhs: Self) { self.terms.extend(rhs.terms); }
}

impl Add for OperatorSum {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self::Output {
        self += rhs;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ElemOp::*;

    #[test]
    fn term_acts_right_to_left() {
        // c_0 |10> = +|00>, then c†_1 |00> = +|01>
        let hop = Term::new(1.0, [Create(1), Annihilate(0)]);
        let ket = FockState::from_occupied([0], 2).unwrap();
        let (state, melem) = hop.act(&ket).unwrap();
        assert_eq!(state, FockState::from_occupied([1], 2).unwrap());
        assert_eq!(melem, C64::from(1.0));
        // c†_0 c_1 |11> vanishes by Pauli exclusion
        let back = Term::new(1.0, [Create(0), Annihilate(1)]);
        assert!(back.act(&FockState::from_occupied([0, 1], 2).unwrap()).is_none());
    }

    #[test]
    fn fermionic_sign_in_products() {
        // c†_0 c†_1 |00> = |11> with sign +1, c†_1 c†_0 |00> = -|11>
        let vac = FockState::vacuum(2).unwrap();
        let a = Term::new(1.0, [Create(0), Create(1)]).act(&vac).unwrap();
        let b = Term::new(1.0, [Create(1), Create(0)]).act(&vac).unwrap();
        assert_eq!(a.0, b.0);
        assert_eq!(a.1, -b.1);
    }

    #[test]
    fn double_creation_vanishes() {
        let op = OperatorSum::new().with_term(1.0, [Create(1), Create(1)]);
        for bits in 0..4 {
            assert!(op.act_right(&FockState::from_bits(bits, 2).unwrap()).is_empty());
        }
    }

    #[test]
    fn cancelling_terms_are_dropped() {
        let op
            = OperatorSum::new()
            .with_term(1.0, [Create(0), Annihilate(0)])
            .with_term(-1.0, [Create(0), Annihilate(0)]);
        assert!(op.act_right(&FockState::from_occupied([0], 1).unwrap()).is_empty());
    }

    #[test]
    fn adjoint_of_hopping() {
        let hop
            = OperatorSum::new()
            .with_term(C64::new(0.5, 0.25), [Create(1), Annihilate(0)]);
        let adj = hop.adjoint();
        let k0 = FockState::from_occupied([0], 2).unwrap();
        let k1 = FockState::from_occupied([1], 2).unwrap();
        assert_eq!(adj.matrix_element(&k0, &k1), hop.matrix_element(&k1, &k0).conj());
        let herm = hop.clone() + adj;
        assert_eq!(herm.len(), 2);
        assert_eq!(herm.matrix_element(&k0, &k1), herm.matrix_element(&k1, &k0).conj());
    }
}
