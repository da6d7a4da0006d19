//! Frequently used operators with closed-form matrix elements.

use num_complex::Complex64 as C64;
use rustc_hash::FxHashMap as HashMap;
use crate::{
    error::{ EdError, EdResult },
    fock::{ FockState, ParticleIndex },
    operators::{ ElemOp, MelemType, Operator, Term },
};

fn number_term(coeff: f64, i: ParticleIndex) -> Term {
    Term::new(coeff, [ElemOp::Create(i), ElemOp::Annihilate(i)])
}

fn diagonal_action(ket: &FockState, melem: MelemType)
    -> HashMap<FockState, MelemType>
{
    let mut output: HashMap<FockState, MelemType> = HashMap::default();
    if melem != C64::from(0.0) {
        output.insert(*ket, melem);
    }
    output
}

/// Total particle number operator `N = Σ_i c†_i c_i`.
#[derive(Clone, Debug, PartialEq)]
pub struct N {
    modes: ParticleIndex,
    terms: Vec<Term>,
}

impl N {
    /// Create a new number operator over `modes` modes.
    pub fn new(modes: ParticleIndex) -> Self {
        let terms = (0..modes).map(|i| number_term(1.0, i)).collect();
        Self { modes, terms }
    }

    /// Return the number of modes.
    pub fn modes(&self) -> ParticleIndex { self.modes }

    /// Diagonal matrix element `<ket|N|ket>`.
    pub fn diagonal(&self, ket: &FockState) -> MelemType {
        C64::from(f64::from(ket.count()))
    }
}

impl Operator for N {
    fn terms(&self) -> &[Term] { &self.terms }

    fn act_right(&self, ket: &FockState) -> HashMap<FockState, MelemType> {
        diagonal_action(ket, self.diagonal(ket))
    }

    fn matrix_element(&self, bra: &FockState, ket: &FockState) -> MelemType {
        if bra == ket { self.diagonal(ket) } else { C64::from(0.0) }
    }
}

/// Spin projection operator
/// `Sz = 1/2 Σ_i (c†_{i↑} c_{i↑} - c†_{i↓} c_{i↓})`.
#[derive(Clone, Debug, PartialEq)]
pub struct Sz {
    up: Vec<ParticleIndex>,
    down: Vec<ParticleIndex>,
    terms: Vec<Term>,
}

impl Sz {
    /// Create a new `Sz` from paired lists of spin-up and spin-down indices.
    ///
    /// Fails if the lists have unequal lengths.
    pub fn new(up: Vec<ParticleIndex>, down: Vec<ParticleIndex>)
        -> EdResult<Self>
    {
        if up.len() != down.len() {
            return Err(EdError::SpinIndicesMismatch(up.len(), down.len()));
        }
        let terms
            = up.iter().zip(&down)
            .flat_map(|(u, d)| [number_term(0.5, *u), number_term(-0.5, *d)])
            .collect();
        Ok(Self { up, down, terms })
    }

    /// Create a new `Sz` for `modes` modes, where the lower half of all indices
    /// are spin-down and the upper half are spin-up.
    ///
    /// Fails if `modes` is odd.
    pub fn from_halves(modes: ParticleIndex) -> EdResult<Self> {
        let half = modes / 2;
        Self::new((half..modes).collect(), (0..half).collect())
    }

    /// Return the spin-up indices.
    pub fn up(&self) -> &[ParticleIndex] { &self.up }

    /// Return the spin-down indices.
    pub fn down(&self) -> &[ParticleIndex] { &self.down }

    /// Diagonal matrix element `<ket|Sz|ket>`.
    pub fn diagonal(&self, ket: &FockState) -> MelemType {
        let n_up = self.up.iter().filter(|i| ket.test(**i)).count() as f64;
        let n_dn = self.down.iter().filter(|i| ket.test(**i)).count() as f64;
        C64::from(0.5 * (n_up - n_dn))
    }
}

impl Operator for Sz {
    fn terms(&self) -> &[Term] { &self.terms }

    fn act_right(&self, ket: &FockState) -> HashMap<FockState, MelemType> {
        diagonal_action(ket, self.diagonal(ket))
    }

    fn matrix_element(&self, bra: &FockState, ket: &FockState) -> MelemType {
        if bra == ket { self.diagonal(ket) } else { C64::from(0.0) }
    }
}

/// Creation operator `c†_i`.
#[derive(Clone, Debug, PartialEq)]
pub struct Cdag {
    index: ParticleIndex,
    terms: Vec<Term>,
}

impl Cdag {
    /// Create a new creation operator on mode `index`.
    pub fn new(index: ParticleIndex) -> Self {
        Self { index, terms: vec![Term::new(1.0, [ElemOp::Create(index)])] }
    }

    /// Return the mode acted on.
    pub fn index(&self) -> ParticleIndex { self.index }
}

impl Operator for Cdag {
    fn terms(&self) -> &[Term] { &self.terms }
}

/// Annihilation operator `c_i`.
#[derive(Clone, Debug, PartialEq)]
pub struct C {
    index: ParticleIndex,
    terms: Vec<Term>,
}

impl C {
    /// Create a new annihilation operator on mode `index`.
    pub fn new(index: ParticleIndex) -> Self {
        Self { index, terms: vec![Term::new(1.0, [ElemOp::Annihilate(index)])] }
    }

    /// Return the mode acted on.
    pub fn index(&self) -> ParticleIndex { self.index }
}

impl Operator for C {
    fn terms(&self) -> &[Term] { &self.terms }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operators::OperatorSum;

    fn all_states(modes: ParticleIndex) -> impl Iterator<Item = FockState> {
        (0..1_u64 << modes).map(move |bits| FockState::from_bits(bits, modes).unwrap())
    }

    #[test]
    fn number_operator_on_two_modes() {
        let n = N::new(2);
        let s01 = FockState::from_occupied([1], 2).unwrap();
        let s11 = FockState::from_occupied([0, 1], 2).unwrap();
        let s00 = FockState::vacuum(2).unwrap();
        assert_eq!(n.matrix_element(&s01, &s01), C64::from(1.0));
        assert_eq!(n.matrix_element(&s11, &s11), C64::from(2.0));
        assert_eq!(n.matrix_element(&s00, &s00), C64::from(0.0));
        assert_eq!(n.matrix_element(&s01, &s11), C64::from(0.0));
    }

    #[test]
    fn presets_match_generic_expansion() {
        let n = N::new(4);
        let sz = Sz::from_halves(4).unwrap();
        let n_generic: OperatorSum = n.terms().iter().cloned().collect();
        let sz_generic: OperatorSum = sz.terms().iter().cloned().collect();
        for ket in all_states(4) {
            assert_eq!(n.act_right(&ket), n_generic.act_right(&ket));
            assert_eq!(sz.act_right(&ket), sz_generic.act_right(&ket));
        }
    }

    #[test]
    fn sz_values() {
        let sz = Sz::new(vec![1], vec![0]).unwrap();
        assert_eq!(sz.diagonal(&FockState::from_occupied([1], 2).unwrap()), C64::from(0.5));
        assert_eq!(sz.diagonal(&FockState::from_occupied([0], 2).unwrap()), C64::from(-0.5));
        assert_eq!(sz.diagonal(&FockState::from_occupied([0, 1], 2).unwrap()), C64::from(0.0));
    }

    #[test]
    fn sz_rejects_unequal_spin_lists() {
        assert!(matches!(
            Sz::new(vec![0, 1], vec![2]),
            Err(EdError::SpinIndicesMismatch(2, 1))
        ));
        assert!(Sz::from_halves(3).is_err());
    }

    #[test]
    fn creation_annihilation_nilpotent() {
        let cdag = Cdag::new(1);
        let c = C::new(1);
        for ket in all_states(3) {
            let once = cdag.act_right(&ket);
            for state in once.keys() {
                assert!(cdag.act_right(state).is_empty());
            }
            if !ket.test(1) {
                assert!(c.act_right(&ket).is_empty());
            }
        }
    }
}
