//! Assignment of particle indices to (site, orbital, spin) combinations.

use indexmap::IndexMap;
use serde::Deserialize;
use crate::{
    error::{ EdError, EdResult },
    fock::{ FockState, ParticleIndex },
};

/// Spin projection of a single mode.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Spin {
    /// Spin-down, mJ = -1/2
    Dn,
    /// Spin-up, mJ = +1/2
    Up,
}

impl Spin {
    /// Return the spin projection in units of ħ/2.
    pub fn halves(&self) -> i32 {
        match *self {
            Self::Dn => -1,
            Self::Up =>  1,
        }
    }
}

/// The site label, orbital, and spin of a single mode.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IndexInfo {
    pub site: String,
    pub orbital: u16,
    pub spin: Spin,
}

impl IndexInfo {
    pub fn new(site: impl Into<String>, orbital: u16, spin: Spin) -> Self {
        Self { site: site.into(), orbital, spin }
    }
}

/// Bijective map between [`IndexInfo`]s and [`ParticleIndex`]es.
///
/// Indices are assigned in construction order, which is preserved so that
/// persisted data stays addressable across runs. Backed by a single
/// [`IndexMap`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IndexClassification {
    indices: IndexMap<IndexInfo, ParticleIndex>,
}

impl IndexClassification {
    /// Create a new, empty classification.
    pub fn new() -> Self { Self::default() }

    /// Create a classification for a list of `(site label, number of
    /// orbitals)` pairs.
    ///
    /// For each site, indices run over orbitals with spin-down before spin-up.
    pub fn from_sites<I, L>(sites: I) -> EdResult<Self>
    where
        I: IntoIterator<Item = (L, u16)>,
        L: Into<String>,
    {
        let mut classification = Self::new();
        for (label, orbitals) in sites.into_iter() {
            let label: String = label.into();
            for spin in [Spin::Dn, Spin::Up] {
                for orbital in 0..orbitals {
                    classification.push(IndexInfo::new(label.clone(), orbital, spin))?;
                }
            }
        }
        Ok(classification)
    }

    /// Register a new mode, returning its index.
    ///
    /// Fails if the mode is already registered or the number of modes would
    /// exceed [`FockState::MAX_MODES`].
    pub fn push(&mut self, info: IndexInfo) -> EdResult<ParticleIndex> {
        if self.indices.contains_key(&info) {
            let IndexInfo { site, orbital, spin } = info;
            return Err(EdError::DuplicateIndex { site, orbital, spin });
        }
        let next = self.indices.len();
        if next >= FockState::MAX_MODES {
            return Err(EdError::TooManyModes(next + 1, FockState::MAX_MODES));
        }
        let index = next as ParticleIndex;
        self.indices.insert(info, index);
        Ok(index)
    }

    /// Return the total number of indices.
    pub fn index_size(&self) -> ParticleIndex { self.indices.len() as ParticleIndex }

    /// Return the index of a particular site, orbital, and spin.
    pub fn find_index(&self, site: &str, orbital: u16, spin: Spin)
        -> EdResult<ParticleIndex>
    {
        let info = IndexInfo::new(site, orbital, spin);
        self.indices.get(&info).copied()
            .ok_or(EdError::IndexNotFound { site: info.site, orbital, spin })
    }

    /// Return all indices belonging to a site, in ascending order.
    pub fn find_indices(&self, site: &str) -> EdResult<Vec<ParticleIndex>> {
        let found: Vec<ParticleIndex>
            = self.indices.iter()
            .filter(|(info, _)| info.site == site)
            .map(|(_, index)| *index)
            .collect();
        if found.is_empty() {
            Err(EdError::SiteNotFound(site.to_string()))
        } else {
            Ok(found)
        }
    }

    /// Return the site, orbital, and spin of an index.
    pub fn info(&self, index: ParticleIndex) -> EdResult<&IndexInfo> {
        self.indices.get_index(usize::from(index))
            .map(|(info, _)| info)
            .ok_or(EdError::ParticleIndexOutOfRange(index, self.indices.len()))
    }

    /// Return all indices with a given spin, in ascending order.
    pub fn spin_indices(&self, spin: Spin) -> Vec<ParticleIndex> {
        self.indices.iter()
            .filter(|(info, _)| info.spin == spin)
            .map(|(_, index)| *index)
            .collect()
    }

    /// Iterate over all modes in index order.
    pub fn iter(&self) -> impl Iterator<Item = (&IndexInfo, ParticleIndex)> + '_ {
        self.indices.iter().map(|(info, index)| (info, *index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_order_is_preserved() {
        let ic = IndexClassification::from_sites([("A", 2), ("B", 1)]).unwrap();
        assert_eq!(ic.index_size(), 6);
        assert_eq!(ic.find_index("A", 0, Spin::Dn).unwrap(), 0);
        assert_eq!(ic.find_index("A", 1, Spin::Dn).unwrap(), 1);
        assert_eq!(ic.find_index("A", 0, Spin::Up).unwrap(), 2);
        assert_eq!(ic.find_index("B", 0, Spin::Up).unwrap(), 5);
        assert_eq!(ic.find_indices("B").unwrap(), vec![4, 5]);
        assert_eq!(ic.info(3).unwrap(), &IndexInfo::new("A", 1, Spin::Up));
        assert_eq!(ic.spin_indices(Spin::Up), vec![2, 3, 5]);
        for (info, index) in ic.iter() {
            assert_eq!(ic.find_index(&info.site, info.orbital, info.spin).unwrap(), index);
        }
    }

    #[test]
    fn lookup_failures() {
        let ic = IndexClassification::from_sites([("A", 1)]).unwrap();
        assert!(matches!(ic.find_indices("C"), Err(EdError::SiteNotFound(_))));
        assert!(matches!(
            ic.find_index("A", 3, Spin::Up),
            Err(EdError::IndexNotFound { .. })
        ));
        assert!(matches!(ic.info(2), Err(EdError::ParticleIndexOutOfRange(2, 2))));
    }

    #[test]
    fn duplicates_are_rejected() {
        let mut ic = IndexClassification::new();
        ic.push(IndexInfo::new("A", 0, Spin::Up)).unwrap();
        assert!(matches!(
            ic.push(IndexInfo::new("A", 0, Spin::Up)),
            Err(EdError::DuplicateIndex { .. })
        ));
    }
}
