//! Run configuration read from TOML.
//!
//! ```toml
//! beta = 10.0
//! threads = 4
//! storage = "output"
//! symmetry = "particle-number-sz"
//!
//! [[sites]]
//! label = "A"
//! orbitals = 1
//! ```

use std::{ fs, path::{ Path, PathBuf } };
use serde::Deserialize;
use crate::{
    error::EdResult,
    density_matrix::check_beta,
    index::IndexClassification,
    symmetry::{ ParticleNumber, ParticleNumberSz, Symmetry },
};

/// Choice of conserved quantum numbers.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SymmetryKind {
    ParticleNumber,
    #[default]
    ParticleNumberSz,
}

/// A lattice site carrying some number of spinful orbitals.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct SiteConfig {
    pub label: String,
    #[serde(default = "one")]
    pub orbitals: u16,
}

fn one() -> u16 { 1 }

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Config {
    /// Inverse temperature.
    pub beta: f64,
    /// Size of the global worker pool; `None` lets rayon decide.
    #[serde(default)]
    pub threads: Option<usize>,
    /// Directory to which results are written, if any.
    #[serde(default)]
    pub storage: Option<PathBuf>,
    #[serde(default)]
    pub symmetry: SymmetryKind,
    pub sites: Vec<SiteConfig>,
}

impl Config {
    /// Parse a configuration from a TOML string.
    ///
    /// Fails on malformed input or an invalid `beta`.
    pub fn from_toml(src: &str) -> EdResult<Self> {
        let config: Self = toml::from_str(src)?;
        check_beta(config.beta)?;
        Ok(config)
    }

    /// Read and parse a configuration file.
    pub fn from_file(path: &Path) -> EdResult<Self> {
        Self::from_toml(&fs::read_to_string(path)?)
    }

    /// Build the mode indices for all configured sites.
    pub fn index_classification(&self) -> EdResult<IndexClassification> {
        IndexClassification::from_sites(
            self.sites.iter().map(|site| (site.label.as_str(), site.orbitals))
        )
    }

    /// Build the configured label functional over a set of indices.
    pub fn symmetry(&self, indices: &IndexClassification)
        -> EdResult<Box<dyn Symmetry + Send>>
    {
        Ok(match self.symmetry {
            SymmetryKind::ParticleNumber => Box::new(ParticleNumber),
            SymmetryKind::ParticleNumberSz
                => Box::new(ParticleNumberSz::from_indices(indices)?),
        })
    }

    /// Size the global rayon pool if `threads` is set.
    ///
    /// Fails if the global pool has already been initialized.
    pub fn init_thread_pool(&self) -> EdResult<()> {
        if let Some(n) = self.threads {
            rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build_global()?;
            log::info!("using {n} worker threads");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ error::EdError, fock::FockState, index::Spin };

    const CONFIG: &str = r#"
        beta = 2.5
        storage = "out"
        symmetry = "particle-number-sz"

        [[sites]]
        label = "A"
        orbitals = 2

        [[sites]]
        label = "B"
    "#;

    #[test]
    fn parse() {
        let config = Config::from_toml(CONFIG).unwrap();
        assert_eq!(config.beta, 2.5);
        assert_eq!(config.threads, None);
        assert_eq!(config.storage, Some(PathBuf::from("out")));
        assert_eq!(config.symmetry, SymmetryKind::ParticleNumberSz);
        assert_eq!(config.sites[1].orbitals, 1);

        let indices = config.index_classification().unwrap();
        assert_eq!(indices.index_size(), 6);
        assert_eq!(indices.find_index("A", 1, Spin::Up).unwrap(), 3);
        assert_eq!(indices.find_index("B", 0, Spin::Dn).unwrap(), 4);

        let symmetry = config.symmetry(&indices).unwrap();
        let s = FockState::from_occupied([2, 4], 6).unwrap();
        assert_eq!(symmetry.quantum_numbers(&s), [2, 0].into());
    }

    #[test]
    fn defaults_and_errors() {
        let config = Config::from_toml(
            "beta = 1.0\nsymmetry = \"particle-number\"\nsites = []\n"
        ).unwrap();
        assert_eq!(config.symmetry, SymmetryKind::ParticleNumber);
        assert!(config.storage.is_none());
        assert!(matches!(
            Config::from_toml("beta = -1.0\nsites = []\n"),
            Err(EdError::InvalidBeta(_))
        ));
        assert!(matches!(
            Config::from_toml("sites = []\n"),
            Err(EdError::Config(_))
        ));
        assert!(matches!(
            Config::from_toml("beta = 1.0\nsymmetry = \"parity\"\nsites = []\n"),
            Err(EdError::Config(_))
        ));
    }

    #[test]
    fn from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.toml");
        fs::write(&path, CONFIG).unwrap();
        assert_eq!(Config::from_file(&path).unwrap(), Config::from_toml(CONFIG).unwrap());
        assert!(matches!(
            Config::from_file(&dir.path().join("missing.toml")),
            Err(EdError::IO(_))
        ));
    }
}
