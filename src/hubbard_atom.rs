//! Thermodynamics of decoupled Hubbard atoms, `H = Σ U n_↑ n_↓ - μ N`.
//!
//! Usage: `hubbard_atom [config.toml]`. Besides the run configuration, the
//! file may hold a `[hubbard]` table with `u` and `mu`; half filling is the
//! default.

use std::{ fs, path::PathBuf, process::ExitCode };
use serde::Deserialize;
use fock_ed::{
    config::Config,
    error::EdResult,
    index::{ IndexClassification, Spin },
    operators::{ ElemOp::*, N, OperatorSum },
    DensityMatrix,
    Hamiltonian,
    StatesClassification,
};

const DEFAULT_CONFIG: &str = r#"
    beta = 10.0
    symmetry = "particle-number-sz"

    [[sites]]
    label = "A"
"#;

#[derive(Clone, Debug, Deserialize)]
struct HubbardParams {
    u: f64,
    mu: Option<f64>,
}

impl Default for HubbardParams {
    fn default() -> Self { Self { u: 1.0, mu: None } }
}

#[derive(Debug, Default, Deserialize)]
struct HubbardFile {
    #[serde(default)]
    hubbard: HubbardParams,
}

fn hubbard_hamiltonian(
    indices: &IndexClassification,
    params: &HubbardParams,
) -> EdResult<OperatorSum>
{
    let mu = params.mu.unwrap_or(params.u / 2.0);
    let mut H = OperatorSum::new();
    for (info, dn) in indices.iter() {
        if info.spin != Spin::Dn { continue; }
        let up = indices.find_index(&info.site, info.orbital, Spin::Up)?;
        H.add_term(params.u, [Create(up), Annihilate(up), Create(dn), Annihilate(dn)]);
    }
    for (_, i) in indices.iter() {
        H.add_term(-mu, [Create(i), Annihilate(i)]);
    }
    Ok(H)
}

fn run(src: &str) -> EdResult<()> {
    let config = Config::from_toml(src)?;
    let params = toml::from_str::<HubbardFile>(src)?.hubbard;
    config.init_thread_pool()?;

    let indices = config.index_classification()?;
    let mut states = StatesClassification::from_boxed(
        indices.index_size(), config.symmetry(&indices)?)?;
    states.compute();

    let H = hubbard_hamiltonian(&indices, &params)?;
    let mut hamiltonian = Hamiltonian::new(&states, &H)?;
    hamiltonian.compute()?;

    let mut rho = DensityMatrix::new(&states, &hamiltonian, config.beta)?;
    rho.compute()?;

    println!("modes:              {}", indices.index_size());
    println!("blocks:             {}", states.number_of_blocks()?);
    println!("ground energy:      {:.12}", hamiltonian.ground_energy()?);
    println!("beta:               {}", rho.beta());
    println!("Z exp(beta E0):     {:.12}", rho.partition_function()?);
    println!("free energy:        {:.12}", rho.free_energy()?);
    println!("<H>:                {:.12}", rho.average_energy()?);
    println!("<N>:                {:.12}", rho.average_occupancy()?);
    println!("<N> (operator):     {:.12}", rho.average_operator(&N::new(indices.index_size()))?.re);
    for (info, dn) in indices.iter() {
        if info.spin != Spin::Dn { continue; }
        let up = indices.find_index(&info.site, info.orbital, Spin::Up)?;
        println!(
            "<n_up n_dn> ({}, {}): {:.12}",
            info.site, info.orbital, rho.average_double_occupancy(up, dn)?,
        );
    }

    if let Some(outdir) = config.storage.as_ref() {
        hamiltonian.save(outdir)?;
        rho.save(outdir)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let src = match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => match fs::read_to_string(&path) {
            Ok(src) => src,
            Err(err) => {
                log::error!("couldn't read {}: {err}", path.display());
                return ExitCode::FAILURE;
            },
        },
        None => {
            log::info!("no config given; using a single half-filled atom");
            DEFAULT_CONFIG.to_string()
        },
    };
    match run(&src) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        },
    }
}
