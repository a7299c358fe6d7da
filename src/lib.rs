use anyhow::{Context, Result};
use log::{debug, info};
use serde::Deserialize;
use std::fs;

pub mod beamline;
pub mod cache;
pub mod elements;
pub mod error;
pub mod init;
pub mod kernels;
pub mod maps;
pub mod observers;
pub mod propagator;
pub mod prtls;
pub mod reference;
mod save;

pub use beamline::Beamline;
pub use cache::MapCache;
pub use elements::{Drift, Element, ElementKind, Fringe, Multipole, Quadrupole, SBend, Sextupole};
pub use error::OpticsError;
pub use maps::{compute_transfer_map, Matrix, Tensor, TransferMap};
pub use observers::{BeamStatistics, ElementStatistics};
pub use propagator::{linear_matrix, propagate, propagate_cached, Observer, Propagator};
pub use prtls::ParticleBatch;
pub use reference::{Reference, Tracking};

// We use a type alias for f64/Float to easily support
// double and single precision.
#[cfg(feature = "dprec")]
pub type Float = f64;

#[cfg(not(feature = "dprec"))]
pub type Float = f32;

#[cfg(feature = "dprec")]
pub const E_TOL: Float = 1E-12;

#[cfg(not(feature = "dprec"))]
pub const E_TOL: Float = 1E-5;

// Number of particle rows handed to one rayon task.
pub const PRTL_CHUNK_SIZE: usize = 1024;

#[derive(Deserialize)]
pub struct Config {
    pub beam: Beam,
    pub setup: Setup,
    pub output: Output,
    #[serde(default)]
    pub elements: Vec<init::ElementTable>,
}

#[derive(Deserialize)]
pub struct Beam {
    /// MeV
    pub kinetic_energy: Float,
    #[serde(default = "default_rest_energy")]
    pub rest_energy: Float,
    pub particles: usize,
    pub sigma: [Float; 6],
    #[serde(default)]
    pub momentum_offset: Float,
    pub seed: Option<u64>,
}

#[derive(Deserialize)]
pub struct Setup {
    #[serde(default)]
    pub tracking: Tracking,
}

#[derive(Deserialize)]
pub struct Output {
    pub write_output: bool,
    #[serde(default = "default_directory")]
    pub directory: String,
    pub stride: usize,
    #[serde(default)]
    pub log_statistics: bool,
}

fn default_rest_energy() -> Float {
    reference::PROTON_MASS_MEV
}

fn default_directory() -> String {
    "output".to_string()
}

impl Config {
    pub fn new() -> Result<Config> {
        let contents =
            fs::read_to_string("config.toml").context("Could not open the config.toml file")?;
        Config::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Config> {
        toml::from_str(contents).with_context(|| "Could not parse Config file")
    }
}

pub fn run(cfg: Config) -> Result<()> {
    if cfg.output.stride == 0 {
        return Err(anyhow::Error::msg("Output stride must be at least 1"));
    }

    let reference = Reference::from_kinetic_energy(cfg.beam.kinetic_energy, cfg.beam.rest_energy)
        .context("Could not build the reference particle")?
        .with_momentum_offset(cfg.beam.momentum_offset)
        .with_tracking(cfg.setup.tracking);
    reference
        .validate()
        .context("Invalid momentum offset in [beam]")?;
    info!(
        "reference: beta = {:.6}, brho = {:.6} T m, tracking = {:?}",
        reference.beta, reference.brho, reference.tracking
    );

    let beamline =
        init::build_beamline(&cfg.elements, &reference).context("Could not build the beamline")?;
    info!(
        "beamline: {} elements, {:.4} m",
        beamline.len(),
        beamline.total_length()
    );

    info!("initializing {} prtls", cfg.beam.particles);
    let beam = ParticleBatch::gaussian(cfg.beam.particles, &cfg.beam.sigma, cfg.beam.seed);

    let mut stats = BeamStatistics::new();
    let out = propagate(&beamline, beam, &reference, Some(&mut stats))
        .context("Propagation through the beamline failed")?;

    if cfg.output.log_statistics {
        for (rec, element) in stats.records().iter().zip(beamline.iter()) {
            info!(
                "{:>4} {:<12} sigma_x = {:.4e} sigma_y = {:.4e} lost = {}",
                rec.index, element.name, rec.sigma[prtls::X], rec.sigma[prtls::Y], rec.lost
            );
        }
    }

    if cfg.output.write_output {
        debug!("saving prtls to {}", cfg.output.directory);
        save::save_batch(&out, &cfg.output.directory, cfg.output.stride)?;
        save::save_statistics(&stats, &cfg.output.directory)?;
    }

    Ok(())
}

#[cfg(test)]
pub(crate) fn build_test_reference() -> Reference {
    // ultra-relativistic so that pt and delta coincide
    Reference::new(1.0, 1.0)
}

#[cfg(test)]
pub(crate) fn build_test_beamline() -> Beamline {
    Beamline::from_elements(vec![
        Element::quadrupole("qf", 0.2, 1.2),
        Element::drift("d1", 0.5),
        Element::sbend("b1", 1.0, 0.1, 0.0),
        Element::drift("d2", 0.5),
        Element::quadrupole("qd", 0.2, -1.2),
        Element::sextupole("s1", 0.1, 3.0),
    ])
}
