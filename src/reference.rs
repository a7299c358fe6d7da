use crate::{
    error::{OpticsError, Result},
    Float,
};
use serde::Deserialize;

pub const PROTON_MASS_MEV: Float = 938.272_088_16;
// c / 1e6, converts a momentum in MeV/c into a rigidity in T m
const MEV_PER_TESLA_METER: Float = 299.792_458;

/// How each element is applied to the particles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tracking {
    /// Transfer matrices only.
    Linear,
    /// Transfer matrices plus the second-order tensors.
    SecondOrder,
    /// Exact per-particle kernels for drifts and quadrupoles,
    /// second-order maps for every other element.
    Exact,
}

impl Default for Tracking {
    fn default() -> Tracking {
        Tracking::SecondOrder
    }
}

/// Quantities shared by every element during one propagation call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reference {
    /// v/c of the reference particle.
    pub beta: Float,
    /// Reference rigidity in T m.
    pub brho: Float,
    /// Global momentum offset `d`; strengths scale as `1 / (1 + d)`.
    pub momentum_offset: Float,
    pub tracking: Tracking,
}

impl Reference {
    pub fn new(beta: Float, brho: Float) -> Reference {
        Reference {
            beta,
            brho,
            momentum_offset: 0.0,
            tracking: Tracking::default(),
        }
    }

    /// Reference for a particle of the given kinetic and rest energies (MeV).
    pub fn from_kinetic_energy(kinetic_energy: Float, rest_energy: Float) -> Result<Reference> {
        if !(kinetic_energy > 0.0) || !kinetic_energy.is_finite() {
            return Err(OpticsError::config(
                "reference",
                format!("kinetic energy must be positive, got {}", kinetic_energy),
            ));
        }
        if !(rest_energy > 0.0) || !rest_energy.is_finite() {
            return Err(OpticsError::config(
                "reference",
                format!("rest energy must be positive, got {}", rest_energy),
            ));
        }
        let gamma = 1.0 + kinetic_energy / rest_energy;
        let beta = (1.0 - 1.0 / (gamma * gamma)).sqrt();
        let momentum = (kinetic_energy * kinetic_energy + 2.0 * kinetic_energy * rest_energy).sqrt();
        Ok(Reference::new(beta, momentum / MEV_PER_TESLA_METER))
    }

    pub fn proton(kinetic_energy: Float) -> Result<Reference> {
        Reference::from_kinetic_energy(kinetic_energy, PROTON_MASS_MEV)
    }

    pub fn with_momentum_offset(mut self, momentum_offset: Float) -> Reference {
        self.momentum_offset = momentum_offset;
        self
    }

    pub fn with_tracking(mut self, tracking: Tracking) -> Reference {
        self.tracking = tracking;
        self
    }

    pub fn gamma(&self) -> Float {
        1.0 / (1.0 - self.beta * self.beta).sqrt()
    }

    /// Scale applied to every rigidity-dependent strength.
    pub fn strength_scale(&self) -> Float {
        1.0 / (1.0 + self.momentum_offset)
    }

    /// Normalised strength of a field derivative given in T/m^n.
    pub fn normalize(&self, field_derivative: Float) -> Float {
        field_derivative / self.brho
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.beta > 0.0 && self.beta <= 1.0) {
            return Err(OpticsError::config(
                "reference",
                format!("beta must lie in (0, 1], got {}", self.beta),
            ));
        }
        if !(self.brho > 0.0) || !self.brho.is_finite() {
            return Err(OpticsError::config(
                "reference",
                format!("brho must be positive, got {}", self.brho),
            ));
        }
        if !(self.momentum_offset > -1.0) || !self.momentum_offset.is_finite() {
            return Err(OpticsError::config(
                "reference",
                format!(
                    "momentum offset must be greater than -1, got {}",
                    self.momentum_offset
                ),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proton_kinematics() {
        // 230 MeV protons, a common proton-therapy energy
        let r = Reference::proton(230.0).unwrap();
        let gamma = 1.0 + 230.0 / PROTON_MASS_MEV;
        assert!((r.gamma() - gamma).abs() < 1E-9);
        assert!((r.beta - 0.5958).abs() < 1E-4);
        assert!((r.brho - 2.3218).abs() < 1E-3);
        assert_eq!(r.momentum_offset, 0.0);
        assert_eq!(r.tracking, Tracking::SecondOrder);
        assert!(r.validate().is_ok());
    }

    #[test]
    fn invalid_references() {
        assert!(Reference::proton(-1.0).is_err());
        assert!(Reference::from_kinetic_energy(100.0, 0.0).is_err());
        assert!(Reference::new(0.0, 1.0).validate().is_err());
        assert!(Reference::new(1.5, 1.0).validate().is_err());
        assert!(Reference::new(1.0, -2.0).validate().is_err());
        assert!(Reference::new(1.0, 1.0)
            .with_momentum_offset(-1.0)
            .validate()
            .is_err());
    }

    #[test]
    fn strength_scaling() {
        let r = Reference::new(1.0, 2.0).with_momentum_offset(0.25);
        assert_eq!(r.strength_scale(), 0.8);
        assert_eq!(r.normalize(3.0), 1.5);
    }
}
