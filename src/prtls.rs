use crate::{
    error::{OpticsError, Result},
    Float,
};
use itertools::izip;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::StandardNormal;

// Phase-space coordinates of one particle.
pub const DIM: usize = 6;
pub const X: usize = 0;
pub const XP: usize = 1;
pub const Y: usize = 2;
pub const YP: usize = 3;
/// Path-length difference to the reference particle.
pub const L: usize = 4;
/// Relative momentum deviation.
pub const DPP: usize = 5;

/// N particles stored as one row-major array of `6 N` coordinates
/// `(x, x', y, y', l, delta)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleBatch {
    data: Vec<Float>,
}

impl ParticleBatch {
    pub fn zeros(len: usize) -> ParticleBatch {
        ParticleBatch {
            data: vec![0.0; len * DIM],
        }
    }

    pub fn from_vec(data: Vec<Float>) -> Result<ParticleBatch> {
        if data.len() % DIM != 0 {
            return Err(OpticsError::Shape {
                expected: DIM,
                found: data.len(),
            });
        }
        Ok(ParticleBatch { data })
    }

    pub fn from_rows(rows: &[[Float; DIM]]) -> ParticleBatch {
        ParticleBatch {
            data: rows.iter().flatten().copied().collect(),
        }
    }

    /// Builds a batch from rows of arbitrary width, rejecting any row that
    /// does not have exactly 6 coordinates.
    pub fn from_slices<R: AsRef<[Float]>>(rows: &[R]) -> Result<ParticleBatch> {
        let mut data = Vec::with_capacity(rows.len() * DIM);
        for row in rows {
            let row = row.as_ref();
            if row.len() != DIM {
                return Err(OpticsError::Shape {
                    expected: DIM,
                    found: row.len(),
                });
            }
            data.extend_from_slice(row);
        }
        Ok(ParticleBatch { data })
    }

    /// Gaussian beam centred on the reference particle with the given
    /// RMS size in every coordinate.
    pub fn gaussian(len: usize, sigma: &[Float; DIM], seed: Option<u64>) -> ParticleBatch {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut batch = ParticleBatch::zeros(len);
        for row in batch.data.chunks_exact_mut(DIM) {
            for (v, s) in izip!(row.iter_mut(), sigma.iter()) {
                let z: Float = rng.sample(StandardNormal);
                *v = z * s;
            }
        }
        batch
    }

    /// Number of particles.
    pub fn len(&self) -> usize {
        self.data.len() / DIM
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn row(&self, index: usize) -> &[Float] {
        &self.data[index * DIM..(index + 1) * DIM]
    }

    pub fn row_mut(&mut self, index: usize) -> &mut [Float] {
        &mut self.data[index * DIM..(index + 1) * DIM]
    }

    pub fn rows(&self) -> std::slice::ChunksExact<'_, Float> {
        self.data.chunks_exact(DIM)
    }

    pub fn column(&self, coordinate: usize) -> Vec<Float> {
        self.rows().map(|row| row[coordinate]).collect()
    }

    pub fn push(&mut self, row: [Float; DIM]) {
        self.data.extend_from_slice(&row);
    }

    /// Number of rows holding a NaN or infinite coordinate.
    pub fn lost(&self) -> usize {
        self.rows()
            .filter(|row| row.iter().any(|v| !v.is_finite()))
            .count()
    }

    pub fn as_slice(&self) -> &[Float] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [Float] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<Float> {
        self.data
    }
}
