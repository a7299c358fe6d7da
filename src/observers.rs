use crate::{
    propagator::Observer,
    prtls::{ParticleBatch, DIM},
    Float,
};
use rayon::prelude::*;

/// Beam moments after one element.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementStatistics {
    pub index: usize,
    pub mean: [Float; DIM],
    /// RMS size around the mean.
    pub sigma: [Float; DIM],
    /// Rows where every coordinate is finite.
    pub alive: usize,
    /// Rows holding a NaN or infinite coordinate.
    pub lost: usize,
}

impl ElementStatistics {
    pub fn from_batch(index: usize, batch: &ParticleBatch) -> ElementStatistics {
        let finite = |row: &&[Float]| row.iter().all(|v| v.is_finite());

        let (alive, sum) = batch
            .as_slice()
            .par_chunks_exact(DIM)
            .filter(finite)
            .fold(
                || (0usize, [0.0; DIM]),
                |(n, mut acc), row| {
                    for (a, v) in acc.iter_mut().zip(row) {
                        *a += v;
                    }
                    (n + 1, acc)
                },
            )
            .reduce(|| (0, [0.0; DIM]), |a, b| (a.0 + b.0, add(a.1, b.1)));

        let mut mean = [0.0; DIM];
        if alive > 0 {
            for (m, s) in mean.iter_mut().zip(sum.iter()) {
                *m = s / alive as Float;
            }
        }

        let squares = batch
            .as_slice()
            .par_chunks_exact(DIM)
            .filter(finite)
            .fold(
                || [0.0; DIM],
                |mut acc, row| {
                    for ((a, v), m) in acc.iter_mut().zip(row).zip(mean.iter()) {
                        *a += (v - m) * (v - m);
                    }
                    acc
                },
            )
            .reduce(|| [0.0; DIM], add);

        let mut sigma = [0.0; DIM];
        if alive > 0 {
            for (s, q) in sigma.iter_mut().zip(squares.iter()) {
                *s = (q / alive as Float).sqrt();
            }
        }

        ElementStatistics {
            index,
            mean,
            sigma,
            alive,
            lost: batch.len() - alive,
        }
    }
}

fn add(mut a: [Float; DIM], b: [Float; DIM]) -> [Float; DIM] {
    for (x, y) in a.iter_mut().zip(b.iter()) {
        *x += y;
    }
    a
}

/// Observer collecting `ElementStatistics` after every element.
#[derive(Debug, Default)]
pub struct BeamStatistics {
    records: Vec<ElementStatistics>,
}

impl BeamStatistics {
    pub fn new() -> BeamStatistics {
        BeamStatistics::default()
    }

    pub fn records(&self) -> &[ElementStatistics] {
        &self.records
    }

    pub fn last(&self) -> Option<&ElementStatistics> {
        self.records.last()
    }
}

impl Observer for BeamStatistics {
    fn observe(&mut self, index: usize, batch: &ParticleBatch) {
        self.records.push(ElementStatistics::from_batch(index, batch));
    }
}
