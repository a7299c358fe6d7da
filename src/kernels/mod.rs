use crate::{
    maps::{Matrix, Tensor},
    prtls::{ParticleBatch, DIM},
    Float, PRTL_CHUNK_SIZE,
};
use itertools::izip;
use rayon::prelude::*;

mod exact;
pub use exact::{track_exact_drift, track_exact_quadrupole};

const CHUNK: usize = DIM * PRTL_CHUNK_SIZE;

/// One non-zero `T[i][j][k]`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct TensorEntry {
    i: usize,
    j: usize,
    k: usize,
    value: Float,
}

fn compact(t: &Tensor) -> Vec<TensorEntry> {
    let mut entries = Vec::new();
    for (i, plane) in t.iter().enumerate() {
        for j in 0..DIM {
            for k in j..DIM {
                if plane[j][k] != 0.0 {
                    entries.push(TensorEntry {
                        i,
                        j,
                        k,
                        value: plane[j][k],
                    });
                }
            }
        }
    }
    entries
}

#[inline(always)]
fn check_shapes(input: &ParticleBatch, output: &ParticleBatch) {
    // The kernels write into `output` in place, so a mismatch has to be
    // caught before the first row is touched.
    assert_eq!(
        input.as_slice().len(),
        output.as_slice().len(),
        "input and output batches must hold the same number of particles"
    );
}

#[inline(always)]
fn linear_row(r: &Matrix, x: &[Float], out: &mut [Float]) {
    for (o, row) in izip!(out.iter_mut(), r.iter()) {
        *o = izip!(row.iter(), x.iter()).map(|(a, b)| a * b).sum();
    }
}

#[inline(always)]
fn add_quadratic(entries: &[TensorEntry], x: &[Float], out: &mut [Float]) {
    for e in entries {
        out[e.i] += e.value * x[e.j] * x[e.k];
    }
}

/// `out = R x` for every particle.
pub fn apply_matrix(input: &ParticleBatch, r: &Matrix, output: &mut ParticleBatch) {
    check_shapes(input, output);
    output
        .as_mut_slice()
        .par_chunks_mut(CHUNK)
        .zip(input.as_slice().par_chunks(CHUNK))
        .for_each(|(out, inp)| {
            for (o, x) in out.chunks_exact_mut(DIM).zip(inp.chunks_exact(DIM)) {
                linear_row(r, x, o);
            }
        });
}

/// `out[i] = sum_{j <= k} T[i][j][k] x[j] x[k]` for every particle.
pub fn apply_tensor(input: &ParticleBatch, t: &Tensor, output: &mut ParticleBatch) {
    check_shapes(input, output);
    let entries = compact(t);
    output
        .as_mut_slice()
        .par_chunks_mut(CHUNK)
        .zip(input.as_slice().par_chunks(CHUNK))
        .for_each(|(out, inp)| {
            for (o, x) in out.chunks_exact_mut(DIM).zip(inp.chunks_exact(DIM)) {
                o.iter_mut().for_each(|v| *v = 0.0);
                add_quadratic(&entries, x, o);
            }
        });
}

/// First- and second-order parts in a single pass over the batch.
pub fn apply_matrix_then_tensor(
    input: &ParticleBatch,
    r: &Matrix,
    t: &Tensor,
    output: &mut ParticleBatch,
) {
    check_shapes(input, output);
    let entries = compact(t);
    output
        .as_mut_slice()
        .par_chunks_mut(CHUNK)
        .zip(input.as_slice().par_chunks(CHUNK))
        .for_each(|(out, inp)| {
            for (o, x) in out.chunks_exact_mut(DIM).zip(inp.chunks_exact(DIM)) {
                linear_row(r, x, o);
                add_quadratic(&entries, x, o);
            }
        });
}
