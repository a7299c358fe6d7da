//! Per-particle kernels for field-free and pure quadrupole elements.
//!
//! Rows hold slopes and `delta` like every other kernel. The drift converts
//! them to canonical `px`, `py` and `pt` internally; `l` is the path-length
//! difference, so a longer path is positive as in the bend matrices.

use super::{check_shapes, CHUNK};
use crate::{
    maps::Principal,
    prtls::{ParticleBatch, DIM, DPP, L, X, XP, Y, YP},
    Float,
};
use rayon::prelude::*;

/// Canonical `(px, py, pt)` of a row holding `(x', y', delta)`.
#[inline(always)]
fn canonical(x: &[Float], inv_beta: Float) -> (Float, Float, Float) {
    let delta = x[DPP];
    let opd = 1.0 + delta;
    let norm = opd / (1.0 + x[XP] * x[XP] + x[YP] * x[YP]).sqrt();
    // sqrt(opd^2 - 1 + 1/beta^2) - 1/beta without the cancellation
    let pt = delta * (2.0 + delta) / ((opd * opd - 1.0 + inv_beta * inv_beta).sqrt() + inv_beta);
    (x[XP] * norm, x[YP] * norm, pt)
}

/// `int_0^L u'(s)^2 ds` along the linear trajectory of `u'' + k u = 0`.
#[inline(always)]
fn slope_square_integral(p: &Principal, k: Float, length: Float, u: Float, up: Float) -> Float {
    let cs = p.c * p.s;
    0.5 * (k * u * u * (length - cs) - 2.0 * k * u * up * p.s * p.s + up * up * (length + cs))
}

/// Exact relativistic drift. Particles with `1 + delta <= 0` come out as
/// NaN without affecting the rest of the batch.
pub fn track_exact_drift(input: &ParticleBatch, length: Float, beta: Float, output: &mut ParticleBatch) {
    check_shapes(input, output);
    let inv_beta = 1.0 / beta;
    output
        .as_mut_slice()
        .par_chunks_mut(CHUNK)
        .zip(input.as_slice().par_chunks(CHUNK))
        .for_each(|(out, inp)| {
            for (o, x) in out.chunks_exact_mut(DIM).zip(inp.chunks_exact(DIM)) {
                if !(1.0 + x[DPP] > 0.0) {
                    o.iter_mut().for_each(|v| *v = Float::NAN);
                    continue;
                }
                let (px, py, pt) = canonical(x, inv_beta);
                let pz = (1.0 + 2.0 * pt * inv_beta + pt * pt - px * px - py * py).sqrt();
                let lpz = length / pz;
                let slopes = x[XP] * x[XP] + x[YP] * x[YP];
                o.copy_from_slice(x);
                o[X] += px * lpz;
                o[Y] += py * lpz;
                o[L] += length * slopes / (1.0 + (1.0 + slopes).sqrt());
            }
        });
}

/// Exact quadrupole: each particle sees the gradient scaled by its own
/// momentum, `k1 / (1 + delta)`. The path length picks up
/// `int (x'^2 + y'^2) / 2 ds` of the particle's trajectory.
pub fn track_exact_quadrupole(input: &ParticleBatch, length: Float, k1: Float, output: &mut ParticleBatch) {
    check_shapes(input, output);
    output
        .as_mut_slice()
        .par_chunks_mut(CHUNK)
        .zip(input.as_slice().par_chunks(CHUNK))
        .for_each(|(out, inp)| {
            for (o, x) in out.chunks_exact_mut(DIM).zip(inp.chunks_exact(DIM)) {
                let opd = 1.0 + x[DPP];
                if !(opd > 0.0) {
                    o.iter_mut().for_each(|v| *v = Float::NAN);
                    continue;
                }
                let k = k1 / opd;
                let px = Principal::new(k, length);
                let py = Principal::new(-k, length);

                o.copy_from_slice(x);
                o[X] = px.c * x[X] + px.s * x[XP];
                o[XP] = px.cp * x[X] + px.sp * x[XP];
                o[Y] = py.c * x[Y] + py.s * x[YP];
                o[YP] = py.cp * x[Y] + py.sp * x[YP];
                o[L] += 0.5
                    * (slope_square_integral(&px, k, length, x[X], x[XP])
                        + slope_square_integral(&py, -k, length, x[Y], x[YP]));
            }
        });
}
