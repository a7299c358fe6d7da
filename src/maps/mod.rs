use crate::{
    elements::{Element, ElementKind},
    error::Result,
    prtls::DIM,
    reference::Reference,
    Float,
};

pub mod bend;
pub mod drift;
pub mod fringe;
pub(crate) mod green;
pub mod multipole;
pub mod quadrupole;
pub mod sextupole;

pub type Matrix = [[Float; DIM]; DIM];

/// Second-order coefficients `T[i][j][k]`. Only `j <= k` is populated,
/// with the symmetric `(j, k)`/`(k, j)` contributions folded together.
pub type Tensor = [[[Float; DIM]; DIM]; DIM];

// Below |K| L^2 < SERIES_LIMIT the principal trajectories are expanded
// in powers of K instead of evaluated through trig/hyperbolic functions.
pub(crate) const SERIES_LIMIT: Float = 0.1;
pub(crate) const SERIES_TERMS: usize = 8;

#[derive(Debug, Clone, PartialEq)]
pub struct TransferMap {
    pub r: Matrix,
    pub t: Tensor,
}

impl TransferMap {
    pub fn identity() -> TransferMap {
        TransferMap::from_matrix(identity())
    }

    pub fn from_matrix(r: Matrix) -> TransferMap {
        TransferMap {
            r,
            t: zero_tensor(),
        }
    }

    /// True when the map has no second-order part.
    pub fn is_linear(&self) -> bool {
        self.t
            .iter()
            .all(|plane| plane.iter().all(|row| row.iter().all(|&v| v == 0.0)))
    }

    /// Applies the map to a single phase-space vector.
    pub fn apply(&self, x: &[Float; DIM]) -> [Float; DIM] {
        let mut out = [0.0; DIM];
        for i in 0..DIM {
            let mut acc = 0.0;
            for j in 0..DIM {
                acc += self.r[i][j] * x[j];
                for k in j..DIM {
                    acc += self.t[i][j][k] * x[j] * x[k];
                }
            }
            out[i] = acc;
        }
        out
    }
}

pub fn identity() -> Matrix {
    let mut r = [[0.0; DIM]; DIM];
    for (i, row) in r.iter_mut().enumerate() {
        row[i] = 1.0;
    }
    r
}

pub fn zero_tensor() -> Tensor {
    [[[0.0; DIM]; DIM]; DIM]
}

/// Matrix product `a * b`, i.e. `b` is applied first.
pub fn mat_mul(a: &Matrix, b: &Matrix) -> Matrix {
    let mut out = [[0.0; DIM]; DIM];
    for i in 0..DIM {
        for j in 0..DIM {
            out[i][j] = (0..DIM).map(|k| a[i][k] * b[k][j]).sum();
        }
    }
    out
}

/// Determinant of the conjugate 2x2 block starting at `plane`
/// (0 for x/x', 2 for y/y').
pub fn determinant_2x2(r: &Matrix, plane: usize) -> Float {
    r[plane][plane] * r[plane + 1][plane + 1] - r[plane][plane + 1] * r[plane + 1][plane]
}

/// Principal trajectories of `u'' + K u = 0` evaluated at `s = L`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Principal {
    pub c: Float,
    pub s: Float,
    pub cp: Float,
    pub sp: Float,
    /// `(1 - C) / K`, `L^2 / 2` at `K = 0`.
    pub d_unit: Float,
    /// `(L - S) / K`, `L^3 / 6` at `K = 0`.
    pub f_unit: Float,
}

impl Principal {
    pub fn new(k: Float, length: Float) -> Principal {
        let l2 = length * length;
        if k == 0.0 {
            return Principal {
                c: 1.0,
                s: length,
                cp: 0.0,
                sp: 1.0,
                d_unit: 0.5 * l2,
                f_unit: l2 * length / 6.0,
            };
        }
        let (c, s, cp, d_unit) = if k > 0.0 {
            let w = k.sqrt();
            let (sn, cs) = (w * length).sin_cos();
            let half = (0.5 * w * length).sin();
            (cs, sn / w, -w * sn, 2.0 * half * half / k)
        } else {
            let w = (-k).sqrt();
            let wl = w * length;
            let half = (0.5 * wl).sinh();
            (wl.cosh(), wl.sinh() / w, w * wl.sinh(), -2.0 * half * half / k)
        };
        let f_unit = if k.abs() * l2 < SERIES_LIMIT {
            // sum_n (-K)^n L^(2n+3) / (2n+3)!
            let mut term = l2 * length / 6.0;
            let mut sum = 0.0;
            for n in 0..SERIES_TERMS {
                sum += term;
                let m = 2 * n as i32;
                term *= -k * l2 / (((m + 4) * (m + 5)) as Float);
            }
            sum
        } else {
            (length - s) / k
        };
        Principal {
            c,
            s,
            cp,
            sp: c,
            d_unit,
            f_unit,
        }
    }
}

/// Computes the first- and second-order transfer map of one element,
/// with every rigidity-dependent strength scaled by the reference
/// momentum offset.
pub fn compute_transfer_map(element: &Element, reference: &Reference) -> Result<TransferMap> {
    element.validate()?;
    let scale = reference.strength_scale();
    let map = match &element.kind {
        ElementKind::Drift(d) => drift::transfer_map(d.length),
        ElementKind::Quadrupole(q) => quadrupole::transfer_map(q.length, q.k1 * scale),
        ElementKind::SBend(b) => bend::transfer_map(b.length, b.curvature() * scale, b.k1 * scale),
        ElementKind::Sextupole(s) => sextupole::transfer_map(s.length, s.k2 * scale),
        ElementKind::Multipole(m) => multipole::transfer_map(m.length, m.k1 * scale, m.k2 * scale),
        ElementKind::FringeIn(f) => fringe::transfer_map(f, scale, fringe::Side::Entry)
            .ok_or_else(|| element.invalid("fringe-corrected face angle is perpendicular to the beam"))?,
        ElementKind::FringeOut(f) => fringe::transfer_map(f, scale, fringe::Side::Exit)
            .ok_or_else(|| element.invalid("fringe-corrected face angle is perpendicular to the beam"))?,
    };
    Ok(map)
}
