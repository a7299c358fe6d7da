//! Closed-form second-order tensors of thick magnets.
//!
//! Along a magnet with constant curvature `h`, gradient `k1` and sextupole
//! strength `k2` the second-order coordinates obey
//!
//! ```text
//! x'' + (h^2 + k1) x = f_x(x1, x1', y1, y1', delta)
//! y'' - k1 y         = f_y(x1, x1', y1, y1', delta)
//! ```
//!
//! where the sources are quadratic in the first-order trajectory. The
//! solution at the end of the magnet is the Green's-function integral
//! `x2(L) = int_0^L S(L - s) f_x(s) ds` (and `C(L - s)` for `x2'`).
//!
//! Every principal trajectory is a short sum of `c s^n e^(lambda s)` terms,
//! so all products and integrals stay in that family and are evaluated
//! exactly, term by term.

use crate::{
    maps::{zero_tensor, Tensor, SERIES_LIMIT, SERIES_TERMS},
    prtls::{DIM, DPP, X, XP, Y, YP},
    Float,
};
use num_complex::Complex;
use num_traits::{One, Zero};

type Cplx = Complex<Float>;

// Hard cap on the terms of the power series in `definite`.
const MAX_SERIES: usize = 200;

#[derive(Debug, Clone, Copy)]
struct Term {
    coef: Cplx,
    power: u32,
    rate: Cplx,
}

/// Sum of `coef * s^power * exp(rate * s)` terms.
#[derive(Debug, Clone, Default)]
pub(crate) struct ExpPoly {
    terms: Vec<Term>,
}

impl ExpPoly {
    pub fn zero() -> ExpPoly {
        ExpPoly { terms: Vec::new() }
    }

    pub fn constant(value: Float) -> ExpPoly {
        let mut p = ExpPoly::zero();
        p.push(Cplx::from(value), 0, Cplx::zero());
        p
    }

    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    fn push(&mut self, coef: Cplx, power: u32, rate: Cplx) {
        if coef.is_zero() {
            return;
        }
        match self
            .terms
            .iter_mut()
            .find(|t| t.power == power && t.rate == rate)
        {
            Some(t) => t.coef += coef,
            None => self.terms.push(Term { coef, power, rate }),
        }
    }

    pub fn scaled(&self, a: Float) -> ExpPoly {
        let mut out = ExpPoly::zero();
        for t in &self.terms {
            out.push(t.coef * a, t.power, t.rate);
        }
        out
    }

    pub fn add_scaled(&mut self, other: &ExpPoly, a: Float) {
        for t in &other.terms {
            self.push(t.coef * a, t.power, t.rate);
        }
    }

    pub fn mul(&self, other: &ExpPoly) -> ExpPoly {
        let mut out = ExpPoly::zero();
        for a in &self.terms {
            for b in &other.terms {
                out.push(a.coef * b.coef, a.power + b.power, a.rate + b.rate);
            }
        }
        out
    }

    /// `f(L - s)` as a function of `s`.
    pub fn reflect(&self, length: Float) -> ExpPoly {
        let mut out = ExpPoly::zero();
        for t in &self.terms {
            // c (L - s)^p e^(r L) e^(-r s), expanded binomially
            let front = t.coef * (t.rate * length).exp();
            let p = t.power;
            let mut binom = 1.0;
            for i in 0..=p {
                let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
                let coef = front * (binom * sign * length.powi((p - i) as i32));
                out.push(coef, i, -t.rate);
                binom = binom * (p - i) as Float / (i + 1) as Float;
            }
        }
        out
    }

    /// `int_0^L f(s) ds`; the result is real for every polynomial built here.
    pub fn integrate(&self, length: Float) -> Float {
        self.terms
            .iter()
            .map(|t| t.coef * definite(t.power, t.rate, length))
            .fold(Cplx::zero(), |acc, v| acc + v)
            .re
    }

    #[cfg(test)]
    pub fn eval(&self, s: Float) -> Float {
        self.terms
            .iter()
            .map(|t| t.coef * s.powi(t.power as i32) * (t.rate * s).exp())
            .fold(Cplx::zero(), |acc, v| acc + v)
            .re
    }
}

/// `int_0^L s^n e^(lambda s) ds`.
fn definite(power: u32, rate: Cplx, length: Float) -> Cplx {
    let n = power as usize;
    let ln1 = length.powi(power as i32 + 1);
    if rate.is_zero() {
        return Cplx::from(ln1 / (n + 1) as Float);
    }
    // With z = lambda L this is L^(n+1) J_n(z), J_n(z) = int_0^1 t^n e^(z t) dt.
    let z = rate * length;
    let mag = z.norm();
    if mag >= 1.0 && mag > n as Float {
        // upward recursion is stable while n < |z|
        let ez = z.exp();
        let mut j = (ez - Cplx::one()) / z;
        for m in 1..=n {
            j = (ez - j * m as Float) / z;
        }
        j * ln1
    } else {
        // J_n(z) = sum_m z^m / (m! (n + m + 1))
        let mut term = Cplx::one();
        let mut sum = term / (n + 1) as Float;
        for m in 1..MAX_SERIES {
            term = term * z / m as Float;
            let add = term / (n + m + 1) as Float;
            sum += add;
            if m as Float > mag && add.norm() <= Float::EPSILON * sum.norm() {
                break;
            }
        }
        sum * ln1
    }
}

/// Principal trajectories `C`, `S` and their derivatives as functions of
/// `s`, plus the unit dispersion `(1 - C) / K`.
pub(crate) struct Trajectories {
    pub c: ExpPoly,
    pub s: ExpPoly,
    pub cp: ExpPoly,
    pub sp: ExpPoly,
    pub d_unit: ExpPoly,
}

impl Trajectories {
    pub fn new(k: Float, length: Float) -> Trajectories {
        let mut c = ExpPoly::zero();
        let mut s = ExpPoly::zero();
        let mut d_unit = ExpPoly::zero();
        let zero = Cplx::zero();

        if k == 0.0 {
            c.push(Cplx::one(), 0, zero);
            s.push(Cplx::one(), 1, zero);
            d_unit.push(Cplx::from(0.5), 2, zero);
        } else if k.abs() * length * length < SERIES_LIMIT {
            // C = sum (-k)^m s^2m / (2m)!, S and D likewise with odd/shifted powers
            let mut coef = 1.0;
            for m in 0..SERIES_TERMS {
                let p = 2 * m as u32;
                c.push(Cplx::from(coef), p, zero);
                coef /= (p + 1) as Float;
                s.push(Cplx::from(coef), p + 1, zero);
                coef /= (p + 2) as Float;
                d_unit.push(Cplx::from(coef), p + 2, zero);
                coef *= -k;
            }
        } else if k > 0.0 {
            let w = k.sqrt();
            let (up, down) = (Cplx::new(0.0, w), Cplx::new(0.0, -w));
            c.push(Cplx::from(0.5), 0, up);
            c.push(Cplx::from(0.5), 0, down);
            s.push(Cplx::new(0.0, -0.5 / w), 0, up);
            s.push(Cplx::new(0.0, 0.5 / w), 0, down);
            d_unit.push(Cplx::from(1.0 / k), 0, zero);
            d_unit.add_scaled(&c, -1.0 / k);
        } else {
            let w = (-k).sqrt();
            let (up, down) = (Cplx::from(w), Cplx::from(-w));
            c.push(Cplx::from(0.5), 0, up);
            c.push(Cplx::from(0.5), 0, down);
            s.push(Cplx::from(0.5 / w), 0, up);
            s.push(Cplx::from(-0.5 / w), 0, down);
            d_unit.push(Cplx::from(1.0 / k), 0, zero);
            d_unit.add_scaled(&c, -1.0 / k);
        }

        Trajectories {
            cp: s.scaled(-k),
            sp: c.clone(),
            c,
            s,
            d_unit,
        }
    }
}

/// A linear function of the initial coordinates with `s`-dependent
/// coefficients.
type LinearForm = [ExpPoly; DIM];

fn linear_form() -> LinearForm {
    Default::default()
}

/// Quadratic function of the initial coordinates, upper triangle only.
struct Quadratic {
    q: [[ExpPoly; DIM]; DIM],
}

impl Quadratic {
    fn new() -> Quadratic {
        Quadratic {
            q: Default::default(),
        }
    }

    /// Adds `coef * a * b`.
    fn add_product(&mut self, a: &LinearForm, b: &LinearForm, coef: Float) {
        if coef == 0.0 {
            return;
        }
        for (j, aj) in a.iter().enumerate().filter(|(_, p)| !p.is_zero()) {
            for (k, bk) in b.iter().enumerate().filter(|(_, p)| !p.is_zero()) {
                let prod = aj.mul(bk);
                self.q[j.min(k)][j.max(k)].add_scaled(&prod, coef);
            }
        }
    }
}

/// Second-order tensor of a thick element with curvature `h`,
/// gradient `k1` and sextupole strength `k2`, all already scaled by
/// the momentum offset. The path-length row is left at zero.
pub(crate) fn thick_tensor(length: Float, h: Float, k1: Float, k2: Float) -> Tensor {
    let tx = Trajectories::new(h * h + k1, length);
    let ty = Trajectories::new(-k1, length);

    let mut x = linear_form();
    x[X] = tx.c.clone();
    x[XP] = tx.s.clone();
    x[DPP] = tx.d_unit.scaled(h);
    let mut xp = linear_form();
    xp[X] = tx.cp.clone();
    xp[XP] = tx.sp.clone();
    xp[DPP] = tx.s.scaled(h);
    let mut y = linear_form();
    y[Y] = ty.c.clone();
    y[YP] = ty.s.clone();
    let mut yp = linear_form();
    yp[Y] = ty.cp.clone();
    yp[YP] = ty.sp.clone();
    let mut delta = linear_form();
    delta[DPP] = ExpPoly::constant(1.0);

    let mut fx = Quadratic::new();
    fx.add_product(&x, &x, -(h * h * h + 2.0 * h * k1 + 0.5 * k2));
    fx.add_product(&xp, &xp, 0.5 * h);
    fx.add_product(&yp, &yp, -0.5 * h);
    fx.add_product(&x, &delta, 2.0 * h * h + k1);
    fx.add_product(&delta, &delta, -h);
    fx.add_product(&y, &y, 0.5 * (k2 + h * k1));

    let mut fy = Quadratic::new();
    fy.add_product(&x, &y, k2 + 2.0 * h * k1);
    fy.add_product(&xp, &yp, h);
    fy.add_product(&y, &delta, -k1);

    let rows = [
        (X, tx.s.reflect(length), &fx),
        (XP, tx.c.reflect(length), &fx),
        (Y, ty.s.reflect(length), &fy),
        (YP, ty.c.reflect(length), &fy),
    ];

    let mut t = zero_tensor();
    for (i, kernel, source) in rows.iter() {
        for j in 0..DIM {
            for k in j..DIM {
                let f = &source.q[j][k];
                if !f.is_zero() {
                    t[*i][j][k] = kernel.mul(f).integrate(length);
                }
            }
        }
    }
    t
}
