use crate::{
    maps::{drift, identity, zero_tensor, Matrix, Principal, Tensor, TransferMap},
    prtls::{DPP, X, XP, Y, YP},
    Float,
};

/// Focusing in x for `k1 > 0`, in y for `k1 < 0`.
pub fn matrix(length: Float, k1: Float) -> Matrix {
    if k1 == 0.0 {
        return drift::matrix(length);
    }
    let px = Principal::new(k1, length);
    let py = Principal::new(-k1, length);
    let mut r = identity();
    r[X][X] = px.c;
    r[X][XP] = px.s;
    r[XP][X] = px.cp;
    r[XP][XP] = px.sp;
    r[Y][Y] = py.c;
    r[Y][YP] = py.s;
    r[YP][Y] = py.cp;
    r[YP][YP] = py.sp;
    r
}

/// Chromatic terms of a quadrupole, from the `k1 x delta` and
/// `-k1 y delta` sources.
pub fn tensor(length: Float, k1: Float) -> Tensor {
    let mut t = zero_tensor();
    if k1 == 0.0 {
        return t;
    }
    let l = length;
    let px = Principal::new(k1, length);
    let py = Principal::new(-k1, length);

    t[X][X][DPP] = 0.5 * k1 * l * px.s;
    t[X][XP][DPP] = 0.5 * (px.s - l * px.c);
    t[XP][X][DPP] = 0.5 * k1 * (l * px.c + px.s);
    t[XP][XP][DPP] = 0.5 * k1 * l * px.s;

    t[Y][Y][DPP] = -0.5 * k1 * l * py.s;
    t[Y][YP][DPP] = 0.5 * (py.s - l * py.c);
    t[YP][Y][DPP] = -0.5 * k1 * (l * py.c + py.s);
    t[YP][YP][DPP] = -0.5 * k1 * l * py.s;
    t
}

pub fn transfer_map(length: Float, k1: Float) -> TransferMap {
    if k1 == 0.0 {
        return drift::transfer_map(length);
    }
    TransferMap {
        r: matrix(length, k1),
        t: tensor(length, k1),
    }
}
