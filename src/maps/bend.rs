use crate::{
    maps::{green, identity, quadrupole, Matrix, Principal, TransferMap},
    prtls::{DPP, L, X, XP, Y, YP},
    Float,
};

/// Sector dipole with curvature `h` and an optional gradient `k1`.
pub fn matrix(length: Float, h: Float, k1: Float) -> Matrix {
    if h == 0.0 {
        return quadrupole::matrix(length, k1);
    }
    let px = Principal::new(h * h + k1, length);
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

    r[X][DPP] = h * px.d_unit;
    r[XP][DPP] = h * px.s;
    r[L][X] = h * px.s;
    r[L][XP] = h * px.d_unit;
    r[L][DPP] = h * h * px.f_unit;
    r
}

pub fn transfer_map(length: Float, h: Float, k1: Float) -> TransferMap {
    if h == 0.0 {
        return quadrupole::transfer_map(length, k1);
    }
    TransferMap {
        r: matrix(length, h, k1),
        t: green::thick_tensor(length, h, k1, 0.0),
    }
}
