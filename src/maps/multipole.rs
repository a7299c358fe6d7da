use crate::{
    maps::{green, quadrupole, sextupole, Tensor, TransferMap},
    Float,
};

/// Combined quadrupole and sextupole field. The `k2` geometric terms and
/// the `k1` chromatic terms are joined by plane-coupled terms once both
/// strengths are present.
pub fn tensor(length: Float, k1: Float, k2: Float) -> Tensor {
    if k1 == 0.0 {
        sextupole::tensor(length, k2)
    } else if k2 == 0.0 {
        quadrupole::tensor(length, k1)
    } else {
        green::thick_tensor(length, 0.0, k1, k2)
    }
}

pub fn transfer_map(length: Float, k1: Float, k2: Float) -> TransferMap {
    TransferMap {
        r: quadrupole::matrix(length, k1),
        t: tensor(length, k1, k2),
    }
}
