use crate::{
    maps::{identity, Matrix, TransferMap},
    prtls::{X, XP, Y, YP},
    Float,
};

pub fn matrix(length: Float) -> Matrix {
    let mut r = identity();
    r[X][XP] = length;
    r[Y][YP] = length;
    r
}

/// A drift is purely linear; the exact relativistic drift lives in
/// the batch kernels instead.
pub fn transfer_map(length: Float) -> TransferMap {
    TransferMap::from_matrix(matrix(length))
}
