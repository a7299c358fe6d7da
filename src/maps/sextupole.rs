use crate::{
    maps::{drift, zero_tensor, Tensor, TransferMap},
    prtls::{X, XP, Y, YP},
    Float,
};

/// Geometric terms of `x'' = -(k2/2)(x^2 - y^2)`, `y'' = k2 x y`
/// integrated along the straight trajectory.
pub fn tensor(length: Float, k2: Float) -> Tensor {
    let mut t = zero_tensor();
    let l = length;
    let (l2, l3, l4) = (l * l, l * l * l, l * l * l * l);
    let a = -0.5 * k2;

    t[X][X][X] = 0.5 * a * l2;
    t[X][X][XP] = a * l3 / 3.0;
    t[X][XP][XP] = a * l4 / 12.0;
    t[X][Y][Y] = -0.5 * a * l2;
    t[X][Y][YP] = -a * l3 / 3.0;
    t[X][YP][YP] = -a * l4 / 12.0;

    t[XP][X][X] = a * l;
    t[XP][X][XP] = a * l2;
    t[XP][XP][XP] = a * l3 / 3.0;
    t[XP][Y][Y] = -a * l;
    t[XP][Y][YP] = -a * l2;
    t[XP][YP][YP] = -a * l3 / 3.0;

    t[Y][X][Y] = 0.5 * k2 * l2;
    t[Y][X][YP] = k2 * l3 / 6.0;
    t[Y][XP][Y] = k2 * l3 / 6.0;
    t[Y][XP][YP] = k2 * l4 / 12.0;

    t[YP][X][Y] = k2 * l;
    t[YP][X][YP] = 0.5 * k2 * l2;
    t[YP][XP][Y] = 0.5 * k2 * l2;
    t[YP][XP][YP] = k2 * l3 / 3.0;
    t
}

pub fn transfer_map(length: Float, k2: Float) -> TransferMap {
    TransferMap {
        r: drift::matrix(length),
        t: tensor(length, k2),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{maps::determinant_2x2, E_TOL};

    #[test]
    fn zero_strength_is_a_drift() {
        let map = transfer_map(0.3, 0.0);
        assert_eq!(map.r, drift::matrix(0.3));
        assert!(map.is_linear());
    }

    #[test]
    fn kick_scales_with_strength() {
        let one = tensor(0.25, 1.0);
        let three = tensor(0.25, 3.0);
        for i in 0..4 {
            for j in 0..6 {
                for k in j..6 {
                    assert!((3.0 * one[i][j][k] - three[i][j][k]).abs() < E_TOL);
                }
            }
        }
        let map = transfer_map(0.25, 3.0);
        assert_eq!(determinant_2x2(&map.r, X), 1.0);
        assert_eq!(determinant_2x2(&map.r, Y), 1.0);
    }

    #[test]
    fn thin_limit_kick() {
        // a short sextupole is a kick of -(k2 L / 2)(x^2 - y^2)
        let (l, k2) = (1E-4, 10.0);
        let map = transfer_map(l, k2);
        let out = map.apply(&[2E-3, 0.0, 1E-3, 0.0, 0.0, 0.0]);
        let expected = -0.5 * k2 * l * (4E-6 - 1E-6);
        assert!((out[XP] - expected).abs() < 1E-15);
        assert!((out[YP] - k2 * l * 2E-6).abs() < 1E-15);
    }
}
