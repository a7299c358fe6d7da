use crate::{
    elements::Fringe,
    maps::{identity, zero_tensor, TransferMap},
    prtls::{DPP, X, XP, Y, YP},
    Float,
};

// Below this |cos| the corrected face angle is perpendicular to the beam.
const MIN_COS: Float = 1E-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Entry,
    Exit,
}

impl Side {
    fn sign(self) -> Float {
        match self {
            Side::Entry => 1.0,
            Side::Exit => -1.0,
        }
    }
}

/// Thin edge map of a dipole. `scale` is the momentum scaling applied
/// to `h` and `k1`. Returns `None` when the fringe-corrected face angle
/// is perpendicular to the beam.
pub fn transfer_map(fringe: &Fringe, scale: Float, side: Side) -> Option<TransferMap> {
    let h = fringe.h * scale;
    let k1 = fringe.k1 * scale;
    if h == 0.0 && k1 == 0.0 {
        return Some(TransferMap::identity());
    }

    let beta = fringe.face_angle;
    let psi = beta - fringe.fringe_angle(h);
    if psi.cos().abs() < MIN_COS || beta.cos().abs() < MIN_COS {
        return None;
    }
    let tan_b = beta.tan();
    let sec_b = 1.0 / beta.cos();
    let tan_p = psi.tan();
    let he = fringe.pole_radius.map_or(0.0, |r| 1.0 / r);

    let mut r = identity();
    r[XP][X] = h * tan_b;
    r[YP][Y] = -h * tan_p;

    let hh = side.sign() * 0.5 * h;
    let t111 = -hh * tan_b * tan_b;
    let t133 = hh * sec_b * sec_b;
    let mut t211 = 0.5 * h * he * sec_b.powi(3) + k1 * tan_b;
    let t212 = -t111;
    let mut t233 = hh * h * tan_b.powi(3) - t211;
    let t234 = t111;
    let t313 = -t111;
    let mut t413 = -t211;
    let t414 = t111;
    let t423 = -t133;

    match side {
        Side::Entry => {
            t233 += 0.5 * (h * sec_b).powi(2) * tan_b;
        }
        Side::Exit => {
            t211 -= 0.5 * (h * tan_b).powi(2) * tan_b;
            t413 += 0.5 * (h * sec_b).powi(2) * tan_b;
        }
    }

    let mut t = zero_tensor();
    t[X][X][X] = t111;
    t[X][Y][Y] = t133;
    t[XP][X][X] = t211;
    t[XP][X][XP] = 2.0 * t212;
    t[XP][Y][Y] = t233;
    t[XP][Y][YP] = 2.0 * t234;
    t[Y][X][Y] = 2.0 * t313;
    t[YP][X][Y] = 2.0 * t413;
    t[YP][X][YP] = 2.0 * t414;
    t[YP][XP][Y] = 2.0 * t423;
    t[XP][X][DPP] = -h * tan_b;
    t[YP][Y][DPP] = h * tan_p;

    Some(TransferMap { r, t })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        maps::{compute_transfer_map, determinant_2x2},
        Element, Reference, E_TOL,
    };

    fn edge() -> Fringe {
        Fringe {
            h: 0.5,
            k1: 0.0,
            face_angle: 0.15,
            gap: 0.06,
            fint: 0.5,
            pole_radius: None,
        }
    }

    #[test]
    fn kinks() {
        let f = edge();
        let map = transfer_map(&f, 1.0, Side::Entry).unwrap();
        let psi = f.face_angle - f.fringe_angle(f.h);
        assert!((map.r[XP][X] - 0.5 * f.face_angle.tan()).abs() < E_TOL);
        assert!((map.r[YP][Y] + 0.5 * psi.tan()).abs() < E_TOL);
        assert!((determinant_2x2(&map.r, X) - 1.0).abs() < 1E-9);
        assert!((determinant_2x2(&map.r, Y) - 1.0).abs() < 1E-9);
        assert_eq!(map.r[X][XP], 0.0);
    }

    #[test]
    fn field_free_edge_is_identity() {
        let f = Fringe {
            face_angle: 0.3,
            ..Fringe::default()
        };
        assert_eq!(transfer_map(&f, 1.0, Side::Exit), Some(TransferMap::identity()));
    }

    #[test]
    fn entry_and_exit_mirror() {
        let f = edge();
        let entry = transfer_map(&f, 1.0, Side::Entry).unwrap();
        let exit = transfer_map(&f, 1.0, Side::Exit).unwrap();
        let tan_b = f.face_angle.tan();
        let sec_b = 1.0 / f.face_angle.cos();
        let h = f.h;

        assert_eq!(entry.r, exit.r);
        // sign-flipped terms
        assert_eq!(entry.t[X][X][X], -exit.t[X][X][X]);
        assert_eq!(entry.t[X][Y][Y], -exit.t[X][Y][Y]);
        assert_eq!(entry.t[XP][X][XP], -exit.t[XP][X][XP]);
        assert_eq!(entry.t[Y][X][Y], -exit.t[Y][X][Y]);
        assert_eq!(entry.t[YP][X][YP], -exit.t[YP][X][YP]);
        assert_eq!(entry.t[YP][XP][Y], -exit.t[YP][XP][Y]);
        // side-specific corrections
        assert!((entry.t[XP][X][X] - exit.t[XP][X][X] - 0.5 * (h * tan_b).powi(2) * tan_b).abs() < E_TOL);
        let hh = 0.5 * h;
        let base_233 = |sign: Float| sign * hh * h * tan_b.powi(3) - entry.t[XP][X][X];
        assert!((entry.t[XP][Y][Y] - base_233(1.0) - 0.5 * (h * sec_b).powi(2) * tan_b).abs() < E_TOL);
        assert!(
            (exit.t[YP][X][Y] - entry.t[YP][X][Y] - (h * sec_b).powi(2) * tan_b).abs() < E_TOL
        );
        // chromatic edge terms do not depend on the side
        assert_eq!(entry.t[XP][X][DPP], exit.t[XP][X][DPP]);
        assert_eq!(entry.t[YP][Y][DPP], exit.t[YP][Y][DPP]);
    }

    #[test]
    fn pole_face_curvature() {
        let mut f = edge();
        let flat = transfer_map(&f, 1.0, Side::Entry).unwrap();
        f.pole_radius = Some(2.0);
        let curved = transfer_map(&f, 1.0, Side::Entry).unwrap();
        let sec_b = 1.0 / f.face_angle.cos();
        let extra = 0.5 * f.h * 0.5 * sec_b.powi(3);
        assert!((curved.t[XP][X][X] - flat.t[XP][X][X] - extra).abs() < E_TOL);
        assert!((curved.t[YP][X][Y] - flat.t[YP][X][Y] + 2.0 * extra).abs() < E_TOL);
    }

    #[test]
    fn perpendicular_corrected_face_fails() {
        // pick fint so that psi = -pi/2
        let mut f = edge();
        f.face_angle = 0.0;
        f.fint = (std::f64::consts::FRAC_PI_2 as Float) / (f.h * f.gap);
        assert!(transfer_map(&f, 1.0, Side::Entry).is_none());
        let reference = Reference::new(1.0, 1.0);
        assert!(compute_transfer_map(&Element::fringe_in("e", f), &reference).is_err());
    }
}
