#![cfg(feature = "dprec")]
mod common;

use beamline_rs::{
    compute_transfer_map, kernels,
    maps::{determinant_2x2, mat_mul},
    prtls::*,
    propagate, Beamline, Element, ParticleBatch, Reference, Tracking,
};
use common::{assert_batches_close, test_reference};
use proptest::prelude::*;

fn arb_row() -> impl Strategy<Value = [f64; DIM]> {
    (
        -1E-3..1E-3f64,
        -1E-3..1E-3f64,
        -1E-3..1E-3f64,
        -1E-3..1E-3f64,
        -1E-3..1E-3f64,
        -1E-3..1E-3f64,
    )
        .prop_map(|(x, xp, y, yp, l, dpp)| [x, xp, y, yp, l, dpp])
}

fn arb_linear_element() -> impl Strategy<Value = Element> {
    prop_oneof![
        (0.01..2.0f64).prop_map(|l| Element::drift("d", l)),
        (0.01..1.0f64, -5.0..5.0f64).prop_map(|(l, k1)| Element::quadrupole("q", l, k1)),
        (0.1..2.0f64, -0.3..0.3f64, -1.0..1.0f64).prop_map(|(l, a, k1)| Element::sbend("b", l, a, k1)),
    ]
}

proptest! {
    #[test]
    fn quadrupole_planes_swap_with_the_sign_of_k1(length in 0.01..1.0f64, k1 in -5.0..5.0f64) {
        let reference = test_reference();
        let focus = compute_transfer_map(&Element::quadrupole("q", length, k1), &reference).unwrap();
        let defocus = compute_transfer_map(&Element::quadrupole("q", length, -k1), &reference).unwrap();
        for (i, j) in [(0, 0), (0, 1), (1, 0), (1, 1)].iter() {
            prop_assert!((focus.r[*i][*j] - defocus.r[i + 2][j + 2]).abs() < 1E-14);
            prop_assert!((focus.r[i + 2][j + 2] - defocus.r[*i][*j]).abs() < 1E-14);
        }
    }

    #[test]
    fn transverse_blocks_are_unimodular(element in arb_linear_element()) {
        let map = compute_transfer_map(&element, &test_reference()).unwrap();
        prop_assert!((determinant_2x2(&map.r, X) - 1.0).abs() < 1E-9);
        prop_assert!((determinant_2x2(&map.r, Y) - 1.0).abs() < 1E-9);
    }

    #[test]
    fn drifts_add_up(a in 0.0..3.0f64, b in 0.0..3.0f64) {
        let reference = test_reference();
        let ra = compute_transfer_map(&Element::drift("a", a), &reference).unwrap().r;
        let rb = compute_transfer_map(&Element::drift("b", b), &reference).unwrap().r;
        let rab = compute_transfer_map(&Element::drift("ab", a + b), &reference).unwrap().r;
        let product = mat_mul(&rb, &ra);
        for i in 0..DIM {
            for j in 0..DIM {
                prop_assert!((product[i][j] - rab[i][j]).abs() < 1E-12);
            }
        }
    }

    #[test]
    fn linear_tracking_composes(
        first in arb_linear_element(),
        second in arb_linear_element(),
        rows in prop::collection::vec(arb_row(), 0..40),
    ) {
        let reference = test_reference().with_tracking(Tracking::Linear);
        let beam = ParticleBatch::from_rows(&rows);
        let r1 = compute_transfer_map(&first, &reference).unwrap().r;
        let r2 = compute_transfer_map(&second, &reference).unwrap().r;

        let bl = Beamline::from_elements(vec![first, second]);
        let tracked = propagate(&bl, beam.clone(), &reference, None).unwrap();

        let mut expected = ParticleBatch::zeros(beam.len());
        kernels::apply_matrix(&beam, &mat_mul(&r2, &r1), &mut expected);
        assert_batches_close(&tracked, &expected, 1E-12);
    }

    #[test]
    fn exact_drift_agrees_with_the_matrix_off_momentum(
        length in 0.01..2.0f64,
        beta in 0.3..1.0f64,
        rows in prop::collection::vec(arb_row(), 1..20),
    ) {
        let beam = ParticleBatch::from_rows(&rows);
        let bl = Beamline::from_elements(vec![Element::drift("d", length)]);
        let reference = Reference::new(beta, 1.0);
        let exact = propagate(&bl, beam.clone(), &reference.with_tracking(Tracking::Exact), None).unwrap();
        let linear = propagate(&bl, beam, &reference.with_tracking(Tracking::Linear), None).unwrap();
        for (e, l) in exact.rows().zip(linear.rows()) {
            for i in [X, XP, Y, YP, DPP].iter() {
                prop_assert!((e[*i] - l[*i]).abs() < 1E-14);
            }
            // path lengthening is second order in the slopes
            prop_assert!(e[L] >= l[L]);
            prop_assert!(e[L] - l[L] < 1E-5);
        }
    }
}
