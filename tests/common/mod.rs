#![allow(dead_code)]
use beamline_rs::{Beamline, Element, Float, ParticleBatch, Reference};

pub fn test_reference() -> Reference {
    // This is a dummy ultra-relativistic reference so that the
    // momentum column reads the same as pt and delta.
    Reference::new(1.0, 1.0)
}

pub fn fodo_cell() -> Beamline {
    Beamline::from_elements(vec![
        Element::quadrupole("qf", 0.2, 1.2),
        Element::drift("d1", 0.8),
        Element::sbend("b1", 1.0, 0.05, 0.0),
        Element::drift("d2", 0.8),
        Element::quadrupole("qd", 0.2, -1.2),
        Element::drift("d3", 0.8),
    ])
}

pub fn test_beam(len: usize, seed: u64) -> ParticleBatch {
    ParticleBatch::gaussian(len, &[1E-3, 1E-4, 1E-3, 1E-4, 0.0, 1E-3], Some(seed))
}

pub fn assert_batches_close(a: &ParticleBatch, b: &ParticleBatch, tol: Float) {
    assert_eq!(a.len(), b.len());
    for (u, v) in a.as_slice().iter().zip(b.as_slice()) {
        assert!((u - v).abs() < tol, "{} vs {}", u, v);
    }
}
