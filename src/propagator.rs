use crate::{
    beamline::Beamline,
    cache::MapCache,
    elements::ElementKind,
    error::Result,
    kernels,
    maps::{identity, mat_mul, Matrix},
    prtls::ParticleBatch,
    reference::{Reference, Tracking},
};
use log::{debug, trace};

/// Called once per element with the batch as it leaves that element.
pub trait Observer {
    fn observe(&mut self, index: usize, batch: &ParticleBatch);
}

impl<F> Observer for F
where
    F: FnMut(usize, &ParticleBatch),
{
    fn observe(&mut self, index: usize, batch: &ParticleBatch) {
        self(index, batch)
    }
}

/// Steps a batch through a beamline one element at a time.
///
/// The propagator owns two buffers of the same shape; every element reads
/// the front buffer, writes the back one, and the two are swapped.
pub struct Propagator<'a> {
    beamline: &'a Beamline,
    cache: &'a mut MapCache,
    reference: Reference,
    index: usize,
    front: ParticleBatch,
    back: ParticleBatch,
}

impl<'a> Propagator<'a> {
    pub fn new(
        beamline: &'a Beamline,
        cache: &'a mut MapCache,
        batch: ParticleBatch,
        reference: &Reference,
    ) -> Result<Propagator<'a>> {
        reference.validate()?;
        let back = ParticleBatch::zeros(batch.len());
        Ok(Propagator {
            beamline,
            cache,
            reference: *reference,
            index: 0,
            front: batch,
            back,
        })
    }

    /// Index of the next element to apply.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_finished(&self) -> bool {
        self.index >= self.beamline.len()
    }

    pub fn batch(&self) -> &ParticleBatch {
        &self.front
    }

    /// Applies the next element. Returns `Ok(false)` once every element
    /// has been applied.
    pub fn advance<O>(&mut self, observer: Option<&mut O>) -> Result<bool>
    where
        O: Observer + ?Sized,
    {
        if self.is_finished() {
            return Ok(false);
        }
        self.apply_current()?;
        std::mem::swap(&mut self.front, &mut self.back);
        if let Some(observer) = observer {
            observer.observe(self.index, &self.front);
        }
        self.index += 1;
        Ok(true)
    }

    /// `advance` without an observer.
    pub fn step(&mut self) -> Result<bool> {
        self.advance(None::<&mut dyn Observer>)
    }

    pub fn run(&mut self, mut observer: Option<&mut dyn Observer>) -> Result<()> {
        while self.advance(observer.as_deref_mut())? {}
        Ok(())
    }

    /// Runs the remaining elements and hands back the final batch.
    pub fn finish(mut self, observer: Option<&mut dyn Observer>) -> Result<ParticleBatch> {
        self.run(observer)?;
        Ok(self.front)
    }

    fn apply_current(&mut self) -> Result<()> {
        let beamline = self.beamline;
        let element = &beamline.elements()[self.index];
        let reference = self.reference;
        trace!("element {} {} `{}`", self.index, element.kind.label(), element.name);

        match (reference.tracking, &element.kind) {
            (Tracking::Exact, ElementKind::Drift(d)) => {
                element.validate()?;
                kernels::track_exact_drift(&self.front, d.length, reference.beta, &mut self.back);
            }
            (Tracking::Exact, ElementKind::Quadrupole(q)) => {
                element.validate()?;
                kernels::track_exact_quadrupole(
                    &self.front,
                    q.length,
                    q.k1 * reference.strength_scale(),
                    &mut self.back,
                );
            }
            (tracking, _) => {
                let map = self.cache.get(beamline, self.index, &reference)?;
                if tracking == Tracking::Linear || map.is_linear() {
                    kernels::apply_matrix(&self.front, &map.r, &mut self.back);
                } else {
                    kernels::apply_matrix_then_tensor(&self.front, &map.r, &map.t, &mut self.back);
                }
            }
        }
        Ok(())
    }
}

/// Propagates `batch` through every element of `beamline` in order.
pub fn propagate(
    beamline: &Beamline,
    batch: ParticleBatch,
    reference: &Reference,
    observer: Option<&mut dyn Observer>,
) -> Result<ParticleBatch> {
    let mut cache = MapCache::new();
    propagate_cached(beamline, &mut cache, batch, reference, observer)
}

/// Like `propagate`, reusing maps held in `cache` from earlier calls.
pub fn propagate_cached(
    beamline: &Beamline,
    cache: &mut MapCache,
    batch: ParticleBatch,
    reference: &Reference,
    observer: Option<&mut dyn Observer>,
) -> Result<ParticleBatch> {
    debug!(
        "propagating {} prtls through {} elements ({:?})",
        batch.len(),
        beamline.len(),
        reference.tracking
    );
    Propagator::new(beamline, cache, batch, reference)?.finish(observer)
}

/// First-order matrix of the whole beamline, `R_n ... R_1`.
pub fn linear_matrix(beamline: &Beamline, cache: &mut MapCache, reference: &Reference) -> Result<Matrix> {
    reference.validate()?;
    let mut total = identity();
    for index in 0..beamline.len() {
        let map = cache.get(beamline, index, reference)?;
        total = mat_mul(&map.r, &total);
    }
    Ok(total)
}
