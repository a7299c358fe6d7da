use crate::{
    beamline::Beamline,
    error::{OpticsError, Result},
    maps::{compute_transfer_map, TransferMap},
    reference::Reference,
    Float,
};
use log::trace;

#[derive(Debug, Clone)]
struct Entry {
    revision: u64,
    momentum_offset: Float,
    map: TransferMap,
}

/// Transfer maps of one beamline, keyed by element position and revision.
///
/// A map is reused only while the element has not been replaced or edited
/// and the momentum offset it was computed for is unchanged. Handing the
/// cache a different beamline drops everything it holds.
#[derive(Debug, Default)]
pub struct MapCache {
    beamline_id: Option<u64>,
    entries: Vec<Option<Entry>>,
    hits: u64,
    misses: u64,
}

impl MapCache {
    pub fn new() -> MapCache {
        MapCache::default()
    }

    /// Returns the map of element `index`, computing it if needed.
    pub fn get(
        &mut self,
        beamline: &Beamline,
        index: usize,
        reference: &Reference,
    ) -> Result<&TransferMap> {
        if self.beamline_id != Some(beamline.id()) {
            self.clear();
            self.beamline_id = Some(beamline.id());
        }
        if self.entries.len() < beamline.len() {
            self.entries.resize(beamline.len(), None);
        }
        let (element, revision) = match (beamline.get(index), beamline.revision(index)) {
            (Some(e), Some(r)) => (e, r),
            _ => {
                return Err(OpticsError::config(
                    "beamline",
                    format!("no element at index {} of {}", index, beamline.len()),
                ))
            }
        };

        let cached = self.entries[index].take().filter(|entry| {
            entry.revision == revision && entry.momentum_offset == reference.momentum_offset
        });
        let entry = match cached {
            Some(entry) => {
                self.hits += 1;
                entry
            }
            None => {
                self.misses += 1;
                trace!("computing map of {} `{}`", element.kind.label(), element.name);
                Entry {
                    revision,
                    momentum_offset: reference.momentum_offset,
                    map: compute_transfer_map(element, reference)?,
                }
            }
        };
        Ok(&self.entries[index].insert(entry).map)
    }

    pub fn invalidate(&mut self, index: usize) {
        if let Some(entry) = self.entries.get_mut(index) {
            *entry = None;
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.beamline_id = None;
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Number of maps currently held.
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{build_test_beamline, build_test_reference, elements::ElementKind, Element};

    #[test]
    fn second_lookup_is_a_hit() {
        let bl = build_test_beamline();
        let reference = build_test_reference();
        let mut cache = MapCache::new();
        let first = cache.get(&bl, 0, &reference).unwrap().clone();
        let second = cache.get(&bl, 0, &reference).unwrap().clone();
        assert_eq!(first, second);
        assert_eq!(cache.misses(), 1);
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn editing_an_element_invalidates_its_map() {
        let mut bl = build_test_beamline();
        let reference = build_test_reference();
        let mut cache = MapCache::new();
        let before = cache.get(&bl, 0, &reference).unwrap().clone();
        cache.get(&bl, 1, &reference).unwrap();

        bl.update(0, |kind| {
            if let ElementKind::Quadrupole(q) = kind {
                q.k1 = -q.k1;
            }
        });
        let after = cache.get(&bl, 0, &reference).unwrap().clone();
        assert_ne!(before, after);
        assert_eq!(after, compute_transfer_map(bl.get(0).unwrap(), &reference).unwrap());
        // the untouched drift is still cached
        cache.get(&bl, 1, &reference).unwrap();
        assert_eq!(cache.misses(), 3);
        assert_eq!(cache.hits(), 1);

        bl.replace(1, Element::drift("d1", 0.9));
        assert_eq!(cache.get(&bl, 1, &reference).unwrap().r[0][1], 0.9);
    }

    #[test]
    fn momentum_offset_change_recomputes() {
        let bl = build_test_beamline();
        let mut cache = MapCache::new();
        let on = cache.get(&bl, 0, &build_test_reference()).unwrap().clone();
        let off = cache
            .get(&bl, 0, &build_test_reference().with_momentum_offset(0.01))
            .unwrap()
            .clone();
        assert_ne!(on.r, off.r);
        assert_eq!(cache.misses(), 2);
    }

    #[test]
    fn other_beamline_clears() {
        let bl = build_test_beamline();
        let other = bl.clone();
        let reference = build_test_reference();
        let mut cache = MapCache::new();
        cache.get(&bl, 0, &reference).unwrap();
        cache.get(&bl, 1, &reference).unwrap();
        assert_eq!(cache.len(), 2);
        cache.get(&other, 0, &reference).unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.misses(), 3);
    }

    #[test]
    fn explicit_invalidation() {
        let bl = build_test_beamline();
        let reference = build_test_reference();
        let mut cache = MapCache::new();
        cache.get(&bl, 2, &reference).unwrap();
        cache.invalidate(2);
        cache.invalidate(100);
        assert!(cache.is_empty());
        cache.get(&bl, 2, &reference).unwrap();
        assert_eq!(cache.misses(), 2);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn out_of_range_and_invalid_elements() {
        let mut bl = build_test_beamline();
        let reference = build_test_reference();
        let mut cache = MapCache::new();
        assert!(cache.get(&bl, 6, &reference).is_err());
        bl.push(Element::drift("bad", -1.0));
        assert!(cache.get(&bl, 6, &reference).is_err());
        assert!(cache.get(&bl, 5, &reference).is_ok());
    }
}
