use crate::{
    elements::{Element, ElementKind},
    error::Result,
    Float,
};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_BEAMLINE_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> u64 {
    NEXT_BEAMLINE_ID.fetch_add(1, Ordering::Relaxed)
}

/// Ordered list of elements. Every element carries a revision counter
/// that is bumped whenever it is replaced or edited, so that cached maps
/// can tell when they went stale.
#[derive(Debug)]
pub struct Beamline {
    id: u64,
    elements: Vec<Element>,
    revisions: Vec<u64>,
}

impl Clone for Beamline {
    // A clone may be edited independently, so it gets its own identity.
    fn clone(&self) -> Beamline {
        Beamline {
            id: next_id(),
            elements: self.elements.clone(),
            revisions: self.revisions.clone(),
        }
    }
}

impl Default for Beamline {
    fn default() -> Beamline {
        Beamline::new()
    }
}

impl Beamline {
    pub fn new() -> Beamline {
        Beamline::from_elements(Vec::new())
    }

    pub fn from_elements(elements: Vec<Element>) -> Beamline {
        let revisions = vec![0; elements.len()];
        Beamline {
            id: next_id(),
            elements,
            revisions,
        }
    }

    pub fn push(&mut self, element: Element) {
        self.elements.push(element);
        self.revisions.push(0);
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Element> {
        self.elements.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Element> {
        self.elements.iter()
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Process-unique identity of this beamline.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn revision(&self, index: usize) -> Option<u64> {
        self.revisions.get(index).copied()
    }

    /// Swaps in a new element at `index` and returns the old one.
    pub fn replace(&mut self, index: usize, element: Element) -> Option<Element> {
        let slot = self.elements.get_mut(index)?;
        let old = std::mem::replace(slot, element);
        self.revisions[index] += 1;
        Some(old)
    }

    /// Edits the parameters of the element at `index` in place.
    /// Returns false if there is no such element.
    pub fn update<F>(&mut self, index: usize, edit: F) -> bool
    where
        F: FnOnce(&mut ElementKind),
    {
        match self.elements.get_mut(index) {
            Some(element) => {
                edit(&mut element.kind);
                self.revisions[index] += 1;
                true
            }
            None => false,
        }
    }

    pub fn total_length(&self) -> Float {
        self.elements.iter().map(|e| e.length()).sum()
    }

    /// Longitudinal position of the end of every element.
    pub fn positions(&self) -> Vec<Float> {
        self.elements
            .iter()
            .scan(0.0, |s, e| {
                *s += e.length();
                Some(*s)
            })
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        for element in &self.elements {
            element.validate()?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Beamline {
    type Item = &'a Element;
    type IntoIter = std::slice::Iter<'a, Element>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}
