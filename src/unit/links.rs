use serde::{Serialize, Deserialize};

use crate::error::{check_in_range, Result, STRICT};

/// Anything that can be kept in a [`Links`] list, keyed by the index of the
/// unit it comes from.
pub trait Link {
    fn source(&self) -> usize;
}

impl Link for usize {
    fn source(&self) -> usize {
        *self
    }
}

/// A weighted incoming connection of a neuron, together with its momentum
/// memory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Synapse {
    pub source: usize,
    pub weight: f64,
    pub previous_delta: f64,
}

impl Synapse {
    pub fn new(source: usize, weight: f64) -> Synapse {
        Synapse { source, weight, previous_delta: 0.0 }
    }
}

impl Link for Synapse {
    fn source(&self) -> usize {
        self.source
    }
}

/// Incoming connections kept strictly ascending by source index.
///
/// Every element carries its own payload, so there is no second or third
/// list to keep aligned with the indices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "Vec<L>",
    into = "Vec<L>",
    bound(serialize = "L: Link + Clone + Serialize", deserialize = "L: Link + Deserialize<'de>")
)]
pub struct Links<L> {
    items: Vec<L>,
}

impl<L: Link> Links<L> {
    pub fn new() -> Links<L> {
        Links { items: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, L> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, L> {
        self.items.iter_mut()
    }

    /// Source indices in ascending order.
    pub fn sources(&self) -> impl Iterator<Item = usize> + '_ {
        self.items.iter().map(Link::source)
    }

    /// `Ok(pos)` if `source` is present, `Err(pos)` with the insertion point
    /// otherwise.
    pub fn position(&self, source: usize) -> std::result::Result<usize, usize> {
        self.items.binary_search_by_key(&source, Link::source)
    }

    pub fn contains(&self, source: usize) -> bool {
        self.position(source).is_ok()
    }

    pub fn get(&self, source: usize) -> Option<&L> {
        self.position(source).ok().map(|pos| &self.items[pos])
    }

    pub fn get_mut(&mut self, source: usize) -> Option<&mut L> {
        match self.position(source) {
            Ok(pos) => Some(&mut self.items[pos]),
            Err(_) => None,
        }
    }

    /// Inserts `link` at its sorted position. Returns false, leaving the list
    /// untouched, when a link from the same source already exists.
    pub fn insert(&mut self, link: L) -> bool {
        match self.position(link.source()) {
            Ok(_) => false,
            Err(pos) => {
                self.items.insert(pos, link);
                true
            }
        }
    }

    /// Removes the link from `source`, if any.
    pub fn remove(&mut self, source: usize) -> Option<L> {
        match self.position(source) {
            Ok(pos) => Some(self.items.remove(pos)),
            Err(_) => None,
        }
    }

    /// True when every source is marked ready. An empty list is always ready.
    pub fn can_update(&self, readiness: &[bool]) -> Result<bool> {
        for source in self.sources() {
            if STRICT {
                check_in_range(source, readiness.len())?;
            }
            if !readiness[source] {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl<L: Link> Default for Links<L> {
    fn default() -> Self {
        Links::new()
    }
}

impl<L: Link> From<Vec<L>> for Links<L> {
    /// Sorts the input and keeps the first link seen for each source.
    fn from(mut items: Vec<L>) -> Self {
        items.sort_by_key(Link::source);
        items.dedup_by_key(|l| l.source());
        Links { items }
    }
}

impl<L> From<Links<L>> for Vec<L> {
    fn from(links: Links<L>) -> Self {
        links.items
    }
}

impl<'a, L> IntoIterator for &'a Links<L> {
    type Item = &'a L;
    type IntoIter = std::slice::Iter<'a, L>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strictly_ascending(links: &Links<usize>) -> bool {
        let v: Vec<usize> = links.sources().collect();
        v.windows(2).all(|w| w[0] < w[1])
    }

    #[test]
    fn insert_keeps_order_and_rejects_duplicates() {
        let mut links = Links::new();
        assert!(links.insert(4usize));
        assert!(links.insert(6));
        assert!(links.insert(1));
        assert!(!links.insert(4));
        assert_eq!(links.sources().collect::<Vec<_>>(), vec![1, 4, 6]);
    }

    #[test]
    fn remove_from_middle_ends_and_missing() {
        let mut links: Links<usize> = vec![1, 4, 6].into();
        assert_eq!(links.remove(4), Some(4));
        assert_eq!(links.sources().collect::<Vec<_>>(), vec![1, 6]);
        assert_eq!(links.remove(4), None);
        assert_eq!(links.remove(5), None);
        assert_eq!(links.remove(6), Some(6));
        assert_eq!(links.remove(1), Some(1));
        assert!(links.is_empty());
    }

    #[test]
    fn order_survives_any_sequence_of_edits() {
        // Deterministic pseudo-random walk over inserts and removes.
        let mut links: Links<usize> = Links::new();
        let mut state = 17usize;
        for _ in 0..500 {
            state = state.wrapping_mul(1103515245).wrapping_add(12345) % (1 << 31);
            let source = state % 32;
            if state % 3 == 0 {
                links.remove(source);
            } else {
                links.insert(source);
            }
            assert!(strictly_ascending(&links));
        }
    }

    #[test]
    fn synapses_carry_payload_with_index() {
        let mut links = Links::new();
        links.insert(Synapse::new(3, 0.7));
        links.insert(Synapse::new(0, 0.4));
        assert!(!links.insert(Synapse::new(3, -1.0)));

        let weights: Vec<f64> = links.iter().map(|s| s.weight).collect();
        assert_eq!(weights, vec![0.4, 0.7]);
        assert_eq!(links.get(3).map(|s| s.weight), Some(0.7));
    }

    #[test]
    fn can_update_checks_every_source() {
        let mut links: Links<usize> = Links::new();
        let mut ready = vec![false; 3];
        assert!(links.can_update(&ready).unwrap());

        links.insert(0);
        assert!(!links.can_update(&ready).unwrap());
        ready[0] = true;
        assert!(links.can_update(&ready).unwrap());

        links.insert(2);
        assert!(!links.can_update(&ready).unwrap());
        ready[2] = true;
        assert!(links.can_update(&ready).unwrap());
    }

    #[cfg(feature = "strict")]
    #[test]
    fn can_update_rejects_out_of_range_source() {
        let links: Links<usize> = vec![4].into();
        assert!(matches!(
            links.can_update(&[true, true]),
            Err(crate::Error::IndexOutOfRange { index: 4, len: 2 })
        ));
    }

    #[test]
    fn from_vec_sorts_and_dedups() {
        let links: Links<usize> = vec![5, 2, 5, 0].into();
        assert_eq!(links.sources().collect::<Vec<_>>(), vec![0, 2, 5]);
    }
}
